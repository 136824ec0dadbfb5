pub mod get;
pub mod git_credential;
pub mod init;
pub mod output;
