pub mod browser;
pub mod device;
pub mod poll;

pub use browser::{BrowserError, BrowserOpener, NoBrowser, SystemBrowser};
pub use device::{Authorizer, DeviceAuthorization, DeviceFlowClient, DeviceFlowEndpoints};
pub use poll::{PollState, PollTiming, Poller};
