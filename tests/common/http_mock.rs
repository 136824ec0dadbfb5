use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DEVICE_CODE_PATH: &str = "/login/device/code";
pub const ACCESS_TOKEN_PATH: &str = "/login/oauth/access_token";

/// Device-code endpoint answering with the given lifetime and a zero interval.
pub async fn mount_device_code(server: &MockServer, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "device_code": "3584d83530557fdd1f46af8289938c8ef79f9dc5",
            "user_code": "WDJB-MJHT",
            "verification_uri": "https://github.com/login/device",
            "expires_in": expires_in,
            "interval": 0
        })))
        .mount(server)
        .await;
}

#[allow(dead_code)]
/// Token endpoint answering `{"error": code}` for the next `times` checks.
pub async fn mount_token_error(server: &MockServer, code: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(ACCESS_TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": code })),
        )
        .up_to_n_times(times)
        .mount(server)
        .await;
}

pub async fn mount_token_success(server: &MockServer, token: &str, expires_in: i64) {
    Mock::given(method("POST"))
        .and(path(ACCESS_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "expires_in": expires_in,
            "refresh_token": "ghr_unused",
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
}

/// Number of token-check requests the server has seen.
pub async fn token_checks(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == ACCESS_TOKEN_PATH)
        .count()
}
