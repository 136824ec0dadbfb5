pub mod http_mock;

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ghtkn::oauth::{BrowserError, BrowserOpener};
use ghtkn::{DeviceFlowClient, DeviceFlowEndpoints, PollTiming};
use wiremock::MockServer;

/// Cloneable in-memory writer for the verification instructions.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    #[allow(dead_code)]
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Records opened URLs instead of launching a browser.
#[derive(Clone, Default)]
pub struct RecordingBrowser(Arc<Mutex<Vec<String>>>);

impl RecordingBrowser {
    #[allow(dead_code)]
    pub fn opened(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl BrowserOpener for RecordingBrowser {
    fn open(&self, url: &str) -> Result<(), BrowserError> {
        self.0.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub struct TestClient {
    pub client: DeviceFlowClient,
    #[allow(dead_code)]
    pub prompt: SharedBuf,
    #[allow(dead_code)]
    pub browser: RecordingBrowser,
}

/// Device-flow client pointed at `server` with millisecond poll timing.
pub fn device_client(
    server: &MockServer,
    interval: Duration,
    slow_down_increment: Duration,
) -> TestClient {
    let prompt = SharedBuf::default();
    let browser = RecordingBrowser::default();
    let client = DeviceFlowClient::new(
        reqwest::Client::new(),
        DeviceFlowEndpoints::with_base_url(&server.uri()),
    )
    .with_timing(PollTiming {
        minimum_interval: interval,
        slow_down_increment,
    })
    .with_browser(Arc::new(browser.clone()))
    .with_prompt_writer(Box::new(prompt.clone()));
    TestClient {
        client,
        prompt,
        browser,
    }
}
