use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;
use url::Url;

use crate::error::SmokeError;

/// Exponential backoff bounded by an overall deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            timeout: Duration::from_secs(60),
        }
    }
}

impl Backoff {
    pub fn next_delay(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_delay)
    }
}

/// Poll `url` until it answers with a success status, returning the number of
/// attempts it took.
pub async fn wait_until_ready(
    http: &reqwest::Client,
    url: &Url,
    backoff: &Backoff,
) -> Result<u32, SmokeError> {
    let deadline = Instant::now() + backoff.timeout;
    let mut delay = backoff.initial;
    let mut attempts = 0;
    loop {
        attempts += 1;
        let last = match http.get(url.clone()).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(%url, attempts, "ready");
                return Ok(attempts);
            }
            Ok(resp) => format!("status {}", resp.status()),
            Err(e) => e.to_string(),
        };
        debug!(%url, attempts, %last, "not ready yet");

        let now = Instant::now();
        if now >= deadline {
            return Err(SmokeError::NotReady {
                url: url.to_string(),
                attempts,
                last,
            });
        }
        sleep(delay.min(deadline - now)).await;
        delay = backoff.next_delay(delay);
    }
}
