use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

pub(crate) const MAX_ATTEMPTS: usize = 5;
const BASE_DELAY: Duration = Duration::from_secs(2);
const MAX_DELAY: Duration = Duration::from_secs(60);

pub(crate) fn is_rate_limited(status: StatusCode, body: &str) -> bool {
    if matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    ) {
        return true;
    }
    let lower = body.to_lowercase();
    lower.contains("resource_exhausted")
        || lower.contains("rate limit")
        || lower.contains("quota exceeded")
}

pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get("retry-after")?.to_str().ok()?.trim();
    value.parse::<u64>().ok().map(Duration::from_secs)
}

#[derive(Debug)]
pub(crate) struct Backoff {
    attempt: usize,
    delay: Duration,
}

impl Backoff {
    pub(crate) fn new() -> Self {
        Self {
            attempt: 0,
            delay: BASE_DELAY,
        }
    }

    pub(crate) fn start_attempt(&mut self) -> usize {
        self.attempt += 1;
        self.attempt
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.attempt >= MAX_ATTEMPTS
    }

    pub(crate) async fn wait(&mut self, service: &str, retry_after: Option<Duration>) {
        let wait = match retry_after {
            Some(requested) if requested > self.delay => requested,
            _ => self.delay,
        };
        warn!(
            "{} rate limited; retrying in {:.1}s (attempt {}/{})",
            service,
            wait.as_secs_f32(),
            self.attempt,
            MAX_ATTEMPTS
        );
        sleep(wait).await;
        self.delay = next_delay(self.delay);
    }
}

fn next_delay(current: Duration) -> Duration {
    current
        .saturating_mul(2)
        .clamp(BASE_DELAY, MAX_DELAY)
}
