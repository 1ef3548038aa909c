use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

pub const IMAGE_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Replaces each run of whitespace with `%20`
pub fn sanitize_url(url: &str) -> String {
    whitespace_regex().replace_all(url, "%20").into_owned()
}

/// Checks whether a URL points at a reachable image
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn is_valid_image(&self, url: &str) -> bool;
}

/// Issues a HEAD request and accepts 2xx answers with an `image/*` type
pub struct HttpImageProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpImageProbe {
    pub fn new() -> Self {
        Self::with_timeout(IMAGE_PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpImageProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn is_valid_image(&self, url: &str) -> bool {
        match self.client.head(url).timeout(self.timeout).send().await {
            Ok(resp) => {
                let is_image = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|ct| ct.starts_with("image/"))
                    .unwrap_or(false);
                resp.status().is_success() && is_image
            }
            Err(e) => {
                debug!("Image probe failed for {}: {}", url, e);
                false
            }
        }
    }
}
