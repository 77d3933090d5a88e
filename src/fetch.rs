use std::thread::sleep;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER, USER_AGENT};

use crate::error::GrabError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";
const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_attempts: usize,
    /// Delay before the second attempt; doubled for each attempt after that.
    pub base_delay: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Retrieval seam used by the download loop, so it can run against a stub in tests.
pub trait ImageFetcher {
    fn fetch(&self, url: &str, referer: Option<&str>) -> anyhow::Result<Fetched>;
}

pub struct HttpFetcher {
    client: Client,
    options: FetchOptions,
}

impl HttpFetcher {
    pub fn new(options: FetchOptions) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build http client")?;
        Ok(Self { client, options })
    }

    fn fetch_once(&self, url: &str, referer: Option<&str>) -> anyhow::Result<Fetched> {
        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, self.options.user_agent.as_str())
            .header(ACCEPT, DEFAULT_ACCEPT)
            .header(ACCEPT_LANGUAGE, DEFAULT_ACCEPT_LANGUAGE);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .bytes()
            .with_context(|| format!("read response body: {url}"))?
            .to_vec();

        Ok(Fetched {
            bytes,
            content_type,
        })
    }
}

/// Sleep after failed attempt `attempt` (1-based): `base`, then doubling.
pub fn backoff_delay(base: Duration, attempt: usize) -> Duration {
    let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(2u32.saturating_pow(exponent))
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str, referer: Option<&str>) -> anyhow::Result<Fetched> {
        let attempts = self.options.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match self.fetch_once(url, referer) {
                Ok(fetched) => return Ok(fetched),
                Err(err) => {
                    tracing::debug!(url, attempt, attempts, error = %format!("{err:#}"), "fetch attempt failed");
                    last_err = Some(err);
                }
            }
            if attempt < attempts {
                sleep(backoff_delay(self.options.base_delay, attempt));
            }
        }

        let err = last_err.unwrap_or_else(|| anyhow::anyhow!("GET {url}: no attempt made"));
        Err(err.context(GrabError::FetchExhausted {
            url: url.to_owned(),
            attempts,
        }))
    }
}
