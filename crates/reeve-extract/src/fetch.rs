//! Page fetching behind a trait seam.
//!
//! The pipeline never talks to reqwest directly; tests drive it with canned
//! pages and injected failures instead of a live site.

use std::time::Duration;

use crate::error::FetchError;

/// Fetches one page body by URL.
pub trait PageFetcher: Send + Sync {
  async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Production fetcher over a shared [`reqwest::Client`].
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new(timeout: Duration) -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(map_reqwest)?;
    Ok(Self { client })
  }
}

impl PageFetcher for HttpFetcher {
  async fn fetch(&self, url: &str) -> Result<String, FetchError> {
    let response = self.client.get(url).send().await.map_err(map_reqwest)?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Http(status.as_u16()));
    }
    response.text().await.map_err(map_reqwest)
  }
}

fn map_reqwest(e: reqwest::Error) -> FetchError {
  if e.is_timeout() {
    FetchError::Timeout
  } else {
    FetchError::Transport(e.to_string())
  }
}
