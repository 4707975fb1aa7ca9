//! HTTP access for the scraper.

mod basic;

pub use basic::BasicClient;

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes HTTP requests. Tests swap in a client serving canned pages.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// GETs `url` and returns the body as text. Non-2xx statuses are errors.
pub async fn fetch_text<C: HttpClient>(client: &C, url: &str) -> Result<String> {
    let req = Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("GET {url} returned {status}");
    }
    Ok(resp.text().await?)
}
