use anyhow::{Context, Result};
use reqwest::header;
use serde::Serialize;
use tracing::debug;
use super::config::Config;

const PER_PAGE: u32 = 100;
const NEXT_PAGE_HEADER: &str = "x-next-page";

pub struct Client {
    http_client: reqwest::Client,
    base_url: reqwest::Url,
}

#[derive(Serialize)]
struct Page {
    page: u32,
    per_page: u32,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .default_headers(Self::default_headers(config)?)
            .timeout(config.timeout())
            .build()?;

        let mut base_url = config.host().clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn default_headers(config: &Config) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();

        let mut token = header::HeaderValue::from_str(&config.auth_token())
            .context("Access token contains characters not allowed in a header")?;
        token.set_sensitive(true);
        headers.insert(header::HeaderName::from_static("private-token"), token);

        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Resolves an API path below the configured host, keeping any path
    /// prefix the instance is served under (`https://example.com/gitlab/`).
    pub fn endpoint(&self, url: &str) -> Result<reqwest::Url> {
        self.base_url
            .join(url.trim_start_matches('/'))
            .with_context(|| format!("Invalid API path {url}"))
    }

    /// GETs a single JSON document.
    pub async fn get<U, R>(&self, url: U) -> Result<R>
    where
        U: Into<String>,
        R: serde::de::DeserializeOwned
    {
        let u = self.endpoint(&url.into())?;

        debug!("GET {u}");

        self
            .http_client
            .get(u)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(anyhow::Error::new)
    }

    /// GETs every page of a list endpoint, following `x-next-page` until the
    /// server stops announcing one.
    pub async fn get_all<U, Q, R>(&self, url: U, query: &Q) -> Result<Vec<R>>
    where
        U: Into<String>,
        Q: Serialize + ?Sized,
        R: serde::de::DeserializeOwned
    {
        let u = self.endpoint(&url.into())?;
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            debug!("GET {u} (page {page})");

            let response = self
                .http_client
                .get(u.clone())
                .query(query)
                .query(&Page { page, per_page: PER_PAGE })
                .send()
                .await?
                .error_for_status()?;

            let next_page = next_page(response.headers());
            let mut chunk: Vec<R> = response.json().await?;
            items.append(&mut chunk);

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(items)
    }
}

fn next_page(headers: &header::HeaderMap) -> Option<u32> {
    headers
        .get(NEXT_PAGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
