use serde::Deserialize;
use std::borrow::Cow;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for a GitLab instance.
///
/// Field names follow the `GITLAB_*` environment variables they are usually
/// loaded from: `GITLAB_URL`, `GITLAB_TOKEN` and `GITLAB_TIMEOUT_SECS`.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(rename = "url")]
    pub host: Url,
    #[serde(rename = "token")]
    pub auth_token: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn host(&self) -> &Url {
        &self.host
    }

    pub fn auth_token(&self) -> Cow<str> {
        Cow::Borrowed(self.auth_token.trim())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
