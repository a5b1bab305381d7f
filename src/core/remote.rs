//! core/remote.rs
//! Remote storage boundary.
//!
//! The core only needs two things from the provider:
//! - resolve a file to a time-limited playable URL
//! - download that URL into memory so rodio/symphonia can seek in it
//!
//! Both are blocking calls. They must only ever run on worker threads
//! (loader threads, the revalidation thread, `spawn_blocking` in the GUI).

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::error::{PlaybackError, ResolveError};
use super::types::FileReference;

/// The provider refuses `dlink` downloads from unknown user agents.
const PAN_USER_AGENT: &str = "pan.baidu.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Turns a file reference into a playable URL.
pub trait RemoteResolver: Send + Sync {
    fn resolve_playable_url(&self, file: &FileReference) -> Result<String, ResolveError>;
}

/// Fetches a resolved URL into memory.
pub trait MediaFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<MediaSource, PlaybackError>;
}

/// Downloaded stream, shared cheaply between the engine and decoders.
#[derive(Debug, Clone)]
pub struct MediaSource {
    pub url: String,
    pub bytes: Arc<[u8]>,
}

/// Generic provider envelope: every response may carry `errno` / `errmsg`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    errno: i64,
    #[serde(default)]
    errmsg: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Deserialize)]
struct FileMetas {
    #[serde(default)]
    list: Vec<FileMeta>,
}

#[derive(Debug, Deserialize)]
struct FileMeta {
    #[serde(default)]
    dlink: Option<String>,
}

/// Account summary (status line only).
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub baidu_name: String,
    #[serde(default)]
    pub netdisk_name: String,
}

impl UserInfo {
    pub fn display_name(&self) -> &str {
        if self.netdisk_name.is_empty() {
            &self.baidu_name
        } else {
            &self.netdisk_name
        }
    }
}

/// REST client for the storage provider.
pub struct PanClient {
    http: Client,
    api_url: String,
    access_token: Option<String>,
}

impl PanClient {
    pub fn new(api_url: impl Into<String>, access_token: Option<String>) -> Result<Self, ResolveError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn token(&self) -> Result<&str, ResolveError> {
        self.access_token
            .as_deref()
            .ok_or(ResolveError::Unauthenticated)
    }

    /// GET `{api_url}/{endpoint}` with the access token appended.
    /// Non-200 and `errno != 0` both become errors.
    fn get<T>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T, ResolveError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let token = self.token()?;
        let url = format!("{}/{}", self.api_url, endpoint);

        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("access_token", token.to_string()));

        let response = self.http.get(&url).query(&query).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ResolveError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<T> = response.json()?;
        if envelope.errno != 0 {
            return Err(ResolveError::Api {
                errno: envelope.errno,
                message: envelope.errmsg.unwrap_or_else(|| "unknown error".into()),
            });
        }

        Ok(envelope.body)
    }

    pub fn user_info(&self) -> Result<UserInfo, ResolveError> {
        self.get("xpan/nas", &[("method", "uinfo".into())])
    }
}

impl RemoteResolver for PanClient {
    fn resolve_playable_url(&self, file: &FileReference) -> Result<String, ResolveError> {
        let metas: FileMetas = self.get(
            "xpan/multimedia",
            &[
                ("method", "filemetas".into()),
                ("dlink", "1".into()),
                ("fsids", format!("[{}]", file.id)),
            ],
        )?;

        let dlink = metas
            .list
            .into_iter()
            .next()
            .and_then(|m| m.dlink)
            .filter(|l| !l.is_empty())
            .ok_or(ResolveError::MissingLink(file.id))?;

        Ok(format!("{dlink}&access_token={}", self.token()?))
    }
}

/// Downloads resolved links with the provider's required user agent.
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, PlaybackError> {
        let http = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(PAN_USER_AGENT)
            .build()
            .map_err(|e| PlaybackError::Fetch(e.to_string()))?;
        Ok(Self { http })
    }
}

impl MediaFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<MediaSource, PlaybackError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| PlaybackError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlaybackError::Fetch(format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .map_err(|e| PlaybackError::Fetch(e.to_string()))?;

        tracing::debug!(len = bytes.len(), "stream downloaded");

        Ok(MediaSource {
            url: url.to_string(),
            bytes: Arc::from(bytes.as_ref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolving_without_token_is_unauthenticated() {
        let client = PanClient::new("http://127.0.0.1:9", None).unwrap();
        let file = FileReference::new(1, "/a.mp3", "a.mp3");
        assert!(matches!(
            client.resolve_playable_url(&file),
            Err(ResolveError::Unauthenticated)
        ));
    }

    #[test]
    fn envelope_reads_errno_and_body() {
        let raw = r#"{"errno": 0, "list": [{"dlink": "https://d.example/x?sign=1"}]}"#;
        let env: Envelope<FileMetas> = serde_json::from_str(raw).unwrap();
        assert_eq!(env.errno, 0);
        assert_eq!(
            env.body.list[0].dlink.as_deref(),
            Some("https://d.example/x?sign=1")
        );

        let raw = r#"{"errno": -6, "errmsg": "invalid token"}"#;
        let env: Envelope<FileMetas> = serde_json::from_str(raw).unwrap();
        assert_eq!(env.errno, -6);
        assert!(env.body.list.is_empty());
    }

    #[test]
    fn user_info_prefers_netdisk_name() {
        let info: UserInfo =
            serde_json::from_str(r#"{"baidu_name": "b", "netdisk_name": "n"}"#).unwrap();
        assert_eq!(info.display_name(), "n");

        let info: UserInfo = serde_json::from_str(r#"{"baidu_name": "b"}"#).unwrap();
        assert_eq!(info.display_name(), "b");
    }
}
