//! HTTP/JSON gateway client.
//!
//! connect():
//!   1. authenticate with a custom id (basic auth with the server key)
//!   2. switch to bearer auth with the session token
//!   3. healthcheck to confirm the restored session
//!
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::api::{
    Account, ApiErrorBody, DeleteStorageObjectId, LeaderboardRecordList, ReadStorageObjectId, Rpc,
    StorageObject, StorageObjectList, StorageObjects,
};
use super::session::Session;
use super::{Backend, Error, Result};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct NakamaClient {
    http: reqwest::Client,
    base: Url,
    session: Session,
}

#[derive(Serialize)]
struct AuthenticateCustom<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    vars: std::collections::HashMap<String, String>,
}

#[derive(Serialize)]
struct StorageIds<'a, T> {
    object_ids: &'a [T],
}

impl NakamaClient {
    /// Authenticate as the configured chat author (or the administrator) and restore the session.
    pub async fn connect(config: &Config) -> Result<Self> {
        let base = parse_base(&config.address)?;
        let keepalive = &config.keepalive;
        let http = reqwest::Client::builder()
            .tcp_keepalive(keepalive.interval())
            // Pings below only apply to h2 connections; plain http stays on HTTP/1.1.
            .http2_keep_alive_interval(keepalive.interval())
            .http2_keep_alive_timeout(keepalive.timeout())
            .http2_keep_alive_while_idle(keepalive.while_idle)
            .build()?;

        let (custom_id, username) = config.message.identity();
        let url = endpoint(&base, &["v2", "account", "authenticate", "custom"])?;
        let request = http
            .post(url)
            .basic_auth(&config.server_key, Some(""))
            .query(&[("create", "true"), ("username", username.as_str())])
            .json(&AuthenticateCustom {
                id: &custom_id,
                vars: config.message.session_vars(),
            });
        let session: Session = decode(request.send().await?).await?;

        let client = Self {
            http,
            base,
            session,
        };
        client.healthcheck().await?;
        match client.session.claims() {
            Ok(claims) => tracing::info!(user = %claims.usn, uid = %claims.uid, "session restored"),
            Err(e) => tracing::warn!("session restored, claims unreadable: {e}"),
        }
        Ok(client)
    }

    pub async fn healthcheck(&self) -> Result<()> {
        let resp = self.request(Method::GET, &["v2", "healthcheck"])?.send().await?;
        check(resp).await.map(|_| ())
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = endpoint(&self.base, segments)?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(&self.session.token))
    }
}

#[async_trait]
impl Backend for NakamaClient {
    async fn rpc(&self, id: &str, payload: String) -> Result<Rpc> {
        tracing::debug!(rpc = id, %payload, "rpc call");
        // The gateway expects the payload as a JSON string literal.
        let resp = self
            .request(Method::POST, &["v2", "rpc", id])?
            .json(&payload)
            .send()
            .await?;
        decode(resp).await
    }

    async fn get_account(&self) -> Result<Account> {
        let resp = self.request(Method::GET, &["v2", "account"])?.send().await?;
        decode(resp).await
    }

    async fn read_storage_objects(&self, ids: &[ReadStorageObjectId]) -> Result<Vec<StorageObject>> {
        let resp = self
            .request(Method::POST, &["v2", "storage"])?
            .json(&StorageIds { object_ids: ids })
            .send()
            .await?;
        let objects: StorageObjects = decode(resp).await?;
        Ok(objects.objects)
    }

    async fn list_storage_objects(
        &self,
        collection: &str,
        user_id: &str,
        limit: u32,
        cursor: &str,
    ) -> Result<StorageObjectList> {
        let limit = limit.to_string();
        let mut query = vec![("user_id", user_id), ("limit", limit.as_str())];
        if !cursor.is_empty() {
            query.push(("cursor", cursor));
        }
        let resp = self
            .request(Method::GET, &["v2", "storage", collection])?
            .query(&query)
            .send()
            .await?;
        decode(resp).await
    }

    async fn delete_storage_objects(&self, ids: &[DeleteStorageObjectId]) -> Result<()> {
        let resp = self
            .request(Method::PUT, &["v2", "storage", "delete"])?
            .json(&StorageIds { object_ids: ids })
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    async fn list_leaderboard_records_around_owner(
        &self,
        leaderboard_id: &str,
        owner_id: &str,
        limit: u32,
    ) -> Result<LeaderboardRecordList> {
        let resp = self
            .request(
                Method::GET,
                &["v2", "leaderboard", leaderboard_id, "owner", owner_id],
            )?
            .query(&[("limit", limit.to_string())])
            .send()
            .await?;
        decode(resp).await
    }
}

fn parse_base(address: &str) -> Result<Url> {
    let url = Url::parse(address.trim()).map_err(|e| Error::Address(format!("{address}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(Error::Address(format!(
            "{address}: expected an http(s) URL with a host"
        ))),
    }
}

/// Append percent-encoded path segments to the base URL.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Address(format!("{base}: cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        body
    } else {
        parsed.message
    };
    Err(Error::Api {
        status: status.as_u16(),
        code: parsed.code,
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = check(resp).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
