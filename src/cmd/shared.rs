/*!
shared.rs - shared helpers for subcommands.

Focus:
  - rpc_json: serialize a payload, call a named procedure, hand back the payload
  - argument validation (proof link, score, duration, mode)
  - storage listing helpers (newest first)
*/

use anyhow::{Context, Result, bail};
use serde::Serialize;
use url::Url;

use crate::cmd::model::{MAX_LIST_LIMIT, MAX_MATCH_DURATION_HOURS, MIN_MATCH_DURATION_HOURS};
use crate::nakama::{Backend, ReadStorageObjectId, StorageObject};

/* ---- Remote invocation ---- */

/// Call procedure `id` with `payload` encoded as JSON; returns the raw response payload.
pub async fn rpc_json<T: Serialize + ?Sized>(
    backend: &dyn Backend,
    id: &str,
    payload: &T,
) -> Result<String> {
    let body = serde_json::to_string(payload).with_context(|| format!("encode {id} payload"))?;
    tracing::debug!(rpc = id, payload = %body, "invoke");
    let result = backend
        .rpc(id, body)
        .await
        .with_context(|| format!("{id} failed"))?;
    tracing::trace!(rpc = id, payload = %result.payload, "response");
    Ok(result.payload)
}

/// Indent a JSON payload for display; non-JSON payloads are returned as-is.
pub fn pretty_payload(payload: &str) -> String {
    serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| payload.to_string())
}

/// Flag value wins over the positional argument; blank values count as absent.
pub fn flag_or_positional(flag: Option<&str>, positional: Option<&str>) -> Option<String> {
    flag.filter(|v| !v.trim().is_empty())
        .or(positional.filter(|v| !v.trim().is_empty()))
        .map(|v| v.trim().to_string())
}

/* ---- Validation ---- */

pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Prefix `http://` when no scheme is given, then require an http(s) URL with a host.
pub fn normalize_proof_link(proof: &str) -> Result<String> {
    let proof = proof.trim();
    let link = if proof.starts_with("http") {
        proof.to_string()
    } else {
        format!("http://{proof}")
    };
    if !is_valid_url(&link) {
        bail!("'{link}' is not a valid url for the proof link");
    }
    Ok(link)
}

/// Split a score into integer part and the first ten fractional digits.
pub fn split_score(score: f64) -> Result<(i64, i64)> {
    if !score.is_finite() || score == 0.0 {
        bail!("score is **required** and must not equal 0");
    }
    if score < 0.0 {
        bail!("score must be a positive number, got {score}");
    }
    let whole = score.trunc();
    if whole >= i64::MAX as f64 {
        bail!("score {score} is too large");
    }
    let fraction = format!("{:.10}", score - whole);
    match fraction.split_once('.') {
        // 0.99999999999 rounds up to 1.0000000000
        Some(("1", _)) => Ok((whole as i64 + 1, 0)),
        Some((_, digits)) => Ok((whole as i64, digits.parse()?)),
        None => Ok((whole as i64, 0)),
    }
}

pub fn validate_duration(hours: i64) -> Result<()> {
    if hours < MIN_MATCH_DURATION_HOURS {
        bail!("duration can not be less than {MIN_MATCH_DURATION_HOURS} hours");
    }
    if hours > MAX_MATCH_DURATION_HOURS {
        bail!("duration can not be more than {MAX_MATCH_DURATION_HOURS} hours - this is not a Kaggle");
    }
    Ok(())
}

pub fn validate_modes(modes: &[String], available: &[&str]) -> Result<()> {
    if modes.is_empty() {
        bail!("Match mode is required. Available match modes: {available:?}");
    }
    for mode in modes {
        if !available.contains(&mode.as_str()) {
            bail!("Match mode {mode} is invalid. Available match modes: {available:?}");
        }
    }
    Ok(())
}

/* ---- Storage ---- */

fn newest_first(mut objects: Vec<StorageObject>) -> Vec<StorageObject> {
    objects.sort_by(|a, b| b.create_time.cmp(&a.create_time));
    objects
}

pub async fn read_user_objects(
    backend: &dyn Backend,
    collection: &str,
    key: &str,
    user_id: &str,
) -> Result<Vec<StorageObject>> {
    let ids = [ReadStorageObjectId {
        collection: collection.to_string(),
        key: key.to_string(),
        user_id: user_id.to_string(),
    }];
    let objects = backend
        .read_storage_objects(&ids)
        .await
        .with_context(|| format!("read {collection}/{key}"))?;
    Ok(newest_first(objects))
}

/// First page (up to the list limit) of a user's objects in `collection`.
pub async fn list_user_objects(
    backend: &dyn Backend,
    collection: &str,
    user_id: &str,
) -> Result<Vec<StorageObject>> {
    let list = backend
        .list_storage_objects(collection, user_id, MAX_LIST_LIMIT, "")
        .await
        .with_context(|| format!("list {collection}"))?;
    Ok(newest_first(list.objects))
}
