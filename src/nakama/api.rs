//! Gateway wire types (snake_case JSON, int64 values encoded as strings).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of a named server procedure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Rpc {
    pub id: String,
    pub payload: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub lang_tag: String,
    /// JSON object encoded as a string.
    pub metadata: String,
    #[serde(deserialize_with = "flexible_time::deserialize")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "flexible_time::deserialize")]
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Account {
    pub user: User,
    /// JSON object encoded as a string, e.g. `{"coins": 10}`.
    pub wallet: String,
    pub email: String,
    pub custom_id: String,
    #[serde(deserialize_with = "flexible_time::deserialize")]
    pub verify_time: Option<DateTime<Utc>>,
}

impl Account {
    /// Account metadata as a flat string map. Non-string values are skipped.
    pub fn metadata_map(&self) -> HashMap<String, String> {
        let parsed: HashMap<String, serde_json::Value> =
            serde_json::from_str(&self.user.metadata).unwrap_or_default();
        parsed
            .into_iter()
            .filter_map(|(k, v)| match v {
                serde_json::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect()
    }

    /// Username split into `(name, discriminator)`; the discriminator is empty when absent.
    pub fn username_parts(&self) -> (&str, &str) {
        self.user
            .username
            .split_once('#')
            .unwrap_or((self.user.username.as_str(), ""))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageObject {
    pub collection: String,
    pub key: String,
    pub user_id: String,
    pub value: String,
    pub version: String,
    pub permission_read: i32,
    pub permission_write: i32,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageObjectList {
    pub objects: Vec<StorageObject>,
    pub cursor: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageObjects {
    pub objects: Vec<StorageObject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReadStorageObjectId {
    pub collection: String,
    pub key: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeleteStorageObjectId {
    pub collection: String,
    pub key: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeaderboardRecord {
    pub leaderboard_id: String,
    pub owner_id: String,
    pub username: String,
    #[serde(with = "int64_string")]
    pub score: i64,
    #[serde(with = "int64_string")]
    pub subscore: i64,
    pub num_score: i32,
    pub metadata: String,
    #[serde(with = "int64_string")]
    pub rank: i64,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeaderboardRecordList {
    pub records: Vec<LeaderboardRecord>,
    pub owner_records: Vec<LeaderboardRecord>,
    pub next_cursor: String,
    pub prev_cursor: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// The gateway writes int64 fields as JSON strings; accept both forms on input.
pub(crate) mod int64_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Num(i64),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) if s.is_empty() => Ok(0),
            Raw::Str(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// Accounts relayed through server procedures carry `{seconds, nanos}` objects
/// instead of RFC 3339 strings; accept both.
pub(crate) mod flexible_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(DateTime<Utc>),
        Parts {
            #[serde(default)]
            seconds: i64,
            #[serde(default)]
            nanos: u32,
        },
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Text(t)) => Some(t),
            Some(Raw::Parts { seconds, nanos }) => DateTime::from_timestamp(seconds, nanos),
            None => None,
        })
    }
}
