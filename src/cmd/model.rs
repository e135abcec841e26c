/*!
Domain payloads exchanged with the league server procedures.

Business payloads use PascalCase field names (`MatchID`, `UserID`, ...).
Matchmaking tickets and matches use the snake_case shape of the
matchmaker frontend (`search_fields`, `extensions`, ...). Server-side
lists may arrive as `null`; those decode to empty collections.
*/

use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/* ---- Constants ---- */

pub const TICKET_COLLECTION: &str = "ticket_data";
pub const MATCH_COLLECTION: &str = "match_data";
pub const USER_DATA_COLLECTION: &str = "user_data";
pub const USER_LAST_DATA_KEY: &str = "last";

pub const TICKET_EXTENSION_USER: &str = "user";
pub const MATCH_EXTENSION_MATCH_TYPE: &str = "match_type";

pub const MATCH_PROFILE_1_VS_1: &str = "1vs1";
pub const MATCH_PROFILE_2_VS_2: &str = "2vs2";

pub const MATCH_TYPE_CAPTAINS_DRAFT: &str = "captains_draft";

pub const MATCH_STATUS_AWAITING_USERS_READY: &str = "Awaiting users ready";

pub const SEARCH_MIN_DURATION: &str = "minDuration";
pub const SEARCH_MAX_DURATION: &str = "maxDuration";

pub const DEFAULT_MATCH_DURATION_HOURS: i64 = 3;
pub const MIN_MATCH_DURATION_HOURS: i64 = 1;
pub const MAX_MATCH_DURATION_HOURS: i64 = 48;

pub const MAIN_LEADERBOARD: &str = "Main Leaderboard";
pub const MAX_LIST_LIMIT: u32 = 100;

/// Modes accepted for quick matchmaking.
pub const MATCH_MAKER_MODES: &[&str] = &[MATCH_PROFILE_1_VS_1];
/// Modes accepted for captains-draft challenges.
pub const CAPTAINS_DRAFT_MODES: &[&str] = &["1vs1", "2vs2", "3vs3", "4vs4", "5vs5"];

/* ---- Serde helpers ---- */

/// Decode `null` as the type's default.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

mod base64_bytes {
    use super::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD.decode(raw).map_err(de::Error::custom)
    }
}

/// Zero-valued timestamps (year 1) are sent by the server for "not set".
pub fn is_set(t: &Option<DateTime<Utc>>) -> bool {
    matches!(t, Some(t) if t.year() > 1)
}

/* ---- Matchmaker frontend shapes ---- */

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Timestamp {
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub seconds: i64,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub nanos: i32,
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

impl Timestamp {
    pub fn now() -> Self {
        Self {
            seconds: Utc::now().timestamp(),
            nanos: 0,
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos.max(0) as u32)
    }
}

/// Opaque typed value; `value` travels base64 encoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Any {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub type_url: String,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<u8>,
}

impl Any {
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Self {
            type_url: String::new(),
            value: serde_json::to_vec(value)?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchFields {
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub double_args: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub string_args: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<SearchFields>,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Any>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub match_id: String,
    pub match_profile: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub match_function: String,
    pub tickets: Vec<Ticket>,
    pub extensions: BTreeMap<String, Any>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateTicketRequest {
    pub ticket: Ticket,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeleteTicketRequest {
    pub ticket_id: String,
}

/* ---- Users and teams ---- */

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscordUser {
    #[serde(rename = "AuthorID")]
    pub author_id: String,
    #[serde(rename = "ChannelID")]
    pub channel_id: String,
    #[serde(rename = "Discriminator")]
    pub discriminator: String,
    #[serde(rename = "GuildID")]
    pub guild_id: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "MessageID")]
    pub message_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NakamaUser {
    #[serde(rename = "CustomID")]
    pub custom_id: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DisplayName")]
    pub display_name: String,
    /// JSON wallet object encoded as a string
    #[serde(rename = "Wallet")]
    pub wallet: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct User {
    pub nakama: Option<NakamaUser>,
    pub discord: Option<DiscordUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TeamUser {
    #[serde(rename = "User")]
    pub user: Option<User>,
    #[serde(rename = "TicketID")]
    pub ticket_id: String,
    #[serde(rename = "Reward")]
    pub reward: f64,
    #[serde(rename = "Captain")]
    pub captain: bool,
}

impl TeamUser {
    pub fn nakama(&self) -> Option<&NakamaUser> {
        self.user.as_ref()?.nakama.as_ref()
    }

    /// Backend user id, empty when the roster entry carries none.
    pub fn user_id(&self) -> &str {
        self.nakama().map(|n| n.id.as_str()).unwrap_or_default()
    }

    /// Discord id, empty when the roster entry carries none.
    pub fn discord_id(&self) -> &str {
        self.nakama().map(|n| n.custom_id.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Team {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "TeamUsers", deserialize_with = "null_default")]
    pub team_users: Vec<TeamUser>,
}

/* ---- Tickets, matches, results ---- */

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TicketState {
    #[serde(rename = "Ticket")]
    pub ticket: Option<Ticket>,
    #[serde(rename = "CaptainsDraft")]
    pub captains_draft: bool,
    #[serde(rename = "MatchID")]
    pub match_id: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "DiscordID")]
    pub discord_id: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "UserReady")]
    pub user_ready: bool,
}

impl TicketState {
    pub fn ticket_id(&self) -> &str {
        self.ticket.as_ref().map(|t| t.id.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchResult {
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "DiscordID")]
    pub discord_id: String,
    #[serde(rename = "ProofLink")]
    pub proof_link: String,
    #[serde(rename = "TeamNumber")]
    pub team_number: i64,
    #[serde(rename = "Win")]
    pub win: bool,
    #[serde(rename = "Draw")]
    pub draw: bool,
    #[serde(rename = "DateTime")]
    pub date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchState {
    #[serde(rename = "Active")]
    pub active: bool,
    #[serde(rename = "CancelUserIDs", deserialize_with = "null_default")]
    pub cancel_user_ids: Vec<String>,
    #[serde(rename = "CaptainUserIDs", deserialize_with = "null_default")]
    pub captain_user_ids: Vec<String>,
    #[serde(rename = "CaptainTurnUserID")]
    pub captain_turn_user_id: String,
    #[serde(rename = "DateTimeStart")]
    pub date_time_start: Option<DateTime<Utc>>,
    #[serde(rename = "DateTimeEnd")]
    pub date_time_end: Option<DateTime<Utc>>,
    /// Nanoseconds
    #[serde(rename = "Duration")]
    pub duration: i64,
    #[serde(rename = "ActualDateTimeEnd")]
    pub actual_date_time_end: Option<DateTime<Utc>>,
    /// Nanoseconds
    #[serde(rename = "ActualDuration")]
    pub actual_duration: i64,
    #[serde(rename = "Debug")]
    pub debug: bool,
    #[serde(rename = "Started")]
    pub started: bool,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Teams", deserialize_with = "null_default")]
    pub teams: Vec<Team>,
    #[serde(rename = "MatchID")]
    pub match_id: String,
    #[serde(rename = "MatchProfile")]
    pub match_profile: String,
    #[serde(rename = "MatchType")]
    pub match_type: String,
    #[serde(rename = "PoolUserIDs", deserialize_with = "null_default")]
    pub pool_user_ids: Vec<String>,
    #[serde(rename = "PoolUserCustomIDs", deserialize_with = "null_default")]
    pub pool_user_custom_ids: Vec<String>,
    #[serde(rename = "Results", deserialize_with = "null_default")]
    pub results: Vec<MatchResult>,
    #[serde(rename = "ReadyUserIDs", deserialize_with = "null_default")]
    pub ready_user_ids: Vec<String>,
    #[serde(rename = "StorageCollection")]
    pub storage_collection: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "MaxNumScore")]
    pub max_num_score: i64,
}

impl MatchState {
    pub fn is_captains_draft(&self) -> bool {
        self.match_type == MATCH_TYPE_CAPTAINS_DRAFT
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Submit {
    #[serde(rename = "Datetime")]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(rename = "Score")]
    pub score: i64,
    #[serde(rename = "Subscore")]
    pub subscore: i64,
    #[serde(rename = "ProofLink")]
    pub proof_link: String,
}

/* ---- Procedure requests ---- */

#[derive(Debug, Serialize)]
pub struct TicketStateCreateRequest<'a> {
    #[serde(rename = "TicketState")]
    pub ticket_state: &'a TicketState,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MatchStateGetRequest<'a> {
    #[serde(rename = "ID")]
    pub id: &'a str,
    #[serde(rename = "StorageCollection")]
    pub storage_collection: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MatchStateListGetRequest<'a> {
    #[serde(rename = "StorageCollection")]
    pub storage_collection: &'a str,
    #[serde(rename = "Key")]
    pub key: &'a str,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
}

/// Payload shared by `MatchReady`, `MatchCancel` and `PoolJoin`.
#[derive(Debug, Serialize)]
pub struct MatchUserRequest<'a> {
    #[serde(rename = "MatchID")]
    pub match_id: &'a str,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MatchPoolPickRequest<'a> {
    #[serde(rename = "MatchID")]
    pub match_id: &'a str,
    #[serde(rename = "CaptainUserID")]
    pub captain_user_id: &'a str,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MatchResultRequest<'a> {
    #[serde(rename = "MatchResult")]
    pub match_result: &'a MatchResult,
    #[serde(rename = "MatchID")]
    pub match_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SubmitCreateRequest<'a> {
    #[serde(rename = "Submit")]
    pub submit: &'a Submit,
    #[serde(rename = "MatchID")]
    pub match_id: &'a str,
    #[serde(rename = "UserID")]
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AccountGetRequest<'a> {
    #[serde(rename = "Identifier")]
    pub identifier: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_state_tolerates_null_lists_and_zero_times() {
        let state: MatchState = serde_json::from_str(
            r#"{"Active":true,"Teams":null,"Results":null,"ReadyUserIDs":null,
                "DateTimeStart":"2020-06-01T10:00:00Z","ActualDateTimeEnd":"0001-01-01T00:00:00Z",
                "Duration":10800000000000,"MatchID":"m1","MatchType":"captains_draft"}"#,
        )
        .unwrap();
        assert!(state.teams.is_empty());
        assert!(state.results.is_empty());
        assert!(is_set(&state.date_time_start));
        assert!(!is_set(&state.actual_date_time_end));
        assert!(!is_set(&state.date_time_end));
        assert!(state.is_captains_draft());
    }

    #[test]
    fn ticket_wire_shape() {
        let ticket = Ticket {
            id: "t1".into(),
            search_fields: Some(SearchFields {
                tags: vec!["1vs1".into()],
                ..Default::default()
            }),
            extensions: BTreeMap::from([(
                TICKET_EXTENSION_USER.to_string(),
                Any::json(&"hi").unwrap(),
            )]),
            create_time: Some(Timestamp {
                seconds: 5,
                nanos: 0,
            }),
            ..Default::default()
        };
        let v = serde_json::to_value(&ticket).unwrap();
        assert_eq!(v["search_fields"]["tags"][0], "1vs1");
        assert!(v["search_fields"].get("double_args").is_none());
        // "\"hi\"" base64 encoded
        assert_eq!(v["extensions"]["user"]["value"], "ImhpIg==");
        assert_eq!(v["create_time"]["seconds"], 5);

        let back: Ticket = serde_json::from_value(v).unwrap();
        assert_eq!(back.extensions["user"].value, b"\"hi\"");
    }

    #[test]
    fn team_user_accessors() {
        let tu: TeamUser = serde_json::from_str(
            r#"{"User":{"Nakama":{"ID":"u1","CustomID":"42"},"Discord":null},"Reward":-3.5}"#,
        )
        .unwrap();
        assert_eq!(tu.user_id(), "u1");
        assert_eq!(tu.discord_id(), "42");
        assert_eq!(TeamUser::default().user_id(), "");
    }
}
