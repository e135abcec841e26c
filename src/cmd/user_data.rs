//! Per-user "last" record (current ticket and match) and its patch-merge.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cmd::model::{USER_DATA_COLLECTION, USER_LAST_DATA_KEY};
use crate::cmd::shared::{read_user_objects, rpc_json};
use crate::nakama::{Account, Backend};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserData {
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "MatchID")]
    pub match_id: String,
    #[serde(rename = "TicketID")]
    pub ticket_id: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "DiscordChannelID")]
    pub discord_channel_id: String,
    #[serde(rename = "DiscordGuildID")]
    pub discord_guild_id: String,
}

#[derive(Serialize)]
struct LastUserDataCreateRequest<'a> {
    #[serde(rename = "UserID")]
    user_id: &'a str,
    #[serde(rename = "UserData")]
    user_data: &'a UserData,
}

/// One field of a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T: Clone + Default + PartialEq> Patch<T> {
    /// Apply to `slot`; true when the value changed.
    fn apply(&self, slot: &mut T) -> bool {
        let next = match self {
            Patch::Keep => return false,
            Patch::Set(v) => v.clone(),
            Patch::Clear => T::default(),
        };
        if *slot == next {
            return false;
        }
        *slot = next;
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDataPatch {
    pub user_id: Patch<String>,
    pub match_id: Patch<String>,
    pub ticket_id: Patch<String>,
    pub version: Patch<String>,
    pub discord_channel_id: Patch<String>,
    pub discord_guild_id: Patch<String>,
}

impl UserData {
    /// Merged copy, or `None` when the patch changes nothing.
    pub fn merge(&self, patch: &UserDataPatch) -> Option<UserData> {
        let mut merged = self.clone();
        let changes = [
            patch.user_id.apply(&mut merged.user_id),
            patch.match_id.apply(&mut merged.match_id),
            patch.ticket_id.apply(&mut merged.ticket_id),
            patch.version.apply(&mut merged.version),
            patch.discord_channel_id.apply(&mut merged.discord_channel_id),
            patch.discord_guild_id.apply(&mut merged.discord_guild_id),
        ];
        changes.contains(&true).then_some(merged)
    }
}

pub async fn write_last_user_data(backend: &dyn Backend, user_data: &UserData) -> Result<()> {
    rpc_json(
        backend,
        "LastUserDataCreate",
        &LastUserDataCreateRequest {
            user_id: &user_data.user_id,
            user_data,
        },
    )
    .await?;
    Ok(())
}

/// Stored record for `account`. A missing record is rebuilt from the account
/// metadata (chat channel and guild) and written back.
pub async fn get_last_user_data(backend: &dyn Backend, account: &Account) -> Result<UserData> {
    let objects = read_user_objects(
        backend,
        USER_DATA_COLLECTION,
        USER_LAST_DATA_KEY,
        &account.user.id,
    )
    .await?;
    let metadata = account.metadata_map();
    let channel_id = metadata.get("ChannelID").cloned().unwrap_or_default();
    let guild_id = metadata.get("GuildID").cloned().unwrap_or_default();

    let Some(object) = objects.first() else {
        tracing::info!(user = %account.user.id, "no user data found, restoring from account metadata");
        let user_data = UserData {
            user_id: account.user.id.clone(),
            discord_channel_id: channel_id,
            discord_guild_id: guild_id,
            ..Default::default()
        };
        write_last_user_data(backend, &user_data).await?;
        return Ok(user_data);
    };

    let mut user_data: UserData =
        serde_json::from_str(&object.value).context("malformed user data")?;
    user_data.version = object.version.clone();
    if user_data.discord_channel_id.is_empty() {
        user_data.discord_channel_id = channel_id;
    }
    if user_data.discord_guild_id.is_empty() {
        user_data.discord_guild_id = guild_id;
    }
    Ok(user_data)
}

pub async fn create_or_update_last_user_data(
    backend: &dyn Backend,
    account: &Account,
    patch: UserDataPatch,
) -> Result<()> {
    let current = get_last_user_data(backend, account).await?;
    match current.merge(&patch) {
        Some(merged) => write_last_user_data(backend, &merged).await,
        None => {
            tracing::debug!("user data unchanged, nothing to write");
            Ok(())
        }
    }
}
