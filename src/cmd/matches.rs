/*!
`matches.rs`

Match snapshots and the captains-draft pool:
  - get match : one match (by id or the user's last) or every stored match
  - join      : enter the draft pool of a match
  - add       : put another user into the pool of the caller's match
  - pick      : captain picks a pooled user
*/

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;

use crate::cmd::CommandContext;
use crate::cmd::format::format_match_state;
use crate::cmd::identity::get_account;
use crate::cmd::model::{
    DEFAULT_MATCH_DURATION_HOURS, MatchPoolPickRequest, MatchState, MatchStateGetRequest,
    MatchStateListGetRequest, MatchUserRequest,
};
use crate::cmd::shared::{flag_or_positional, rpc_json};
use crate::cmd::ticket::{create_draft_ticket_state, get_last_user_ticket_state};
use crate::cmd::user_data::get_last_user_data;
use crate::nakama::{Account, Backend, SYSTEM_USER_ID};

#[derive(Args, Debug, Clone, Default)]
pub struct GetMatchArgs {
    /// Match id
    #[arg(short, long)]
    pub match_id: Option<String>,

    /// Show every stored match
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct JoinArgs {
    /// Match id of the draft pool
    #[arg(value_name = "MATCH_ID")]
    pub target: Option<String>,

    /// Match id (takes precedence over the positional form)
    #[arg(short, long)]
    pub match_id: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PoolUserArgs {
    /// User: username#1234, <@id> or a chat user id
    #[arg(value_name = "USER")]
    pub target: Option<String>,

    /// User (takes precedence over the positional form)
    #[arg(short, long)]
    pub user: Option<String>,
}

/* ---- Match state access ---- */

fn parse_match_state(payload: &str) -> Result<Option<MatchState>> {
    if payload.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(payload).context("unexpected match state payload")
}

/// Snapshot of `match_id` from `collection` (empty collection = server default).
pub async fn get_match_state(
    backend: &dyn Backend,
    match_id: &str,
    collection: &str,
) -> Result<Option<MatchState>> {
    let request = MatchStateGetRequest {
        id: match_id,
        storage_collection: collection,
    };
    let payload = rpc_json(backend, "MatchStateGet", &request).await?;
    parse_match_state(&payload)
}

pub async fn get_last_user_match_state(
    backend: &dyn Backend,
    account: &Account,
    collection: &str,
) -> Result<Option<MatchState>> {
    let user_data = get_last_user_data(backend, account).await?;
    if user_data.match_id.is_empty() {
        return Ok(None);
    }
    get_match_state(backend, &user_data.match_id, collection).await
}

pub async fn list_match_states(backend: &dyn Backend, collection: &str) -> Result<Vec<MatchState>> {
    let request = MatchStateListGetRequest {
        storage_collection: collection,
        key: "",
        user_id: SYSTEM_USER_ID,
    };
    let payload = rpc_json(backend, "MatchStateListGet", &request).await?;
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }
    let states: Option<Vec<MatchState>> =
        serde_json::from_str(&payload).context("unexpected match state list payload")?;
    Ok(states.unwrap_or_default())
}

/// Match id of the caller's current draft ticket.
async fn current_draft_match_id(ctx: &CommandContext<'_>, account: &Account) -> Result<String> {
    let state = get_last_user_ticket_state(ctx.backend, account)
        .await?
        .ok_or_else(|| anyhow!("No tickets found for <@{}>", account.custom_id))?;
    if state.match_id.is_empty() {
        bail!("Ticket **{}** is not assigned to any match", state.ticket_id());
    }
    Ok(state.match_id)
}

/* ---- Commands ---- */

pub async fn execute_get_match(ctx: &CommandContext<'_>, args: GetMatchArgs) -> Result<String> {
    let account = ctx.backend.get_account().await?;
    let not_found = || format!("No match found for user <@{}>", account.custom_id);

    if args.all {
        let states = list_match_states(ctx.backend, "").await?;
        if states.is_empty() {
            return Ok(not_found());
        }
        return Ok(states.iter().map(format_match_state).collect());
    }

    let state = match args.match_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => get_match_state(ctx.backend, id, "").await?,
        None => get_last_user_match_state(ctx.backend, &account, "").await?,
    };
    Ok(state
        .as_ref()
        .map(format_match_state)
        .unwrap_or_else(not_found))
}

/// Create a ready draft ticket for `joiner` and enter them into the pool of `match_id`.
async fn pool_join(ctx: &CommandContext<'_>, joiner: &Account, match_id: &str) -> Result<String> {
    if get_last_user_ticket_state(ctx.backend, joiner).await?.is_some() {
        return Ok(format!(
            "Existing ticket found for <@{}>, please complete the game",
            joiner.custom_id
        ));
    }
    create_draft_ticket_state(
        ctx.backend,
        joiner,
        match_id,
        true,
        DEFAULT_MATCH_DURATION_HOURS,
        &[],
    )
    .await?;
    let request = MatchUserRequest {
        match_id,
        user_id: &joiner.user.id,
    };
    rpc_json(ctx.backend, "PoolJoin", &request).await
}

pub async fn execute_join(ctx: &CommandContext<'_>, args: JoinArgs) -> Result<String> {
    let match_id = flag_or_positional(args.match_id.as_deref(), args.target.as_deref())
        .ok_or_else(|| anyhow!("Please specify the MatchID to join the captains draft pool"))?;
    let account = ctx.backend.get_account().await?;
    pool_join(ctx, &account, &match_id).await
}

pub async fn execute_add(ctx: &CommandContext<'_>, args: PoolUserArgs) -> Result<String> {
    let identifier = flag_or_positional(args.user.as_deref(), args.target.as_deref())
        .ok_or_else(|| anyhow!("Please specify the UserID to add to the draft pool"))?;
    let account = ctx.backend.get_account().await?;
    let match_id = current_draft_match_id(ctx, &account).await?;
    let joiner = get_account(ctx.backend, &identifier).await?;
    pool_join(ctx, &joiner, &match_id).await
}

pub async fn execute_pick(ctx: &CommandContext<'_>, args: PoolUserArgs) -> Result<String> {
    let identifier = flag_or_positional(args.user.as_deref(), args.target.as_deref())
        .ok_or_else(|| anyhow!("Please specify the UserID to pick from the draft pool"))?;
    let captain = ctx.backend.get_account().await?;
    let match_id = current_draft_match_id(ctx, &captain).await?;
    let picked = get_account(ctx.backend, &identifier).await?;
    let request = MatchPoolPickRequest {
        match_id: &match_id,
        captain_user_id: &captain.user.id,
        user_id: &picked.user.id,
    };
    rpc_json(ctx.backend, "PoolPick", &request).await
}
