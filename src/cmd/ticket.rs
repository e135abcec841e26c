/*!
`ticket.rs`

Matchmaking tickets:
  - go        : quick match through the matchmaker frontend
  - challenge : captains-draft match against a named opponent
  - get ticket: show one ticket (by id or the last one) or all of them

A user holds at most one ticket; both creation paths refuse (with the
existing ticket printed) when one is already on file.
*/

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Args};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::cmd::CommandContext;
use crate::cmd::format::format_ticket_state;
use crate::cmd::identity::get_account;
use crate::cmd::model::{
    Any, CAPTAINS_DRAFT_MODES, CreateTicketRequest, DEFAULT_MATCH_DURATION_HOURS, DiscordUser,
    MATCH_EXTENSION_MATCH_TYPE, MATCH_MAKER_MODES, MATCH_PROFILE_1_VS_1, MATCH_PROFILE_2_VS_2,
    MATCH_TYPE_CAPTAINS_DRAFT, Match, NakamaUser, SEARCH_MAX_DURATION, SEARCH_MIN_DURATION,
    SearchFields, TICKET_COLLECTION, TICKET_EXTENSION_USER, TeamUser, Ticket, TicketState,
    TicketStateCreateRequest, Timestamp, User,
};
use crate::cmd::shared::{
    flag_or_positional, list_user_objects, rpc_json, validate_duration, validate_modes,
};
use crate::cmd::user_data::{
    Patch, UserData, UserDataPatch, create_or_update_last_user_data, get_last_user_data,
};
use crate::nakama::{Account, Backend, DeleteStorageObjectId, StorageObject};

/// Flags shared by `go` and `challenge`.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Indicate an early readiness for a new match (--ready=false to opt out)
    #[arg(
        short,
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub ready: bool,

    /// Duration in hours (1-48)
    #[arg(short, long, default_value_t = DEFAULT_MATCH_DURATION_HOURS, allow_negative_numbers = true)]
    pub duration: i64,
}

#[derive(Args, Debug, Clone)]
pub struct GoArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Match Maker mode
    #[arg(short, long, value_delimiter = ',', default_value = MATCH_PROFILE_1_VS_1)]
    pub mode: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ChallengeArgs {
    /// Opponent: username#1234, <@id> or a chat user id
    #[arg(value_name = "USER")]
    pub opponent: Option<String>,

    /// Opponent (takes precedence over the positional form)
    #[arg(short, long)]
    pub user: Option<String>,

    #[command(flatten)]
    pub search: SearchArgs,

    /// Captains Draft mode
    #[arg(short, long, value_delimiter = ',', default_value = MATCH_PROFILE_2_VS_2)]
    pub mode: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GetTicketArgs {
    /// Ticket id
    #[arg(value_name = "ID")]
    pub ticket_id: Option<String>,

    /// Ticket id (takes precedence over the positional form)
    #[arg(short, long)]
    pub id: Option<String>,

    /// Show every stored ticket
    #[arg(short, long)]
    pub all: bool,
}

/* ---- Ticket state storage ---- */

fn parse_ticket_state(object: &StorageObject) -> Result<TicketState> {
    serde_json::from_str(&object.value)
        .with_context(|| format!("malformed ticket state {}", object.key))
}

/// Stored state of ticket `ticket_id` owned by `account`.
pub async fn get_ticket_state(
    backend: &dyn Backend,
    ticket_id: &str,
    account: &Account,
) -> Result<Option<TicketState>> {
    let objects = list_user_objects(backend, TICKET_COLLECTION, &account.user.id).await?;
    objects
        .iter()
        .find(|o| o.key == ticket_id)
        .map(parse_ticket_state)
        .transpose()
}

/// Ticket referenced by the user's "last" record, if any.
pub async fn ticket_state_for(
    backend: &dyn Backend,
    account: &Account,
    user_data: &UserData,
) -> Result<Option<TicketState>> {
    if user_data.ticket_id.is_empty() {
        return Ok(None);
    }
    get_ticket_state(backend, &user_data.ticket_id, account).await
}

pub async fn get_last_user_ticket_state(
    backend: &dyn Backend,
    account: &Account,
) -> Result<Option<TicketState>> {
    let user_data = get_last_user_data(backend, account).await?;
    ticket_state_for(backend, account, &user_data).await
}

/// Every stored ticket of `account`, newest first.
pub async fn list_ticket_states(backend: &dyn Backend, account: &Account) -> Result<Vec<TicketState>> {
    list_user_objects(backend, TICKET_COLLECTION, &account.user.id)
        .await?
        .iter()
        .map(parse_ticket_state)
        .collect()
}

pub async fn delete_ticket_state(backend: &dyn Backend, ticket_id: &str) -> Result<()> {
    let ids = [DeleteStorageObjectId {
        collection: TICKET_COLLECTION.to_string(),
        key: ticket_id.to_string(),
        version: String::new(),
    }];
    backend
        .delete_storage_objects(&ids)
        .await
        .with_context(|| format!("delete ticket state {ticket_id}"))
}

async fn store_ticket_state(backend: &dyn Backend, state: &TicketState) -> Result<()> {
    rpc_json(
        backend,
        "TicketStateCreate",
        &TicketStateCreateRequest {
            ticket_state: state,
            user_id: &state.user_id,
        },
    )
    .await?;
    Ok(())
}

/* ---- Ticket construction ---- */

fn team_user(account: &Account, user_data: &UserData) -> TeamUser {
    let (name, discriminator) = account.username_parts();
    TeamUser {
        user: Some(User {
            discord: Some(DiscordUser {
                author_id: account.custom_id.clone(),
                username: name.to_string(),
                channel_id: user_data.discord_channel_id.clone(),
                discriminator: discriminator.to_string(),
                guild_id: user_data.discord_guild_id.clone(),
                ..Default::default()
            }),
            nakama: Some(NakamaUser {
                custom_id: account.custom_id.clone(),
                display_name: account.user.display_name.clone(),
                id: account.user.id.clone(),
                username: account.user.username.clone(),
                wallet: account.wallet.clone(),
            }),
        }),
        ..Default::default()
    }
}

fn user_extensions(account: &Account, user_data: &UserData) -> Result<BTreeMap<String, Any>> {
    let user = Any::json(&team_user(account, user_data)).context("encode ticket user")?;
    Ok(BTreeMap::from([(TICKET_EXTENSION_USER.to_string(), user)]))
}

fn search_fields(duration: i64, modes: &[String]) -> SearchFields {
    let hours = duration as f64;
    SearchFields {
        double_args: BTreeMap::from([
            (SEARCH_MIN_DURATION.to_string(), hours),
            (SEARCH_MAX_DURATION.to_string(), hours),
        ]),
        tags: modes.to_vec(),
        ..Default::default()
    }
}

pub(crate) fn already_has_ticket(discord_id: &str, state: &TicketState) -> String {
    format!(
        "<@{discord_id}> already has a ticket. Please cancel the following ticket or finish the following match:\n{}",
        format_ticket_state(state)
    )
}

/// Store a captains-draft ticket for `account` in match `match_id` and point
/// the user's last record at it.
pub async fn create_draft_ticket_state(
    backend: &dyn Backend,
    account: &Account,
    match_id: &str,
    ready: bool,
    duration: i64,
    modes: &[String],
) -> Result<TicketState> {
    let user_data = get_last_user_data(backend, account).await?;
    let state = TicketState {
        ticket: Some(Ticket {
            id: Uuid::new_v4().to_string(),
            create_time: Some(Timestamp::now()),
            extensions: user_extensions(account, &user_data)?,
            search_fields: Some(search_fields(duration, modes)),
            ..Default::default()
        }),
        captains_draft: true,
        match_id: match_id.to_string(),
        user_id: account.user.id.clone(),
        discord_id: account.custom_id.clone(),
        version: "*".to_string(),
        user_ready: ready,
    };
    store_ticket_state(backend, &state).await?;
    create_or_update_last_user_data(
        backend,
        account,
        UserDataPatch {
            user_id: Patch::Set(account.user.id.clone()),
            match_id: Patch::Set(match_id.to_string()),
            ticket_id: Patch::Set(state.ticket_id().to_string()),
            ..Default::default()
        },
    )
    .await?;
    tracing::info!(user = %account.user.id, match_id, ticket = state.ticket_id(), "draft ticket created");
    Ok(state)
}

/* ---- Commands ---- */

pub async fn execute_go(ctx: &CommandContext<'_>, args: GoArgs) -> Result<String> {
    validate_modes(&args.mode, MATCH_MAKER_MODES)?;
    validate_duration(args.search.duration)?;

    let account = ctx.backend.get_account().await?;
    let user_data = get_last_user_data(ctx.backend, &account).await?;
    if let Some(existing) = ticket_state_for(ctx.backend, &account, &user_data).await? {
        return Ok(already_has_ticket(&account.custom_id, &existing));
    }

    let request = CreateTicketRequest {
        ticket: Ticket {
            search_fields: Some(search_fields(args.search.duration, &args.mode)),
            extensions: user_extensions(&account, &user_data)?,
            ..Default::default()
        },
    };
    let payload = rpc_json(ctx.backend, "OpenMatchFrontendTicketCreate", &request).await?;
    let ticket: Ticket =
        serde_json::from_str(&payload).context("unexpected ticket payload from the matchmaker")?;
    if ticket.id.is_empty() {
        bail!("the matchmaker returned a ticket without an id");
    }

    let state = TicketState {
        ticket: Some(ticket),
        user_id: account.user.id.clone(),
        discord_id: account.custom_id.clone(),
        version: "*".to_string(),
        user_ready: args.search.ready,
        ..Default::default()
    };
    store_ticket_state(ctx.backend, &state).await?;
    create_or_update_last_user_data(
        ctx.backend,
        &account,
        UserDataPatch {
            user_id: Patch::Set(account.user.id.clone()),
            match_id: Patch::Clear,
            ticket_id: Patch::Set(state.ticket_id().to_string()),
            ..Default::default()
        },
    )
    .await?;
    tracing::info!(user = %account.user.id, ticket = state.ticket_id(), "ticket created");
    Ok(format_ticket_state(&state))
}

pub async fn execute_challenge(ctx: &CommandContext<'_>, args: ChallengeArgs) -> Result<String> {
    validate_modes(&args.mode, CAPTAINS_DRAFT_MODES)?;
    validate_duration(args.search.duration)?;

    let account = ctx.backend.get_account().await?;
    if let Some(existing) = get_last_user_ticket_state(ctx.backend, &account).await? {
        return Ok(already_has_ticket(&account.custom_id, &existing));
    }

    let identifier = flag_or_positional(args.user.as_deref(), args.opponent.as_deref())
        .ok_or_else(|| {
            anyhow!("Please specify the opponent user ID to challenge him in the Captains Draft mode.")
        })?;
    let opponent = get_account(ctx.backend, &identifier).await?;
    if opponent.user.id == account.user.id {
        bail!(
            "You have selected yourself as your opponent's account. Please select a different opponent account."
        );
    }
    if let Some(existing) = get_last_user_ticket_state(ctx.backend, &opponent).await? {
        return Ok(already_has_ticket(&opponent.custom_id, &existing));
    }

    let match_id = Uuid::new_v4().to_string();
    let (duration, modes) = (args.search.duration, &args.mode);
    let state = create_draft_ticket_state(
        ctx.backend,
        &account,
        &match_id,
        args.search.ready,
        duration,
        modes,
    )
    .await?;
    let opponent_state =
        create_draft_ticket_state(ctx.backend, &opponent, &match_id, false, duration, modes)
            .await?;

    let draft = Match {
        match_id: match_id.clone(),
        match_profile: modes[0].clone(),
        tickets: [&state, &opponent_state]
            .iter()
            .filter_map(|s| s.ticket.clone())
            .collect(),
        extensions: BTreeMap::from([(
            MATCH_EXTENSION_MATCH_TYPE.to_string(),
            Any::json(&MATCH_TYPE_CAPTAINS_DRAFT)?,
        )]),
        ..Default::default()
    };
    let payload = rpc_json(ctx.backend, "MatchCreate", &draft).await?;
    tracing::debug!(%match_id, %payload, "captains draft match created");
    Ok(format_ticket_state(&state))
}

pub async fn execute_get_ticket(ctx: &CommandContext<'_>, args: GetTicketArgs) -> Result<String> {
    let account = ctx.backend.get_account().await?;
    let not_found = || format!("No tickets found for <@{}>", account.custom_id);

    if args.all {
        let states = list_ticket_states(ctx.backend, &account).await?;
        if states.is_empty() {
            return Ok(not_found());
        }
        return Ok(states.iter().map(format_ticket_state).collect());
    }

    let state = match flag_or_positional(args.id.as_deref(), args.ticket_id.as_deref()) {
        Some(id) => get_ticket_state(ctx.backend, &id, &account).await?,
        None => get_last_user_ticket_state(ctx.backend, &account).await?,
    };
    Ok(state
        .as_ref()
        .map(format_ticket_state)
        .unwrap_or_else(not_found))
}
