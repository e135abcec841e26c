//! `ready`: confirm readiness for the match a ticket was assigned to.

use anyhow::Result;
use clap::Args;

use crate::cmd::CommandContext;
use crate::cmd::model::{MatchUserRequest, TicketState};
use crate::cmd::shared::{flag_or_positional, rpc_json};
use crate::cmd::ticket::{get_last_user_ticket_state, get_ticket_state};
use crate::nakama::Account;

#[derive(Args, Debug, Clone, Default)]
pub struct TicketIdArgs {
    /// Ticket id (defaults to the user's last ticket)
    #[arg(value_name = "TICKET_ID")]
    pub target: Option<String>,

    /// Ticket id (takes precedence over the positional form)
    #[arg(short, long)]
    pub ticket_id: Option<String>,
}

impl TicketIdArgs {
    pub(crate) fn resolve(&self) -> Option<String> {
        flag_or_positional(self.ticket_id.as_deref(), self.target.as_deref())
    }
}

/// Explicit ticket when given, otherwise the one referenced by the user's last record.
pub(crate) async fn select_ticket_state(
    ctx: &CommandContext<'_>,
    account: &Account,
    args: &TicketIdArgs,
) -> Result<Option<TicketState>> {
    match args.resolve() {
        Some(id) => get_ticket_state(ctx.backend, &id, account).await,
        None => get_last_user_ticket_state(ctx.backend, account).await,
    }
}

pub async fn execute_ready(ctx: &CommandContext<'_>, args: TicketIdArgs) -> Result<String> {
    let account = ctx.backend.get_account().await?;
    let Some(state) = select_ticket_state(ctx, &account, &args).await? else {
        return Ok(format!("No tickets found for <@{}>", account.custom_id));
    };
    if state.match_id.is_empty() {
        return Ok(format!(
            "Ticket **{}** is not assigned to any match",
            state.ticket_id()
        ));
    }
    let request = MatchUserRequest {
        match_id: &state.match_id,
        user_id: &account.user.id,
    };
    rpc_json(ctx.backend, "MatchReady", &request).await
}
