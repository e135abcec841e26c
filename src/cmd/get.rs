/*!
`get.rs`

Implements the `get` subcommand for the `dl` CLI.

Subjects:
  - match  (m) : one match snapshot, or every stored match with `--all`
  - ticket (t) : one ticket state, or every ticket of the user with `--all`
  - user   (u) : account summary, self by default
  - lb         : leaderboard of one match
  - top        : the league-wide leaderboard

`lb` and `top` are also reachable as top-level commands; both paths share
the same argument structs and handlers.
*/

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cmd::CommandContext;
use crate::cmd::leaderboard::{LeaderboardArgs, TopArgs, execute_leaderboard, execute_top};
use crate::cmd::matches::{GetMatchArgs, execute_get_match};
use crate::cmd::ticket::{GetTicketArgs, execute_get_ticket};
use crate::cmd::user::{GetUserArgs, execute_get_user};

/// CLI arguments for `dl get <subject>`
#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(subcommand)]
    pub subject: GetSubject,
}

#[derive(Subcommand, Debug)]
pub enum GetSubject {
    /// Match state by id, or the user's last match
    #[command(visible_alias = "m")]
    Match(GetMatchArgs),

    /// Ticket state by id, or the user's last ticket
    #[command(visible_alias = "t")]
    Ticket(GetTicketArgs),

    /// Account summary
    #[command(visible_alias = "u")]
    User(GetUserArgs),

    /// Match leaderboard
    Lb(LeaderboardArgs),

    /// League leaderboard
    Top(TopArgs),
}

/// Entrypoint for `get` subcommand.
pub async fn execute_get(ctx: &CommandContext<'_>, args: GetArgs) -> Result<String> {
    tracing::debug!(subject = ?args.subject, "get");
    match args.subject {
        GetSubject::Match(a) => execute_get_match(ctx, a).await,
        GetSubject::Ticket(a) => execute_get_ticket(ctx, a).await,
        GetSubject::User(a) => execute_get_user(ctx, a).await,
        GetSubject::Lb(a) => execute_leaderboard(ctx, a).await,
        GetSubject::Top(a) => execute_top(ctx, a).await,
    }
}
