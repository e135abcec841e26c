/*!
Command modules for the `dl` CLI.

Layout:
  src/cmd/
    mod.rs          (this file: module declarations, CommandContext, re-exports)
    model.rs        (procedure payloads: tickets, matches, teams, results)
    shared.rs       (rpc_json, validation, storage listing)
    identity.rs     (user identifier classification + account lookup)
    user_data.rs    (per-user "last" record + patch-merge)
    team.rs         (roster lookups)
    format.rs       (chat text renderers)
    ticket.rs       (go / challenge / get ticket)
    matches.rs      (get match / join / add / pick)
    ready.rs        (ready)
    cancel.rs       (cancel)
    result.rs       (win / draw / lose)
    submit.rs       (submit)
    leaderboard.rs  (lb / top)
    user.rs         (get user / login)
    get.rs          (get <match|ticket|user|lb|top>)

Conventions:
  - Each subcommand exposes an `execute_*` function taking the shared
    `CommandContext` and its clap `Args` struct, returning the text to print.
  - User-facing refusals that are not failures ("No tickets found ...")
    are returned as output; validation and remote failures are errors.
*/

pub mod cancel;
pub mod format;
pub mod get;
pub mod identity;
pub mod leaderboard;
pub mod matches;
pub mod model;
pub mod ready;
pub mod result;
pub mod shared;
pub mod submit;
pub mod team;
pub mod ticket;
pub mod user;
pub mod user_data;

use crate::config::DiscordMessage;
use crate::nakama::Backend;

pub use cancel::execute_cancel;
pub use get::{GetArgs, execute_get};
pub use leaderboard::{LeaderboardArgs, TopArgs, execute_leaderboard, execute_top};
pub use matches::{JoinArgs, PoolUserArgs, execute_add, execute_join, execute_pick};
pub use ready::{TicketIdArgs, execute_ready};
pub use result::{DrawArgs, ResultArgs, execute_draw, execute_lose, execute_win};
pub use submit::{SubmitArgs, execute_submit};
pub use ticket::{ChallengeArgs, GoArgs, execute_challenge, execute_go};
pub use user::execute_login;

/// What every command runs against: the backend and the originating chat message.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub backend: &'a dyn Backend,
    pub message: &'a DiscordMessage,
}

impl<'a> CommandContext<'a> {
    pub fn new(backend: &'a dyn Backend, message: &'a DiscordMessage) -> Self {
        Self { backend, message }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::nakama::mock::MockBackend;
    use std::sync::OnceLock;

    pub(crate) fn message() -> &'static DiscordMessage {
        static MESSAGE: OnceLock<DiscordMessage> = OnceLock::new();
        MESSAGE.get_or_init(|| DiscordMessage {
            author_id: "42".into(),
            username: "neo".into(),
            discriminator: "0001".into(),
            channel_id: "c1".into(),
            guild_id: "g1".into(),
            ..Default::default()
        })
    }

    /// Backend for user `u1` (chat id `42`, `neo#0001`).
    pub(crate) fn backend() -> MockBackend {
        MockBackend::new("u1", "42", "neo#0001")
    }

    pub(crate) fn ctx(backend: &MockBackend) -> CommandContext<'_> {
        CommandContext::new(backend, message())
    }
}
