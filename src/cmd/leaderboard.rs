//! Leaderboard views: `lb` (one match) and `top` (the league-wide board).

use anyhow::{Context, Result};
use clap::Args;

use crate::cmd::CommandContext;
use crate::cmd::format::format_leaderboard_records;
use crate::cmd::identity::get_account;
use crate::cmd::matches::{get_last_user_match_state, get_match_state};
use crate::cmd::model::{MAIN_LEADERBOARD, MAX_LIST_LIMIT};
use crate::cmd::shared::flag_or_positional;
use crate::nakama::{Backend, LeaderboardRecord};

#[derive(Args, Debug, Clone, Default)]
pub struct LeaderboardArgs {
    /// Match id (defaults to the user's last match)
    #[arg(value_name = "MATCH_ID")]
    pub target: Option<String>,

    #[arg(short, long)]
    pub match_id: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TopArgs {
    /// User to center the board on (defaults to self)
    #[arg(value_name = "USER")]
    pub target: Option<String>,

    #[arg(short, long)]
    pub discord_id: Option<String>,
}

async fn records_around(
    backend: &dyn Backend,
    leaderboard_id: &str,
    owner_id: &str,
) -> Result<Vec<LeaderboardRecord>> {
    let list = backend
        .list_leaderboard_records_around_owner(leaderboard_id, owner_id, MAX_LIST_LIMIT)
        .await
        .with_context(|| format!("list records of leaderboard {leaderboard_id}"))?;
    Ok(list.records)
}

pub async fn execute_leaderboard(ctx: &CommandContext<'_>, args: LeaderboardArgs) -> Result<String> {
    let account = ctx.backend.get_account().await?;
    let state = match flag_or_positional(args.match_id.as_deref(), args.target.as_deref()) {
        Some(id) => get_match_state(ctx.backend, &id, "").await?,
        None => get_last_user_match_state(ctx.backend, &account, "").await?,
    };
    let Some(state) = state else {
        return Ok(format!("No match found for user <@{}>", account.custom_id));
    };

    let records = records_around(ctx.backend, &state.match_id, &account.user.id).await?;
    if records.is_empty() {
        return Ok(format!(
            "No leaderboard records found for match **{}**",
            state.match_id
        ));
    }
    Ok(format_leaderboard_records(&records))
}

pub async fn execute_top(ctx: &CommandContext<'_>, args: TopArgs) -> Result<String> {
    let account = match flag_or_positional(args.discord_id.as_deref(), args.target.as_deref()) {
        Some(identifier) => get_account(ctx.backend, &identifier).await?,
        None => ctx.backend.get_account().await?,
    };
    let records = records_around(ctx.backend, MAIN_LEADERBOARD, &account.user.id).await?;
    if records.is_empty() {
        return Ok(format!("No leaderboard records found for the {MAIN_LEADERBOARD}"));
    }
    Ok(format_leaderboard_records(&records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::{backend, ctx};

    fn record(leaderboard_id: &str, username: &str, score: i64, subscore: i64) -> LeaderboardRecord {
        LeaderboardRecord {
            leaderboard_id: leaderboard_id.into(),
            username: username.into(),
            score,
            subscore,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn match_leaderboard() {
        let backend = backend();
        backend.respond("MatchStateGet", r#"{"MatchID":"m1"}"#);
        backend.leaderboard.lock().unwrap().extend([
            record("m1", "42", 10, 5),
            record("m1", "43", 8, 0),
            record("other", "44", 99, 0),
        ]);
        let args = LeaderboardArgs {
            target: Some("m1".into()),
            match_id: None,
        };
        let out = execute_leaderboard(&ctx(&backend), args).await.unwrap();
        assert_eq!(
            out,
            "> Match Leaderboard **m1** :\n> <@42> 10.5\n> <@43> 8.0\n\n"
        );
    }

    #[tokio::test]
    async fn match_leaderboard_empty_and_missing() {
        let backend = backend();
        backend.respond("MatchStateGet", r#"{"MatchID":"m1"}"#);
        let args = LeaderboardArgs {
            target: None,
            match_id: Some("m1".into()),
        };
        let out = execute_leaderboard(&ctx(&backend), args).await.unwrap();
        assert_eq!(out, "No leaderboard records found for match **m1**");

        let none = crate::cmd::testing::backend();
        let args = LeaderboardArgs {
            target: Some("m1".into()),
            match_id: None,
        };
        let out = execute_leaderboard(&ctx(&none), args).await.unwrap();
        assert_eq!(out, "No match found for user <@42>");
    }

    #[tokio::test]
    async fn top_for_self_and_other() {
        let backend = backend();
        let out = execute_top(&ctx(&backend), TopArgs::default()).await.unwrap();
        assert_eq!(out, "No leaderboard records found for the Main Leaderboard");

        backend
            .leaderboard
            .lock()
            .unwrap()
            .push(record(MAIN_LEADERBOARD, "43", 3, 0));
        backend.respond("AccountByCustomIDGet", r#"{"user":{"id":"u2"},"custom_id":"43"}"#);
        let args = TopArgs {
            target: None,
            discord_id: Some("43".into()),
        };
        let out = execute_top(&ctx(&backend), args).await.unwrap();
        assert!(out.starts_with("> Match Leaderboard **Main Leaderboard** :\n"));
        assert_eq!(
            backend.payload("AccountByCustomIDGet").unwrap()["Identifier"],
            "43"
        );
    }
}
