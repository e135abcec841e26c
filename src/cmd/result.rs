/*!
`result.rs`

Early match outcome reports: `win`, `draw`, `lose`.

Resolution order:
  - match : `--match-id`, then the positional id, then the user's last match
  - team  : `--team-id`, then the positional team, then the team the user plays for
  - proof : optional; normalized to an http(s) URL when present
*/

use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use clap::Args;

use crate::cmd::CommandContext;
use crate::cmd::matches::{get_last_user_match_state, get_match_state};
use crate::cmd::model::{MATCH_COLLECTION, MatchResult, MatchResultRequest, MatchState};
use crate::cmd::shared::{flag_or_positional, normalize_proof_link, pretty_payload, rpc_json};
use crate::cmd::team::team_number_of;
use crate::nakama::Account;

#[derive(Args, Debug, Clone, Default)]
pub struct ResultArgs {
    /// Team number (defaults to the user's team)
    #[arg(value_name = "TEAM", allow_negative_numbers = true)]
    pub team: Option<i64>,

    /// Match id (defaults to the user's last match)
    #[arg(value_name = "MATCH_ID")]
    pub target_match: Option<String>,

    /// Proof link, must be a valid http(s) URL
    #[arg(value_name = "PROOF")]
    pub target_proof: Option<String>,

    #[arg(short = 't', long, allow_negative_numbers = true)]
    pub team_id: Option<i64>,

    #[arg(short, long)]
    pub match_id: Option<String>,

    #[arg(short, long)]
    pub proof: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DrawArgs {
    /// Match id (defaults to the user's last match)
    #[arg(value_name = "MATCH_ID")]
    pub target_match: Option<String>,

    /// Proof link, must be a valid http(s) URL
    #[arg(value_name = "PROOF")]
    pub target_proof: Option<String>,

    #[arg(short, long)]
    pub match_id: Option<String>,

    #[arg(short, long)]
    pub proof: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Win,
    Lose,
    Draw,
}

struct Report {
    outcome: Outcome,
    team: Option<i64>,
    match_id: Option<String>,
    proof: Option<String>,
}

impl ResultArgs {
    fn into_report(self, outcome: Outcome) -> Report {
        Report {
            outcome,
            team: self.team_id.or(self.team),
            match_id: flag_or_positional(self.match_id.as_deref(), self.target_match.as_deref()),
            proof: flag_or_positional(self.proof.as_deref(), self.target_proof.as_deref()),
        }
    }
}

impl DrawArgs {
    fn into_report(self) -> Report {
        Report {
            outcome: Outcome::Draw,
            team: None,
            match_id: flag_or_positional(self.match_id.as_deref(), self.target_match.as_deref()),
            proof: flag_or_positional(self.proof.as_deref(), self.target_proof.as_deref()),
        }
    }
}

fn resolve_team(state: &MatchState, account: &Account, report: &Report) -> Result<i64> {
    if report.outcome == Outcome::Draw {
        return Ok(team_number_of(state, &account.user.id).unwrap_or(0) as i64);
    }
    match report.team {
        Some(n) if n < 0 || n >= state.teams.len() as i64 => bail!("Incorrect team number {n}"),
        Some(n) => Ok(n),
        None => team_number_of(state, &account.user.id)
            .map(|n| n as i64)
            .ok_or_else(|| {
                anyhow!(
                    "<@{}> is not playing in match **{}**, please specify the team number",
                    account.custom_id,
                    state.match_id
                )
            }),
    }
}

async fn report_result(ctx: &CommandContext<'_>, report: Report) -> Result<String> {
    let account = ctx.backend.get_account().await?;
    let proof_link = match report.proof.as_deref() {
        Some(proof) => normalize_proof_link(proof)?,
        None => String::new(),
    };

    let state = match report.match_id.as_deref() {
        Some(id) => get_match_state(ctx.backend, id, MATCH_COLLECTION).await?,
        None => get_last_user_match_state(ctx.backend, &account, MATCH_COLLECTION).await?,
    };
    let state = state.ok_or_else(|| anyhow!("No match found for <@{}>", account.custom_id))?;
    let team_number = resolve_team(&state, &account, &report)?;

    let result = MatchResult {
        user_id: account.user.id.clone(),
        discord_id: account.custom_id.clone(),
        proof_link,
        team_number,
        win: report.outcome == Outcome::Win,
        draw: report.outcome == Outcome::Draw,
        date_time: Some(Utc::now()),
    };
    tracing::info!(match_id = %state.match_id, team = team_number, outcome = ?report.outcome, "reporting result");
    let request = MatchResultRequest {
        match_result: &result,
        match_id: &state.match_id,
    };
    let payload = rpc_json(ctx.backend, "MatchResult", &request).await?;
    Ok(pretty_payload(&payload))
}

pub async fn execute_win(ctx: &CommandContext<'_>, args: ResultArgs) -> Result<String> {
    report_result(ctx, args.into_report(Outcome::Win)).await
}

pub async fn execute_lose(ctx: &CommandContext<'_>, args: ResultArgs) -> Result<String> {
    report_result(ctx, args.into_report(Outcome::Lose)).await
}

pub async fn execute_draw(ctx: &CommandContext<'_>, args: DrawArgs) -> Result<String> {
    report_result(ctx, args.into_report()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::{backend, ctx};
    use crate::cmd::ticket::tests::with_ticket;

    const MATCH_JSON: &str = r#"{"MatchID":"m1","Active":true,"Started":true,
        "Teams":[{"ID":0,"TeamUsers":[{"User":{"Nakama":{"ID":"u1","CustomID":"42"}}}]},
                 {"ID":1,"TeamUsers":[{"User":{"Nakama":{"ID":"u2","CustomID":"43"}}}]}]}"#;

    #[tokio::test]
    async fn win_uses_users_team_and_last_match() {
        let backend = backend();
        with_ticket(&backend, "u1", "t1", "m1");
        backend.respond("MatchStateGet", MATCH_JSON);
        backend.respond("MatchResult", r#"{"ok":true}"#);
        let args = ResultArgs {
            proof: Some("example.com/replay".into()),
            ..Default::default()
        };
        let out = execute_win(&ctx(&backend), args).await.unwrap();
        assert_eq!(out, "{\n  \"ok\": true\n}");

        let get = backend.payload("MatchStateGet").unwrap();
        assert_eq!(get["ID"], "m1");
        assert_eq!(get["StorageCollection"], MATCH_COLLECTION);

        let request = backend.payload("MatchResult").unwrap();
        assert_eq!(request["MatchID"], "m1");
        let result = &request["MatchResult"];
        assert_eq!(result["TeamNumber"], 0);
        assert_eq!(result["Win"], true);
        assert_eq!(result["Draw"], false);
        assert_eq!(result["DiscordID"], "42");
        assert_eq!(result["ProofLink"], "http://example.com/replay");
    }

    #[tokio::test]
    async fn lose_with_explicit_team_and_match() {
        let backend = backend();
        backend.respond("MatchStateGet", MATCH_JSON);
        let args = ResultArgs {
            team: Some(1),
            target_match: Some("m1".into()),
            ..Default::default()
        };
        execute_lose(&ctx(&backend), args).await.unwrap();
        let result = &backend.payload("MatchResult").unwrap()["MatchResult"];
        assert_eq!(result["TeamNumber"], 1);
        assert_eq!(result["Win"], false);
        assert_eq!(result["ProofLink"], "");
    }

    #[tokio::test]
    async fn out_of_range_team_rejected() {
        let backend = backend();
        backend.respond("MatchStateGet", MATCH_JSON);
        for team in [2, -1] {
            let args = ResultArgs {
                team_id: Some(team),
                match_id: Some("m1".into()),
                ..Default::default()
            };
            let err = execute_win(&ctx(&backend), args).await.unwrap_err();
            assert_eq!(err.to_string(), format!("Incorrect team number {team}"));
        }
        assert!(backend.payload("MatchResult").is_none());
    }

    #[tokio::test]
    async fn draw_without_match() {
        let backend = backend();
        with_ticket(&backend, "u1", "t1", "");
        let err = execute_draw(&ctx(&backend), DrawArgs::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No match found for <@42>");
    }

    #[tokio::test]
    async fn draw_reports_users_team() {
        let backend = backend();
        backend.respond("MatchStateGet", MATCH_JSON);
        let args = DrawArgs {
            target_match: Some("m1".into()),
            ..Default::default()
        };
        execute_draw(&ctx(&backend), args).await.unwrap();
        let result = &backend.payload("MatchResult").unwrap()["MatchResult"];
        assert_eq!(result["Draw"], true);
        assert_eq!(result["TeamNumber"], 0);
    }

    #[tokio::test]
    async fn malformed_proof_rejected_before_any_call() {
        let backend = backend();
        let args = ResultArgs {
            proof: Some("http://".into()),
            ..Default::default()
        };
        let err = execute_win(&ctx(&backend), args).await.unwrap_err();
        assert!(err.to_string().contains("is not a valid url for the proof link"));
        assert!(backend.calls().is_empty());
    }
}
