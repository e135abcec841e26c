//! `submit`: post a score and proof link to the leaderboard of an active match.

use anyhow::{Result, bail};
use chrono::Utc;
use clap::Args;

use crate::cmd::CommandContext;
use crate::cmd::format::format_submit;
use crate::cmd::matches::{get_last_user_match_state, get_match_state};
use crate::cmd::model::{MATCH_COLLECTION, Submit, SubmitCreateRequest};
use crate::cmd::shared::{flag_or_positional, normalize_proof_link, rpc_json, split_score};

#[derive(Args, Debug, Clone, Default)]
pub struct SubmitArgs {
    /// Score, a positive number
    #[arg(value_name = "SCORE", allow_negative_numbers = true)]
    pub target_score: Option<f64>,

    /// Proof link, must be a valid http(s) URL
    #[arg(value_name = "PROOF")]
    pub target_proof: Option<String>,

    /// Match id (defaults to the user's last match)
    #[arg(value_name = "MATCH_ID")]
    pub target_match: Option<String>,

    #[arg(short, long, allow_negative_numbers = true)]
    pub score: Option<f64>,

    #[arg(short, long)]
    pub proof: Option<String>,

    #[arg(short, long)]
    pub match_id: Option<String>,
}

pub async fn execute_submit(ctx: &CommandContext<'_>, args: SubmitArgs) -> Result<String> {
    let (score, subscore) = split_score(args.score.or(args.target_score).unwrap_or(0.0))?;
    let Some(proof) = flag_or_positional(args.proof.as_deref(), args.target_proof.as_deref()) else {
        bail!("proof link is **required**");
    };
    let proof_link = normalize_proof_link(&proof)?;

    let account = ctx.backend.get_account().await?;
    let state = match flag_or_positional(args.match_id.as_deref(), args.target_match.as_deref()) {
        Some(id) => get_match_state(ctx.backend, &id, MATCH_COLLECTION).await?,
        None => get_last_user_match_state(ctx.backend, &account, MATCH_COLLECTION).await?,
    };
    let Some(state) = state else {
        return Ok(format!("No active matches found for <@{}>", account.custom_id));
    };
    if !(state.active && state.started) {
        return Ok("Match is not active or not started yet".to_string());
    }

    let submit = Submit {
        datetime: Some(Utc::now()),
        score,
        subscore,
        proof_link,
    };
    let request = SubmitCreateRequest {
        submit: &submit,
        match_id: &state.match_id,
        user_id: &account.user.id,
    };
    rpc_json(ctx.backend, "SubmitCreate", &request).await?;
    tracing::info!(match_id = %state.match_id, score, subscore, "score submitted");
    Ok(format_submit(&submit))
}
