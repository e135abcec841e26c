/*!
format.rs

Chat-flavored text rendering for command output (Discord markdown:
`**bold**`, `<@id>` mentions, fenced `yaml` blocks).

Public API Summary:
  - format_account(&Account) -> String
  - format_ticket_state(&TicketState) -> String
  - format_match_state(&MatchState) -> String (teams, draft pool, results, readiness)
  - format_submit(&Submit) -> String
  - format_leaderboard_records(&[LeaderboardRecord]) -> String
  - format_date / format_duration_nanos helpers

NOTE:
  - Renderers never fail the command: a formatting error is logged and
    yields an empty string.
*/

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt::{self, Write};

use crate::cmd::model::{
    MATCH_STATUS_AWAITING_USERS_READY, MatchState, SEARCH_MAX_DURATION, Submit, Team,
    TicketState, is_set,
};
use crate::cmd::team::users_ready;
use crate::nakama::{Account, LeaderboardRecord};

pub const CODE_BLOCK_TYPE: &str = "yaml";
const DATE_LAYOUT: &str = "%d %b %Y %H:%M:%S UTC";

fn render(view: &str, f: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    match f(&mut out) {
        Ok(()) => out,
        Err(e) => {
            tracing::error!(view, "formatting failed: {e}");
            String::new()
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Dates, durations, wallet                                                   */
/* -------------------------------------------------------------------------- */

pub fn format_date(t: &DateTime<Utc>) -> String {
    t.format(DATE_LAYOUT).to_string()
}

fn format_opt_date(t: &Option<DateTime<Utc>>) -> String {
    t.as_ref().map(format_date).unwrap_or_default()
}

pub fn format_duration_nanos(nanos: i64) -> String {
    humanize_micros(i128::from(nanos) / 1_000)
}

pub fn format_delta(delta: TimeDelta) -> String {
    humanize_micros(i128::from(delta.num_microseconds().unwrap_or(i64::MAX)))
}

/// Two most significant units, e.g. `2 days 3 hours`.
fn humanize_micros(micros: i128) -> String {
    if micros == 0 {
        return "0 seconds".to_string();
    }
    let sign = if micros < 0 { "-" } else { "" };
    let micros = micros.abs();
    let secs = micros / 1_000_000;
    let days = secs / 86_400;
    let units: [(i128, &str); 8] = [
        (days / 365, "year"),
        (days % 365 / 7, "week"),
        (days % 365 % 7, "day"),
        (secs / 3_600 % 24, "hour"),
        (secs / 60 % 60, "minute"),
        (secs % 60, "second"),
        (micros / 1_000 % 1_000, "millisecond"),
        (micros % 1_000, "microsecond"),
    ];
    let parts: Vec<String> = units
        .iter()
        .filter(|(v, _)| *v > 0)
        .take(2)
        .map(|(v, unit)| match v {
            1 => format!("1 {unit}"),
            _ => format!("{v} {unit}s"),
        })
        .collect();
    format!("{sign}{}", parts.join(" "))
}

/// `coins` from a JSON wallet string; 0 when absent or unreadable.
pub fn coins_from_wallet(wallet: &str) -> f64 {
    serde_json::from_str::<serde_json::Value>(wallet)
        .ok()
        .and_then(|w| w.get("coins")?.as_f64())
        .unwrap_or(0.0)
}

/* -------------------------------------------------------------------------- */
/* Accounts, tickets, submits, leaderboards                                   */
/* -------------------------------------------------------------------------- */

pub fn format_account(account: &Account) -> String {
    render("account", |out| {
        writeln!(out, "> User: <@{}>", account.custom_id)?;
        writeln!(out, "```{CODE_BLOCK_TYPE}")?;
        writeln!(out, "UserID: {}", account.user.id)?;
        writeln!(out, "DiscordID: {}", account.custom_id)?;
        writeln!(out, "Username: {}", account.user.username)?;
        writeln!(out, "Created: {}", format_opt_date(&account.user.create_time))?;
        writeln!(out, "Updated: {}```", format_opt_date(&account.user.update_time))?;
        writeln!(out, "> AvatarUrl: {}", account.user.avatar_url)
    })
}

fn format_search_fields(state: &TicketState) -> String {
    let Some(fields) = state.ticket.as_ref().and_then(|t| t.search_fields.as_ref()) else {
        return String::new();
    };
    let hours = fields
        .double_args
        .get(SEARCH_MAX_DURATION)
        .copied()
        .unwrap_or_default();
    format!("[{}] {hours} hours, ", fields.tags.join(" "))
}

pub fn format_ticket_state(state: &TicketState) -> String {
    render("ticket state", |out| {
        writeln!(out, "> User: <@{}>", state.discord_id)?;
        writeln!(out, "```{CODE_BLOCK_TYPE}")?;
        writeln!(out, "TicketID: {}", state.ticket_id())?;
        if state.match_id.is_empty() {
            writeln!(out, "MatchID: Not assigned")?;
        } else {
            writeln!(out, "MatchID: {}", state.match_id)?;
        }
        writeln!(out, "SearchFields: {}", format_search_fields(state))?;
        let created = state
            .ticket
            .as_ref()
            .and_then(|t| t.create_time.as_ref())
            .and_then(|t| t.to_datetime());
        writeln!(out, "CreateTime: {}```", format_opt_date(&created))
    })
}

pub fn format_submit(submit: &Submit) -> String {
    render("submit", |out| {
        writeln!(out, "```{CODE_BLOCK_TYPE}")?;
        writeln!(
            out,
            "Score: {}.{} | Date: {} | Proof: {}```",
            submit.score,
            submit.subscore,
            format_opt_date(&submit.datetime),
            submit.proof_link
        )
    })
}

pub fn format_leaderboard_records(records: &[LeaderboardRecord]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };
    render("leaderboard", |out| {
        writeln!(out, "> Match Leaderboard **{}** :", first.leaderboard_id)?;
        for r in records {
            writeln!(out, "> <@{}> {}.{}", r.username, r.score, r.subscore)?;
        }
        writeln!(out)
    })
}

/* -------------------------------------------------------------------------- */
/* Matches                                                                    */
/* -------------------------------------------------------------------------- */

pub fn format_team(team: &Team) -> String {
    render("team", |out| {
        write!(out, "> **{}** ", team.id)?;
        if !team.name.is_empty() {
            write!(out, "**{}**", team.name)?;
        }
        write!(out, ":")?;
        for member in &team.team_users {
            let Some(user) = member.nakama() else {
                continue;
            };
            write!(out, " <@{}> {}", user.custom_id, user.username)?;
            if !user.wallet.is_empty() {
                write!(out, " ({})", coins_from_wallet(&user.wallet))?;
            }
            if member.reward > 0.0 {
                write!(out, " **+{}**", member.reward)?;
            } else if member.reward < 0.0 {
                write!(out, " **-{}**", member.reward.abs())?;
            }
        }
        writeln!(out)
    })
}

pub fn format_teams(teams: &[Team]) -> String {
    let mut out = String::from("> Teams:\n");
    for team in teams {
        out.push_str(&format_team(team));
    }
    out
}

fn format_draft_pool(state: &MatchState) -> String {
    if !state.is_captains_draft() {
        return String::new();
    }
    render("draft pool", |out| {
        writeln!(out, "> Captain Draft mode:")?;
        if !state.captain_turn_user_id.is_empty() {
            writeln!(out, "> CaptainTurnUserID: <@{}>", state.captain_turn_user_id)?;
        }
        if !state.captain_user_ids.is_empty() {
            writeln!(out, "> Captain User IDs:")?;
            for id in &state.captain_user_ids {
                writeln!(out, "> <@{id}>")?;
            }
        }
        if !state.pool_user_custom_ids.is_empty() {
            writeln!(out, "> Draft Pool User IDs:")?;
            for id in &state.pool_user_custom_ids {
                writeln!(out, "> <@{id}>")?;
            }
        }
        writeln!(out)
    })
}

fn format_results(state: &MatchState) -> String {
    if state.results.is_empty() {
        return String::new();
    }
    render("results", |out| {
        writeln!(out, "> Results:")?;
        for r in &state.results {
            write!(out, ">   <@{}> ", r.discord_id)?;
            if r.draw {
                write!(out, "**Draw**")?;
            } else {
                let outcome = if r.win { "Win" } else { "Lose" };
                write!(out, "**Team {}** **{outcome}**", r.team_number)?;
            }
            writeln!(out, " {} {}", r.proof_link, format_opt_date(&r.date_time))?;
        }
        writeln!(out)
    })
}

fn format_readiness(state: &MatchState) -> String {
    if state.status != MATCH_STATUS_AWAITING_USERS_READY {
        return String::new();
    }
    let teams = users_ready(state);
    render("readiness", |out| {
        if !teams.is_empty() {
            writeln!(out, "> Ready:")?;
            for (n, users) in teams.iter().enumerate() {
                let ready: Vec<String> = users
                    .iter()
                    .filter(|u| u.ready)
                    .map(|u| format!("**<@{}>**", u.discord_id))
                    .collect();
                writeln!(out, "> Team **{n}**: {}", ready.join(" "))?;
            }
        }
        if teams.iter().flatten().any(|u| !u.ready) {
            writeln!(out, "\n> Not ready:")?;
            for (n, users) in teams.iter().enumerate() {
                let waiting: Vec<String> = users
                    .iter()
                    .filter(|u| !u.ready)
                    .map(|u| format!("<@{}>", u.discord_id))
                    .collect();
                writeln!(out, "> Team **{n}**: {}", waiting.join(" "))?;
            }
        }
        writeln!(out)
    })
}

pub fn format_match_state(state: &MatchState) -> String {
    format_match_state_at(state, Utc::now())
}

/// Render with `now` as the reference for elapsed time.
pub fn format_match_state_at(state: &MatchState, now: DateTime<Utc>) -> String {
    let header = render("match state", |out| {
        writeln!(out, "```{CODE_BLOCK_TYPE}")?;
        writeln!(out, "MatchID: {}```", state.match_id)?;
        out.push_str(&format_teams(&state.teams));
        let active = if state.active { "True" } else { "False" };
        writeln!(out, "> Active: **{active}**")?;
        writeln!(out, "> Mode: **{}**", state.match_profile)?;
        writeln!(out, "> Status: **{}**", state.status)?;
        writeln!(out, "> Duration: **{}**", format_duration_nanos(state.duration))?;
        if state.started {
            writeln!(out, "> Start date: **{}**", format_opt_date(&state.date_time_start))?;
            writeln!(out, "> End date: **{}**", format_opt_date(&state.date_time_end))?;
            if state.active
                && let Some(start) = state.date_time_start
            {
                writeln!(out, "> Elapsed time: **{}**", format_delta(now - start))?;
            }
            if is_set(&state.actual_date_time_end) {
                writeln!(
                    out,
                    "> Actual end date: **{}**",
                    format_opt_date(&state.actual_date_time_end)
                )?;
            }
            if state.actual_duration != 0 {
                writeln!(
                    out,
                    "> Actual duration: **{}**",
                    format_duration_nanos(state.actual_duration)
                )?;
            }
        }
        Ok(())
    });
    if header.is_empty() {
        return header;
    }
    [
        header,
        format_draft_pool(state),
        format_results(state),
        format_readiness(state),
    ]
    .concat()
}
