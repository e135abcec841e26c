//! Roster lookups over a match snapshot.

use crate::cmd::model::MatchState;

/// Readiness of one roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserReady {
    pub ready: bool,
    pub user_id: String,
    pub discord_id: String,
}

/// Zero-based position of the team `user_id` plays for.
pub fn team_number_of(state: &MatchState, user_id: &str) -> Option<usize> {
    state
        .teams
        .iter()
        .position(|t| t.team_users.iter().any(|u| u.user_id() == user_id))
}

/// Readiness per team, in team order.
pub fn users_ready(state: &MatchState) -> Vec<Vec<UserReady>> {
    state
        .teams
        .iter()
        .map(|team| {
            team.team_users
                .iter()
                .map(|u| UserReady {
                    ready: state.ready_user_ids.iter().any(|id| id == u.user_id()),
                    user_id: u.user_id().to_string(),
                    discord_id: u.discord_id().to_string(),
                })
                .collect()
        })
        .collect()
}
