//! Resolve free-form user identifiers (`name#1234`, `<@id>`, `id`) to backend accounts.

use anyhow::{Context, Result, bail};

use crate::cmd::model::AccountGetRequest;
use crate::cmd::shared::rpc_json;
use crate::nakama::{Account, Backend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentity {
    /// `username#1234`
    UsernameWithDiscriminator(String),
    /// Bare numeric chat id
    DiscordId(String),
    /// Mention form `<@id>`, carried with the decoration stripped
    Mention(String),
    Undefined,
}

impl UserIdentity {
    pub fn detect(identifier: &str) -> Self {
        let identifier = identifier.trim();
        if identifier.contains('#') {
            return Self::UsernameWithDiscriminator(identifier.to_string());
        }
        if identifier.starts_with('<') && identifier.contains('@') && identifier.ends_with('>') {
            let id: String = identifier
                .chars()
                .filter(|c| !matches!(c, '<' | '@' | '>'))
                .collect();
            return Self::Mention(id);
        }
        if identifier.parse::<i64>().is_ok() {
            return Self::DiscordId(identifier.to_string());
        }
        Self::Undefined
    }

    /// Procedure and identifier used for the lookup.
    fn lookup(&self) -> Option<(&'static str, &str)> {
        match self {
            Self::UsernameWithDiscriminator(name) => Some(("AccountByUsernameGet", name)),
            Self::DiscordId(id) | Self::Mention(id) => Some(("AccountByCustomIDGet", id)),
            Self::Undefined => None,
        }
    }
}

/// Look up the account behind `identifier`.
pub async fn get_account(backend: &dyn Backend, identifier: &str) -> Result<Account> {
    let identity = UserIdentity::detect(identifier);
    let Some((rpc_id, key)) = identity.lookup() else {
        bail!("Discord user ID is invalid");
    };
    tracing::debug!(?identity, "resolving account");
    let payload = rpc_json(backend, rpc_id, &AccountGetRequest { identifier: key }).await?;
    if payload.trim().is_empty() {
        bail!("User {identifier} not found");
    }
    let account: Option<Account> =
        serde_json::from_str(&payload).context("unexpected account payload")?;
    match account {
        Some(account) if !account.user.id.is_empty() => Ok(account),
        _ => bail!("User {identifier} not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nakama::mock::MockBackend;

    #[test]
    fn detect_forms() {
        assert_eq!(
            UserIdentity::detect("neo#1234"),
            UserIdentity::UsernameWithDiscriminator("neo#1234".into())
        );
        assert_eq!(
            UserIdentity::detect("554195751274807297"),
            UserIdentity::DiscordId("554195751274807297".into())
        );
        assert_eq!(
            UserIdentity::detect("<@554195751274807297>"),
            UserIdentity::Mention("554195751274807297".into())
        );
        assert_eq!(UserIdentity::detect("neo"), UserIdentity::Undefined);
        assert_eq!(UserIdentity::detect(""), UserIdentity::Undefined);
    }

    #[tokio::test]
    async fn username_lookup_uses_username_procedure() {
        let backend = MockBackend::new("u1", "1", "me#0001");
        backend.respond(
            "AccountByUsernameGet",
            r#"{"user":{"id":"u2","username":"neo#1234"},"custom_id":"2"}"#,
        );
        let account = get_account(&backend, "neo#1234").await.unwrap();
        assert_eq!(account.user.id, "u2");
        assert_eq!(
            backend.payload("AccountByUsernameGet").unwrap()["Identifier"],
            "neo#1234"
        );
    }

    #[tokio::test]
    async fn mention_lookup_strips_decoration() {
        let backend = MockBackend::new("u1", "1", "me#0001");
        backend.respond(
            "AccountByCustomIDGet",
            r#"{"user":{"id":"u2"},"custom_id":"2"}"#,
        );
        get_account(&backend, "<@2>").await.unwrap();
        assert_eq!(backend.payload("AccountByCustomIDGet").unwrap()["Identifier"], "2");
    }

    #[tokio::test]
    async fn invalid_identifier_makes_no_call() {
        let backend = MockBackend::new("u1", "1", "me#0001");
        let err = get_account(&backend, "someone").await.unwrap_err();
        assert_eq!(err.to_string(), "Discord user ID is invalid");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_account_reported() {
        let backend = MockBackend::new("u1", "1", "me#0001");
        backend.respond("AccountByCustomIDGet", "null");
        let err = get_account(&backend, "77").await.unwrap_err();
        assert_eq!(err.to_string(), "User 77 not found");
    }
}
