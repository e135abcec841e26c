//! Account commands: `get user` and `login`.

use anyhow::Result;
use clap::Args;

use crate::cmd::CommandContext;
use crate::cmd::format::format_account;
use crate::cmd::identity::get_account;
use crate::cmd::shared::flag_or_positional;
use crate::cmd::user_data::{UserData, write_last_user_data};

#[derive(Args, Debug, Clone, Default)]
pub struct GetUserArgs {
    /// User: username#1234, <@id> or a chat user id (defaults to self)
    #[arg(value_name = "USER")]
    pub target: Option<String>,

    #[arg(short, long)]
    pub user: Option<String>,
}

pub async fn execute_get_user(ctx: &CommandContext<'_>, args: GetUserArgs) -> Result<String> {
    let account = match flag_or_positional(args.user.as_deref(), args.target.as_deref()) {
        Some(identifier) => get_account(ctx.backend, &identifier).await?,
        None => ctx.backend.get_account().await?,
    };
    Ok(format_account(&account))
}

/// Reset the user's last record to the channel and guild the command came from.
pub async fn execute_login(ctx: &CommandContext<'_>) -> Result<String> {
    let account = ctx.backend.get_account().await?;
    let user_data = UserData {
        user_id: account.user.id.clone(),
        discord_channel_id: ctx.message.channel_id.clone(),
        discord_guild_id: ctx.message.guild_id.clone(),
        ..Default::default()
    };
    write_last_user_data(ctx.backend, &user_data).await?;
    tracing::info!(user = %account.user.id, channel = %user_data.discord_channel_id, "logged in");
    Ok(format!(
        "User <@{}> has successfully logged in",
        account.custom_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::{backend, ctx};
    use crate::cmd::ticket::tests::with_ticket;

    #[tokio::test]
    async fn login_overwrites_user_data() {
        let backend = backend();
        with_ticket(&backend, "u1", "t1", "m1");
        let out = execute_login(&ctx(&backend)).await.unwrap();
        assert_eq!(out, "User <@42> has successfully logged in");

        let written = backend.payload("LastUserDataCreate").unwrap();
        assert_eq!(written["UserID"], "u1");
        let data = &written["UserData"];
        assert_eq!(data["TicketID"], "");
        assert_eq!(data["MatchID"], "");
        assert_eq!(data["DiscordChannelID"], "c1");
        assert_eq!(data["DiscordGuildID"], "g1");
    }

    #[tokio::test]
    async fn get_user_defaults_to_self() {
        let backend = backend();
        let out = execute_get_user(&ctx(&backend), GetUserArgs::default())
            .await
            .unwrap();
        assert!(out.starts_with("> User: <@42>\n```yaml\nUserID: u1\n"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn get_other_user() {
        let backend = backend();
        backend.respond(
            "AccountByUsernameGet",
            r#"{"user":{"id":"u2","username":"trinity#0002"},"custom_id":"43"}"#,
        );
        let args = GetUserArgs {
            target: None,
            user: Some("trinity#0002".into()),
        };
        let out = execute_get_user(&ctx(&backend), args).await.unwrap();
        assert!(out.contains("Username: trinity#0002"));

        let args = GetUserArgs {
            target: Some("trinity".into()),
            user: None,
        };
        let err = execute_get_user(&ctx(&backend), args).await.unwrap_err();
        assert_eq!(err.to_string(), "Discord user ID is invalid");
    }
}
