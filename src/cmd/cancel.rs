//! `cancel`: vote to cancel the assigned match, or drop a ticket still waiting in matchmaking.

use anyhow::Result;

use crate::cmd::CommandContext;
use crate::cmd::model::{DeleteTicketRequest, MatchUserRequest};
use crate::cmd::ready::{TicketIdArgs, select_ticket_state};
use crate::cmd::shared::{pretty_payload, rpc_json};
use crate::cmd::ticket::delete_ticket_state;
use crate::cmd::user_data::{Patch, UserDataPatch, create_or_update_last_user_data};

pub async fn execute_cancel(ctx: &CommandContext<'_>, args: TicketIdArgs) -> Result<String> {
    let account = ctx.backend.get_account().await?;
    let Some(state) = select_ticket_state(ctx, &account, &args).await? else {
        return Ok(format!("No tickets found for <@{}>", account.custom_id));
    };

    if !state.match_id.is_empty() {
        let request = MatchUserRequest {
            match_id: &state.match_id,
            user_id: &account.user.id,
        };
        let payload = rpc_json(ctx.backend, "MatchCancel", &request).await?;
        return Ok(pretty_payload(&payload));
    }

    let ticket_id = state.ticket_id().to_string();
    delete_ticket_state(ctx.backend, &ticket_id).await?;
    let mut out = format!("Ticket **{ticket_id}** was not assigned to any match, just deleting it\n");

    let request = DeleteTicketRequest {
        ticket_id: ticket_id.clone(),
    };
    let payload = rpc_json(ctx.backend, "OpenMatchFrontendTicketDelete", &request).await?;
    out.push_str(&pretty_payload(&payload));

    create_or_update_last_user_data(
        ctx.backend,
        &account,
        UserDataPatch {
            user_id: Patch::Set(account.user.id.clone()),
            match_id: Patch::Clear,
            ticket_id: Patch::Clear,
            ..Default::default()
        },
    )
    .await?;
    tracing::info!(ticket = %ticket_id, "unassigned ticket deleted");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::model::{TICKET_COLLECTION, USER_DATA_COLLECTION, USER_LAST_DATA_KEY};
    use crate::cmd::testing::{backend, ctx};
    use crate::cmd::ticket::tests::with_ticket;

    #[tokio::test]
    async fn cancel_assigned_ticket_votes_on_match() {
        let backend = backend();
        with_ticket(&backend, "u1", "t1", "m1");
        backend.respond("MatchCancel", r#"{"MatchID":"m1"}"#);
        let out = execute_cancel(&ctx(&backend), TicketIdArgs::default())
            .await
            .unwrap();
        assert_eq!(out, "{\n  \"MatchID\": \"m1\"\n}");
        assert_eq!(backend.payload("MatchCancel").unwrap()["UserID"], "u1");
        assert!(backend.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_unassigned_ticket_deletes_it() {
        let backend = backend();
        with_ticket(&backend, "u1", "t1", "");
        backend.respond("OpenMatchFrontendTicketDelete", "{}");
        let out = execute_cancel(&ctx(&backend), TicketIdArgs::default())
            .await
            .unwrap();
        assert!(out.starts_with("Ticket **t1** was not assigned to any match, just deleting it\n"));

        let deleted = backend.deleted.lock().unwrap().clone();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].key, "t1");
        assert_eq!(
            backend.payload("OpenMatchFrontendTicketDelete").unwrap()["ticket_id"],
            "t1"
        );

        let written = backend.payload("LastUserDataCreate").unwrap();
        assert_eq!(written["UserData"]["TicketID"], "");
        assert_eq!(written["UserData"]["MatchID"], "");
        assert_eq!(written["UserData"]["UserID"], "u1");
    }

    #[tokio::test]
    async fn cancel_unassigned_ticket_fills_missing_user_id() {
        let backend = backend();
        backend.store(USER_DATA_COLLECTION, USER_LAST_DATA_KEY, "u1", r#"{"TicketID":"t1"}"#);
        backend.store(
            TICKET_COLLECTION,
            "t1",
            "u1",
            r#"{"Ticket":{"id":"t1"},"UserID":"u1","DiscordID":"42"}"#,
        );
        backend.respond("OpenMatchFrontendTicketDelete", "{}");
        execute_cancel(&ctx(&backend), TicketIdArgs::default())
            .await
            .unwrap();

        let written = backend.payload("LastUserDataCreate").unwrap();
        assert_eq!(written["UserData"]["UserID"], "u1");
        assert_eq!(written["UserData"]["TicketID"], "");
    }

    #[tokio::test]
    async fn cancel_without_ticket() {
        let backend = backend();
        let out = execute_cancel(&ctx(&backend), TicketIdArgs::default())
            .await
            .unwrap();
        assert_eq!(out, "No tickets found for <@42>");
    }
}
