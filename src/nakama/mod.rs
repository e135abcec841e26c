//! Backend access (game server HTTP/JSON gateway).
//!
//! Two invocation shapes are exposed through the [`Backend`] trait:
//!   - `rpc(id, payload)`: named server procedure with an opaque JSON string payload
//!   - typed calls: account, storage objects, leaderboard records
//!
//! [`client::NakamaClient`] is the real transport; tests use `mock::MockBackend`.
//!
use async_trait::async_trait;

pub mod api;
pub mod client;
#[cfg(test)]
pub mod mock;
pub mod session;

pub use api::{
    Account, DeleteStorageObjectId, LeaderboardRecord, LeaderboardRecordList,
    ReadStorageObjectId, Rpc, StorageObject, StorageObjectList,
};
pub use client::NakamaClient;

/// User id the server uses for system-owned storage objects.
pub const SYSTEM_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Errors raised by the backend client layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status} (code {code}): {message}")]
    Api {
        status: u16,
        code: i32,
        message: String,
    },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid session token: {0}")]
    InvalidToken(String),

    #[error("invalid backend address: {0}")]
    Address(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Request-execution handle shared by every command.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Invoke a named server procedure. `payload` is already JSON encoded.
    async fn rpc(&self, id: &str, payload: String) -> Result<Rpc>;

    /// Account of the authenticated session.
    async fn get_account(&self) -> Result<Account>;

    async fn read_storage_objects(&self, ids: &[ReadStorageObjectId]) -> Result<Vec<StorageObject>>;

    async fn list_storage_objects(
        &self,
        collection: &str,
        user_id: &str,
        limit: u32,
        cursor: &str,
    ) -> Result<StorageObjectList>;

    async fn delete_storage_objects(&self, ids: &[DeleteStorageObjectId]) -> Result<()>;

    async fn list_leaderboard_records_around_owner(
        &self,
        leaderboard_id: &str,
        owner_id: &str,
        limit: u32,
    ) -> Result<LeaderboardRecordList>;
}
