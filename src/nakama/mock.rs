//! In-memory backend for command tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::api::{
    Account, DeleteStorageObjectId, LeaderboardRecord, LeaderboardRecordList,
    ReadStorageObjectId, Rpc, StorageObject, StorageObjectList,
};
use super::{Backend, Error, Result};

#[derive(Default)]
pub struct MockBackend {
    pub account: Account,
    /// Canned payloads by rpc id; payloads are consumed in order, the last one repeats.
    responses: Mutex<HashMap<String, Vec<String>>>,
    /// Rpc ids that fail with a backend error.
    failing: Mutex<Vec<String>>,
    pub storage: Mutex<Vec<StorageObject>>,
    pub leaderboard: Mutex<Vec<LeaderboardRecord>>,
    calls: Mutex<Vec<(String, String)>>,
    pub deleted: Mutex<Vec<DeleteStorageObjectId>>,
}

impl MockBackend {
    pub fn new(user_id: &str, custom_id: &str, username: &str) -> Self {
        let mut account = Account::default();
        account.user.id = user_id.to_string();
        account.user.username = username.to_string();
        account.custom_id = custom_id.to_string();
        account.user.metadata = "{}".to_string();
        Self {
            account,
            ..Default::default()
        }
    }

    pub fn respond(&self, id: &str, payload: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push(payload.into());
        self
    }

    pub fn fail(&self, id: &str) -> &Self {
        self.failing.lock().unwrap().push(id.to_string());
        self
    }

    pub fn store(&self, collection: &str, key: &str, user_id: &str, value: impl Into<String>) -> &Self {
        self.storage.lock().unwrap().push(StorageObject {
            collection: collection.to_string(),
            key: key.to_string(),
            user_id: user_id.to_string(),
            value: value.into(),
            version: format!("v-{key}"),
            ..Default::default()
        });
        self
    }

    /// Every rpc issued so far, as `(id, payload)`.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|(id, _)| id).collect()
    }

    /// Payload of the first call with `id`, parsed as JSON.
    pub fn payload(&self, id: &str) -> Option<serde_json::Value> {
        self.payloads(id).into_iter().next()
    }

    pub fn payloads(&self, id: &str) -> Vec<serde_json::Value> {
        self.calls()
            .into_iter()
            .filter(|(c, _)| c == id)
            .filter_map(|(_, p)| serde_json::from_str(&p).ok())
            .collect()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn rpc(&self, id: &str, payload: String) -> Result<Rpc> {
        self.calls
            .lock()
            .unwrap()
            .push((id.to_string(), payload));
        if self.failing.lock().unwrap().iter().any(|f| f == id) {
            return Err(Error::Api {
                status: 500,
                code: 13,
                message: format!("{id} failed"),
            });
        }
        let mut responses = self.responses.lock().unwrap();
        let payload = match responses.get_mut(id) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) => queue.first().cloned().unwrap_or_default(),
            None => String::new(),
        };
        Ok(Rpc {
            id: id.to_string(),
            payload,
        })
    }

    async fn get_account(&self) -> Result<Account> {
        Ok(self.account.clone())
    }

    async fn read_storage_objects(&self, ids: &[ReadStorageObjectId]) -> Result<Vec<StorageObject>> {
        let storage = self.storage.lock().unwrap();
        Ok(storage
            .iter()
            .filter(|o| {
                ids.iter().any(|id| {
                    id.collection == o.collection && id.key == o.key && id.user_id == o.user_id
                })
            })
            .cloned()
            .collect())
    }

    async fn list_storage_objects(
        &self,
        collection: &str,
        user_id: &str,
        limit: u32,
        _cursor: &str,
    ) -> Result<StorageObjectList> {
        let storage = self.storage.lock().unwrap();
        Ok(StorageObjectList {
            objects: storage
                .iter()
                .filter(|o| o.collection == collection && o.user_id == user_id)
                .take(limit as usize)
                .cloned()
                .collect(),
            cursor: String::new(),
        })
    }

    async fn delete_storage_objects(&self, ids: &[DeleteStorageObjectId]) -> Result<()> {
        let mut storage = self.storage.lock().unwrap();
        storage.retain(|o| {
            !ids
                .iter()
                .any(|id| id.collection == o.collection && id.key == o.key)
        });
        self.deleted.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }

    async fn list_leaderboard_records_around_owner(
        &self,
        leaderboard_id: &str,
        _owner_id: &str,
        limit: u32,
    ) -> Result<LeaderboardRecordList> {
        let records = self
            .leaderboard
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.leaderboard_id == leaderboard_id)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(LeaderboardRecordList {
            records,
            ..Default::default()
        })
    }
}
