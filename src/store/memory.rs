use super::SessionStore;
use crate::error::StoreError;
use crate::session::SessionRecord;
use tokio::sync::RwLock;

/// In-process store; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: RwLock<Vec<SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(StoreError::Duplicate(record.id().to_string()));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn query_by_user(&self, user_id: &str) -> Result<Vec<SessionRecord>, StoreError> {
        let records = self.records.read().await;
        let mut matching: Vec<SessionRecord> = records
            .iter()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at().cmp(b.created_at()));
        Ok(matching)
    }
}
