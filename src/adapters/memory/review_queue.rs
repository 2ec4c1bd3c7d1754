//! In-memory manual review queue.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::domain::matching::ManualReviewItem;
use crate::ports::ManualReviewQueue;

#[derive(Default)]
pub struct InMemoryReviewQueue {
    items: RwLock<Vec<ManualReviewItem>>,
}

impl InMemoryReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn items(&self) -> Vec<ManualReviewItem> {
        self.items.read().await.clone()
    }
}

#[async_trait]
impl ManualReviewQueue for InMemoryReviewQueue {
    async fn enqueue(&self, item: &ManualReviewItem) -> Result<(), DomainError> {
        let mut items = self.items.write().await;
        if !items.iter().any(|i| i.event_id == item.event_id) {
            items.push(item.clone());
        }
        Ok(())
    }
}
