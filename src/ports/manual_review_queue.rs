//! ManualReviewQueue port - payments a human has to link.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::matching::ManualReviewItem;

/// Sink for payments the matcher could not resolve.
#[async_trait]
pub trait ManualReviewQueue: Send + Sync {
    /// Stores an item for triage.
    ///
    /// Enqueuing the same provider event twice keeps a single item.
    async fn enqueue(&self, item: &ManualReviewItem) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_review_queue_is_object_safe() {
        fn _accepts_dyn(_port: &dyn ManualReviewQueue) {}
    }
}
