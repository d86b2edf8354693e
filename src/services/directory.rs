use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{Centre, CentrePatch, MergePolicy, NewReview, Review, TargetRef},
};

/// Source of the centre directory
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Lists every centre in a stable order
    async fn list_all_centres(&self) -> AppResult<Vec<Centre>>;
}

/// Source of reviews for directory entries
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReviewStore: Send + Sync {
    async fn list_reviews_for(&self, target: &TargetRef) -> AppResult<Vec<Review>>;
}

/// Write side of the directory, used by ingestion and admin edits
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DirectoryWriter: Send + Sync {
    /// Inserts a centre or merges the patch into the centre with the same friendly id
    async fn upsert_centre(&self, patch: CentrePatch, policy: MergePolicy) -> AppResult<Centre>;

    /// Stores a review for an existing centre. Google reviews are upserted by
    /// their external review id.
    async fn upsert_review(&self, review: NewReview) -> AppResult<Review>;

    /// Removes a centre and every review attached to it. Returns `false` when
    /// no centre had the given id.
    async fn delete_centre(&self, id: i64) -> AppResult<bool>;
}

/// Directory and review store held in memory
///
/// Centres keep insertion order. Reviews must point at an existing centre and
/// are removed together with it.
#[derive(Default)]
pub struct InMemoryDirectory {
    inner: RwLock<DirectoryInner>,
}

#[derive(Default)]
struct DirectoryInner {
    centres: Vec<Centre>,
    reviews: Vec<Review>,
    last_centre_id: i64,
    last_review_id: i64,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DirectoryWriter for InMemoryDirectory {
    async fn upsert_centre(&self, patch: CentrePatch, policy: MergePolicy) -> AppResult<Centre> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner
            .centres
            .iter_mut()
            .find(|c| c.friendly_id == patch.friendly_id)
        {
            existing.apply_patch(patch, policy)?;
            tracing::debug!(centre_id = existing.id, "Centre updated");
            return Ok(existing.clone());
        }

        let centre = patch.into_centre(inner.last_centre_id + 1)?;
        inner.last_centre_id = centre.id;
        inner.centres.push(centre.clone());
        tracing::debug!(centre_id = centre.id, "Centre created");
        Ok(centre)
    }

    async fn upsert_review(&self, review: NewReview) -> AppResult<Review> {
        let mut inner = self.inner.write().await;

        let target_exists = match review.target {
            TargetRef::DementiaDaycare(id) => inner.centres.iter().any(|c| c.id == id),
        };
        if !target_exists {
            return Err(missing_target(&review.target));
        }

        if let Some(google_id) = review.google_key()? {
            let existing = inner
                .reviews
                .iter_mut()
                .find(|r| r.google_review_id.as_deref() == Some(google_id));
            if let Some(existing) = existing {
                *existing = review.into_review(existing.id, Utc::now());
                return Ok(existing.clone());
            }
        }

        let stored = review.into_review(inner.last_review_id + 1, Utc::now());
        inner.last_review_id = stored.id;
        inner.reviews.push(stored.clone());
        Ok(stored)
    }

    async fn delete_centre(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.centres.len();
        inner.centres.retain(|c| c.id != id);
        if inner.centres.len() == before {
            return Ok(false);
        }

        let target = TargetRef::DementiaDaycare(id);
        inner.reviews.retain(|r| r.target != target);
        Ok(true)
    }
}

/// Error for a review whose target centre is not in the directory
pub(crate) fn missing_target(target: &TargetRef) -> AppError {
    AppError::InvalidInput(format!("Review target {} does not exist", target))
}

#[async_trait::async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn list_all_centres(&self) -> AppResult<Vec<Centre>> {
        Ok(self.inner.read().await.centres.clone())
    }
}

#[async_trait::async_trait]
impl ReviewStore for InMemoryDirectory {
    async fn list_reviews_for(&self, target: &TargetRef) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .filter(|r| &r.target == target)
            .cloned()
            .collect())
    }
}
