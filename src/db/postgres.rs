use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{Centre, CentrePatch, MergePolicy, NewReview, Review, ReviewSource, TargetRef},
    services::directory::{missing_target, DirectoryStore, DirectoryWriter, ReviewStore},
};

const CENTRE_COLUMNS: &str = "id, friendly_id, name, lat, lng, block, street_name, building_name, \
    unit_no, postal_code, phone, email, website, operating_hours, photos, \
    min_price, max_price, availability, google_map_place_id";

const REVIEW_COLUMNS: &str = "id, review_target, review_target_id, review_source, overall_rating, \
    content, author_name, author_id, google_review_id, published_time";

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Directory and review store backed by Postgres
#[derive(Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    review_target: String,
    review_target_id: i64,
    review_source: String,
    overall_rating: i32,
    content: Option<String>,
    author_name: String,
    author_id: Option<String>,
    google_review_id: Option<String>,
    published_time: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = AppError;

    fn try_from(row: ReviewRow) -> AppResult<Self> {
        Ok(Review {
            id: row.id,
            target: TargetRef::from_parts(&row.review_target, row.review_target_id)?,
            review_source: ReviewSource::parse(&row.review_source)?,
            overall_rating: row.overall_rating,
            content: row.content,
            author_name: row.author_name,
            author_id: row.author_id,
            google_review_id: row.google_review_id,
            published_time: row.published_time,
        })
    }
}

fn store_error(store: &str, e: sqlx::Error) -> AppError {
    tracing::error!(error = %e, store = store, "Store query failed");
    AppError::UpstreamUnavailable(format!("{} store: {}", store, e))
}

#[async_trait::async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn list_all_centres(&self) -> AppResult<Vec<Centre>> {
        sqlx::query_as::<_, Centre>(&format!(
            "SELECT {} FROM dementia_daycare ORDER BY id",
            CENTRE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("directory", e))
    }
}

#[async_trait::async_trait]
impl ReviewStore for PgDirectoryStore {
    async fn list_reviews_for(&self, target: &TargetRef) -> AppResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews \
             WHERE review_target = $1 AND review_target_id = $2 \
             ORDER BY published_time DESC, id",
            REVIEW_COLUMNS
        ))
        .bind(target.tag())
        .bind(target.id())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("review", e))?;

        rows.into_iter().map(Review::try_from).collect()
    }
}

#[async_trait::async_trait]
impl DirectoryWriter for PgDirectoryStore {
    async fn upsert_centre(&self, patch: CentrePatch, policy: MergePolicy) -> AppResult<Centre> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("directory", e))?;

        let existing = sqlx::query_as::<_, Centre>(&format!(
            "SELECT {} FROM dementia_daycare WHERE friendly_id = $1 FOR UPDATE",
            CENTRE_COLUMNS
        ))
        .bind(&patch.friendly_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| store_error("directory", e))?;

        let centre = match existing {
            Some(mut centre) => {
                centre.apply_patch(patch, policy)?;
                sqlx::query(
                    r#"
                    UPDATE dementia_daycare
                    SET name = $2, lat = $3, lng = $4, block = $5, street_name = $6,
                        building_name = $7, unit_no = $8, postal_code = $9, phone = $10,
                        email = $11, website = $12, operating_hours = $13, photos = $14,
                        min_price = $15, max_price = $16, availability = $17,
                        google_map_place_id = $18
                    WHERE id = $1
                    "#,
                )
                .bind(centre.id)
                .bind(&centre.name)
                .bind(centre.lat)
                .bind(centre.lng)
                .bind(&centre.block)
                .bind(&centre.street_name)
                .bind(&centre.building_name)
                .bind(&centre.unit_no)
                .bind(&centre.postal_code)
                .bind(&centre.phone)
                .bind(&centre.email)
                .bind(&centre.website)
                .bind(&centre.operating_hours)
                .bind(&centre.photos)
                .bind(centre.min_price)
                .bind(centre.max_price)
                .bind(&centre.availability)
                .bind(&centre.google_map_place_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| store_error("directory", e))?;
                tracing::debug!(centre_id = centre.id, "Centre updated");
                centre
            }
            None => {
                // id is assigned by the database
                let draft = patch.into_centre(0)?;
                let centre = sqlx::query_as::<_, Centre>(&format!(
                    "INSERT INTO dementia_daycare (friendly_id, name, lat, lng, block, \
                     street_name, building_name, unit_no, postal_code, phone, email, website, \
                     operating_hours, photos, min_price, max_price, availability, \
                     google_map_place_id) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                     $15, $16, $17, $18) \
                     RETURNING {}",
                    CENTRE_COLUMNS
                ))
                .bind(&draft.friendly_id)
                .bind(&draft.name)
                .bind(draft.lat)
                .bind(draft.lng)
                .bind(&draft.block)
                .bind(&draft.street_name)
                .bind(&draft.building_name)
                .bind(&draft.unit_no)
                .bind(&draft.postal_code)
                .bind(&draft.phone)
                .bind(&draft.email)
                .bind(&draft.website)
                .bind(&draft.operating_hours)
                .bind(&draft.photos)
                .bind(draft.min_price)
                .bind(draft.max_price)
                .bind(&draft.availability)
                .bind(&draft.google_map_place_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| store_error("directory", e))?;
                tracing::debug!(centre_id = centre.id, "Centre created");
                centre
            }
        };

        tx.commit().await.map_err(|e| store_error("directory", e))?;
        Ok(centre)
    }

    async fn upsert_review(&self, review: NewReview) -> AppResult<Review> {
        review.google_key()?;

        let target_exists: bool = match review.target {
            TargetRef::DementiaDaycare(id) => {
                sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM dementia_daycare WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| store_error("review", e))?
            }
        };
        if !target_exists {
            return Err(missing_target(&review.target));
        }

        // in-app reviews have no google_review_id and never conflict
        let draft = review.into_review(0, Utc::now());
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "INSERT INTO reviews (review_target, review_target_id, review_source, \
             overall_rating, content, author_name, author_id, google_review_id, published_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (google_review_id) DO UPDATE SET \
                 review_target = EXCLUDED.review_target, \
                 review_target_id = EXCLUDED.review_target_id, \
                 overall_rating = EXCLUDED.overall_rating, \
                 content = EXCLUDED.content, \
                 author_name = EXCLUDED.author_name, \
                 author_id = EXCLUDED.author_id, \
                 published_time = EXCLUDED.published_time \
             RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(draft.target.tag())
        .bind(draft.target.id())
        .bind(draft.review_source.as_str())
        .bind(draft.overall_rating)
        .bind(&draft.content)
        .bind(&draft.author_name)
        .bind(&draft.author_id)
        .bind(&draft.google_review_id)
        .bind(draft.published_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("review", e))?;

        Review::try_from(row)
    }

    async fn delete_centre(&self, id: i64) -> AppResult<bool> {
        let target = TargetRef::DementiaDaycare(id);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error("directory", e))?;

        let removed_reviews =
            sqlx::query("DELETE FROM reviews WHERE review_target = $1 AND review_target_id = $2")
                .bind(target.tag())
                .bind(target.id())
                .execute(&mut *tx)
                .await
                .map_err(|e| store_error("review", e))?
                .rows_affected();

        let removed = sqlx::query("DELETE FROM dementia_daycare WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("directory", e))?
            .rows_affected();

        if removed == 0 {
            tx.rollback().await.map_err(|e| store_error("directory", e))?;
            return Ok(false);
        }

        tx.commit().await.map_err(|e| store_error("directory", e))?;
        tracing::info!(centre_id = id, removed_reviews, "Centre deleted");
        Ok(true)
    }
}
