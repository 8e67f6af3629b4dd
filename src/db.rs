use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::analysis::{AnalysisStore, ReviewSource};
use crate::models::{AnalysisResult, Review};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_app(pool: &PgPool, app_id: &str, name: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO review_gaps.apps (app_id, name)
        VALUES ($1, $2)
        ON CONFLICT (app_id) DO UPDATE SET name = EXCLUDED.name
        "#,
    )
    .bind(app_id)
    .bind(name)
    .execute(pool)
    .await?;
    Ok(())
}

async fn insert_review(pool: &PgPool, app_id: &str, review: &Review) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO review_gaps.reviews (id, app_id, rating, title, body, reviewed_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(&review.id)
    .bind(app_id)
    .bind(i16::from(review.rating))
    .bind(&review.title)
    .bind(&review.text)
    .bind(review.date)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let apps = [
        ("com.example.notely", "Notely"),
        ("com.example.jotpad", "JotPad"),
        ("com.example.inkwell", "Inkwell"),
    ];
    for (app_id, name) in apps {
        upsert_app(pool, app_id, name).await?;
    }

    let reviews = [
        ("seed-001", "com.example.notely", 5, "Love it", "Great sync feature and clean editor", (2026, 1, 12)),
        ("seed-002", "com.example.notely", 1, "Sync broken", "Sync is broken after the last release", (2026, 1, 14)),
        ("seed-003", "com.example.notely", 2, "Pricey", "Subscription pricing is way too high", (2026, 1, 20)),
        ("seed-004", "com.example.notely", 1, "Crashes", "Crashes constantly when exporting notes", (2026, 1, 22)),
        ("seed-005", "com.example.jotpad", 4, "Solid", "Clean editor, fast search", (2026, 1, 9)),
        ("seed-006", "com.example.jotpad", 2, "Too expensive", "Pricing changed and export is locked", (2026, 1, 18)),
        ("seed-007", "com.example.jotpad", 1, "Lost data", "Export failed and sync lost my notes", (2026, 1, 25)),
        ("seed-008", "com.example.jotpad", 3, "Okay", "Does the job, search could be faster", (2026, 1, 27)),
        ("seed-009", "com.example.inkwell", 5, "Beautiful", "Beautiful handwriting support", (2026, 1, 5)),
        ("seed-010", "com.example.inkwell", 2, "No sync", "No sync between tablet and laptop", (2026, 1, 15)),
        ("seed-011", "com.example.inkwell", 1, "Pricing", "Pricing is absurd for basic export", (2026, 1, 28)),
    ];

    let mut inserted = 0usize;
    for (id, app_id, rating, title, text, (year, month, day)) in reviews {
        let review = Review {
            id: id.to_string(),
            rating,
            title: Some(title.to_string()),
            text: Some(text.to_string()),
            date: Utc
                .with_ymd_and_hms(year, month, day, 12, 0, 0)
                .single()
                .context("invalid seed date")?,
        };
        if insert_review(pool, app_id, &review).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        app_id: String,
        app_name: String,
        review_id: Option<String>,
        rating: u8,
        title: Option<String>,
        text: Option<String>,
        reviewed_at: DateTime<Utc>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed row {}", line + 1))?;
        if !(1..=5).contains(&row.rating) {
            anyhow::bail!(
                "row {}: rating {} is outside 1-5 for app {}",
                line + 1,
                row.rating,
                row.app_id
            );
        }

        upsert_app(pool, &row.app_id, &row.app_name).await?;

        let review = Review {
            id: row
                .review_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("import-{}", Uuid::new_v4())),
            rating: row.rating,
            title: row.title.filter(|t| !t.trim().is_empty()),
            text: row.text.filter(|t| !t.trim().is_empty()),
            date: row.reviewed_at,
        };

        if insert_review(pool, &row.app_id, &review).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Apps that have at least one review, in id order.
pub async fn list_app_ids(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT DISTINCT a.app_id \
         FROM review_gaps.apps a \
         JOIN review_gaps.reviews r ON r.app_id = a.app_id \
         ORDER BY a.app_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("app_id")).collect())
}

pub async fn fetch_reviews(pool: &PgPool, app_id: &str) -> anyhow::Result<Vec<Review>> {
    let records = sqlx::query(
        "SELECT id, rating, title, body, reviewed_at \
         FROM review_gaps.reviews \
         WHERE app_id = $1 \
         ORDER BY reviewed_at, id",
    )
    .bind(app_id)
    .fetch_all(pool)
    .await?;

    let mut reviews = Vec::with_capacity(records.len());
    for row in records {
        let rating: i16 = row.get("rating");
        reviews.push(Review {
            id: row.get("id"),
            rating: u8::try_from(rating).context("stored rating out of range")?,
            title: row.get("title"),
            text: row.get("body"),
            date: row.get("reviewed_at"),
        });
    }

    debug!(app_id, reviews = reviews.len(), "reviews loaded");
    Ok(reviews)
}

pub async fn load_analysis(pool: &PgPool, app_id: &str) -> anyhow::Result<Option<AnalysisResult>> {
    let row = sqlx::query("SELECT result FROM review_gaps.analyses WHERE app_id = $1")
        .bind(app_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let Json(result): Json<AnalysisResult> = row.try_get("result")?;
            Ok(Some(result))
        }
        None => Ok(None),
    }
}

pub async fn save_analysis(
    pool: &PgPool,
    app_id: &str,
    result: &AnalysisResult,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO review_gaps.analyses (app_id, result, updated_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (app_id) DO UPDATE
        SET result = EXCLUDED.result, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(app_id)
    .bind(Json(result))
    .bind(result.last_updated)
    .execute(pool)
    .await?;
    Ok(())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewSource for PgStore {
    async fn reviews(&self, app_id: &str) -> anyhow::Result<Vec<Review>> {
        fetch_reviews(&self.pool, app_id).await
    }
}

#[async_trait]
impl AnalysisStore for PgStore {
    async fn load(&self, app_id: &str) -> anyhow::Result<Option<AnalysisResult>> {
        load_analysis(&self.pool, app_id).await
    }

    async fn save(&self, app_id: &str, result: &AnalysisResult) -> anyhow::Result<()> {
        save_analysis(&self.pool, app_id, result).await
    }
}
