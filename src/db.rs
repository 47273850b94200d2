use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{ImportSummary, Opportunity};

const OPPORTUNITY_COLUMNS: &str = "o.id, o.title, o.description, o.category, o.funding_needed, \
     o.timeline, o.business_plan_url, o.status, o.created_at, o.views, \
     COALESCE(i.interest_count, 0) AS interest_count";

const INTEREST_JOIN: &str = "LEFT JOIN (SELECT opportunity_id, COUNT(*) AS interest_count \
     FROM fundfound.opportunity_interest GROUP BY opportunity_id) i \
     ON i.opportunity_id = o.id";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let opportunities = vec![
        (
            Uuid::parse_str("8f0b5b3c-6f1e-4f7a-9a93-1f2b6a60b6a1")?,
            "AI-Powered Healthcare Platform",
            "Revolutionary healthcare platform using AI to improve patient outcomes and reduce costs.",
            "technology",
            5_000_000i64,
            "18 months",
            Some("https://files.fundfound.example/plans/healthcare-ai.pdf"),
            "published",
            Utc.with_ymd_and_hms(2026, 5, 12, 9, 30, 0),
            Some(48i64),
        ),
        (
            Uuid::parse_str("2a61c9d4-7e6f-45f0-9d0e-8a1cf3b05f22")?,
            "Sustainable Food Delivery",
            "Eco-friendly food delivery service with zero-waste packaging and local sourcing.",
            "ecommerce",
            2_000_000,
            "12 months",
            None,
            "published",
            Utc.with_ymd_and_hms(2026, 6, 3, 14, 0, 0),
            Some(31),
        ),
        (
            Uuid::parse_str("c4d2e7aa-0d25-4c88-b7a4-55e12c9a9e73")?,
            "EdTech Learning Platform",
            "Interactive learning platform for K-12 students with personalized curriculum.",
            "education",
            3_000_000,
            "24 months",
            Some("https://files.fundfound.example/plans/edtech.pdf"),
            "published",
            Utc.with_ymd_and_hms(2026, 6, 21, 11, 15, 0),
            Some(22),
        ),
        (
            Uuid::parse_str("5b9f3a61-84cb-4f2e-a4fb-3d6d6a2f1c54")?,
            "Handloom Export Collective",
            "Artisan weaver co-op selling certified handloom fabric to overseas boutiques.",
            "retail",
            80_000,
            "3-6 months",
            None,
            "published",
            Utc.with_ymd_and_hms(2026, 7, 2, 8, 45, 0),
            Some(9),
        ),
        (
            Uuid::parse_str("e87d1f09-1b3a-4f67-93d4-7c0a2e5b8d16")?,
            "Cold Chain Storage Hubs",
            "Refrigerated micro-warehouses for farm produce at mandi collection points.",
            "agriculture",
            12_000_000,
            "2-3 years",
            Some("https://files.fundfound.example/plans/cold-chain.pdf"),
            "draft",
            Utc.with_ymd_and_hms(2026, 7, 18, 16, 20, 0),
            None,
        ),
        (
            Uuid::parse_str("91c3b7de-2f54-4a0b-bb1d-6e9a0d4c7f38")?,
            "Neighborhood Fintech Kiosks",
            "Assisted banking and bill payment kiosks for underbanked neighborhoods.",
            "finance",
            800_000,
            "6-12 months",
            Some("https://files.fundfound.example/plans/kiosks.pdf"),
            "funded",
            Utc.with_ymd_and_hms(2026, 4, 9, 10, 0, 0),
            Some(120),
        ),
    ];

    for (id, title, description, category, funding, timeline, plan, status, created_at, views) in
        opportunities
    {
        let created_at = created_at.single().context("invalid seed timestamp")?;
        sqlx::query(
            r#"
            INSERT INTO fundfound.opportunities
            (id, title, description, category, funding_needed, timeline,
             business_plan_url, status, created_at, views, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title, description = EXCLUDED.description,
                category = EXCLUDED.category, funding_needed = EXCLUDED.funding_needed,
                timeline = EXCLUDED.timeline, business_plan_url = EXCLUDED.business_plan_url,
                status = EXCLUDED.status, views = EXCLUDED.views
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(funding)
        .bind(timeline)
        .bind(plan)
        .bind(status)
        .bind(created_at)
        .bind(views)
        .bind(format!("seed-{id}"))
        .execute(pool)
        .await?;
    }

    let interest = vec![
        (
            "8f0b5b3c-6f1e-4f7a-9a93-1f2b6a60b6a1",
            "d1a2b3c4-0001-4e00-8a00-000000000001",
        ),
        (
            "8f0b5b3c-6f1e-4f7a-9a93-1f2b6a60b6a1",
            "d1a2b3c4-0001-4e00-8a00-000000000002",
        ),
        (
            "91c3b7de-2f54-4a0b-bb1d-6e9a0d4c7f38",
            "d1a2b3c4-0001-4e00-8a00-000000000003",
        ),
    ];

    for (opportunity_id, investor_id) in interest {
        sqlx::query(
            r#"
            INSERT INTO fundfound.opportunity_interest (opportunity_id, investor_id)
            VALUES ($1, $2)
            ON CONFLICT (opportunity_id, investor_id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(opportunity_id)?)
        .bind(Uuid::parse_str(investor_id)?)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_opportunities(
    pool: &PgPool,
    category: Option<&str>,
    status: Option<&str>,
) -> anyhow::Result<Vec<Opportunity>> {
    let mut query = format!(
        "SELECT {OPPORTUNITY_COLUMNS} FROM fundfound.opportunities o {INTEREST_JOIN}"
    );

    if category.is_some() {
        query.push_str(" WHERE o.category = $1");
    } else if status.is_some() {
        query.push_str(" WHERE o.status = $1");
    }
    query.push_str(" ORDER BY o.created_at DESC");

    let mut rows = sqlx::query(&query);

    if let Some(value) = category {
        rows = rows.bind(value.to_string());
    } else if let Some(value) = status {
        rows = rows.bind(value.to_string());
    }

    let records = rows
        .fetch_all(pool)
        .await
        .context("failed to fetch opportunities")?;

    Ok(records.iter().map(opportunity_from_row).collect())
}

pub async fn fetch_by_ids(pool: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Opportunity>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let query = format!(
        "SELECT {OPPORTUNITY_COLUMNS} FROM fundfound.opportunities o {INTEREST_JOIN} \
         WHERE o.id = ANY($1) ORDER BY o.created_at DESC"
    );

    let records = sqlx::query(&query)
        .bind(ids.to_vec())
        .fetch_all(pool)
        .await
        .context("failed to fetch watched opportunities")?;

    Ok(records.iter().map(opportunity_from_row).collect())
}

fn opportunity_from_row(row: &sqlx::postgres::PgRow) -> Opportunity {
    Opportunity {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        funding_needed: row.get("funding_needed"),
        timeline: row.get("timeline"),
        business_plan_url: row.get("business_plan_url"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        views: row.get("views"),
        interest_count: row.get("interest_count"),
    }
}

pub async fn record_view(pool: &PgPool, id: Uuid) -> anyhow::Result<i64> {
    let row = sqlx::query(
        r#"
        UPDATE fundfound.opportunities
        SET views = COALESCE(views, 0) + 1
        WHERE id = $1
        RETURNING views
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("failed to record view")?;

    let row = row.with_context(|| format!("no opportunity with id {id}"))?;
    Ok(row.get("views"))
}

/// Idempotent; returns whether the interested-investor set grew. The set only
/// ever grows, there is no unregister path.
pub async fn register_interest(
    pool: &PgPool,
    opportunity_id: Uuid,
    investor_id: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO fundfound.opportunity_interest (opportunity_id, investor_id)
        VALUES ($1, $2)
        ON CONFLICT (opportunity_id, investor_id) DO NOTHING
        "#,
    )
    .bind(opportunity_id)
    .bind(investor_id)
    .execute(pool)
    .await
    .with_context(|| format!("failed to register interest in {opportunity_id}"))?;

    Ok(result.rows_affected() > 0)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<ImportSummary> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        title: String,
        description: String,
        category: String,
        funding_needed: i64,
        timeline: String,
        business_plan_url: Option<String>,
        status: Option<String>,
        created_at: Option<DateTime<Utc>>,
        views: Option<i64>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for result in reader.deserialize::<CsvRow>() {
        // one bad row never aborts the batch
        let row = match result {
            Ok(row) if row.funding_needed > 0 => row,
            _ => {
                summary.skipped += 1;
                continue;
            }
        };

        let id = Uuid::new_v4();
        let source_key = row.source_key.unwrap_or_else(|| format!("import-{id}"));

        let inserted = sqlx::query(
            r#"
            INSERT INTO fundfound.opportunities
            (id, title, description, category, funding_needed, timeline,
             business_plan_url, status, created_at, views, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.category)
        .bind(row.funding_needed)
        .bind(&row.timeline)
        .bind(&row.business_plan_url)
        .bind(row.status.as_deref().unwrap_or("draft"))
        .bind(row.created_at.unwrap_or_else(Utc::now))
        .bind(row.views)
        .bind(source_key)
        .execute(pool)
        .await?;

        if inserted.rows_affected() > 0 {
            summary.inserted += 1;
        } else {
            summary.skipped += 1;
        }
    }

    Ok(summary)
}
