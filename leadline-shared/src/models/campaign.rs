/// Campaign model and database operations
///
/// Campaigns are owned by the user that created them: only the creator may
/// read, update, or delete a campaign. Leads can be attributed to a campaign
/// via `leads.campaign_id`, which is set to NULL when the campaign is
/// deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE campaign_status AS ENUM ('draft', 'active', 'paused', 'completed');
///
/// CREATE TABLE campaigns (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     description TEXT,
///     status campaign_status NOT NULL DEFAULT 'draft',
///     budget DOUBLE PRECISION,
///     start_date DATE,
///     end_date DATE,
///     created_by UUID REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{clamp_limit, clamp_offset, conversion_rate};

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "campaign_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Being prepared, not yet running
    Draft,

    /// Currently running
    Active,

    /// Temporarily halted
    Paused,

    /// Finished
    Completed,
}

impl CampaignStatus {
    /// Status as its database/wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
        }
    }
}

/// Campaign row joined with its creator's name and lead count
///
/// This is the shape returned by list and lookup queries.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    /// Unique campaign ID
    pub id: Uuid,

    /// Campaign name
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// Lifecycle status
    pub status: CampaignStatus,

    /// Allocated budget
    pub budget: Option<f64>,

    /// First day of the campaign
    pub start_date: Option<NaiveDate>,

    /// Last day of the campaign; never before start_date when both are set
    pub end_date: Option<NaiveDate>,

    /// Owning user (nullable: the column survives exports even though user
    /// deletion cascades campaigns)
    pub created_by: Option<Uuid>,

    /// Creator's given name (joined)
    pub creator_first_name: Option<String>,

    /// Creator's family name (joined)
    pub creator_last_name: Option<String>,

    /// Number of leads attributed to this campaign (joined aggregate)
    pub lead_count: i64,

    /// When the campaign was created
    pub created_at: DateTime<Utc>,

    /// When the campaign was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<CampaignStatus>,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: Uuid,
}

/// Input for updating a campaign
///
/// All fields are optional; only provided fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCampaign {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<CampaignStatus>,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl UpdateCampaign {
    /// True when no field is set; such an update is a no-op
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.budget.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

/// Filters accepted by [`Campaign::list`]
#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    /// Restrict to a single status
    pub status: Option<CampaignStatus>,

    /// Page size (clamped to the global maximum)
    pub limit: Option<i64>,

    /// Rows to skip
    pub offset: Option<i64>,
}

/// Aggregate lead statistics for one campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignStats {
    pub total_leads: i64,
    pub won_count: i64,
    pub lost_count: i64,
    pub won_value: f64,
    pub avg_lead_value: f64,
    pub conversion_rate: f64,
}

#[derive(sqlx::FromRow)]
struct CampaignStatsRow {
    total_leads: i64,
    won_count: i64,
    lost_count: i64,
    won_value: f64,
    avg_lead_value: f64,
}

/// Columns selected for every campaign query, including the creator join and
/// lead count aggregate.
const CAMPAIGN_SELECT: &str = r#"
    SELECT campaigns.id, campaigns.name, campaigns.description, campaigns.status,
           campaigns.budget, campaigns.start_date, campaigns.end_date,
           campaigns.created_by,
           users.first_name AS creator_first_name,
           users.last_name AS creator_last_name,
           COUNT(leads.id) AS lead_count,
           campaigns.created_at, campaigns.updated_at
    FROM campaigns
    LEFT JOIN users ON campaigns.created_by = users.id
    LEFT JOIN leads ON campaigns.id = leads.campaign_id
"#;

const CAMPAIGN_GROUP_BY: &str =
    " GROUP BY campaigns.id, users.first_name, users.last_name";

/// Builds the owner-scoped list query for the given filter.
///
/// Bind order: $1 = owner, then the optional status, then LIMIT and OFFSET.
pub fn build_list_sql(filter: &CampaignFilter) -> String {
    let mut sql = String::from(CAMPAIGN_SELECT);
    sql.push_str(" WHERE campaigns.created_by = $1");

    let mut bind = 1;
    if filter.status.is_some() {
        bind += 1;
        sql.push_str(&format!(" AND campaigns.status = ${}", bind));
    }

    sql.push_str(CAMPAIGN_GROUP_BY);
    sql.push_str(" ORDER BY campaigns.created_at DESC");
    sql.push_str(&format!(" LIMIT ${} OFFSET ${}", bind + 1, bind + 2));
    sql
}

impl Campaign {
    /// Creates a new campaign
    ///
    /// The freshly inserted row is re-read through the joined select so the
    /// response shape matches list/lookup results.
    pub async fn create(pool: &PgPool, data: CreateCampaign) -> Result<Self, sqlx::Error> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO campaigns (name, description, status, budget, start_date, end_date, created_by)
            VALUES ($1, $2, COALESCE($3, 'draft'::campaign_status), $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.status)
        .bind(data.budget)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        let campaign = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(campaign)
    }

    /// Finds a campaign by ID, with creator name and lead count
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "{} WHERE campaigns.id = $1{}",
            CAMPAIGN_SELECT, CAMPAIGN_GROUP_BY
        );

        let campaign = sqlx::query_as::<_, Campaign>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(campaign)
    }

    /// Lists campaigns owned by `owner`, newest first
    ///
    /// The page size is clamped to the global maximum; an offset beyond the
    /// result set simply yields an empty page.
    pub async fn list(
        pool: &PgPool,
        owner: Uuid,
        filter: &CampaignFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = build_list_sql(filter);

        let mut query = sqlx::query_as::<_, Campaign>(&sql).bind(owner);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        query = query
            .bind(clamp_limit(filter.limit))
            .bind(clamp_offset(filter.offset));

        let campaigns = query.fetch_all(pool).await?;

        Ok(campaigns)
    }

    /// Counts campaigns owned by `owner` matching the filter
    ///
    /// Used for pagination metadata alongside [`Campaign::list`].
    pub async fn count(
        pool: &PgPool,
        owner: Uuid,
        filter: &CampaignFilter,
    ) -> Result<i64, sqlx::Error> {
        let mut sql = String::from("SELECT COUNT(*) FROM campaigns WHERE created_by = $1");
        if filter.status.is_some() {
            sql.push_str(" AND status = $2");
        }

        let mut query = sqlx::query_as::<_, (i64,)>(&sql).bind(owner);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }

        let (count,) = query.fetch_one(pool).await?;

        Ok(count)
    }

    /// Updates the provided fields of a campaign
    ///
    /// Returns the updated campaign, or None if the ID does not exist.
    /// Ownership must be checked by the caller before invoking this.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCampaign,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut sql = String::from("UPDATE campaigns SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", status = ${}", bind_count));
        }
        if data.budget.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", budget = ${}", bind_count));
        }
        if data.start_date.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", start_date = ${}", bind_count));
        }
        if data.end_date.is_some() {
            bind_count += 1;
            sql.push_str(&format!(", end_date = ${}", bind_count));
        }

        sql.push_str(" WHERE id = $1 RETURNING id");

        let mut query = sqlx::query_as::<_, (Uuid,)>(&sql).bind(id);

        if let Some(name) = data.name {
            query = query.bind(name);
        }
        if let Some(description) = data.description {
            query = query.bind(description);
        }
        if let Some(status) = data.status {
            query = query.bind(status);
        }
        if let Some(budget) = data.budget {
            query = query.bind(budget);
        }
        if let Some(start_date) = data.start_date {
            query = query.bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            query = query.bind(end_date);
        }

        match query.fetch_optional(pool).await? {
            Some((id,)) => Self::find_by_id(pool, id).await,
            None => Ok(None),
        }
    }

    /// Deletes a campaign
    ///
    /// Attributed leads are detached (campaign_id set to NULL) by the
    /// database, not cascaded.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Aggregate lead statistics for one campaign
    pub async fn stats(pool: &PgPool, campaign_id: Uuid) -> Result<CampaignStats, sqlx::Error> {
        let row = sqlx::query_as::<_, CampaignStatsRow>(
            r#"
            SELECT COUNT(*) AS total_leads,
                   COUNT(*) FILTER (WHERE status = 'won') AS won_count,
                   COUNT(*) FILTER (WHERE status = 'lost') AS lost_count,
                   COALESCE(SUM(value) FILTER (WHERE status = 'won'), 0) AS won_value,
                   COALESCE(AVG(value), 0) AS avg_lead_value
            FROM leads
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .fetch_one(pool)
        .await?;

        Ok(CampaignStats {
            total_leads: row.total_leads,
            won_count: row.won_count,
            lost_count: row.lost_count,
            won_value: row.won_value,
            avg_lead_value: row.avg_lead_value,
            conversion_rate: conversion_rate(row.won_count, row.total_leads),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(CampaignStatus::Draft.as_str(), "draft");
        assert_eq!(CampaignStatus::Active.as_str(), "active");
        assert_eq!(CampaignStatus::Paused.as_str(), "paused");
        assert_eq!(CampaignStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&CampaignStatus::Paused).unwrap();
        assert_eq!(json, "\"paused\"");

        let status: CampaignStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(status, CampaignStatus::Active);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateCampaign::default().is_empty());

        let update = UpdateCampaign {
            name: Some("Spring Launch".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_build_list_sql_without_status() {
        let sql = build_list_sql(&CampaignFilter::default());

        assert!(sql.contains("WHERE campaigns.created_by = $1"));
        assert!(!sql.contains("campaigns.status = $2"));
        assert!(sql.contains("ORDER BY campaigns.created_at DESC"));
        assert!(sql.contains("LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn test_build_list_sql_with_status() {
        let filter = CampaignFilter {
            status: Some(CampaignStatus::Active),
            ..Default::default()
        };
        let sql = build_list_sql(&filter);

        assert!(sql.contains("AND campaigns.status = $2"));
        assert!(sql.contains("LIMIT $3 OFFSET $4"));
    }
}
