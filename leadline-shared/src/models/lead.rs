/// Lead model and database operations
///
/// Leads are prospective customers moving through a fixed sales pipeline:
///
/// ```text
/// new → contacted → qualified → proposal → won
///                                        → lost
/// ```
///
/// A lead may be attributed to a campaign and assigned to a user; both
/// references are nullable and are set to NULL by the database when the
/// referenced row is deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE lead_status AS ENUM ('new', 'contacted', 'qualified', 'proposal', 'won', 'lost');
/// CREATE TYPE lead_source AS ENUM ('website', 'referral', 'social', 'email', 'phone', 'other');
///
/// CREATE TABLE leads (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     first_name VARCHAR(50) NOT NULL,
///     last_name VARCHAR(50) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     phone VARCHAR(20),
///     company VARCHAR(100),
///     position VARCHAR(100),
///     status lead_status NOT NULL DEFAULT 'new',
///     source lead_source NOT NULL DEFAULT 'other',
///     value DOUBLE PRECISION,
///     notes TEXT,
///     campaign_id UUID REFERENCES campaigns(id) ON DELETE SET NULL,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{clamp_limit, clamp_offset, conversion_rate};

/// Pipeline status of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Proposal,
    Won,
    Lost,
}

impl LeadStatus {
    /// Status as its database/wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Proposal => "proposal",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
        }
    }
}

/// Where the lead came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    Website,
    Referral,
    Social,
    Email,
    Phone,
    Other,
}

impl LeadSource {
    /// Source as its database/wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Website => "website",
            LeadSource::Referral => "referral",
            LeadSource::Social => "social",
            LeadSource::Email => "email",
            LeadSource::Phone => "phone",
            LeadSource::Other => "other",
        }
    }
}

/// Lead row joined with its campaign name and assignee name
///
/// This is the shape returned by list and lookup queries and consumed by the
/// CSV export.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    /// Unique lead ID
    pub id: Uuid,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,

    /// Pipeline status
    pub status: LeadStatus,

    /// Acquisition source
    pub source: LeadSource,

    /// Estimated deal value
    pub value: Option<f64>,

    pub notes: Option<String>,

    /// Campaign this lead is attributed to (set NULL on campaign delete)
    pub campaign_id: Option<Uuid>,

    /// User working this lead (set NULL on user delete)
    pub assigned_to: Option<Uuid>,

    /// Attributed campaign's name (joined)
    pub campaign_name: Option<String>,

    /// Assignee's given name (joined)
    pub assigned_first_name: Option<String>,

    /// Assignee's family name (joined)
    pub assigned_last_name: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub value: Option<f64>,
    pub notes: Option<String>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

/// Input for updating a lead
///
/// Plain `Option` fields are written only when provided. The nullable
/// references use a double `Option`: the outer level means "provided", the
/// inner level carries an explicit NULL that detaches the lead from its
/// campaign or assignee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLead {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub value: Option<f64>,
    pub notes: Option<String>,
    pub campaign_id: Option<Option<Uuid>>,
    pub assigned_to: Option<Option<Uuid>>,
}

impl UpdateLead {
    /// True when no field is set; such an update is a no-op
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.company.is_none()
            && self.position.is_none()
            && self.status.is_none()
            && self.source.is_none()
            && self.value.is_none()
            && self.notes.is_none()
            && self.campaign_id.is_none()
            && self.assigned_to.is_none()
    }
}

/// Filters accepted by [`Lead::list`]
///
/// All present filters are combined with AND; the search substring is
/// matched case-insensitively against first name, last name, email, and
/// company (OR within the group).
#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Aggregate statistics across all leads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadOverviewStats {
    pub total_leads: i64,
    pub new_leads: i64,
    pub contacted_leads: i64,
    pub qualified_leads: i64,
    pub proposal_leads: i64,
    pub won_leads: i64,
    pub lost_leads: i64,
    pub total_won_value: f64,
    pub avg_lead_value: f64,
    pub conversion_rate: f64,
}

#[derive(sqlx::FromRow)]
struct OverviewRow {
    total_leads: i64,
    new_leads: i64,
    contacted_leads: i64,
    qualified_leads: i64,
    proposal_leads: i64,
    won_leads: i64,
    lost_leads: i64,
    total_won_value: f64,
    avg_lead_value: f64,
}

/// Per-source lead counts and won value
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SourceStats {
    pub source: LeadSource,
    pub count: i64,
    pub won_count: i64,
    pub won_value: f64,
}

/// Per-status lead counts and pipeline value
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusStats {
    pub status: LeadStatus,
    pub count: i64,
    pub total_value: f64,
}

/// Columns selected for every lead query, including the campaign and
/// assignee joins.
const LEAD_SELECT: &str = r#"
    SELECT leads.id, leads.first_name, leads.last_name, leads.email,
           leads.phone, leads.company, leads.position, leads.status,
           leads.source, leads.value, leads.notes, leads.campaign_id,
           leads.assigned_to,
           campaigns.name AS campaign_name,
           assigned_user.first_name AS assigned_first_name,
           assigned_user.last_name AS assigned_last_name,
           leads.created_at, leads.updated_at
    FROM leads
    LEFT JOIN campaigns ON leads.campaign_id = campaigns.id
    LEFT JOIN users AS assigned_user ON leads.assigned_to = assigned_user.id
"#;

/// Builds the filtered list query.
///
/// Predicates are appended in a fixed order (status, source, campaign_id,
/// assigned_to, search) so the caller can bind values in the same order,
/// followed by LIMIT and OFFSET.
pub fn build_list_sql(filter: &LeadFilter) -> String {
    let mut predicates = Vec::new();
    let mut bind = 0;

    if filter.status.is_some() {
        bind += 1;
        predicates.push(format!("leads.status = ${}", bind));
    }
    if filter.source.is_some() {
        bind += 1;
        predicates.push(format!("leads.source = ${}", bind));
    }
    if filter.campaign_id.is_some() {
        bind += 1;
        predicates.push(format!("leads.campaign_id = ${}", bind));
    }
    if filter.assigned_to.is_some() {
        bind += 1;
        predicates.push(format!("leads.assigned_to = ${}", bind));
    }
    if filter.search.is_some() {
        bind += 1;
        predicates.push(format!(
            "(leads.first_name ILIKE ${n} OR leads.last_name ILIKE ${n} \
             OR leads.email ILIKE ${n} OR leads.company ILIKE ${n})",
            n = bind
        ));
    }

    let mut sql = String::from(LEAD_SELECT);
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    sql.push_str(" ORDER BY leads.created_at DESC");
    sql.push_str(&format!(" LIMIT ${} OFFSET ${}", bind + 1, bind + 2));
    sql
}

/// Builds the count query matching [`build_list_sql`]'s predicates, with the
/// same bind order but no pagination binds.
pub fn build_count_sql(filter: &LeadFilter) -> String {
    let mut predicates = Vec::new();
    let mut bind = 0;

    if filter.status.is_some() {
        bind += 1;
        predicates.push(format!("status = ${}", bind));
    }
    if filter.source.is_some() {
        bind += 1;
        predicates.push(format!("source = ${}", bind));
    }
    if filter.campaign_id.is_some() {
        bind += 1;
        predicates.push(format!("campaign_id = ${}", bind));
    }
    if filter.assigned_to.is_some() {
        bind += 1;
        predicates.push(format!("assigned_to = ${}", bind));
    }
    if filter.search.is_some() {
        bind += 1;
        predicates.push(format!(
            "(first_name ILIKE ${n} OR last_name ILIKE ${n} \
             OR email ILIKE ${n} OR company ILIKE ${n})",
            n = bind
        ));
    }

    let mut sql = String::from("SELECT COUNT(*) FROM leads");
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    sql
}

impl Lead {
    /// Creates a new lead
    ///
    /// Status defaults to `new` and source to `other` when not provided.
    /// The inserted row is re-read through the joined select so the response
    /// shape matches list/lookup results.
    pub async fn create(pool: &PgPool, data: CreateLead) -> Result<Self, sqlx::Error> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO leads (first_name, last_name, email, phone, company, position,
                               status, source, value, notes, campaign_id, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6,
                    COALESCE($7, 'new'::lead_status),
                    COALESCE($8, 'other'::lead_source),
                    $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.company)
        .bind(data.position)
        .bind(data.status)
        .bind(data.source)
        .bind(data.value)
        .bind(data.notes)
        .bind(data.campaign_id)
        .bind(data.assigned_to)
        .fetch_one(pool)
        .await?;

        let lead = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        Ok(lead)
    }

    /// Finds a lead by ID, with campaign and assignee names
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("{} WHERE leads.id = $1", LEAD_SELECT);

        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(lead)
    }

    /// Lists leads matching the filter, newest first
    pub async fn list(pool: &PgPool, filter: &LeadFilter) -> Result<Vec<Self>, sqlx::Error> {
        let sql = build_list_sql(filter);

        let mut query = sqlx::query_as::<_, Lead>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(source) = filter.source {
            query = query.bind(source);
        }
        if let Some(campaign_id) = filter.campaign_id {
            query = query.bind(campaign_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            query = query.bind(assigned_to);
        }
        if let Some(ref search) = filter.search {
            query = query.bind(format!("%{}%", search));
        }
        query = query
            .bind(clamp_limit(filter.limit))
            .bind(clamp_offset(filter.offset));

        let leads = query.fetch_all(pool).await?;

        Ok(leads)
    }

    /// Counts leads matching the filter
    ///
    /// Used for pagination metadata alongside [`Lead::list`].
    pub async fn count(pool: &PgPool, filter: &LeadFilter) -> Result<i64, sqlx::Error> {
        let sql = build_count_sql(filter);

        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(source) = filter.source {
            query = query.bind(source);
        }
        if let Some(campaign_id) = filter.campaign_id {
            query = query.bind(campaign_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            query = query.bind(assigned_to);
        }
        if let Some(ref search) = filter.search {
            query = query.bind(format!("%{}%", search));
        }

        let (count,) = query.fetch_one(pool).await?;

        Ok(count)
    }

    /// Updates the provided fields of a lead
    ///
    /// Returns the updated lead, or None if the ID does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateLead,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let mut sql = String::from("UPDATE leads SET updated_at = NOW()");
        let mut bind_count = 1;
        let mut add_column = |sql: &mut String, column: &str| {
            bind_count += 1;
            sql.push_str(&format!(", {} = ${}", column, bind_count));
        };

        if data.first_name.is_some() {
            add_column(&mut sql, "first_name");
        }
        if data.last_name.is_some() {
            add_column(&mut sql, "last_name");
        }
        if data.email.is_some() {
            add_column(&mut sql, "email");
        }
        if data.phone.is_some() {
            add_column(&mut sql, "phone");
        }
        if data.company.is_some() {
            add_column(&mut sql, "company");
        }
        if data.position.is_some() {
            add_column(&mut sql, "position");
        }
        if data.status.is_some() {
            add_column(&mut sql, "status");
        }
        if data.source.is_some() {
            add_column(&mut sql, "source");
        }
        if data.value.is_some() {
            add_column(&mut sql, "value");
        }
        if data.notes.is_some() {
            add_column(&mut sql, "notes");
        }
        if data.campaign_id.is_some() {
            add_column(&mut sql, "campaign_id");
        }
        if data.assigned_to.is_some() {
            add_column(&mut sql, "assigned_to");
        }

        sql.push_str(" WHERE id = $1 RETURNING id");

        let mut query = sqlx::query_as::<_, (Uuid,)>(&sql).bind(id);

        if let Some(first_name) = data.first_name {
            query = query.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            query = query.bind(last_name);
        }
        if let Some(email) = data.email {
            query = query.bind(email);
        }
        if let Some(phone) = data.phone {
            query = query.bind(phone);
        }
        if let Some(company) = data.company {
            query = query.bind(company);
        }
        if let Some(position) = data.position {
            query = query.bind(position);
        }
        if let Some(status) = data.status {
            query = query.bind(status);
        }
        if let Some(source) = data.source {
            query = query.bind(source);
        }
        if let Some(value) = data.value {
            query = query.bind(value);
        }
        if let Some(notes) = data.notes {
            query = query.bind(notes);
        }
        if let Some(campaign_id) = data.campaign_id {
            // Inner None binds SQL NULL, detaching the campaign
            query = query.bind(campaign_id);
        }
        if let Some(assigned_to) = data.assigned_to {
            query = query.bind(assigned_to);
        }

        match query.fetch_optional(pool).await? {
            Some((id,)) => Self::find_by_id(pool, id).await,
            None => Ok(None),
        }
    }

    /// Deletes a lead
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Aggregate statistics across all leads
    pub async fn overview_stats(pool: &PgPool) -> Result<LeadOverviewStats, sqlx::Error> {
        let row = sqlx::query_as::<_, OverviewRow>(
            r#"
            SELECT COUNT(*) AS total_leads,
                   COUNT(*) FILTER (WHERE status = 'new') AS new_leads,
                   COUNT(*) FILTER (WHERE status = 'contacted') AS contacted_leads,
                   COUNT(*) FILTER (WHERE status = 'qualified') AS qualified_leads,
                   COUNT(*) FILTER (WHERE status = 'proposal') AS proposal_leads,
                   COUNT(*) FILTER (WHERE status = 'won') AS won_leads,
                   COUNT(*) FILTER (WHERE status = 'lost') AS lost_leads,
                   COALESCE(SUM(value) FILTER (WHERE status = 'won'), 0) AS total_won_value,
                   COALESCE(AVG(value), 0) AS avg_lead_value
            FROM leads
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(LeadOverviewStats {
            total_leads: row.total_leads,
            new_leads: row.new_leads,
            contacted_leads: row.contacted_leads,
            qualified_leads: row.qualified_leads,
            proposal_leads: row.proposal_leads,
            won_leads: row.won_leads,
            lost_leads: row.lost_leads,
            total_won_value: row.total_won_value,
            avg_lead_value: row.avg_lead_value,
            conversion_rate: conversion_rate(row.won_leads, row.total_leads),
        })
    }

    /// Lead counts and won value grouped by source, busiest source first
    pub async fn stats_by_source(pool: &PgPool) -> Result<Vec<SourceStats>, sqlx::Error> {
        let stats = sqlx::query_as::<_, SourceStats>(
            r#"
            SELECT source,
                   COUNT(*) AS count,
                   COUNT(*) FILTER (WHERE status = 'won') AS won_count,
                   COALESCE(SUM(value) FILTER (WHERE status = 'won'), 0) AS won_value
            FROM leads
            GROUP BY source
            ORDER BY count DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(stats)
    }

    /// Lead counts and total value grouped by status, in pipeline order
    pub async fn stats_by_status(pool: &PgPool) -> Result<Vec<StatusStats>, sqlx::Error> {
        let stats = sqlx::query_as::<_, StatusStats>(
            r#"
            SELECT status,
                   COUNT(*) AS count,
                   COALESCE(SUM(value), 0) AS total_value
            FROM leads
            GROUP BY status
            ORDER BY CASE status
                WHEN 'new' THEN 1
                WHEN 'contacted' THEN 2
                WHEN 'qualified' THEN 3
                WHEN 'proposal' THEN 4
                WHEN 'won' THEN 5
                WHEN 'lost' THEN 6
            END
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(LeadStatus::New.as_str(), "new");
        assert_eq!(LeadStatus::Contacted.as_str(), "contacted");
        assert_eq!(LeadStatus::Qualified.as_str(), "qualified");
        assert_eq!(LeadStatus::Proposal.as_str(), "proposal");
        assert_eq!(LeadStatus::Won.as_str(), "won");
        assert_eq!(LeadStatus::Lost.as_str(), "lost");
    }

    #[test]
    fn test_source_as_str() {
        assert_eq!(LeadSource::Website.as_str(), "website");
        assert_eq!(LeadSource::Referral.as_str(), "referral");
        assert_eq!(LeadSource::Social.as_str(), "social");
        assert_eq!(LeadSource::Email.as_str(), "email");
        assert_eq!(LeadSource::Phone.as_str(), "phone");
        assert_eq!(LeadSource::Other.as_str(), "other");
    }

    #[test]
    fn test_enum_serde_lowercase() {
        assert_eq!(serde_json::to_string(&LeadStatus::Won).unwrap(), "\"won\"");
        assert_eq!(
            serde_json::to_string(&LeadSource::Website).unwrap(),
            "\"website\""
        );

        let status: LeadStatus = serde_json::from_str("\"proposal\"").unwrap();
        assert_eq!(status, LeadStatus::Proposal);

        assert!(serde_json::from_str::<LeadStatus>("\"bogus\"").is_err());
    }

    #[test]
    fn test_build_list_sql_no_filters() {
        let sql = build_list_sql(&LeadFilter::default());
        assert!(!sql.contains("WHERE"));
        assert!(sql.contains("ORDER BY leads.created_at DESC"));
        assert!(sql.contains("LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_build_list_sql_all_filters() {
        let filter = LeadFilter {
            status: Some(LeadStatus::New),
            source: Some(LeadSource::Website),
            campaign_id: Some(Uuid::new_v4()),
            assigned_to: Some(Uuid::new_v4()),
            search: Some("acme".to_string()),
            limit: None,
            offset: None,
        };
        let sql = build_list_sql(&filter);
        assert!(sql.contains("leads.status = $1"));
        assert!(sql.contains("leads.source = $2"));
        assert!(sql.contains("leads.campaign_id = $3"));
        assert!(sql.contains("leads.assigned_to = $4"));
        assert!(sql.contains("leads.first_name ILIKE $5"));
        assert!(sql.contains("leads.company ILIKE $5"));
        assert!(sql.contains("LIMIT $6 OFFSET $7"));
    }

    #[test]
    fn test_build_count_sql_matches_list_predicates() {
        let filter = LeadFilter {
            status: Some(LeadStatus::Qualified),
            search: Some("acme".to_string()),
            ..Default::default()
        };
        let sql = build_count_sql(&filter);
        assert!(sql.starts_with("SELECT COUNT(*) FROM leads WHERE"));
        assert!(sql.contains("status = $1"));
        assert!(sql.contains("first_name ILIKE $2"));
        assert!(!sql.contains("LIMIT"));

        assert_eq!(
            build_count_sql(&LeadFilter::default()),
            "SELECT COUNT(*) FROM leads"
        );
    }

    #[test]
    fn test_build_list_sql_search_only() {
        let filter = LeadFilter {
            search: Some("jane".to_string()),
            ..Default::default()
        };
        let sql = build_list_sql(&filter);
        assert!(sql.contains("WHERE (leads.first_name ILIKE $1"));
        assert!(sql.contains("LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateLead::default().is_empty());

        let update = UpdateLead {
            campaign_id: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty(), "explicit null detach is an update");
    }
}
