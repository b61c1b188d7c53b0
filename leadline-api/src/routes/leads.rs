/// Lead endpoints
///
/// All routes are protected. Unlike campaigns, leads are a shared
/// workspace: any authenticated user may read and modify any lead.
///
/// # Endpoints
///
/// - `GET    /api/leads` - Filtered, paginated list
/// - `POST   /api/leads` - Create (assignee defaults to the caller)
/// - `GET    /api/leads/:id` - Single lead
/// - `PUT    /api/leads/:id` - Partial update; explicit null detaches
///   campaign/assignee
/// - `DELETE /api/leads/:id` - Delete
/// - `GET    /api/leads/stats/overview` - Aggregate statistics
/// - `GET    /api/leads/export/csv` - CSV download of the filtered list

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
    response::{ApiResponse, ListResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use leadline_shared::{
    auth::middleware::AuthContext,
    models::{
        clamp_limit, clamp_offset,
        lead::{
            CreateLead, Lead, LeadFilter, LeadOverviewStats, LeadSource, LeadStatus, SourceStats,
            StatusStats, UpdateLead,
        },
    },
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Rows included in a CSV export
const EXPORT_LIMIT: i64 = 1000;

/// Create lead request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, max = 50, message = "First name must be 1-50 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name must be 1-50 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Company must be at most 100 characters"))]
    pub company: Option<String>,

    #[validate(length(max = 100, message = "Position must be at most 100 characters"))]
    pub position: Option<String>,

    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,

    #[validate(range(exclusive_min = 0.0, message = "Value must be a positive number"))]
    pub value: Option<f64>,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,

    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

/// Update lead request; only provided fields are written
///
/// `campaign_id` and `assigned_to` distinguish "absent" from an explicit
/// `null`: the latter detaches the lead from its campaign or assignee.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLeadRequest {
    #[validate(length(min = 1, max = 50, message = "First name must be 1-50 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Last name must be 1-50 characters"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Company must be at most 100 characters"))]
    pub company: Option<String>,

    #[validate(length(max = 100, message = "Position must be at most 100 characters"))]
    pub position: Option<String>,

    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,

    #[validate(range(exclusive_min = 0.0, message = "Value must be a positive number"))]
    pub value: Option<f64>,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub campaign_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
}

/// Deserializes a field so that a present-but-null value becomes
/// `Some(None)` while an absent field stays `None` (via `#[serde(default)]`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct LeadListQuery {
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub campaign_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<LeadListQuery> for LeadFilter {
    fn from(query: LeadListQuery) -> Self {
        Self {
            status: query.status,
            source: query.source,
            campaign_id: query.campaign_id,
            assigned_to: query.assigned_to,
            search: query.search,
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// Combined statistics payload
#[derive(Debug, Serialize)]
pub struct LeadStatsData {
    pub overview: LeadOverviewStats,
    pub by_source: Vec<SourceStats>,
    pub by_status: Vec<StatusStats>,
}

/// Filtered, paginated lead list, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<LeadListQuery>,
) -> ApiResult<Json<ListResponse<Lead>>> {
    let filter: LeadFilter = query.into();

    let leads = Lead::list(&state.db, &filter).await?;
    let total = Lead::count(&state.db, &filter).await?;

    Ok(Json(ListResponse::new(
        leads,
        total,
        clamp_limit(filter.limit),
        clamp_offset(filter.offset),
    )))
}

/// A single lead with its campaign and assignee names
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Lead>>> {
    let lead = Lead::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;

    Ok(Json(ApiResponse::success(lead)))
}

/// Create a lead; unassigned leads go to the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateLeadRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Lead>>)> {
    req.validate()?;

    let lead = Lead::create(
        &state.db,
        CreateLead {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            company: req.company,
            position: req.position,
            status: req.status,
            source: req.source,
            value: req.value,
            notes: req.notes,
            campaign_id: req.campaign_id,
            assigned_to: req.assigned_to.or(Some(auth.user_id)),
        },
    )
    .await?;

    tracing::info!(lead_id = %lead.id, user_id = %auth.user_id, "Lead created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Lead created successfully",
            lead,
        )),
    ))
}

/// Partially update a lead
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLeadRequest>,
) -> ApiResult<Json<ApiResponse<Lead>>> {
    req.validate()?;

    let lead = Lead::update(
        &state.db,
        id,
        UpdateLead {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            company: req.company,
            position: req.position,
            status: req.status,
            source: req.source,
            value: req.value,
            notes: req.notes,
            campaign_id: req.campaign_id,
            assigned_to: req.assigned_to,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Lead not found".to_string()))?;

    Ok(Json(ApiResponse::success_with_message(
        "Lead updated successfully",
        lead,
    )))
}

/// Delete a lead
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let deleted = Lead::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Lead not found".to_string()));
    }

    tracing::info!(lead_id = %id, "Lead deleted");

    Ok(Json(ApiResponse::message("Lead deleted successfully")))
}

/// Aggregate statistics: overview plus per-source and per-status breakdowns
pub async fn stats_overview(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<LeadStatsData>>> {
    let overview = Lead::overview_stats(&state.db).await?;
    let by_source = Lead::stats_by_source(&state.db).await?;
    let by_status = Lead::stats_by_status(&state.db).await?;

    Ok(Json(ApiResponse::success(LeadStatsData {
        overview,
        by_source,
        by_status,
    })))
}

/// Export the filtered lead list as a CSV download
///
/// Applies the same filters as the list endpoint with the page size forced
/// to the export limit. The CSV is materialized into a timestamped file in
/// the system temp directory, the response body is served from that file,
/// and the file is removed a few seconds after the response is sent.
pub async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<LeadListQuery>,
) -> ApiResult<Response> {
    let mut filter: LeadFilter = query.into();
    filter.limit = Some(EXPORT_LIMIT);
    filter.offset = Some(0);

    let leads = Lead::list(&state.db, &filter).await?;
    let csv = leads_to_csv(&leads)
        .map_err(|e| ApiError::InternalError(format!("CSV rendering failed: {}", e)))?;

    let filename = export_filename(chrono::Utc::now().timestamp());
    let path = std::env::temp_dir().join(&filename);

    tokio::fs::write(&path, &csv)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to write export file: {}", e)))?;

    let contents = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to read export file: {}", e)))?;

    // Remove the temp file once the response has surely been sent
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove export file {}: {}", path.display(), e);
        }
    });

    tracing::info!(rows = leads.len(), "Lead CSV export generated");

    let response = (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        contents,
    )
        .into_response();

    Ok(response)
}

/// Name of an export file for the given Unix timestamp
fn export_filename(timestamp: i64) -> String {
    format!("leads-export-{}.csv", timestamp)
}

/// Renders leads into CSV with a fixed column order
fn leads_to_csv(leads: &[Lead]) -> Result<String, Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "ID",
        "First Name",
        "Last Name",
        "Email",
        "Phone",
        "Company",
        "Position",
        "Status",
        "Source",
        "Value",
        "Campaign",
        "Assigned First Name",
        "Assigned Last Name",
        "Created At",
        "Notes",
    ])?;

    for lead in leads {
        writer.write_record([
            lead.id.to_string(),
            lead.first_name.clone(),
            lead.last_name.clone(),
            lead.email.clone(),
            lead.phone.clone().unwrap_or_default(),
            lead.company.clone().unwrap_or_default(),
            lead.position.clone().unwrap_or_default(),
            lead.status.as_str().to_string(),
            lead.source.as_str().to_string(),
            lead.value.map(|v| v.to_string()).unwrap_or_default(),
            lead.campaign_name.clone().unwrap_or_default(),
            lead.assigned_first_name.clone().unwrap_or_default(),
            lead.assigned_last_name.clone().unwrap_or_default(),
            lead.created_at.to_rfc3339(),
            lead.notes.clone().unwrap_or_default(),
        ])?;
    }

    Ok(String::from_utf8(writer.into_inner()?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_lead() -> Lead {
        Lead {
            id: Uuid::new_v4(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@acme.example".to_string(),
            phone: Some("+1-555-0100".to_string()),
            company: Some("Acme".to_string()),
            position: None,
            status: LeadStatus::Qualified,
            source: LeadSource::Referral,
            value: Some(2500.0),
            notes: Some("Met at the trade show".to_string()),
            campaign_id: None,
            assigned_to: None,
            campaign_name: Some("Spring Launch".to_string()),
            assigned_first_name: None,
            assigned_last_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_csv_header_and_rows() {
        let leads = vec![sample_lead(), sample_lead()];
        let csv = leads_to_csv(&leads).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID,First Name,Last Name,Email"));
        assert!(lines[1].contains("Jane"));
        assert!(lines[1].contains("qualified"));
        assert!(lines[1].contains("referral"));
    }

    #[test]
    fn test_csv_empty_list_is_header_only() {
        let csv = leads_to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_csv_missing_optionals_render_empty() {
        let mut lead = sample_lead();
        lead.phone = None;
        lead.value = None;

        let csv = leads_to_csv(&[lead]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(",,"));
    }

    #[test]
    fn test_export_filename_format() {
        assert_eq!(
            export_filename(1700000000),
            "leads-export-1700000000.csv"
        );
    }

    #[tokio::test]
    async fn test_export_file_round_trip() {
        let csv = leads_to_csv(&[sample_lead()]).unwrap();
        let path = std::env::temp_dir().join(export_filename(0));

        tokio::fs::write(&path, &csv).await.unwrap();
        let contents = tokio::fs::read(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(contents, csv.as_bytes());
    }

    #[test]
    fn test_update_request_null_detaches() {
        let req: UpdateLeadRequest =
            serde_json::from_str(r#"{ "campaign_id": null, "status": "won" }"#).unwrap();

        assert_eq!(req.campaign_id, Some(None));
        assert_eq!(req.assigned_to, None);
        assert_eq!(req.status, Some(LeadStatus::Won));
    }

    #[test]
    fn test_update_request_reassignment() {
        let id = Uuid::new_v4();
        let req: UpdateLeadRequest =
            serde_json::from_str(&format!(r#"{{ "assigned_to": "{}" }}"#, id)).unwrap();

        assert_eq!(req.assigned_to, Some(Some(id)));
        assert_eq!(req.campaign_id, None);
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreateLeadRequest {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "not-an-email".to_string(),
            phone: Some("x".repeat(21)),
            company: None,
            position: None,
            status: None,
            source: None,
            value: Some(-1.0),
            notes: None,
            campaign_id: None,
            assigned_to: None,
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("value"));
    }
}
