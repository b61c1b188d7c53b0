/// Campaign endpoints
///
/// All routes are protected. Campaigns are owner-scoped: only the creator
/// may read, update, or delete one. The ownership check always looks the
/// row up first, so a missing ID is a 404 and someone else's campaign a
/// 403, never the other way around.
///
/// # Endpoints
///
/// - `GET    /api/campaigns` - List own campaigns
/// - `POST   /api/campaigns` - Create a campaign
/// - `GET    /api/campaigns/:id` - Campaign with its stats
/// - `PUT    /api/campaigns/:id` - Partial update
/// - `DELETE /api/campaigns/:id` - Delete (leads are detached, not removed)
/// - `GET    /api/campaigns/:id/stats` - Aggregate lead stats

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
    response::{ApiResponse, ListResponse},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension,
};
use chrono::NaiveDate;
use leadline_shared::{
    auth::middleware::AuthContext,
    models::{
        campaign::{
            Campaign, CampaignFilter, CampaignStats, CampaignStatus, CreateCampaign,
            UpdateCampaign,
        },
        clamp_limit, clamp_offset,
    },
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Create campaign request
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_create_dates"))]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub status: Option<CampaignStatus>,

    #[validate(range(exclusive_min = 0.0, message = "Budget must be a positive number"))]
    pub budget: Option<f64>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Update campaign request; only provided fields are written
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_update_dates"))]
pub struct UpdateCampaignRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub status: Option<CampaignStatus>,

    #[validate(range(exclusive_min = 0.0, message = "Budget must be a positive number"))]
    pub budget: Option<f64>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct CampaignListQuery {
    pub status: Option<CampaignStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Campaign together with its aggregate lead stats
///
/// The campaign fields sit at the top level of the payload, with the stats
/// block alongside them.
#[derive(Debug, Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub stats: CampaignStats,
}

fn date_range_error() -> ValidationError {
    let mut error = ValidationError::new("date_range");
    error.message = Some("End date must be on or after start date".into());
    error
}

fn validate_create_dates(req: &CreateCampaignRequest) -> Result<(), ValidationError> {
    check_date_order(req.start_date, req.end_date)
}

fn validate_update_dates(req: &UpdateCampaignRequest) -> Result<(), ValidationError> {
    check_date_order(req.start_date, req.end_date)
}

/// Rejects end_date before start_date when both are present in one request
fn check_date_order(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match (start_date, end_date) {
        (Some(start), Some(end)) if end < start => Err(date_range_error()),
        _ => Ok(()),
    }
}

/// Looks up a campaign and enforces ownership: 404 if the ID does not
/// exist, 403 if it belongs to someone else.
async fn find_owned(pool: &PgPool, id: Uuid, caller: Uuid) -> Result<Campaign, ApiError> {
    let campaign = Campaign::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".to_string()))?;

    if campaign.created_by != Some(caller) {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    Ok(campaign)
}

/// List the caller's campaigns, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CampaignListQuery>,
) -> ApiResult<Json<ListResponse<Campaign>>> {
    let filter = CampaignFilter {
        status: query.status,
        limit: query.limit,
        offset: query.offset,
    };

    let campaigns = Campaign::list(&state.db, auth.user_id, &filter).await?;
    let total = Campaign::count(&state.db, auth.user_id, &filter).await?;

    Ok(Json(ListResponse::new(
        campaigns,
        total,
        clamp_limit(filter.limit),
        clamp_offset(filter.offset),
    )))
}

/// A single campaign with its stats
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<CampaignDetail>>> {
    let campaign = find_owned(&state.db, id, auth.user_id).await?;
    let stats = Campaign::stats(&state.db, campaign.id).await?;

    Ok(Json(ApiResponse::success(CampaignDetail { campaign, stats })))
}

/// Create a campaign owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Campaign>>)> {
    req.validate()?;

    let campaign = Campaign::create(
        &state.db,
        CreateCampaign {
            name: req.name,
            description: req.description,
            status: req.status,
            budget: req.budget,
            start_date: req.start_date,
            end_date: req.end_date,
            created_by: auth.user_id,
        },
    )
    .await?;

    tracing::info!(campaign_id = %campaign.id, user_id = %auth.user_id, "Campaign created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            "Campaign created successfully",
            campaign,
        )),
    ))
}

/// Partially update an owned campaign
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCampaignRequest>,
) -> ApiResult<Json<ApiResponse<Campaign>>> {
    req.validate()?;

    find_owned(&state.db, id, auth.user_id).await?;

    let campaign = Campaign::update(
        &state.db,
        id,
        UpdateCampaign {
            name: req.name,
            description: req.description,
            status: req.status,
            budget: req.budget,
            start_date: req.start_date,
            end_date: req.end_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Campaign not found".to_string()))?;

    Ok(Json(ApiResponse::success_with_message(
        "Campaign updated successfully",
        campaign,
    )))
}

/// Delete an owned campaign; its leads are detached by the database
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    find_owned(&state.db, id, auth.user_id).await?;

    Campaign::delete(&state.db, id).await?;

    tracing::info!(campaign_id = %id, user_id = %auth.user_id, "Campaign deleted");

    Ok(Json(ApiResponse::message("Campaign deleted successfully")))
}

/// Aggregate lead stats for an owned campaign
pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<CampaignStats>>> {
    find_owned(&state.db, id, auth.user_id).await?;

    let stats = Campaign::stats(&state.db, id).await?;

    Ok(Json(ApiResponse::success(stats)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateCampaignRequest {
        CreateCampaignRequest {
            name: "Spring Launch".to_string(),
            description: None,
            status: None,
            budget: Some(1500.0),
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_create_request_valid() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn test_budget_must_be_positive() {
        let req = CreateCampaignRequest {
            budget: Some(0.0),
            ..valid_create()
        };
        assert!(req.validate().is_err());

        let req = CreateCampaignRequest {
            budget: Some(-10.0),
            ..valid_create()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_end_date_before_start_date_rejected() {
        let req = CreateCampaignRequest {
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            ..valid_create()
        };
        assert!(req.validate().is_err());

        // Equal dates are allowed
        let req = CreateCampaignRequest {
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            ..valid_create()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_one_sided_dates_allowed() {
        let req = CreateCampaignRequest {
            end_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            ..valid_create()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_detail_payload_flattens_campaign_fields() {
        use chrono::Utc;

        let detail = CampaignDetail {
            campaign: Campaign {
                id: Uuid::new_v4(),
                name: "Spring Launch".to_string(),
                description: None,
                status: CampaignStatus::Active,
                budget: Some(1500.0),
                start_date: None,
                end_date: None,
                created_by: Some(Uuid::new_v4()),
                creator_first_name: Some("Jane".to_string()),
                creator_last_name: Some("Doe".to_string()),
                lead_count: 3,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            stats: CampaignStats {
                total_leads: 3,
                won_count: 1,
                lost_count: 0,
                won_value: 500.0,
                avg_lead_value: 400.0,
                conversion_rate: 33.3,
            },
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Spring Launch");
        assert_eq!(json["lead_count"], 3);
        assert!(json.get("campaign").is_none());
        assert_eq!(json["stats"]["won_count"], 1);
    }

    #[test]
    fn test_update_request_all_optional() {
        let req = UpdateCampaignRequest {
            name: None,
            description: None,
            status: None,
            budget: None,
            start_date: None,
            end_date: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_name_length_bounds() {
        let req = CreateCampaignRequest {
            name: "x".repeat(101),
            ..valid_create()
        };
        assert!(req.validate().is_err());

        let req = CreateCampaignRequest {
            name: String::new(),
            ..valid_create()
        };
        assert!(req.validate().is_err());
    }
}
