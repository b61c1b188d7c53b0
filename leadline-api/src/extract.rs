/// JSON body extraction
///
/// axum's default `Json` extractor answers malformed bodies with a
/// plain-text 422. This wrapper funnels those rejections through
/// [`ApiError`] instead, so syntax errors, unknown enum values, and bad
/// UUIDs all produce the standard 400 `{ success: false, message }`
/// envelope like every other validation failure.
///
/// The wrapper also implements `IntoResponse`, so handlers use it for both
/// request bodies and JSON responses.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Envelope-aware replacement for `axum::Json`
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(Self(value))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::campaigns::CreateCampaignRequest;
    use axum::{body::Body, http::StatusCode, routing::post, Router};
    use tower::Service as _;

    async fn create_stub(Json(_req): Json<CreateCampaignRequest>) -> StatusCode {
        StatusCode::CREATED
    }

    async fn post_json(body: &'static str) -> (StatusCode, serde_json::Value) {
        let mut app = Router::new().route("/", post(create_stub));

        let response = app
            .call(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    #[tokio::test]
    async fn test_unknown_enum_value_gets_400_envelope() {
        let (status, json) = post_json(r#"{ "name": "X", "status": "bogus" }"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_json_gets_400_envelope() {
        let (status, json) = post_json(r#"{ "name": "#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let (status, _) = post_json(r#"{ "name": "Spring Launch" }"#).await;

        assert_eq!(status, StatusCode::CREATED);
    }
}
