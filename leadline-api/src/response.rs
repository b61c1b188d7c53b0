/// Success response envelope
///
/// Every successful response uses the shape
/// `{ success: true, message?, data? }`; list endpoints add a `meta` block
/// with pagination information.

use serde::{Deserialize, Serialize};

/// Standard success envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Always true
    pub success: bool,

    /// Optional human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Envelope carrying data only
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Envelope carrying a message and data
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope carrying a message only (e.g. after a delete)
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMeta {
    /// Total rows matching the filter, ignoring pagination
    pub total: i64,

    /// Page size actually applied (after clamping)
    pub limit: i64,

    /// Offset actually applied
    pub offset: i64,
}

/// List envelope with pagination metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Always true
    pub success: bool,

    /// The page of rows
    pub data: Vec<T>,

    /// Pagination metadata
    pub meta: ListMeta,
}

impl<T> ListResponse<T> {
    /// Builds a list envelope
    pub fn new(data: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            success: true,
            data,
            meta: ListMeta {
                total,
                limit,
                offset,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let response = ApiResponse::success(serde_json::json!({ "id": 1 }));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_message_only_envelope() {
        let response = ApiResponse::message("Campaign deleted successfully");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Campaign deleted successfully");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_list_envelope_meta() {
        let response = ListResponse::new(vec![1, 2, 3], 42, 50, 0);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["meta"]["total"], 42);
        assert_eq!(json["meta"]["limit"], 50);
        assert_eq!(json["meta"]["offset"], 0);
        assert_eq!(json["data"].as_array().unwrap().len(), 3);
    }
}
