//! HTTP error response payload
//!
//! `IntoResponse` for `AppError` lives in the API crate (orphan rule); this is
//! only the serialized body.

use serde::Serialize;

/// Standard error response format for HTTP APIs
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            error_type: None,
            suggested_action: None,
        }
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_suggested_action(mut self, action: Option<&str>) -> Self {
        self.suggested_action = action.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_omitted() {
        let json = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "boom" }));

        let json = serde_json::to_value(
            ErrorResponse::new("Image with ID 3 not found")
                .with_type("IMAGE_NOT_FOUND")
                .with_suggested_action(Some("Verify the image ID exists")),
        )
        .unwrap();
        assert_eq!(json["error_type"], "IMAGE_NOT_FOUND");
        assert_eq!(json["suggested_action"], "Verify the image ID exists");
    }
}
