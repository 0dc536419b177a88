//! Tagged result envelope handed to UI callers

use serde::{Deserialize, Serialize};

use crate::utils::errors::Result;

/// `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(e.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::FarmPoolError;
    use uuid::Uuid;

    #[test]
    fn test_success_envelope_shape() {
        let response: ApiResponse<f64> = Ok(9.5).into();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 9.5}));
    }

    #[test]
    fn test_failure_envelope_uses_user_message() {
        let result: Result<f64> = Err(FarmPoolError::GroupNotFound { group_id: Uuid::nil() });
        let response: ApiResponse<f64> = result.into();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "This group buy could not be found."})
        );
    }
}
