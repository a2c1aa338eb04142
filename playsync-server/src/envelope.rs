use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// The body every successful request responds with
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    status_code: u16,
    data: T,
    message: String,
    success: bool,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn ok(data: T, message: &str) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            data,
            message: message.to_string(),
            success: true,
        }
    }

    pub fn created(data: T, message: &str) -> Self {
        Self {
            status_code: StatusCode::CREATED.as_u16(),
            data,
            message: message.to_string(),
            success: true,
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::ok(json!({ "liked": true }), "Toggled like");
        let value = serde_json::to_value(&response).expect("serializes");

        assert_eq!(
            value,
            json!({
                "statusCode": 200,
                "data": { "liked": true },
                "message": "Toggled like",
                "success": true,
            })
        );
    }

    #[test]
    fn test_created_status() {
        let response = ApiResponse::created(json!({}), "Created");
        let value = serde_json::to_value(&response).expect("serializes");

        assert_eq!(value["statusCode"], 201);
        assert_eq!(value["success"], true);
    }
}
