// Request body extraction with API-shaped rejections

use crate::core::error::ApiError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// JSON request body that never rejects with axum's plain-text errors
///
/// An empty body deserializes as `T::default()`, so a request without a
/// body reaches the handler's own missing-field check. A non-empty body
/// must be `application/json` and well formed; anything else becomes
/// `ApiError::Validation`.
#[derive(Debug, Clone, Default)]
pub struct JsonBody<T>(pub T);

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json_content = is_json_content_type(req.headers());

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }

        if !json_content {
            return Err(ApiError::Validation(
                "Expected request with Content-Type: application/json".to_string(),
            ));
        }

        let Json(value) = Json::<T>::from_bytes(&bytes).map_err(|rejection| {
            debug!(error = %rejection.body_text(), "Rejected request body");
            ApiError::Validation(rejection.body_text())
        })?;

        Ok(JsonBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::api::SheetNameRequest;
    use axum::{body::Body, http::StatusCode, response::IntoResponse};

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<SheetNameRequest, ApiError> {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();

        JsonBody::<SheetNameRequest>::from_request(request, &())
            .await
            .map(|JsonBody(value)| value)
    }

    #[tokio::test]
    async fn test_empty_body_is_default() {
        let request = extract(None, "").await.unwrap();
        assert!(request.sheet_name.is_none());

        let request = extract(Some("application/json"), "  \n").await.unwrap();
        assert!(request.sheet_name.is_none());
    }

    #[tokio::test]
    async fn test_json_body() {
        let request = extract(Some("application/json; charset=utf-8"), r#"{"sheetName":"Budget"}"#)
            .await
            .unwrap();
        assert_eq!(request.sheet_name.as_deref(), Some("Budget"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let err = extract(Some("application/json"), "{not json").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = extract(Some("application/json"), r#"{"sheetName": 7}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_json_body_is_validation_error() {
        let err = extract(Some("text/plain"), "sheetName=Budget").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_json_content_types() {
        let mut headers = HeaderMap::new();
        assert!(!is_json_content_type(&headers));

        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        assert!(is_json_content_type(&headers));

        headers.insert(CONTENT_TYPE, "application/merge-patch+json".parse().unwrap());
        assert!(is_json_content_type(&headers));

        headers.insert(CONTENT_TYPE, "text/html".parse().unwrap());
        assert!(!is_json_content_type(&headers));
    }
}
