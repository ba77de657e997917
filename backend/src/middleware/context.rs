//! Operator context extraction
//!
//! Authentication and role resolution live in front of this service; each
//! request arrives with the already-verified operator identity and factory
//! scope in headers, and every recorder call takes that context as an
//! explicit parameter rather than reading ambient state.

use axum::{
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{ErrorDetail, ErrorResponse};
use shared::OperatorContext;

/// Header carrying the acting user's id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the factory scope of the request
pub const FACTORY_ID_HEADER: &str = "x-factory-id";

/// Extractor for the caller-supplied operator context
#[derive(Clone, Debug)]
pub struct CurrentOperator(pub OperatorContext);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentOperator
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_uuid(parts, USER_ID_HEADER)?;
        let factory_id = header_uuid(parts, FACTORY_ID_HEADER)?;

        Ok(CurrentOperator(OperatorContext::new(user_id, factory_id)))
    }
}

fn header_uuid(
    parts: &axum::http::request::Parts,
    name: &str,
) -> Result<Uuid, (StatusCode, Json<ErrorResponse>)> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| {
            let error = ErrorResponse {
                error: ErrorDetail {
                    code: "MISSING_OPERATOR_CONTEXT".to_string(),
                    message: format!("Missing or invalid {} header", name),
                    field: Some(name.to_string()),
                },
            };
            (StatusCode::BAD_REQUEST, Json(error))
        })
}
