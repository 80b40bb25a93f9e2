use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ApiError;

/// Raw JSON object body, before validation. A blank body reads as `{}`.
pub struct JsonObject(pub Map<String, Value>);

fn invalid_body() -> ApiError {
    ApiError::Validation("Invalid request body".into())
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
}

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(req.headers());
        let body = Bytes::from_request(req, state).await.map_err(|rejection| {
            warn!(error = %rejection.body_text(), "unreadable request body");
            invalid_body()
        })?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonObject(Map::new()));
        }
        if !json {
            warn!("request body without a JSON content type");
            return Err(invalid_body());
        }

        let Json(value) = Json::<Value>::from_bytes(&body).map_err(|rejection| {
            warn!(error = %rejection.body_text(), "unreadable request body");
            invalid_body()
        })?;

        match value {
            Value::Object(map) => Ok(JsonObject(map)),
            _ => Err(invalid_body()),
        }
    }
}
