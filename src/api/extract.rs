use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use super::schema::Validate;
use crate::error::ApiError;

/// JSON body extractor that rejects malformed bodies, unknown fields, wrong
/// types and out-of-range values with a 400 before the handler runs.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError::validation_error("Invalid request body", vec![rejection.body_text()])
            })?;

        let errors = value.validate();
        if !errors.is_empty() {
            return Err(ApiError::validation_error("Invalid request body", errors));
        }

        Ok(ValidJson(value))
    }
}
