//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for JSON request DTOs, helpers to extract
//! and validate JSON bodies, and [`extract_form`] for urlencoded form posts.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::{Form, Json};

use crate::error::AppError;
use crate::forms::FormData;

/// Trait for request types that can validate their business rules
/// beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// Handlers should use:
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
///     // use req...
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract an urlencoded form body as ordered key/value pairs.
///
/// Repeated keys are kept. A body that cannot be decoded, or one sent with
/// the wrong content type, is a [`AppError::BadRequest`].
pub fn extract_form(
    result: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<FormData, AppError> {
    result
        .map(|Form(pairs)| FormData::from_pairs(pairs))
        .map_err(|err| AppError::BadRequest(err.body_text()))
}
