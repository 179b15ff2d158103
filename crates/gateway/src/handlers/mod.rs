//! API handlers module

pub mod connections;
pub mod health;
pub mod recommendations;

use alumnet_common::errors::AppError;
use validator::ValidationErrors;

/// Turn query validation failures into a 400 naming the first bad field
pub(crate) fn validation_error(errors: ValidationErrors) -> AppError {
    let field = errors
        .field_errors()
        .keys()
        .next()
        .map(|field| field.to_string());

    AppError::Validation {
        message: errors.to_string(),
        field,
    }
}
