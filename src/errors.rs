use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Why a request field was rejected by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// Field absent or blank.
    MissingRequiredField,
    /// Identifier or amount did not coerce to an integer greater than zero.
    NotPositiveInteger,
    /// Both `dailyBudget` and `lifetimeBudget` were supplied.
    MutuallyExclusiveBudgets,
    /// Enumerated field carried a value outside its closed set.
    NotInAllowedSet {
        value: String,
        allowed: &'static [&'static str],
    },
    /// Numeric field outside its accepted bounds.
    OutOfRange(String),
    /// Field present but structurally wrong.
    Malformed(String),
    /// Ad creative reference is not a positive integer.
    InvalidCreativeId,
    /// Resolved ad set has no usable Facebook identifier.
    InvalidFacebookAdSetId,
    /// Parent record exists but was never created on Facebook.
    UnsyncedParent,
    /// Partial update carried no fields.
    EmptyUpdate,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::MissingRequiredField => write!(f, "missing required field"),
            ValidationReason::NotPositiveInteger => write!(f, "not a positive integer"),
            ValidationReason::MutuallyExclusiveBudgets => {
                write!(f, "mutually exclusive budget fields both set")
            }
            ValidationReason::NotInAllowedSet { value, allowed } => write!(
                f,
                "value '{}' not in allowed set [{}]",
                value,
                allowed.join(", ")
            ),
            ValidationReason::OutOfRange(detail) => write!(f, "out of range: {}", detail),
            ValidationReason::Malformed(detail) => write!(f, "malformed value: {}", detail),
            ValidationReason::InvalidCreativeId => write!(f, "invalid creative ID"),
            ValidationReason::InvalidFacebookAdSetId => write!(f, "invalid Facebook adset ID"),
            ValidationReason::UnsyncedParent => {
                write!(f, "referenced record has not been created on Facebook yet")
            }
            ValidationReason::EmptyUpdate => write!(f, "no updatable fields provided"),
        }
    }
}

/// Whether the caller can fix a rejection by changing the request, or has to wait
/// for a referenced record to be synced to Facebook first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Request,
    Integrity,
}

/// Rejection produced by the normalizer, naming the first offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, ValidationReason::MissingRequiredField)
    }

    pub fn category(&self) -> ErrorCategory {
        match self.reason {
            ValidationReason::InvalidFacebookAdSetId | ValidationReason::UnsyncedParent => {
                ErrorCategory::Integrity
            }
            _ => ErrorCategory::Request,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Resource not found error.
    NotFound(String),
    /// Bad request error (invalid input outside the normalizer).
    BadRequest(String),
    /// Request rejected by the normalizer.
    Validation(ValidationError),
    /// Error interacting with the Graph API.
    ExternalApiError(String),
    /// Internal server error.
    InternalError(String),
    /// Missing or unknown owning account.
    Unauthorized(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and JSON body.
    ///
    /// Validation errors keep the offending field in the body so clients can
    /// highlight it; integrity rejections answer 409 instead of 400.
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error" }),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Validation(e) => {
                let status = match e.category() {
                    ErrorCategory::Request => StatusCode::BAD_REQUEST,
                    ErrorCategory::Integrity => StatusCode::CONFLICT,
                };
                tracing::debug!("Rejected request: {}", e);
                (
                    status,
                    json!({ "error": e.reason.to_string(), "field": e.field }),
                )
            }
            AppError::ExternalApiError(msg) => {
                tracing::error!("Graph API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Facebook API error", "detail": msg }),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" }))
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return source.clone().into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

impl Clone for AppError {
    /// `sqlx::Error` is not cloneable, so `DatabaseError` degrades to `RowNotFound`.
    fn clone(&self) -> Self {
        match self {
            AppError::DatabaseError(_e) => AppError::DatabaseError(sqlx::Error::RowNotFound),
            AppError::NotFound(msg) => AppError::NotFound(msg.clone()),
            AppError::BadRequest(msg) => AppError::BadRequest(msg.clone()),
            AppError::Validation(e) => AppError::Validation(e.clone()),
            AppError::ExternalApiError(msg) => AppError::ExternalApiError(msg.clone()),
            AppError::InternalError(msg) => AppError::InternalError(msg.clone()),
            AppError::Unauthorized(msg) => AppError::Unauthorized(msg.clone()),
            AppError::WithContext { source, context } => AppError::WithContext {
                source: source.clone(),
                context: context.clone(),
            },
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApiError(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}
