use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::{self, Display};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Tender,
    TenderVersion,
    Bid,
    BidVersion,
    User,
    Organization,
}

impl Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Tender => "tender",
            Entity::TenderVersion => "tender version",
            Entity::Bid => "bid",
            Entity::BidVersion => "bid version",
            Entity::User => "user",
            Entity::Organization => "organization",
        })
    }
}

/// Outcomes of the lifecycle, guard, reader and recorder layers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("not enough rights to perform this action")]
    NoRights,
    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("{0}")]
    Validation(String),
    #[error("{entity} was modified concurrently after version {version} was read")]
    Conflict { entity: Entity, version: i32 },
    #[error("query failed in {op}: {source}")]
    QueryFailure {
        op: &'static str,
        #[source]
        source: diesel::result::Error,
    },
}

impl ServiceError {
    /// Maps a store error raised inside `op`. Every query failure is logged here, once.
    pub fn query(op: &'static str) -> impl FnOnce(diesel::result::Error) -> ServiceError {
        move |source| {
            tracing::error!(op, error = %source, "store query failed");
            ServiceError::QueryFailure { op, source }
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn invalid_transition(from: impl Display, to: impl Display) -> Self {
        ServiceError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// Needed by `Connection::transaction`; covers BEGIN/COMMIT failures.
impl From<diesel::result::Error> for ServiceError {
    fn from(value: diesel::result::Error) -> Self {
        ServiceError::query("transaction")(value)
    }
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unavailable<E: Display>(error: E) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, error.to_string())
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            reason: self.message,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    reason: String,
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        let status = match &value {
            ServiceError::NotFound(Entity::User) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::NoRights => StatusCode::FORBIDDEN,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidTransition { .. } | ServiceError::Conflict { .. } => {
                StatusCode::CONFLICT
            }
            ServiceError::QueryFailure { .. } => {
                return AppError::internal("internal storage error");
            }
        };
        tracing::debug!(status = status.as_u16(), error = %value, "request rejected");
        AppError::new(status, value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_service_errors_to_statuses() {
        let cases = [
            (ServiceError::NotFound(Entity::User), StatusCode::UNAUTHORIZED),
            (ServiceError::NotFound(Entity::Tender), StatusCode::NOT_FOUND),
            (ServiceError::NoRights, StatusCode::FORBIDDEN),
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                ServiceError::invalid_transition("Published", "Created"),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::Conflict {
                    entity: Entity::Bid,
                    version: 3,
                },
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::query("test")(diesel::result::Error::BrokenTransactionManager),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(AppError::from(error).status(), expected);
        }
    }

    #[test]
    fn query_failures_hide_store_details() {
        let error = ServiceError::query("reader.get_tender_by_id")(
            diesel::result::Error::BrokenTransactionManager,
        );
        let app_error = AppError::from(error);
        assert_eq!(app_error.message, "internal storage error");
    }

    #[test]
    fn messages_name_the_entity() {
        assert_eq!(
            ServiceError::NotFound(Entity::TenderVersion).to_string(),
            "tender version not found"
        );
        assert_eq!(
            ServiceError::invalid_transition("Closed", "Published").to_string(),
            "cannot change status from Closed to Published"
        );
    }
}
