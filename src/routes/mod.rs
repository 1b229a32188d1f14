use axum::http::HeaderValue;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::reader::Page;
use crate::state::AppState;

pub mod bids;
pub mod health;
pub mod tenders;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .filter_map(|value| match value.parse::<HeaderValue>() {
                Ok(header) => Some(header),
                Err(err) => {
                    tracing::warn!(origin = value, error = %err, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
    };

    let tenders_routes = Router::new()
        .route("/", get(tenders::list_tenders))
        .route("/new", post(tenders::create_tender))
        .route("/my", get(tenders::my_tenders))
        .route("/:id", get(tenders::get_tender))
        .route(
            "/:id/status",
            get(tenders::get_tender_status).put(tenders::set_tender_status),
        )
        .route("/:id/edit", patch(tenders::edit_tender))
        .route("/:id/rollback/:version", put(tenders::rollback_tender))
        .route("/:id/versions", get(tenders::tender_versions));

    let bids_routes = Router::new()
        .route("/new", post(bids::create_bid))
        .route("/my", get(bids::my_bids))
        .route("/:id", get(bids::get_bid))
        .route("/:id/list", get(bids::list_tender_bids))
        .route(
            "/:id/status",
            get(bids::get_bid_status).put(bids::set_bid_status),
        )
        .route("/:id/edit", patch(bids::edit_bid))
        .route("/:id/submit_decision", put(bids::submit_decision))
        .route(
            "/:id/feedback",
            get(bids::list_feedback).put(bids::submit_feedback),
        )
        .route("/:id/rollback/:version", put(bids::rollback_bid))
        .route("/:id/versions", get(bids::bid_versions));

    Router::new()
        .nest("/api/tenders", tenders_routes)
        .nest("/api/bids", bids_routes)
        .route("/api/ping", get(health::ping))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// `?username=` carried by every request that acts on behalf of an employee.
#[derive(Deserialize)]
pub struct ActingUser {
    pub username: String,
}

#[derive(Deserialize)]
pub struct OptionalActingUser {
    pub username: Option<String>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub username: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Result<Page, AppError> {
        Ok(Page::new(self.limit, self.offset)?)
    }

    pub fn username(&self) -> Result<&str, AppError> {
        self.username
            .as_deref()
            .ok_or_else(|| AppError::bad_request("username is required"))
    }
}

pub(crate) fn to_iso(dt: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::to_iso;
    use chrono::NaiveDate;

    #[test]
    fn renders_rfc3339_with_offset() {
        let dt = NaiveDate::from_ymd_opt(2024, 9, 1)
            .and_then(|date| date.and_hms_opt(12, 30, 5))
            .unwrap();
        assert_eq!(to_iso(dt), "2024-09-01T12:30:05+00:00");
    }
}
