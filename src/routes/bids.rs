use axum::extract::{Json, Path, Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{to_iso, ActingUser, PageQuery};
use crate::error::AppResult;
use crate::lifecycle::bids::{self as lifecycle, NewBid};
use crate::lifecycle::BidPatch;
use crate::models::{Bid, BidFeedback, BidVersion};
use crate::state::AppState;
use crate::types::{AuthorType, BidStatus, Decision};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: String,
}

impl From<Bid> for BidResponse {
    fn from(bid: Bid) -> Self {
        Self {
            id: bid.bid_id,
            name: bid.name,
            description: bid.description,
            status: bid.status,
            tender_id: bid.tender_id,
            author_type: bid.author_type,
            author_id: bid.author_id,
            version: bid.version,
            created_at: to_iso(bid.created_at),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidVersionResponse {
    pub version: i32,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub created_at: String,
}

impl From<BidVersion> for BidVersionResponse {
    fn from(row: BidVersion) -> Self {
        Self {
            version: row.version,
            name: row.name,
            description: row.description,
            status: row.status,
            created_at: to_iso(row.created_at),
        }
    }
}

/// Feedback as shown to readers of a bid.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidReviewResponse {
    pub id: Uuid,
    pub description: String,
    pub created_at: String,
}

impl From<BidFeedback> for BidReviewResponse {
    fn from(row: BidFeedback) -> Self {
        Self {
            id: row.feedback_id,
            description: row.feedback,
            created_at: to_iso(row.created_at),
        }
    }
}

#[derive(Deserialize)]
pub struct SetStatusQuery {
    pub status: BidStatus,
    pub username: String,
}

#[derive(Deserialize)]
pub struct DecisionQuery {
    pub decision: Decision,
    pub username: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub bid_feedback: String,
    pub username: String,
}

pub async fn create_bid(
    State(state): State<AppState>,
    Query(query): Query<ActingUser>,
    Json(payload): Json<NewBid>,
) -> AppResult<Json<BidResponse>> {
    let mut conn = state.db()?;
    let bid = lifecycle::create_bid(&mut conn, &query.username, payload)?;
    Ok(Json(bid.into()))
}

pub async fn my_bids(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Vec<BidResponse>>> {
    let page = query.page()?;
    let mut conn = state.db()?;
    let bids = lifecycle::list_user_bids(&mut conn, query.username()?, page)?;
    Ok(Json(bids.into_iter().map(BidResponse::from).collect()))
}

pub async fn list_tender_bids(
    State(state): State<AppState>,
    Path(tender_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Vec<BidResponse>>> {
    let page = query.page()?;
    let mut conn = state.db()?;
    let bids = lifecycle::list_tender_bids(&mut conn, tender_id, query.username()?, page)?;
    Ok(Json(bids.into_iter().map(BidResponse::from).collect()))
}

pub async fn get_bid(
    State(state): State<AppState>,
    Path(bid_id): Path<Uuid>,
    Query(query): Query<ActingUser>,
) -> AppResult<Json<BidResponse>> {
    let mut conn = state.db()?;
    let bid = lifecycle::get_bid(&mut conn, bid_id, &query.username)?;
    Ok(Json(bid.into()))
}

pub async fn get_bid_status(
    State(state): State<AppState>,
    Path(bid_id): Path<Uuid>,
    Query(query): Query<ActingUser>,
) -> AppResult<Json<BidStatus>> {
    let mut conn = state.db()?;
    let status = lifecycle::get_bid_status(&mut conn, bid_id, &query.username)?;
    Ok(Json(status))
}

pub async fn set_bid_status(
    State(state): State<AppState>,
    Path(bid_id): Path<Uuid>,
    Query(query): Query<SetStatusQuery>,
) -> AppResult<Json<BidResponse>> {
    let mut conn = state.db()?;
    let bid = lifecycle::set_bid_status(&mut conn, bid_id, &query.username, query.status)?;
    Ok(Json(bid.into()))
}

pub async fn edit_bid(
    State(state): State<AppState>,
    Path(bid_id): Path<Uuid>,
    Query(query): Query<ActingUser>,
    Json(patch): Json<BidPatch>,
) -> AppResult<Json<BidResponse>> {
    let mut conn = state.db()?;
    let bid = lifecycle::update_bid(&mut conn, bid_id, &query.username, patch)?;
    Ok(Json(bid.into()))
}

pub async fn submit_decision(
    State(state): State<AppState>,
    Path(bid_id): Path<Uuid>,
    Query(query): Query<DecisionQuery>,
) -> AppResult<Json<BidResponse>> {
    let mut conn = state.db()?;
    let bid = lifecycle::submit_decision(&mut conn, bid_id, &query.username, query.decision)?;
    Ok(Json(bid.into()))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(bid_id): Path<Uuid>,
    Query(query): Query<FeedbackQuery>,
) -> AppResult<Json<BidReviewResponse>> {
    let mut conn = state.db()?;
    let feedback =
        lifecycle::submit_feedback(&mut conn, bid_id, &query.username, &query.bid_feedback)?;
    Ok(Json(feedback.into()))
}

pub async fn list_feedback(
    State(state): State<AppState>,
    Path(bid_id): Path<Uuid>,
    Query(query): Query<ActingUser>,
) -> AppResult<Json<Vec<BidReviewResponse>>> {
    let mut conn = state.db()?;
    let feedback = lifecycle::list_feedback(&mut conn, bid_id, &query.username)?;
    Ok(Json(feedback.into_iter().map(BidReviewResponse::from).collect()))
}

pub async fn rollback_bid(
    State(state): State<AppState>,
    Path((bid_id, version)): Path<(Uuid, i32)>,
    Query(query): Query<ActingUser>,
) -> AppResult<Json<BidResponse>> {
    let mut conn = state.db()?;
    let bid = lifecycle::rollback_bid(&mut conn, bid_id, version, &query.username)?;
    Ok(Json(bid.into()))
}

pub async fn bid_versions(
    State(state): State<AppState>,
    Path(bid_id): Path<Uuid>,
    Query(query): Query<ActingUser>,
) -> AppResult<Json<Vec<BidVersionResponse>>> {
    let mut conn = state.db()?;
    let versions = lifecycle::bid_versions(&mut conn, bid_id, &query.username)?;
    Ok(Json(versions.into_iter().map(BidVersionResponse::from).collect()))
}
