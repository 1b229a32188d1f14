use axum::extract::{Json, Path, Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{to_iso, ActingUser, OptionalActingUser, PageQuery};
use crate::error::{AppError, AppResult};
use crate::lifecycle::tenders::{self as lifecycle, NewTender};
use crate::lifecycle::TenderPatch;
use crate::models::{Tender, TenderVersion};
use crate::reader::Page;
use crate::state::AppState;
use crate::types::{ServiceType, TenderStatus};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub version: i32,
    pub created_at: String,
}

impl From<Tender> for TenderResponse {
    fn from(tender: Tender) -> Self {
        Self {
            id: tender.id,
            name: tender.name,
            description: tender.description,
            service_type: tender.service_type,
            status: tender.status,
            organization_id: tender.organization_id,
            version: tender.version,
            created_at: to_iso(tender.created_at),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderVersionResponse {
    pub version: i32,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub username: String,
    pub updated_at: String,
}

impl From<TenderVersion> for TenderVersionResponse {
    fn from(row: TenderVersion) -> Self {
        Self {
            version: row.version,
            name: row.name,
            description: row.description,
            service_type: row.service_type,
            status: row.status,
            organization_id: row.organization_id,
            username: row.creator_username,
            updated_at: to_iso(row.updated_at),
        }
    }
}

#[derive(Deserialize)]
pub struct TenderListQuery {
    /// Comma separated service types.
    pub service_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct SetStatusQuery {
    pub status: TenderStatus,
    pub username: String,
}

pub async fn list_tenders(
    State(state): State<AppState>,
    Query(query): Query<TenderListQuery>,
) -> AppResult<Json<Vec<TenderResponse>>> {
    let service_types = parse_service_types(query.service_type.as_deref())?;
    let page = Page::new(query.limit, query.offset)?;

    let mut conn = state.db()?;
    let tenders = lifecycle::list_tenders(&mut conn, &service_types, page)?;
    Ok(Json(tenders.into_iter().map(TenderResponse::from).collect()))
}

pub async fn create_tender(
    State(state): State<AppState>,
    Json(payload): Json<NewTender>,
) -> AppResult<Json<TenderResponse>> {
    let mut conn = state.db()?;
    let tender = lifecycle::create_tender(&mut conn, payload)?;
    Ok(Json(tender.into()))
}

pub async fn my_tenders(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Vec<TenderResponse>>> {
    let page = query.page()?;
    let mut conn = state.db()?;
    let tenders = lifecycle::list_user_tenders(&mut conn, query.username()?, page)?;
    Ok(Json(tenders.into_iter().map(TenderResponse::from).collect()))
}

pub async fn get_tender(
    State(state): State<AppState>,
    Path(tender_id): Path<Uuid>,
    Query(query): Query<OptionalActingUser>,
) -> AppResult<Json<TenderResponse>> {
    let mut conn = state.db()?;
    let tender = lifecycle::get_tender(&mut conn, tender_id, query.username.as_deref())?;
    Ok(Json(tender.into()))
}

pub async fn get_tender_status(
    State(state): State<AppState>,
    Path(tender_id): Path<Uuid>,
    Query(query): Query<OptionalActingUser>,
) -> AppResult<Json<TenderStatus>> {
    let mut conn = state.db()?;
    let status = lifecycle::get_tender_status(&mut conn, tender_id, query.username.as_deref())?;
    Ok(Json(status))
}

pub async fn set_tender_status(
    State(state): State<AppState>,
    Path(tender_id): Path<Uuid>,
    Query(query): Query<SetStatusQuery>,
) -> AppResult<Json<TenderResponse>> {
    let mut conn = state.db()?;
    let tender = lifecycle::set_tender_status(&mut conn, tender_id, &query.username, query.status)?;
    Ok(Json(tender.into()))
}

pub async fn edit_tender(
    State(state): State<AppState>,
    Path(tender_id): Path<Uuid>,
    Query(query): Query<ActingUser>,
    Json(patch): Json<TenderPatch>,
) -> AppResult<Json<TenderResponse>> {
    let mut conn = state.db()?;
    let tender = lifecycle::update_tender(&mut conn, tender_id, &query.username, patch)?;
    Ok(Json(tender.into()))
}

pub async fn rollback_tender(
    State(state): State<AppState>,
    Path((tender_id, version)): Path<(Uuid, i32)>,
    Query(query): Query<ActingUser>,
) -> AppResult<Json<TenderResponse>> {
    let mut conn = state.db()?;
    let tender = lifecycle::rollback_tender(&mut conn, tender_id, version, &query.username)?;
    Ok(Json(tender.into()))
}

pub async fn tender_versions(
    State(state): State<AppState>,
    Path(tender_id): Path<Uuid>,
    Query(query): Query<ActingUser>,
) -> AppResult<Json<Vec<TenderVersionResponse>>> {
    let mut conn = state.db()?;
    let versions = lifecycle::tender_versions(&mut conn, tender_id, &query.username)?;
    Ok(Json(
        versions.into_iter().map(TenderVersionResponse::from).collect(),
    ))
}

fn parse_service_types(raw: Option<&str>) -> AppResult<Vec<ServiceType>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<ServiceType>()
                .map_err(|err| AppError::bad_request(err.to_string()))
        })
        .collect()
}
