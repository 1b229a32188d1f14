//! Version recorder. Each successful mutation appends exactly one row holding the full
//! merged state of the entity at that version, so any single history row is enough to
//! reconstruct the entity as it was; no replay across earlier rows is needed.
//!
//! Version numbers come from the caller and are written as given. The unique
//! `(entity, version)` key rejects a duplicate.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::error::{Entity, ServiceError, ServiceResult};
use crate::models::{Bid, BidVersion, NewBidVersion, NewTenderVersion, Tender, TenderVersion};
use crate::schema::{bids_versions, tender_versions};

pub fn record_tender_version(
    conn: &mut PgConnection,
    acting_username: &str,
    tender: &Tender,
) -> ServiceResult<TenderVersion> {
    let row = NewTenderVersion {
        tender_id: tender.id,
        name: &tender.name,
        description: &tender.description,
        service_type: tender.service_type,
        status: tender.status,
        organization_id: tender.organization_id,
        creator_username: acting_username,
        version: tender.version,
        updated_at: tender.updated_at,
    };

    diesel::insert_into(tender_versions::table)
        .values(&row)
        .returning(TenderVersion::as_returning())
        .get_result(conn)
        .map_err(ServiceError::query("history.record_tender_version"))
}

/// `recorded_at` is the moment of the mutation; bids carry no `updated_at` of their own.
pub fn record_bid_version(
    conn: &mut PgConnection,
    bid: &Bid,
    recorded_at: NaiveDateTime,
) -> ServiceResult<BidVersion> {
    let row = NewBidVersion {
        bid_id: bid.bid_id,
        name: &bid.name,
        description: &bid.description,
        status: bid.status,
        tender_id: bid.tender_id,
        author_type: bid.author_type,
        author_id: bid.author_id,
        version: bid.version,
        created_at: recorded_at,
    };

    diesel::insert_into(bids_versions::table)
        .values(&row)
        .returning(BidVersion::as_returning())
        .get_result(conn)
        .map_err(ServiceError::query("history.record_bid_version"))
}

pub fn tender_history(conn: &mut PgConnection, tender_id: Uuid) -> ServiceResult<Vec<TenderVersion>> {
    tender_versions::table
        .filter(tender_versions::tender_id.eq(tender_id))
        .select(TenderVersion::as_select())
        .order(tender_versions::version.asc())
        .load(conn)
        .map_err(ServiceError::query("history.tender_history"))
}

pub fn tender_version_at(
    conn: &mut PgConnection,
    tender_id: Uuid,
    version: i32,
) -> ServiceResult<TenderVersion> {
    tender_versions::table
        .filter(tender_versions::tender_id.eq(tender_id))
        .filter(tender_versions::version.eq(version))
        .select(TenderVersion::as_select())
        .first(conn)
        .optional()
        .map_err(ServiceError::query("history.tender_version_at"))?
        .ok_or(ServiceError::NotFound(Entity::TenderVersion))
}

pub fn bid_history(conn: &mut PgConnection, bid_id: Uuid) -> ServiceResult<Vec<BidVersion>> {
    bids_versions::table
        .filter(bids_versions::bid_id.eq(bid_id))
        .select(BidVersion::as_select())
        .order(bids_versions::version.asc())
        .load(conn)
        .map_err(ServiceError::query("history.bid_history"))
}

pub fn bid_version_at(
    conn: &mut PgConnection,
    bid_id: Uuid,
    version: i32,
) -> ServiceResult<BidVersion> {
    bids_versions::table
        .filter(bids_versions::bid_id.eq(bid_id))
        .filter(bids_versions::version.eq(version))
        .select(BidVersion::as_select())
        .first(conn)
        .optional()
        .map_err(ServiceError::query("history.bid_version_at"))?
        .ok_or(ServiceError::NotFound(Entity::BidVersion))
}
