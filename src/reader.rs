//! Current-state reads for tenders and bids. Every query projects an explicit column list
//! through `as_select()`.

use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::error::{Entity, ServiceError, ServiceResult};
use crate::models::{Bid, BidDecision, BidFeedback, Tender};
use crate::schema::{bid_decisions, bid_feedback, bids, tenders};
use crate::types::{AuthorType, ServiceType, TenderStatus};

pub use crate::membership::{organization_by_id, user_by_id, user_by_username};

pub const DEFAULT_PAGE_LIMIT: i64 = 5;
pub const MAX_PAGE_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> ServiceResult<Self> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let offset = offset.unwrap_or(0);
        if !(0..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(ServiceError::validation(format!(
                "limit must be between 0 and {MAX_PAGE_LIMIT}"
            )));
        }
        if offset < 0 {
            return Err(ServiceError::validation("offset must not be negative"));
        }
        Ok(Self { limit, offset })
    }
}

pub fn get_tender_by_id(conn: &mut PgConnection, tender_id: Uuid) -> ServiceResult<Tender> {
    tenders::table
        .find(tender_id)
        .select(Tender::as_select())
        .first(conn)
        .optional()
        .map_err(ServiceError::query("reader.get_tender_by_id"))?
        .ok_or(ServiceError::NotFound(Entity::Tender))
}

pub fn get_bid_by_id(conn: &mut PgConnection, bid_id: Uuid) -> ServiceResult<Bid> {
    bids::table
        .find(bid_id)
        .select(Bid::as_select())
        .first(conn)
        .optional()
        .map_err(ServiceError::query("reader.get_bid_by_id"))?
        .ok_or(ServiceError::NotFound(Entity::Bid))
}

/// Published tenders, optionally restricted to some service types, ordered by name.
pub fn list_published_tenders(
    conn: &mut PgConnection,
    service_types: &[ServiceType],
    page: Page,
) -> ServiceResult<Vec<Tender>> {
    let mut query = tenders::table
        .filter(tenders::status.eq(TenderStatus::Published))
        .select(Tender::as_select())
        .order((tenders::name.asc(), tenders::id.asc()))
        .limit(page.limit)
        .offset(page.offset)
        .into_boxed();

    if !service_types.is_empty() {
        query = query.filter(tenders::service_type.eq_any(service_types.to_vec()));
    }

    query
        .load(conn)
        .map_err(ServiceError::query("reader.list_published_tenders"))
}

pub fn list_tenders_by_creator(
    conn: &mut PgConnection,
    username: &str,
    page: Page,
) -> ServiceResult<Vec<Tender>> {
    tenders::table
        .filter(tenders::creator_username.eq(username))
        .select(Tender::as_select())
        .order((tenders::name.asc(), tenders::id.asc()))
        .limit(page.limit)
        .offset(page.offset)
        .load(conn)
        .map_err(ServiceError::query("reader.list_tenders_by_creator"))
}

pub fn list_bids_for_tender(
    conn: &mut PgConnection,
    tender_id: Uuid,
    page: Page,
) -> ServiceResult<Vec<Bid>> {
    bids::table
        .filter(bids::tender_id.eq(tender_id))
        .select(Bid::as_select())
        .order((bids::name.asc(), bids::bid_id.asc()))
        .limit(page.limit)
        .offset(page.offset)
        .load(conn)
        .map_err(ServiceError::query("reader.list_bids_for_tender"))
}

/// Bids authored by the user directly or by any organization the user is responsible of.
pub fn list_bids_by_author(
    conn: &mut PgConnection,
    user_id: Uuid,
    organization_ids: &[Uuid],
    page: Page,
) -> ServiceResult<Vec<Bid>> {
    bids::table
        .filter(
            bids::author_type
                .eq(AuthorType::User)
                .and(bids::author_id.eq(user_id))
                .or(bids::author_type
                    .eq(AuthorType::Organization)
                    .and(bids::author_id.eq_any(organization_ids.to_vec()))),
        )
        .select(Bid::as_select())
        .order((bids::name.asc(), bids::bid_id.asc()))
        .limit(page.limit)
        .offset(page.offset)
        .load(conn)
        .map_err(ServiceError::query("reader.list_bids_by_author"))
}

pub fn feedback_for_bid(conn: &mut PgConnection, bid_id: Uuid) -> ServiceResult<Vec<BidFeedback>> {
    bid_feedback::table
        .filter(bid_feedback::bid_id.eq(bid_id))
        .select(BidFeedback::as_select())
        .order(bid_feedback::created_at.asc())
        .load(conn)
        .map_err(ServiceError::query("reader.feedback_for_bid"))
}

pub fn decisions_for_bid(conn: &mut PgConnection, bid_id: Uuid) -> ServiceResult<Vec<BidDecision>> {
    bid_decisions::table
        .filter(bid_decisions::bid_id.eq(bid_id))
        .select(BidDecision::as_select())
        .order(bid_decisions::created_at.asc())
        .load(conn)
        .map_err(ServiceError::query("reader.decisions_for_bid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults() {
        assert_eq!(Page::new(None, None).unwrap(), Page::default());
        assert_eq!(Page::default().limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn page_rejects_out_of_range_values() {
        assert!(Page::new(Some(MAX_PAGE_LIMIT + 1), None).is_err());
        assert!(Page::new(Some(-1), None).is_err());
        assert!(Page::new(Some(10), Some(-3)).is_err());
        assert_eq!(
            Page::new(Some(0), Some(7)).unwrap(),
            Page {
                limit: 0,
                offset: 7
            }
        );
    }
}
