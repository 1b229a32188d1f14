use diesel::prelude::*;
use diesel::PgConnection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{now, validate_description, validate_name, validate_version, BidPatch, MAX_FEEDBACK_LEN};
use crate::authz::{self, Authorization};
use crate::error::{Entity, ServiceError, ServiceResult};
use crate::history;
use crate::membership;
use crate::models::{Bid, BidFeedback, BidVersion, Employee, NewBidDecision, NewBidFeedback, NewBidRow};
use crate::reader::{self, Page};
use crate::schema::{bid_decisions, bid_feedback, bids};
use crate::types::{AuthorType, BidStatus, Decision, TenderStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBid {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
}

/// Who a bid operation acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// The authoring employee or a responsible of the authoring organization.
    Author,
    /// A responsible of the organization that owns the bid's tender.
    TenderOwner,
}

/// Files a bid on behalf of `username`, who must be the authoring employee or a
/// responsible of the authoring organization.
pub fn create_bid(
    conn: &mut PgConnection,
    username: &str,
    request: NewBid,
) -> ServiceResult<Bid> {
    validate_name(&request.name)?;
    validate_description(&request.description)?;

    conn.transaction(|conn| {
        let user = membership::user_by_username(conn, username)?;
        match request.author_type {
            AuthorType::User => {
                let author = membership::user_by_id(conn, request.author_id)?;
                if author.id != user.id {
                    return Err(ServiceError::NoRights);
                }
            }
            AuthorType::Organization => {
                membership::organization_by_id(conn, request.author_id)?;
                authz::user_belongs_to_organization(conn, &user.username, request.author_id)?
                    .require()?;
            }
        }

        let tender = reader::get_tender_by_id(conn, request.tender_id)?;
        if tender.status != TenderStatus::Published {
            return Err(ServiceError::validation("tender is not accepting bids"));
        }

        let row = NewBidRow {
            bid_id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: request.description,
            status: BidStatus::Created,
            tender_id: tender.id,
            author_type: request.author_type,
            author_id: request.author_id,
            version: 1,
        };

        let bid = diesel::insert_into(bids::table)
            .values(&row)
            .returning(Bid::as_returning())
            .get_result(conn)
            .map_err(ServiceError::query("lifecycle.create_bid"))?;
        history::record_bid_version(conn, &bid, bid.created_at)?;

        info!(
            bid_id = %bid.bid_id,
            tender_id = %bid.tender_id,
            author_type = %bid.author_type,
            author_id = %bid.author_id,
            username = %user.username,
            "bid created"
        );
        Ok(bid)
    })
}

/// Readable by the author side and by responsibles of the tender's organization.
pub fn get_bid(conn: &mut PgConnection, bid_id: Uuid, username: &str) -> ServiceResult<Bid> {
    let user = membership::user_by_username(conn, username)?;
    let bid = reader::get_bid_by_id(conn, bid_id)?;
    if !authz::user_may_act_on_bid(conn, &user, &bid)?.is_authorized() {
        authz::user_may_act_on_tender(conn, user.id, bid.tender_id)?.require()?;
    }
    Ok(bid)
}

pub fn get_bid_status(
    conn: &mut PgConnection,
    bid_id: Uuid,
    username: &str,
) -> ServiceResult<BidStatus> {
    get_bid(conn, bid_id, username).map(|bid| bid.status)
}

pub fn list_tender_bids(
    conn: &mut PgConnection,
    tender_id: Uuid,
    username: &str,
    page: Page,
) -> ServiceResult<Vec<Bid>> {
    let user = membership::user_by_username(conn, username)?;
    let access = authz::user_may_act_on_tender(conn, user.id, tender_id)?;
    reader::get_tender_by_id(conn, tender_id)?;
    access.require()?;
    reader::list_bids_for_tender(conn, tender_id, page)
}

pub fn list_user_bids(
    conn: &mut PgConnection,
    username: &str,
    page: Page,
) -> ServiceResult<Vec<Bid>> {
    let user = membership::user_by_username(conn, username)?;
    let organizations = membership::organizations_of_user(conn, user.id)?;
    reader::list_bids_by_author(conn, user.id, &organizations, page)
}

pub fn update_bid(
    conn: &mut PgConnection,
    bid_id: Uuid,
    username: &str,
    patch: BidPatch,
) -> ServiceResult<Bid> {
    patch.validate()?;

    mutate_bid(
        conn,
        "lifecycle.update_bid",
        bid_id,
        username,
        Side::Author,
        |_, _, current| {
            if !patch.changes(current) {
                return Err(ServiceError::validation("no changes provided"));
            }
            Ok(patch.merge_onto(current))
        },
    )
}

/// Bid statuses are caller driven: any member of the enumeration may be requested.
pub fn set_bid_status(
    conn: &mut PgConnection,
    bid_id: Uuid,
    username: &str,
    status: BidStatus,
) -> ServiceResult<Bid> {
    mutate_bid(
        conn,
        "lifecycle.set_bid_status",
        bid_id,
        username,
        Side::Author,
        |_, _, current| {
            Ok(Bid {
                status,
                version: current.version + 1,
                ..current.clone()
            })
        },
    )
}

/// Records the tender owner's verdict and moves a published bid to the matching status.
pub fn submit_decision(
    conn: &mut PgConnection,
    bid_id: Uuid,
    username: &str,
    decision: Decision,
) -> ServiceResult<Bid> {
    mutate_bid(
        conn,
        "lifecycle.submit_decision",
        bid_id,
        username,
        Side::TenderOwner,
        |conn, user, current| {
            let status = BidStatus::from(decision);
            if current.status != BidStatus::Published {
                return Err(ServiceError::invalid_transition(current.status, status));
            }

            diesel::insert_into(bid_decisions::table)
                .values(&NewBidDecision {
                    id: Uuid::new_v4(),
                    bid_id: current.bid_id,
                    decision,
                    decided_by: Some(user.id),
                })
                .execute(conn)
                .map_err(ServiceError::query("lifecycle.submit_decision"))?;

            Ok(Bid {
                status,
                version: current.version + 1,
                ..current.clone()
            })
        },
    )
}

/// Restores name and description from `version` as a new version.
pub fn rollback_bid(
    conn: &mut PgConnection,
    bid_id: Uuid,
    version: i32,
    username: &str,
) -> ServiceResult<Bid> {
    validate_version(version)?;

    mutate_bid(
        conn,
        "lifecycle.rollback_bid",
        bid_id,
        username,
        Side::Author,
        |conn, _, current| {
            let snapshot = history::bid_version_at(conn, current.bid_id, version)?;
            let patch = BidPatch {
                name: Some(snapshot.name),
                description: Some(snapshot.description),
            };
            Ok(patch.merge_onto(current))
        },
    )
}

pub fn bid_versions(
    conn: &mut PgConnection,
    bid_id: Uuid,
    username: &str,
) -> ServiceResult<Vec<BidVersion>> {
    let bid = get_bid(conn, bid_id, username)?;
    history::bid_history(conn, bid.bid_id)
}

/// Feedback does not change the bid, so it creates no new version.
pub fn submit_feedback(
    conn: &mut PgConnection,
    bid_id: Uuid,
    username: &str,
    feedback: &str,
) -> ServiceResult<BidFeedback> {
    let feedback = feedback.trim();
    if feedback.is_empty() {
        return Err(ServiceError::validation("feedback must not be empty"));
    }
    if feedback.chars().count() > MAX_FEEDBACK_LEN {
        return Err(ServiceError::validation(format!(
            "feedback must be at most {MAX_FEEDBACK_LEN} characters"
        )));
    }

    conn.transaction(|conn| {
        let user = membership::user_by_username(conn, username)?;
        let bid = reader::get_bid_by_id(conn, bid_id)?;
        authorize(conn, &user, &bid, Side::TenderOwner)?.require()?;

        let stored = diesel::insert_into(bid_feedback::table)
            .values(&NewBidFeedback {
                feedback_id: Uuid::new_v4(),
                bid_id: bid.bid_id,
                feedback: feedback.to_string(),
                username: user.username.clone(),
            })
            .returning(BidFeedback::as_returning())
            .get_result(conn)
            .map_err(ServiceError::query("lifecycle.submit_feedback"))?;

        info!(bid_id = %bid.bid_id, username = %user.username, "bid feedback submitted");
        Ok(stored)
    })
}

pub fn list_feedback(
    conn: &mut PgConnection,
    bid_id: Uuid,
    username: &str,
) -> ServiceResult<Vec<BidFeedback>> {
    let bid = get_bid(conn, bid_id, username)?;
    reader::feedback_for_bid(conn, bid.bid_id)
}

fn authorize(
    conn: &mut PgConnection,
    user: &Employee,
    bid: &Bid,
    side: Side,
) -> ServiceResult<Authorization> {
    match side {
        Side::Author => authz::user_may_act_on_bid(conn, user, bid),
        Side::TenderOwner => authz::user_may_act_on_tender(conn, user.id, bid.tender_id),
    }
}

/// Bid counterpart of the tender mutation skeleton. The full merged row is written to
/// history.
fn mutate_bid<F>(
    conn: &mut PgConnection,
    op: &'static str,
    bid_id: Uuid,
    username: &str,
    side: Side,
    change: F,
) -> ServiceResult<Bid>
where
    F: FnOnce(&mut PgConnection, &Employee, &Bid) -> ServiceResult<Bid>,
{
    conn.transaction(|conn| {
        let user = membership::user_by_username(conn, username)?;
        let current = reader::get_bid_by_id(conn, bid_id)?;
        authorize(conn, &user, &current, side)?.require()?;

        let next = change(conn, &user, &current)?;
        let stored = store_bid(conn, current.version, &next)?;
        history::record_bid_version(conn, &stored, now())?;

        info!(
            op,
            bid_id = %stored.bid_id,
            version = stored.version,
            status = %stored.status,
            username = %user.username,
            "bid updated"
        );
        Ok(stored)
    })
}

fn store_bid(conn: &mut PgConnection, read_version: i32, next: &Bid) -> ServiceResult<Bid> {
    diesel::update(
        bids::table
            .find(next.bid_id)
            .filter(bids::version.eq(read_version)),
    )
    .set(next)
    .returning(Bid::as_returning())
    .get_result(conn)
    .optional()
    .map_err(ServiceError::query("lifecycle.store_bid"))?
    .ok_or(ServiceError::Conflict {
        entity: Entity::Bid,
        version: read_version,
    })
}
