//! Authorization guard. Every decision is re-derived from stored rows: the tender's
//! current owner, the bid's recorded author, the membership table. Nothing supplied by
//! the caller about ownership is trusted.

use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Entity, ServiceError, ServiceResult};
use crate::membership;
use crate::models::{Bid, Employee};
use crate::schema::{organization_responsible, tenders};
use crate::types::AuthorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    NotAuthorized,
}

impl Authorization {
    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Authorization::Authorized
        } else {
            Authorization::NotAuthorized
        }
    }

    pub fn is_authorized(self) -> bool {
        self == Authorization::Authorized
    }

    pub fn require(self) -> ServiceResult<()> {
        match self {
            Authorization::Authorized => Ok(()),
            Authorization::NotAuthorized => Err(ServiceError::NoRights),
        }
    }
}

/// `NotFound` when no tender has that id; otherwise whether it is owned by `organization_id`.
pub fn organization_owns_tender(
    conn: &mut PgConnection,
    organization_id: Uuid,
    tender_id: Uuid,
) -> ServiceResult<Authorization> {
    let owner: Uuid = tenders::table
        .find(tender_id)
        .select(tenders::organization_id)
        .first(conn)
        .optional()
        .map_err(ServiceError::query("authz.organization_owns_tender"))?
        .ok_or(ServiceError::NotFound(Entity::Tender))?;

    let outcome = Authorization::from_bool(owner == organization_id);
    if !outcome.is_authorized() {
        debug!(%tender_id, %organization_id, "organization does not own tender");
    }
    Ok(outcome)
}

/// Whether the user is a responsible of the organization that currently owns the tender.
pub fn user_may_act_on_tender(
    conn: &mut PgConnection,
    user_id: Uuid,
    tender_id: Uuid,
) -> ServiceResult<Authorization> {
    let allowed: bool = diesel::select(exists(
        organization_responsible::table
            .inner_join(
                tenders::table
                    .on(tenders::organization_id.eq(organization_responsible::organization_id)),
            )
            .filter(organization_responsible::user_id.eq(user_id))
            .filter(tenders::id.eq(tender_id)),
    ))
    .get_result(conn)
    .map_err(ServiceError::query("authz.user_may_act_on_tender"))?;

    if !allowed {
        debug!(%user_id, %tender_id, "user has no rights for tender");
    }
    Ok(Authorization::from_bool(allowed))
}

pub fn user_belongs_to_organization(
    conn: &mut PgConnection,
    username: &str,
    organization_id: Uuid,
) -> ServiceResult<Authorization> {
    let member = membership::is_user_member_of_organization(conn, username, organization_id)?;
    if !member {
        debug!(username, %organization_id, "user is not responsible for organization");
    }
    Ok(Authorization::from_bool(member))
}

/// Author-side rights on a bid: the authoring employee, or a responsible of the
/// authoring organization.
pub fn user_may_act_on_bid(
    conn: &mut PgConnection,
    user: &Employee,
    bid: &Bid,
) -> ServiceResult<Authorization> {
    let outcome = match bid.author_type {
        AuthorType::User => Authorization::from_bool(bid.author_id == user.id),
        AuthorType::Organization => {
            user_belongs_to_organization(conn, &user.username, bid.author_id)?
        }
    };
    if !outcome.is_authorized() {
        debug!(user_id = %user.id, bid_id = %bid.bid_id, "user is not the bid author");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_maps_denial_to_no_rights() {
        assert!(Authorization::Authorized.require().is_ok());
        assert!(matches!(
            Authorization::NotAuthorized.require(),
            Err(ServiceError::NoRights)
        ));
    }
}
