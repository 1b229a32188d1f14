use diesel::prelude::*;
use diesel::PgConnection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{now, validate_description, validate_name, validate_version, TenderPatch};
use crate::authz;
use crate::error::{Entity, ServiceError, ServiceResult};
use crate::history;
use crate::membership;
use crate::models::{Employee, NewTenderRow, Tender, TenderVersion};
use crate::reader::{self, Page};
use crate::schema::tenders;
use crate::types::{ServiceType, TenderStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTender {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub service_type: ServiceType,
    pub organization_id: Uuid,
    pub creator_username: String,
}

pub fn create_tender(conn: &mut PgConnection, request: NewTender) -> ServiceResult<Tender> {
    validate_name(&request.name)?;
    validate_description(&request.description)?;

    conn.transaction(|conn| {
        let creator = membership::user_by_username(conn, &request.creator_username)?;
        membership::organization_by_id(conn, request.organization_id)?;
        authz::user_belongs_to_organization(conn, &creator.username, request.organization_id)?
            .require()?;

        let row = NewTenderRow {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: request.description,
            service_type: request.service_type,
            status: TenderStatus::Created,
            organization_id: request.organization_id,
            creator_username: creator.username.clone(),
            version: 1,
        };

        let tender = diesel::insert_into(tenders::table)
            .values(&row)
            .returning(Tender::as_returning())
            .get_result(conn)
            .map_err(ServiceError::query("lifecycle.create_tender"))?;
        history::record_tender_version(conn, &creator.username, &tender)?;

        info!(
            tender_id = %tender.id,
            organization_id = %tender.organization_id,
            username = %creator.username,
            "tender created"
        );
        Ok(tender)
    })
}

/// Published tenders are public. Any other status is visible only to responsibles of
/// the owning organization.
pub fn get_tender(
    conn: &mut PgConnection,
    tender_id: Uuid,
    username: Option<&str>,
) -> ServiceResult<Tender> {
    let tender = reader::get_tender_by_id(conn, tender_id)?;
    if tender.status == TenderStatus::Published {
        return Ok(tender);
    }

    let username = username.ok_or(ServiceError::NoRights)?;
    let user = membership::user_by_username(conn, username)?;
    authz::user_may_act_on_tender(conn, user.id, tender.id)?.require()?;
    Ok(tender)
}

pub fn get_tender_status(
    conn: &mut PgConnection,
    tender_id: Uuid,
    username: Option<&str>,
) -> ServiceResult<TenderStatus> {
    get_tender(conn, tender_id, username).map(|tender| tender.status)
}

pub fn list_tenders(
    conn: &mut PgConnection,
    service_types: &[ServiceType],
    page: Page,
) -> ServiceResult<Vec<Tender>> {
    reader::list_published_tenders(conn, service_types, page)
}

pub fn list_user_tenders(
    conn: &mut PgConnection,
    username: &str,
    page: Page,
) -> ServiceResult<Vec<Tender>> {
    let user = membership::user_by_username(conn, username)?;
    reader::list_tenders_by_creator(conn, &user.username, page)
}

pub fn update_tender(
    conn: &mut PgConnection,
    tender_id: Uuid,
    username: &str,
    patch: TenderPatch,
) -> ServiceResult<Tender> {
    patch.validate()?;

    mutate_tender(
        conn,
        "lifecycle.update_tender",
        tender_id,
        username,
        |conn, user, current| {
            if !patch.changes(current) {
                return Err(ServiceError::validation("no changes provided"));
            }
            if let Some(organization_id) = patch.organization_id {
                if organization_id != current.organization_id {
                    membership::organization_by_id(conn, organization_id)?;
                    authz::user_belongs_to_organization(conn, &user.username, organization_id)?
                        .require()?;
                }
            }
            Ok(patch.merge_onto(current, now()))
        },
    )
}

pub fn set_tender_status(
    conn: &mut PgConnection,
    tender_id: Uuid,
    username: &str,
    status: TenderStatus,
) -> ServiceResult<Tender> {
    mutate_tender(
        conn,
        "lifecycle.set_tender_status",
        tender_id,
        username,
        |_, _, current| {
            if !current.status.can_transition_to(status) {
                return Err(ServiceError::invalid_transition(current.status, status));
            }
            Ok(Tender {
                status,
                version: current.version + 1,
                updated_at: now(),
                ..current.clone()
            })
        },
    )
}

pub fn publish_tender(
    conn: &mut PgConnection,
    tender_id: Uuid,
    username: &str,
) -> ServiceResult<Tender> {
    set_tender_status(conn, tender_id, username, TenderStatus::Published)
}

pub fn close_tender(
    conn: &mut PgConnection,
    tender_id: Uuid,
    username: &str,
) -> ServiceResult<Tender> {
    set_tender_status(conn, tender_id, username, TenderStatus::Closed)
}

/// Restores name, description and service type from `version` as a new version.
/// Status and owning organization stay as they are now.
pub fn rollback_tender(
    conn: &mut PgConnection,
    tender_id: Uuid,
    version: i32,
    username: &str,
) -> ServiceResult<Tender> {
    validate_version(version)?;

    mutate_tender(
        conn,
        "lifecycle.rollback_tender",
        tender_id,
        username,
        |conn, _, current| {
            let snapshot = history::tender_version_at(conn, current.id, version)?;
            let patch = TenderPatch {
                name: Some(snapshot.name),
                description: Some(snapshot.description),
                service_type: Some(snapshot.service_type),
                organization_id: None,
            };
            Ok(patch.merge_onto(current, now()))
        },
    )
}

pub fn tender_versions(
    conn: &mut PgConnection,
    tender_id: Uuid,
    username: &str,
) -> ServiceResult<Vec<TenderVersion>> {
    let user = membership::user_by_username(conn, username)?;
    let access = authz::user_may_act_on_tender(conn, user.id, tender_id)?;
    reader::get_tender_by_id(conn, tender_id)?;
    access.require()?;
    history::tender_history(conn, tender_id)
}

/// Shared skeleton of every tender mutation. `change` receives the row as read and
/// returns the next row; it must bump the version by one.
fn mutate_tender<F>(
    conn: &mut PgConnection,
    op: &'static str,
    tender_id: Uuid,
    username: &str,
    change: F,
) -> ServiceResult<Tender>
where
    F: FnOnce(&mut PgConnection, &Employee, &Tender) -> ServiceResult<Tender>,
{
    conn.transaction(|conn| {
        let user = membership::user_by_username(conn, username)?;
        let access = authz::user_may_act_on_tender(conn, user.id, tender_id)?;
        let current = reader::get_tender_by_id(conn, tender_id)?;
        access.require()?;

        let next = change(conn, &user, &current)?;
        let stored = store_tender(conn, current.version, &next)?;
        history::record_tender_version(conn, &user.username, &stored)?;

        info!(
            op,
            tender_id = %stored.id,
            version = stored.version,
            status = %stored.status,
            username = %user.username,
            "tender updated"
        );
        Ok(stored)
    })
}

/// Writes `next` only if the stored row still carries `read_version`.
fn store_tender(conn: &mut PgConnection, read_version: i32, next: &Tender) -> ServiceResult<Tender> {
    diesel::update(
        tenders::table
            .find(next.id)
            .filter(tenders::version.eq(read_version)),
    )
    .set(next)
    .returning(Tender::as_returning())
    .get_result(conn)
    .optional()
    .map_err(ServiceError::query("lifecycle.store_tender"))?
    .ok_or(ServiceError::Conflict {
        entity: Entity::Tender,
        version: read_version,
    })
}
