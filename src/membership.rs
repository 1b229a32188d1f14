//! Employee and organization lookups, and the membership relation that backs every
//! organization-scoped authorization decision.

use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::PgConnection;
use uuid::Uuid;

use crate::error::{Entity, ServiceError, ServiceResult};
use crate::models::{Employee, Organization};
use crate::schema::{employee, organization, organization_responsible};

pub fn user_by_username(conn: &mut PgConnection, username: &str) -> ServiceResult<Employee> {
    employee::table
        .filter(employee::username.eq(username))
        .select(Employee::as_select())
        .first(conn)
        .optional()
        .map_err(ServiceError::query("membership.user_by_username"))?
        .ok_or(ServiceError::NotFound(Entity::User))
}

pub fn user_by_id(conn: &mut PgConnection, user_id: Uuid) -> ServiceResult<Employee> {
    employee::table
        .find(user_id)
        .select(Employee::as_select())
        .first(conn)
        .optional()
        .map_err(ServiceError::query("membership.user_by_id"))?
        .ok_or(ServiceError::NotFound(Entity::User))
}

pub fn organization_by_id(
    conn: &mut PgConnection,
    organization_id: Uuid,
) -> ServiceResult<Organization> {
    organization::table
        .find(organization_id)
        .select(Organization::as_select())
        .first(conn)
        .optional()
        .map_err(ServiceError::query("membership.organization_by_id"))?
        .ok_or(ServiceError::NotFound(Entity::Organization))
}

/// True iff a responsible row links the employee named `username` to the organization.
pub fn is_user_member_of_organization(
    conn: &mut PgConnection,
    username: &str,
    organization_id: Uuid,
) -> ServiceResult<bool> {
    diesel::select(exists(
        organization_responsible::table
            .inner_join(employee::table)
            .filter(employee::username.eq(username))
            .filter(organization_responsible::organization_id.eq(organization_id)),
    ))
    .get_result(conn)
    .map_err(ServiceError::query("membership.is_user_member_of_organization"))
}

/// Organizations the user is a responsible of.
pub fn organizations_of_user(conn: &mut PgConnection, user_id: Uuid) -> ServiceResult<Vec<Uuid>> {
    organization_responsible::table
        .filter(organization_responsible::user_id.eq(user_id))
        .select(organization_responsible::organization_id)
        .load(conn)
        .map_err(ServiceError::query("membership.organizations_of_user"))
}
