use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;
use crate::types::{AuthorType, BidStatus, Decision, OrganizationKind, ServiceType, TenderStatus};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = organization)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub organization_type: OrganizationKind,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = organization)]
pub struct NewOrganization {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub organization_type: OrganizationKind,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = employee)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Employee {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = employee)]
pub struct NewEmployee {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = organization_responsible)]
pub struct NewOrganizationResponsible {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, AsChangeset)]
#[diesel(table_name = tenders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Tender {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub creator_username: String,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tenders)]
pub struct NewTenderRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub creator_username: String,
    pub version: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = tender_versions)]
#[diesel(belongs_to(Tender))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TenderVersion {
    pub id: i32,
    pub tender_id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub creator_username: String,
    pub version: i32,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tender_versions)]
pub struct NewTenderVersion<'a> {
    pub tender_id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub creator_username: &'a str,
    pub version: i32,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations, AsChangeset)]
#[diesel(table_name = bids)]
#[diesel(primary_key(bid_id))]
#[diesel(belongs_to(Tender))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Bid {
    pub bid_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = bids)]
pub struct NewBidRow {
    pub bid_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub version: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = bids_versions)]
#[diesel(belongs_to(Bid))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BidVersion {
    pub id: i32,
    pub bid_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = bids_versions)]
pub struct NewBidVersion<'a> {
    pub bid_id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub status: BidStatus,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = bid_feedback)]
#[diesel(primary_key(feedback_id))]
#[diesel(belongs_to(Bid))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BidFeedback {
    pub feedback_id: Uuid,
    pub bid_id: Uuid,
    pub feedback: String,
    pub username: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = bid_feedback)]
pub struct NewBidFeedback {
    pub feedback_id: Uuid,
    pub bid_id: Uuid,
    pub feedback: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = bid_decisions)]
#[diesel(belongs_to(Bid))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BidDecision {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub decision: Decision,
    pub decided_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = bid_decisions)]
pub struct NewBidDecision {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub decision: Decision,
    pub decided_by: Option<Uuid>,
}
