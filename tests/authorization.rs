mod common;

use anyhow::Result;
use common::{acquire_db_lock, TestApp};
use tender_service::authz::{self, Authorization};
use tender_service::error::{Entity, ServiceError};
use tender_service::lifecycle::tenders::{self, NewTender};
use tender_service::lifecycle::TenderPatch;
use tender_service::membership;
use tender_service::types::ServiceType;
use uuid::Uuid;

async fn create_tender(app: &TestApp, organization_id: Uuid, username: &str) -> Result<Uuid> {
    let request = NewTender {
        name: "Tender".to_string(),
        description: String::new(),
        service_type: ServiceType::Manufacture,
        organization_id,
        creator_username: username.to_string(),
    };
    app.with_conn(move |conn| Ok(tenders::create_tender(conn, request)?.id))
        .await
}

#[tokio::test]
async fn ownership_follows_organization_move() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    let (org_a, user_id) = app.seed_member("Organization A", "mover").await?;
    let org_b = app.insert_organization("Organization B").await?;
    app.link_member(org_b, user_id).await?;
    let tender_id = create_tender(&app, org_a, "mover").await?;

    let before = app
        .with_conn(move |conn| {
            Ok((
                authz::organization_owns_tender(conn, org_a, tender_id)?,
                authz::organization_owns_tender(conn, org_b, tender_id)?,
            ))
        })
        .await?;
    assert_eq!(before, (Authorization::Authorized, Authorization::NotAuthorized));

    app.with_conn(move |conn| {
        tenders::update_tender(
            conn,
            tender_id,
            "mover",
            TenderPatch {
                organization_id: Some(org_b),
                ..TenderPatch::default()
            },
        )?;
        Ok(())
    })
    .await?;

    let after = app
        .with_conn(move |conn| {
            Ok((
                authz::organization_owns_tender(conn, org_a, tender_id)?,
                authz::organization_owns_tender(conn, org_b, tender_id)?,
            ))
        })
        .await?;
    assert_eq!(after, (Authorization::NotAuthorized, Authorization::Authorized));

    let missing = app
        .with_conn(move |conn| Ok(authz::organization_owns_tender(conn, org_a, Uuid::new_v4())))
        .await?;
    assert!(matches!(missing, Err(ServiceError::NotFound(Entity::Tender))));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn moving_to_foreign_organization_is_refused() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    let (org_a, _) = app.seed_member("Organization A", "owner").await?;
    let (org_b, _) = app.seed_member("Organization B", "other").await?;
    let tender_id = create_tender(&app, org_a, "owner").await?;

    let outcome = app
        .with_conn(move |conn| {
            Ok(tenders::update_tender(
                conn,
                tender_id,
                "owner",
                TenderPatch {
                    organization_id: Some(org_b),
                    ..TenderPatch::default()
                },
            ))
        })
        .await?;
    assert!(matches!(outcome, Err(ServiceError::NoRights)));

    let still_owned = app
        .with_conn(move |conn| Ok(authz::organization_owns_tender(conn, org_a, tender_id)?))
        .await?;
    assert!(still_owned.is_authorized());

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn removing_membership_revokes_rights() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    let (org_id, user_id) = app.seed_member("Organization A", "leaver").await?;
    let tender_id = create_tender(&app, org_id, "leaver").await?;

    let (member, may_act) = app
        .with_conn(move |conn| {
            Ok((
                membership::is_user_member_of_organization(conn, "leaver", org_id)?,
                authz::user_may_act_on_tender(conn, user_id, tender_id)?,
            ))
        })
        .await?;
    assert!(member);
    assert_eq!(may_act, Authorization::Authorized);

    app.unlink_member(org_id, user_id).await?;

    let (member, may_act, organizations) = app
        .with_conn(move |conn| {
            Ok((
                membership::is_user_member_of_organization(conn, "leaver", org_id)?,
                authz::user_may_act_on_tender(conn, user_id, tender_id)?,
                membership::organizations_of_user(conn, user_id)?,
            ))
        })
        .await?;
    assert!(!member);
    assert_eq!(may_act, Authorization::NotAuthorized);
    assert!(organizations.is_empty());

    let publish = app
        .with_conn(move |conn| Ok(tenders::publish_tender(conn, tender_id, "leaver")))
        .await?;
    assert!(matches!(publish, Err(ServiceError::NoRights)));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn unknown_principals_are_not_found() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::new().await? else {
        return Ok(());
    };

    let outcome = app
        .with_conn(|conn| {
            Ok((
                membership::user_by_username(conn, "nobody"),
                membership::organization_by_id(conn, Uuid::new_v4()),
                membership::is_user_member_of_organization(conn, "nobody", Uuid::new_v4())?,
            ))
        })
        .await?;
    assert!(matches!(outcome.0, Err(ServiceError::NotFound(Entity::User))));
    assert!(matches!(
        outcome.1,
        Err(ServiceError::NotFound(Entity::Organization))
    ));
    assert!(!outcome.2);

    app.cleanup().await?;
    Ok(())
}
