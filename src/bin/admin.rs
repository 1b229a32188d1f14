use std::env;

use anyhow::{anyhow, Context, Result};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::PgConnection;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tender_service::{
    config::AppConfig,
    db,
    lifecycle::{
        bids::{self, NewBid},
        tenders::{self, NewTender},
    },
    models::{NewEmployee, NewOrganization, NewOrganizationResponsible},
    schema::{employee, organization, organization_responsible},
    types::{AuthorType, OrganizationKind, ServiceType},
};

const USAGE: &str = "Usage: admin <migrate|seed-demo>";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("migrate") => migrate().await?,
        Some("seed-demo") => seed_demo().await?,
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn migrate() -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "admin",
        database_url = %config.redacted_database_url(),
        "running migrations"
    );
    let pool = db::connect(&config).await?;
    db::run_migrations(&pool)
}

/// Demo directory: three organizations with one responsible each, a tender per
/// organization in each status, and a bid on the published one.
async fn seed_demo() -> Result<()> {
    let config = AppConfig::from_env()?;
    let pool = db::connect(&config).await?;
    db::run_migrations(&pool)?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let already_seeded: bool =
        diesel::select(exists(employee::table.filter(employee::username.eq("user1"))))
            .get_result(&mut conn)
            .context("failed to inspect employees")?;
    if already_seeded {
        println!("Demo data already present.");
        return Ok(());
    }

    let directory = [
        ("Organization 1", OrganizationKind::Llc, "user1", "John", "Doe"),
        ("Organization 2", OrganizationKind::Ie, "user2", "Jane", "Smith"),
        ("Organization 3", OrganizationKind::Jsc, "user3", "Alice", "Johnson"),
    ];

    let mut members = Vec::with_capacity(directory.len());
    for (org_name, kind, username, first_name, last_name) in directory {
        let (organization_id, user_id) =
            insert_member(&mut conn, org_name, kind, username, first_name, last_name)?;
        members.push((organization_id, user_id, username));
    }

    let service_types = [
        ServiceType::Construction,
        ServiceType::Delivery,
        ServiceType::Manufacture,
    ];
    let mut published = None;
    for (index, ((organization_id, _, username), service_type)) in
        members.iter().zip(service_types).enumerate()
    {
        let number = index + 1;
        let tender = tenders::create_tender(
            &mut conn,
            NewTender {
                name: format!("Tender {number}"),
                description: format!("Description for Tender {number}"),
                service_type,
                organization_id: *organization_id,
                creator_username: username.to_string(),
            },
        )
        .map_err(|err| anyhow!("failed to create tender {number}: {err}"))?;

        match number {
            2 => {
                let tender = tenders::publish_tender(&mut conn, tender.id, username)
                    .map_err(|err| anyhow!("failed to publish tender 2: {err}"))?;
                published = Some(tender.id);
            }
            3 => {
                tenders::publish_tender(&mut conn, tender.id, username)
                    .and_then(|tender| tenders::close_tender(&mut conn, tender.id, username))
                    .map_err(|err| anyhow!("failed to close tender 3: {err}"))?;
            }
            _ => {}
        }
    }

    if let (Some(tender_id), Some((_, author_id, username))) = (published, members.first()) {
        bids::create_bid(
            &mut conn,
            username,
            NewBid {
                name: "Bid 1".to_string(),
                description: "Description for Bid 1".to_string(),
                tender_id,
                author_type: AuthorType::User,
                author_id: *author_id,
            },
        )
        .map_err(|err| anyhow!("failed to create bid: {err}"))?;
    }

    println!("Demo data loaded.");
    Ok(())
}

fn insert_member(
    conn: &mut PgConnection,
    org_name: &str,
    kind: OrganizationKind,
    username: &str,
    first_name: &str,
    last_name: &str,
) -> Result<(Uuid, Uuid)> {
    conn.transaction(|conn| {
        let org = NewOrganization {
            id: Uuid::new_v4(),
            name: org_name.to_string(),
            description: format!("{org_name} demo organization."),
            organization_type: kind,
        };
        diesel::insert_into(organization::table)
            .values(&org)
            .execute(conn)
            .context("failed to insert organization")?;

        let user = NewEmployee {
            id: Uuid::new_v4(),
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        diesel::insert_into(employee::table)
            .values(&user)
            .execute(conn)
            .context("failed to insert employee")?;

        diesel::insert_into(organization_responsible::table)
            .values(&NewOrganizationResponsible {
                id: Uuid::new_v4(),
                organization_id: org.id,
                user_id: user.id,
            })
            .execute(conn)
            .context("failed to link employee to organization")?;

        Ok((org.id, user.id))
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
