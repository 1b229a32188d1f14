use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::MigrationHarness;
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use serde::Serialize;
use tender_service::config::AppConfig;
use tender_service::db::{self, PgPool};
use tender_service::models::{NewEmployee, NewOrganization, NewOrganizationResponsible};
use tender_service::routes;
use tender_service::schema::{employee, organization, organization_responsible};
use tender_service::state::AppState;
use tender_service::types::OrganizationKind;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// `None` when `TEST_DATABASE_URL` is unset; callers skip in that case.
    pub async fn new() -> Result<Option<Self>> {
        let Ok(database_url) = env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return Ok(None);
        };

        let config = AppConfig {
            database_url,
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            database_acquire_timeout: Duration::from_secs(5),
            database_connect_attempts: 1,
            database_connect_initial_backoff: Duration::from_millis(50),
            database_connect_max_backoff: Duration::from_millis(50),
            server_address: "127.0.0.1:0".to_string(),
            cors_allowed_origin: None,
            run_migrations: true,
        };

        let pool = db::init_pool_with_size(
            &config.database_url,
            config.database_max_pool_size,
            config.database_acquire_timeout,
        )?;
        prepare_database(&pool).await?;

        let state = AppState::new(pool, config);
        let router = routes::create_router(state.clone());

        Ok(Some(Self { state, router }))
    }

    pub async fn cleanup(&self) -> Result<()> {
        self.with_conn(truncate_all).await
    }

    #[allow(dead_code)]
    pub async fn insert_organization(&self, name: &str) -> Result<Uuid> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let org = NewOrganization {
                id: Uuid::new_v4(),
                description: format!("{name} under test"),
                name,
                organization_type: OrganizationKind::Llc,
            };
            diesel::insert_into(organization::table)
                .values(&org)
                .execute(conn)
                .context("failed to insert organization")?;
            Ok(org.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn insert_employee(&self, username: &str) -> Result<Uuid> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            let user = NewEmployee {
                id: Uuid::new_v4(),
                username,
                first_name: "Test".to_string(),
                last_name: "Employee".to_string(),
            };
            diesel::insert_into(employee::table)
                .values(&user)
                .execute(conn)
                .context("failed to insert employee")?;
            Ok(user.id)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn link_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<()> {
        self.with_conn(move |conn| {
            diesel::insert_into(organization_responsible::table)
                .values(&NewOrganizationResponsible {
                    id: Uuid::new_v4(),
                    organization_id,
                    user_id,
                })
                .execute(conn)
                .context("failed to link responsible")?;
            Ok(())
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn unlink_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<()> {
        self.with_conn(move |conn| {
            diesel::delete(
                organization_responsible::table
                    .filter(organization_responsible::organization_id.eq(organization_id))
                    .filter(organization_responsible::user_id.eq(user_id)),
            )
            .execute(conn)
            .context("failed to unlink responsible")?;
            Ok(())
        })
        .await
    }

    /// Organization with one responsible employee: `(organization_id, user_id)`.
    #[allow(dead_code)]
    pub async fn seed_member(&self, org_name: &str, username: &str) -> Result<(Uuid, Uuid)> {
        let organization_id = self.insert_organization(org_name).await?;
        let user_id = self.insert_employee(username).await?;
        self.link_member(organization_id, user_id).await?;
        Ok((organization_id, user_id))
    }

    #[allow(dead_code)]
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload).await
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PATCH, path, payload).await
    }

    #[allow(dead_code)]
    pub async fn put(&self, path: &str) -> Result<hyper::Response<Body>> {
        self.send_empty(Method::PUT, path).await
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str) -> Result<hyper::Response<Body>> {
        self.send_empty(Method::GET, path).await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

#[allow(dead_code)]
pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        conn.run_pending_migrations(db::MIGRATIONS)
            .map_err(|err| anyhow!("failed to run migrations: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE bid_decisions, bid_feedback, bids_versions, bids, tender_versions, tenders, organization_responsible, employee, organization RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
