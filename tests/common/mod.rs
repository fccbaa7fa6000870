#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use persistence_proxy::auth::token::hash_token;
use persistence_proxy::config::{Config, UpstreamConfig};

// ── Stub upstream ───────────────────────────────────────────────

#[derive(Clone, Default)]
struct Recorded {
    hits: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<String>>>,
    authorization: Arc<Mutex<Option<String>>>,
}

/// A fake analysis service answering every POST with a fixed reply.
pub struct StubUpstream {
    pub addr: SocketAddr,
    recorded: Recorded,
}

impl StubUpstream {
    pub fn url(&self) -> String {
        format!("http://{}/api/v1/feedback", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.recorded.hits.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<String> {
        self.recorded.bodies.lock().unwrap().clone()
    }

    pub fn authorization(&self) -> Option<String> {
        self.recorded.authorization.lock().unwrap().clone()
    }
}

pub async fn spawn_upstream(status: StatusCode, body: &'static str, delay: Duration) -> StubUpstream {
    let recorded = Recorded::default();

    let app = Router::new()
        .route(
            "/api/v1/feedback",
            post(
                move |State(rec): State<Recorded>, headers: HeaderMap, payload: String| async move {
                    rec.hits.fetch_add(1, Ordering::SeqCst);
                    rec.bodies.lock().unwrap().push(payload);
                    *rec.authorization.lock().unwrap() = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(|v| v.to_string());
                    tokio::time::sleep(delay).await;
                    (status, body)
                },
            ),
        )
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub upstream");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub upstream failed");
    });

    StubUpstream { addr, recorded }
}

/// A URL on a port that was just released, so connecting to it is refused.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind placeholder listener");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/v1/feedback")
}

pub fn upstream_config(url: String, timeout: Duration) -> UpstreamConfig {
    UpstreamConfig {
        url,
        api_key: None,
        timeout,
        max_concurrent: 5,
    }
}

// ── Full app against PostgreSQL ─────────────────────────────────

/// A running proxy with a dedicated test database and one registered consumer.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub consumer_id: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register another consumer, returning its id and bearer token.
    pub async fn add_consumer(&self, name: &str) -> (Uuid, String) {
        let token = format!("tok-{}", Uuid::now_v7().simple());
        let consumer = persistence_proxy::db::consumers::create(&self.pool, name, &hash_token(&token))
            .await
            .expect("create consumer failed");
        (consumer.id, token)
    }

    /// POST a payload to the analyse endpoint, returning (status, interaction id header, body text).
    pub async fn analyse(&self, token: &str, payload: &str) -> (StatusCode, Option<Uuid>, String) {
        let resp = self
            .client
            .post(self.url("/api/v1/analyse"))
            .bearer_auth(token)
            .header("content-type", "application/json")
            .body(payload.to_string())
            .send()
            .await
            .expect("analyse request failed");
        let status = resp.status();
        let id = resp
            .headers()
            .get("x-interaction-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = resp.text().await.unwrap_or_default();
        (status, id, body)
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn interaction_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM interactions")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn the proxy with a fresh temporary database, forwarding to `upstream`.
pub async fn spawn_app(upstream: UpstreamConfig) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("proxy_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let token = format!("tok-{}", Uuid::now_v7().simple());
    let consumer = persistence_proxy::db::consumers::create(&pool, "tester", &hash_token(&token))
        .await
        .expect("Failed to create test consumer");

    let config = Config {
        database_url: test_url,
        db_max_connections: 5,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
        upstream,
    };

    let app = persistence_proxy::build_app(pool.clone(), config).expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
        consumer_id: consumer.id,
        token,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
