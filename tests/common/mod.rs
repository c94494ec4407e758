#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use jobly_api::auth::create_token;

static SERVER: OnceLock<TestServer> = OnceLock::new();
static FIXTURE_SEQ: AtomicU32 = AtomicU32::new(0);

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // The server inherits DATABASE_URL / SECRET_KEY; APP_ENV=test points it at jobly_test
        let child = Command::new(env!("CARGO_BIN_EXE_jobly-api"))
            .env("APP_ENV", "test")
            .env("PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                // 503 still means the server is up, only the database is not
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| {
        // Token helpers in this process must sign with the server's secret
        let _ = dotenvy::dotenv();
        std::env::set_var("APP_ENV", "test");
        TestServer::spawn().expect("failed to spawn server binary")
    });
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// True when the server reports a reachable database. Tests that need
/// PostgreSQL return early when this is false.
pub async fn database_ready(server: &TestServer) -> Result<bool> {
    let status = reqwest::get(server.url("/health")).await?.status();
    if status != StatusCode::OK {
        eprintln!("skipping: no database behind {}", server.base_url);
        return Ok(false);
    }
    Ok(true)
}

pub fn admin_token() -> String {
    create_token("test-admin", true).expect("admin token")
}

pub fn user_token(username: &str) -> String {
    create_token(username, false).expect("user token")
}

/// A name that no other test run has used, e.g. `c-1a2b3c-4`
pub fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| (d.as_nanos() % (1u128 << 40)) as u64)
        .unwrap_or_default();
    let seq = FIXTURE_SEQ.fetch_add(1, Ordering::SeqCst);
    format!("{}-{:x}-{}", prefix, nanos, seq)
}

/// Create a company as admin and return its handle
pub async fn create_company(server: &TestServer, client: &reqwest::Client) -> Result<String> {
    let handle = unique("c");
    let res = client
        .post(server.url("/companies"))
        .bearer_auth(admin_token())
        .json(&json!({
            "handle": handle,
            "name": format!("Company {}", handle),
            "description": "Test company",
            "numEmployees": 10,
            "logoUrl": "http://c1.img"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(handle)
}

/// Create a job as admin and return its JSON
pub async fn create_job(server: &TestServer, client: &reqwest::Client, body: Value) -> Result<Value> {
    let res = client
        .post(server.url("/jobs"))
        .bearer_auth(admin_token())
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    Ok(body["job"].clone())
}

/// Register a fresh non-admin user and return (username, token)
pub async fn register_user(server: &TestServer, client: &reqwest::Client) -> Result<(String, String)> {
    let username = unique("u");
    let res = client
        .post(server.url("/auth/register"))
        .json(&json!({
            "username": username,
            "password": "password1",
            "firstName": "Test",
            "lastName": "User",
            "email": "test@user.com"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    let token = body["token"].as_str().context("token missing")?.to_string();
    Ok((username, token))
}
