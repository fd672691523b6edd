//! Intake server - receives submissions from intake-tui
//!
//! Serves `GET /api/health` and `POST /api/submit-form`. Each accepted
//! submission is written as `submission-<id>.json` and appended to
//! `submissions.csv` in the submissions directory.

mod http;
mod routes;
mod store;

use anyhow::{Context, Result};
use routes::{Routes, DEFAULT_REQUIRED};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use store::SubmissionStore;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

/// Server settings from `INTAKE_SERVER_ADDR`, `PORT`,
/// `INTAKE_SUBMISSIONS_DIR` and `INTAKE_REQUIRED_FIELDS`
#[derive(Debug, Clone, PartialEq, Eq)]
struct ServerConfig {
    addr: String,
    port: u16,
    submissions_dir: PathBuf,
    required: Vec<String>,
}

impl ServerConfig {
    fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT {port:?}"))?,
            None => DEFAULT_PORT,
        };
        let required = match var("INTAKE_REQUIRED_FIELDS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_REQUIRED.iter().map(|id| id.to_string()).collect(),
        };

        Ok(Self {
            addr: var("INTAKE_SERVER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            port,
            submissions_dir: var("INTAKE_SUBMISSIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("submissions")),
            required,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tokio::fs::create_dir_all(&config.submissions_dir)
        .await
        .with_context(|| {
            format!(
                "Cannot create submissions directory {}",
                config.submissions_dir.display()
            )
        })?;

    let listener = TcpListener::bind((config.addr.as_str(), config.port))
        .await
        .with_context(|| format!("Cannot bind {}:{}", config.addr, config.port))?;
    let routes = Arc::new(Routes::new(
        SubmissionStore::new(&config.submissions_dir),
        config.required,
    ));

    tracing::info!(
        addr = %listener.local_addr()?,
        submissions = %routes.store().dir().display(),
        "Intake server listening"
    );
    serve(listener, routes).await
}

/// Accept connections until the listener fails
async fn serve(listener: TcpListener, routes: Arc<Routes>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.context("Accept failed")?;
        let routes = Arc::clone(&routes);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, &routes).await {
                tracing::debug!(%peer, error = %e, "Connection dropped");
            }
        });
    }
}

/// One request per connection
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    routes: &Routes,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);
    let response = match http::read_request(&mut reader).await {
        Ok(request) => {
            tracing::debug!(%peer, method = %request.method, path = %request.path, "Request");
            routes.handle(request).await
        }
        Err(http::HttpError::Closed) => return Ok(()),
        Err(http::HttpError::Io(e)) => return Err(e),
        Err(e @ http::HttpError::TooLarge(_)) => error_response(413, &e),
        Err(e) => error_response(400, &e),
    };
    response.write_to(reader.get_mut()).await
}

fn error_response(status: u16, error: &http::HttpError) -> http::Response {
    http::Response::json(
        status,
        serde_json::json!({ "success": false, "error": error.to_string() }),
    )
}
