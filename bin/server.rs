// Bill Tracker - Development Backend
// In-memory REST API the client can run against locally

use anyhow::{Context, Result};
use bill_tracker::server::{router, Backend};
use bill_tracker::DEFAULT_API_PORT;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("BILL_TRACKER_BIND")
        .unwrap_or_else(|_| format!("0.0.0.0:{}", DEFAULT_API_PORT));

    let mut backend = if std::env::args().any(|a| a == "--empty") {
        Backend::new()
    } else {
        Backend::demo()
    };
    if let Ok(token) = std::env::var("BILL_TRACKER_TOKEN") {
        backend = backend.with_token(token);
        tracing::info!("bearer token required on API routes");
    }
    if let Ok(base) = std::env::var("BILL_TRACKER_PUBLIC_BASE") {
        backend = backend.with_public_base(base);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    println!("🌐 Bill Tracker - Development Backend");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🚀 Listening on http://{}", addr);
    println!("   API:    /bills, /income, /system/user");
    println!("   Config: /env/environment.json");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, router(backend))
        .await
        .context("server error")?;

    Ok(())
}
