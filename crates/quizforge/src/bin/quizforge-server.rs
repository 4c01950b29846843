//! Standalone Quizforge server binary.
//!
//! Binds to `QUIZFORGE_ADDR` (default `127.0.0.1:8080`) and serves quiz
//! rooms until terminated. Log verbosity follows `RUST_LOG`.

use quizforge::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), QuizforgeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("QUIZFORGE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let server = QuizServer::builder().bind(&addr).build().await?;
    tracing::info!(%addr, "quizforge listening");
    server.run().await
}
