//! `QuizServer` builder and accept loop.
//!
//! This is the entry point for running a Quizforge server. It ties
//! together the layers: transport → protocol → rooms.

use std::sync::Arc;

use quizforge_protocol::JsonCodec;
use quizforge_room::{RoomConfig, RoomRegistry};
use quizforge_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::QuizforgeError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry sits behind a `Mutex`; handlers hold the lock only for
/// lookups and bindings, never across room I/O.
pub(crate) struct ServerState {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Quizforge server.
///
/// # Example
///
/// ```rust,ignore
/// use quizforge::prelude::*;
///
/// let server = QuizServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct QuizServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl QuizServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the room timing configuration. The defaults are the
    /// protocol constants; tests shrink them to keep wall time down.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Builds and starts the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`. Also spawns the room
    /// reaper, which drops registry entries for rooms that have closed
    /// (retention elapsed or last player gone).
    pub async fn build(self) -> Result<QuizServer, QuizforgeError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let (registry, mut closed_rx) = RoomRegistry::new(self.room_config);
        let state = Arc::new(ServerState {
            rooms: Mutex::new(registry),
            codec: JsonCodec,
        });

        let reaper_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(code) = closed_rx.recv().await {
                tracing::debug!(%code, "reaping closed room");
                reaper_state.rooms.lock().await.remove_room(&code);
            }
        });

        Ok(QuizServer { transport, state })
    }
}

impl Default for QuizServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Quizforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuizServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl QuizServer {
    /// Creates a new builder.
    pub fn builder() -> QuizServerBuilder {
        QuizServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), QuizforgeError> {
        tracing::info!("Quizforge server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
