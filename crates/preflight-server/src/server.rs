//! HTTP server implementation for the checklist API.
//!
//! Wires the handlers into an axum router, holds the shared state, and runs
//! the listener with graceful shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use preflight_core::{Collection, CollectionStore, JsonFileStore, Result, DEFAULT_DATA_FILE};

use crate::handlers;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Enable permissive CORS.
    pub cors: bool,
    /// Backing file for the collection.
    pub data_file: PathBuf,
    /// Answer 500 when a save fails instead of logging and carrying on.
    pub strict_persistence: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            cors: true,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            strict_persistence: false,
        }
    }
}

impl ServerConfig {
    /// Creates a new server config builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    addr: Option<SocketAddr>,
    cors: Option<bool>,
    data_file: Option<PathBuf>,
    strict_persistence: Option<bool>,
}

impl ServerConfigBuilder {
    /// Sets the listen address.
    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Sets whether CORS is enabled.
    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = Some(enabled);
        self
    }

    /// Sets the backing data file.
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// Sets whether save failures are surfaced as 500 responses.
    pub fn strict_persistence(mut self, strict: bool) -> Self {
        self.strict_persistence = Some(strict);
        self
    }

    /// Builds the server config.
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            addr: self.addr.unwrap_or_else(default_addr),
            cors: self.cors.unwrap_or(true),
            data_file: self
                .data_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
            strict_persistence: self.strict_persistence.unwrap_or(false),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Collection storage backend.
    pub store: Arc<dyn CollectionStore>,
    /// Serializes load/mutate/save cycles within this process.
    ///
    /// Reads share the lock; each mutation holds it exclusively from load to save.
    pub store_lock: RwLock<()>,
    /// Server configuration.
    pub config: ServerConfig,
}

impl AppState {
    /// Creates app state backed by the configured data file.
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(JsonFileStore::new(config.data_file.clone()));
        Self::with_store(config, store)
    }

    /// Creates app state with an explicit store.
    pub fn with_store(config: ServerConfig, store: Arc<dyn CollectionStore>) -> Self {
        Self {
            store,
            store_lock: RwLock::new(()),
            config,
        }
    }

    /// Saves `collection`, applying the configured failure policy.
    ///
    /// # Errors
    ///
    /// Returns the save error only when `strict_persistence` is enabled;
    /// otherwise the failure is logged and swallowed.
    pub async fn persist(&self, collection: &Collection) -> Result<()> {
        match self.store.save(collection).await {
            Ok(()) => Ok(()),
            Err(e) if self.config.strict_persistence => Err(e),
            Err(e) => {
                tracing::error!(error = %e, "Error writing data file");
                Ok(())
            },
        }
    }
}

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Creates a new server backed by the configured data file.
    pub fn new(config: ServerConfig) -> Self {
        let state = Arc::new(AppState::new(config.clone()));
        Self { config, state }
    }

    /// Creates a new server with an explicit store.
    pub fn with_store(config: ServerConfig, store: Arc<dyn CollectionStore>) -> Self {
        let state = Arc::new(AppState::with_store(config.clone(), store));
        Self { config, state }
    }

    /// Returns the shared state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Creates the router.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/checklists",
                get(handlers::list_checklists).post(handlers::create_checklist),
            )
            .route(
                "/checklists/{name}",
                get(handlers::get_checklist).delete(handlers::delete_checklist),
            )
            .route("/checklists/{name}/items", post(handlers::add_item))
            .route(
                "/checklists/{name}/items/{serial}",
                delete(handlers::delete_item),
            )
            .with_state(self.state.clone());

        router = router.layer(TraceLayer::new_for_http());

        if self.config.cors {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Runs the server until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run(self) -> Result<()> {
        let router = self.router();

        tracing::info!(
            addr = %self.config.addr,
            data_file = %self.config.data_file.display(),
            strict_persistence = self.config.strict_persistence,
            "Starting Preflight server"
        );

        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(preflight_core::Error::Io)?;

        eprintln!(
            "\n\x1b[32m✓\x1b[0m API server listening on http://{}",
            self.config.addr
        );
        eprintln!("  Press Ctrl+C to stop\n");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(preflight_core::Error::Io)?;

        tracing::info!("Server shutdown complete");
        eprintln!("\x1b[32m✓\x1b[0m Server stopped");

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            eprintln!("\n\x1b[33m⚡\x1b[0m Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            eprintln!("\n\x1b[33m⚡\x1b[0m Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use preflight_core::{Checklist, Item, MemoryStore};
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn memory_router() -> Router {
        Server::with_store(ServerConfig::default(), Arc::new(MemoryStore::new())).router()
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            },
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(router: &Router, name: &str) {
        let (status, _) = send(router, Method::POST, "/checklists", Some(json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn add(router: &Router, checklist: &str, name: &str, serial: &str) {
        let (status, _) = send(
            router,
            Method::POST,
            &format!("/checklists/{checklist}/items"),
            Some(json!({ "itemName": name, "itemSerial": serial })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::builder()
            .addr("127.0.0.1:4000".parse().unwrap())
            .cors(false)
            .data_file("/tmp/checklists.json")
            .strict_persistence(true)
            .build();

        assert_eq!(config.addr, "127.0.0.1:4000".parse().unwrap());
        assert!(!config.cors);
        assert_eq!(config.data_file, PathBuf::from("/tmp/checklists.json"));
        assert!(config.strict_persistence);
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::builder().build();
        assert_eq!(config.addr.port(), DEFAULT_PORT);
        assert!(config.cors);
        assert_eq!(config.data_file, PathBuf::from("data.json"));
        assert!(!config.strict_persistence);
    }

    #[tokio::test]
    async fn test_health() {
        let router = memory_router();
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let router = memory_router();

        let (status, body) = send(&router, Method::POST, "/checklists", Some(json!({ "name": "Pre-Flight" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "name": "Pre-Flight", "items": [] }));

        let (status, body) = send(&router, Method::GET, "/checklists", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{ "name": "Pre-Flight", "items": [] }]));
    }

    #[tokio::test]
    async fn test_list_is_stable_without_mutations() {
        let router = memory_router();
        create(&router, "Taxi").await;
        create(&router, "Takeoff").await;

        let (_, first) = send(&router, Method::GET, "/checklists", None).await;
        let (_, second) = send(&router, Method::GET, "/checklists", None).await;
        assert_eq!(first, second);
        assert_eq!(first[0]["name"], "Taxi");
        assert_eq!(first[1]["name"], "Takeoff");
    }

    #[tokio::test]
    async fn test_add_item_then_get() {
        let router = memory_router();
        create(&router, "Pre-Flight").await;
        add(&router, "Pre-Flight", "Fuel", "F0").await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/checklists/Pre-Flight/items",
            Some(json!({ "itemName": "Altimeter", "itemSerial": "A1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "name": "Altimeter", "serial": "A1" }));

        let (status, body) = send(&router, Method::GET, "/checklists/Pre-Flight", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["items"],
            json!([
                { "name": "Fuel", "serial": "F0" },
                { "name": "Altimeter", "serial": "A1" }
            ])
        );
    }

    #[tokio::test]
    async fn test_get_missing_checklist() {
        let router = memory_router();
        let (status, body) = send(&router, Method::GET, "/checklists/Nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Checklist not found" }));
    }

    #[tokio::test]
    async fn test_percent_encoded_name() {
        let router = memory_router();
        create(&router, "Pre Flight").await;

        let (status, body) = send(&router, Method::GET, "/checklists/Pre%20Flight", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Pre Flight");
    }

    #[tokio::test]
    async fn test_delete_checklist_then_get() {
        let router = memory_router();
        create(&router, "Pre-Flight").await;
        add(&router, "Pre-Flight", "Altimeter", "A1").await;

        let (status, body) = send(&router, Method::DELETE, "/checklists/Pre-Flight", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&router, Method::GET, "/checklists/Pre-Flight", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&router, Method::DELETE, "/checklists/Pre-Flight", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Checklist not found" }));
    }

    #[tokio::test]
    async fn test_delete_missing_item_leaves_items() {
        let router = memory_router();
        create(&router, "Pre-Flight").await;
        add(&router, "Pre-Flight", "Altimeter", "A1").await;
        let (_, before) = send(&router, Method::GET, "/checklists/Pre-Flight", None).await;

        let (status, body) = send(&router, Method::DELETE, "/checklists/Pre-Flight/items/Z9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Item not found" }));

        let (_, after) = send(&router, Method::GET, "/checklists/Pre-Flight", None).await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_delete_item_from_missing_checklist() {
        let router = memory_router();
        let (status, body) = send(&router, Method::DELETE, "/checklists/Nope/items/A1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Checklist not found" }));
    }

    #[tokio::test]
    async fn test_delete_item_preserves_order() {
        let router = memory_router();
        create(&router, "Landing").await;
        add(&router, "Landing", "Gear", "A").await;
        add(&router, "Landing", "Flaps", "B").await;
        add(&router, "Landing", "Lights", "C").await;

        let (status, _) = send(&router, Method::DELETE, "/checklists/Landing/items/B", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&router, Method::GET, "/checklists/Landing", None).await;
        let serials: Vec<&str> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["serial"].as_str().unwrap())
            .collect();
        assert_eq!(serials, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let router = memory_router();

        for body in [json!({}), json!({ "name": "" }), json!({ "name": 7 }), json!([1, 2])] {
            let (status, response) = send(&router, Method::POST, "/checklists", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response, json!({ "error": "Name is required" }));
        }

        // No body at all.
        let (status, _) = send(&router, Method::POST, "/checklists", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = send(&router, Method::GET, "/checklists", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_add_item_validation_precedes_lookup() {
        let router = memory_router();

        let (status, body) = send(
            &router,
            Method::POST,
            "/checklists/Nope/items",
            Some(json!({ "itemName": "Altimeter" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Item name and serial are required" }));

        let (status, body) = send(
            &router,
            Method::POST,
            "/checklists/Nope/items",
            Some(json!({ "itemName": "Altimeter", "itemSerial": "A1" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Checklist not found" }));
    }

    #[tokio::test]
    async fn test_duplicate_names_first_match_wins() {
        let store = Arc::new(MemoryStore::new());
        let router = Server::with_store(ServerConfig::default(), store.clone()).router();
        create(&router, "Dup").await;
        create(&router, "Dup").await;
        add(&router, "Dup", "Altimeter", "A1").await;

        let collection = store.load().await;
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.checklists[0].items, vec![Item::new("Altimeter", "A1")]);
        assert!(collection.checklists[1].items.is_empty());

        let (status, _) = send(&router, Method::DELETE, "/checklists/Dup", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = send(&router, Method::GET, "/checklists/Dup", None).await;
        assert_eq!(body, json!({ "name": "Dup", "items": [] }));
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let router = memory_router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/checklists")
                    .header(header::ORIGIN, "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_disabled() {
        let config = ServerConfig::builder().cors(false).build();
        let router = Server::with_store(config, Arc::new(MemoryStore::new())).router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/checklists")
                    .header(header::ORIGIN, "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_file_backed_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let config = ServerConfig::builder().data_file(&path).build();

        let router = Server::new(config.clone()).router();
        create(&router, "Pre-Flight").await;
        add(&router, "Pre-Flight", "Altimeter", "A1").await;

        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            on_disk,
            json!({ "checklists": [
                { "name": "Pre-Flight", "items": [ { "name": "Altimeter", "serial": "A1" } ] }
            ]})
        );

        // A fresh server sees the persisted state.
        let reopened = Server::new(config).router();
        let (status, body) = send(&reopened, Method::GET, "/checklists/Pre-Flight", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["serial"], "A1");
    }

    #[tokio::test]
    async fn test_external_edits_are_picked_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let router = Server::new(ServerConfig::builder().data_file(&path).build()).router();

        let mut collection = Collection::new();
        collection.push_checklist(Checklist::new("Shutdown"));
        std::fs::write(&path, serde_json::to_string(&collection).unwrap()).unwrap();

        let (status, _) = send(&router, Method::GET, "/checklists/Shutdown", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    fn unwritable_config(dir: &std::path::Path, strict: bool) -> ServerConfig {
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        ServerConfig::builder()
            .data_file(blocker.join("data.json"))
            .strict_persistence(strict)
            .build()
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed_by_default() {
        let dir = tempdir().unwrap();
        let router = Server::new(unwritable_config(dir.path(), false)).router();

        let (status, body) = send(&router, Method::POST, "/checklists", Some(json!({ "name": "Lost" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "name": "Lost", "items": [] }));

        // Nothing reached disk, so the next load starts empty again.
        let (_, list) = send(&router, Method::GET, "/checklists", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_write_failure_is_500_when_strict() {
        let dir = tempdir().unwrap();
        let router = Server::new(unwritable_config(dir.path(), true)).router();

        let (status, body) = send(&router, Method::POST, "/checklists", Some(json!({ "name": "Lost" }))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to persist checklists" }));
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_not_lost() {
        let dir = tempdir().unwrap();
        let config = ServerConfig::builder()
            .data_file(dir.path().join("data.json"))
            .build();
        let router = Server::new(config).router();

        let mut tasks = Vec::new();
        for i in 0..16 {
            let router = router.clone();
            tasks.push(tokio::spawn(async move {
                create(&router, &format!("list-{i}")).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let (_, list) = send(&router, Method::GET, "/checklists", None).await;
        assert_eq!(list.as_array().unwrap().len(), 16);
    }
}
