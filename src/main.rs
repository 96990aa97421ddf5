//! Application entry point and server initialization

use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use snaplink::route::{create_app, AppState};
use snaplink::service::MappingService;
use snaplink::store::{run_expiry_sweeper, MappingStore, RedbStore};

/// # Environment Variables
///
/// - `PORT` - Server port number (default: 8080)
/// - `DATABASE_URL` - Path to database file (default: "data.db")
#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("snaplink=debug,tower_http=debug")
        .init();

    let port_str = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let port: u16 = port_str.parse().unwrap_or(8080);

    let db_name = env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string());

    let store = RedbStore::open(&db_name).expect("Failed to initialize database");
    let store: Arc<dyn MappingStore> = Arc::new(store);

    // Retention is enforced on every read; the sweeper reclaims the space.
    tokio::spawn(run_expiry_sweeper(Arc::clone(&store)));

    let state = AppState {
        service: MappingService::new(store),
    };

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await.unwrap();

    println!("🚀 Server running at http://localhost:{}", port);
    println!("📂 Using database: {}", db_name);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

/// Resolves when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received, letting
/// open connections finish before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    println!("\n🛑 Shutdown signal received, stopping server.");
}
