use std::{
    env::{self},
    fs::OpenOptions,
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use rusqlite::Connection;
use secrecy::SecretString;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use moneyflow::{
    AppState, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, ScannerConfig, build_router,
    graceful_shutdown, logging_middleware,
};

/// The web server for MoneyFlow.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// Directory containing an SSL certificate `cert.pem` and key `key.pem`.
    ///
    /// The server uses plain HTTP when this is not set.
    #[arg(long, env = "CERT_PATH")]
    cert_path: Option<String>,

    /// The port to serve the app from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// The canonical name of the timezone used for "today", e.g. "Asia/Tokyo".
    #[arg(long, env = "LOCAL_TIMEZONE", default_value = "Asia/Tokyo")]
    timezone: String,

    /// The Gemini API key used for users that have not saved their own.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// The Gemini model used to read receipts.
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    /// The scheme and host of the Gemini API.
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    gemini_base_url: String,

    /// How many seconds to wait for the Gemini API before giving up on a scan.
    #[arg(long, env = "SCAN_TIMEOUT_SECS", default_value_t = 60)]
    scan_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let secret = env::var("SECRET").expect("The environment variable 'SECRET' must be set");

    let scanner_config = ScannerConfig {
        base_url: args.gemini_base_url.trim_end_matches('/').to_owned(),
        model: args.gemini_model,
        timeout: Duration::from_secs(args.scan_timeout_secs),
    };
    let default_api_key = args
        .gemini_api_key
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from);

    if default_api_key.is_none() {
        tracing::warn!(
            "No server Gemini API key was set, users must save their own key to scan receipts"
        );
    }

    let conn = Connection::open(&args.db_path).expect("Could not open the database.");
    let app_state = AppState::new(
        conn,
        &secret,
        &args.timezone,
        &scanner_config,
        default_api_key,
    )
    .expect("Could not create the app state.");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(app_state).layer(middleware::from_fn(logging_middleware)),
    );

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    match args.cert_path {
        Some(cert_path) => {
            let tls_config = RustlsConfig::from_pem_file(
                PathBuf::from(&cert_path).join("cert.pem"),
                PathBuf::from(&cert_path).join("key.pem"),
            )
            .await
            .expect("Could not open TLS certificates.");

            tracing::info!("HTTPS server listening on {}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await
                .unwrap();
        }
        None => {
            tracing::info!("HTTP server listening on {}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await
                .unwrap();
        }
    }
}

/// Log to stdout at the level set by `RUST_LOG` (default info) and everything from debug up to `debug.log`.
fn setup_logging() {
    let stdout_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "moneyflow=info,server=info,tower_http=info".into());
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_filter);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged by the handlers, so 5xx responses are not logged again here.
        .on_failure(());

    router.layer(tracing_layer)
}
