use std::{env, fs::OpenOptions, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use expendi::{PasswordHash, build_router, create_app_state, graceful_shutdown, logging_middleware};

/// The REST API server for Expendi.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

const DEFAULT_TOKEN_SECRET: &str = "secret";
const DEFAULT_TOKEN_EXPIRY_DAYS: i64 = 90;

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!(
            "The environment variable 'JWT_SECRET' is not set, \
            falling back to the default signing secret. \
            Tokens signed with the default secret are forgeable."
        );
        DEFAULT_TOKEN_SECRET.to_owned()
    });

    let token_duration = Duration::days(parse_days_or_default(
        env::var("JWT_EXPIRES_IN_DAYS").ok(),
        DEFAULT_TOKEN_EXPIRY_DAYS,
    ));

    let conn = Connection::open(&args.db_path).expect("Could not open database.");
    let state = create_app_state(conn, &secret, token_duration, PasswordHash::DEFAULT_COST)
        .expect("Could not create app state.");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router =
        add_tracing_layer(build_router(state)).layer(middleware::from_fn(logging_middleware));

    tracing::info!("HTTP server listening on {addr}");
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn parse_days_or_default(maybe_days: Option<String>, default_days: i64) -> i64 {
    match maybe_days {
        None => default_days,
        Some(raw_days) => raw_days.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Could not parse '{raw_days}' as a number of days, using {default_days}."
            );
            default_days
        }),
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
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
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
