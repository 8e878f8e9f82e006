use std::{
    error::Error,
    fs::OpenOptions,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use budgello::{
    AppState, auth::PasswordHash, build_router, graceful_shutdown, logging_middleware,
    user::bootstrap_admin,
};

/// The REST API server for budgello.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    db_path: PathBuf,

    /// The address to listen on.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// The secret used to sign and encrypt the auth cookie.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    secret: String,

    /// The canonical timezone used for dates and budget periods, e.g. "Pacific/Auckland".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// The origin of the web client, which is allowed to make cross-origin requests.
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:5173")]
    cors_origin: String,

    /// The username of the admin account to create on first run.
    #[arg(long, env = "ADMIN_USERNAME", requires = "admin_password")]
    admin_username: Option<String>,

    /// The password of the admin account to create on first run.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// File path to write debug logs to.
    #[arg(long, env = "LOG_PATH")]
    log_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    setup_logging(args.log_path.as_deref())?;

    if budgello::get_timezone(&args.timezone).is_err() {
        return Err(format!("\"{}\" is not a valid canonical timezone", args.timezone).into());
    }

    let addr = SocketAddr::new(args.host, args.port);
    let cors_origin = HeaderValue::from_str(&args.cors_origin)?;

    let connection = Connection::open(&args.db_path)?;
    let state = AppState::new(connection, &args.secret, &args.timezone)?;

    if let (Some(username), Some(password)) = (&args.admin_username, &args.admin_password) {
        let connection = state
            .db_connection
            .lock()
            .map_err(|error| format!("could not acquire database lock: {error}"))?;

        match bootstrap_admin(username, password, PasswordHash::DEFAULT_COST, &connection)? {
            Some(admin) => tracing::info!("Created admin user \"{}\"", admin.username),
            None => tracing::info!("Admin user \"{username}\" already exists"),
        }
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state, cors_origin).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging(log_path: Option<&Path>) -> Result<(), std::io::Error> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let debug_log = match log_path {
        Some(path) => {
            let log_file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(log_file))
                    .with_filter(filter::LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
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
