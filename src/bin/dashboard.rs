use std::{error::Error, time::Duration};

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kakeibo_rs::{
    CachedCategoryDirectory, DEFAULT_TREND_WINDOW, DashboardConfig, PreviousPeriodPolicy,
    SqliteStore, current_period, get_monthly_dashboard_data, require_user,
};

/// Prints the monthly dashboard of a kakeibo_rs user as JSON.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "KAKEIBO_DB_PATH")]
    db_path: String,

    /// The ID of the user to build the dashboard for.
    #[arg(long, short)]
    user_id: String,

    /// The year to show, defaults to the current year.
    #[arg(long, short)]
    year: Option<i32>,

    /// The month to show (1-12), defaults to the current month.
    #[arg(long, short)]
    month: Option<u8>,

    /// The number of months in the trend series.
    #[arg(long, short, default_value_t = DEFAULT_TREND_WINDOW)]
    window: usize,

    /// The time limit for each database read in milliseconds.
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// What to do if the previous month cannot be read.
    #[arg(long, value_enum, default_value_t = PreviousPeriodPolicy::Degrade)]
    previous_period: PreviousPeriodPolicy,

    /// The canonical timezone used to find the current month, e.g. "Asia/Tokyo".
    #[arg(long, env = "KAKEIBO_TIMEZONE", default_value = "Asia/Tokyo")]
    timezone: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let user_id = require_user(Some(args.user_id.as_str()))?;
    let this_month = current_period(&args.timezone)?;
    let year = args.year.unwrap_or(this_month.year());
    let month = args.month.unwrap_or(u8::from(this_month.month()));

    let config = DashboardConfig::default()
        .with_trend_window(args.window)?
        .with_fetch_timeout(Duration::from_millis(args.timeout_ms))
        .with_previous_period_policy(args.previous_period);

    let store = SqliteStore::new(Connection::open(&args.db_path)?)?;
    let directory = CachedCategoryDirectory::new(store.clone());

    let started = OffsetDateTime::now_utc();
    let data =
        get_monthly_dashboard_data(&store, &directory, &user_id, year, month, &config).await?;
    tracing::info!(
        "built dashboard for {} in {}",
        data.period,
        OffsetDateTime::now_utc() - started
    );

    println!("{}", serde_json::to_string_pretty(&data)?);

    Ok(())
}

/// Log to stderr so the JSON on stdout stays clean. `RUST_LOG` overrides the
/// default `info` level.
fn setup_logging() {
    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
