//! Headless patient dashboard.
//!
//! Loads the patient collection, applies search/sort/pagination and prints
//! the resulting page.
//!
//! # Environment Variables
//! - `PATIENTS_API_URL`: collection endpoint (sample data when unset)
//! - `PATIENTS_REQUEST_TIMEOUT_SECS`: request timeout (default 15)
//! - `RUST_LOG`: log filter (default `patient_dashboard=info`)

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patient_dashboard_core::filter::PageItem;
use patient_dashboard_core::{
    ChannelNotifier, DashboardConfig, FilterEngine, PatientManager, RecordStore, SortDirection,
    SortKey,
};

#[derive(Debug, Parser)]
#[command(name = "patient-dashboard", about = "List and filter patient records")]
struct Args {
    /// Collection endpoint; overrides PATIENTS_API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Case-insensitive name search
    #[arg(short, long, default_value = "")]
    query: String,

    /// Sort key: name, createdAt or id
    #[arg(long, default_value = "name")]
    sort: String,

    /// Sort direction: asc or desc
    #[arg(long, default_value = "asc")]
    dir: String,

    /// Page to show in desktop mode
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Viewport width in pixels; 768 or less selects load-more mode
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Extra "load more" batches in mobile mode
    #[arg(long, default_value_t = 0)]
    load_more: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "patient_dashboard=info,patient_dashboard_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = DashboardConfig::from_env();
    if let Some(url) = args.api_url {
        config.api_url = Some(url).filter(|u| !u.trim().is_empty());
    }

    let sort = SortKey::from_param(&args.sort)
        .ok_or_else(|| anyhow::anyhow!("unknown sort key: {}", args.sort))?;
    let dir = SortDirection::from_param(&args.dir)
        .ok_or_else(|| anyhow::anyhow!("unknown sort direction: {}", args.dir))?;

    let (notifier, mut notifications) = ChannelNotifier::channel();
    let store = Arc::new(RecordStore::from_config(&config));
    let manager = PatientManager::new(store, Arc::new(notifier));
    manager.mount().await;

    while let Ok(n) = notifications.try_recv() {
        eprintln!("! {}", n.message);
    }

    let mut engine = FilterEngine::new(config.filter.clone(), args.width);
    engine.set_sort_by(sort);
    engine.set_sort_direction(dir);
    engine.set_search_query(args.query);
    // Settle debounce and sort-pulse timers before rendering.
    while let Some(wait) = engine.next_deadline() {
        engine.advance(wait);
    }
    engine.set_page(args.page);
    let records = manager.records();
    for _ in 0..args.load_more {
        if !engine.load_more(&records) {
            break;
        }
    }

    let view = engine.view(&records);
    for patient in &view.paginated_patients {
        println!(
            "{:>24}  {:<4} {:<32} {}",
            patient.id,
            patient.initials(),
            patient.display_name(),
            patient.created_at
        );
    }

    if let Some(summary) = view.summary() {
        println!("\n{summary}");
    } else {
        println!("No patients found");
    }

    if !view.pages.is_empty() {
        let strip: Vec<String> = view
            .pages
            .iter()
            .map(|item| match item {
                PageItem::Page(n) if *n == view.current_page => format!("[{n}]"),
                PageItem::Page(n) => n.to_string(),
                PageItem::Ellipsis => "...".to_string(),
            })
            .collect();
        println!("Pages: {}", strip.join(" "));
    }
    if view.has_more {
        println!("More patients available (--load-more)");
    }

    let location = engine.location();
    if !location.is_empty() {
        println!("URL: ?{location}");
    }

    Ok(())
}
