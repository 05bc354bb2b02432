//! Admin JSON API for the property back end.
//!
//! Exposes the entity store, spreadsheet sync, invoice delivery and
//! notification broadcasts over HTTP.

mod config;
mod error;
mod response;
mod routes;
mod state;

use std::sync::Arc;

use broadcaster::Broadcaster;
use database::Database;
use invoicing::{InvoiceSender, MemoryTrackingCache, MessageDispatcher, SpreadsheetSource};
use sheet_source::{SheetsClient, SheetsConfig};
use tower_http::trace::TraceLayer;
use tracing::info;
use zns_client::{ZnsClient, ZnsConfig};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("admin_web=info".parse()?)
                .add_directive("invoicing=info".parse()?)
                .add_directive("broadcaster=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting admin API");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let sheets = SheetsClient::new(SheetsConfig::with_base_url(
        &config.sheets_api_url,
        config.sheets_auth.clone(),
    ))?;
    let zns: Arc<dyn MessageDispatcher> = Arc::new(ZnsClient::new(ZnsConfig::with_base_url(
        &config.zns_api_url,
        &config.zns_access_token,
    ))?);

    let sender = InvoiceSender::new(db.clone(), zns.clone(), Arc::new(MemoryTrackingCache::new()))
        .with_template_id(&config.invoice_template_id);
    let broadcaster = Broadcaster::new(db.clone(), zns, &config.notification_template_id);

    let source: Arc<dyn SpreadsheetSource> = Arc::new(sheets);
    let state = AppState::new(db, source, sender, broadcaster)
        .with_default_spreadsheet(config.default_spreadsheet_id.clone());

    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(addr = %config.addr, "Admin API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
