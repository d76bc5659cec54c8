//! loyalty-ledger: line-oriented driver for the loyalty service.
//!
//! Reads one JSON request envelope per line from stdin and writes one JSON
//! response envelope per line to stdout. Logs go to stderr.
//!
//! ## Request
//! ```json
//! {"method": "POST", "path": "/earn", "idempotencyKey": "k-1",
//!  "body": {"customerId": "cust_1", "amountMinor": 250, "currency": "NGN"}}
//! ```
//!
//! ## Configuration
//! ```yaml
//! ledger:
//!   daily_cap: 5000
//!   earn_rate: 100
//!   currency: NGN
//!   timezone: Africa/Lagos
//! idempotency:
//!   ttl_secs: 86400
//! storage:
//!   type: memory
//! ```

use std::sync::Arc;

use tokio::io::BufReader;
use tracing::{error, info};

use loyalty_ledger::clock::{Clock, SystemClock};
use loyalty_ledger::config::Config;
use loyalty_ledger::services::{serve, LoyaltyService};
use loyalty_ledger::storage::init_storage;
use loyalty_ledger::utils::bootstrap::{init_tracing, parse_config_path};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        timezone = %config.ledger.timezone,
        daily_cap = config.ledger.daily_cap,
        currency = %config.ledger.currency,
        "Starting loyalty-ledger"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stores = init_storage(&config.storage, clock.clone());
    let service = LoyaltyService::new(stores, clock, &config)?;

    if let Some(ttl) = config.idempotency.ttl() {
        info!(ttl_secs = ttl.as_secs(), "Idempotency records expire");
    }
    let reaper = service
        .reaper()
        .with_interval(config.idempotency.reap_interval())
        .spawn();

    serve(&service, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    reaper.abort();
    info!("Input closed, shutting down");
    Ok(())
}
