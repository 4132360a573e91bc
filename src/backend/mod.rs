//! Backend-as-a-service data access.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use models::{Profile, TransactionRow, TripRow};

/// REST client for the hosted row store.
pub mod client;
/// In-memory data source used without a configured backend.
pub mod demo;
/// Table row types.
pub mod models;

/// Operations the worker needs from the data store.
#[async_trait]
pub trait RiderBackend: Send + Sync {
    /// Load the rider's profile row, if it exists.
    async fn fetch_profile(&self, rider_id: &str) -> Result<Option<Profile>>;
    /// Update the rider's online flag.
    async fn set_online(&self, rider_id: &str, online: bool) -> Result<()>;
    /// Pending trips, oldest first.
    async fn fetch_pending_trips(&self) -> Result<Vec<TripRow>>;
    /// Claim a pending trip. Returns false when another rider took it first.
    async fn accept_trip(&self, trip_id: &str, rider_id: &str) -> Result<bool>;
    /// Mark the rider's active trip completed with its drop-off location.
    /// Fails when the trip is not active for this rider.
    async fn complete_trip(
        &self,
        trip_id: &str,
        rider_id: &str,
        drop_location: Option<&str>,
    ) -> Result<()>;
    /// The rider's trips, newest first.
    async fn fetch_trips(&self, rider_id: &str) -> Result<Vec<TripRow>>;
    /// The rider's ledger entries, newest first.
    async fn fetch_transactions(&self, rider_id: &str) -> Result<Vec<TransactionRow>>;
    /// Record a pending withdrawal to a mobile money number.
    async fn record_withdrawal(&self, rider_id: &str, amount: f64, momo_number: &str) -> Result<()>;
}

/// Pick the REST backend or the demo data source from config.
pub fn from_config(cfg: &Config) -> Arc<dyn RiderBackend> {
    if cfg.is_demo() {
        tracing::info!("backend: demo data source");
        Arc::new(demo::DemoBackend::seeded(cfg))
    } else {
        tracing::info!("backend: {}", cfg.backend.url);
        Arc::new(client::BackendClient::new(&cfg.backend))
    }
}
