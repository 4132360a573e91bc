//! Background worker handling backend calls for the UI.

use anyhow::Result;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::mpsc;

use crate::{
    backend::{self, RiderBackend, models::Profile},
    config::Config,
    earnings::TxRecord,
    history::TripRecord,
    trip::request::TripRequest,
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Apply updated settings (rebuilds the backend if it changed).
    SaveSettings(Config),
    /// Load the rider profile.
    LoadProfile,
    /// Go online or offline.
    SetOnline(bool),
    /// Look for the next pending request.
    FetchOffer,
    /// Claim the offered trip.
    AcceptOffer { trip_id: String, rider_id: String },
    /// Skip the offered trip for the rest of this run.
    DeclineOffer { trip_id: String },
    /// Close out a finished trip.
    CompleteTrip {
        trip_id: String,
        drop_location: Option<String>,
    },
    /// Reload trip history.
    RefreshTrips,
    /// Reload the earnings ledger.
    RefreshTransactions,
    /// Request a payout to mobile money.
    RequestWithdrawal { amount: f64, momo_number: String },
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    /// Profile row loaded.
    ProfileLoaded(Profile),
    /// Online flag stored.
    OnlineChanged(bool),
    /// A pending request to show in the request gate.
    Offer(TripRequest),
    /// Nothing to offer right now.
    NoOffer,
    /// The accepted trip was taken by another rider.
    OfferLost { trip_id: String },
    /// The claim could not be confirmed (network or server error).
    AcceptFailed { trip_id: String, reason: String },
    /// Trip history loaded.
    TripsLoaded(Vec<TripRecord>),
    /// Earnings ledger loaded.
    TransactionsLoaded(Vec<TxRecord>),
    /// Withdrawal stored as pending.
    WithdrawalRecorded { amount: f64 },
    /// Informational log message.
    Log(String),
    /// User-visible error message.
    Error(String),
}

/// Worker state owned by the background task.
pub struct Worker {
    cfg: Config,
    backend: Arc<dyn RiderBackend>,
    /// Trips this rider declined; never offered again during the run.
    declined: HashSet<String>,
    tx: mpsc::Sender<WorkerEvent>,
}

/// Main worker loop: handle commands sequentially until the UI hangs up.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    cfg: Config,
    backend: Arc<dyn RiderBackend>,
) {
    tracing::info!("worker started");
    let mut worker = Worker::new(cfg, backend, tx.clone());

    // Process commands one at a time to keep state consistent.
    while let Some(cmd) = rx.recv().await {
        let label = format!("{cmd:?}");
        if let Err(e) = worker.handle(cmd).await {
            tracing::error!("worker command failed: {label}: {e}");
            let _ = tx.send(WorkerEvent::Error(e.to_string())).await;
        }
    }
    tracing::info!("worker stopped");
}

impl Worker {
    pub fn new(cfg: Config, backend: Arc<dyn RiderBackend>, tx: mpsc::Sender<WorkerEvent>) -> Self {
        Self {
            cfg,
            backend,
            declined: HashSet::new(),
            tx,
        }
    }

    async fn emit(&self, ev: WorkerEvent) {
        let _ = self.tx.send(ev).await;
    }

    /// Execute one command.
    pub async fn handle(&mut self, cmd: WorkerCmd) -> Result<()> {
        let rider_id = self.cfg.rider.id.clone();
        match cmd {
            WorkerCmd::SaveSettings(new_cfg) => {
                tracing::info!("settings updated");
                let backend_changed = new_cfg.backend.url != self.cfg.backend.url
                    || new_cfg.backend.anon_key != self.cfg.backend.anon_key
                    || new_cfg.backend.access_token != self.cfg.backend.access_token;
                if backend_changed {
                    self.backend = backend::from_config(&new_cfg);
                    self.declined.clear();
                }
                self.cfg = new_cfg;
                self.emit(WorkerEvent::Log("settings updated".into())).await;
            }

            WorkerCmd::LoadProfile => match self.backend.fetch_profile(&rider_id).await? {
                Some(p) => self.emit(WorkerEvent::ProfileLoaded(p)).await,
                None => {
                    tracing::warn!("profile not found: {rider_id}");
                    self.emit(WorkerEvent::Log(format!("profile {rider_id} not found")))
                        .await;
                }
            },

            WorkerCmd::SetOnline(online) => {
                self.backend.set_online(&rider_id, online).await?;
                tracing::info!("online status: {online}");
                self.emit(WorkerEvent::OnlineChanged(online)).await;
            }

            WorkerCmd::FetchOffer => {
                let offer = self.next_offer().await?;
                match offer {
                    Some(req) => {
                        tracing::info!("offer found: {}", req.trip_id);
                        self.emit(WorkerEvent::Offer(req)).await;
                    }
                    None => self.emit(WorkerEvent::NoOffer).await,
                }
            }

            WorkerCmd::AcceptOffer { trip_id, rider_id } => {
                match self.backend.accept_trip(&trip_id, &rider_id).await {
                    Ok(true) => {
                        tracing::info!("trip claimed: {trip_id}");
                        self.emit(WorkerEvent::Log(format!("trip {trip_id} accepted")))
                            .await;
                    }
                    Ok(false) => {
                        tracing::warn!("trip already taken: {trip_id}");
                        self.emit(WorkerEvent::OfferLost { trip_id }).await;
                    }
                    Err(e) => {
                        // 受諾が確定していないので、UI側でトリップを破棄させる。
                        tracing::error!("accept failed: {trip_id}: {e}");
                        let reason = e.to_string();
                        self.emit(WorkerEvent::AcceptFailed { trip_id, reason }).await;
                    }
                }
            }

            WorkerCmd::DeclineOffer { trip_id } => {
                tracing::info!("trip declined: {trip_id}");
                self.declined.insert(trip_id);
            }

            WorkerCmd::CompleteTrip {
                trip_id,
                drop_location,
            } => {
                self.backend
                    .complete_trip(&trip_id, &rider_id, drop_location.as_deref())
                    .await?;
                tracing::info!("trip completed: {trip_id}");
                // History and balance both change when a trip closes.
                self.refresh_trips(&rider_id).await?;
                self.refresh_transactions(&rider_id).await?;
            }

            WorkerCmd::RefreshTrips => self.refresh_trips(&rider_id).await?,

            WorkerCmd::RefreshTransactions => self.refresh_transactions(&rider_id).await?,

            WorkerCmd::RequestWithdrawal {
                amount,
                momo_number,
            } => {
                self.backend
                    .record_withdrawal(&rider_id, amount, &momo_number)
                    .await?;
                tracing::info!("withdrawal recorded: {amount:.2}");
                self.emit(WorkerEvent::WithdrawalRecorded { amount }).await;
                self.refresh_transactions(&rider_id).await?;
            }
        }
        Ok(())
    }

    /// First pending trip that was not declined and can be dispatched.
    async fn next_offer(&self) -> Result<Option<TripRequest>> {
        let rows = self.backend.fetch_pending_trips().await?;
        for row in rows {
            if self.declined.contains(&row.id) {
                continue;
            }
            match TripRequest::try_from(row) {
                Ok(req) => return Ok(Some(req)),
                Err(e) => tracing::warn!("skipping trip: {e}"),
            }
        }
        Ok(None)
    }

    async fn refresh_trips(&self, rider_id: &str) -> Result<()> {
        let rows = self.backend.fetch_trips(rider_id).await?;
        tracing::info!("trips loaded: {}", rows.len());
        let trips = rows.into_iter().map(TripRecord::from).collect();
        self.emit(WorkerEvent::TripsLoaded(trips)).await;
        Ok(())
    }

    async fn refresh_transactions(&self, rider_id: &str) -> Result<()> {
        let rows = self.backend.fetch_transactions(rider_id).await?;
        tracing::info!("transactions loaded: {}", rows.len());
        let txs = rows.into_iter().map(TxRecord::from).collect();
        self.emit(WorkerEvent::TransactionsLoaded(txs)).await;
        Ok(())
    }
}
