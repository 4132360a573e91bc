//! In-memory data source for running without a backend.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::{
    RiderBackend,
    models::{Profile, TransactionKind, TransactionRow, TransactionStatus, TripRow, TripRowStatus},
};
use crate::config::Config;

/// Mutable demo tables.
#[derive(Debug)]
struct DemoTables {
    profile: Profile,
    trips: Vec<TripRow>,
    transactions: Vec<TransactionRow>,
    /// Counter for generated row ids.
    next_id: u32,
}

/// Demo backend seeded with a small Accra data set.
#[derive(Debug)]
pub struct DemoBackend {
    tables: Mutex<DemoTables>,
}

#[allow(clippy::too_many_arguments)]
fn trip(
    id: &str,
    customer: &str,
    pickup: &str,
    waste: &str,
    fare: f64,
    status: TripRowStatus,
    created_at: DateTime<Utc>,
    coords: Option<(f64, f64, f64)>,
) -> TripRow {
    TripRow {
        id: id.into(),
        user_id: None,
        customer_name: customer.into(),
        pickup_location: pickup.into(),
        drop_location: None,
        waste_type: Some(waste.into()),
        fare,
        status,
        rating: None,
        created_at,
        pickup_time: None,
        completed_at: None,
        pickup_lat: coords.map(|c| c.0),
        pickup_lng: coords.map(|c| c.1),
        distance_km: coords.map(|c| c.2),
    }
}

fn ledger(
    id: &str,
    kind: TransactionKind,
    amount: f64,
    desc: &str,
    created_at: DateTime<Utc>,
) -> TransactionRow {
    TransactionRow {
        id: id.into(),
        user_id: None,
        kind,
        amount,
        description: Some(desc.into()),
        status: TransactionStatus::Completed,
        created_at,
    }
}

/// Completed history: id, customer, pickup, waste type, fare, hours ago.
const HISTORY: [(&str, &str, &str, &str, f64, i64); 5] = [
    ("TRP-001", "Kwame Mensah", "Madina Market, Accra", "General Waste", 25.5, 2),
    ("TRP-002", "Akosua Darko", "East Legon Residential Area", "Recyclables", 32.0, 4),
    ("TRP-003", "Kofi Boateng", "Osu Oxford Street", "General Waste", 18.5, 30),
    ("TRP-004", "Efua Owusu", "Tema Community 1", "Organic Waste", 28.0, 24 * 5),
    ("TRP-005", "Yaw Asante", "Spintex Road", "General Waste", 22.5, 24 * 20),
];

/// Ledger: id, kind, amount, description, hours ago.
const LEDGER: [(&str, TransactionKind, f64, &str, i64); 8] = [
    ("TX-001", TransactionKind::Earning, 25.5, "Trip to Madina Market", 2),
    ("TX-002", TransactionKind::Earning, 32.0, "Trip to East Legon", 4),
    ("TX-003", TransactionKind::Bonus, 15.0, "Peak hour bonus", 5),
    ("TX-004", TransactionKind::Earning, 18.5, "Trip to Osu Oxford Street", 30),
    ("TX-005", TransactionKind::Earning, 28.0, "Trip to Tema Community 1", 24 * 5),
    ("TX-006", TransactionKind::Withdrawal, 50.0, "Withdrawal to MoMo", 24 * 6),
    ("TX-007", TransactionKind::Earning, 22.5, "Trip to Spintex Road", 24 * 20),
    ("TX-008", TransactionKind::Earning, 420.0, "Weekly settlement", 24 * 25),
];

impl DemoBackend {
    /// Seed the tables relative to the current time.
    pub fn seeded(cfg: &Config) -> Self {
        Self::seeded_at(cfg, Utc::now())
    }

    fn seeded_at(cfg: &Config, now: DateTime<Utc>) -> Self {
        let rider = cfg.rider.id.clone();

        let mut trips: Vec<TripRow> = HISTORY
            .iter()
            .map(|&(id, customer, pickup, waste, fare, hours)| {
                let mut t = trip(
                    id,
                    customer,
                    pickup,
                    waste,
                    fare,
                    TripRowStatus::Completed,
                    now - Duration::hours(hours),
                    None,
                );
                t.user_id = Some(rider.clone());
                t.drop_location = Some("Kpone Landfill Site".into());
                t.rating = Some(5.0);
                t.completed_at = Some(t.created_at + Duration::minutes(28));
                t
            })
            .collect();
        // Offers waiting for a rider.
        trips.push(trip(
            "REQ-2024-156",
            "Ama Serwaa",
            "House No. 45, Dzorwulu, Accra",
            "General Waste",
            28.5,
            TripRowStatus::Pending,
            now - Duration::minutes(3),
            Some((5.6037, -0.1870, 3.2)),
        ));
        trips.push(trip(
            "REQ-2024-157",
            "Kwame Mensah",
            "Osu Oxford Street, Accra",
            "General Waste",
            25.0,
            TripRowStatus::Pending,
            now - Duration::minutes(1),
            Some((5.5557, -0.1969, 2.3)),
        ));

        let mut transactions: Vec<TransactionRow> = LEDGER
            .iter()
            .map(|&(id, kind, amount, desc, hours)| {
                ledger(id, kind, amount, desc, now - Duration::hours(hours))
            })
            .collect();
        for t in &mut transactions {
            t.user_id = Some(rider.clone());
        }

        Self {
            tables: Mutex::new(DemoTables {
                profile: Profile {
                    id: rider,
                    email: None,
                    full_name: Some(cfg.rider.full_name.clone()),
                    avatar_url: None,
                    phone: Some("+233 24 123 4567".into()),
                    rating: 4.8,
                    is_online: false,
                },
                trips,
                transactions,
                next_id: 100,
            }),
        }
    }
}

#[async_trait]
impl RiderBackend for DemoBackend {
    async fn fetch_profile(&self, rider_id: &str) -> Result<Option<Profile>> {
        let t = self.tables.lock().await;
        Ok((t.profile.id == rider_id).then(|| t.profile.clone()))
    }

    async fn set_online(&self, rider_id: &str, online: bool) -> Result<()> {
        let mut t = self.tables.lock().await;
        if t.profile.id != rider_id {
            return Err(anyhow!("unknown rider {rider_id}"));
        }
        t.profile.is_online = online;
        Ok(())
    }

    async fn fetch_pending_trips(&self) -> Result<Vec<TripRow>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<_> = t
            .trips
            .iter()
            .filter(|r| r.status == TripRowStatus::Pending)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn accept_trip(&self, trip_id: &str, rider_id: &str) -> Result<bool> {
        let mut t = self.tables.lock().await;
        let Some(row) = t
            .trips
            .iter_mut()
            .find(|r| r.id == trip_id && r.status == TripRowStatus::Pending)
        else {
            return Ok(false);
        };
        row.status = TripRowStatus::Active;
        row.user_id = Some(rider_id.into());
        row.pickup_time = Some(Utc::now());
        Ok(true)
    }

    async fn complete_trip(
        &self,
        trip_id: &str,
        rider_id: &str,
        drop_location: Option<&str>,
    ) -> Result<()> {
        let mut t = self.tables.lock().await;
        let tables = &mut *t;
        let row = tables
            .trips
            .iter_mut()
            .find(|r| {
                r.id == trip_id
                    && r.status == TripRowStatus::Active
                    && r.user_id.as_deref() == Some(rider_id)
            })
            .ok_or_else(|| anyhow!("trip {trip_id} is not active for rider {rider_id}"))?;
        row.status = TripRowStatus::Completed;
        row.completed_at = Some(Utc::now());
        row.drop_location = drop_location.map(str::to_string);

        // The completed fare lands in the ledger as an earning.
        tables.next_id += 1;
        let earning = TransactionRow {
            id: format!("TX-{}", tables.next_id),
            user_id: row.user_id.clone(),
            kind: TransactionKind::Earning,
            amount: row.fare,
            description: Some(format!("Trip to {}", row.pickup_location)),
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        };
        tables.transactions.insert(0, earning);
        Ok(())
    }

    async fn fetch_trips(&self, rider_id: &str) -> Result<Vec<TripRow>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<_> = t
            .trips
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(rider_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn fetch_transactions(&self, rider_id: &str) -> Result<Vec<TransactionRow>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<_> = t
            .transactions
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(rider_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn record_withdrawal(
        &self,
        rider_id: &str,
        amount: f64,
        momo_number: &str,
    ) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.next_id += 1;
        let row = TransactionRow {
            id: format!("TX-{}", t.next_id),
            user_id: Some(rider_id.into()),
            kind: TransactionKind::Withdrawal,
            amount,
            description: Some(format!("Withdrawal to MoMo {momo_number}")),
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        };
        t.transactions.insert(0, row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> (DemoBackend, String) {
        let cfg = Config::default();
        (DemoBackend::seeded(&cfg), cfg.rider.id)
    }

    #[tokio::test]
    async fn test_second_accept_loses_the_race() {
        // 同じトリップを2回受諾すると2回目は失敗する。
        let (b, rider) = demo();
        let pending = b.fetch_pending_trips().await.unwrap();
        assert_eq!(pending[0].id, "REQ-2024-156");
        assert!(b.accept_trip(&pending[0].id, &rider).await.unwrap());
        assert!(!b.accept_trip(&pending[0].id, "other").await.unwrap());
        assert_eq!(b.fetch_pending_trips().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_completion_adds_trip_and_earning() {
        let (b, rider) = demo();
        let before = b.fetch_transactions(&rider).await.unwrap().len();
        assert!(b.accept_trip("REQ-2024-157", &rider).await.unwrap());
        b.complete_trip("REQ-2024-157", &rider, Some("Kpone Landfill Site"))
            .await
            .unwrap();

        let trips = b.fetch_trips(&rider).await.unwrap();
        let done = trips.iter().find(|t| t.id == "REQ-2024-157").unwrap();
        assert_eq!(done.status, TripRowStatus::Completed);
        assert_eq!(done.drop_location.as_deref(), Some("Kpone Landfill Site"));

        let txs = b.fetch_transactions(&rider).await.unwrap();
        assert_eq!(txs.len(), before + 1);
        assert_eq!(txs[0].amount, 25.0);
    }

    #[tokio::test]
    async fn test_completion_requires_own_active_trip() {
        let (b, rider) = demo();
        // 未受諾のトリップは完了できない。
        assert!(b.complete_trip("REQ-2024-157", &rider, None).await.is_err());
        assert!(b.accept_trip("REQ-2024-157", "other").await.unwrap());
        assert!(b.complete_trip("REQ-2024-157", &rider, None).await.is_err());
        assert_eq!(b.fetch_pending_trips().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_withdrawal_is_pending() {
        let (b, rider) = demo();
        b.record_withdrawal(&rider, 60.0, "0501234567").await.unwrap();
        let txs = b.fetch_transactions(&rider).await.unwrap();
        assert_eq!(txs[0].kind, TransactionKind::Withdrawal);
        assert_eq!(txs[0].status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_online_flag_round_trip() {
        let (b, rider) = demo();
        b.set_online(&rider, true).await.unwrap();
        assert!(b.fetch_profile(&rider).await.unwrap().unwrap().is_online);
        assert!(b.set_online("nobody", true).await.is_err());
    }
}
