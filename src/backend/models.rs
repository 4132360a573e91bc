//! Row types for the `profiles`, `trips` and `transactions` tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `profiles` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub is_online: bool,
}

/// Lifecycle status stored on a trip row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripRowStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

/// A row of the `trips` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub customer_name: String,
    pub pickup_location: String,
    #[serde(default)]
    pub drop_location: Option<String>,
    #[serde(default)]
    pub waste_type: Option<String>,
    pub fare: f64,
    pub status: TripRowStatus,
    #[serde(default)]
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pickup_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Offer geometry; rows without coordinates cannot be dispatched.
    #[serde(default)]
    pub pickup_lat: Option<f64>,
    #[serde(default)]
    pub pickup_lng: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

/// Kind of ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Earning,
    Withdrawal,
    Bonus,
}

/// Settlement status of a ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

/// A row of the `transactions` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a withdrawal request.
#[derive(Clone, Debug, Serialize)]
pub struct NewWithdrawal<'a> {
    pub user_id: &'a str,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub status: TransactionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_row_parses_without_optional_columns() {
        let json = r#"{
            "id": "t1",
            "customer_name": "Kwame Mensah",
            "pickup_location": "Osu Oxford Street, Accra",
            "fare": 25.0,
            "status": "pending",
            "created_at": "2024-01-15T14:30:00+00:00"
        }"#;
        let row: TripRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.status, TripRowStatus::Pending);
        assert_eq!(row.waste_type, None);
        assert_eq!(row.pickup_lat, None);
    }

    #[test]
    fn test_transaction_row_reads_type_column() {
        let json = r#"{
            "id": "x1",
            "type": "bonus",
            "amount": 15.0,
            "status": "completed",
            "created_at": "2024-01-15T14:00:00Z"
        }"#;
        let row: TransactionRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.kind, TransactionKind::Bonus);
        assert_eq!(row.description, None);
    }
}
