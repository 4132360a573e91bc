//! 着信した集荷リクエストのモデル。

use thiserror::Error;
use uuid::Uuid;

use crate::backend::models::{TripRow, TripRowStatus};

/// 集荷地点の座標。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// 地図アプリの経路案内URL。
    pub fn directions_url(&self) -> String {
        format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            self.lat, self.lng
        )
    }
}

/// ライダーへ提示する1件の集荷リクエスト。
#[derive(Clone, Debug, PartialEq)]
pub struct TripRequest {
    /// カウントダウンのtickと照合するローカルID。
    pub offer_id: Uuid,
    /// バックエンド上のトリップID。
    pub trip_id: String,
    /// 顧客名。
    pub customer_name: String,
    /// 集荷先住所。
    pub pickup_address: String,
    /// 廃棄物の種類。
    pub waste_type: String,
    /// 見積運賃（GH₵）。
    pub estimated_fare: f64,
    /// 集荷先までの距離（km）。
    pub distance_km: f64,
    /// 集荷先の座標。
    pub coordinates: GeoPoint,
}

/// トリップ行をリクエストにできない理由。
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("trip {0} is not pending")]
    NotPending(String),
    #[error("trip {0} has no pickup coordinates")]
    MissingCoordinates(String),
}

impl TryFrom<TripRow> for TripRequest {
    type Error = RequestError;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        // 受付待ちの行だけを提示対象にする。
        if row.status != TripRowStatus::Pending {
            return Err(RequestError::NotPending(row.id));
        }
        // 座標が揃っていない行は経路案内できないので除外する。
        let (Some(lat), Some(lng)) = (row.pickup_lat, row.pickup_lng) else {
            return Err(RequestError::MissingCoordinates(row.id));
        };
        Ok(Self {
            offer_id: Uuid::new_v4(),
            trip_id: row.id,
            customer_name: row.customer_name,
            pickup_address: row.pickup_location,
            waste_type: row.waste_type.unwrap_or_else(|| "General Waste".into()),
            estimated_fare: row.fare,
            distance_km: row.distance_km.unwrap_or_default(),
            coordinates: GeoPoint { lat, lng },
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_request() -> TripRequest {
    TripRequest {
        offer_id: Uuid::new_v4(),
        trip_id: "trip-1".into(),
        customer_name: "Kwame Mensah".into(),
        pickup_address: "Osu Oxford Street, Accra".into(),
        waste_type: "General Waste".into(),
        estimated_fare: 25.0,
        distance_km: 2.3,
        coordinates: GeoPoint {
            lat: 5.5557,
            lng: -0.1969,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(status: TripRowStatus, coords: Option<(f64, f64)>) -> TripRow {
        TripRow {
            id: "trip-9".into(),
            user_id: None,
            customer_name: "Ama Serwaa".into(),
            pickup_location: "House No. 45, Dzorwulu, Accra".into(),
            drop_location: None,
            waste_type: None,
            fare: 28.5,
            status,
            rating: None,
            created_at: Utc::now(),
            pickup_time: None,
            completed_at: None,
            pickup_lat: coords.map(|c| c.0),
            pickup_lng: coords.map(|c| c.1),
            distance_km: Some(3.2),
        }
    }

    #[test]
    fn test_pending_row_becomes_request() {
        // 座標付きの受付待ち行はリクエストに変換できる。
        let req =
            TripRequest::try_from(row(TripRowStatus::Pending, Some((5.6037, -0.1870)))).unwrap();
        assert_eq!(req.trip_id, "trip-9");
        assert_eq!(req.waste_type, "General Waste");
        assert_eq!(req.distance_km, 3.2);
        assert_eq!(
            req.coordinates.directions_url(),
            "https://www.google.com/maps/dir/?api=1&destination=5.6037,-0.187"
        );
    }

    #[test]
    fn test_row_without_coordinates_is_rejected() {
        // 座標の無い行は除外される。
        let err = TripRequest::try_from(row(TripRowStatus::Pending, None)).unwrap_err();
        assert_eq!(err, RequestError::MissingCoordinates("trip-9".into()));
    }

    #[test]
    fn test_non_pending_row_is_rejected() {
        // 受付済みの行は提示しない。
        let err = TripRequest::try_from(row(TripRowStatus::Active, Some((1.0, 1.0)))).unwrap_err();
        assert_eq!(err, RequestError::NotPending("trip-9".into()));
    }
}
