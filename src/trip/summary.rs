//! トリップ完了画面の集計。

use chrono::{DateTime, Local};

use super::{disposal::DisposalSite, gate::AcceptedTrip};

/// 完了したトリップの要約。
#[derive(Clone, Debug, PartialEq)]
pub struct TripSummary {
    pub trip_id: String,
    pub customer_name: String,
    pub pickup_address: String,
    /// 選択した処分場名。
    pub drop_location: Option<String>,
    pub waste_type: String,
    pub distance_km: f64,
    /// 運賃（見積運賃をそのまま使い、クライアントでは計算しない）。
    pub fare: f64,
    /// 受諾から完了までの分数（最低1分）。
    pub duration_mins: i64,
    pub completed_at: DateTime<Local>,
}

impl TripSummary {
    /// 受諾情報と選択した処分場から要約を作る。
    pub fn build(
        trip: &AcceptedTrip,
        site: Option<&DisposalSite>,
        completed_at: DateTime<Local>,
    ) -> Self {
        let req = &trip.request;
        // 端数は切り上げず、1分未満は1分とする。
        let duration_mins = (completed_at - trip.accepted_at).num_minutes().max(1);
        Self {
            trip_id: req.trip_id.clone(),
            customer_name: req.customer_name.clone(),
            pickup_address: req.pickup_address.clone(),
            drop_location: site.map(|s| s.name.clone()),
            waste_type: req.waste_type.clone(),
            distance_km: req.distance_km,
            fare: req.estimated_fare,
            duration_mins,
            completed_at,
        }
    }

    /// 所要時間の表示文字列。
    pub fn duration_label(&self) -> String {
        format!("{} mins", self.duration_mins)
    }

    /// 選択した処分場（未選択ならNone）。
    pub fn disposal_site(&self) -> Option<&str> {
        self.drop_location.as_deref()
    }

    /// 画面表示用の処分場名。
    pub fn drop_off_label(&self) -> &str {
        self.disposal_site().unwrap_or("Not selected")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trip::{disposal::default_sites, request::sample_request};
    use chrono::Duration;

    fn accepted(at: DateTime<Local>) -> AcceptedTrip {
        AcceptedTrip {
            request: sample_request(),
            rider_id: "rider-1".into(),
            accepted_at: at,
        }
    }

    #[test]
    fn test_summary_uses_selected_site_and_duration() {
        let start = Local::now();
        let sites = default_sites();
        let end = start + Duration::minutes(28);
        let s = TripSummary::build(&accepted(start), Some(&sites[0]), end);
        assert_eq!(s.disposal_site(), Some("Kpone Landfill Site"));
        assert_eq!(s.drop_off_label(), "Kpone Landfill Site");
        assert_eq!(s.duration_label(), "28 mins");
        assert_eq!(s.fare, 25.0);
    }

    #[test]
    fn test_summary_without_site_and_short_trip() {
        let start = Local::now();
        let s = TripSummary::build(&accepted(start), None, start + Duration::seconds(20));
        assert_eq!(s.drop_off_label(), "Not selected");
        assert_eq!(s.disposal_site(), None);
        assert_eq!(s.duration_mins, 1);
    }

    #[test]
    fn test_site_named_like_placeholder_is_still_sent() {
        // 設定で追加した処分場名がプレースホルダと同じでも選択として扱う。
        let start = Local::now();
        let mut site = default_sites()[0].clone();
        site.name = "Not selected".into();
        let s = TripSummary::build(&accepted(start), Some(&site), start);
        assert_eq!(s.disposal_site(), Some("Not selected"));
    }
}
