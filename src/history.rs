//! トリップ履歴の絞り込み・検索・集計。

use chrono::{DateTime, Duration, Local, Months, NaiveDate, NaiveTime};

use crate::backend::models::{TripRow, TripRowStatus};

/// 画面表示用のトリップ履歴1件。
#[derive(Clone, Debug, PartialEq)]
pub struct TripRecord {
    pub id: String,
    pub customer_name: String,
    pub pickup_location: String,
    pub drop_location: String,
    pub waste_type: String,
    pub fare: f64,
    /// 作成日時（ローカル時刻）。
    pub created_at: DateTime<Local>,
    pub rating: f64,
    pub status: TripRowStatus,
}

impl From<TripRow> for TripRecord {
    fn from(row: TripRow) -> Self {
        // 未設定の項目は表示用の既定値で埋める。
        Self {
            id: row.id,
            customer_name: row.customer_name,
            pickup_location: row.pickup_location,
            drop_location: row.drop_location.unwrap_or_default(),
            waste_type: row.waste_type.unwrap_or_else(|| "General Waste".into()),
            fare: row.fare,
            created_at: row.created_at.with_timezone(&Local),
            rating: row.rating.unwrap_or(0.0),
            status: row.status,
        }
    }
}

impl TripRecord {
    /// 作成日（ローカル日付）。
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// 期間フィルタ。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TripFilter {
    All,
    Today,
    Week,
    Month,
}

impl TripFilter {
    /// 表示名。
    pub fn label(self) -> &'static str {
        match self {
            TripFilter::All => "All",
            TripFilter::Today => "Today",
            TripFilter::Week => "This Week",
            TripFilter::Month => "This Month",
        }
    }

    /// 次のフィルタ（タブ切り替え用）。
    pub fn next(self) -> Self {
        match self {
            TripFilter::All => TripFilter::Today,
            TripFilter::Today => TripFilter::Week,
            TripFilter::Week => TripFilter::Month,
            TripFilter::Month => TripFilter::All,
        }
    }
}

/// 日付が期間内か判定する。
pub fn within_window(date: NaiveDate, filter: TripFilter, today: NaiveDate) -> bool {
    match filter {
        TripFilter::All => true,
        TripFilter::Today => date == today,
        TripFilter::Week => date >= today - Duration::days(7),
        // 月末日の調整はchronoに任せる。
        TripFilter::Month => today
            .checked_sub_months(Months::new(1))
            .is_none_or(|from| date >= from),
    }
}

/// 期間と検索語でトリップを絞り込む。
pub fn filter_trips<'a>(
    trips: &'a [TripRecord],
    filter: TripFilter,
    query: &str,
    today: NaiveDate,
) -> Vec<&'a TripRecord> {
    let query = query.trim().to_lowercase();
    trips
        .iter()
        .filter(|t| within_window(t.date(), filter, today))
        .filter(|t| {
            // 顧客名・集荷先・種類のいずれかに部分一致すれば残す。
            query.is_empty()
                || t.customer_name.to_lowercase().contains(&query)
                || t.pickup_location.to_lowercase().contains(&query)
                || t.waste_type.to_lowercase().contains(&query)
        })
        .collect()
}

/// 運賃の合計。
pub fn total_fare(trips: &[&TripRecord]) -> f64 {
    trips.iter().map(|t| t.fare).sum()
}

/// 日付の表示（Today / Yesterday / 15 Jan 2024）。
pub fn format_day(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".into()
    } else if Some(date) == today.pred_opt() {
        "Yesterday".into()
    } else {
        date.format("%-d %b %Y").to_string()
    }
}

/// ホーム画面の集計値。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RiderStats {
    pub today_earnings: f64,
    pub weekly_earnings: f64,
    pub today_trips: usize,
}

/// 完了トリップから本日分と直近7日分を集計する。
pub fn stats(trips: &[TripRecord], now: DateTime<Local>) -> RiderStats {
    // 本日0時と7日前の境界を求める。
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let week_ago = now - Duration::days(7);
    let completed = trips.iter().filter(|t| t.status == TripRowStatus::Completed);

    let mut s = RiderStats::default();
    for t in completed {
        if t.created_at.naive_local() >= midnight {
            s.today_earnings += t.fare;
            s.today_trips += 1;
        }
        if t.created_at >= week_ago {
            s.weekly_earnings += t.fare;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).single().unwrap()
    }

    fn trip(id: &str, name: &str, waste: &str, fare: f64, created: DateTime<Local>) -> TripRecord {
        TripRecord {
            id: id.into(),
            customer_name: name.into(),
            pickup_location: "Osu Oxford Street, Accra".into(),
            drop_location: "Kpone Landfill Site".into(),
            waste_type: waste.into(),
            fare,
            created_at: created,
            rating: 5.0,
            status: TripRowStatus::Completed,
        }
    }

    fn sample() -> Vec<TripRecord> {
        vec![
            trip("1", "Kwame Mensah", "General Waste", 25.0, at(2024, 1, 15, 14)),
            trip("2", "Ama Serwaa", "Recyclables", 32.0, at(2024, 1, 14, 12)),
            trip("3", "Kofi Boateng", "Organic Waste", 18.5, at(2024, 1, 9, 10)),
            trip("4", "Efua Owusu", "General Waste", 28.0, at(2023, 12, 20, 16)),
            trip("5", "Yaw Asante", "E-Waste", 22.5, at(2023, 11, 1, 9)),
        ]
    }

    fn ids(v: &[&TripRecord]) -> Vec<String> {
        v.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_date_windows() {
        // 期間フィルタごとの包含範囲を検証する。
        let trips = sample();
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(ids(&filter_trips(&trips, TripFilter::All, "", today)).len(), 5);
        assert_eq!(ids(&filter_trips(&trips, TripFilter::Today, "", today)), vec!["1"]);
        assert_eq!(
            ids(&filter_trips(&trips, TripFilter::Week, "", today)),
            vec!["1", "2", "3"]
        );
        assert_eq!(
            ids(&filter_trips(&trips, TripFilter::Month, "", today)),
            vec!["1", "2", "3", "4"]
        );
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        // 名前・種類のどちらでも大小無視で一致する。
        let trips = sample();
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(ids(&filter_trips(&trips, TripFilter::All, "ama", today)), vec!["2"]);
        assert_eq!(
            ids(&filter_trips(&trips, TripFilter::All, "GENERAL", today)),
            vec!["1", "4"]
        );
        assert!(filter_trips(&trips, TripFilter::All, "lagos", today).is_empty());
    }

    #[test]
    fn test_total_of_filtered_trips() {
        let trips = sample();
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let week = filter_trips(&trips, TripFilter::Week, "", today);
        assert!((total_fare(&week) - 75.5).abs() < 1e-9);
    }

    #[test]
    fn test_format_day_labels() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(format_day(today, today), "Today");
        assert_eq!(format_day(NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(), today), "Yesterday");
        assert_eq!(format_day(NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(), today), "9 Jan 2024");
    }

    #[test]
    fn test_stats_count_completed_trips_only() {
        // 完了以外のトリップは集計しない。
        let mut trips = sample();
        let mut cancelled = trip("6", "Abena", "General Waste", 99.0, at(2024, 1, 15, 9));
        cancelled.status = TripRowStatus::Cancelled;
        trips.push(cancelled);
        let s = stats(&trips, at(2024, 1, 15, 18));
        assert_eq!(s.today_trips, 1);
        assert!((s.today_earnings - 25.0).abs() < 1e-9);
        assert!((s.weekly_earnings - 75.5).abs() < 1e-9);
    }
}
