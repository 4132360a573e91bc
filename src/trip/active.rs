//! 進行中トリップ（ステータス遷移 + 処分場選択）。

use chrono::{DateTime, Local};

use crate::session::Session;

use super::{
    disposal::{DisposalError, DisposalPicker, DisposalSite},
    gate::AcceptedTrip,
    stepper::{StepOutcome, TripStatus, TripStepper},
    summary::TripSummary,
};

/// 前進操作の結果。
#[derive(Clone, Debug, PartialEq)]
pub enum TripProgress {
    /// 次のステータスへ進んだ。
    Advanced(TripStatus),
    /// トリップが完了した。
    Completed(TripSummary),
    /// 完了後の呼び出しで何もしなかった。
    Ignored,
}

/// 受諾後のトリップ状態。
#[derive(Clone, Debug)]
pub struct ActiveTrip {
    /// 受諾したトリップ。
    trip: AcceptedTrip,
    /// ステータス遷移。
    stepper: TripStepper,
    /// 処分場の選択。
    disposal: DisposalPicker,
    /// 操作しているライダー名（表示用）。
    rider_name: String,
}

impl ActiveTrip {
    /// 受諾直後の状態（集荷先へ移動中）で開始する。
    pub fn begin(trip: AcceptedTrip, session: &Session, sites: Vec<DisposalSite>) -> Self {
        tracing::info!(
            "active trip started: trip={} rider={}",
            trip.request.trip_id,
            trip.rider_id
        );
        Self {
            trip,
            stepper: TripStepper::new(),
            disposal: DisposalPicker::new(sites),
            rider_name: session.profile.full_name.clone(),
        }
    }

    /// ステータスを1つ進め、最後なら要約を作る。
    pub fn advance(&mut self, now: DateTime<Local>) -> TripProgress {
        match self.stepper.advance() {
            StepOutcome::Advanced(st) => TripProgress::Advanced(st),
            StepOutcome::TripCompleted => TripProgress::Completed(TripSummary::build(
                &self.trip,
                self.disposal.selected(),
                now,
            )),
            StepOutcome::Ignored => TripProgress::Ignored,
        }
    }

    /// 処分場を選択する。ステータスは変化しない。
    pub fn select_site(&mut self, idx: usize) -> Result<&DisposalSite, DisposalError> {
        self.disposal.select(self.stepper.current(), idx)
    }

    /// ナビゲーション先のURL（処分場選択済みならそちら）。
    pub fn navigation_url(&self) -> String {
        match self.disposal.selected() {
            Some(site) => site.directions_url(),
            None => self.trip.request.coordinates.directions_url(),
        }
    }

    /// ナビゲーション先の表示名。
    pub fn destination_label(&self) -> &str {
        self.disposal
            .destination_label(&self.trip.request.pickup_address)
    }

    pub fn trip(&self) -> &AcceptedTrip {
        &self.trip
    }

    pub fn stepper(&self) -> &TripStepper {
        &self.stepper
    }

    pub fn disposal(&self) -> &DisposalPicker {
        &self.disposal
    }

    pub fn rider_name(&self) -> &str {
        &self.rider_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        trip::{disposal::default_sites, request::sample_request},
    };

    fn active() -> ActiveTrip {
        let session = Session::from_config(&Config::default());
        let trip = AcceptedTrip {
            request: sample_request(),
            rider_id: session.rider_id().into(),
            accepted_at: Local::now(),
        };
        ActiveTrip::begin(trip, &session, default_sites())
    }

    #[test]
    fn test_site_chosen_mid_trip_reaches_summary() {
        // 状態2で選んだ処分場が完了時の要約に残る。
        let mut t = active();
        assert!(t.select_site(0).is_err());
        t.advance(Local::now());
        t.advance(Local::now());
        assert_eq!(t.stepper().current(), TripStatus::WasteCollected);
        t.select_site(1).unwrap();
        assert_eq!(t.destination_label(), "Tema Waste Transfer Station");
        // 選択はステータスを動かさない。
        assert_eq!(t.stepper().current(), TripStatus::WasteCollected);
        t.advance(Local::now());
        t.advance(Local::now());
        let TripProgress::Completed(summary) = t.advance(Local::now()) else {
            panic!("expected completion");
        };
        assert_eq!(summary.disposal_site(), Some("Tema Waste Transfer Station"));
        assert_eq!(summary.customer_name, "Kwame Mensah");
    }

    #[test]
    fn test_navigation_targets_pickup_until_site_selected() {
        let mut t = active();
        assert!(t.navigation_url().ends_with("5.5557,-0.1969"));
        t.advance(Local::now());
        t.advance(Local::now());
        t.select_site(0).unwrap();
        assert!(t.navigation_url().ends_with("Kpone%20Landfill%20Site"));
    }
}
