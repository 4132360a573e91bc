//! 着信リクエストの受諾/辞退ゲート。
//!
//! タイマーとキー入力の2つのトリガーがあるが、決定は最初の1回だけ有効。

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::session::Session;

use super::{countdown::Countdown, request::TripRequest};

/// リクエスト提示時の既定の制限時間（秒）。
pub const DEFAULT_COUNTDOWN_SECS: u32 = 15;

/// 受諾済みトリップ。
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptedTrip {
    /// 受諾したリクエスト。
    pub request: TripRequest,
    /// 受諾したライダーのID。
    pub rider_id: String,
    /// 受諾時刻。
    pub accepted_at: DateTime<Local>,
}

/// ゲートの決定結果。どのゲートでも高々1回しか発生しない。
#[derive(Clone, Debug, PartialEq)]
pub enum GateOutcome {
    /// ライダーが受諾した。
    Accepted(AcceptedTrip),
    /// ライダーが辞退した。
    Declined { trip_id: String },
    /// 時間切れで自動辞退した。
    AutoDeclined { trip_id: String },
}

/// 1件のリクエストを提示中のゲート。
#[derive(Debug)]
pub struct RequestGate {
    /// 提示中のリクエスト。
    request: TripRequest,
    /// セッションから受け取ったライダーID。
    rider_id: String,
    /// 制限時間（秒、1以上）。
    total_secs: u32,
    /// 残り秒数。
    seconds_remaining: u32,
    /// 決定済みフラグ（二重発火防止）。
    decided: bool,
    /// 所有しているカウントダウン。
    timer: Option<Countdown>,
}

impl RequestGate {
    /// リクエストを提示し、残り秒数を初期化する。
    pub fn start(request: TripRequest, session: &Session, total_secs: u32) -> Self {
        // 0秒は進捗計算が成り立たないので最低1秒にする。
        let total_secs = total_secs.max(1);
        tracing::info!(
            "request gate started: trip={} secs={}",
            request.trip_id,
            total_secs
        );
        Self {
            request,
            rider_id: session.rider_id().to_string(),
            total_secs,
            seconds_remaining: total_secs,
            decided: false,
            timer: None,
        }
    }

    /// 起動済みのカウントダウンを所有させる。
    pub fn attach_timer(&mut self, timer: Countdown) {
        // 決定後に渡されたタイマーは即座に解放する。
        if !self.decided {
            self.timer = Some(timer);
        }
    }

    /// 1秒経過を反映する。時間切れになった時だけ結果を返す。
    pub fn tick(&mut self) -> Option<GateOutcome> {
        // 決定後のtickは観測されない。
        if self.decided {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining > 0 {
            return None;
        }
        tracing::info!("request auto-declined: trip={}", self.request.trip_id);
        self.decide();
        Some(GateOutcome::AutoDeclined {
            trip_id: self.request.trip_id.clone(),
        })
    }

    /// 受諾する。決定済みなら何もしない。
    pub fn accept(&mut self) -> Option<GateOutcome> {
        if self.decided {
            return None;
        }
        tracing::info!("request accepted: trip={}", self.request.trip_id);
        self.decide();
        Some(GateOutcome::Accepted(AcceptedTrip {
            request: self.request.clone(),
            rider_id: self.rider_id.clone(),
            accepted_at: Local::now(),
        }))
    }

    /// 辞退する。決定済みなら何もしない。
    pub fn decline(&mut self) -> Option<GateOutcome> {
        if self.decided {
            return None;
        }
        tracing::info!("request declined: trip={}", self.request.trip_id);
        self.decide();
        Some(GateOutcome::Declined {
            trip_id: self.request.trip_id.clone(),
        })
    }

    /// 決定済みにしてタイマーを解放する。
    fn decide(&mut self) {
        self.decided = true;
        self.timer = None;
    }

    /// 経過割合（0.0〜1.0）。
    pub fn progress(&self) -> f64 {
        f64::from(self.total_secs - self.seconds_remaining) / f64::from(self.total_secs)
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn is_decided(&self) -> bool {
        self.decided
    }

    /// タイマーが動作中か。
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn request(&self) -> &TripRequest {
        &self.request
    }

    /// このゲート宛てのtickか判定する。
    pub fn owns_offer(&self, offer_id: Uuid) -> bool {
        self.request.offer_id == offer_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, trip::request::sample_request};

    fn gate() -> RequestGate {
        let session = Session::from_config(&Config::default());
        RequestGate::start(sample_request(), &session, DEFAULT_COUNTDOWN_SECS)
    }

    #[test]
    fn test_ticks_count_down_and_auto_decline_only_at_zero() {
        // n回のtick後に残り秒数が15-nで、15回目だけ自動辞退する。
        for n in 0..=15u32 {
            let mut g = gate();
            let mut outcomes = vec![];
            for _ in 0..n {
                outcomes.extend(g.tick());
            }
            assert_eq!(g.seconds_remaining(), 15 - n);
            let auto = outcomes
                .iter()
                .filter(|o| matches!(o, GateOutcome::AutoDeclined { .. }))
                .count();
            assert_eq!(auto, usize::from(n == 15), "n={n}");
        }
    }

    #[test]
    fn test_fifteen_ticks_without_taps_auto_decline_once() {
        // 何もしなければ自動辞退が1回だけ起きる。
        let mut g = gate();
        let outcomes: Vec<_> = (0..20).filter_map(|_| g.tick()).collect();
        assert_eq!(
            outcomes,
            vec![GateOutcome::AutoDeclined {
                trip_id: "trip-1".into()
            }]
        );
        assert!(g.is_decided());
    }

    #[test]
    fn test_accept_at_tick_three_suppresses_timeout() {
        // 3秒目に受諾した後のtickは何も起こさない。
        let mut g = gate();
        for _ in 0..3 {
            assert_eq!(g.tick(), None);
        }
        let Some(GateOutcome::Accepted(trip)) = g.accept() else {
            panic!("expected accepted");
        };
        assert_eq!(trip.request.trip_id, "trip-1");
        assert_eq!(trip.rider_id, Config::default().rider.id);
        for _ in 0..20 {
            assert_eq!(g.tick(), None);
        }
        assert_eq!(g.seconds_remaining(), 12);
    }

    #[test]
    fn test_any_two_triggers_yield_one_outcome() {
        // timeout/accept/declineのどの2つを組み合わせても結果は1つ。
        #[derive(Clone, Copy)]
        enum Trigger {
            Timeout,
            Accept,
            Decline,
        }
        fn fire(g: &mut RequestGate, t: Trigger) -> Option<GateOutcome> {
            match t {
                Trigger::Timeout => (0..15).filter_map(|_| g.tick()).last(),
                Trigger::Accept => g.accept(),
                Trigger::Decline => g.decline(),
            }
        }
        let all = [Trigger::Timeout, Trigger::Accept, Trigger::Decline];
        for a in all {
            for b in all {
                let mut g = gate();
                let count = [fire(&mut g, a), fire(&mut g, b)]
                    .into_iter()
                    .flatten()
                    .count();
                assert_eq!(count, 1);
            }
        }
    }

    #[test]
    fn test_progress_fraction() {
        // 進捗は経過秒数/総秒数。
        let mut g = gate();
        assert_eq!(g.progress(), 0.0);
        for _ in 0..3 {
            g.tick();
        }
        assert!((g.progress() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_zero_total_is_clamped() {
        // 0秒指定でも1秒として扱い、1回のtickで自動辞退する。
        let session = Session::from_config(&Config::default());
        let mut g = RequestGate::start(sample_request(), &session, 0);
        assert_eq!(g.total_secs(), 1);
        assert!(matches!(g.tick(), Some(GateOutcome::AutoDeclined { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decision_releases_timer() {
        // 決定時にタイマーが解放され、tick送信が止まる。
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let mut g = gate();
        let timer = Countdown::start(g.request().offer_id, tx, std::time::Duration::from_secs(1));
        g.attach_timer(timer);
        assert!(g.has_timer());

        let tick = rx.recv().await.unwrap();
        assert!(g.owns_offer(tick.offer_id));
        assert!(g.decline().is_some());
        assert!(!g.has_timer());
        assert!(rx.recv().await.is_none());
    }
}
