//! リクエスト画面のカウントダウンタイマー。
//!
//! ハンドルがタスクの寿命を所有し、ドロップ時に必ずタスクを止める。

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};
use uuid::Uuid;

/// 1秒ごとに送られるtick。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountdownTick {
    /// 対象リクエストのローカルID。
    pub offer_id: Uuid,
}

/// 実行中のカウントダウンへのハンドル。
#[derive(Debug)]
pub struct Countdown {
    /// tickを送る対象のリクエストID。
    offer_id: Uuid,
    /// tick送信タスク。
    handle: JoinHandle<()>,
}

impl Countdown {
    /// `period` ごとにtickを送るタスクを起動する。
    pub fn start(offer_id: Uuid, tx: mpsc::Sender<CountdownTick>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            // 起動直後ではなく1周期後に最初のtickを送る。
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                // 受信側が閉じたら終了する。
                if tx.send(CountdownTick { offer_id }).await.is_err() {
                    tracing::debug!("countdown receiver closed: {offer_id}");
                    break;
                }
            }
        });
        tracing::debug!("countdown started: {offer_id}");
        Self { offer_id, handle }
    }

    /// 対象リクエストのID。
    pub fn offer_id(&self) -> Uuid {
        self.offer_id
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        // どの終了経路でもタスクを止める。
        self.handle.abort();
        tracing::debug!("countdown released: {}", self.offer_id);
    }
}
