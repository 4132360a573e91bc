//! 画面遷移用のUI状態と画面種別。

use std::time::{Duration, Instant};

/// TUIで現在表示中の画面。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// オンライン切替と本日の集計。
    Home,
    /// 着信リクエストのカウントダウン画面。
    Request,
    /// 進行中トリップのステッパー画面。
    ActiveTrip,
    /// トリップ完了の要約画面。
    TripComplete,
    /// トリップ履歴。
    Trips,
    /// 収益と出金。
    Earnings,
    /// 設定編集画面。
    Settings,
    /// 初期設定ウィザード画面。
    InitialSetup,
}

impl Screen {
    /// ステータスバー用の短い名前。
    pub fn name(self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Request => "Request",
            Screen::ActiveTrip => "Trip",
            Screen::TripComplete => "Complete",
            Screen::Trips => "Trips",
            Screen::Earnings => "Earnings",
            Screen::Settings => "Settings",
            Screen::InitialSetup => "Setup",
        }
    }
}

/// 一定時間だけ表示する通知。
#[derive(Clone, Debug)]
pub struct Notice {
    pub message: String,
    expires_at: Instant,
}

impl Notice {
    pub fn new(message: impl Into<String>, ttl: Duration, now: Instant) -> Self {
        Self {
            message: message.into(),
            expires_at: now + ttl,
        }
    }

    /// 表示期限内か。
    pub fn is_active(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// 描画側と共有するUI状態。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 現在の画面。
    pub screen: Screen,
    /// リスト系画面の選択行。
    pub selected: usize,
    /// 右側パネルに表示するログ。
    pub log: Vec<String>,
    /// 画面下部のステータス文言。
    pub status: String,
    /// エラーメッセージ（強調表示用）。
    pub error: Option<String>,
    /// 一時通知（処分場選択やオンライン化など）。
    pub notice: Option<Notice>,
    /// オンライン化の確認待ち（y/n）。
    pub confirm_online: bool,
}

impl UiState {
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            selected: 0,
            log: vec![],
            status: "Ready".into(),
            error: None,
            notice: None,
            confirm_online: false,
        }
    }

    /// 通知を表示する。
    pub fn notify(&mut self, message: impl Into<String>, ttl: Duration) {
        self.notice = Some(Notice::new(message, ttl, Instant::now()));
    }

    /// 期限切れの通知を消す。
    pub fn expire_notice(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| !n.is_active(now)) {
            self.notice = None;
        }
    }
}
