//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;

use anyhow::Result;
use chrono::Local;
use crossterm::event::{self, Event};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use crate::{
    backend,
    config::Config,
    earnings::{TxFilter, TxRecord},
    events::{Screen, UiState},
    history::{TripFilter, TripRecord},
    input::InputBoxState,
    session::Session,
    shortcuts::Shortcuts,
    trip::{
        active::{ActiveTrip, TripProgress},
        countdown::{Countdown, CountdownTick},
        gate::{GateOutcome, RequestGate},
        request::TripRequest,
        summary::TripSummary,
    },
    ui::Tui,
    wizard,
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, is_ctrl_c};
use render::draw;

/// 設定画面とウィザードで編集中の値。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsDraft {
    pub backend_url: String,
    pub anon_key: String,
    pub access_token: String,
    pub rider_id: String,
    pub full_name: String,
    pub momo_number: String,
}

impl SettingsDraft {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            backend_url: cfg.backend.url.clone(),
            anon_key: cfg.backend.anon_key.clone(),
            access_token: cfg.backend.access_token.clone(),
            rider_id: cfg.rider.id.clone(),
            full_name: cfg.rider.full_name.clone(),
            momo_number: cfg.rider.momo_number.clone(),
        }
    }

    /// 編集値を設定へ書き戻す。
    pub fn apply(&self, cfg: &mut Config) {
        cfg.backend.url = self.backend_url.trim().to_string();
        cfg.backend.anon_key = self.anon_key.trim().to_string();
        cfg.backend.access_token = self.access_token.trim().to_string();
        cfg.rider.id = self.rider_id.trim().to_string();
        cfg.rider.full_name = self.full_name.trim().to_string();
        cfg.rider.momo_number = self.momo_number.trim().to_string();
    }
}

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// 永続化された設定ファイルのパス。
    pub cfg_path: PathBuf,
    /// メモリ上の現在設定。
    pub cfg: Config,
    /// ライダーのセッション。
    pub session: Session,
    /// 選択位置やステータスなどUI固有の状態。
    pub ui: UiState,
    /// Workerへのコマンド送信チャネル。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信チャネル。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    /// カウントダウンのtick送信側（タイマー起動時に複製して渡す）。
    pub tick_tx: mpsc::Sender<CountdownTick>,
    /// カウントダウンのtick受信側。
    pub tick_rx: mpsc::Receiver<CountdownTick>,

    /// 提示中のリクエスト（同時に1件まで）。
    pub gate: Option<RequestGate>,
    /// 進行中のトリップ。
    pub active: Option<ActiveTrip>,
    /// 直前に完了したトリップの要約。
    pub summary: Option<TripSummary>,
    /// リクエスト取得の応答待ち。
    pub awaiting_offer: bool,
    /// 最後にリクエストを問い合わせた時刻（Noneなら即時に問い合わせる）。
    pub last_poll: Option<Instant>,

    /// トリップ履歴。
    pub trips: Vec<TripRecord>,
    pub trip_filter: TripFilter,
    pub trip_query: String,
    /// 収益明細。
    pub txs: Vec<TxRecord>,
    pub tx_filter: TxFilter,
    /// 最後に入力した出金額。
    pub withdraw_amount: String,

    /// 設定画面・ウィザードの編集値。
    pub draft: SettingsDraft,
    /// 入力ボックスの状態（入力中はSome）。
    pub input_box: Option<InputBoxState>,
    /// 初期設定ウィザードの状態。
    pub wizard_state: wizard::WizardState,
    /// ショートカットキー設定。
    pub shortcuts: Shortcuts,
}

impl App {
    pub fn new(
        cfg_path: PathBuf,
        cfg: Config,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
        screen: Screen,
    ) -> Self {
        let (tick_tx, tick_rx) = mpsc::channel(16);
        Self {
            cfg_path,
            session: Session::from_config(&cfg),
            draft: SettingsDraft::from_config(&cfg),
            cfg,
            ui: UiState::new(screen),
            worker_tx,
            worker_rx,
            tick_tx,
            tick_rx,
            gate: None,
            active: None,
            summary: None,
            awaiting_offer: false,
            last_poll: None,
            trips: vec![],
            trip_filter: TripFilter::All,
            trip_query: String::new(),
            txs: vec![],
            tx_filter: TxFilter::All,
            withdraw_amount: String::new(),
            input_box: None,
            wizard_state: wizard::WizardState::new(),
            shortcuts,
        }
    }

    fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.cfg.dispatch.notice_secs)
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui) -> Result<()> {
    // 設定ファイルを読み込む（初回はデフォルトを生成してウィザードへ）。
    let cfg_path = PathBuf::from("config.toml");
    let first_run = !cfg_path.exists();
    let cfg = Config::load_or_default(&cfg_path)?;

    // ショートカット設定を読み込む（無ければデフォルト）。
    let shortcuts = Shortcuts::load_or_default("shortcut.toml")?;

    // Worker通信用のコマンド/イベントチャネルを作る。
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);

    // 初期設定スナップショットでWorkerを起動する。
    let backend = backend::from_config(&cfg);
    let worker_handle = tokio::spawn(worker::run(rx_cmd, tx_ev, cfg.clone(), backend));

    let initial_screen = if first_run {
        Screen::InitialSetup
    } else {
        Screen::Home
    };
    let mut app = App::new(cfg_path, cfg, shortcuts, tx_cmd, rx_ev, initial_screen);

    if initial_screen == Screen::Home {
        request_refresh(&mut app).await?;
    }

    loop {
        // 現在の状態を描画する。
        terminal.draw(|f| draw(f, &app))?;

        // 入力処理の前にWorkerイベントとtickを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev);
        }
        while let Ok(tick) = app.tick_rx.try_recv() {
            handle_tick(&mut app, tick).await?;
        }
        app.ui.expire_notice(Instant::now());
        poll_offer_if_idle(&mut app).await?;

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(k) = event::read()?
        {
            // どのフェーズでもCtrl+Cで終了できるようにする。
            if is_ctrl_c(&k) {
                break;
            }
            if handle_key(&mut app, k).await? {
                break;
            }
        }
    }

    // オンラインのまま終了しないようにする。
    if app.session.profile.is_online {
        let _ = app.worker_tx.send(WorkerCmd::SetOnline(false)).await;
    }
    // 送信側を閉じ、Workerが残りのコマンドを処理し終えるのを少し待つ。
    drop(app);
    if tokio::time::timeout(Duration::from_secs(2), worker_handle)
        .await
        .is_err()
    {
        tracing::warn!("worker did not stop in time");
    }
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。
fn handle_worker_event(app: &mut App, ev: WorkerEvent) {
    match ev {
        WorkerEvent::ProfileLoaded(p) => {
            app.session.apply_profile(p);
            app.ui.status = format!("Signed in as {}", app.session.profile.full_name);
        }
        WorkerEvent::OnlineChanged(online) => {
            app.session.profile.is_online = online;
            if online {
                let ttl = app.notice_ttl();
                app.ui.notify("You're online. Waiting for requests...", ttl);
            } else {
                app.ui.status = "You're offline".into();
            }
        }
        WorkerEvent::Offer(req) => {
            app.awaiting_offer = false;
            if can_present_offer(app) {
                start_gate(app, req);
            } else {
                tracing::info!("offer ignored while busy: {}", req.trip_id);
            }
        }
        WorkerEvent::NoOffer => {
            app.awaiting_offer = false;
        }
        WorkerEvent::OfferLost { trip_id } => {
            // 受諾が競合に負けたら進行中トリップを破棄してホームへ戻る。
            abandon_trip(app, &trip_id, "This trip was taken by another rider".into());
        }
        WorkerEvent::AcceptFailed { trip_id, reason } => {
            abandon_trip(app, &trip_id, format!("Could not confirm the trip: {reason}"));
        }
        WorkerEvent::TripsLoaded(trips) => {
            app.trips = trips;
            app.ui.selected = 0;
        }
        WorkerEvent::TransactionsLoaded(txs) => {
            app.txs = txs;
        }
        WorkerEvent::WithdrawalRecorded { amount } => {
            let ttl = app.notice_ttl();
            app.ui.notify(
                format!(
                    "Withdrawal of GH₵ {amount:.2} requested to {}",
                    app.cfg.rider.momo_number
                ),
                ttl,
            );
        }
        WorkerEvent::Log(s) => {
            app.ui.log.push(s);
        }
        WorkerEvent::Error(s) => {
            app.awaiting_offer = false;
            app.ui.error = Some(s);
        }
    }
}

/// 受諾が確定しなかったトリップを破棄してホームへ戻る。
fn abandon_trip(app: &mut App, trip_id: &str, message: String) {
    let current = app
        .active
        .as_ref()
        .is_some_and(|a| a.trip().request.trip_id == trip_id);
    if current {
        tracing::warn!("trip abandoned: {trip_id}");
        app.active = None;
        app.ui.screen = Screen::Home;
        app.ui.error = Some(message);
    }
}

/// オンラインで待機中かつ提示中のリクエストが無いか。
fn can_present_offer(app: &App) -> bool {
    app.session.profile.is_online
        && app.ui.screen == Screen::Home
        && !app.ui.confirm_online
        && app.gate.is_none()
        && app.active.is_none()
}

/// 待機中なら一定間隔でWorkerへリクエストを問い合わせる。
async fn poll_offer_if_idle(app: &mut App) -> Result<()> {
    if !can_present_offer(app) || app.awaiting_offer {
        return Ok(());
    }
    let interval = Duration::from_secs(app.cfg.dispatch.poll_interval_secs);
    if app.last_poll.is_some_and(|t| t.elapsed() < interval) {
        return Ok(());
    }
    app.worker_tx.send(WorkerCmd::FetchOffer).await?;
    app.awaiting_offer = true;
    app.last_poll = Some(Instant::now());
    Ok(())
}

/// リクエストを提示し、カウントダウンを開始する。
fn start_gate(app: &mut App, req: TripRequest) {
    let offer_id = req.offer_id;
    let mut gate = RequestGate::start(req, &app.session, app.cfg.dispatch.countdown_secs);
    gate.attach_timer(Countdown::start(
        offer_id,
        app.tick_tx.clone(),
        Duration::from_secs(1),
    ));
    app.gate = Some(gate);
    app.ui.screen = Screen::Request;
    app.ui.status = "New pickup request".into();
}

/// tickを提示中のゲートへ渡す（別リクエスト宛ては捨てる）。
async fn handle_tick(app: &mut App, tick: CountdownTick) -> Result<()> {
    let outcome = match app.gate.as_mut() {
        Some(gate) if gate.owns_offer(tick.offer_id) => gate.tick(),
        _ => {
            tracing::debug!("stale tick dropped: {}", tick.offer_id);
            None
        }
    };
    if let Some(outcome) = outcome {
        handle_gate_outcome(app, outcome).await?;
    }
    Ok(())
}

/// ゲートの決定を画面遷移とWorkerコマンドへ反映する。
pub async fn handle_gate_outcome(app: &mut App, outcome: GateOutcome) -> Result<()> {
    app.gate = None;
    match outcome {
        GateOutcome::Accepted(trip) => {
            app.worker_tx
                .send(WorkerCmd::AcceptOffer {
                    trip_id: trip.request.trip_id.clone(),
                    rider_id: trip.rider_id.clone(),
                })
                .await?;
            app.active = Some(ActiveTrip::begin(
                trip,
                &app.session,
                app.cfg.disposal_sites.clone(),
            ));
            app.ui.screen = Screen::ActiveTrip;
            app.ui.status = "Trip accepted".into();
        }
        GateOutcome::Declined { trip_id } => {
            app.worker_tx.send(WorkerCmd::DeclineOffer { trip_id }).await?;
            app.ui.screen = Screen::Home;
            app.ui.status = "Request declined".into();
            app.last_poll = Some(Instant::now());
        }
        GateOutcome::AutoDeclined { trip_id } => {
            app.worker_tx.send(WorkerCmd::DeclineOffer { trip_id }).await?;
            app.ui.screen = Screen::Home;
            app.ui.status = "Request timed out".into();
            app.last_poll = Some(Instant::now());
        }
    }
    Ok(())
}

/// 進行中トリップを次の段階へ進める。
pub async fn advance_trip(app: &mut App) -> Result<()> {
    let Some(active) = app.active.as_mut() else {
        return Ok(());
    };
    match active.advance(Local::now()) {
        TripProgress::Advanced(status) => {
            app.ui.status = format!("Status: {}", status.label());
        }
        TripProgress::Completed(summary) => {
            app.worker_tx
                .send(WorkerCmd::CompleteTrip {
                    trip_id: summary.trip_id.clone(),
                    drop_location: summary.disposal_site().map(str::to_string),
                })
                .await?;
            app.active = None;
            app.summary = Some(summary);
            app.ui.screen = Screen::TripComplete;
            app.ui.status = "Trip completed".into();
        }
        TripProgress::Ignored => {}
    }
    Ok(())
}

/// プロフィール・履歴・明細の再取得をWorkerへ依頼する。
pub async fn request_refresh(app: &mut App) -> Result<()> {
    tracing::info!("refresh requested");
    app.worker_tx.send(WorkerCmd::LoadProfile).await?;
    app.worker_tx.send(WorkerCmd::RefreshTrips).await?;
    app.worker_tx.send(WorkerCmd::RefreshTransactions).await?;
    app.ui.status = "Refreshing...".into();
    Ok(())
}
