//! キー入力ハンドラー関数。

use anyhow::Result;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    earnings::{self, QUICK_AMOUNTS},
    events::Screen,
    history,
    input::{InputBoxState, InputCallbackId},
    session::Session,
    shortcuts::{self, matched_index, matches_shortcut},
    wizard::WizardStep,
    worker::WorkerCmd,
};

use super::{App, SettingsDraft, advance_trip, handle_gate_outcome, request_refresh};

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 入力ボックスが開いていれば最優先で処理する。
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }

    // 前回のエラー表示は次の操作で消す。
    app.ui.error = None;

    // 画面ごとのハンドラへ委譲する。
    match app.ui.screen {
        Screen::Home => handle_home_key(app, k).await,
        Screen::Request => handle_request_key(app, k).await,
        Screen::ActiveTrip => handle_trip_key(app, k).await,
        Screen::TripComplete => handle_complete_key(app, k).await,
        Screen::Trips => handle_history_key(app, k).await,
        Screen::Earnings => handle_earnings_key(app, k).await,
        Screen::Settings => handle_settings_key(app, k).await,
        Screen::InitialSetup => handle_wizard_key(app, k).await,
    }
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// ホーム画面のキー処理。
async fn handle_home_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.home;

    // オンライン化の確認中は y/n だけを受け付ける。
    if app.ui.confirm_online {
        if matches_shortcut(&k, &sc.confirm_yes) {
            app.ui.confirm_online = false;
            app.last_poll = None;
            app.worker_tx.send(WorkerCmd::SetOnline(true)).await?;
        } else if matches_shortcut(&k, &sc.confirm_no) {
            app.ui.confirm_online = false;
        }
        return Ok(false);
    }

    if matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if matches_shortcut(&k, &sc.toggle_online) {
        if app.session.profile.is_online {
            // オフラインへの切替は確認なしで即時に行う。
            app.worker_tx.send(WorkerCmd::SetOnline(false)).await?;
        } else {
            app.ui.confirm_online = true;
        }
    } else if matches_shortcut(&k, &sc.trips) {
        app.ui.screen = Screen::Trips;
        app.ui.selected = 0;
        app.worker_tx.send(WorkerCmd::RefreshTrips).await?;
    } else if matches_shortcut(&k, &sc.earnings) {
        app.ui.screen = Screen::Earnings;
        app.worker_tx.send(WorkerCmd::RefreshTransactions).await?;
    } else if matches_shortcut(&k, &sc.settings) {
        app.draft = SettingsDraft::from_config(&app.cfg);
        app.ui.screen = Screen::Settings;
        app.ui.status = "Settings".into();
    }

    Ok(false)
}

/// リクエスト画面のキー処理。
async fn handle_request_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.request;
    let Some(gate) = app.gate.as_mut() else {
        return Ok(false);
    };

    let outcome = if matches_shortcut(&k, &sc.accept) {
        gate.accept()
    } else if matches_shortcut(&k, &sc.decline) {
        gate.decline()
    } else {
        None
    };
    if let Some(outcome) = outcome {
        handle_gate_outcome(app, outcome).await?;
    }
    Ok(false)
}

/// 進行中トリップ画面のキー処理。
async fn handle_trip_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.trip;

    if matches_shortcut(&k, &sc.advance) {
        advance_trip(app).await?;
    } else if matches_shortcut(&k, &sc.navigate) {
        if let Some(active) = &app.active {
            let url = active.navigation_url();
            tracing::info!("opening navigation: {url}");
            // ブラウザが開けなくてもURLは表示しておく。
            let _ = webbrowser::open(&url);
            app.ui.status = format!("Navigate: {url}");
        }
    } else if let Some(idx) = matched_index(&k, &sc.sites)
        && let Some(active) = app.active.as_mut()
    {
        match active.select_site(idx) {
            Ok(site) => {
                let message = format!("Disposal Site Selected: {}", site.name);
                let ttl = app.notice_ttl();
                app.ui.notify(message, ttl);
            }
            Err(e) => app.ui.error = Some(e.to_string()),
        }
    }

    Ok(false)
}

/// トリップ完了画面のキー処理。
async fn handle_complete_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.complete;

    if matches_shortcut(&k, &sc.earnings) {
        app.ui.screen = Screen::Earnings;
        app.worker_tx.send(WorkerCmd::RefreshTransactions).await?;
    } else if matches_shortcut(&k, &sc.home) {
        app.ui.screen = Screen::Home;
        // 完了直後はすぐ次のリクエストを問い合わせる。
        app.last_poll = None;
    }
    Ok(false)
}

/// 履歴画面のキー処理。
async fn handle_history_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.history;

    if matches_shortcut(&k, &sc.back) {
        app.ui.screen = Screen::Home;
    } else if matches_shortcut(&k, &sc.filter) {
        app.trip_filter = app.trip_filter.next();
        app.ui.selected = 0;
    } else if matches_shortcut(&k, &sc.search) {
        app.input_box = Some(InputBoxState::new(
            "Search customer, location or waste type:",
            &app.trip_query,
            InputCallbackId::TripSearch,
        ));
    } else if matches_shortcut(&k, &sc.refresh) {
        app.worker_tx.send(WorkerCmd::RefreshTrips).await?;
    } else if matches_shortcut(&k, &sc.down) {
        let today = Local::now().date_naive();
        let len = history::filter_trips(&app.trips, app.trip_filter, &app.trip_query, today).len();
        if app.ui.selected + 1 < len {
            app.ui.selected += 1;
        }
    } else if matches_shortcut(&k, &sc.up) {
        app.ui.selected = app.ui.selected.saturating_sub(1);
    }
    Ok(false)
}

/// 収益画面のキー処理。
async fn handle_earnings_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.earnings;

    if matches_shortcut(&k, &sc.back) {
        app.ui.screen = Screen::Home;
    } else if matches_shortcut(&k, &sc.filter) {
        app.tx_filter = app.tx_filter.next();
    } else if matches_shortcut(&k, &sc.refresh) {
        app.worker_tx.send(WorkerCmd::RefreshTransactions).await?;
    } else if matches_shortcut(&k, &sc.withdraw) {
        open_withdraw_box(app);
    } else if let Some(amount) =
        matched_index(&k, &sc.quick_amounts).and_then(|i| QUICK_AMOUNTS.get(i))
    {
        // クイック入力額を入れた状態で入力ボックスを開く。
        app.withdraw_amount = amount.to_string();
        open_withdraw_box(app);
    }
    Ok(false)
}

fn open_withdraw_box(app: &mut App) {
    app.input_box = Some(InputBoxState::new(
        "Withdraw amount (GH₵):",
        &app.withdraw_amount,
        InputCallbackId::WithdrawAmount,
    ));
}

/// 出金額を検証し、問題なければWorkerへ依頼する。
pub async fn submit_withdrawal(app: &mut App, value: String) -> Result<()> {
    let available = earnings::available_balance(&app.txs);
    match earnings::validate_withdrawal(&value, available) {
        Ok(_) if app.cfg.rider.momo_number.trim().is_empty() => {
            app.withdraw_amount = value;
            app.ui.error = Some("Set a mobile money number in settings first".into());
        }
        Ok(amount) => {
            tracing::info!("withdrawal requested: {amount:.2}");
            app.worker_tx
                .send(WorkerCmd::RequestWithdrawal {
                    amount,
                    momo_number: app.cfg.rider.momo_number.clone(),
                })
                .await?;
            app.withdraw_amount.clear();
            app.ui.status = "Submitting withdrawal...".into();
        }
        Err(e) => {
            tracing::warn!("withdrawal rejected: {e}");
            app.withdraw_amount = value;
            app.ui.error = Some(e.to_string());
        }
    }
    Ok(())
}

/// 設定画面のキー処理。
async fn handle_settings_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.settings;

    let field = if matches_shortcut(&k, &sc.cancel) {
        // 変更を破棄してホームへ戻る。
        app.draft = SettingsDraft::from_config(&app.cfg);
        app.ui.screen = Screen::Home;
        return Ok(false);
    } else if matches_shortcut(&k, &sc.save) {
        save_settings(app).await?;
        app.ui.screen = Screen::Home;
        app.ui.status = "Saved settings".into();
        return Ok(false);
    } else if matches_shortcut(&k, &sc.backend_url) {
        ("Backend URL:", app.draft.backend_url.clone(), InputCallbackId::SettingsBackendUrl)
    } else if matches_shortcut(&k, &sc.anon_key) {
        ("Anon key:", app.draft.anon_key.clone(), InputCallbackId::SettingsAnonKey)
    } else if matches_shortcut(&k, &sc.access_token) {
        ("Access token:", app.draft.access_token.clone(), InputCallbackId::SettingsAccessToken)
    } else if matches_shortcut(&k, &sc.rider_id) {
        ("Rider ID:", app.draft.rider_id.clone(), InputCallbackId::SettingsRiderId)
    } else if matches_shortcut(&k, &sc.name) {
        ("Full name:", app.draft.full_name.clone(), InputCallbackId::SettingsFullName)
    } else if matches_shortcut(&k, &sc.momo_number) {
        ("Mobile money number:", app.draft.momo_number.clone(), InputCallbackId::SettingsMomoNumber)
    } else {
        return Ok(false);
    };

    let (prompt, value, callback_id) = field;
    app.input_box = Some(InputBoxState::new(prompt, &value, callback_id));
    Ok(false)
}

/// 編集値を保存し、Workerとセッションへ反映する。
async fn save_settings(app: &mut App) -> Result<()> {
    // 接続先が変わる前にオフラインへ戻す。
    if app.session.profile.is_online {
        app.worker_tx.send(WorkerCmd::SetOnline(false)).await?;
    }
    app.draft.apply(&mut app.cfg);
    app.cfg.save(&app.cfg_path)?;
    app.worker_tx
        .send(WorkerCmd::SaveSettings(app.cfg.clone()))
        .await?;
    app.session = Session::from_config(&app.cfg);
    request_refresh(app).await
}

/// 初期設定ウィザード画面のキー処理。
async fn handle_wizard_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let sc = &app.shortcuts.wizard;

    if shortcuts::matches_shortcut(&k, &sc.proceed) {
        let d = &app.draft;
        let field = match app.wizard_state.current_step {
            WizardStep::Welcome => {
                app.wizard_state.next_step();
                None
            }
            WizardStep::BackendUrl => Some((
                "Backend URL:",
                d.backend_url.clone(),
                InputCallbackId::WizardBackendUrl,
            )),
            WizardStep::AnonKey => Some((
                "Anon key:",
                d.anon_key.clone(),
                InputCallbackId::WizardAnonKey,
            )),
            WizardStep::AccessToken => Some((
                "Access token (optional):",
                d.access_token.clone(),
                InputCallbackId::WizardAccessToken,
            )),
            WizardStep::RiderId => Some((
                "Rider ID:",
                d.rider_id.clone(),
                InputCallbackId::WizardRiderId,
            )),
            WizardStep::Complete => {
                if app.draft.rider_id.trim().is_empty() {
                    app.ui.error = Some("Rider ID is required.".into());
                    app.wizard_state.current_step = WizardStep::RiderId;
                    return Ok(false);
                }
                save_settings(app).await?;
                app.ui.screen = Screen::Home;
                app.ui.status = if app.cfg.is_demo() {
                    "Setup complete (demo data)".into()
                } else {
                    "Setup complete!".into()
                };
                None
            }
        };
        if let Some((prompt, value, callback_id)) = field {
            app.input_box = Some(InputBoxState::new(prompt, &value, callback_id));
        }
    } else if shortcuts::matches_shortcut(&k, &sc.skip) {
        if app.wizard_state.current_step == WizardStep::Welcome {
            // バックエンド無しのデモモードで始める。
            app.draft.backend_url.clear();
            app.draft.anon_key.clear();
            app.draft.access_token.clear();
            app.wizard_state.skip_to_demo();
        } else {
            app.wizard_state.next_step();
        }
    }

    Ok(false)
}

/// 入力ボックスのキー処理。
async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };
    let sc = &app.shortcuts.input_box;

    // 入力ボックス中でもCtrl+Cで終了できるようにする。
    if is_ctrl_c(&k) {
        return Ok(true);
    }

    if matches_shortcut(&k, &sc.confirm) {
        // 入力ボックスを閉じる前に値とコールバック種別を保存する。
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id;
        app.input_box = None;
        apply_input_callback(app, callback_id, value).await?;
    } else if matches_shortcut(&k, &sc.cancel) {
        app.input_box = None;
    } else if matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        input_state.insert_char(c);
    }

    Ok(false)
}

/// 入力ボックスのコールバックを適用する。
async fn apply_input_callback(
    app: &mut App,
    callback_id: InputCallbackId,
    value: String,
) -> Result<()> {
    let d = &mut app.draft;
    match callback_id {
        InputCallbackId::TripSearch => {
            app.trip_query = value;
            app.ui.selected = 0;
        }
        InputCallbackId::WithdrawAmount => submit_withdrawal(app, value).await?,
        InputCallbackId::SettingsBackendUrl => d.backend_url = value,
        InputCallbackId::SettingsAnonKey => d.anon_key = value,
        InputCallbackId::SettingsAccessToken => d.access_token = value,
        InputCallbackId::SettingsRiderId => d.rider_id = value,
        InputCallbackId::SettingsFullName => d.full_name = value,
        InputCallbackId::SettingsMomoNumber => d.momo_number = value,
        InputCallbackId::WizardBackendUrl => {
            d.backend_url = value;
            app.wizard_state.next_step();
        }
        InputCallbackId::WizardAnonKey => {
            d.anon_key = value;
            app.wizard_state.next_step();
        }
        InputCallbackId::WizardAccessToken => {
            d.access_token = value;
            app.wizard_state.next_step();
        }
        InputCallbackId::WizardRiderId => {
            d.rider_id = value;
            app.wizard_state.next_step();
        }
    }
    Ok(())
}
