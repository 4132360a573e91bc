//! レイアウト計算のヘルパー関数

use ratatui::prelude::*;

/// 全画面共通の3領域
pub struct MainLayout {
    /// 画面本体
    pub body: Rect,
    /// HELPバーの領域
    pub help_bar: Rect,
    /// STATUSバーの領域
    pub status_bar: Rect,
}

/// ボディ部の2つの領域（メイン + サイドパネル）
pub struct BodyLayout {
    pub content: Rect,
    /// ログや通知を出す右側パネル
    pub side_panel: Rect,
}

/// リクエスト画面の3領域
pub struct RequestLayout {
    /// 残り秒数のゲージ
    pub countdown: Rect,
    /// 顧客・集荷先などの詳細
    pub details: Rect,
    /// 受諾/辞退の案内
    pub actions: Rect,
}

/// 画面を Body + HELP + STATUS に分割
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Body
            Constraint::Length(3), // HELPバー
            Constraint::Length(3), // STATUSバー
        ])
        .split(area);

    MainLayout {
        body: chunks[0],
        help_bar: chunks[1],
        status_bar: chunks[2],
    }
}

/// Body領域を2つに分割（メイン 65% + サイド 35%）
pub fn create_body_layout(area: Rect) -> BodyLayout {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    BodyLayout {
        content: chunks[0],
        side_panel: chunks[1],
    }
}

/// リクエスト画面をゲージ・詳細・操作案内に分割
pub fn create_request_layout(area: Rect) -> RequestLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(area);

    RequestLayout {
        countdown: chunks[0],
        details: chunks[1],
        actions: chunks[2],
    }
}

/// 上部の固定行と残りに分割（集計行 + 一覧など）
pub fn split_header(area: Rect, header_height: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(header_height), Constraint::Min(1)])
        .split(area);
    (chunks[0], chunks[1])
}
