//! TUI内での文字列入力コンポーネント（InputBox）。

use ratatui::{
    layout::{Alignment, Flex},
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

/// InputBox入力状態
#[derive(Clone, Debug)]
pub struct InputBoxState {
    /// プロンプトメッセージ
    pub prompt: String,
    /// 現在の入力値
    pub value: String,
    /// カーソル位置（文字単位）
    pub cursor: usize,
    /// 入力完了時のコールバック識別子
    pub callback_id: InputCallbackId,
}

/// 入力完了時のコールバック識別子
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputCallbackId {
    // Trips画面用
    TripSearch,

    // Earnings画面用
    WithdrawAmount,

    // Settings画面用
    SettingsBackendUrl,
    SettingsAnonKey,
    SettingsAccessToken,
    SettingsRiderId,
    SettingsFullName,
    SettingsMomoNumber,

    // Wizard画面用
    WizardBackendUrl,
    WizardAnonKey,
    WizardAccessToken,
    WizardRiderId,
}

impl InputBoxState {
    /// 初期値を入れてカーソルを末尾に置く。
    pub fn new(prompt: impl Into<String>, value: &str, callback_id: InputCallbackId) -> Self {
        Self {
            prompt: prompt.into(),
            value: value.to_string(),
            cursor: value.chars().count(),
            callback_id,
        }
    }

    /// 文字を挿入
    pub fn insert_char(&mut self, c: char) {
        // カーソル位置（文字単位）をバイト位置へ変換して挿入する。
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// 文字位置に対応するバイト位置。
    fn byte_offset(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }

    /// Backspace（カーソル前の文字を削除）
    pub fn backspace(&mut self) {
        // カーソルが先頭なら何もしない。
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_offset(self.cursor);
            self.value.remove(at);
        }
    }

    /// Delete（カーソル位置の文字を削除）
    pub fn delete(&mut self) {
        // カーソルが末尾なら何もしない。
        if self.cursor < self.value.chars().count() {
            let at = self.byte_offset(self.cursor);
            self.value.remove(at);
        }
    }

    /// カーソルを左に移動
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// カーソルを右に移動
    pub fn move_right(&mut self) {
        // 文字数を取得して末尾を超えないようにする。
        let char_count = self.value.chars().count();
        if self.cursor < char_count {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// 行全体をクリア
    pub fn clear_line(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// 入力欄の表示文字列（カーソル位置に | を挿入し、幅に収まるよう左を切る）。
fn visible_with_cursor(state: &InputBoxState, width: usize) -> String {
    let scroll = state.cursor.saturating_sub(width);
    let chars: Vec<char> = state.value.chars().skip(scroll).take(width + 1).collect();
    let split = (state.cursor - scroll).min(chars.len());
    let before: String = chars[..split].iter().collect();
    let after: String = chars[split..].iter().collect();
    format!("{before}|{after}")
}

/// InputBoxをポップアップとして描画
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    let popup_area = centered_popup(f.area(), 60, 5);
    f.render_widget(Clear, popup_area);

    // プロンプトは枠のタイトルに出す。
    let block = Block::default()
        .borders(Borders::ALL)
        .title(state.prompt.as_str())
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::DarkGray));
    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let [field, _, help] = Layout::vertical([Constraint::Length(1); 3]).areas(inner);

    let text = visible_with_cursor(state, field.width.saturating_sub(2) as usize);
    f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Green)), field);
    f.render_widget(
        Paragraph::new("Enter=confirm | Esc=cancel | Ctrl+U=clear")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center),
        help,
    );
}

/// 幅（%）と高さ（行）を指定した中央配置の領域
pub fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(width_percent)])
        .flex(Flex::Center)
        .areas(row);
    popup
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(value: &str) -> InputBoxState {
        InputBoxState::new("Amount:", value, InputCallbackId::WithdrawAmount)
    }

    #[test]
    fn test_insert_and_backspace_at_cursor() {
        let mut s = input("15");
        s.move_left();
        s.insert_char('2');
        assert_eq!(s.value, "125");
        s.backspace();
        assert_eq!(s.value, "15");
        assert_eq!(s.cursor, 1);
    }

    #[test]
    fn test_visible_text_follows_cursor() {
        let s = input("0501234567");
        assert_eq!(visible_with_cursor(&s, 20), "0501234567|");
        // 幅を超えたら先頭側を切り詰める。
        assert_eq!(visible_with_cursor(&s, 4), "4567|");
    }

    #[test]
    fn test_multibyte_editing() {
        // GH₵ のようなマルチバイト記号でも文字単位で動く。
        let mut s = input("GH₵");
        s.move_home();
        s.move_right();
        s.move_right();
        s.delete();
        assert_eq!(s.value, "GH");
        s.insert_char('₵');
        s.insert_char('5');
        assert_eq!(s.value, "GH₵5");
        s.clear_line();
        assert_eq!((s.value.as_str(), s.cursor), ("", 0));
    }
}
