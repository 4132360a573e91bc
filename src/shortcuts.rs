//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub home: HomeShortcuts,
    pub request: RequestShortcuts,
    pub trip: TripShortcuts,
    pub complete: CompleteShortcuts,
    pub history: HistoryShortcuts,
    pub earnings: EarningsShortcuts,
    pub settings: SettingsShortcuts,
    pub wizard: WizardShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// ホーム画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeShortcuts {
    pub quit: Vec<String>,
    pub toggle_online: Vec<String>,
    pub trips: Vec<String>,
    pub earnings: Vec<String>,
    pub settings: Vec<String>,
    pub confirm_yes: Vec<String>,
    pub confirm_no: Vec<String>,
}

/// リクエスト画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestShortcuts {
    pub accept: Vec<String>,
    pub decline: Vec<String>,
}

/// 進行中トリップ画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripShortcuts {
    pub advance: Vec<String>,
    pub navigate: Vec<String>,
    /// 並び順が処分場一覧の位置に対応する。
    pub sites: Vec<String>,
}

/// トリップ完了画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteShortcuts {
    pub home: Vec<String>,
    pub earnings: Vec<String>,
}

/// 履歴画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryShortcuts {
    pub back: Vec<String>,
    pub filter: Vec<String>,
    pub search: Vec<String>,
    pub refresh: Vec<String>,
    pub down: Vec<String>,
    pub up: Vec<String>,
}

/// 収益画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsShortcuts {
    pub back: Vec<String>,
    pub filter: Vec<String>,
    pub withdraw: Vec<String>,
    pub refresh: Vec<String>,
    /// 並び順がクイック入力額の位置に対応する。
    pub quick_amounts: Vec<String>,
}

/// 設定画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsShortcuts {
    pub cancel: Vec<String>,
    pub save: Vec<String>,
    pub backend_url: Vec<String>,
    pub anon_key: Vec<String>,
    pub access_token: Vec<String>,
    pub rider_id: Vec<String>,
    pub name: Vec<String>,
    pub momo_number: Vec<String>,
}

/// 初期設定ウィザードのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardShortcuts {
    pub proceed: Vec<String>,
    /// ようこそ画面ではデモモードで開始する
    pub skip: Vec<String>,
}

/// 入力ボックスの編集キー。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込み、無ければデフォルトを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            // 既存ファイルを読み込んでパースする。
            let content = std::fs::read_to_string(path)?;
            let shortcuts: Shortcuts = toml::from_str(&content)?;
            Ok(shortcuts)
        } else {
            // 未作成の場合は既定値を利用する。
            Ok(Self::default())
        }
    }

    /// TOMLとして保存する。
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // 文字列にシリアライズする。
        let content = toml::to_string_pretty(self)?;
        // ファイルへ書き込む。
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            home: HomeShortcuts {
                quit: vec!["q".into()],
                toggle_online: vec!["o".into()],
                trips: vec!["h".into()],
                earnings: vec!["e".into()],
                settings: vec!["t".into()],
                confirm_yes: vec!["y".into(), "Enter".into()],
                confirm_no: vec!["n".into(), "Esc".into()],
            },
            request: RequestShortcuts {
                accept: vec!["a".into(), "Enter".into()],
                decline: vec!["d".into(), "Esc".into()],
            },
            trip: TripShortcuts {
                advance: vec!["Enter".into(), "Space".into()],
                navigate: vec!["g".into()],
                sites: (1..=9).map(|n| n.to_string()).collect(),
            },
            complete: CompleteShortcuts {
                home: vec!["Enter".into(), "Esc".into()],
                earnings: vec!["e".into()],
            },
            history: HistoryShortcuts {
                back: vec!["Esc".into(), "q".into()],
                filter: vec!["f".into(), "Tab".into()],
                search: vec!["/".into()],
                refresh: vec!["r".into()],
                down: vec!["Down".into(), "j".into()],
                up: vec!["Up".into(), "k".into()],
            },
            earnings: EarningsShortcuts {
                back: vec!["Esc".into(), "q".into()],
                filter: vec!["f".into(), "Tab".into()],
                withdraw: vec!["w".into()],
                refresh: vec!["r".into()],
                quick_amounts: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            },
            settings: SettingsShortcuts {
                cancel: vec!["Esc".into()],
                save: vec!["Enter".into()],
                backend_url: vec!["u".into()],
                anon_key: vec!["k".into()],
                access_token: vec!["a".into()],
                rider_id: vec!["i".into()],
                name: vec!["n".into()],
                momo_number: vec!["m".into()],
            },
            wizard: WizardShortcuts {
                proceed: vec!["Enter".into()],
                skip: vec!["Esc".into()],
            },
            input_box: InputBoxShortcuts {
                confirm: vec!["Enter".into()],
                cancel: vec!["Esc".into()],
                backspace: vec!["Backspace".into()],
                delete: vec!["Delete".into()],
                left: vec!["Left".into()],
                right: vec!["Right".into()],
                home: vec!["Home".into()],
                end: vec!["End".into()],
                clear_line: vec!["Ctrl+u".into()],
            },
        }
    }
}

/// 一致したショートカットの位置（処分場やクイック入力額の選択用）。
pub fn matched_index(key: &KeyEvent, shortcuts: &[String]) -> Option<usize> {
    shortcuts
        .iter()
        .position(|s| parse_binding(s) == Some((key.modifiers, key.code)))
}

/// KeyEventがいずれかのショートカット文字列と一致するか判定する。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    matched_index(key, shortcuts).is_some()
}

/// "Ctrl+u" や "Enter" を修飾キーとキーコードに分解する。解釈できなければ None。
fn parse_binding(binding: &str) -> Option<(KeyModifiers, KeyCode)> {
    let (mods, name) = match binding.rsplit_once('+') {
        Some((m, n)) => (Some(m), n),
        None => (None, binding),
    };

    let mut modifiers = KeyModifiers::NONE;
    for m in mods.into_iter().flat_map(|m| m.split('+')) {
        modifiers |= match m.to_ascii_lowercase().as_str() {
            "ctrl" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            _ => return None,
        };
    }

    let code = match name.to_ascii_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "space" => KeyCode::Char(' '),
        "backspace" => KeyCode::Backspace,
        "delete" => KeyCode::Delete,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some((modifiers, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_shortcut_simple_char() {
        // 単一文字の一致判定を検証する。
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("q")]));
        assert!(!matches_shortcut(&key, &[String::from("w")]));
    }

    #[test]
    fn test_matches_shortcut_special_key() {
        // 特殊キーの一致判定を検証する。
        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("Enter")]));
        assert!(!matches_shortcut(&key, &[String::from("Esc")]));
    }

    #[test]
    fn test_matches_shortcut_with_modifier() {
        // 修飾キー付きの一致判定を検証する。
        let key = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(matches_shortcut(&key, &[String::from("Ctrl+u")]));
        assert!(!matches_shortcut(&key, &[String::from("u")]));
    }

    #[test]
    fn test_matches_shortcut_arrow_keys() {
        // 矢印キーの一致判定を検証する。
        let key = KeyEvent::new(KeyCode::Up, KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("Up")]));
        assert!(!matches_shortcut(&key, &[String::from("Down")]));
    }

    #[test]
    fn test_matched_index_maps_digit_to_position() {
        let sc = Shortcuts::default();
        let key = KeyEvent::new(KeyCode::Char('2'), KeyModifiers::empty());
        assert_eq!(matched_index(&key, &sc.trip.sites), Some(1));
        assert_eq!(matched_index(&key, &sc.earnings.quick_amounts), Some(1));
        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::empty());
        assert_eq!(matched_index(&key, &sc.trip.sites), None);
    }

    #[test]
    fn test_space_and_saved_file_load() {
        // 保存したファイルを読み直すと同じキー割り当てになる。
        let key = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::empty());
        assert!(matches_shortcut(&key, &[String::from("Space")]));

        let path = std::env::temp_dir().join(format!("rider_tui_sc_{}.toml", std::process::id()));
        let mut sc = Shortcuts::default();
        sc.request.accept = vec!["x".into()];
        sc.save(&path).unwrap();
        let loaded = Shortcuts::load_or_default(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.request.accept, vec!["x".to_string()]);
        assert_eq!(loaded.trip.sites.len(), 9);
        assert_eq!(loaded.wizard.skip, vec!["Esc".to_string()]);
        assert_eq!(loaded.input_box.clear_line, vec!["Ctrl+u".to_string()]);
    }

    #[test]
    fn test_input_box_defaults_leave_letters_typable() {
        let sc = Shortcuts::default().input_box;
        let all = [
            &sc.confirm,
            &sc.cancel,
            &sc.backspace,
            &sc.delete,
            &sc.left,
            &sc.right,
            &sc.home,
            &sc.end,
            &sc.clear_line,
        ];
        for c in ['h', 'l', 'u', 'q'] {
            let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty());
            assert!(all.iter().all(|keys| !matches_shortcut(&key, keys)));
        }
        let ctrl_u = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert!(matches_shortcut(&ctrl_u, &sc.clear_line));
    }

    #[test]
    fn test_unknown_binding_never_matches() {
        let key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert!(!matches_shortcut(&key, &[String::from("Hyper+x")]));
        assert!(!matches_shortcut(&key, &[String::from("Ctrl+xx")]));
        assert_eq!(
            parse_binding("Ctrl+x"),
            Some((KeyModifiers::CONTROL, KeyCode::Char('x')))
        );
    }

    #[test]
    fn test_matches_shortcut_multiple_keys() {
        // 複数キーバインドの一致判定を検証する。
        let key_up = KeyEvent::new(KeyCode::Up, KeyModifiers::empty());
        let key_k = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::empty());
        let shortcuts = vec![String::from("Up"), String::from("k")];

        assert!(matches_shortcut(&key_up, &shortcuts));
        assert!(matches_shortcut(&key_k, &shortcuts));

        let key_j = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::empty());
        assert!(!matches_shortcut(&key_j, &shortcuts));
    }
}
