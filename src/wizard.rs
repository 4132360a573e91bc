//! 初期設定ウィザードのステート管理。

/// ウィザードの各ステップ
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardStep {
    /// ウェルカムメッセージ
    Welcome,
    /// バックエンドのプロジェクトURL
    BackendUrl,
    /// 公開anonキー
    AnonKey,
    /// ライダーのアクセストークン
    AccessToken,
    /// ライダーのプロフィールID
    RiderId,
    /// 完了
    Complete,
}

/// ウィザードの状態管理
#[derive(Clone, Debug)]
pub struct WizardState {
    /// 現在のステップ
    pub current_step: WizardStep,
    /// 全ステップ数
    pub total_steps: usize,
}

impl WizardState {
    /// 新しいウィザード状態を作成
    pub fn new() -> Self {
        Self {
            current_step: WizardStep::Welcome,
            total_steps: 6,
        }
    }

    /// 次のステップへ進む
    pub fn next_step(&mut self) {
        self.current_step = match self.current_step {
            WizardStep::Welcome => WizardStep::BackendUrl,
            WizardStep::BackendUrl => WizardStep::AnonKey,
            WizardStep::AnonKey => WizardStep::AccessToken,
            WizardStep::AccessToken => WizardStep::RiderId,
            WizardStep::RiderId | WizardStep::Complete => WizardStep::Complete,
        };
    }

    /// バックエンド設定を飛ばしてデモモードで始める。
    pub fn skip_to_demo(&mut self) {
        self.current_step = WizardStep::RiderId;
    }

    /// 現在のステップのプロンプトメッセージを取得
    pub fn get_prompt(&self) -> &'static str {
        match self.current_step {
            WizardStep::Welcome => {
                "Welcome to rider_tui!\n\nThis wizard connects the client to your backend.\nPress Enter to start, or Esc to run with demo data."
            }
            WizardStep::BackendUrl => {
                "Backend URL\n\nProject URL of the hosted backend, e.g. https://<ref>.supabase.co.\nPress Enter to open the input box."
            }
            WizardStep::AnonKey => {
                "Anon key\n\nPublic anon key of the project.\nPress Enter to open the input box."
            }
            WizardStep::AccessToken => {
                "Access token\n\nRider access token. Leave empty to use the anon key.\nPress Enter to open the input box."
            }
            WizardStep::RiderId => {
                "Rider ID\n\nYour profile id in the profiles table.\nPress Enter to open the input box."
            }
            WizardStep::Complete => {
                "Setup complete!\n\nPress Enter to go to the home screen."
            }
        }
    }

    /// 現在のステップ番号を取得（1始まり）
    pub fn get_step_number(&self) -> usize {
        match self.current_step {
            WizardStep::Welcome => 1,
            WizardStep::BackendUrl => 2,
            WizardStep::AnonKey => 3,
            WizardStep::AccessToken => 4,
            WizardStep::RiderId => 5,
            WizardStep::Complete => 6,
        }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_walk_to_complete() {
        let mut w = WizardState::new();
        let mut numbers = vec![w.get_step_number()];
        for _ in 0..6 {
            w.next_step();
            numbers.push(w.get_step_number());
        }
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 6]);
        assert_eq!(w.current_step, WizardStep::Complete);
    }

    #[test]
    fn test_skip_to_demo_still_asks_rider_id() {
        let mut w = WizardState::new();
        w.skip_to_demo();
        assert_eq!(w.current_step, WizardStep::RiderId);
    }
}
