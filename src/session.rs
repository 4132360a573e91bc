//! ライダーのセッション（アクセストークンとプロフィール）。
//!
//! グローバル状態を持たず、必要な画面・コンポーネントへ明示的に渡す。

use crate::{backend::models::Profile, config::Config};

/// 画面表示に使うライダーのプロフィール。
#[derive(Clone, Debug, PartialEq)]
pub struct RiderProfile {
    /// バックエンド上のプロフィールID。
    pub id: String,
    /// 表示名。
    pub full_name: String,
    /// 電話番号（未登録なら空）。
    pub phone: String,
    /// 平均評価。
    pub rating: f64,
    /// オンライン状態。
    pub is_online: bool,
}

/// 認証済みライダーのコンテキスト。
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// バックエンドへ送るアクセストークン（未設定ならanonキーで代用）。
    pub access_token: Option<String>,
    /// 現在のプロフィール。
    pub profile: RiderProfile,
}

impl Session {
    /// 設定値からセッションを組み立てる。
    pub fn from_config(cfg: &Config) -> Self {
        // 空文字のトークンは未設定として扱う。
        let access_token =
            Some(cfg.backend.access_token.trim().to_string()).filter(|t| !t.is_empty());
        Self {
            access_token,
            profile: RiderProfile {
                id: cfg.rider.id.clone(),
                full_name: cfg.rider.full_name.clone(),
                phone: String::new(),
                rating: 0.0,
                is_online: false,
            },
        }
    }

    /// ライダーID。
    pub fn rider_id(&self) -> &str {
        &self.profile.id
    }

    /// バックエンドから取得したプロフィールで上書きする。
    pub fn apply_profile(&mut self, p: Profile) {
        // 名前が未登録なら設定値を残す。
        if let Some(name) = p.full_name.filter(|n| !n.is_empty()) {
            self.profile.full_name = name;
        }
        self.profile.id = p.id;
        self.profile.phone = p.phone.unwrap_or_default();
        self.profile.rating = p.rating;
        self.profile.is_online = p.is_online;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_treats_blank_token_as_missing() {
        // 空白だけのトークンはNoneになることを検証する。
        let mut cfg = Config::default();
        cfg.backend.access_token = "  ".into();
        let s = Session::from_config(&cfg);
        assert_eq!(s.access_token, None);
        assert_eq!(s.rider_id(), cfg.rider.id);
    }

    #[test]
    fn test_apply_profile_keeps_configured_name_when_missing() {
        // プロフィールに名前が無い場合は設定の名前を維持する。
        let mut cfg = Config::default();
        cfg.rider.full_name = "Kwame Mensah".into();
        let mut s = Session::from_config(&cfg);
        s.apply_profile(Profile {
            id: "rider-1".into(),
            email: None,
            full_name: None,
            avatar_url: None,
            phone: Some("+233 24 123 4567".into()),
            rating: 4.8,
            is_online: true,
        });
        assert_eq!(s.profile.full_name, "Kwame Mensah");
        assert_eq!(s.profile.phone, "+233 24 123 4567");
        assert!(s.profile.is_online);
        assert_eq!(s.rider_id(), "rider-1");
    }
}
