//! 処分場の選択（ステータス遷移とは独立した表示用の操作）。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::stepper::TripStatus;

/// 処分場1件。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisposalSite {
    /// 施設名。
    pub name: String,
    /// 所在地。
    pub address: String,
    /// 現在地からの距離（km）。
    pub distance_km: f64,
}

impl DisposalSite {
    /// 施設名を目的地にした経路案内URL。
    pub fn directions_url(&self) -> String {
        format!(
            "https://www.google.com/maps/dir/?api=1&destination={}",
            urlencoding::encode(&self.name)
        )
    }
}

/// 既定の近隣処分場。
pub fn default_sites() -> Vec<DisposalSite> {
    vec![
        DisposalSite {
            name: "Kpone Landfill Site".into(),
            address: "Kpone, Greater Accra".into(),
            distance_km: 3.2,
        },
        DisposalSite {
            name: "Tema Waste Transfer Station".into(),
            address: "Community 1, Tema".into(),
            distance_km: 5.8,
        },
        DisposalSite {
            name: "Accra Compost Plant".into(),
            address: "Adjen Kotoku, Accra".into(),
            distance_km: 7.1,
        },
    ]
}

/// 処分場を選べなかった理由。
#[derive(Debug, Error, PartialEq)]
pub enum DisposalError {
    #[error("disposal sites are not available while {0}")]
    NotAvailable(&'static str),
    #[error("no disposal site #{0}")]
    UnknownSite(usize),
}

/// 処分場一覧と選択状態。
#[derive(Clone, Debug, PartialEq)]
pub struct DisposalPicker {
    /// 候補一覧。
    sites: Vec<DisposalSite>,
    /// 選択中のインデックス。
    selected: Option<usize>,
}

impl DisposalPicker {
    pub fn new(sites: Vec<DisposalSite>) -> Self {
        Self {
            sites,
            selected: None,
        }
    }

    pub fn sites(&self) -> &[DisposalSite] {
        &self.sites
    }

    /// 現在のステータスで処分場を選ぶ。
    pub fn select(
        &mut self,
        status: TripStatus,
        idx: usize,
    ) -> Result<&DisposalSite, DisposalError> {
        // 回収済み〜処分場へ移動中の間だけ選択できる。
        if !status.allows_disposal_selection() {
            return Err(DisposalError::NotAvailable(status.label()));
        }
        let site = self.sites.get(idx).ok_or(DisposalError::UnknownSite(idx))?;
        tracing::info!("disposal site selected: {}", site.name);
        self.selected = Some(idx);
        Ok(site)
    }

    /// 選択中の処分場。
    pub fn selected(&self) -> Option<&DisposalSite> {
        self.selected.and_then(|i| self.sites.get(i))
    }

    /// ナビゲーションの目的地表示。未選択なら集荷先住所。
    pub fn destination_label<'a>(&'a self, pickup_address: &'a str) -> &'a str {
        self.selected().map_or(pickup_address, |s| s.name.as_str())
    }
}
