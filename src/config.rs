//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::trip::{
    disposal::{self, DisposalSite},
    gate::DEFAULT_COUNTDOWN_SECS,
};

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Hosted backend endpoint and keys.
    pub backend: BackendCfg,
    /// Rider identity and payout details.
    pub rider: RiderCfg,
    /// Request countdown and polling behaviour.
    pub dispatch: DispatchCfg,
    /// Disposal sites offered during a trip.
    #[serde(default = "disposal::default_sites")]
    pub disposal_sites: Vec<DisposalSite>,
}

/// Backend-as-a-service connection values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendCfg {
    /// Project URL, e.g. `https://<ref>.supabase.co`. Empty means demo mode.
    pub url: String,
    /// Public anon key sent as `apikey`.
    pub anon_key: String,
    /// Rider access token; falls back to the anon key when empty.
    #[serde(default)]
    pub access_token: String,
}

/// Rider values used for dispatch and withdrawals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderCfg {
    /// Profile id in the `profiles` table.
    pub id: String,
    /// Display name until the profile is loaded.
    pub full_name: String,
    /// Mobile money number receiving withdrawals.
    pub momo_number: String,
}

/// Timing values for the request flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchCfg {
    /// Seconds a rider has to answer a request.
    pub countdown_secs: u32,
    /// Seconds between offer polls while online and idle.
    pub poll_interval_secs: u64,
    /// Seconds a transient notice stays on screen.
    pub notice_secs: u64,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    /// True when no backend is configured and the demo data source is used.
    pub fn is_demo(&self) -> bool {
        self.backend.url.trim().is_empty() || self.backend.anon_key.trim().is_empty()
    }
}

impl Default for Config {
    /// Defaults run the client against the demo data source.
    fn default() -> Self {
        Self {
            backend: BackendCfg {
                url: "".into(),
                anon_key: "".into(),
                access_token: "".into(),
            },
            rider: RiderCfg {
                id: "RDR-2024-001".into(),
                full_name: "Your Name".into(),
                momo_number: "".into(),
            },
            dispatch: DispatchCfg {
                countdown_secs: DEFAULT_COUNTDOWN_SECS,
                poll_interval_secs: 5,
                notice_secs: 3,
            },
            disposal_sites: disposal::default_sites(),
        }
    }
}
