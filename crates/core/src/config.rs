//! Configuration structures for the coinset dataset builder.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder replaced by the asset identifier in [`SourceConfig::file_template`].
pub const ASSET_PLACEHOLDER: &str = "{asset}";

/// Assets included in the default experiment.
pub const DEFAULT_ASSETS: &[&str] = &[
    "AVAX", "ada", "algo", "atom", "axs", "bat", "bch", "bnb", "bsv", "btc", "btt", "busd", "chz",
    "cro", "crv", "dai", "dash", "doge", "dot", "enj", "eos", "etc", "eth", "fil", "ftm", "gala",
    "hot", "icp", "link", "lrc", "luna", "mana", "matic", "mim", "near", "okb", "sand", "shib",
    "sol", "theta", "trx", "uni", "usdc", "usdt", "vet", "wbtc", "xlm", "xrp", "xtz", "zec",
];

/// Main configuration for a dataset build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Reference end date. Offset -1 is the day before this date.
    pub end_date: NaiveDate,
    /// Number of daily snapshots per asset.
    pub window_length: usize,
    /// Asset identifiers, in output order.
    pub assets: Vec<String>,
    /// Where each asset's rows live.
    pub source: SourceConfig,
    /// Output container path.
    pub output: PathBuf,
    /// Load assets in parallel.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            end_date: NaiveDate::from_ymd_opt(2021, 12, 8).unwrap_or_default(),
            window_length: 500,
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
            source: SourceConfig::default(),
            output: PathBuf::from("coingecko_snapshot/unified_data"),
            parallel: false,
        }
    }
}

impl DatasetConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.window_length == 0 {
            return Err(Error::config("window_length must be positive"));
        }
        if self.assets.is_empty() {
            return Err(Error::config("asset list is empty"));
        }
        if !self.source.file_template.contains(ASSET_PLACEHOLDER) {
            return Err(Error::config(format!(
                "file_template {:?} does not contain {ASSET_PLACEHOLDER}",
                self.source.file_template
            )));
        }
        Ok(())
    }
}

/// Location of per-asset row files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory containing the row files.
    pub base_dir: PathBuf,
    /// File name template, e.g. `{asset}-usd-max.csv`.
    pub file_template: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("coingecko_snapshot"),
            file_template: format!("{ASSET_PLACEHOLDER}-usd-max.csv"),
        }
    }
}

impl SourceConfig {
    /// Resolve the row file for an asset.
    pub fn path_for(&self, asset: &str) -> PathBuf {
        self.base_dir
            .join(self.file_template.replace(ASSET_PLACEHOLDER, asset))
    }
}
