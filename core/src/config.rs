use serde::{Deserialize, Serialize};

/// Volume band used to pick peer lenders around a reference lender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerBandConfig {
    /// Exclusive lower bound, as a multiple of the reference volume.
    pub lower: f64,
    /// Exclusive upper bound, as a multiple of the reference volume.
    pub upper: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Rows emitted by the top-lender ranker before requested-lender pinning.
    pub top_lender_count: usize,
    /// LMI/MUI applicant boundary as a percent of area median family income.
    pub lmi_income_percent: i64,
    pub peer_band: PeerBandConfig,
}

impl AnalyticsConfig {
    /// Load from the data/ directory.
    /// In tests, use AnalyticsConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/analytics.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AnalyticsConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            top_lender_count: 20,
            lmi_income_percent: 80,
            peer_band: PeerBandConfig {
                lower: 0.5,
                upper: 2.0,
            },
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(1..=100).contains(&self.lmi_income_percent) {
            anyhow::bail!(
                "lmi_income_percent must be within 1..=100, got {}",
                self.lmi_income_percent
            );
        }
        if self.peer_band.lower < 0.0 || self.peer_band.lower >= self.peer_band.upper {
            anyhow::bail!(
                "peer_band must satisfy 0 <= lower < upper, got {}..{}",
                self.peer_band.lower,
                self.peer_band.upper
            );
        }
        Ok(())
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self::default_test()
    }
}
