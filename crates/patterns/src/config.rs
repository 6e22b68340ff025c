use crate::error::{EngineError, Result};
use pattern_graph::ClusterBounds;
use pattern_vector_store::SimilarityBand;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for one pattern detection run.
///
/// The similarity band and dedup threshold are empirical starting points,
/// not derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum number of signals fetched per run
    pub max_signals: usize,

    /// Exclusive lower bound of the cross-domain similarity band
    pub similarity_lower: f64,

    /// Exclusive upper bound; pairs above it are near-duplicates
    pub similarity_upper: f64,

    pub min_cluster_size: usize,
    pub max_cluster_size: usize,

    /// Clusters handed to the text generator per run
    pub max_insights_per_run: usize,

    /// Candidates whose Jaccard overlap exceeds this are dropped
    pub dedup_threshold: f64,

    pub synthesis_timeout_secs: u64,

    /// Expected embedding length; 0 accepts whatever the first signal has
    pub embedding_dimension: usize,

    /// Per-member summary budget in the cluster description
    pub summary_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_signals: 200,
            similarity_lower: 0.70,
            similarity_upper: 0.95,
            min_cluster_size: 2,
            max_cluster_size: 6,
            max_insights_per_run: 15,
            dedup_threshold: 0.5,
            synthesis_timeout_secs: 90,
            embedding_dimension: 1536,
            summary_chars: 300,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading engine config from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_signals == 0 {
            return Err(EngineError::InvalidConfig(
                "max_signals must be > 0".to_string(),
            ));
        }

        self.similarity_band()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        self.cluster_bounds()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

        if !(0.0..=1.0).contains(&self.dedup_threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "dedup_threshold ({}) must be within [0, 1]",
                self.dedup_threshold
            )));
        }

        if self.synthesis_timeout_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "synthesis_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.summary_chars == 0 {
            return Err(EngineError::InvalidConfig(
                "summary_chars must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn similarity_band(&self) -> Result<SimilarityBand> {
        Ok(SimilarityBand::new(
            self.similarity_lower as f32,
            self.similarity_upper as f32,
        )?)
    }

    pub fn cluster_bounds(&self) -> Result<ClusterBounds> {
        Ok(ClusterBounds::new(
            self.min_cluster_size,
            self.max_cluster_size,
        )?)
    }

    #[must_use]
    pub const fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.synthesis_timeout(), Duration::from_secs(90));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            similarity_lower = 0.65
            max_cluster_size = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.similarity_lower, 0.65);
        assert_eq!(config.max_cluster_size, 8);
        assert_eq!(config.max_insights_per_run, 15);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = EngineConfig::from_toml_str("similarity_lowr = 0.6");
        assert!(matches!(result, Err(EngineError::ConfigParse(_))));
    }

    #[test]
    fn config_validation() {
        let mut config = EngineConfig::default();

        // Invalid: inverted band
        config.similarity_lower = 0.96;
        assert!(config.validate().is_err());

        // Invalid: min cluster below 2
        config = EngineConfig::default();
        config.min_cluster_size = 1;
        assert!(config.validate().is_err());

        // Invalid: max below min
        config = EngineConfig::default();
        config.min_cluster_size = 4;
        config.max_cluster_size = 3;
        assert!(config.validate().is_err());

        // Invalid: threshold out of range
        config = EngineConfig::default();
        config.dedup_threshold = 1.5;
        assert!(config.validate().is_err());

        // Invalid: zero timeout
        config = EngineConfig::default();
        config.synthesis_timeout_secs = 0;
        assert!(config.validate().is_err());

        // Invalid: nothing to fetch
        config = EngineConfig::default();
        config.max_signals = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_render_without_float_noise() {
        let raw = EngineConfig::default().to_toml_string().unwrap();
        assert!(raw.contains("similarity_lower = 0.7\n"), "{raw}");
        assert!(raw.contains("similarity_upper = 0.95\n"), "{raw}");
    }

    #[test]
    fn band_is_narrowed_from_config() {
        let band = EngineConfig::default().similarity_band().unwrap();
        assert!(band.contains(0.80));
        assert!(!band.contains(0.70));
        assert!(!band.contains(0.95));
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let config = EngineConfig {
            dedup_threshold: 0.4,
            ..Default::default()
        };
        let raw = config.to_toml_string().unwrap();
        assert!(raw.contains("dedup_threshold = 0.4"));
        assert_eq!(EngineConfig::from_toml_str(&raw).unwrap(), config);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "max_signals = 50\n").unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap().max_signals, 50);
        assert!(EngineConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
