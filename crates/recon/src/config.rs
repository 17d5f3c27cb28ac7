use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::ReconciledEntity;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default)]
    pub scoring: ScoringWeights,
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Header names looked up in the loaded tables. Defaults match the game's
/// stats export.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub id: String,
    /// Optional in the data; a missing name column yields empty names.
    pub name: String,
    pub power: String,
    pub kill_points: String,
    pub deaths: String,
    pub tier4_kills: String,
    pub tier5_kills: String,
    pub required_kills: String,
    pub required_deaths: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: "Governor ID".into(),
            name: "Governor Name".into(),
            power: "Power".into(),
            kill_points: "Kill Points".into(),
            deaths: "Deads".into(),
            tier4_kills: "Tier 4 Kills".into(),
            tier5_kills: "Tier 5 Kills".into(),
            required_kills: "Required Kills".into(),
            required_deaths: "Required Deaths".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring weights
// ---------------------------------------------------------------------------

/// Per-unit weights of the DKP formula.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub deaths: f64,
    pub tier5: f64,
    pub tier4: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            deaths: 15.0,
            tier5: 10.0,
            tier4: 4.0,
        }
    }
}

impl ScoringWeights {
    /// `deads_change * deaths + tier5_kills_change * tier5 + tier4_kills_change * tier4`.
    pub fn dkp(&self, entity: &ReconciledEntity) -> f64 {
        entity.deads_change * self.deaths
            + entity.tier5_kills_change * self.tier5
            + entity.tier4_kills_change * self.tier4
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        for (name, value) in [("deaths", self.deaths), ("tier5", self.tier5), ("tier4", self.tier4)] {
            if !value.is_finite() {
                return Err(ReconError::InvalidWeights(format!("{name} = {value} is not finite")));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.scoring.validate()?;

        let c = &self.columns;
        let required = [
            ("id", &c.id),
            ("power", &c.power),
            ("kill_points", &c.kill_points),
            ("deaths", &c.deaths),
            ("tier4_kills", &c.tier4_kills),
            ("tier5_kills", &c.tier5_kills),
            ("required_kills", &c.required_kills),
            ("required_deaths", &c.required_deaths),
        ];
        for (field, header) in required {
            if header.trim().is_empty() {
                return Err(ReconError::InvalidConfig(format!(
                    "columns.{field} must name a header"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config, ReconConfig::default());
        assert_eq!(config.scoring.deaths, 15.0);
        assert_eq!(config.scoring.tier5, 10.0);
        assert_eq!(config.scoring.tier4, 4.0);
        assert_eq!(config.columns.id, "Governor ID");
        assert_eq!(config.columns.deaths, "Deads");
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let input = r#"
[columns]
id = "ID"

[scoring]
deaths = 20
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.columns.id, "ID");
        assert_eq!(config.columns.kill_points, "Kill Points");
        assert_eq!(config.scoring.deaths, 20.0);
        assert_eq!(config.scoring.tier5, 10.0);
    }

    #[test]
    fn reject_blank_column_name() {
        let err = ReconConfig::from_toml("[columns]\nkill_points = \"  \"\n").unwrap_err();
        assert!(matches!(err, ReconError::InvalidConfig(_)));
        assert_eq!(err.to_string(), "invalid config: columns.kill_points must name a header");
    }

    #[test]
    fn reject_non_finite_weight() {
        let err = ReconConfig::from_toml("[scoring]\ntier4 = nan\n").unwrap_err();
        assert!(err.to_string().contains("tier4"));
    }

    #[test]
    fn reject_unknown_value_type() {
        let err = ReconConfig::from_toml("[scoring]\ndeaths = \"lots\"\n").unwrap_err();
        assert!(matches!(err, ReconError::InvalidConfig(_)));
    }

    #[test]
    fn dkp_formula() {
        use crate::model::{Metrics, Requirement};
        let before = Metrics::default();
        let after = Metrics { deaths: 2.0, tier5_kills: 3.0, tier4_kills: 5.0, ..Default::default() };
        let e = ReconciledEntity::new("P".into(), String::new(), before, after, Requirement::default());
        assert_eq!(ScoringWeights::default().dkp(&e), 2.0 * 15.0 + 3.0 * 10.0 + 5.0 * 4.0);
    }
}
