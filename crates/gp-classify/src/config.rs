use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use classification_core::{Bounds, ConfidenceLevel, QueryGrid};
use gaussian_process::GaussianProcess;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => bail!("unknown output format '{other}' (expected text or json)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    // Classification
    pub confidence_level: f64,  // 0.95

    // Query domain
    pub x_min: f64,             // -8
    pub x_max: f64,             // 8
    pub y_min: f64,             // -8
    pub y_max: f64,             // 8
    pub grid_resolution: usize, // 50 points per axis

    // Gaussian process
    pub gp_theta0: f64,         // 0.5

    // Output
    pub output_format: OutputFormat,
    pub output_path: Option<String>,
}

impl DemoConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            confidence_level: get("CONFIDENCE_LEVEL", "0.95")
                .parse()
                .context("CONFIDENCE_LEVEL must be a number")?,

            x_min: get("DOMAIN_X_MIN", "-8.0")
                .parse()
                .context("DOMAIN_X_MIN must be a number")?,
            x_max: get("DOMAIN_X_MAX", "8.0")
                .parse()
                .context("DOMAIN_X_MAX must be a number")?,
            y_min: get("DOMAIN_Y_MIN", "-8.0")
                .parse()
                .context("DOMAIN_Y_MIN must be a number")?,
            y_max: get("DOMAIN_Y_MAX", "8.0")
                .parse()
                .context("DOMAIN_Y_MAX must be a number")?,
            grid_resolution: get("GRID_RESOLUTION", "50")
                .parse()
                .context("GRID_RESOLUTION must be a positive integer")?,

            gp_theta0: get("GP_THETA0", "0.5")
                .parse()
                .context("GP_THETA0 must be a number")?,

            output_format: get("OUTPUT_FORMAT", "text").parse()?,
            output_path: lookup("OUTPUT_PATH").filter(|p| !p.trim().is_empty()),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.confidence()?;
        self.query_grid()?;
        self.regressor()?;
        Ok(())
    }

    pub fn confidence(&self) -> Result<ConfidenceLevel> {
        ConfidenceLevel::new(self.confidence_level).context("invalid CONFIDENCE_LEVEL")
    }

    pub fn query_grid(&self) -> Result<QueryGrid> {
        let bounds = Bounds::new(self.x_min, self.x_max, self.y_min, self.y_max)
            .context("invalid DOMAIN_* bounds")?;
        QueryGrid::square(bounds, self.grid_resolution).context("invalid GRID_RESOLUTION")
    }

    pub fn regressor(&self) -> Result<GaussianProcess> {
        GaussianProcess::new(self.gp_theta0).context("invalid GP_THETA0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<DemoConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DemoConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.grid_resolution, 50);
        assert_eq!(config.gp_theta0, 0.5);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert!(config.output_path.is_none());
        config.validate().unwrap();

        let grid = config.query_grid().unwrap();
        assert_eq!(grid.shape(), (50, 50));
        assert_eq!(grid.bounds().x_min, -8.0);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("CONFIDENCE_LEVEL", "0.5"),
            ("GRID_RESOLUTION", "20"),
            ("OUTPUT_FORMAT", "JSON"),
            ("OUTPUT_PATH", "report.json"),
        ])
        .unwrap();
        assert_eq!(config.confidence().unwrap().lower_threshold(), 0.25);
        assert_eq!(config.query_grid().unwrap().len(), 400);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.output_path.as_deref(), Some("report.json"));
    }

    #[test]
    fn test_unparseable_values() {
        assert!(config_from(&[("CONFIDENCE_LEVEL", "high")]).is_err());
        assert!(config_from(&[("GRID_RESOLUTION", "-3")]).is_err());
        assert!(config_from(&[("OUTPUT_FORMAT", "svg")]).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let config = config_from(&[("CONFIDENCE_LEVEL", "1.0")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("DOMAIN_X_MIN", "9")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("GRID_RESOLUTION", "1")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("GP_THETA0", "0")]).unwrap();
        assert!(config.validate().is_err());
    }
}
