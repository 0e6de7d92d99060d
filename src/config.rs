use std::path::PathBuf;

use clap::Parser;

use crate::data::condition::ConditionSpec;
use crate::data::sizing::SizingLimits;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Filter and inspect transistor operating-point tables", long_about = None)]
pub struct Args {
    /// Operating-point table to open at startup (.csv, .json, .parquet)
    pub path: Option<PathBuf>,
    /// JSON file with conditions to apply once the table is loaded
    #[arg(long)]
    pub conditions: Option<PathBuf>,
    /// Relative tolerance of `==` conditions, in percent of the threshold
    #[arg(long, default_value_t = 1.0)]
    pub tolerance_percent: f64,
    /// Rescale device widths so width-dependent conditions are met exactly
    #[arg(long)]
    pub sizing: bool,
    /// Largest width kept by width sizing, in metres
    #[arg(long, default_value_t = 100e-6)]
    pub w_max: f64,
    /// Smallest W/L ratio kept by width sizing
    #[arg(long, default_value_t = 0.5)]
    pub wl_min: f64,
    /// Pick radius as a fraction of the visible plot span
    #[arg(long, default_value_t = 0.02)]
    pub pick_radius: f64,
}

// ---------------------------------------------------------------------------
// Runtime settings (editable from the side panel)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub tolerance_percent: f64,
    pub sizing: bool,
    pub limits: SizingLimits,
    pub pick_radius: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tolerance_percent: 1.0,
            sizing: false,
            limits: SizingLimits::default(),
            pick_radius: 0.02,
        }
    }
}

impl From<&Args> for Settings {
    fn from(args: &Args) -> Self {
        Self {
            tolerance_percent: args.tolerance_percent.max(0.0),
            sizing: args.sizing,
            limits: SizingLimits {
                w_max: args.w_max,
                wl_min: args.wl_min,
            },
            pick_radius: args.pick_radius.max(0.0),
        }
    }
}

/// Read a JSON array of [`ConditionSpec`]s.
pub fn read_condition_specs(path: &std::path::Path) -> anyhow::Result<Vec<ConditionSpec>> {
    use anyhow::Context;

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading conditions from {}", path.display()))?;
    serde_json::from_str(&text).context("parsing conditions JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_map_to_settings() {
        let args = Args::parse_from([
            "op-explorer",
            "lut.csv",
            "--sizing",
            "--w-max",
            "50e-6",
            "--tolerance-percent",
            "2.5",
        ]);
        assert_eq!(args.path, Some(PathBuf::from("lut.csv")));
        let s = Settings::from(&args);
        assert!(s.sizing);
        assert_eq!(s.limits.w_max, 50e-6);
        assert_eq!(s.limits.wl_min, 0.5);
        assert_eq!(s.tolerance_percent, 2.5);
        assert_eq!(s.pick_radius, 0.02);
    }

    #[test]
    fn defaults_match_settings_default() {
        let args = Args::parse_from(["op-explorer"]);
        assert_eq!(Settings::from(&args), Settings::default());
    }
}
