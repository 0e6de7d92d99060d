use crate::color::{Colormap, HueScale};

use super::filter::FilteredView;
use super::model::OperatingPointTable;
use super::pick::nearest_point;

// ---------------------------------------------------------------------------
// Plot configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlotConfigError {
    #[error("no table loaded")]
    NoTable,
    #[error("no {0} column selected")]
    Unselected(&'static str),
    #[error("unknown column '{0}'")]
    MissingColumn(String),
    #[error("column '{0}' is not numeric and cannot be plotted")]
    NonNumericColumn(String),
}

/// Which columns are projected onto the plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotConfig {
    pub x: String,
    pub y: String,
    pub hue: Option<String>,
}

impl PlotConfig {
    /// Check that every referenced column exists and is numeric.
    pub fn validate(&self, table: &OperatingPointTable) -> Result<(), PlotConfigError> {
        let axes = [("x", Some(&self.x)), ("y", Some(&self.y)), ("hue", self.hue.as_ref())];
        for (axis, name) in axes {
            let Some(name) = name else { continue };
            if name.is_empty() {
                return Err(PlotConfigError::Unselected(axis));
            }
            let col = table
                .column(name)
                .ok_or_else(|| PlotConfigError::MissingColumn(name.clone()))?;
            if !col.is_numeric() {
                return Err(PlotConfigError::NonNumericColumn(name.clone()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Display options
// ---------------------------------------------------------------------------

/// Which side of the hue threshold is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdDirection {
    /// Hide rows whose hue is below the threshold.
    #[default]
    Down,
    /// Hide rows whose hue is above the threshold.
    Up,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOptions {
    /// Plot only rows in the filtered view; otherwise plot every row and
    /// mark which ones match.
    pub only_matching: bool,
    /// Hue cut-off as a percentage of the hue range.
    pub hue_threshold: Option<f64>,
    pub threshold_direction: ThresholdDirection,
    pub colormap: Colormap,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            only_matching: true,
            hue_threshold: None,
            threshold_direction: ThresholdDirection::Down,
            colormap: Colormap::Viridis,
        }
    }
}

// ---------------------------------------------------------------------------
// Projection – what is actually drawn
// ---------------------------------------------------------------------------

/// The plotted subset of a table, in table order.
///
/// `rows[i]`, `points[i]`, `matched[i]` and `hue[i]` all describe the same
/// marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub config: PlotConfig,
    pub rows: Vec<usize>,
    pub points: Vec<[f64; 2]>,
    pub matched: Vec<bool>,
    pub hue: Option<Vec<f64>>,
    pub hue_scale: Option<HueScale>,
}

fn finite_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

impl Projection {
    pub fn build(
        table: &OperatingPointTable,
        view: &FilteredView,
        config: &PlotConfig,
        options: &DisplayOptions,
    ) -> Result<Self, PlotConfigError> {
        config.validate(table)?;
        let numeric = |name: &str| {
            table
                .numeric(name)
                .ok_or_else(|| PlotConfigError::NonNumericColumn(name.to_string()))
        };
        let xs = numeric(&config.x)?;
        let ys = numeric(&config.y)?;
        let hue_values = config.hue.as_deref().map(numeric).transpose()?;

        let mut rows: Vec<usize> = if options.only_matching {
            view.indices.clone()
        } else {
            (0..table.len()).collect()
        };

        if let (Some(hv), Some(pct)) = (hue_values, options.hue_threshold) {
            if let Some((lo, hi)) = finite_range(rows.iter().map(|&r| hv[r])) {
                let cut = lo + pct / 100.0 * (hi - lo);
                rows.retain(|&r| match options.threshold_direction {
                    ThresholdDirection::Down => hv[r] >= cut,
                    ThresholdDirection::Up => hv[r] <= cut,
                });
            }
        }

        rows.retain(|&r| xs[r].is_finite() && ys[r].is_finite());

        let points = rows.iter().map(|&r| [xs[r], ys[r]]).collect();
        let matched = rows.iter().map(|&r| view.contains(r)).collect();
        let hue: Option<Vec<f64>> = hue_values.map(|hv| rows.iter().map(|&r| hv[r]).collect());
        let hue_scale = match (&config.hue, &hue) {
            (Some(column), Some(values)) => {
                finite_range(values.iter().copied()).map(|(min, max)| HueScale {
                    column: column.clone(),
                    min,
                    max,
                    colormap: options.colormap,
                })
            }
            _ => None,
        };

        Ok(Self {
            config: config.clone(),
            rows,
            points,
            matched,
            hue,
            hue_scale,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Table row of the marker nearest to `click`, see [`nearest_point`].
    pub fn pick(&self, click: [f64; 2], scale: [f64; 2], max_distance: Option<f64>) -> Option<usize> {
        nearest_point(&self.points, click, scale, max_distance).map(|i| self.rows[i])
    }

    /// Marker index of a table row, if it is plotted.
    pub fn marker_of(&self, row: usize) -> Option<usize> {
        self.rows.binary_search(&row).ok()
    }
}
