use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::data::condition::{
    Condition, ConditionError, ConditionId, ConditionList, ConditionSpec, Operator,
};
use crate::data::filter::FilteredView;
use crate::data::loader::load_file;
use crate::data::model::{OperatingPointTable, Value};
use crate::data::projection::{DisplayOptions, PlotConfig, PlotConfigError, Projection};
use crate::data::sizing::{SizedTable, size_for_conditions};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// The row behind the most recently clicked marker.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPoint {
    /// Row index in the working table.
    pub row: usize,
    /// Every column of that row.
    pub values: Vec<(String, Value)>,
}

/// Message shown in the top bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Condition being typed in the side panel, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionDraft {
    pub column: String,
    pub operator: Operator,
    pub threshold: String,
}

impl Default for ConditionDraft {
    fn default() -> Self {
        Self {
            column: String::new(),
            operator: Operator::Greater,
            threshold: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// All mutable state of one viewing session, independent of rendering.
///
/// The filtered view and the projection are derived values: every mutation
/// of the table, the conditions, the settings or the display options goes
/// through [`Session::refresh`], which rebuilds them from scratch.
pub struct Session {
    pub settings: Settings,
    pub display: DisplayOptions,

    /// Inputs of the side panel.
    pub draft: ConditionDraft,
    pub plot_draft: PlotConfig,

    /// Path of the loaded table.
    pub source: Option<PathBuf>,
    pub status: Option<Status>,

    /// Table as loaded (None until user loads a file).
    base: Option<OperatingPointTable>,
    /// Width-rescaled candidates, when sizing is on and applicable.
    sized: Option<SizedTable>,

    conditions: ConditionList,
    view: FilteredView,

    plot: Option<PlotConfig>,
    projection: Option<Projection>,
    /// Bumped whenever `projection` is replaced, so renderers can cache.
    generation: u64,
    selection: Option<SelectedPoint>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            display: DisplayOptions::default(),
            draft: ConditionDraft::default(),
            plot_draft: PlotConfig {
                x: String::new(),
                y: String::new(),
                hue: None,
            },
            source: None,
            status: None,
            base: None,
            sized: None,
            conditions: ConditionList::default(),
            view: FilteredView::default(),
            plot: None,
            projection: None,
            generation: 0,
            selection: None,
        }
    }

    // -- accessors --

    /// The table conditions are evaluated against: the sized candidates
    /// when width sizing is active, the loaded table otherwise.
    pub fn table(&self) -> Option<&OperatingPointTable> {
        self.sized.as_ref().map(|s| &s.table).or(self.base.as_ref())
    }

    pub fn loaded_table(&self) -> Option<&OperatingPointTable> {
        self.base.as_ref()
    }

    pub fn is_sized(&self) -> bool {
        self.sized.is_some()
    }

    pub fn conditions(&self) -> &ConditionList {
        &self.conditions
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn plot_config(&self) -> Option<&PlotConfig> {
        self.plot.as_ref()
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn selection(&self) -> Option<&SelectedPoint> {
        self.selection.as_ref()
    }

    pub fn projection_generation(&self) -> u64 {
        self.generation
    }

    fn set_projection(&mut self, projection: Option<Projection>) {
        self.projection = projection;
        self.generation += 1;
    }

    // -- loading --

    /// Load a table from disk. On failure the current table is kept and the
    /// error is reported in [`Session::status`].
    pub fn load_path(&mut self, path: &Path) -> bool {
        match load_file(path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} operating points with columns {:?}",
                    table.len(),
                    table.column_names().collect::<Vec<_>>()
                );
                self.source = Some(path.to_path_buf());
                self.set_table(table);
                true
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status = Some(Status::Error(format!("Error: {e:#}")));
                false
            }
        }
    }

    /// Ingest a newly loaded table: conditions, plot and selection reset.
    pub fn set_table(&mut self, table: OperatingPointTable) {
        let numeric = table.numeric_column_names();
        let pick_default = |preferred: &str, fallback: usize| {
            if numeric.iter().any(|c| c == preferred) {
                preferred.to_string()
            } else {
                numeric.get(fallback).or(numeric.first()).cloned().unwrap_or_default()
            }
        };
        self.plot_draft = PlotConfig {
            x: pick_default("area", 0),
            y: pick_default("id", 1),
            hue: None,
        };
        self.draft = ConditionDraft {
            column: numeric.first().cloned().unwrap_or_default(),
            ..ConditionDraft::default()
        };

        self.base = Some(table);
        self.sized = None;
        self.conditions.clear();
        self.plot = None;
        self.set_projection(None);
        self.selection = None;
        self.status = None;
        self.refresh();
    }

    // -- conditions --

    /// Validate and append a condition. Rejected input leaves the list and
    /// the view untouched.
    pub fn add_condition(
        &mut self,
        column: &str,
        operator: &str,
        threshold: &str,
    ) -> Result<ConditionId, ConditionError> {
        let result = self
            .base
            .as_ref()
            .ok_or(ConditionError::NoTable)
            .and_then(|t| Condition::parse(t, column, operator, threshold));
        self.push_validated(result)
    }

    /// Add the condition currently typed in the side panel.
    pub fn add_condition_from_draft(&mut self) -> Result<ConditionId, ConditionError> {
        let draft = self.draft.clone();
        let id = self.add_condition(&draft.column, draft.operator.symbol(), &draft.threshold)?;
        self.draft.threshold.clear();
        Ok(id)
    }

    /// Add several conditions at once; invalid ones are skipped and returned.
    pub fn add_condition_specs(&mut self, specs: &[ConditionSpec]) -> Vec<ConditionError> {
        let Some(table) = self.base.as_ref() else {
            self.status = Some(Status::Error(format!("Condition rejected: {}", ConditionError::NoTable)));
            return vec![ConditionError::NoTable];
        };
        let mut errors = Vec::new();
        for spec in specs {
            match spec.validate(table) {
                Ok(cond) => {
                    log::info!("Condition added: {cond}");
                    self.conditions.push(cond);
                }
                Err(e) => {
                    log::warn!("Condition {spec:?} rejected: {e}");
                    errors.push(e);
                }
            }
        }
        self.refresh();
        if let Some(first) = errors.first() {
            self.status = Some(Status::Error(format!(
                "{} condition(s) rejected: {first}",
                errors.len()
            )));
        }
        errors
    }

    fn push_validated(
        &mut self,
        result: Result<Condition, ConditionError>,
    ) -> Result<ConditionId, ConditionError> {
        match result {
            Ok(cond) => {
                log::info!("Condition added: {cond}");
                let id = self.conditions.push(cond);
                self.refresh();
                Ok(id)
            }
            Err(e) => {
                log::warn!("Condition rejected: {e}");
                self.status = Some(Status::Error(format!("Condition rejected: {e}")));
                Err(e)
            }
        }
    }

    pub fn remove_condition(&mut self, id: ConditionId) -> bool {
        match self.conditions.remove(id) {
            Some(cond) => {
                log::info!("Condition removed: {cond}");
                self.refresh();
                true
            }
            None => false,
        }
    }

    pub fn clear_conditions(&mut self) {
        self.conditions.clear();
        self.refresh();
    }

    /// Active conditions as pretty-printed JSON, loadable with `--conditions`.
    pub fn conditions_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.conditions.to_specs())
    }

    // -- derived state --

    /// Recompute the sized table, the filtered view and the projection.
    pub fn refresh(&mut self) {
        let Some(base) = self.base.as_ref() else {
            return;
        };

        let mut sizing_error = None;
        let was_sized = self.sized.is_some();
        self.sized = None;
        if self.settings.sizing && !self.conditions.is_empty() {
            match size_for_conditions(base, self.conditions.conditions(), self.settings.limits) {
                Ok(t) => self.sized = Some(t),
                Err(e) => {
                    log::warn!("Width sizing skipped: {e}");
                    sizing_error = Some(e);
                }
            }
        }
        // Row indices of a rebuilt sized table refer to different points.
        if was_sized || self.sized.is_some() {
            self.selection = None;
        }

        let (table, view) = match self.sized.as_ref() {
            Some(sized) => (
                &sized.table,
                FilteredView::compute_sized(
                    sized,
                    self.conditions.conditions(),
                    self.settings.tolerance_percent,
                ),
            ),
            None => (
                base,
                FilteredView::compute(
                    base,
                    self.conditions.conditions(),
                    self.settings.tolerance_percent,
                ),
            ),
        };
        self.view = view;
        log::debug!("{} of {} rows match", self.view.len(), table.len());

        self.status = Some(match sizing_error {
            Some(e) => Status::Error(format!("Width sizing: {e}")),
            None if self.view.is_empty() => Status::Info("No points match the current conditions".into()),
            None => Status::Info(format!(
                "{} of {} points match",
                self.view.len(),
                table.len()
            )),
        });

        self.rebuild_projection();
    }

    /// Re-project the current view with the applied plot configuration and
    /// display options. The selection survives only if its row is still drawn.
    pub fn rebuild_projection(&mut self) {
        let (Some(table), Some(config)) = (self.table(), self.plot.as_ref()) else {
            return;
        };
        match Projection::build(table, &self.view, config, &self.display) {
            Ok(p) => {
                if self
                    .selection
                    .as_ref()
                    .is_some_and(|sel| p.marker_of(sel.row).is_none())
                {
                    self.selection = None;
                }
                self.set_projection(Some(p));
            }
            Err(e) => {
                // A column vanished (sizing toggled); drop the stale plot.
                log::warn!("Plot configuration no longer valid: {e}");
                self.status = Some(Status::Error(format!("Plot: {e}")));
                self.plot = None;
                self.set_projection(None);
                self.selection = None;
            }
        }
    }

    // -- plotting --

    /// Apply a plot configuration. An invalid one is rejected and the
    /// previous plot stays on screen.
    pub fn plot(&mut self, config: PlotConfig) -> Result<(), PlotConfigError> {
        let table = self.table().ok_or(PlotConfigError::NoTable)?;
        match Projection::build(table, &self.view, &config, &self.display) {
            Ok(p) => {
                log::info!(
                    "Plotting {} vs {} ({} points)",
                    config.y,
                    config.x,
                    p.len()
                );
                self.status = Some(Status::Info(if p.is_empty() {
                    "No points match the current conditions".into()
                } else {
                    format!("Plotting {} vs {} ({} points)", config.y, config.x, p.len())
                }));
                if self
                    .selection
                    .as_ref()
                    .is_some_and(|sel| p.marker_of(sel.row).is_none())
                {
                    self.selection = None;
                }
                self.plot = Some(config);
                self.set_projection(Some(p));
                Ok(())
            }
            Err(e) => {
                log::warn!("Plot rejected: {e}");
                self.status = Some(Status::Error(format!("Plot rejected: {e}")));
                Err(e)
            }
        }
    }

    pub fn plot_from_draft(&mut self) -> Result<(), PlotConfigError> {
        let config = self.plot_draft.clone();
        self.plot(config)
    }

    /// Select the plotted point nearest to `click` (plot coordinates).
    ///
    /// `scale` is the visible span of each axis. A click with no marker
    /// within `settings.pick_radius` keeps the previous selection.
    pub fn pick(&mut self, click: [f64; 2], scale: [f64; 2]) -> Option<&SelectedPoint> {
        let projection = self.projection.as_ref()?;
        let table = self.sized.as_ref().map(|s| &s.table).or(self.base.as_ref())?;
        if let Some(row) = projection.pick(click, scale, Some(self.settings.pick_radius)) {
            if let Some(values) = table.row(row) {
                log::debug!("Picked row {row}");
                self.selection = Some(SelectedPoint { row, values });
            }
        }
        self.selection.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn session() -> Session {
        let mut s = Session::default();
        s.set_table(
            OperatingPointTable::from_columns(vec![
                Column::numeric("VSB", vec![0.1, 0.25, 0.35, 0.5]),
                Column::numeric("id", vec![1.0, 2.0, 3.0, 4.0]),
            ])
            .unwrap(),
        );
        s
    }

    #[test]
    fn default_axes_fall_back_to_numeric_columns() {
        let s = session();
        assert_eq!(s.plot_draft.x, "VSB");
        assert_eq!(s.plot_draft.y, "id");
        assert_eq!(s.draft.column, "VSB");
    }

    #[test]
    fn draft_is_cleared_after_add() {
        let mut s = session();
        s.draft.operator = Operator::Less;
        s.draft.threshold = "0.4".into();
        s.add_condition_from_draft().unwrap();
        assert!(s.draft.threshold.is_empty());
        assert_eq!(s.view().indices, vec![0, 1, 2]);
    }

    #[test]
    fn conditions_without_table_are_rejected() {
        let mut s = Session::default();
        assert_eq!(
            s.add_condition("VSB", ">", "0"),
            Err(ConditionError::NoTable)
        );
        assert!(matches!(s.status, Some(Status::Error(_))));
    }

    #[test]
    fn conditions_json_round_trips_through_specs() {
        let mut s = session();
        s.add_condition("VSB", ">=", "0.25").unwrap();
        let json = s.conditions_json().unwrap();
        let specs: Vec<ConditionSpec> = serde_json::from_str(&json).unwrap();
        s.clear_conditions();
        assert!(s.add_condition_specs(&specs).is_empty());
        assert_eq!(s.view().indices, vec![1, 2, 3]);
    }
}
