use super::condition::Condition;
use super::model::OperatingPointTable;
use super::sizing::SizedTable;

// ---------------------------------------------------------------------------
// Filtered view: conjunction of all active conditions
// ---------------------------------------------------------------------------

/// Rows of a table that satisfy every active condition.
///
/// Always rebuilt from scratch by [`FilteredView::compute`]; never patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    /// `mask[row]` is true when the row satisfies all conditions.
    pub mask: Vec<bool>,
    /// Ascending indices of the matching rows.
    pub indices: Vec<usize>,
}

impl FilteredView {
    /// View with every row of the table selected (no conditions).
    pub fn full(table: &OperatingPointTable) -> Self {
        Self {
            mask: vec![true; table.len()],
            indices: (0..table.len()).collect(),
        }
    }

    /// Evaluate the conjunction of `conditions` over `table`.
    ///
    /// A condition whose column is missing or not numeric rejects every row.
    /// That cannot happen for conditions validated against the same table,
    /// but a stale list applied to a freshly loaded table stays sound.
    pub fn compute<'a>(
        table: &OperatingPointTable,
        conditions: impl IntoIterator<Item = &'a Condition>,
        tolerance_percent: f64,
    ) -> Self {
        Self::evaluate(table, conditions, tolerance_percent, None)
    }

    /// Evaluate `conditions` over width-sized candidates.
    ///
    /// Each row counts as satisfying the condition it was sized for: the
    /// targeted parameter sits exactly on that threshold, which a strict
    /// `>` or `<` would otherwise reject.
    pub fn compute_sized<'a>(
        sized: &SizedTable,
        conditions: impl IntoIterator<Item = &'a Condition>,
        tolerance_percent: f64,
    ) -> Self {
        Self::evaluate(&sized.table, conditions, tolerance_percent, Some(sized.targets.as_slice()))
    }

    fn evaluate<'a>(
        table: &OperatingPointTable,
        conditions: impl IntoIterator<Item = &'a Condition>,
        tolerance_percent: f64,
        targets: Option<&[usize]>,
    ) -> Self {
        let mut mask = vec![true; table.len()];
        for (position, cond) in conditions.into_iter().enumerate() {
            let Some(values) = table.numeric(cond.column()) else {
                mask.fill(false);
                break;
            };
            for (row, (keep, &v)) in mask.iter_mut().zip(values).enumerate() {
                let exempt = targets.is_some_and(|t| t.get(row) == Some(&position));
                if *keep && !exempt && !cond.holds(v, tolerance_percent) {
                    *keep = false;
                }
            }
        }
        let indices = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        Self { mask, indices }
    }

    /// Number of matching rows.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.mask.get(row).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn vsb_table() -> OperatingPointTable {
        OperatingPointTable::from_columns(vec![
            Column::numeric("VSB", vec![0.1, 0.25, 0.35, 0.5]),
            Column::numeric("gm", vec![1e-3, 2e-3, f64::NAN, 4e-3]),
        ])
        .unwrap()
    }

    #[test]
    fn no_conditions_keeps_everything() {
        let t = vsb_table();
        let view = FilteredView::compute(&t, [], 1.0);
        assert_eq!(view, FilteredView::full(&t));
    }

    #[test]
    fn range_conditions_intersect() {
        let t = vsb_table();
        let conds = [
            Condition::parse(&t, "VSB", ">", "0.2").unwrap(),
            Condition::parse(&t, "VSB", "<", "0.4").unwrap(),
        ];
        let view = FilteredView::compute(&t, &conds, 1.0);
        assert_eq!(view.indices, vec![1, 2]);
        assert_eq!(view.mask, vec![false, true, true, false]);
    }

    #[test]
    fn nan_cells_are_excluded() {
        let t = vsb_table();
        let conds = [Condition::parse(&t, "gm", ">", "0").unwrap()];
        let view = FilteredView::compute(&t, &conds, 1.0);
        assert_eq!(view.indices, vec![0, 1, 3]);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let t = vsb_table();
        let conds = [Condition::parse(&t, "VSB", ">", "10").unwrap()];
        let view = FilteredView::compute(&t, &conds, 1.0);
        assert!(view.is_empty());
        assert_eq!(view.mask.len(), 4);
    }

    #[test]
    fn sized_rows_satisfy_their_own_condition() {
        let t = OperatingPointTable::from_columns(vec![
            Column::numeric("gm", vec![2e-3, 2e-3, 5e-3]),
            Column::numeric("VSB", vec![0.1, 0.3, 0.3]),
        ])
        .unwrap();
        let conds = [
            Condition::parse(&t, "gm", ">", "2m").unwrap(),
            Condition::parse(&t, "VSB", ">", "0.2").unwrap(),
        ];
        let sized = SizedTable {
            table: t,
            targets: vec![0, 0, 0],
        };
        let view = FilteredView::compute_sized(&sized, &conds, 1.0);
        assert_eq!(view.indices, vec![1, 2]);

        let plain = FilteredView::compute(&sized.table, &conds, 1.0);
        assert_eq!(plain.indices, vec![2]);
    }

    #[test]
    fn stale_condition_rejects_all_rows() {
        let t = vsb_table();
        let cond = Condition::parse(&t, "gm", ">", "0").unwrap();
        let other = OperatingPointTable::from_columns(vec![Column::numeric("VSB", vec![1.0])])
            .unwrap();
        let view = FilteredView::compute(&other, [&cond], 1.0);
        assert!(view.is_empty());
    }
}
