//! Width sizing: rescale each operating point so that one targeted
//! parameter lands exactly on its condition threshold.
//!
//! Small-signal parameters of a MOSFET at a fixed bias scale with its width:
//! `cgg`, `gm`, `gmb` and `id` are proportional to `W`, `rout` is inversely
//! proportional. Ratios such as `gm * rout` or `gm / id` are unchanged.

use super::condition::Condition;
use super::model::{Column, ColumnData, OperatingPointTable, TableError};

/// Parameters proportional to the device width.
pub const PROPORTIONAL: [&str; 4] = ["cgg", "gm", "gmb", "id"];
/// Parameters inversely proportional to the device width.
pub const INVERSE: [&str; 1] = ["rout"];

/// Name of the text column tagging which parameter a sized row targets.
pub const SIZED_FOR: &str = "sized_for";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingLimits {
    /// Rows whose rescaled width is not below this are dropped.
    pub w_max: f64,
    /// Rows whose rescaled `W/L` is not above this are dropped.
    pub wl_min: f64,
}

impl Default for SizingLimits {
    fn default() -> Self {
        Self {
            w_max: 100e-6,
            wl_min: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SizingError {
    #[error("width sizing needs a numeric '{0}' column")]
    MissingColumn(String),
    #[error("no condition targets a width-scalable parameter (cgg, gm, gmb, id, rout)")]
    NoScalableCondition,
    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scaling {
    Proportional,
    Inverse,
}

fn scaling_of(column: &str) -> Option<Scaling> {
    if PROPORTIONAL.contains(&column) {
        Some(Scaling::Proportional)
    } else if INVERSE.contains(&column) {
        Some(Scaling::Inverse)
    } else {
        None
    }
}

/// One output row: source row, width ratio `W'/W`, and the condition it
/// was sized for.
struct SizedRow<'a> {
    source: usize,
    ratio: f64,
    target: &'a str,
    threshold: f64,
    condition: usize,
}

/// Width-rescaled candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct SizedTable {
    pub table: OperatingPointTable,
    /// `targets[row]` is the position, in the condition sequence, of the
    /// condition that row was sized for. That condition holds for the row by
    /// construction, whatever its operator.
    pub targets: Vec<usize>,
}

/// Build the table of width-rescaled candidates for `conditions`.
///
/// One block of rows is produced per condition on a scalable parameter, in
/// condition order. Every column is carried over; scalable columns and `W`
/// are rescaled, the targeted column is set to the threshold, `area` is
/// recomputed and a [`SIZED_FOR`] column is added.
pub fn size_for_conditions<'a>(
    table: &OperatingPointTable,
    conditions: impl IntoIterator<Item = &'a Condition>,
    limits: SizingLimits,
) -> Result<SizedTable, SizingError> {
    let w = table
        .numeric("W")
        .ok_or_else(|| SizingError::MissingColumn("W".into()))?;
    let l = table
        .numeric("L")
        .ok_or_else(|| SizingError::MissingColumn("L".into()))?;

    let mut rows: Vec<SizedRow<'a>> = Vec::new();
    let mut any_scalable = false;

    for (position, cond) in conditions.into_iter().enumerate() {
        let Some(scaling) = scaling_of(cond.column()) else {
            continue;
        };
        let Some(param) = table.numeric(cond.column()) else {
            continue;
        };
        any_scalable = true;
        let target = cond.threshold();

        for (row, ((&w, &l), &p)) in w.iter().zip(l).zip(param).enumerate() {
            let w_new = match scaling {
                Scaling::Proportional => w * target / p,
                Scaling::Inverse => w * p / target,
            };
            // NaN fails both comparisons and is dropped with the rest.
            if w_new < limits.w_max && w_new / l > limits.wl_min {
                rows.push(SizedRow {
                    source: row,
                    ratio: w_new / w,
                    target: cond.column(),
                    threshold: target,
                    condition: position,
                });
            }
        }
    }

    if !any_scalable {
        return Err(SizingError::NoScalableCondition);
    }

    log::debug!("width sizing produced {} candidate rows", rows.len());

    let mut columns: Vec<Column> = table
        .columns()
        .iter()
        .filter(|c| c.name != SIZED_FOR && c.name != "area")
        .map(|c| rescale_column(c, &rows))
        .collect();

    let area = rows
        .iter()
        .map(|r| w[r.source] * r.ratio * l[r.source])
        .collect();
    columns.push(Column::numeric("area", area));
    columns.push(Column::text(
        SIZED_FOR,
        rows.iter().map(|r| r.target.to_string()).collect(),
    ));

    Ok(SizedTable {
        table: OperatingPointTable::from_columns(columns)?,
        targets: rows.iter().map(|r| r.condition).collect(),
    })
}

fn rescale_column(column: &Column, rows: &[SizedRow<'_>]) -> Column {
    let data = match &column.data {
        ColumnData::Numeric(values) => {
            let power = match column.name.as_str() {
                "W" => 1,
                name => match scaling_of(name) {
                    Some(Scaling::Proportional) => 1,
                    Some(Scaling::Inverse) => -1,
                    None => 0,
                },
            };
            ColumnData::Numeric(
                rows.iter()
                    .map(|r| {
                        if r.target == column.name {
                            r.threshold
                        } else {
                            values[r.source] * r.ratio.powi(power)
                        }
                    })
                    .collect(),
            )
        }
        ColumnData::Text(values) => {
            ColumnData::Text(rows.iter().map(|r| values[r.source].clone()).collect())
        }
    };
    Column {
        name: column.name.clone(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> OperatingPointTable {
        OperatingPointTable::from_columns(vec![
            Column::numeric("W", vec![1e-6, 2e-6]),
            Column::numeric("L", vec![1e-6, 1e-6]),
            Column::numeric("gm", vec![1e-3, 1e-3]),
            Column::numeric("id", vec![1e-4, 2e-4]),
            Column::numeric("rout", vec![100e3, 40e3]),
            Column::numeric("VGS", vec![0.5, 0.6]),
        ])
        .unwrap()
    }

    #[test]
    fn proportional_target_rescales_width_and_currents() {
        let t = table();
        let cond = Condition::parse(&t, "gm", ">", "2m").unwrap();
        let sized = size_for_conditions(&t, [&cond], SizingLimits::default())
            .unwrap()
            .table;

        assert_eq!(sized.len(), 2);
        let w = sized.numeric("W").unwrap();
        assert_relative_eq!(w[0], 2e-6);
        assert_relative_eq!(w[1], 4e-6);
        for &gm in sized.numeric("gm").unwrap() {
            assert_relative_eq!(gm, 2e-3);
        }
        assert_relative_eq!(sized.numeric("id").unwrap()[1], 4e-4);
        assert_relative_eq!(sized.numeric("rout").unwrap()[0], 50e3);
        assert_relative_eq!(sized.numeric("VGS").unwrap()[1], 0.6);
        assert_relative_eq!(sized.numeric("area").unwrap()[1], 4e-12);
        assert_eq!(
            sized.row(0).unwrap().last().unwrap().1.to_string(),
            "gm".to_string()
        );
    }

    #[test]
    fn inverse_target_and_limits() {
        let t = table();
        let cond = Condition::parse(&t, "rout", ">", "10k").unwrap();
        // Row 0 needs W = 10u, row 1 needs W = 8u; cap below the first.
        let limits = SizingLimits {
            w_max: 9e-6,
            wl_min: 0.5,
        };
        let sized = size_for_conditions(&t, [&cond], limits).unwrap().table;
        assert_eq!(sized.len(), 1);
        assert_relative_eq!(sized.numeric("W").unwrap()[0], 8e-6);
        assert_relative_eq!(sized.numeric("rout").unwrap()[0], 10e3);
    }

    #[test]
    fn blocks_follow_condition_order() {
        let t = table();
        let a = Condition::parse(&t, "id", ">", "100u").unwrap();
        let b = Condition::parse(&t, "gm", ">", "1m").unwrap();
        let sized = size_for_conditions(&t, [&a, &b], SizingLimits::default()).unwrap();
        assert_eq!(sized.targets, vec![0, 0, 1, 1]);
        let sized = sized.table;
        assert_eq!(sized.len(), 4);
        let tags: Vec<String> = (0..4)
            .map(|r| sized.row(r).unwrap().last().unwrap().1.to_string())
            .collect();
        assert_eq!(tags, ["id", "id", "gm", "gm"]);
    }

    #[test]
    fn requires_a_scalable_condition() {
        let t = table();
        let cond = Condition::parse(&t, "VGS", ">", "0.1").unwrap();
        assert_eq!(
            size_for_conditions(&t, [&cond], SizingLimits::default()).unwrap_err(),
            SizingError::NoScalableCondition
        );
    }

    #[test]
    fn requires_width_and_length() {
        let t = OperatingPointTable::from_columns(vec![Column::numeric("gm", vec![1.0])]).unwrap();
        let cond = Condition::parse(&t, "gm", ">", "2").unwrap();
        assert_eq!(
            size_for_conditions(&t, [&cond], SizingLimits::default()).unwrap_err(),
            SizingError::MissingColumn("W".into())
        );
    }
}
