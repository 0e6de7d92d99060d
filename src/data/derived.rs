use std::f64::consts::PI;

use super::model::{Column, OperatingPointTable};

// ---------------------------------------------------------------------------
// Derived figure-of-merit columns
// ---------------------------------------------------------------------------

/// A column computed element-wise from two source columns.
struct Derivation {
    name: &'static str,
    lhs: &'static str,
    rhs: &'static str,
    combine: fn(f64, f64) -> f64,
}

fn product(a: f64, b: f64) -> f64 {
    a * b
}

fn ratio(a: f64, b: f64) -> f64 {
    a / b
}

fn transit_frequency(gm: f64, cgg: f64) -> f64 {
    gm / (2.0 * PI * cgg)
}

const DERIVATIONS: [Derivation; 4] = [
    Derivation {
        name: "intrinsic_gain",
        lhs: "gm",
        rhs: "rout",
        combine: product,
    },
    Derivation {
        name: "ft",
        lhs: "gm",
        rhs: "cgg",
        combine: transit_frequency,
    },
    Derivation {
        name: "gmoverid",
        lhs: "gm",
        rhs: "id",
        combine: ratio,
    },
    Derivation {
        name: "area",
        lhs: "W",
        rhs: "L",
        combine: product,
    },
];

/// Append `intrinsic_gain`, `ft`, `gmoverid` and `area` where their source
/// columns are numeric and the column does not already exist.
///
/// Returns the names of the columns that were added.
pub fn add_derived_columns(table: &mut OperatingPointTable) -> Vec<&'static str> {
    let mut added = Vec::new();
    for d in &DERIVATIONS {
        if table.has_column(d.name) {
            continue;
        }
        let (Some(lhs), Some(rhs)) = (table.numeric(d.lhs), table.numeric(d.rhs)) else {
            continue;
        };
        let values: Vec<f64> = lhs
            .iter()
            .zip(rhs)
            .map(|(&a, &b)| (d.combine)(a, b))
            .collect();
        // Both source columns belong to this table, so lengths always agree.
        if table.push_column(Column::numeric(d.name, values)).is_ok() {
            added.push(d.name);
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn adds_all_figures_of_merit() {
        let mut t = OperatingPointTable::from_columns(vec![
            Column::numeric("W", vec![2e-6]),
            Column::numeric("L", vec![1e-6]),
            Column::numeric("gm", vec![1e-3]),
            Column::numeric("rout", vec![50e3]),
            Column::numeric("cgg", vec![1e-15]),
            Column::numeric("id", vec![100e-6]),
        ])
        .unwrap();

        let added = add_derived_columns(&mut t);
        assert_eq!(added, vec!["intrinsic_gain", "ft", "gmoverid", "area"]);
        assert_relative_eq!(t.numeric("intrinsic_gain").unwrap()[0], 50.0);
        assert_relative_eq!(t.numeric("ft").unwrap()[0], 1e12 / (2.0 * PI));
        assert_relative_eq!(t.numeric("gmoverid").unwrap()[0], 10.0);
        assert_relative_eq!(t.numeric("area").unwrap()[0], 2e-12);
    }

    #[test]
    fn skips_missing_sources_and_existing_columns() {
        let mut t = OperatingPointTable::from_columns(vec![
            Column::numeric("gm", vec![1e-3]),
            Column::numeric("id", vec![1e-4]),
            Column::numeric("gmoverid", vec![7.0]),
        ])
        .unwrap();

        assert!(add_derived_columns(&mut t).is_empty());
        assert_eq!(t.numeric("gmoverid").unwrap(), &[7.0]);
    }
}
