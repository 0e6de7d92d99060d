use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::model::OperatingPointTable;
use super::units::parse_si;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a condition was rejected at entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConditionError {
    #[error("no table loaded")]
    NoTable,
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),
    #[error("threshold '{0}' is not a finite number")]
    InvalidThreshold(String),
    #[error("unsupported operator '{0}' (expected one of >, <, ==, >=, <=)")]
    UnsupportedOperator(String),
}

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Comparison kind of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Greater,
    Less,
    Equal,
    GreaterEqual,
    LessEqual,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Greater,
        Operator::Less,
        Operator::Equal,
        Operator::GreaterEqual,
        Operator::LessEqual,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::Equal => "==",
            Operator::GreaterEqual => ">=",
            Operator::LessEqual => "<=",
        }
    }

    /// Compare `value` against `threshold`.
    ///
    /// `Equal` accepts values within `tolerance` (an absolute band). `NaN`
    /// never satisfies any operator.
    pub fn holds(self, value: f64, threshold: f64, tolerance: f64) -> bool {
        match self {
            Operator::Greater => value > threshold,
            Operator::Less => value < threshold,
            Operator::GreaterEqual => value >= threshold,
            Operator::LessEqual => value <= threshold,
            Operator::Equal => (value - threshold).abs() <= tolerance,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Operator::Greater),
            "<" => Ok(Operator::Less),
            "==" | "=" => Ok(Operator::Equal),
            ">=" => Ok(Operator::GreaterEqual),
            "<=" => Ok(Operator::LessEqual),
            other => Err(ConditionError::UnsupportedOperator(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// A validated predicate over one numeric column.
///
/// Only constructible through [`Condition::new`] / [`Condition::parse`],
/// which check the column against a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    column: String,
    operator: Operator,
    threshold: f64,
}

impl Condition {
    pub fn new(
        table: &OperatingPointTable,
        column: &str,
        operator: Operator,
        threshold: f64,
    ) -> Result<Self, ConditionError> {
        let col = table
            .column(column)
            .ok_or_else(|| ConditionError::UnknownColumn(column.to_string()))?;
        if !col.is_numeric() {
            return Err(ConditionError::NonNumericColumn(column.to_string()));
        }
        if !threshold.is_finite() {
            return Err(ConditionError::InvalidThreshold(threshold.to_string()));
        }
        Ok(Self {
            column: column.to_string(),
            operator,
            threshold,
        })
    }

    /// Validate raw user input. The threshold may carry an SI prefix.
    pub fn parse(
        table: &OperatingPointTable,
        column: &str,
        operator: &str,
        threshold: &str,
    ) -> Result<Self, ConditionError> {
        let operator: Operator = operator.parse()?;
        let value = parse_si(threshold)
            .filter(|v| v.is_finite())
            .ok_or_else(|| ConditionError::InvalidThreshold(threshold.trim().to_string()))?;
        Self::new(table, column.trim(), operator, value)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Absolute band used by `==`: `tolerance_percent` of `|threshold|`.
    pub fn equality_band(&self, tolerance_percent: f64) -> f64 {
        (tolerance_percent / 100.0 * self.threshold).abs()
    }

    pub fn holds(&self, value: f64, tolerance_percent: f64) -> bool {
        self.operator
            .holds(value, self.threshold, self.equality_band(tolerance_percent))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator, self.threshold)
    }
}

/// Unvalidated condition, as read from a conditions file or clipboard.
///
/// ```json
/// [{ "column": "VSB", "operator": ">", "threshold": "0.2" }]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub column: String,
    pub operator: String,
    pub threshold: String,
}

impl ConditionSpec {
    pub fn validate(&self, table: &OperatingPointTable) -> Result<Condition, ConditionError> {
        Condition::parse(table, &self.column, &self.operator, &self.threshold)
    }
}

impl From<&Condition> for ConditionSpec {
    fn from(c: &Condition) -> Self {
        ConditionSpec {
            column: c.column.clone(),
            operator: c.operator.symbol().to_string(),
            threshold: c.threshold.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ConditionList – ordered, individually removable
// ---------------------------------------------------------------------------

/// Stable handle for removing a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionId(u64);

#[derive(Debug, Clone, Default)]
pub struct ConditionList {
    entries: Vec<(ConditionId, Condition)>,
    next_id: u64,
}

impl ConditionList {
    pub fn push(&mut self, condition: Condition) -> ConditionId {
        let id = ConditionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, condition));
        id
    }

    pub fn remove(&mut self, id: ConditionId) -> Option<Condition> {
        let pos = self.entries.iter().position(|(eid, _)| *eid == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConditionId, &Condition)> {
        self.entries.iter().map(|(id, c)| (*id, c))
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.entries.iter().map(|(_, c)| c)
    }

    pub fn to_specs(&self) -> Vec<ConditionSpec> {
        self.conditions().map(ConditionSpec::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn table() -> OperatingPointTable {
        OperatingPointTable::from_columns(vec![
            Column::numeric("VSB", vec![0.1, 0.25]),
            Column::text("corner", vec!["tt".into(), "ss".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn operator_parsing() {
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::GreaterEqual);
        assert_eq!("=".parse::<Operator>().unwrap(), Operator::Equal);
        assert_eq!(" < ".parse::<Operator>().unwrap(), Operator::Less);
        assert_eq!(
            "!=".parse::<Operator>().unwrap_err(),
            ConditionError::UnsupportedOperator("!=".into())
        );
    }

    #[test]
    fn strict_and_inclusive_bounds() {
        assert!(!Operator::Greater.holds(1.0, 1.0, 0.0));
        assert!(Operator::GreaterEqual.holds(1.0, 1.0, 0.0));
        assert!(!Operator::Less.holds(1.0, 1.0, 0.0));
        assert!(Operator::LessEqual.holds(1.0, 1.0, 0.0));
    }

    #[test]
    fn nan_never_holds() {
        for op in Operator::ALL {
            assert!(!op.holds(f64::NAN, 0.0, 1.0), "{op} accepted NaN");
        }
    }

    #[test]
    fn equality_uses_relative_band() {
        let c = Condition::parse(&table(), "VSB", "==", "0.25").unwrap();
        assert!(c.holds(0.2524, 1.0));
        assert!(!c.holds(0.2526, 1.0));
        assert!(c.holds(0.25, 0.0));
        assert!(!c.holds(0.2500001, 0.0));
    }

    #[test]
    fn parse_accepts_si_threshold() {
        let c = Condition::parse(&table(), " VSB ", ">", "250m").unwrap();
        assert_eq!(c.column(), "VSB");
        assert!((c.threshold() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_input() {
        let t = table();
        assert_eq!(
            Condition::parse(&t, "VXX", ">", "0.2").unwrap_err(),
            ConditionError::UnknownColumn("VXX".into())
        );
        assert_eq!(
            Condition::parse(&t, "corner", ">", "0.2").unwrap_err(),
            ConditionError::NonNumericColumn("corner".into())
        );
        assert_eq!(
            Condition::parse(&t, "VSB", ">", "abc").unwrap_err(),
            ConditionError::InvalidThreshold("abc".into())
        );
        assert_eq!(
            Condition::parse(&t, "VSB", ">", "inf").unwrap_err(),
            ConditionError::InvalidThreshold("inf".into())
        );
        assert!(matches!(
            Condition::parse(&t, "VSB", "=>", "1").unwrap_err(),
            ConditionError::UnsupportedOperator(_)
        ));
    }

    #[test]
    fn list_removes_by_id_and_keeps_order() {
        let t = table();
        let mut list = ConditionList::default();
        let a = list.push(Condition::parse(&t, "VSB", ">", "0").unwrap());
        let b = list.push(Condition::parse(&t, "VSB", "<", "1").unwrap());
        let c = list.push(Condition::parse(&t, "VSB", "<=", "2").unwrap());

        assert!(list.remove(b).is_some());
        assert!(list.remove(b).is_none());
        let ids: Vec<_> = list.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn specs_deserialize_from_json() {
        let specs: Vec<ConditionSpec> = serde_json::from_str(
            r#"[{"column":"VSB","operator":">","threshold":"0.2"},
                {"column":"VSB","operator":"<","threshold":"400m"}]"#,
        )
        .unwrap();
        let t = table();
        let conds: Vec<_> = specs.iter().map(|s| s.validate(&t).unwrap()).collect();
        assert_eq!(conds[1].operator(), Operator::Less);
        assert!((conds[1].threshold() - 0.4).abs() < 1e-12);
    }
}
