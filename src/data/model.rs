use std::collections::HashMap;
use std::fmt;

use super::units::format_si;

// ---------------------------------------------------------------------------
// Value – a single cell, as surfaced to the user
// ---------------------------------------------------------------------------

/// One cell of the operating-point table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) if v.is_nan() => write!(f, "<missing>"),
            Value::Number(v) => write!(f, "{}", format_si(*v)),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column – named, homogeneously typed storage
// ---------------------------------------------------------------------------

/// Column storage. Missing numeric cells are stored as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, row: usize) -> Option<Value> {
        match self {
            ColumnData::Numeric(v) => v.get(row).map(|x| Value::Number(*x)),
            ColumnData::Text(v) => v.get(row).map(|s| Value::Text(s.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Column {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// OperatingPointTable – the complete loaded dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("column '{name}' has {got} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        got: usize,
        expected: usize,
    },
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// Column-oriented table: one row per simulated operating point.
///
/// Column order is the order of the source file, followed by any derived
/// columns appended at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatingPointTable {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    n_rows: usize,
}

impl OperatingPointTable {
    /// Build a table, checking that every column has the same length and
    /// that names are unique.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let n_rows = columns.first().map_or(0, |c| c.data.len());
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if col.data.len() != n_rows {
                return Err(TableError::RaggedColumn {
                    name: col.name.clone(),
                    got: col.data.len(),
                    expected: n_rows,
                });
            }
            if index.insert(col.name.clone(), i).is_some() {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self {
            columns,
            index,
            n_rows,
        })
    }

    /// Append a column to an existing table.
    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if !self.columns.is_empty() && column.data.len() != self.n_rows {
            return Err(TableError::RaggedColumn {
                name: column.name,
                got: column.data.len(),
                expected: self.n_rows,
            });
        }
        if self.index.contains_key(&column.name) {
            return Err(TableError::DuplicateColumn(column.name));
        }
        if self.columns.is_empty() {
            self.n_rows = column.data.len();
        }
        self.index.insert(column.name.clone(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows (operating points).
    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Names of the numeric columns, in table order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Values of a numeric column, `None` if absent or text.
    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        self.column(name).and_then(Column::as_numeric)
    }

    /// Every cell of one row, paired with its column name.
    pub fn row(&self, row: usize) -> Option<Vec<(String, Value)>> {
        if row >= self.n_rows {
            return None;
        }
        self.columns
            .iter()
            .map(|c| c.data.value(row).map(|v| (c.name.clone(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OperatingPointTable {
        OperatingPointTable::from_columns(vec![
            Column::numeric("VGS", vec![0.4, 0.6, 0.8]),
            Column::text("corner", vec!["tt".into(), "ff".into(), "ss".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = OperatingPointTable::from_columns(vec![
            Column::numeric("a", vec![1.0, 2.0]),
            Column::numeric("b", vec![1.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::RaggedColumn { got: 1, expected: 2, .. }));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = OperatingPointTable::from_columns(vec![
            Column::numeric("a", vec![1.0]),
            Column::numeric("a", vec![2.0]),
        ])
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("a".into()));
    }

    #[test]
    fn row_returns_every_column() {
        let t = sample();
        let row = t.row(1).unwrap();
        assert_eq!(
            row,
            vec![
                ("VGS".to_string(), Value::Number(0.6)),
                ("corner".to_string(), Value::Text("ff".into())),
            ]
        );
        assert!(t.row(3).is_none());
    }

    #[test]
    fn numeric_lookup_skips_text_columns() {
        let t = sample();
        assert!(t.numeric("VGS").is_some());
        assert!(t.numeric("corner").is_none());
        assert_eq!(t.numeric_column_names(), vec!["VGS".to_string()]);
    }
}
