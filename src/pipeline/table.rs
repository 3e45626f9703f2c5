//! Row-oriented table model consumed by the learners
//!
//! Both learners stream rows; the correlation engine scans the same source
//! twice, so a `RowSource` must be re-iterable.

use std::fmt;

/// A single table cell. Missingness is its own state, never a sentinel value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Numeric(f64),
    Nominal(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// The numeric value, if this is a numeric cell
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// The string value, if this is a nominal cell
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Nominal(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Whether this cell can be handled by a column of the given kind.
    /// Missing cells are compatible with every kind.
    pub fn is_compatible(&self, kind: ColumnKind) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Numeric(_) => kind == ColumnKind::Numeric,
            Cell::Nominal(_) => kind == ColumnKind::Nominal,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => write!(f, "?"),
            Cell::Numeric(v) => write!(f, "{}", v),
            Cell::Nominal(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Numeric(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Nominal(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Nominal(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Missing, Into::into)
    }
}

/// Logical type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Nominal,
    /// Neither numeric nor nominal; learners ignore such columns
    Unsupported,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Nominal => "nominal",
            ColumnKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered column specifications of a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSpec {
    columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &ColumnSpec {
        &self.columns[index]
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// A fixed-width row of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<Cell>> for Row {
    fn from(cells: Vec<Cell>) -> Self {
        Self::new(cells)
    }
}

/// A re-iterable stream of rows with a known specification and row count
pub trait RowSource {
    fn spec(&self) -> &TableSpec;

    /// Number of rows; used for progress reporting
    fn row_count(&self) -> usize;

    /// Iterate all rows from the beginning
    fn rows(&self) -> Box<dyn Iterator<Item = &Row> + '_>;
}

/// A table held fully in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTable {
    spec: TableSpec,
    rows: Vec<Row>,
}

impl InMemoryTable {
    /// Create a table; every row must have exactly one cell per column.
    pub fn new(spec: TableSpec, rows: Vec<Row>) -> anyhow::Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != spec.len())
        {
            anyhow::bail!(
                "Row {} has {} cells but the table has {} columns",
                index,
                row.len(),
                spec.len()
            );
        }
        Ok(Self { spec, rows })
    }

    /// Build a table column by column; all columns must have the same length.
    pub fn from_columns(columns: Vec<(ColumnSpec, Vec<Cell>)>) -> anyhow::Result<Self> {
        let height = columns.first().map_or(0, |(_, cells)| cells.len());
        if let Some((spec, cells)) = columns.iter().find(|(_, cells)| cells.len() != height) {
            anyhow::bail!(
                "Column '{}' has {} values, expected {}",
                spec.name,
                cells.len(),
                height
            );
        }

        let spec = TableSpec::new(columns.iter().map(|(spec, _)| spec.clone()).collect());
        let mut iters: Vec<_> = columns.into_iter().map(|(_, cells)| cells.into_iter()).collect();
        let rows = (0..height)
            .map(|_| Row::new(iters.iter_mut().filter_map(Iterator::next).collect()))
            .collect();

        Ok(Self { spec, rows })
    }

    pub fn row(&self, index: usize) -> &Row {
        &self.rows[index]
    }

    /// Cells of one column, top to bottom
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |row| row.cell(index))
    }
}

impl RowSource for InMemoryTable {
    fn spec(&self) -> &TableSpec {
        &self.spec
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn rows(&self) -> Box<dyn Iterator<Item = &Row> + '_> {
        Box::new(self.rows.iter())
    }
}
