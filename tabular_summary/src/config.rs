// ********* Input data structures ***********

use std::cmp::Ordering;
use std::error::Error;
use std::fmt::Display;

use chrono::{Datelike, NaiveDate};

/// One cell of a table.
///
/// Tables are loosely typed: the type of a cell is decided value by value
/// when the raw text is parsed, not column by column.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// A missing value. It never matches a filter and never forms a group.
    Empty,
    /// A numeric value, including values written with a decimal comma.
    Number(f64),
    /// A calendar date, without time or timezone.
    Date(NaiveDate),
    /// Any other content, kept verbatim.
    Text(String),
}

impl Datum {
    fn type_rank(&self) -> u8 {
        match self {
            Datum::Empty => 0,
            Datum::Number(_) => 1,
            Datum::Date(_) => 2,
            Datum::Text(_) => 3,
        }
    }

    /// Total order over cells: by type first, then by natural order within the type.
    /// This is the order used for the grouping keys of the summary tables.
    pub fn total_cmp(&self, other: &Datum) -> Ordering {
        match (self, other) {
            (Datum::Number(a), Datum::Number(b)) => a.total_cmp(b),
            (Datum::Date(a), Datum::Date(b)) => a.cmp(b),
            (Datum::Text(a), Datum::Text(b)) => a.cmp(b),
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Datum::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Datum::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.as_date().map(|d| d.year())
    }

    /// Renders the cell for display or for the keys of a summary document.
    pub fn render(&self) -> String {
        match self {
            Datum::Empty => String::new(),
            Datum::Number(x) => x.to_string(),
            Datum::Date(d) => d.format("%Y-%m-%d").to_string(),
            Datum::Text(s) => s.clone(),
        }
    }
}

/// An in-memory table: ordered named columns and row-major cells.
///
/// Invariant: every row has exactly as many cells as there are columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Datum>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

/// One constraint of a filter selection. A selection is a conjunction:
/// a row is kept when every predicate of the selection accepts it.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Keeps the rows whose text cell equals the value.
    TextEquals { column: String, value: String },
    /// Keeps the rows whose text cell equals one of the values.
    TextAnyOf { column: String, values: Vec<String> },
    /// Keeps the rows whose numeric cell lies in the inclusive range.
    NumberBetween { column: String, low: f64, high: f64 },
    /// Keeps the rows whose date cell lies in the inclusive range.
    DateBetween {
        column: String,
        low: NaiveDate,
        high: NaiveDate,
    },
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::TextEquals { column, .. } => column,
            Predicate::TextAnyOf { column, .. } => column,
            Predicate::NumberBetween { column, .. } => column,
            Predicate::DateBetween { column, .. } => column,
        }
    }
}

/// One requested aggregation over a filtered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewSpec {
    /// Distinct-value counts, ordered by descending count.
    /// Ties are broken by first-seen order in the input.
    CountBy { column: String },
    /// Sum of the value column per distinct combination of the group columns.
    SumBy {
        group_columns: Vec<String>,
        value_column: String,
    },
    /// Arithmetic mean of the value column per distinct combination of the group columns.
    MeanBy {
        group_columns: Vec<String>,
        value_column: String,
    },
    /// Co-occurrence counts of two categorical columns. With `normalize`,
    /// every row of the matrix is rescaled to percentages summing to 100.
    CrossTab {
        row_column: String,
        col_column: String,
        normalize: bool,
    },
}

impl ViewSpec {
    /// The columns the view reads, grouping columns first.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            ViewSpec::CountBy { column } => vec![column.as_str()],
            ViewSpec::SumBy {
                group_columns,
                value_column,
            }
            | ViewSpec::MeanBy {
                group_columns,
                value_column,
            } => {
                let mut cols: Vec<&str> = group_columns.iter().map(|c| c.as_str()).collect();
                cols.push(value_column.as_str());
                cols
            }
            ViewSpec::CrossTab {
                row_column,
                col_column,
                ..
            } => vec![row_column.as_str(), col_column.as_str()],
        }
    }
}

// ******** Output data structures *********

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub keys: Vec<Datum>,
    pub values: Vec<f64>,
}

/// The output of one aggregation: small enough to hand directly to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

/// The family of chart a summary table is meant to be rendered as.
/// Rendering itself is delegated to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Pie,
    Line,
    Scatter,
    Choropleth,
}

impl ChartKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::HorizontalBar => "hbar",
            ChartKind::Pie => "pie",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Choropleth => "choropleth",
        }
    }
}

/// Presentation metadata attached to a view: the chart family plus labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
}

/// Errors that prevent the pipeline from producing a summary table.
///
/// All three are recoverable at the call site: they are surfaced to the
/// user and halt the processing of the current data only.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TableError {
    /// The raw bytes could not be parsed under any of the attempted
    /// (encoding, delimiter) combinations.
    Ingest { reason: String },
    /// Some of the required columns are absent from the table.
    MissingColumns { missing: Vec<String> },
    /// The aggregation was requested over a table with no rows left.
    EmptyResult,
}

impl Error for TableError {}

impl Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Ingest { reason } => {
                write!(f, "could not parse the input as delimited text: {}", reason)
            }
            TableError::MissingColumns { missing } => {
                write!(f, "required columns are missing: {}", missing.join(", "))
            }
            TableError::EmptyResult => {
                write!(f, "no rows left after filtering")
            }
        }
    }
}

// ********* Collaborator seams **********

/// Canonicalization of entity names (typically country names) against a
/// reference list. The pipeline only calls through this seam; a real
/// implementation backed by reference data is supplied by the host.
pub trait NameStandardizer {
    fn standardize(&self, name: &str) -> String;
}

/// Passes every name through unchanged.
pub struct IdentityStandardizer;

impl NameStandardizer for IdentityStandardizer {
    fn standardize(&self, name: &str) -> String {
        name.to_string()
    }
}
