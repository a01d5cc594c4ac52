use crate::config::*;
use crate::ingest::parse_datum;

/// Builder to assemble a table directly in code, without going through
/// the ingestion of a delimited file.
///
/// Cells pushed as text are typed with the same rules as file ingestion.
///
/// ```
/// use tabular_summary::builder::TableBuilder;
/// use tabular_summary::{aggregate, TableError, ViewSpec};
///
/// let mut builder = TableBuilder::new(&["City", "Total"])?;
/// builder.push_row(&["Yangon", "10.5"])?;
/// builder.push_row(&["Yangon", "4.5"])?;
/// builder.push_row(&["Mandalay", "3"])?;
/// let table = builder.build();
///
/// let summary = aggregate(
///     &table,
///     &ViewSpec::SumBy {
///         group_columns: vec!["City".to_string()],
///         value_column: "Total".to_string(),
///     },
/// )?;
/// assert_eq!(summary.rows[0].values, vec![3.0]);
/// assert_eq!(summary.rows[1].values, vec![15.0]);
/// # Ok::<(), TableError>(())
/// ```
pub struct TableBuilder {
    _columns: Vec<String>,
    _rows: Vec<Vec<Datum>>,
}

impl TableBuilder {
    /// Creates a builder over the given column names.
    ///
    /// Fails when a name is blank or appears twice, the same way the
    /// ingestion rejects such a header row.
    pub fn new(columns: &[&str]) -> Result<TableBuilder, TableError> {
        for (idx, column) in columns.iter().enumerate() {
            if column.trim().is_empty() {
                return Err(TableError::Ingest {
                    reason: "blank column name in the header row".to_string(),
                });
            }
            if columns[..idx].contains(column) {
                return Err(TableError::Ingest {
                    reason: format!("duplicate column name {:?}", column),
                });
            }
        }
        Ok(TableBuilder {
            _columns: columns.iter().map(|c| c.to_string()).collect(),
            _rows: Vec::new(),
        })
    }

    /// Adds a row of raw text cells, typed like the cells of an ingested
    /// file.
    pub fn push_row(&mut self, cells: &[&str]) -> Result<(), TableError> {
        self.check_width(cells.len())?;
        self._rows
            .push(cells.iter().map(|cell| parse_datum(cell)).collect());
        Ok(())
    }

    /// Adds a row of already-typed cells.
    pub fn push_data(&mut self, cells: &[Datum]) -> Result<(), TableError> {
        self.check_width(cells.len())?;
        self._rows.push(cells.to_vec());
        Ok(())
    }

    /// The assembled table.
    pub fn build(self) -> Table {
        Table {
            columns: self._columns,
            rows: self._rows,
        }
    }

    fn check_width(&self, width: usize) -> Result<(), TableError> {
        if width != self._columns.len() {
            return Err(TableError::Ingest {
                reason: format!(
                    "row {} has {} cells, the table has {} columns",
                    self._rows.len() + 1,
                    width,
                    self._columns.len()
                ),
            });
        }
        Ok(())
    }
}
