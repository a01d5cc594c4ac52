mod config;
mod ingest;

pub mod builder;
pub mod manual;
pub mod quick_start;

use log::{debug, info};

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;

pub use crate::config::*;
pub use crate::ingest::ingest;

// **** Private structures ****

/// A hashable stand-in for a cell, used as the key of the grouping maps.
///
/// Numbers are keyed by their bit pattern. This is exact for the values a
/// table can hold: every number comes from parsing a finite literal, and
/// two cells with the same text parse to the same bits.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
enum GroupKey {
    Empty,
    Number(u64),
    Date(NaiveDate),
    Text(String),
}

impl GroupKey {
    fn of(d: &Datum) -> GroupKey {
        match d {
            Datum::Empty => GroupKey::Empty,
            Datum::Number(x) => GroupKey::Number(x.to_bits()),
            Datum::Date(d) => GroupKey::Date(*d),
            Datum::Text(s) => GroupKey::Text(s.clone()),
        }
    }
}

fn column_index_or_panic(table: &Table, column: &str) -> usize {
    match table.column_index(column) {
        Some(idx) => idx,
        None => panic!(
            "column {:?} does not exist in the table: {:?}",
            column, table.columns
        ),
    }
}

// The grouping key of one row over the given column indices, or None when
// any of the cells is missing. Rows without a full key never form a group
// and never match in a join.
fn key_cells(row: &[Datum], indices: &[usize]) -> Option<Vec<GroupKey>> {
    let mut key: Vec<GroupKey> = Vec::with_capacity(indices.len());
    for &i in indices {
        match &row[i] {
            Datum::Empty => return None,
            cell => key.push(GroupKey::of(cell)),
        }
    }
    Some(key)
}

fn cmp_keys(a: &[Datum], b: &[Datum]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.total_cmp(y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

// **** Pipeline operations ****

/// Checks that all the required columns are present, then projects the
/// table onto them.
///
/// The projected table has the required columns in the order of
/// `required`, and keeps the rows that carry a value for all of them. A
/// row with a missing value in any required column is dropped.
///
/// Fails with [`TableError::MissingColumns`] listing the absent names, in
/// `required` order, when the table does not have all the columns. In
/// that case the input table is left untouched and the caller may still
/// present its raw content.
pub fn validate_columns(table: &Table, required: &[&str]) -> Result<Table, TableError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|c| table.column_index(c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        info!(
            "validate_columns: missing columns {:?}, the table has {:?}",
            missing, table.columns
        );
        return Err(TableError::MissingColumns { missing });
    }
    let indices: Vec<usize> = required
        .iter()
        .map(|c| table.column_index(c).unwrap())
        .collect();
    let mut rows: Vec<Vec<Datum>> = Vec::new();
    for row in table.rows.iter() {
        let cells: Vec<Datum> = indices.iter().map(|&i| row[i].clone()).collect();
        if cells.iter().any(|c| matches!(c, Datum::Empty)) {
            continue;
        }
        rows.push(cells);
    }
    info!(
        "validate_columns: kept {} of {} rows over {:?}",
        rows.len(),
        table.num_rows(),
        required
    );
    Ok(Table {
        columns: required.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}

/// Applies a conjunction of predicates and keeps the rows that satisfy
/// all of them.
///
/// An empty selection returns the table unchanged. A missing value never
/// satisfies a predicate, and neither does a cell of the wrong type: such
/// rows are dropped, not reported.
///
/// A predicate naming a column the table does not have is a programming
/// error and panics.
pub fn filter(table: &Table, selection: &[Predicate]) -> Table {
    if selection.is_empty() {
        return table.clone();
    }
    let compiled: Vec<(usize, &Predicate)> = selection
        .iter()
        .map(|p| (column_index_or_panic(table, p.column()), p))
        .collect();
    let rows: Vec<Vec<Datum>> = table
        .rows
        .iter()
        .filter(|row| compiled.iter().all(|(idx, p)| cell_matches(&row[*idx], p)))
        .cloned()
        .collect();
    info!(
        "filter: {} of {} rows satisfy the {} predicates",
        rows.len(),
        table.num_rows(),
        selection.len()
    );
    Table {
        columns: table.columns.clone(),
        rows,
    }
}

fn cell_matches(cell: &Datum, p: &Predicate) -> bool {
    match (p, cell) {
        (Predicate::TextEquals { value, .. }, Datum::Text(s)) => s == value,
        (Predicate::TextAnyOf { values, .. }, Datum::Text(s)) => values.iter().any(|v| v == s),
        (Predicate::NumberBetween { low, high, .. }, Datum::Number(x)) => low <= x && x <= high,
        (Predicate::DateBetween { low, high, .. }, Datum::Date(d)) => low <= d && d <= high,
        _ => false,
    }
}

/// Runs one aggregation over the table.
///
/// The shapes produced are:
/// - [`ViewSpec::CountBy`]: one key column and a `count` value column,
///   ordered by descending count. Groups with the same count stay in the
///   order their value was first seen in the input.
/// - [`ViewSpec::SumBy`] / [`ViewSpec::MeanBy`]: the group columns as
///   keys and one value column named after the aggregated column, ordered
///   by ascending keys.
/// - [`ViewSpec::CrossTab`]: the row column as key and one value column
///   per distinct value of the col column, both in ascending order. Cells
///   hold co-occurrence counts or, with `normalize`, percentages summing
///   to 100 per row.
///
/// A row with a missing value in a grouping cell does not form a group,
/// and a row with a non-numeric cell in the aggregated column does not
/// contribute to its group.
///
/// Fails with [`TableError::EmptyResult`] when the table has no rows, or
/// when no row is left to feed the view. A view naming a column the table
/// does not have is a programming error and panics.
pub fn aggregate(table: &Table, view: &ViewSpec) -> Result<SummaryTable, TableError> {
    if table.rows.is_empty() {
        return Err(TableError::EmptyResult);
    }
    let summary = match view {
        ViewSpec::CountBy { column } => aggregate_count_by(table, column),
        ViewSpec::SumBy {
            group_columns,
            value_column,
        } => aggregate_group_value(table, group_columns, value_column, false),
        ViewSpec::MeanBy {
            group_columns,
            value_column,
        } => aggregate_group_value(table, group_columns, value_column, true),
        ViewSpec::CrossTab {
            row_column,
            col_column,
            normalize,
        } => aggregate_cross_tab(table, row_column, col_column, *normalize),
    };
    if summary.rows.is_empty() {
        debug!("aggregate: no group observed for {:?}", view);
        return Err(TableError::EmptyResult);
    }
    info!(
        "aggregate: {:?} produced {} summary rows",
        view,
        summary.rows.len()
    );
    Ok(summary)
}

fn aggregate_count_by(table: &Table, column: &str) -> SummaryTable {
    let idx = column_index_or_panic(table, column);
    let mut counts: HashMap<GroupKey, u64> = HashMap::new();
    // The distinct values in first-seen order, to break count ties.
    let mut seen: Vec<(GroupKey, Datum)> = Vec::new();
    for row in table.rows.iter() {
        let cell = &row[idx];
        if matches!(cell, Datum::Empty) {
            continue;
        }
        let key = GroupKey::of(cell);
        let e = counts.entry(key.clone()).or_insert(0);
        if *e == 0 {
            seen.push((key, cell.clone()));
        }
        *e += 1;
    }
    let mut entries: Vec<(Datum, u64)> = seen
        .into_iter()
        .map(|(key, cell)| {
            let count = counts[&key];
            (cell, count)
        })
        .collect();
    // The sort is stable: groups with equal counts keep first-seen order.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    SummaryTable {
        key_columns: vec![column.to_string()],
        value_columns: vec!["count".to_string()],
        rows: entries
            .into_iter()
            .map(|(cell, count)| SummaryRow {
                keys: vec![cell],
                values: vec![count as f64],
            })
            .collect(),
    }
}

fn aggregate_group_value(
    table: &Table,
    group_columns: &[String],
    value_column: &str,
    mean: bool,
) -> SummaryTable {
    let group_idx: Vec<usize> = group_columns
        .iter()
        .map(|c| column_index_or_panic(table, c))
        .collect();
    let value_idx = column_index_or_panic(table, value_column);

    // Per group: the sum of the value cells and the number of cells summed.
    let mut totals: HashMap<Vec<GroupKey>, (f64, u64)> = HashMap::new();
    let mut key_data: HashMap<Vec<GroupKey>, Vec<Datum>> = HashMap::new();
    for row in table.rows.iter() {
        let x = match row[value_idx] {
            Datum::Number(x) => x,
            _ => continue,
        };
        let key = match key_cells(row, &group_idx) {
            Some(key) => key,
            None => continue,
        };
        let e = totals.entry(key.clone()).or_insert((0.0, 0));
        e.0 += x;
        e.1 += 1;
        key_data
            .entry(key)
            .or_insert_with(|| group_idx.iter().map(|&i| row[i].clone()).collect());
    }

    let mut rows: Vec<SummaryRow> = totals
        .iter()
        .map(|(key, (sum, count))| {
            // The group exists, so at least one cell was summed.
            let value = if mean { sum / (*count as f64) } else { *sum };
            SummaryRow {
                keys: key_data[key].clone(),
                values: vec![value],
            }
        })
        .collect();
    rows.sort_by(|a, b| cmp_keys(&a.keys, &b.keys));
    SummaryTable {
        key_columns: group_columns.to_vec(),
        value_columns: vec![value_column.to_string()],
        rows,
    }
}

fn aggregate_cross_tab(
    table: &Table,
    row_column: &str,
    col_column: &str,
    normalize: bool,
) -> SummaryTable {
    let row_idx = column_index_or_panic(table, row_column);
    let col_idx = column_index_or_panic(table, col_column);

    let mut pair_counts: HashMap<(GroupKey, GroupKey), u64> = HashMap::new();
    let mut distinct_rows: HashMap<GroupKey, Datum> = HashMap::new();
    let mut distinct_cols: HashMap<GroupKey, Datum> = HashMap::new();
    for row in table.rows.iter() {
        let (r, c) = (&row[row_idx], &row[col_idx]);
        if matches!(r, Datum::Empty) || matches!(c, Datum::Empty) {
            continue;
        }
        let rk = GroupKey::of(r);
        let ck = GroupKey::of(c);
        distinct_rows.entry(rk.clone()).or_insert_with(|| r.clone());
        distinct_cols.entry(ck.clone()).or_insert_with(|| c.clone());
        *pair_counts.entry((rk, ck)).or_insert(0) += 1;
    }
    let mut row_keys: Vec<(GroupKey, Datum)> = distinct_rows.into_iter().collect();
    row_keys.sort_by(|a, b| a.1.total_cmp(&b.1));
    let mut col_keys: Vec<(GroupKey, Datum)> = distinct_cols.into_iter().collect();
    col_keys.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut rows: Vec<SummaryRow> = Vec::new();
    for (rk, r_cell) in row_keys.iter() {
        let counts: Vec<u64> = col_keys
            .iter()
            .map(|(ck, _)| {
                pair_counts
                    .get(&(rk.clone(), ck.clone()))
                    .cloned()
                    .unwrap_or(0)
            })
            .collect();
        let values: Vec<f64> = if normalize {
            // The row key was observed in at least one pair, so the row
            // total is never zero.
            let total: u64 = counts.iter().sum();
            counts
                .iter()
                .map(|c| 100.0 * (*c as f64) / (total as f64))
                .collect()
        } else {
            counts.iter().map(|c| *c as f64).collect()
        };
        rows.push(SummaryRow {
            keys: vec![r_cell.clone()],
            values,
        });
    }
    SummaryTable {
        key_columns: vec![row_column.to_string()],
        value_columns: col_keys.iter().map(|(_, cell)| cell.render()).collect(),
        rows,
    }
}

// **** Table shaping ****

/// Renames one column in place.
///
/// Renaming a column that does not exist, or renaming to a name the table
/// already has, is a programming error and panics.
pub fn rename_column(table: &mut Table, from: &str, to: &str) {
    let idx = column_index_or_panic(table, from);
    assert!(
        table.column_index(to).is_none(),
        "cannot rename {:?} to {:?}: the table already has a column with that name",
        from,
        to
    );
    table.columns[idx] = to.to_string();
}

/// Appends a numeric column holding the calendar year of a date column.
///
/// Cells that are not dates yield a missing value. The date column must
/// exist and the new name must be free, else this is a programming error.
pub fn derive_year(table: &mut Table, date_column: &str, year_column: &str) {
    let idx = column_index_or_panic(table, date_column);
    assert!(
        table.column_index(year_column).is_none(),
        "cannot derive {:?}: the table already has a column with that name",
        year_column
    );
    table.columns.push(year_column.to_string());
    for row in table.rows.iter_mut() {
        let cell = match row[idx].year() {
            Some(y) => Datum::Number(y as f64),
            None => Datum::Empty,
        };
        row.push(cell);
    }
}

/// The first `n` rows of the table, with the column set unchanged.
pub fn head(table: &Table, n: usize) -> Table {
    Table {
        columns: table.columns.clone(),
        rows: table.rows.iter().take(n).cloned().collect(),
    }
}

/// The distinct non-missing values of a column, in ascending order.
///
/// This is what a selection widget presents as the available choices.
pub fn unique_values(table: &Table, column: &str) -> Vec<Datum> {
    let idx = column_index_or_panic(table, column);
    let mut distinct: HashMap<GroupKey, Datum> = HashMap::new();
    for row in table.rows.iter() {
        match &row[idx] {
            Datum::Empty => {}
            cell => {
                distinct
                    .entry(GroupKey::of(cell))
                    .or_insert_with(|| cell.clone());
            }
        }
    }
    let mut values: Vec<Datum> = distinct.into_values().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// The inclusive range of the numeric cells of a column, or `None` when
/// the column has no numeric cell. Feeds the bounds of a range slider.
pub fn number_range(table: &Table, column: &str) -> Option<(f64, f64)> {
    let idx = column_index_or_panic(table, column);
    let mut range: Option<(f64, f64)> = None;
    for row in table.rows.iter() {
        if let Datum::Number(x) = row[idx] {
            range = Some(match range {
                None => (x, x),
                Some((lo, hi)) => (lo.min(x), hi.max(x)),
            });
        }
    }
    range
}

/// The inclusive range of the date cells of a column, or `None` when the
/// column has no date cell.
pub fn date_range(table: &Table, column: &str) -> Option<(NaiveDate, NaiveDate)> {
    let idx = column_index_or_panic(table, column);
    let mut range: Option<(NaiveDate, NaiveDate)> = None;
    for row in table.rows.iter() {
        if let Datum::Date(d) = row[idx] {
            range = Some(match range {
                None => (d, d),
                Some((lo, hi)) => (lo.min(d), hi.max(d)),
            });
        }
    }
    range
}

/// The sum of the numeric cells of a column. Cells of any other type do
/// not contribute.
pub fn column_sum(table: &Table, column: &str) -> f64 {
    let idx = column_index_or_panic(table, column);
    table
        .rows
        .iter()
        .filter_map(|row| row[idx].as_number())
        .sum()
}

/// The arithmetic mean of the numeric cells of a column, or `None` when
/// the column has no numeric cell.
pub fn column_mean(table: &Table, column: &str) -> Option<f64> {
    let idx = column_index_or_panic(table, column);
    let mut sum = 0.0;
    let mut count = 0u64;
    for row in table.rows.iter() {
        if let Datum::Number(x) = row[idx] {
            sum += x;
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Joins two tables on equality of the key columns.
///
/// The result keeps every column of the left table and appends the
/// non-key columns of the right one. When a right column name already
/// exists on the left, the appended column gets a `_right` suffix. A left
/// row appears once per matching right row, in left-table order. Rows
/// with a missing value in a key cell never match.
///
/// A key column absent from either side is a programming error and
/// panics.
pub fn inner_join(left: &Table, right: &Table, keys: &[&str]) -> Table {
    let left_idx: Vec<usize> = keys
        .iter()
        .map(|k| column_index_or_panic(left, k))
        .collect();
    let right_idx: Vec<usize> = keys
        .iter()
        .map(|k| column_index_or_panic(right, k))
        .collect();
    let right_value_idx: Vec<usize> = (0..right.num_columns())
        .filter(|i| !right_idx.contains(i))
        .collect();

    let mut columns = left.columns.clone();
    for &i in right_value_idx.iter() {
        let name = &right.columns[i];
        if columns.contains(name) {
            columns.push(format!("{}_right", name));
        } else {
            columns.push(name.clone());
        }
    }

    // Index the right rows by key.
    let mut by_key: HashMap<Vec<GroupKey>, Vec<usize>> = HashMap::new();
    for (pos, row) in right.rows.iter().enumerate() {
        if let Some(key) = key_cells(row, &right_idx) {
            by_key.entry(key).or_insert_with(Vec::new).push(pos);
        }
    }

    let mut rows: Vec<Vec<Datum>> = Vec::new();
    for row in left.rows.iter() {
        let key = match key_cells(row, &left_idx) {
            Some(key) => key,
            None => continue,
        };
        if let Some(positions) = by_key.get(&key) {
            for &pos in positions.iter() {
                let mut cells = row.clone();
                for &i in right_value_idx.iter() {
                    cells.push(right.rows[pos][i].clone());
                }
                rows.push(cells);
            }
        }
    }
    info!(
        "inner_join: {} x {} rows on {:?} paired into {} rows",
        left.num_rows(),
        right.num_rows(),
        keys,
        rows.len()
    );
    Table { columns, rows }
}

/// Rewrites every text cell of a column through a name standardizer.
///
/// Cells of any other type are left as they are. The column must exist,
/// else this is a programming error.
pub fn standardize_column(table: &mut Table, column: &str, standardizer: &dyn NameStandardizer) {
    let idx = column_index_or_panic(table, column);
    for row in table.rows.iter_mut() {
        if let Datum::Text(s) = &row[idx] {
            let canonical = standardizer.standardize(s);
            if canonical != *s {
                row[idx] = Datum::Text(canonical);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut builder = TableBuilder::new(columns).unwrap();
        for row in rows {
            builder.push_row(row).unwrap();
        }
        builder.build()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidates() -> Table {
        table(
            &["SG_PARTIDO", "DS_GENERO"],
            &[
                &["PT", "FEMININO"],
                &["PT", "MASCULINO"],
                &["PSDB", "FEMININO"],
            ],
        )
    }

    #[test]
    fn validate_passes_and_projects() {
        let t = table(&["A", "B", "C"], &[&["x", "1", "u"], &["y", "2", "v"]]);
        let projected = validate_columns(&t, &["C", "A"]).unwrap();
        assert_eq!(projected.columns, vec!["C", "A"]);
        assert_eq!(projected.num_rows(), 2);
        assert_eq!(projected.rows[0][0], Datum::Text("u".to_string()));
        assert_eq!(projected.rows[0][1], Datum::Text("x".to_string()));
    }

    #[test]
    fn validate_reports_missing_columns_in_required_order() {
        let t = table(&["A", "B"], &[&["x", "1"]]);
        let res = validate_columns(&t, &["A", "D", "B", "C"]);
        assert_eq!(
            res,
            Err(TableError::MissingColumns {
                missing: vec!["D".to_string(), "C".to_string()]
            })
        );
    }

    #[test]
    fn validate_drops_rows_with_missing_required_values() {
        let t = table(
            &["A", "B"],
            &[&["x", "1"], &["", "2"], &["z", ""], &["w", "4"]],
        );
        let projected = validate_columns(&t, &["A", "B"]).unwrap();
        assert_eq!(projected.num_rows(), 2);
        // The row is only dropped for a missing value in a required column.
        let partial = validate_columns(&t, &["B"]).unwrap();
        assert_eq!(partial.num_rows(), 3);
    }

    #[test]
    fn filter_with_empty_selection_returns_the_table() {
        let t = candidates();
        let filtered = filter(&t, &[]);
        assert_eq!(filtered, t);
    }

    #[test]
    fn filter_applies_the_conjunction() {
        let t = table(
            &["City", "Total"],
            &[
                &["Yangon", "10"],
                &["Yangon", "50"],
                &["Mandalay", "30"],
                &["Yangon", "70"],
            ],
        );
        let selection = vec![
            Predicate::TextEquals {
                column: "City".to_string(),
                value: "Yangon".to_string(),
            },
            Predicate::NumberBetween {
                column: "Total".to_string(),
                low: 20.0,
                high: 70.0,
            },
        ];
        let filtered = filter(&t, &selection);
        assert_eq!(filtered.num_rows(), 2);
        for row in filtered.rows.iter() {
            assert_eq!(row[0], Datum::Text("Yangon".to_string()));
            let x = row[1].as_number().unwrap();
            assert!((20.0..=70.0).contains(&x));
        }
    }

    #[test]
    fn filter_ranges_are_inclusive() {
        let t = table(&["Rating"], &[&["6"], &["6.5"], &["10"], &["5.9"]]);
        let filtered = filter(
            &t,
            &[Predicate::NumberBetween {
                column: "Rating".to_string(),
                low: 6.0,
                high: 10.0,
            }],
        );
        assert_eq!(filtered.num_rows(), 3);
    }

    #[test]
    fn filter_by_date_range() {
        let t = table(
            &["Date", "Total"],
            &[
                &["1/5/2019", "10"],
                &["1/31/2019", "20"],
                &["2/1/2019", "30"],
            ],
        );
        let filtered = filter(
            &t,
            &[Predicate::DateBetween {
                column: "Date".to_string(),
                low: date(2019, 1, 1),
                high: date(2019, 1, 31),
            }],
        );
        assert_eq!(filtered.num_rows(), 2);
    }

    #[test]
    fn filter_any_of_matches_each_value() {
        let t = table(&["SG_UF"], &[&["SP"], &["RJ"], &["MG"], &["SP"]]);
        let filtered = filter(
            &t,
            &[Predicate::TextAnyOf {
                column: "SG_UF".to_string(),
                values: vec!["SP".to_string(), "RJ".to_string()],
            }],
        );
        assert_eq!(filtered.num_rows(), 3);
    }

    #[test]
    fn filter_never_matches_missing_or_mismatched_cells() {
        let t = table(&["A"], &[&[""], &["PT"], &["12"]]);
        // A numeric range over a mostly-text column drops everything else.
        let filtered = filter(
            &t,
            &[Predicate::NumberBetween {
                column: "A".to_string(),
                low: 0.0,
                high: 100.0,
            }],
        );
        assert_eq!(filtered.num_rows(), 1);
        assert_eq!(filtered.rows[0][0], Datum::Number(12.0));
    }

    #[test]
    #[should_panic(expected = "does not exist in the table")]
    fn filter_with_unknown_column_panics() {
        let t = candidates();
        filter(
            &t,
            &[Predicate::TextEquals {
                column: "Nope".to_string(),
                value: "x".to_string(),
            }],
        );
    }

    #[test]
    fn count_by_genero() {
        init_logs();
        let t = candidates();
        let summary = aggregate(
            &t,
            &ViewSpec::CountBy {
                column: "DS_GENERO".to_string(),
            },
        )
        .unwrap();
        assert_eq!(summary.key_columns, vec!["DS_GENERO"]);
        assert_eq!(summary.value_columns, vec!["count"]);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].keys, vec![Datum::Text("FEMININO".to_string())]);
        assert_eq!(summary.rows[0].values, vec![2.0]);
        assert_eq!(summary.rows[1].keys, vec![Datum::Text("MASCULINO".to_string())]);
        assert_eq!(summary.rows[1].values, vec![1.0]);
    }

    #[test]
    fn count_by_orders_by_descending_count_then_first_seen() {
        let t = table(&["X"], &[&["b"], &["a"], &["b"], &["a"], &["c"]]);
        let summary = aggregate(
            &t,
            &ViewSpec::CountBy {
                column: "X".to_string(),
            },
        )
        .unwrap();
        let keys: Vec<String> = summary
            .rows
            .iter()
            .map(|r| r.keys[0].render())
            .collect();
        // b and a are tied, and b was seen first.
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(summary.rows[2].values, vec![1.0]);
    }

    #[test]
    fn count_by_skips_missing_cells() {
        let t = table(&["X"], &[&["a"], &[""], &["a"], &[""]]);
        let summary = aggregate(
            &t,
            &ViewSpec::CountBy {
                column: "X".to_string(),
            },
        )
        .unwrap();
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].values, vec![2.0]);
    }

    #[test]
    fn sum_by_city() {
        let t = table(
            &["City", "Total"],
            &[&["A", "10"], &["A", "5"], &["B", "3"]],
        );
        let summary = aggregate(
            &t,
            &ViewSpec::SumBy {
                group_columns: vec!["City".to_string()],
                value_column: "Total".to_string(),
            },
        )
        .unwrap();
        assert_eq!(summary.key_columns, vec!["City"]);
        assert_eq!(summary.value_columns, vec!["Total"]);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].keys, vec![Datum::Text("A".to_string())]);
        assert_eq!(summary.rows[0].values, vec![15.0]);
        assert_eq!(summary.rows[1].keys, vec![Datum::Text("B".to_string())]);
        assert_eq!(summary.rows[1].values, vec![3.0]);
    }

    #[test]
    fn sum_by_two_group_columns_orders_by_both_keys() {
        let t = table(
            &["Product line", "City", "Total"],
            &[
                &["Sports", "Yangon", "4"],
                &["Food", "Yangon", "10"],
                &["Sports", "Mandalay", "6"],
                &["Food", "Yangon", "2"],
            ],
        );
        let summary = aggregate(
            &t,
            &ViewSpec::SumBy {
                group_columns: vec!["Product line".to_string(), "City".to_string()],
                value_column: "Total".to_string(),
            },
        )
        .unwrap();
        let keys: Vec<(String, String)> = summary
            .rows
            .iter()
            .map(|r| (r.keys[0].render(), r.keys[1].render()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Food".to_string(), "Yangon".to_string()),
                ("Sports".to_string(), "Mandalay".to_string()),
                ("Sports".to_string(), "Yangon".to_string()),
            ]
        );
        assert_eq!(summary.rows[0].values, vec![12.0]);
    }

    #[test]
    fn sum_by_skips_rows_without_a_numeric_value() {
        let t = table(
            &["City", "Total"],
            &[&["A", "10"], &["A", ""], &["B", "oops"], &["", "7"]],
        );
        let summary = aggregate(
            &t,
            &ViewSpec::SumBy {
                group_columns: vec!["City".to_string()],
                value_column: "Total".to_string(),
            },
        )
        .unwrap();
        // B never forms a group, and the keyless 7 is not counted anywhere.
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].keys, vec![Datum::Text("A".to_string())]);
        assert_eq!(summary.rows[0].values, vec![10.0]);
    }

    #[test]
    fn mean_by_rating() {
        let t = table(
            &["City", "Rating"],
            &[&["A", "8"], &["A", "6"], &["B", "9"]],
        );
        let summary = aggregate(
            &t,
            &ViewSpec::MeanBy {
                group_columns: vec!["City".to_string()],
                value_column: "Rating".to_string(),
            },
        )
        .unwrap();
        assert_eq!(summary.rows[0].values, vec![7.0]);
        assert_eq!(summary.rows[1].values, vec![9.0]);
    }

    #[test]
    fn cross_tab_counts() {
        let t = table(
            &["SG_PARTIDO", "DS_GENERO"],
            &[
                &["PT", "FEMININO"],
                &["PT", "MASCULINO"],
                &["PSDB", "FEMININO"],
                &["PT", "FEMININO"],
            ],
        );
        let summary = aggregate(
            &t,
            &ViewSpec::CrossTab {
                row_column: "SG_PARTIDO".to_string(),
                col_column: "DS_GENERO".to_string(),
                normalize: false,
            },
        )
        .unwrap();
        assert_eq!(summary.key_columns, vec!["SG_PARTIDO"]);
        assert_eq!(summary.value_columns, vec!["FEMININO", "MASCULINO"]);
        // Rows are in ascending key order.
        assert_eq!(summary.rows[0].keys, vec![Datum::Text("PSDB".to_string())]);
        assert_eq!(summary.rows[0].values, vec![1.0, 0.0]);
        assert_eq!(summary.rows[1].keys, vec![Datum::Text("PT".to_string())]);
        assert_eq!(summary.rows[1].values, vec![2.0, 1.0]);
    }

    #[test]
    fn cross_tab_normalized_rows_sum_to_100() {
        let t = table(
            &["Office", "Gender"],
            &[
                &["Mayor", "F"],
                &["Mayor", "M"],
                &["Mayor", "M"],
                &["Council", "F"],
                &["Council", "F"],
                &["Council", "M"],
                &["Council", "F"],
            ],
        );
        let summary = aggregate(
            &t,
            &ViewSpec::CrossTab {
                row_column: "Office".to_string(),
                col_column: "Gender".to_string(),
                normalize: true,
            },
        )
        .unwrap();
        for row in summary.rows.iter() {
            let total: f64 = row.values.iter().sum();
            assert!((total - 100.0).abs() < 1e-9, "row sums to {}", total);
        }
        assert_eq!(summary.rows[0].keys, vec![Datum::Text("Council".to_string())]);
        assert_eq!(summary.rows[0].values, vec![75.0, 25.0]);
    }

    #[test]
    fn aggregate_fails_on_a_table_without_rows() {
        let t = table(&["X"], &[]);
        let res = aggregate(
            &t,
            &ViewSpec::CountBy {
                column: "X".to_string(),
            },
        );
        assert_eq!(res, Err(TableError::EmptyResult));
    }

    #[test]
    fn aggregate_fails_when_no_group_is_observed() {
        let t = table(&["X", "Y"], &[&["", "1"], &["", "2"]]);
        let res = aggregate(
            &t,
            &ViewSpec::CountBy {
                column: "X".to_string(),
            },
        );
        assert_eq!(res, Err(TableError::EmptyResult));
    }

    #[test]
    fn rename_keeps_the_position() {
        let mut t = table(&["Country", "Year", "Total"], &[&["Brazil", "1995", "250"]]);
        rename_column(&mut t, "Total", "CO2Emissions");
        assert_eq!(t.columns, vec!["Country", "Year", "CO2Emissions"]);
    }

    #[test]
    #[should_panic(expected = "already has a column")]
    fn rename_to_an_existing_name_panics() {
        let mut t = table(&["A", "B"], &[]);
        rename_column(&mut t, "A", "B");
    }

    #[test]
    fn derive_year_from_both_date_notations() {
        let mut t = table(
            &["dt", "V"],
            &[&["1995-07-01", "1"], &["3/14/2015", "2"], &["oops", "3"]],
        );
        derive_year(&mut t, "dt", "Year");
        assert_eq!(t.columns, vec!["dt", "V", "Year"]);
        assert_eq!(t.rows[0][2], Datum::Number(1995.0));
        assert_eq!(t.rows[1][2], Datum::Number(2015.0));
        assert_eq!(t.rows[2][2], Datum::Empty);
    }

    #[test]
    fn head_takes_at_most_n_rows() {
        let t = table(&["X"], &[&["1"], &["2"], &["3"]]);
        assert_eq!(head(&t, 2).num_rows(), 2);
        assert_eq!(head(&t, 10).num_rows(), 3);
        assert_eq!(head(&t, 0).num_rows(), 0);
        assert_eq!(head(&t, 2).columns, t.columns);
    }

    #[test]
    fn unique_values_are_sorted_and_deduplicated() {
        let t = table(&["X"], &[&["b"], &["a"], &["b"], &[""], &["c"]]);
        let values = unique_values(&t, "X");
        assert_eq!(
            values,
            vec![
                Datum::Text("a".to_string()),
                Datum::Text("b".to_string()),
                Datum::Text("c".to_string())
            ]
        );
    }

    #[test]
    fn ranges_over_typed_cells() {
        let t = table(
            &["Rating", "Date"],
            &[
                &["7.5", "1/5/2019"],
                &["oops", ""],
                &["4", "2/1/2019"],
                &["9.5", "1/1/2019"],
            ],
        );
        assert_eq!(number_range(&t, "Rating"), Some((4.0, 9.5)));
        assert_eq!(
            date_range(&t, "Date"),
            Some((date(2019, 1, 1), date(2019, 2, 1)))
        );
        assert_eq!(number_range(&t, "Date"), None);
    }

    #[test]
    fn column_sum_and_mean() {
        let t = table(&["Total"], &[&["10.5"], &["x"], &["4.5"], &[""]]);
        assert_eq!(column_sum(&t, "Total"), 15.0);
        assert_eq!(column_mean(&t, "Total"), Some(7.5));
        let empty = table(&["Total"], &[&["x"]]);
        assert_eq!(column_sum(&empty, "Total"), 0.0);
        assert_eq!(column_mean(&empty, "Total"), None);
    }

    #[test]
    fn inner_join_pairs_rows_on_equal_keys() {
        init_logs();
        let temps = table(
            &["dt", "AverageTemperature", "Country", "Year"],
            &[
                &["1995-01-01", "25.5", "Brazil", "1995"],
                &["1995-07-01", "23.5", "Brazil", "1995"],
                &["1995-01-01", "10.25", "Norway", "1995"],
                &["1996-01-01", "26", "Brazil", "1996"],
            ],
        );
        let co2 = table(
            &["Country", "Year", "CO2Emissions"],
            &[
                &["Brazil", "1995", "250.5"],
                &["Norway", "1995", "35.25"],
                &["Norway", "1997", "36"],
            ],
        );
        let joined = inner_join(&temps, &co2, &["Country", "Year"]);
        assert_eq!(
            joined.columns,
            vec!["dt", "AverageTemperature", "Country", "Year", "CO2Emissions"]
        );
        // Left order is preserved, and Brazil 1996 / Norway 1997 have no pair.
        assert_eq!(joined.num_rows(), 3);
        assert_eq!(joined.rows[0][4], Datum::Number(250.5));
        assert_eq!(joined.rows[2][2], Datum::Text("Norway".to_string()));
        assert_eq!(joined.rows[2][4], Datum::Number(35.25));
    }

    #[test]
    fn inner_join_suffixes_duplicate_right_columns() {
        let left = table(&["K", "Total"], &[&["a", "1"]]);
        let right = table(&["K", "Total"], &[&["a", "2"]]);
        let joined = inner_join(&left, &right, &["K"]);
        assert_eq!(joined.columns, vec!["K", "Total", "Total_right"]);
        assert_eq!(joined.rows[0][2], Datum::Number(2.0));
    }

    #[test]
    fn inner_join_never_matches_missing_keys() {
        let left = table(&["K", "V"], &[&["", "1"], &["a", "2"]]);
        let right = table(&["K", "W"], &[&["", "8"], &["a", "9"]]);
        let joined = inner_join(&left, &right, &["K"]);
        assert_eq!(joined.num_rows(), 1);
        assert_eq!(joined.rows[0][0], Datum::Text("a".to_string()));
    }

    struct FixedStandardizer;

    impl NameStandardizer for FixedStandardizer {
        fn standardize(&self, name: &str) -> String {
            match name {
                "Brasil" => "Brazil".to_string(),
                other => other.to_string(),
            }
        }
    }

    #[test]
    fn standardize_rewrites_text_cells_through_the_seam() {
        let mut t = table(
            &["Country", "Year"],
            &[&["Brasil", "1995"], &["Norway", "1996"]],
        );
        standardize_column(&mut t, "Country", &FixedStandardizer);
        assert_eq!(t.rows[0][0], Datum::Text("Brazil".to_string()));
        assert_eq!(t.rows[1][0], Datum::Text("Norway".to_string()));
        // The identity standardizer leaves everything alone.
        standardize_column(&mut t, "Country", &IdentityStandardizer);
        assert_eq!(t.rows[1][0], Datum::Text("Norway".to_string()));
    }

    #[test]
    fn pipeline_end_to_end() {
        init_logs();
        // ingest -> validate -> filter -> aggregate, as a host would run it.
        let raw = b"City;Total;Rating\nYangon;10,5;9\nMandalay;20;7\nYangon;;8\nYangon;4,5;6\n";
        let t = ingest(raw).unwrap();
        assert_eq!(t.num_rows(), 4);
        let validated = validate_columns(&t, &["City", "Total"]).unwrap();
        assert_eq!(validated.num_rows(), 3);
        let filtered = filter(
            &validated,
            &[Predicate::TextEquals {
                column: "City".to_string(),
                value: "Yangon".to_string(),
            }],
        );
        let summary = aggregate(
            &filtered,
            &ViewSpec::SumBy {
                group_columns: vec!["City".to_string()],
                value_column: "Total".to_string(),
            },
        )
        .unwrap();
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].values, vec![15.0]);
    }
}
