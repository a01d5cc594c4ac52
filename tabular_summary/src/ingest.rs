// Primitives for parsing delimited text of unknown encoding and delimiter.

use std::borrow::Cow;

use chrono::NaiveDate;
use encoding_rs::WINDOWS_1252;
use log::debug;

use crate::config::{Datum, Table, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextEncoding {
    Utf8,
    Windows1252,
}

// The combinations to attempt, in priority order. The first plausible
// parse is adopted and the remaining combinations are never tried.
const CANDIDATES: [(TextEncoding, u8); 4] = [
    (TextEncoding::Utf8, b','),
    (TextEncoding::Utf8, b';'),
    (TextEncoding::Windows1252, b','),
    (TextEncoding::Windows1252, b';'),
];

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Parses raw delimited bytes into a table.
///
/// The encoding and the delimiter of the input are not known in advance.
/// Each combination of UTF-8 / Windows-1252 and comma / semicolon is tried
/// in a fixed order; a combination is plausible when every record has the
/// width of the header row. A combination that splits the input into at
/// least two columns wins over a clean single-column parse.
///
/// Fails with [`TableError::Ingest`] when every combination fails.
pub fn ingest(raw: &[u8]) -> Result<Table, TableError> {
    // Excel-exported files commonly start with a UTF-8 byte order mark.
    let raw = if raw.starts_with(&UTF8_BOM) {
        &raw[3..]
    } else {
        raw
    };

    let mut single_column: Option<Table> = None;
    for (encoding, delimiter) in CANDIDATES {
        let text = match decode(raw, encoding) {
            Some(text) => text,
            None => {
                debug!("ingest: input is not valid {:?}, skipping", encoding);
                continue;
            }
        };
        if let Some(c) = text
            .chars()
            .find(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        {
            debug!(
                "ingest: {:?} decodes to text with control character {:?}, skipping",
                encoding, c
            );
            continue;
        }
        match parse_candidate(&text, delimiter) {
            Ok(table) if table.num_columns() >= 2 => {
                debug!(
                    "ingest: adopting {:?} with delimiter {:?}: {} columns, {} rows",
                    encoding,
                    delimiter as char,
                    table.num_columns(),
                    table.num_rows()
                );
                return Ok(table);
            }
            Ok(table) => {
                if single_column.is_none() {
                    single_column = Some(table);
                }
            }
            Err(reason) => {
                debug!(
                    "ingest: {:?} with delimiter {:?} rejected: {}",
                    encoding, delimiter as char, reason
                );
            }
        }
    }
    if let Some(table) = single_column {
        debug!(
            "ingest: no combination yields more than one column, adopting a single-column parse with {} rows",
            table.num_rows()
        );
        return Ok(table);
    }
    Err(TableError::Ingest {
        reason: "every (encoding, delimiter) combination failed".to_string(),
    })
}

fn decode(raw: &[u8], encoding: TextEncoding) -> Option<Cow<'_, str>> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(raw).ok().map(Cow::Borrowed),
        TextEncoding::Windows1252 => {
            let (text, _, _) = WINDOWS_1252.decode(raw);
            Some(text)
        }
    }
}

fn parse_candidate(text: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| e.to_string())?,
        None => return Err("the input has no rows".to_string()),
    };
    let columns: Vec<String> = header.iter().map(|s| s.trim().to_string()).collect();
    if columns.iter().any(|c| c.is_empty()) {
        return Err("blank column name in the header row".to_string());
    }
    for (idx, column) in columns.iter().enumerate() {
        if columns[..idx].contains(column) {
            return Err(format!("duplicate column name {:?}", column));
        }
    }

    let mut rows: Vec<Vec<Datum>> = Vec::new();
    for (idx, record) in records.enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() != columns.len() {
            return Err(format!(
                "row {} has {} fields, the header has {}",
                idx + 2,
                record.len(),
                columns.len()
            ));
        }
        rows.push(record.iter().map(parse_datum).collect());
    }
    Ok(Table { columns, rows })
}

/// Parses one raw cell into a typed datum.
pub(crate) fn parse_datum(field: &str) -> Datum {
    let v = field.trim();
    if v.is_empty() {
        return Datum::Empty;
    }
    if let Ok(x) = v.parse::<f64>() {
        if x.is_finite() {
            return Datum::Number(x);
        }
    }
    if let Some(x) = parse_decimal_comma(v) {
        return Datum::Number(x);
    }
    if let Some(d) = parse_date(v) {
        return Datum::Date(d);
    }
    Datum::Text(v.to_string())
}

// Numbers written with a decimal comma, like `548,97`. A grouping
// separator is not recognized: `1.234,56` stays text.
fn parse_decimal_comma(v: &str) -> Option<f64> {
    let (int_part, frac_part) = v.split_once(',')?;
    let int_digits = int_part.strip_prefix('-').unwrap_or(int_part);
    if int_digits.is_empty() || frac_part.is_empty() {
        return None;
    }
    if !int_digits.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    format!("{}.{}", int_part, frac_part).parse::<f64>().ok()
}

// The two date notations accepted in cells: `1/5/2019` (US order) and
// `2019-01-05` (ISO). Their separators differ, so there is no ambiguity.
fn parse_date(v: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(v, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(v, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(table: &Table, row: usize, column: &str) -> Datum {
        let idx = table.column_index(column).unwrap();
        table.rows[row][idx].clone()
    }

    #[test]
    fn utf8_comma() {
        let table = ingest(b"City,Total\nYangon,10\nMandalay,5.5\n").unwrap();
        assert_eq!(table.columns, vec!["City", "Total"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(cell(&table, 0, "City"), Datum::Text("Yangon".to_string()));
        assert_eq!(cell(&table, 0, "Total"), Datum::Number(10.0));
        assert_eq!(cell(&table, 1, "Total"), Datum::Number(5.5));
    }

    #[test]
    fn utf8_semicolon_with_decimal_comma() {
        let table = ingest(b"City;Total\nYangon;548,97\nNaypyitaw;-10,5\n").unwrap();
        assert_eq!(table.num_columns(), 2);
        assert_eq!(cell(&table, 0, "Total"), Datum::Number(548.97));
        assert_eq!(cell(&table, 1, "Total"), Datum::Number(-10.5));
    }

    #[test]
    fn windows1252_comma() {
        // 0xE9 is e-acute in Windows-1252 and invalid UTF-8.
        let table = ingest(b"City,Place\nParis,caf\xe9\n").unwrap();
        assert_eq!(cell(&table, 0, "Place"), Datum::Text("caf\u{e9}".to_string()));
    }

    #[test]
    fn windows1252_semicolon() {
        // The comma combination fails on the second row (three fields),
        // so the semicolon one is adopted.
        let table = ingest(b"City;Note\nS\xe3o Paulo;a,b,c\n").unwrap();
        assert_eq!(table.columns, vec!["City", "Note"]);
        assert_eq!(
            cell(&table, 0, "City"),
            Datum::Text("S\u{e3}o Paulo".to_string())
        );
        assert_eq!(cell(&table, 0, "Note"), Datum::Text("a,b,c".to_string()));
    }

    #[test]
    fn byte_order_mark_is_stripped() {
        let table = ingest(b"\xEF\xBB\xBFCity,Total\nA,1\n").unwrap();
        assert_eq!(table.columns[0], "City");
    }

    #[test]
    fn quoted_fields_keep_the_delimiter() {
        let table = ingest(b"City,Note\nA,\"x, y\"\n").unwrap();
        assert_eq!(cell(&table, 0, "Note"), Datum::Text("x, y".to_string()));
    }

    #[test]
    fn dates_are_typed() {
        let table = ingest(b"Date,Total\n1/5/2019,10\n2019-02-03,20\n").unwrap();
        assert_eq!(
            cell(&table, 0, "Date"),
            Datum::Date(NaiveDate::from_ymd_opt(2019, 1, 5).unwrap())
        );
        assert_eq!(
            cell(&table, 1, "Date"),
            Datum::Date(NaiveDate::from_ymd_opt(2019, 2, 3).unwrap())
        );
    }

    #[test]
    fn single_column_is_accepted_when_nothing_splits() {
        let table = ingest(b"Notes\nhello world\nsecond line\n").unwrap();
        assert_eq!(table.num_columns(), 1);
        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn more_columns_win_over_a_single_column_parse() {
        // The comma combination parses cleanly as one column, but the
        // semicolon one splits into three.
        let table = ingest(b"a;b;c\n1;2;3\n").unwrap();
        assert_eq!(table.num_columns(), 3);
    }

    #[test]
    fn empty_input_fails() {
        assert_eq!(
            ingest(b""),
            Err(TableError::Ingest {
                reason: "every (encoding, delimiter) combination failed".to_string()
            })
        );
    }

    #[test]
    fn binary_input_fails() {
        let res = ingest(b"\x00\x01\x02PK\x03\x04");
        assert!(matches!(res, Err(TableError::Ingest { .. })));
    }

    #[test]
    fn inconsistent_widths_fail() {
        let res = ingest(b"a,b\nx;y\n1,2,3;4\n");
        assert!(matches!(res, Err(TableError::Ingest { .. })));
    }

    #[test]
    fn parse_datum_types() {
        assert_eq!(parse_datum(""), Datum::Empty);
        assert_eq!(parse_datum("   "), Datum::Empty);
        assert_eq!(parse_datum("42"), Datum::Number(42.0));
        assert_eq!(parse_datum("-3.25"), Datum::Number(-3.25));
        assert_eq!(parse_datum("548,97"), Datum::Number(548.97));
        assert_eq!(parse_datum("-548,97"), Datum::Number(-548.97));
        assert_eq!(
            parse_datum("3/14/2015"),
            Datum::Date(NaiveDate::from_ymd_opt(2015, 3, 14).unwrap())
        );
        assert_eq!(
            parse_datum("2015-03-14"),
            Datum::Date(NaiveDate::from_ymd_opt(2015, 3, 14).unwrap())
        );
        assert_eq!(parse_datum("PT"), Datum::Text("PT".to_string()));
        // A grouping separator is not recognized.
        assert_eq!(parse_datum("1.234,56"), Datum::Text("1.234,56".to_string()));
        // Specials never become numbers.
        assert_eq!(parse_datum("inf"), Datum::Text("inf".to_string()));
        assert_eq!(parse_datum("NaN"), Datum::Text("NaN".to_string()));
        // An invalid calendar date stays text.
        assert_eq!(parse_datum("13/45/2019"), Datum::Text("13/45/2019".to_string()));
    }
}
