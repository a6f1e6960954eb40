//! # Grapher CSV Decoder
//!
//! Pure function from the raw CSV text to typed [`Row`]s. Columns are found
//! by exact header name, never by position, because the physical column
//! order of the upstream export is not stable.
//!
//! The decoder favours partial data over failure: a missing column, a short
//! line or an unparsable cell becomes a missing value, never an error and
//! never zero.

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::model::Row;

/// Header of the entity name column.
pub const COL_ENTITY: &str = "Entity";
/// Header of the year column.
pub const COL_YEAR: &str = "Year";
/// Header of the working-age estimate column.
pub const COL_WORKING_AGE_ESTIMATE: &str = "Population - Sex: all - Age: 15-64 - Variant: estimates";
/// Header of the elderly estimate column.
pub const COL_ELDERLY_ESTIMATE: &str = "Population - Sex: all - Age: 65+ - Variant: estimates";
/// Header of the working-age medium-variant column.
pub const COL_WORKING_AGE_MEDIUM: &str = "Population - Sex: all - Age: 15-64 - Variant: medium";
/// Header of the elderly medium-variant column.
pub const COL_ELDERLY_MEDIUM: &str = "Population - Sex: all - Age: 65+ - Variant: medium";

/// # Columns
///
/// Position of each required column in the header row, `None` when the
/// header is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct Columns {
    pub entity: Option<usize>,
    pub year: Option<usize>,
    pub working_age_estimate: Option<usize>,
    pub elderly_estimate: Option<usize>,
    pub working_age_medium: Option<usize>,
    pub elderly_medium: Option<usize>,
}

impl Columns {
    /// Locates the required columns in `headers` by exact (trimmed) name.
    pub fn locate(headers: &StringRecord) -> Self {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_matches('\u{feff}').trim() == name)
        };

        Self {
            entity: find(COL_ENTITY),
            year: find(COL_YEAR),
            working_age_estimate: find(COL_WORKING_AGE_ESTIMATE),
            elderly_estimate: find(COL_ELDERLY_ESTIMATE),
            working_age_medium: find(COL_WORKING_AGE_MEDIUM),
            elderly_medium: find(COL_ELDERLY_MEDIUM),
        }
    }

    /// Names of the required columns that were not found.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (self.entity, COL_ENTITY),
            (self.year, COL_YEAR),
            (self.working_age_estimate, COL_WORKING_AGE_ESTIMATE),
            (self.elderly_estimate, COL_ELDERLY_ESTIMATE),
            (self.working_age_medium, COL_WORKING_AGE_MEDIUM),
            (self.elderly_medium, COL_ELDERLY_MEDIUM),
        ]
        .into_iter()
        .filter_map(|(idx, name)| idx.is_none().then_some(name))
        .collect()
    }

    /// Builds a [`Row`] from one data record.
    pub fn row(&self, record: &StringRecord) -> Row {
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i));

        Row {
            entity: cell(self.entity).unwrap_or_default().to_string(),
            year: cell(self.year).and_then(parse_year),
            working_age_estimate: cell(self.working_age_estimate).and_then(parse_population),
            elderly_estimate: cell(self.elderly_estimate).and_then(parse_population),
            working_age_medium: cell(self.working_age_medium).and_then(parse_population),
            elderly_medium: cell(self.elderly_medium).and_then(parse_population),
        }
    }
}

/// Decodes the whole CSV document, one [`Row`] per data line, in file order.
///
/// Cells are split on commas with no quote handling, so a stray `"` stays in
/// its cell. Blank lines are not records. An empty document, or one without a
/// header line, yields no rows.
pub fn decode_rows(text: &str) -> Vec<Row> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let columns = match reader.headers() {
        Ok(headers) => Columns::locate(headers),
        Err(e) => {
            warn!(error = %e, "CSV header line could not be read");
            return Vec::new();
        }
    };

    let missing = columns.missing();
    if !missing.is_empty() {
        warn!(?missing, "CSV is missing required columns; their values are treated as absent");
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(columns.row(&record)),
            Err(e) => debug!(line = line + 2, error = %e, "Skipping unreadable CSV record"),
        }
    }
    rows
}

/// Parses a population cell. Empty, non-numeric, non-finite and negative
/// values are missing. Zero is kept; the deriver rejects it.
fn parse_population(cell: &str) -> Option<f64> {
    let value = cell.trim().parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Parses a year cell; accepts integral floats such as `2020.0`.
fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if let Ok(year) = cell.parse::<i32>() {
        return Some(year);
    }
    let value = cell.parse::<f64>().ok()?;
    let in_range = value.is_finite() && value.fract() == 0.0 && value.abs() <= f64::from(i32::MAX);
    in_range.then_some(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> String {
        [
            COL_ENTITY,
            "Code",
            COL_YEAR,
            COL_WORKING_AGE_ESTIMATE,
            COL_ELDERLY_ESTIMATE,
            COL_WORKING_AGE_MEDIUM,
            COL_ELDERLY_MEDIUM,
        ]
        .join(",")
    }

    #[test]
    fn decodes_rows_in_file_order() {
        let text = format!(
            "{}\nJapan,JPN,2000,86000000,22000000,,\nJapan,JPN,2050,,,52000000,37000000\n",
            header()
        );
        let rows = decode_rows(&text);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity, "Japan");
        assert_eq!(rows[0].year, Some(2000));
        assert_eq!(rows[0].working_age_estimate, Some(86_000_000.0));
        assert_eq!(rows[0].working_age_medium, None);
        assert_eq!(rows[1].year, Some(2050));
        assert_eq!(rows[1].elderly_medium, Some(37_000_000.0));
        assert_eq!(rows[1].elderly_estimate, None);
    }

    #[test]
    fn columns_are_found_by_name_not_position() {
        let text = format!(
            "{},{},{},{},{},{}\n30,20,100,10,Chile,1990\n",
            COL_ELDERLY_MEDIUM,
            COL_WORKING_AGE_MEDIUM,
            COL_WORKING_AGE_ESTIMATE,
            COL_ELDERLY_ESTIMATE,
            COL_ENTITY,
            COL_YEAR
        );
        let rows = decode_rows(&text);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.entity, "Chile");
        assert_eq!(row.year, Some(1990));
        assert_eq!(row.working_age_estimate, Some(100.0));
        assert_eq!(row.elderly_estimate, Some(10.0));
        assert_eq!(row.working_age_medium, Some(20.0));
        assert_eq!(row.elderly_medium, Some(30.0));
    }

    #[test]
    fn missing_column_yields_missing_values() {
        let text = format!("{},{},{}\nPeru,2001,500\n", COL_ENTITY, COL_YEAR, COL_WORKING_AGE_ESTIMATE);
        let rows = decode_rows(&text);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].working_age_estimate, Some(500.0));
        assert_eq!(rows[0].elderly_estimate, None);
        assert_eq!(rows[0].working_age_medium, None);
        assert_eq!(rows[0].elderly_medium, None);
    }

    #[test]
    fn short_lines_keep_the_reachable_cells() {
        let text = format!("{}\nKenya,KEN,1970\n", header());
        let rows = decode_rows(&text);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], Row::empty("Kenya", Some(1970)));
    }

    #[test]
    fn invalid_cells_are_missing_never_zero() {
        let text = format!("{}\nMali,MLI,abc,n/a,-5,NaN,0\n", header());
        let rows = decode_rows(&text);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, None);
        assert_eq!(rows[0].working_age_estimate, None);
        assert_eq!(rows[0].elderly_estimate, None);
        assert_eq!(rows[0].working_age_medium, None);
        assert_eq!(rows[0].elderly_medium, Some(0.0));
    }

    #[test]
    fn tolerates_crlf_bom_and_blank_lines() {
        let text = format!("\u{feff}{}\r\nFiji,FJI,2010,1,2,3,4\r\n\r\nFiji,FJI,2011,5,6,7,8\r\n", header());
        let rows = decode_rows(&text);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity, "Fiji");
        assert_eq!(rows[1].year, Some(2011));
        assert_eq!(rows[1].elderly_medium, Some(8.0));
    }

    #[test]
    fn unbalanced_quote_does_not_swallow_later_lines() {
        let text = format!(
            "{}\n\"Broken,BRK,2000,1,1,,\nJapan,JPN,2000,86,22,,\nChile,CHL,2000,60,10,,\n",
            header()
        );
        let rows = decode_rows(&text);

        let entities: Vec<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities, vec!["\"Broken", "Japan", "Chile"]);
        assert_eq!(rows[1].working_age_estimate, Some(86.0));
        assert_eq!(rows[2].elderly_estimate, Some(10.0));
    }

    #[test]
    fn empty_document_has_no_rows() {
        assert!(decode_rows("").is_empty());
        assert!(decode_rows(&header()).is_empty());
    }

    #[test]
    fn year_accepts_integral_floats_only() {
        assert_eq!(parse_year("2020"), Some(2020));
        assert_eq!(parse_year(" 2020.0 "), Some(2020));
        assert_eq!(parse_year("2020.5"), None);
        assert_eq!(parse_year(""), None);
    }
}
