//! # Series Deriver
//!
//! Turns the rows of one entity into its support-ratio series.
//!
//! Per row, estimates win over projections:
//! 1. working-age and elderly estimates both present and > 0: `estimate` point;
//! 2. else medium-variant values both present and > 0: `projection` point;
//! 3. else no point.
//!
//! Points are sorted by year here; upstream file order is not relied on.
//! When two rows share a year, an estimate beats a projection and otherwise
//! the first row wins.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::model::{CountrySeries, PointKind, RatioPoint, Row};

fn ratio(working_age: Option<f64>, elderly: Option<f64>) -> Option<f64> {
    match (working_age, elderly) {
        (Some(w), Some(e)) if w > 0.0 && e > 0.0 => Some(w / e),
        _ => None,
    }
}

/// The point a single row contributes, if any.
pub fn row_point(row: &Row) -> Option<RatioPoint> {
    let year = row.year?;

    if let Some(ratio) = ratio(row.working_age_estimate, row.elderly_estimate) {
        return Some(RatioPoint {
            year,
            ratio,
            kind: PointKind::Estimate,
        });
    }

    ratio(row.working_age_medium, row.elderly_medium).map(|ratio| RatioPoint {
        year,
        ratio,
        kind: PointKind::Projection,
    })
}

/// Builds the series of `entity` from rows already known to belong to it.
///
/// Returns `None` when `rows` is empty. A non-empty input whose rows are
/// all invalid gives a series with no points.
pub fn series_from_rows<'a, I>(entity: &str, rows: I) -> Option<CountrySeries>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut matched = false;
    let mut by_year: BTreeMap<i32, RatioPoint> = BTreeMap::new();

    for row in rows {
        matched = true;
        let Some(point) = row_point(row) else {
            continue;
        };
        match by_year.entry(point.year) {
            Entry::Vacant(slot) => {
                slot.insert(point);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().kind == PointKind::Projection && point.kind == PointKind::Estimate {
                    slot.insert(point);
                }
            }
        }
    }

    if !matched {
        return None;
    }

    let series: Vec<RatioPoint> = by_year.into_values().collect();
    let latest_estimate = series
        .iter()
        .rev()
        .find(|p| p.kind == PointKind::Estimate)
        .copied();

    Some(CountrySeries {
        entity: entity.to_string(),
        series,
        latest_estimate,
    })
}

/// Derives the series of `entity` from the full row set.
///
/// `None` when no row names `entity`.
pub fn derive_series(rows: &[Row], entity: &str) -> Option<CountrySeries> {
    series_from_rows(entity, rows.iter().filter(|r| r.entity == entity))
}
