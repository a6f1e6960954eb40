//! # Entity Catalog
//!
//! Cross-entity views of the row set: the distinct entities, the rows grouped
//! by entity, and every series sorted by latest estimated ratio.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::model::{CountrySeries, Row};
use crate::series::series_from_rows;

/// Distinct entity names, in order of first appearance.
pub fn entities(rows: &[Row]) -> Vec<String> {
    data_by_country(rows)
        .into_iter()
        .map(|(entity, _)| entity.to_string())
        .collect()
}

/// Rows grouped by entity. Groups are in order of first appearance and
/// rows keep file order inside their group.
pub fn data_by_country(rows: &[Row]) -> Vec<(&str, Vec<&Row>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Row>)> = Vec::new();

    for row in rows {
        match index.entry(row.entity.as_str()) {
            Entry::Occupied(slot) => groups[*slot.get()].1.push(row),
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push((row.entity.as_str(), vec![row]));
            }
        }
    }
    groups
}

/// Every entity's series, ascending by latest estimated ratio.
///
/// Entities without a single valid point are dropped. An entity with no
/// estimate sorts as ratio 0, i.e. first. The sort is stable, so ties keep
/// first-appearance order.
pub fn list_all_countries(rows: &[Row]) -> Vec<CountrySeries> {
    let mut countries: Vec<CountrySeries> = data_by_country(rows)
        .into_iter()
        .filter_map(|(entity, group)| series_from_rows(entity, group))
        .filter(|country| !country.series.is_empty())
        .collect();

    countries.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
    countries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PointKind;

    fn estimate(entity: &str, year: i32, w: f64, e: f64) -> Row {
        let mut row = Row::empty(entity, Some(year));
        row.working_age_estimate = Some(w);
        row.elderly_estimate = Some(e);
        row
    }

    fn projection(entity: &str, year: i32, w: f64, e: f64) -> Row {
        let mut row = Row::empty(entity, Some(year));
        row.working_age_medium = Some(w);
        row.elderly_medium = Some(e);
        row
    }

    #[test]
    fn entities_are_distinct_in_first_appearance_order() {
        let rows = vec![
            estimate("Chile", 2000, 1.0, 1.0),
            estimate("Japan", 2000, 1.0, 1.0),
            estimate("Chile", 2001, 1.0, 1.0),
        ];
        assert_eq!(entities(&rows), vec!["Chile", "Japan"]);
    }

    #[test]
    fn grouping_keeps_file_order() {
        let rows = vec![
            estimate("Chile", 2001, 1.0, 1.0),
            estimate("Japan", 2000, 1.0, 1.0),
            estimate("Chile", 2000, 1.0, 1.0),
        ];
        let groups = data_by_country(&rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Chile");
        let years: Vec<Option<i32>> = groups[0].1.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![Some(2001), Some(2000)]);
    }

    #[test]
    fn sorted_ascending_by_latest_estimate() {
        let rows = vec![
            estimate("Niger", 2021, 100.0, 3.0),
            estimate("Japan", 2021, 70.0, 30.0),
            projection("Japan", 2050, 50.0, 40.0),
            estimate("Chile", 2021, 60.0, 10.0),
            projection("Futureland", 2050, 10.0, 1.0),
            Row::empty("Emptyland", Some(2000)),
        ];
        let countries = list_all_countries(&rows);

        let names: Vec<&str> = countries.iter().map(|c| c.entity.as_str()).collect();
        assert_eq!(names, vec!["Futureland", "Japan", "Chile", "Niger"]);
        assert!(countries
            .windows(2)
            .all(|pair| pair[0].sort_key() <= pair[1].sort_key()));
        assert_eq!(countries[0].latest_estimate, None);
        assert_eq!(countries[0].series[0].kind, PointKind::Projection);
    }

    #[test]
    fn ties_are_deterministic() {
        let rows = vec![
            estimate("B", 2000, 4.0, 2.0),
            estimate("A", 2000, 2.0, 1.0),
            estimate("C", 2000, 6.0, 3.0),
        ];
        let first = list_all_countries(&rows);
        let second = list_all_countries(&rows);

        assert_eq!(first, second);
        let names: Vec<&str> = first.iter().map(|c| c.entity.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }
}
