//! # Data Model
//!
//! Strongly-typed representation of the decoded upstream rows and of the
//! derived support-ratio series. The serde layout of [`Row`] matches the
//! persisted cache file (`wEst`, `eEst`, `wMed`, `eMed`, missing values as
//! `null`), and [`CountrySeries`] serialises the way the JSON API returns it.

use serde::{Deserialize, Serialize};

/// # Row
///
/// One record of the upstream CSV. Population cells are `None` when the cell
/// was empty, non-numeric, non-finite or negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Country or aggregate region name as it appears upstream.
    pub entity: String,
    /// Calendar year. `None` when the cell did not hold an integer.
    pub year: Option<i32>,
    /// Working-age (15-64) population, historical estimate.
    #[serde(rename = "wEst")]
    pub working_age_estimate: Option<f64>,
    /// Elderly (65+) population, historical estimate.
    #[serde(rename = "eEst")]
    pub elderly_estimate: Option<f64>,
    /// Working-age (15-64) population, UN medium variant.
    #[serde(rename = "wMed")]
    pub working_age_medium: Option<f64>,
    /// Elderly (65+) population, UN medium variant.
    #[serde(rename = "eMed")]
    pub elderly_medium: Option<f64>,
}

impl Row {
    /// A row with the given entity/year and every population cell missing.
    pub fn empty(entity: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            entity: entity.into(),
            year,
            working_age_estimate: None,
            elderly_estimate: None,
            working_age_medium: None,
            elderly_medium: None,
        }
    }
}

/// Whether a ratio point comes from historical estimates or from projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    /// Working-age and elderly estimates were both present and positive.
    Estimate,
    /// Fallback to the UN medium-variant projection.
    Projection,
}

/// # Ratio Point
///
/// A single support-ratio value for one entity and year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioPoint {
    /// Calendar year.
    pub year: i32,
    /// Working-age population divided by elderly population (always > 0).
    pub ratio: f64,
    /// Estimate or projection.
    #[serde(rename = "type")]
    pub kind: PointKind,
}

/// # Country Series
///
/// The derived series for one entity, ascending by year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountrySeries {
    /// Entity name, e.g. "South Korea".
    pub entity: String,
    /// One point per year, strictly increasing.
    pub series: Vec<RatioPoint>,
    /// Last point of kind estimate, if any estimate exists.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latest_estimate: Option<RatioPoint>,
}

impl CountrySeries {
    /// Ratio used for ordering the catalog: the latest estimate, or 0 when
    /// the entity has no historical estimate.
    pub fn sort_key(&self) -> f64 {
        self.latest_estimate.map_or(0.0, |p| p.ratio)
    }
}
