//! Chart series construction.
//!
//! Query results destined for charts flow through these helpers: top-N
//! selection folds minor contributors into a synthetic "Other" series, and
//! the group builder inserts upslope/gap/downslope points so sparse data
//! renders without false plateaus.

pub mod builder;
pub mod top_n;

pub use builder::SeriesGroup;
pub use top_n::{bucket_values, select_top_contributors, ContributionBucket};

use serde::{Deserialize, Serialize};

/// One named chart series.
///
/// `name == None` is reserved for the synthetic "Other" series. A point
/// with a `None` value is an explicit break: the renderer stops the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSeries {
    /// Series name, `None` for the synthetic "Other" series
    pub name: Option<String>,
    /// Ordered (timestamp ms, value) points; `None` value breaks the line
    pub points: Vec<(i64, Option<f64>)>,
}

impl DataSeries {
    /// Creates an empty named series
    pub fn new<S: Into<String>>(name: S) -> Self {
        DataSeries {
            name: Some(name.into()),
            points: Vec::new(),
        }
    }

    /// Creates the synthetic "Other" series
    pub fn other() -> Self {
        DataSeries {
            name: None,
            points: Vec::new(),
        }
    }

    /// Appends a value point
    pub fn push_value(&mut self, capture_time: i64, value: f64) {
        self.points.push((capture_time, Some(value)));
    }

    /// Appends an explicit rendering break
    pub fn push_break(&mut self, capture_time: i64) {
        self.points.push((capture_time, None));
    }

    /// Returns true if this is the synthetic "Other" series
    pub fn is_other(&self) -> bool {
        self.name.is_none()
    }
}
