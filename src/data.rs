//! Access to the externally owned observation data and axis ranges.
//!
//! The fit only reads data. It looks datasets up by name through
//! [`DataSource`] and, when restricting to the visible range, asks an
//! [`AxisSource`] for the plotted bounds of an axis. Both traits have
//! in-memory implementations for `HashMap`.

use std::collections::HashMap;

use ndarray::Array1;

/// A named series of values with optional uncertainties.
///
/// `serr` is a symmetric error; `perr` and `nerr` are the positive and
/// negative parts of an asymmetric error. Error arrays are expected to have
/// the same length as `data` but this is only checked when fitting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub data: Array1<f64>,
    pub serr: Option<Array1<f64>>,
    pub perr: Option<Array1<f64>>,
    pub nerr: Option<Array1<f64>>,
}

impl Dataset {
    /// A dataset without error bars.
    pub fn new(data: Array1<f64>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Attach a symmetric error.
    pub fn with_symmetric_error(mut self, serr: Array1<f64>) -> Self {
        self.serr = Some(serr);
        self
    }

    /// Attach an asymmetric error. `nerr` may be given with either sign.
    pub fn with_asymmetric_error(mut self, perr: Array1<f64>, nerr: Array1<f64>) -> Self {
        self.perr = Some(perr);
        self.nerr = Some(nerr);
        self
    }

    /// Attach only a positive error.
    pub fn with_positive_error(mut self, perr: Array1<f64>) -> Self {
        self.perr = Some(perr);
        self
    }

    /// Attach only a negative error.
    pub fn with_negative_error(mut self, nerr: Array1<f64>) -> Self {
        self.nerr = Some(nerr);
        self
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Minimum and maximum of the values extended by their error bars.
    ///
    /// Non-finite values are skipped. Returns `None` if nothing finite is left.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut bounds: Option<(f64, f64)> = None;
        let mut extend = |value: f64| {
            if !value.is_finite() {
                return;
            }
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(value), hi.max(value)),
                None => (value, value),
            });
        };

        for (i, &value) in self.data.iter().enumerate() {
            extend(value);
            if let Some(serr) = &self.serr {
                if let Some(&err) = serr.get(i) {
                    extend(value - err.abs());
                    extend(value + err.abs());
                }
            }
            if let Some(&err) = self.perr.as_ref().and_then(|perr| perr.get(i)) {
                extend(value + err.abs());
            }
            if let Some(&err) = self.nerr.as_ref().and_then(|nerr| nerr.get(i)) {
                extend(value - err.abs());
            }
        }

        bounds
    }
}

/// Lookup of datasets by name.
pub trait DataSource {
    /// Whether a dataset with this name exists.
    fn has_data(&self, name: &str) -> bool;

    /// The dataset with this name, if any.
    fn get_data(&self, name: &str) -> Option<&Dataset>;
}

impl DataSource for HashMap<String, Dataset> {
    fn has_data(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn get_data(&self, name: &str) -> Option<&Dataset> {
        self.get(name)
    }
}

/// Lookup of the currently plotted range of an axis.
pub trait AxisSource {
    /// `(min, max)` of the named axis, or `None` if the axis is unknown or
    /// has no range yet.
    fn plotted_range(&self, axis: &str) -> Option<(f64, f64)>;
}

impl AxisSource for HashMap<String, (f64, f64)> {
    fn plotted_range(&self, axis: &str) -> Option<(f64, f64)> {
        self.get(axis).copied()
    }
}

/// An axis source that knows no axes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAxes;

impl AxisSource for NoAxes {
    fn plotted_range(&self, _axis: &str) -> Option<(f64, f64)> {
        None
    }
}
