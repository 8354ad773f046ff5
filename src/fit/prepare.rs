//! Preparation of the observation arrays for a fit.
//!
//! Picks the independent and dependent series according to the configured
//! variable, fills in missing uncertainties, optionally restricts the points
//! to the plotted range of the independent axis and validates the result.

use ndarray::Array1;

use crate::data::{AxisSource, DataSource, Dataset};
use crate::diagnostics::{Diagnostics, FitStage};
use crate::error::{FitError, Result};

use super::settings::FitSettings;

/// Fraction of the value used as error when a series has no uncertainties.
pub const DEFAULT_RELATIVE_ERROR: f64 = 0.05;

/// Smallest synthesized error, keeping zero values from getting zero weight.
pub const MIN_SYNTHESIZED_ERROR: f64 = 1e-8;

/// Cleaned observations ready for the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    /// Independent values
    pub x: Array1<f64>,
    /// Dependent values
    pub y: Array1<f64>,
    /// Uncertainty of each dependent value
    pub yerr: Array1<f64>,
}

impl Observations {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Build the observations for fitting `parameter_count` parameters.
///
/// Every failure is pushed to `diagnostics` as an error before it is
/// returned. Substituted uncertainties and the applied range are reported as
/// warnings and infos.
pub fn prepare(
    settings: &FitSettings,
    data: &dyn DataSource,
    axes: &dyn AxisSource,
    parameter_count: usize,
    diagnostics: &mut Diagnostics,
) -> Result<Observations> {
    let (independent_name, dependent_name) = settings.data_roles();
    let independent = lookup(data, independent_name, diagnostics)?;
    let dependent = lookup(data, dependent_name, diagnostics)?;

    if independent.is_empty() {
        return Err(abort(diagnostics, FitError::NoData));
    }

    let x = independent.data.clone();
    let y = dependent.data.clone();
    let yerr = synthesize_errors(dependent, diagnostics);

    let yerr_len = error_len(dependent, &yerr);
    if x.len() != y.len() || x.len() != yerr_len {
        return Err(abort(
            diagnostics,
            FitError::LengthMismatch {
                x: x.len(),
                y: y.len(),
                yerr: yerr_len,
            },
        ));
    }

    let mut observations = Observations { x, y, yerr };

    if settings.fit_range {
        let axis = settings.independent_axis();
        match axes.plotted_range(axis) {
            Some(bounds) => {
                observations = restrict_to_range(&observations, bounds);
                diagnostics.info(
                    FitStage::Preparing,
                    format!(
                        "Fitting {} from {} to {}",
                        settings.variable, bounds.0, bounds.1
                    ),
                );
            }
            None => diagnostics.warn(
                FitStage::Preparing,
                format!("No plotted range for axis '{}'. Fitting all data.", axis),
            ),
        }
    }

    if observations.is_empty() {
        return Err(abort(diagnostics, FitError::NoData));
    }

    if parameter_count > observations.len() {
        return Err(abort(
            diagnostics,
            FitError::NoDegreesOfFreedom {
                parameters: parameter_count,
                points: observations.len(),
            },
        ));
    }

    Ok(observations)
}

fn lookup<'d>(
    data: &'d dyn DataSource,
    name: &str,
    diagnostics: &mut Diagnostics,
) -> Result<&'d Dataset> {
    if !data.has_data(name) {
        return Err(abort(diagnostics, FitError::MissingDataset(name.to_string())));
    }
    data.get_data(name)
        .ok_or_else(|| abort(diagnostics, FitError::MissingDataset(name.to_string())))
}

/// Length of the uncertainties supplied for `dependent`. Asymmetric errors of
/// different lengths report the one that disagrees with the values.
fn error_len(dependent: &Dataset, yerr: &Array1<f64>) -> usize {
    match (&dependent.serr, &dependent.perr, &dependent.nerr) {
        (None, Some(perr), Some(nerr)) if perr.len() != nerr.len() => {
            if perr.len() != dependent.len() {
                perr.len()
            } else {
                nerr.len()
            }
        }
        _ => yerr.len(),
    }
}

fn abort(diagnostics: &mut Diagnostics, err: FitError) -> FitError {
    diagnostics.error(FitStage::Preparing, err.to_string());
    err
}

/// Uncertainties of the dependent series.
///
/// Uses the symmetric error if present; otherwise the root mean square of the
/// positive and negative errors if both are present; otherwise 5% of each
/// value, at least [`MIN_SYNTHESIZED_ERROR`].
pub fn synthesize_errors(dataset: &Dataset, diagnostics: &mut Diagnostics) -> Array1<f64> {
    if let Some(serr) = &dataset.serr {
        return serr.clone();
    }

    if let (Some(perr), Some(nerr)) = (&dataset.perr, &dataset.nerr) {
        diagnostics.warn(
            FitStage::Preparing,
            "Symmetrizing positive and negative errors",
        );
        return perr
            .iter()
            .zip(nerr.iter())
            .map(|(p, n)| (0.5 * (p * p + n * n)).sqrt())
            .collect();
    }

    diagnostics.warn(
        FitStage::Preparing,
        "No errors on dependent values. Assuming 5% errors.",
    );
    dataset.data.mapv(|value| {
        let err = value * DEFAULT_RELATIVE_ERROR;
        if err < MIN_SYNTHESIZED_ERROR {
            MIN_SYNTHESIZED_ERROR
        } else {
            err
        }
    })
}

/// Keep only points whose independent value lies in `[min, max]`.
pub fn restrict_to_range(observations: &Observations, (min, max): (f64, f64)) -> Observations {
    let keep: Vec<usize> = observations
        .x
        .iter()
        .enumerate()
        .filter(|(_, x)| **x >= min && **x <= max)
        .map(|(i, _)| i)
        .collect();

    let select = |values: &Array1<f64>| keep.iter().map(|&i| values[i]).collect::<Array1<f64>>();

    Observations {
        x: select(&observations.x),
        y: select(&observations.y),
        yerr: select(&observations.yerr),
    }
}
