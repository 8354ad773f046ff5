//! Integration tests for real-world fitting problems
//!
//! These tests fit typical laboratory functions written the way a user would
//! type them into a plotting program.

use std::collections::HashMap;

use approx::assert_relative_eq;
use exprfit::{Dataset, Diagnostics, Fit, FitSettings, NoAxes, ParameterSet};
use ndarray::Array1;

use crate::test_helpers::{noisy_samples, store};

/// Michaelis-Menten kinetics: v = vmax [S] / (km + [S])
#[test]
fn test_michaelis_menten() {
    let substrate = Array1::from_vec(vec![0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0]);
    let sigma = 0.01;
    let rate = noisy_samples(&substrate, |s| 1.8 * s / (0.9 + s), sigma, 11);
    let data = store("substrate", substrate, "rate", rate, sigma);

    let settings = FitSettings {
        function: "vmax*x/(km + x)".to_string(),
        values: ParameterSet::from_pairs([("vmax", 1.0), ("km", 1.0)]).unwrap(),
        x_data: "substrate".to_string(),
        y_data: "rate".to_string(),
        ..FitSettings::default()
    };

    let mut fit = Fit::with_settings(settings);
    let mut diagnostics = Diagnostics::new();
    let outcome = fit.fit(&data, &NoAxes, &mut diagnostics).unwrap();

    assert!(outcome.converged, "{}", outcome.message);
    assert_relative_eq!(fit.settings().values.get("vmax").unwrap(), 1.8, epsilon = 0.05);
    assert_relative_eq!(fit.settings().values.get("km").unwrap(), 0.9, epsilon = 0.05);
    assert!(fit.result().out_expr.contains("*substrate/("));
}

/// Radioactive decay counts without error bars: 5% errors are assumed
#[test]
fn test_decay_without_errors() {
    let t = Array1::linspace(0.0, 10.0, 30);
    let counts = t.mapv(|t: f64| 1000.0 * (-t / 3.0).exp() + 20.0);

    let mut data = HashMap::new();
    data.insert("time".to_string(), Dataset::new(t));
    data.insert("counts".to_string(), Dataset::new(counts));

    let settings = FitSettings {
        function: "n0*exp(-x/tau) + bg".to_string(),
        values: ParameterSet::from_pairs([("n0", 500.0), ("tau", 1.0), ("bg", 0.0)]).unwrap(),
        x_data: "time".to_string(),
        y_data: "counts".to_string(),
        ..FitSettings::default()
    };

    let mut fit = Fit::with_settings(settings);
    let mut diagnostics = Diagnostics::new();
    let outcome = fit.fit(&data, &NoAxes, &mut diagnostics).unwrap();

    assert!(outcome.converged, "{}", outcome.message);
    let values = &fit.settings().values;
    assert_relative_eq!(values.get("n0").unwrap(), 1000.0, epsilon = 1e-3);
    assert_relative_eq!(values.get("tau").unwrap(), 3.0, epsilon = 1e-5);
    assert_relative_eq!(values.get("bg").unwrap(), 20.0, epsilon = 1e-3);

    let warnings = diagnostics.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("5%"));
}

/// A function undefined at one of the points is fitted on the others
#[test]
fn test_sqrt_model_with_undefined_point() {
    let x = Array1::from_vec(vec![-1.0, 0.5, 1.0, 2.0, 4.0, 8.0]);
    let y = x.mapv(|x: f64| if x > 0.0 { 3.0 * x.sqrt() } else { 0.0 });
    let data = store("x", x.clone(), "y", y, 0.1);

    let settings = FitSettings {
        function: "a*sqrt(x) + b".to_string(),
        values: ParameterSet::from_pairs([("a", 1.0), ("b", 1.0)]).unwrap(),
        ..FitSettings::default()
    };
    let mut fit = Fit::with_settings(settings);
    let mut diagnostics = Diagnostics::new();
    let outcome = fit.fit(&data, &NoAxes, &mut diagnostics).unwrap();

    assert!(outcome.converged, "{}", outcome.message);
    assert_relative_eq!(fit.settings().values.get("a").unwrap(), 3.0, epsilon = 1e-6);
    assert_relative_eq!(fit.settings().values.get("b").unwrap(), 0.0, epsilon = 1e-6);
    assert!(fit.result().chi2.is_finite());
    assert_eq!(fit.result().dof, 4);

    let warnings = diagnostics.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.starts_with("1 of 6 points"));

    // The curve is still available for plotting where it is defined
    let curve = fit.evaluate(&x);
    assert!(curve[0].is_nan());
    assert_relative_eq!(curve[2], 3.0, epsilon = 1e-6);
}
