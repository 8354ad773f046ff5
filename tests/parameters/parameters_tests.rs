//! Integration tests for the ParameterSet collection
//!
//! These tests verify that parameter sets behave correctly in various scenarios.

use std::collections::BTreeMap;
use std::fs;

use exprfit::{FitError, ParameterSet};
use ndarray::array;

#[test]
fn test_parameter_set_basic_operations() {
    let mut params = ParameterSet::new();
    assert!(params.is_empty());

    params.insert("amplitude", 10.0).unwrap();
    params.insert("center", 5.0).unwrap();
    params.insert("sigma", 2.0).unwrap();
    assert_eq!(params.len(), 3);
    assert!(params.contains("center"));

    // Overwriting keeps the count
    params.insert("center", 7.5).unwrap();
    assert_eq!(params.len(), 3);
    assert_eq!(params.get("center"), Some(7.5));

    assert_eq!(params.remove("amplitude"), Some(10.0));
    assert!(!params.contains("amplitude"));
    assert!(params.get("amplitude").is_none());

    let pairs: Vec<(String, f64)> = params.iter_sorted().collect();
    assert_eq!(
        pairs,
        vec![("center".to_string(), 7.5), ("sigma".to_string(), 2.0)]
    );
}

#[test]
fn test_many_parameters_sort_lexicographically() {
    let params = ParameterSet::from_pairs([
        ("p10", 10.0),
        ("p2", 2.0),
        ("P1", 1.0),
        ("_c", 0.0),
        ("p1", 1.0),
    ])
    .unwrap();

    // Byte order: uppercase before underscore before lowercase
    assert_eq!(params.sorted_names(), vec!["P1", "_c", "p1", "p10", "p2"]);

    let (names, values) = params.initial_vector();
    assert_eq!(params.to_array(&names).unwrap(), values);
    assert_eq!(values, array![1.0, 0.0, 1.0, 10.0, 2.0]);
}

#[test]
fn test_json_file_round_trip() {
    let params = ParameterSet::from_pairs([("b", 1.0), ("a", -0.25)]).unwrap();

    let path = std::env::temp_dir().join(format!("exprfit_params_{}.json", std::process::id()));
    params.save_json(&path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let a_pos = contents.find("\"a\"").unwrap();
    let b_pos = contents.find("\"b\"").unwrap();
    assert!(a_pos < b_pos, "keys should be written in sorted order");

    let loaded = ParameterSet::load_json(&path).unwrap();
    assert_eq!(loaded, params);
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_json_errors() {
    assert!(matches!(
        ParameterSet::from_json(r#"{"a": "one"}"#),
        Err(FitError::Json(_))
    ));
    assert!(matches!(
        ParameterSet::from_json(r#"{"1a": 1.0}"#),
        Err(FitError::Json(_))
    ));
    assert!(matches!(
        ParameterSet::load_json("/nonexistent/exprfit/params.json"),
        Err(FitError::Io(_))
    ));
}

#[test]
fn test_conversions() {
    let params = ParameterSet::from_pairs([("x0", 3.0)]).unwrap();
    let map: BTreeMap<String, f64> = params.clone().into();
    assert_eq!(map.get("x0"), Some(&3.0));

    let back = ParameterSet::try_from(map.into_iter().collect::<std::collections::HashMap<_, _>>())
        .unwrap();
    assert_eq!(back, params);
}
