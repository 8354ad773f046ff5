#[cfg(test)]
mod tests {
    use crate::parameters::{is_valid_name, Expression, ParameterError, ParameterSet};
    use ndarray::array;

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("a"));
        assert!(is_valid_name("amp_2"));
        assert!(is_valid_name("_offset"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("2a"));
        assert!(!is_valid_name("a.b"));
        assert!(!is_valid_name("a b"));

        let mut params = ParameterSet::new();
        match params.insert("bad name", 1.0) {
            Err(ParameterError::InvalidName { name }) => assert_eq!(name, "bad name"),
            _ => panic!("Expected InvalidName error"),
        }
        assert!(params.is_empty());
    }

    #[test]
    fn test_sorted_order_is_independent_of_insertion() {
        let forward = ParameterSet::from_pairs([("a", 1.0), ("b", 2.0), ("c", 3.0)]).unwrap();
        let backward = ParameterSet::from_pairs([("c", 3.0), ("b", 2.0), ("a", 1.0)]).unwrap();

        assert_eq!(forward.sorted_names(), backward.sorted_names());
        assert_eq!(forward.initial_vector(), backward.initial_vector());
        assert_eq!(forward.sorted_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_vector_round_trip_keeps_positions() {
        let params = ParameterSet::from_pairs([("slope", 1.0), ("offset", 0.0)]).unwrap();
        let (names, values) = params.initial_vector();
        assert_eq!(names, vec!["offset", "slope"]);
        assert_eq!(values, array![0.0, 1.0]);

        let updated = params.with_values(&names, &array![5.0, 7.0]).unwrap();
        assert_eq!(updated.get("offset"), Some(5.0));
        assert_eq!(updated.get("slope"), Some(7.0));

        // The original is untouched
        assert_eq!(params.get("slope"), Some(1.0));
    }

    #[test]
    fn test_with_values_length_mismatch() {
        let params = ParameterSet::from_pairs([("a", 1.0), ("b", 2.0)]).unwrap();
        let names = params.sorted_names();
        let result = params.with_values(&names, &array![1.0]);
        assert_eq!(
            result,
            Err(ParameterError::LengthMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_to_array_missing_name() {
        let params = ParameterSet::from_pairs([("a", 1.0)]).unwrap();
        let names = vec!["a".to_string(), "z".to_string()];
        assert!(matches!(
            params.to_array(&names),
            Err(ParameterError::ParameterNotFound { .. })
        ));
    }

    #[test]
    fn test_set_requires_existing() {
        let mut params = ParameterSet::from_pairs([("a", 1.0)]).unwrap();
        params.set("a", 4.0).unwrap();
        assert_eq!(params.get("a"), Some(4.0));
        assert!(params.set("b", 1.0).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let params = ParameterSet::from_pairs([("b", 1.5), ("a", -2.0)]).unwrap();
        let json = params.to_json().unwrap();

        // Keys are written in sorted order
        assert!(json.find("\"a\"").unwrap() < json.find("\"b\"").unwrap());

        let loaded = ParameterSet::from_json(&json).unwrap();
        assert_eq!(loaded, params);

        // Names are validated on load
        assert!(ParameterSet::from_json(r#"{"not valid": 1.0}"#).is_err());
    }

    #[test]
    fn test_json_file_round_trip() {
        let params = ParameterSet::from_pairs([("a", 0.0), ("b", 1.0)]).unwrap();
        let path = std::env::temp_dir().join("exprfit_parameters_test.json");

        params.save_json(&path).unwrap();
        let loaded = ParameterSet::load_json(&path).unwrap();
        assert_eq!(loaded, params);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_parameter_set_as_context() {
        let params = ParameterSet::from_pairs([("a", 2.0), ("b", 3.0)]).unwrap();
        let value = Expression::parse("a * b + 1")
            .unwrap()
            .evaluate(&params)
            .unwrap();
        assert_eq!(value, 7.0);
    }
}
