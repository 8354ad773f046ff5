//! Named parameter values varied by a fit
//!
//! A [`ParameterSet`] maps parameter names to values. Whenever parameters
//! are laid out as a vector for the solver, the layout is the one returned by
//! [`ParameterSet::sorted_names`]: names sorted lexicographically. Writing a
//! solved vector back goes through the same list, so names and values always
//! line up positionally regardless of how the map iterates.

use crate::error::Result;
use crate::parameters::expression::{EvaluationContext, ExprResult, ExpressionError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when working with a parameter set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("'{name}' is not a valid parameter name")]
    InvalidName { name: String },

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },

    #[error("Expected {expected} parameter values, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Whether `name` can appear as a single token in a fit expression.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// A collection of named parameter values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "HashMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct ParameterSet {
    values: HashMap<String, f64>,
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parameter set from `(name, value)` pairs
    ///
    /// # Examples
    ///
    /// ```
    /// use exprfit::parameters::ParameterSet;
    ///
    /// let params = ParameterSet::from_pairs([("b", 1.0), ("a", 0.0)]).unwrap();
    /// assert_eq!(params.sorted_names(), vec!["a", "b"]);
    /// ```
    pub fn from_pairs<I, S>(pairs: I) -> std::result::Result<Self, ParameterError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.insert(name, value)?;
        }
        Ok(params)
    }

    /// Insert or overwrite a parameter
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        value: f64,
    ) -> std::result::Result<(), ParameterError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(ParameterError::InvalidName { name });
        }
        self.values.insert(name, value);
        Ok(())
    }

    /// Get the value of a parameter
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Overwrite the value of an existing parameter
    pub fn set(&mut self, name: &str, value: f64) -> std::result::Result<(), ParameterError> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ParameterError::ParameterNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter names in the canonical (lexicographic) order.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }

    /// `(name, value)` pairs in the canonical order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        self.sorted_names().into_iter().map(move |name| {
            let value = self.values[&name];
            (name, value)
        })
    }

    /// Values laid out in the order of `names`
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::ParameterNotFound`] if a name is missing.
    pub fn to_array(&self, names: &[String]) -> std::result::Result<Array1<f64>, ParameterError> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| ParameterError::ParameterNotFound { name: name.clone() })
            })
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map(Array1::from_vec)
    }

    /// The canonical name list together with the matching value vector.
    pub fn initial_vector(&self) -> (Vec<String>, Array1<f64>) {
        let names = self.sorted_names();
        let values = names.iter().map(|name| self.values[name]).collect();
        (names, values)
    }

    /// A copy of this set with `values[i]` written to `names[i]`
    ///
    /// Names not already present are added. Nothing is modified if the
    /// lengths disagree.
    pub fn with_values(
        &self,
        names: &[String],
        values: &Array1<f64>,
    ) -> std::result::Result<Self, ParameterError> {
        if names.len() != values.len() {
            return Err(ParameterError::LengthMismatch {
                expected: names.len(),
                got: values.len(),
            });
        }

        let mut updated = self.clone();
        for (name, value) in names.iter().zip(values.iter()) {
            updated.insert(name.clone(), *value)?;
        }
        Ok(updated)
    }

    /// Save parameters to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Serialize parameters to a JSON object keyed by name
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load parameters from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    /// Load parameters from a JSON object keyed by name
    ///
    /// # Examples
    ///
    /// ```
    /// use exprfit::parameters::ParameterSet;
    ///
    /// let params = ParameterSet::from_json(r#"{"a": 0.0, "b": 1.0}"#).unwrap();
    /// assert_eq!(params.get("b"), Some(1.0));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TryFrom<HashMap<String, f64>> for ParameterSet {
    type Error = ParameterError;

    fn try_from(values: HashMap<String, f64>) -> std::result::Result<Self, Self::Error> {
        Self::from_pairs(values)
    }
}

impl From<ParameterSet> for BTreeMap<String, f64> {
    fn from(params: ParameterSet) -> Self {
        params.values.into_iter().collect()
    }
}

impl EvaluationContext for ParameterSet {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.get(name)
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.contains(name)
    }

    fn variable_names(&self) -> Vec<String> {
        self.sorted_names()
    }
}
