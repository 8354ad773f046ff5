//! Fit configuration and fit result.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parameters::ParameterSet;

/// Which axis role supplies the independent variable of the fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    /// Fit `y = f(x)`: independent values come from the x dataset
    #[default]
    X,
    /// Fit `x = f(y)`: independent values come from the y dataset
    Y,
}

impl Variable {
    /// The name the variable has inside the fit function.
    pub fn name(&self) -> &'static str {
        match self {
            Variable::X => "x",
            Variable::Y => "y",
        }
    }

    /// The other axis role.
    pub fn other(&self) -> Self {
        match self {
            Variable::X => Variable::Y,
            Variable::Y => Variable::X,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User-facing configuration of a fit.
///
/// Missing fields take their defaults when deserializing, so a settings file
/// only needs to name what differs:
///
/// ```
/// use exprfit::fit::{FitSettings, Variable};
///
/// let settings = FitSettings::from_json(r#"{"function": "a*exp(b*x)"}"#).unwrap();
/// assert_eq!(settings.function, "a*exp(b*x)");
/// assert_eq!(settings.variable, Variable::X);
/// assert_eq!(settings.x_data, "x");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitSettings {
    /// Function to fit, e.g. `a + b*x`
    pub function: String,

    /// Fitted parameters and their current values
    pub values: ParameterSet,

    /// Dataset providing the x values
    pub x_data: String,

    /// Dataset providing the y values
    pub y_data: String,

    /// Independent variable of the function
    pub variable: Variable,

    /// Fit only the data inside the plotted range of the independent axis
    pub fit_range: bool,

    /// Axis the x dataset is plotted on
    pub x_axis: String,

    /// Axis the y dataset is plotted on
    pub y_axis: String,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            function: "a + b*x".to_string(),
            values: ParameterSet::from_pairs([("a", 0.0), ("b", 1.0)]).unwrap_or_default(),
            x_data: "x".to_string(),
            y_data: "y".to_string(),
            variable: Variable::X,
            fit_range: false,
            x_axis: "x".to_string(),
            y_axis: "y".to_string(),
        }
    }
}

impl FitSettings {
    /// Dataset names as `(independent, dependent)` for the configured variable.
    pub fn data_roles(&self) -> (&str, &str) {
        match self.variable {
            Variable::X => (&self.x_data, &self.y_data),
            Variable::Y => (&self.y_data, &self.x_data),
        }
    }

    /// The axis the independent dataset is plotted on.
    pub fn independent_axis(&self) -> &str {
        match self.variable {
            Variable::X => &self.x_axis,
            Variable::Y => &self.y_axis,
        }
    }

    /// Save settings to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Quality of the last fit and the fitted function as text.
///
/// `-1` in `chi2`, `dof` or `redchi2` means "not computed".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitResult {
    pub chi2: f64,
    pub dof: i64,
    pub redchi2: f64,
    pub out_expr: String,
}

impl Default for FitResult {
    fn default() -> Self {
        Self {
            chi2: -1.0,
            dof: -1,
            redchi2: -1.0,
            out_expr: String::new(),
        }
    }
}

impl FitResult {
    /// Whether a fit has filled in the statistics.
    pub fn is_computed(&self) -> bool {
        self.dof >= 0
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result:")?;
        writeln!(f, "  chi2: {}", self.chi2)?;
        writeln!(f, "  dof: {}", self.dof)?;
        writeln!(f, "  reduced chi2: {}", self.redchi2)?;
        write!(f, "  {}", self.out_expr)
    }
}
