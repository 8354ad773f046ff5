//! Text form of a fitted function.
//!
//! The function text is cut into words (runs of letters, digits and periods)
//! and single delimiter characters. Words naming a parameter are replaced by
//! the parameter's value and the variable by the name of the dataset it was
//! fitted against. Everything else is copied through, so the output keeps
//! the user's spacing and operators. No arithmetic is done.

use std::collections::HashMap;

use nom::branch::alt;
use nom::bytes::complete::{take, take_while1};
use nom::multi::many0;
use nom::{IResult, Parser};

use crate::parameters::ParameterSet;

use super::settings::Variable;

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.'
}

fn token(input: &str) -> IResult<&str, &str> {
    alt((take_while1(is_word_char), take(1usize))).parse(input)
}

/// Split `expression` into words and single delimiter characters.
///
/// Concatenating the tokens gives back the input.
pub fn tokenize(expression: &str) -> Vec<&str> {
    match many0(token).parse(expression) {
        Ok((_, tokens)) => tokens,
        Err(_) => vec![expression],
    }
}

/// Render `expression` with parameter values and the variable's dataset name
/// substituted.
///
/// # Examples
///
/// ```
/// use exprfit::fit::{render, Variable};
/// use exprfit::parameters::ParameterSet;
///
/// let values = ParameterSet::from_pairs([("a", 2.0), ("b", 3.0)]).unwrap();
/// assert_eq!(render("a + b*x", &values, Variable::X, "time"), "2 + 3*time");
/// ```
pub fn render(
    expression: &str,
    values: &ParameterSet,
    variable: Variable,
    dataset_name: &str,
) -> String {
    let mut substitutions: HashMap<String, String> = values
        .iter_sorted()
        .map(|(name, value)| (name, value.to_string()))
        .collect();
    substitutions.insert(variable.name().to_string(), dataset_name.to_string());

    tokenize(expression)
        .into_iter()
        .map(|token| substitutions.get(token).map_or(token, String::as_str))
        .collect()
}
