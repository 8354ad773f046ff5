//! Expression parsing and evaluation for fit functions
//!
//! A fit function such as `a + b*exp(-x/c)` is parsed once into an
//! [`Expression`] tree. The tree can be evaluated directly against any
//! [`EvaluationContext`], or compiled against a fixed list of variable names
//! into a [`CompiledExpression`] that is evaluated repeatedly from a slice of
//! values. The latter is what the fitting loop uses.
//!
//! Operators: `+ - * / %` (left-associative), `**` and `^` (right-associative,
//! binding tighter than unary minus), unary `-` and `+`, parentheses.
//! Names that are not bound by the caller fall back to the builtin constants
//! `pi`, `e`, `inf` and `nan`.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{multispace0, one_of},
    combinator::recognize,
    error::ErrorKind,
    number::complete::recognize_float,
    IResult, Parser,
};
use std::collections::HashMap;
use thiserror::Error;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },
}

/// Result type for expression evaluation
pub type ExprResult<T> = Result<T, ExpressionError>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Variable reference
    Variable(String),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,

    /// Subtraction (-)
    Sub,

    /// Multiplication (*)
    Mul,

    /// Division (/)
    Div,

    /// Remainder (%)
    Rem,

    /// Power (** or ^)
    Pow,
}

impl BinaryOp {
    fn apply(self, lhs: f64, rhs: f64) -> ExprResult<f64> {
        match self {
            BinaryOp::Add => Ok(lhs + rhs),
            BinaryOp::Sub => Ok(lhs - rhs),
            BinaryOp::Mul => Ok(lhs * rhs),
            BinaryOp::Div | BinaryOp::Rem if rhs == 0.0 => Err(ExpressionError::DivisionByZero),
            BinaryOp::Div => Ok(lhs / rhs),
            BinaryOp::Rem => Ok(lhs - rhs * (lhs / rhs).floor()),
            BinaryOp::Pow => Ok(lhs.powf(rhs)),
        }
    }
}

/// Value of a builtin constant, if `name` is one.
pub fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "inf" => Some(f64::INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    }
}

/// Functions available to every expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Log2,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Pow,
    Min,
    Max,
}

impl Builtin {
    /// Look up a builtin by the name used in expressions.
    pub fn lookup(name: &str) -> Option<Self> {
        let builtin = match name {
            "sin" => Builtin::Sin,
            "cos" => Builtin::Cos,
            "tan" => Builtin::Tan,
            "asin" | "arcsin" => Builtin::Asin,
            "acos" | "arccos" => Builtin::Acos,
            "atan" | "arctan" => Builtin::Atan,
            "atan2" | "arctan2" => Builtin::Atan2,
            "sinh" => Builtin::Sinh,
            "cosh" => Builtin::Cosh,
            "tanh" => Builtin::Tanh,
            "exp" => Builtin::Exp,
            "log" | "ln" => Builtin::Ln,
            "log10" => Builtin::Log10,
            "log2" => Builtin::Log2,
            "sqrt" => Builtin::Sqrt,
            "abs" => Builtin::Abs,
            "floor" => Builtin::Floor,
            "ceil" => Builtin::Ceil,
            "pow" => Builtin::Pow,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            _ => return None,
        };
        Some(builtin)
    }

    fn check_arity(self, name: &str, count: usize) -> ExprResult<()> {
        let ok = match self {
            Builtin::Atan2 | Builtin::Pow => count == 2,
            Builtin::Min | Builtin::Max => count >= 2,
            _ => count == 1,
        };
        if ok {
            return Ok(());
        }
        let expected = match self {
            Builtin::Atan2 | Builtin::Pow => "2 arguments",
            Builtin::Min | Builtin::Max => "at least 2 arguments",
            _ => "1 argument",
        };
        Err(ExpressionError::InvalidOperation {
            message: format!("{}() requires {}, got {}", name, expected, count),
        })
    }

    /// Apply to already evaluated arguments. Arity must have been checked.
    fn apply(self, args: &[f64]) -> f64 {
        match self {
            Builtin::Sin => args[0].sin(),
            Builtin::Cos => args[0].cos(),
            Builtin::Tan => args[0].tan(),
            Builtin::Asin => args[0].asin(),
            Builtin::Acos => args[0].acos(),
            Builtin::Atan => args[0].atan(),
            Builtin::Atan2 => args[0].atan2(args[1]),
            Builtin::Sinh => args[0].sinh(),
            Builtin::Cosh => args[0].cosh(),
            Builtin::Tanh => args[0].tanh(),
            Builtin::Exp => args[0].exp(),
            Builtin::Ln => args[0].ln(),
            Builtin::Log10 => args[0].log10(),
            Builtin::Log2 => args[0].log2(),
            Builtin::Sqrt => args[0].sqrt(),
            Builtin::Abs => args[0].abs(),
            Builtin::Floor => args[0].floor(),
            Builtin::Ceil => args[0].ceil(),
            Builtin::Pow => args[0].powf(args[1]),
            Builtin::Min => args.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
            Builtin::Max => args.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
        }
    }
}

/// Context for expression evaluation, providing variable values
pub trait EvaluationContext {
    /// Get the value of a variable
    fn get_variable(&self, name: &str) -> ExprResult<f64>;

    /// Check if a variable exists
    fn has_variable(&self, name: &str) -> bool;

    /// Get the names of all variables
    fn variable_names(&self) -> Vec<String>;
}

/// Simple implementation of EvaluationContext using a HashMap
#[derive(Debug, Clone, Default)]
pub struct SimpleContext {
    /// Map of variable names to values
    variables: HashMap<String, f64>,
}

impl SimpleContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
        }
    }

    /// Set a variable value
    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }

    /// Remove a variable
    pub fn remove_variable(&mut self, name: &str) -> Option<f64> {
        self.variables.remove(name)
    }

    /// Create a new context with the given variables
    pub fn with_variables(variables: HashMap<String, f64>) -> Self {
        Self { variables }
    }
}

impl EvaluationContext for SimpleContext {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.variables.get_variable(name)
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }
}

impl EvaluationContext for HashMap<String, f64> {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn variable_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

impl Expression {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> ExprResult<Self> {
        match additive(input) {
            Ok((remainder, expr)) => {
                // Make sure the entire input was consumed
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{:?}", e),
            }),
        }
    }

    /// Evaluate the expression with the given context
    pub fn evaluate<C: EvaluationContext>(&self, context: &C) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Variable(name) => {
                if context.has_variable(name) {
                    context.get_variable(name)
                } else {
                    constant(name).ok_or_else(|| ExpressionError::UndefinedVariable {
                        name: name.clone(),
                    })
                }
            }

            Self::Unary(UnaryOp::Neg, expr) => Ok(-expr.evaluate(context)?),

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(context)?;
                let rhs = right.evaluate(context)?;
                op.apply(lhs, rhs)
            }

            Self::Function(name, args) => {
                let builtin =
                    Builtin::lookup(name).ok_or_else(|| ExpressionError::UndefinedFunction {
                        name: name.clone(),
                    })?;
                builtin.check_arity(name, args.len())?;

                let mut evaluated_args = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated_args.push(arg.evaluate(context)?);
                }
                Ok(builtin.apply(&evaluated_args))
            }
        }
    }

    /// Resolve every name in the expression against `slots`, producing a tree
    /// that is evaluated from a value slice laid out in the same order.
    ///
    /// When a name appears more than once in `slots` the first occurrence
    /// wins. Names missing from `slots` fall back to the builtin constants.
    pub fn compile<S: AsRef<str>>(&self, slots: &[S]) -> ExprResult<CompiledExpression> {
        let root = self.compile_node(slots)?;
        Ok(CompiledExpression {
            root,
            slot_count: slots.len(),
        })
    }

    fn compile_node<S: AsRef<str>>(&self, slots: &[S]) -> ExprResult<Node> {
        let node = match self {
            Self::Number(n) => Node::Constant(*n),

            Self::Variable(name) => match slots.iter().position(|s| s.as_ref() == name.as_str()) {
                Some(index) => Node::Slot(index),
                None => Node::Constant(constant(name).ok_or_else(|| {
                    ExpressionError::UndefinedVariable { name: name.clone() }
                })?),
            },

            Self::Unary(UnaryOp::Neg, expr) => Node::Neg(Box::new(expr.compile_node(slots)?)),

            Self::Binary(op, left, right) => Node::Binary(
                *op,
                Box::new(left.compile_node(slots)?),
                Box::new(right.compile_node(slots)?),
            ),

            Self::Function(name, args) => {
                let builtin =
                    Builtin::lookup(name).ok_or_else(|| ExpressionError::UndefinedFunction {
                        name: name.clone(),
                    })?;
                builtin.check_arity(name, args.len())?;
                let args = args
                    .iter()
                    .map(|arg| arg.compile_node(slots))
                    .collect::<ExprResult<Vec<_>>>()?;
                Node::Call(builtin, args)
            }
        };
        Ok(node)
    }

    /// Find all variable names used in the expression
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    /// Recursively collect all variable names used in the expression
    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Self::Number(_) => {}

            Self::Variable(name) => {
                vars.push(name.clone());
            }

            Self::Unary(_, expr) => {
                expr.collect_variables(vars);
            }

            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }

            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

/// An expression whose names have been resolved to value slots.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    root: Node,
    slot_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Constant(f64),
    Slot(usize),
    Neg(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Call(Builtin, Vec<Node>),
}

impl CompiledExpression {
    /// Number of values expected by [`CompiledExpression::eval`].
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Evaluate with `values[i]` bound to the i-th slot name given to
    /// [`Expression::compile`].
    pub fn eval(&self, values: &[f64]) -> ExprResult<f64> {
        if values.len() != self.slot_count {
            return Err(ExpressionError::InvalidOperation {
                message: format!(
                    "expected {} slot values, got {}",
                    self.slot_count,
                    values.len()
                ),
            });
        }
        self.root.eval(values)
    }
}

impl Node {
    fn eval(&self, values: &[f64]) -> ExprResult<f64> {
        match self {
            Node::Constant(v) => Ok(*v),
            Node::Slot(index) => Ok(values[*index]),
            Node::Neg(inner) => Ok(-inner.eval(values)?),
            Node::Binary(op, left, right) => op.apply(left.eval(values)?, right.eval(values)?),
            Node::Call(builtin, args) => {
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(arg.eval(values)?);
                }
                Ok(builtin.apply(&evaluated))
            }
        }
    }
}

// Parser functions using nom

type ParseResult<'a, O> = IResult<&'a str, O>;

fn parse_failure(input: &str, kind: ErrorKind) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, kind))
}

fn ws(input: &str) -> ParseResult<'_, &str> {
    multispace0(input)
}

/// Match `text` after optional whitespace
fn symbol<'a>(input: &'a str, text: &'static str) -> ParseResult<'a, &'a str> {
    let (input, _) = ws(input)?;
    tag(text).parse(input)
}

/// Parse an identifier (variable or function name)
fn identifier(input: &str) -> ParseResult<'_, &str> {
    recognize((
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Recognize an unsigned decimal literal such as `3`, `2.`, `.5` or `1.5e-3`.
/// Signs are left to the unary operator.
fn number_literal(input: &str) -> ParseResult<'_, &str> {
    if input.starts_with(['+', '-']) {
        return Err(parse_failure(input, ErrorKind::Float));
    }
    recognize_float(input)
}

/// Parse a comma-separated list of expressions (for function arguments)
fn arguments(input: &str) -> ParseResult<'_, Vec<Expression>> {
    if symbol(input, ")").is_ok() {
        return Ok((input, Vec::new()));
    }

    let (mut input, first) = additive(input)?;
    let mut args = vec![first];
    while let Ok((after_comma, _)) = symbol(input, ",") {
        let (rest, arg) = additive(after_comma)?;
        args.push(arg);
        input = rest;
    }
    Ok((input, args))
}

/// Parse a number, function call, variable or parenthesized expression
fn primary(input: &str) -> ParseResult<'_, Expression> {
    let (input, _) = ws(input)?;

    if let Ok((rest, text)) = number_literal(input) {
        let value = text
            .parse::<f64>()
            .map_err(|_| parse_failure(input, ErrorKind::Float))?;
        return Ok((rest, Expression::Number(value)));
    }

    if let Ok((rest, name)) = identifier(input) {
        if let Ok((rest, _)) = symbol(rest, "(") {
            let (rest, args) = arguments(rest)?;
            let (rest, _) = symbol(rest, ")")?;
            return Ok((rest, Expression::Function(name.to_string(), args)));
        }
        return Ok((rest, Expression::Variable(name.to_string())));
    }

    let (input, _) = symbol(input, "(")?;
    let (input, expr) = additive(input)?;
    let (input, _) = symbol(input, ")")?;
    Ok((input, expr))
}

fn power_operator(input: &str) -> ParseResult<'_, &str> {
    let (input, _) = ws(input)?;
    alt((tag("**"), tag("^"))).parse(input)
}

/// Parse a power expression; the exponent may itself carry a sign
fn power(input: &str) -> ParseResult<'_, Expression> {
    let (input, base) = primary(input)?;
    match power_operator(input) {
        Ok((rest, _)) => {
            let (rest, exponent) = unary(rest)?;
            Ok((
                rest,
                Expression::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
            ))
        }
        Err(_) => Ok((input, base)),
    }
}

/// Parse a signed expression (-expr, +expr)
fn unary(input: &str) -> ParseResult<'_, Expression> {
    if let Ok((rest, _)) = symbol(input, "-") {
        let (rest, operand) = unary(rest)?;
        return Ok((rest, Expression::Unary(UnaryOp::Neg, Box::new(operand))));
    }
    if let Ok((rest, _)) = symbol(input, "+") {
        return unary(rest);
    }
    power(input)
}

fn operator_char<'a>(input: &'a str, chars: &'static str) -> ParseResult<'a, char> {
    let (input, _) = ws(input)?;
    one_of(chars).parse(input)
}

fn multiplicative_operator(input: &str) -> ParseResult<'_, BinaryOp> {
    let (trimmed, _) = ws(input)?;
    if trimmed.starts_with("**") {
        return Err(parse_failure(trimmed, ErrorKind::Char));
    }
    let (rest, op) = operator_char(trimmed, "*/%")?;
    let op = match op {
        '*' => BinaryOp::Mul,
        '/' => BinaryOp::Div,
        _ => BinaryOp::Rem,
    };
    Ok((rest, op))
}

fn additive_operator(input: &str) -> ParseResult<'_, BinaryOp> {
    let (rest, op) = operator_char(input, "+-")?;
    let op = if op == '+' {
        BinaryOp::Add
    } else {
        BinaryOp::Sub
    };
    Ok((rest, op))
}

/// Parse a multiplicative expression (expr * expr, expr / expr, expr % expr)
fn multiplicative(input: &str) -> ParseResult<'_, Expression> {
    let (mut input, mut acc) = unary(input)?;
    while let Ok((after_op, op)) = multiplicative_operator(input) {
        let (rest, rhs) = unary(after_op)?;
        acc = Expression::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
    Ok((input, acc))
}

/// Parse an additive expression (expr + expr, expr - expr)
fn additive(input: &str) -> ParseResult<'_, Expression> {
    let (mut input, mut acc) = multiplicative(input)?;
    while let Ok((after_op, op)) = additive_operator(input) {
        let (rest, rhs) = multiplicative(after_op)?;
        acc = Expression::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
    Ok((input, acc))
}
