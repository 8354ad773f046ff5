//! Tests for parsing, evaluating and compiling fit functions

use std::collections::HashMap;

use approx::assert_relative_eq;
use exprfit::parameters::expression::{
    EvaluationContext, Expression, ExpressionError, SimpleContext,
};
use exprfit::ParameterSet;

fn eval_with(input: &str, vars: &[(&str, f64)]) -> Result<f64, ExpressionError> {
    let mut context = SimpleContext::new();
    for (name, value) in vars {
        context.set_variable(name, *value);
    }
    Expression::parse(input)?.evaluate(&context)
}

#[test]
fn test_parse_accepts_fit_functions() {
    for input in [
        "a + b*x",
        "a*exp(-x/tau) + c",
        "amp * exp(-0.5*((x - mu)/sigma)**2)",
        "p0 + p1*x + p2*x^2 + p3*x**3",
        "  (  x  +  y  )  *  z  ",
        "-2 * x",
        "x + (-y)",
        "1.5e-3 * x",
        ".5 * x",
        "atan2(y, x) % (2*pi)",
    ] {
        assert!(Expression::parse(input).is_ok(), "failed to parse '{}'", input);
    }
}

#[test]
fn test_parse_rejects_malformed_input() {
    for input in ["", "x +", "x + (y", "@#$%", "a b", "sin(", "x ** ", "2 3", "a,b"] {
        assert!(
            matches!(Expression::parse(input), Err(ExpressionError::ParseError { .. })),
            "parsed '{}'",
            input
        );
    }
}

#[test]
fn test_variables() {
    let expr = Expression::parse("amp * exp(-0.5*((x - mu)/sigma)**2) + amp").unwrap();
    assert_eq!(expr.variables(), vec!["amp", "mu", "sigma", "x"]);

    let expr = Expression::parse("sin(x) + cos(y)").unwrap();
    assert_eq!(expr.variables(), vec!["x", "y"]);

    assert!(Expression::parse("42").unwrap().variables().is_empty());
}

#[test]
fn test_operator_precedence_and_associativity() {
    let cases = [
        ("1 + 2 * 3", 7.0),
        ("(1 + 2) * 3", 9.0),
        ("10 - 4 - 3", 3.0),
        ("24 / 4 / 2", 3.0),
        ("2 ** 3 ** 2", 512.0),
        ("2 ^ 3 ^ 2", 512.0),
        ("-2 ** 2", -4.0),
        ("(-2) ** 2", 4.0),
        ("2 ** -1", 0.5),
        ("7 % 4 * 2", 6.0),
        ("-7 % 3", 2.0),
        ("+3 - -3", 6.0),
    ];
    for (input, expected) in cases {
        assert_relative_eq!(eval_with(input, &[]).unwrap(), expected, epsilon = 1e-12);
    }
}

#[test]
fn test_functions() {
    let vars = [("x", 2.0), ("y", 3.0), ("z", 4.0)];
    let cases = [
        ("sin(x)", 2.0f64.sin()),
        ("cos(y)", 3.0f64.cos()),
        ("tan(x)", 2.0f64.tan()),
        ("arctan(x)", 2.0f64.atan()),
        ("atan2(y, x)", 3.0f64.atan2(2.0)),
        ("tanh(x)", 2.0f64.tanh()),
        ("exp(x)", 2.0f64.exp()),
        ("log(y)", 3.0f64.ln()),
        ("ln(y)", 3.0f64.ln()),
        ("log10(z)", 4.0f64.log10()),
        ("log2(z)", 2.0),
        ("sqrt(z)", 2.0),
        ("abs(-x)", 2.0),
        ("floor(2.7)", 2.0),
        ("ceil(2.2)", 3.0),
        ("pow(x, y)", 8.0),
        ("max(x, y, z)", 4.0),
        ("min(x, y, z)", 2.0),
        ("sin(x)^2 + cos(x)^2", 1.0),
        ("log(exp(x))", 2.0),
    ];
    for (input, expected) in cases {
        assert_relative_eq!(eval_with(input, &vars).unwrap(), expected, epsilon = 1e-10);
    }
}

#[test]
fn test_constants_and_shadowing() {
    assert_relative_eq!(eval_with("pi", &[]).unwrap(), std::f64::consts::PI);
    assert_relative_eq!(eval_with("e", &[]).unwrap(), std::f64::consts::E);
    assert!(eval_with("inf", &[]).unwrap().is_infinite());
    assert!(eval_with("nan", &[]).unwrap().is_nan());

    // A variable named like a constant wins
    assert_eq!(eval_with("e * 2", &[("e", 5.0)]).unwrap(), 10.0);
}

#[test]
fn test_evaluation_errors() {
    assert_eq!(
        eval_with("y", &[("x", 2.0)]),
        Err(ExpressionError::UndefinedVariable {
            name: "y".to_string()
        })
    );
    assert_eq!(eval_with("x / 0", &[("x", 2.0)]), Err(ExpressionError::DivisionByZero));
    assert_eq!(eval_with("x % 0", &[("x", 2.0)]), Err(ExpressionError::DivisionByZero));
    assert_eq!(
        eval_with("unknown_func(x)", &[("x", 2.0)]),
        Err(ExpressionError::UndefinedFunction {
            name: "unknown_func".to_string()
        })
    );
    assert!(matches!(
        eval_with("sin(x, x)", &[("x", 2.0)]),
        Err(ExpressionError::InvalidOperation { .. })
    ));
    assert!(matches!(
        eval_with("max(x)", &[("x", 2.0)]),
        Err(ExpressionError::InvalidOperation { .. })
    ));

    // Domain errors are not errors, they are NaN
    assert!(eval_with("log(-1)", &[]).unwrap().is_nan());
}

#[test]
fn test_context_implementations() {
    let mut context = SimpleContext::new();
    context.set_variable("x", 2.0);
    assert!(context.has_variable("x"));
    assert!(!context.has_variable("z"));
    assert_eq!(context.get_variable("x").unwrap(), 2.0);
    assert!(context.get_variable("z").is_err());
    assert_eq!(context.remove_variable("x"), Some(2.0));
    assert!(context.variable_names().is_empty());

    let mut map = HashMap::new();
    map.insert("a".to_string(), 4.0);
    assert!(map.has_variable("a"));
    assert_eq!(map.variable_names(), vec!["a".to_string()]);

    let params = ParameterSet::from_pairs([("a", 1.0), ("b", 2.0)]).unwrap();
    let expr = Expression::parse("a + b").unwrap();
    assert_eq!(expr.evaluate(&params).unwrap(), 3.0);
}

#[test]
fn test_compiled_matches_evaluated() {
    let expr = Expression::parse("amp * exp(-0.5*((x - mu)/sigma)**2) + bg").unwrap();
    let slots = ["amp", "bg", "mu", "sigma", "x"];
    let compiled = expr.compile(&slots).unwrap();
    assert_eq!(compiled.slot_count(), 5);

    for x in [-1.0, 0.0, 0.3, 2.5] {
        let values = [2.0, 0.1, 0.5, 0.7, x];
        let mut context = SimpleContext::new();
        for (name, value) in slots.iter().zip(values.iter()) {
            context.set_variable(name, *value);
        }
        assert_relative_eq!(
            compiled.eval(&values).unwrap(),
            expr.evaluate(&context).unwrap(),
            epsilon = 1e-14
        );
    }

    // Wrong number of values
    assert!(compiled.eval(&[1.0, 2.0]).is_err());
}

#[test]
fn test_compile_reports_unknown_names() {
    let expr = Expression::parse("a + q").unwrap();
    assert_eq!(
        expr.compile(&["a"]),
        Err(ExpressionError::UndefinedVariable {
            name: "q".to_string()
        })
    );

    let expr = Expression::parse("frobnicate(a)").unwrap();
    assert!(matches!(
        expr.compile(&["a"]),
        Err(ExpressionError::UndefinedFunction { .. })
    ));
}
