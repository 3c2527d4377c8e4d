//! Tests for the formula lexer, parser, optimizer and cache.
use costwright::ast::{DisplayExpression, Expression, InputSource};
use costwright::compiler::{self, AstOptimizer, FormulaCache};
use costwright::error::ErrorKind;
use pretty_assertions::assert_eq;

fn var(name: &str) -> Box<Expression> {
    Box::new(Expression::variable(name))
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let ast = compiler::parse("a + b * c").unwrap();
    assert_eq!(
        ast,
        Expression::Sum(var("a"), Box::new(Expression::Multiply(var("b"), var("c"))))
    );
}

#[test]
fn test_subtraction_is_left_associative() {
    let ast = compiler::parse("a - b - c").unwrap();
    assert_eq!(
        ast,
        Expression::Subtract(Box::new(Expression::Subtract(var("a"), var("b"))), var("c"))
    );
}

#[test]
fn test_unary_minus_and_parentheses() {
    let ast = compiler::parse("-(a + 2)").unwrap();
    assert_eq!(
        ast,
        Expression::Negate(Box::new(Expression::Sum(
            var("a"),
            Box::new(Expression::Literal(2.0))
        )))
    );
}

#[test]
fn test_dotted_identifier_is_a_property_reference() {
    let ast = compiler::parse("paint.coverage * 2").unwrap();
    let Expression::Multiply(left, _) = ast else {
        panic!("expected a multiplication");
    };
    assert_eq!(
        *left,
        Expression::Input(InputSource::Property {
            target: "paint".to_string(),
            property: "coverage".to_string(),
        })
    );
}

#[test]
fn test_function_calls_with_arguments() {
    let ast = compiler::parse("max(a, 2, b * 3)").unwrap();
    let Expression::Call { name, args } = ast else {
        panic!("expected a call");
    };
    assert_eq!(name, "max");
    assert_eq!(args.len(), 3);

    let empty = compiler::parse("pi_value()").unwrap();
    assert!(matches!(empty, Expression::Call { ref args, .. } if args.is_empty()));
}

#[test]
fn test_display_round_trips_canonical_text() {
    for formula in [
        "a + b * c",
        "(a + b) * c",
        "a - (b - c)",
        "a / (b * c)",
        "-x * 2",
        "round(area / 3, 2) + paint.coverage",
    ] {
        let ast = compiler::parse(formula).unwrap();
        assert_eq!(ast.to_string(), formula);
        assert_eq!(compiler::parse(&ast.to_string()).unwrap(), ast);
    }
}

#[test]
fn test_syntax_errors() {
    for formula in ["", "   ", "1 +", "(1 + 2", "1 2", "a.b.c", "2x", "a $ b", "paint.coverage(2)", "max(1,", "*3"] {
        let error = compiler::parse(formula).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Syntax, "formula {:?}", formula);
    }
}

#[test]
fn test_scientific_and_leading_dot_numbers() {
    assert_eq!(compiler::parse("1.5e3").unwrap(), Expression::Literal(1500.0));
    assert_eq!(compiler::parse(".25").unwrap(), Expression::Literal(0.25));
}

#[test]
fn test_optimizer_folds_literals_but_keeps_inputs() {
    let folded = compiler::compile("width * (2 + 3) * 1", true).unwrap();
    assert_eq!(
        folded,
        Expression::Multiply(var("width"), Box::new(Expression::Literal(5.0)))
    );

    let unfolded = compiler::compile("width * (2 + 3) * 1", false).unwrap();
    assert_ne!(unfolded, folded);
}

#[test]
fn test_optimizer_keeps_division_by_zero_for_runtime() {
    let ast = AstOptimizer::optimize(compiler::parse("1 / 0").unwrap());
    assert!(matches!(ast, Expression::Divide(..)));
}

#[test]
fn test_formula_cache_reuses_parsed_asts() {
    let cache = FormulaCache::new(true, true);
    let first = cache.get_or_compile("a * b").unwrap();
    let second = cache.get_or_compile("a * b").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    assert!(cache.get_or_compile("a *").is_err());
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_disabled_cache_stores_nothing() {
    let cache = FormulaCache::new(false, true);
    cache.get_or_compile("a * b").unwrap();
    assert!(cache.is_empty());
}

#[test]
fn test_tree_display() {
    let ast = compiler::parse("width * (height + 2) - round(area, 1)").unwrap();
    let tree = DisplayExpression { expr: &ast }.to_string();
    let expected = "\
└── Subtract (-)
    ├── Multiply (*)
    │   ├── Input: width
    │   └── Sum (+)
    │       ├── Input: height
    │       └── Literal: 2
    └── Call: round/2
        ├── Input: area
        └── Literal: 1
";
    assert_eq!(tree, expected);
}
