//! Tests for formula evaluation against bound contexts.
mod common;
use common::*;
use costwright::evaluator::{self, Binding};
use costwright::error::BrokenLinkReason;
use costwright::prelude::*;
use proptest::prelude::*;

#[test]
fn test_width_times_height_times_price() {
    let (catalog, functions) = (catalog(), functions());
    let context = context_with(
        &catalog,
        &functions,
        &[("width", 3.0), ("height", 2.0), ("lumber_price", 10.0)],
    );
    let value = evaluator::evaluate("width * height * lumber_price", &context).unwrap();
    assert_eq!(value, 60.0);
}

#[test]
fn test_trace_records_every_input() {
    let (catalog, functions) = (catalog(), functions());
    let context = context_with(&catalog, &functions, &[("width", 3.0), ("height", 2.0)]);
    let trace = evaluator::evaluate_with_trace("width * height", &context).unwrap();
    assert_eq!(trace.get_outcome(), 6.0);
    assert_eq!(
        TraceFormatter::format_trace(&trace),
        "width (was 3) * height (was 2)"
    );
}

#[test]
fn test_builtins_and_constants() {
    let engine = engine();
    let cases = [
        ("sqrt(16)", 4.0),
        ("round(2.346, 2)", 2.35),
        ("round(2.5)", 3.0),
        ("ceil(1.2) + floor(1.8)", 3.0),
        ("abs(-3)", 3.0),
        ("max(1, 7, 3)", 7.0),
        ("min(4, 2)", 2.0),
        ("pow(2, 10)", 1024.0),
        ("clamp(15, 0, 10)", 10.0),
        ("sign(-2)", -1.0),
        ("round(pi, 2)", 3.14),
    ];
    for (formula, expected) in cases {
        let value = engine.evaluate(formula, &[]).unwrap();
        assert!((value - expected).abs() < 1e-9, "{} = {}", formula, value);
    }
}

#[test]
fn test_division_by_zero_names_the_sub_expression() {
    let engine = engine();
    let error = engine.evaluate("10 + width / (height - 2)", &[("width", 4.0), ("height", 2.0)]).unwrap_err();
    match error {
        FormulaError::Evaluation { message, expression } => {
            assert_eq!(message, "division by zero");
            assert_eq!(expression, "width / (height - 2)");
        }
        other => panic!("expected an evaluation error, got {:?}", other),
    }
}

#[test]
fn test_math_domain_errors() {
    let engine = engine();
    for formula in ["sqrt(-1)", "ln(0)", "log10(-5)", "clamp(1, 10, 0)"] {
        let error = engine.evaluate(formula, &[]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Evaluation, "{}", formula);
    }
}

#[test]
fn test_unknown_names_and_wrong_arity() {
    let engine = engine();
    assert_eq!(
        engine.evaluate("widht * 2", &[("width", 1.0)]).unwrap_err().kind(),
        ErrorKind::UnknownVariable
    );
    assert_eq!(engine.evaluate("nope(1)", &[]).unwrap_err().kind(), ErrorKind::UnknownVariable);
    assert_eq!(engine.evaluate("sqrt(1, 2)", &[]).unwrap_err().kind(), ErrorKind::Arity);
    assert_eq!(engine.evaluate("with_waste(1)", &[]).unwrap_err().kind(), ErrorKind::Arity);
}

#[test]
fn test_shared_functions() {
    let engine = engine();
    let value = engine.evaluate("with_waste(area, 10)", &[("area", 20.0)]).unwrap();
    assert!((value - 22.0).abs() < 1e-9);
}

#[test]
fn test_shared_function_bodies_only_see_their_parameters() {
    let functions = FunctionRegistry::new(vec![SharedFunction::new("leaky", &["x"], "x * width")]).unwrap();
    let engine = Engine::builder(catalog(), functions).build();
    let error = engine.evaluate("leaky(2)", &[("width", 3.0)]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnknownVariable);
}

#[test]
fn test_shared_function_bodies_read_catalog_items() {
    let functions = FunctionRegistry::new(vec![
        SharedFunction::new("board_weight", &["boards"], "boards * pine.weight"),
        SharedFunction::new("shadowed", &["pine"], "pine.weight"),
    ])
    .unwrap();
    let engine = Engine::builder(catalog(), functions).build();
    assert_eq!(engine.evaluate("board_weight(4)", &[]).unwrap(), 10.0);
    assert_eq!(
        engine.evaluate("shadowed(1)", &[]).unwrap_err().kind(),
        ErrorKind::UnknownVariable
    );
}

#[test]
fn test_recursive_shared_functions_hit_the_depth_limit() {
    let functions = FunctionRegistry::new(vec![SharedFunction::new("forever", &["x"], "forever(x + 1)")]).unwrap();
    let config = EngineConfig {
        max_call_depth: 8,
        ..EngineConfig::default()
    };
    let engine = Engine::builder(catalog(), functions).with_config(config).build();
    let error = engine.evaluate("forever(0)", &[]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Evaluation);
}

#[test]
fn test_catalog_fields_read_price_and_properties() {
    let (catalog, functions) = (catalog(), functions());
    let mut context = EvaluationContext::new(&catalog, &functions);
    let lumber = Field::new("lumber", FieldType::Material).with_category("lumber");
    context.bind_field(&lumber, Some(FieldValue::Text("pine".to_string())));

    assert_eq!(evaluator::evaluate("lumber", &context).unwrap(), 10.0);
    assert_eq!(evaluator::evaluate("lumber.price", &context).unwrap(), 10.0);
    assert_eq!(evaluator::evaluate("lumber.weight * 4", &context).unwrap(), 10.0);
    assert_eq!(
        evaluator::evaluate("lumber.colour", &context).unwrap_err().kind(),
        ErrorKind::UnknownVariable
    );
}

#[test]
fn test_direct_catalog_references() {
    let engine = engine();
    assert_eq!(engine.evaluate("hours * carpenter.rate", &[("hours", 2.0)]).unwrap(), 100.0);
    assert_eq!(engine.evaluate("carpenter.cost", &[]).unwrap(), 50.0);
    assert_eq!(engine.evaluate("pine.weight", &[]).unwrap(), 2.5);
}

#[test]
fn test_missing_catalog_selection_is_not_nan() {
    let (catalog, functions) = (catalog(), functions());
    let mut context = EvaluationContext::new(&catalog, &functions);
    let paint = Field::new("paint", FieldType::Material);
    context.bind_field(&paint, None);

    let error = evaluator::evaluate("paint.coverage * 2", &context).unwrap_err();
    assert_eq!(
        error,
        FormulaError::MissingCatalogSelection {
            field: "paint".to_string()
        }
    );

    // A selection whose item no longer exists counts as no selection.
    context.bind_field(&paint, Some(FieldValue::CatalogRef("deleted".to_string())));
    let error = evaluator::evaluate("paint.coverage * 2", &context).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::MissingCatalogSelection);
}

#[test]
fn test_field_value_coercions() {
    let (catalog, functions) = (catalog(), functions());
    let mut context = EvaluationContext::new(&catalog, &functions);
    context.bind_field(&Field::new("double_sided", FieldType::Boolean), Some(FieldValue::Boolean(true)));
    context.bind_field(&Field::new("note", FieldType::Text), Some(FieldValue::Text("hello".into())));
    let mut coats = Field::new("coats", FieldType::Dropdown);
    coats.options = vec!["1".into(), "2".into(), "3".into()];
    context.bind_field(&coats, Some(FieldValue::Text("2".into())));
    context.bind_field(&Field::new("width", FieldType::Number).required(), None);
    context.bind_field(&Field::new("spare", FieldType::Number), None);

    assert_eq!(evaluator::evaluate("(double_sided + 1) * coats", &context).unwrap(), 4.0);
    assert_eq!(evaluator::evaluate("spare", &context).unwrap(), 0.0);
    assert_eq!(evaluator::evaluate("note * 2", &context).unwrap_err().kind(), ErrorKind::Evaluation);
    assert_eq!(
        evaluator::evaluate("width * 2", &context).unwrap_err(),
        FormulaError::MissingRequiredInput {
            field: "width".to_string()
        }
    );
}

#[test]
fn test_invalid_stored_values_are_not_defaulted() {
    let (catalog, functions) = (catalog(), functions());
    let mut context = EvaluationContext::new(&catalog, &functions);
    let qty = Field::new("qty", FieldType::Number);
    context.bind_field(&qty, Some(FieldValue::Text("abc".into())));

    let error = evaluator::evaluate("qty * 10 + 1", &context).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Evaluation);
    assert!(error.to_string().contains("'qty'"), "{}", error);
    assert!(error.to_string().contains("'abc'"), "{}", error);

    // Blank text counts as nothing stored and takes the default.
    context.bind_field(&qty, Some(FieldValue::Text("  ".into())));
    assert_eq!(evaluator::evaluate("qty * 10 + 1", &context).unwrap(), 1.0);

    context.bind_field(&qty, Some(FieldValue::Text(" 4 ".into())));
    assert_eq!(evaluator::evaluate("qty * 10 + 1", &context).unwrap(), 41.0);
}

#[test]
fn test_broken_binding_fails_with_its_reason() {
    let (catalog, functions) = (catalog(), functions());
    let mut context = EvaluationContext::new(&catalog, &functions);
    context.bind("width", Binding::Broken { reason: BrokenLinkReason::Cycle });
    let error = evaluator::evaluate("width * 2", &context).unwrap_err();
    assert_eq!(
        error,
        FormulaError::BrokenLink {
            field: "width".to_string(),
            reason: BrokenLinkReason::Cycle,
        }
    );
}

proptest! {
    #[test]
    fn prop_evaluation_is_deterministic(width in -1e6f64..1e6, height in -1e6f64..1e6, price in 0.0f64..1e4) {
        let engine = engine();
        let formula = "round(width * height, 2) + max(width, height) * price - abs(height) / (abs(width) + 1)";
        let inputs = [("width", width), ("height", height), ("price", price)];
        let first = engine.evaluate(formula, &inputs).unwrap();
        let second = engine.evaluate(formula, &inputs).unwrap();
        prop_assert_eq!(first.to_bits(), second.to_bits());
    }
}
