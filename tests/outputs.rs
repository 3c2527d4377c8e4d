//! Tests for sequential computed-output evaluation.
mod common;
use common::*;
use costwright::outputs::evaluate_computed_outputs;
use costwright::prelude::*;
use pretty_assertions::assert_eq;

fn estimate_module() -> ModuleDefinition {
    ModuleDefinition::new("estimate", "out.total")
        .with_field(Field::new("width", FieldType::Number))
        .with_field(Field::new("height", FieldType::Number))
        .with_field(Field::new("divisor", FieldType::Number))
        .with_output(ComputedOutput::new("area", "width * height"))
        .with_output(ComputedOutput::new("share", "area / divisor"))
        .with_output(ComputedOutput::new("doubled_share", "out.share * 2"))
        .with_output(ComputedOutput::new("total", "area * 5"))
}

#[test]
fn test_outputs_accumulate_in_order() {
    let (catalog, functions) = (catalog(), functions());
    let module = estimate_module();
    let mut context = context_with(
        &catalog,
        &functions,
        &[("width", 4.0), ("height", 2.0), ("divisor", 4.0)],
    );

    let outputs = evaluate_computed_outputs(&module, &mut context);
    let values: Vec<(&str, Option<f64>)> = outputs
        .iter()
        .map(|(name, result)| (name, result.ok()))
        .collect();
    assert_eq!(
        values,
        vec![
            ("area", Some(8.0)),
            ("share", Some(2.0)),
            ("doubled_share", Some(4.0)),
            ("total", Some(40.0)),
        ]
    );
    assert!(context.binding("out.total").is_some());
    assert!(context.binding("total").is_some());
}

#[test]
fn test_failed_output_is_excluded_but_the_rest_continue() {
    let (catalog, functions) = (catalog(), functions());
    let module = estimate_module();
    let mut context = context_with(
        &catalog,
        &functions,
        &[("width", 4.0), ("height", 2.0), ("divisor", 0.0)],
    );

    let outputs = evaluate_computed_outputs(&module, &mut context);
    assert_eq!(outputs.error("share").map(FormulaError::kind), Some(ErrorKind::Evaluation));
    assert_eq!(
        outputs.error("out.doubled_share").map(FormulaError::kind),
        Some(ErrorKind::UnknownVariable)
    );
    assert_eq!(outputs.value("total"), Some(40.0));
    assert!(context.binding("out.share").is_none());
    assert_eq!(outputs.error_kinds().len(), 2);
}
