//! Tests for static formula analysis, validation and suggestions.
mod common;
use common::*;
use costwright::analyzer::{self, PropertyRef, Reference, VariableScope};
use costwright::catalog::CatalogKind;
use costwright::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_analyze_classifies_every_identifier() {
    let (catalog, functions) = (catalog(), functions());
    let module = wall_module();
    let scope = VariableScope::for_module(&module, &catalog, &functions);

    let analysis = analyzer::analyze(
        "with_waste(area * lumber.price, 5) + sqrt(width) * pine.weight + out.area + pi + mystery",
        &scope,
    );

    assert_eq!(analysis.user_functions, vec!["with_waste"]);
    assert_eq!(analysis.math_functions, vec!["sqrt"]);
    assert_eq!(
        analysis.field_property_refs,
        vec![PropertyRef {
            target: "lumber".to_string(),
            property: "price".to_string(),
        }]
    );
    assert_eq!(
        analysis.material_property_refs,
        vec![PropertyRef {
            target: "pine".to_string(),
            property: "weight".to_string(),
        }]
    );
    assert_eq!(analysis.computed_output_refs, vec!["area", "out.area"]);
    assert_eq!(analysis.unknown_variables, vec!["mystery"]);
    assert!(!analysis.is_resolved());
}

#[test]
fn test_analyze_tolerates_unparseable_text() {
    let (catalog, functions) = (catalog(), functions());
    let module = wall_module();
    let scope = VariableScope::for_module(&module, &catalog, &functions);

    let analysis = analyzer::analyze("width * (height +", &scope);
    assert_eq!(analysis.variables, vec!["width", "height"]);
    assert!(analysis.is_resolved());
}

#[test]
fn test_field_properties_respect_the_category_restriction() {
    let (catalog, functions) = (catalog(), functions());
    let module = wall_module();
    let scope = VariableScope::for_module(&module, &catalog, &functions);

    // `coverage` exists only on paint items; `lumber` is restricted to lumber.
    assert_eq!(
        scope.classify_variable("lumber.weight"),
        Reference::FieldProperty { kind: CatalogKind::Material }
    );
    assert_eq!(scope.classify_variable("lumber.coverage"), Reference::Unknown);
    assert_eq!(scope.classify_variable("width.price"), Reference::Unknown);
    assert_eq!(scope.classify_variable("lumber"), Reference::Field);
}

#[test]
fn test_typo_reports_suggestions() {
    let engine = engine();
    let module = wall_module();
    let scope = engine.scope_for(&module);

    let error = engine.validate_formula("widht * 2", &scope).unwrap_err();
    let FormulaError::UnknownVariable { name, suggestions } = error else {
        panic!("expected UnknownVariable");
    };
    assert_eq!(name, "widht");
    assert_eq!(suggestions.first().map(String::as_str), Some("width"));
    assert!(suggestions.len() <= 30);
}

#[test]
fn test_suggestions_are_capped() {
    let (catalog, functions) = (catalog(), functions());
    let module = wall_module();
    let scope = VariableScope::for_module(&module, &catalog, &functions);

    let all = scope.candidates();
    assert!(all.contains(&"lumber.weight".to_string()));
    assert!(all.contains(&"carpenter.rate".to_string()));
    assert!(all.contains(&"out.area".to_string()));
    assert!(all.len() > 3);

    assert_eq!(scope.suggestions("", 3).len(), 3);
    assert_eq!(scope.suggestions("lumber.", 30)[0], "lumber.price");
}

#[test]
fn test_validate_formula_checks_syntax_and_arity() {
    let engine = engine();
    let module = wall_module();
    let scope = engine.scope_for(&module);

    assert!(engine.validate_formula("area * lumber + with_waste(width, 5)", &scope).is_ok());
    assert_eq!(
        engine.validate_formula("width *", &scope).unwrap_err().kind(),
        ErrorKind::Syntax
    );
    assert_eq!(
        engine.validate_formula("round(width, 1, 2)", &scope).unwrap_err().kind(),
        ErrorKind::Arity
    );
    assert_eq!(
        engine.validate_formula("with_waste(width)", &scope).unwrap_err().kind(),
        ErrorKind::Arity
    );
    assert_eq!(
        engine.validate_formula("sqaure(width)", &scope).unwrap_err().kind(),
        ErrorKind::UnknownVariable
    );
}

#[test]
fn test_outputs_may_only_reference_earlier_outputs() {
    let engine = engine();
    let module = ModuleDefinition::new("box", "out.volume")
        .with_field(Field::new("width", FieldType::Number))
        .with_output(ComputedOutput::new("area", "width * width"))
        .with_output(ComputedOutput::new("volume", "out.area * width"))
        .with_output(ComputedOutput::new("early", "out.late + 1"))
        .with_output(ComputedOutput::new("selfish", "selfish * 2"))
        .with_output(ComputedOutput::new("late", "area * 2"));

    let validation = engine.validate_module(&module);
    assert!(validation.formula.is_ok());
    let results: Vec<(&str, Option<ErrorKind>)> = validation
        .outputs
        .iter()
        .map(|(name, result)| (name.as_str(), result.as_ref().err().map(FormulaError::kind)))
        .collect();
    assert_eq!(
        results,
        vec![
            ("area", None),
            ("volume", None),
            ("early", Some(ErrorKind::ForwardReference)),
            ("selfish", Some(ErrorKind::ForwardReference)),
            ("late", None),
        ]
    );
    assert!(!validation.is_valid());
    assert_eq!(validation.errors().len(), 2);
}

#[test]
fn test_scope_with_extra_variables() {
    let (catalog, functions) = (catalog(), functions());
    let scope = VariableScope::new(&catalog, &functions).with_variable("amount");
    assert!(analyzer::validate_formula("amount * 2 + e", &scope, 30).is_ok());
    assert!(analyzer::validate_formula("amount * rate", &scope, 30).is_err());
}
