//! Unit tests for error messages, trace formatting and configuration.
mod common;
use costwright::error::{Arity, BrokenLinkReason, LinkRejection};
use costwright::prelude::*;

#[test]
fn test_error_display() {
    let arity = FormulaError::Arity {
        function: "round".to_string(),
        expected: Arity::Range(1, 2),
        found: 3,
    };
    assert_eq!(
        arity.to_string(),
        "Function 'round' expects 1 to 2 argument(s), but received 3"
    );

    let broken = FormulaError::BrokenLink {
        field: "width".to_string(),
        reason: BrokenLinkReason::TargetInstanceMissing {
            instance_id: "b".to_string(),
        },
    };
    assert_eq!(
        broken.to_string(),
        "Field 'width' is linked, but the link is broken: instance 'b' is no longer in the workspace"
    );

    let rejected = FormulaError::IncompatibleLink(LinkRejection::SelfLink);
    assert_eq!(rejected.to_string(), "Link rejected: a field cannot link to itself");
}

#[test]
fn test_error_kinds_split_validation_from_evaluation() {
    for kind in [
        ErrorKind::Syntax,
        ErrorKind::UnknownVariable,
        ErrorKind::Arity,
        ErrorKind::IncompatibleLink,
        ErrorKind::ForwardReference,
    ] {
        assert!(kind.is_validation(), "{}", kind);
    }
    for kind in [
        ErrorKind::Evaluation,
        ErrorKind::MissingRequiredInput,
        ErrorKind::MissingCatalogSelection,
        ErrorKind::BrokenLink,
        ErrorKind::MissingModule,
    ] {
        assert!(!kind.is_validation(), "{}", kind);
    }
    assert_eq!(ErrorKind::Arity.to_string(), "ArityError");
}

#[test]
fn test_trace_formatter_parenthesizes_only_when_needed() {
    let input = |name: &str, value: f64| EvaluationTrace::Input {
        source: name.to_string(),
        value,
    };
    // a - (b - c)
    let trace = EvaluationTrace::BinaryOp {
        op_symbol: "-",
        left: Box::new(input("a", 10.0)),
        right: Box::new(EvaluationTrace::BinaryOp {
            op_symbol: "-",
            left: Box::new(input("b", 4.0)),
            right: Box::new(input("c", 1.0)),
            outcome: 3.0,
        }),
        outcome: 7.0,
    };
    assert_eq!(
        TraceFormatter::format_trace(&trace),
        "a (was 10) - (b (was 4) - c (was 1))"
    );

    let call = EvaluationTrace::Call {
        function: "sqrt".to_string(),
        args: vec![input("area", 2.0)],
        outcome: std::f64::consts::SQRT_2,
    };
    assert_eq!(
        TraceFormatter::format_trace_with_precision(&call, 2),
        "sqrt(area (was 2)) (was 1.41)"
    );
}

#[test]
fn test_config_from_toml() {
    let config = EngineConfig::from_toml_str(
        r#"
        max_suggestions = 10
        display_precision = 3
        log_filter = "costwright=trace"
        "#,
    )
    .unwrap();
    assert_eq!(config.max_suggestions, 10);
    assert_eq!(config.display_precision, 3);
    assert_eq!(config.log_filter, "costwright=trace");
    assert!(config.fold_constants);

    assert!(EngineConfig::from_file("/definitely/not/here.toml").is_err());
}

#[test]
fn test_config_limits_suggestions() {
    let config = EngineConfig {
        max_suggestions: 1,
        ..EngineConfig::default()
    };
    let engine = Engine::builder(common::catalog(), common::functions())
        .with_config(config)
        .build();
    let module = common::wall_module();
    let scope = engine.scope_for(&module);
    let Err(FormulaError::UnknownVariable { suggestions, .. }) = engine.validate_formula("w", &scope) else {
        panic!("expected UnknownVariable");
    };
    assert_eq!(suggestions, vec!["width"]);
}

#[test]
fn test_field_value_coercion() {
    let raw = FieldValue::Text("pine".to_string());
    assert_eq!(
        raw.coerce(FieldType::Material),
        Some(FieldValue::CatalogRef("pine".to_string()))
    );
    assert_eq!(FieldValue::Text("  ".to_string()).coerce(FieldType::Labor), None);
    assert_eq!(
        FieldValue::Text(" 2.5 ".to_string()).coerce(FieldType::Number),
        Some(FieldValue::Number(2.5))
    );
    assert_eq!(
        FieldValue::Number(0.0).coerce(FieldType::Boolean),
        Some(FieldValue::Boolean(false))
    );
    assert_eq!(FieldValue::Number(3.0).to_string(), "3");
    assert_eq!(FieldValue::CatalogRef("oak".to_string()).to_string(), "#oak");
}

#[test]
fn test_module_definition_validation() {
    use costwright::error::{DefinitionError, UnitError};

    let bad_name =
        ModuleDefinition::new("m", "1").with_field(Field::new("2wide", FieldType::Number));
    assert!(matches!(
        bad_name.validate(),
        Err(DefinitionError::InvalidVariableName { .. })
    ));

    let clash = ModuleDefinition::new("m", "1")
        .with_field(Field::new("area", FieldType::Number))
        .with_output(ComputedOutput::new("area", "1"));
    assert!(matches!(
        clash.validate(),
        Err(DefinitionError::DuplicateVariableName { .. })
    ));

    let bad_unit = ModuleDefinition::new("m", "1")
        .with_field(Field::new("width", FieldType::Number).with_unit("furlong"));
    assert!(matches!(
        bad_unit.validate(),
        Err(DefinitionError::Unit {
            source: UnitError::UnknownUnit(_),
            ..
        })
    ));
    assert!(ModuleLibrary::new(vec![bad_unit]).is_err());
}

#[test]
fn test_registry_and_catalog_reject_duplicates() {
    use costwright::error::DefinitionError;

    let shadowing = FunctionRegistry::new(vec![SharedFunction::new("round", &["x"], "x")]);
    assert!(matches!(shadowing, Err(DefinitionError::DuplicateFunction(name)) if name == "round"));

    let repeated = FunctionRegistry::new(vec![SharedFunction::new("f", &["x", "x"], "x")]);
    assert!(matches!(repeated, Err(DefinitionError::InvalidParameter { .. })));

    let twice = Catalog::new(
        vec![
            CatalogItem::new("pine", "Pine", 1.0),
            CatalogItem::new("pine", "Pine again", 2.0),
        ],
        Vec::new(),
    );
    assert!(matches!(twice, Err(DefinitionError::DuplicateCatalogItem(id)) if id == "pine"));

    let mut length = Property::number("length", 240.0, Some("cm")).unwrap();
    assert!((length.stored_value.unwrap() - 2.4).abs() < 1e-12);
    length.set_unit(Some("m")).unwrap();
    assert!((length.stored_value.unwrap() - 240.0).abs() < 1e-9);
    length.set_value(FieldValue::Number(3.0)).unwrap();
    assert_eq!(length.numeric_value(), Some(3.0));
    assert!(length.set_unit(Some("furlong")).is_err());
}
