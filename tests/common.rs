//! Common test fixtures: a small catalog, shared functions and module
//! definitions for walls and paint jobs.
use costwright::prelude::*;

/// Materials: `pine` (lumber, 10/unit, 2.5 kg), `oak` (lumber, 25/unit),
/// `white` (paint, 30/can, covers 10 m2). Labor: `carpenter` at 50/h,
/// addressable as `carpenter.rate`.
#[allow(dead_code)]
pub fn catalog() -> Catalog {
    let materials = vec![
        CatalogItem::new("pine", "Pine 2x4", 10.0)
            .with_category("lumber")
            .with_variable("pine")
            .with_property(Property::number("weight", 2.5, Some("kg")).unwrap()),
        CatalogItem::new("oak", "Oak board", 25.0).with_category("lumber"),
        CatalogItem::new("white", "Interior white", 30.0)
            .with_category("paint")
            .with_property(Property::number("coverage", 10.0, Some("m2")).unwrap()),
    ];
    let labor = vec![CatalogItem::new("carpenter", "Carpenter", 50.0).with_variable("carpenter")];
    Catalog::new(materials, labor).unwrap()
}

/// `with_waste(amount, percent) = amount * (1 + percent / 100)`
#[allow(dead_code)]
pub fn functions() -> FunctionRegistry {
    FunctionRegistry::new(vec![SharedFunction::new(
        "with_waste",
        &["amount", "percent"],
        "amount * (1 + percent / 100)",
    )])
    .unwrap()
}

#[allow(dead_code)]
pub fn engine() -> Engine {
    Engine::builder(catalog(), functions()).build()
}

/// `area = width * height`, cost `area * lumber`.
#[allow(dead_code)]
pub fn wall_module() -> ModuleDefinition {
    ModuleDefinition::new("wall", "area * lumber")
        .with_field(Field::new("width", FieldType::Number).with_unit("m").required())
        .with_field(Field::new("height", FieldType::Number).with_unit("m").required())
        .with_field(Field::new("lumber", FieldType::Material).with_category("lumber"))
        .with_output(ComputedOutput::new("area", "width * height").with_unit("m2"))
}

/// Whole cans of paint for `area`: `ceil(area / paint.coverage) * paint`.
#[allow(dead_code)]
pub fn paint_module() -> ModuleDefinition {
    ModuleDefinition::new("paint", "ceil(area / paint.coverage) * paint")
        .with_field(Field::new("area", FieldType::Number).with_unit("m2").required())
        .with_field(Field::new("paint", FieldType::Material).with_category("paint"))
}

#[allow(dead_code)]
pub fn library() -> ModuleLibrary {
    ModuleLibrary::new(vec![wall_module(), paint_module()]).unwrap()
}

/// A wall instance with its dimensions in meters and a catalog selection.
#[allow(dead_code)]
pub fn wall(id: &str, width: f64, height: f64, lumber: &str) -> ModuleInstance {
    ModuleInstance::new(id, "wall")
        .with_value("width", FieldValue::Number(width))
        .with_value("height", FieldValue::Number(height))
        .with_value("lumber", FieldValue::CatalogRef(lumber.to_string()))
}

/// A paint job whose area is linked to another instance's `out.area`.
#[allow(dead_code)]
pub fn paint_for(id: &str, wall_id: &str) -> ModuleInstance {
    ModuleInstance::new(id, "paint")
        .with_value("paint", FieldValue::CatalogRef("white".to_string()))
        .with_link("area", FieldLink::new(wall_id, "out.area"))
}

#[allow(dead_code)]
pub fn context_with<'a>(
    catalog: &'a Catalog,
    functions: &'a FunctionRegistry,
    numbers: &[(&str, f64)],
) -> EvaluationContext<'a> {
    let mut context = EvaluationContext::new(catalog, functions);
    for (name, value) in numbers {
        context.bind_number(name, *value);
    }
    context
}
