use clap::Parser;
use costwright::ast::FieldValue;
use costwright::catalog::{CatalogItem, Property, SharedFunction};
use costwright::data::WorkspaceBundle;
use costwright::definition::{
    ComputedOutput, Field, FieldLink, FieldType, ModuleDefinition, ModuleInstance, Workspace,
};
use rand::{Rng, rngs::ThreadRng};
use std::fs;

/// A CLI tool to generate workspace bundles for the costwright engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_bundle.json")]
    output: String,

    /// The number of module instances to place into the workspace
    #[arg(long, default_value_t = 20)]
    instances: usize,

    /// Probability that a wall's height is linked to an earlier wall
    #[arg(long, default_value_t = 0.3)]
    link_ratio: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if !(0.0..=1.0).contains(&cli.link_ratio) {
        eprintln!("Error: --link-ratio ({}) must lie in 0..=1", cli.link_ratio);
        std::process::exit(1);
    }

    println!(
        "Generating a workspace bundle with {} instance(s)...",
        cli.instances
    );

    let (materials, labor) = generate_catalog(&mut rng)?;
    let workspace = generate_workspace(&mut rng, &materials, cli.instances, cli.link_ratio);

    let bundle = WorkspaceBundle {
        materials,
        labor,
        functions: vec![SharedFunction::new(
            "with_waste",
            &["amount", "percent"],
            "amount * (1 + percent / 100)",
        )],
        modules: module_definitions(),
        workspace,
    };

    fs::write(&cli.output, bundle.to_json()?)?;
    println!("Successfully generated and saved bundle to '{}'", cli.output);

    Ok(())
}

fn generate_catalog(
    rng: &mut ThreadRng,
) -> Result<(Vec<CatalogItem>, Vec<CatalogItem>), Box<dyn std::error::Error>> {
    let mut materials = Vec::new();
    for (i, name) in ["Pine 2x4", "Spruce 2x6", "Oak board"].iter().enumerate() {
        materials.push(
            CatalogItem::new(&format!("lumber-{}", i), name, rng.random_range(3.0..12.0))
                .with_category("lumber"),
        );
    }
    for (i, name) in ["Interior white", "Exterior grey"].iter().enumerate() {
        materials.push(
            CatalogItem::new(&format!("paint-{}", i), name, rng.random_range(20.0..60.0))
                .with_category("paint")
                .with_property(Property::number(
                    "coverage",
                    rng.random_range(8.0..14.0),
                    Some("m2"),
                )?),
        );
    }
    let labor = vec![
        CatalogItem::new("carpenter", "Carpenter", rng.random_range(35.0..70.0))
            .with_variable("carpenter"),
    ];
    println!(
        "-> Generated {} material(s) and {} labor item(s).",
        materials.len(),
        labor.len()
    );
    Ok((materials, labor))
}

fn module_definitions() -> Vec<ModuleDefinition> {
    let wall = ModuleDefinition::new("wall", "with_waste(area * lumber, waste) + hours * carpenter.rate")
        .with_field(Field::new("width", FieldType::Number).with_unit("m").required())
        .with_field(Field::new("height", FieldType::Number).with_unit("m").required())
        .with_field(Field::new("waste", FieldType::Number).with_default(FieldValue::Number(10.0)))
        .with_field(Field::new("hours", FieldType::Number))
        .with_field(Field::new("lumber", FieldType::Material).with_category("lumber"))
        .with_output(ComputedOutput::new("area", "width * height").with_unit("m2"));

    let paint = ModuleDefinition::new("paint", "ceil(area / paint.coverage) * paint")
        .with_field(Field::new("area", FieldType::Number).with_unit("m2").required())
        .with_field(Field::new("paint", FieldType::Material).with_category("paint"));

    vec![wall, paint]
}

/// Alternates walls and paint jobs; each paint job reads its area from the
/// wall before it.
fn generate_workspace(
    rng: &mut ThreadRng,
    materials: &[CatalogItem],
    count: usize,
    link_ratio: f64,
) -> Workspace {
    let lumber: Vec<&CatalogItem> = materials
        .iter()
        .filter(|m| m.category.as_deref() == Some("lumber"))
        .collect();
    let paint: Vec<&CatalogItem> = materials
        .iter()
        .filter(|m| m.category.as_deref() == Some("paint"))
        .collect();

    let mut workspace = Workspace::default();
    let mut last_wall: Option<String> = None;
    for i in 0..count {
        let id = format!("instance-{}", i);
        let instance = match &last_wall {
            Some(wall) if i % 2 == 1 => {
                let pick = paint[rng.random_range(0..paint.len())];
                ModuleInstance::new(&id, "paint")
                    .with_value("paint", FieldValue::CatalogRef(pick.id.clone()))
                    .with_link("area", FieldLink::new(wall, "out.area"))
            }
            _ => {
                let pick = lumber[rng.random_range(0..lumber.len())];
                let mut instance = ModuleInstance::new(&id, "wall")
                    .with_value("width", FieldValue::Number(rng.random_range(1.0..8.0)))
                    .with_value("height", FieldValue::Number(rng.random_range(2.0..3.5)))
                    .with_value("hours", FieldValue::Number(rng.random_range(0.0..16.0)))
                    .with_value("lumber", FieldValue::CatalogRef(pick.id.clone()));
                if let Some(previous) = &last_wall {
                    if rng.random_bool(link_ratio) {
                        instance = instance.with_link("height", FieldLink::new(previous, "height"));
                    }
                }
                last_wall = Some(id.clone());
                instance
            }
        };
        workspace.add_instance(instance);
    }
    println!("-> Generated {} instance(s).", workspace.instances.len());
    workspace
}
