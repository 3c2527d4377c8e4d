use clap::Parser;
use costwright::ast::DisplayExpression;
use costwright::compiler;
use costwright::prelude::*;
use std::time::Instant;

/// Prices every module instance of a workspace bundle
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workspace bundle JSON file
    bundle_path: Option<String>,

    /// Optional path to an engine configuration TOML file
    #[arg(short, long)]
    config: Option<String>,

    /// Print the cost breakdown and field summary of every instance
    #[arg(short, long)]
    explain: bool,

    /// Validate every module definition instead of pricing the workspace
    #[arg(long)]
    validate: bool,

    /// Print the optimized AST of a single formula and exit
    #[arg(long, value_name = "FORMULA")]
    ast: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => EngineConfig::default(),
    };
    costwright::logging::init(&config.log_filter);

    if let Some(formula) = &cli.ast {
        print_ast(formula, config.fold_constants);
        return;
    }

    let bundle_path = cli
        .bundle_path
        .clone()
        .unwrap_or_else(|| exit_with_error("A bundle path is required."));
    run(&cli, &bundle_path, config);
}

fn run(cli: &Cli, bundle_path: &str, config: EngineConfig) {
    let total_start = Instant::now();

    // --- 1. Loading ---
    let load_start = Instant::now();
    let precision = config.display_precision;
    let bundle = WorkspaceBundle::from_file(bundle_path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load bundle: {}", e)));
    let (engine, library, mut workspace) = bundle
        .into_engine(config)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid bundle: {}", e)));
    let load_duration = load_start.elapsed();

    if cli.validate {
        validate_all(&engine, &library);
        return;
    }

    // --- 2. Recalculation ---
    let eval_start = Instant::now();
    let report = engine.recalculate(&mut workspace, &library);
    let eval_duration = eval_start.elapsed();

    // --- 3. Results ---
    println!("\n--- Instances ---");
    for instance in &report.instances {
        println!(
            "{} [{}]: {}",
            instance.instance_id,
            instance.module_id,
            instance.display_cost(precision)
        );
        for (name, result) in instance.outputs.iter() {
            match result {
                Ok(value) => println!("    out.{} = {}", name, value),
                Err(e) => println!("    out.{} failed: {}", name, e),
            }
        }
        if cli.explain {
            print_explanation(instance);
        }
    }

    println!("\n--- Summary ---");
    println!("Instances:        {}", report.instances.len());
    println!("Not calculable:   {}", report.failed);
    println!("Total:            {:.*}", precision as usize, report.total);

    println!("\n--- Performance Summary ---");
    println!("Bundle Loading:   {:?}", load_duration);
    println!("Recalculation:    {:?}", eval_duration);
    println!("Cached Formulas:  {}", engine.cache().len());
    println!("Total Execution:  {:?}", total_start.elapsed());
}

fn print_explanation(instance: &InstanceReport) {
    if let Some(breakdown) = &instance.breakdown {
        println!("    = {}", breakdown);
    }
    for entry in &instance.field_summary {
        let unit = entry.unit.as_deref().unwrap_or("");
        let marker = match (entry.linked, entry.broken) {
            (_, true) => " (broken link)",
            (true, false) => " (linked)",
            _ => "",
        };
        println!(
            "    {} = {} {}{}",
            entry.label, entry.display_value, unit, marker
        );
    }
}

fn validate_all(engine: &Engine, library: &ModuleLibrary) {
    let mut failures = 0;
    for module in library.iter() {
        let validation = engine.validate_module(module);
        if validation.is_valid() {
            println!("{}: ok", module.id);
            continue;
        }
        for (formula, error) in validation.errors() {
            failures += 1;
            println!("{} [{}]: {}", module.id, formula, error);
            if let FormulaError::UnknownVariable { suggestions, .. } = error {
                if !suggestions.is_empty() {
                    println!("    did you mean: {}", suggestions.join(", "));
                }
            }
        }
    }
    if failures > 0 {
        exit_with_error(&format!("{} formula(s) failed validation", failures));
    }
}

fn print_ast(formula: &str, fold_constants: bool) {
    match compiler::compile(formula, fold_constants) {
        Ok(ast) => {
            println!("{}", ast);
            print!("{}", DisplayExpression { expr: &ast });
        }
        Err(e) => exit_with_error(&e.to_string()),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
