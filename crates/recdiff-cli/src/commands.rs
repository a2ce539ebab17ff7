use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;

use recdiff_catalog::{load_json_catalog, LoadOptions, RecordCatalog, Row};
use recdiff_diff::{digest, DiffConfig, DiffEngine, FieldPlan, ShapeChangePolicy};
use recdiff_report::{Render, Report};
use recdiff_types::{DiffOperation, DiffReport};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Diff(args) => cmd_diff(args, &format),
        Command::Plan(args) => cmd_plan(args, &format),
        Command::Digest(args) => cmd_digest(args, &format),
    }
}

fn load_options(args: &LoadArgs) -> LoadOptions {
    LoadOptions {
        key_field: args.key_field.clone(),
        kind_hints: args.kinds.iter().cloned().collect(),
    }
}

fn load(path: &Path, options: &LoadOptions) -> anyhow::Result<RecordCatalog<Row>> {
    load_json_catalog(path, options).with_context(|| format!("failed to load {}", path.display()))
}

fn diff_config(args: &DiffArgs) -> anyhow::Result<DiffConfig> {
    let mut config = match &args.config {
        Some(path) => DiffConfig::load(path)?,
        None => DiffConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.array_strategy = strategy.into();
    }
    if let Some(generator) = args.generator {
        config.generator = generator.into();
    }
    if args.no_shortcut {
        config.digest_shortcut = false;
    }
    if args.reject_shape_changes {
        config.shape_change = ShapeChangePolicy::Reject;
    }
    if let Some(policy) = args.on_error {
        config.error_policy = policy.into();
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    Ok(config)
}

fn cmd_diff(args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config = diff_config(&args)?;
    let options = load_options(&args.load);
    let previous = load(&args.previous, &options)?;
    let current = load(&args.current, &options)?;

    let report = DiffEngine::new(config).diff(&previous, &current)?;
    let shaped = Report::build(args.shape.into(), &previous, &current, &report)?;

    if let Some(output) = &args.output {
        shaped.save(output, args.pretty)?;
        if matches!(format, OutputFormat::Text) {
            println!(
                "{} Wrote {} report to {}",
                "✓".green().bold(),
                shaped.shape(),
                output.display().to_string().bold()
            );
            print_totals(&report);
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", shaped.to_json_string(args.pretty)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &DiffReport) {
    for key in &report.added_keys {
        println!("{} {}", "+".green().bold(), key.to_string().green());
    }
    for key in &report.removed_keys {
        println!("{} {}", "-".red().bold(), key.to_string().red());
    }
    for (key, entries) in &report.changed_records {
        println!("{} {}", "~".yellow().bold(), key.to_string().yellow());
        for entry in entries {
            let op = match entry.operation {
                DiffOperation::Add => "add".green(),
                DiffOperation::Remove => "remove".red(),
                DiffOperation::Replace => "replace".yellow(),
            };
            let mut line = format!("    {op:<7} {}", entry.property.bold());
            if let Some(previous) = &entry.previous_value {
                line.push_str(&format!(" {}", previous.to_string().dimmed()));
            }
            if let Some(current) = &entry.current_value {
                let arrow = if entry.previous_value.is_some() { " → " } else { " " };
                line.push_str(&format!("{arrow}{current}"));
            }
            println!("{line}");
        }
    }
    for failure in &report.failures {
        println!("{} {} {}", "!".red().bold(), failure.key.to_string().red(), failure.reason.dimmed());
    }
    print_totals(report);
}

fn print_totals(report: &DiffReport) {
    if report.is_empty() {
        println!("No differences.");
        return;
    }
    println!(
        "{} added, {} removed, {} changed ({} entries){}",
        report.added_keys.len().to_string().green(),
        report.removed_keys.len().to_string().red(),
        report.changed_count().to_string().yellow(),
        report.entry_count(),
        if report.failures.is_empty() {
            String::new()
        } else {
            format!(", {} skipped", report.failures.len().to_string().red())
        }
    );
}

fn cmd_plan(args: PlanArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let options = load_options(&args.load);
    let previous = load(&args.previous, &options)?;
    let current = load(&args.current, &options)?;
    let plan = FieldPlan::build(previous.schema(), current.schema());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => {
            for name in &plan.common {
                let kind = current.schema().kind(name).map(|k| k.to_string()).unwrap_or_default();
                println!("  {} {}", name, kind.dimmed());
            }
            for name in &plan.added {
                println!("{} {}", "+".green().bold(), name.green());
            }
            for name in &plan.removed {
                println!("{} {}", "-".red().bold(), name.red());
            }
            println!(
                "{} fields: {} common, {} added, {} removed",
                plan.count(),
                plan.common.len(),
                plan.added.len(),
                plan.removed.len()
            );
        }
    }
    Ok(())
}

fn cmd_digest(args: DigestArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let catalog = load(&args.file, &load_options(&args.load))?;
    let mut digests = BTreeMap::new();
    for (key, record) in catalog.iter() {
        let value = digest(&catalog, record).with_context(|| format!("failed to digest record {key}"))?;
        digests.insert(key, format!("{value:016x}"));
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&digests)?),
        OutputFormat::Text => {
            for (key, hex) in &digests {
                println!("{}\t{}", key.to_string().yellow(), hex);
            }
        }
    }
    Ok(())
}
