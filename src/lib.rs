// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod fs;
pub mod job;
pub mod logging;
pub mod stockpile;
pub mod tools;
pub mod workflow;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::dag::{GraphBuilder, RuleGraph};
use crate::fs::{FileSystem, RealFileSystem};
use crate::stockpile::{FileRegistry, Status, Stockpile, StockpileRequest};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match args.command {
        Command::Build {
            config,
            output,
            dry_run,
        } => run_build(&config, output, dry_run, fs),
        Command::Stockpile {
            kind,
            object_id,
            registry,
            status,
            status_file,
            success_file,
            outputs,
        } => {
            let mut request = StockpileRequest::new(kind, object_id, outputs);
            request.status = status.map(Status::from_code);
            request.status_file = status_file;

            let stockpile =
                Stockpile::new(Arc::new(FileRegistry::new(registry))).with_filesystem(fs);
            let report = stockpile
                .test_and_stash(&request, Some(success_file.as_path()))
                .await?;
            for note in report.diagnostics.iter() {
                info!(object_id, "{note}");
            }
            Ok(())
        }
        Command::StockpileBatch {
            registry,
            manifest,
            success_file,
        } => {
            let stockpile = Stockpile::new(Arc::new(FileRegistry::new(registry)))
                .with_filesystem(fs.clone());
            let batch =
                crate::stockpile::batch::run_manifest(&stockpile, fs.as_ref(), &manifest, &success_file)
                    .await?;
            if !batch.all_committed() {
                anyhow::bail!(
                    "{} of {} objects could not be committed",
                    batch.failures.len(),
                    batch.failures.len() + batch.reports.len()
                );
            }
            Ok(())
        }
        Command::Touch { paths } => {
            tools::touch_missing(fs.as_ref(), &paths)?;
            Ok(())
        }
        Command::Triage { input, output } => {
            tools::triage(fs.as_ref(), &input, &output)?;
            Ok(())
        }
    }
}

fn run_build(
    config_path: &Path,
    output: Option<PathBuf>,
    dry_run: bool,
    fs: Arc<dyn FileSystem>,
) -> Result<()> {
    let cfg = load_and_validate(config_path)?;
    let root_dir = config_root_dir(config_path);

    let builder = workflow::build_graph(&cfg, fs, Some(root_dir.clone()))?;

    // Refuse to hand the engine a document it cannot schedule.
    let graph = RuleGraph::from_rules(builder.rules());
    let order = graph.execution_order()?;

    if dry_run {
        print_dry_run(&builder, &graph, &order)?;
        return Ok(());
    }

    let path = output.unwrap_or_else(|| workflow::document_path(&cfg, &root_dir));
    builder.write_to(&path)?;

    for target in builder.sorted_targets() {
        println!("{target}");
    }
    Ok(())
}

/// Directory the config's relative paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "runs/Sdmflow.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Sdmflow.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the document, then one execution order and the external inputs.
fn print_dry_run(builder: &GraphBuilder, graph: &RuleGraph<'_>, order: &[usize]) -> Result<()> {
    let document = String::from_utf8(builder.serialize()?)?;
    println!("{document}");

    println!("# execution order ({} rules):", order.len());
    for (pos, idx) in order.iter().enumerate() {
        if let Some(rule) = graph.rule(*idx) {
            println!("#   {:>3}. {}", pos + 1, rule.label());
        }
    }

    let external = graph.external_inputs();
    if !external.is_empty() {
        println!("# external inputs:");
        for input in external {
            println!("#   {input}");
        }
    }

    debug!("dry-run complete (no document written)");
    Ok(())
}
