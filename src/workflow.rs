// src/workflow.rs

//! Turn a validated workflow configuration into jobs and a graph builder.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::model::{ConfigFile, StepConfig};
use crate::dag::{BuildOptions, GraphBuilder};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::job::{Job, Toolbox, chain, wrap};
use crate::stockpile::{Status, StockpileRequest};

static MACRO_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("static regex")
});

/// A job derived from the config, with where it has to run.
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub name: String,
    pub job: Job,
    pub local: bool,
}

/// Jobs in document order: standalone steps, then chains, then stockpiles,
/// then batch stockpiles. Each group keeps the order of the config file.
///
/// Steps consumed by a chain are only emitted as part of that chain. A
/// wrapped step stays wrapped inside its chain.
pub fn plan_jobs(cfg: &ConfigFile) -> Result<Vec<PlannedJob>> {
    let toolbox = Toolbox::new(cfg.workflow.tool.clone());
    let mut planned = Vec::new();

    for (name, step) in cfg.step.iter() {
        if let Some(chain_name) = cfg.chain_of(name) {
            debug!(step = %name, chain = %chain_name, "step emitted as part of chain");
            continue;
        }
        planned.push(PlannedJob {
            name: name.clone(),
            job: step_job(name, step, &toolbox),
            local: step.local,
        });
    }

    for (name, chain_cfg) in cfg.chain.iter() {
        let steps: Vec<&StepConfig> = chain_cfg
            .steps
            .iter()
            .filter_map(|s| cfg.step.get(s))
            .collect();
        let jobs = chain_cfg
            .steps
            .iter()
            .zip(steps.iter())
            .map(|(s, step)| step_job(s, step, &toolbox))
            .collect();

        let mut job = chain(jobs)?;
        if chain_cfg.wrap {
            job = wrap(job, chain_cfg.required_inputs.clone(), &toolbox);
        } else {
            job = job.with_required_inputs(chain_cfg.required_inputs.iter().cloned());
        }
        let comment = chain_cfg
            .comment
            .clone()
            .unwrap_or_else(|| format!("Chain {name}"));

        planned.push(PlannedJob {
            name: name.clone(),
            job: job.with_comment(comment),
            local: chain_cfg.local || steps.iter().any(|s| s.local),
        });
    }

    for (name, sp) in cfg.stockpile.iter() {
        let mut request = StockpileRequest::new(sp.kind, sp.object_id, sp.outputs.iter().cloned());
        request.status = sp.status.map(Status::from_code);
        request.status_file = sp.status_file.clone();

        planned.push(PlannedJob {
            name: name.clone(),
            job: toolbox.stockpile(&request, &sp.success, &cfg.registry.path),
            local: true,
        });
    }

    for (name, batch) in cfg.batch.iter() {
        planned.push(PlannedJob {
            name: name.clone(),
            job: toolbox.stockpile_batch(&batch.manifest, &batch.success, &cfg.registry.path),
            local: true,
        });
    }

    Ok(planned)
}

fn step_job(name: &str, step: &StepConfig, toolbox: &Toolbox) -> Job {
    let comment = step.comment.clone().unwrap_or_else(|| name.to_string());
    let job = Job::new(
        step.cmd.iter().cloned(),
        step.inputs.iter().cloned(),
        step.outputs.iter().cloned(),
        step.required_inputs.iter().cloned(),
    )
    .with_comment(comment);

    if step.wrap {
        wrap(job, Vec::new(), toolbox)
    } else {
        job
    }
}

/// Build the graph for `cfg`. Relative required inputs are checked against
/// `base_dir`.
pub fn build_graph(
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    base_dir: Option<PathBuf>,
) -> Result<GraphBuilder> {
    let options = BuildOptions {
        base_dir,
        skip_absolute_dependencies: cfg.workflow.skip_absolute_dependencies,
    };
    let mut builder =
        GraphBuilder::with_filesystem(cfg.workflow.owner.clone(), fs).with_options(options);

    for (key, value) in cfg.headers.iter() {
        builder.add_header(key.clone(), value.clone())?;
    }

    let planned = plan_jobs(cfg)?;
    let total = planned.len();
    let mut added = 0usize;
    for p in planned.iter() {
        let was_added = if p.local {
            builder.add_local_job(&p.job)?
        } else {
            builder.add_job(&p.job)?
        };
        if was_added {
            added += 1;
        } else {
            debug!(job = %p.name, "job contributed no new targets");
        }
    }

    warn_on_undefined_macros(cfg, &planned);

    info!(
        owner = %builder.owner(),
        planned = total,
        rules = added,
        targets = builder.targets().len(),
        "assembled workflow graph"
    );
    Ok(builder)
}

/// `$NAME` references that no header defines are left to the engine's
/// environment. Worth a warning, never an error.
fn warn_on_undefined_macros(cfg: &ConfigFile, planned: &[PlannedJob]) {
    let mut undefined = BTreeSet::new();
    for p in planned {
        let command = p.job.command_line();
        for caps in MACRO_REF.captures_iter(&command) {
            let name = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
            if let Some(name) = name {
                if !cfg.headers.contains_key(name) {
                    undefined.insert(name.to_string());
                }
            }
        }
    }
    if !undefined.is_empty() {
        warn!(?undefined, "commands reference variables no header defines");
    }
}

/// Where the document goes: `[workflow].document` (relative to `config_dir`)
/// or `<config_dir>/<owner>.mf`.
pub fn document_path(cfg: &ConfigFile, config_dir: &Path) -> PathBuf {
    match cfg.workflow.document {
        Some(ref doc) => config_dir.join(doc),
        None => config_dir.join(format!("{}.mf", cfg.workflow.owner)),
    }
}
