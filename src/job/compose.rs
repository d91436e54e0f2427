// src/job/compose.rs

//! Higher-order jobs built from other jobs.

use std::collections::HashSet;

use tracing::debug;

use crate::errors::{Result, SdmflowError};
use crate::job::model::{Invocation, Job, dedup};
use crate::job::steps::Toolbox;

/// Sequential composition of `jobs` into one logical job.
///
/// - outputs: union of the children's outputs
/// - inputs: union of the children's inputs minus anything produced inside
///   the chain
/// - command: children's commands in order, joined by `" ; "`
///
/// Required inputs that an earlier step produces are dropped too: they
/// cannot exist yet when the graph is assembled.
pub fn chain(jobs: Vec<Job>) -> Result<Job> {
    if jobs.is_empty() {
        return Err(SdmflowError::EmptyChain);
    }

    let outputs: Vec<String> = dedup(
        jobs.iter()
            .flat_map(|j| j.outputs().iter().cloned())
            .collect(),
    );
    let produced: HashSet<&str> = outputs.iter().map(String::as_str).collect();

    let inputs: Vec<String> = jobs
        .iter()
        .flat_map(|j| j.inputs().iter())
        .filter(|i| !produced.contains(i.as_str()))
        .cloned()
        .collect();

    let required: Vec<String> = jobs
        .iter()
        .flat_map(|j| j.required_inputs().iter())
        .filter(|r| !produced.contains(r.as_str()))
        .cloned()
        .collect();

    debug!(
        steps = jobs.len(),
        outputs = outputs.len(),
        external_inputs = inputs.len(),
        "chained jobs"
    );

    let steps = jobs.iter().map(|j| j.invocation().clone()).collect();
    Ok(Job::from_parts(
        Invocation::Sequence(steps),
        inputs,
        outputs,
        required,
    ))
}

/// Wrap `inner` so every declared output exists once it has run.
///
/// After `inner`, the toolbox `touch` step creates any output that is still
/// missing as an empty marker. Content is not checked here; that is the
/// stockpile step's job. Because the touch step runs last, the engine sees
/// the wrapped rule succeed even when `inner` fails.
pub fn wrap(inner: Job, required_inputs: Vec<String>, toolbox: &Toolbox) -> Job {
    let touch = toolbox.touch(inner.outputs().iter().cloned());

    let mut required = inner.required_inputs().to_vec();
    required.extend(required_inputs);

    let comment = inner.comment().map(str::to_string);
    let job = Job::from_parts(
        Invocation::Sequence(vec![inner.invocation().clone(), touch.invocation().clone()]),
        inner.inputs().to_vec(),
        inner.outputs().to_vec(),
        required,
    );

    match comment {
        Some(c) => job.with_comment(c),
        None => job,
    }
}
