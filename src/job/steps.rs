// src/job/steps.rs

//! Builder functions for the steps `sdmflow` itself provides.
//!
//! Each function returns a plain [`Job`]; the argv points back at the
//! `sdmflow` binary (or whatever `program` is configured) so the engine can
//! run the helper on a worker or on the controlling node.

use crate::job::model::Job;
use crate::stockpile::StockpileRequest;

/// The program generated helper steps invoke, threaded through explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolbox {
    program: String,
}

impl Default for Toolbox {
    fn default() -> Self {
        Self::new("sdmflow")
    }
}

impl Toolbox {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Create each path that does not exist yet as an empty file.
    pub fn touch<P>(&self, paths: P) -> Job
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        let mut argv = vec![self.program.clone(), "touch".to_string()];
        argv.extend(paths.iter().cloned());
        Job::new(argv, Vec::<String>::new(), paths, Vec::<String>::new())
    }

    /// Verify the request's outputs and commit the result to the registry.
    ///
    /// The only output is `success_file`, so downstream rules can sequence on
    /// the commit having happened.
    pub fn stockpile(
        &self,
        request: &StockpileRequest,
        success_file: &str,
        registry_dir: &str,
    ) -> Job {
        let mut argv = vec![
            self.program.clone(),
            "stockpile".to_string(),
            "--kind".to_string(),
            request.kind.to_string(),
            "--object-id".to_string(),
            request.object_id.to_string(),
            "--registry".to_string(),
            registry_dir.to_string(),
        ];
        if let Some(status) = request.status {
            argv.push("--status".to_string());
            argv.push(status.code().to_string());
        }

        let mut inputs = request.outputs.clone();
        if let Some(ref status_file) = request.status_file {
            argv.push("--status-file".to_string());
            argv.push(status_file.clone());
            inputs.push(status_file.clone());
        }

        argv.push(success_file.to_string());
        argv.extend(request.outputs.iter().cloned());

        Job::new(argv, inputs, [success_file], Vec::<String>::new()).with_comment(format!(
            "Stockpile {} {}",
            request.kind, request.object_id
        ))
    }

    /// Stockpile every entry of a JSON manifest in one step.
    pub fn stockpile_batch(&self, manifest: &str, success_file: &str, registry_dir: &str) -> Job {
        let argv = [
            self.program.as_str(),
            "stockpile-batch",
            "--registry",
            registry_dir,
            manifest,
            success_file,
        ];
        Job::new(argv, [manifest], [success_file], Vec::<String>::new())
            .with_comment(format!("Stockpile batch {manifest}"))
    }

    /// Keep only the candidate files listed in `input` that exist.
    pub fn triage(&self, input: &str, output: &str) -> Job {
        let argv = [self.program.as_str(), "triage", input, output];
        Job::new(argv, [input], [output], Vec::<String>::new())
            .with_comment(format!("Triage {input}"))
    }
}
