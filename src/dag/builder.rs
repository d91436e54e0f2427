// src/dag/builder.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::document::{is_valid_header_key, render_document};
use crate::errors::{Result, SdmflowError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::job::model::{Render, Rule};

/// Knobs for graph assembly.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Directory relative required inputs are resolved against when checking
    /// that they exist. `None` means the process working directory.
    pub base_dir: Option<PathBuf>,

    /// Drop absolute-path dependencies from rule lines. Absolute paths are
    /// then trusted to exist already and never become scheduling edges.
    pub skip_absolute_dependencies: bool,
}

/// Accumulates rules for one DAG document.
///
/// For any path, at most one accumulated rule *defines* it: a rule whose
/// targets are all known already is skipped. A rule with at least one new
/// target is kept with its full declared target list, so a path can be
/// listed on two rule lines while only the first defines it.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    owner: String,
    headers: Vec<(String, String)>,
    rules: Vec<Rule>,
    targets: HashSet<String>,
    fs: Arc<dyn FileSystem>,
    options: BuildOptions,
}

impl GraphBuilder {
    /// Builder backed by the real filesystem.
    pub fn new(owner: impl Into<String>) -> Self {
        Self::with_filesystem(owner, Arc::new(RealFileSystem))
    }

    pub fn with_filesystem(owner: impl Into<String>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            owner: owner.into(),
            headers: Vec::new(),
            rules: Vec::new(),
            targets: HashSet::new(),
            fs,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Append a `KEY=value` line. The key must be an identifier and the
    /// value a single line; anything else would corrupt the document.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        if !is_valid_header_key(&key) {
            return Err(SdmflowError::InvalidHeader {
                key,
                reason: "key is not a valid variable name".to_string(),
            });
        }
        if value.contains(['\n', '\r']) {
            return Err(SdmflowError::InvalidHeader {
                key,
                reason: "value contains a line break".to_string(),
            });
        }

        self.headers.push((key, value));
        Ok(())
    }

    /// Add one rule. Returns `Ok(false)` when every target is already defined.
    ///
    /// Fails with [`SdmflowError::MissingRequiredInput`] when the rule would
    /// be added but one of its required inputs does not exist. Nothing is
    /// recorded in that case.
    pub fn add_rule(&mut self, rule: Rule) -> Result<bool> {
        let new_targets = rule
            .targets
            .iter()
            .filter(|t| !self.targets.contains(t.as_str()))
            .count();

        if new_targets == 0 {
            if rule.targets.is_empty() {
                warn!(rule = %rule.label(), "rule declares no targets; skipping");
            } else {
                debug!(rule = %rule.label(), "all targets already defined; skipping");
            }
            return Ok(false);
        }

        self.check_required_inputs(&rule)?;

        let mut rule = rule;
        if self.options.skip_absolute_dependencies {
            rule.dependencies.retain(|d| !Path::new(d).is_absolute());
        }

        debug!(
            rule = %rule.label(),
            targets = rule.targets.len(),
            new_targets,
            dependencies = rule.dependencies.len(),
            local = rule.is_local(),
            "adding rule"
        );

        self.targets.extend(rule.targets.iter().cloned());
        self.rules.push(rule);
        Ok(true)
    }

    /// Add rules in order; returns how many were actually appended.
    pub fn add_rules<I>(&mut self, rules: I) -> Result<usize>
    where
        I: IntoIterator<Item = Rule>,
    {
        let mut added = 0;
        for rule in rules {
            if self.add_rule(rule)? {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn add_job(&mut self, job: &impl Render) -> Result<bool> {
        self.add_rule(job.render())
    }

    pub fn add_local_job(&mut self, job: &impl Render) -> Result<bool> {
        self.add_rule(job.as_local_rule())
    }

    fn check_required_inputs(&self, rule: &Rule) -> Result<()> {
        for input in &rule.required_inputs {
            let path = match self.options.base_dir {
                Some(ref base) => base.join(input),
                None => PathBuf::from(input),
            };
            if !self.fs.exists(&path) {
                return Err(SdmflowError::MissingRequiredInput {
                    job: rule.label().to_string(),
                    input: input.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Every target declared by an accumulated rule.
    pub fn targets(&self) -> &HashSet<String> {
        &self.targets
    }

    /// Targets in sorted order, for stable output.
    pub fn sorted_targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = self.targets.iter().map(String::as_str).collect();
        targets.sort_unstable();
        targets
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Render the document. A document without rules has nothing to
    /// schedule and is an error.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if self.rules.is_empty() {
            return Err(SdmflowError::EmptyDocument);
        }
        Ok(render_document(&self.headers, &self.rules).into_bytes())
    }

    /// Serialize and write to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.serialize()?;
        self.fs.write(path, &bytes)?;
        info!(
            owner = %self.owner,
            path = %path.display(),
            rules = self.rules.len(),
            targets = self.targets.len(),
            "wrote DAG document"
        );
        Ok(())
    }
}
