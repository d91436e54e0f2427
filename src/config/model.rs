// src/config/model.rs

use indexmap::IndexMap;
use serde::Deserialize;

use crate::stockpile::ArtifactKind;

/// Workflow description as read from a TOML file.
///
/// ```toml
/// [workflow]
/// owner = "kubi"
///
/// [headers]
/// PYTHON = "/usr/bin/python3"
///
/// [step.occ]
/// cmd = ["$PYTHON", "occ.py", "pts.csv", "occ.json"]
/// inputs = ["pts.csv"]
/// outputs = ["occ.json"]
///
/// [stockpile.occ]
/// kind = "vector"
/// object_id = 12
/// outputs = ["occ.json"]
/// success = "occ.success"
/// ```
///
/// Sections keep the order they have in the file: headers are written in
/// that order, and within each section kind the first job to declare a
/// target is the one that defines it.
///
/// This is the unvalidated shape; convert it with `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub workflow: WorkflowSection,

    #[serde(default)]
    pub registry: RegistrySection,

    /// `KEY = "value"` lines emitted at the top of the document.
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    /// `[step.<name>]` sections.
    #[serde(default)]
    pub step: IndexMap<String, StepConfig>,

    /// `[chain.<name>]` sections.
    #[serde(default)]
    pub chain: IndexMap<String, ChainConfig>,

    /// `[stockpile.<name>]` sections.
    #[serde(default)]
    pub stockpile: IndexMap<String, StockpileConfig>,

    /// `[batch.<name>]` sections.
    #[serde(default)]
    pub batch: IndexMap<String, BatchConfig>,
}

/// Validated workflow configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means
/// the checks in `config::validate` passed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub workflow: WorkflowSection,
    pub registry: RegistrySection,
    pub headers: IndexMap<String, String>,
    pub step: IndexMap<String, StepConfig>,
    pub chain: IndexMap<String, ChainConfig>,
    pub stockpile: IndexMap<String, StockpileConfig>,
    pub batch: IndexMap<String, BatchConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            workflow: raw.workflow,
            registry: raw.registry,
            headers: raw.headers,
            step: raw.step,
            chain: raw.chain,
            stockpile: raw.stockpile,
            batch: raw.batch,
        }
    }

    /// Name of the chain that consumes `step`, if any.
    pub fn chain_of(&self, step: &str) -> Option<&str> {
        self.chain
            .iter()
            .find(|(_, c)| c.steps.iter().any(|s| s == step))
            .map(|(name, _)| name.as_str())
    }
}

/// `[workflow]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSection {
    /// Owner of the graph; also names the default document file.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Where to write the document. Defaults to `<config dir>/<owner>.mf`.
    #[serde(default)]
    pub document: Option<String>,

    /// Program generated helper steps (touch, stockpile) invoke.
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Leave absolute-path dependencies out of rule lines.
    #[serde(default)]
    pub skip_absolute_dependencies: bool,
}

fn default_owner() -> String {
    "anonymous".to_string()
}

fn default_tool() -> String {
    "sdmflow".to_string()
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            document: None,
            tool: default_tool(),
            skip_absolute_dependencies: false,
        }
    }
}

/// `[registry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySection {
    /// Root of the file registry stockpile steps commit into.
    #[serde(default = "default_registry_path")]
    pub path: String,
}

fn default_registry_path() -> String {
    ".sdmflow/registry".to_string()
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

/// `[step.<name>]` section: one external invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// Executable and arguments.
    pub cmd: Vec<String>,

    #[serde(default)]
    pub inputs: Vec<String>,

    /// Inputs that must exist when the graph is built.
    #[serde(default)]
    pub required_inputs: Vec<String>,

    #[serde(default)]
    pub outputs: Vec<String>,

    #[serde(default)]
    pub comment: Option<String>,

    /// Run on the controlling node.
    #[serde(default)]
    pub local: bool,

    /// Guarantee the outputs exist afterwards (empty markers on failure).
    #[serde(default)]
    pub wrap: bool,
}

/// `[chain.<name>]` section: steps run in order as one job.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub steps: Vec<String>,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub local: bool,

    #[serde(default)]
    pub wrap: bool,

    /// Extra required inputs for the whole chain.
    #[serde(default)]
    pub required_inputs: Vec<String>,
}

/// `[stockpile.<name>]` section: verify-and-commit step, always local.
#[derive(Debug, Clone, Deserialize)]
pub struct StockpileConfig {
    pub kind: ArtifactKind,
    pub object_id: i64,
    pub outputs: Vec<String>,

    /// Success file the step writes; other steps may depend on it.
    pub success: String,

    #[serde(default)]
    pub status: Option<i32>,

    #[serde(default)]
    pub status_file: Option<String>,
}

/// `[batch.<name>]` section: stockpile every object of a JSON manifest in
/// one local step.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub manifest: String,
    pub success: String,
}
