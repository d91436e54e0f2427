#![allow(dead_code)]

use sdmflow::config::{
    BatchConfig, ChainConfig, ConfigFile, RawConfigFile, RegistrySection, StepConfig, StockpileConfig,
    WorkflowSection,
};
use sdmflow::stockpile::ArtifactKind;

/// Builder for `ConfigFile` to simplify test setup.
pub struct WorkflowConfigBuilder {
    config: RawConfigFile,
}

impl WorkflowConfigBuilder {
    pub fn new(owner: &str) -> Self {
        Self {
            config: RawConfigFile {
                workflow: WorkflowSection {
                    owner: owner.to_string(),
                    ..WorkflowSection::default()
                },
                registry: RegistrySection::default(),
                headers: Default::default(),
                step: Default::default(),
                chain: Default::default(),
                stockpile: Default::default(),
                batch: Default::default(),
            },
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.config.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_tool(mut self, tool: &str) -> Self {
        self.config.workflow.tool = tool.to_string();
        self
    }

    pub fn with_registry(mut self, path: &str) -> Self {
        self.config.registry.path = path.to_string();
        self
    }

    pub fn skip_absolute_dependencies(mut self) -> Self {
        self.config.workflow.skip_absolute_dependencies = true;
        self
    }

    pub fn with_step(mut self, name: &str, step: StepConfig) -> Self {
        self.config.step.insert(name.to_string(), step);
        self
    }

    pub fn with_chain(mut self, name: &str, steps: &[&str]) -> Self {
        self.config.chain.insert(
            name.to_string(),
            ChainConfig {
                steps: steps.iter().map(|s| s.to_string()).collect(),
                comment: None,
                local: false,
                wrap: false,
                required_inputs: vec![],
            },
        );
        self
    }

    pub fn with_wrapped_chain(mut self, name: &str, steps: &[&str]) -> Self {
        self = self.with_chain(name, steps);
        if let Some(chain) = self.config.chain.get_mut(name) {
            chain.wrap = true;
        }
        self
    }

    pub fn with_stockpile(
        mut self,
        name: &str,
        kind: ArtifactKind,
        object_id: i64,
        outputs: &[&str],
        success: &str,
    ) -> Self {
        self.config.stockpile.insert(
            name.to_string(),
            StockpileConfig {
                kind,
                object_id,
                outputs: outputs.iter().map(|s| s.to_string()).collect(),
                success: success.to_string(),
                status: None,
                status_file: None,
            },
        );
        self
    }

    pub fn with_batch(mut self, name: &str, manifest: &str, success: &str) -> Self {
        self.config.batch.insert(
            name.to_string(),
            BatchConfig {
                manifest: manifest.to_string(),
                success: success.to_string(),
            },
        );
        self
    }

    /// The unvalidated config, for exercising validation failures.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(cmd: &[&str]) -> Self {
        Self {
            step: StepConfig {
                cmd: cmd.iter().map(|s| s.to_string()).collect(),
                inputs: vec![],
                required_inputs: vec![],
                outputs: vec![],
                comment: None,
                local: false,
                wrap: false,
            },
        }
    }

    pub fn input(mut self, path: &str) -> Self {
        self.step.inputs.push(path.to_string());
        self
    }

    pub fn required(mut self, path: &str) -> Self {
        self.step.required_inputs.push(path.to_string());
        self
    }

    pub fn output(mut self, path: &str) -> Self {
        self.step.outputs.push(path.to_string());
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.step.comment = Some(comment.to_string());
        self
    }

    pub fn local(mut self) -> Self {
        self.step.local = true;
        self
    }

    pub fn wrap(mut self) -> Self {
        self.step.wrap = true;
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}
