// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::errors::{Result, SdmflowError};
use crate::job::model::Rule;

/// Dependency view over accumulated rules, keyed by rule index.
///
/// Edge direction: producer -> consumer. For a rule R whose dependencies
/// include a target of rule P, we add edge P -> R. A target listed by more
/// than one rule is attributed to the first rule that lists it, matching the
/// rule that defines it in the document.
#[derive(Debug, Clone)]
pub struct RuleGraph<'a> {
    rules: &'a [Rule],
    graph: DiGraphMap<usize, ()>,
    external: BTreeSet<&'a str>,
}

impl<'a> RuleGraph<'a> {
    pub fn from_rules(rules: &'a [Rule]) -> Self {
        let mut producers: HashMap<&str, usize> = HashMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            for target in &rule.targets {
                producers.entry(target.as_str()).or_insert(idx);
            }
        }

        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        let mut external = BTreeSet::new();

        for idx in 0..rules.len() {
            graph.add_node(idx);
        }

        for (idx, rule) in rules.iter().enumerate() {
            for dep in &rule.dependencies {
                match producers.get(dep.as_str()) {
                    Some(&producer) => {
                        graph.add_edge(producer, idx, ());
                    }
                    None => {
                        external.insert(dep.as_str());
                    }
                }
            }
        }

        Self {
            rules,
            graph,
            external,
        }
    }

    /// One valid execution order (rule indices).
    ///
    /// Self-loops count as cycles: a rule cannot wait on its own target.
    pub fn execution_order(&self) -> Result<Vec<usize>> {
        toposort(&self.graph, None).map_err(|cycle| {
            let idx = cycle.node_id();
            SdmflowError::DagCycle(format!(
                "cycle detected in rule graph involving rule '{}'",
                self.rules[idx].label()
            ))
        })
    }

    /// Rules that must finish before rule `idx` can run.
    pub fn dependencies_of(&self, idx: usize) -> Vec<usize> {
        self.sorted_neighbors(idx, Direction::Incoming)
    }

    /// Rules waiting on rule `idx`.
    pub fn dependents_of(&self, idx: usize) -> Vec<usize> {
        self.sorted_neighbors(idx, Direction::Outgoing)
    }

    /// Rules with no producer among the accumulated rules.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.rules.len())
            .filter(|&idx| self.dependencies_of(idx).is_empty())
            .collect()
    }

    /// Dependencies no rule produces; they must exist before the run starts.
    pub fn external_inputs(&self) -> Vec<&'a str> {
        self.external.iter().copied().collect()
    }

    pub fn rule(&self, idx: usize) -> Option<&'a Rule> {
        self.rules.get(idx)
    }

    fn sorted_neighbors(&self, idx: usize, dir: Direction) -> Vec<usize> {
        if !self.graph.contains_node(idx) {
            return Vec::new();
        }
        let mut out: Vec<usize> = self.graph.neighbors_directed(idx, dir).collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
