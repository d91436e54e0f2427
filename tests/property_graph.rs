// tests/property_graph.rs

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use sdmflow::dag::{GraphBuilder, RuleGraph, count_rule_blocks};
use sdmflow::fs::mock::MockFileSystem;
use sdmflow::job::Rule;

// Rules drawn from a fixed pool of target groups. Groups are disjoint, so a
// rule is either fully new or fully known. Rule N may only depend on
// targets of groups 0..N-1, which keeps every generated graph acyclic.
fn rules_strategy(max_groups: usize) -> impl Strategy<Value = Vec<Rule>> {
    (1..=max_groups).prop_flat_map(|groups| {
        let picks = proptest::collection::vec((0..groups, any::<usize>()), 1..(groups * 3));
        picks.prop_map(move |picks| {
            picks
                .into_iter()
                .map(|(g, dep_seed)| {
                    let targets = vec![format!("g{g}_a"), format!("g{g}_b")];
                    let mut rule = Rule::new(format!("make g{g}"), targets);
                    if g > 0 {
                        let dep = dep_seed % g;
                        rule = rule.with_dependencies([format!("g{dep}_a")]);
                    }
                    rule
                })
                .collect()
        })
    })
}

fn builder() -> GraphBuilder {
    GraphBuilder::with_filesystem("prop", Arc::new(MockFileSystem::new()))
}

proptest! {
    #[test]
    fn every_target_is_defined_by_exactly_one_rule(rules in rules_strategy(6)) {
        let mut b = builder();
        b.add_rules(rules.clone()).unwrap();

        let mut seen = HashSet::new();
        for rule in b.rules() {
            for target in &rule.targets {
                prop_assert!(seen.insert(target.clone()), "{} defined twice", target);
            }
        }

        let distinct: HashSet<&String> = rules.iter().flat_map(|r| r.targets.iter()).collect();
        prop_assert_eq!(b.targets().len(), distinct.len());
    }

    #[test]
    fn re_adding_everything_changes_nothing(rules in rules_strategy(6)) {
        let mut b = builder();
        b.add_rules(rules.clone()).unwrap();
        let before = b.serialize().unwrap();

        let added = b.add_rules(rules).unwrap();
        prop_assert_eq!(added, 0);
        prop_assert_eq!(b.serialize().unwrap(), before);
    }

    #[test]
    fn document_has_one_block_per_rule_and_orders(rules in rules_strategy(6)) {
        let mut b = builder();
        b.add_rules(rules).unwrap();

        let doc = String::from_utf8(b.serialize().unwrap()).unwrap();
        prop_assert_eq!(count_rule_blocks(&doc), b.rules().len());

        let graph = RuleGraph::from_rules(b.rules());
        let order = graph.execution_order().unwrap();
        prop_assert_eq!(order.len(), b.rules().len());
    }
}
