use crate::error::StructuralError;
use crate::flow::Flow;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::{BTreeSet, VecDeque};

/// Checks the structural invariants of a flow.
///
/// Returns every finding at once. `UnreachableNode` findings have warning
/// severity; the flow is only accepted when there are no findings at all.
pub fn validate_structure(flow: &Flow) -> Result<(), Vec<StructuralError>> {
    let mut errors = Vec::new();

    if flow.nodes.is_empty() {
        return Err(vec![StructuralError::EmptyFlow(flow.id.clone())]);
    }

    errors.extend(
        flow.nodes
            .iter()
            .map(|n| n.id.as_str())
            .duplicates()
            .map(|id| StructuralError::DuplicateNodeId(id.to_string())),
    );

    let known: AHashSet<&str> = flow.nodes.iter().map(|n| n.id.as_str()).collect();
    if !known.contains(flow.entry_node_id.as_str()) {
        errors.push(StructuralError::MissingEntryNode(flow.entry_node_id.clone()));
    }

    check_transitions(flow, &known, &mut errors);
    check_branches(flow, &known, &mut errors);

    if known.contains(flow.entry_node_id.as_str()) {
        errors.extend(
            unreachable_nodes(flow)
                .into_iter()
                .map(StructuralError::UnreachableNode),
        );
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_transitions(flow: &Flow, known: &AHashSet<&str>, errors: &mut Vec<StructuralError>) {
    let mut out_degree: AHashMap<&str, usize> = AHashMap::new();

    for transition in &flow.transitions {
        if !known.contains(transition.from.as_str()) || !known.contains(transition.to.as_str()) {
            errors.push(StructuralError::DanglingTransition {
                from: transition.from.clone(),
                to: transition.to.clone(),
            });
            continue;
        }
        *out_degree.entry(transition.from.as_str()).or_default() += 1;
    }

    for node in &flow.nodes {
        let count = out_degree.get(node.id.as_str()).copied().unwrap_or(0);
        if node.is_conditional() {
            if count > 0 {
                errors.push(StructuralError::ConditionalWithTransition(node.id.clone()));
            }
        } else if count > 1 {
            errors.push(StructuralError::AmbiguousTransition {
                node_id: node.id.clone(),
                count,
            });
        }
    }
}

fn check_branches(flow: &Flow, known: &AHashSet<&str>, errors: &mut Vec<StructuralError>) {
    for node in &flow.nodes {
        let Some(branches) = node.branches() else {
            continue;
        };

        if branches.is_empty() {
            errors.push(StructuralError::EmptyBranches(node.id.clone()));
            continue;
        }

        let defaults = branches.iter().filter(|b| b.is_default()).count();
        match defaults {
            0 => errors.push(StructuralError::MissingDefaultBranch(node.id.clone())),
            1 => {
                if branches.last().is_some_and(|b| !b.is_default()) {
                    errors.push(StructuralError::DefaultBranchNotLast(node.id.clone()));
                }
            }
            count => errors.push(StructuralError::MultipleDefaultBranches {
                node_id: node.id.clone(),
                count,
            }),
        }

        for branch in branches {
            if !known.contains(branch.target.as_str()) {
                errors.push(StructuralError::DanglingTransition {
                    from: node.id.clone(),
                    to: branch.target.clone(),
                });
            }
        }

        let mut referenced = BTreeSet::new();
        for predicate in branches.iter().filter_map(|b| b.when.as_ref()) {
            predicate.referenced_answers(&mut referenced);
        }
        errors.extend(
            referenced
                .into_iter()
                .filter(|id| !known.contains(id.as_str()))
                .map(|missing| StructuralError::UnknownPredicateReference {
                    node_id: node.id.clone(),
                    missing,
                }),
        );
    }
}

/// Breadth-first walk from the entry node over every edge, guarded ones included.
fn unreachable_nodes(flow: &Flow) -> Vec<String> {
    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for (from, to) in flow.edges() {
        adjacency.entry(from).or_default().push(to);
    }

    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut queue = VecDeque::from([flow.entry_node_id.as_str()]);
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        if let Some(targets) = adjacency.get(current) {
            queue.extend(targets.iter().copied().filter(|t| !seen.contains(t)));
        }
    }

    flow.nodes
        .iter()
        .filter(|n| !seen.contains(n.id.as_str()))
        .map(|n| n.id.clone())
        .unique()
        .collect()
}
