//! Tree Assembler
//!
//! Builds the nested hierarchy view from a flat scan of a space's node
//! records. Assembly is a pure function over the record set: it never
//! touches storage and never fails.
//!
//! # Corrupt link handling
//!
//! Flat records can carry broken parent links (a deleted parent, a
//! self-reference, or a cycle). The assembler never drops a record for
//! it; any node whose parent chain does not reach a real root is promoted
//! to a root, so corruption surfaces visibly in the output instead of
//! silently losing data.

use crate::models::{Node, TreeNode};
use std::collections::{HashMap, HashSet, VecDeque};

/// Assemble the ordered forest for one space from its flat records.
///
/// Every input node appears in the output exactly once. Siblings (and
/// roots) are sorted by `order_index` ascending, ties broken by input
/// scan order.
pub fn assemble_forest(nodes: &[Node]) -> Vec<TreeNode> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let ids: HashSet<&str> = nodes.iter().map(|n| n.node_id.as_str()).collect();

    // Adjacency in input scan order. A parent reference that points
    // outside the record set, or at the node itself, does not count as
    // an attachment.
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut roots: Vec<&str> = Vec::new();

    for node in nodes {
        match node.parent_node_id.as_deref() {
            Some(parent) if parent != node.node_id && ids.contains(parent) => {
                adjacency.entry(parent).or_default().push(&node.node_id);
            }
            _ => roots.push(&node.node_id),
        }
    }

    // Breadth-first visit from the roots, recording which parent each
    // node was actually attached under. The visited set bounds the walk
    // by the node count, so a corrupt link structure cannot loop.
    let mut visited: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut visit_order: Vec<&str> = Vec::with_capacity(nodes.len());
    let mut attached: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for root in &roots {
        if visited.insert(*root) {
            queue.push_back(*root);
        }
    }

    // Records on a parent cycle are unreachable from any root; promote
    // the first unvisited one (in scan order) and keep walking until
    // every record is placed.
    let mut scan = nodes.iter();
    loop {
        while let Some(current) = queue.pop_front() {
            visit_order.push(current);

            if let Some(children) = adjacency.get(current) {
                for child in children {
                    if visited.insert(*child) {
                        attached.entry(current).or_default().push(*child);
                        queue.push_back(*child);
                    }
                }
            }
        }

        if visit_order.len() == nodes.len() {
            break;
        }

        match scan.find(|n| !visited.contains(n.node_id.as_str())) {
            Some(orphan) => {
                roots.push(&orphan.node_id);
                visited.insert(&orphan.node_id);
                queue.push_back(&orphan.node_id);
            }
            None => break,
        }
    }

    // Assemble bottom-up: walking the visit order in reverse guarantees
    // every child tree is complete before its parent takes it.
    let mut built: HashMap<&str, TreeNode> = nodes
        .iter()
        .map(|n| (n.node_id.as_str(), TreeNode::from_record(n)))
        .collect();

    for id in visit_order.iter().rev() {
        if let Some(child_ids) = attached.get(id) {
            let mut children: Vec<TreeNode> = child_ids
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            children.sort_by_key(|c| c.order_index);

            if let Some(parent) = built.get_mut(id) {
                parent.children = children;
            }
        }
    }

    let mut forest: Vec<TreeNode> = roots.iter().filter_map(|r| built.remove(r)).collect();
    forest.sort_by_key(|r| r.order_index);
    forest
}
