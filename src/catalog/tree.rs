//! Reconstruction of the catalog tree from parent-linked records.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::CatalogRecord;

/// One catalog entry together with its children, in listing order.
///
/// Nodes are exclusively owned by their parent; the tree is immutable once
/// built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    record: CatalogRecord,
    children: Vec<TreeNode>,
}

impl TreeNode {
    /// Returns the wrapped catalog record.
    #[must_use]
    pub fn record(&self) -> &CatalogRecord {
        &self.record
    }

    /// Returns the children in listing order.
    #[must_use]
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }
}

impl Drop for TreeNode {
    // Flattens teardown so deep chains do not recurse once per level.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Ordered sequence of independent trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    roots: Vec<TreeNode>,
}

impl Forest {
    /// Returns the root nodes in listing order.
    #[must_use]
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Returns true if the forest holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes across all trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Number of document nodes across all trees.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.iter().filter(|node| node.record.is_document()).count()
    }

    /// Iterates over every node in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        let mut pending: Vec<&TreeNode> = self.roots.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = pending.pop()?;
            pending.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Builds a forest from a flat list of parent-linked records.
///
/// Every record appears exactly once in the result:
/// - an empty `parent_id` makes the record a root;
/// - a `parent_id` naming a record in the list attaches it as that record's
///   last child so far;
/// - a `parent_id` naming nothing in the list, or the record itself, makes
///   the record a root instead of dropping it.
///
/// Records whose parent chain loops back on itself (`A -> B -> A`) are not
/// reachable from any root after linking. For each such group, the
/// earliest-listed record on the loop itself is promoted to a root, which
/// breaks the loop while keeping every other record, including ones that
/// merely hang off the loop, under its original parent.
///
/// Roots and siblings keep their listing order. When an id occurs more than
/// once, children attach to its first occurrence.
#[must_use]
pub fn build_forest(records: Vec<CatalogRecord>) -> Forest {
    let count = records.len();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(count);
    for (position, record) in records.iter().enumerate() {
        index.entry(record.id.as_str()).or_insert(position);
    }

    let mut parents: Vec<Option<usize>> = Vec::with_capacity(count);
    let mut orphans = 0usize;
    for (position, record) in records.iter().enumerate() {
        let parent = if record.parent_id.is_empty() {
            None
        } else {
            match index.get(record.parent_id.as_str()) {
                Some(&parent) if parent != position => Some(parent),
                _ => {
                    orphans += 1;
                    debug!(
                        id = %record.id,
                        parent_id = %record.parent_id,
                        "unresolved parent, attaching at root"
                    );
                    None
                }
            }
        };
        parents.push(parent);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (position, parent) in parents.iter().enumerate() {
        if let Some(parent) = parent {
            children[*parent].push(position);
        }
    }

    let mut reached = vec![false; count];
    for position in 0..count {
        if parents[position].is_none() {
            mark_reachable(position, &children, &mut reached);
        }
    }
    let mut cycles = 0usize;
    for position in 0..count {
        if reached[position] {
            continue;
        }
        cycles += 1;
        let promoted = earliest_on_loop(position, &parents);
        if let Some(parent) = parents[promoted].take() {
            children[parent].retain(|&child| child != promoted);
        }
        mark_reachable(promoted, &children, &mut reached);
    }
    if cycles > 0 {
        warn!(cycles, "catalog listing contains parent cycles, promoted entries to roots");
    }

    let root_positions: Vec<usize> = (0..count).filter(|&p| parents[p].is_none()).collect();
    let roots = assemble(records, &root_positions, &children);

    debug!(records = count, roots = roots.len(), orphans, "built catalog forest");
    Forest { roots }
}

fn mark_reachable(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
    let mut pending = vec![start];
    while let Some(position) = pending.pop() {
        if !reached[position] {
            reached[position] = true;
            pending.extend(children[position].iter().copied());
        }
    }
}

/// Follows parent links from an unreachable record until one repeats, then
/// returns the earliest-listed record on that loop.
fn earliest_on_loop(start: usize, parents: &[Option<usize>]) -> usize {
    let mut visited = HashSet::new();
    let mut cursor = start;
    while visited.insert(cursor) {
        match parents[cursor] {
            Some(parent) => cursor = parent,
            None => return cursor,
        }
    }

    let entry = cursor;
    let mut earliest = entry;
    let mut member = parents[entry];
    while let Some(position) = member {
        if position == entry {
            break;
        }
        earliest = earliest.min(position);
        member = parents[position];
    }
    earliest
}

/// Turns the linked indices into owned nodes bottom-up, without recursion.
fn assemble(
    records: Vec<CatalogRecord>,
    roots: &[usize],
    children: &[Vec<usize>],
) -> Vec<TreeNode> {
    let mut slots: Vec<Option<CatalogRecord>> = records.into_iter().map(Some).collect();
    let mut built: Vec<Option<TreeNode>> =
        std::iter::repeat_with(|| None).take(slots.len()).collect();

    // Each position is pushed once unexpanded, then again once its subtree is queued.
    let mut pending: Vec<(usize, bool)> = roots.iter().map(|&root| (root, false)).collect();
    while let Some((position, expanded)) = pending.pop() {
        if expanded {
            let Some(record) = slots[position].take() else {
                continue;
            };
            let children = children[position]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[position] = Some(TreeNode { record, children });
        } else {
            pending.push((position, true));
            pending.extend(children[position].iter().map(|&child| (child, false)));
        }
    }

    roots.iter().filter_map(|&root| built[root].take()).collect()
}
