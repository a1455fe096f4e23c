use carta_geometry::*;

///
/// Entries per node before it splits
///
const MAX_ENTRIES: usize = 9;

enum Node {
    Leaf { extent: Extent, entries: Vec<(Extent, usize)> },
    Branch { extent: Extent, children: Vec<Node> },
}

impl Node {
    fn extent(&self) -> Extent {
        match self {
            Node::Leaf { extent, .. }   => *extent,
            Node::Branch { extent, .. } => *extent,
        }
    }

    fn recompute_extent(&mut self) {
        match self {
            Node::Leaf { extent, entries } => {
                let mut combined = Extent::empty();
                for (entry_extent, _) in entries.iter() {
                    combined.extend(entry_extent);
                }
                *extent = combined;
            }
            Node::Branch { extent, children } => {
                let mut combined = Extent::empty();
                for child in children.iter() {
                    combined.extend(&child.extent());
                }
                *extent = combined;
            }
        }
    }
}

///
/// How much an extent would have to grow to cover another
///
fn enlargement(extent: &Extent, other: &Extent) -> f64 {
    if extent.is_empty() {
        return other.width().max(0.0) * other.height().max(0.0);
    }

    let grown_width     = extent.max_x.max(other.max_x) - extent.min_x.min(other.min_x);
    let grown_height    = extent.max_y.max(other.max_y) - extent.min_y.min(other.min_y);

    grown_width * grown_height - extent.width() * extent.height()
}

///
/// Splits an overflowing entry list in two along its longer axis
///
fn split_entries<Entry>(mut entries: Vec<Entry>, extent_of: impl Fn(&Entry) -> Extent) -> (Vec<Entry>, Vec<Entry>) {
    let mut combined = Extent::empty();
    for entry in entries.iter() {
        combined.extend(&extent_of(entry));
    }

    if combined.width() >= combined.height() {
        entries.sort_by(|a, b| {
            let (a, b) = (extent_of(a), extent_of(b));
            (a.min_x + a.max_x).partial_cmp(&(b.min_x + b.max_x)).unwrap()
        });
    } else {
        entries.sort_by(|a, b| {
            let (a, b) = (extent_of(a), extent_of(b));
            (a.min_y + a.max_y).partial_cmp(&(b.min_y + b.max_y)).unwrap()
        });
    }

    let tail = entries.split_off(entries.len() / 2);
    (entries, tail)
}

///
/// A small dynamic R-tree over id-tagged boxes
///
/// The triangulator keeps every live ring segment in one of these: bridge validity, ear
/// containment and self-intersection queries all reduce to "which segments might touch
/// this box", which stays logarithmic as rings shrink and split.
///
pub struct SegmentTree {
    root: Node,
}

impl SegmentTree {
    pub fn new() -> SegmentTree {
        SegmentTree {
            root: Node::Leaf { extent: Extent::empty(), entries: vec![] },
        }
    }

    pub fn insert(&mut self, extent: Extent, id: usize) {
        if let Some(sibling) = Self::insert_into(&mut self.root, extent, id) {
            // The root split: grow the tree by one level
            let old_root = std::mem::replace(&mut self.root, Node::Leaf { extent: Extent::empty(), entries: vec![] });
            let mut branch = Node::Branch { extent: Extent::empty(), children: vec![old_root, sibling] };
            branch.recompute_extent();
            self.root = branch;
        }
    }

    fn insert_into(node: &mut Node, extent: Extent, id: usize) -> Option<Node> {
        match node {
            Node::Leaf { extent: node_extent, entries } => {
                entries.push((extent, id));
                node_extent.extend(&extent);

                if entries.len() <= MAX_ENTRIES {
                    return None;
                }

                let (keep, spill) = split_entries(std::mem::take(entries), |(entry_extent, _)| *entry_extent);
                *entries = keep;
                node.recompute_extent();

                let mut sibling = Node::Leaf { extent: Extent::empty(), entries: spill };
                sibling.recompute_extent();
                Some(sibling)
            }

            Node::Branch { extent: node_extent, children } => {
                node_extent.extend(&extent);

                let best = (0..children.len())
                    .min_by(|a, b| {
                        enlargement(&children[*a].extent(), &extent)
                            .partial_cmp(&enlargement(&children[*b].extent(), &extent))
                            .unwrap()
                    })
                    .unwrap();

                let split = Self::insert_into(&mut children[best], extent, id)?;
                children.push(split);

                if children.len() <= MAX_ENTRIES {
                    return None;
                }

                let (keep, spill) = split_entries(std::mem::take(children), |child| child.extent());
                *children = keep;
                node.recompute_extent();

                let mut sibling = Node::Branch { extent: Extent::empty(), children: spill };
                sibling.recompute_extent();
                Some(sibling)
            }
        }
    }

    ///
    /// Removes the entry with this id whose box intersects `extent`, returning whether
    /// anything was removed
    ///
    pub fn remove(&mut self, extent: &Extent, id: usize) -> bool {
        Self::remove_from(&mut self.root, extent, id)
    }

    fn remove_from(node: &mut Node, extent: &Extent, id: usize) -> bool {
        match node {
            Node::Leaf { entries, .. } => {
                let before = entries.len();
                entries.retain(|(_, entry_id)| *entry_id != id);
                let removed = entries.len() != before;
                if removed {
                    node.recompute_extent();
                }
                removed
            }

            Node::Branch { children, .. } => {
                let mut removed = false;
                for child in children.iter_mut() {
                    if child.extent().intersects(extent) && Self::remove_from(child, extent, id) {
                        removed = true;
                        break;
                    }
                }

                if removed {
                    children.retain(|child| match child {
                        Node::Leaf { entries, .. }  => !entries.is_empty(),
                        Node::Branch { children, .. } => !children.is_empty(),
                    });
                    node.recompute_extent();
                }
                removed
            }
        }
    }

    ///
    /// Collects the ids of every entry whose box intersects `extent`
    ///
    pub fn search(&self, extent: &Extent, results: &mut Vec<usize>) {
        Self::search_in(&self.root, extent, results);
    }

    fn search_in(node: &Node, extent: &Extent, results: &mut Vec<usize>) {
        match node {
            Node::Leaf { entries, .. } => {
                for (entry_extent, id) in entries.iter() {
                    if entry_extent.intersects(extent) {
                        results.push(*id);
                    }
                }
            }

            Node::Branch { children, .. } => {
                for child in children.iter() {
                    if child.extent().intersects(extent) {
                        Self::search_in(child, extent, results);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(x: f64, y: f64) -> Extent {
        Extent::new(x, y, x + 1.0, y + 1.0)
    }

    #[test]
    fn search_finds_only_intersecting_entries() {
        let mut tree = SegmentTree::new();
        for id in 0..50 {
            tree.insert(unit_box(id as f64 * 2.0, 0.0), id);
        }

        let mut results = vec![];
        tree.search(&Extent::new(10.0, 0.0, 14.0, 1.0), &mut results);
        results.sort();

        assert!(results == vec![5, 6, 7], "Unexpected results: {:?}", results);
    }

    #[test]
    fn removed_entries_stop_matching() {
        let mut tree = SegmentTree::new();
        for id in 0..20 {
            tree.insert(unit_box(id as f64, id as f64), id);
        }

        assert!(tree.remove(&unit_box(7.0, 7.0), 7));
        assert!(!tree.remove(&unit_box(7.0, 7.0), 7), "Removed twice");

        let mut results = vec![];
        tree.search(&unit_box(7.0, 7.0), &mut results);
        assert!(!results.contains(&7), "Unexpected results: {:?}", results);
    }
}
