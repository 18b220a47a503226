//! Static AABB tree, built once top-down over a fixed set of leaf boxes.

use super::Aabb;

const NULL_NODE: u32 = u32::MAX;

#[derive(Clone, Debug)]
struct Node {
    aabb: Aabb,
    child1: u32,
    child2: u32,
    /// Leaf payload: index into the boxes the tree was built from.
    index: u32,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

#[derive(Clone, Debug, Default)]
pub struct StaticTree {
    nodes: Vec<Node>,
}

impl StaticTree {
    /// Build over `aabbs`; leaf payloads are the slice indices.
    pub fn build(aabbs: &[Aabb]) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(2 * aabbs.len()),
        };
        if aabbs.is_empty() {
            return tree;
        }
        let mut indices: Vec<u32> = (0..aabbs.len() as u32).collect();
        tree.build_node(aabbs, &mut indices);
        tree
    }

    /// Recursively build the node covering `indices`; returns its id.
    fn build_node(&mut self, aabbs: &[Aabb], indices: &mut [u32]) -> u32 {
        let node_id = self.nodes.len() as u32;

        let mut aabb = aabbs[indices[0] as usize];
        for &i in &indices[1..] {
            aabb = aabb.union(&aabbs[i as usize]);
        }

        if indices.len() == 1 {
            self.nodes.push(Node {
                aabb,
                child1: NULL_NODE,
                child2: NULL_NODE,
                index: indices[0],
            });
            return node_id;
        }

        self.nodes.push(Node {
            aabb,
            child1: NULL_NODE,
            child2: NULL_NODE,
            index: NULL_NODE,
        });

        // Split at the centre of the longest axis.
        let axis = aabb.longest_axis();
        let split = aabb.center()[axis];
        let mut left = 0;
        for k in 0..indices.len() {
            if aabbs[indices[k] as usize].center()[axis] < split {
                indices.swap(k, left);
                left += 1;
            }
        }

        // Everything landed on one side: split at the median instead.
        if left == 0 || left == indices.len() {
            indices.sort_by(|a, b| {
                let ca = aabbs[*a as usize].center()[axis];
                let cb = aabbs[*b as usize].center()[axis];
                ca.total_cmp(&cb)
            });
            left = indices.len() / 2;
        }

        let (lo, hi) = indices.split_at_mut(left);
        let child1 = self.build_node(aabbs, lo);
        let child2 = self.build_node(aabbs, hi);
        let node = &mut self.nodes[node_id as usize];
        node.child1 = child1;
        node.child2 = child2;
        node_id
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Root box, if any.
    pub fn aabb(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| n.aabb)
    }

    /// Report every leaf whose box overlaps `aabb`. Return `false` from the
    /// callback to stop early.
    pub fn query(&self, aabb: &Aabb, mut callback: impl FnMut(usize) -> bool) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = Vec::with_capacity(64);
        stack.push(0u32);
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            if !node.aabb.overlaps(aabb) {
                continue;
            }
            if node.is_leaf() {
                if !callback(node.index as usize) {
                    return;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn row_of_boxes(n: usize) -> Vec<Aabb> {
        (0..n)
            .map(|i| Aabb::from_center(Vec3::new(i as f32 * 2.0, 0.0, 0.0), 0.5))
            .collect()
    }

    #[test]
    fn test_query_finds_exactly_overlapping_leaves() {
        let boxes = row_of_boxes(16);
        let tree = StaticTree::build(&boxes);
        assert_eq!(tree.node_count(), 31);

        let mut hits = Vec::new();
        tree.query(&Aabb::new(Vec3::new(3.9, -1.0, -1.0), Vec3::new(8.1, 1.0, 1.0)), |i| {
            hits.push(i);
            true
        });
        hits.sort();
        assert_eq!(hits, vec![2, 3, 4]);
    }

    #[test]
    fn test_identical_boxes_fall_back_to_median_split() {
        let boxes = vec![Aabb::from_center(Vec3::ZERO, 1.0); 5];
        let tree = StaticTree::build(&boxes);
        let mut count = 0;
        tree.query(&Aabb::from_center(Vec3::ZERO, 0.1), |_| {
            count += 1;
            true
        });
        assert_eq!(count, 5);
    }

    #[test]
    fn test_query_stops_when_callback_says_so() {
        let boxes = row_of_boxes(8);
        let tree = StaticTree::build(&boxes);
        let mut count = 0;
        tree.query(&Aabb::new(Vec3::splat(-10.0), Vec3::splat(100.0)), |_| {
            count += 1;
            false
        });
        assert_eq!(count, 1);
    }
}
