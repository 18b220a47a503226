//! Dynamic AABB tree with fat proxies.
//!
//! Proxies are stored with an enlarged box (extension plus predicted
//! displacement) so that small motions do not require re-insertion.

use super::{Aabb, RayCastInput};
use crate::constants::{AABB_EXTENSION, AABB_MULTIPLIER};
use glam::Vec3;

const NULL_NODE: u32 = u32::MAX;

/// Proxy id returned by [`DynamicTree::insert`].
pub type ProxyId = u32;

#[derive(Clone, Debug)]
struct Node<T> {
    aabb: Aabb,
    parent: u32,
    child1: u32,
    child2: u32,
    /// Leaf payload. `None` on internal and free nodes.
    data: Option<T>,
}

impl<T> Node<T> {
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

#[derive(Clone, Debug)]
pub struct DynamicTree<T> {
    nodes: Vec<Node<T>>,
    free_list: Vec<u32>,
    root: u32,
    proxy_count: usize,
}

impl<T: Copy> DynamicTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: NULL_NODE,
            proxy_count: 0,
        }
    }

    /// Insert a proxy for `aabb`, fattened by [`AABB_EXTENSION`].
    pub fn insert(&mut self, aabb: Aabb, data: T) -> ProxyId {
        let leaf = self.alloc_node();
        {
            let node = &mut self.nodes[leaf as usize];
            node.aabb = aabb.extended(AABB_EXTENSION);
            node.data = Some(data);
        }
        self.insert_leaf(leaf);
        self.proxy_count += 1;
        leaf
    }

    pub fn remove(&mut self, proxy: ProxyId) {
        assert!(
            self.nodes.get(proxy as usize).map_or(false, |n| n.is_leaf() && n.data.is_some()),
            "invalid proxy {}",
            proxy
        );
        self.remove_leaf(proxy);
        self.free_node(proxy);
        self.proxy_count -= 1;
    }

    /// Update a proxy after its object moved by `displacement`. Returns true
    /// if the proxy had to be re-inserted.
    pub fn move_proxy(&mut self, proxy: ProxyId, aabb: Aabb, displacement: Vec3) -> bool {
        let node = &self.nodes[proxy as usize];
        assert!(node.is_leaf() && node.data.is_some(), "invalid proxy {}", proxy);
        if node.aabb.contains(&aabb) {
            return false;
        }

        self.remove_leaf(proxy);

        // Predict where the object is heading.
        let mut fat = aabb.extended(AABB_EXTENSION);
        let d = AABB_MULTIPLIER * displacement;
        for axis in 0..3 {
            if d[axis] < 0.0 {
                fat.lower[axis] += d[axis];
            } else {
                fat.upper[axis] += d[axis];
            }
        }
        self.nodes[proxy as usize].aabb = fat;

        self.insert_leaf(proxy);
        true
    }

    /// Fat box of a proxy.
    pub fn fat_aabb(&self, proxy: ProxyId) -> Aabb {
        self.nodes[proxy as usize].aabb
    }

    pub fn data(&self, proxy: ProxyId) -> Option<T> {
        self.nodes.get(proxy as usize).and_then(|n| n.data)
    }

    pub fn len(&self) -> usize {
        self.proxy_count
    }

    pub fn is_empty(&self) -> bool {
        self.proxy_count == 0
    }

    /// Report proxies whose fat box overlaps `aabb`. Return `false` to stop.
    pub fn query(&self, aabb: &Aabb, mut callback: impl FnMut(ProxyId, T) -> bool) {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            if !node.aabb.overlaps(aabb) {
                continue;
            }
            if node.is_leaf() {
                if let Some(data) = node.data {
                    if !callback(node_id, data) {
                        return;
                    }
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Walk proxies whose fat box the segment crosses.
    ///
    /// The callback returns the new clip fraction: `0` stops the cast, a value
    /// in `(0, max_fraction)` shortens the segment, `max_fraction` continues
    /// unchanged.
    pub fn ray_cast(&self, input: &RayCastInput, mut callback: impl FnMut(&RayCastInput, T) -> f32) {
        if self.root == NULL_NODE {
            return;
        }
        let mut max_fraction = input.max_fraction;
        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);
        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id as usize];
            if !node.aabb.overlaps_segment(input.p1, input.p2, max_fraction) {
                continue;
            }
            if node.is_leaf() {
                if let Some(data) = node.data {
                    let sub_input = RayCastInput {
                        p1: input.p1,
                        p2: input.p2,
                        max_fraction,
                    };
                    let value = callback(&sub_input, data);
                    if value == 0.0 {
                        return;
                    }
                    if value > 0.0 && value < max_fraction {
                        max_fraction = value;
                    }
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    // ===== internals =====

    fn alloc_node(&mut self) -> u32 {
        let blank = Node {
            aabb: Aabb::new(Vec3::ZERO, Vec3::ZERO),
            parent: NULL_NODE,
            child1: NULL_NODE,
            child2: NULL_NODE,
            data: None,
        };
        if let Some(id) = self.free_list.pop() {
            self.nodes[id as usize] = blank;
            id
        } else {
            self.nodes.push(blank);
            (self.nodes.len() - 1) as u32
        }
    }

    fn free_node(&mut self, id: u32) {
        let node = &mut self.nodes[id as usize];
        node.data = None;
        node.parent = NULL_NODE;
        node.child1 = NULL_NODE;
        node.child2 = NULL_NODE;
        self.free_list.push(id);
    }

    fn insert_leaf(&mut self, leaf: u32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent = NULL_NODE;
            return;
        }

        // Descend toward the sibling with the cheapest surface-area increase.
        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut sibling = self.root;
        while !self.nodes[sibling as usize].is_leaf() {
            let node = &self.nodes[sibling as usize];
            let area = node.aabb.surface_area();
            let combined_area = node.aabb.union(&leaf_aabb).surface_area();

            let cost = 2.0 * combined_area;
            let inheritance = 2.0 * (combined_area - area);

            let child_cost = |child: u32| {
                let c = &self.nodes[child as usize];
                let merged = c.aabb.union(&leaf_aabb).surface_area();
                if c.is_leaf() {
                    merged + inheritance
                } else {
                    merged - c.aabb.surface_area() + inheritance
                }
            };
            let cost1 = child_cost(node.child1);
            let cost2 = child_cost(node.child2);

            if cost < cost1 && cost < cost2 {
                break;
            }
            sibling = if cost1 < cost2 { node.child1 } else { node.child2 };
        }

        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.alloc_node();
        {
            let sibling_aabb = self.nodes[sibling as usize].aabb;
            let node = &mut self.nodes[new_parent as usize];
            node.parent = old_parent;
            node.aabb = leaf_aabb.union(&sibling_aabb);
            node.child1 = sibling;
            node.child2 = leaf;
        }
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        if old_parent == NULL_NODE {
            self.root = new_parent;
        } else {
            let parent = &mut self.nodes[old_parent as usize];
            if parent.child1 == sibling {
                parent.child1 = new_parent;
            } else {
                parent.child2 = new_parent;
            }
        }

        self.refit(old_parent);
    }

    fn remove_leaf(&mut self, leaf: u32) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grand_parent = self.nodes[parent as usize].parent;
        let sibling = if self.nodes[parent as usize].child1 == leaf {
            self.nodes[parent as usize].child2
        } else {
            self.nodes[parent as usize].child1
        };

        if grand_parent == NULL_NODE {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL_NODE;
        } else {
            let gp = &mut self.nodes[grand_parent as usize];
            if gp.child1 == parent {
                gp.child1 = sibling;
            } else {
                gp.child2 = sibling;
            }
            self.nodes[sibling as usize].parent = grand_parent;
        }
        self.free_node(parent);
        self.nodes[leaf as usize].parent = NULL_NODE;

        self.refit(grand_parent);
    }

    /// Recompute boxes from `index` up to the root.
    fn refit(&mut self, mut index: u32) {
        while index != NULL_NODE {
            let (c1, c2) = {
                let n = &self.nodes[index as usize];
                (n.child1, n.child2)
            };
            let aabb = self.nodes[c1 as usize].aabb.union(&self.nodes[c2 as usize].aabb);
            self.nodes[index as usize].aabb = aabb;
            index = self.nodes[index as usize].parent;
        }
    }
}

impl<T: Copy> Default for DynamicTree<T> {
    fn default() -> Self {
        Self::new()
    }
}
