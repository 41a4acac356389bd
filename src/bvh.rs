use crate::aabb::Aabb;
use crate::geometry::{Intersection, Ray, Triangle};

/// Leaves are marked with `usize::MAX` child indices and reference exactly
/// one triangle by position in the (reordered) triangle vec.
#[derive(Debug)]
struct BvhNode {
    aabb: Aabb,
    left_child_index: usize,
    right_child_index: usize,
    content_index: usize,
}

const NO_CHILD: usize = usize::MAX;

/// Node arena plus root index. Built once over a triangle set, immutable
/// afterwards; a mesh mutation rebuilds from scratch.
#[derive(Debug, Default)]
pub struct BvhTree {
    nodes: Vec<BvhNode>,
    root: usize,
}

impl BvhTree {
    /// Reorders `triangles` in place so every subtree owns a contiguous
    /// range, then records one leaf per triangle.
    pub fn build(triangles: &mut [Triangle]) -> BvhTree {
        let mut nodes = Vec::with_capacity(triangles.len().saturating_mul(2));
        if triangles.is_empty() {
            return BvhTree { nodes, root: 0 };
        }
        let root = build_node(&mut nodes, triangles, 0);
        log::debug!(
            "built bvh: {} triangles, {} nodes",
            triangles.len(),
            nodes.len()
        );
        BvhTree { nodes, root }
    }

    pub fn intersect(&self, ray: &Ray, triangles: &[Triangle]) -> Option<Intersection> {
        if self.nodes.is_empty() {
            return None;
        }
        self.intersect_node(ray, triangles, self.root)
    }

    fn intersect_node(
        &self,
        ray: &Ray,
        triangles: &[Triangle],
        node_index: usize,
    ) -> Option<Intersection> {
        let node = &self.nodes[node_index];
        if !node.aabb.intersects(ray) {
            return None;
        }
        if node.left_child_index == NO_CHILD {
            return triangles[node.content_index].intersect(ray);
        }
        let left = self.intersect_node(ray, triangles, node.left_child_index);
        let right = self.intersect_node(ray, triangles, node.right_child_index);
        match (left, right) {
            (Some(a), Some(b)) => Some(if a.t <= b.t { a } else { b }),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

fn build_node(nodes: &mut Vec<BvhNode>, triangles: &mut [Triangle], offset: usize) -> usize {
    let aabb = triangles
        .iter()
        .fold(Aabb::default(), |acc, tri| acc.extend_aabb(tri.aabb()));
    if triangles.len() == 1 {
        nodes.push(BvhNode {
            aabb,
            left_child_index: NO_CHILD,
            right_child_index: NO_CHILD,
            content_index: offset,
        });
        return nodes.len() - 1;
    }
    let first_part_len = split_at_spatial_median(&aabb, triangles);
    let (left_half, right_half) = triangles.split_at_mut(first_part_len);
    let left_child = build_node(nodes, left_half, offset);
    let right_child = build_node(nodes, right_half, offset + first_part_len);
    nodes.push(BvhNode {
        aabb,
        left_child_index: left_child,
        right_child_index: right_child,
        content_index: offset,
    });
    nodes.len() - 1
}

/// Object-median split: partition by comparing each triangle's (min+max)
/// along the longest axis against the node box's own midpoint sum. A
/// one-sided partition is rebalanced by moving a single element across.
fn split_at_spatial_median(aabb: &Aabb, triangles: &mut [Triangle]) -> usize {
    let diff = aabb.max - aabb.min;
    let axis = if diff.x >= diff.y && diff.x >= diff.z {
        0
    } else if diff.y >= diff.x && diff.y >= diff.z {
        1
    } else {
        2
    };
    let pivot = aabb.centroid_key(axis);
    let mut first_part = partition_in_place(triangles, |tri| tri.aabb().centroid_key(axis) <= pivot);
    if first_part == 0 {
        first_part = 1;
    } else if first_part == triangles.len() {
        first_part -= 1;
    }
    first_part
}

/// Stable-order-free swap partition; returns the length of the part
/// satisfying the predicate.
fn partition_in_place<F>(triangles: &mut [Triangle], predicate: F) -> usize
where
    F: Fn(&Triangle) -> bool,
{
    let mut first_part = 0;
    for index in 0..triangles.len() {
        if predicate(&triangles[index]) {
            triangles.swap(first_part, index);
            first_part += 1;
        }
    }
    first_part
}
