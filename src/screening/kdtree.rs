//! Static 3-D k-d tree over positions in km.
//!
//! Points are stored in one buffer, reordered at build time so that every
//! subslice is a subtree with its splitting point at the middle. Each point
//! carries the caller's index, which is what queries return.

use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<([f64; 3], usize)>,
}

impl KdTree {
    /// Build from `(position, index)` pairs. Non-finite positions are
    /// dropped since they cannot be ordered.
    pub fn new(points: impl IntoIterator<Item = ([f64; 3], usize)>) -> Self {
        let mut nodes: Vec<_> = points
            .into_iter()
            .filter(|(p, _)| p.iter().all(|c| c.is_finite()))
            .collect();
        build(&mut nodes, 0);
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indices of all points within `radius_km` of `query` (inclusive), in
    /// ascending order.
    pub fn within_radius(&self, query: [f64; 3], radius_km: f64) -> Vec<usize> {
        let mut found = Vec::new();
        if radius_km >= 0.0 {
            search(&self.nodes, 0, query, radius_km, &mut found);
        }
        found.sort_unstable();
        found
    }

    /// Every unordered pair `(i, j)` with `i < j` whose points lie within
    /// `radius_km` of each other, sorted.
    pub fn pairs_within(&self, radius_km: f64) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (point, i) in &self.nodes {
            for j in self.within_radius(*point, radius_km) {
                if *i < j {
                    pairs.push((*i, j));
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }
}

fn build(nodes: &mut [([f64; 3], usize)], depth: usize) {
    if nodes.len() <= 1 {
        return;
    }
    let axis = depth % 3;
    let mid = nodes.len() / 2;
    nodes.select_nth_unstable_by(mid, |a, b| {
        a.0[axis].partial_cmp(&b.0[axis]).unwrap_or(Ordering::Equal)
    });
    let (left, rest) = nodes.split_at_mut(mid);
    build(left, depth + 1);
    build(&mut rest[1..], depth + 1);
}

fn search(
    nodes: &[([f64; 3], usize)],
    depth: usize,
    query: [f64; 3],
    radius_km: f64,
    found: &mut Vec<usize>,
) {
    if nodes.is_empty() {
        return;
    }
    let axis = depth % 3;
    let mid = nodes.len() / 2;
    let (point, index) = nodes[mid];

    if distance_squared(point, query) <= radius_km * radius_km {
        found.push(index);
    }

    let delta = query[axis] - point[axis];
    let (near, far) = if delta <= 0.0 {
        (&nodes[..mid], &nodes[mid + 1..])
    } else {
        (&nodes[mid + 1..], &nodes[..mid])
    };
    search(near, depth + 1, query, radius_km, found);
    if delta.abs() <= radius_km {
        search(far, depth + 1, query, radius_km, found);
    }
}

fn distance_squared(a: [f64; 3], b: [f64; 3]) -> f64 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    d[0] * d[0] + d[1] * d[1] + d[2] * d[2]
}
