//! Directed orbit graphs.
//!
//! Every vertex has exactly one outgoing edge, to its image; self-loops are
//! allowed. Vertices are stored in insertion order with a hash index, so the
//! same graph type serves rational points and points mod p.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::debug;

use crate::error::Result;
use crate::space::{Endomorphism, ProjectivePoint};

/// Index of a vertex in a `CycleGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

#[derive(Clone, Debug)]
pub struct CycleGraph<V> {
    vertices: Vec<V>,
    index: HashMap<V, VertexId>,
    // None only while the image has not been inserted yet.
    succ: Vec<Option<VertexId>>,
}

impl<V: Clone + Eq + Hash> Default for CycleGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Eq + Hash> CycleGraph<V> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            index: HashMap::new(),
            succ: Vec::new(),
        }
    }

    fn intern(&mut self, v: V) -> VertexId {
        if let Some(id) = self.index.get(&v) {
            return *id;
        }
        let id = VertexId(self.vertices.len());
        self.vertices.push(v.clone());
        self.succ.push(None);
        self.index.insert(v, id);
        id
    }

    /// Add `from -> to`, creating either vertex as needed. A second edge out of
    /// `from` replaces the first.
    pub fn insert_edge(&mut self, from: V, to: V) {
        let a = self.intern(from);
        let b = self.intern(to);
        self.succ[a.0] = Some(b);
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    pub fn id(&self, v: &V) -> Option<VertexId> {
        self.index.get(v).copied()
    }

    pub fn vertex(&self, id: VertexId) -> &V {
        &self.vertices[id.0]
    }

    /// Image of `v`, if `v` is a vertex whose edge has been inserted.
    pub fn successor(&self, v: &V) -> Option<&V> {
        let id = self.id(v)?;
        self.succ[id.0].map(|s| &self.vertices[s.0])
    }

    pub fn predecessors(&self, v: &V) -> Vec<&V> {
        let Some(id) = self.id(v) else {
            return Vec::new();
        };
        self.succ
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Some(id))
            .map(|(i, _)| &self.vertices[i])
            .collect()
    }

    /// True when every vertex has its outgoing edge.
    pub fn is_total(&self) -> bool {
        self.succ.iter().all(Option::is_some)
    }

    /// All edges as `(from, to)` pairs in vertex order.
    pub fn edges(&self) -> impl Iterator<Item = (&V, &V)> {
        self.succ
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|t| (&self.vertices[i], &self.vertices[t.0])))
    }

    /// The cycles of the graph, each listed from its first-inserted vertex.
    pub fn cycles(&self) -> Vec<Vec<&V>> {
        // 0 = unvisited, 1 = on current path, 2 = finished.
        let mut state = vec![0u8; self.vertices.len()];
        let mut out = Vec::new();
        for start in 0..self.vertices.len() {
            if state[start] != 0 {
                continue;
            }
            let mut path = Vec::new();
            let mut cur = Some(start);
            while let Some(c) = cur {
                if state[c] != 0 {
                    if state[c] == 1 {
                        let pos = path.iter().position(|&x| x == c).unwrap_or(0);
                        let mut cyc: Vec<usize> = path[pos..].to_vec();
                        if let Some((min_pos, _)) = cyc.iter().enumerate().min_by_key(|(_, v)| **v) {
                            cyc.rotate_left(min_pos);
                        }
                        out.push(cyc.into_iter().map(|i| &self.vertices[i]).collect());
                    }
                    break;
                }
                state[c] = 1;
                path.push(c);
                cur = self.succ[c].map(|s| s.0);
            }
            for c in path {
                state[c] = 2;
            }
        }
        out
    }
}

impl<V: Clone + Eq + Hash + fmt::Display> fmt::Display for CycleGraph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (a, b) in self.edges() {
            writeln!(f, "{a} -> {b}")?;
        }
        Ok(())
    }
}

/// Orbit graph of `points` under `f`. Images missing from the input become
/// vertices too and are processed in turn, so the result is always total.
pub fn cyclegraph(points: &[ProjectivePoint], f: &Endomorphism) -> Result<CycleGraph<ProjectivePoint>> {
    let mut g = CycleGraph::new();
    let mut pending: Vec<ProjectivePoint> = points.iter().rev().map(ProjectivePoint::normalize).collect();
    while let Some(p) = pending.pop() {
        if g.id(&p).is_some_and(|id| g.succ[id.0].is_some()) {
            continue;
        }
        let image = f.apply(&p)?;
        let fresh = g.id(&image).is_none();
        g.insert_edge(p, image.clone());
        if fresh {
            pending.push(image);
        }
    }
    debug!(inputs = points.len(), vertices = g.len(), "cyclegraph");
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::parse_point;

    fn quadratic_29_16() -> Endomorphism {
        Endomorphism::parse(&["x", "y"], &["x^2 - 29/16*y^2", "y^2"]).unwrap()
    }

    #[test]
    fn fixed_point_is_a_self_loop() {
        let f = quadratic_29_16();
        let inf = parse_point("(1 : 0)").unwrap();
        let g = cyclegraph(std::slice::from_ref(&inf), &f).unwrap();
        assert_eq!(g.len(), 1);
        assert_eq!(g.successor(&inf), Some(&inf));
        assert_eq!(g.cycles(), vec![vec![&inf]]);
        assert_eq!(g.to_string(), "(1 : 0) -> (1 : 0)\n");
    }

    #[test]
    fn missing_images_are_added() {
        let f = quadratic_29_16();
        let seeds = vec![parse_point("(3/4 : 1)").unwrap()];
        let g = cyclegraph(&seeds, &f).unwrap();
        // 3/4 -> -5/4 -> -1/4 -> -7/4 -> 5/4 -> -1/4
        assert_eq!(g.len(), 5);
        assert!(g.is_total());
        assert_eq!(g.edges().count(), 5);
        let cycles = g.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
        assert_eq!(*cycles[0][0], parse_point("(-1/4 : 1)").unwrap());
        let preds = g.predecessors(&parse_point("(-1/4 : 1)").unwrap());
        assert_eq!(preds.len(), 2);
    }

    #[test]
    fn duplicate_inputs_collapse() {
        let f = quadratic_29_16();
        let seeds = vec![
            parse_point("(5/4 : 1)").unwrap(),
            parse_point("(10 : 8)").unwrap(),
            parse_point("(-1/4 : 1)").unwrap(),
        ];
        let g = cyclegraph(&seeds, &f).unwrap();
        assert_eq!(g.len(), 3);
        assert!(g.edges().all(|(a, b)| f.apply(a).unwrap() == *b));
    }

    #[test]
    fn manual_edges() {
        let mut g: CycleGraph<u32> = CycleGraph::default();
        g.insert_edge(1, 2);
        assert!(!g.is_total());
        g.insert_edge(2, 1);
        g.insert_edge(3, 3);
        assert!(g.is_total());
        assert_eq!(g.cycles(), vec![vec![&1, &2], vec![&3]]);
        assert_eq!(g.predecessors(&9), Vec::<&u32>::new());
        assert_eq!(g.vertex(g.id(&3).unwrap()), &3);
    }
}
