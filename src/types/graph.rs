//! Final track graph
//!
//! Nodes are the spots of the run; edges are either frame-to-frame links
//! inside a segment or reconciliation edges (gap closing, merging,
//! splitting) between segments. Edges always point forward in time.

use smallvec::SmallVec;

use super::spot::{Spot, SpotCollection, SpotRef};

/// Origin of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Frame-to-frame link inside a segment
    Link,
    /// Segment end to a later segment start
    GapClosing,
    /// Segment end into the middle of another segment
    Merging,
    /// Middle of a segment to another segment start
    Splitting,
}

/// Directed edge between two spots
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: SpotRef,
    pub target: SpotRef,
    pub kind: EdgeKind,
    /// Cost of the assignment that produced the edge
    pub cost: f64,
}

type Adjacency = SmallVec<[usize; 2]>;

/// Directed spot graph handed to downstream consumers.
#[derive(Debug, Clone)]
pub struct TrackGraph {
    spots: SpotCollection,
    edges: Vec<Edge>,
    outgoing: Vec<Adjacency>,
    incoming: Vec<Adjacency>,
}

impl TrackGraph {
    /// Graph with every spot as an isolated node.
    pub fn new(spots: SpotCollection) -> Self {
        let n = spots.len();
        Self {
            spots,
            edges: Vec::new(),
            outgoing: vec![Adjacency::new(); n],
            incoming: vec![Adjacency::new(); n],
        }
    }

    /// Add an edge. The target must be strictly later than the source.
    pub(crate) fn add_edge(&mut self, source: SpotRef, target: SpotRef, kind: EdgeKind, cost: f64) {
        debug_assert!(self.spots.get(target).frame() > self.spots.get(source).frame());
        let id = self.edges.len();
        self.edges.push(Edge {
            source,
            target,
            kind,
            cost,
        });
        self.outgoing[source.0].push(id);
        self.incoming[target.0].push(id);
    }

    /// Underlying spots
    pub fn spots(&self) -> &SpotCollection {
        &self.spots
    }

    #[inline]
    pub fn spot(&self, spot: SpotRef) -> &Spot {
        self.spots.get(spot)
    }

    /// Look up a spot by its detector id.
    pub fn find_spot(&self, id: u64) -> Option<SpotRef> {
        self.spots
            .iter()
            .find(|(_, spot)| spot.id() == id)
            .map(|(r, _)| r)
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Edges of one kind
    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Outgoing edges of a spot
    pub fn outgoing(&self, spot: SpotRef) -> impl Iterator<Item = &Edge> {
        self.outgoing[spot.0].iter().map(move |&e| &self.edges[e])
    }

    /// Incoming edges of a spot
    pub fn incoming(&self, spot: SpotRef) -> impl Iterator<Item = &Edge> {
        self.incoming[spot.0].iter().map(move |&e| &self.edges[e])
    }

    /// Spots reached by outgoing edges
    pub fn successors(&self, spot: SpotRef) -> impl Iterator<Item = SpotRef> + '_ {
        self.outgoing(spot).map(|e| e.target)
    }

    /// Spots reached by incoming edges
    pub fn predecessors(&self, spot: SpotRef) -> impl Iterator<Item = SpotRef> + '_ {
        self.incoming(spot).map(|e| e.source)
    }

    /// Whether an edge `source -> target` exists
    pub fn has_edge(&self, source: SpotRef, target: SpotRef) -> bool {
        self.successors(source).any(|t| t == target)
    }

    /// Weakly connected components, each sorted by frame then spot id.
    ///
    /// Components are ordered by their earliest spot. Isolated spots form
    /// single-spot tracks.
    pub fn tracks(&self) -> Vec<Vec<SpotRef>> {
        let n = self.spots.len();
        let mut visited = vec![false; n];
        let mut tracks = Vec::new();
        let mut stack = Vec::new();

        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            stack.push(start);
            let mut track = Vec::new();

            while let Some(current) = stack.pop() {
                track.push(SpotRef(current));
                let neighbours = self.outgoing[current]
                    .iter()
                    .map(|&e| self.edges[e].target.0)
                    .chain(self.incoming[current].iter().map(|&e| self.edges[e].source.0));
                for next in neighbours {
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }

            track.sort_by_key(|&r| (self.spots.get(r).frame(), self.spots.get(r).id()));
            tracks.push(track);
        }

        tracks
    }

    /// Consume the graph and return its spots.
    pub fn into_spots(self) -> SpotCollection {
        self.spots
    }
}
