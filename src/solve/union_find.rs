//! A disjoint-set structure over dots which can undo its most recent operations.  The solver adds
//! one entry per `on` edge and rolls entries back in reverse order while backtracking, so there is
//! no path compression (that would make undoing far more complicated).
//!
//! While every dot has at most two edges, each component is a path or a cycle.  The two ends of
//! every path know about each other, so the solver can find the far end of a path in constant
//! time.

use crate::indexed_vec::{DotIdx, DotVec};

/// What happened when an edge was added
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Join {
    /// The edge joined two separate paths into one, whose ends are `ends`
    Merged { ends: [DotIdx; 2] },
    /// Both ends of the edge were already connected, so the edge closed a cycle.  The component
    /// now contains `num_edges` edges.
    Closed { num_edges: usize },
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Merged {
        child: DotIdx,
        root: DotIdx,
        /// The new path ends, along with the partners they had before the merge
        ends: [(DotIdx, DotIdx); 2],
    },
    Closed { root: DotIdx },
}

#[derive(Debug, Clone)]
pub(super) struct UndoUnionFind {
    parent: DotVec<Option<DotIdx>>,
    /// Number of dots in the component rooted here (only meaningful for roots)
    num_dots: DotVec<usize>,
    /// Number of edges in the component rooted here (only meaningful for roots)
    num_edges: DotVec<usize>,
    /// The dot at the other end of the path ending here.  Lone dots are their own partner.
    ///
    /// Invariant: correct for every dot with fewer than two edges, as long as no dot has more than
    /// two.  Entries for dots in the middle of a path are stale.
    partner: DotVec<DotIdx>,
    history: Vec<Op>,
}

impl UndoUnionFind {
    pub fn new(num_dots: usize) -> Self {
        Self {
            parent: DotVec::repeat(None, num_dots),
            num_dots: DotVec::repeat(1, num_dots),
            num_edges: DotVec::repeat(0, num_dots),
            partner: DotVec::from_fn(num_dots, |dot| dot),
            history: Vec::new(),
        }
    }

    pub fn find(&self, mut dot: DotIdx) -> DotIdx {
        while let Some(parent) = self.parent[dot] {
            dot = parent;
        }
        dot
    }

    /// Number of edges in the component containing `dot`
    pub fn component_edges(&self, dot: DotIdx) -> usize {
        self.num_edges[self.find(dot)]
    }

    /// The other end of the path which ends at `dot`.  Only meaningful if `dot` has exactly one
    /// edge.
    pub fn partner(&self, dot: DotIdx) -> DotIdx {
        self.partner[dot]
    }

    /// Records an edge between `a` and `b`
    pub fn add_edge(&mut self, a: DotIdx, b: DotIdx) -> Join {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            self.num_edges[root_a] += 1;
            self.history.push(Op::Closed { root: root_a });
            return Join::Closed {
                num_edges: self.num_edges[root_a],
            };
        }
        // Union by size keeps the trees shallow without needing path compression
        let (child, root) = if self.num_dots[root_a] < self.num_dots[root_b] {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        self.parent[child] = Some(root);
        self.num_dots[root] += self.num_dots[child];
        self.num_edges[root] += self.num_edges[child] + 1;

        let (end_a, end_b) = (self.partner[a], self.partner[b]);
        let ends = [(end_a, self.partner[end_a]), (end_b, self.partner[end_b])];
        self.partner[end_a] = end_b;
        self.partner[end_b] = end_a;
        self.history.push(Op::Merged { child, root, ends });
        Join::Merged {
            ends: [end_a, end_b],
        }
    }

    /// Reverts the most recent [`Self::add_edge`]
    pub fn undo(&mut self) {
        match self.history.pop() {
            Some(Op::Closed { root }) => {
                self.num_edges[root] -= 1;
            }
            Some(Op::Merged { child, root, ends }) => {
                self.parent[child] = None;
                self.num_dots[root] -= self.num_dots[child];
                self.num_edges[root] -= self.num_edges[child] + 1;
                for (dot, partner) in ends.into_iter().rev() {
                    self.partner[dot] = partner;
                }
            }
            None => panic!("union-find undo with empty history"),
        }
    }

    #[cfg(test)]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
