use crate::graph::{EdgeId, Graph, NodeId};
use serde::{Deserialize, Serialize};

/// Pixel connectivity of the grid graph.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Neighborhood {
    /// Horizontal and vertical neighbors.
    Four,
    /// Horizontal, vertical and both diagonal neighbors.
    Eight,
}

/// Implicit graph over a `width` x `height` pixel lattice.
///
/// Node `(x, y)` has id `y * width + x`, so node maps line up with [`crate::arrays::Array2D`].
/// Edge ids are dense and grouped by direction: first all horizontal edges (row by row), then
/// vertical, then (for [`Neighborhood::Eight`]) the down-right and down-left diagonals. Inside a
/// group the id follows the position of the edge's first endpoint.
#[derive(Clone, Debug)]
pub struct GridGraph {
    width: usize,
    height: usize,
    neighborhood: Neighborhood,
    horizontal: usize,
    vertical: usize,
    diagonal: usize,
}

impl GridGraph {
    pub fn new(width: usize, height: usize, neighborhood: Neighborhood) -> Self {
        let horizontal = width.saturating_sub(1) * height;
        let vertical = width * height.saturating_sub(1);
        let diagonal = match neighborhood {
            Neighborhood::Four => 0,
            Neighborhood::Eight => width.saturating_sub(1) * height.saturating_sub(1),
        };
        Self {
            width,
            height,
            neighborhood,
            horizontal,
            vertical,
            diagonal,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn neighborhood(&self) -> Neighborhood {
        self.neighborhood
    }

    #[inline(always)]
    pub fn node_id(&self, x: usize, y: usize) -> NodeId {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    #[inline(always)]
    pub fn coordinates(&self, node: NodeId) -> (usize, usize) {
        (node % self.width, node / self.width)
    }

    /// Edge between two nodes, if they are neighbors.
    pub fn find_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.incident_edges(a).find(|e| self.opposite(*e, a) == b)
    }

    #[inline]
    fn incident(&self, x: usize, y: usize) -> [Option<EdgeId>; 8] {
        let w1 = self.width - 1;
        let has_left = x > 0;
        let has_right = x + 1 < self.width;
        let has_up = y > 0;
        let has_down = y + 1 < self.height;
        let v0 = self.horizontal;
        let dr0 = v0 + self.vertical;
        let dl0 = dr0 + self.diagonal;
        let mut out = [None; 8];
        out[0] = has_left.then(|| y * w1 + x - 1);
        out[1] = has_right.then(|| y * w1 + x);
        out[2] = has_up.then(|| v0 + (y - 1) * self.width + x);
        out[3] = has_down.then(|| v0 + y * self.width + x);
        if self.neighborhood == Neighborhood::Eight {
            out[4] = (has_right && has_down).then(|| dr0 + y * w1 + x);
            out[5] = (has_left && has_up).then(|| dr0 + (y - 1) * w1 + x - 1);
            out[6] = (has_left && has_down).then(|| dl0 + y * w1 + x - 1);
            out[7] = (has_right && has_up).then(|| dl0 + (y - 1) * w1 + x);
        }
        out
    }
}

impl Graph for GridGraph {
    fn node_count(&self) -> usize {
        self.width * self.height
    }
    fn edge_count(&self) -> usize {
        self.horizontal + self.vertical + 2 * self.diagonal
    }
    fn node_bound(&self) -> usize {
        self.node_count()
    }
    fn edge_bound(&self) -> usize {
        self.edge_count()
    }
    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        0..self.node_count()
    }
    fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        0..self.edge_count()
    }
    fn incident_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let (x, y) = self.coordinates(node);
        self.incident(x, y).into_iter().flatten()
    }
    fn has_node(&self, node: NodeId) -> bool {
        node < self.node_count()
    }
    fn u(&self, edge: EdgeId) -> NodeId {
        debug_assert!(edge < self.edge_count(), "edge {edge} out of bounds");
        let w1 = self.width - 1;
        let v0 = self.horizontal;
        let dr0 = v0 + self.vertical;
        let dl0 = dr0 + self.diagonal;
        if edge < v0 {
            self.node_id(edge % w1, edge / w1)
        } else if edge < dr0 {
            edge - v0
        } else if edge < dl0 {
            let e = edge - dr0;
            self.node_id(e % w1, e / w1)
        } else {
            let e = edge - dl0;
            self.node_id(e % w1 + 1, e / w1)
        }
    }
    fn v(&self, edge: EdgeId) -> NodeId {
        let u = self.u(edge);
        let v0 = self.horizontal;
        let dr0 = v0 + self.vertical;
        let dl0 = dr0 + self.diagonal;
        if edge < v0 {
            u + 1
        } else if edge < dr0 {
            u + self.width
        } else if edge < dl0 {
            u + self.width + 1
        } else {
            u + self.width - 1
        }
    }
}
