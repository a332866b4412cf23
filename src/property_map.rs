//! Dense per-node and per-edge value storage.
//!
//! Maps are plain vectors indexed by id and sized by the graph's `node_bound()` or `edge_bound()`,
//! so ids that are not live in the graph still have a (default) value.
use crate::arrays::Array2D;
use crate::graph::{EdgeId, Graph, NodeId};
use std::ops::{Index, IndexMut};

macro_rules! property_map {
    ($(#[$meta:meta])* $name:ident, $id:ty, $bound:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name<T> {
            data: Vec<T>,
        }

        impl<T> $name<T> {
            /// New map for every id of `graph`, all set to `value`.
            pub fn new<G: Graph>(graph: &G, value: T) -> Self
            where
                T: Clone,
            {
                Self::with_bound(graph.$bound(), value)
            }

            pub fn with_bound(bound: usize, value: T) -> Self
            where
                T: Clone,
            {
                Self {
                    data: vec![value; bound],
                }
            }

            pub fn from_vec(data: Vec<T>) -> Self {
                Self { data }
            }

            #[inline(always)]
            pub fn get(&self, id: $id) -> &T {
                &self.data[id]
            }

            #[inline(always)]
            pub fn set(&mut self, id: $id, value: T) {
                self.data[id] = value;
            }

            pub fn len(&self) -> usize {
                self.data.len()
            }

            pub fn is_empty(&self) -> bool {
                self.data.is_empty()
            }

            pub fn as_slice(&self) -> &[T] {
                &self.data
            }

            pub fn iter(&self) -> impl Iterator<Item = ($id, &T)> + '_ {
                self.data.iter().enumerate()
            }

            pub fn into_vec(self) -> Vec<T> {
                self.data
            }
        }

        impl<T> From<Vec<T>> for $name<T> {
            fn from(data: Vec<T>) -> Self {
                Self { data }
            }
        }

        impl<T> Index<$id> for $name<T> {
            type Output = T;
            #[inline(always)]
            fn index(&self, id: $id) -> &Self::Output {
                &self.data[id]
            }
        }

        impl<T> IndexMut<$id> for $name<T> {
            #[inline(always)]
            fn index_mut(&mut self, id: $id) -> &mut Self::Output {
                &mut self.data[id]
            }
        }
    };
}

property_map!(
    /// Value per node id.
    NodeMap,
    NodeId,
    node_bound
);
property_map!(
    /// Value per edge id.
    EdgeMap,
    EdgeId,
    edge_bound
);

/// Pixel values in grid node order (see [`crate::grid_graph::GridGraph`]).
impl<T: Clone> From<&Array2D<T>> for NodeMap<T> {
    fn from(array: &Array2D<T>) -> Self {
        Self::from_vec(array.as_slice().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::{EdgeMap, NodeMap};
    use crate::grid_graph::{GridGraph, Neighborhood};

    #[test]
    fn maps_are_sized_by_graph_bounds() {
        let graph = GridGraph::new(3, 2, Neighborhood::Four);
        let mut nodes = NodeMap::new(&graph, 0u32);
        let edges = EdgeMap::new(&graph, -1.0f32);
        assert_eq!(nodes.len(), 6);
        assert_eq!(edges.len(), 7);
        nodes.set(4, 7);
        nodes[5] += 1;
        assert_eq!(*nodes.get(4), 7);
        assert_eq!(nodes.iter().filter(|(_, v)| **v != 0).count(), 2);
        assert!(edges.as_slice().iter().all(|w| *w == -1.0));
    }
}
