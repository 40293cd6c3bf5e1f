use std::fmt;

use crate::error::MeshError;
use crate::mesh::reference_element::ReferenceElement;

/// A named group of elements sharing one reference element.
///
/// The node table is stored flat, `num_nodes()` entries per element, in the
/// local node order of the reference element.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGroup {
    pub reference_element: ReferenceElement,
    node_ids: Vec<usize>,
    pub tag: i32,
    pub name: String,
}

impl CellGroup {
    pub fn new(
        reference_element: ReferenceElement,
        node_ids: Vec<usize>,
        tag: i32,
        name: &str,
    ) -> Result<CellGroup, MeshError> {
        let nodes_per_element = reference_element.num_nodes();
        if node_ids.len() % nodes_per_element != 0 {
            return Err(MeshError::RaggedNodeTable {
                group: name.to_string(),
                len: node_ids.len(),
                nodes_per_element,
            });
        }
        Ok(CellGroup {
            reference_element,
            node_ids,
            tag,
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.node_ids.len() / self.reference_element.num_nodes()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    pub fn topo_dim(&self) -> usize {
        self.reference_element.topo_dim()
    }

    /// Global node ids of one element, in local node order.
    pub fn element(&self, index: usize) -> &[usize] {
        let n = self.reference_element.num_nodes();
        &self.node_ids[index * n..(index + 1) * n]
    }

    pub fn elements(&self) -> impl Iterator<Item = &[usize]> {
        self.node_ids.chunks(self.reference_element.num_nodes())
    }

    /// Global node pairs of the edges of one element, in canonical order.
    pub fn element_edges<'a>(&'a self, index: usize) -> impl Iterator<Item = [usize; 2]> + 'a {
        let element = self.element(index);
        self.reference_element
            .entities(1)
            .iter()
            .map(move |edge| [element[edge.nodes[0]], element[edge.nodes[1]]])
    }

    pub(crate) fn check_node_range(&self, num_nodes: usize) -> Result<(), MeshError> {
        for (element, ids) in self.elements().enumerate() {
            if let Some(&node) = ids.iter().find(|&&id| id >= num_nodes) {
                return Err(MeshError::NodeOutOfRange {
                    group: self.name.clone(),
                    element,
                    node,
                    num_nodes,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for CellGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (tag {}): {} x {}",
            self.name,
            self.tag,
            self.len(),
            self.reference_element
        )
    }
}
