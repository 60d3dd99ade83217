//! Unstructured simplex meshes with face adjacency.

use crate::{
    geometry::{Bounds3, Point3},
    num::BFloat,
};
use std::collections::{hash_map::Entry, HashMap};

/// Mesh of four-node tetrahedral cells.
pub type TetrahedralMesh<F> = Mesh<F, 4>;

/// Mesh of three-node triangular cells.
pub type TriangularMesh<F> = Mesh<F, 3>;

/// An unstructured mesh of `N`-node simplex cells.
///
/// Local face `i` of a cell is the face opposite to the cell's local node `i`.
/// The neighbour across each face is stored in a flat table indexed by cell,
/// with `None` for faces on the mesh boundary.
#[derive(Clone, Debug)]
pub struct Mesh<F: BFloat, const N: usize> {
    nodes: Vec<Point3<F>>,
    cells: Vec<[usize; N]>,
    neighbors: Vec<[Option<usize>; N]>,
    bounds: Bounds3<F>,
}

impl<F: BFloat, const N: usize> Mesh<F, N> {
    /// Creates a new mesh from the given node positions and cell node indices,
    /// deriving the face adjacency from faces shared between cells.
    ///
    /// # Panics
    ///
    /// If there are no nodes or cells, or a cell refers to a non-existent node.
    pub fn new(nodes: Vec<Point3<F>>, cells: Vec<[usize; N]>) -> Self {
        Self::validate_cells(&nodes, &cells);
        let neighbors = compute_face_neighbors(&cells);
        Self::from_parts(nodes, cells, neighbors)
    }

    /// Creates a new mesh with a face adjacency table supplied by the mesh generator.
    ///
    /// # Panics
    ///
    /// If there are no nodes or cells, a cell refers to a non-existent node, the
    /// adjacency table length differs from the number of cells, or a neighbour
    /// index is out of range.
    pub fn with_neighbors(
        nodes: Vec<Point3<F>>,
        cells: Vec<[usize; N]>,
        neighbors: Vec<[Option<usize>; N]>,
    ) -> Self {
        Self::validate_cells(&nodes, &cells);
        assert_eq!(
            neighbors.len(),
            cells.len(),
            "Adjacency table length differs from number of cells"
        );
        let n_cells = cells.len();
        assert!(
            neighbors
                .iter()
                .flatten()
                .flatten()
                .all(|&neighbor| neighbor < n_cells),
            "Neighbour cell index out of range"
        );
        Self::from_parts(nodes, cells, neighbors)
    }

    fn validate_cells(nodes: &[Point3<F>], cells: &[[usize; N]]) {
        assert!(N >= 3, "Cells must have at least three nodes");
        assert!(!nodes.is_empty(), "Mesh has no nodes");
        assert!(!cells.is_empty(), "Mesh has no cells");
        let n_nodes = nodes.len();
        for (cell_idx, cell) in cells.iter().enumerate() {
            assert!(
                cell.iter().all(|&node| node < n_nodes),
                "Cell {} refers to node outside range [0, {})",
                cell_idx,
                n_nodes
            );
        }
    }

    fn from_parts(
        nodes: Vec<Point3<F>>,
        cells: Vec<[usize; N]>,
        neighbors: Vec<[Option<usize>; N]>,
    ) -> Self {
        let bounds = Bounds3::enclosing(&nodes).expect("Mesh has no nodes");
        Self {
            nodes,
            cells,
            neighbors,
            bounds,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn nodes(&self) -> &[Point3<F>] {
        &self.nodes
    }

    pub fn cells(&self) -> &[[usize; N]] {
        &self.cells
    }

    /// Returns the node indices of the given cell.
    pub fn cell_nodes(&self, cell: usize) -> &[usize; N] {
        &self.cells[cell]
    }

    /// Returns the node positions of the given cell.
    pub fn cell_vertices(&self, cell: usize) -> [Point3<F>; N] {
        let nodes = &self.cells[cell];
        std::array::from_fn(|local| self.nodes[nodes[local]])
    }

    /// Returns the neighbours across each local face of the given cell.
    pub fn neighbors(&self, cell: usize) -> &[Option<usize>; N] {
        &self.neighbors[cell]
    }

    /// Returns the bounding box of the mesh nodes.
    pub fn bounds(&self) -> &Bounds3<F> {
        &self.bounds
    }
}

/// Finds the neighbour across every local face by matching the sorted node
/// indices of faces. Faces shared by more than two cells are linked only
/// between the first two cells encountered.
fn compute_face_neighbors<const N: usize>(cells: &[[usize; N]]) -> Vec<[Option<usize>; N]> {
    let mut neighbors = vec![[None; N]; cells.len()];
    let mut open_faces: HashMap<Vec<usize>, (usize, usize)> = HashMap::with_capacity(cells.len() * N);

    for (cell_idx, cell) in cells.iter().enumerate() {
        for face in 0..N {
            let mut key: Vec<usize> = (0..N)
                .filter(|&local| local != face)
                .map(|local| cell[local])
                .collect();
            key.sort_unstable();

            match open_faces.entry(key) {
                Entry::Occupied(entry) => {
                    let (other_idx, other_face) = entry.remove();
                    neighbors[cell_idx][face] = Some(other_idx);
                    neighbors[other_idx][other_face] = Some(cell_idx);
                }
                Entry::Vacant(entry) => {
                    entry.insert((cell_idx, face));
                }
            }
        }
    }
    neighbors
}

#[cfg(test)]
pub(crate) mod test_meshes {
    use super::*;

    /// Single tetrahedron with corners at the origin and the three unit vectors.
    pub fn unit_tetrahedron() -> TetrahedralMesh<f64> {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 1, 2, 3]],
        )
    }

    /// The unit tetrahedron and a second tetrahedron sharing its slanted face.
    pub fn two_tetrahedra_sharing_face() -> TetrahedralMesh<f64> {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 1.0, 1.0),
            ],
            vec![[0, 1, 2, 3], [1, 2, 3, 4]],
        )
    }

    /// Unit cube divided into `n^3` sub-cubes of six tetrahedra each.
    pub fn box_tetrahedral_mesh(n: usize) -> TetrahedralMesh<f64> {
        let n_side = n + 1;
        let spacing = 1.0 / n as f64;
        let node_idx = |i: usize, j: usize, k: usize| i + n_side * (j + n_side * k);

        let mut nodes = Vec::with_capacity(n_side * n_side * n_side);
        for k in 0..n_side {
            for j in 0..n_side {
                for i in 0..n_side {
                    nodes.push(Point3::new(
                        i as f64 * spacing,
                        j as f64 * spacing,
                        k as f64 * spacing,
                    ));
                }
            }
        }

        const AXIS_ORDERS: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let mut cells = Vec::with_capacity(6 * n * n * n);
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    for order in AXIS_ORDERS {
                        let mut corner = [i, j, k];
                        let mut cell = [node_idx(i, j, k); 4];
                        for (step, &axis) in order.iter().enumerate() {
                            corner[axis] += 1;
                            cell[step + 1] = node_idx(corner[0], corner[1], corner[2]);
                        }
                        cells.push(cell);
                    }
                }
            }
        }
        Mesh::new(nodes, cells)
    }

    /// Unit square in the xy-plane split into two triangles.
    pub fn unit_square_triangles() -> TriangularMesh<f64> {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }
}
