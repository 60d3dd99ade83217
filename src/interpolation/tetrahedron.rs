//! Barycentric coordinates for four-node tetrahedral cells.

use super::{barycentric::Cofactors, CellShape};
use crate::{
    geometry::{Dim3::*, Point3},
    num::BFloat,
};

/// Linear tetrahedral cell.
#[derive(Clone, Copy, Debug)]
pub struct Tetrahedron;

impl CellShape<4> for Tetrahedron {
    const VTK_CELL_TYPE: u8 = 10;
    const NAME: &'static str = "tetrahedral";

    fn compute_cofactors<F: BFloat>(vertices: &[Point3<F>; 4]) -> (F, [Cofactors<F>; 4]) {
        // Rows of the matrix whose determinant is six times the signed volume
        let rows: [[F; 4]; 4] = std::array::from_fn(|node| {
            let vertex = &vertices[node];
            [vertex[X], vertex[Y], vertex[Z], F::one()]
        });

        // Replacing row i with (x, y, z, 1) and expanding along that row gives
        // the cofactors of row i
        let cofactors: [Cofactors<F>; 4] = std::array::from_fn(|row| {
            Cofactors(std::array::from_fn(|column| {
                let minor = det3(std::array::from_fn(|minor_row| {
                    let full_row = &rows[skip_index(minor_row, row)];
                    std::array::from_fn(|minor_column| full_row[skip_index(minor_column, column)])
                }));
                if (row + column) % 2 == 0 {
                    minor
                } else {
                    -minor
                }
            }))
        });

        let main: F = rows[0]
            .iter()
            .zip(cofactors[0].0.iter())
            .map(|(&element, &cofactor)| element * cofactor)
            .sum();

        (main, cofactors)
    }
}

/// Maps an index into a list with one entry removed onto the full list.
fn skip_index(idx: usize, skipped: usize) -> usize {
    if idx < skipped {
        idx
    } else {
        idx + 1
    }
}

fn det3<F: BFloat>(m: [[F; 3]; 3]) -> F {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}
