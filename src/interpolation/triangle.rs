//! Barycentric coordinates for three-node triangular cells.
//!
//! A point is mapped onto the triangle plane by orthogonal projection before
//! its barycentric coordinates are computed, so the coordinates are only
//! meaningful for points close to the surface.

use super::{barycentric::Cofactors, CellShape};
use crate::{
    geometry::{Dim3::*, Point3, Vec3},
    num::BFloat,
};

/// Linear triangular surface cell.
#[derive(Clone, Copy, Debug)]
pub struct Triangle;

impl CellShape<3> for Triangle {
    const VTK_CELL_TYPE: u8 = 5;
    const NAME: &'static str = "triangular";

    fn compute_cofactors<F: BFloat>(vertices: &[Point3<F>; 3]) -> (F, [Cofactors<F>; 3]) {
        let origin = vertices[0].to_vec3();
        let edge_1 = &vertices[1] - &vertices[0];
        let edge_2 = &vertices[2] - &vertices[0];
        let normal = edge_1.cross(&edge_2);

        // Squared norm of the normal, four times the squared area
        let main = normal.squared_length();

        let gradient_1 = edge_2.cross(&normal);
        let gradient_2 = normal.cross(&edge_1);

        let cofactors_1 = homogeneous(&gradient_1, -gradient_1.dot(&origin));
        let cofactors_2 = homogeneous(&gradient_2, -gradient_2.dot(&origin));
        let cofactors_0 = homogeneous(
            &(-(gradient_1 + gradient_2)),
            main + gradient_1.dot(&origin) + gradient_2.dot(&origin),
        );

        (main, [cofactors_0, cofactors_1, cofactors_2])
    }
}

fn homogeneous<F: BFloat>(gradient: &Vec3<F>, constant: F) -> Cofactors<F> {
    Cofactors([gradient[X], gradient[Y], gradient[Z], constant])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn weights(vertices: &[Point3<f64>; 3], point: &Point3<f64>) -> [f64; 3] {
        let (main, cofactors) = Triangle::compute_cofactors(vertices);
        std::array::from_fn(|node| cofactors[node].evaluate(point) / main)
    }

    #[test]
    fn weights_are_unit_at_vertices() {
        let vertices = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(2.0, 0.5, 1.2),
            Point3::new(0.3, 1.5, 0.8),
        ];
        for (node, vertex) in vertices.iter().enumerate() {
            let weights = weights(&vertices, vertex);
            for (other, &weight) in weights.iter().enumerate() {
                let expected = if other == node { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(weight, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn points_off_the_plane_are_projected() {
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let in_plane = weights(&vertices, &Point3::new(0.2, 0.3, 0.0));
        let above = weights(&vertices, &Point3::new(0.2, 0.3, 5.0));
        assert_abs_diff_eq!(in_plane[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(in_plane[1], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(in_plane[2], 0.3, epsilon = 1e-12);
        for (a, b) in in_plane.iter().zip(above.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }
}
