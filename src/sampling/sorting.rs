//! Spatial ordering of point batches along a Hilbert curve.

use crate::{
    geometry::{Bounds3, Dim3, Point3},
    num::{from_f64, BFloat},
};
use rayon::prelude::*;

/// Resolution of the quantized coordinates, giving 63-bit curve indices.
const BITS_PER_AXIS: u32 = 21;

/// Computes a permutation of the point indices that visits the points in
/// Hilbert curve order.
///
/// The coordinates are normalized to the bounding box of the points before the
/// curve index is computed. Points with the same curve index keep their
/// relative order, so the permutation is deterministic.
pub fn hilbert_order<F: BFloat>(points: &[Point3<F>]) -> Vec<usize> {
    let bounds = match Bounds3::enclosing(points) {
        Some(bounds) if points.len() > 1 => bounds,
        _ => return (0..points.len()).collect(),
    };

    let mut keyed_indices: Vec<(u64, usize)> = points
        .par_iter()
        .enumerate()
        .map(|(idx, point)| {
            let coordinates = quantize(point, &bounds);
            (hilbert_index(coordinates, BITS_PER_AXIS), idx)
        })
        .collect();

    keyed_indices.par_sort_unstable();
    keyed_indices.into_iter().map(|(_, idx)| idx).collect()
}

/// Maps a point onto the integer lattice `[0, 2^BITS_PER_AXIS)` spanning the box.
fn quantize<F: BFloat>(point: &Point3<F>, bounds: &Bounds3<F>) -> [u32; 3] {
    let max_coordinate: F = from_f64(((1_u64 << BITS_PER_AXIS) - 1) as f64);
    let extent = bounds.extent();
    let mut coordinates = [0; 3];
    for dim in Dim3::slice() {
        if extent[dim] > F::zero() {
            let normalized = (point[dim] - bounds.lower()[dim]) / extent[dim];
            coordinates[dim.num()] = (normalized * max_coordinate)
                .round()
                .to_u32()
                .unwrap_or(0);
        }
    }
    coordinates
}

/// Computes the position of the given lattice coordinates along the
/// three-dimensional Hilbert curve with the given number of bits per axis.
///
/// Uses Skilling's transpose algorithm, followed by interleaving the bits of
/// the transposed coordinates from most to least significant.
pub fn hilbert_index(coordinates: [u32; 3], bits: u32) -> u64 {
    assert!(
        bits > 0 && 3 * bits <= 64,
        "Invalid number of bits per axis for Hilbert index"
    );
    let mut x = coordinates;
    let highest = 1_u32 << (bits - 1);

    // Inverse undo of the excess work
    let mut q = highest;
    while q > 1 {
        let p = q - 1;
        for i in 0..3 {
            if x[i] & q != 0 {
                x[0] ^= p;
            } else {
                let t = (x[0] ^ x[i]) & p;
                x[0] ^= t;
                x[i] ^= t;
            }
        }
        q >>= 1;
    }

    // Gray encode
    for i in 1..3 {
        x[i] ^= x[i - 1];
    }
    let mut t = 0;
    let mut q = highest;
    while q > 1 {
        if x[2] & q != 0 {
            t ^= q - 1;
        }
        q >>= 1;
    }
    for component in x.iter_mut() {
        *component ^= t;
    }

    let mut index = 0_u64;
    for bit in (0..bits).rev() {
        for component in x {
            index = (index << 1) | u64::from((component >> bit) & 1);
        }
    }
    index
}
