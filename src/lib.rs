//! The `meshfield` crate locates points in unstructured tetrahedral and
//! triangular meshes and samples piecewise linear fields at them.

pub mod error;

pub mod geometry;
pub mod interpolation;
pub mod io;
pub mod mesh;
pub mod num;
pub mod sampling;
pub mod tracking;

#[cfg(feature = "cli")]
pub mod cli;
