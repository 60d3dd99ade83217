//! Utilities related to numbers.

use std::{cmp, fmt, iter};

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat:
    Sync
    + Send
    + num::Float
    + num::cast::FromPrimitive
    + fmt::Debug
    + fmt::Display
    + iter::Sum
{
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Converts the given `f64` into the floating point type `F`.
pub fn from_f64<F: BFloat>(value: f64) -> F {
    F::from_f64(value).expect("Conversion failed")
}

/// Converts the given `usize` into the floating point type `F`.
pub fn from_usize<F: BFloat>(value: usize) -> F {
    F::from_usize(value).expect("Conversion failed")
}

/// Integer-float pair that can be ordered based on the float.
pub struct OrderableIndexValuePair<I: num::Integer, F: BFloat>(pub I, pub F);

impl<I: num::Integer, F: BFloat> PartialEq for OrderableIndexValuePair<I, F> {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

impl<I: num::Integer, F: BFloat> PartialOrd for OrderableIndexValuePair<I, F> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.1.partial_cmp(&other.1)
    }
}

impl<I: num::Integer, F: BFloat> Eq for OrderableIndexValuePair<I, F> {}

impl<I: num::Integer, F: BFloat> Ord for OrderableIndexValuePair<I, F> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.partial_cmp(other)
            .expect("NaN in floating point comparison.")
    }
}
