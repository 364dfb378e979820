//! Pure calculation and normalization logic, no I/O.

pub mod money;
pub mod normalize;
