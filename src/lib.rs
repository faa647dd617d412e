#![allow(clippy::needless_range_loop)]

mod control_net;
mod errors;
mod io;
mod knot;
mod surface;

pub mod prelude {
    pub use crate::control_net::*;
    pub use crate::errors::*;
    pub use crate::io::*;
    pub use crate::knot::*;
    pub use crate::surface::*;
    pub use crate::FloatingPoint;
}

use nalgebra::RealField;
use num_traits::ToPrimitive;

/// Trait for floating point types (f32, f64)
/// Mainly used to identify the type of the field in nalgebra
pub trait FloatingPoint: RealField + ToPrimitive + Copy {}

impl FloatingPoint for f32 {}
impl FloatingPoint for f64 {}
