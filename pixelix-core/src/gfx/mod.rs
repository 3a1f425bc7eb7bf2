//! Display surface and fade effects

pub mod fade;
pub mod frame;

pub use fade::*;
pub use frame::*;
