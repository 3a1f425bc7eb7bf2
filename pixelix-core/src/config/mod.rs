//! Configuration types
//!
//! Compile-time timing policy plus the runtime settings record stored in
//! flash as postcard binary data.

pub mod settings;
pub mod timing;

pub use settings::*;
pub use timing::*;
