pub mod analyze;
pub mod health;
pub mod index;

pub use analyze::*;
pub use health::*;
pub use index::*;
