pub mod answers;
pub mod questions;
pub mod unlocks;

pub use answers::*;
pub use questions::*;
pub use unlocks::*;
