#![warn(clippy::all, clippy::cargo)]

mod arena;
mod bitwise;
mod cells;
mod dense_set;
mod fixed_vec;
mod node;
mod universe;

pub use arena::Arena;
pub use bitwise::{bit, full_add, half_add};
pub use cells::Cells;
pub use dense_set::{DenseSet, Emplace, SetKey};
pub use fixed_vec::FixedVec;
pub use node::{Macrocell, NodeIdx};
pub use universe::Universe;

pub const VERSION: &str = "1.0";
