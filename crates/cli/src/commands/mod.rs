pub mod blocks;
pub mod history;
pub mod nets;
pub mod project;
pub mod util;
pub mod wiring;

pub use blocks::*;
pub use history::*;
pub use nets::*;
pub use project::*;
pub use util::*;
pub use wiring::*;
