pub mod code;
pub mod state;

pub use code::*;
pub use state::*;
