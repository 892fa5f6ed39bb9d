pub mod claims;
pub mod context;
pub mod roster;
pub mod select;

pub use context::Context;
