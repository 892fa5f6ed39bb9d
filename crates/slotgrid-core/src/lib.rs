pub mod config;
pub mod error;
pub mod types;

pub use config::{SlotgridConfig, load_roster, parse_duration};
pub use error::{CoreError, CoreResult};
pub use types::*;
