pub mod types;
pub mod yaml;

pub use types::{Action, Scenario};
