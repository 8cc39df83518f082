pub mod listing;
pub mod scope;
pub mod text;
pub mod time_serde;

pub use listing::{BoostWindow, Listing};
pub use scope::{Scope, SortKey};
