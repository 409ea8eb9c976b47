//! Value types and the storage and provider traits shared by every Hangar
//! crate. No HTTP client and no database live here.

pub mod citizen;
pub mod error;
pub mod fleet;
pub mod provider;
pub mod ship_info;
pub mod store;

pub use error::{Error, Result};
