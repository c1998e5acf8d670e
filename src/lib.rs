//! Extraction, tagged-segment translation and write-back of localizable
//! text in packaged game mods.

pub mod error;
pub mod model;
pub mod parsers;
pub mod protocol;
pub mod services;

pub use error::{CoreError, Result};
