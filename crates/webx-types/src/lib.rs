//! Foundation types for the WebX browser.
//!
//! This crate contains the types shared by every WebX crate: the error
//! taxonomy used across resolution, fetching and script execution, and the
//! operator-supplied browser configuration.

pub mod config;
pub mod error;

pub use config::BrowserConfig;
pub use error::{Result, WebxError};
