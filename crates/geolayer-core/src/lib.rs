//! GeoLayer Core - Domain models, configuration, and format loading
//!
//! This crate contains the data model shared by every geolayer crate, the
//! error taxonomy, layered configuration, and the readers that turn uploaded
//! files into raw datasets or tabular record sets.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;

pub use error::{ErrorKind, GeolayerError, Result};
