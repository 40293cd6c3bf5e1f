#[macro_use]
pub mod testing;

pub mod config;
pub mod error;
pub mod finite_volume;
pub mod io;
pub mod mesh;

pub use crate::error::{Error, Result};
