#[macro_use]
pub mod assertions;
