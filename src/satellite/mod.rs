pub mod error;
pub mod granule;
pub mod grid;
pub mod locator;
