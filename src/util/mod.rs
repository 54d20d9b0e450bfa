pub mod average;
#[macro_use]
pub mod logging;
pub mod rand;
