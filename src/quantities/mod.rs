pub type Float = f64;

pub mod time;
pub mod time_span;

pub use time::*;
pub use time_span::*;
