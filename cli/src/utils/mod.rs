pub mod date;
pub mod logger;
pub mod math;

pub use date::*;
pub use logger::*;
pub use math::*;
