pub mod indicator;
pub mod insights;
pub mod price;
pub mod summary;

pub use indicator::*;
pub use insights::*;
pub use price::*;
pub use summary::*;
