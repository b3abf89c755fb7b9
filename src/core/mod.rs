pub mod dayfilter;
pub mod discovery;
pub mod normalize;
pub mod render;

pub use dayfilter::{DayFilter, DayFilterConfig};
pub use discovery::discover_keywords;
pub use normalize::normalize;
