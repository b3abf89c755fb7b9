pub mod history;
pub mod menu;

pub use history::{DayHistory, DayRecord};
pub use menu::{retry_delay, FetchStatus, Menu};
