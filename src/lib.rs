pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::app::{DayHistory, Menu};
pub use crate::config::{LocalStorage, SkolmatConfig};
pub use crate::core::{DayFilter, DayFilterConfig};
pub use crate::domain::model::{FilterKeywords, MenuData, MenuEntry};
pub use crate::utils::error::{MenuError, Result};

#[cfg(feature = "cli")]
pub use crate::config::CliArgs;
