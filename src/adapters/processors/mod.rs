//! Built-in custom entry processors, looked up by name from configuration.

pub mod arhem_aldreboende;
pub mod karlskoga_aldreomsorg;
pub mod skutehagens_skola;

use crate::domain::model::{MenuEntry, RawCourse};
use crate::domain::ports::EntryProcessor;
use crate::utils::error::ProcessorError;
use chrono::NaiveDate;
use std::sync::Arc;

pub const DEFAULT_PROCESSOR_FN: &str = "entry_processor";

type ProcessorFn = fn(NaiveDate, usize, &RawCourse) -> Result<Option<MenuEntry>, ProcessorError>;

struct Registered {
    module: &'static str,
    function: &'static str,
    processor: ProcessorFn,
}

/// Named processors available to `processor` / `processor_fn` settings.
pub struct ProcessorRegistry {
    entries: Vec<Registered>,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProcessorRegistry {
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                Registered {
                    module: "skutehagens_skola",
                    function: DEFAULT_PROCESSOR_FN,
                    processor: skutehagens_skola::entry_processor,
                },
                Registered {
                    module: "arhem_aldreboende",
                    function: DEFAULT_PROCESSOR_FN,
                    processor: arhem_aldreboende::entry_processor,
                },
                Registered {
                    module: "karlskoga_aldreomsorg",
                    function: DEFAULT_PROCESSOR_FN,
                    processor: karlskoga_aldreomsorg::entry_processor,
                },
            ],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|r| r.module).collect()
    }

    /// Find `module`/`function` (default function `entry_processor`).
    /// Unknown names are logged and yield `None`; the source then runs with
    /// the provider's default mapping.
    pub fn lookup(&self, module: &str, function: Option<&str>) -> Option<EntryProcessor> {
        let function = function
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_PROCESSOR_FN);

        let found = self
            .entries
            .iter()
            .find(|r| r.module == module.trim() && r.function == function);

        match found {
            Some(registered) => {
                tracing::debug!("Using entry processor {}::{}", module, function);
                let processor: EntryProcessor = Arc::new(registered.processor);
                Some(processor)
            }
            None => {
                tracing::warn!(
                    "Entry processor '{}::{}' not found (known: {}); continuing without it",
                    module,
                    function,
                    self.names().join(", ")
                );
                None
            }
        }
    }
}
