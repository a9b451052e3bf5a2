use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Upper bound for `max_page_size`.
pub const PAGE_SIZE_CEILING: u64 = 10_000;

/// Configuration for the students module (`modules.students` in the app config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentsConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

impl Default for StudentsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    50
}

impl StudentsConfig {
    /// Page sizes must satisfy `1 <= default_page_size <= max_page_size <= 10000`.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_page_size >= 1 && self.max_page_size <= PAGE_SIZE_CEILING,
            "students.max_page_size must be between 1 and {PAGE_SIZE_CEILING}, got {}",
            self.max_page_size
        );
        ensure!(
            self.default_page_size >= 1 && self.default_page_size <= self.max_page_size,
            "students.default_page_size must be between 1 and max_page_size ({}), got {}",
            self.max_page_size,
            self.default_page_size
        );
        Ok(())
    }
}
