use rand::Rng;

use crate::kernel::error::{Error, Result};

/// Upper bound (exclusive) of the random suffix of generated process ids.
const PROCESS_ID_RANGE: u32 = 1_000_000;

/// Generates identifiers for processes and other runtime units.
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> Result<String>;
}

/// Produces ids of the form `<prefix>-<n>` with `n` drawn uniformly from `0..1_000_000`.
#[derive(Debug, Clone)]
pub struct ProcessIdGenerator {
    prefix: String,
}

impl ProcessIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl IdGenerator for ProcessIdGenerator {
    fn generate_id(&self) -> Result<String> {
        if self.prefix.is_empty() {
            return Err(Error::InvalidInput("prefix cannot be empty".to_string()));
        }
        let suffix = rand::thread_rng().gen_range(0..PROCESS_ID_RANGE);
        Ok(format!("{}-{}", self.prefix, suffix))
    }
}
