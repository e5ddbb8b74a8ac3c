//! Schema migrations.
//!
//! A migration compares a dataset as it exists on GoodData with its local
//! declaration and turns the difference into one MAQL script: additions
//! first, then alterations, then deletions, followed by a data-preserving
//! synchronisation of every touched dataset.

mod actions;
mod chain;
mod engine;

use std::path::PathBuf;

pub use actions::{classify, is_simple, same_columns, Alteration, MigrationAction};
pub use chain::MigrationChain;
pub use engine::MigrationEngine;

/// Options for running a migration.
#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// File receiving the generated MAQL before it is executed.
    pub dump_path: Option<PathBuf>,
    /// Generate (and dump) the MAQL without executing anything.
    pub dry_run: bool,
}

impl MigrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dump(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_path = Some(path.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
