//! gitseq core - checkout directive sequencing
//!
//! Turns build configuration and repository metadata into the ordered
//! directives that materialise a working copy inside a build sandbox:
//! - optional deploy key provisioning (always silenced)
//! - repository init, remote setup, shallow fetch and forced checkout
//! - optional submodule init/update behind a `.gitmodules` guard
//! - best-effort key cleanup
//!
//! Directives carry assert, timeout class, fold group, visibility and
//! logging metadata; an [`Executor`] renders them into script text.

pub mod config;
pub mod directive;
pub mod error;
pub mod executor;
pub mod fakes;
pub mod sequencer;
pub mod shallow;
pub mod shell;
pub mod telemetry;

// Re-export key types
pub use config::{CheckoutConfig, CheckoutData, JobSpec, TimeoutConfig};
pub use directive::{
    CommandOptions, Directive, DirectiveKind, FoldCounter, FoldGroup, Step, Timeout, TimeoutClass,
};
pub use error::{CheckoutError, Result};
pub use executor::{Executor, ShellExecutor};
pub use sequencer::{refspec_fragment, Checkout, CheckoutSequencer};
pub use telemetry::init_tracing;

/// gitseq version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
