//! Arguments for a shallow `git clone`.
//!
//! [`CheckoutSequencer`](crate::CheckoutSequencer) never clones: it
//! initialises an empty repository and fetches the requested ref. These
//! arguments are for callers that prefer a single `git clone` and pin a
//! branch when no explicit ref is available.

use crate::config::{CheckoutConfig, CheckoutData};
use crate::shell::quote;

/// `--depth=<n>`, plus `--branch=<branch>` when no ref is set.
pub fn clone_args(config: &CheckoutConfig, data: &CheckoutData) -> String {
    let mut args = format!("--depth={}", config.fetch_depth);
    if data.effective_ref().is_none() {
        if let Some(branch) = data.branch.as_deref().filter(|b| !b.trim().is_empty()) {
            args.push_str(" --branch=");
            args.push_str(&quote(branch));
        }
    }
    args
}
