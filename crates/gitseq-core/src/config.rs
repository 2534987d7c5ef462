//! Checkout inputs: build configuration, repository data, and job files.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// Default shallow-fetch depth.
pub const DEFAULT_FETCH_DEPTH: u32 = 50;

/// Host named in the SSH host-trust entries.
pub const DEFAULT_TRUSTED_HOST: &str = "github.com";

/// Default ceiling, in seconds, for each timeout class.
pub const DEFAULT_CLASS_TIMEOUT_SECS: u64 = 300;

/// Per-invocation git configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckoutConfig {
    /// Depth passed to `git fetch --depth`.
    #[serde(alias = "depth")]
    pub fetch_depth: u32,

    /// Whether to initialise and update submodules.
    #[serde(alias = "submodules")]
    pub submodules_enabled: bool,

    /// Host for which batch-mode SSH trust entries are written.
    pub trusted_host: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            fetch_depth: DEFAULT_FETCH_DEPTH,
            submodules_enabled: true,
            trusted_host: DEFAULT_TRUSTED_HOST.to_string(),
        }
    }
}

impl CheckoutConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fetch_depth == 0 {
            return Err(CheckoutError::InvalidFetchDepth(self.fetch_depth));
        }
        let host = self.trusted_host.trim();
        if host.is_empty() || host.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CheckoutError::InvalidTrustedHost(self.trusted_host.clone()));
        }
        Ok(())
    }

    pub fn with_fetch_depth(mut self, depth: u32) -> Self {
        self.fetch_depth = depth;
        self
    }

    pub fn with_submodules(mut self, enabled: bool) -> Self {
        self.submodules_enabled = enabled;
        self
    }
}

/// Source repository metadata for one build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutData {
    /// Remote URL configured as `origin`.
    #[serde(default)]
    pub source_url: String,

    /// Revision to fetch; the remote's default tip when absent.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    /// Branch name. Only consulted by [`crate::shallow::clone_args`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Target directory name for the working copy.
    #[serde(default)]
    pub slug: String,

    /// Base64-encoded private deploy key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
}

impl CheckoutData {
    pub fn new(source_url: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_source_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = Some(key.into());
        self
    }

    /// Check required fields and the shape of the deploy key.
    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(CheckoutError::MissingField("source_url"));
        }
        if self.slug.trim().is_empty() {
            return Err(CheckoutError::MissingField("slug"));
        }
        reject_option_like("source_url", self.source_url.trim())?;
        reject_option_like("slug", self.slug.trim())?;
        if let Some(git_ref) = self.effective_ref() {
            reject_option_like("ref", git_ref)?;
        }
        if let Some(key) = self.normalized_source_key() {
            base64::engine::general_purpose::STANDARD.decode(key.as_bytes())?;
        }
        Ok(())
    }

    /// The deploy key with line breaks and padding whitespace removed.
    ///
    /// An empty or whitespace-only key counts as absent.
    pub fn normalized_source_key(&self) -> Option<String> {
        let key: String = self
            .source_key
            .as_deref()?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        (!key.is_empty()).then_some(key)
    }

    /// The ref with surrounding whitespace removed; empty counts as absent.
    pub fn effective_ref(&self) -> Option<&str> {
        self.git_ref.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}

/// Values interpolated as positional git arguments must not parse as options.
fn reject_option_like(field: &'static str, value: &str) -> Result<()> {
    if value.starts_with('-') {
        return Err(CheckoutError::OptionLikeValue {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Ceilings for the named timeout classes, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    pub fetch: u64,
    pub submodule_update: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch: DEFAULT_CLASS_TIMEOUT_SECS,
            submodule_update: DEFAULT_CLASS_TIMEOUT_SECS,
        }
    }
}

/// A complete checkout job as read from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSpec {
    #[serde(default)]
    pub git: CheckoutConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    pub data: CheckoutData,
}

impl JobSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
