//! Directive model: the units of intent handed to an executor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every fold group issued during a checkout.
pub const FOLD_PREFIX: &str = "git";

/// What a directive asks the executor to do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectiveKind {
    /// An assisted shell command (honours every execution option).
    Command,

    /// Shell text emitted verbatim, with no assertion or timeout handling.
    Raw,

    /// A message printed to the build log.
    Echo,

    /// An environment variable assignment.
    SetEnv { name: String, value: String },

    /// A block whose body only runs when the guard expression holds.
    Conditional { body: Vec<Directive> },
}

impl DirectiveKind {
    /// Short kind name, used in plan listings.
    pub fn name(&self) -> &'static str {
        match self {
            DirectiveKind::Command => "command",
            DirectiveKind::Raw => "raw",
            DirectiveKind::Echo => "echo",
            DirectiveKind::SetEnv { .. } => "set_env",
            DirectiveKind::Conditional { .. } => "conditional",
        }
    }
}

/// Named timeout classes, so the executor can apply distinct ceilings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TimeoutClass {
    /// Fetching the requested ref from the remote.
    Fetch,

    /// Updating submodules after checkout.
    SubmoduleUpdate,
}

impl TimeoutClass {
    pub fn name(&self) -> &'static str {
        match self {
            TimeoutClass::Fetch => "fetch",
            TimeoutClass::SubmoduleUpdate => "submodule-update",
        }
    }
}

/// Timeout handling requested for a directive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Timeout {
    /// No explicit request; the executor applies its generic ceiling.
    #[default]
    Default,

    /// Explicitly unbounded. Must not be wrapped by timeout machinery.
    Disabled,

    /// Ceiling taken from the named class.
    Class(TimeoutClass),
}

/// A log folding group such as `git.3`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FoldGroup(String);

impl FoldGroup {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FoldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues fold groups for one checkout invocation.
///
/// Numbering starts at 1 and advances once per fold-bearing directive, in
/// the order directives are constructed. Groups are handed out on demand,
/// never pre-allocated, so a skipped step leaves no gap.
#[derive(Debug, Default)]
pub struct FoldCounter {
    issued: u32,
}

impl FoldCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter and return the next fold group.
    pub fn advance(&mut self) -> FoldGroup {
        self.issued += 1;
        FoldGroup(format!("{FOLD_PREFIX}.{}", self.issued))
    }

    /// Number of fold groups issued so far.
    pub fn issued(&self) -> u32 {
        self.issued
    }
}

/// The sequencing step a directive belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    KeyNotice,
    KeyProvisioning,
    Init,
    ChangeDir,
    Remote,
    Fetch,
    Checkout,
    Submodules,
    KeyCleanup,
}

impl Step {
    /// Human-readable label used when attributing a failure.
    pub fn label(&self) -> &'static str {
        match self {
            Step::KeyNotice => "ssh key notice",
            Step::KeyProvisioning => "ssh key setup",
            Step::Init => "git init",
            Step::ChangeDir => "cd",
            Step::Remote => "git remote setup",
            Step::Fetch => "git fetch",
            Step::Checkout => "git checkout",
            Step::Submodules => "git submodule update",
            Step::KeyCleanup => "ssh key cleanup",
        }
    }
}

/// Execution options for an assisted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOptions {
    pub assert: bool,
    pub timeout: Timeout,
    pub fold: Option<FoldGroup>,
    pub visible: bool,
    pub logged: bool,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            assert: false,
            timeout: Timeout::Default,
            fold: None,
            visible: true,
            logged: true,
        }
    }
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the remaining sequence if this command fails.
    pub fn asserted(mut self) -> Self {
        self.assert = true;
        self
    }

    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fold(mut self, group: FoldGroup) -> Self {
        self.fold = Some(group);
        self
    }

    /// Do not echo the command text.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Neither echo the text nor surface the command's output.
    pub fn secret(mut self) -> Self {
        self.visible = false;
        self.logged = false;
        self
    }
}

/// One declared unit of shell-executable or declarative intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Directive {
    pub step: Step,
    #[serde(flatten)]
    pub kind: DirectiveKind,
    pub text: String,
    pub assert: bool,
    pub timeout: Timeout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold: Option<FoldGroup>,
    pub visible: bool,
    pub logged: bool,
}

impl Directive {
    pub fn command(step: Step, text: impl Into<String>, options: CommandOptions) -> Self {
        Self {
            step,
            kind: DirectiveKind::Command,
            text: text.into(),
            assert: options.assert,
            timeout: options.timeout,
            fold: options.fold,
            visible: options.visible,
            logged: options.logged,
        }
    }

    pub fn raw(step: Step, text: impl Into<String>) -> Self {
        Self {
            step,
            kind: DirectiveKind::Raw,
            text: text.into(),
            assert: false,
            timeout: Timeout::Default,
            fold: None,
            visible: true,
            logged: true,
        }
    }

    pub fn echo(step: Step, message: impl Into<String>) -> Self {
        Self {
            kind: DirectiveKind::Echo,
            ..Self::raw(step, message)
        }
    }

    /// Environment assignment; `options` controls visibility and logging.
    pub fn set_env(
        step: Step,
        name: impl Into<String>,
        value: impl Into<String>,
        options: CommandOptions,
    ) -> Self {
        let name = name.into();
        let value = value.into();
        Self {
            step,
            text: format!("{name}={value}"),
            kind: DirectiveKind::SetEnv { name, value },
            assert: false,
            timeout: Timeout::Default,
            fold: None,
            visible: options.visible,
            logged: options.logged,
        }
    }

    pub fn conditional(step: Step, guard: impl Into<String>, body: Vec<Directive>) -> Self {
        Self {
            kind: DirectiveKind::Conditional { body },
            ..Self::raw(step, guard)
        }
    }

    /// Nested directives of a conditional block (empty for other kinds).
    pub fn body(&self) -> &[Directive] {
        match &self.kind {
            DirectiveKind::Conditional { body } => body,
            _ => &[],
        }
    }

    pub fn is_secret(&self) -> bool {
        !self.visible && !self.logged
    }
}

/// Depth-first, in-order view of a directive list including block bodies.
pub fn flatten(directives: &[Directive]) -> Vec<&Directive> {
    let mut out = Vec::new();
    for directive in directives {
        out.push(directive);
        out.extend(flatten(directive.body()));
    }
    out
}

/// Fold groups used by a directive list, in order of appearance.
pub fn fold_groups(directives: &[Directive]) -> Vec<&FoldGroup> {
    flatten(directives)
        .into_iter()
        .filter_map(|d| d.fold.as_ref())
        .collect()
}
