//! In-memory executor for tests.
//!
//! `RecordingExecutor` renders one trace line per directive instead of
//! shell, and counts render calls.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::directive::{Directive, Timeout};
use crate::error::Result;
use crate::executor::Executor;

/// Executor that renders a flat, human-readable trace.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    renders: AtomicUsize,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `render` has been called.
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    fn trace(directive: &Directive, depth: usize, out: &mut Vec<String>) {
        let mut flags = Vec::new();
        if directive.assert {
            flags.push("assert".to_string());
        }
        match directive.timeout {
            Timeout::Default => {}
            Timeout::Disabled => flags.push("timeout=off".to_string()),
            Timeout::Class(class) => flags.push(format!("timeout={}", class.name())),
        }
        if let Some(group) = &directive.fold {
            flags.push(format!("fold={group}"));
        }
        if !directive.visible {
            flags.push("hidden".to_string());
        }
        if !directive.logged {
            flags.push("unlogged".to_string());
        }

        let text = if directive.is_secret() {
            "<secret>"
        } else {
            directive.text.as_str()
        };
        out.push(format!(
            "{}{} [{}] {}",
            "  ".repeat(depth),
            directive.kind.name(),
            flags.join(","),
            text
        ));
        for child in directive.body() {
            Self::trace(child, depth + 1, out);
        }
    }
}

impl Executor for RecordingExecutor {
    fn render(&self, directives: &[Directive]) -> Result<String> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        let mut lines = Vec::new();
        for directive in directives {
            Self::trace(directive, 0, &mut lines);
        }
        Ok(lines.join("\n"))
    }
}
