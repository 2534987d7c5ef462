//! Executor seam and the reference shell renderer.
//!
//! The sequencer never runs anything itself. It asks an [`Executor`] to
//! construct directives and finally to render them into script text. The
//! constructors have default implementations; only rendering is backend
//! specific.

use tracing::debug;

use crate::config::TimeoutConfig;
use crate::directive::{CommandOptions, Directive, DirectiveKind, Step, Timeout, TimeoutClass};
use crate::error::{CheckoutError, Result};
use crate::shell::quote;

/// Exit status used when an asserted directive fails.
pub const ASSERT_EXIT_CODE: i32 = 2;

/// Directive construction and serialization backend.
pub trait Executor {
    fn command(&self, step: Step, text: String, options: CommandOptions) -> Directive {
        Directive::command(step, text, options)
    }

    fn raw(&self, step: Step, text: String) -> Directive {
        Directive::raw(step, text)
    }

    fn echo(&self, step: Step, message: String) -> Directive {
        Directive::echo(step, message)
    }

    fn set_env(&self, step: Step, name: &str, value: &str, options: CommandOptions) -> Directive {
        Directive::set_env(step, name, value, options)
    }

    fn conditional(&self, step: Step, guard: String, body: Vec<Directive>) -> Directive {
        Directive::conditional(step, guard, body)
    }

    /// Serialize a complete directive list.
    fn render(&self, directives: &[Directive]) -> Result<String>;
}

/// Renders directives as a bash script.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    timeouts: TimeoutConfig,
}

impl ShellExecutor {
    pub fn new(timeouts: TimeoutConfig) -> Self {
        Self { timeouts }
    }

    fn class_secs(&self, class: TimeoutClass) -> u64 {
        match class {
            TimeoutClass::Fetch => self.timeouts.fetch,
            TimeoutClass::SubmoduleUpdate => self.timeouts.submodule_update,
        }
    }

    fn render_into(
        &self,
        directive: &Directive,
        depth: usize,
        out: &mut Vec<String>,
    ) -> Result<()> {
        let indent = "  ".repeat(depth);
        let mut push = |line: String| out.push(format!("{indent}{line}"));

        match &directive.kind {
            DirectiveKind::Raw => push(directive.text.clone()),
            DirectiveKind::Echo => push(format!("echo {}", quote(&directive.text))),
            DirectiveKind::SetEnv { name, value } => {
                if !is_env_name(name) {
                    return Err(CheckoutError::Render(format!(
                        "invalid environment variable name: {name:?}"
                    )));
                }
                if directive.visible {
                    push(format!("echo {}", quote(&format!("$ export {name}={value}"))));
                }
                push(format!("export {name}={}", quote(value)));
            }
            DirectiveKind::Command => {
                let fold = directive.fold.as_ref().map(|g| g.as_str().to_string());
                if let Some(group) = &fold {
                    push(format!("echo -en 'fold:start:{group}\\r'"));
                }
                if directive.visible {
                    push(format!("echo {}", quote(&format!("$ {}", directive.text))));
                }

                let mut line = directive.text.clone();
                if let Timeout::Class(class) = directive.timeout {
                    let secs = self.class_secs(class);
                    if secs > 0 {
                        line = format!("timeout {secs} {line}");
                    }
                }
                if !directive.logged {
                    line = format!("{{ {line}; }} > /dev/null 2>&1");
                }
                if directive.assert {
                    let message = quote(&format!("{} failed", directive.step.label()));
                    line = format!("{line} || {{ echo {message}; exit {ASSERT_EXIT_CODE}; }}");
                }
                push(line);

                if let Some(group) = &fold {
                    push(format!("echo -en 'fold:end:{group}\\r'"));
                }
            }
            DirectiveKind::Conditional { body } => {
                push(format!("if [[ {} ]]; then", directive.text));
                if body.is_empty() {
                    out.push(format!("{indent}  :"));
                }
                for child in body {
                    self.render_into(child, depth + 1, out)?;
                }
                out.push(format!("{indent}fi"));
            }
        }
        Ok(())
    }
}

impl Executor for ShellExecutor {
    fn render(&self, directives: &[Directive]) -> Result<String> {
        debug!(directives = directives.len(), "rendering shell script");

        let mut lines = vec!["#!/usr/bin/env bash".to_string()];
        for directive in directives {
            self.render_into(directive, 0, &mut lines)?;
        }

        let mut script = lines.join("\n");
        script.push('\n');
        Ok(script)
    }
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
