//! Checkout sequencing.
//!
//! Builds the ordered directive list that materialises a working copy:
//!
//! 1. key notice and provisioning (only with a deploy key)
//! 2. `git init <slug>`
//! 3. `cd <slug>`
//! 4. origin URL
//! 5. fetch of the requested ref
//! 6. forced checkout of `FETCH_HEAD`
//! 7. submodules (only when enabled, guarded by `.gitmodules`)
//! 8. key cleanup
//!
//! Branching is decided once up front from the inputs; each step is a plain
//! function appending to the list, and the fold counter is passed explicitly.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::{CheckoutConfig, CheckoutData};
use crate::directive::{
    self, CommandOptions, Directive, FoldCounter, FoldGroup, Step, Timeout, TimeoutClass,
};
use crate::error::Result;
use crate::executor::Executor;
use crate::shell::quote;

/// Where the decoded deploy key is written.
pub const SOURCE_KEY_PATH: &str = "~/.ssh/source_rsa";

/// SSH client configuration receiving host-trust entries.
pub const SSH_CONFIG_PATH: &str = "~/.ssh/config";

/// Guard for the submodule block.
pub const SUBMODULES_GUARD: &str = "-f .gitmodules";

/// Environment variable forcing credential prompts to fail immediately.
pub const ASKPASS_VAR: &str = "GIT_ASKPASS";

/// `printf` format of the host-trust entry written with a deploy key.
const BATCH_TRUST_ENTRY: &str = "Host %s\\n\\tBatchMode yes\\n\\tStrictHostKeyChecking no\\n";

/// A sequenced checkout: the directives and their rendered form.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub directives: Vec<Directive>,
    pub script: String,
}

impl Checkout {
    /// SHA-256 of the rendered script, hex encoded.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.script.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Fold groups in order of appearance.
    pub fn fold_groups(&self) -> Vec<&FoldGroup> {
        directive::fold_groups(&self.directives)
    }
}

/// Flags evaluated once per invocation.
#[derive(Debug, Clone, Copy)]
struct Plan {
    install_key: bool,
    submodules: bool,
}

/// Checkout directive sequencer.
pub struct CheckoutSequencer;

impl CheckoutSequencer {
    /// Build the directive list and render it through `executor`.
    pub fn sequence<E: Executor + ?Sized>(
        config: &CheckoutConfig,
        data: &CheckoutData,
        executor: &E,
    ) -> Result<Checkout> {
        let directives = Self::plan(config, data, executor)?;
        let script = executor.render(&directives)?;
        Ok(Checkout { directives, script })
    }

    /// Build the directive list without rendering it.
    ///
    /// Inputs are validated before anything is constructed; a missing
    /// `source_url` or `slug` yields an error and no directives.
    pub fn plan<E: Executor + ?Sized>(
        config: &CheckoutConfig,
        data: &CheckoutData,
        executor: &E,
    ) -> Result<Vec<Directive>> {
        config.validate()?;
        data.validate()?;

        let source_key = data.normalized_source_key();
        let plan = Plan {
            install_key: source_key.is_some(),
            submodules: config.submodules_enabled,
        };

        info!(
            slug = %data.slug,
            git_ref = data.effective_ref().unwrap_or("<default>"),
            depth = config.fetch_depth,
            install_key = plan.install_key,
            submodules = plan.submodules,
            "Sequencing checkout"
        );

        let mut folds = FoldCounter::new();
        let mut out = Vec::new();

        if let Some(key) = &source_key {
            install_source_key(executor, config, key, &mut out);
        }
        init_repo(executor, data, &mut out);
        change_dir(executor, data, &mut out);
        setup_remote(executor, data, &mut out);
        fetch_ref(executor, config, data, &mut folds, &mut out);
        checkout_head(executor, &mut folds, &mut out);
        if plan.submodules {
            submodules(executor, config, &mut folds, &mut out);
        }
        remove_key(executor, &mut out);

        debug!(
            directives = out.len(),
            folds = folds.issued(),
            "Checkout sequenced"
        );
        Ok(out)
    }
}

/// Source side of the fetch refspec: `<ref>:` for a ref, empty otherwise.
pub fn refspec_fragment(git_ref: Option<&str>) -> String {
    match git_ref.map(str::trim) {
        Some(r) if !r.is_empty() => format!("{r}:"),
        _ => String::new(),
    }
}

fn install_source_key<E: Executor + ?Sized>(
    executor: &E,
    config: &CheckoutConfig,
    key: &str,
    out: &mut Vec<Directive>,
) {
    out.push(executor.echo(Step::KeyNotice, "Installing an SSH key".to_string()));

    let secret = || CommandOptions::new().secret();
    let step = Step::KeyProvisioning;
    out.push(executor.command(
        step,
        format!("echo {} | base64 --decode > {SOURCE_KEY_PATH}", quote(key)),
        secret(),
    ));
    out.push(executor.command(step, format!("chmod 600 {SOURCE_KEY_PATH}"), secret()));
    out.push(executor.command(step, "eval \"$(ssh-agent -s)\"".to_string(), secret()));
    out.push(executor.command(step, format!("ssh-add {SOURCE_KEY_PATH}"), secret()));
    out.push(executor.command(
        step,
        format!(
            "printf '{BATCH_TRUST_ENTRY}' {} >> {SSH_CONFIG_PATH}",
            quote(config.trusted_host.trim())
        ),
        secret(),
    ));
}

fn init_repo<E: Executor + ?Sized>(executor: &E, data: &CheckoutData, out: &mut Vec<Directive>) {
    out.push(executor.command(
        Step::Init,
        format!("git init {}", quote(&data.slug)),
        CommandOptions::new().asserted(),
    ));
}

fn change_dir<E: Executor + ?Sized>(executor: &E, data: &CheckoutData, out: &mut Vec<Directive>) {
    out.push(executor.command(
        Step::ChangeDir,
        format!("cd {}", quote(&data.slug)),
        CommandOptions::new().timeout(Timeout::Disabled),
    ));
}

fn setup_remote<E: Executor + ?Sized>(executor: &E, data: &CheckoutData, out: &mut Vec<Directive>) {
    // No fetch refspec: every fetch names its ref explicitly.
    out.push(executor.command(
        Step::Remote,
        format!("git config remote.origin.url {}", quote(&data.source_url)),
        CommandOptions::new(),
    ));
}

fn fetch_ref<E: Executor + ?Sized>(
    executor: &E,
    config: &CheckoutConfig,
    data: &CheckoutData,
    folds: &mut FoldCounter,
    out: &mut Vec<Directive>,
) {
    out.push(executor.set_env(
        Step::Fetch,
        ASKPASS_VAR,
        "echo",
        CommandOptions::new().hidden(),
    ));

    let fragment = refspec_fragment(data.effective_ref());
    let mut text = format!("git fetch --depth={} origin", config.fetch_depth);
    if !fragment.is_empty() {
        text.push(' ');
        text.push_str(&quote(&fragment));
    }
    out.push(executor.command(
        Step::Fetch,
        text,
        CommandOptions::new()
            .asserted()
            .timeout(Timeout::Class(TimeoutClass::Fetch))
            .fold(folds.advance()),
    ));
}

fn checkout_head<E: Executor + ?Sized>(
    executor: &E,
    folds: &mut FoldCounter,
    out: &mut Vec<Directive>,
) {
    out.push(executor.command(
        Step::Checkout,
        "git checkout -qf FETCH_HEAD".to_string(),
        CommandOptions::new().asserted().fold(folds.advance()),
    ));
}

fn submodules<E: Executor + ?Sized>(
    executor: &E,
    config: &CheckoutConfig,
    folds: &mut FoldCounter,
    out: &mut Vec<Directive>,
) {
    let step = Step::Submodules;
    let trust = executor.command(
        step,
        format!(
            "printf 'Host %s\\n\\tStrictHostKeyChecking no\\n' {} >> {SSH_CONFIG_PATH}",
            quote(config.trusted_host.trim())
        ),
        CommandOptions::new(),
    );
    let init = executor.command(
        step,
        "git submodule init".to_string(),
        CommandOptions::new().fold(folds.advance()),
    );
    let update = executor.command(
        step,
        "git submodule update".to_string(),
        CommandOptions::new()
            .asserted()
            .timeout(Timeout::Class(TimeoutClass::SubmoduleUpdate))
            .fold(folds.advance()),
    );
    out.push(executor.conditional(step, SUBMODULES_GUARD.to_string(), vec![trust, init, update]));
}

fn remove_key<E: Executor + ?Sized>(executor: &E, out: &mut Vec<Directive>) {
    out.push(executor.raw(Step::KeyCleanup, format!("rm -f {SOURCE_KEY_PATH}")));
}
