//! Property and scenario tests for checkout sequencing.

use gitseq_core::directive::flatten;
use gitseq_core::fakes::RecordingExecutor;
use gitseq_core::sequencer::SOURCE_KEY_PATH;
use gitseq_core::{
    CheckoutConfig, CheckoutData, CheckoutError, CheckoutSequencer, Directive, DirectiveKind,
    ShellExecutor, Step, Timeout, TimeoutClass,
};

const KEY: &str = "LS0tLS1CRUdJTiBLRVktLS0tLQpzZWNyZXQKLS0tLS1FTkQgS0VZLS0tLS0K";

/// Every combination of the inputs that change the shape of the sequence.
fn all_inputs() -> Vec<(CheckoutConfig, CheckoutData)> {
    let mut inputs = Vec::new();
    for key in [None, Some(KEY)] {
        for submodules in [false, true] {
            for git_ref in [None, Some("main"), Some("refs/pull/42/merge")] {
                for depth in [1, 50] {
                    let config = CheckoutConfig::default()
                        .with_fetch_depth(depth)
                        .with_submodules(submodules);
                    let mut data = CheckoutData::new("git@github.com:org/repo.git", "org/repo");
                    if let Some(k) = key {
                        data = data.with_source_key(k);
                    }
                    if let Some(r) = git_ref {
                        data = data.with_ref(r);
                    }
                    inputs.push((config, data));
                }
            }
        }
    }
    inputs
}

fn plan(config: &CheckoutConfig, data: &CheckoutData) -> Vec<Directive> {
    CheckoutSequencer::plan(config, data, &ShellExecutor::default()).expect("plan failed")
}

fn fetch(directives: &[Directive]) -> &Directive {
    directives
        .iter()
        .find(|d| d.step == Step::Fetch && d.kind == DirectiveKind::Command)
        .expect("fetch directive")
}

/// Test: without a key nothing references key material, but cleanup is still emitted
#[test]
fn test_no_key_means_no_key_material() {
    for (config, data) in all_inputs().into_iter().filter(|(_, d)| d.source_key.is_none()) {
        let directives = plan(&config, &data);
        let all = flatten(&directives);

        assert!(all.iter().all(|d| !d.text.contains(KEY)));
        assert!(all
            .iter()
            .all(|d| !matches!(d.step, Step::KeyNotice | Step::KeyProvisioning)));

        let last = directives.last().expect("non-empty");
        assert_eq!(last.step, Step::KeyCleanup);
        assert_eq!(last.kind, DirectiveKind::Raw);
        assert_eq!(last.text, format!("rm -f {SOURCE_KEY_PATH}"));
    }
}

/// Test: fold groups are git.1, git.2 without submodules
#[test]
fn test_folds_without_submodules() {
    for (config, data) in all_inputs().into_iter().filter(|(c, _)| !c.submodules_enabled) {
        let directives = plan(&config, &data);
        let folds: Vec<String> = gitseq_core::directive::fold_groups(&directives)
            .iter()
            .map(|g| g.to_string())
            .collect();
        assert_eq!(folds, vec!["git.1", "git.2"]);
    }
}

/// Test: fold groups are git.1..git.4 in order fetch, checkout, init, update
#[test]
fn test_folds_with_submodules() {
    for (config, data) in all_inputs().into_iter().filter(|(c, _)| c.submodules_enabled) {
        let directives = plan(&config, &data);
        let folded: Vec<(String, &str)> = flatten(&directives)
            .into_iter()
            .filter_map(|d| d.fold.as_ref().map(|g| (g.to_string(), d.text.as_str())))
            .collect();

        assert_eq!(folded.len(), 4);
        assert_eq!(folded[0].0, "git.1");
        assert!(folded[0].1.starts_with("git fetch"));
        assert_eq!(folded[1], ("git.2".to_string(), "git checkout -qf FETCH_HEAD"));
        assert_eq!(folded[2], ("git.3".to_string(), "git submodule init"));
        assert_eq!(folded[3], ("git.4".to_string(), "git submodule update"));
    }
}

/// Test: a pull request ref becomes a source-only refspec fragment
#[test]
fn test_pull_request_refspec() {
    let data =
        CheckoutData::new("https://example/repo.git", "build").with_ref("refs/pull/42/merge");
    let directives = plan(&CheckoutConfig::default(), &data);
    assert_eq!(
        fetch(&directives).text,
        "git fetch --depth=50 origin refs/pull/42/merge:"
    );
}

/// Test: no ref fetches the default tip
#[test]
fn test_missing_ref_fetches_default_tip() {
    let data = CheckoutData::new("https://example/repo.git", "build");
    let directives = plan(&CheckoutConfig::default(), &data);
    assert_eq!(fetch(&directives).text, "git fetch --depth=50 origin");
}

/// Test: key-touching directives are neither visible nor logged
#[test]
fn test_key_material_is_always_secret() {
    for (config, data) in all_inputs() {
        let directives = plan(&config, &data);
        for d in flatten(&directives) {
            let touches_key = d.step == Step::KeyProvisioning || d.text.contains(KEY);
            if touches_key {
                assert!(!d.visible && !d.logged, "key directive leaked: {:?}", d.step);
            }
        }
    }
}

/// Test: assertion flags on fatal and best-effort steps
#[test]
fn test_assert_flags() {
    for (config, data) in all_inputs() {
        let directives = plan(&config, &data);
        let all = flatten(&directives);

        let asserted = |text: &str| {
            all.iter()
                .find(|d| d.text.starts_with(text))
                .map(|d| d.assert)
                .unwrap_or_else(|| panic!("missing directive: {text}"))
        };
        assert!(asserted("git init"));
        assert!(asserted("git fetch"));
        assert!(asserted("git checkout -qf FETCH_HEAD"));
        assert!(!asserted("rm -f"));
        if config.submodules_enabled {
            assert!(!asserted("git submodule init"));
            assert!(asserted("git submodule update"));
            assert!(!asserted("printf 'Host %s"));
        }
        if data.source_key.is_some() {
            assert!(all
                .iter()
                .filter(|d| d.step == Step::KeyProvisioning)
                .all(|d| !d.assert));
        }
    }
}

/// Test: timeout classes on fetch and submodule update, cd unbounded
#[test]
fn test_timeout_classes() {
    let data = CheckoutData::new("https://example/repo.git", "build");
    let directives = plan(&CheckoutConfig::default(), &data);
    let all = flatten(&directives);

    let timeout_of = |text: &str| {
        all.iter()
            .find(|d| d.text.starts_with(text))
            .map(|d| d.timeout)
            .expect("directive")
    };
    assert_eq!(timeout_of("git fetch"), Timeout::Class(TimeoutClass::Fetch));
    assert_eq!(
        timeout_of("git submodule update"),
        Timeout::Class(TimeoutClass::SubmoduleUpdate)
    );
    assert_eq!(timeout_of("cd "), Timeout::Disabled);
    assert_eq!(timeout_of("git checkout"), Timeout::Default);
}

/// Test: the submodule host-trust entry is visible but not secret
#[test]
fn test_submodule_host_trust_is_visible() {
    let data = CheckoutData::new("https://example/repo.git", "build");
    let directives = plan(&CheckoutConfig::default(), &data);
    let block = directives
        .iter()
        .find(|d| matches!(d.kind, DirectiveKind::Conditional { .. }))
        .expect("submodule block");

    assert_eq!(block.text, "-f .gitmodules");
    let trust = &block.body()[0];
    assert!(trust.text.contains("StrictHostKeyChecking no"));
    assert!(trust.visible);
    assert!(trust.logged);
}

/// Test: end-to-end scenario rendered through the recording executor
#[test]
fn test_end_to_end_scenario() {
    let config = CheckoutConfig::default().with_fetch_depth(50).with_submodules(true);
    let data = CheckoutData::new("https://example/repo.git", "build").with_ref("main");
    let executor = RecordingExecutor::new();

    let checkout =
        CheckoutSequencer::sequence(&config, &data, &executor).expect("sequence failed");

    let expected = [
        "command [assert] git init build",
        "command [timeout=off] cd build",
        "command [] git config remote.origin.url https://example/repo.git",
        "set_env [hidden] GIT_ASKPASS=echo",
        "command [assert,timeout=fetch,fold=git.1] git fetch --depth=50 origin main:",
        "command [assert,fold=git.2] git checkout -qf FETCH_HEAD",
        "conditional [] -f .gitmodules",
        r"  command [] printf 'Host %s\n\tStrictHostKeyChecking no\n' github.com >> ~/.ssh/config",
        "  command [fold=git.3] git submodule init",
        "  command [assert,timeout=submodule-update,fold=git.4] git submodule update",
        "raw [] rm -f ~/.ssh/source_rsa",
    ];
    assert_eq!(checkout.script, expected.join("\n"));
    assert_eq!(executor.render_count(), 1);
    assert_eq!(checkout.directives.len(), 8);
}

/// Test: secret directives never reach the rendered shell output unmasked
#[test]
fn test_shell_script_with_key() {
    let data = CheckoutData::new("git@github.com:org/repo.git", "repo").with_source_key(KEY);
    let checkout =
        CheckoutSequencer::sequence(&CheckoutConfig::default(), &data, &ShellExecutor::default())
            .expect("sequence failed");

    let key_lines: Vec<&str> = checkout.script.lines().filter(|l| l.contains(KEY)).collect();
    assert_eq!(key_lines.len(), 1);
    assert!(key_lines[0].starts_with("{ echo "));
    assert!(key_lines[0].ends_with("; } > /dev/null 2>&1"));
    assert!(!checkout.script.contains("echo '$ ssh-add"));
    assert!(checkout.script.contains("echo 'Installing an SSH key'"));
    assert!(checkout.script.ends_with("rm -f ~/.ssh/source_rsa\n"));
}

/// Test: configuration errors surface before any directive is built
#[test]
fn test_configuration_errors() {
    let executor = RecordingExecutor::new();

    let err = CheckoutSequencer::sequence(
        &CheckoutConfig::default(),
        &CheckoutData::new("https://example/repo.git", ""),
        &executor,
    )
    .unwrap_err();
    assert!(matches!(err, CheckoutError::MissingField("slug")));

    let err = CheckoutSequencer::sequence(
        &CheckoutConfig::default().with_fetch_depth(0),
        &CheckoutData::new("https://example/repo.git", "build"),
        &executor,
    )
    .unwrap_err();
    assert!(matches!(err, CheckoutError::InvalidFetchDepth(0)));

    assert_eq!(executor.render_count(), 0);
}

/// Test: identical inputs give identical sequences
#[test]
fn test_sequencing_is_deterministic() {
    for (config, data) in all_inputs() {
        assert_eq!(plan(&config, &data), plan(&config, &data));
    }
}
