//! Orchestration tests.
//!
//! Complete launches and preflights against the scripted runner, with
//! required files created in temporary directories.

use crate::mocks::MockRunner;
use bi_launcher::config::LauncherConfig;
use bi_launcher::engine::orchestrator::{
    LaunchObserver, LaunchOrchestrator, LaunchOutcome, OrchestratorConfig, DELEGATION_CHECK_ID,
};
use bi_launcher::plan::definition::PlanDefinition;
use bi_launcher::plan::profiles::resolve_plan;
use bi_launcher::plan::{ArtifactReference, DelegationTarget, LaunchPlan, Prerequisite, Program};
use bi_launcher::platform::host;
use bi_launcher::platform::process::{
    CapturedOutput, CommandSpec, ExitState, ProbeError, ProcessRunner,
};
use bi_launcher::{run_plan, Check, CheckKind, CheckResult, LaunchError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DASHBOARD_SCRIPT: &str = "professional_bi_dashboard.py";

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"").unwrap();
    path
}

fn config_in(dir: &Path) -> LauncherConfig {
    LauncherConfig {
        interpreter: Some("python3".to_string()),
        search_dirs: vec![dir.to_path_buf()],
        ..LauncherConfig::default()
    }
}

/// Folder with the dashboard script and its data file
fn dashboard_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), DASHBOARD_SCRIPT);
    touch(dir.path(), "data.xlsx");
    dir
}

fn ids(outcome: &LaunchOutcome) -> Vec<String> {
    outcome.report().checks.iter().map(|c| c.id.clone()).collect()
}

fn is_pass(check: &Check) -> bool {
    matches!(check.result, Some(CheckResult::Pass { .. }))
}

#[test]
fn test_healthy_dashboard_launch() {
    let dir = dashboard_dir();
    let runner = MockRunner::healthy();

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    assert!(outcome.was_delegated());
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(
        ids(&outcome),
        vec![
            "PRE-001", "PRE-002", "PRE-003", "PRE-004", "PRE-005", "PRE-006", "PRE-007", "ART-001",
            "ART-002", "RUN-001"
        ]
    );
    assert!(outcome.report().checks.iter().all(is_pass));

    let spawned = runner.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].program, "python3");
    assert_eq!(
        spawned[0].args,
        vec![dir.path().join(DASHBOARD_SCRIPT).display().to_string()]
    );
    assert_eq!(
        spawned[0].env,
        vec![(
            "DATA_FILE_PATH".to_string(),
            dir.path().join("data.xlsx").display().to_string()
        )]
    );
}

#[test]
fn test_child_exit_code_is_relayed() {
    let dir = dashboard_dir();
    let runner = MockRunner::healthy().child_exits(ExitState::Code(3));

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    assert!(outcome.was_delegated());
    assert_eq!(outcome.exit_code(), 3);
    assert!(outcome.error().is_none());

    let step = outcome.report().check(DELEGATION_CHECK_ID).unwrap();
    assert!(matches!(step.result, Some(CheckResult::Fail { .. })));
}

#[cfg(unix)]
#[test]
fn test_child_killed_by_signal() {
    let dir = dashboard_dir();
    let runner = MockRunner::healthy().child_exits(ExitState::Signal(9));

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();
    assert_eq!(outcome.exit_code(), 137);
}

#[test]
fn test_missing_data_file_aborts_without_spawn() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), DASHBOARD_SCRIPT);
    let runner = MockRunner::healthy();

    let outcome = run_plan(&config_in(dir.path()), Some("dashboard"), &runner).unwrap();

    assert_eq!(outcome.exit_code(), 1);
    assert!(runner.spawned().is_empty());
    match outcome.error() {
        Some(LaunchError::ArtifactMissing { check_id, label, searched, .. }) => {
            assert_eq!(check_id, "ART-001");
            assert_eq!(label, "data");
            assert_eq!(searched, &vec![dir.path().join("data.xlsx")]);
        }
        other => panic!("expected ArtifactMissing, got {:?}", other),
    }

    // Nothing after the failing step runs or is reported
    let ids = ids(&outcome);
    assert_eq!(ids.last().map(String::as_str), Some("ART-001"));
    assert!(!ids.contains(&"ART-002".to_string()));
    assert!(!ids.contains(&DELEGATION_CHECK_ID.to_string()));
}

#[test]
fn test_missing_script_aborts() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "data.xlsx");
    let runner = MockRunner::healthy();

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    assert!(runner.spawned().is_empty());
    let error = outcome.error().expect("launch should abort");
    match error {
        LaunchError::ArtifactMissing { label, .. } => assert_eq!(label, "script"),
        other => panic!("expected ArtifactMissing, got {:?}", other),
    }
    assert!(error.details().contains(DASHBOARD_SCRIPT));
}

#[test]
fn test_missing_library_is_installed_and_launch_proceeds() {
    let dir = dashboard_dir();
    let runner = MockRunner::with_python(
        "3.11.4",
        &["pandas", "openpyxl", "dash", "dash_bootstrap_components", "numpy"],
    )
    .installable("plotly", "plotly");

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    assert!(outcome.was_delegated());
    assert_eq!(runner.install_attempts(), vec!["plotly".to_string()]);
    assert!(runner.has_module("plotly"));

    let plotly = outcome.report().check("PRE-004").unwrap();
    assert_eq!(plotly.name, "plotly");
    match &plotly.result {
        Some(CheckResult::Pass { message, .. }) => assert!(message.contains("installed now")),
        other => panic!("expected Pass, got {:?}", other),
    }
}

#[test]
fn test_package_with_dashes_probes_underscored_module() {
    let dir = dashboard_dir();
    let runner =
        MockRunner::with_python("3.11.4", &["pandas", "openpyxl", "plotly", "dash", "numpy"])
            .installable("dash-bootstrap-components", "dash_bootstrap_components");

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    assert!(outcome.was_delegated());
    assert_eq!(
        runner.install_attempts(),
        vec!["dash-bootstrap-components".to_string()]
    );
}

#[test]
fn test_remediation_failure_aborts() {
    let dir = dashboard_dir();
    let runner = MockRunner::with_python("3.11.4", &["pandas", "openpyxl"]).broken_pip();

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    assert_eq!(outcome.exit_code(), 1);
    assert!(runner.spawned().is_empty());
    assert_eq!(runner.install_attempts(), vec!["plotly".to_string()]);

    let error = outcome.error().unwrap();
    match error {
        LaunchError::RemediationFailed { check_id, name, command, reason } => {
            assert_eq!(check_id, "PRE-004");
            assert_eq!(name, "plotly");
            assert_eq!(command, "python3 -m pip install plotly -q");
            assert!(reason.contains("permission denied"));
        }
        other => panic!("expected RemediationFailed, got {:?}", other),
    }

    // Later libraries were never probed
    assert_eq!(ids(&outcome).last().map(String::as_str), Some(error.check_id()));
}

#[test]
fn test_install_that_does_not_fix_import_fails() {
    let dir = dashboard_dir();
    let runner = MockRunner::with_python("3.11.4", &["pandas", "openpyxl"])
        .installable("plotly", "plotly_legacy");

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    match outcome.error() {
        Some(LaunchError::RemediationFailed { reason, .. }) => {
            assert!(reason.contains("still cannot be imported"));
        }
        other => panic!("expected RemediationFailed, got {:?}", other),
    }
}

#[test]
fn test_no_install_reports_missing_library() {
    let dir = dashboard_dir();
    let runner =
        MockRunner::with_python("3.11.4", &["pandas", "openpyxl"]).installable("plotly", "plotly");
    let config = LauncherConfig {
        install_missing: false,
        ..config_in(dir.path())
    };

    let outcome = run_plan(&config, None, &runner).unwrap();

    assert!(runner.install_attempts().is_empty());
    assert!(runner.spawned().is_empty());
    match outcome.error() {
        Some(LaunchError::PrerequisiteMissing { name, reason, hint, .. }) => {
            assert_eq!(name, "plotly");
            assert!(reason.contains("No module named 'plotly'"));
            assert_eq!(
                hint.as_deref(),
                Some("Install it with: python3 -m pip install plotly -q")
            );
        }
        other => panic!("expected PrerequisiteMissing, got {:?}", other),
    }
}

#[test]
fn test_missing_interpreter() {
    let dir = dashboard_dir();
    let runner = MockRunner::empty();

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(ids(&outcome), vec!["PRE-001"]);
    match outcome.error() {
        Some(LaunchError::PrerequisiteMissing { check_id, name, reason, hint }) => {
            assert_eq!(check_id, "PRE-001");
            assert_eq!(name, "Python interpreter");
            assert!(reason.contains("python3"));
            assert!(hint.is_some());
        }
        other => panic!("expected PrerequisiteMissing, got {:?}", other),
    }
}

#[test]
fn test_interpreter_too_old() {
    let dir = dashboard_dir();
    let runner = MockRunner::with_python("3.7.9", &[]);

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    match outcome.error() {
        Some(LaunchError::PrerequisiteMissing { reason, .. }) => {
            assert!(reason.contains("3.7.9"));
            assert!(reason.contains("3.8.0 or newer"));
        }
        other => panic!("expected PrerequisiteMissing, got {:?}", other),
    }
    // No module probes after the interpreter failed
    assert_eq!(runner.captured().len(), 1);
}

#[test]
fn test_old_interpreter_is_skipped_for_a_newer_one() {
    let dir = dashboard_dir();
    let runner = MockRunner::with_python(
        "3.6.9",
        &["pandas", "openpyxl", "plotly", "dash", "dash_bootstrap_components", "numpy"],
    )
    .add_interpreter("python", "3.11.4");
    let config = LauncherConfig {
        interpreter: None,
        ..config_in(dir.path())
    };

    let outcome = run_plan(&config, None, &runner).unwrap();

    assert!(outcome.was_delegated());
    match &outcome.report().check("PRE-001").unwrap().result {
        Some(CheckResult::Pass { message, .. }) => assert_eq!(message, "python 3.11.4"),
        other => panic!("expected Pass, got {:?}", other),
    }
    assert_eq!(runner.spawned()[0].program, "python");
}

#[test]
fn test_every_candidate_too_old_lists_each_one() {
    let dir = dashboard_dir();
    let runner = MockRunner::with_python("3.6.9", &[]).add_interpreter("python", "3.7.2");
    let config = LauncherConfig {
        interpreter: None,
        ..config_in(dir.path())
    };

    let outcome = run_plan(&config, None, &runner).unwrap();

    match outcome.error() {
        Some(LaunchError::PrerequisiteMissing { reason, .. }) => {
            assert!(reason.contains("python3: version 3.6.9"));
            assert!(reason.contains("python: version 3.7.2"));
        }
        other => panic!("expected PrerequisiteMissing, got {:?}", other),
    }
    assert!(runner.spawned().is_empty());
}

#[test]
fn test_interpreter_below_recommended_warns() {
    let dir = dashboard_dir();
    let runner = MockRunner::with_python(
        "3.8.10",
        &["pandas", "openpyxl", "plotly", "dash", "dash_bootstrap_components", "numpy"],
    );

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    assert!(outcome.was_delegated());
    match &outcome.report().check("PRE-001").unwrap().result {
        Some(CheckResult::Warn { details, .. }) => assert!(details.contains("3.9.0")),
        other => panic!("expected Warn, got {:?}", other),
    }
}

#[test]
fn test_configured_interpreter_is_only_candidate() {
    let dir = dashboard_dir();
    let runner = MockRunner::healthy();
    let config = LauncherConfig {
        interpreter: Some("/opt/python/bin/python3".to_string()),
        ..config_in(dir.path())
    };

    let outcome = run_plan(&config, None, &runner).unwrap();

    assert!(matches!(
        outcome.error(),
        Some(LaunchError::PrerequisiteMissing { .. })
    ));
    let captured = runner.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].program, "/opt/python/bin/python3");
}

#[test]
fn test_delegation_failure() {
    let dir = dashboard_dir();
    let runner = MockRunner::healthy().child_fails_to_start();

    let outcome = run_plan(&config_in(dir.path()), None, &runner).unwrap();

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(runner.spawned().len(), 1);
    match outcome.error() {
        Some(LaunchError::DelegationFailed { check_id, command, .. }) => {
            assert_eq!(check_id, DELEGATION_CHECK_ID);
            assert!(command.starts_with("python3 "));
        }
        other => panic!("expected DelegationFailed, got {:?}", other),
    }
    let step = outcome.report().check(DELEGATION_CHECK_ID).unwrap();
    assert!(matches!(step.result, Some(CheckResult::Fail { .. })));
}

#[test]
fn test_explicit_data_file_is_exported() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), DASHBOARD_SCRIPT);
    let elsewhere = TempDir::new().unwrap();
    let data = touch(elsewhere.path(), "sales-2024.xlsx");
    let runner = MockRunner::healthy();
    let config = LauncherConfig {
        data_file: Some(data.clone()),
        ..config_in(dir.path())
    };

    let outcome = run_plan(&config, None, &runner).unwrap();

    assert!(outcome.was_delegated());
    assert_eq!(
        runner.spawned()[0].env,
        vec![("DATA_FILE_PATH".to_string(), data.display().to_string())]
    );
}

#[test]
fn test_explicit_data_file_does_not_fall_back_to_search() {
    let dir = dashboard_dir();
    let runner = MockRunner::healthy();
    let config = LauncherConfig {
        data_file: Some(dir.path().join("missing.xlsx")),
        ..config_in(dir.path())
    };

    let outcome = run_plan(&config, None, &runner).unwrap();

    match outcome.error() {
        Some(LaunchError::ArtifactMissing { searched, .. }) => {
            assert_eq!(searched, &vec![dir.path().join("missing.xlsx")]);
        }
        other => panic!("expected ArtifactMissing, got {:?}", other),
    }
}

#[test]
fn test_second_search_dir_is_used() {
    let first = TempDir::new().unwrap();
    let second = dashboard_dir();
    let runner = MockRunner::healthy();
    let config = LauncherConfig {
        search_dirs: vec![first.path().to_path_buf(), second.path().to_path_buf()],
        ..config_in(first.path())
    };

    let outcome = run_plan(&config, None, &runner).unwrap();

    assert!(outcome.was_delegated());
    let data = outcome.report().check("ART-001").unwrap();
    match &data.result {
        Some(CheckResult::Pass { message, .. }) => assert!(message.contains("candidate 2 of 2")),
        other => panic!("expected Pass, got {:?}", other),
    }
}

/// Runner that only sees the files in `present`
struct OnlyFiles<'a> {
    inner: &'a MockRunner,
    present: Vec<PathBuf>,
}

impl ProcessRunner for OnlyFiles<'_> {
    fn capture(&self, command: &CommandSpec) -> Result<CapturedOutput, ProbeError> {
        self.inner.capture(command)
    }

    fn run_inherited(&self, command: &CommandSpec) -> Result<ExitState, ProbeError> {
        self.inner.run_inherited(command)
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.present.iter().any(|p| p == path)
    }
}

#[test]
fn test_files_next_to_launcher_found_outside_working_directory() {
    let launcher_dir = host::launcher_dir().unwrap();
    let script = launcher_dir.join(DASHBOARD_SCRIPT);
    let data = launcher_dir.join("data.xlsx");
    let runner = MockRunner::healthy();
    let files = OnlyFiles {
        inner: &runner,
        present: vec![script.clone(), data.clone()],
    };
    let config = LauncherConfig {
        interpreter: Some("python3".to_string()),
        ..LauncherConfig::default()
    };

    let outcome = run_plan(&config, None, &files).unwrap();

    assert!(outcome.was_delegated());
    let spawned = runner.spawned();
    assert_eq!(spawned[0].args, vec![script.display().to_string()]);
    assert_eq!(
        spawned[0].env,
        vec![("DATA_FILE_PATH".to_string(), data.display().to_string())]
    );
    match &outcome.report().check("ART-001").unwrap().result {
        Some(CheckResult::Pass { message, .. }) => {
            assert_eq!(message, &format!("found {}", data.display()))
        }
        other => panic!("expected Pass, got {:?}", other),
    }
}

#[test]
fn test_missing_file_lists_launcher_folder_and_working_directory() {
    let launcher_dir = host::launcher_dir().unwrap();
    let runner = MockRunner::healthy();
    let files = OnlyFiles {
        inner: &runner,
        present: vec![launcher_dir.join(DASHBOARD_SCRIPT)],
    };
    let config = LauncherConfig {
        interpreter: Some("python3".to_string()),
        ..LauncherConfig::default()
    };

    let outcome = run_plan(&config, None, &files).unwrap();

    match outcome.error() {
        Some(LaunchError::ArtifactMissing { searched, .. }) => assert_eq!(
            searched,
            &vec![launcher_dir.join("data.xlsx"), PathBuf::from("./data.xlsx")]
        ),
        other => panic!("expected ArtifactMissing, got {:?}", other),
    }
    assert!(runner.spawned().is_empty());
}

#[test]
fn test_categorize_substitutes_placeholders() {
    let dir = TempDir::new().unwrap();
    for name in [
        "auto_categorizer.py",
        "product1.xlsx",
        "sku_vkus.xlsx",
        "knowledge_base.json",
        "brands_db.json",
        "example_input.csv",
    ] {
        touch(dir.path(), name);
    }
    let runner = MockRunner::healthy();

    let outcome = run_plan(&config_in(dir.path()), Some("categorize"), &runner).unwrap();

    assert!(outcome.was_delegated());
    let path = |name: &str| dir.path().join(name).display().to_string();
    assert_eq!(
        runner.spawned()[0].args,
        vec![
            path("auto_categorizer.py"),
            "-i".to_string(),
            path("example_input.csv"),
            "-p".to_string(),
            path("product1.xlsx"),
            "-s".to_string(),
            path("sku_vkus.xlsx"),
        ]
    );
    assert!(runner.spawned()[0].env.is_empty());
}

#[test]
fn test_categorize_without_knowledge_base_points_to_train() {
    let dir = TempDir::new().unwrap();
    for name in ["auto_categorizer.py", "product1.xlsx", "sku_vkus.xlsx", "example_input.csv"] {
        touch(dir.path(), name);
    }
    let runner = MockRunner::healthy();

    let outcome = run_plan(&config_in(dir.path()), Some("categorize"), &runner).unwrap();

    let error = outcome.error().expect("launch should abort");
    match error {
        LaunchError::ArtifactMissing { label, .. } => assert_eq!(label, "knowledge-base"),
        other => panic!("expected ArtifactMissing, got {:?}", other),
    }
    assert!(error.details().contains("'train'"));
}

#[test]
fn test_full_cycle_passes_train_flag() {
    let dir = TempDir::new().unwrap();
    for name in ["auto_categorizer.py", "product1.xlsx", "sku_vkus.xlsx", "example_input.csv"] {
        touch(dir.path(), name);
    }
    let runner = MockRunner::healthy();

    let outcome = run_plan(&config_in(dir.path()), Some("full-cycle"), &runner).unwrap();

    assert!(outcome.was_delegated());
    assert_eq!(runner.spawned()[0].args.last().map(String::as_str), Some("--train"));
}

#[test]
fn test_demo_runs_without_input_files() {
    let dir = TempDir::new().unwrap();
    for name in ["demo.py", "product_parser.py", "brand_matcher.py"] {
        touch(dir.path(), name);
    }
    let runner = MockRunner::healthy();

    let outcome = run_plan(&config_in(dir.path()), Some("demo"), &runner).unwrap();

    assert!(outcome.was_delegated());
    assert_eq!(
        ids(&outcome),
        vec!["PRE-001", "PRE-002", "ART-001", "ART-002", "ART-003", "RUN-001"]
    );
    assert_eq!(
        runner.spawned()[0].args,
        vec![dir.path().join("demo.py").display().to_string()]
    );
}

#[test]
fn test_demo_without_helper_module_aborts() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "demo.py");
    touch(dir.path(), "product_parser.py");
    let runner = MockRunner::healthy();

    let outcome = run_plan(&config_in(dir.path()), Some("demo"), &runner).unwrap();

    match outcome.error() {
        Some(LaunchError::ArtifactMissing { label, hint, .. }) => {
            assert_eq!(label, "brand-matcher");
            assert!(hint.contains("brand_matcher.py"));
        }
        other => panic!("expected ArtifactMissing, got {:?}", other),
    }
    assert!(runner.spawned().is_empty());
}

#[test]
fn test_custom_executable_plan_skips_interpreter() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(dir.path());
    config.plans.insert(
        "notebook".to_string(),
        PlanDefinition {
            description: "Jupyter".to_string(),
            program: Some("jupyter".to_string()),
            require_interpreter: false,
            args: vec!["notebook".to_string()],
            ..PlanDefinition::default()
        },
    );
    let runner = MockRunner::empty();

    let outcome = run_plan(&config, Some("notebook"), &runner).unwrap();

    assert!(outcome.was_delegated());
    assert!(runner.captured().is_empty());
    assert_eq!(runner.spawned()[0].program, "jupyter");
    assert_eq!(runner.spawned()[0].args, vec!["notebook".to_string()]);
}

#[test]
fn test_every_passing_prerequisite_set_reaches_delegation() {
    let dir = dashboard_dir();
    let packages = ["pandas", "numpy", "plotly"];

    // Every subset of the package list
    for mask in 0..(1u32 << packages.len()) {
        let chosen: Vec<&str> = packages
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, p)| *p)
            .collect();

        let mut prerequisites = vec![Prerequisite::interpreter(None, None)];
        prerequisites.extend(chosen.iter().map(|p| Prerequisite::library(p)));
        let plan = LaunchPlan {
            name: "subset".to_string(),
            description: String::new(),
            prerequisites,
            artifacts: vec![ArtifactReference::new(
                "script",
                vec![dir.path().join(DASHBOARD_SCRIPT)],
                "script",
            )],
            target: DelegationTarget::script("script"),
        };
        plan.validate().unwrap();

        let runner = MockRunner::with_python("3.12.1", &chosen);
        let orchestrator = LaunchOrchestrator::new(
            OrchestratorConfig {
                interpreter: Some("python3".to_string()),
                install_missing: false,
            },
            &runner,
        );

        let outcome = orchestrator.run(&plan);
        assert!(outcome.was_delegated(), "subset {:?}", chosen);
        assert_eq!(runner.spawned().len(), 1);
    }
}

#[test]
fn test_fixed_executable_target() {
    let dir = dashboard_dir();
    let plan = LaunchPlan {
        name: "server".to_string(),
        description: String::new(),
        prerequisites: Vec::new(),
        artifacts: vec![ArtifactReference::new("data", vec![dir.path().join("data.xlsx")], "data")
            .exported_as("BI_DATA")],
        target: DelegationTarget {
            program: Program::Executable("bi-server".to_string()),
            args: vec!["--input={data}".to_string()],
        },
    };
    let runner = MockRunner::empty();

    let outcome = LaunchOrchestrator::new(OrchestratorConfig::default(), &runner).run(&plan);

    assert!(outcome.was_delegated());
    let spawned = &runner.spawned()[0];
    let data = dir.path().join("data.xlsx").display().to_string();
    assert_eq!(spawned.program, "bi-server");
    assert_eq!(spawned.args, vec![format!("--input={}", data)]);
    assert_eq!(spawned.env, vec![("BI_DATA".to_string(), data)]);
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl LaunchObserver for Recorder {
    fn step_completed(&mut self, check: &Check) {
        self.events.push(check.id.clone());
    }

    fn delegating(&mut self, command: &CommandSpec) {
        self.events.push(format!("launch {}", command.program));
    }
}

#[test]
fn test_observer_sees_steps_in_order() {
    let dir = dashboard_dir();
    touch(dir.path(), "bi_dashboard.py");
    let runner = MockRunner::healthy();
    let config = config_in(dir.path());
    let plan = resolve_plan(&config, Some("report")).unwrap();
    let orchestrator = LaunchOrchestrator::new(OrchestratorConfig::from_launcher(&config), &runner);

    let mut recorder = Recorder::default();
    let outcome = orchestrator.run_with(&plan, &mut recorder);

    assert!(outcome.was_delegated());
    assert_eq!(
        recorder.events,
        vec![
            "PRE-001",
            "PRE-002",
            "PRE-003",
            "PRE-004",
            "PRE-005",
            "ART-001",
            "ART-002",
            "launch python3",
            "RUN-001"
        ]
    );
}

#[test]
fn test_preflight_never_installs_or_spawns() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), DASHBOARD_SCRIPT);
    let runner = MockRunner::with_python("3.11.4", &["pandas", "openpyxl", "dash", "numpy"])
        .installable("plotly", "plotly");
    let config = config_in(dir.path());
    let plan = resolve_plan(&config, None).unwrap();

    let outcome = LaunchOrchestrator::new(OrchestratorConfig::from_launcher(&config), &runner)
        .preflight(&plan);

    assert!(runner.spawned().is_empty());
    assert!(runner.install_attempts().is_empty());
    assert!(outcome.command.is_none());

    // Every check ran despite the failures
    let report = &outcome.report;
    assert_eq!(report.checks.len(), 9);
    assert_eq!(report.summary().failed, 3);
    assert!(report.check(DELEGATION_CHECK_ID).is_none());
    match &report.check("PRE-004").unwrap().result {
        Some(CheckResult::Fail { details, .. }) => {
            assert!(details.contains("python3 -m pip install plotly -q"));
        }
        other => panic!("expected Fail, got {:?}", other),
    }
}

#[test]
fn test_preflight_returns_command_when_ready() {
    let dir = dashboard_dir();
    let runner = MockRunner::healthy();
    let config = config_in(dir.path());
    let plan = resolve_plan(&config, None).unwrap();

    let outcome = LaunchOrchestrator::new(OrchestratorConfig::from_launcher(&config), &runner)
        .preflight(&plan);

    assert!(!outcome.report.has_failures());
    let command = outcome.command.unwrap();
    assert_eq!(command.program, "python3");
    assert_eq!(command.env[0].0, "DATA_FILE_PATH");
    assert!(runner.spawned().is_empty());
}

#[test]
fn test_preflight_without_interpreter_skips_libraries() {
    let dir = dashboard_dir();
    let runner = MockRunner::empty();
    let config = config_in(dir.path());
    let plan = resolve_plan(&config, None).unwrap();

    let outcome = LaunchOrchestrator::new(OrchestratorConfig::from_launcher(&config), &runner)
        .preflight(&plan);

    let report = &outcome.report;
    assert!(matches!(report.check("PRE-001").unwrap().result, Some(CheckResult::Fail { .. })));
    let libraries = report.by_kind(CheckKind::Library);
    assert_eq!(libraries.len(), 6);
    assert!(libraries
        .iter()
        .all(|c| matches!(c.result, Some(CheckResult::Skip { .. }))));
    // Files are still checked
    assert_eq!(report.by_kind(CheckKind::Artifact).len(), 2);
    assert_eq!(runner.captured().len(), 1);
}
