//! Configuration tests.
//!
//! Loading YAML files, layering environment and command line overrides, and
//! turning configured plans into launch plans.

use bi_launcher::config::{
    load_config, resolve_config, ConfigError, ConfigOverrides, LauncherConfig, CONFIG_PATH_ENV,
    DATA_FILE_ENV, INTERPRETER_ENV, LEGACY_DATA_FILE_ENV,
};
use bi_launcher::plan::profiles::{available_plans, resolve_plan};
use bi_launcher::plan::{PlanError, PrerequisiteKind, Program, Version};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LAUNCHER_VARS: [&str; 4] = [
    CONFIG_PATH_ENV,
    DATA_FILE_ENV,
    LEGACY_DATA_FILE_ENV,
    INTERPRETER_ENV,
];

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("launcher.yaml");
    fs::write(&path, content).unwrap();
    path
}

/// Run `f` with every launcher variable cleared, then `vars` set
fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let mut all: Vec<(&str, Option<&str>)> =
        LAUNCHER_VARS.iter().map(|name| (*name, None)).collect();
    all.extend(vars.iter().map(|(k, v)| (*k, Some(*v))));
    temp_env::with_vars(all, f)
}

const FULL_CONFIG: &str = r#"
interpreter: /usr/local/bin/python3.11
minimum_version: "3.10"
default_plan: weekly
data_file: /srv/bi/sales.xlsx
search_dirs:
  - /srv/bi
  - .
install_missing: false
pause_on_error: false
plans:
  weekly:
    description: Weekly sales report
    script: weekly_report.py
    packages:
      - pandas
      - package: scikit-learn
        module: sklearn
    artifacts:
      - label: template
        paths: [templates/weekly.html, /etc/bi/weekly.html]
        hint: Copy the report template into templates/
    args: ["--template", "{template}"]
"#;

#[test]
fn test_full_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), FULL_CONFIG);

    let config = load_config(Some(&path)).unwrap();

    assert_eq!(config.interpreter.as_deref(), Some("/usr/local/bin/python3.11"));
    assert_eq!(config.minimum_version, Some(Version::new(3, 10, 0)));
    assert_eq!(config.recommended_version, Some(Version::new(3, 9, 0)));
    assert_eq!(config.default_plan, "weekly");
    assert_eq!(config.data_file, Some(PathBuf::from("/srv/bi/sales.xlsx")));
    assert_eq!(config.search_dirs, vec![PathBuf::from("/srv/bi"), PathBuf::from(".")]);
    assert!(!config.install_missing);
    assert!(!config.pause_on_error);
    assert!(config.plans.contains_key("weekly"));
}

#[test]
fn test_configured_plan_resolves() {
    let dir = TempDir::new().unwrap();
    let config = load_config(Some(&write_config(dir.path(), FULL_CONFIG))).unwrap();

    let plan = resolve_plan(&config, None).unwrap();

    assert_eq!(plan.name, "weekly");
    assert_eq!(plan.prerequisites.len(), 3);
    assert_eq!(
        plan.prerequisites[2].kind,
        PrerequisiteKind::Library {
            package: "scikit-learn".to_string(),
            module: "sklearn".to_string(),
        }
    );

    let template = plan.artifact("template").unwrap();
    assert_eq!(
        template.candidates,
        vec![
            PathBuf::from("/srv/bi/templates/weekly.html"),
            PathBuf::from("./templates/weekly.html"),
            PathBuf::from("/etc/bi/weekly.html"),
        ]
    );
    assert_eq!(template.hint, "Copy the report template into templates/");

    assert_eq!(plan.target.program, Program::Interpreter);
    assert_eq!(plan.target.args, vec!["{script}", "--template", "{template}"]);
}

#[test]
fn test_configured_plans_are_listed() {
    let dir = TempDir::new().unwrap();
    let config = load_config(Some(&write_config(dir.path(), FULL_CONFIG))).unwrap();

    let plans = available_plans(&config);

    let weekly = plans.iter().find(|p| p.name == "weekly").unwrap();
    assert!(weekly.is_default);
    assert!(weekly.configured);
    let dashboard = plans.iter().find(|p| p.name == "dashboard").unwrap();
    assert!(!dashboard.is_default);
    assert!(!dashboard.configured);
}

#[test]
fn test_configured_plan_replaces_builtin() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "plans:\n  dashboard:\n    description: Lite dashboard\n    script: lite.py\n",
    );
    let config = load_config(Some(&path)).unwrap();

    let plan = resolve_plan(&config, Some("dashboard")).unwrap();

    assert_eq!(plan.description, "Lite dashboard");
    assert_eq!(plan.prerequisites.len(), 1);
    assert!(plan.artifact("data").is_none());
}

#[test]
fn test_unknown_plan() {
    let config = LauncherConfig::default();

    match resolve_plan(&config, Some("forecast")) {
        Err(ConfigError::UnknownPlan { name, available }) => {
            assert_eq!(name, "forecast");
            assert!(available.contains("dashboard"));
            assert!(available.contains("full-cycle"));
        }
        other => panic!("expected UnknownPlan, got {:?}", other),
    }
}

#[test]
fn test_plan_with_unknown_placeholder_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "plans:\n  broken:\n    script: run.py\n    args: [\"{missing}\"]\n",
    );
    let config = load_config(Some(&path)).unwrap();

    match resolve_plan(&config, Some("broken")) {
        Err(ConfigError::InvalidPlan { plan, source }) => {
            assert_eq!(plan, "broken");
            assert_eq!(source, PlanError::UnknownPlaceholder("missing".to_string()));
        }
        other => panic!("expected InvalidPlan, got {:?}", other),
    }
}

#[test]
fn test_plan_without_script_or_program_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "plans:\n  empty:\n    description: nothing\n");
    let config = load_config(Some(&path)).unwrap();

    assert!(matches!(
        resolve_plan(&config, Some("empty")),
        Err(ConfigError::InvalidPlan { source: PlanError::NothingToRun, .. })
    ));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.yaml");

    match load_config(Some(&missing)) {
        Err(ConfigError::Read { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected Read error, got {:?}", other),
    }
}

#[test]
fn test_missing_default_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("launcher.yaml");

    let config =
        with_env(&[(CONFIG_PATH_ENV, missing.to_str().unwrap())], || load_config(None)).unwrap();

    assert_eq!(config, LauncherConfig::default());
}

#[test]
fn test_config_location_from_environment() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "default_plan: train\n");

    let config =
        with_env(&[(CONFIG_PATH_ENV, path.to_str().unwrap())], || load_config(None)).unwrap();

    assert_eq!(config.default_plan, "train");
}

#[test]
fn test_invalid_yaml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "install_missing: [not a bool\n");

    assert!(matches!(load_config(Some(&path)), Err(ConfigError::Parse { .. })));
}

#[test]
fn test_precedence_cli_over_env_over_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "interpreter: python-from-file\ndata_file: /file/data.xlsx\n",
    );

    // File only
    let config =
        with_env(&[], || resolve_config(Some(&path), &ConfigOverrides::default())).unwrap();
    assert_eq!(config.interpreter.as_deref(), Some("python-from-file"));
    assert_eq!(config.data_file, Some(PathBuf::from("/file/data.xlsx")));

    // Environment over file
    let config = with_env(
        &[(INTERPRETER_ENV, "python-from-env"), (DATA_FILE_ENV, "/env/data.xlsx")],
        || resolve_config(Some(&path), &ConfigOverrides::default()),
    )
    .unwrap();
    assert_eq!(config.interpreter.as_deref(), Some("python-from-env"));
    assert_eq!(config.data_file, Some(PathBuf::from("/env/data.xlsx")));

    // Command line over environment
    let overrides = ConfigOverrides {
        interpreter: Some("python-from-cli".to_string()),
        data_file: Some(PathBuf::from("/cli/data.xlsx")),
        no_install: true,
        no_pause: true,
    };
    let config = with_env(
        &[(INTERPRETER_ENV, "python-from-env"), (DATA_FILE_ENV, "/env/data.xlsx")],
        || resolve_config(Some(&path), &overrides),
    )
    .unwrap();
    assert_eq!(config.interpreter.as_deref(), Some("python-from-cli"));
    assert_eq!(config.data_file, Some(PathBuf::from("/cli/data.xlsx")));
    assert!(!config.install_missing);
    assert!(!config.pause_on_error);
}

#[test]
fn test_legacy_data_file_variable() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "");

    let config = with_env(&[(LEGACY_DATA_FILE_ENV, "/legacy/data.xlsx")], || {
        resolve_config(Some(&path), &ConfigOverrides::default())
    })
    .unwrap();

    assert_eq!(config.data_file, Some(PathBuf::from("/legacy/data.xlsx")));

    // The data file becomes the only candidate of the data artifact
    let plan = resolve_plan(&config, Some("dashboard")).unwrap();
    assert_eq!(
        plan.artifact("data").unwrap().candidates,
        vec![PathBuf::from("/legacy/data.xlsx")]
    );
}
