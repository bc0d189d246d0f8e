//! Built-in launch profiles and plan lookup.
//!
//! | Plan | Target script |
//! |------|---------------|
//! | `dashboard` | `professional_bi_dashboard.py` (interactive Dash app) |
//! | `report` | `bi_dashboard.py` (static HTML report) |
//! | `train` | `learning_engine.py` |
//! | `categorize` | `auto_categorizer.py` with an existing knowledge base |
//! | `full-cycle` | `auto_categorizer.py --train` |
//! | `demo` | `demo.py` (parser and matcher walkthrough, no input files) |
//!
//! The categorizer writes `<input>_updated.xlsx` next to its inputs when no
//! `-op`/`-os` output paths are given, so the built-in plans pass none. A
//! configured plan can add them as literal arguments.
//!
//! Plans declared in the configuration file replace built-ins of the same name.

use super::definition::{ArtifactDefinition, PlanDefinition};
use super::LaunchPlan;
use crate::config::{ConfigError, LauncherConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Plan used when none is named
pub const DEFAULT_PLAN: &str = "dashboard";

/// Label of the dashboard data file; `data_file` in the configuration overrides it.
pub const DATA_LABEL: &str = "data";

/// Environment variable through which the dashboards receive the data file path.
pub const DATA_FILE_ENV: &str = "DATA_FILE_PATH";

const DASHBOARD_PACKAGES: &[&str] = &[
    "pandas",
    "openpyxl",
    "plotly",
    "dash",
    "dash-bootstrap-components",
    "numpy",
];

const REPORT_PACKAGES: &[&str] = &["pandas", "numpy", "plotly", "openpyxl"];

const TRAINING_PACKAGES: &[&str] = &["pandas", "openpyxl", "rapidfuzz"];

const CATEGORIZER_PACKAGES: &[&str] = &["pandas", "numpy", "openpyxl", "rapidfuzz"];

const DEMO_PACKAGES: &[&str] = &["rapidfuzz"];

fn data_artifact() -> ArtifactDefinition {
    ArtifactDefinition::new(DATA_LABEL, "data.xlsx")
        .with_hint(
            "Put data.xlsx next to the launcher, or set data_file in the configuration \
             (or BI_LAUNCHER_DATA_FILE)",
        )
        .exported_as(DATA_FILE_ENV)
}

fn training_artifacts() -> Vec<ArtifactDefinition> {
    vec![
        ArtifactDefinition::new("products", "product1.xlsx").with_hint(
            "Put the product catalogue product1.xlsx next to the launcher or in the working folder",
        ),
        ArtifactDefinition::new("skus", "sku_vkus.xlsx").with_hint(
            "Put the flavour list sku_vkus.xlsx next to the launcher or in the working folder",
        ),
    ]
}

fn input_artifact() -> ArtifactDefinition {
    ArtifactDefinition::new("input", "example_input.csv").with_hint(
        "Put the new products to categorize in example_input.csv, \
         or declare a custom plan with another input path",
    )
}

/// Modules the demo imports from the toolkit folder
fn demo_artifacts() -> Vec<ArtifactDefinition> {
    ["product_parser.py", "brand_matcher.py"]
        .iter()
        .map(|file| {
            let label = file.trim_end_matches(".py").replace('_', "-");
            ArtifactDefinition::new(&label, file)
                .with_hint(&format!("Keep {} in the same folder as demo.py", file))
        })
        .collect()
}

fn packages(names: &[&str]) -> Vec<super::definition::PackageSpec> {
    names.iter().map(|name| (*name).into()).collect()
}

/// Definitions of every built-in plan, in display order
pub fn builtin_definitions() -> Vec<(&'static str, PlanDefinition)> {
    let categorize_args = vec![
        "-i".to_string(),
        "{input}".to_string(),
        "-p".to_string(),
        "{products}".to_string(),
        "-s".to_string(),
        "{skus}".to_string(),
    ];

    let mut categorize_artifacts = training_artifacts();
    categorize_artifacts.push(
        ArtifactDefinition::new("knowledge-base", "knowledge_base.json")
            .with_hint("Run the 'train' plan first to build knowledge_base.json"),
    );
    categorize_artifacts.push(
        ArtifactDefinition::new("brands", "brands_db.json")
            .with_hint("Run the 'train' plan first to build brands_db.json"),
    );
    categorize_artifacts.push(input_artifact());

    let mut full_cycle_artifacts = training_artifacts();
    full_cycle_artifacts.push(input_artifact());
    let mut full_cycle_args = categorize_args.clone();
    full_cycle_args.push("--train".to_string());

    vec![
        (
            "dashboard",
            PlanDefinition {
                description: "Interactive BI dashboard on http://localhost:8050".to_string(),
                script: Some(PathBuf::from("professional_bi_dashboard.py")),
                packages: packages(DASHBOARD_PACKAGES),
                artifacts: vec![data_artifact()],
                ..PlanDefinition::default()
            },
        ),
        (
            "report",
            PlanDefinition {
                description: "Static HTML BI report".to_string(),
                script: Some(PathBuf::from("bi_dashboard.py")),
                packages: packages(REPORT_PACKAGES),
                artifacts: vec![data_artifact()],
                ..PlanDefinition::default()
            },
        ),
        (
            "train",
            PlanDefinition {
                description: "Build the categorization knowledge base".to_string(),
                script: Some(PathBuf::from("learning_engine.py")),
                packages: packages(TRAINING_PACKAGES),
                artifacts: training_artifacts(),
                ..PlanDefinition::default()
            },
        ),
        (
            "categorize",
            PlanDefinition {
                description: "Categorize new products with the trained knowledge base".to_string(),
                script: Some(PathBuf::from("auto_categorizer.py")),
                packages: packages(CATEGORIZER_PACKAGES),
                artifacts: categorize_artifacts,
                args: categorize_args,
                ..PlanDefinition::default()
            },
        ),
        (
            "full-cycle",
            PlanDefinition {
                description: "Train, then categorize new products".to_string(),
                script: Some(PathBuf::from("auto_categorizer.py")),
                packages: packages(CATEGORIZER_PACKAGES),
                artifacts: full_cycle_artifacts,
                args: full_cycle_args,
                ..PlanDefinition::default()
            },
        ),
        (
            "demo",
            PlanDefinition {
                description: "Categorization demo on built-in sample names".to_string(),
                script: Some(PathBuf::from("demo.py")),
                packages: packages(DEMO_PACKAGES),
                artifacts: demo_artifacts(),
                ..PlanDefinition::default()
            },
        ),
    ]
}

/// All plan definitions: built-ins overlaid with configured plans
pub fn definitions(config: &LauncherConfig) -> BTreeMap<String, PlanDefinition> {
    let mut all: BTreeMap<String, PlanDefinition> = builtin_definitions()
        .into_iter()
        .map(|(name, definition)| (name.to_string(), definition))
        .collect();
    for (name, definition) in &config.plans {
        all.insert(name.clone(), definition.clone());
    }
    all
}

/// Resolve a plan by name (the configured default when `None`).
pub fn resolve_plan(
    config: &LauncherConfig,
    name: Option<&str>,
) -> Result<LaunchPlan, ConfigError> {
    let name = name.unwrap_or(&config.default_plan);
    let all = definitions(config);
    let definition = all.get(name).ok_or_else(|| ConfigError::UnknownPlan {
        name: name.to_string(),
        available: all.keys().cloned().collect::<Vec<_>>().join(", "),
    })?;

    definition
        .to_plan(name, &config.plan_context())
        .map_err(|source| ConfigError::InvalidPlan {
            plan: name.to_string(),
            source,
        })
}

/// Name, description and origin of every available plan
pub fn available_plans(config: &LauncherConfig) -> Vec<PlanSummary> {
    definitions(config)
        .into_iter()
        .map(|(name, definition)| PlanSummary {
            is_default: name == config.default_plan,
            configured: config.plans.contains_key(&name),
            name,
            description: definition.description,
            script: definition.script,
        })
        .collect()
}

/// Listing entry for `bi-launcher list`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PlanSummary {
    pub name: String,
    pub description: String,
    pub script: Option<PathBuf>,
    pub is_default: bool,
    /// Declared in the configuration file rather than built in
    pub configured: bool,
}
