//! Command implementations behind `define-editor`.
//!
//! Each command loads a JSON document into a [`DefineStore`], works through
//! the store and returns a plain result value; printing lives in
//! [`crate::summary`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span};

use define_core::selectors::{key_variables, ordered_item_groups, variables_of};
use define_core::{
    Action, DefineStore, DispatchOutcome, DocumentSummary, IntegrityIssue, ScriptStep,
    StoreConfig, check_integrity, document_summary,
};
use define_model::{DefineDocument, Describable, MetaDataVersion, OdmAttributesPatch};

/// Inputs of `define-editor apply`.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub document: PathBuf,
    pub script: PathBuf,
    pub output: Option<PathBuf>,
    /// Forces integrity verification regardless of settings.
    pub verify: bool,
}

/// What one script step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// 1-based position in the script.
    pub index: usize,
    pub label: String,
    pub outcome: DispatchOutcome,
}

#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub steps: Vec<StepReport>,
    /// Set when the edited document was written.
    pub output: Option<PathBuf>,
    pub summary: Option<DocumentSummary>,
    pub issues: Vec<IntegrityIssue>,
}

impl ApplyResult {
    pub fn changed_document(&self) -> bool {
        self.steps.iter().any(|step| step.outcome.changed_document())
    }
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub define_name: String,
    pub issues: Vec<IntegrityIssue>,
}

/// One dataset row of `define-editor summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRow {
    pub name: String,
    pub label: Option<String>,
    pub variables: usize,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub define_name: String,
    pub model: String,
    pub datasets: Vec<DatasetRow>,
    pub totals: DocumentSummary,
}

/// Read a JSON document and open it in a fresh store.
pub fn open_document(path: &Path, config: StoreConfig) -> Result<DefineStore> {
    let document = load_document(path)?;
    let mut store = DefineStore::new(DefineDocument::default(), config);
    store
        .dispatch(&Action::LoadDocument { document })
        .with_context(|| format!("open {}", path.display()))?;
    Ok(store)
}

pub fn load_document(path: &Path) -> Result<DefineDocument> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read document {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse document {}", path.display()))
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read script {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse script {}", path.display()))
}

fn require_define(store: &DefineStore, path: &Path) -> Result<MetaDataVersion> {
    match store.metadata_version() {
        Some(mdv) => Ok(mdv.clone()),
        None => bail!("{} contains no define", path.display()),
    }
}

fn step_label(step: &ScriptStep) -> String {
    match step {
        ScriptStep::Intent(intent) => format!("intent {}", intent.name()),
        ScriptStep::Action(action) => action.kind().to_string(),
    }
}

/// Run a script against a document. The first rejected step aborts the run
/// and nothing is written.
pub fn run_apply(options: &ApplyOptions, mut config: StoreConfig) -> Result<ApplyResult> {
    let span = info_span!("apply", document = %options.document.display());
    let _guard = span.enter();

    // Loading must not trip verification of a document that is already broken.
    let verify = config.verify_integrity || options.verify;
    config.verify_integrity = false;
    let mut store = open_document(&options.document, config.clone())?;
    let script = load_script(&options.script)?;
    if verify {
        store = DefineStore::new(
            store.document().clone(),
            StoreConfig {
                verify_integrity: true,
                ..config
            },
        );
    }
    info!(steps = script.len(), verify, "applying script");

    let mut steps = Vec::with_capacity(script.len());
    for (offset, step) in script.iter().enumerate() {
        let index = offset + 1;
        let label = step_label(step);
        let outcome = store
            .dispatch_step(step)
            .with_context(|| format!("step {index} ({label}) was rejected"))?;
        debug!(index, label = %label, ?outcome, "step applied");
        steps.push(StepReport {
            index,
            label,
            outcome,
        });
    }

    let mut result = ApplyResult {
        steps,
        output: None,
        summary: store.metadata_version().map(document_summary),
        issues: store
            .metadata_version()
            .map(check_integrity)
            .unwrap_or_default(),
    };

    if let Some(output) = &options.output {
        if result.changed_document() && store.document().odm.is_some() {
            stamp_creation_time(&mut store)?;
        }
        write_document(store.document(), output)?;
        info!(path = %output.display(), "document written");
        result.output = Some(output.clone());
    }
    Ok(result)
}

fn stamp_creation_time(store: &mut DefineStore) -> Result<()> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    store
        .dispatch(&Action::UpdateOdmAttributes {
            patch: OdmAttributesPatch {
                creation_date_time: Some(Some(now)),
                ..OdmAttributesPatch::default()
            },
        })
        .context("stamp creation time")?;
    Ok(())
}

pub fn write_document(document: &DefineDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(document).context("serialize document")?;
    fs::write(path, json).with_context(|| format!("write document {}", path.display()))
}

pub fn run_check(document: &Path) -> Result<CheckResult> {
    let span = info_span!("check", document = %document.display());
    let _guard = span.enter();
    let store = open_document(
        document,
        StoreConfig {
            verify_integrity: false,
            ..StoreConfig::default()
        },
    )?;
    let mdv = require_define(&store, document)?;
    let issues = check_integrity(&mdv);
    info!(issues = issues.len(), "integrity checked");
    Ok(CheckResult {
        define_name: mdv.name.clone(),
        issues,
    })
}

pub fn run_summary(document: &Path) -> Result<SummaryReport> {
    let store = open_document(
        document,
        StoreConfig {
            verify_integrity: false,
            ..StoreConfig::default()
        },
    )?;
    let mdv = require_define(&store, document)?;
    Ok(summarize(&mdv))
}

pub fn summarize(mdv: &MetaDataVersion) -> SummaryReport {
    let datasets = ordered_item_groups(mdv)
        .map(|group| DatasetRow {
            name: group.name.clone(),
            label: group.description(None).map(str::to_string),
            variables: variables_of(mdv, &group.oid).len(),
            keys: key_variables(mdv, &group.oid)
                .into_iter()
                .map(|(_, item_def)| item_def.name.clone())
                .collect(),
        })
        .collect();
    SummaryReport {
        define_name: mdv.name.clone(),
        model: mdv.model.to_string(),
        datasets,
        totals: document_summary(mdv),
    }
}
