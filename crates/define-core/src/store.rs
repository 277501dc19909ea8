//! The document store: the single owner of the current document and its
//! history.
//!
//! Hosts construct one [`DefineStore`] per open editor and route every
//! action through [`DefineStore::dispatch`]. Reducers never see history
//! actions; the store handles them here.

use tracing::{debug, info, warn};

use define_model::{DefineDocument, MetaDataVersion};

use crate::action::Action;
use crate::cascade::required_closure;
use crate::error::{CoreError, Result};
use crate::history::History;
use crate::integrity::check_integrity;
use crate::intent::{Intent, ScriptStep};
use crate::reducers::odm;

/// Store behaviour chosen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of undo steps; `None` keeps everything.
    pub history_limit: Option<usize>,
    /// Run the integrity checker on every candidate state before committing.
    pub verify_integrity: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: Some(100),
            verify_integrity: false,
        }
    }
}

/// What a dispatch did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A new state was recorded.
    Applied,
    /// The action produced the current state again; nothing was recorded.
    Unchanged,
    Undone,
    Redone,
    /// `UNDO` or `REDO` with nothing to move to.
    Nothing,
}

impl DispatchOutcome {
    pub fn changed_document(self) -> bool {
        matches!(self, Self::Applied | Self::Undone | Self::Redone)
    }
}

#[derive(Debug, Clone)]
pub struct DefineStore {
    history: History<DefineDocument>,
    config: StoreConfig,
}

impl Default for DefineStore {
    fn default() -> Self {
        Self::new(DefineDocument::default(), StoreConfig::default())
    }
}

impl DefineStore {
    pub fn new(document: DefineDocument, config: StoreConfig) -> Self {
        Self {
            history: History::new(document, config.history_limit),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn document(&self) -> &DefineDocument {
        self.history.present()
    }

    pub fn metadata_version(&self) -> Option<&MetaDataVersion> {
        self.document().metadata_version()
    }

    pub fn history(&self) -> &History<DefineDocument> {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply one action. A rejected action leaves the document and the
    /// history untouched.
    pub fn dispatch(&mut self, action: &Action) -> Result<DispatchOutcome> {
        debug!(action = action.kind(), "dispatch");
        match action {
            Action::Undo => return Ok(self.undo()),
            Action::Redo => return Ok(self.redo()),
            Action::ClearHistory => {
                self.history.clear();
                info!("history cleared");
                return Ok(DispatchOutcome::Unchanged);
            }
            _ => {}
        }
        self.check_closure(action)?;

        let next = odm::reduce(self.history.present(), action).inspect_err(|error| {
            warn!(action = action.kind(), %error, "action rejected");
        })?;
        if next == *self.history.present() {
            return Ok(DispatchOutcome::Unchanged);
        }
        if self.config.verify_integrity {
            self.verify(action, &next)?;
        }

        if let Action::LoadDocument { .. } = action {
            self.history.reset(next);
        } else {
            self.history.push(next);
        }
        Ok(DispatchOutcome::Applied)
    }

    /// Expand an intent against the current document and dispatch the result.
    pub fn dispatch_intent(&mut self, intent: &Intent) -> Result<DispatchOutcome> {
        let Some(mdv) = self.metadata_version() else {
            return Err(CoreError::invalid(format!(
                "{} needs an open define",
                intent.name()
            )));
        };
        let action = intent.expand(mdv);
        debug!(intent = intent.name(), action = action.kind(), "intent expanded");
        self.dispatch(&action)
    }

    pub fn dispatch_step(&mut self, step: &ScriptStep) -> Result<DispatchOutcome> {
        match step {
            ScriptStep::Intent(intent) => self.dispatch_intent(intent),
            ScriptStep::Action(action) => self.dispatch(action),
        }
    }

    fn undo(&mut self) -> DispatchOutcome {
        if self.history.undo() {
            info!(past = self.history.past_len(), future = self.history.future_len(), "undo");
            DispatchOutcome::Undone
        } else {
            DispatchOutcome::Nothing
        }
    }

    fn redo(&mut self) -> DispatchOutcome {
        if self.history.redo() {
            info!(past = self.history.past_len(), future = self.history.future_len(), "redo");
            DispatchOutcome::Redone
        } else {
            DispatchOutcome::Nothing
        }
    }

    /// Reject a delete whose closure would leave orphans behind.
    fn check_closure(&self, action: &Action) -> Result<()> {
        let (Some(closure), Some(mdv)) = (action.closure(), self.metadata_version()) else {
            return Ok(());
        };
        let required = required_closure(mdv, closure);
        let Some(omitted) = closure.first_omission(&required) else {
            return Ok(());
        };
        warn!(action = action.kind(), %omitted, "incomplete closure, action rejected");
        Err(CoreError::IncompleteClosure {
            action: action.kind(),
            omitted,
        })
    }

    fn verify(&self, action: &Action, next: &DefineDocument) -> Result<()> {
        let Some(mdv) = next.metadata_version() else {
            return Ok(());
        };
        let issues = check_integrity(mdv);
        let Some(first) = issues.first() else {
            return Ok(());
        };
        warn!(
            action = action.kind(),
            count = issues.len(),
            first = %first,
            "integrity drift, action rejected"
        );
        Err(CoreError::IntegrityDrift {
            count: issues.len(),
            first: first.to_string(),
        })
    }
}
