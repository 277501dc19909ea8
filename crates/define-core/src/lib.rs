//! Editing core for Define-XML documents.
//!
//! Every edit is an [`Action`] reduced into a new immutable snapshot of the
//! document. Unchanged tables are shared between snapshots, which keeps
//! undo/redo cheap.
//!
//! # Module Organization
//!
//! - [`action`]: the action protocol
//! - [`cascade`]: deletion closures for cascading deletes
//! - [`reducers`]: per-collection reducers, the metadata version aggregator and the root reducer
//! - [`history`], [`store`]: undo/redo and the store that owns the document
//! - [`intent`]: deletes expanded against the current document
//! - [`selectors`], [`integrity`]: read model and structural checks

pub mod action;
pub mod cascade;
pub mod context;
pub mod error;
pub mod history;
pub mod integrity;
pub mod intent;
pub mod reducers;
pub mod selectors;
pub mod store;

pub use action::Action;
pub use cascade::DeletionClosure;
pub use context::{ReduceContext, Rename};
pub use error::{CoreError, Result};
pub use history::History;
pub use integrity::{IntegrityIssue, IssueCategory, check_integrity};
pub use intent::{Intent, ScriptStep};
pub use selectors::{DocumentSummary, document_summary};
pub use store::{DefineStore, DispatchOutcome, StoreConfig};
