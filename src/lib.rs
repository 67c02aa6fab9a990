//! Carbaudit, a compliance pre-audit service for JCM carbon-credit project
//! documents.
//!
//! A submitted Project Design Document (and optional calculation spreadsheet)
//! flows through one stateless pipeline: heuristic text extraction, context
//! budgeting, prompt assembly against the bundled rule corpus, one evaluation
//! call to the AI gateway, lenient parsing of the reply, validation against
//! the corpus, and aggregation into an [`pipeline::AuditReport`]. Reports are
//! persisted per owner when the caller authenticates; anonymous audits are
//! evaluated and returned without being stored.

pub mod api;
pub mod config;
pub mod db;
pub mod pipeline;
