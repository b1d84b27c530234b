//! Foundation types for cmdtree.
//!
//! This crate holds the pieces shared by every cmdtree crate: the error
//! taxonomy reported by parsing, registration and execution, and the
//! dispatch configuration model.

pub mod config;
pub mod error;
