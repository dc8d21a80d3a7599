//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into front-desk use-cases.
//! - Keep UI/FFI layers decoupled from the selected backend.

pub mod error;
pub mod package_service;
pub mod pickup_service;
pub mod resident_service;
pub mod summary_service;
