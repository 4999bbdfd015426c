//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Enforce referential guards inside the write transaction that mutates.
//!
//! # Invariants
//! - Write paths call the model's `validate()` before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `InUse`, `Conflict`)
//!   in addition to DB transport errors.

pub mod attribute_repo;
pub mod common;
pub mod company_repo;
pub mod product_repo;
pub mod product_type_repo;
