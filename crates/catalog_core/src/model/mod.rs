//! Catalog domain model.
//!
//! # Responsibility
//! - Define canonical records for attributes, companies, product types and
//!   the products that reference them.
//! - Own normalization and validation rules that hold regardless of storage.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Deletion is represented by soft-delete tombstones (`is_deleted`).
//! - `code` values are normalized to lowercase before validation.

pub mod attribute;
pub mod common;
pub mod company;
pub mod product;
pub mod product_type;
