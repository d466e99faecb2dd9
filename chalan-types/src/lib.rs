//! # Chalan Types
//!
//! Domain types and port traits for the chalan (fee voucher) issuance
//! service. This crate has ZERO external IO dependencies - only data
//! structures, business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Amount, Voucher, Ledger, Counter)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for service boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Amount, Counter, InstallmentEntry, InstallmentId, InstallmentStatus, Ledger, LedgerId,
    Numbering, OrgId, PaymentEvent, RecipientId, Voucher, VoucherId, VoucherStatus,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use ports::{OrganizationDirectory, RecipientDirectory, RecipientProfile, VoucherRepository};
