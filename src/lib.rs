//! runtime-borrows: single-owner and shared-or-exclusive borrowing,
//! checked at run time instead of compile time.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: let a value be owned at one place, have its destruction handed
//!   elsewhere without moving its storage, and be viewed by many readers
//!   or one writer, catching every misuse at the moment it happens.
//! - Handles:
//!   - `Owner<T>`: holds the value's storage and the ownership record.
//!   - `OwnershipToken<T>`: takes over responsibility for destroying the
//!     value; the storage stays in the `Owner`.
//!   - `SharedView<T>`: read-only borrow; many may coexist.
//!   - `ExclusiveView<T>`: read-write borrow; at most one, never alongside
//!     a `SharedView`.
//!
//! Ownership record
//! - One heap allocation per `Owner` holding the slot, an exclusive flag,
//!   a shared count and a delegated flag. Moving the `Owner` value does
//!   not move the record, so views and tokens keep a plain back-reference.
//! - Views and tokens never own the record. The checks below are what
//!   keeps those back-references from dangling: the owner refuses to free
//!   the record while anything is counted against it.
//!
//! Rules
//! - Reading through an owner or token needs no live view.
//! - A shared view needs no exclusive view; an exclusive view needs no
//!   view at all.
//! - An owner may be dropped or relocated only with no view and no
//!   delegation outstanding. While delegated, the owner may still lend
//!   views, but refuses to read, relocate or delegate again.
//! - A bound token may be dropped only with no view outstanding; dropping
//!   it destroys the value in place.
//! - `relocate` on a token or exclusive view leaves a husk. Husks fail
//!   every operation and their drop leaves the record untouched.
//!
//! Failure policy
//! - Every failed check is fatal: a diagnostic is emitted (a `tracing`
//!   error event, plus a stderr line with the default `stderr-report`
//!   feature) and the process aborts. Nothing unwinds and nothing is
//!   returned to the caller, so an invalid reference can never be used.
//!
//! Constraints
//! - Single-threaded: all handles are `!Send`/`!Sync`.
//! - Release is tied to `Drop`, so counts are restored on every exit
//!   path, including unwinding out of a panic.
//! - Shared-count overflow is fatal rather than wrapping.

mod exclusive;
mod lend;
mod owner;
mod record;
mod record_proptest;
mod shared;
mod token;
mod violation;

// Public surface
pub use exclusive::ExclusiveView;
pub use lend::Lender;
pub use owner::Owner;
pub use record::BorrowState;
pub use shared::SharedView;
pub use token::OwnershipToken;
pub use violation::OwnershipViolation;
