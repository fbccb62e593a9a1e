//! The single fatal error condition and the routine that reports it.
//!
//! Nothing in this crate returns an `OwnershipViolation` to a caller. A
//! failed check hands the violation to [`fatal`], which emits a diagnostic
//! and aborts the process without unwinding.

use core::panic::Location;
use thiserror::Error;

/// Why an ownership check failed.
///
/// The variants only shape the diagnostic text; every violation is reported
/// and handled the same way.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipViolation {
    /// An `ExclusiveView` is live.
    #[error("value is mutably borrowed")]
    MutablyBorrowed,

    /// One or more `SharedView`s are live.
    #[error("value is immutably borrowed by {count} shared view(s)")]
    SharedBorrowed {
        /// Live shared views at the time of the check.
        count: usize,
    },

    /// The slot no longer holds a value.
    #[error("value has already been destroyed or moved out")]
    Vacant,

    /// An `OwnershipToken` holds responsibility for the value.
    #[error("ownership of the value is delegated to a token")]
    Delegated,

    /// The handle was relocated and is now a husk.
    #[error("handle was relocated and is no longer valid")]
    Relocated,

    /// Too many live shared views to count.
    #[error("shared borrow count overflowed")]
    CountOverflow,
}

/// Report `violation` raised by `op` at `location` and abort the process.
#[cold]
#[inline(never)]
pub(crate) fn fatal(
    op: &'static str,
    violation: OwnershipViolation,
    location: &'static Location<'static>,
) -> ! {
    tracing::error!(
        op,
        %violation,
        %location,
        "ownership violation; aborting"
    );
    #[cfg(feature = "stderr-report")]
    eprintln!("{}", diagnostic(op, violation, location));
    std::process::abort();
}

#[cfg_attr(not(any(test, feature = "stderr-report")), allow(dead_code))]
fn diagnostic(
    op: &'static str,
    violation: OwnershipViolation,
    location: &'static Location<'static>,
) -> String {
    format!(
        "ownership violation in {op} at {}:{}: {violation}",
        location.file(),
        location.line()
    )
}

#[cfg(test)]
mod tests {
    use super::{diagnostic, OwnershipViolation};
    use core::panic::Location;

    #[test]
    fn messages_name_the_broken_rule() {
        assert_eq!(
            OwnershipViolation::SharedBorrowed { count: 2 }.to_string(),
            "value is immutably borrowed by 2 shared view(s)"
        );
        assert_eq!(
            OwnershipViolation::Relocated.to_string(),
            "handle was relocated and is no longer valid"
        );
    }

    #[test]
    fn diagnostic_carries_op_and_location() {
        let here = Location::caller();
        let line = diagnostic("Owner::get", OwnershipViolation::MutablyBorrowed, here);
        assert!(line.starts_with("ownership violation in Owner::get at "));
        assert!(line.contains(here.file()));
        assert!(line.ends_with(": value is mutably borrowed"));
    }
}
