//! `OwnershipToken<T>`: takes over responsibility for destroying a value
//! whose storage stays inside an `Owner` somewhere else.
//!
//! A token is either bound to a record or a husk left behind by
//! `relocate`. Every operation on a husk is fatal, and dropping a husk
//! never touches the record.

use crate::exclusive::ExclusiveView;
use crate::owner::Owner;
use crate::record::{BorrowState, Record, RecordPtr};
use crate::shared::SharedView;
use crate::violation::{fatal, OwnershipViolation};
use core::fmt;
use core::ops::Deref;
use core::panic::Location;

/// A locus in the code which controls the lifetime of a `T` without storing
/// it.
///
/// Dropping a bound token destroys the value in place. Until then the
/// original `Owner` must stay alive and refuses every access of its own.
pub struct OwnershipToken<T> {
    record: Option<RecordPtr<T>>,
}

impl<T> OwnershipToken<T> {
    /// Take responsibility for `owner`'s value.
    ///
    /// Fatal if the value is borrowed, already delegated, or gone.
    #[track_caller]
    pub fn new(owner: &mut Owner<T>) -> Self {
        Self::bind(owner.lend_record(), "OwnershipToken::new")
    }

    #[track_caller]
    pub(crate) fn bind(record: RecordPtr<T>, op: &'static str) -> Self {
        // SAFETY: the owner lending `record` is alive for this call.
        let rec = unsafe { record.get() };
        rec.begin_delegation(op);
        Self {
            record: Some(record),
        }
    }

    #[track_caller]
    fn bound(&self, op: &'static str) -> &Record<T> {
        match &self.record {
            // SAFETY: while bound, `delegated` is set, so the owner refuses
            // to free the record.
            Some(ptr) => unsafe { ptr.get() },
            None => fatal(op, OwnershipViolation::Relocated, Location::caller()),
        }
    }

    /// Whether this token still holds responsibility for the value.
    pub fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    /// Read the value. Fatal on a relocated token or while a view is live.
    #[track_caller]
    pub fn get(&self) -> &T {
        let rec = self.bound("OwnershipToken::get");
        rec.check_unborrowed("OwnershipToken::get");
        // SAFETY: no view is live and an exclusive one needs `&mut self`.
        unsafe { rec.value("OwnershipToken::get") }
    }

    /// Borrow the value immutably.
    #[track_caller]
    pub fn borrow(&self) -> SharedView<T> {
        SharedView::acquire(
            self.lend_record("OwnershipToken::borrow"),
            "OwnershipToken::borrow",
        )
    }

    /// Borrow the value mutably.
    #[track_caller]
    pub fn borrow_mut(&mut self) -> ExclusiveView<T> {
        ExclusiveView::acquire(
            self.lend_record("OwnershipToken::borrow_mut"),
            "OwnershipToken::borrow_mut",
        )
    }

    /// Transfer responsibility to a new token; this one becomes a husk.
    #[track_caller]
    pub fn relocate(&mut self) -> OwnershipToken<T> {
        match self.record.take() {
            Some(record) => {
                tracing::trace!("ownership token relocated");
                Self {
                    record: Some(record),
                }
            }
            None => fatal(
                "OwnershipToken::relocate",
                OwnershipViolation::Relocated,
                Location::caller(),
            ),
        }
    }

    /// Current bookkeeping of the bound record. Fatal on a relocated token.
    #[track_caller]
    pub fn state(&self) -> BorrowState {
        self.bound("OwnershipToken::state").state()
    }

    #[track_caller]
    pub(crate) fn lend_record(&self, op: &'static str) -> RecordPtr<T> {
        match self.record {
            Some(ptr) => ptr,
            None => fatal(op, OwnershipViolation::Relocated, Location::caller()),
        }
    }
}

impl<T> Deref for OwnershipToken<T> {
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T> fmt::Debug for OwnershipToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            // SAFETY: see `bound`.
            Some(ptr) => f
                .debug_struct("OwnershipToken")
                .field("state", &unsafe { ptr.get() }.state())
                .finish_non_exhaustive(),
            None => f.write_str("OwnershipToken(relocated)"),
        }
    }
}

impl<T> Drop for OwnershipToken<T> {
    fn drop(&mut self) {
        if let Some(ptr) = self.record.take() {
            // SAFETY: see `bound`.
            let rec = unsafe { ptr.get() };
            rec.end_delegation("OwnershipToken::drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Owner, OwnershipToken};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted(Rc<Cell<usize>>);
    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn token_drop_destroys_value_in_place() {
        let drops = Rc::new(Cell::new(0));
        let mut owner = Owner::new(Counted(drops.clone()));
        {
            let token = OwnershipToken::new(&mut owner);
            assert!(owner.state().delegated);
            assert_eq!(token.get().0.get(), 0);
        }
        assert_eq!(drops.get(), 1);
        assert!(!owner.state().delegated);
        assert!(!owner.state().present);
        drop(owner);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn relocated_token_is_inert() {
        let drops = Rc::new(Cell::new(0));
        let mut owner = Owner::new(Counted(drops.clone()));
        let mut first = owner.delegate();
        let second = first.relocate();
        assert!(!first.is_valid());
        assert!(second.is_valid());
        drop(first);
        assert_eq!(drops.get(), 0);
        assert!(owner.state().delegated);
        drop(second);
        assert_eq!(drops.get(), 1);
        assert!(!owner.state().delegated);
    }

    #[test]
    fn token_lends_views() {
        let mut owner = Owner::new(10);
        let mut token = owner.delegate();
        {
            let a = token.borrow();
            let b = a.clone();
            assert_eq!(*a.get() + *b.get(), 20);
            assert_eq!(token.state().shared, 2);
        }
        {
            let mut m = token.borrow_mut();
            *m.get_mut() += 1;
        }
        assert_eq!(*token.get(), 11);
    }

    #[test]
    fn debug_for_husk() {
        let mut owner = Owner::new(());
        let mut t = owner.delegate();
        let _live = t.relocate();
        assert_eq!(format!("{:?}", t), "OwnershipToken(relocated)");
    }
}
