//! `Owner<T>`: sole holder of a value's storage.

use crate::exclusive::ExclusiveView;
use crate::record::{BorrowState, Record, RecordPtr};
use crate::shared::SharedView;
use crate::token::OwnershipToken;
use core::fmt;
use core::ops::Deref;

/// A value owned at the current location.
///
/// When the `Owner` goes out of scope the value is destroyed. If at that
/// moment a view is live or an `OwnershipToken` still holds the value,
/// the process aborts instead.
pub struct Owner<T> {
    record: RecordPtr<T>,
}

impl<T> Owner<T> {
    /// Own `value`.
    pub fn new(value: T) -> Self {
        Self::from_slot(Some(value))
    }

    /// Own the value produced by `init`, built directly for this owner.
    pub fn new_with<F>(init: F) -> Self
    where
        F: FnOnce() -> T,
    {
        Self::from_slot(Some(init()))
    }

    fn from_slot(slot: Option<T>) -> Self {
        Self {
            record: RecordPtr::alloc(slot),
        }
    }

    #[inline]
    fn record(&self) -> &Record<T> {
        // SAFETY: the record is freed only in `Drop for Owner`.
        unsafe { self.record.get() }
    }

    /// Read the value.
    ///
    /// Fatal if a view is live, if ownership is delegated, or if the value
    /// was already moved out or destroyed.
    #[track_caller]
    pub fn get(&self) -> &T {
        let rec = self.record();
        rec.check_owner_access("Owner::get");
        // SAFETY: no view is live and creating an exclusive one needs
        // `&mut self`, which the returned borrow excludes.
        unsafe { rec.value("Owner::get") }
    }

    /// Borrow the value immutably for temporary use elsewhere.
    ///
    /// Allowed while ownership is delegated: the view is counted, so the
    /// token can neither read nor destroy the value until it is dropped.
    #[track_caller]
    pub fn borrow(&self) -> SharedView<T> {
        SharedView::acquire(self.lend_record(), "Owner::borrow")
    }

    /// Borrow the value mutably for temporary use elsewhere.
    #[track_caller]
    pub fn borrow_mut(&mut self) -> ExclusiveView<T> {
        ExclusiveView::acquire(self.lend_record(), "Owner::borrow_mut")
    }

    /// Hand responsibility for destroying the value to a token, leaving the
    /// storage here.
    #[track_caller]
    pub fn delegate(&mut self) -> OwnershipToken<T> {
        OwnershipToken::bind(self.lend_record(), "Owner::delegate")
    }

    /// Move the value into a new owner.
    ///
    /// This owner is left empty: any later read through it is fatal. Fatal
    /// if a view is live or ownership is delegated.
    #[track_caller]
    pub fn relocate(&mut self) -> Owner<T> {
        let value = self.record().take_for_relocation("Owner::relocate");
        Self::from_slot(value)
    }

    /// Current bookkeeping of this owner's record.
    pub fn state(&self) -> BorrowState {
        self.record().state()
    }

    pub(crate) fn lend_record(&self) -> RecordPtr<T> {
        self.record
    }
}

impl<T> From<T> for Owner<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> Deref for Owner<T> {
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T> fmt::Debug for Owner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<T> Drop for Owner<T> {
    fn drop(&mut self) {
        // Aborts rather than leave a view or token dangling.
        self.record().check_droppable("Owner::drop");
        // SAFETY: nothing is borrowed or delegated, so no handle can reach
        // the record again.
        unsafe { self.record.free() }
    }
}

#[cfg(test)]
mod tests {
    use super::Owner;
    use crate::BorrowState;

    #[test]
    fn get_reads_value() {
        let o = Owner::new(42);
        assert_eq!(*o.get(), 42);
        assert_eq!(*o, 42);
    }

    #[test]
    fn new_with_builds_in_place() {
        let o = Owner::new_with(|| vec![1, 2, 3]);
        assert_eq!(o.get().len(), 3);
    }

    #[test]
    fn relocate_leaves_source_empty() {
        let mut a = Owner::new(String::from("x"));
        let b = a.relocate();
        assert_eq!(b.get(), "x");
        assert!(!a.state().present);
        assert!(b.state().present);
    }

    #[test]
    fn rust_move_keeps_views_valid() {
        let o = Owner::new(5u8);
        let v = o.borrow();
        let moved = o;
        assert_eq!(*v.get(), 5);
        assert_eq!(moved.state().shared, 1);
        drop(v);
        assert_eq!(
            moved.state(),
            BorrowState {
                present: true,
                ..BorrowState::default()
            }
        );
    }

    #[test]
    fn owner_lends_views_while_delegated() {
        let mut o = Owner::new(7);
        let token = o.delegate();
        {
            let v = o.borrow();
            assert_eq!(*v.get(), 7);
            assert_eq!(token.state().shared, 1);
        }
        {
            let mut w = o.borrow_mut();
            *w.get_mut() = 8;
            assert!(token.state().exclusive);
        }
        assert_eq!(*token.get(), 8);
        assert!(o.state().delegated);
        drop(token);
        assert!(!o.state().present);
    }

    #[test]
    fn debug_shows_state() {
        let o = Owner::new(1);
        let s = format!("{:?}", o);
        assert!(s.starts_with("Owner { state: BorrowState"));
    }
}
