//! Ownership record: the slot, flags and counter shared between an
//! `Owner` and every handle bound to it.
//!
//! The record lives in its own heap allocation owned by the `Owner`, so
//! moving the `Owner` value around never invalidates a `RecordPtr` held
//! by a view or token. Handles only ever hold a `RecordPtr`; they never
//! free the allocation.

use crate::violation::{fatal, OwnershipViolation};
use core::cell::{Cell, UnsafeCell};
use core::marker::PhantomData;
use core::panic::Location;
use core::ptr::NonNull;

/// Snapshot of an ownership record's bookkeeping.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct BorrowState {
    /// An `ExclusiveView` is live.
    pub exclusive: bool,
    /// Number of live `SharedView`s.
    pub shared: usize,
    /// An `OwnershipToken` holds responsibility for the value.
    pub delegated: bool,
    /// The slot still holds a value.
    pub present: bool,
}

impl BorrowState {
    /// No view is live, whatever the slot and delegation state.
    pub fn is_unborrowed(&self) -> bool {
        !self.exclusive && self.shared == 0
    }
}

pub struct Record<T> {
    slot: UnsafeCell<Option<T>>,
    // Mirrors `slot.is_some()` so presence can be read while a `&mut T`
    // into the slot is live.
    present: Cell<bool>,
    exclusive: Cell<bool>,
    shared: Cell<usize>,
    delegated: Cell<bool>,
}

#[track_caller]
fn fail(op: &'static str, violation: OwnershipViolation) -> ! {
    fatal(op, violation, Location::caller())
}

impl<T> Record<T> {
    fn new(value: Option<T>) -> Self {
        Self {
            present: Cell::new(value.is_some()),
            slot: UnsafeCell::new(value),
            exclusive: Cell::new(false),
            shared: Cell::new(0),
            delegated: Cell::new(false),
        }
    }

    pub(crate) fn state(&self) -> BorrowState {
        BorrowState {
            exclusive: self.exclusive.get(),
            shared: self.shared.get(),
            delegated: self.delegated.get(),
            present: self.present.get(),
        }
    }

    #[inline]
    fn addr(&self) -> *const Self {
        self
    }

    /// No view of either kind is live.
    #[track_caller]
    pub(crate) fn check_unborrowed(&self, op: &'static str) {
        if self.exclusive.get() {
            fail(op, OwnershipViolation::MutablyBorrowed);
        }
        let count = self.shared.get();
        if count > 0 {
            fail(op, OwnershipViolation::SharedBorrowed { count });
        }
    }

    /// The owner itself may act: nothing borrowed and nothing delegated.
    #[track_caller]
    pub(crate) fn check_owner_access(&self, op: &'static str) {
        self.check_unborrowed(op);
        self.check_delegation(op);
    }

    /// Once delegated, the owner may not read, move or re-delegate.
    #[track_caller]
    pub(crate) fn check_delegation(&self, op: &'static str) {
        if self.delegated.get() {
            fail(op, OwnershipViolation::Delegated);
        }
    }

    /// Only shared views may be live.
    #[track_caller]
    pub(crate) fn check_not_exclusive(&self, op: &'static str) {
        if self.exclusive.get() {
            fail(op, OwnershipViolation::MutablyBorrowed);
        }
    }

    /// The owner may be destroyed: nothing borrowed and nothing delegated.
    #[track_caller]
    pub(crate) fn check_droppable(&self, op: &'static str) {
        self.check_owner_access(op);
    }

    #[track_caller]
    pub(crate) fn acquire_shared(&self, op: &'static str) {
        self.check_not_exclusive(op);
        let n = match self.shared.get().checked_add(1) {
            Some(n) => n,
            None => fail(op, OwnershipViolation::CountOverflow),
        };
        self.shared.set(n);
        tracing::trace!(record = ?self.addr(), shared = n, "shared borrow acquired");
    }

    pub(crate) fn release_shared(&self) {
        let c = self.shared.get();
        debug_assert!(c > 0, "shared borrow count underflow");
        let n = c.saturating_sub(1);
        self.shared.set(n);
        tracing::trace!(record = ?self.addr(), shared = n, "shared borrow released");
    }

    #[track_caller]
    pub(crate) fn acquire_exclusive(&self, op: &'static str) {
        self.check_unborrowed(op);
        self.exclusive.set(true);
        tracing::trace!(record = ?self.addr(), "exclusive borrow acquired");
    }

    pub(crate) fn release_exclusive(&self) {
        debug_assert!(self.exclusive.get(), "exclusive flag already clear");
        self.exclusive.set(false);
        tracing::trace!(record = ?self.addr(), "exclusive borrow released");
    }

    /// Hand lifetime responsibility for the value to a token.
    #[track_caller]
    pub(crate) fn begin_delegation(&self, op: &'static str) {
        self.check_unborrowed(op);
        self.check_delegation(op);
        if !self.present.get() {
            fail(op, OwnershipViolation::Vacant);
        }
        self.delegated.set(true);
        tracing::trace!(record = ?self.addr(), "ownership delegated");
    }

    /// Token side of the delegation ends: the value is destroyed here.
    #[track_caller]
    pub(crate) fn end_delegation(&self, op: &'static str) {
        self.check_unborrowed(op);
        self.delegated.set(false);
        let value = self.take();
        tracing::trace!(record = ?self.addr(), destroyed = value.is_some(), "delegation ended");
        drop(value);
    }

    /// Move the value out for a new owner, leaving the slot empty.
    #[track_caller]
    pub(crate) fn take_for_relocation(&self, op: &'static str) -> Option<T> {
        self.check_owner_access(op);
        let value = self.take();
        tracing::trace!(record = ?self.addr(), moved = value.is_some(), "value relocated");
        value
    }

    fn take(&self) -> Option<T> {
        self.present.set(false);
        // SAFETY: every caller has checked that no view is live, and the
        // references handed out by `Owner::get`/`OwnershipToken::get` are
        // tied to a `&self` borrow that the caller's `&mut self` excludes.
        unsafe { (*self.slot.get()).take() }
    }

    /// Shared reference to the value.
    ///
    /// # Safety
    /// No `&mut T` into the slot may be live for the returned lifetime.
    #[track_caller]
    pub(crate) unsafe fn value(&self, op: &'static str) -> &T {
        match (*self.slot.get()).as_ref() {
            Some(v) => v,
            None => fail(op, OwnershipViolation::Vacant),
        }
    }

    /// Exclusive reference to the value.
    ///
    /// # Safety
    /// No other reference into the slot may be live for the returned
    /// lifetime.
    #[allow(clippy::mut_from_ref)]
    #[track_caller]
    pub(crate) unsafe fn value_mut(&self, op: &'static str) -> &mut T {
        match (*self.slot.get()).as_mut() {
            Some(v) => v,
            None => fail(op, OwnershipViolation::Vacant),
        }
    }
}

/// Non-owning back-reference to a heap-allocated `Record`.
///
/// Only `Owner` allocates and frees the record. Every other holder relies
/// on the owner's drop-time check refusing to free the record while a view
/// or delegation is outstanding.
pub struct RecordPtr<T> {
    ptr: NonNull<Record<T>>,
    // !Send + !Sync: flags are plain Cells.
    _nosend: PhantomData<*mut ()>,
}

impl<T> Clone for RecordPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RecordPtr<T> {}

impl<T> RecordPtr<T> {
    pub(crate) fn alloc(value: Option<T>) -> Self {
        let boxed = Box::new(Record::new(value));
        Self {
            ptr: NonNull::from(Box::leak(boxed)),
            _nosend: PhantomData,
        }
    }

    /// # Safety
    /// The allocation must not have been freed, i.e. the owner is alive or
    /// this pointer's holder keeps a borrow/delegation counted that stops
    /// the owner from freeing it.
    #[inline]
    pub(crate) unsafe fn get(&self) -> &Record<T> {
        self.ptr.as_ref()
    }

    /// # Safety
    /// Called once, by the owner, after `check_droppable` passed.
    pub(crate) unsafe fn free(self) {
        drop(Box::from_raw(self.ptr.as_ptr()));
    }
}

#[cfg(test)]
mod tests {
    use super::{BorrowState, RecordPtr};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Noisy(Rc<Cell<usize>>);
    impl Drop for Noisy {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn fresh_record_is_unborrowed() {
        let p = RecordPtr::alloc(Some(7u32));
        let rec = unsafe { p.get() };
        assert_eq!(
            rec.state(),
            BorrowState {
                exclusive: false,
                shared: 0,
                delegated: false,
                present: true,
            }
        );
        assert_eq!(unsafe { *rec.value("test") }, 7);
        unsafe { p.free() };
    }

    #[test]
    fn shared_acquire_release_counts() {
        let p = RecordPtr::alloc(Some(()));
        let rec = unsafe { p.get() };
        rec.acquire_shared("test");
        rec.acquire_shared("test");
        assert_eq!(rec.state().shared, 2);
        rec.release_shared();
        rec.release_shared();
        assert!(rec.state().is_unborrowed());
        rec.check_droppable("test");
        unsafe { p.free() };
    }

    #[test]
    fn exclusive_flag_round_trip() {
        let p = RecordPtr::alloc(Some(1i32));
        let rec = unsafe { p.get() };
        rec.acquire_exclusive("test");
        assert!(rec.state().exclusive);
        unsafe { *rec.value_mut("test") += 1 };
        rec.release_exclusive();
        assert!(!rec.state().exclusive);
        assert_eq!(unsafe { *rec.value("test") }, 2);
        unsafe { p.free() };
    }

    #[test]
    fn delegation_end_destroys_value_once() {
        let drops = Rc::new(Cell::new(0));
        let p = RecordPtr::alloc(Some(Noisy(drops.clone())));
        let rec = unsafe { p.get() };
        rec.begin_delegation("test");
        assert!(rec.state().delegated);
        rec.end_delegation("test");
        assert_eq!(drops.get(), 1);
        assert_eq!(
            rec.state(),
            BorrowState {
                present: false,
                ..BorrowState::default()
            }
        );
        unsafe { p.free() };
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn relocation_empties_the_slot() {
        let p = RecordPtr::alloc(Some(String::from("moved")));
        let rec = unsafe { p.get() };
        let v = rec.take_for_relocation("test");
        assert_eq!(v.as_deref(), Some("moved"));
        assert!(!rec.state().present);
        unsafe { p.free() };
    }
}
