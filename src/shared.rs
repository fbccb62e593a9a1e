//! `SharedView<T>`: a read-only borrow; any number may coexist.

use crate::lend::Lender;
use crate::record::{Record, RecordPtr};
use core::ops::Deref;

/// An immutable borrow of a `T`.
///
/// Holds a count on the record for as long as it lives; the count is
/// released when the view is dropped, on every exit path.
pub struct SharedView<T> {
    record: RecordPtr<T>,
}

impl<T> SharedView<T> {
    /// Borrow from an `Owner` or an `OwnershipToken`.
    ///
    /// Fatal if the value is mutably borrowed.
    #[track_caller]
    pub fn new<L>(source: &L) -> Self
    where
        L: Lender<T> + ?Sized,
    {
        Self::acquire(source.lend("SharedView::new"), "SharedView::new")
    }

    #[track_caller]
    pub(crate) fn acquire(record: RecordPtr<T>, op: &'static str) -> Self {
        // SAFETY: the lender handing out `record` keeps it alive here.
        let rec = unsafe { record.get() };
        rec.acquire_shared(op);
        Self { record }
    }

    #[inline]
    fn record(&self) -> &Record<T> {
        // SAFETY: our count keeps the owner (and any token) from destroying
        // the record or the value.
        unsafe { self.record.get() }
    }

    /// Read the value. Re-checked on every access, not only at creation.
    #[track_caller]
    pub fn get(&self) -> &T {
        let rec = self.record();
        rec.check_not_exclusive("SharedView::get");
        // SAFETY: no exclusive view can be created while our count is held.
        unsafe { rec.value("SharedView::get") }
    }
}

impl<T> Clone for SharedView<T> {
    #[track_caller]
    fn clone(&self) -> Self {
        Self::acquire(self.record, "SharedView::clone")
    }
}

impl<T> Deref for SharedView<T> {
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T> Drop for SharedView<T> {
    fn drop(&mut self) {
        self.record().release_shared();
    }
}

#[cfg(test)]
mod tests {
    use super::SharedView;
    use crate::Owner;

    #[test]
    fn many_readers_coexist() {
        let owner = Owner::new(String::from("shared"));
        let views: Vec<SharedView<String>> = (0..8).map(|_| owner.borrow()).collect();
        assert_eq!(owner.state().shared, 8);
        assert!(views.iter().all(|v| v.get() == "shared"));
        drop(views);
        assert_eq!(owner.state().shared, 0);
        assert_eq!(owner.get(), "shared");
    }

    #[test]
    fn generic_constructor_and_clone() {
        let owner = Owner::new(3);
        let a = SharedView::new(&owner);
        let b = a.clone();
        drop(a);
        assert_eq!(owner.state().shared, 1);
        assert_eq!(*b, 3);
    }
}
