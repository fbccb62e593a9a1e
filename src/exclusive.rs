//! `ExclusiveView<T>`: a read-write borrow; at most one, and never
//! alongside a `SharedView`.

use crate::lend::Lender;
use crate::record::{Record, RecordPtr};
use crate::violation::{fatal, OwnershipViolation};
use core::ops::{Deref, DerefMut};
use core::panic::Location;

/// A mutable borrow of a `T`.
///
/// `relocate` moves the borrow into a new view and leaves this one as a
/// husk: the husk's operations are fatal and its drop leaves the record
/// alone, so only the live view ever clears the exclusive flag.
pub struct ExclusiveView<T> {
    record: Option<RecordPtr<T>>,
}

impl<T> ExclusiveView<T> {
    /// Borrow mutably from an `Owner` or an `OwnershipToken`.
    ///
    /// Fatal if any view on the value is live.
    #[track_caller]
    pub fn new<L>(source: &mut L) -> Self
    where
        L: Lender<T> + ?Sized,
    {
        Self::acquire(source.lend("ExclusiveView::new"), "ExclusiveView::new")
    }

    #[track_caller]
    pub(crate) fn acquire(record: RecordPtr<T>, op: &'static str) -> Self {
        // SAFETY: the lender handing out `record` keeps it alive here.
        let rec = unsafe { record.get() };
        rec.acquire_exclusive(op);
        Self {
            record: Some(record),
        }
    }

    #[track_caller]
    fn bound(&self, op: &'static str) -> &Record<T> {
        match &self.record {
            // SAFETY: while bound, the exclusive flag keeps the owner (and
            // any token) from destroying the record or the value.
            Some(ptr) => unsafe { ptr.get() },
            None => fatal(op, OwnershipViolation::Relocated, Location::caller()),
        }
    }

    /// Whether this view still holds the borrow.
    pub fn is_valid(&self) -> bool {
        self.record.is_some()
    }

    /// Read the value.
    #[track_caller]
    pub fn get(&self) -> &T {
        let rec = self.bound("ExclusiveView::get");
        // SAFETY: writes need `&mut self`, excluded by the returned borrow.
        unsafe { rec.value("ExclusiveView::get") }
    }

    /// Write access to the value.
    #[track_caller]
    pub fn get_mut(&mut self) -> &mut T {
        let rec = self.bound("ExclusiveView::get_mut");
        // SAFETY: this is the only live view and `&mut self` is held.
        unsafe { rec.value_mut("ExclusiveView::get_mut") }
    }

    /// Move the borrow into a new view; this one becomes a husk.
    #[track_caller]
    pub fn relocate(&mut self) -> ExclusiveView<T> {
        match self.record.take() {
            Some(record) => Self {
                record: Some(record),
            },
            None => fatal(
                "ExclusiveView::relocate",
                OwnershipViolation::Relocated,
                Location::caller(),
            ),
        }
    }
}

impl<T> Deref for ExclusiveView<T> {
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T> DerefMut for ExclusiveView<T> {
    #[track_caller]
    fn deref_mut(&mut self) -> &mut T {
        self.get_mut()
    }
}

impl<T> Drop for ExclusiveView<T> {
    fn drop(&mut self) {
        if let Some(ptr) = self.record.take() {
            // SAFETY: see `bound`.
            let rec = unsafe { ptr.get() };
            rec.release_exclusive();
        }
    }
}
