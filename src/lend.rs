//! Sources a view can be taken from.
//!
//! Views borrow from either an `Owner` or an `OwnershipToken`; both hand
//! out the record they are bound to. A relocated token refuses to lend.
//! An `Owner` always can, even while delegated, since the view's own
//! checks guard the value. The trait is sealed: the set of lenders is
//! closed.

use crate::owner::Owner;
use crate::record::RecordPtr;
use crate::token::OwnershipToken;

/// A handle that `SharedView::new` and `ExclusiveView::new` can borrow from.
pub trait Lender<T>: private::Sealed<T> {}

pub(crate) mod private {
    use crate::record::RecordPtr;

    pub trait Sealed<T> {
        /// The record to bind a new view to. Fatal if this handle may not
        /// lend right now.
        #[track_caller]
        fn lend(&self, op: &'static str) -> RecordPtr<T>;
    }
}

impl<T> Lender<T> for Owner<T> {}

impl<T> private::Sealed<T> for Owner<T> {
    fn lend(&self, _op: &'static str) -> RecordPtr<T> {
        self.lend_record()
    }
}

impl<T> Lender<T> for OwnershipToken<T> {}

impl<T> private::Sealed<T> for OwnershipToken<T> {
    fn lend(&self, op: &'static str) -> RecordPtr<T> {
        self.lend_record(op)
    }
}
