/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Reference-counted ownership of array storage.
//!
//! Views never own memory directly. Each view descriptor holds an optional
//! handle to a [`Manager`], and the storage is released when the last
//! handle drops. [`OwnedManager`] carries heap storage allocated by this
//! crate; [`ExternalManager`] keeps a foreign owner object alive for
//! storage allocated elsewhere; [`CompositeManager`] couples two owners
//! under one lifetime.

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::rc::Rc;

use tracing::trace;

/// Keeps array storage alive.
///
/// A manager is held behind `Rc<dyn Manager>` and shared by every view of
/// the same allocation, so the storage outlives all of them and is released
/// exactly once.
pub trait Manager: 'static {
    /// Whether releasing every array handle to this manager would free the
    /// storage.
    ///
    /// Managers wrapping foreign owners cannot make that promise, so the
    /// default answer is `false`. [`OwnedManager`] overrides it: storage it
    /// allocated is reachable only through array handles.
    fn is_unique(&self) -> bool {
        false
    }
}

/// Owner of heap storage allocated by this crate.
///
/// Holds the raw parts of a `Box<[T]>` and reassembles it on drop. The
/// element pointer is handed out at construction and stays valid for the
/// manager's whole lifetime.
pub struct OwnedManager<T> {
    ptr: NonNull<T>,
    len: usize,
    marker: PhantomData<T>,
}

impl<T> OwnedManager<T> {
    /// Take ownership of `data`.
    ///
    /// Returns the manager together with the pointer to the first element
    /// and the element count. The pointer is dereferenceable as long as the
    /// manager lives; for an empty vector it is dangling and must not be
    /// read.
    pub fn from_vec(data: Vec<T>) -> (Rc<Self>, NonNull<T>, usize) {
        let data = data.into_boxed_slice();
        let len = data.len();
        let ptr = Box::into_raw(data).cast::<T>();
        // SAFETY: `Box::into_raw` never returns null.
        let ptr = unsafe { NonNull::new_unchecked(ptr) };
        trace!(len, "acquired owned storage");
        let manager = Rc::new(OwnedManager {
            ptr,
            len,
            marker: PhantomData,
        });
        (manager, ptr, len)
    }

    /// Number of elements owned.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` iff the manager owns no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: 'static> Manager for OwnedManager<T> {
    fn is_unique(&self) -> bool {
        true
    }
}

impl<T> Drop for OwnedManager<T> {
    fn drop(&mut self) {
        trace!(len = self.len, "releasing owned storage");
        // SAFETY: `ptr` and `len` came from `Box::into_raw` of a boxed
        // slice in `from_vec` and have not been used to reconstruct a box
        // since.
        unsafe {
            drop(Box::from_raw(std::slice::from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.len,
            )));
        }
    }
}

/// Keeps a foreign owner object alive.
///
/// Used when views are built over storage owned by something else, such as
/// a buffer handed over by another library. Dropping the last view drops
/// the wrapped owner, which is what actually releases the storage.
pub struct ExternalManager<O> {
    owner: O,
}

impl<O: 'static> ExternalManager<O> {
    /// Wrap `owner`, taking it by value.
    ///
    /// Any pointer into the owner's storage must be obtained before the
    /// move and is the caller's responsibility to keep in bounds.
    pub fn new(owner: O) -> Rc<Self> {
        trace!("acquired external owner");
        Rc::new(ExternalManager { owner })
    }

    /// Borrow the wrapped owner.
    pub fn owner(&self) -> &O {
        &self.owner
    }
}

impl<O: 'static> Manager for ExternalManager<O> {}

impl<O> Drop for ExternalManager<O> {
    fn drop(&mut self) {
        trace!("releasing external owner");
    }
}

/// Ties the lifetimes of two managers together.
///
/// Used when one logical allocation spans two owners, such as paired
/// buffers produced by a single planning step: views of either buffer
/// hold the composite, and both owners stay alive until the last such
/// view drops.
pub struct CompositeManager {
    first: Rc<dyn Manager>,
    second: Rc<dyn Manager>,
}

impl CompositeManager {
    /// A manager keeping both `first` and `second` alive.
    pub fn join(first: Rc<dyn Manager>, second: Rc<dyn Manager>) -> Rc<Self> {
        trace!("joined two owners");
        Rc::new(CompositeManager { first, second })
    }

    /// The first joined manager.
    pub fn first(&self) -> &Rc<dyn Manager> {
        &self.first
    }

    /// The second joined manager.
    pub fn second(&self) -> &Rc<dyn Manager> {
        &self.second
    }
}

// The children may be shared beyond this composite, so exclusive
// ownership can never be promised.
impl Manager for CompositeManager {}

impl Drop for CompositeManager {
    fn drop(&mut self) {
        trace!("releasing joined owners");
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct DropFlag(Rc<Cell<u32>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn owned_storage_released_once_with_last_handle() {
        let drops = Rc::new(Cell::new(0));
        let data = vec![DropFlag(drops.clone()), DropFlag(drops.clone())];
        let (manager, _ptr, len) = OwnedManager::from_vec(data);
        assert_eq!(len, 2);
        let second = manager.clone();
        drop(manager);
        assert_eq!(drops.get(), 0);
        drop(second);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn owned_storage_tolerates_empty_buffers() {
        let (manager, _ptr, len) = OwnedManager::from_vec(Vec::<f64>::new());
        assert_eq!(len, 0);
        assert!(manager.is_empty());
        drop(manager);
    }

    #[test]
    fn external_owner_dropped_with_last_handle() {
        let drops = Rc::new(Cell::new(0));
        let manager = ExternalManager::new(DropFlag(drops.clone()));
        let second = manager.clone();
        drop(second);
        assert_eq!(drops.get(), 0);
        drop(manager);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn uniqueness_claims() {
        let (owned, _ptr, _len) = OwnedManager::from_vec(vec![1i32, 2, 3]);
        assert!(owned.is_unique());
        let external = ExternalManager::new(vec![1i32, 2, 3]);
        assert!(!external.is_unique());
        assert_eq!(external.owner().len(), 3);
    }

    #[test]
    fn composite_keeps_both_children_alive() {
        let drops = Rc::new(Cell::new(0));
        let first: Rc<dyn Manager> = ExternalManager::new(DropFlag(drops.clone()));
        let second: Rc<dyn Manager> = ExternalManager::new(DropFlag(drops.clone()));
        let joined = CompositeManager::join(first.clone(), second.clone());
        drop((first, second));
        assert_eq!(drops.get(), 0);
        drop(joined);
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn composite_never_claims_exclusive_ownership() {
        let (owned, _ptr, _len) = OwnedManager::from_vec(vec![0u8; 4]);
        let joined = CompositeManager::join(owned.clone(), owned);
        assert!(!joined.is_unique());
        assert!(Rc::ptr_eq(joined.first(), joined.second()));
    }
}
