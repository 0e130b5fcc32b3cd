//! The compilation lock around the shared heap.
//!
//! The compiler reads live hidden classes, global tables and builtin
//! prototypes while it lowers a method. It does so only through a
//! [`HeapReadGuard`], which holds the lock for the whole pass and hands out
//! shared references only: no mutation and no allocation can happen while
//! a compilation walks object metadata.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::model::ObjectModel;

/// Heap shared between the running program and compiler workers.
#[derive(Debug, Clone, Default)]
pub struct SharedObjectModel {
    inner: Arc<Mutex<ObjectModel>>,
}

impl SharedObjectModel {
    /// Wraps a heap for sharing.
    pub fn new(model: ObjectModel) -> Self {
        Self {
            inner: Arc::new(Mutex::new(model)),
        }
    }

    /// Acquires the lock for one compilation pass.
    ///
    /// # Example
    /// ```
    /// use object_model::{ObjectModel, SharedObjectModel};
    ///
    /// let heap = SharedObjectModel::new(ObjectModel::new());
    /// let guard = heap.lock_for_compile();
    /// assert!(guard.object_function_hclass().is_none());
    /// ```
    pub fn lock_for_compile(&self) -> HeapReadGuard<'_> {
        HeapReadGuard {
            guard: self.inner.lock(),
        }
    }

    /// Acquires the lock for runtime-side mutation.
    pub fn lock_mut(&self) -> HeapWriteGuard<'_> {
        HeapWriteGuard {
            guard: self.inner.lock(),
        }
    }

    /// Non-blocking variant of [`lock_for_compile`](Self::lock_for_compile).
    pub fn try_lock_for_compile(&self) -> Option<HeapReadGuard<'_>> {
        self.inner.try_lock().map(|guard| HeapReadGuard { guard })
    }
}

/// Scoped read-only view of the heap held for a compilation.
pub struct HeapReadGuard<'a> {
    guard: MutexGuard<'a, ObjectModel>,
}

impl Deref for HeapReadGuard<'_> {
    type Target = ObjectModel;

    fn deref(&self) -> &ObjectModel {
        &self.guard
    }
}

/// Mutable view of the heap for the running program.
pub struct HeapWriteGuard<'a> {
    guard: MutexGuard<'a, ObjectModel>,
}

impl Deref for HeapWriteGuard<'_> {
    type Target = ObjectModel;

    fn deref(&self) -> &ObjectModel {
        &self.guard
    }
}

impl DerefMut for HeapWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut ObjectModel {
        &mut self.guard
    }
}
