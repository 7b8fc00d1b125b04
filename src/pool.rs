//! Generic object pool with scoped checkout.
//!
//! [`Pool::acquire`] hands out a [`Pooled`] guard that owns the object
//! exclusively; dropping the guard returns the object to the free list. An
//! object is therefore never reachable from two guards at once.

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

/// Objects that can be brought back to a clean state before reuse.
pub trait Reset {
    fn reset(&mut self);
}

pub struct Pool<T> {
    idle: Mutex<Vec<T>>,
    create: Box<dyn Fn() -> T + Send + Sync>,
    max_idle: usize,
}

impl<T: Reset> Pool<T> {
    /// `max_idle` bounds how many returned objects are kept; extras are dropped.
    pub fn new<F>(max_idle: usize, create: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            idle: Mutex::new(Vec::new()),
            create: Box::new(create),
            max_idle,
        }
    }

    /// Checks out an idle object, or creates one when none is idle.
    pub fn acquire(&self) -> Pooled<'_, T> {
        let recycled = self.idle.lock().pop();
        let mut item = recycled.unwrap_or_else(|| (self.create)());
        item.reset();

        Pooled {
            pool: self,
            item: Some(item),
        }
    }

    /// Number of objects waiting in the free list.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, item: T) {
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(item);
        }
    }
}

impl<T: Reset> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("idle", &self.idle_count())
            .field("max_idle", &self.max_idle)
            .finish()
    }
}

/// Exclusive handle on a pooled object.
pub struct Pooled<'a, T: Reset> {
    pool: &'a Pool<T>,
    // Some until the guard is dropped
    item: Option<T>,
}

impl<T: Reset> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect("pooled object already released")
    }
}

impl<T: Reset> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pooled object already released")
    }
}

impl<T: Reset> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter {
        id: usize,
        uses: usize,
    }

    impl Reset for Counter {
        fn reset(&mut self) {
            self.uses = 0;
        }
    }

    #[test]
    fn released_objects_are_reused() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let pool = Pool::new(4, move || Counter {
            id: counter.fetch_add(1, Ordering::SeqCst),
            uses: 0,
        });

        let first_id = {
            let mut item = pool.acquire();
            item.uses += 3;
            item.id
        };
        assert_eq!(pool.idle_count(), 1);

        let item = pool.acquire();
        assert_eq!(item.id, first_id);
        assert_eq!(item.uses, 0, "reset runs on checkout");
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn simultaneous_checkouts_get_distinct_objects() {
        let next = AtomicUsize::new(0);
        let pool = Pool::new(4, move || Counter {
            id: next.fetch_add(1, Ordering::SeqCst),
            uses: 0,
        });

        let a = pool.acquire();
        let b = pool.acquire();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn idle_list_is_bounded() {
        let pool = Pool::new(1, || Counter { id: 0, uses: 0 });

        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);

        assert_eq!(pool.idle_count(), 1);
    }
}
