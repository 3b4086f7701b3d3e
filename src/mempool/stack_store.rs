/*!
 * Stack Store
 * LIFO backing store behind a mutex
 */

use super::traits::{BackingStore, StoreParams, StorePolicy};
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::ObjPtr;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Last-in, first-out object store
///
/// Recently released objects are handed out first, which keeps them warm in
/// the releasing core's cache. `count` reads a maintained counter so it never
/// takes the lock.
#[derive(Debug)]
pub struct StackStore {
    objs: Mutex<Vec<ObjPtr>>,
    capacity: u32,
    len: AtomicU32,
}

impl StackStore {
    pub fn new(capacity: u32) -> Self {
        Self {
            objs: Mutex::new(Vec::with_capacity(capacity as usize)),
            capacity,
            len: AtomicU32::new(0),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

impl BackingStore for StackStore {
    fn enqueue(&self, objs: &[ObjPtr]) -> PoolResult<()> {
        let mut stack = self.objs.lock();
        if stack.len() + objs.len() > self.capacity as usize {
            return Err(PoolError::NoSpace {
                requested: objs.len() as u32,
            });
        }
        stack.extend_from_slice(objs);
        self.len.store(stack.len() as u32, Ordering::Release);
        Ok(())
    }

    fn dequeue(&self, out: &mut [ObjPtr]) -> PoolResult<()> {
        let mut stack = self.objs.lock();
        if stack.len() < out.len() {
            return Err(PoolError::NoBuffers {
                requested: out.len() as u32,
                available: stack.len() as u32,
            });
        }
        for slot in out.iter_mut() {
            // Length checked above
            if let Some(obj) = stack.pop() {
                *slot = obj;
            }
        }
        self.len.store(stack.len() as u32, Ordering::Release);
        Ok(())
    }

    fn count(&self) -> u32 {
        self.len.load(Ordering::Acquire)
    }
}

/// Policy producing [`StackStore`]s, registered as `"stack"`
#[derive(Debug, Default, Clone, Copy)]
pub struct StackPolicy;

impl StorePolicy for StackPolicy {
    fn name(&self) -> &str {
        "stack"
    }

    fn alloc(&self, params: &StoreParams<'_>) -> PoolResult<Box<dyn BackingStore>> {
        Ok(Box::new(StackStore::new(params.capacity)))
    }
}
