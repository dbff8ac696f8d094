/*!
Releasing host level exclusivity around engine runs.

Some hosts only let one thread at a time execute host code, guarded by a
single exclusive lock. An engine run never touches host state, so holding
that lock while the automaton scans a large subject needlessly stalls every
other thread. A [`ConcurrencyGuard`] gives the lock up for the duration of a
run and takes it back before any result is handed to the host.
*/

use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, ThreadId},
};

/// A host level exclusive-execution lock.
///
/// Implementations must be callable from any thread. `release` only gives
/// up the lock when the calling thread holds it.
pub trait HostLock: Send + Sync + core::fmt::Debug {
    /// Give up the lock if the current thread holds it. Returns true if and
    /// only if the lock was released, in which case the caller must call
    /// `acquire` later.
    fn release(&self) -> bool;

    /// Block until the current thread holds the lock.
    fn acquire(&self);
}

/// A host lock for hosts without any exclusivity restriction. This is the
/// default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHostLock;

impl HostLock for NoHostLock {
    fn release(&self) -> bool {
        false
    }

    fn acquire(&self) {}
}

/// A lock that at most one thread holds at any time, and which that thread
/// can temporarily give up.
///
/// This models the kind of interpreter-wide lock found in managed language
/// runtimes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use regex_host::{
///     compiler::{Compiler, Config},
///     ExclusiveLock, Flags,
/// };
///
/// let lock = Arc::new(ExclusiveLock::new());
/// let config = Config::new().host_lock(lock.clone());
/// let compiler = Compiler::with_config(config);
/// let re = compiler.compile(r"\w+", Flags::NONE)?;
///
/// let held = lock.lock();
/// // The lock is released while the engine runs and is held again when the
/// // result comes back.
/// assert!(re.search("hello", 0).is_some());
/// assert!(lock.is_held());
/// drop(held);
/// assert!(!lock.is_held());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct ExclusiveLock {
    owner: Mutex<Option<ThreadId>>,
    freed: Condvar,
}

impl ExclusiveLock {
    /// Create a new lock that no thread holds.
    pub fn new() -> ExclusiveLock {
        ExclusiveLock::default()
    }

    /// Block until the current thread holds the lock. The lock is released
    /// when the returned value is dropped.
    pub fn lock(&self) -> ExclusiveLockHolder<'_> {
        self.acquire();
        ExclusiveLockHolder { lock: self }
    }

    /// Whether the current thread holds the lock.
    pub fn is_held(&self) -> bool {
        *self.owner() == Some(thread::current().id())
    }

    fn owner(&self) -> MutexGuard<'_, Option<ThreadId>> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostLock for ExclusiveLock {
    fn release(&self) -> bool {
        let mut owner = self.owner();
        if *owner != Some(thread::current().id()) {
            return false;
        }
        *owner = None;
        self.freed.notify_all();
        true
    }

    fn acquire(&self) {
        let me = thread::current().id();
        let mut owner = self.owner();
        while owner.is_some() && *owner != Some(me) {
            owner =
                self.freed.wait(owner).unwrap_or_else(PoisonError::into_inner);
        }
        *owner = Some(me);
    }
}

/// Holds an [`ExclusiveLock`] until dropped.
#[derive(Debug)]
pub struct ExclusiveLockHolder<'a> {
    lock: &'a ExclusiveLock,
}

impl<'a> Drop for ExclusiveLockHolder<'a> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// Releases a host lock for as long as the guard lives.
///
/// The lock is re-acquired when the guard is dropped, which covers every way
/// out of the guarded scope, including unwinding. If the current thread did
/// not hold the lock when the guard was created, dropping the guard does not
/// acquire it.
#[derive(Debug)]
pub struct ConcurrencyGuard<'a> {
    lock: &'a dyn HostLock,
    released: bool,
}

impl<'a> ConcurrencyGuard<'a> {
    /// Release `lock` until the returned guard is dropped.
    pub fn new(lock: &'a dyn HostLock) -> ConcurrencyGuard<'a> {
        let released = lock.release();
        trace!("engine run begins (host lock released: {})", released);
        ConcurrencyGuard { lock, released }
    }

    /// Whether this guard released the lock and will re-acquire it.
    pub fn released(&self) -> bool {
        self.released
    }
}

impl<'a> Drop for ConcurrencyGuard<'a> {
    fn drop(&mut self) {
        if self.released {
            self.lock.acquire();
        }
    }
}
