//! Waker plumbing for the single-threaded scheduler.
//!
//! The standard library only offers `Waker` construction from `Arc`-based
//! wakeables, which drags `Send + Sync` bounds into a crate that is
//! single-threaded by design. This builds a `Waker` from an `Rc`'d closure
//! through a hand-rolled `RawWakerVTable` instead.
//!
//! Invariant: wakers produced here must never leave the thread that created
//! them. Nothing in this crate is `Send`, so the only way to violate this
//! is to smuggle a `Waker` out manually.

use std::rc::Rc;
use std::task::{RawWaker, RawWakerVTable, Waker};

struct WakeFn {
    wake: Box<dyn Fn()>,
}

const VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

unsafe fn clone_raw(ptr: *const ()) -> RawWaker {
    Rc::increment_strong_count(ptr as *const WakeFn);
    RawWaker::new(ptr, &VTABLE)
}

unsafe fn wake_raw(ptr: *const ()) {
    let this = Rc::from_raw(ptr as *const WakeFn);
    (this.wake)();
}

unsafe fn wake_by_ref_raw(ptr: *const ()) {
    let this = &*(ptr as *const WakeFn);
    (this.wake)();
}

unsafe fn drop_raw(ptr: *const ()) {
    drop(Rc::from_raw(ptr as *const WakeFn));
}

/// Build a waker that invokes `wake` on every `wake`/`wake_by_ref`.
pub(crate) fn local_waker(wake: impl Fn() + 'static) -> Waker {
    let raw = Rc::into_raw(Rc::new(WakeFn {
        wake: Box::new(wake),
    }));
    // SAFETY: the vtable above upholds the RawWaker contract for an Rc:
    // clone bumps the strong count, wake-by-value consumes one count,
    // drop releases one count.
    unsafe { Waker::from_raw(RawWaker::new(raw as *const (), &VTABLE)) }
}
