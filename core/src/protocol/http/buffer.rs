/*
 * buffer.rs
 * Copyright (C) 2026 The Portolano authors
 *
 * This file is part of Portolano, an asynchronous HTTP client engine.
 *
 * Portolano is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Portolano is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Portolano.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Reference-counted body buffer and its release discipline.
//!
//! A `ByteBuf` starts with one reference. `retain` adds one and hands back another handle to
//! the same storage; `release` drops one, freeing the storage when the count reaches zero.
//! Releasing past zero is refused (and logged), so storage is freed exactly once.
//!
//! [`retain_until_close`] is the lifecycle hook used before a body reaches the caller: it
//! takes a reference for the caller and registers the matching release on the caller's
//! execution, so the body stays readable for the rest of that execution.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::exec::ExecutionRef;

struct Shared {
    refs: AtomicUsize,
    data: Mutex<Option<Bytes>>,
}

/// Handle to reference-counted body storage.
pub struct ByteBuf {
    shared: Arc<Shared>,
}

impl ByteBuf {
    /// New buffer holding one reference.
    pub fn new(data: Bytes) -> Self {
        Self {
            shared: Arc::new(Shared {
                refs: AtomicUsize::new(1),
                data: Mutex::new(Some(data)),
            }),
        }
    }

    pub fn empty() -> Self {
        Self::new(Bytes::new())
    }

    pub fn ref_count(&self) -> usize {
        self.shared.refs.load(Ordering::Acquire)
    }

    /// Add a reference. Returns `None` if the storage is already freed.
    pub fn retain(&self) -> Option<ByteBuf> {
        let mut current = self.shared.refs.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return None;
            }
            match self.shared.refs.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(ByteBuf {
                        shared: self.shared.clone(),
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Drop a reference. Returns true if this call freed the storage.
    pub fn release(&self) -> bool {
        let mut current = self.shared.refs.load(Ordering::Acquire);
        loop {
            if current == 0 {
                tracing::warn!("release on a freed body buffer ignored");
                return false;
            }
            match self.shared.refs.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        if current == 1 {
            self.shared
                .data
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take();
            true
        } else {
            false
        }
    }

    pub fn is_freed(&self) -> bool {
        self.ref_count() == 0
    }

    /// Contents, or `None` once freed. The returned `Bytes` is an independent view.
    pub fn bytes(&self) -> Option<Bytes> {
        self.shared
            .data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.bytes().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ByteBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuf")
            .field("refs", &self.ref_count())
            .field("len", &self.len())
            .finish()
    }
}

/// Take a reference on `buf` for the caller and release it when `execution` closes.
///
/// If the execution is already closed or gone the reference is released immediately and
/// `None` is returned: nobody is left to read the body.
pub fn retain_until_close(buf: &ByteBuf, execution: &ExecutionRef) -> Option<ByteBuf> {
    let retained = buf.retain()?;
    let releaser = ByteBuf {
        shared: retained.shared.clone(),
    };
    match execution.on_cleanup(move || {
        releaser.release();
    }) {
        Ok(()) => Some(retained),
        Err(release_now) => {
            tracing::warn!("response arrived after the caller's execution closed");
            release_now();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Execution;

    #[test]
    fn release_frees_at_zero_only_once() {
        let buf = ByteBuf::new(Bytes::from_static(b"abc"));
        let other = buf.retain().unwrap();
        assert_eq!(buf.ref_count(), 2);
        assert!(!other.release());
        assert_eq!(buf.bytes().unwrap(), Bytes::from_static(b"abc"));
        assert!(buf.release());
        assert!(buf.is_freed());
        assert!(buf.bytes().is_none());
        assert!(!buf.release());
        assert_eq!(buf.ref_count(), 0);
        assert!(buf.retain().is_none());
    }

    #[test]
    fn body_lives_until_execution_closes() {
        let exec = Execution::new();
        let pipeline_ref = ByteBuf::new(Bytes::from_static(b"body"));
        let caller = retain_until_close(&pipeline_ref, &exec.downgrade()).unwrap();
        // Pipeline drops its own reference once the response is handed off.
        assert!(!pipeline_ref.release());
        assert_eq!(caller.ref_count(), 1);
        assert_eq!(caller.bytes().unwrap(), Bytes::from_static(b"body"));

        exec.close();
        assert!(caller.is_freed());
        drop(exec);
        assert_eq!(caller.ref_count(), 0);
    }

    #[test]
    fn abnormal_scope_end_releases_once() {
        let pipeline_ref = ByteBuf::new(Bytes::from_static(b"body"));
        let observer = pipeline_ref.retain().unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let exec = Execution::new();
            let _caller = retain_until_close(&pipeline_ref, &exec.downgrade()).unwrap();
            panic!("caller blew up");
        }));
        assert!(result.is_err());
        // pipeline + observer remain
        assert_eq!(observer.ref_count(), 2);
        pipeline_ref.release();
        assert!(observer.release());
    }

    #[test]
    fn gone_execution_releases_immediately() {
        let exec = Execution::new();
        let r = exec.downgrade();
        drop(exec);
        let buf = ByteBuf::new(Bytes::from_static(b"x"));
        assert!(retain_until_close(&buf, &r).is_none());
        assert_eq!(buf.ref_count(), 1);
    }

    #[test]
    fn closed_but_live_execution_refuses_the_body() {
        let exec = Execution::new();
        exec.close();
        let buf = ByteBuf::new(Bytes::from_static(b"x"));
        assert!(retain_until_close(&buf, &exec.downgrade()).is_none());
        assert_eq!(buf.ref_count(), 1);
        drop(exec);
        assert_eq!(buf.ref_count(), 1);
    }
}
