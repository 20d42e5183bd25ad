/*
 * execution.rs
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

//! Execution scope: the caller's logical unit of work and its cleanup list.
//!
//! An `Execution` owns a list of cleanup actions. They run exactly once, in reverse
//! registration order, when the execution is closed explicitly or dropped (which also
//! covers a panic unwinding through the caller). Work running elsewhere (the exchange
//! task) holds an `ExecutionRef`, which never keeps the scope alive.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

type Cleanup = Box<dyn FnOnce() + Send + 'static>;

struct Scope {
    /// `None` once closed.
    cleanups: Mutex<Option<Vec<Cleanup>>>,
}

impl Scope {
    /// Queue `action` unless the scope is closed, in which case it is handed back.
    fn try_register<F>(&self, action: F) -> Result<(), F>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut guard = self.cleanups.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_mut() {
            Some(list) => {
                list.push(Box::new(action));
                Ok(())
            }
            None => Err(action),
        }
    }

    fn close(&self) {
        let taken = self
            .cleanups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(mut list) = taken {
            while let Some(action) = list.pop() {
                action();
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.cleanups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }
}

/// Owning handle for an execution scope. Not `Clone`: the scope ends when this value does.
pub struct Execution {
    scope: Arc<Scope>,
}

impl Execution {
    pub fn new() -> Self {
        Self {
            scope: Arc::new(Scope {
                cleanups: Mutex::new(Some(Vec::new())),
            }),
        }
    }

    /// Register an action to run when this execution closes. On a closed execution the
    /// action runs immediately.
    pub fn on_cleanup(&self, action: impl FnOnce() + Send + 'static) {
        if let Err(action) = self.scope.try_register(action) {
            tracing::warn!("cleanup registered on a closed execution; running it now");
            action();
        }
    }

    /// Weak handle for work that must register cleanups without extending the scope.
    pub fn downgrade(&self) -> ExecutionRef {
        ExecutionRef {
            scope: Arc::downgrade(&self.scope),
        }
    }

    /// Run all registered cleanups now. Further calls (and the eventual drop) do nothing.
    pub fn close(&self) {
        self.scope.close();
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_closed()
    }
}

impl Default for Execution {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Execution {
    fn drop(&mut self) {
        self.scope.close();
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Non-owning handle to an [`Execution`].
#[derive(Clone)]
pub struct ExecutionRef {
    scope: Weak<Scope>,
}

impl ExecutionRef {
    /// Register a cleanup on the referenced execution.
    ///
    /// Returns the action back when the execution is closed or dropped, so the caller can
    /// run it (or not) itself.
    pub fn on_cleanup<F>(&self, action: F) -> Result<(), F>
    where
        F: FnOnce() + Send + 'static,
    {
        match self.scope.upgrade() {
            Some(scope) => scope.try_register(action),
            None => Err(action),
        }
    }

    /// True when the owning `Execution` has been closed or dropped.
    pub fn is_gone(&self) -> bool {
        self.scope.upgrade().map_or(true, |scope| scope.is_closed())
    }
}

impl fmt::Debug for ExecutionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRef")
            .field("gone", &self.is_gone())
            .finish()
    }
}
