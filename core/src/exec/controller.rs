/*
 * controller.rs
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

//! Handle to the shared event loop.

use std::future::Future;

use tokio::runtime::Handle;

use crate::exec::promise::{self, Fulfiller, Promise};

/// Shared event-processing loop handed to the HTTP client at construction.
///
/// Cheap to clone; every clone drives work on the same runtime.
#[derive(Clone, Debug)]
pub struct ExecController {
    event_loop: Handle,
}

impl ExecController {
    pub fn new(event_loop: Handle) -> Self {
        Self { event_loop }
    }

    /// Controller for the runtime the caller is running on, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// Spawn `action` on the event loop with the write side of a new promise.
    ///
    /// `action` must report through the fulfiller; if it returns without doing so, the
    /// promise resolves to `HttpError::Abandoned`.
    pub fn promise<T, F, Fut>(&self, action: F) -> Promise<T>
    where
        T: Send + 'static,
        F: FnOnce(Fulfiller<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (fulfiller, promise) = promise::channel();
        self.event_loop.spawn(action(fulfiller));
        promise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn promise_runs_on_event_loop() {
        let exec = ExecController::current().unwrap();
        let p = exec.promise(|f| async move { f.success("done") });
        assert_eq!(p.await.unwrap(), "done");
    }
}
