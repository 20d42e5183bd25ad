/*
 * promise.rs
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

//! Single-assignment completion handle.
//!
//! `Fulfiller` is the write side, `Promise` the caller-visible read side. Reporting consumes
//! the fulfiller, so an exchange can report success or failure at most once.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::protocol::http::{HttpError, HttpResult};

/// Create a connected fulfiller/promise pair.
pub fn channel<T>() -> (Fulfiller<T>, Promise<T>) {
    let (tx, rx) = oneshot::channel();
    (Fulfiller { tx }, Promise { rx })
}

/// Write side of a promise. Exactly one of `success` / `error` can be called.
pub struct Fulfiller<T> {
    tx: oneshot::Sender<HttpResult<T>>,
}

impl<T> Fulfiller<T> {
    pub fn success(self, value: T) {
        self.complete(Ok(value));
    }

    pub fn error(self, error: HttpError) {
        self.complete(Err(error));
    }

    pub fn complete(self, outcome: HttpResult<T>) {
        if self.tx.send(outcome).is_err() {
            tracing::warn!("exchange completed after its promise was dropped");
        }
    }
}

/// Read side: resolves once with the exchange outcome.
#[must_use = "a promise does nothing unless awaited"]
pub struct Promise<T> {
    rx: oneshot::Receiver<HttpResult<T>>,
}

impl<T> Future for Promise<T> {
    type Output = HttpResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(HttpError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::http::ErrorKind;

    #[tokio::test]
    async fn success_is_delivered() {
        let (f, p) = channel::<u32>();
        f.success(7);
        assert_eq!(p.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn error_is_delivered() {
        let (f, p) = channel::<u32>();
        f.error(HttpError::ResponseTooLarge { limit: 1 });
        assert_eq!(p.await.unwrap_err().kind(), ErrorKind::ResponseTooLarge);
    }

    #[tokio::test]
    async fn dropped_fulfiller_resolves_abandoned() {
        let (f, p) = channel::<u32>();
        drop(f);
        assert_eq!(p.await.unwrap_err().kind(), ErrorKind::Abandoned);
    }

    #[test]
    fn completing_a_dropped_promise_is_harmless() {
        let (f, p) = channel::<u32>();
        drop(p);
        f.success(1);
    }
}
