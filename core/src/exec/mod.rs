/*
 * mod.rs
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

//! Execution primitives the HTTP client runs against: the shared event loop, the caller's
//! execution scope (cleanup registration), and single-assignment promises.

mod controller;
mod execution;
mod promise;

pub use controller::ExecController;
pub use execution::{Execution, ExecutionRef};
pub use promise::{channel, Fulfiller, Promise};
