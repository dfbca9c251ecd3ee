// Copyright 2021 The Grin Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging, as well as various low-level utilities that factor Rust
//! patterns that are frequent within the grin codebase.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

// Re-export so only has to be included once.
pub extern crate grin_secp256k1zkp as secp_;
pub use secp_ as secp;

pub use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Logging related.
pub mod logger;
pub use crate::logger::{init_logger, init_test_logger};

pub mod types;
pub use crate::types::{LogLevel, LoggingConfig, ZeroingString};

// Static secp instance, randomized once per process at first use.
pub mod secp_static;
pub use crate::secp_static::static_secp_instance;

mod hex;
pub use crate::hex::{from_hex, ToHex};

pub mod file;
pub mod zip;

use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// Encapsulation of a `RefCell<Option<T>>` for one-time initialization after
/// construction. This implementation will purposefully fail hard if not used
/// properly, for example if it's not initialized before being first used
/// (borrowed).
#[derive(Clone)]
pub struct OneTime<T> {
	inner: RefCell<Option<T>>,
}

unsafe impl<T> Sync for OneTime<T> {}
unsafe impl<T> Send for OneTime<T> {}

impl<T> Default for OneTime<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> OneTime<T> {
	/// Builds a new uninitialized OneTime.
	pub fn new() -> OneTime<T> {
		OneTime {
			inner: RefCell::new(None),
		}
	}

	/// Initializes the OneTime, should only be called once after construction.
	pub fn init(&self, value: T) {
		let mut inner_mut = self.inner.borrow_mut();
		*inner_mut = Some(value);
	}

	/// Whether the OneTime has been initialized.
	pub fn is_initialized(&self) -> bool {
		self.inner.borrow().is_some()
	}

	/// Borrows the OneTime, should only be called after initialization.
	pub fn borrow(&self) -> Ref<'_, T> {
		Ref::map(self.inner.borrow(), |o| o.as_ref().unwrap())
	}
}

impl<T: Clone> OneTime<T> {
	/// Returns a clone of the wrapped value, panics if not yet initialized.
	pub fn get(&self) -> T {
		self.borrow().deref().clone()
	}
}
