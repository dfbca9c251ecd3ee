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

//! Errors arising while assembling a transaction or block reward.

use crate::core::committed;
use crate::core::transaction;
use keychain;
use util::secp;

/// Errors thrown by the transaction building functions.
#[derive(Debug, Clone, Fail)]
pub enum Error {
	/// Underlying keychain (blinding factor) error.
	#[fail(display = "keychain error: {:?}", _0)]
	Keychain(keychain::Error),
	/// Underlying Secp256k1 error (signature or commitment failure).
	#[fail(display = "secp error: {:?}", _0)]
	Secp(secp::Error),
	/// Transaction validation error, e.g. a kernel sum mismatch.
	#[fail(display = "transaction error: {:?}", _0)]
	Transaction(transaction::Error),
	/// Committed-sum error propagated from the Committed trait.
	#[fail(display = "committed error: {:?}", _0)]
	Committed(committed::Error),
}

impl From<keychain::Error> for Error {
	fn from(e: keychain::Error) -> Error {
		Error::Keychain(e)
	}
}

impl From<secp::Error> for Error {
	fn from(e: secp::Error) -> Error {
		Error::Secp(e)
	}
}

impl From<transaction::Error> for Error {
	fn from(e: transaction::Error) -> Error {
		Error::Transaction(e)
	}
}

impl From<committed::Error> for Error {
	fn from(e: committed::Error) -> Error {
		Error::Committed(e)
	}
}
