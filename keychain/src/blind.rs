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

//! The blinding factor used pervasively to split a transaction's excess key
//! between the kernel (`k1`) and the published offset (`k2`), and to sum
//! commitments' blinding values during construction and validation.

use std::fmt;

use crate::types::Error;
use util::secp::key::{SecretKey, ZERO_KEY};
use util::secp::{self, Secp256k1};
use util::static_secp_instance;

/// A 32-byte scalar, possibly zero, that blinds a Pedersen commitment.
/// Composes under signed addition: a transaction offset plus its kernel
/// excess key reconstructs the full blinding sum of the transaction.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindingFactor([u8; secp::constants::SECRET_KEY_SIZE]);

impl fmt::Debug for BlindingFactor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({})", stringify!(BlindingFactor), self.to_hex())
	}
}

impl fmt::Display for BlindingFactor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

impl BlindingFactor {
	/// Wraps a raw 32-byte scalar.
	pub fn new(data: [u8; secp::constants::SECRET_KEY_SIZE]) -> BlindingFactor {
		BlindingFactor(data)
	}

	/// The zero blinding factor, identity element for addition.
	pub fn zero() -> BlindingFactor {
		BlindingFactor::new(ZERO_KEY.0)
	}

	/// Builds a blinding factor from an existing secret key.
	pub fn from_secret_key(skey: SecretKey) -> BlindingFactor {
		BlindingFactor::new(skey.0)
	}

	/// Parses a blinding factor out of a byte slice.
	pub fn from_slice(data: &[u8]) -> BlindingFactor {
		let mut a = [0; secp::constants::SECRET_KEY_SIZE];
		a.copy_from_slice(data);
		BlindingFactor(a)
	}

	/// Raw bytes of the blinding factor.
	pub fn as_slice(&self) -> &[u8] {
		&self.0[..]
	}

	/// Hex representation, used by JSON-ish debug output.
	pub fn to_hex(&self) -> String {
		use util::ToHex;
		self.0.to_hex()
	}

	/// Parses a blinding factor from a hex string.
	pub fn from_hex(hex: &str) -> Result<BlindingFactor, Error> {
		let bytes = util::from_hex(hex).map_err(|_| Error::Secp(secp::Error::InvalidSecretKey))?;
		Ok(BlindingFactor::from_slice(&bytes))
	}

	/// Is this the identity (zero) blinding factor?
	pub fn is_zero(&self) -> bool {
		self.0 == ZERO_KEY.0
	}

	/// Convert to a secp `SecretKey`, validating it lies in `[1, n)`.
	/// The zero blinding factor converts to the zero secret key, which is
	/// otherwise invalid for secp256k1 - this is only ever used internally
	/// when summing and the result is validated by the caller.
	pub fn secret_key(&self, secp: &Secp256k1) -> Result<SecretKey, Error> {
		if self.is_zero() {
			Ok(ZERO_KEY)
		} else {
			SecretKey::from_slice(secp, &self.0).map_err(|e| e.into())
		}
	}

	/// Adds this blinding factor to another, returning a new blinding factor
	/// representing the combined value. Handles either operand being zero.
	pub fn add(&self, other: &BlindingFactor) -> Result<BlindingFactor, Error> {
		let secp_inst = static_secp_instance();
		let secp = secp_inst.lock();
		if self.is_zero() {
			return Ok(*other);
		}
		if other.is_zero() {
			return Ok(*self);
		}
		let keys = vec![self.secret_key(&secp)?, other.secret_key(&secp)?];
		let sum = secp.blind_sum(keys, vec![])?;
		Ok(BlindingFactor::from_secret_key(sum))
	}

	/// Subtracts another blinding factor from this one.
	pub fn sub(&self, other: &BlindingFactor) -> Result<BlindingFactor, Error> {
		let secp_inst = static_secp_instance();
		let secp = secp_inst.lock();
		if other.is_zero() {
			return Ok(*self);
		}
		let positive = if self.is_zero() {
			vec![]
		} else {
			vec![self.secret_key(&secp)?]
		};
		let negative = vec![other.secret_key(&secp)?];
		let sum = secp.blind_sum(positive, negative)?;
		Ok(BlindingFactor::from_secret_key(sum))
	}

	/// Splits this blinding factor into `(k1, k2)` such that `k1 + k2 == self`,
	/// where `k2` is the provided offset. Used when building a transaction:
	/// `k2` (the offset) is published in the clear while `k1` becomes the
	/// kernel excess.
	pub fn split(&self, k2: &BlindingFactor) -> Result<BlindingFactor, Error> {
		self.sub(k2)
	}
}

/// Accumulator to compute the sum of a set of blinding factors, tracking the
/// sign with which each should be combined. Mirrors how a transaction
/// builder accumulates input, output and kernel-offset blinding values
/// before deriving the final kernel excess.
#[derive(Clone, Debug, Default)]
pub struct BlindSum {
	positive: Vec<BlindingFactor>,
	negative: Vec<BlindingFactor>,
}

impl BlindSum {
	/// Creates a new, empty blinding factor sum.
	pub fn new() -> BlindSum {
		BlindSum {
			positive: vec![],
			negative: vec![],
		}
	}

	/// Adds the provided blinding factor to the sum (positive sign).
	pub fn add_blinding_factor(mut self, blind: BlindingFactor) -> BlindSum {
		self.positive.push(blind);
		self
	}

	/// Subtracts the provided blinding factor from the sum (negative sign).
	pub fn sub_blinding_factor(mut self, blind: BlindingFactor) -> BlindSum {
		self.negative.push(blind);
		self
	}

	/// Computes the final sum, applying positive and negative components.
	/// Filters out any zero components, since secp forbids a zero
	/// `SecretKey` as a standalone operand.
	pub fn sum(self) -> Result<BlindingFactor, Error> {
		let secp_inst = static_secp_instance();
		let secp = secp_inst.lock();
		let positive = self
			.positive
			.iter()
			.filter(|b| !b.is_zero())
			.map(|b| b.secret_key(&secp))
			.collect::<Result<Vec<_>, _>>()?;
		let negative = self
			.negative
			.iter()
			.filter(|b| !b.is_zero())
			.map(|b| b.secret_key(&secp))
			.collect::<Result<Vec<_>, _>>()?;

		if positive.is_empty() && negative.is_empty() {
			return Ok(BlindingFactor::zero());
		}

		let sum = secp.blind_sum(positive, negative)?;
		Ok(BlindingFactor::from_secret_key(sum))
	}
}
