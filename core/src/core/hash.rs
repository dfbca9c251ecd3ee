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

//! Hash Function
//!
//! Primary hash function used in the protocol: Blake2b, truncated to 32
//! bytes. Every type that can be hashed derives its digest from its
//! `SerializationMode::Hash` encoding, so hashing and the wire format for
//! commitment purposes are one and the same.

use crate::ser::{self, ProtocolVersion, Readable, Reader, SerializationMode, Writeable, Writer};
use blake2::blake2b::Blake2b;
use std::cmp::min;
use std::convert::AsRef;
use std::fmt;
use util::{from_hex, ToHex};

/// A hash, in practice a SHA256 of the Blake2b digest, computed over the
/// hashable serialization of a type. Uniquely (or close enough) identifies
/// blocks, transactions, outputs, kernels and headers throughout the
/// protocol.
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Hash([u8; 32]);

/// The zero hash, used as `previous` on the genesis header and as a
/// sentinel "no value" hash elsewhere.
pub const ZERO_HASH: Hash = Hash([0; 32]);

impl fmt::Debug for Hash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

impl fmt::Display for Hash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

impl Hash {
	/// The zero hash.
	pub fn zero() -> Hash {
		ZERO_HASH
	}

	/// Builds a Hash from a byte vector. Panics if the vector isn't 32 bytes.
	pub fn from_vec(v: &[u8]) -> Hash {
		let mut a = [0; 32];
		let len = min(v.len(), a.len());
		a[..len].copy_from_slice(&v[..len]);
		Hash(a)
	}

	/// Converts the hash to a byte vector.
	pub fn to_vec(&self) -> Vec<u8> {
		self.0.to_vec()
	}

	/// Converts the hash to a byte slice.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Hex representation of this hash.
	pub fn to_hex(&self) -> String {
		self.0.to_hex()
	}

	/// Interprets the first 8 bytes as a little-endian `u64`. Used to derive
	/// a proof's raw difficulty from its hash.
	pub fn to_u64(&self) -> u64 {
		let mut buf = [0u8; 8];
		buf.copy_from_slice(&self.0[0..8]);
		u64::from_le_bytes(buf)
	}

	/// Builds a Hash from a hex string.
	pub fn from_hex(hex: &str) -> Result<Hash, ser::Error> {
		let bytes = from_hex(hex).map_err(|e| ser::Error::HexError(format!("{}", e)))?;
		Ok(Hash::from_vec(&bytes))
	}
}

impl AsRef<[u8]> for Hash {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl Writeable for Hash {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_fixed_bytes(&self.0)
	}
}

impl Readable for Hash {
	fn read<R: Reader>(reader: &mut R) -> Result<Hash, ser::Error> {
		let v = reader.read_fixed_bytes(32)?;
		Ok(Hash::from_vec(&v))
	}
}

/// A `Writer` that feeds everything written to it into a running Blake2b
/// hash state instead of a buffer, so large structures can be hashed
/// without ever materializing their full serialization.
pub struct HashWriter {
	state: Blake2b,
}

impl Default for HashWriter {
	fn default() -> HashWriter {
		HashWriter {
			state: Blake2b::new(32),
		}
	}
}

impl HashWriter {
	/// Consumes this writer and returns the resulting 32-byte hash.
	pub fn into_hash(self) -> Hash {
		let digest = self.state.finalize();
		Hash::from_vec(digest.as_bytes())
	}
}

impl Writer for HashWriter {
	fn protocol_version(&self) -> ProtocolVersion {
		ProtocolVersion::local()
	}
	fn serialization_mode(&self) -> SerializationMode {
		SerializationMode::Hash
	}
	fn write_fixed_bytes<T: AsRef<[u8]>>(&mut self, bytes: T) -> Result<(), ser::Error> {
		self.state.update(bytes.as_ref());
		Ok(())
	}
}

/// Any type that knows how to hash itself under `SerializationMode::Hash`.
pub trait Hashed {
	/// Obtain the hash of this object's hashable byte representation.
	fn hash(&self) -> Hash;
}

/// Marker trait for types whose `Hashed` implementation should simply
/// serialize via `Writeable` into a `HashWriter`. Nearly every hashable type
/// in the protocol is `DefaultHashable`; the exceptions override `Hashed`
/// directly when the hash needs to diverge from the full serialization
/// (e.g. a compact block's header hash, which always hashes the same way
/// regardless of whether the nonce/body are present).
pub trait DefaultHashable: Writeable {}

impl<T: DefaultHashable> Hashed for T {
	fn hash(&self) -> Hash {
		let mut hasher = HashWriter::default();
		// Writeable::write never fails against a HashWriter: it has no
		// underlying IO to fail.
		self.write(&mut hasher)
			.expect("failed to hash a writeable value");
		hasher.into_hash()
	}
}

impl DefaultHashable for Hash {}
impl DefaultHashable for u8 {}
impl DefaultHashable for u64 {}

impl<A: DefaultHashable, B: DefaultHashable> DefaultHashable for (A, B) {}
