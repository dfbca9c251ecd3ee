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

//! Short ids for identifying inputs, outputs and kernels within a compact
//! block, without having to ship the full 32-byte hash for each.

use std::cmp::min;

use byteorder::{ByteOrder, LittleEndian};
use siphasher::sip::SipHasher24;

use crate::core::hash::{Hash, Hashed};
use crate::ser::{self, Readable, Reader, Writeable, Writer};
use blake2::blake2b::Blake2b;
use util::ToHex;

/// The size of a short id used to identify inputs/outputs/kernels (6 bytes).
pub const SHORT_ID_SIZE: usize = 6;

/// Trait for types that can compute their own short_id relative to a block.
pub trait ShortIdentifiable {
	/// Computes the short_id for this element, relative to a block hash and
	/// a connection-specific nonce. Binding the siphash key to both the
	/// block and the nonce means two peers relaying the same compact block
	/// never collide on the same short_ids, limiting the blast radius of an
	/// adversarial short_id collision.
	fn short_id(&self, block_hash: &Hash, nonce: u64) -> ShortId;
}

impl<H: Hashed> ShortIdentifiable for H {
	fn short_id(&self, block_hash: &Hash, nonce: u64) -> ShortId {
		short_id_from_hash(&self.hash(), block_hash, nonce)
	}
}

/// Computes a short_id directly from an already-hashed value (e.g. a kernel
/// hash), keyed by the block hash and a connection nonce. Split out from
/// the `ShortIdentifiable` blanket impl so it can be applied to a hash that
/// is itself the element identity, without hashing it a second time.
pub fn short_id_from_hash(hash: &Hash, block_hash: &Hash, nonce: u64) -> ShortId {
	use std::hash::Hasher;

	// Derive the siphash key from Blake2b(block_hash || nonce_le), keeping
	// the first 16 bytes as two little-endian u64 halves.
	let mut nonce_bytes = [0u8; 8];
	LittleEndian::write_u64(&mut nonce_bytes, nonce);

	let mut key_hasher = Blake2b::new(16);
	key_hasher.update(block_hash.as_bytes());
	key_hasher.update(&nonce_bytes);
	let key_digest = key_hasher.finalize();
	let key_bytes = key_digest.as_bytes();

	let k0 = LittleEndian::read_u64(&key_bytes[0..8]);
	let k1 = LittleEndian::read_u64(&key_bytes[8..16]);

	let mut sip_hasher = SipHasher24::new_with_keys(k0, k1);
	sip_hasher.write(&hash.to_vec());
	let res = sip_hasher.finish();

	let mut buf = [0; 8];
	LittleEndian::write_u64(&mut buf, res);
	ShortId::from_bytes(&buf[0..SHORT_ID_SIZE])
}

/// Short id used to identify an input, output or kernel within a compact
/// block.
#[derive(PartialEq, Clone, PartialOrd, Ord, Eq, Hash, Serialize, Deserialize)]
pub struct ShortId([u8; SHORT_ID_SIZE]);

impl ::std::fmt::Debug for ShortId {
	fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
		write!(f, "{}({})", stringify!(ShortId), self.to_hex())
	}
}

impl Readable for ShortId {
	fn read<R: Reader>(reader: &mut R) -> Result<ShortId, ser::Error> {
		let v = reader.read_fixed_bytes(SHORT_ID_SIZE)?;
		Ok(ShortId::from_bytes(&v))
	}
}

impl Writeable for ShortId {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_fixed_bytes(&self.0)
	}
}

impl ShortId {
	/// Builds a new short_id from a byte slice, truncating or zero-padding
	/// to `SHORT_ID_SIZE` as needed.
	pub fn from_bytes(bytes: &[u8]) -> ShortId {
		let mut id = [0; SHORT_ID_SIZE];
		let len = min(SHORT_ID_SIZE, bytes.len());
		id[..len].copy_from_slice(&bytes[..len]);
		ShortId(id)
	}

	/// Hex representation of this short_id.
	pub fn to_hex(&self) -> String {
		self.0.to_hex()
	}

	/// Parses a short_id from a hex string.
	pub fn from_hex(hex: &str) -> Result<ShortId, ser::Error> {
		let bytes = util::from_hex(hex).map_err(|_| ser::Error::HexError(hex.to_string()))?;
		Ok(ShortId::from_bytes(&bytes))
	}

	/// The zero short_id, convenient in tests.
	pub fn zero() -> ShortId {
		ShortId::from_bytes(&[0])
	}
}
