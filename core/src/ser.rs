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

//! Big-endian, deterministic binary serialization and deserialization for
//! the types that make up blocks, transactions and their component parts.
//! All wire formats and hashes in the protocol run through this module, so
//! encoding here must stay byte-for-byte stable across versions.

use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use std::fmt::{self, Debug};
use std::io::{self, Read, Write};
use std::marker::PhantomData;
use std::{cmp, error};

use crate::core::hash::{DefaultHashable, Hash};

/// Possible errors while reading/writing on the wire.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum Error {
	/// Wraps an io error produced when reading or writing
	#[fail(display = "IO error: {}", _0)]
	IOErr(String, io::ErrorKind),
	/// Expected a given value that wasn't found
	#[fail(display = "unexpected data")]
	UnexpectedData {
		/// What we wanted
		expected: Vec<u8>,
		/// What we got
		received: Vec<u8>,
	},
	/// Data wasn't in a consumable format
	#[fail(display = "corrupted data")]
	CorruptedData,
	/// Incorrect number of elements (when self-describing vecs are read)
	#[fail(display = "count error")]
	CountError,
	/// Error from from_hex deserialization
	#[fail(display = "hex error")]
	HexError(String),
	/// Inputs/outputs/kernels must be sorted lexicographically.
	#[fail(display = "sort order")]
	BadSortOrder,
	/// Inputs/outputs/kernels included duplicate entries.
	#[fail(display = "non-unique")]
	BadDuplicate,
	/// Block header version is invalid for its height.
	#[fail(display = "invalid base64")]
	InvalidBase64,
	/// Data size too large
	#[fail(display = "too large read")]
	TooLargeReadErr,
}

impl error::Error for Error {}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::IOErr(format!("{}", e), e.kind())
	}
}

/// Signal to a serializable object how much of its data should be serialized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SerializationMode {
	/// Serialize everything sufficiently to fully reconstruct the object.
	Full,
	/// Serialize the data that defines the object's hash. Some fields that
	/// would vary based on perspective (e.g. a signature) are skipped.
	Hash,
}

/// Protocol version for serialization/deserialization. Wraps a `u32` so it
/// can be bumped without plumbing raw integers through every signature.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtocolVersion(pub u32);

impl ProtocolVersion {
	/// The initial, and for now only actively-negotiated, protocol version.
	pub fn local() -> ProtocolVersion {
		ProtocolVersion(1)
	}
}

impl fmt::Display for ProtocolVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<ProtocolVersion> for u32 {
	fn from(v: ProtocolVersion) -> u32 {
		v.0
	}
}

/// Implementations defined how different numbers and binary structures are
/// written to an underlying stream or container (depending on implementation).
pub trait Writer {
	/// The protocol version we are writing for.
	fn protocol_version(&self) -> ProtocolVersion;

	/// Whether we want to serialize the full object or its hashable subset.
	fn serialization_mode(&self) -> SerializationMode;

	/// Writes a u8 as bytes.
	fn write_u8(&mut self, n: u8) -> Result<(), Error> {
		self.write_fixed_bytes(&[n])
	}

	/// Writes a u16 as bytes.
	fn write_u16(&mut self, n: u16) -> Result<(), Error> {
		let mut bytes = [0; 2];
		BigEndian::write_u16(&mut bytes, n);
		self.write_fixed_bytes(&bytes)
	}

	/// Writes a u32 as bytes.
	fn write_u32(&mut self, n: u32) -> Result<(), Error> {
		let mut bytes = [0; 4];
		BigEndian::write_u32(&mut bytes, n);
		self.write_fixed_bytes(&bytes)
	}

	/// Writes a u64 as bytes.
	fn write_u64(&mut self, n: u64) -> Result<(), Error> {
		let mut bytes = [0; 8];
		BigEndian::write_u64(&mut bytes, n);
		self.write_fixed_bytes(&bytes)
	}

	/// Writes a i32 as bytes.
	fn write_i32(&mut self, n: i32) -> Result<(), Error> {
		let mut bytes = [0; 4];
		BigEndian::write_i32(&mut bytes, n);
		self.write_fixed_bytes(&bytes)
	}

	/// Writes a i64 as bytes.
	fn write_i64(&mut self, n: i64) -> Result<(), Error> {
		let mut bytes = [0; 8];
		BigEndian::write_i64(&mut bytes, n);
		self.write_fixed_bytes(&bytes)
	}

	/// Writes a variable number of bytes, prefixed with their length as u64.
	fn write_bytes<T: AsRef<[u8]>>(&mut self, bytes: T) -> Result<(), Error> {
		self.write_u64(bytes.as_ref().len() as u64)?;
		self.write_fixed_bytes(bytes)
	}

	/// Writes a fixed number of bytes, without a length prefix.
	fn write_fixed_bytes<T: AsRef<[u8]>>(&mut self, bytes: T) -> Result<(), Error>;
}

/// Implementations defined how different numbers and binary structures are
/// read from an underlying stream or container (depending on implementation).
pub trait Reader {
	/// The protocol version we are reading for.
	fn protocol_version(&self) -> ProtocolVersion;

	/// Reads a u8 from the underlying Read.
	fn read_u8(&mut self) -> Result<u8, Error>;
	/// Reads a u16 from the underlying Read.
	fn read_u16(&mut self) -> Result<u16, Error>;
	/// Reads a u32 from the underlying Read.
	fn read_u32(&mut self) -> Result<u32, Error>;
	/// Reads a u64 from the underlying Read.
	fn read_u64(&mut self) -> Result<u64, Error>;
	/// Reads a i32 from the underlying Read.
	fn read_i32(&mut self) -> Result<i32, Error>;
	/// Reads a i64 from the underlying Read.
	fn read_i64(&mut self) -> Result<i64, Error>;
	/// Reads a variable size vector from the underlying Read. Expects a usize
	/// to be encoded as a prefix.
	fn read_bytes_len_prefix(&mut self) -> Result<Vec<u8>, Error>;
	/// Reads a fixed number of bytes from the underlying Read.
	fn read_fixed_bytes(&mut self, length: usize) -> Result<Vec<u8>, Error>;
	/// Consumes a byte from the underlying Read and error if it doesn't match
	/// the provided value.
	fn expect_u8(&mut self, val: u8) -> Result<u8, Error>;
}

/// Trait for types that can be serialized as binary, meant for wire
/// transmission or hashing, with the level of detail controlled by the
/// writer's `SerializationMode`.
pub trait Writeable {
	/// Write the data held by this Writeable to the provided writer.
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error>;
}

/// Trait for types that can be deserialized from binary, recovering a
/// `Readable` from anything implementing `Reader`.
pub trait Readable
where
	Self: Sized,
{
	/// Reads the data necessary to this Readable from the provided reader.
	fn read<R: Reader>(reader: &mut R) -> Result<Self, Error>;
}

/// Reads multiple serialized items into a `Vec`.
pub fn read_multi<T: Readable, R: Reader>(reader: &mut R, count: u64) -> Result<Vec<T>, Error> {
	if count > crate::consensus::MAX_IN_OUT_LEN {
		return Err(Error::TooLargeReadErr);
	}
	(0..count).map(|_| T::read(reader)).collect()
}

/// Trait that every type used in a PMMR needs to implement, specifying how
/// the element is encoded and persisted for storage and pruning.
pub trait PMMRable: Writeable + Clone + Debug + DefaultHashable {
	/// The type representing the element persisted for leaf data storage.
	/// For most elements this is the same as `Self`, but e.g. output
	/// commitments are summarized by their own lighter-weight identifier.
	type E: Writeable + Readable;

	/// Convert this element to the lighter-weight element to be persisted.
	fn as_elmt(&self) -> Self::E;
}

/// Trait used to produce the hash of an element at a given PMMR position,
/// folding the position into the hash so the same data hashes differently
/// at different tree positions.
pub trait PMMRIndexHashable {
	/// Hash of the element at a given position in a PMMR.
	fn hash_with_index(&self, index: u64) -> Hash;
}

impl<T: DefaultHashable> PMMRIndexHashable for T {
	fn hash_with_index(&self, index: u64) -> Hash {
		(index, self).hash()
	}
}

/// A single (hash, pos) entry as retained by a PMMR backend's hash file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEntry {
	/// The hash at this position.
	pub hash: Hash,
	/// The MMR position.
	pub pos: u64,
}

impl Writeable for HashEntry {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
		writer.write_fixed_bytes(&self.hash)?;
		writer.write_u64(self.pos)
	}
}

impl Readable for HashEntry {
	fn read<R: Reader>(reader: &mut R) -> Result<HashEntry, Error> {
		let hash = Hash::read(reader)?;
		let pos = reader.read_u64()?;
		Ok(HashEntry { hash, pos })
	}
}

/// Verifies that the supplied slice is sorted and contains no duplicates,
/// as required of inputs, outputs and kernels on the wire.
pub trait VerifySortedAndUnique<T> {
	/// Verify a slice of items is sorted and all items unique.
	fn verify_sorted_and_unique(&self) -> Result<(), Error>;
}

impl<T: Ord> VerifySortedAndUnique<T> for Vec<T> {
	fn verify_sorted_and_unique(&self) -> Result<(), Error> {
		for pair in self.windows(2) {
			match pair[0].cmp(&pair[1]) {
				cmp::Ordering::Less => continue,
				cmp::Ordering::Equal => return Err(Error::BadDuplicate),
				cmp::Ordering::Greater => return Err(Error::BadSortOrder),
			}
		}
		Ok(())
	}
}

/// Trait for types providing a fixed-length binary representation, used for
/// types that don't carry a length prefix on the wire (hashes, commitments,
/// signatures).
pub trait FixedLength {
	/// The exact length in bytes of the binary representation.
	const LEN: usize;
}

// Blanket impls of Writeable/Readable for primitive integer types, used
// pervasively throughout header and body serialization.

impl Writeable for u8 {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
		writer.write_u8(*self)
	}
}
impl Readable for u8 {
	fn read<R: Reader>(reader: &mut R) -> Result<u8, Error> {
		reader.read_u8()
	}
}

impl Writeable for u16 {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
		writer.write_u16(*self)
	}
}
impl Readable for u16 {
	fn read<R: Reader>(reader: &mut R) -> Result<u16, Error> {
		reader.read_u16()
	}
}

impl Writeable for u32 {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
		writer.write_u32(*self)
	}
}
impl Readable for u32 {
	fn read<R: Reader>(reader: &mut R) -> Result<u32, Error> {
		reader.read_u32()
	}
}

impl Writeable for u64 {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
		writer.write_u64(*self)
	}
}
impl Readable for u64 {
	fn read<R: Reader>(reader: &mut R) -> Result<u64, Error> {
		reader.read_u64()
	}
}

impl Writeable for i64 {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
		writer.write_i64(*self)
	}
}
impl Readable for i64 {
	fn read<R: Reader>(reader: &mut R) -> Result<i64, Error> {
		reader.read_i64()
	}
}

/// Useful marker trait on types that can be sized byte slices.
pub trait AsFixedBytes: Sized {
	/// The slice representation of this value.
	fn as_fixed_bytes(&self) -> &[u8];
}

impl AsFixedBytes for Vec<u8> {
	fn as_fixed_bytes(&self) -> &[u8] {
		&self[..]
	}
}

impl AsFixedBytes for [u8] {
	fn as_fixed_bytes(&self) -> &[u8] {
		self
	}
}

/// Utility wrapper combining two hashable values into one, so both get
/// folded into one hash (used to make sibling nodes order-sensitive in the
/// PMMR and bind a serialized field to its position in a sequence, e.g.
/// `(index, value)` or `(left_child, right_child)`).
impl<A: DefaultHashable, B: DefaultHashable> Writeable for (A, B) {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
		self.0.write(writer)?;
		self.1.write(writer)
	}
}

/// A `Write` implementation that counts the bytes written without storing
/// them, used to compute serialized sizes before allocating.
pub struct CountWriter {
	/// The protocol version used while counting.
	pub version: ProtocolVersion,
	/// The running count, in bytes.
	pub count: usize,
}

impl Writer for CountWriter {
	fn protocol_version(&self) -> ProtocolVersion {
		self.version
	}
	fn serialization_mode(&self) -> SerializationMode {
		SerializationMode::Full
	}
	fn write_fixed_bytes<T: AsRef<[u8]>>(&mut self, bytes: T) -> Result<(), Error> {
		self.count += bytes.as_ref().len();
		Ok(())
	}
}

/// Computes the serialized size in bytes of a `Writeable`, using the
/// current protocol version.
pub fn serialized_size<W: Writeable>(thing: &W) -> Result<usize, Error> {
	let mut counter = CountWriter {
		version: ProtocolVersion::local(),
		count: 0,
	};
	thing.write(&mut counter)?;
	Ok(counter.count)
}

/// A generic `Writer` backed by any `std::io::Write`.
pub struct BinWriter<'a> {
	sink: &'a mut dyn Write,
	version: ProtocolVersion,
	mode: SerializationMode,
}

impl<'a> BinWriter<'a> {
	/// Wraps a writer, serializing for full reconstruction.
	pub fn new(sink: &'a mut dyn Write, version: ProtocolVersion) -> BinWriter<'a> {
		BinWriter {
			sink,
			version,
			mode: SerializationMode::Full,
		}
	}

	/// Wraps a writer, serializing only the hashable subset of fields.
	pub fn new_hash(sink: &'a mut dyn Write, version: ProtocolVersion) -> BinWriter<'a> {
		BinWriter {
			sink,
			version,
			mode: SerializationMode::Hash,
		}
	}
}

impl<'a> Writer for BinWriter<'a> {
	fn protocol_version(&self) -> ProtocolVersion {
		self.version
	}
	fn serialization_mode(&self) -> SerializationMode {
		self.mode
	}
	fn write_fixed_bytes<T: AsRef<[u8]>>(&mut self, bytes: T) -> Result<(), Error> {
		self.sink.write_all(bytes.as_ref())?;
		Ok(())
	}
}

/// A generic `Reader` backed by any `std::io::Read`.
pub struct BinReader<'a, R: Read> {
	source: &'a mut R,
	version: ProtocolVersion,
}

impl<'a, R: Read> BinReader<'a, R> {
	/// Wraps a reader for the given protocol version.
	pub fn new(source: &'a mut R, version: ProtocolVersion) -> BinReader<'a, R> {
		BinReader { source, version }
	}
}

fn map_io_err(e: io::Error) -> Error {
	Error::IOErr(format!("{}", e), e.kind())
}

impl<'a, R: Read> Reader for BinReader<'a, R> {
	fn protocol_version(&self) -> ProtocolVersion {
		self.version
	}
	fn read_u8(&mut self) -> Result<u8, Error> {
		self.source.read_u8().map_err(map_io_err)
	}
	fn read_u16(&mut self) -> Result<u16, Error> {
		self.source.read_u16::<BigEndian>().map_err(map_io_err)
	}
	fn read_u32(&mut self) -> Result<u32, Error> {
		self.source.read_u32::<BigEndian>().map_err(map_io_err)
	}
	fn read_u64(&mut self) -> Result<u64, Error> {
		self.source.read_u64::<BigEndian>().map_err(map_io_err)
	}
	fn read_i32(&mut self) -> Result<i32, Error> {
		self.source.read_i32::<BigEndian>().map_err(map_io_err)
	}
	fn read_i64(&mut self) -> Result<i64, Error> {
		self.source.read_i64::<BigEndian>().map_err(map_io_err)
	}
	fn read_bytes_len_prefix(&mut self) -> Result<Vec<u8>, Error> {
		let len = self.read_u64()?;
		self.read_fixed_bytes(len as usize)
	}
	fn read_fixed_bytes(&mut self, length: usize) -> Result<Vec<u8>, Error> {
		let mut buf = vec![0; length];
		self.source.read_exact(&mut buf).map_err(map_io_err)?;
		Ok(buf)
	}
	fn expect_u8(&mut self, val: u8) -> Result<u8, Error> {
		let b = self.read_u8()?;
		if b == val {
			Ok(b)
		} else {
			Err(Error::UnexpectedData {
				expected: vec![val],
				received: vec![b],
			})
		}
	}
}

/// Serializes a Writeable into any std::io::Write implementation, using the
/// local protocol version.
pub fn serialize<W: Writeable>(sink: &mut dyn Write, thing: &W) -> Result<(), Error> {
	serialize_default(sink, thing)
}

/// Serializes a Writeable using the local protocol version.
pub fn serialize_default<W: Writeable>(sink: &mut dyn Write, thing: &W) -> Result<(), Error> {
	let mut writer = BinWriter::new(sink, ProtocolVersion::local());
	thing.write(&mut writer)
}

/// Deserializes a Readable from any std::io::Read implementation.
pub fn deserialize<T: Readable>(
	source: &mut dyn Read,
	version: ProtocolVersion,
) -> Result<T, Error> {
	let mut reader = BinReader::new(source, version);
	T::read(&mut reader)
}

/// Deserializes a Readable using the local protocol version.
pub fn deserialize_default<T: Readable>(source: &mut dyn Read) -> Result<T, Error> {
	deserialize(source, ProtocolVersion::local())
}

/// Serializes a Writeable to a `Vec<u8>`, used when hashing or when a buffer
/// is handier than a stream.
pub fn ser_vec<W: Writeable>(thing: &W) -> Result<Vec<u8>, Error> {
	let mut vec = vec![];
	serialize_default(&mut vec, thing)?;
	Ok(vec)
}

/// Marker used by `Readable` impls that validate untrusted, network-supplied
/// data more strictly than data already known to come from our own store.
pub struct UntrustedWrapper<T>(pub T, PhantomData<T>);

impl<T> UntrustedWrapper<T> {
	/// Wraps a value as untrusted.
	pub fn new(inner: T) -> UntrustedWrapper<T> {
		UntrustedWrapper(inner, PhantomData)
	}

	/// Unwraps the inner, now implicitly-validated, value.
	pub fn into_inner(self) -> T {
		self.0
	}
}
