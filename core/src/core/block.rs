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

//! Blocks and block headers.
//!
//! A block is a header plus a transaction body: the aggregate, cut-through
//! body of every transaction the block includes, plus the coinbase reward
//! output and kernel. The header alone is enough to verify proof of work
//! and chain a block to its ancestor; the body is needed to verify that the
//! block's contents actually balance.

use chrono::naive::{NaiveDate, NaiveDateTime};
use chrono::{DateTime, Utc};

use keychain::{self, BlindSum, BlindingFactor};
use util::{secp, static_secp_instance};

use crate::consensus::{self, reward};
use crate::core::committed::{self, Committed};
use crate::core::hash::{DefaultHashable, Hash, Hashed, ZERO_HASH};
use crate::core::transaction::{
	aggregate, cut_through, Error as TxError, Input, KernelFeatures, Output, OutputFeatures,
	Transaction, TransactionBody, TxKernel,
};
use crate::global;
use crate::pow::{Difficulty, ProofOfWork};
use crate::ser::{self, PMMRIndexHashable, Readable, Reader, Writeable, Writer};

/// Errors thrown by Block validation.
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum Error {
	/// The sum of output minus input commitments does not match the sum of
	/// kernel excesses.
	#[fail(display = "kernel sum mismatch")]
	KernelSumMismatch,
	/// Underlying tx validation error.
	#[fail(display = "transaction error: {:?}", _0)]
	Transaction(TxError),
	/// Underlying secp error.
	#[fail(display = "secp error: {:?}", _0)]
	Secp(secp::Error),
	/// Underlying keychain error.
	#[fail(display = "keychain error: {:?}", _0)]
	Keychain(keychain::Error),
	/// Underlying serialization error.
	#[fail(display = "serialization error: {:?}", _0)]
	Serialization(ser::Error),
	/// Coinbase output(s) or kernel(s) are missing or malformed.
	#[fail(display = "invalid coinbase")]
	CoinbaseSumMismatch,
	/// Block version not valid for this height.
	#[fail(display = "invalid block version")]
	InvalidHeaderVersion,
}

impl From<TxError> for Error {
	fn from(e: TxError) -> Error {
		Error::Transaction(e)
	}
}

impl From<ser::Error> for Error {
	fn from(e: ser::Error) -> Error {
		Error::Serialization(e)
	}
}

impl From<secp::Error> for Error {
	fn from(e: secp::Error) -> Error {
		Error::Secp(e)
	}
}

impl From<keychain::Error> for Error {
	fn from(e: keychain::Error) -> Error {
		Error::Keychain(e)
	}
}

impl From<committed::Error> for Error {
	fn from(e: committed::Error) -> Error {
		match e {
			committed::Error::Keychain(e) => Error::Keychain(e),
			committed::Error::Secp(e) => Error::Secp(e),
			committed::Error::KernelSumMismatch => Error::KernelSumMismatch,
		}
	}
}

/// Block header, carrying everything needed to verify proof of work and
/// chain this block to its ancestor without touching the body at all.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockHeader {
	/// Version of the header, changing with every hard fork.
	pub version: u16,
	/// Height of this block since genesis (height 0).
	pub height: u64,
	/// Hash of the block previous to this in the chain.
	pub prev_hash: Hash,
	/// Root hash of the header MMR as of the previous header.
	pub prev_root: Hash,
	/// Timestamp at which the block was built.
	pub timestamp: DateTime<Utc>,
	/// Merklish root of all the commitments in the output MMR.
	pub output_root: Hash,
	/// Merklish root of all the range proofs in the range proof MMR.
	pub range_proof_root: Hash,
	/// Merklish root of all the kernels in the kernel MMR.
	pub kernel_root: Hash,
	/// Total accumulated sum of kernel offsets since genesis.
	pub total_kernel_offset: BlindingFactor,
	/// Total size of the output MMR after applying this block.
	pub output_mmr_size: u64,
	/// Total size of the kernel MMR after applying this block.
	pub kernel_mmr_size: u64,
	/// Proof of work and related.
	pub pow: ProofOfWork,
}

impl DefaultHashable for BlockHeader {}

/// Default header, a genesis-like header with a zero timestamp so it never
/// accidentally looks like a real, datable block.
impl Default for BlockHeader {
	fn default() -> BlockHeader {
		let epoch = NaiveDateTime::new(
			NaiveDate::from_ymd(1970, 1, 1),
			chrono::NaiveTime::from_hms(0, 0, 0),
		);
		BlockHeader {
			version: 1,
			height: 0,
			timestamp: DateTime::from_utc(epoch, Utc),
			prev_hash: ZERO_HASH,
			prev_root: ZERO_HASH,
			output_root: ZERO_HASH,
			range_proof_root: ZERO_HASH,
			kernel_root: ZERO_HASH,
			total_kernel_offset: BlindingFactor::zero(),
			output_mmr_size: 0,
			kernel_mmr_size: 0,
			pow: ProofOfWork::default(),
		}
	}
}

impl Writeable for BlockHeader {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.write_pre_pow(writer)?;
		self.pow.write(self.version, writer)?;
		Ok(())
	}
}

impl Readable for BlockHeader {
	fn read<R: Reader>(reader: &mut R) -> Result<BlockHeader, ser::Error> {
		let version = reader.read_u16()?;
		let height = reader.read_u64()?;
		let timestamp = reader.read_i64()?;
		let prev_hash = Hash::read(reader)?;
		let prev_root = Hash::read(reader)?;
		let output_root = Hash::read(reader)?;
		let range_proof_root = Hash::read(reader)?;
		let kernel_root = Hash::read(reader)?;
		let total_kernel_offset = BlindingFactor::read(reader)?;
		let output_mmr_size = reader.read_u64()?;
		let kernel_mmr_size = reader.read_u64()?;
		let pow = ProofOfWork::read(version, reader)?;

		if !consensus::valid_header_version(height, version) {
			return Err(ser::Error::CorruptedData);
		}

		Ok(BlockHeader {
			version,
			height,
			timestamp: DateTime::from_utc(NaiveDateTime::from_timestamp(timestamp, 0), Utc),
			prev_hash,
			prev_root,
			output_root,
			range_proof_root,
			kernel_root,
			total_kernel_offset,
			output_mmr_size,
			kernel_mmr_size,
			pow,
		})
	}
}

impl BlockHeader {
	/// Writes everything but the PoW itself, which full headers and
	/// headers-being-mined serialize differently.
	fn write_pre_pow<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		ser_multiwrite!(
			writer,
			[write_u16, self.version],
			[write_u64, self.height],
			[write_i64, self.timestamp.timestamp()]
		);
		self.prev_hash.write(writer)?;
		self.prev_root.write(writer)?;
		self.output_root.write(writer)?;
		self.range_proof_root.write(writer)?;
		self.kernel_root.write(writer)?;
		self.total_kernel_offset.write(writer)?;
		writer.write_u64(self.output_mmr_size)?;
		writer.write_u64(self.kernel_mmr_size)?;
		Ok(())
	}

	/// The hash of this header, used throughout the protocol to identify a
	/// block.
	pub fn hash(&self) -> Hash {
		let mut hasher = crate::core::hash::HashWriter::default();
		self.write(&mut hasher).expect("failed to hash a header");
		hasher.into_hash()
	}

	/// Total difficulty accumulated by all headers since genesis.
	pub fn total_difficulty(&self) -> Difficulty {
		self.pow.total_difficulty
	}

	/// Is this the genesis header (height 0)?
	pub fn is_genesis(&self) -> bool {
		self.height == 0 && self.prev_hash == ZERO_HASH
	}
}

impl ser::PMMRable for BlockHeader {
	type E = BlockHeader;

	fn as_elmt(&self) -> BlockHeader {
		self.clone()
	}
}

impl PMMRIndexHashable for BlockHeader {
	fn hash_with_index(&self, index: u64) -> Hash {
		(index, self.hash()).hash()
	}
}

/// A block header as read directly off an untrusted channel (the p2p wire,
/// typically), applying the lightweight sanity checks a header must pass
/// before it's worth holding onto at all.
pub struct UntrustedBlockHeader(BlockHeader);

impl From<UntrustedBlockHeader> for BlockHeader {
	fn from(ubh: UntrustedBlockHeader) -> Self {
		ubh.0
	}
}

impl Readable for UntrustedBlockHeader {
	fn read<R: Reader>(reader: &mut R) -> Result<UntrustedBlockHeader, ser::Error> {
		let header = BlockHeader::read(reader)?;

		let now = Utc::now().timestamp();
		if header.timestamp.timestamp() > now + global::max_block_time_offset() {
			return Err(ser::Error::CorruptedData);
		}

		if header.pow.proof.edge_bits() < global::min_edge_bits() {
			return Err(ser::Error::CorruptedData);
		}

		Ok(UntrustedBlockHeader(header))
	}
}

/// A block: a header plus the aggregate, cut-through body of every
/// transaction it includes alongside the coinbase reward.
#[derive(Debug, Clone)]
pub struct Block {
	/// The header carrying the commitments to the rest of the data and the
	/// proof of work.
	pub header: BlockHeader,
	/// The aggregate, cut-through transaction body.
	pub body: TransactionBody,
}

impl DefaultHashable for Block {}

impl Writeable for Block {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.header.write(writer)?;

		if writer.serialization_mode() != ser::SerializationMode::Hash {
			self.body.write(writer)?;
		}
		Ok(())
	}
}

impl Readable for Block {
	fn read<R: Reader>(reader: &mut R) -> Result<Block, ser::Error> {
		let header = BlockHeader::read(reader)?;
		let body = TransactionBody::read(reader)?;

		let block = Block { header, body };
		block.validate_read().map_err(|_| ser::Error::CorruptedData)?;

		Ok(block)
	}
}

impl Committed for Block {
	fn inputs_committed(&self) -> Vec<secp::pedersen::Commitment> {
		self.body.inputs_committed()
	}

	fn outputs_committed(&self) -> Vec<secp::pedersen::Commitment> {
		self.body.outputs_committed()
	}

	fn kernels_committed(&self) -> Vec<secp::pedersen::Commitment> {
		self.body.kernels_committed()
	}
}

impl Block {
	/// Builds a new empty block carrying the given header and no body, a
	/// scaffold to grow via `from_reward`.
	pub fn with_header(header: BlockHeader) -> Block {
		Block {
			header,
			body: TransactionBody::empty(),
		}
	}

	/// Builds a new block from the previous header, a set of transactions
	/// to include, a target difficulty, and the coinbase reward to append.
	/// Aggregates the transactions (applying cut-through) before appending
	/// the reward output and kernel.
	pub fn new(
		prev: &BlockHeader,
		txs: &[Transaction],
		difficulty: Difficulty,
		reward_output: (Output, TxKernel),
	) -> Result<Block, Error> {
		let mut block = Block::from_reward(prev, txs, reward_output.0, reward_output.1)?;
		block.header.pow.total_difficulty = prev.total_difficulty() + difficulty;
		Ok(block)
	}

	/// Builds a new block ready to mine from the given transactions and
	/// reward. The MMR roots and proof of work are left for the caller to
	/// fill in once the block has been applied to a txhashset.
	pub fn from_reward(
		prev: &BlockHeader,
		txs: &[Transaction],
		reward_out: Output,
		reward_kern: TxKernel,
	) -> Result<Block, Error> {
		let agg_tx = aggregate(txs)?;
		let mut inputs = agg_tx.body.inputs;
		let mut outputs = agg_tx.body.outputs;
		let mut kernels = agg_tx.body.kernels;

		outputs.push(reward_out);
		kernels.push(reward_kern);

		cut_through(&mut inputs, &mut outputs)?;

		inputs.sort_unstable();
		outputs.sort_unstable();
		kernels.sort_unstable();

		let total_kernel_offset = {
			let mut sum = BlindSum::new();
			sum = sum.add_blinding_factor(prev.total_kernel_offset.clone());
			sum = sum.add_blinding_factor(agg_tx.offset);
			sum.sum()?
		};

		let height = prev.height + 1;
		let version = consensus::header_version(height).map_err(|_| Error::InvalidHeaderVersion)?;

		let header = BlockHeader {
			version,
			height,
			timestamp: Utc::now(),
			prev_hash: prev.hash(),
			total_kernel_offset,
			..Default::default()
		};

		Ok(Block {
			header,
			body: TransactionBody {
				inputs,
				outputs,
				kernels,
			},
		})
	}

	/// This block's hash, computed over the header alone.
	pub fn hash(&self) -> Hash {
		self.header.hash()
	}

	/// This block's inputs.
	pub fn inputs(&self) -> &[Input] {
		&self.body.inputs
	}

	/// This block's outputs.
	pub fn outputs(&self) -> &[Output] {
		&self.body.outputs
	}

	/// This block's kernels.
	pub fn kernels(&self) -> &[TxKernel] {
		&self.body.kernels
	}

	/// Total fee collected by this block's kernels.
	pub fn total_fees(&self) -> u64 {
		self.body.fee()
	}

	/// Removes any input/output pair referring to the same commitment.
	pub fn cut_through(&mut self) -> Result<(), Error> {
		cut_through(&mut self.body.inputs, &mut self.body.outputs)?;
		Ok(())
	}

	/// The coinbase output(s); there should be exactly one in a valid block.
	pub fn coinbase_outputs(&self) -> Vec<Output> {
		self.body
			.outputs
			.iter()
			.filter(|x| x.is_coinbase())
			.cloned()
			.collect()
	}

	/// The coinbase kernel(s); there should be exactly one in a valid block.
	pub fn coinbase_kernels(&self) -> Vec<TxKernel> {
		self.body
			.kernels
			.iter()
			.filter(|x| x.is_coinbase())
			.cloned()
			.collect()
	}

	/// The lighter-weight checks appropriate for a block just deserialized
	/// off an untrusted channel: sort order, weight limit, and the single
	/// coinbase output/kernel invariant. Signature and rangeproof
	/// verification are left to `validate`, run once the block is actually
	/// being accepted.
	fn validate_read(&self) -> Result<(), Error> {
		self.body.validate_read()?;
		self.verify_coinbase()?;
		Ok(())
	}

	/// Validates everything about a block that can be checked without
	/// reference to the wider chain: commitment sums, kernel signatures,
	/// output rangeproofs, and the coinbase output/kernel invariant. Does
	/// *not* check that this is a valid extension of some previous block or
	/// that the header's MMR roots match the resulting UTXO/kernel sets:
	/// both require the txhashset and are handled at the chain level.
	pub fn validate(&self, prev_kernel_offset: &BlindingFactor) -> Result<(), Error> {
		self.body.validate(true)?;
		self.verify_coinbase()?;

		let total_kernel_offset = {
			let mut sum = BlindSum::new();
			sum = sum.add_blinding_factor(self.header.total_kernel_offset.clone());
			sum = sum.sub_blinding_factor(prev_kernel_offset.clone());
			sum.sum()?
		};

		self.verify_kernel_sums(self.total_fees() as i64, total_kernel_offset, None, None)?;
		Ok(())
	}

	/// Checks that exactly one coinbase output and one coinbase kernel are
	/// present, and that the coinbase output's value matches the reward for
	/// the fees collected by the block's other kernels.
	fn verify_coinbase(&self) -> Result<(), Error> {
		let cb_outs = self.coinbase_outputs();
		let cb_kerns = self.coinbase_kernels();

		if cb_outs.len() != 1 || cb_kerns.len() != 1 {
			return Err(Error::CoinbaseSumMismatch);
		}
		if !matches!(cb_kerns[0].features, KernelFeatures::Coinbase) {
			return Err(Error::CoinbaseSumMismatch);
		}
		if cb_outs[0].features != OutputFeatures::Coinbase {
			return Err(Error::CoinbaseSumMismatch);
		}

		let fees = self
			.body
			.kernels
			.iter()
			.filter(|k| !k.is_coinbase())
			.fold(0u64, |acc, k| acc.saturating_add(k.fee()));

		let secp_inst = static_secp_instance();
		let secp = secp_inst.lock();
		let expected_commit = secp.commit_value(reward(fees))?;
		if expected_commit != cb_outs[0].commit {
			return Err(Error::CoinbaseSumMismatch);
		}

		Ok(())
	}
}
