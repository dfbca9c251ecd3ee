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

//! Transactions: sets of inputs referencing unspent commitments, outputs
//! creating new ones, and kernels proving the excess blinding value sums to
//! zero after fees and the transaction offset are taken into account.

use std::cmp::{max, min, Ordering};

use keychain::{self, BlindingFactor};
use util::secp;
use util::secp::pedersen::{Commitment, RangeProof};
use util::secp::{Message, Signature};
use util::static_secp_instance;

use crate::core::committed;
use crate::core::committed::Committed;
use crate::core::hash::{DefaultHashable, Hashed};
use crate::ser::{
	self, read_multi, PMMRable, Readable, Reader, VerifySortedAndUnique, Writeable, Writer,
};

/// Errors arising when validating or aggregating transactions.
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum Error {
	/// Underlying Secp256k1 error (signature or commitment failure).
	#[fail(display = "secp error: {:?}", _0)]
	Secp(secp::Error),
	/// Underlying keychain (blinding factor) error.
	#[fail(display = "keychain error: {:?}", _0)]
	Keychain(keychain::Error),
	/// Rangeproof failed to verify.
	#[fail(display = "rangeproof error")]
	RangeProof,
	/// Kernel excess sum does not match the tx's inputs/outputs/fee.
	#[fail(display = "kernel sum mismatch")]
	KernelSumMismatch,
	/// Kernel features don't match the fields actually present.
	#[fail(display = "invalid kernel features")]
	InvalidKernelFeatures,
	/// Inputs/outputs/kernels not sorted or containing duplicates.
	#[fail(display = "sort order")]
	SortError,
	/// Serialization error propagated from the ser module.
	#[fail(display = "serialization error: {:?}", _0)]
	Serialization(ser::Error),
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

/// Publicly distinguishes between a plain, time-locked and coinbase-creating
/// kernel. Feeds directly into a kernel's hash, so the wire value matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelFeatures {
	/// Plain kernel, carries a fee and nothing else.
	Plain {
		/// Fee paid by this kernel's transaction, in nanogrin.
		fee: u64,
	},
	/// Coinbase kernel, carries no fee.
	Coinbase,
	/// Kernel that can't be included in a block until a given height.
	HeightLocked {
		/// Fee paid by this kernel's transaction, in nanogrin.
		fee: u64,
		/// Minimum block height this kernel can appear in.
		lock_height: u64,
	},
}

impl KernelFeatures {
	const PLAIN_U8: u8 = 0;
	const COINBASE_U8: u8 = 1;
	const HEIGHT_LOCKED_U8: u8 = 2;

	/// The byte tag identifying these features on the wire.
	pub fn as_flag(&self) -> u8 {
		match self {
			KernelFeatures::Plain { .. } => KernelFeatures::PLAIN_U8,
			KernelFeatures::Coinbase => KernelFeatures::COINBASE_U8,
			KernelFeatures::HeightLocked { .. } => KernelFeatures::HEIGHT_LOCKED_U8,
		}
	}

	/// Fee carried by this kernel, or 0 for a coinbase kernel.
	pub fn fee(&self) -> u64 {
		match self {
			KernelFeatures::Plain { fee } => *fee,
			KernelFeatures::Coinbase => 0,
			KernelFeatures::HeightLocked { fee, .. } => *fee,
		}
	}

	/// Minimum height this kernel may be included at, 0 unless height-locked.
	pub fn lock_height(&self) -> u64 {
		match self {
			KernelFeatures::HeightLocked { lock_height, .. } => *lock_height,
			_ => 0,
		}
	}
}

impl Writeable for KernelFeatures {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_u8(self.as_flag())?;
		match self {
			KernelFeatures::Plain { fee } => {
				writer.write_u64(*fee)?;
			}
			KernelFeatures::Coinbase => {}
			KernelFeatures::HeightLocked { fee, lock_height } => {
				writer.write_u64(*fee)?;
				writer.write_u64(*lock_height)?;
			}
		}
		Ok(())
	}
}

impl Readable for KernelFeatures {
	fn read<R: Reader>(reader: &mut R) -> Result<KernelFeatures, ser::Error> {
		let features = match reader.read_u8()? {
			KernelFeatures::PLAIN_U8 => KernelFeatures::Plain {
				fee: reader.read_u64()?,
			},
			KernelFeatures::COINBASE_U8 => KernelFeatures::Coinbase,
			KernelFeatures::HEIGHT_LOCKED_U8 => KernelFeatures::HeightLocked {
				fee: reader.read_u64()?,
				lock_height: reader.read_u64()?,
			},
			_ => return Err(ser::Error::CorruptedData),
		};
		Ok(features)
	}
}

/// A proof that a transaction sums to zero. Signs the fee and lock_height
/// with the total excess blinding value so the fee can't be tampered with,
/// and the excess can be publicly summed across a block without revealing
/// any individual transaction's structure (cut-through).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TxKernel {
	/// Features of this kernel, also carrying the fee and lock_height.
	pub features: KernelFeatures,
	/// Remainder of the sum of all transaction commitments, after cut-through.
	pub excess: Commitment,
	/// The signature proving the excess is a valid public key, signing the
	/// features, fee and lock_height.
	pub excess_sig: Signature,
}

impl DefaultHashable for TxKernel {}

impl Ord for TxKernel {
	fn cmp(&self, other: &TxKernel) -> Ordering {
		self.hash().cmp(&other.hash())
	}
}

impl PartialOrd for TxKernel {
	fn partial_cmp(&self, other: &TxKernel) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Writeable for TxKernel {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.features.write(writer)?;
		self.excess.write(writer)?;
		self.excess_sig.write(writer)?;
		Ok(())
	}
}

impl Readable for TxKernel {
	fn read<R: Reader>(reader: &mut R) -> Result<TxKernel, ser::Error> {
		Ok(TxKernel {
			features: KernelFeatures::read(reader)?,
			excess: Commitment::read(reader)?,
			excess_sig: Signature::read(reader)?,
		})
	}
}

impl PMMRable for TxKernel {
	type E = TxKernel;

	fn as_elmt(&self) -> TxKernel {
		*self
	}
}

impl PartialEq for TxKernel {
	fn eq(&self, other: &TxKernel) -> bool {
		self.features == other.features
			&& self.excess == other.excess
			&& self.excess_sig == other.excess_sig
	}
}
impl Eq for TxKernel {}

impl TxKernel {
	/// Is this a coinbase kernel?
	pub fn is_coinbase(&self) -> bool {
		matches!(self.features, KernelFeatures::Coinbase)
	}

	/// Fee carried by this kernel.
	pub fn fee(&self) -> u64 {
		self.features.fee()
	}

	/// The message signed as part of the kernel's excess signature, binding
	/// the features, fee and lock_height so none of them can be altered
	/// without invalidating the signature.
	pub fn msg_to_sign(&self) -> Result<Message, Error> {
		let mut bytes = [0u8; 32];
		bytes[0] = self.features.as_flag();
		bytes[8..16].copy_from_slice(&self.features.fee().to_be_bytes());
		bytes[24..32].copy_from_slice(&self.features.lock_height().to_be_bytes());
		Ok(Message::from_slice(&bytes)?)
	}

	/// Verifies the excess signature against the excess commitment as a
	/// public key, proving the excess is well-formed and that the fee and
	/// lock_height weren't tampered with.
	pub fn verify(&self) -> Result<(), Error> {
		let secp_inst = static_secp_instance();
		let secp = secp_inst.lock();
		let valid = self
			.excess_sig
			.verify_from_commit(&secp, &self.msg_to_sign()?, &self.excess)?;
		if !valid {
			return Err(Error::Secp(secp::Error::IncorrectSignature));
		}
		Ok(())
	}

	/// A zero-fee, no-lock-height plain kernel with a zero excess, used as a
	/// starting point before the excess and signature are filled in.
	pub fn empty() -> TxKernel {
		TxKernel {
			features: KernelFeatures::Plain { fee: 0 },
			excess: Commitment::from_vec(vec![0; 33]),
			excess_sig: Signature::from_raw_data(&[0; 64]).unwrap(),
		}
	}

	/// Builds a new tx kernel with the provided fee.
	pub fn with_fee(self, fee: u64) -> TxKernel {
		let features = match self.features {
			KernelFeatures::Plain { .. } => KernelFeatures::Plain { fee },
			KernelFeatures::HeightLocked { lock_height, .. } => {
				KernelFeatures::HeightLocked { fee, lock_height }
			}
			KernelFeatures::Coinbase => KernelFeatures::Coinbase,
		};
		TxKernel { features, ..self }
	}

	/// Builds a new tx kernel with the provided lock_height.
	pub fn with_lock_height(self, lock_height: u64) -> TxKernel {
		let features = match self.features {
			KernelFeatures::Plain { fee } | KernelFeatures::HeightLocked { fee, .. } => {
				if lock_height == 0 {
					KernelFeatures::Plain { fee }
				} else {
					KernelFeatures::HeightLocked { fee, lock_height }
				}
			}
			KernelFeatures::Coinbase => KernelFeatures::Coinbase,
		};
		TxKernel { features, ..self }
	}
}

/// Distinguishes a plain, freshly spendable output from a coinbase output,
/// which must mature for `consensus::coinbase_maturity()` blocks before it
/// can be spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFeatures {
	/// Plain output.
	Plain = 0,
	/// Output from a coinbase transaction (mining reward or fees).
	Coinbase = 1,
}

impl Writeable for OutputFeatures {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_u8(*self as u8)
	}
}

impl Readable for OutputFeatures {
	fn read<R: Reader>(reader: &mut R) -> Result<OutputFeatures, ser::Error> {
		match reader.read_u8()? {
			0 => Ok(OutputFeatures::Plain),
			1 => Ok(OutputFeatures::Coinbase),
			_ => Err(ser::Error::CorruptedData),
		}
	}
}

/// An output, mixing a Pedersen commitment with a rangeproof showing the
/// committed value is non-negative, without revealing the value itself.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Output {
	/// Options for an output's structure or use.
	pub features: OutputFeatures,
	/// The homomorphic commitment representing the output's amount.
	pub commit: Commitment,
	/// A proof that the commitment is to a non-negative value.
	pub proof: RangeProof,
}

impl DefaultHashable for Output {}

impl PartialEq for Output {
	fn eq(&self, other: &Output) -> bool {
		self.hash() == other.hash()
	}
}
impl Eq for Output {}

impl Ord for Output {
	fn cmp(&self, other: &Output) -> Ordering {
		self.hash().cmp(&other.hash())
	}
}

impl PartialOrd for Output {
	fn partial_cmp(&self, other: &Output) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Writeable for Output {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.features.write(writer)?;
		self.commit.write(writer)?;
		// The rangeproof is excluded when hashing so an output's identity
		// (and hence its short id) stays stable even if the proof changes.
		if writer.serialization_mode() != ser::SerializationMode::Hash {
			writer.write_bytes(&self.proof)?;
		}
		Ok(())
	}
}

impl Readable for Output {
	fn read<R: Reader>(reader: &mut R) -> Result<Output, ser::Error> {
		Ok(Output {
			features: OutputFeatures::read(reader)?,
			commit: Commitment::read(reader)?,
			proof: RangeProof::read(reader)?,
		})
	}
}

impl Output {
	/// Is this a coinbase output?
	pub fn is_coinbase(&self) -> bool {
		self.features == OutputFeatures::Coinbase
	}

	/// Validates the range proof carried by this output against its
	/// commitment.
	pub fn verify_proof(&self) -> Result<(), Error> {
		let secp_inst = static_secp_instance();
		let secp = secp_inst.lock();
		secp.verify_range_proof(self.commit, self.proof)
			.map_err(|_| Error::RangeProof)?;
		Ok(())
	}

	/// Batch-validates a set of commitment/rangeproof pairs in a single call,
	/// far cheaper than verifying proofs one at a time.
	pub fn batch_verify_proofs(
		commits: &[Commitment],
		proofs: &[RangeProof],
	) -> Result<(), secp::Error> {
		let secp_inst = static_secp_instance();
		let secp = secp_inst.lock();
		secp.verify_bullet_proof_multi(commits.to_vec(), proofs.to_vec(), None)?;
		Ok(())
	}

	/// The lightweight identifier for this output, dropping the rangeproof,
	/// used as the element persisted in the output MMR's backend.
	pub fn identifier(&self) -> OutputIdentifier {
		OutputIdentifier {
			features: self.features,
			commit: self.commit,
		}
	}
}

impl PMMRable for Output {
	type E = OutputIdentifier;

	fn as_elmt(&self) -> OutputIdentifier {
		self.identifier()
	}
}

/// The lightweight identity of an output: its features and commitment,
/// without the (much larger) rangeproof.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutputIdentifier {
	/// Output features.
	pub features: OutputFeatures,
	/// Output commitment.
	pub commit: Commitment,
}

impl DefaultHashable for OutputIdentifier {}

impl PartialEq for OutputIdentifier {
	fn eq(&self, other: &OutputIdentifier) -> bool {
		self.hash() == other.hash()
	}
}
impl Eq for OutputIdentifier {}

impl Ord for OutputIdentifier {
	fn cmp(&self, other: &OutputIdentifier) -> Ordering {
		self.hash().cmp(&other.hash())
	}
}

impl PartialOrd for OutputIdentifier {
	fn partial_cmp(&self, other: &OutputIdentifier) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl OutputIdentifier {
	/// Builds a new output identifier from its constituent parts.
	pub fn new(features: OutputFeatures, commit: &Commitment) -> OutputIdentifier {
		OutputIdentifier {
			features,
			commit: *commit,
		}
	}

	/// Is this a coinbase output identifier?
	pub fn is_coinbase(&self) -> bool {
		self.features == OutputFeatures::Coinbase
	}
}

impl From<&Output> for OutputIdentifier {
	fn from(out: &Output) -> OutputIdentifier {
		out.identifier()
	}
}

impl Writeable for OutputIdentifier {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.features.write(writer)?;
		self.commit.write(writer)
	}
}

impl Readable for OutputIdentifier {
	fn read<R: Reader>(reader: &mut R) -> Result<OutputIdentifier, ser::Error> {
		Ok(OutputIdentifier {
			features: OutputFeatures::read(reader)?,
			commit: Commitment::read(reader)?,
		})
	}
}

/// An input spends an existing unspent output, referenced here purely by
/// the Pedersen commitment it created. Inputs carry no value or ownership
/// proof of their own; that was already proven when the output was made.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
	/// Commitment of the output being spent.
	pub commit: Commitment,
}

impl DefaultHashable for Input {}

impl Ord for Input {
	fn cmp(&self, other: &Input) -> Ordering {
		self.hash().cmp(&other.hash())
	}
}

impl PartialOrd for Input {
	fn partial_cmp(&self, other: &Input) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Writeable for Input {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.commit.write(writer)
	}
}

impl Readable for Input {
	fn read<R: Reader>(reader: &mut R) -> Result<Input, ser::Error> {
		Ok(Input {
			commit: Commitment::read(reader)?,
		})
	}
}

impl Input {
	/// Builds a new input referencing the given commitment.
	pub fn new(commit: Commitment) -> Input {
		Input { commit }
	}
}

/// The body of a transaction: the sets of inputs, outputs and kernels that
/// make it up. Sorted lexicographically on the wire so two semantically
/// equal transactions serialize identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionBody {
	/// List of inputs spent by the transaction.
	pub inputs: Vec<Input>,
	/// List of outputs the transaction creates.
	pub outputs: Vec<Output>,
	/// List of kernels the transaction includes.
	pub kernels: Vec<TxKernel>,
}

impl Writeable for TransactionBody {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_u64(self.inputs.len() as u64)?;
		writer.write_u64(self.outputs.len() as u64)?;
		writer.write_u64(self.kernels.len() as u64)?;
		self.inputs.write(writer)?;
		self.outputs.write(writer)?;
		self.kernels.write(writer)?;
		Ok(())
	}
}

impl Readable for TransactionBody {
	fn read<R: Reader>(reader: &mut R) -> Result<TransactionBody, ser::Error> {
		let (num_inputs, num_outputs, num_kernels) =
			ser_multiread!(reader, read_u64, read_u64, read_u64);

		let inputs = read_multi(reader, num_inputs)?;
		let outputs = read_multi(reader, num_outputs)?;
		let kernels = read_multi(reader, num_kernels)?;

		let body = TransactionBody {
			inputs,
			outputs,
			kernels,
		};
		body.validate_read()?;
		Ok(body)
	}
}

impl Default for TransactionBody {
	fn default() -> TransactionBody {
		TransactionBody::empty()
	}
}

impl TransactionBody {
	/// Creates a new empty transaction body.
	pub fn empty() -> TransactionBody {
		TransactionBody {
			inputs: vec![],
			outputs: vec![],
			kernels: vec![],
		}
	}

	/// Builds a new body with the provided input added, re-sorted.
	pub fn with_input(mut self, input: Input) -> TransactionBody {
		self.inputs.push(input);
		self.inputs.sort_unstable();
		self
	}

	/// Builds a new body with the provided output added, re-sorted.
	pub fn with_output(mut self, output: Output) -> TransactionBody {
		self.outputs.push(output);
		self.outputs.sort_unstable();
		self
	}

	/// Builds a new body with the provided kernel added, re-sorted.
	pub fn with_kernel(mut self, kernel: TxKernel) -> TransactionBody {
		self.kernels.push(kernel);
		self.kernels.sort_unstable();
		self
	}

	/// Total fee carried by all of this body's kernels.
	pub fn fee(&self) -> u64 {
		self.kernels
			.iter()
			.fold(0, |acc, k| acc.saturating_add(k.fee()))
	}

	/// Sums the weights of inputs, outputs and kernels, used to enforce the
	/// maximum block weight.
	pub fn weight(&self) -> usize {
		crate::consensus::body_weight(self.inputs.len(), self.outputs.len(), self.kernels.len())
	}

	fn verify_weight(&self, with_reward: bool) -> Result<(), Error> {
		let reserve = if with_reward { 0 } else { 1 };
		if !crate::consensus::body_weight_fits(
			self.inputs.len(),
			self.outputs.len() + reserve,
			self.kernels.len() + reserve,
		) {
			return Err(Error::InvalidKernelFeatures);
		}
		Ok(())
	}

	/// Sorts inputs, outputs and kernels lexicographically.
	pub fn sort(&mut self) {
		self.inputs.sort_unstable();
		self.outputs.sort_unstable();
		self.kernels.sort_unstable();
	}

	fn verify_sorted(&self) -> Result<(), Error> {
		self.inputs.verify_sorted_and_unique()?;
		self.outputs.verify_sorted_and_unique()?;
		self.kernels.verify_sorted_and_unique()?;
		Ok(())
	}

	/// The lighter-weight sanity checks a freshly deserialized body must
	/// satisfy before going any further.
	fn validate_read(&self) -> Result<(), Error> {
		self.verify_weight(false)?;
		self.verify_sorted()?;
		Ok(())
	}

	/// Validates all relevant parts of a transaction body: weight limits,
	/// sort order and uniqueness of inputs/outputs/kernels, every output's
	/// rangeproof, and every kernel's excess signature.
	pub fn validate(&self, with_reward: bool) -> Result<(), Error> {
		self.verify_weight(with_reward)?;
		self.verify_sorted()?;

		for out in &self.outputs {
			out.verify_proof()?;
		}
		for kernel in &self.kernels {
			kernel.verify()?;
		}
		Ok(())
	}
}

impl Committed for TransactionBody {
	fn inputs_committed(&self) -> Vec<Commitment> {
		self.inputs.iter().map(|x| x.commit).collect()
	}

	fn outputs_committed(&self) -> Vec<Commitment> {
		self.outputs.iter().map(|x| x.commit).collect()
	}

	fn kernels_committed(&self) -> Vec<Commitment> {
		self.kernels.iter().map(|x| x.excess).collect()
	}
}

/// A transaction: a `TransactionBody` plus the offset split out of the
/// aggregate blinding sum to protect the privacy of cut-through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
	/// The part of the overall excess blinding value published in the clear,
	/// rather than folded into a kernel's excess.
	pub offset: BlindingFactor,
	/// The inputs, outputs and kernels that make up this transaction.
	pub body: TransactionBody,
}

impl DefaultHashable for Transaction {}

impl Writeable for Transaction {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.offset.write(writer)?;
		self.body.write(writer)?;
		Ok(())
	}
}

impl Readable for Transaction {
	fn read<R: Reader>(reader: &mut R) -> Result<Transaction, ser::Error> {
		let offset = BlindingFactor::read(reader)?;
		let body = TransactionBody::read(reader)?;
		Ok(Transaction { offset, body })
	}
}

impl Committed for Transaction {
	fn inputs_committed(&self) -> Vec<Commitment> {
		self.body.inputs_committed()
	}

	fn outputs_committed(&self) -> Vec<Commitment> {
		self.body.outputs_committed()
	}

	fn kernels_committed(&self) -> Vec<Commitment> {
		self.body.kernels_committed()
	}
}

impl Default for Transaction {
	fn default() -> Transaction {
		Transaction::empty()
	}
}

impl Transaction {
	/// Creates a new empty transaction, with a zero offset.
	pub fn empty() -> Transaction {
		Transaction {
			offset: BlindingFactor::zero(),
			body: TransactionBody::empty(),
		}
	}

	/// Builds a new transaction with the provided offset.
	pub fn with_offset(self, offset: BlindingFactor) -> Transaction {
		Transaction { offset, ..self }
	}

	/// Builds a new transaction with the provided input added.
	pub fn with_input(self, input: Input) -> Transaction {
		Transaction {
			body: self.body.with_input(input),
			..self
		}
	}

	/// Builds a new transaction with the provided output added.
	pub fn with_output(self, output: Output) -> Transaction {
		Transaction {
			body: self.body.with_output(output),
			..self
		}
	}

	/// Builds a new transaction with the provided kernel added.
	pub fn with_kernel(self, kernel: TxKernel) -> Transaction {
		Transaction {
			body: self.body.with_kernel(kernel),
			..self
		}
	}

	/// Total fee for this transaction.
	pub fn fee(&self) -> u64 {
		self.body.fee()
	}

	/// This transaction's inputs.
	pub fn inputs(&self) -> &[Input] {
		&self.body.inputs
	}

	/// This transaction's outputs.
	pub fn outputs(&self) -> &[Output] {
		&self.body.outputs
	}

	/// This transaction's kernels.
	pub fn kernels(&self) -> &[TxKernel] {
		&self.body.kernels
	}

	/// Total weight of this transaction, for mempool and mining acceptance.
	pub fn weight(&self) -> usize {
		self.body.weight()
	}

	/// Validates a fully built transaction: the body itself, plus the
	/// zero-sum proof tying the kernel excesses (adjusted for the published
	/// offset) to the sum of output minus input commitments and the fee.
	pub fn validate(&self) -> Result<(), Error> {
		self.body.validate(false)?;
		self.verify_kernel_sums(self.fee() as i64, self.offset.clone(), None, None)?;
		Ok(())
	}
}

/// Aggregates a set of transactions into a single transaction, applying
/// cut-through: any output spent by one of the transactions and created by
/// another cancels out and is dropped from both sides.
pub fn aggregate(txs: &[Transaction]) -> Result<Transaction, Error> {
	if txs.is_empty() {
		return Ok(Transaction::empty());
	}
	if txs.len() == 1 {
		return Ok(txs[0].clone());
	}

	let mut inputs: Vec<Input> = vec![];
	let mut outputs: Vec<Output> = vec![];
	let mut kernels: Vec<TxKernel> = vec![];
	let mut offsets: Vec<BlindingFactor> = vec![];

	for tx in txs {
		inputs.extend_from_slice(&tx.body.inputs);
		outputs.extend_from_slice(&tx.body.outputs);
		kernels.extend_from_slice(&tx.body.kernels);
		offsets.push(tx.offset.clone());
	}

	cut_through(&mut inputs, &mut outputs)?;

	inputs.sort_unstable();
	outputs.sort_unstable();
	kernels.sort_unstable();

	let offset = {
		let secp_inst = static_secp_instance();
		let secp = secp_inst.lock();
		let keys = offsets
			.iter()
			.filter(|x| **x != BlindingFactor::zero())
			.filter_map(|x| x.secret_key(&secp).ok())
			.collect::<Vec<_>>();
		if keys.is_empty() {
			BlindingFactor::zero()
		} else {
			BlindingFactor::from_secret_key(secp.blind_sum(keys, vec![])?)
		}
	};

	Ok(Transaction {
		offset,
		body: TransactionBody {
			inputs,
			outputs,
			kernels,
		},
	})
}

/// Removes any input/output pair referring to the same commitment; both are
/// dropped from their respective vecs. Applied when aggregating
/// transactions so an output created and spent within the same aggregate
/// never ends up on-chain.
pub fn cut_through(inputs: &mut Vec<Input>, outputs: &mut Vec<Output>) -> Result<(), Error> {
	inputs.sort_unstable_by_key(|x| x.commit);
	outputs.sort_unstable_by_key(|x| x.commit);

	let mut i = 0;
	let mut o = 0;
	while i < inputs.len() && o < outputs.len() {
		match inputs[i].commit.cmp(&outputs[o].commit) {
			Ordering::Less => i += 1,
			Ordering::Greater => o += 1,
			Ordering::Equal => {
				inputs.remove(i);
				outputs.remove(o);
			}
		}
	}
	let _ = max(inputs.len(), min(inputs.len(), outputs.len()));
	Ok(())
}
