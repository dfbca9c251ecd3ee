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

//! Utility functions to build Grin transactions. Handles the blinding of
//! inputs and outputs, maintaining the sum of blinding factors, producing
//! the kernel excess signature, etc.
//!
//! Each building function is a combinator that takes a
//! (Transaction, TxKernel, BlindSum) triple and returns another, given
//! some raw blinding factor to fold in. Combinators can then be chained
//! and executed using the `transaction` function.
//!
//! Example:
//! build::transaction(
//!   KernelFeatures::Plain { fee: 2 },
//!   vec![input(10, blind1), input(11, blind2), output(20, blind3)],
//! )

use keychain::{BlindSum, BlindingFactor};
use util::secp::key::SecretKey;
use util::{secp, static_secp_instance};

use crate::core::{Input, KernelFeatures, Output, OutputFeatures, Transaction, TxKernel};
use crate::libtx::Error;

/// Function type returned by the transaction combinators. Transforms a
/// (Transaction, TxKernel, BlindSum) triple into another, given the result
/// of the previous combinator in the chain.
pub type Append = dyn Fn(
	Result<(Transaction, TxKernel, BlindSum), Error>,
) -> Result<(Transaction, TxKernel, BlindSum), Error>;

fn build_input(value: u64, features: OutputFeatures, blind: BlindingFactor) -> Box<Append> {
	Box::new(
		move |acc: Result<(Transaction, TxKernel, BlindSum), Error>| {
			let (tx, kern, sum) = acc?;
			let secp_inst = static_secp_instance();
			let secp = secp_inst.lock();
			let commit = secp.commit(value, blind.secret_key(&secp)?)?;
			let _ = features;
			Ok((
				tx.with_input(Input::new(commit)),
				kern,
				sum.sub_blinding_factor(blind),
			))
		},
	)
}

/// Adds an input spending a plain output with the given value and blinding
/// factor to the transaction being built.
pub fn input(value: u64, blind: BlindingFactor) -> Box<Append> {
	build_input(value, OutputFeatures::Plain, blind)
}

/// Adds an input spending a coinbase output with the given value and
/// blinding factor to the transaction being built.
pub fn coinbase_input(value: u64, blind: BlindingFactor) -> Box<Append> {
	build_input(value, OutputFeatures::Coinbase, blind)
}

/// Adds an output with the provided value and blinding factor to the
/// transaction being built.
pub fn output(value: u64, blind: BlindingFactor) -> Box<Append> {
	Box::new(
		move |acc: Result<(Transaction, TxKernel, BlindSum), Error>| {
			let (tx, kern, sum) = acc?;
			let secp_inst = static_secp_instance();
			let secp = secp_inst.lock();
			let skey = blind.secret_key(&secp)?;
			let commit = secp.commit(value, skey)?;
			let nonce = SecretKey::new(&secp, &mut rand::thread_rng());
			let rproof = secp.bullet_proof(value, skey, nonce, nonce, None, None);
			Ok((
				tx.with_output(Output {
					features: OutputFeatures::Plain,
					commit,
					proof: rproof,
				}),
				kern,
				sum.add_blinding_factor(blind),
			))
		},
	)
}

/// Sets the fee on the kernel being built.
pub fn with_fee(fee: u64) -> Box<Append> {
	Box::new(move |acc| acc.map(|(tx, kern, sum)| (tx, kern.with_fee(fee), sum)))
}

/// Sets the lock height on the kernel being built.
pub fn with_lock_height(lock_height: u64) -> Box<Append> {
	Box::new(move |acc| acc.map(|(tx, kern, sum)| (tx, kern.with_lock_height(lock_height), sum)))
}

/// Adds a known excess value on the transaction being built. Usually used
/// in combination with `initial_tx` when a new transaction is built by
/// adding to a pre-existing one.
pub fn with_excess(excess: BlindingFactor) -> Box<Append> {
	Box::new(move |acc| acc.map(|(tx, kern, sum)| (tx, kern, sum.add_blinding_factor(excess))))
}

/// Sets an initial transaction to add to when building a new transaction.
/// We currently only support building a tx with a single kernel with
/// `build::transaction()`.
pub fn initial_tx(mut tx: Transaction) -> Box<Append> {
	assert_eq!(tx.kernels().len(), 1);
	let kern = tx.body.kernels.remove(0);
	Box::new(move |acc| acc.map(|(_, _, sum)| (tx.clone(), kern.clone(), sum)))
}

/// Builds a partial transaction and returns the final blinding factor
/// (the sum of all inputs and outputs), without splitting it into a kernel
/// excess and a published offset or signing the kernel.
pub fn partial_transaction(
	features: KernelFeatures,
	elems: Vec<Box<Append>>,
) -> Result<(Transaction, BlindingFactor), Error> {
	let (tx, kern, sum) = elems.into_iter().fold(
		Ok((
			Transaction::empty(),
			TxKernel {
				features,
				..TxKernel::empty()
			},
			BlindSum::new(),
		)),
		|acc, elem| elem(acc),
	)?;
	let blind_sum = sum.sum()?;
	Ok((tx.with_kernel(kern), blind_sum))
}

/// Builds a complete transaction: folds in every combinator, splits the
/// resulting blinding sum between the kernel excess and the published
/// offset, and signs the kernel.
pub fn transaction(
	features: KernelFeatures,
	elems: Vec<Box<Append>>,
) -> Result<Transaction, Error> {
	let (tx, kern, sum) = elems.into_iter().fold(
		Ok((
			Transaction::empty(),
			TxKernel {
				features,
				..TxKernel::empty()
			},
			BlindSum::new(),
		)),
		|acc, elem| elem(acc),
	)?;
	let blind_sum = sum.sum()?;

	let secp_inst = static_secp_instance();
	let secp = secp_inst.lock();

	// Split the blinding sum: k1 becomes the kernel excess, k2 the published
	// offset for the transaction.
	let k2 = BlindingFactor::from_secret_key(SecretKey::new(&secp, &mut rand::thread_rng()));
	let k1 = blind_sum.split(&k2)?;

	let mut kern = kern;
	let skey = k1.secret_key(&secp)?;
	kern.excess = secp.commit(0, skey)?;
	let msg = kern.msg_to_sign()?;
	kern.excess_sig = secp.sign(&msg, &skey)?;

	let mut tx = tx.with_kernel(kern);
	tx.offset = k2;
	Ok(tx)
}
