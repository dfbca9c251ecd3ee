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

//! Common test functions

extern crate grin_core as core;
extern crate grin_keychain as keychain;
extern crate grin_util as util;
extern crate rand;

use core::core::{Block, BlockHeader, KernelFeatures, Transaction};
use core::libtx::{
	build::{self, input, output},
	reward,
};
use core::pow::Difficulty;
use keychain::BlindingFactor;
use util::secp::key::SecretKey;
use util::static_secp_instance;

/// A fresh, randomly generated blinding factor, standing in for a key a
/// wallet would otherwise derive from its keychain.
pub fn random_blind() -> BlindingFactor {
	let secp_inst = static_secp_instance();
	let secp = secp_inst.lock();
	BlindingFactor::from_secret_key(SecretKey::new(&secp, &mut rand::thread_rng()))
}

// utility producing a transaction with 2 inputs and a single outputs
pub fn tx2i1o() -> Transaction {
	build::transaction(
		KernelFeatures::Plain { fee: 2 },
		vec![
			input(10, random_blind()),
			input(11, random_blind()),
			output(19, random_blind()),
		],
	)
	.unwrap()
}

// utility producing a transaction with a single input and output
pub fn tx1i1o() -> Transaction {
	build::transaction(
		KernelFeatures::Plain { fee: 2 },
		vec![input(5, random_blind()), output(3, random_blind())],
	)
	.unwrap()
}

// utility producing a transaction with a single input
// and two outputs (one change output)
// Note: this tx has an "offset" kernel
pub fn tx1i2o() -> Transaction {
	build::transaction(
		KernelFeatures::Plain { fee: 2 },
		vec![
			input(6, random_blind()),
			output(3, random_blind()),
			output(1, random_blind()),
		],
	)
	.unwrap()
}

// utility to create a block without worrying about the key or previous
// header
pub fn new_block(txs: &[Transaction], previous_header: &BlockHeader) -> Block {
	let fees = txs.iter().map(|tx| tx.fee()).sum();
	let reward_output = reward::output(random_blind(), fees).unwrap();
	Block::new(
		previous_header,
		txs,
		Difficulty::min(),
		reward_output,
	)
	.unwrap()
}

// utility producing a transaction that spends an output with the provided
// value and blinding factors
pub fn txspend1i1o(v: u64, input_blind: BlindingFactor, output_blind: BlindingFactor) -> Transaction {
	build::transaction(
		KernelFeatures::Plain { fee: 2 },
		vec![input(v, input_blind), output(3, output_blind)],
	)
	.unwrap()
}
