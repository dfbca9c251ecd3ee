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

//! Builds the blinded coinbase output and kernel paying out the block
//! reward plus collected fees.

use keychain::BlindingFactor;
use util::secp::key::SecretKey;
use util::static_secp_instance;

use crate::consensus::reward;
use crate::core::{KernelFeatures, Output, OutputFeatures, TxKernel};
use crate::libtx::Error;

/// Builds the coinbase output and kernel for a block paying the given
/// blinding factor the subsidy plus `fees`.
pub fn output(blind: BlindingFactor, fees: u64) -> Result<(Output, TxKernel), Error> {
	let value = reward(fees);

	let secp_inst = static_secp_instance();
	let secp = secp_inst.lock();
	let skey = blind.secret_key(&secp)?;
	let commit = secp.commit(value, skey)?;

	trace!("Block reward - Pedersen commit is: {:?}", commit);

	let nonce = SecretKey::new(&secp, &mut rand::thread_rng());
	let rproof = secp.bullet_proof(value, skey, nonce, nonce, None, None);

	let output = Output {
		features: OutputFeatures::Coinbase,
		commit,
		proof: rproof,
	};

	// The coinbase kernel is a commitment to zero: reward + fees (the
	// overage) must equal the output's value for the block to balance.
	let over_commit = secp.commit_value(value)?;
	let excess = secp.commit_sum(vec![commit], vec![over_commit])?;

	let mut kern = TxKernel {
		features: KernelFeatures::Coinbase,
		..TxKernel::empty()
	};
	let msg = kern.msg_to_sign()?;
	kern.excess = excess;
	kern.excess_sig = secp.sign(&msg, &skey)?;

	Ok((output, kern))
}
