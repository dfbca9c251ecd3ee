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

//! The proof of work needs to strike a balance between fast header
//! verification to avoid DoS attacks and difficulty for block verifiers to
//! build new blocks. In addition, mining new blocks should be as hard on
//! high-end custom hardware (ASICs) as on commodity hardware. For this
//! reason we use the Cuckoo Cycle family of graph algorithms, which comes
//! in a primary (Cuckatoo) and a secondary, more ASIC-resistant (Cuckaroo)
//! flavor. The secondary flavor itself is tweaked at every hard fork
//! (Cuckarood, then Cuckaroom) to keep ahead of any ASIC development.

pub mod common;
mod cuckaroom;
mod cuckarood;
mod cuckatoo;
mod error;
mod siphash;
mod types;

pub use self::error::Error;
pub use self::types::{Difficulty, PoWContext, Proof, ProofOfWork};

use crate::consensus;
use crate::global;

/// Maximum number of solutions a miner will return in one pass. Verification
/// only ever looks at the first.
pub const MAX_SOLS: u32 = 10;

/// Instantiates a `PoWContext` for the primary (Cuckatoo) algorithm.
pub fn new_cuckatoo_ctx(edge_bits: u8, proof_size: usize) -> Result<Box<dyn PoWContext>, Error> {
	cuckatoo::new_cuckatoo_ctx(edge_bits, proof_size, MAX_SOLS)
}

/// Picks the `PoWContext` appropriate for the given block height and
/// edge_bits: the primary Cuckatoo algorithm above the minimum edge_bits
/// floor, or whichever generation of the secondary Cuckaroo variant is
/// active at that height otherwise.
pub fn create_pow_context(height: u64, edge_bits: u8) -> Result<Box<dyn PoWContext>, Error> {
	let proof_size = global::proofsize();
	if edge_bits != consensus::SECOND_POW_EDGE_BITS {
		new_cuckatoo_ctx(edge_bits, proof_size)
	} else if height < consensus::hard_fork_2_height() {
		cuckarood::new_cuckarood_ctx(edge_bits, proof_size)
	} else {
		cuckaroom::new_cuckaroom_ctx(edge_bits, proof_size)
	}
}

/// Verifies the proof of work carried by a header-like value: the edge_bits
/// must be at least the chain's minimum (unless this is a secondary-PoW
/// proof, which has its own fixed edge_bits), and the cycle itself must
/// check out under the algorithm selected for `height`.
pub fn verify_size(height: u64, proof: &Proof) -> Result<(), Error> {
	if proof.edge_bits != global::min_edge_bits() && proof.edge_bits != consensus::SECOND_POW_EDGE_BITS
	{
		return Err(Error::Verification("wrong cycle size".to_owned()));
	}
	create_pow_context(height, proof.edge_bits)?.verify(proof)
}
