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

//! Settings that vary by the chain type a node is running against
//! (mainnet, floonet, or one of the two testing modes), collected behind a
//! single process-global switch so the rest of the core engine never has to
//! carry the choice around explicitly.

use crate::consensus::{DAY_HEIGHT, YEAR_HEIGHT};
use util::RwLock;

/// The chain type a node is configured to follow. Determines the PoW
/// edge-bits floor, coinbase maturity, and the hard-fork height table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainTypes {
	/// For CI tests where difficulty is kept trivial and block time is fast.
	AutomatedTesting,
	/// For user testing on a local machine with relaxed parameters.
	UserTesting,
	/// Public test network, with its own hard-fork height table offset from
	/// mainnet's.
	Floonet,
	/// Main production network.
	Mainnet,
}

impl Default for ChainTypes {
	fn default() -> ChainTypes {
		ChainTypes::Mainnet
	}
}

impl ChainTypes {
	/// Whether this is one of the two local testing modes, where consensus
	/// constants are relaxed so mining is effectively instantaneous.
	pub fn is_testing_mode(&self) -> bool {
		matches!(self, ChainTypes::AutomatedTesting | ChainTypes::UserTesting)
	}
}

/// Default minimum accepted Cuckoo graph size, in edge bits, for production
/// chain types.
pub const DEFAULT_MIN_EDGE_BITS: u8 = 31;

lazy_static! {
	/// The process-wide chain type. Set once at startup via
	/// `set_local_chain_type` before any other core operation runs.
	pub static ref CHAIN_TYPE: RwLock<ChainTypes> = RwLock::new(ChainTypes::Mainnet);
}

/// Sets the chain type for this process. Should be called once, at startup,
/// before anything in `core`/`chain`/`pool` reads consensus parameters.
pub fn set_local_chain_type(new_type: ChainTypes) {
	let mut chain_type = CHAIN_TYPE.write();
	*chain_type = new_type;
}

/// Returns the process-wide chain type.
pub fn get_chain_type() -> ChainTypes {
	*CHAIN_TYPE.read()
}

/// Are we running one of the local testing chain types?
pub fn is_testing_mode() -> bool {
	get_chain_type().is_testing_mode()
}

/// Are we on the production mainnet?
pub fn is_mainnet() -> bool {
	get_chain_type() == ChainTypes::Mainnet
}

/// Are we on the public floonet test network?
pub fn is_floonet() -> bool {
	get_chain_type() == ChainTypes::Floonet
}

/// The minimum accepted Cuckoo graph size (in edge bits) for the primary PoW
/// algorithm. Automated testing shrinks this drastically so tests can mine
/// blocks in milliseconds.
pub fn min_edge_bits() -> u8 {
	match get_chain_type() {
		ChainTypes::AutomatedTesting => 9,
		ChainTypes::UserTesting => 15,
		ChainTypes::Floonet => DEFAULT_MIN_EDGE_BITS,
		ChainTypes::Mainnet => DEFAULT_MIN_EDGE_BITS,
	}
}

/// Number of blocks before a coinbase output matures. Testing modes use a
/// trivial value so tests don't need to mine thousands of blocks just to
/// spend a coinbase.
pub fn coinbase_maturity() -> u64 {
	match get_chain_type() {
		ChainTypes::AutomatedTesting => 3,
		ChainTypes::UserTesting => 3,
		_ => DAY_HEIGHT,
	}
}

/// Height of the first hard fork (v1 -> v2). Floonet forks one day earlier
/// than mainnet, historically used to validate a fork on the test network
/// before the main chain adopts it.
pub fn hard_fork_1_height() -> u64 {
	match get_chain_type() {
		ChainTypes::Floonet => YEAR_HEIGHT / 2 - DAY_HEIGHT,
		_ => YEAR_HEIGHT / 2,
	}
}

/// Height of the second hard fork (v2 -> v3), with the same floonet offset
/// as `hard_fork_1_height`.
pub fn hard_fork_2_height() -> u64 {
	match get_chain_type() {
		ChainTypes::Floonet => YEAR_HEIGHT - DAY_HEIGHT,
		_ => YEAR_HEIGHT,
	}
}

/// Number of seconds in the future a block header's timestamp may be before
/// it is rejected as an implausible `FUTURE_TIMESTAMP`.
pub fn max_block_time_offset() -> i64 {
	12 * 60
}

/// Base edge_bits used as the reference point for the primary PoW
/// difficulty-scaling factor. Always the production floor, regardless of
/// chain type, so difficulty comparisons stay meaningful across testing
/// modes with a shrunk `min_edge_bits`.
pub fn base_edge_bits() -> u8 {
	DEFAULT_MIN_EDGE_BITS
}

/// Number of edges making up a valid Cuckoo cycle proof, i.e. the proof
/// size. Identical across chain types and PoW variants.
pub fn proofsize() -> usize {
	crate::consensus::PROOFSIZE
}
