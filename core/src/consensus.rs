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

//! All the rules required for a cryptocurrency to reach consensus across the
//! whole network are complex and hard to completely isolate. Some can be
//! simple parameters (like block reward), others complex algorithms (like
//! the difficulty adjustment). As long as they're simple enough,
//! consensus-critical constants and short functions belong here.

use crate::global;
use crate::pow::Difficulty;
use std::cmp::{max, min};

/// A grin is divisible to 10^9, following the SI prefixes.
pub const GRIN_BASE: u64 = 1_000_000_000;
/// Milligrin, a thousand to a grin.
pub const MILLI_GRIN: u64 = GRIN_BASE / 1_000;
/// Microgrin, a thousand to a milligrin.
pub const MICRO_GRIN: u64 = MILLI_GRIN / 1_000;
/// Nanogrin, smallest unit, a billion to a grin.
pub const NANO_GRIN: u64 = 1;

/// The fixed block subsidy. MimbleWimble chains do not taper the reward, as
/// there is no fixed total coin supply to converge towards.
pub const REWARD: u64 = 60 * GRIN_BASE;

/// Actual block reward for a given total fee amount collected in the block.
pub fn reward(fee: u64) -> u64 {
	REWARD.saturating_add(fee)
}

/// Nominal block interval, in seconds.
pub const BLOCK_TIME_SEC: u64 = 60;

/// The number of blocks in an hour, at the nominal block time.
pub const HOUR_HEIGHT: u64 = 3600 / BLOCK_TIME_SEC;
/// The number of blocks in a day, at the nominal block time.
pub const DAY_HEIGHT: u64 = 24 * HOUR_HEIGHT;
/// The number of blocks in a week, at the nominal block time.
pub const WEEK_HEIGHT: u64 = 7 * DAY_HEIGHT;
/// The number of blocks in a year, at the nominal block time.
pub const YEAR_HEIGHT: u64 = 52 * WEEK_HEIGHT;

/// Number of blocks before a coinbase output can be spent.
pub const COINBASE_MATURITY: u64 = DAY_HEIGHT;

/// Cuckoo-cycle proof size (cycle length), shared by every edge-bits variant.
pub const PROOFSIZE: usize = 42;

/// Default minimal graph size, used in tests and automated-testing mode.
pub const DEFAULT_MIN_EDGE_BITS: u8 = 31;

/// Fixed edge_bits for the secondary (ASIC-resistant) proof of work
/// algorithm. Blocks solved at this size are scaled against the primary
/// algorithm via `ProofOfWork::scaling_difficulty` rather than the usual
/// graph-size adjustment.
pub const SECOND_POW_EDGE_BITS: u8 = 29;

/// Target ratio, out of 100, of secondary proof-of-work solutions accepted
/// near genesis. Decays to zero as `secondary_pow_ratio` approaches
/// `SECONDARY_POW_RATIO_DECAY_HEIGHT`, after which only the primary
/// algorithm is valid.
pub const SECONDARY_POW_RATIO: u64 = 90;

/// Height at which the secondary PoW ratio has fully decayed to zero.
pub const SECONDARY_POW_RATIO_DECAY_HEIGHT: u64 = 2 * YEAR_HEIGHT;

/// Clamp factor used in difficulty retargeting: the ratio between two
/// consecutive adjustment windows' durations is bounded to this factor in
/// either direction.
pub const CLAMP_FACTOR: u64 = 2;

/// Dampening factor applied to the difficulty adjustment window's actual
/// duration before clamping, smoothing out block-time noise.
pub const DIFFICULTY_DAMP_FACTOR: u64 = 3;

/// Number of blocks used in the difficulty adjustment window (DAMA).
pub const DIFFICULTY_ADJUST_WINDOW: u64 = 60;

/// Average time span, in seconds, the adjustment window should ideally
/// cover.
pub const BLOCK_TIME_WINDOW: u64 = DIFFICULTY_ADJUST_WINDOW * BLOCK_TIME_SEC;

/// Minimum difficulty, floor enforced during retargeting so the network
/// never claims a difficulty below this even after a long idle period.
pub const MIN_DIFFICULTY: u64 = DIFFICULTY_DAMP_FACTOR;

/// Maximum block weight. `weight = max(1, -inputs + 4*outputs + kernels)`,
/// so a block may carry at most this many "effective" elements.
pub const MAX_BLOCK_WEIGHT: usize = 40_000;

/// Weight contributed by each input. Negative relative to outputs/kernels:
/// spending an existing output prunes space rather than consuming it.
pub const BLOCK_INPUT_WEIGHT: usize = 1;
/// Weight contributed by each output.
pub const BLOCK_OUTPUT_WEIGHT: usize = 4;
/// Weight contributed by each kernel.
pub const BLOCK_KERNEL_WEIGHT: usize = 1;

/// The maximum number of inputs, outputs or kernels a transaction body may
/// carry and still be deserializable. Pure DoS protection, well above
/// anything `MAX_BLOCK_WEIGHT` would allow through.
pub const MAX_IN_OUT_LEN: u64 = 50_000;

/// Fork every six months.
pub const HARD_FORK_INTERVAL: u64 = YEAR_HEIGHT / 2;

/// Number of hard forks with a fixed, scheduled activation height. Querying
/// a height beyond this returns an error: the version to use past this
/// point has not yet been decided.
pub const PLANNED_HARD_FORKS: u64 = 2;

/// Computes the weight of a block (or transaction) body from its element
/// counts: `max(1, -inputs + 4*outputs + kernels)`. See spec scenario:
/// `inputs=2, outputs=2, kernels=1` weighs `7`; `inputs=0, outputs=1905,
/// kernels=1` weighs `7621`.
pub fn body_weight(input_len: usize, output_len: usize, kernel_len: usize) -> usize {
	let raw = (output_len * BLOCK_OUTPUT_WEIGHT + kernel_len * BLOCK_KERNEL_WEIGHT)
		.saturating_sub(input_len * BLOCK_INPUT_WEIGHT);
	max(1, raw)
}

/// Returns `true` if a body of the given shape fits within the consensus
/// block weight limit.
pub fn body_weight_fits(input_len: usize, output_len: usize, kernel_len: usize) -> bool {
	body_weight(input_len, output_len, kernel_len) <= MAX_BLOCK_WEIGHT
}

/// The header version active at or immediately after the given height. Each
/// `HARD_FORK_INTERVAL` blocks bumps the version by one, up to
/// `PLANNED_HARD_FORKS` forks beyond genesis; querying further into the
/// future is an error since the version to use there is not yet decided.
pub fn header_version(height: u64) -> Result<u16, String> {
	let version = 1 + height / HARD_FORK_INTERVAL;
	if version > PLANNED_HARD_FORKS + 1 {
		Err(format!(
			"no header version is defined for height {} yet",
			height
		))
	} else {
		Ok(version as u16)
	}
}

/// Is `version` the correct header version for `height`?
pub fn valid_header_version(height: u64, version: u16) -> bool {
	match header_version(height) {
		Ok(v) => v == version,
		Err(_) => false,
	}
}

/// Computes the next block difficulty from a window of `(timestamp,
/// difficulty)` pairs covering the last `DIFFICULTY_ADJUST_WINDOW` blocks
/// (oldest first or last, order-independent - the window is sorted by
/// timestamp internally). Implements a dampened, clamped moving average:
/// the window's average difficulty is rescaled by the ratio of the ideal
/// window duration to the damped and clamped actual duration.
pub fn next_difficulty(cursor: &[(u64, Difficulty)]) -> Difficulty {
	if cursor.len() < 2 {
		return Difficulty::from_num(MIN_DIFFICULTY);
	}

	let mut pairs: Vec<(u64, Difficulty)> = cursor.to_vec();
	pairs.sort_by_key(|&(t, _)| t);

	let earliest_ts = pairs[0].0;
	let latest_ts = pairs[pairs.len() - 1].0;
	let diff_sum: u64 = pairs.iter().map(|&(_, d)| d.to_num()).sum();
	let n = pairs.len() as u64;

	let actual_duration = latest_ts.saturating_sub(earliest_ts).max(1);
	let ideal_duration = (BLOCK_TIME_SEC * (n.saturating_sub(1))).max(1);

	let damped_duration =
		(actual_duration + (DIFFICULTY_DAMP_FACTOR - 1) * ideal_duration) / DIFFICULTY_DAMP_FACTOR;

	let clamped_duration = min(
		max(damped_duration, ideal_duration / CLAMP_FACTOR),
		ideal_duration * CLAMP_FACTOR,
	)
	.max(1);

	let avg_difficulty = diff_sum / n;
	let next = avg_difficulty * ideal_duration / clamped_duration;

	Difficulty::from_num(max(next, MIN_DIFFICULTY))
}

/// The percentage (0-100) of blocks in a window that may use the secondary
/// proof-of-work algorithm at the given height. Decays linearly from
/// `SECONDARY_POW_RATIO` at genesis to zero at
/// `SECONDARY_POW_RATIO_DECAY_HEIGHT`.
pub fn secondary_pow_ratio(height: u64) -> u64 {
	if height >= SECONDARY_POW_RATIO_DECAY_HEIGHT {
		0
	} else {
		SECONDARY_POW_RATIO - SECONDARY_POW_RATIO * height / SECONDARY_POW_RATIO_DECAY_HEIGHT
	}
}

/// Number of blocks covered by one difficulty adjustment window, plus the
/// trailing block needed to measure the window's start timestamp.
pub fn difficulty_data_len() -> usize {
	(DIFFICULTY_ADJUST_WINDOW + 1) as usize
}

/// Number of blocks before a coinbase output matures and becomes spendable.
/// Delegates to `global` so automated-testing mode can shrink it.
pub fn coinbase_maturity() -> u64 {
	global::coinbase_maturity()
}

/// The maximum block weight, a consensus rule enforced identically across
/// chain types.
pub fn max_block_weight() -> usize {
	MAX_BLOCK_WEIGHT
}
