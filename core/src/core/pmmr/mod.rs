// Copyright 2020 The Grin Developers
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

//! Prunable Merkle Mountain Range implementation, backends and companion
//! views (readonly, rewindable, database-backed, segmented) used to store
//! and sync the output, rangeproof and kernel sets.

pub mod backend;
pub mod chunk;
pub mod db_pmmr;
#[allow(clippy::module_inception)]
pub mod pmmr;
pub mod readonly_pmmr;
pub mod rewindable_pmmr;
pub mod segment;
pub mod vec_backend;

pub use self::backend::{Backend, HashOnlyBackend};
pub use self::chunk::{Chunk, ChunkError, ChunkIdentifier, ChunkProof};
pub use self::db_pmmr::DBPMMR;
pub use self::pmmr::{
	bintree_leftmost, bintree_postorder_height, bintree_rightmost, family, family_branch,
	insertion_to_pmmr_index, is_leaf, is_left_sibling, n_leaves, path, peak_map_height, peak_sizes_height,
	peaks, ReadablePMMR, PMMR,
};
pub use self::readonly_pmmr::ReadonlyPMMR;
pub use self::rewindable_pmmr::RewindablePMMR;
pub use self::segment::{Segment, SegmentError, SegmentIdentifier, SegmentProof};
pub use self::vec_backend::VecBackend;
