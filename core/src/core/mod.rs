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

//! Core types

pub mod block;
pub mod block_sums;
pub mod committed;
pub mod compact_block;
pub mod compact_transaction;
pub mod hash;
pub mod id;
pub mod merkle_proof;
pub mod pmmr;
pub mod pmmr_extra;
pub mod prune_list;
pub mod transaction;
pub mod verifier_cache;

pub use self::block::{Block, BlockHeader, Error as BlockError, UntrustedBlockHeader};
pub use self::block_sums::BlockSums;
pub use self::committed::{Committed, Error as CommittedError};
pub use self::compact_block::{CompactBlock, CompactBlockBody, UntrustedCompactBlock};
pub use self::compact_transaction::{CompactTransaction, CompactTransactionBody};
pub use self::id::{short_id_from_hash, ShortId, SHORT_ID_SIZE};
pub use self::merkle_proof::{MerkleProof, MerkleProofError};
pub use self::prune_list::PruneList;
pub use self::transaction::{
	Error as TransactionError, Input, KernelFeatures, Output, OutputFeatures, OutputIdentifier,
	Transaction, TransactionBody, TxKernel,
};
pub use self::verifier_cache::{LruVerifierCache, VerifierCache};
