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

//! Blinding factor primitives shared by the transaction and block types.
//!
//! Wallet-side key derivation (extended keys, BIP-32 paths, mnemonics) is
//! not part of this crate: the core engine only ever needs to hold, sum and
//! serialize blinding factors, never to derive them from a master seed.

extern crate blake2_rfc as blake2;
#[macro_use]
extern crate failure_derive;
extern crate grin_util as util;
extern crate rand;
extern crate serde;
#[macro_use]
extern crate serde_derive;

mod blind;
mod types;

pub use crate::blind::{BlindSum, BlindingFactor};
pub use crate::types::Error;
