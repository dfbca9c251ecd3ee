// Copyright 2018 The Grin Developers
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

//! Transaction integration tests

pub mod common;

use self::core::core::{KernelFeatures, OutputFeatures};
use self::core::libtx::build;
use self::core::ser;
use common::random_blind;
use grin_core as core;

#[test]
fn test_output_ser_deser() {
	let (tx, _) = build::partial_transaction(
		KernelFeatures::Plain { fee: 0 },
		vec![build::output(5, random_blind())],
	)
	.unwrap();
	let out = tx.outputs()[0].clone();

	let mut vec = vec![];
	ser::serialize(&mut vec, &out).expect("serialized failed");
	let dout = ser::deserialize(&mut &vec[..]).unwrap();

	assert_eq!(out.features, OutputFeatures::Plain);
	assert_eq!(dout, out);
}
