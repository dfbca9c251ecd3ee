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

//! Hex encoding and decoding for anything that can be seen as a byte slice,
//! used pervasively to print and parse commitments, hashes and signatures.

use std::fmt::Write;
use std::num;

/// Something that can be converted to a hex string.
pub trait ToHex {
	/// Converts `self` to hex.
	fn to_hex(&self) -> String;
}

impl<T: AsRef<[u8]>> ToHex for T {
	fn to_hex(&self) -> String {
		let mut s = String::with_capacity(self.as_ref().len() * 2);
		for byte in self.as_ref() {
			write!(&mut s, "{:02x}", byte).expect("unable to write hex digit");
		}
		s
	}
}

/// Decode a hex string into bytes, tolerating an optional leading `0x`.
pub fn from_hex(hex_str: &str) -> Result<Vec<u8>, num::ParseIntError> {
	let hex_trim = if hex_str.starts_with("0x") {
		&hex_str[2..]
	} else {
		hex_str
	};
	if hex_trim.is_empty() {
		return Ok(vec![]);
	}
	split_n(hex_trim.trim(), 2)
		.iter()
		.map(|b| u8::from_str_radix(b, 16))
		.collect()
}

fn split_n(s: &str, n: usize) -> Vec<&str> {
	(0..(s.len() / n)).map(|i| &s[n * i..n * i + n]).collect()
}
