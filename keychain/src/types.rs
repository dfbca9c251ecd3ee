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

use util::secp;

/// Errors arising from blinding factor arithmetic.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum Error {
	/// An underlying secp256k1-zkp error, typically a malformed scalar or a
	/// point at infinity showing up where it's forbidden.
	#[fail(display = "secp error: {:?}", _0)]
	Secp(secp::Error),
}

impl From<secp::Error> for Error {
	fn from(e: secp::Error) -> Error {
		Error::Secp(e)
	}
}
