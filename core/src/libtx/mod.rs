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

//! Lower-level transaction assembly helpers: the combinator-based
//! transaction builder and block reward construction. Everything here
//! operates on raw blinding factors: deriving those from a wallet's
//! keychain is outside this crate.

pub mod build;
mod error;
pub mod reward;

pub use self::error::Error;
