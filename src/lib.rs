// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Self-describing compression for sequences of fixed-width integers.
//!
//! A sequence is encoded into a single blob that carries its own decoding
//! recipe: [`selector::select`] looks at the data and picks the cheapest of
//! seven encodings (`naught`, `normal`, `varint`, `varfor`, `bitpck`,
//! `bitfor`, `bitpfr`), [`metadata`] frames that choice onto the wire, and
//! [`group`] ties selection, framing and the value codecs together into
//! `encode`/`decode`/`fetch`. [`array::IntegerArray`] chunks a growable
//! sequence into fixed-size groups so that insertion only has to re-encode
//! the groups it touches.
//!
//! ```
//! use intcodec::group;
//!
//! let values = [1_000_000i64, 1_000_001, 1_000_002, 1_000_003];
//! let blob = group::encode(&values).unwrap();
//! let decoded = group::decode::<i64>(&blob, values.len()).unwrap();
//! assert_eq!(decoded, values);
//! assert_eq!(group::fetch::<i64>(&blob, 2).unwrap(), 1_000_002);
//! ```

pub mod array;
pub mod basic;
pub mod bitpack;
pub mod error;
pub mod group;
pub mod int;
pub mod metadata;
pub mod patched;
pub mod selector;
pub mod transform;
pub mod varint;

pub use array::IntegerArray;
pub use error::{Error, Result};
pub use int::Int;
