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

//! A growable sequence of values, internally chunked into fixed-size,
//! independently-encoded [`crate::group`] blobs plus a small raw `tail` for
//! the partially-filled final chunk.

use bytes::Bytes;

use crate::error::{InvalidArgumentSnafu, Result};
use crate::group;
use crate::int::Int;
use crate::metadata::Tag;
use crate::varint;
use snafu::ensure;

/// Number of values per encoded group.
pub const GROUP_SIZE: usize = 256;

/// Sentinel returned by [`IntegerArray::find`] when the value is absent.
pub const NOT_FOUND: usize = usize::MAX;

/// A growable, chunk-encoded sequence of fixed-width integers.
pub struct IntegerArray<T: Int> {
    groups: Vec<Bytes>,
    tail: Vec<T>,
}

impl<T: Int> Default for IntegerArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Int> IntegerArray<T> {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            tail: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.tail.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len() * GROUP_SIZE + self.tail.len()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.tail.clear();
    }

    /// Returns the value at `pos`.
    pub fn at(&self, pos: usize) -> Result<T> {
        let ngroups = self.groups.len();
        let group = pos / GROUP_SIZE;
        let index = pos % GROUP_SIZE;
        ensure!(
            group < ngroups || (group == ngroups && index < self.tail.len()),
            InvalidArgumentSnafu {
                msg: "array index out of range".to_string()
            }
        );

        if group < ngroups {
            group::fetch(&self.groups[group], index)
        } else {
            Ok(self.tail[index])
        }
    }

    /// Returns the index of the first occurrence of `value`, or
    /// [`NOT_FOUND`].
    pub fn find(&self, value: T) -> Result<usize> {
        for (g, blob) in self.groups.iter().enumerate() {
            if let Some(index) = find_in_group(blob, value)? {
                return Ok(g * GROUP_SIZE + index);
            }
        }
        if let Some(index) = self.tail.iter().position(|&v| v == value) {
            return Ok(self.groups.len() * GROUP_SIZE + index);
        }
        Ok(NOT_FOUND)
    }

    /// Inserts `value` at `pos`, shifting every later element one slot over
    /// (re-encoding every full group it has to ripple through).
    pub fn insert(&mut self, pos: usize, value: T) -> Result<()> {
        let ngroups = self.groups.len();
        let group = pos / GROUP_SIZE;
        let index = pos % GROUP_SIZE;
        ensure!(
            group < ngroups || (group == ngroups && index <= self.tail.len()),
            InvalidArgumentSnafu {
                msg: "array index out of range".to_string()
            }
        );

        let mut carry = value;
        let mut carry_index = index;
        for g in group..ngroups {
            let mut buffer = group::decode::<T>(&self.groups[g], GROUP_SIZE)?;
            let overflow = buffer[GROUP_SIZE - 1];
            buffer.copy_within(carry_index..GROUP_SIZE - 1, carry_index + 1);
            buffer[carry_index] = carry;
            self.groups[g] = group::encode(&buffer)?;

            carry = overflow;
            carry_index = 0;
        }

        self.tail.insert(carry_index, carry);
        if self.tail.len() == GROUP_SIZE {
            self.groups.push(group::encode(&self.tail)?);
            self.tail.clear();
        }
        Ok(())
    }
}

/// Encoding-aware fast paths for a single group's `find`, mirroring the
/// dispatch the corresponding group-level `fetch` uses. Returns `None` when
/// the value's encoding-specific pre-check (bit width, constant) already
/// rules it out; otherwise falls back to a full decode-and-scan.
fn find_in_group<T: Int>(blob: &[u8], value: T) -> Result<Option<usize>> {
    let (meta, data) = group::metadata_and_data::<T>(blob)?;

    match meta.value_desc.encoding {
        Tag::Naught => Ok((value == meta.value_desc.origin).then_some(0)),

        Tag::Normal => {
            let width = (T::BITS / 8) as usize;
            for index in 0..GROUP_SIZE {
                let mut out = [T::from_bits(0)];
                crate::basic::normal::decode(&mut out, &data[index * width..])?;
                if out[0] == value {
                    return Ok(Some(index));
                }
            }
            Ok(None)
        }

        Tag::Varint => {
            let mut codec = crate::transform::Zigzag::<T>::new();
            let mut pos = 0usize;
            for index in 0..GROUP_SIZE {
                let (decoded, consumed) = varint::value_decode(&data[pos..], &mut codec)?;
                if decoded == value {
                    return Ok(Some(index));
                }
                pos += consumed;
            }
            Ok(None)
        }

        Tag::Bitpck => {
            let umax = if T::SIGNED {
                value.zigzag_encode()
            } else {
                value.to_bits()
            };
            if u64::usedcount(umax) > meta.value_desc.nbits {
                return Ok(None);
            }
            scan_full_group(blob, value)
        }

        Tag::Bitfor => {
            let diff = value.wrapping_sub(meta.value_desc.origin).to_bits();
            if u64::usedcount(diff) > meta.value_desc.nbits {
                return Ok(None);
            }
            scan_full_group(blob, value)
        }

        Tag::Varfor | Tag::Bitpfr => scan_full_group(blob, value),
    }
}

fn scan_full_group<T: Int>(blob: &[u8], value: T) -> Result<Option<usize>> {
    let buffer = group::decode::<T>(blob, GROUP_SIZE)?;
    Ok(buffer.iter().position(|&v| v == value))
}
