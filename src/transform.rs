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

//! Reversible per-value mappings from `T` into the unsigned `u64` domain the
//! rest of the crate packs bits in.
//!
//! [`Zigzag`], [`Origin`] and [`Offset`] are all [`ValueCodec`] impls, so the
//! bit-pack and varint codecs can be parameterised over whichever one a given
//! encoding needs without knowing which it got.

use std::marker::PhantomData;

use crate::int::Int;

/// A reversible mapping between `T` and the `u64` domain the block and
/// varint codecs operate in.
pub trait ValueCodec<T: Int> {
    fn encode(&mut self, v: T) -> u64;
    fn decode(&mut self, bits: u64) -> T;
}

/// Default value codec for signed types: `zigzag`. Identity for unsigned
/// types. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct Zigzag<T>(PhantomData<T>);

impl<T: Int> Zigzag<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Int> ValueCodec<T> for Zigzag<T> {
    fn encode(&mut self, v: T) -> u64 {
        v.zigzag_encode()
    }

    fn decode(&mut self, bits: u64) -> T {
        T::zigzag_decode(bits)
    }
}

/// Encodes a value as its difference from a fixed `base` (frame of
/// reference). Stateless beyond the immutable `base`.
#[derive(Debug, Clone, Copy)]
pub struct Origin<T> {
    base: T,
}

impl<T: Int> Origin<T> {
    pub fn new(base: T) -> Self {
        Self { base }
    }

    pub fn base(&self) -> T {
        self.base
    }
}

impl<T: Int> ValueCodec<T> for Origin<T> {
    fn encode(&mut self, v: T) -> u64 {
        v.wrapping_sub(self.base).to_bits()
    }

    fn decode(&mut self, bits: u64) -> T {
        self.base.wrapping_add_bits(bits)
    }
}

/// Encodes a value as its difference from a running reference that advances
/// by a constant `step` after every value: `encode(v) = v - prev; prev = v +
/// step`. With `step = 1` this turns a strictly increasing sequence (e.g. the
/// outlier indices in [`crate::patched`]) into small deltas. Stateful.
#[derive(Debug, Clone, Copy)]
pub struct Offset<T> {
    prev: T,
    step: u64,
}

impl<T: Int> Offset<T> {
    /// `taken_out` mirrors the source's constructor flag: when set, `base`
    /// is treated as already having had one `step` applied (used when the
    /// first logical value was already consumed elsewhere).
    pub fn new(base: T, step: u64, taken_out: bool) -> Self {
        let prev = if taken_out {
            base.wrapping_add_bits(step)
        } else {
            base
        };
        Self { prev, step }
    }
}

impl<T: Int> ValueCodec<T> for Offset<T> {
    fn encode(&mut self, v: T) -> u64 {
        let u = v.wrapping_sub(self.prev).to_bits();
        self.prev = v.wrapping_add_bits(self.step);
        u
    }

    fn decode(&mut self, bits: u64) -> T {
        let v = self.prev.wrapping_add_bits(bits);
        self.prev = v.wrapping_add_bits(self.step);
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn origin_basic() {
        let mut codec = Origin::new(100i32);
        assert_eq!(codec.encode(103), 3);
        assert_eq!(codec.decode(3), 103);
    }

    #[test]
    fn offset_strictly_increasing() {
        let mut enc = Offset::new(0u32, 1, false);
        let encoded: Vec<u64> = [0u32, 1, 2, 4, 7]
            .iter()
            .map(|&v| enc.encode(v))
            .collect();
        // deltas: 0-0=0, 1-1=0, 2-2=0, 4-3=1, 7-5=2
        assert_eq!(encoded, vec![0, 0, 0, 1, 2]);

        let mut dec = Offset::new(0u32, 1, false);
        let decoded: Vec<u32> = encoded.iter().map(|&u| dec.decode(u)).collect();
        assert_eq!(decoded, vec![0, 1, 2, 4, 7]);
    }

    proptest! {
        #[test]
        fn origin_roundtrip(base: i32, v: i32) {
            let mut enc = Origin::new(base);
            let mut dec = Origin::new(base);
            prop_assert_eq!(dec.decode(enc.encode(v)), v);
        }

        #[test]
        fn offset_roundtrip(base: i64, deltas in proptest::collection::vec(0i64..1000, 0..50)) {
            let mut values = Vec::with_capacity(deltas.len());
            let mut acc = base;
            for d in &deltas {
                acc = acc.wrapping_add(*d);
                values.push(acc);
            }

            let mut enc = Offset::new(base, 1, false);
            let encoded: Vec<u64> = values.iter().map(|&v| enc.encode(v)).collect();

            let mut dec = Offset::new(base, 1, false);
            let decoded: Vec<i64> = encoded.iter().map(|&u| dec.decode(u)).collect();

            prop_assert_eq!(decoded, values);
        }
    }
}
