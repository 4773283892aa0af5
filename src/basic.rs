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

//! The two trivial encodings: `normal` (raw little-endian passthrough) and
//! `naught` (all values equal, nothing but the origin stored).

use crate::error::{CorruptInputSnafu, Result};
use crate::int::Int;
use snafu::ensure;

pub mod normal {
    use super::*;

    pub fn space(nvalues: usize, width_bytes: usize) -> usize {
        nvalues * width_bytes
    }

    /// Writes every value in `values` as `T::BITS / 8` little-endian bytes.
    pub fn encode<T: Int>(dst: &mut [u8], values: &[T]) {
        let width = (T::BITS / 8) as usize;
        debug_assert!(dst.len() >= values.len() * width);
        for (i, &v) in values.iter().enumerate() {
            let bits = v.to_bits();
            dst[i * width..i * width + width].copy_from_slice(&bits.to_le_bytes()[..width]);
        }
    }

    /// Reads `dst.len()` little-endian values from the front of `src`.
    pub fn decode<T: Int>(dst: &mut [T], src: &[u8]) -> Result<()> {
        let width = (T::BITS / 8) as usize;
        let needed = dst.len() * width;
        ensure!(
            src.len() >= needed,
            CorruptInputSnafu {
                msg: "truncated normal-encoded data".to_string()
            }
        );
        for (i, slot) in dst.iter_mut().enumerate() {
            let mut bytes = [0u8; 8];
            bytes[..width].copy_from_slice(&src[i * width..i * width + width]);
            *slot = T::from_bits(u64::from_le_bytes(bytes));
        }
        Ok(())
    }
}

pub mod naught {
    use super::*;

    /// `naught` never needs payload bytes; the single repeated value lives
    /// entirely in the metadata's `origin` field.
    pub fn decode<T: Int>(dst: &mut [T], origin: T) {
        for slot in dst.iter_mut() {
            *slot = origin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normal_roundtrip_i32() {
        let values = [1i32, -2, 3, i32::MIN, i32::MAX];
        let mut buf = vec![0u8; normal::space(values.len(), 4)];
        normal::encode(&mut buf, &values);

        let mut out = vec![0i32; values.len()];
        normal::decode(&mut out, &buf).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn naught_fills_constant() {
        let mut out = vec![0i32; 5];
        naught::decode(&mut out, 42);
        assert_eq!(out, vec![42, 42, 42, 42, 42]);
    }

    #[test]
    fn normal_truncated_is_corrupt_input() {
        let mut out = vec![0i32; 3];
        let err = normal::decode(&mut out, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, crate::error::Error::CorruptInput { .. }));
    }

    proptest! {
        #[test]
        fn normal_roundtrip_u16(values in proptest::collection::vec(any::<u16>(), 0..100)) {
            let mut buf = vec![0u8; normal::space(values.len(), 2)];
            normal::encode(&mut buf, &values);

            let mut out = vec![0u16; values.len()];
            normal::decode(&mut out, &buf).unwrap();
            prop_assert_eq!(out, values);
        }
    }
}
