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

//! Patched bit-packing (`bitpfr`): bit-pack at a width chosen to fit the
//! *typical* value, and shunt the values that don't fit into an outlier side
//! channel (original index, delta-compressed; high bits beyond the packed
//! width).

use crate::bitpack;
use crate::int::Int;
use crate::transform::{Offset, Origin, ValueCodec};

/// Outlier side channel collected while encoding the main bit-packed stream.
#[derive(Debug, Default, Clone)]
pub struct Outliers {
    /// Offset(step=1, taken_out=false)-encoded absolute indices.
    pub indices: Vec<u64>,
    /// `(v - origin) >> nbits` for each outlier, in encounter order.
    pub values: Vec<u64>,
}

/// Value codec used while packing the main `bitpfr` stream: behaves like
/// [`Origin`], but side-effects every value that doesn't fit in `nbits` bits
/// into `outliers`. Only used for encoding — decoding the main stream uses
/// plain [`Origin`], since the low `nbits` bits it produces for an outlier
/// are already correct; [`decode_patch`] fixes up the high bits afterward.
pub struct PatchEncoder<T: Int> {
    origin: Origin<T>,
    nbits: u32,
    mask: u64,
    index: u64,
    index_codec: Offset<u64>,
    pub outliers: Outliers,
}

impl<T: Int> PatchEncoder<T> {
    pub fn new(origin: T, nbits: u32) -> Self {
        let mask = if nbits >= 64 { u64::MAX } else { (1u64 << nbits) - 1 };
        Self {
            origin: Origin::new(origin),
            nbits,
            mask,
            index: 0,
            index_codec: Offset::new(0, 1, false),
            outliers: Outliers::default(),
        }
    }
}

impl<T: Int> ValueCodec<T> for PatchEncoder<T> {
    fn encode(&mut self, v: T) -> u64 {
        let u = self.origin.encode(v);
        if u & !self.mask != 0 {
            let idx = self.index_codec.encode(self.index);
            self.outliers.indices.push(idx);
            self.outliers.values.push(u >> self.nbits);
        }
        self.index += 1;
        u
    }

    fn decode(&mut self, bits: u64) -> T {
        // Never used: PatchEncoder only ever feeds bitpack::encode.
        self.origin.decode(bits)
    }
}

/// Packs `values` into `dst` (sized per `bitpack::space(values.len(), nbits)`)
/// at width `nbits`, relative to `origin`. Returns the collected outliers.
pub fn encode<T: Int>(dst: &mut [u8], values: &[T], origin: T, nbits: u32) -> crate::error::Result<Outliers> {
    let mut codec = PatchEncoder::new(origin, nbits);
    bitpack::encode(dst, values, nbits, &mut codec)?;
    Ok(codec.outliers)
}

/// Decodes the main bit-packed stream (low `nbits` bits of every value,
/// including outliers — whose high bits are still missing at this point).
pub fn decode_basic<T: Int>(dst: &mut [T], src: &[u8], origin: T, nbits: u32) -> crate::error::Result<()> {
    let mut codec = Origin::new(origin);
    bitpack::decode(dst, src, nbits, &mut codec)
}

/// Fixes up every outlier in `dst` (already populated by [`decode_basic`])
/// using the side channel collected at encode time.
pub fn decode_patch<T: Int>(dst: &mut [T], origin: T, nbits: u32, outliers: &Outliers) {
    let mut origin_codec = Origin::new(origin);
    let mut index_codec = Offset::<u64>::new(0, 1, false);
    for i in 0..outliers.indices.len() {
        let idx = index_codec.decode(outliers.indices[i]) as usize;
        let low = origin_codec.encode(dst[idx]);
        let value = low | (outliers.values[i] << nbits);
        dst[idx] = origin_codec.decode(value);
    }
}

/// Decodes a full `bitpfr`-encoded sequence: main stream then patches.
pub fn decode<T: Int>(
    dst: &mut [T],
    src: &[u8],
    origin: T,
    nbits: u32,
    outliers: &Outliers,
) -> crate::error::Result<()> {
    decode_basic(dst, src, origin, nbits)?;
    decode_patch(dst, origin, nbits, outliers);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_values_with_sparse_outliers() {
        // origin = 0, nbits = 4 (fits 0..=15); a few values far outside that.
        let mut values: Vec<i64> = (0..100).map(|i| i % 12).collect();
        values[10] = 1 << 20;
        values[57] = (1 << 20) + 5;

        let origin = 0i64;
        let nbits = 4u32;
        let needed = bitpack::space(values.len(), nbits);
        let mut buf = vec![0u8; needed];

        let outliers = encode(&mut buf, &values, origin, nbits).unwrap();
        assert_eq!(outliers.indices.len(), 2);
        assert_eq!(outliers.values.len(), 2);

        let mut out = vec![0i64; values.len()];
        decode(&mut out, &buf, origin, nbits, &outliers).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn no_outliers_behaves_like_plain_origin() {
        let values: Vec<u32> = (1000..1064).collect();
        let origin = 1000u32;
        let nbits = 6u32; // range is exactly 0..=63, fits in 6 bits
        let needed = bitpack::space(values.len(), nbits);
        let mut buf = vec![0u8; needed];

        let outliers = encode(&mut buf, &values, origin, nbits).unwrap();
        assert!(outliers.indices.is_empty());

        let mut out = vec![0u32; values.len()];
        decode(&mut out, &buf, origin, nbits, &outliers).unwrap();
        assert_eq!(out, values);
    }
}
