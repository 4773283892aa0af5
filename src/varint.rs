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

//! 7-bit continuation-bit variable-byte encoding (the `varint` and `varfor`
//! encodings share this codec, differing only in which [`ValueCodec`] feeds
//! it).

use crate::error::{CorruptInputSnafu, Result};
use crate::int::Int;
use crate::transform::ValueCodec;
use snafu::ensure;

/// Bytes needed to varint-encode a `k`-bit quantity.
pub fn nbits_space(k: u32) -> usize {
    ((k + 6) / 7) as usize
}

/// Bytes needed to varint-encode `v` after running it through `vcodec`.
pub fn value_space<T: Int>(v: T, vcodec: &mut impl ValueCodec<T>) -> usize {
    let bits = vcodec.encode(v);
    let used = u64::usedcount(bits);
    if used == 0 {
        1
    } else {
        nbits_space(used)
    }
}

/// Appends the varint encoding of `v` (after `vcodec`) to `dst`.
pub fn value_encode<T: Int>(dst: &mut Vec<u8>, v: T, vcodec: &mut impl ValueCodec<T>) {
    let mut bits = vcodec.encode(v);
    loop {
        let mut byte = (bits & 0x7f) as u8;
        bits >>= 7;
        if bits != 0 {
            byte |= 0x80;
            dst.push(byte);
        } else {
            dst.push(byte);
            break;
        }
    }
}

/// Decodes one varint from the front of `src`, returning the value and the
/// number of bytes consumed.
pub fn value_decode<T: Int>(src: &[u8], vcodec: &mut impl ValueCodec<T>) -> Result<(T, usize)> {
    let mut bits: u64 = 0;
    let mut shift: u32 = 0;
    for (i, &byte) in src.iter().enumerate() {
        ensure!(
            shift < 64,
            CorruptInputSnafu {
                msg: "varint continues past 64 bits".to_string()
            }
        );
        bits |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok((vcodec.decode(bits), i + 1));
        }
        shift += 7;
    }
    CorruptInputSnafu {
        msg: "truncated varint".to_string(),
    }
    .fail()
}

/// Appends the varint encoding of every value in `values` to `dst`.
pub fn encode<T: Int>(dst: &mut Vec<u8>, values: &[T], vcodec: &mut impl ValueCodec<T>) {
    for &v in values {
        value_encode(dst, v, vcodec);
    }
}

/// Decodes `dst.len()` varints from the front of `src`.
pub fn decode<T: Int>(dst: &mut [T], src: &[u8], vcodec: &mut impl ValueCodec<T>) -> Result<usize> {
    let mut pos = 0usize;
    for slot in dst.iter_mut() {
        let (v, consumed) = value_decode(&src[pos..], vcodec)?;
        *slot = v;
        pos += consumed;
    }
    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Origin, Zigzag};
    use proptest::prelude::*;

    #[test]
    fn zero_takes_one_byte() {
        let mut buf = Vec::new();
        let mut codec = Zigzag::<i32>::new();
        value_encode(&mut buf, 0i32, &mut codec);
        assert_eq!(buf, vec![0x00]);
    }

    #[test]
    fn single_continuation_byte() {
        let mut buf = Vec::new();
        let mut codec = Zigzag::<u32>::new();
        value_encode(&mut buf, 300u32, &mut codec);
        // 300 = 0b1_0010_1100 -> low7=0101100=0x2C with continuation, high=0b10=2
        assert_eq!(buf, vec![0xAC, 0x02]);
    }

    #[test]
    fn self_delimiting_sequence() {
        let values = [0u32, 1, 127, 128, 16384, u32::MAX];
        let mut buf = Vec::new();
        let mut enc_codec = Zigzag::<u32>::new();
        encode(&mut buf, &values, &mut enc_codec);

        let mut out = vec![0u32; values.len()];
        let mut dec_codec = Zigzag::<u32>::new();
        let consumed = decode(&mut out, &buf, &mut dec_codec).unwrap();
        assert_eq!(out, values);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn truncated_continuation_is_corrupt_input() {
        let mut codec = Zigzag::<u32>::new();
        let err = value_decode::<u32>(&[0x80, 0x80], &mut codec).unwrap_err();
        assert!(matches!(err, crate::error::Error::CorruptInput { .. }));
    }

    #[test]
    fn origin_value_codec() {
        let mut buf = Vec::new();
        let mut enc_codec = Origin::new(1000i32);
        value_encode(&mut buf, 1003, &mut enc_codec);
        assert_eq!(buf, vec![3]);

        let mut dec_codec = Origin::new(1000i32);
        let (v, consumed) = value_decode(&buf, &mut dec_codec).unwrap();
        assert_eq!(v, 1003);
        assert_eq!(consumed, 1);
    }

    proptest! {
        #[test]
        fn roundtrip_i32(values in proptest::collection::vec(any::<i32>(), 0..200)) {
            let mut buf = Vec::new();
            let mut enc_codec = Zigzag::<i32>::new();
            encode(&mut buf, &values, &mut enc_codec);

            let mut out = vec![0i32; values.len()];
            let mut dec_codec = Zigzag::<i32>::new();
            let consumed = decode(&mut out, &buf, &mut dec_codec).unwrap();
            prop_assert_eq!(&out, &values);
            prop_assert_eq!(consumed, buf.len());
        }

        #[test]
        fn space_matches_encoded_length(v: i32) {
            let mut space_codec = Zigzag::<i32>::new();
            let predicted = value_space(v, &mut space_codec);

            let mut buf = Vec::new();
            let mut enc_codec = Zigzag::<i32>::new();
            value_encode(&mut buf, v, &mut enc_codec);

            prop_assert_eq!(predicted, buf.len());
        }
    }
}
