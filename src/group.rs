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

//! Ties the selector, metadata framing and value codecs together into a
//! single self-describing blob: `[metadata][pad to 8 bytes][data]`.

use bytes::{Bytes, BytesMut};

use crate::basic::{naught, normal};
use crate::bitpack;
use crate::error::{CorruptInputSnafu, InvalidArgumentSnafu, Result};
use crate::int::Int;
use crate::metadata::{self, Metadata, Tag};
use crate::patched;
use crate::selector;
use crate::transform::{Origin, Zigzag};
use crate::varint;

/// Rounds the header's actual on-wire length up to the next 8-byte boundary.
fn padded(header_len: usize) -> usize {
    (header_len + 7) / 8 * 8
}

/// Encodes `values` into a freshly-allocated, self-describing blob.
pub fn encode<T: Int>(values: &[T]) -> Result<Bytes> {
    let meta = selector::select(values);
    let mut header = Vec::with_capacity(meta.metaspace());
    metadata::encode(&mut header, &meta);

    let header_space = padded(header.len());
    let dataspace = meta.value_desc.dataspace
        + if meta.value_desc.encoding == Tag::Bitpfr {
            meta.outlier_index_desc.dataspace + meta.outlier_value_desc.dataspace
        } else {
            0
        };

    let mut blob = BytesMut::zeroed(header_space + dataspace);
    blob[..header.len()].copy_from_slice(&header);

    let data = &mut blob[header_space..];
    encode_data(data, values, &meta)?;

    Ok(blob.freeze())
}

fn encode_data<T: Int>(dst: &mut [u8], values: &[T], meta: &Metadata<T>) -> Result<()> {
    match meta.value_desc.encoding {
        Tag::Naught => Ok(()),
        Tag::Normal => {
            normal::encode(dst, values);
            Ok(())
        }
        Tag::Varint => {
            let mut codec = Zigzag::<T>::new();
            let mut buf = Vec::new();
            varint::encode(&mut buf, values, &mut codec);
            dst[..buf.len()].copy_from_slice(&buf);
            Ok(())
        }
        Tag::Varfor => {
            let mut codec = Origin::new(meta.value_desc.origin);
            let mut buf = Vec::new();
            varint::encode(&mut buf, values, &mut codec);
            dst[..buf.len()].copy_from_slice(&buf);
            Ok(())
        }
        Tag::Bitpck => {
            let mut codec = Zigzag::<T>::new();
            bitpack::encode(dst, values, meta.value_desc.nbits, &mut codec)
        }
        Tag::Bitfor => {
            let mut codec = Origin::new(meta.value_desc.origin);
            bitpack::encode(dst, values, meta.value_desc.nbits, &mut codec)
        }
        Tag::Bitpfr => {
            let (main, rest) = dst.split_at_mut(meta.value_desc.dataspace);
            let outliers = patched::encode(main, values, meta.value_desc.origin, meta.value_desc.nbits)?;

            let (index_dst, value_dst) = rest.split_at_mut(meta.outlier_index_desc.dataspace);
            encode_outlier_stream(index_dst, &outliers.indices, &meta.outlier_index_desc)?;
            encode_outlier_stream(value_dst, &outliers.values, &meta.outlier_value_desc)?;
            Ok(())
        }
    }
}

fn encode_outlier_stream(dst: &mut [u8], values: &[u64], desc: &crate::metadata::Descriptor<u64>) -> Result<()> {
    match desc.encoding {
        Tag::Varint => {
            let mut codec = Origin::new(0u64);
            let mut buf = Vec::new();
            varint::encode(&mut buf, values, &mut codec);
            dst[..buf.len()].copy_from_slice(&buf);
            Ok(())
        }
        Tag::Bitpck => {
            let mut codec = Origin::new(0u64);
            bitpack::encode(dst, values, desc.nbits, &mut codec)
        }
        _ => unreachable!("outlier streams are only ever varint or bitpck"),
    }
}

/// Decodes one outlier side-channel stream from the front of `src`. Unlike
/// the main value stream, an outlier stream's on-wire length isn't part of
/// the metadata (only `noutliers` and the stream's own encoding/`nbits`
/// are), so this returns the number of bytes it actually consumed — exact
/// for `bitpck` (computable from `dst.len()` and `nbits`), and whatever the
/// self-delimiting `varint` decode reports otherwise.
fn decode_outlier_stream<'a>(
    dst: &mut [u64],
    src: &'a [u8],
    desc: &crate::metadata::Descriptor<u64>,
) -> Result<&'a [u8]> {
    match desc.encoding {
        Tag::Varint => {
            let mut codec = Origin::new(0u64);
            let consumed = varint::decode(dst, src, &mut codec)?;
            Ok(&src[consumed..])
        }
        Tag::Bitpck => {
            let consumed = bitpack::space(dst.len(), desc.nbits);
            let mut codec = Origin::new(0u64);
            bitpack::decode(dst, &src[..consumed], desc.nbits, &mut codec)?;
            Ok(&src[consumed..])
        }
        _ => unreachable!("outlier streams are only ever varint or bitpck"),
    }
}

/// Parses only the metadata out of `blob`, e.g. to inspect the chosen
/// encoding or compute `fetch` offsets without decoding any data.
pub fn decode_metadata<T: Int>(blob: &[u8]) -> Result<Metadata<T>> {
    let (meta, _) = metadata::decode(blob)?;
    Ok(meta)
}

/// Metadata plus a view of the data region that follows the alignment pad.
/// Used by [`crate::array`]'s `find` fast paths, which need to inspect the
/// raw bytes of `normal`/`varint` groups without a full decode.
pub(crate) fn metadata_and_data<T: Int>(blob: &[u8]) -> Result<(Metadata<T>, &[u8])> {
    let (meta, header_len) = metadata::decode(blob)?;
    Ok((meta, &blob[padded(header_len)..]))
}

/// Decodes `nvalues` values out of `blob`.
pub fn decode<T: Int>(blob: &[u8], nvalues: usize) -> Result<Vec<T>> {
    let (meta, header_len) = metadata::decode::<T>(blob)?;
    let data = &blob[padded(header_len)..];

    let mut out = vec![T::from_bits(0); nvalues];
    match meta.value_desc.encoding {
        Tag::Naught => naught::decode(&mut out, meta.value_desc.origin),
        Tag::Normal => normal::decode(&mut out, data)?,
        Tag::Varint => {
            let mut codec = Zigzag::<T>::new();
            varint::decode(&mut out, data, &mut codec)?;
        }
        Tag::Varfor => {
            let mut codec = Origin::new(meta.value_desc.origin);
            varint::decode(&mut out, data, &mut codec)?;
        }
        Tag::Bitpck => {
            let mut codec = Zigzag::<T>::new();
            bitpack::decode(&mut out, data, meta.value_desc.nbits, &mut codec)?;
        }
        Tag::Bitfor => {
            let mut codec = Origin::new(meta.value_desc.origin);
            bitpack::decode(&mut out, data, meta.value_desc.nbits, &mut codec)?;
        }
        Tag::Bitpfr => {
            let main_space = bitpack::space(nvalues, meta.value_desc.nbits);
            let (main, rest) = data.split_at(main_space);
            patched::decode_basic(&mut out, main, meta.value_desc.origin, meta.value_desc.nbits)?;

            let mut indices = vec![0u64; meta.noutliers];
            let mut values = vec![0u64; meta.noutliers];
            let rest = decode_outlier_stream(&mut indices, rest, &meta.outlier_index_desc)?;
            decode_outlier_stream(&mut values, rest, &meta.outlier_value_desc)?;

            let outliers = patched::Outliers { indices, values };
            patched::decode_patch(&mut out, meta.value_desc.origin, meta.value_desc.nbits, &outliers);
        }
    }
    Ok(out)
}

/// Returns the `index`-th value out of `blob` without decoding the rest of
/// it. Only supported for the random-access encodings (`naught`, `normal`,
/// `bitpck`, `bitfor`); `bitpfr` and the varint family require a linear scan
/// and are rejected.
pub fn fetch<T: Int>(blob: &[u8], index: usize) -> Result<T> {
    let (meta, header_len) = metadata::decode::<T>(blob)?;
    let data = &blob[padded(header_len)..];

    match meta.value_desc.encoding {
        Tag::Naught => Ok(meta.value_desc.origin),
        Tag::Normal => {
            let offset = index * (T::BITS / 8) as usize;
            let slice = data.get(offset..).ok_or_else(|| {
                CorruptInputSnafu {
                    msg: "fetch index past the end of a normal-encoded group".to_string(),
                }
                .build()
            })?;
            let mut out = [T::from_bits(0)];
            normal::decode(&mut out, slice)?;
            Ok(out[0])
        }
        Tag::Bitpck => {
            let mut codec = Zigzag::<T>::new();
            bitpack::fetch(data, index, meta.value_desc.nbits, &mut codec)
        }
        Tag::Bitfor => {
            let mut codec = Origin::new(meta.value_desc.origin);
            bitpack::fetch(data, index, meta.value_desc.nbits, &mut codec)
        }
        Tag::Varint | Tag::Varfor | Tag::Bitpfr => InvalidArgumentSnafu {
            msg: "fetch is not supported for varint, varfor or bitpfr encodings".to_string(),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roundtrip_dense_small_range() {
        let values: Vec<u32> = (0..20).collect();
        let blob = encode(&values).unwrap();
        let out = decode::<u32>(&blob, values.len()).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn roundtrip_constant() {
        let values = vec![42i32; 50];
        let blob = encode(&values).unwrap();
        assert_eq!(decode_metadata::<i32>(&blob).unwrap().value_desc.encoding, Tag::Naught);
        let out = decode::<i32>(&blob, values.len()).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn roundtrip_empty() {
        let values: Vec<i32> = vec![];
        let blob = encode(&values).unwrap();
        let out = decode::<i32>(&blob, 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn roundtrip_with_outliers() {
        let mut values: Vec<i64> = (0..64).map(|i| i % 8).collect();
        values[10] = 1 << 30;
        values[40] = (1 << 30) + 3;
        let blob = encode(&values).unwrap();
        assert_eq!(decode_metadata::<i64>(&blob).unwrap().value_desc.encoding, Tag::Bitpfr);
        let out = decode::<i64>(&blob, values.len()).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn fetch_matches_decode_for_bitpck() {
        let values: Vec<u32> = (100..228).collect();
        let blob = encode(&values).unwrap();
        let out = decode::<u32>(&blob, values.len()).unwrap();
        for i in 0..values.len() {
            assert_eq!(fetch::<u32>(&blob, i).unwrap(), out[i]);
        }
    }

    #[test]
    fn fetch_rejects_varint() {
        let values: Vec<i64> = vec![1, 1_000_000, -5_000_000, 42, 999_999_999];
        let blob = encode(&values).unwrap();
        assert!(matches!(
            decode_metadata::<i64>(&blob).unwrap().value_desc.encoding,
            Tag::Varint | Tag::Varfor
        ));
        assert!(fetch::<i64>(&blob, 0).is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_arbitrary_i32(values in proptest::collection::vec(any::<i32>(), 0..200)) {
            let blob = encode(&values).unwrap();
            let out = decode::<i32>(&blob, values.len()).unwrap();
            prop_assert_eq!(out, values);
        }

        #[test]
        fn roundtrip_arbitrary_u16(values in proptest::collection::vec(any::<u16>(), 0..300)) {
            let blob = encode(&values).unwrap();
            let out = decode::<u16>(&blob, values.len()).unwrap();
            prop_assert_eq!(out, values);
        }
    }
}
