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

//! Wire framing for the metadata that precedes every encoded data stream:
//! the encoding tag plus whatever parameters that encoding needs to decode
//! (origin, bit width, outlier descriptors).

use crate::error::{CorruptInputSnafu, InvalidArgumentSnafu, Result};
use crate::int::Int;
use crate::transform::{Origin, Zigzag};
use crate::varint;
use snafu::ensure;

/// Which codec a value stream (or outlier side-channel) is encoded with.
/// Numeric values are part of the wire format and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Naught = 0,
    Normal = 1,
    Varint = 2,
    Varfor = 3,
    Bitpck = 4,
    Bitfor = 5,
    Bitpfr = 6,
}

impl Tag {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(b: u8) -> Result<Self> {
        Ok(match b {
            0 => Tag::Naught,
            1 => Tag::Normal,
            2 => Tag::Varint,
            3 => Tag::Varfor,
            4 => Tag::Bitpck,
            5 => Tag::Bitfor,
            6 => Tag::Bitpfr,
            _ => {
                return CorruptInputSnafu {
                    msg: format!("unknown encoding tag {b}"),
                }
                .fail()
            }
        })
    }
}

/// Parameters for one of the six "basic" (non-`bitpfr`) encodings, or for a
/// `bitpfr` outlier side-channel (which is always basic: `varint` or
/// `bitpck`).
#[derive(Debug, Clone, Copy)]
pub struct Descriptor<T: Int> {
    pub encoding: Tag,
    pub dataspace: usize,
    pub metaspace: usize,
    pub origin: T,
    pub nbits: u32,
}

impl<T: Int> Descriptor<T> {
    pub fn normal(nvalues: usize) -> Self {
        Self {
            encoding: Tag::Normal,
            dataspace: nvalues * (T::BITS / 8) as usize,
            metaspace: 0,
            origin: T::from_bits(0),
            nbits: 0,
        }
    }
}

/// Full metadata for one encoded value stream: the chosen basic encoding,
/// plus, when it is `bitpfr`, the outlier side-channel's own descriptors.
#[derive(Debug, Clone)]
pub struct Metadata<T: Int> {
    pub value_desc: Descriptor<T>,
    pub noutliers: usize,
    pub outlier_index_desc: Descriptor<u64>,
    pub outlier_value_desc: Descriptor<u64>,
}

impl<T: Int> Metadata<T> {
    /// Metadata for a plain (non-`bitpfr`) encoding.
    pub fn basic(value_desc: Descriptor<T>) -> Self {
        Self {
            value_desc,
            noutliers: 0,
            outlier_index_desc: Descriptor {
                encoding: Tag::Varint,
                dataspace: 0,
                metaspace: 0,
                origin: 0,
                nbits: 0,
            },
            outlier_value_desc: Descriptor {
                encoding: Tag::Varint,
                dataspace: 0,
                metaspace: 0,
                origin: 0,
                nbits: 0,
            },
        }
    }

    /// Total bytes the metadata itself occupies on the wire (not counting
    /// the data payload or the 8-byte alignment pad).
    pub fn metaspace(&self) -> usize {
        if self.value_desc.encoding != Tag::Bitpfr {
            return 1 + self.value_desc.metaspace;
        }

        let mut origin_codec = Zigzag::<T>::new();
        let origin_space = varint::value_space(self.value_desc.origin, &mut origin_codec);
        let mut noutliers_codec = Origin::new(0u64);
        let noutliers_space = varint::value_space(self.noutliers as u64, &mut noutliers_codec);

        // tag + origin varint + nbits byte + noutliers varint + index extra + value extra
        1 + origin_space + 1 + noutliers_space + 1 + 1
    }
}

/// Writes the tag byte and, for basic encodings, the parameters that follow
/// it (origin and/or bit width per the encoding).
pub fn encode_basic<T: Int>(dst: &mut Vec<u8>, desc: &Descriptor<T>) {
    dst.push(desc.encoding.to_u8());
    match desc.encoding {
        Tag::Naught | Tag::Varfor => {
            let mut codec = Zigzag::<T>::new();
            varint::value_encode(dst, desc.origin, &mut codec);
        }
        Tag::Normal | Tag::Varint => {}
        Tag::Bitpck => {
            dst.push(desc.nbits as u8);
        }
        Tag::Bitfor => {
            let mut codec = Zigzag::<T>::new();
            varint::value_encode(dst, desc.origin, &mut codec);
            dst.push(desc.nbits as u8);
        }
        Tag::Bitpfr => unreachable!("bitpfr is not a basic encoding"),
    }
}

/// Inverse of [`encode_basic`]: reads the tag and its parameters, returning
/// the descriptor and the number of bytes consumed.
pub fn decode_basic<T: Int>(src: &[u8]) -> Result<(Descriptor<T>, usize)> {
    ensure!(
        !src.is_empty(),
        CorruptInputSnafu {
            msg: "truncated metadata: missing tag byte".to_string()
        }
    );
    let encoding = Tag::from_u8(src[0])?;
    let mut pos = 1usize;
    let (origin, nbits) = match encoding {
        Tag::Naught | Tag::Varfor => {
            let mut codec = Zigzag::<T>::new();
            let (origin, consumed) = varint::value_decode(&src[pos..], &mut codec)?;
            pos += consumed;
            (origin, 0)
        }
        Tag::Normal | Tag::Varint => (T::from_bits(0), 0),
        Tag::Bitpck => {
            ensure!(
                pos < src.len(),
                CorruptInputSnafu {
                    msg: "truncated metadata: missing nbits byte".to_string()
                }
            );
            let nbits = src[pos] as u32;
            pos += 1;
            (T::from_bits(0), nbits)
        }
        Tag::Bitfor => {
            let mut codec = Zigzag::<T>::new();
            let (origin, consumed) = varint::value_decode(&src[pos..], &mut codec)?;
            pos += consumed;
            ensure!(
                pos < src.len(),
                CorruptInputSnafu {
                    msg: "truncated metadata: missing nbits byte".to_string()
                }
            );
            let nbits = src[pos] as u32;
            pos += 1;
            (origin, nbits)
        }
        Tag::Bitpfr => unreachable!("bitpfr is not a basic encoding"),
    };
    Ok((
        Descriptor {
            encoding,
            dataspace: 0,
            metaspace: 0,
            origin,
            nbits,
        },
        pos,
    ))
}

/// `extra` byte for an outlier descriptor: `0` means varint, any non-zero
/// value is the bit-pack width.
fn encode_extra(dst: &mut Vec<u8>, desc: &Descriptor<u64>) {
    match desc.encoding {
        Tag::Varint => dst.push(0),
        Tag::Bitpck => {
            debug_assert!(desc.nbits > 0 && desc.nbits <= 255);
            dst.push(desc.nbits as u8);
        }
        _ => unreachable!("outlier descriptors are only ever varint or bitpck"),
    }
}

fn decode_extra(src: &[u8]) -> Result<(Tag, u32)> {
    ensure!(
        !src.is_empty(),
        CorruptInputSnafu {
            msg: "truncated metadata: missing outlier extra byte".to_string()
        }
    );
    Ok(if src[0] == 0 {
        (Tag::Varint, 0)
    } else {
        (Tag::Bitpck, src[0] as u32)
    })
}

/// Encodes full metadata (tag, parameters, and for `bitpfr` the outlier
/// descriptor bytes) to `dst`.
pub fn encode<T: Int>(dst: &mut Vec<u8>, meta: &Metadata<T>) {
    if meta.value_desc.encoding != Tag::Bitpfr {
        encode_basic(dst, &meta.value_desc);
        return;
    }

    dst.push(Tag::Bitpfr.to_u8());
    let mut codec = Zigzag::<T>::new();
    varint::value_encode(dst, meta.value_desc.origin, &mut codec);
    dst.push(meta.value_desc.nbits as u8);

    let mut noutliers_codec = crate::transform::Origin::new(0u64);
    varint::value_encode(dst, meta.noutliers as u64, &mut noutliers_codec);

    encode_extra(dst, &meta.outlier_index_desc);
    encode_extra(dst, &meta.outlier_value_desc);
}

/// Inverse of [`encode`]: parses full metadata, returning it and the number
/// of bytes consumed.
pub fn decode<T: Int>(src: &[u8]) -> Result<(Metadata<T>, usize)> {
    ensure!(
        !src.is_empty(),
        CorruptInputSnafu {
            msg: "truncated metadata: missing tag byte".to_string()
        }
    );
    if Tag::from_u8(src[0])? != Tag::Bitpfr {
        let (value_desc, pos) = decode_basic(src)?;
        return Ok((Metadata::basic(value_desc), pos));
    }

    let mut pos = 1usize;
    let mut origin_codec = Zigzag::<T>::new();
    let (origin, consumed) = varint::value_decode(&src[pos..], &mut origin_codec)?;
    pos += consumed;

    ensure!(
        pos < src.len(),
        CorruptInputSnafu {
            msg: "truncated metadata: missing nbits byte".to_string()
        }
    );
    let nbits = src[pos] as u32;
    pos += 1;

    let mut noutliers_codec = Origin::new(0u64);
    let (noutliers, consumed) = varint::value_decode(&src[pos..], &mut noutliers_codec)?;
    pos += consumed;

    let (index_encoding, index_nbits) = decode_extra(&src[pos..])?;
    pos += 1;
    let (value_encoding, value_nbits) = decode_extra(&src[pos..])?;
    pos += 1;

    ensure!(
        nbits >= 1 && nbits <= T::BITS,
        InvalidArgumentSnafu {
            msg: format!("bitpfr nbits {nbits} out of range for a {}-bit type", T::BITS)
        }
    );

    Ok((
        Metadata {
            value_desc: Descriptor {
                encoding: Tag::Bitpfr,
                // Dataspace depends on `nvalues`, which isn't part of the
                // wire format; the caller (`group::decode`) recomputes it.
                dataspace: 0,
                metaspace: 0,
                origin,
                nbits,
            },
            noutliers: noutliers as usize,
            outlier_index_desc: Descriptor {
                encoding: index_encoding,
                dataspace: 0,
                metaspace: 0,
                origin: 0,
                nbits: index_nbits,
            },
            outlier_value_desc: Descriptor {
                encoding: value_encoding,
                dataspace: 0,
                metaspace: 0,
                origin: 0,
                nbits: value_nbits,
            },
        },
        pos,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naught_roundtrip() {
        let desc: Descriptor<i32> = Descriptor {
            encoding: Tag::Naught,
            dataspace: 0,
            metaspace: 0,
            origin: 42,
            nbits: 0,
        };
        let meta = Metadata::basic(desc);
        let mut buf = Vec::new();
        encode(&mut buf, &meta);

        let (decoded, consumed) = decode::<i32>(&buf).unwrap();
        assert_eq!(decoded.value_desc.encoding, Tag::Naught);
        assert_eq!(decoded.value_desc.origin, 42);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn bitfor_roundtrip() {
        let desc: Descriptor<i32> = Descriptor {
            encoding: Tag::Bitfor,
            dataspace: 0,
            metaspace: 0,
            origin: -100,
            nbits: 9,
        };
        let meta = Metadata::basic(desc);
        let mut buf = Vec::new();
        encode(&mut buf, &meta);

        let (decoded, consumed) = decode::<i32>(&buf).unwrap();
        assert_eq!(decoded.value_desc.encoding, Tag::Bitfor);
        assert_eq!(decoded.value_desc.origin, -100);
        assert_eq!(decoded.value_desc.nbits, 9);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn bitpfr_roundtrip() {
        let meta: Metadata<i64> = Metadata {
            value_desc: Descriptor {
                encoding: Tag::Bitpfr,
                dataspace: 0,
                metaspace: 0,
                origin: 10,
                nbits: 4,
            },
            noutliers: 3,
            outlier_index_desc: Descriptor {
                encoding: Tag::Bitpck,
                dataspace: 0,
                metaspace: 0,
                origin: 0,
                nbits: 2,
            },
            outlier_value_desc: Descriptor {
                encoding: Tag::Varint,
                dataspace: 0,
                metaspace: 0,
                origin: 0,
                nbits: 0,
            },
        };
        let mut buf = Vec::new();
        encode(&mut buf, &meta);

        let (decoded, consumed) = decode::<i64>(&buf).unwrap();
        assert_eq!(decoded.value_desc.encoding, Tag::Bitpfr);
        assert_eq!(decoded.value_desc.origin, 10);
        assert_eq!(decoded.value_desc.nbits, 4);
        assert_eq!(decoded.noutliers, 3);
        assert_eq!(decoded.outlier_index_desc.encoding, Tag::Bitpck);
        assert_eq!(decoded.outlier_index_desc.nbits, 2);
        assert_eq!(decoded.outlier_value_desc.encoding, Tag::Varint);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn unknown_tag_is_corrupt_input() {
        let err = decode_basic::<i32>(&[7]).unwrap_err();
        assert!(matches!(err, crate::error::Error::CorruptInput { .. }));
    }
}
