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

//! Picks the cheapest encoding for a sequence of values: three scans over
//! the data weighing `normal`, `bitpck`, `bitfor`, `varint` and `varfor`
//! against each other, then, for sequences of five or more, against
//! `bitpfr` at every bit width that could plausibly win.

use crate::bitpack;
use crate::int::Int;
use crate::metadata::{Descriptor, Metadata, Tag};
use crate::transform::{Offset, Origin, ValueCodec, Zigzag};
use crate::varint;

fn compare<T: Int>(best: &mut Descriptor<T>, encoding: Tag, metaspace: usize, dataspace: usize, origin: T, nbits: u32) {
    if dataspace + metaspace < best.dataspace + best.metaspace {
        *best = Descriptor {
            encoding,
            dataspace,
            metaspace,
            origin,
            nbits,
        };
    }
}

/// Chooses among the five basic (non-`bitpfr`) encodings. `values` must be
/// non-empty with `min != max` (the trivial cases are handled by the caller).
fn select_basic<T: Int>(values: &[T], min: T, max: T) -> Descriptor<T> {
    let nvalues = values.len();
    let mut best = Descriptor::normal(nvalues);

    // bitpck
    let umax = if T::SIGNED {
        min.zigzag_encode().max(max.zigzag_encode())
    } else {
        max.to_bits()
    };
    let nbits = u64::usedcount(umax).max(1);
    let dataspace = bitpack::space(nvalues, nbits);
    compare(&mut best, Tag::Bitpck, 1, dataspace, T::from_bits(0), nbits);

    // bitfor
    let range = max.wrapping_sub(min).to_bits();
    let nbits = u64::usedcount(range).max(1);
    let dataspace = bitpack::space(nvalues, nbits);
    let mut space_codec = Zigzag::<T>::new();
    let metaspace = 1 + varint::value_space(min, &mut space_codec);
    compare(&mut best, Tag::Bitfor, metaspace, dataspace, min, nbits);

    // varint / varfor: single pass over the data for both footprints.
    let mut vi_codec = Zigzag::<T>::new();
    let mut vf_codec = Origin::new(min);
    let mut vispace = 0usize;
    let mut vfspace = 0usize;
    for &v in values {
        vispace += varint::value_space(v, &mut vi_codec);
        vfspace += varint::value_space(v, &mut vf_codec);
    }
    let mut origin_space_codec = Zigzag::<T>::new();
    let metaspace = varint::value_space(min, &mut origin_space_codec);

    compare(&mut best, Tag::Varint, 0, vispace, T::from_bits(0), 0);
    compare(&mut best, Tag::Varfor, metaspace, vfspace, min, 0);

    best
}

/// Cost of encoding `noutliers` outlier values whose high bits range over
/// `[1, nbits_max - nbits]`, given the per-bit-width histogram of `(v -
/// min)`. Returns `(dataspace, as_bitpck)`.
fn outlier_value_cost(histogram: &[usize], nbits: u32, nbits_max: u32, noutliers: usize) -> (usize, bool) {
    let bitpck_cost = bitpack::space(noutliers, nbits_max - nbits);
    let mut varint_cost = 0usize;
    for nb in (nbits + 1)..=nbits_max {
        let count = histogram.get(nb as usize).copied().unwrap_or(0);
        if count > 0 {
            varint_cost += count * varint::nbits_space(nb - nbits);
        }
    }
    if bitpck_cost <= varint_cost {
        (bitpck_cost, true)
    } else {
        (varint_cost, false)
    }
}

/// Exact outlier-index cost for the candidate width `nbits` (Scan 3):
/// iterates the sequence, running every outlier's absolute index through the
/// `offset(step=1, taken_out=false)` transform, and returns `(dataspace,
/// as_bitpck)`.
fn outlier_index_cost<T: Int>(values: &[T], min: T, nbits: u32, noutliers: usize) -> (usize, bool, u32) {
    let mask = if nbits >= 64 { u64::MAX } else { (1u64 << nbits) - 1 };
    let mut index_codec = Offset::<u64>::new(0, 1, false);
    let mut maxbits = 0u32;
    let mut varspace = 0usize;
    for (i, &v) in values.iter().enumerate() {
        let u = v.wrapping_sub(min).to_bits();
        if u & !mask != 0 {
            let delta = index_codec.encode(i as u64);
            let used = u64::usedcount(delta);
            maxbits = maxbits.max(used);
            varspace += if used == 0 { 1 } else { varint::nbits_space(used) };
        }
    }
    let indnbits = maxbits.max(1);
    let bitpck_cost = bitpack::space(noutliers, indnbits);
    if bitpck_cost <= varspace {
        (bitpck_cost, true, indnbits)
    } else {
        (varspace, false, indnbits)
    }
}

/// Runs the full selector over `values`, returning the metadata that
/// `group::encode` should frame the data with.
pub fn select<T: Int>(values: &[T]) -> Metadata<T> {
    let nvalues = values.len();
    if nvalues == 0 {
        return Metadata::basic(Descriptor {
            encoding: Tag::Normal,
            dataspace: 0,
            metaspace: 0,
            origin: T::from_bits(0),
            nbits: 0,
        });
    }

    let mut min = values[0];
    let mut max = values[0];
    for &v in &values[1..] {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }

    if min == max {
        let mut codec = Zigzag::<T>::new();
        let metaspace = varint::value_space(min, &mut codec);
        return Metadata::basic(Descriptor {
            encoding: Tag::Naught,
            dataspace: 0,
            metaspace,
            origin: min,
            nbits: 0,
        });
    }

    let best = select_basic(values, min, max);
    let mut best_cost = best.dataspace + best.metaspace;
    let mut best_meta = Metadata::basic(best);

    if nvalues >= 5 {
        let nbits_max = u64::usedcount(max.wrapping_sub(min).to_bits());
        let mut histogram = vec![0usize; nbits_max as usize + 1];
        for &v in values {
            let u = v.wrapping_sub(min).to_bits();
            histogram[u64::usedcount(u) as usize] += 1;
        }

        // basic_metaspace (nbits byte + origin varint) + extra_metaspace
        // (index extra + value extra bytes + noutliers varint) — tag byte
        // excluded throughout, same as `select_basic`'s candidates, since
        // it's the same one byte for every encoding and cancels out.
        let mut origin_space_codec = Zigzag::<T>::new();
        let origin_space = varint::value_space(min, &mut origin_space_codec);
        let basic_metaspace = 1 + origin_space;

        let mut running_outliers = nvalues;
        for nbits in 1..nbits_max {
            running_outliers -= histogram[nbits as usize];
            if running_outliers == 0 {
                continue;
            }

            let mut noutliers_codec = Origin::new(0u64);
            let noutliers_space = varint::value_space(running_outliers as u64, &mut noutliers_codec);
            let extra_metaspace = 2 + noutliers_space;
            let bitpfr_metaspace = basic_metaspace + extra_metaspace;

            let basic_data = bitpack::space(nvalues, nbits);
            let (value_cost, value_is_bitpck) = outlier_value_cost(&histogram, nbits, nbits_max, running_outliers);

            // Lower bound on the index cost before paying for an exact scan.
            let index_lower_bound = bitpack::space(running_outliers, 1).min(bitpack::space(nvalues, 1));
            if basic_data + bitpfr_metaspace + value_cost + index_lower_bound >= best_cost {
                continue;
            }

            let (index_cost, index_is_bitpck, indnbits) = outlier_index_cost(values, min, nbits, running_outliers);
            let required = basic_data + bitpfr_metaspace + value_cost + index_cost;

            if required < best_cost {
                best_cost = required;
                best_meta = Metadata {
                    value_desc: Descriptor {
                        encoding: Tag::Bitpfr,
                        dataspace: basic_data,
                        metaspace: 0,
                        origin: min,
                        nbits,
                    },
                    noutliers: running_outliers,
                    outlier_value_desc: Descriptor {
                        encoding: if value_is_bitpck { Tag::Bitpck } else { Tag::Varint },
                        dataspace: value_cost,
                        metaspace: 0,
                        origin: 0,
                        nbits: if value_is_bitpck { nbits_max - nbits } else { 0 },
                    },
                    outlier_index_desc: Descriptor {
                        encoding: if index_is_bitpck { Tag::Bitpck } else { Tag::Varint },
                        dataspace: index_cost,
                        metaspace: 0,
                        origin: 0,
                        nbits: if index_is_bitpck { indnbits } else { 0 },
                    },
                };
            }
        }
    }

    best_meta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selects_normal() {
        let meta = select::<i32>(&[]);
        assert_eq!(meta.value_desc.encoding, Tag::Normal);
    }

    #[test]
    fn constant_selects_naught() {
        let values = vec![7i32; 10];
        let meta = select(&values);
        assert_eq!(meta.value_desc.encoding, Tag::Naught);
        assert_eq!(meta.value_desc.origin, 7);
    }

    #[test]
    fn small_dense_range_selects_bitpck() {
        let values: Vec<u32> = (0..20).collect();
        let meta = select(&values);
        assert_eq!(meta.value_desc.encoding, Tag::Bitpck);
    }

    #[test]
    fn shifted_dense_range_selects_bitfor() {
        let values: Vec<i32> = (1_000_000..1_000_020).collect();
        let meta = select(&values);
        assert_eq!(meta.value_desc.encoding, Tag::Bitfor);
        assert_eq!(meta.value_desc.origin, 1_000_000);
    }

    #[test]
    fn sparse_values_select_varint() {
        let values: Vec<i64> = vec![1, 1_000_000, -5_000_000, 42, 999_999_999];
        let meta = select(&values);
        assert!(matches!(meta.value_desc.encoding, Tag::Varint | Tag::Varfor));
    }

    #[test]
    fn dense_with_rare_outliers_selects_bitpfr() {
        let mut values: Vec<i64> = (0..64).map(|i| i % 8).collect();
        values[10] = 1 << 30;
        values[40] = (1 << 30) + 3;
        let meta = select(&values);
        assert_eq!(meta.value_desc.encoding, Tag::Bitpfr);
        assert_eq!(meta.noutliers, 2);
    }

    #[test]
    fn selector_is_deterministic() {
        let values: Vec<i32> = vec![3, -9, 100, 42, 7, -2, 500, 13, 0, 256];
        let a = select(&values);
        let b = select(&values);
        assert_eq!(a.value_desc.encoding, b.value_desc.encoding);
        assert_eq!(a.value_desc.origin, b.value_desc.origin);
        assert_eq!(a.value_desc.nbits, b.value_desc.nbits);
    }
}
