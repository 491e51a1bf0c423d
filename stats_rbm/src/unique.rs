/*
* Licensed to Elasticsearch B.V. under one or more contributor
* license agreements. See the NOTICE file distributed with
* this work for additional information regarding copyright
* ownership. Elasticsearch B.V. licenses this file to you under
* the Apache License, Version 2.0 (the "License"); you may
* not use this file except in compliance with the License.
* You may obtain a copy of the License at
*
*  http://www.apache.org/licenses/LICENSE-2.0
*
* Unless required by applicable law or agreed to in writing,
* software distributed under the License is distributed on an
* "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
* KIND, either express or implied.  See the License for the
* specific language governing permissions and limitations
* under the License.
*/

//! # Unique slices along an axis
//!
//! Each slice of the array along the chosen axis is packed into a byte key. The packing
//! preserves the order of the elements, so sorting the keys sorts the slices
//! lexicographically.

use fxhash::FxHashMap;
use ndarray::prelude::*;
use ndarray::{Data, IxDyn};

use crate::errors::{RbmError, RbmResult};

/// Elements that can be packed into an order preserving comparison key.
pub trait PackKey: Clone {
    /// Appends the big endian, order preserving bytes of this element
    fn pack(&self, key: &mut Vec<u8>) -> RbmResult<()>;
}

impl PackKey for bool {
    fn pack(&self, key: &mut Vec<u8>) -> RbmResult<()> {
        key.push(*self as u8);
        Ok(())
    }
}

macro_rules! pack_unsigned {
    ( $($t:ty),* ) => {
        $(
        impl PackKey for $t {
            fn pack(&self, key: &mut Vec<u8>) -> RbmResult<()> {
                key.extend_from_slice(&self.to_be_bytes());
                Ok(())
            }
        }
        )*
    };
}

macro_rules! pack_signed {
    ( $($t:ty => $u:ty),* ) => {
        $(
        impl PackKey for $t {
            fn pack(&self, key: &mut Vec<u8>) -> RbmResult<()> {
                let flipped = (*self as $u) ^ (1 << (<$u>::BITS - 1));
                key.extend_from_slice(&flipped.to_be_bytes());
                Ok(())
            }
        }
        )*
    };
}

macro_rules! pack_float {
    ( $($t:ty => $u:ty),* ) => {
        $(
        impl PackKey for $t {
            fn pack(&self, key: &mut Vec<u8>) -> RbmResult<()> {
                if self.is_nan() {
                    return Err(RbmError::UnsupportedDtype(format!(
                        "{} slices containing NaN have no order",
                        stringify!($t)
                    )));
                }
                // -0.0 and 0.0 are the same value
                let bits = (*self + 0.0).to_bits();
                let sign = 1 << (<$u>::BITS - 1);
                let ordered: $u = if bits & sign != 0 { !bits } else { bits | sign };
                key.extend_from_slice(&ordered.to_be_bytes());
                Ok(())
            }
        }
        )*
    };
}

pack_unsigned!(u8, u16, u32, u64, usize);
pack_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64, isize => usize);
pack_float!(f32 => u32, f64 => u64);

/// The distinct slices of an array along an axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Unique<T, D: Dimension> {
    /// The distinct slices, sorted, stacked along the same axis as the input
    pub values: Array<T, D>,
    /// For each distinct slice, the index of its first occurrence in the input
    pub index: Vec<usize>,
    /// For each input slice, the index of its distinct slice in `values`
    pub inverse: Vec<usize>,
    /// How many times each distinct slice occurs
    pub counts: Vec<usize>,
}

impl<T, D: Dimension> Unique<T, D> {
    /// Number of distinct slices
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// If there were no slices at all
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Deduplicates the slices of `array` along `axis`.
///
/// For a 2d array `Axis(0)` gives the unique rows and `Axis(1)` the unique columns.
pub fn unique<T, S, D>(array: &ArrayBase<S, D>, axis: Axis) -> RbmResult<Unique<T, D>>
where
    T: PackKey,
    S: Data<Elem = T>,
    D: Dimension,
{
    let ndim = array.ndim();
    if axis.index() >= ndim {
        return Err(RbmError::InvalidAxis {
            axis: axis.index(),
            ndim,
        });
    }
    let mut moved = array.view().into_dyn();
    moved.swap_axes(0, axis.index());

    let keys = moved
        .outer_iter()
        .map(|slice| {
            let mut key = Vec::with_capacity(slice.len());
            for x in slice.iter() {
                x.pack(&mut key)?;
            }
            Ok(key)
        })
        .collect::<RbmResult<Vec<Vec<u8>>>>()?;

    let mut slots: FxHashMap<&[u8], usize> = FxHashMap::default();
    let mut firsts: Vec<usize> = Vec::new();
    let mut slot_counts: Vec<usize> = Vec::new();
    let mut slot_of = Vec::with_capacity(keys.len());
    for (i, key) in keys.iter().enumerate() {
        let slot = *slots.entry(&key[..]).or_insert_with(|| {
            firsts.push(i);
            slot_counts.push(0);
            firsts.len() - 1
        });
        slot_counts[slot] += 1;
        slot_of.push(slot);
    }

    let mut order: Vec<usize> = (0..firsts.len()).collect();
    order.sort_by(|a, b| keys[firsts[*a]].cmp(&keys[firsts[*b]]));
    let mut rank = vec![0; order.len()];
    for (r, slot) in order.iter().enumerate() {
        rank[*slot] = r;
    }

    let mut shape = moved.shape().to_vec();
    shape[0] = order.len();
    let mut data = Vec::with_capacity(shape.iter().product());
    for slot in order.iter() {
        data.extend(moved.index_axis(Axis(0), firsts[*slot]).iter().cloned());
    }
    let mut values = Array::from_shape_vec(IxDyn(&shape), data)?;
    values.swap_axes(0, axis.index());

    Ok(Unique {
        values: values.into_dimensionality::<D>()?,
        index: order.iter().map(|s| firsts[*s]).collect(),
        inverse: slot_of.iter().map(|s| rank[*s]).collect(),
        counts: order.iter().map(|s| slot_counts[*s]).collect(),
    })
}
