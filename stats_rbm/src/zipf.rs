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

//! Rank/frequency of the distinct slices of an array.

use ndarray::prelude::*;
use ndarray::Data;
use serde::{Deserialize, Serialize};

use crate::errors::RbmResult;
use crate::unique::{unique, PackKey};

/// The frequency of each distinct slice along `axis`, most frequent first, as a fraction of
/// the number of slices.
pub fn zipf<T, S, D>(array: &ArrayBase<S, D>, axis: Axis) -> RbmResult<Array1<f64>>
where
    T: PackKey,
    S: Data<Elem = T>,
    D: Dimension,
{
    let uniq = unique(array, axis)?;
    let total = array.len_of(axis) as f64;
    let mut counts = uniq.counts;
    counts.sort_unstable_by(|a, b| b.cmp(a));
    Ok(counts.iter().map(|c| *c as f64 / total).collect())
}

/// The arrays a log-log rank/frequency plot draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipfCurve {
    /// `1, 2, ..., n`
    pub ranks: Array1<f64>,
    /// Frequency at each rank
    pub frequencies: Array1<f64>,
}

impl ZipfCurve {
    /// Pairs frequencies (as returned by [`zipf`]) with their ranks. With `normalise` the
    /// frequencies are divided by the top one.
    pub fn new(frequencies: Array1<f64>, normalise: bool) -> ZipfCurve {
        let ranks = Array1::range(1.0, frequencies.len() as f64 + 1.0, 1.0);
        let frequencies = if normalise && !frequencies.is_empty() {
            let top = frequencies[0];
            frequencies / top
        } else {
            frequencies
        };
        ZipfCurve { ranks, frequencies }
    }

    /// Computes the curve straight from the data
    pub fn from_array<T, S, D>(array: &ArrayBase<S, D>, axis: Axis, normalise: bool) -> RbmResult<ZipfCurve>
    where
        T: PackKey,
        S: Data<Elem = T>,
        D: Dimension,
    {
        Ok(ZipfCurve::new(zipf(array, axis)?, normalise))
    }

    /// Rank and frequency pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ranks.iter().cloned().zip(self.frequencies.iter().cloned())
    }
}
