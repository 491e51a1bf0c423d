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

//! # Exact pattern probabilities
//!
//! Log probabilities normalized by the exact partition function, for visible patterns
//! (hidden layer summed out) and for full joint states.

use ndarray::prelude::*;

use crate::errors::{RbmError, RbmResult};
use crate::partition::{exact_log_z, negative_energy, unnormalized_log_prob};
use crate::unique::unique;
use core_rbm::Strategy;

/// Exact log probability of each visible pattern (one per row), with the hidden layer
/// summed out. The weights are shaped `(nvis, nhid)`.
pub fn pattern_log_prob(
    patterns: ArrayView2<bool>,
    visbias: ArrayView1<f64>,
    hidbias: ArrayView1<f64>,
    weights: ArrayView2<f64>,
    strategy: Strategy,
) -> RbmResult<Array1<f64>> {
    let log_z = exact_log_z(visbias, hidbias, weights, strategy)?;
    let mut log_probs = unnormalized_log_prob(patterns, weights, visbias, hidbias)?;
    log_probs -= log_z;
    Ok(log_probs)
}

/// Exact log probability of joint states, row `i` of `visible` paired with row `i` of `hidden`.
pub fn joint_log_prob(
    visible: ArrayView2<bool>,
    hidden: ArrayView2<bool>,
    visbias: ArrayView1<f64>,
    hidbias: ArrayView1<f64>,
    weights: ArrayView2<f64>,
    strategy: Strategy,
) -> RbmResult<Array1<f64>> {
    if visible.nrows() != hidden.nrows() {
        return Err(RbmError::shape_mismatch(
            "visible and hidden state counts",
            visible.nrows(),
            hidden.nrows(),
        ));
    }
    if visible.ncols() != visbias.len() {
        return Err(RbmError::shape_mismatch(
            "visible state length",
            visbias.len(),
            visible.ncols(),
        ));
    }
    if hidden.ncols() != hidbias.len() {
        return Err(RbmError::shape_mismatch(
            "hidden state length",
            hidbias.len(),
            hidden.ncols(),
        ));
    }
    let log_z = exact_log_z(visbias, hidbias, weights, strategy)?;
    let mut v_buffer = vec![false; visbias.len()];
    let mut h_buffer = vec![false; hidbias.len()];
    let log_probs = visible
        .outer_iter()
        .zip(hidden.outer_iter())
        .map(|(v, h)| {
            v_buffer.iter_mut().zip(v.iter()).for_each(|(b, x)| *b = *x);
            h_buffer.iter_mut().zip(h.iter()).for_each(|(b, x)| *b = *x);
            negative_energy(&v_buffer, &h_buffer, visbias, hidbias, weights) - log_z
        })
        .collect();
    Ok(log_probs)
}

/// The distinct patterns of a data sample (one observation per row, sorted) and the log of
/// their empirical frequency. A sample without observations has no frequencies.
pub fn data_pattern_log_prob(data: ArrayView2<bool>) -> RbmResult<(Array2<bool>, Array1<f64>)> {
    if data.nrows() == 0 {
        return Err(RbmError::EmptySample { observations: 0 });
    }
    let uniq = unique(&data, Axis(0))?;
    let total = data.nrows() as f64;
    let log_freqs = uniq
        .counts
        .iter()
        .map(|&c| (c as f64).ln() - total.ln())
        .collect();
    Ok((uniq.values, log_freqs))
}
