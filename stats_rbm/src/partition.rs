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

//! # Exact partition function
//!
//! Given the state `p` of one layer, the units of the other layer are independent, so
//! that layer can be summed out analytically:
//!
//! ```text
//! log P*(p) = p·b_p + Σ_j softplus(b_j + (p W)_j)
//! ```
//!
//! The partition function is then the sum of `P*` over every state of the enumerated
//! layer. We always enumerate the smaller of the two layers, transposing the couplings
//! when the roles swap, so the cost is `2^min(nvis, nhid)` terms. This is only feasible
//! for small layers, a few tens of units at the very most.

use log::debug;
use ndarray::prelude::*;
use ndarray::Zip;

use crate::errors::{RbmError, RbmResult};
use crate::params::check_weights;
use core_rbm::{BinaryPatterns, CodesToVec, PatternCode, Strategy, MAX_PATTERN_UNITS};

/// `ln(1 + e^x)` without overflowing for large `x`.
#[inline]
pub fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

/// Stable `ln Σ e^x_i`. Empty input is `ln 0 = -inf`.
pub fn log_sum_exp(values: ArrayView1<f64>) -> f64 {
    let max_val = values.fold(f64::NEG_INFINITY, |m, &x| m.max(x));
    if max_val.is_infinite() {
        return max_val;
    }
    let sum: f64 = values.iter().map(|&x| (x - max_val).exp()).sum();
    max_val + sum.ln()
}

/// Running version of [`log_sum_exp`]. Holds the current maximum and the sum of
/// exponentials relative to it, so it can absorb one term at a time.
#[derive(Debug, Clone, Copy)]
pub struct LogSumExp {
    max_val: f64,
    scaled_sum: f64,
}

impl Default for LogSumExp {
    fn default() -> Self {
        LogSumExp {
            max_val: f64::NEG_INFINITY,
            scaled_sum: 0.0,
        }
    }
}

impl LogSumExp {
    /// The empty sum
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `e^x` to the sum
    pub fn add(&mut self, x: f64) {
        if x == f64::NEG_INFINITY {
            return;
        }
        if x > self.max_val {
            self.scaled_sum = self.scaled_sum * (self.max_val - x).exp() + 1.0;
            self.max_val = x;
        } else {
            self.scaled_sum += (x - self.max_val).exp();
        }
    }

    /// `ln` of everything added so far
    pub fn value(&self) -> f64 {
        if self.max_val.is_infinite() {
            self.max_val
        } else {
            self.max_val + self.scaled_sum.ln()
        }
    }
}

impl Extend<f64> for LogSumExp {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        iter.into_iter().for_each(|x| self.add(x));
    }
}

/// Converts boolean patterns into a 0/1 matrix.
pub fn patterns_to_f64(patterns: ArrayView2<bool>) -> Array2<f64> {
    patterns.mapv(|b| if b { 1.0 } else { 0.0 })
}

/// Every state of a layer with `units` units as rows of a boolean matrix, in cartesian
/// product order of `[true, false]`. This is `2^units` rows.
pub fn all_patterns(units: usize) -> RbmResult<Array2<bool>> {
    let codes: Vec<PatternCode> = BinaryPatterns::new(units)
        .ok_or(RbmError::EnumerationTooLarge { units })?
        .collect();
    Ok(Array2::from_shape_vec(
        (codes.len(), units),
        codes.to_flat_bools(),
    )?)
}

/// Unnormalized log probability of each row of `patterns`, with the other layer summed out.
///
/// The couplings are oriented `(pattern units, marginalized units)`. For visible patterns
/// this is the weight matrix as stored; for hidden patterns it is its transpose.
pub fn unnormalized_log_prob(
    patterns: ArrayView2<bool>,
    couplings: ArrayView2<f64>,
    pattern_bias: ArrayView1<f64>,
    marginal_bias: ArrayView1<f64>,
) -> RbmResult<Array1<f64>> {
    check_weights(pattern_bias, marginal_bias, couplings)?;
    if patterns.ncols() != pattern_bias.len() {
        return Err(RbmError::shape_mismatch(
            "pattern length against its bias",
            pattern_bias.len(),
            patterns.ncols(),
        ));
    }
    let p = patterns_to_f64(patterns);
    let mut r = p.dot(&couplings);
    r += &marginal_bias;
    let mut result = r.mapv(softplus).sum_axis(Axis(1));
    result += &p.dot(&pattern_bias);
    Ok(result)
}

/// The single pattern version of [`unnormalized_log_prob`], reusing `field` as scratch
/// space for the input to the marginalized units. No shape checks, callers validate once.
fn unnormalized_code_log_prob(
    code: PatternCode,
    couplings: ArrayView2<f64>,
    pattern_bias: ArrayView1<f64>,
    marginal_bias: ArrayView1<f64>,
    field: &mut Array1<f64>,
) -> f64 {
    field.assign(&marginal_bias);
    let mut linear = 0.0;
    for (i, unit) in code.iter().enumerate() {
        if unit {
            *field += &couplings.row(i);
            linear += pattern_bias[i];
        }
    }
    field.iter().map(|&x| softplus(x)).sum::<f64>() + linear
}

/// Natural log of the partition function of an RBM.
///
/// The weights are shaped `(bias1.len(), bias2.len())`. Which layer is called the first is
/// irrelevant: `exact_log_z(b1, b2, W) == exact_log_z(b2, b1, W.t())`.
///
/// Both strategies reduce with a log-sum-exp, so they are equally stable:
/// * [`Strategy::Vectorized`] materializes the `2^n x n` pattern matrix and evaluates every
///   pattern in one batch.
/// * [`Strategy::Serial`] walks the patterns one at a time with a running log-sum-exp and
///   needs `O(n)` extra memory.
pub fn exact_log_z(
    bias1: ArrayView1<f64>,
    bias2: ArrayView1<f64>,
    weights: ArrayView2<f64>,
    strategy: Strategy,
) -> RbmResult<f64> {
    check_weights(bias1, bias2, weights)?;
    let (pattern_bias, marginal_bias, couplings) = if bias1.len() <= bias2.len() {
        (bias1.reborrow(), bias2.reborrow(), weights.reborrow())
    } else {
        debug!(
            "Enumerating over the second layer, {} < {} units",
            bias2.len(),
            bias1.len()
        );
        (bias2.reborrow(), bias1.reborrow(), weights.reborrow().reversed_axes())
    };
    let units = pattern_bias.len();
    if units > MAX_PATTERN_UNITS {
        return Err(RbmError::EnumerationTooLarge { units });
    }
    debug!(
        "Computing the {} log partition function over 2^{} patterns",
        strategy, units
    );

    match strategy {
        Strategy::Vectorized => {
            let patterns = all_patterns(units)?;
            let log_weights =
                unnormalized_log_prob(patterns.view(), couplings, pattern_bias, marginal_bias)?;
            Ok(log_sum_exp(log_weights.view()))
        }
        Strategy::Serial => {
            let mut field = Array1::zeros(marginal_bias.len());
            let mut lse = LogSumExp::new();
            let patterns =
                BinaryPatterns::new(units).ok_or(RbmError::EnumerationTooLarge { units })?;
            for code in patterns {
                lse.add(unnormalized_code_log_prob(
                    code,
                    couplings,
                    pattern_bias,
                    marginal_bias,
                    &mut field,
                ));
            }
            Ok(lse.value())
        }
    }
}

/// Log partition function by summing `exp(-E(v, h))` over every joint state. This costs
/// `2^(nvis + nhid)` energy evaluations and exists as ground truth for the marginalized
/// computation.
pub fn log_z_brute_force(
    visbias: ArrayView1<f64>,
    hidbias: ArrayView1<f64>,
    weights: ArrayView2<f64>,
) -> RbmResult<f64> {
    check_weights(visbias, hidbias, weights)?;
    let nvis = visbias.len();
    let units = nvis + hidbias.len();
    let patterns = BinaryPatterns::new(units).ok_or(RbmError::EnumerationTooLarge { units })?;
    let mut state = vec![false; units];
    let mut lse = LogSumExp::new();
    for code in patterns {
        code.fill(&mut state);
        let (visible, hidden) = state.split_at(nvis);
        lse.add(negative_energy(visible, hidden, visbias, hidbias, weights));
    }
    Ok(lse.value())
}

/// `-E(v, h) = v·a + h·b + v W h`
pub(crate) fn negative_energy(
    visible: &[bool],
    hidden: &[bool],
    visbias: ArrayView1<f64>,
    hidbias: ArrayView1<f64>,
    weights: ArrayView2<f64>,
) -> f64 {
    let mut total = 0.0;
    for (i, &v) in visible.iter().enumerate() {
        if v {
            total += visbias[i];
            Zip::from(weights.row(i))
                .and(hidden)
                .for_each(|&w, &h| {
                    if h {
                        total += w
                    }
                });
        }
    }
    total
        + hidden
            .iter()
            .zip(hidbias.iter())
            .filter(|(h, _)| **h)
            .map(|(_, b)| b)
            .sum::<f64>()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::params::RbmParams;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn softplus_is_stable() {
        assert_approx_eq!(softplus(0.0), 2.0f64.ln());
        assert_approx_eq!(softplus(1000.0), 1000.0);
        assert_approx_eq!(softplus(-1000.0), 0.0);
        assert_approx_eq!(softplus(1.3), (1.0 + 1.3f64.exp()).ln());
    }

    #[test]
    fn log_sum_exp_sanity() {
        let values = array![0.0, 0.0, 0.0, 0.0];
        assert_approx_eq!(log_sum_exp(values.view()), 4.0f64.ln());
        let values = array![1000.0, 1000.0];
        assert_approx_eq!(log_sum_exp(values.view()), 1000.0 + 2.0f64.ln());
        let empty: Array1<f64> = Array1::zeros(0);
        assert_eq!(log_sum_exp(empty.view()), f64::NEG_INFINITY);
    }

    #[test]
    fn running_log_sum_exp_matches_batch() {
        let values = array![-3.0, 800.0, 2.5, 799.0, -1000.0, f64::NEG_INFINITY];
        let mut lse = LogSumExp::new();
        lse.extend(values.iter().cloned());
        assert_approx_eq!(lse.value(), log_sum_exp(values.view()));
        assert_eq!(LogSumExp::new().value(), f64::NEG_INFINITY);
    }

    #[test]
    fn all_patterns_shape() {
        let patterns = all_patterns(3).unwrap();
        assert_eq!(patterns.dim(), (8, 3));
        assert_eq!(patterns.row(0), array![true, true, true]);
        assert_eq!(patterns.row(7), array![false, false, false]);
        assert!(matches!(
            all_patterns(MAX_PATTERN_UNITS + 1),
            Err(RbmError::EnumerationTooLarge { .. })
        ));
    }

    #[test]
    fn uncoupled_log_z() {
        let params = RbmParams::zeros(2, 1);
        let brute = log_z_brute_force(
            params.visbias.view(),
            params.hidbias.view(),
            params.weights.view(),
        )
        .unwrap();
        assert_approx_eq!(brute, 8.0f64.ln());
        assert_approx_eq!(params.log_z(Strategy::Vectorized).unwrap(), brute);
        assert_approx_eq!(params.log_z(Strategy::Serial).unwrap(), brute);
    }

    #[test]
    fn biased_uncoupled_log_z() {
        // Independent units, Z factorizes into (1 + e^b) per unit.
        let params = RbmParams::new(array![0.5, -1.0], array![2.0], Array2::zeros((2, 1))).unwrap();
        let expected = softplus(0.5) + softplus(-1.0) + softplus(2.0);
        assert_approx_eq!(params.log_z(Strategy::Vectorized).unwrap(), expected);
        assert_approx_eq!(params.log_z(Strategy::Serial).unwrap(), expected);
    }

    #[test]
    fn strategies_agree_with_brute_force() {
        let mut rng = SmallRng::seed_from_u64(1234);
        for &(nvis, nhid) in &[(1, 1), (3, 2), (2, 5), (4, 4), (6, 3)] {
            let params = RbmParams::random(nvis, nhid, 1.0, &mut rng);
            let brute = log_z_brute_force(
                params.visbias.view(),
                params.hidbias.view(),
                params.weights.view(),
            )
            .unwrap();
            assert_approx_eq!(params.log_z(Strategy::Vectorized).unwrap(), brute, 1e-9);
            assert_approx_eq!(params.log_z(Strategy::Serial).unwrap(), brute, 1e-9);
        }
    }

    #[test]
    fn orientation_symmetry() {
        let mut rng = SmallRng::seed_from_u64(99);
        let params = RbmParams::random(5, 3, 0.7, &mut rng);
        let t = params.transposed();
        for &strategy in &[Strategy::Vectorized, Strategy::Serial] {
            assert_approx_eq!(
                params.log_z(strategy).unwrap(),
                t.log_z(strategy).unwrap(),
                1e-10
            );
        }
    }

    #[test]
    fn either_layer_first() {
        let short = array![0.3, -0.2];
        let long = array![0.1, 0.4, -0.5];
        let weights = array![[0.2, -0.1, 0.7], [0.5, 0.3, -0.4]];
        for &strategy in &[Strategy::Vectorized, Strategy::Serial] {
            let forward =
                exact_log_z(short.view(), long.view(), weights.view(), strategy).unwrap();
            let backward =
                exact_log_z(long.view(), short.view(), weights.t(), strategy).unwrap();
            assert_approx_eq!(forward, backward, 1e-12);
        }
    }

    #[test]
    fn large_parameters_do_not_overflow() {
        let params = RbmParams::new(
            array![400.0, 400.0],
            array![400.0],
            array![[300.0], [300.0]],
        )
        .unwrap();
        let brute = log_z_brute_force(
            params.visbias.view(),
            params.hidbias.view(),
            params.weights.view(),
        )
        .unwrap();
        let vectorized = params.log_z(Strategy::Vectorized).unwrap();
        let serial = params.log_z(Strategy::Serial).unwrap();
        assert!(vectorized.is_finite());
        assert_approx_eq!(vectorized, brute, 1e-9);
        assert_approx_eq!(serial, brute, 1e-9);
    }

    #[test]
    fn empty_layer() {
        let params = RbmParams::zeros(3, 0);
        assert_approx_eq!(params.log_z(Strategy::Vectorized).unwrap(), 8.0f64.ln());
        assert_approx_eq!(params.log_z(Strategy::Serial).unwrap(), 8.0f64.ln());
    }

    #[test]
    fn unnormalized_checks_shapes() {
        let patterns = Array2::from_elem((2, 3), true);
        let couplings = Array2::zeros((2, 4));
        let res = unnormalized_log_prob(
            patterns.view(),
            couplings.view(),
            Array1::zeros(2).view(),
            Array1::zeros(4).view(),
        );
        assert!(matches!(res, Err(RbmError::ShapeMismatch { .. })));
    }

    #[test]
    fn serial_pattern_matches_batch() {
        let mut rng = SmallRng::seed_from_u64(7);
        let params = RbmParams::random(4, 3, 1.0, &mut rng);
        let patterns = all_patterns(4).unwrap();
        let batch = unnormalized_log_prob(
            patterns.view(),
            params.weights.view(),
            params.visbias.view(),
            params.hidbias.view(),
        )
        .unwrap();
        let mut field = Array1::zeros(3);
        for (code, expected) in BinaryPatterns::new(4).unwrap().zip(batch.iter()) {
            let single = unnormalized_code_log_prob(
                code,
                params.weights.view(),
                params.visbias.view(),
                params.hidbias.view(),
                &mut field,
            );
            assert_approx_eq!(single, *expected, 1e-12);
        }
    }
}
