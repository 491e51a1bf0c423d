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

//! # Divergence of a data sample from the model
//!
//! `KL(data || model) = Σ f(p) (ln f(p) - ln P(p))` over the distinct patterns of the data.
//! Patterns the data never shows contribute nothing. A pattern the model gives zero (or
//! underflowing) probability makes the divergence infinite, which is returned as a value
//! and not an error.

use log::{debug, warn};
use ndarray::prelude::*;

use crate::errors::RbmResult;
use crate::probability::{data_pattern_log_prob, pattern_log_prob};
use core_rbm::Strategy;

/// Computes `KL(data || model)` where the data is a sample of visible patterns, one per row,
/// and the model is the RBM with weights shaped `(nvis, nhid)`.
pub fn data_model_kl_divergence(
    data: ArrayView2<bool>,
    weights: ArrayView2<f64>,
    visbias: ArrayView1<f64>,
    hidbias: ArrayView1<f64>,
    strategy: Strategy,
) -> RbmResult<f64> {
    let (patterns, data_log_probs) = data_pattern_log_prob(data)?;
    let model_log_probs = pattern_log_prob(patterns.view(), visbias, hidbias, weights, strategy)?;
    debug!(
        "Comparing {} distinct patterns out of {} observations",
        patterns.nrows(),
        data.nrows()
    );
    let kld = log_prob_kl_divergence(data_log_probs.view(), model_log_probs.view());
    if !kld.is_finite() {
        warn!("The model gives a vanishing probability to an observed pattern, KL is {}", kld);
    }
    Ok(kld)
}

/// `Σ e^p_i (p_i - q_i)` for log probabilities `p` and `q` over the same support.
/// Terms with `p_i = -inf` are zero.
pub fn log_prob_kl_divergence(p: ArrayView1<f64>, q: ArrayView1<f64>) -> f64 {
    p.iter()
        .zip(q.iter())
        .filter(|(lp, _)| **lp > f64::NEG_INFINITY)
        .map(|(lp, lq)| lp.exp() * (lp - lq))
        .sum()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::params::RbmParams;
    use crate::partition::softplus;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn model_matching_data_has_zero_divergence() {
        // No hidden units, so the visible units are independent with P(on) = sigmoid(b).
        // Biases of ln(3) and 0 make P(1,1)=3/8, P(1,0)=3/8, P(0,1)=1/8, P(0,0)=1/8.
        let params = RbmParams::new(array![3.0f64.ln(), 0.0], Array1::zeros(0), Array2::zeros((2, 0)))
            .unwrap();
        let data = array![
            [true, true],
            [true, true],
            [true, true],
            [true, false],
            [true, false],
            [true, false],
            [false, true],
            [false, false]
        ];
        for &strategy in &[Strategy::Vectorized, Strategy::Serial] {
            let kld = params.kl_divergence_from(data.view(), strategy).unwrap();
            assert_approx_eq!(kld, 0.0, 1e-12);
        }
    }

    #[test]
    fn divergence_against_uniform() {
        let params = RbmParams::zeros(2, 1);
        let data = array![[true, true], [true, true], [false, true]];
        // f = (1/3, 2/3) against a uniform 1/4
        let expected = (1.0 / 3.0) * ((1.0f64 / 3.0).ln() - 0.25f64.ln())
            + (2.0 / 3.0) * ((2.0f64 / 3.0).ln() - 0.25f64.ln());
        let kld = params
            .kl_divergence_from(data.view(), Strategy::Vectorized)
            .unwrap();
        assert_approx_eq!(kld, expected, 1e-12);
    }

    #[test]
    fn divergence_is_non_negative() {
        let mut rng = SmallRng::seed_from_u64(42);
        let params = RbmParams::random(4, 3, 1.0, &mut rng);
        let data = Array2::from_shape_fn((20, 4), |(i, j)| (i * 7 + j * 3) % 5 < 2);
        let kld = params
            .kl_divergence_from(data.view(), Strategy::Serial)
            .unwrap();
        assert!(kld >= 0.0);
        assert!(kld.is_finite());
    }

    #[test]
    fn vanishing_model_probability_is_infinite() {
        let p = array![0.5f64.ln(), 0.5f64.ln()];
        let q = array![0.0, f64::NEG_INFINITY];
        assert_eq!(log_prob_kl_divergence(p.view(), q.view()), f64::INFINITY);
    }

    #[test]
    fn strongly_biased_model_stays_finite_in_log_space() {
        let params = RbmParams::new(array![-2000.0], Array1::zeros(0), Array2::zeros((1, 0))).unwrap();
        assert_approx_eq!(params.log_z(Strategy::Vectorized).unwrap(), softplus(-2000.0));
        let data = array![[true], [false]];
        let kld = params
            .kl_divergence_from(data.view(), Strategy::Vectorized)
            .unwrap();
        // The probability of the on state underflows, its log does not.
        assert_approx_eq!(kld, 1000.0 + 0.5f64.ln(), 1e-9);
    }

    #[test]
    fn empty_data_is_an_error() {
        let params = RbmParams::zeros(2, 1);
        let data = Array2::from_elem((0, 2), true);
        assert!(matches!(
            params.kl_divergence_from(data.view(), Strategy::Serial),
            Err(crate::errors::RbmError::EmptySample { .. })
        ));
    }
}
