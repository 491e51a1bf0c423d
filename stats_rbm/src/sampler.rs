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

//! # Block Gibbs sampling
//!
//! Alternates `h ~ P(h | v)` and `v ~ P(v | h)`. Both conditionals factor over the units of a
//! layer, each unit is on with probability `sigmoid(bias + input)`. The sampler is an endless
//! iterator of joint states `[v, h]` as 0/1 floats, so it can be handed straight to
//! [`fim_streaming`](crate::fim::fim_streaming) after a `take(n)`.

use log::trace;
use ndarray::prelude::*;
use rand::Rng;

use crate::params::RbmParams;

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn resample<R: Rng>(layer: &mut Array1<f64>, field: Array1<f64>, rng: &mut R) {
    layer.zip_mut_with(&field, |unit, x| {
        *unit = if rng.gen::<f64>() < sigmoid(*x) { 1.0 } else { 0.0 };
    });
}

/// Gibbs chain over the joint states of an RBM.
pub struct GibbsSampler<'a, R: Rng> {
    params: &'a RbmParams,
    rng: R,
    visible: Array1<f64>,
    hidden: Array1<f64>,
    burn_in: usize,
    thin: usize,
    steps: usize,
}

impl<'a, R: Rng> GibbsSampler<'a, R> {
    /// A chain started from a uniformly random visible state. Defaults to no burn in and
    /// every step kept.
    pub fn new(params: &'a RbmParams, mut rng: R) -> Self {
        let visible = Array1::from_shape_fn(params.nvis(), |_| {
            if rng.gen::<bool>() {
                1.0
            } else {
                0.0
            }
        });
        let hidden = Array1::zeros(params.nhid());
        GibbsSampler {
            params,
            rng,
            visible,
            hidden,
            burn_in: 0,
            thin: 1,
            steps: 0,
        }
    }

    /// Number of full sweeps thrown away before the first state is yielded
    pub fn set_burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    /// Number of sweeps between yielded states, clamped to at least 1
    pub fn set_thin(mut self, thin: usize) -> Self {
        self.thin = thin.max(1);
        self
    }

    /// Sweeps done so far, burn in included
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// One sweep, hidden given visible then visible given hidden.
    pub fn sweep(&mut self) {
        let params = self.params;
        let hidden_field = params.weights.t().dot(&self.visible) + &params.hidbias;
        resample(&mut self.hidden, hidden_field, &mut self.rng);
        let visible_field = params.weights.dot(&self.hidden) + &params.visbias;
        resample(&mut self.visible, visible_field, &mut self.rng);
        self.steps += 1;
    }

    /// The current joint state `[v, h]`
    pub fn state(&self) -> Array1<f64> {
        let mut state = Array1::zeros(self.visible.len() + self.hidden.len());
        state.slice_mut(s![..self.visible.len()]).assign(&self.visible);
        state.slice_mut(s![self.visible.len()..]).assign(&self.hidden);
        state
    }
}

impl<'a, R: Rng> Iterator for GibbsSampler<'a, R> {
    type Item = Array1<f64>;

    fn next(&mut self) -> Option<Array1<f64>> {
        if self.steps < self.burn_in {
            trace!("Burning in {} sweeps", self.burn_in - self.steps);
            while self.steps < self.burn_in {
                self.sweep();
            }
        }
        for _ in 0..self.thin {
            self.sweep();
        }
        Some(self.state())
    }
}
