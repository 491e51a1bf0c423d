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

//! # Analysis configuration
//!
//! Settings for sampling an RBM and computing its fisher information spectrum. Can be built
//! with the setters or read from a yaml file, missing keys take the defaults.
//!
//! ```yaml
//! ---
//! strategy: serial
//! eigenvectors: true
//! samples: 10000
//! gibbs_burn_in: 1000
//! gibbs_thin: 5
//! rng_seed: 42
//! ```

use log::info;
use ndarray::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;
use yaml_rust::{Yaml, YamlLoader};

use crate::errors::{ParsingError, RbmResult};
use crate::fim::{fim_streaming, fim_vectorized};
use crate::sampler::GibbsSampler;
use crate::spectrum::{fim_spectrum, FimSpectrum};
use core_rbm::Strategy;

pub use crate::params::RbmParams;

/// An optional integer key that has to be non-negative.
fn unsigned_field(params: &Yaml, field: &str, file_name: &str) -> RbmResult<Option<u64>> {
    match params[field].as_i64() {
        Some(i) => u64::try_from(i).map(Some).map_err(|_| {
            ParsingError::MalformedYamlError {
                file_name: file_name.to_string(),
                field: field.to_string(),
            }
            .into()
        }),
        None => Ok(None),
    }
}

/// How to sample a model and analyse its fisher information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub(crate) strategy: Strategy,
    pub(crate) eigenvectors: bool,
    pub(crate) samples: usize,
    pub(crate) burn_in: usize,
    pub(crate) thin: usize,
    pub(crate) rng_seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> AnalysisConfig {
        AnalysisConfig {
            strategy: Strategy::Vectorized,
            eigenvectors: false,
            samples: 10_000,
            burn_in: 1_000,
            thin: 1,
            rng_seed: None,
        }
    }
}

impl AnalysisConfig {
    /// Creates a config with the defaults
    pub fn new() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    /// Reads the config from a yaml file, unknown strategies are a parsing error.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> RbmResult<AnalysisConfig> {
        let file_name = path.as_ref().to_string_lossy().to_string();
        info!("Loading analysis config from {}", file_name);
        let config = read_to_string(&path)?;
        let params_files = YamlLoader::load_from_str(&config)?;
        let defaults = AnalysisConfig::default();
        let params = match params_files.get(0) {
            Some(params) => params,
            None => return Ok(defaults),
        };
        let strategy = match params["strategy"].as_str() {
            Some(name) => name
                .parse::<Strategy>()
                .map_err(|_| ParsingError::MalformedYamlError {
                    file_name: file_name.clone(),
                    field: "strategy".to_string(),
                })?,
            None => defaults.strategy,
        };
        let thin = unsigned_field(params, "gibbs_thin", &file_name)?;
        Ok(AnalysisConfig {
            strategy,
            eigenvectors: params["eigenvectors"]
                .as_bool()
                .unwrap_or(defaults.eigenvectors),
            samples: unsigned_field(params, "samples", &file_name)?
                .map(|i| i as usize)
                .unwrap_or(defaults.samples),
            burn_in: unsigned_field(params, "gibbs_burn_in", &file_name)?
                .map(|i| i as usize)
                .unwrap_or(defaults.burn_in),
            thin: thin.map(|i| (i as usize).max(1)).unwrap_or(defaults.thin),
            rng_seed: unsigned_field(params, "rng_seed", &file_name)?,
        })
    }

    /// Vectorized or serial
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
    /// Number of joint states drawn for the fisher information
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Materialize the sample or stream it through the fisher information
    pub fn set_strategy(&mut self, x: Strategy) -> &mut Self {
        self.strategy = x;
        self
    }
    /// Also compute the eigenvectors, see [`FimSpectrum`]
    pub fn set_eigenvectors(&mut self, x: bool) -> &mut Self {
        self.eigenvectors = x;
        self
    }
    /// Number of joint states drawn
    pub fn set_samples(&mut self, x: usize) -> &mut Self {
        self.samples = x;
        self
    }
    /// See [`GibbsSampler::set_burn_in`]
    pub fn set_burn_in(&mut self, x: usize) -> &mut Self {
        self.burn_in = x;
        self
    }
    /// See [`GibbsSampler::set_thin`]
    pub fn set_thin(&mut self, x: usize) -> &mut Self {
        self.thin = x.max(1);
        self
    }
    /// Fixes the sampler's seed
    pub fn set_rng_seed(&mut self, x: u64) -> &mut Self {
        self.rng_seed = Some(x);
        self
    }

    /// A sampler over the model with this config's burn in, thinning and seed.
    pub fn sampler<'a>(&self, params: &'a RbmParams) -> GibbsSampler<'a, SmallRng> {
        let rng = match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        GibbsSampler::new(params, rng)
            .set_burn_in(self.burn_in)
            .set_thin(self.thin)
    }

    /// Draws `samples` joint states from the model and returns the spectrum of their fisher
    /// information. The serial strategy never holds more than one state at a time.
    pub fn analyse(&self, params: &RbmParams) -> RbmResult<FimSpectrum> {
        info!(
            "Analysing a {}x{} rbm with {} {} samples",
            params.nvis(),
            params.nhid(),
            self.samples,
            self.strategy
        );
        let states = self.sampler(params).take(self.samples);
        let fim = match self.strategy {
            Strategy::Serial => fim_streaming(states, params.nvis())?,
            Strategy::Vectorized => {
                let width = params.nvis() + params.nhid();
                let mut sample = Array2::zeros((self.samples, width));
                for (mut row, state) in sample.outer_iter_mut().zip(states) {
                    row.assign(&state);
                }
                fim_vectorized(sample.view(), params.nvis())?
            }
        };
        fim_spectrum(fim.view(), params.nvis(), self.eigenvectors)
    }
}
