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
//! # Exact RBM statistics
//!
//! Partition functions, pattern probabilities and divergences of restricted boltzmann
//! machines computed by enumerating every state of the smaller layer, together with the
//! fisher information matrix of a sample and its spectrum.
//!
//! Everything here is a pure function of the parameters and data passed in. Where there
//! is a memory/speed trade off the caller picks it with a [`Strategy`].

#![allow(dead_code)]
#![warn(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

pub mod errors;
pub use errors::{RbmError, RbmResult};

pub mod config;
pub mod divergence;
pub mod fim;
pub mod moments;
pub mod params;
pub mod partition;
pub mod probability;
pub mod sampler;
pub mod spectrum;
pub mod unique;
pub mod zipf;

#[doc(inline)]
pub use config::AnalysisConfig;
#[doc(inline)]
pub use params::RbmParams;

pub use divergence::{data_model_kl_divergence, log_prob_kl_divergence};
pub use fim::{fim_streaming, fim_vectorized, fisher_information, SampleRow};
pub use partition::{exact_log_z, log_sum_exp, log_z_brute_force, softplus, unnormalized_log_prob};
pub use probability::{data_pattern_log_prob, joint_log_prob, pattern_log_prob};
pub use sampler::GibbsSampler;
pub use spectrum::{fim_eigenvalues, fim_spectrum, EigenBlocks, FimSpectrum};
pub use unique::{unique, Unique};
pub use zipf::{zipf, ZipfCurve};

pub use core_rbm::Strategy;
