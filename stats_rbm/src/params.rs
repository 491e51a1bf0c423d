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

//! # RBM parameters
//!
//! The biases of both layers and the coupling matrix, with the weights oriented
//! `(visible, hidden)`. Nothing here is mutated once built; every statistic in this crate
//! is a pure function of these three arrays.

use ndarray::prelude::*;
use log::info;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;
use yaml_rust::{Yaml, YamlLoader};

use crate::errors::{ParsingError, RbmError, RbmResult};
use core_rbm::Strategy;

/// Biases and weights of a restricted boltzmann machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbmParams {
    /// Bias of each visible unit
    pub visbias: Array1<f64>,
    /// Bias of each hidden unit
    pub hidbias: Array1<f64>,
    /// Couplings, shape `(visbias.len(), hidbias.len())`
    pub weights: Array2<f64>,
}

impl RbmParams {
    /// Checks that the weights line up with the biases.
    pub fn new(visbias: Array1<f64>, hidbias: Array1<f64>, weights: Array2<f64>) -> RbmResult<Self> {
        check_weights(visbias.view(), hidbias.view(), weights.view())?;
        Ok(RbmParams {
            visbias,
            hidbias,
            weights,
        })
    }

    /// All zero parameters, the uniform distribution over the joint states.
    pub fn zeros(nvis: usize, nhid: usize) -> Self {
        RbmParams {
            visbias: Array1::zeros(nvis),
            hidbias: Array1::zeros(nhid),
            weights: Array2::zeros((nvis, nhid)),
        }
    }

    /// Draws every bias and weight from a centered normal with the given standard deviation.
    pub fn random<R: Rng>(nvis: usize, nhid: usize, scale: f64, rng: &mut R) -> Self {
        let mut draw = || scale * rng.sample::<f64, _>(StandardNormal);
        let visbias = Array1::from_shape_fn(nvis, |_| draw());
        let hidbias = Array1::from_shape_fn(nhid, |_| draw());
        let weights = Array2::from_shape_fn((nvis, nhid), |_| draw());
        RbmParams {
            visbias,
            hidbias,
            weights,
        }
    }

    /// Number of visible units
    pub fn nvis(&self) -> usize {
        self.visbias.len()
    }

    /// Number of hidden units
    pub fn nhid(&self) -> usize {
        self.hidbias.len()
    }

    /// Swaps the roles of the layers. The log partition function is unchanged by this.
    pub fn transposed(&self) -> Self {
        RbmParams {
            visbias: self.hidbias.clone(),
            hidbias: self.visbias.clone(),
            weights: self.weights.t().to_owned(),
        }
    }

    /// Exact log partition function, see [`crate::exact_log_z`].
    pub fn log_z(&self, strategy: Strategy) -> RbmResult<f64> {
        crate::exact_log_z(
            self.visbias.view(),
            self.hidbias.view(),
            self.weights.view(),
            strategy,
        )
    }

    /// Exact log probability of visible patterns, see [`crate::pattern_log_prob`].
    pub fn pattern_log_prob(
        &self,
        patterns: ArrayView2<bool>,
        strategy: Strategy,
    ) -> RbmResult<Array1<f64>> {
        crate::pattern_log_prob(
            patterns,
            self.visbias.view(),
            self.hidbias.view(),
            self.weights.view(),
            strategy,
        )
    }

    /// KL divergence of the data from the model, see [`crate::data_model_kl_divergence`].
    pub fn kl_divergence_from(&self, data: ArrayView2<bool>, strategy: Strategy) -> RbmResult<f64> {
        crate::data_model_kl_divergence(
            data,
            self.weights.view(),
            self.visbias.view(),
            self.hidbias.view(),
            strategy,
        )
    }

    /// Reads the parameters from a yaml file. Weights are a list of rows, one per visible unit.
    ///
    /// ```yaml
    /// ---
    /// visbias: [0.1, -0.2, 0.0]
    /// hidbias: [0.5, 0.3]
    /// weights:
    ///   - [0.1, 0.2]
    ///   - [-0.3, 0.0]
    ///   - [1.0, -1.0]
    /// ```
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> RbmResult<Self> {
        let file_name = path.as_ref().to_string_lossy().to_string();
        info!("Loading rbm parameters from {}", file_name);
        let config = read_to_string(&path)?;
        let params_files = YamlLoader::load_from_str(&config)?;
        let params = params_files.get(0).ok_or_else(|| ParsingError::MissingYamlError {
            file_name: file_name.clone(),
            field: "visbias".to_string(),
        })?;
        let visbias = Array1::from(yaml_f64_vec(&params["visbias"], &file_name, "visbias")?);
        let hidbias = Array1::from(yaml_f64_vec(&params["hidbias"], &file_name, "hidbias")?);

        let weights = match &params["weights"] {
            Yaml::BadValue => {
                if visbias.is_empty() || hidbias.is_empty() {
                    Array2::zeros((visbias.len(), hidbias.len()))
                } else {
                    return Err(ParsingError::MissingYamlError {
                        file_name,
                        field: "weights".to_string(),
                    }
                    .into());
                }
            }
            Yaml::Array(rows) => {
                let mut flat = Vec::with_capacity(visbias.len() * hidbias.len());
                for row in rows {
                    let row = yaml_f64_vec(row, &file_name, "weights")?;
                    if row.len() != hidbias.len() {
                        return Err(RbmError::shape_mismatch(
                            "weight row length",
                            hidbias.len(),
                            row.len(),
                        ));
                    }
                    flat.extend(row);
                }
                if rows.len() != visbias.len() {
                    return Err(RbmError::shape_mismatch(
                        "weight row count",
                        visbias.len(),
                        rows.len(),
                    ));
                }
                Array2::from_shape_vec((visbias.len(), hidbias.len()), flat)?
            }
            _ => {
                return Err(ParsingError::MalformedYamlError {
                    file_name,
                    field: "weights".to_string(),
                }
                .into())
            }
        };
        RbmParams::new(visbias, hidbias, weights)
    }
}

/// Errors if the weights aren't shaped `(bias1.len(), bias2.len())`.
pub(crate) fn check_weights(
    bias1: ArrayView1<f64>,
    bias2: ArrayView1<f64>,
    weights: ArrayView2<f64>,
) -> RbmResult<()> {
    if weights.nrows() != bias1.len() {
        return Err(RbmError::shape_mismatch(
            "weight rows against the first bias",
            bias1.len(),
            weights.nrows(),
        ));
    }
    if weights.ncols() != bias2.len() {
        return Err(RbmError::shape_mismatch(
            "weight columns against the second bias",
            bias2.len(),
            weights.ncols(),
        ));
    }
    Ok(())
}

/// Yaml integers don't come back from `as_f64`, so both are accepted.
pub(crate) fn yaml_f64(value: &Yaml) -> Option<f64> {
    match value {
        Yaml::Real(_) => value.as_f64(),
        Yaml::Integer(i) => Some(*i as f64),
        _ => None,
    }
}

fn yaml_f64_vec(value: &Yaml, file_name: &str, field: &str) -> RbmResult<Vec<f64>> {
    match value {
        Yaml::Array(items) => items
            .iter()
            .map(|item| {
                yaml_f64(item).ok_or_else(|| {
                    RbmError::from(ParsingError::MalformedYamlError {
                        file_name: file_name.to_string(),
                        field: field.to_string(),
                    })
                })
            })
            .collect(),
        Yaml::BadValue => Err(ParsingError::MissingYamlError {
            file_name: file_name.to_string(),
            field: field.to_string(),
        }
        .into()),
        _ => Err(ParsingError::MalformedYamlError {
            file_name: file_name.to_string(),
            field: field.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::fs::File;
    use std::io::Write;
    use tempdir::TempDir;

    #[test]
    fn mismatched_weights_are_rejected() {
        let err = RbmParams::new(Array1::zeros(3), Array1::zeros(2), Array2::zeros((2, 3)));
        assert!(matches!(err, Err(RbmError::ShapeMismatch { .. })));
        assert!(RbmParams::new(Array1::zeros(3), Array1::zeros(2), Array2::zeros((3, 2))).is_ok());
    }

    #[test]
    fn transpose_swaps_layers() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = RbmParams::random(3, 2, 1.0, &mut rng);
        let t = params.transposed();
        assert_eq!(t.nvis(), 2);
        assert_eq!(t.nhid(), 3);
        assert_eq!(t.weights[[1, 2]], params.weights[[2, 1]]);
        assert_eq!(t.transposed(), params);
    }

    #[test]
    fn yaml_round_trip() {
        let dir = TempDir::new("rbm_params").unwrap();
        let path = dir.path().join("params.yml");
        let mut file = File::create(&path).unwrap();
        writeln!(
            file,
            "---\nvisbias: [0.5, -1, 0.0]\nhidbias: [2.0, 0]\nweights:\n  - [0.1, 0.2]\n  - [-0.3, 0]\n  - [1, -1.5]\n"
        )
        .unwrap();
        let params = RbmParams::from_yaml(&path).unwrap();
        assert_eq!(params.visbias, array![0.5, -1.0, 0.0]);
        assert_eq!(params.hidbias, array![2.0, 0.0]);
        assert_eq!(
            params.weights,
            array![[0.1, 0.2], [-0.3, 0.0], [1.0, -1.5]]
        );
    }

    #[test]
    fn yaml_missing_and_malformed_fields() {
        let dir = TempDir::new("rbm_params").unwrap();
        let path = dir.path().join("params.yml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "---\nvisbias: [0.5, 1.0]\nhidbias: [2.0]\n").unwrap();
        assert!(matches!(
            RbmParams::from_yaml(&path),
            Err(RbmError::ParsingError(ParsingError::MissingYamlError { .. }))
        ));

        let path = dir.path().join("bad.yml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "---\nvisbias: [0.5, one]\nhidbias: []\n").unwrap();
        assert!(matches!(
            RbmParams::from_yaml(&path),
            Err(RbmError::ParsingError(ParsingError::MalformedYamlError { .. }))
        ));

        let path = dir.path().join("short.yml");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "---\nvisbias: [0.5, 1.0]\nhidbias: [2.0]\nweights:\n  - [1.0]\n").unwrap();
        assert!(matches!(
            RbmParams::from_yaml(&path),
            Err(RbmError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn yaml_missing_file() {
        assert!(matches!(
            RbmParams::from_yaml("/this/file/does/not/exist.yml"),
            Err(RbmError::IoError(_))
        ));
    }
}
