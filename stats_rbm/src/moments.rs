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

use ndarray::linalg::general_mat_mul;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{RbmError, RbmResult};

/// One pass (Welford) mean and covariance of a stream of vectors.
///
/// Only the running mean and the co-moment matrix are kept, so the memory does not grow
/// with the number of observations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CovarianceMoments {
    /// The number of vectors seen
    pub count: u64,
    /// Running mean
    pub mean: Array1<f64>,
    /// Sum of the outer products of the deviations from the running mean, divide by
    /// `count - 1` for the sample covariance
    pub comoment: Array2<f64>,
    diff: Array1<f64>,
}

impl CovarianceMoments {
    /// Empty accumulator for vectors of length `dim`
    pub fn new(dim: usize) -> CovarianceMoments {
        CovarianceMoments {
            count: 0,
            mean: Array1::zeros(dim),
            comoment: Array2::zeros((dim, dim)),
            diff: Array1::zeros(dim),
        }
    }

    /// Length of the vectors
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Mean of everything added so far
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Folds one more vector in. For the i-th vector (counting from 0)
    /// `diff = x - mean`, `mean += diff / (i + 1)`, `comoment += diff diff^T * i / (i + 1)`.
    pub fn add(&mut self, x: ArrayView1<f64>) -> RbmResult<()> {
        if x.len() != self.dim() {
            return Err(RbmError::shape_mismatch(
                "covariance observation length",
                self.dim(),
                x.len(),
            ));
        }
        let i = self.count as f64;
        self.diff.assign(&x);
        self.diff -= &self.mean;
        self.mean.scaled_add(1.0 / (i + 1.0), &self.diff);

        let column = self.diff.view().insert_axis(Axis(1));
        let row = self.diff.view().insert_axis(Axis(0));
        general_mat_mul(i / (i + 1.0), &column, &row, 1.0, &mut self.comoment);
        self.count += 1;
        Ok(())
    }

    /// Sample covariance, normalized by `count - 1`.
    pub fn covariance(&self) -> RbmResult<Array2<f64>> {
        if self.count < 2 {
            return Err(RbmError::EmptySample {
                observations: self.count as usize,
            });
        }
        Ok(&self.comoment / (self.count - 1) as f64)
    }
}

/// Sample covariance of the rows of a matrix, normalized by `nrows - 1`.
pub fn covariance(observations: ArrayView2<f64>) -> RbmResult<Array2<f64>> {
    let n = observations.nrows();
    if n < 2 {
        return Err(RbmError::EmptySample { observations: n });
    }
    let mean = observations
        .mean_axis(Axis(0))
        .ok_or(RbmError::EmptySample { observations: n })?;
    let centered = &observations - &mean;
    Ok(centered.t().dot(&centered) / (n - 1) as f64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn empty_moments_sanity_test() {
        let moments = CovarianceMoments::new(3);
        assert_eq!(moments.count, 0);
        assert!(matches!(
            moments.covariance(),
            Err(RbmError::EmptySample { observations: 0 })
        ));
    }

    #[test]
    fn two_points() {
        let mut moments = CovarianceMoments::new(2);
        moments.add(array![1.0, 2.0].view()).unwrap();
        moments.add(array![3.0, 6.0].view()).unwrap();
        assert_approx_eq!(moments.mean()[0], 2.0);
        assert_approx_eq!(moments.mean()[1], 4.0);
        let cov = moments.covariance().unwrap();
        assert_approx_eq!(cov[[0, 0]], 2.0);
        assert_approx_eq!(cov[[0, 1]], 4.0);
        assert_approx_eq!(cov[[1, 0]], 4.0);
        assert_approx_eq!(cov[[1, 1]], 8.0);
    }

    #[test]
    fn streaming_matches_batch() {
        let data = Array2::from_shape_fn((50, 4), |(i, j)| ((i * 31 + j * 17) % 13) as f64 / 3.0);
        let mut moments = CovarianceMoments::new(4);
        for row in data.outer_iter() {
            moments.add(row).unwrap();
        }
        let streamed = moments.covariance().unwrap();
        let batch = covariance(data.view()).unwrap();
        for (s, b) in streamed.iter().zip(batch.iter()) {
            assert_approx_eq!(*s, *b, 1e-10);
        }
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut moments = CovarianceMoments::new(2);
        assert!(matches!(
            moments.add(array![1.0, 2.0, 3.0].view()),
            Err(RbmError::ShapeMismatch { .. })
        ));
        assert_eq!(moments.count, 0);
    }

    #[test]
    fn single_row_covariance_is_an_error() {
        let data = array![[1.0, 2.0]];
        assert!(matches!(
            covariance(data.view()),
            Err(RbmError::EmptySample { observations: 1 })
        ));
    }
}
