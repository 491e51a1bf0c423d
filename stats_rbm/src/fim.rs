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

//! # Fisher information matrix
//!
//! For an RBM the gradient of the log likelihood with respect to `(a, b, W)` is the
//! sufficient statistic `[v, h, v h^T]` minus its expectation, so the fisher information is
//! the covariance of that feature vector under the model. Given a sample of joint states
//! (rows of `[visible..., hidden...]`), this estimates it.
//!
//! There are two entry points, with the same result:
//! * [`fim_vectorized`] takes the whole sample as a matrix and materializes every feature
//!   vector, `nsamples x (nvis + nhid + nvis*nhid)` floats.
//! * [`fim_streaming`] takes anything that produces rows (a matrix's rows, or a sampler) and
//!   folds them into a [`CovarianceMoments`] one at a time.

use log::trace;
use ndarray::prelude::*;

use crate::errors::{RbmError, RbmResult};
use crate::moments::{covariance, CovarianceMoments};
use core_rbm::Strategy;

/// Length of the feature vector `[v, h, v h^T]`
pub fn feature_dim(nvis: usize, nhid: usize) -> usize {
    nvis + nhid + nvis * nhid
}

/// A row of a sample, something that can be viewed as a 1d array of floats.
pub trait SampleRow {
    /// Borrows the row
    fn row_view(&self) -> ArrayView1<'_, f64>;
}

impl SampleRow for Array1<f64> {
    fn row_view(&self) -> ArrayView1<'_, f64> {
        self.view()
    }
}

impl<'a> SampleRow for ArrayView1<'a, f64> {
    fn row_view(&self) -> ArrayView1<'_, f64> {
        self.view()
    }
}

impl SampleRow for Vec<f64> {
    fn row_view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self[..])
    }
}

impl<'a> SampleRow for &'a [f64] {
    fn row_view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(*self)
    }
}

/// Writes `[v, h, v h^T]` (outer product flattened row major) for one joint state.
pub fn fill_features(state: ArrayView1<f64>, nvis: usize, mut out: ArrayViewMut1<f64>) {
    let nhid = state.len() - nvis;
    let vis = state.slice(s![..nvis]);
    let hid = state.slice(s![nvis..]);
    out.slice_mut(s![..nvis + nhid]).assign(&state);
    let mut prod = out.slice_mut(s![nvis + nhid..]);
    for (i, v) in vis.iter().enumerate() {
        prod.slice_mut(s![i * nhid..(i + 1) * nhid])
            .zip_mut_with(&hid, |p, h| *p = v * h);
    }
}

/// The feature vector `[v, h, v h^T]` of one joint state.
pub fn feature_vector(state: ArrayView1<f64>, nvis: usize) -> RbmResult<Array1<f64>> {
    let nhid = hidden_units(state.len(), nvis)?;
    let mut out = Array1::zeros(feature_dim(nvis, nhid));
    fill_features(state, nvis, out.view_mut());
    Ok(out)
}

fn hidden_units(columns: usize, nvis: usize) -> RbmResult<usize> {
    columns
        .checked_sub(nvis)
        .ok_or_else(|| RbmError::shape_mismatch("sample width against nvis", nvis, columns))
}

/// Fisher information from a materialized sample, rows are joint states `[v, h]`.
pub fn fim_vectorized(sample: ArrayView2<f64>, nvis: usize) -> RbmResult<Array2<f64>> {
    let nsamples = sample.nrows();
    let nhid = hidden_units(sample.ncols(), nvis)?;
    let dim = feature_dim(nvis, nhid);
    trace!(
        "Materializing {} feature vectors of length {}",
        nsamples,
        dim
    );
    let mut features = Array2::zeros((nsamples, dim));
    features
        .slice_mut(s![.., ..nvis + nhid])
        .assign(&sample);
    let vis = sample.slice(s![.., ..nvis]);
    let hid = sample.slice(s![.., nvis..]);
    let prod = &vis.insert_axis(Axis(2)) * &hid.insert_axis(Axis(1));
    features
        .slice_mut(s![.., nvis + nhid..])
        .assign(&prod.into_shape((nsamples, nvis * nhid))?);
    covariance(features.view())
}

/// Fisher information from any finite sequence of joint states, in one pass and with
/// memory independent of the number of states.
pub fn fim_streaming<I>(sample: I, nvis: usize) -> RbmResult<Array2<f64>>
where
    I: IntoIterator,
    I::Item: SampleRow,
{
    let mut rows = sample.into_iter();
    let first = match rows.next() {
        Some(row) => row,
        None => return Err(RbmError::EmptySample { observations: 0 }),
    };
    let width = first.row_view().len();
    let nhid = hidden_units(width, nvis)?;
    let mut moments = CovarianceMoments::new(feature_dim(nvis, nhid));
    let mut features = Array1::zeros(moments.dim());

    let mut push = |row: &I::Item| -> RbmResult<()> {
        let state = row.row_view();
        if state.len() != width {
            return Err(RbmError::shape_mismatch(
                "sample row width",
                width,
                state.len(),
            ));
        }
        fill_features(state, nvis, features.view_mut());
        moments.add(features.view())
    };
    push(&first)?;
    for row in rows {
        push(&row)?;
    }
    trace!("Streamed {} joint states", moments.count);
    moments.covariance()
}

/// Fisher information of a materialized sample, with the strategy chosen by the caller.
pub fn fisher_information(
    sample: ArrayView2<f64>,
    nvis: usize,
    strategy: Strategy,
) -> RbmResult<Array2<f64>> {
    match strategy {
        Strategy::Vectorized => fim_vectorized(sample, nvis),
        Strategy::Serial => fim_streaming(sample.outer_iter(), nvis),
    }
}

/// Converts a boolean sample into the 0/1 floats the fisher information is computed over.
pub fn sample_to_f64(sample: ArrayView2<bool>) -> Array2<f64> {
    crate::partition::patterns_to_f64(sample)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn test_sample() -> Array2<f64> {
        Array2::from_shape_fn((40, 5), |(i, j)| {
            if (i * 13 + j * 7 + i * j) % 3 == 0 {
                1.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn features_layout() {
        let state = array![1.0, 0.0, 1.0, 1.0, 0.0];
        let f = feature_vector(state.view(), 3).unwrap();
        // v = [1,0,1], h = [1,0], v h^T = [[1,0],[0,0],[1,0]]
        assert_eq!(
            f,
            array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(f.len(), feature_dim(3, 2));
    }

    #[test]
    fn strategies_agree() {
        let sample = test_sample();
        let vectorized = fim_vectorized(sample.view(), 2).unwrap();
        let streamed = fim_streaming(sample.outer_iter(), 2).unwrap();
        assert_eq!(vectorized.dim(), (11, 11));
        assert_eq!(streamed.dim(), (11, 11));
        for (a, b) in vectorized.iter().zip(streamed.iter()) {
            assert!((a - b).abs() <= 1e-8 * a.abs().max(1.0), "{} != {}", a, b);
        }
    }

    #[test]
    fn streaming_accepts_owned_rows() {
        let sample = test_sample();
        let rows: Vec<Vec<f64>> = sample.outer_iter().map(|r| r.to_vec()).collect();
        let from_vecs = fim_streaming(rows, 3).unwrap();
        let from_view = fisher_information(sample.view(), 3, Strategy::Serial).unwrap();
        for (a, b) in from_vecs.iter().zip(from_view.iter()) {
            assert_approx_eq!(*a, *b, 1e-12);
        }
    }

    #[test]
    fn fim_is_symmetric() {
        let fim = fisher_information(test_sample().view(), 2, Strategy::Vectorized).unwrap();
        for i in 0..fim.nrows() {
            for j in 0..fim.ncols() {
                assert_approx_eq!(fim[[i, j]], fim[[j, i]], 1e-12);
            }
        }
    }

    #[test]
    fn empty_and_ragged_streams() {
        let empty: Vec<Vec<f64>> = Vec::new();
        assert!(matches!(
            fim_streaming(empty, 2),
            Err(RbmError::EmptySample { observations: 0 })
        ));
        let ragged = vec![vec![1.0, 0.0, 1.0], vec![1.0, 0.0]];
        assert!(matches!(
            fim_streaming(ragged, 1),
            Err(RbmError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn too_many_visible_units() {
        let sample = test_sample();
        assert!(matches!(
            fim_vectorized(sample.view(), 6),
            Err(RbmError::ShapeMismatch { .. })
        ));
    }
}
