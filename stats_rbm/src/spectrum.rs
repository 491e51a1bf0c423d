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

//! # Spectrum of a fisher information matrix
//!
//! The eigenvalues come out in descending order. The eigenvectors, when asked for, are split
//! along their components into the parameter blocks they belong to: visible biases, hidden
//! biases and the `(nvis, nhid)` grid of weights. Column `k` of every block belongs to the
//! `k`-th eigenvalue.

use log::debug;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{RbmError, RbmResult};

/// Eigenvectors of a fisher information matrix split by parameter block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EigenBlocks {
    /// Components along the visible biases, `(nvis, k)`
    pub visible: Array2<f64>,
    /// Components along the hidden biases, `(nhid, k)`
    pub hidden: Array2<f64>,
    /// Components along the weights, `(nvis, nhid, k)`
    pub interaction: Array3<f64>,
}

/// Eigenvalues, largest first, and optionally the matching eigenvectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FimSpectrum {
    /// Non-increasing eigenvalues
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors split into parameter blocks
    pub eigenvectors: Option<EigenBlocks>,
}

impl FimSpectrum {
    /// Number of eigenvalues
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    /// If the matrix was 0 by 0
    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Sum of the eigenvalues, the trace of the matrix
    pub fn total(&self) -> f64 {
        self.eigenvalues.sum()
    }
}

/// The number of hidden units that gives a matrix of side `size` with `nvis` visible units.
pub fn hidden_units_for(size: usize, nvis: usize) -> RbmResult<usize> {
    let mismatch = RbmError::DimensionMismatch { size, nvis };
    let rest = match size.checked_sub(nvis) {
        Some(rest) => rest,
        None => return Err(mismatch),
    };
    if rest % (1 + nvis) != 0 {
        return Err(mismatch);
    }
    Ok(rest / (1 + nvis))
}

/// The eigenvalues of the matrix, largest first.
pub fn fim_eigenvalues(fim: ArrayView2<f64>, nvis: usize) -> RbmResult<Array1<f64>> {
    fim_spectrum(fim, nvis, false).map(|spectrum| spectrum.eigenvalues)
}

/// Symmetric eigendecomposition of a fisher information matrix for an RBM with `nvis`
/// visible units.
pub fn fim_spectrum(
    fim: ArrayView2<f64>,
    nvis: usize,
    return_eigenvectors: bool,
) -> RbmResult<FimSpectrum> {
    let (rows, cols) = fim.dim();
    if rows != cols {
        return Err(RbmError::shape_mismatch("fisher information columns", rows, cols));
    }
    let nhid = hidden_units_for(rows, nvis)?;
    debug!(
        "Decomposing a {0}x{0} fisher information matrix, {1} visible and {2} hidden units",
        rows, nvis, nhid
    );
    if rows == 0 {
        return Ok(FimSpectrum {
            eigenvalues: Array1::zeros(0),
            eigenvectors: if return_eigenvectors {
                Some(EigenBlocks {
                    visible: Array2::zeros((0, 0)),
                    hidden: Array2::zeros((0, 0)),
                    interaction: Array3::zeros((0, 0, 0)),
                })
            } else {
                None
            },
        });
    }

    let matrix = DMatrix::from_fn(rows, rows, |i, j| fim[[i, j]]);
    let eigen = SymmetricEigen::new(matrix);

    let mut order: Vec<usize> = (0..rows).collect();
    order.sort_by(|a, b| eigen.eigenvalues[*b].total_cmp(&eigen.eigenvalues[*a]));
    let eigenvalues: Array1<f64> = order.iter().map(|i| eigen.eigenvalues[*i]).collect();

    let eigenvectors = if return_eigenvectors {
        let vectors =
            Array2::from_shape_fn((rows, rows), |(i, k)| eigen.eigenvectors[(i, order[k])]);
        let interaction = vectors
            .slice(s![nvis + nhid.., ..])
            .to_owned()
            .into_shape((nvis, nhid, rows))?;
        Some(EigenBlocks {
            visible: vectors.slice(s![..nvis, ..]).to_owned(),
            hidden: vectors.slice(s![nvis..nvis + nhid, ..]).to_owned(),
            interaction,
        })
    } else {
        None
    };

    Ok(FimSpectrum {
        eigenvalues,
        eigenvectors,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fim::fim_vectorized;

    fn sample_fim() -> Array2<f64> {
        let sample = Array2::from_shape_fn((64, 5), |(i, j)| ((i >> j) & 1) as f64);
        fim_vectorized(sample.view(), 3).unwrap()
    }

    #[test]
    fn eigenvalues_are_sorted_and_sum_to_trace() {
        let fim = sample_fim();
        let values = fim_eigenvalues(fim.view(), 3).unwrap();
        assert_eq!(values.len(), 11);
        for pair in values.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert_approx_eq!(values.sum(), fim.diag().sum(), 1e-9);
    }

    #[test]
    fn diagonal_matrix() {
        let fim = Array2::from_diag(&array![1.0, 3.0, 2.0, 0.5, 4.0]);
        // nvis = 1 gives nhid = 2
        let spectrum = fim_spectrum(fim.view(), 1, true).unwrap();
        for (x, y) in spectrum.eigenvalues.iter().zip(&[4.0, 3.0, 2.0, 1.0, 0.5]) {
            assert_approx_eq!(*x, *y, 1e-12);
        }
        let blocks = spectrum.eigenvectors.unwrap();
        assert_eq!(blocks.visible.dim(), (1, 5));
        assert_eq!(blocks.hidden.dim(), (2, 5));
        assert_eq!(blocks.interaction.dim(), (1, 2, 5));
        // largest eigenvalue sits on the last weight
        assert_approx_eq!(blocks.interaction[[0, 1, 0]].abs(), 1.0);
        // second largest on the first hidden bias
        assert_approx_eq!(blocks.hidden[[0, 1]].abs(), 1.0);
        assert_approx_eq!(blocks.visible[[0, 3]].abs(), 1.0);
    }

    #[test]
    fn eigenvectors_reassemble() {
        let fim = sample_fim();
        let spectrum = fim_spectrum(fim.view(), 3, true).unwrap();
        let blocks = spectrum.eigenvectors.as_ref().unwrap();
        assert_eq!(blocks.visible.dim(), (3, 11));
        assert_eq!(blocks.hidden.dim(), (2, 11));
        assert_eq!(blocks.interaction.dim(), (3, 2, 11));

        let interaction = blocks.interaction.view().into_shape((6, 11)).unwrap();
        let vectors = ndarray::concatenate(
            Axis(0),
            &[blocks.visible.view(), blocks.hidden.view(), interaction],
        )
        .unwrap();
        for k in 0..11 {
            let v = vectors.column(k);
            let av = fim.dot(&v);
            for (x, y) in av.iter().zip(v.iter()) {
                assert_approx_eq!(*x, spectrum.eigenvalues[k] * y, 1e-8);
            }
        }
    }

    #[test]
    fn size_must_split() {
        let fim = Array2::<f64>::eye(10);
        assert!(matches!(
            fim_spectrum(fim.view(), 3, false),
            Err(RbmError::DimensionMismatch { size: 10, nvis: 3 })
        ));
        let fim = Array2::<f64>::eye(2);
        assert!(matches!(
            fim_eigenvalues(fim.view(), 3),
            Err(RbmError::DimensionMismatch { size: 2, nvis: 3 })
        ));
    }

    #[test]
    fn empty_matrix() {
        let fim = Array2::<f64>::zeros((0, 0));
        assert!(fim_eigenvalues(fim.view(), 0).unwrap().is_empty());
        let spectrum = fim_spectrum(fim.view(), 0, true).unwrap();
        assert!(spectrum.is_empty());
        assert_eq!(spectrum.total(), 0.0);
        let blocks = spectrum.eigenvectors.unwrap();
        assert_eq!(blocks.visible.dim(), (0, 0));
        assert_eq!(blocks.hidden.dim(), (0, 0));
        assert_eq!(blocks.interaction.dim(), (0, 0, 0));
    }

    #[test]
    fn non_square() {
        let fim = Array2::<f64>::zeros((5, 4));
        assert!(matches!(
            fim_spectrum(fim.view(), 1, false),
            Err(RbmError::ShapeMismatch { .. })
        ));
    }
}
