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

//! # Binning
//!
//! Turns spike times into a boolean `(time bin, cluster)` matrix. Each row is the pattern of
//! clusters that fired at least once in that bin, which is the visible data an RBM is
//! compared against.

use fxhash::FxHashMap;
use log::debug;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::ClusterId;

/// Index of the bin of width `dt` that `t` falls in.
///
/// The quotient is taken from the exact remainder `t % dt`, so a time that sits on a bin
/// edge in decimal but just under it in binary (`1.0` with `dt = 0.1`) goes in the lower bin.
pub fn bin_index(t: f64, dt: f64) -> usize {
    let rem = t % dt;
    let div = (t - rem) / dt;
    let mut floor = div.floor();
    if div - floor > 0.5 {
        floor += 1.0;
    }
    floor as usize
}

/// Bins the spikes with width `dt`. Returns the distinct cluster ids, sorted, and a matrix
/// with one row per bin, from `0` to the bin of the last spike, and one column per cluster.
pub fn bin_timeseries(
    times: &[f64],
    ids: &[ClusterId],
    dt: f64,
) -> SpikeResult<(Vec<ClusterId>, Array2<bool>)> {
    SpikeError::check_lengths(times.len(), ids.len())?;
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(SpikeError::InvalidBinWidth(dt));
    }
    if let Some((index, time)) = times
        .iter()
        .enumerate()
        .find(|(_, t)| !(**t >= 0.0 && t.is_finite()))
    {
        return Err(SpikeError::InvalidSpikeTime { index, time: *time });
    }

    let mut labels: Vec<ClusterId> = ids.to_vec();
    labels.sort_unstable();
    labels.dedup();
    let columns: FxHashMap<ClusterId, usize> =
        labels.iter().enumerate().map(|(i, l)| (*l, i)).collect();

    let rows = match times.iter().cloned().reduce(f64::max) {
        Some(tmax) => bin_index(tmax, dt) + 1,
        None => 0,
    };
    debug!(
        "Binning {} spikes from {} clusters into {} bins of width {}",
        times.len(),
        labels.len(),
        rows,
        dt
    );
    let mut binned = Array2::from_elem((rows, labels.len()), false);
    for (t, id) in times.iter().zip(ids.iter()) {
        binned[[bin_index(*t, dt), columns[id]]] = true;
    }
    Ok((labels, binned))
}

/// A binned spike train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedSpikes {
    /// Cluster of each column
    pub labels: Vec<ClusterId>,
    /// Bin width
    pub dt: f64,
    /// `(bins, clusters)`, true if the cluster fired in the bin
    pub binned: Array2<bool>,
}

impl BinnedSpikes {
    /// Number of bins
    pub fn bins(&self) -> usize {
        self.binned.nrows()
    }

    /// The pattern of each bin, one row per bin
    pub fn patterns(&self) -> ArrayView2<bool> {
        self.binned.view()
    }

    /// Start time of a bin
    pub fn bin_start(&self, bin: usize) -> f64 {
        bin as f64 * self.dt
    }

    /// Number of clusters active in each bin
    pub fn population_counts(&self) -> Array1<usize> {
        self.binned
            .map_axis(Axis(1), |row| row.iter().filter(|b| **b).count())
    }

    /// Column of a cluster
    pub fn column(&self, id: ClusterId) -> Option<usize> {
        self.labels.binary_search(&id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spikes::SpikeTrain;

    #[test]
    fn binning_layout() {
        let times = [0.0, 0.05, 0.12, 0.35, 0.31];
        let ids = [5, 2, 5, 9, 2];
        let (labels, binned) = bin_timeseries(&times, &ids, 0.1).unwrap();
        assert_eq!(labels, vec![2, 5, 9]);
        assert_eq!(binned.dim(), (4, 3));
        assert_eq!(
            binned,
            array![
                [true, true, false],
                [false, true, false],
                [false, false, false],
                [true, false, true]
            ]
        );
    }

    #[test]
    fn repeated_spikes_in_a_bin() {
        let (labels, binned) = bin_timeseries(&[1.0, 1.1, 1.2], &[4, 4, 4], 1.0).unwrap();
        assert_eq!(labels, vec![4]);
        assert_eq!(binned, array![[false], [true]]);
    }

    #[test]
    fn edges_follow_the_remainder() {
        assert_eq!(bin_index(1.0, 0.1), 9);
        assert_eq!(bin_index(0.5, 0.25), 2);
        assert_eq!(bin_index(0.0, 0.3), 0);
        assert_eq!(bin_index(7.9, 2.0), 3);
    }

    #[test]
    fn invalid_input() {
        assert!(matches!(
            bin_timeseries(&[1.0], &[1], 0.0),
            Err(SpikeError::InvalidBinWidth(_))
        ));
        assert!(matches!(
            bin_timeseries(&[1.0], &[1], f64::NAN),
            Err(SpikeError::InvalidBinWidth(_))
        ));
        assert!(matches!(
            bin_timeseries(&[1.0, -0.5], &[1, 2], 0.1),
            Err(SpikeError::InvalidSpikeTime { index: 1, .. })
        ));
        assert!(matches!(
            bin_timeseries(&[1.0, 2.0], &[1], 0.1),
            Err(SpikeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn empty_train() {
        let (labels, binned) = bin_timeseries(&[], &[], 0.1).unwrap();
        assert!(labels.is_empty());
        assert_eq!(binned.dim(), (0, 0));
    }

    #[test]
    fn binned_train() {
        let train = SpikeTrain::new(vec![0.0, 0.4, 0.45, 1.0], vec![1, 2, 1, 2]).unwrap();
        let binned = train.bin(0.5).unwrap();
        assert_eq!(binned.bins(), 3);
        assert_eq!(binned.population_counts(), array![2, 0, 1]);
        assert_eq!(binned.column(2), Some(1));
        assert_eq!(binned.column(3), None);
        assert_approx_eq!(binned.bin_start(2), 1.0);
    }
}
