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

//! Selecting spikes by cluster and by time.

use fxhash::FxHashSet;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::binning::{bin_timeseries, BinnedSpikes};
use crate::errors::*;
use crate::ClusterId;

/// Keeps the spikes whose cluster is in `choice`.
pub fn select_clusters(
    times: &[f64],
    ids: &[ClusterId],
    choice: &[ClusterId],
) -> SpikeResult<(Vec<f64>, Vec<ClusterId>)> {
    SpikeError::check_lengths(times.len(), ids.len())?;
    let choice: FxHashSet<ClusterId> = choice.iter().cloned().collect();
    Ok(times
        .iter()
        .zip(ids.iter())
        .filter(|(_, id)| choice.contains(*id))
        .map(|(t, id)| (*t, *id))
        .unzip())
}

/// Keeps the spikes with `min <= t <= max`.
pub fn select_times(
    times: &[f64],
    ids: &[ClusterId],
    min: f64,
    max: f64,
) -> SpikeResult<(Vec<f64>, Vec<ClusterId>)> {
    SpikeError::check_lengths(times.len(), ids.len())?;
    Ok(times
        .iter()
        .zip(ids.iter())
        .filter(|(t, _)| min <= **t && **t <= max)
        .map(|(t, id)| (*t, *id))
        .unzip())
}

/// The points of a raster plot, one row `[time, cluster]` per spike.
pub fn raster_points(times: &[f64], ids: &[ClusterId]) -> SpikeResult<Array2<f64>> {
    SpikeError::check_lengths(times.len(), ids.len())?;
    Ok(Array2::from_shape_fn((times.len(), 2), |(i, j)| {
        if j == 0 {
            times[i]
        } else {
            ids[i] as f64
        }
    }))
}

/// Spike times paired with the cluster that fired them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpikeTrain {
    times: Vec<f64>,
    ids: Vec<ClusterId>,
}

impl SpikeTrain {
    /// Errors if the two don't have the same length.
    pub fn new(times: Vec<f64>, ids: Vec<ClusterId>) -> SpikeResult<SpikeTrain> {
        SpikeError::check_lengths(times.len(), ids.len())?;
        Ok(SpikeTrain { times, ids })
    }

    /// Number of spikes
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// If there are no spikes
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Spike times
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Cluster of each spike
    pub fn ids(&self) -> &[ClusterId] {
        &self.ids
    }

    /// Appends the spikes of another train
    pub fn merge(&mut self, other: &SpikeTrain) {
        self.times.extend_from_slice(&other.times);
        self.ids.extend_from_slice(&other.ids);
    }

    /// See [`select_clusters`]
    pub fn select_clusters(&self, choice: &[ClusterId]) -> SpikeTrain {
        let choice: FxHashSet<ClusterId> = choice.iter().cloned().collect();
        self.filter(|_, id| choice.contains(&id))
    }

    /// See [`select_times`]
    pub fn select_times(&self, min: f64, max: f64) -> SpikeTrain {
        self.filter(|t, _| min <= t && t <= max)
    }

    fn filter<F: Fn(f64, ClusterId) -> bool>(&self, keep: F) -> SpikeTrain {
        let (times, ids) = self
            .times
            .iter()
            .zip(self.ids.iter())
            .filter(|(t, id)| keep(**t, **id))
            .map(|(t, id)| (*t, *id))
            .unzip();
        SpikeTrain { times, ids }
    }

    /// See [`raster_points`]
    pub fn raster_points(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), 2), |(i, j)| {
            if j == 0 {
                self.times[i]
            } else {
                self.ids[i] as f64
            }
        })
    }

    /// See [`bin_timeseries`]
    pub fn bin(&self, dt: f64) -> SpikeResult<BinnedSpikes> {
        let (labels, binned) = bin_timeseries(&self.times, &self.ids, dt)?;
        Ok(BinnedSpikes { labels, dt, binned })
    }
}
