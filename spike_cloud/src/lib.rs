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
//! # Spike Cloud
//! Loads spike trains, selects spikes by cluster and time, and bins them into the boolean
//! patterns RBM statistics are computed over.

#![allow(dead_code)]
#![warn(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

pub mod errors;
pub use errors::{SpikeError, SpikeResult};

pub mod binning;
pub mod loaders;
pub mod spikes;

#[doc(inline)]
pub use binning::{bin_timeseries, BinnedSpikes};
#[doc(inline)]
pub use spikes::{raster_points, select_clusters, select_times, SpikeTrain};

/// To make things more obvious, we type the cluster id that we pull from the spike CSV.
/// Negative ids are kept as is, they are just another cluster.
pub type ClusterId = i64;
