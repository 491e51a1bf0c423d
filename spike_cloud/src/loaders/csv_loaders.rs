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

use csv::{Reader, StringRecord};
use flate2::read::GzDecoder;
use log::info;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::errors::*;
use crate::spikes::SpikeTrain;
use crate::ClusterId;

/// Opens a CSV (optionally gzipped) with a header row and reads the spike time from column
/// `time_index` and the cluster id from column `cluster_index`.
pub fn spikes_from_csv<P: AsRef<Path>>(
    path: P,
    time_index: usize,
    cluster_index: usize,
) -> SpikeResult<SpikeTrain> {
    let path = path.as_ref();
    info!("Reading spikes from {:?}", path);
    let file = File::open(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => read_csv(
            path,
            time_index,
            cluster_index,
            Reader::from_reader(GzDecoder::new(file)),
        ),
        _ => read_csv(path, time_index, cluster_index, Reader::from_reader(file)),
    }
}

fn parse_field<T: FromStr>(path: &Path, record: &StringRecord, index: usize) -> SpikeResult<T> {
    let line_number = record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or_default();
    let csv_error = |key: String| {
        SpikeError::ParsingError(ParsingError::CSVReadError {
            file_name: path.to_string_lossy().to_string(),
            line_number,
            key,
        })
    };
    let field = record
        .get(index)
        .ok_or_else(|| csv_error(format!("No column {} in {:?}", index, record)))?;
    field
        .trim()
        .parse::<T>()
        .map_err(|_| csv_error(format!("Unable to parse column {} of {:?}", index, record)))
}

fn read_csv<R: Read>(
    path: &Path,
    time_index: usize,
    cluster_index: usize,
    mut rdr: Reader<R>,
) -> SpikeResult<SpikeTrain> {
    let mut times = Vec::new();
    let mut ids = Vec::new();
    for result in rdr.records() {
        let record = result?;
        times.push(parse_field::<f64>(path, &record, time_index)?);
        ids.push(parse_field::<ClusterId>(path, &record, cluster_index)?);
    }
    SpikeTrain::new(times, ids)
}
