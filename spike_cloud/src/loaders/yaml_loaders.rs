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

use glob::{glob_with, MatchOptions};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use yaml_rust::{Yaml, YamlLoader};

use super::*;

/// Spikes read from disk together with the bin width the recording asks for.
#[derive(Debug, Clone)]
pub struct SpikeSource {
    /// All spikes of every matched file, in file order
    pub train: SpikeTrain,
    /// Bin width, if the config gave one
    pub dt: Option<f64>,
}

impl SpikeSource {
    /// Bins the spikes with the configured width.
    pub fn binned(&self) -> SpikeResult<BinnedSpikes> {
        match self.dt {
            Some(dt) => self.train.bin(dt),
            None => Err(SpikeError::InvalidBinWidth(f64::NAN)),
        }
    }
}

/// Given a yaml file on disk, it reads the spikes of every CSV matching `spikes_path`
/// (relative paths are relative to the yaml file). Minimal example below.
/// ```yaml
/// ---
/// spikes_path: recordings/session_*.csv
/// time_index: 0
/// cluster_index: 1
/// dt: 0.02
/// ```
pub fn spikes_from_yaml<P: AsRef<Path>>(path: P) -> SpikeResult<SpikeSource> {
    let path: &Path = path.as_ref();
    let file_name = path.to_string_lossy().to_string();
    let config = fs::read_to_string(path)?;
    let params_files = YamlLoader::load_from_str(&config)?;
    let params = params_files
        .get(0)
        .ok_or_else(|| ParsingError::MissingYamlError {
            file_name: file_name.clone(),
            field: "spikes_path".to_string(),
        })?;

    let spikes_path = params["spikes_path"]
        .as_str()
        .ok_or_else(|| ParsingError::MissingYamlError {
            file_name: file_name.clone(),
            field: "spikes_path".to_string(),
        })?;
    let time_index = column_index(params, "time_index", &file_name)?.unwrap_or(0);
    let cluster_index = column_index(params, "cluster_index", &file_name)?.unwrap_or(1);
    let dt = match &params["dt"] {
        yaml_rust::Yaml::Real(_) => params["dt"].as_f64(),
        yaml_rust::Yaml::Integer(i) => Some(*i as f64),
        yaml_rust::Yaml::BadValue => None,
        _ => {
            return Err(ParsingError::MalformedYamlError {
                file_name,
                field: "dt".to_string(),
            }
            .into())
        }
    };

    let spikes_files = get_file_list(spikes_path, path)?;
    if spikes_files.is_empty() {
        return Err(ParsingError::MalformedYamlError {
            file_name,
            field: "spikes_path".to_string(),
        }
        .into());
    }
    info!(
        "Loading {} spike files matching {} from {}",
        spikes_files.len(),
        spikes_path,
        file_name
    );
    let mut train = SpikeTrain::default();
    for spikes_file in spikes_files {
        train.merge(&spikes_from_csv(&spikes_file, time_index, cluster_index)?);
    }
    Ok(SpikeSource { train, dt })
}

fn column_index(params: &Yaml, field: &str, file_name: &str) -> SpikeResult<Option<usize>> {
    match params[field].as_i64() {
        Some(i) => usize::try_from(i).map(Some).map_err(|_| {
            ParsingError::MalformedYamlError {
                file_name: file_name.to_string(),
                field: field.to_string(),
            }
            .into()
        }),
        None => Ok(None),
    }
}

fn get_file_list(files_reg: &str, yaml_path: &Path) -> SpikeResult<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };
    let files_reg_path = Path::new(files_reg);
    let pattern = if files_reg_path.is_absolute() {
        files_reg_path.to_path_buf()
    } else {
        yaml_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(files_reg_path)
    };
    let pattern = pattern
        .to_str()
        .ok_or(ParsingError::RegularParsingError("spikes_path is not valid unicode"))?;
    let glob_paths = glob_with(pattern, options)
        .map_err(|_| ParsingError::RegularParsingError("spikes_path is not a valid pattern"))?;

    let mut paths = Vec::new();
    for entry in glob_paths {
        paths.push(entry.map_err(|e| e.into_error())?);
    }
    Ok(paths)
}
