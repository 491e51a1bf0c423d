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

//! The errors that can occur when spikes are loaded, selected or binned
use ndarray::ShapeError;
use std::error::Error;
use std::fmt;
use std::io;
use yaml_rust::ScanError;

///
pub type SpikeResult<T> = Result<T, SpikeError>;

/// Error type for spike trains
#[derive(Debug)]
pub enum SpikeError {
    /// The spike times and the cluster ids are not the same length
    LengthMismatch {
        /// Number of spike times
        times: usize,
        /// Number of cluster ids
        ids: usize,
    },
    /// Bins have to have a finite positive width
    InvalidBinWidth(f64),
    /// A spike time that can't be put in a bin, negative or not a number
    InvalidSpikeTime {
        /// Position of the spike
        index: usize,
        /// The time
        time: f64,
    },
    /// Ndarray could not build the binned matrix
    ShapeError(ShapeError),
    /// IO error when opening files
    IoError(io::Error),
    /// Parsing error when loading a CSV or yaml file
    ParsingError(ParsingError),
}

impl fmt::Display for SpikeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpikeError::IoError(ref e) => write!(f, "{}", e),
            SpikeError::ParsingError(ref e) => write!(f, "{}", e),
            SpikeError::ShapeError(ref e) => write!(f, "{}", e),
            SpikeError::LengthMismatch { times, ids } => write!(
                f,
                "there are {} spike times but {} cluster ids",
                times, ids
            ),
            SpikeError::InvalidBinWidth(dt) => write!(f, "{} is not a valid bin width", dt),
            SpikeError::InvalidSpikeTime { index, time } => {
                write!(f, "spike {} has time {}, which can't be binned", index, time)
            }
        }
    }
}

#[allow(deprecated)]
impl Error for SpikeError {
    fn description(&self) -> &str {
        match self {
            SpikeError::IoError(ref e) => e.description(),
            SpikeError::ParsingError(ref e) => e.description(),
            SpikeError::ShapeError(ref e) => e.description(),
            SpikeError::LengthMismatch { .. } => "spike times and cluster ids differ in length",
            SpikeError::InvalidBinWidth(..) => "invalid bin width",
            SpikeError::InvalidSpikeTime { .. } => "a spike time can't be binned",
        }
    }

    fn cause(&self) -> Option<&dyn Error> {
        match self {
            SpikeError::IoError(ref e) => Some(e),
            SpikeError::ParsingError(ref e) => Some(e),
            SpikeError::ShapeError(ref e) => Some(e),
            SpikeError::LengthMismatch { .. } => None,
            SpikeError::InvalidBinWidth(..) => None,
            SpikeError::InvalidSpikeTime { .. } => None,
        }
    }
}

impl From<io::Error> for SpikeError {
    fn from(err: io::Error) -> Self {
        SpikeError::IoError(err)
    }
}

impl From<csv::Error> for SpikeError {
    fn from(err: csv::Error) -> Self {
        SpikeError::IoError(err.into())
    }
}

impl From<ShapeError> for SpikeError {
    fn from(err: ShapeError) -> Self {
        SpikeError::ShapeError(err)
    }
}

impl From<ParsingError> for SpikeError {
    fn from(err: ParsingError) -> Self {
        SpikeError::ParsingError(err)
    }
}

impl From<ScanError> for SpikeError {
    fn from(err: ScanError) -> Self {
        SpikeError::ParsingError(ParsingError::YamlScanError(err))
    }
}

impl From<SpikeError> for io::Error {
    fn from(err: SpikeError) -> Self {
        match err {
            SpikeError::IoError(e) => e,
            e => io::Error::new(io::ErrorKind::Other, Box::new(e)),
        }
    }
}

impl SpikeError {
    /// Checks that every spike has a cluster id
    pub fn check_lengths(times: usize, ids: usize) -> SpikeResult<()> {
        if times != ids {
            Err(SpikeError::LengthMismatch { times, ids })
        } else {
            Ok(())
        }
    }
}

/// A parsing error occored while doing something with text
#[derive(Debug)]
pub enum ParsingError {
    /// Yaml was messed up
    MalformedYamlError {
        /// The file that was messed up
        file_name: String,
        /// The value that was messed up
        field: String,
    },
    /// A needed field was missing from the file.
    MissingYamlError {
        /// The file
        file_name: String,
        /// The missing field
        field: String,
    },
    /// The yaml scanner failed
    YamlScanError(ScanError),
    /// An error reading the CSV
    CSVReadError {
        /// The file that the error occored in
        file_name: String,
        /// The line that was messed up
        line_number: usize,
        /// The column name that was messed up
        key: String,
    },
    /// Something else happened parsing a string
    RegularParsingError(&'static str),
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[allow(deprecated)]
impl Error for ParsingError {
    fn description(&self) -> &str {
        match self {
            ParsingError::MalformedYamlError { .. } => "there is a error reading a yaml entry",
            ParsingError::MissingYamlError { .. } => "not all message fields set",
            ParsingError::YamlScanError(..) => "the yaml file could not be scanned",
            ParsingError::CSVReadError { .. } => "issue reading a CSV entry",
            ParsingError::RegularParsingError(..) => "Error parsing a string",
        }
    }

    fn cause(&self) -> Option<&dyn Error> {
        match self {
            ParsingError::YamlScanError(ref e) => Some(e),
            ParsingError::MalformedYamlError { .. } => None,
            ParsingError::MissingYamlError { .. } => None,
            ParsingError::CSVReadError { .. } => None,
            ParsingError::RegularParsingError(..) => None,
        }
    }
}
