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

//! The errors that can occur when computing exact statistics of an RBM.
//! Numerical degeneracies (a divergence against a model that gives an observed pattern zero
//! probability) are not errors, they come back as non-finite values.

use ndarray::ShapeError;
use std::error::Error;
use std::fmt;
use std::io;
use yaml_rust::ScanError;

/// Helper type for a call that could go wrong.
pub type RbmResult<T> = Result<T, RbmError>;

/// Error type for the exact RBM statistics.
#[derive(Debug)]
pub enum RbmError {
    /// The axis passed to `unique` does not exist for the array
    InvalidAxis {
        /// The requested axis
        axis: usize,
        /// Number of dimensions of the array
        ndim: usize,
    },
    /// The slices can't be packed into comparison keys
    UnsupportedDtype(String),
    /// The size of a fisher information matrix is not `nvis + nhid + nvis*nhid` for any `nhid`
    DimensionMismatch {
        /// Side length of the matrix
        size: usize,
        /// The number of visible units it was paired with
        nvis: usize,
    },
    /// Biases, weights, patterns or samples that don't line up
    ShapeMismatch {
        /// What was being lined up
        context: &'static str,
        /// The size that was needed
        expected: usize,
        /// The size that was given
        found: usize,
    },
    /// The layer to be enumerated has more units than can be packed into a pattern code
    EnumerationTooLarge {
        /// Units in the smaller layer
        units: usize,
    },
    /// Not enough observations, a covariance needs two and frequencies need one
    EmptySample {
        /// Number of observations seen
        observations: usize,
    },
    /// Ndarray could not build an array of the requested shape
    ShapeError(ShapeError),
    /// IO error when opening files
    IoError(io::Error),
    /// Parsing error when loading a yaml file
    ParsingError(ParsingError),
}

impl fmt::Display for RbmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RbmError::IoError(ref e) => write!(f, "{}", e),
            RbmError::ParsingError(ref e) => write!(f, "{}", e),
            RbmError::ShapeError(ref e) => write!(f, "{}", e),
            RbmError::InvalidAxis { axis, ndim } => write!(
                f,
                "invalid axis {} specified for unique on an array with {} dimensions",
                axis, ndim
            ),
            RbmError::UnsupportedDtype(ref msg) => {
                write!(f, "the axis argument to unique is not supported: {}", msg)
            }
            RbmError::DimensionMismatch { size, nvis } => write!(
                f,
                "a fisher information matrix of size {} can't be split with {} visible units",
                size, nvis
            ),
            RbmError::ShapeMismatch {
                context,
                expected,
                found,
            } => write!(
                f,
                "shape mismatch in {}, expected {} but found {}",
                context, expected, found
            ),
            RbmError::EnumerationTooLarge { units } => write!(
                f,
                "can't enumerate all states of a layer with {} units",
                units
            ),
            RbmError::EmptySample { observations } => write!(
                f,
                "not enough observations in the sample, got {}",
                observations
            ),
        }
    }
}

#[allow(deprecated)]
impl Error for RbmError {
    fn description(&self) -> &str {
        match *self {
            RbmError::IoError(ref e) => e.description(),
            RbmError::ParsingError(ref e) => e.description(),
            RbmError::ShapeError(ref e) => e.description(),
            RbmError::InvalidAxis { .. } => "invalid axis specified for unique",
            RbmError::UnsupportedDtype(..) => "the axis argument to unique is not supported",
            RbmError::DimensionMismatch { .. } => {
                "fisher information matrix size does not match the visible units"
            }
            RbmError::ShapeMismatch { .. } => "biases, weights and patterns do not line up",
            RbmError::EnumerationTooLarge { .. } => "the enumerated layer is too large",
            RbmError::EmptySample { .. } => "not enough observations in the sample",
        }
    }

    fn cause(&self) -> Option<&dyn Error> {
        match *self {
            RbmError::IoError(ref e) => Some(e),
            RbmError::ParsingError(ref e) => Some(e),
            RbmError::ShapeError(ref e) => Some(e),
            RbmError::InvalidAxis { .. } => None,
            RbmError::UnsupportedDtype(..) => None,
            RbmError::DimensionMismatch { .. } => None,
            RbmError::ShapeMismatch { .. } => None,
            RbmError::EnumerationTooLarge { .. } => None,
            RbmError::EmptySample { .. } => None,
        }
    }
}

impl From<io::Error> for RbmError {
    fn from(err: io::Error) -> Self {
        RbmError::IoError(err)
    }
}

impl From<ShapeError> for RbmError {
    fn from(err: ShapeError) -> Self {
        RbmError::ShapeError(err)
    }
}

impl From<ParsingError> for RbmError {
    fn from(err: ParsingError) -> Self {
        RbmError::ParsingError(err)
    }
}

impl From<ScanError> for RbmError {
    fn from(err: ScanError) -> Self {
        RbmError::ParsingError(ParsingError::YamlScanError(err))
    }
}

impl From<RbmError> for io::Error {
    fn from(err: RbmError) -> Self {
        match err {
            RbmError::IoError(e) => e,
            e => io::Error::new(io::ErrorKind::Other, Box::new(e)),
        }
    }
}

impl RbmError {
    /// Shorthand for a shape mismatch
    pub fn shape_mismatch(context: &'static str, expected: usize, found: usize) -> RbmError {
        RbmError::ShapeMismatch {
            context,
            expected,
            found,
        }
    }
}

/// A parsing error occored while reading a config file
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
    /// The yaml scanner rejected the file
    YamlScanError(ScanError),
    /// Something else happened parsing a string
    RegularParsingError(&'static str),
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParsingError::YamlScanError(ref e) => write!(f, "{}", e),
            ParsingError::MalformedYamlError {
                ref file_name,
                ref field,
            } => write!(
                f,
                "there is a error reading the yaml entry {} in {}",
                field, file_name
            ),
            ParsingError::MissingYamlError {
                ref file_name,
                ref field,
            } => write!(f, "the field {} is missing from {}", field, file_name),
            ParsingError::RegularParsingError(msg) => write!(f, "Error parsing a string: {}", msg),
        }
    }
}

#[allow(deprecated)]
impl Error for ParsingError {
    fn description(&self) -> &str {
        match *self {
            ParsingError::YamlScanError(ref e) => e.description(),
            ParsingError::MalformedYamlError { .. } => "there is a error reading a yaml entry",
            ParsingError::MissingYamlError { .. } => "not all message fields set",
            ParsingError::RegularParsingError(..) => "Error parsing a string",
        }
    }

    fn cause(&self) -> Option<&dyn Error> {
        match *self {
            ParsingError::YamlScanError(ref e) => Some(e),
            ParsingError::MalformedYamlError { .. } => None,
            ParsingError::MissingYamlError { .. } => None,
            ParsingError::RegularParsingError(..) => None,
        }
    }
}
