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

//! Bitpacks a binary layer state into a u64 together with the number of units.
//! We store the unit count in the top 6 bits, so a code can describe layers of up to
//! 58 units. The unit states are stored in the remaining 58 bits, the first unit in the
//! most significant used bit.
//!
//! The enumeration order of [`BinaryPatterns`] is the cartesian product of `[true, false]`
//! over the units: all units on first, the last unit flipping fastest.
use serde::{Deserialize, Serialize};
use std::convert::From;
use std::fmt;
use std::str::FromStr;

const UMASK_U64: u64 = 0b1111110000000000000000000000000000000000000000000000000000000000;
const BMASK_U64: u64 = 0b0000001111111111111111111111111111111111111111111111111111111111;
const UNIT_SHIFT: u32 = 58;

/// The largest layer that can be packed into a [`PatternCode`], and so the largest layer
/// that can be exactly enumerated.
pub const MAX_PATTERN_UNITS: usize = 58;

/// The bitpacked state of a binary layer
#[derive(Copy, Clone, Serialize, Deserialize, PartialEq, Eq, std::hash::Hash, PartialOrd, Ord)]
pub struct PatternCode {
    pc: u64,
}

impl From<&[bool]> for PatternCode {
    fn from(pattern: &[bool]) -> PatternCode {
        assert!(
            pattern.len() <= MAX_PATTERN_UNITS,
            "{} units do not fit in a pattern code",
            pattern.len()
        );
        let bits = pattern
            .iter()
            .fold(0u64, |acc, &unit| (acc << 1) | (unit as u64));
        PatternCode {
            pc: ((pattern.len() as u64) << UNIT_SHIFT) | bits,
        }
    }
}

impl From<PatternCode> for Vec<bool> {
    fn from(code: PatternCode) -> Vec<bool> {
        code.to_bools()
    }
}

impl fmt::Display for PatternCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for unit in self.iter() {
            write!(f, "{}", if unit { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl fmt::Debug for PatternCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PatternCode")
            .field("units", &self.units())
            .field("bits", &format_args!("{}", self))
            .finish()
    }
}

impl fmt::Binary for PatternCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#066b}", self.pc)
    }
}

impl PatternCode {
    /// Creates a code from the raw unit bits, the first unit in bit `units - 1`.
    /// Returns `None` if the layer is too large or `bits` has bits set past the layer.
    pub fn new(units: usize, bits: u64) -> Option<PatternCode> {
        if units > MAX_PATTERN_UNITS || (units < 64 && bits >> units != 0) {
            None
        } else {
            Some(PatternCode {
                pc: ((units as u64) << UNIT_SHIFT) | bits,
            })
        }
    }
    /// The underlying u64
    pub fn raw(&self) -> u64 {
        self.pc
    }
    /// Number of units in the layer
    #[inline]
    pub fn units(&self) -> usize {
        ((self.pc & UMASK_U64) >> UNIT_SHIFT) as usize
    }
    /// The packed unit states
    #[inline]
    pub fn bits(&self) -> u64 {
        self.pc & BMASK_U64
    }
    /// State of a single unit
    #[inline]
    pub fn unit(&self, index: usize) -> bool {
        debug_assert!(index < self.units());
        (self.bits() >> (self.units() - 1 - index)) & 1 == 1
    }
    /// Number of units that are on
    #[inline]
    pub fn active(&self) -> u32 {
        self.bits().count_ones()
    }
    /// Iterates over the unit states, first unit first.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.units()).map(move |i| self.unit(i))
    }
    /// Unpacks into a vector of unit states
    pub fn to_bools(&self) -> Vec<bool> {
        self.iter().collect()
    }
    /// Writes the unit states into a buffer of the layer's length
    pub fn fill(&self, out: &mut [bool]) {
        assert_eq!(out.len(), self.units());
        out.iter_mut()
            .enumerate()
            .for_each(|(i, o)| *o = self.unit(i));
    }
}

/// Every state of a binary layer, in cartesian product order of `[true, false]`.
///
/// This never materializes more than the current code, so it is the low memory way
/// of walking a state space.
#[derive(Debug, Clone)]
pub struct BinaryPatterns {
    units: usize,
    next: Option<u64>,
    remaining: u64,
}

impl BinaryPatterns {
    /// All `2^units` states of a layer with `units` units. Returns `None` if the layer
    /// can't be packed.
    pub fn new(units: usize) -> Option<BinaryPatterns> {
        if units > MAX_PATTERN_UNITS {
            None
        } else {
            let count = 1u64 << units;
            Some(BinaryPatterns {
                units,
                next: Some(count - 1),
                remaining: count,
            })
        }
    }

    /// The number of units in each pattern
    pub fn units(&self) -> usize {
        self.units
    }
}

impl Iterator for BinaryPatterns {
    type Item = PatternCode;
    fn next(&mut self) -> Option<PatternCode> {
        let bits = self.next?;
        self.next = bits.checked_sub(1);
        self.remaining -= 1;
        Some(PatternCode {
            pc: ((self.units as u64) << UNIT_SHIFT) | bits,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BinaryPatterns {}

/// Helper trait that cleans up code.
pub trait CodesToVec {
    /// Row major flattening of the unit states, one row per code
    fn to_flat_bools(&self) -> Vec<bool>;
    /// The raw packed bits of each code
    fn to_bits(&self) -> Vec<u64>;
}

impl CodesToVec for [PatternCode] {
    fn to_flat_bools(&self) -> Vec<bool> {
        self.iter().flat_map(|pc| pc.iter().collect::<Vec<bool>>()).collect()
    }
    fn to_bits(&self) -> Vec<u64> {
        self.iter().map(|pc| pc.bits()).collect()
    }
}

/// How an exhaustive computation is carried out. This is always chosen by the caller,
/// so that the worst case memory of a call can be reasoned about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Materialize every intermediate (all patterns, all feature vectors) and reduce in one batch.
    /// Fast, but memory grows with the full state space or sample.
    Vectorized,
    /// Walk the patterns or observations one at a time. Slower, bounded extra memory.
    Serial,
}

impl Default for Strategy {
    fn default() -> Strategy {
        Strategy::Vectorized
    }
}

impl FromStr for Strategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Strategy, String> {
        match s.to_ascii_lowercase().as_str() {
            "vectorized" | "vectorised" => Ok(Strategy::Vectorized),
            "serial" | "streaming" | "lowmem" => Ok(Strategy::Serial),
            other => Err(format!("unknown strategy {:?}", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strategy::Vectorized => write!(f, "vectorized"),
            Strategy::Serial => write!(f, "serial"),
        }
    }
}
