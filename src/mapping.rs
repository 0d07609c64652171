// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Policies for turning an escape count into a color table index.

use std::str::FromStr;

/// How escape counts are spread over the color table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexMapper {
    /// Count modulo the table size: every color band is one iteration
    /// wide.
    Linear,
    /// Log-scaled, so the low counts near the edge of the view get
    /// more of the palette than the high counts near the set.
    Logarithmic,
}

impl IndexMapper {
    /// Maps `count` into `[0, table_size)`.  `table_size` must be
    /// positive.
    pub fn map(self, count: usize, table_size: usize) -> usize {
        match self {
            IndexMapper::Linear => count % table_size,
            IndexMapper::Logarithmic => {
                let n = table_size as f64;
                let scaled = (1.0 + count as f64).ln() / (1.0 + n).ln() * n;
                (scaled as usize) % table_size
            }
        }
    }
}

impl Default for IndexMapper {
    fn default() -> Self {
        IndexMapper::Linear
    }
}

impl FromStr for IndexMapper {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(IndexMapper::Linear),
            "log" | "logarithmic" => Ok(IndexMapper::Logarithmic),
            _ => Err(format!("Unknown index mapping '{}'", s)),
        }
    }
}
