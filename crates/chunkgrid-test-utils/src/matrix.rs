// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Configuration axes and their cross-product

use chunkgrid_storage::{ChunkBackend, IndexLayout, KeyDistribution};
use std::fmt;

/// One point in the fixture matrix
///
/// Every combination of axes is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Configuration {
    /// Where chunks are stored (`objectClient` token)
    pub chunk_backend: ChunkBackend,
    /// How index entries are laid out (`columnkey` token)
    pub index_layout: IndexLayout,
    /// Whether row keys are hash-prefixed (`hashPrefix` token)
    pub key_distribution: KeyDistribution,
}

impl Configuration {
    /// Configuration from the three axis values
    pub fn new(
        chunk_backend: ChunkBackend,
        index_layout: IndexLayout,
        key_distribution: KeyDistribution,
    ) -> Self {
        Self {
            chunk_backend,
            index_layout,
            key_distribution,
        }
    }

    /// Every configuration, object-store axis outermost
    ///
    /// The length is the product of the axis cardinalities.
    pub fn all() -> Vec<Configuration> {
        let mut configs = Vec::new();
        for chunk_backend in ChunkBackend::ALL {
            for index_layout in IndexLayout::ALL {
                for key_distribution in KeyDistribution::ALL {
                    configs.push(Configuration::new(chunk_backend, index_layout, key_distribution));
                }
            }
        }
        configs
    }

    /// Fixture name for this configuration within `family`
    ///
    /// `<family>-columnkey:<bool>-objectClient:<bool>-hashPrefix:<bool>`
    pub fn name(&self, family: &str) -> String {
        format!("{}-{}", family, self)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "columnkey:{}-objectClient:{}-hashPrefix:{}",
            self.index_layout.is_column_key(),
            self.chunk_backend.is_object_store(),
            self.key_distribution.is_hash_prefixed()
        )
    }
}
