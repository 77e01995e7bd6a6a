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
//! Wide-column emulator wire types
//!
//! Tables hold rows ordered by key; each row holds cells addressed by
//! `(family, qualifier)`.

use serde::{Deserialize, Serialize};

/// Request for POST /tables
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateTableRequest {
    /// Table name
    pub name: String,
    /// Column families created together with the table
    pub column_families: Vec<String>,
}

/// Response for GET /tables/{name}
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    /// Table name
    pub name: String,
    /// Column families, sorted
    pub column_families: Vec<String>,
}

/// Response for GET /tables
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListTablesResponse {
    /// Table names, sorted
    pub tables: Vec<String>,
}

/// A single cell of a row
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Column family
    pub family: String,
    /// Column qualifier within the family
    pub qualifier: String,
    /// Raw cell value
    pub value: Vec<u8>,
}

/// A row with all of its cells, ordered by `(family, qualifier)`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Row key
    pub key: String,
    /// Cells of the row
    pub cells: Vec<Cell>,
}

impl Row {
    /// Value of the cell at `family:qualifier`, if present
    pub fn cell(&self, family: &str, qualifier: &str) -> Option<&[u8]> {
        self.cells
            .iter()
            .find(|c| c.family == family && c.qualifier == qualifier)
            .map(|c| c.value.as_slice())
    }
}

/// One change applied by POST /tables/{name}/mutate
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Write (or overwrite) a cell
    SetCell {
        /// Row key
        row_key: String,
        /// Column family, must exist on the table
        family: String,
        /// Column qualifier
        qualifier: String,
        /// New value
        value: Vec<u8>,
    },
    /// Remove a cell; a row left without cells disappears
    DeleteCell {
        /// Row key
        row_key: String,
        /// Column family
        family: String,
        /// Column qualifier
        qualifier: String,
    },
    /// Remove a whole row
    DeleteRow {
        /// Row key
        row_key: String,
    },
}

/// Request for POST /tables/{name}/mutate
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MutateRowsRequest {
    /// Mutations, applied in order
    pub mutations: Vec<Mutation>,
}

/// Which rows a read returns
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowSet {
    /// Exactly these keys; missing keys are skipped
    Keys {
        /// Row keys
        keys: Vec<String>,
    },
    /// Every row whose key starts with `prefix`
    Prefix {
        /// Key prefix
        prefix: String,
    },
    /// Rows in `[start, end)`; an absent end is unbounded
    Range {
        /// Inclusive lower bound
        start: String,
        /// Exclusive upper bound
        end: Option<String>,
    },
}

/// Request for POST /tables/{name}/read
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReadRowsRequest {
    /// Rows to read
    pub rows: RowSet,
}

/// Response for POST /tables/{name}/read
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadRowsResponse {
    /// Matching rows in key order
    pub rows: Vec<Row>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_is_tagged() {
        let m = Mutation::DeleteRow {
            row_key: "r1".to_string(),
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"op\":\"delete_row\""));
    }

    #[test]
    fn test_row_set_unbounded_range() {
        let json = r#"{"kind":"range","start":"a","end":null}"#;
        let rows: RowSet = serde_json::from_str(json).unwrap();
        assert_eq!(
            rows,
            RowSet::Range {
                start: "a".to_string(),
                end: None
            }
        );
    }

    #[test]
    fn test_row_cell_lookup() {
        let row = Row {
            key: "k".to_string(),
            cells: vec![Cell {
                family: "f".to_string(),
                qualifier: "c".to_string(),
                value: vec![1, 2],
            }],
        };
        assert_eq!(row.cell("f", "c"), Some(&[1u8, 2][..]));
        assert_eq!(row.cell("f", "missing"), None);
    }
}
