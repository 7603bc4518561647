use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validator::header::{resolve_header, RawRow};

/// One value column checked between the IT export and the master data.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Name shown in remarks, mismatch reasons and export headers.
    pub display: &'static str,
    /// Case-insensitive substring matched against header names.
    pub pattern: &'static str,
    /// Carried-only fields appear in the report but never raise an issue.
    pub compared: bool,
}

const TARIF_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        display: "Tarif",
        pattern: "TARIF",
        compared: true,
    },
    FieldSpec {
        display: "SLA",
        pattern: "FORM",
        compared: true,
    },
    // Upper SLA bound rides along for display; the issue check only looks
    // at the lower bound.
    FieldSpec {
        display: "SLA s/d",
        pattern: "THRU",
        compared: false,
    },
];

const BIAYA_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        display: "Biaya",
        pattern: "BIAYA",
        compared: true,
    },
    FieldSpec {
        display: "Minimum",
        pattern: "MIN",
        compared: true,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Tarif,
    Biaya,
}

impl Category {
    pub fn code(&self) -> &'static str {
        match self {
            Category::Tarif => "TARIF",
            Category::Biaya => "BIAYA",
        }
    }

    /// Header substring that locates the join-key column.
    pub fn key_pattern(&self) -> &'static str {
        match self {
            Category::Tarif => "SYS",
            Category::Biaya => "DEST",
        }
    }

    pub fn key_label(&self) -> &'static str {
        match self {
            Category::Tarif => "Kode Sistem",
            Category::Biaya => "Kode Dest",
        }
    }

    /// Service-label column, carried for display only.
    pub fn label_pattern(&self) -> Option<&'static str> {
        match self {
            Category::Tarif => Some("SERV"),
            Category::Biaya => None,
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Category::Tarif => TARIF_FIELDS,
            Category::Biaya => BIAYA_FIELDS,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Column indices for one file's headers, resolved once per pass instead of
/// per row. `None` entries degrade to empty/zero values downstream.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    pub key: Option<usize>,
    pub origin: Option<usize>,
    pub destination: Option<usize>,
    pub label: Option<usize>,
    /// Parallel to `category.fields()`.
    pub values: Vec<Option<usize>>,
}

impl ColumnMap {
    pub fn resolve(category: Category, headers: &[String]) -> Self {
        Self {
            key: resolve_header(headers, category.key_pattern()),
            origin: resolve_header(headers, "ORIG"),
            destination: resolve_header(headers, "DEST"),
            label: category
                .label_pattern()
                .and_then(|pattern| resolve_header(headers, pattern)),
            values: category
                .fields()
                .iter()
                .map(|spec| resolve_header(headers, spec.pattern))
                .collect(),
        }
    }

    pub fn cell<'a>(&self, row: &'a RawRow, index: Option<usize>) -> &'a str {
        match index {
            Some(i) => row.cell(i),
            None => "",
        }
    }
}

/// Numeric cells are reduced to their digits; anything unparseable is 0.
pub fn parse_amount(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
