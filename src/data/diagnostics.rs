use std::collections::BTreeSet;

use super::model::MortalityTable;

/// How well the filtered subset covers the requested countries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// Every requested country has at least one row.
    Complete,
    /// The subset is empty.
    NoData,
    /// Some requested countries have rows, these do not.
    Missing(Vec<String>),
}

impl Coverage {
    /// Text shown under the charts, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            Coverage::Complete => None,
            Coverage::NoData => Some("No data available.".to_string()),
            Coverage::Missing(countries) => {
                Some(format!("No data available for {}.", countries.join(", ")))
            }
        }
    }
}

/// Compare requested countries with those present in the subset rows.
pub fn coverage(
    table: &MortalityTable,
    subset: &[usize],
    requested: &BTreeSet<String>,
) -> Coverage {
    if subset.is_empty() {
        return Coverage::NoData;
    }
    let present: BTreeSet<&str> = subset
        .iter()
        .map(|&i| table.records[i].country.as_str())
        .collect();
    let missing: Vec<String> = requested
        .iter()
        .filter(|c| !present.contains(c.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() {
        Coverage::Complete
    } else {
        Coverage::Missing(missing)
    }
}
