use std::collections::BTreeSet;

use super::model::{MergedRecord, MortalityTable, Sex};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Year shown first, clamped into the table's range.
pub const DEFAULT_YEAR: i32 = 2012;

/// Countries selected on startup. Entries absent from the data are harmless.
pub const DEFAULT_COUNTRIES: [&str; 7] = [
    "Austria", "Germany", "Iceland", "Spain", "Sweden", "Thailand", "Turkey",
];

/// Clamp `preferred` into `range`; without a range it is returned unchanged.
pub fn clamp_year(range: Option<(i32, i32)>, preferred: i32) -> i32 {
    match range {
        Some((lo, hi)) => preferred.clamp(lo, hi),
        None => preferred,
    }
}

// ---------------------------------------------------------------------------
// Widget selections
// ---------------------------------------------------------------------------

/// Current value of the four filter widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub year: i32,
    pub sex: Sex,
    pub countries: BTreeSet<String>,
    /// `None` only when the table has no cancer types at all.
    pub cancer: Option<String>,
}

impl FilterSelection {
    /// Startup selection: year 2012 (clamped), males, the default countries
    /// and the first cancer type in the table.
    pub fn defaults_for(table: &MortalityTable) -> Self {
        FilterSelection {
            year: clamp_year(table.year_range, DEFAULT_YEAR),
            sex: Sex::default(),
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            cancer: table.cancers.first().cloned(),
        }
    }

    /// The predicates in application order: year, sex, country, cancer.
    pub fn predicates(&self) -> [Predicate<'_>; 4] {
        [
            Predicate::Year(self.year),
            Predicate::Sex(self.sex),
            Predicate::Countries(&self.countries),
            Predicate::Cancer(self.cancer.as_deref()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// A single per-row test. Each one looks at one field only, so any order of
/// application gives the same rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate<'a> {
    Year(i32),
    Sex(Sex),
    Countries(&'a BTreeSet<String>),
    /// An unset cancer matches nothing.
    Cancer(Option<&'a str>),
}

impl Predicate<'_> {
    pub fn matches(&self, rec: &MergedRecord) -> bool {
        match self {
            Predicate::Year(year) => rec.year == *year,
            Predicate::Sex(sex) => rec.sex == *sex,
            Predicate::Countries(set) => set.contains(&rec.country),
            Predicate::Cancer(cancer) => *cancer == Some(rec.cancer.as_str()),
        }
    }
}

/// Narrow the table by each predicate in turn and return the surviving row
/// indices, in table order.
pub fn apply_predicates(table: &MortalityTable, predicates: &[Predicate<'_>]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..table.len()).collect();
    for predicate in predicates {
        indices.retain(|&i| predicate.matches(&table.records[i]));
    }
    indices
}

/// Return indices of rows passing all four widget filters.
pub fn filtered_indices(table: &MortalityTable, selection: &FilterSelection) -> Vec<usize> {
    apply_predicates(table, &selection.predicates())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::AgeBracket;

    fn rec(country: &str, year: i32, cancer: &str, sex: Sex) -> MergedRecord {
        MergedRecord {
            country: country.to_string(),
            year,
            cancer: cancer.to_string(),
            age: AgeBracket::new("Age <5"),
            sex,
            deaths: 1.0,
            pop: 100.0,
            rate: 1000.0,
        }
    }

    fn sample_table() -> MortalityTable {
        MortalityTable::from_records(vec![
            rec("Austria", 2011, "Lung", Sex::Male),
            rec("Austria", 2012, "Lung", Sex::Male),
            rec("Austria", 2012, "Lung", Sex::Female),
            rec("Austria", 2012, "Stomach", Sex::Male),
            rec("Germany", 2012, "Lung", Sex::Male),
            rec("Japan", 2012, "Lung", Sex::Male),
            rec("Spain", 2013, "Lung", Sex::Male),
        ])
    }

    fn selection(countries: &[&str]) -> FilterSelection {
        FilterSelection {
            year: 2012,
            sex: Sex::Male,
            countries: countries.iter().map(|c| c.to_string()).collect(),
            cancer: Some("Lung".to_string()),
        }
    }

    #[test]
    fn test_clamp_year() {
        assert_eq!(clamp_year(Some((1990, 2020)), 2012), 2012);
        assert_eq!(clamp_year(Some((2014, 2020)), 2012), 2014);
        assert_eq!(clamp_year(Some((1990, 2005)), 2012), 2005);
        assert_eq!(clamp_year(None, 2012), 2012);
    }

    #[test]
    fn test_defaults_for_table() {
        let sel = FilterSelection::defaults_for(&sample_table());
        assert_eq!(sel.year, 2012);
        assert_eq!(sel.sex, Sex::Male);
        assert_eq!(sel.countries.len(), 7);
        assert!(sel.countries.contains("Thailand"));
        assert_eq!(sel.cancer.as_deref(), Some("Lung"));
    }

    #[test]
    fn test_filtered_indices() {
        let table = sample_table();
        let idx = filtered_indices(&table, &selection(&["Austria", "Germany"]));
        assert_eq!(idx, vec![1, 4]);
    }

    #[test]
    fn test_empty_country_selection_yields_empty_subset() {
        let table = sample_table();
        assert!(filtered_indices(&table, &selection(&[])).is_empty());
    }

    #[test]
    fn test_unset_cancer_matches_nothing() {
        let table = sample_table();
        let mut sel = selection(&["Austria"]);
        sel.cancer = None;
        assert!(filtered_indices(&table, &sel).is_empty());
    }

    #[test]
    fn test_filtering_is_pure() {
        let table = sample_table();
        let sel = selection(&["Austria", "Japan", "Nowhere"]);
        let first = filtered_indices(&table, &sel);
        let second = filtered_indices(&table, &sel);
        assert_eq!(first, second);
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn test_predicate_order_does_not_matter() {
        let table = sample_table();
        let sel = selection(&["Austria", "Japan"]);
        let preds = sel.predicates();
        let expected = apply_predicates(&table, &preds);

        let mut orders: Vec<Vec<usize>> = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let order = vec![a, b, c, d];
                        let distinct: BTreeSet<_> = order.iter().collect();
                        if distinct.len() == 4 {
                            orders.push(order);
                        }
                    }
                }
            }
        }
        assert_eq!(orders.len(), 24);

        for order in orders {
            let permuted: Vec<Predicate<'_>> = order.iter().map(|&i| preds[i]).collect();
            assert_eq!(apply_predicates(&table, &permuted), expected, "order {order:?}");
        }
    }
}
