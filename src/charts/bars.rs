use std::collections::BTreeSet;

use super::AgeSelection;
use crate::data::model::{AgeBracket, MortalityTable};

/// One stacked piece of a country's population bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSegment {
    pub country_idx: usize,
    pub age: AgeBracket,
    pub pop: f64,
    /// Sum of the segments stacked before this one.
    pub offset: f64,
    pub tooltip: String,
}

/// Horizontal stacked bars of population per country.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarModel {
    pub title: String,
    /// y axis, alphabetical; the same countries the heatmap shows.
    pub countries: Vec<String>,
    /// Ages appearing in `segments`, canonical order.
    pub ages: Vec<AgeBracket>,
    pub segments: Vec<BarSegment>,
}

impl BarModel {
    /// Rows outside the age selection are left out. An unset selection keeps
    /// every age.
    pub fn build(
        table: &MortalityTable,
        subset: &[usize],
        selection: &AgeSelection,
        title: String,
    ) -> Self {
        let countries: Vec<String> = subset
            .iter()
            .map(|&i| table.records[i].country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows: Vec<(usize, &AgeBracket, f64)> = subset
            .iter()
            .map(|&i| &table.records[i])
            .filter(|rec| selection.matches(&rec.age))
            .filter_map(|rec| {
                let country_idx = countries.iter().position(|c| *c == rec.country)?;
                Some((country_idx, &rec.age, rec.pop))
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        let mut segments = Vec::with_capacity(rows.len());
        let mut offsets = vec![0.0; countries.len()];
        for (country_idx, age, pop) in rows {
            let offset = offsets[country_idx];
            offsets[country_idx] += pop;
            segments.push(BarSegment {
                country_idx,
                age: age.clone(),
                pop,
                offset,
                tooltip: format!("Age: {age}\nPop: {pop}"),
            });
        }

        let ages = segments
            .iter()
            .map(|s| s.age.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        BarModel {
            title,
            countries,
            ages,
            segments,
        }
    }

    /// Total bar length per country.
    pub fn totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.countries.len()];
        for s in &self.segments {
            totals[s.country_idx] += s.pop;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{MergedRecord, Sex};

    fn rec(country: &str, age: &str, pop: f64) -> MergedRecord {
        MergedRecord {
            country: country.to_string(),
            year: 2012,
            cancer: "Lung".to_string(),
            age: AgeBracket::new(age),
            sex: Sex::Female,
            deaths: 1.0,
            pop,
            rate: 1.0 / pop * 100_000.0,
        }
    }

    fn table() -> MortalityTable {
        MortalityTable::from_records(vec![
            rec("Sweden", "Age >64", 300.0),
            rec("Sweden", "Age <5", 100.0),
            rec("Iceland", "Age <5", 10.0),
            rec("Sweden", "Age 5-14", 200.0),
        ])
    }

    fn all(t: &MortalityTable) -> Vec<usize> {
        (0..t.len()).collect()
    }

    #[test]
    fn test_segments_stack_in_canonical_age_order() {
        let t = table();
        let model = BarModel::build(&t, &all(&t), &AgeSelection::default(), "b".into());
        assert_eq!(model.countries, vec!["Iceland", "Sweden"]);

        let sweden: Vec<(&str, f64, f64)> = model
            .segments
            .iter()
            .filter(|s| s.country_idx == 1)
            .map(|s| (s.age.label(), s.pop, s.offset))
            .collect();
        assert_eq!(
            sweden,
            vec![
                ("Age <5", 100.0, 0.0),
                ("Age 5-14", 200.0, 100.0),
                ("Age >64", 300.0, 300.0),
            ]
        );
        assert_eq!(model.totals(), vec![10.0, 600.0]);
    }

    #[test]
    fn test_selection_restricts_ages() {
        let t = table();
        let mut sel = AgeSelection::default();
        sel.click(&AgeBracket::new("Age <5"));
        let model = BarModel::build(&t, &all(&t), &sel, "b".into());

        assert_eq!(model.segments.len(), 2);
        assert!(model.segments.iter().all(|s| s.offset == 0.0));
        assert_eq!(model.ages, vec![AgeBracket::new("Age <5")]);
        // Country axis stays aligned with the heatmap.
        assert_eq!(model.countries.len(), 2);
    }

    #[test]
    fn test_tooltip() {
        let t = table();
        let model = BarModel::build(&t, &[2], &AgeSelection::default(), "b".into());
        assert_eq!(model.segments[0].tooltip, "Age: Age <5\nPop: 10");
    }
}
