//! Wide source tables → one long, merged table of mortality rates.
//!
//! ```text
//!  mortality (wide)      population (wide)
//!        │ melt                │ melt
//!        ▼                     ▼
//!   deaths per age        population per age
//!        └──── left join ──────┘   on (Country, Year, Sex, Age)
//!                   │
//!                   ▼  backfill Pop per (Country, Sex, Age), by Year
//!                   ▼  drop rows missing Deaths or Pop
//!                   ▼  sum per (Country, Year, Cancer, Age, Sex)
//!                   ▼  drop Pop <= 0, Rate = Deaths / Pop * 100 000
//!             MortalityTable
//! ```

use std::collections::{BTreeMap, HashMap};

use super::error::LoadError;
use super::model::{AgeBracket, MergedRecord, MortalityTable, RawTable, Sex, Value};
use super::source::{Fetcher, Source};

const COUNTRY: &str = "Country";
const YEAR: &str = "Year";
const CANCER: &str = "Cancer";
const SEX: &str = "Sex";

/// Identifier columns of the mortality table; every other column is an age bracket.
pub const MORTALITY_ID_COLUMNS: [&str; 4] = [COUNTRY, YEAR, CANCER, SEX];

/// Identifier columns of the population table; every other column is an age bracket.
pub const POPULATION_ID_COLUMNS: [&str; 3] = [COUNTRY, YEAR, SEX];

/// Rates are expressed per this many people.
pub const RATE_SCALE: f64 = 100_000.0;

/// Fetch both sources and build the merged table. Runs once per process.
pub fn load_table(
    fetcher: &Fetcher,
    mortality: &Source,
    population: &Source,
) -> Result<MortalityTable, LoadError> {
    log::info!("Loading mortality table from {mortality}");
    let deaths = fetcher.fetch(mortality)?;
    log::info!("Loading population table from {population}");
    let pops = fetcher.fetch(population)?;
    log::info!(
        "Fetched {} mortality rows and {} population rows",
        deaths.len(),
        pops.len()
    );
    for (name, raw) in [("mortality", &deaths), ("population", &pops)] {
        if raw.is_empty() {
            log::warn!("The {name} source has no data rows");
        }
    }
    build_table(&deaths, &pops)
}

// ---------------------------------------------------------------------------
// Melt
// ---------------------------------------------------------------------------

/// One long-form row: identifier cells, the age bracket, and its value.
#[derive(Debug, Clone, PartialEq)]
struct Melted {
    ids: Vec<Value>,
    age: AgeBracket,
    value: Option<f64>,
}

/// Turn every non-identifier column into `(age, value)` pairs. Rows come out
/// column by column, each column in source row order.
fn melt(raw: &RawTable, table: &'static str, id_columns: &[&str]) -> Result<Vec<Melted>, LoadError> {
    let id_idx = id_columns
        .iter()
        .map(|name| {
            raw.column_index(name).ok_or_else(|| LoadError::MissingColumn {
                table,
                column: name.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let value_idx: Vec<usize> = (0..raw.columns.len())
        .filter(|i| !id_idx.contains(i))
        .collect();

    let mut out = Vec::with_capacity(raw.len() * value_idx.len());
    for &col in &value_idx {
        let age = AgeBracket::new(raw.columns[col].clone());
        for (row_no, row) in raw.rows.iter().enumerate() {
            let cell = &row[col];
            let value = match cell {
                Value::Null => None,
                other => Some(other.as_f64().ok_or_else(|| LoadError::InvalidValue {
                    table,
                    row: row_no,
                    column: raw.columns[col].clone(),
                    message: format!("'{other}' is not a number"),
                })?),
            };
            out.push(Melted {
                ids: id_idx.iter().map(|&i| row[i].clone()).collect(),
                age: age.clone(),
                value,
            });
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Typed identifier cells
// ---------------------------------------------------------------------------

fn text_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn year_id(value: &Value, table: &'static str, row: usize) -> Result<Option<i32>, LoadError> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_i64()
        .and_then(|y| i32::try_from(y).ok())
        .map(Some)
        .ok_or_else(|| LoadError::InvalidValue {
            table,
            row,
            column: YEAR.to_string(),
            message: format!("'{value}' is not a year"),
        })
}

fn sex_id(value: &Value, table: &'static str, row: usize) -> Result<Option<Sex>, LoadError> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .to_string()
        .parse::<Sex>()
        .map(Some)
        .map_err(|message| LoadError::InvalidValue {
            table,
            row,
            column: SEX.to_string(),
            message,
        })
}

/// A mortality row after melting and joining; `None` marks a missing value.
#[derive(Debug, Clone)]
struct JoinedRow {
    country: Option<String>,
    year: Option<i32>,
    cancer: Option<String>,
    sex: Option<Sex>,
    age: AgeBracket,
    deaths: Option<f64>,
    pop: Option<f64>,
}

type JoinKey = (String, i32, Sex, AgeBracket);

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Build the merged table from the two wide tables.
pub fn build_table(mortality: &RawTable, population: &RawTable) -> Result<MortalityTable, LoadError> {
    let pop_index = index_population(population)?;

    let mut rows = Vec::new();
    for (i, m) in melt(mortality, "mortality", &MORTALITY_ID_COLUMNS)?
        .into_iter()
        .enumerate()
    {
        let row = i % mortality.len().max(1);
        let base = JoinedRow {
            country: text_id(&m.ids[0]),
            year: year_id(&m.ids[1], "mortality", row)?,
            cancer: text_id(&m.ids[2]),
            sex: sex_id(&m.ids[3], "mortality", row)?,
            age: m.age,
            deaths: m.value,
            pop: None,
        };

        let matches = match (&base.country, base.year, base.sex) {
            (Some(country), Some(year), Some(sex)) => {
                pop_index.get(&(country.clone(), year, sex, base.age.clone()))
            }
            _ => None,
        };
        match matches {
            Some(pops) => rows.extend(pops.iter().map(|&pop| JoinedRow {
                pop,
                ..base.clone()
            })),
            None => rows.push(base),
        }
    }
    let joined = rows.len();

    backfill_population(&mut rows);
    rows.retain(|r| {
        r.country.is_some()
            && r.year.is_some()
            && r.cancer.is_some()
            && r.sex.is_some()
            && r.deaths.is_some()
            && r.pop.is_some()
    });
    if rows.len() < joined {
        log::warn!(
            "Dropped {} of {joined} joined rows with missing deaths or population",
            joined - rows.len()
        );
    }

    let records = aggregate(rows);
    log::info!("Merged table has {} rows", records.len());
    Ok(MortalityTable::from_records(records))
}

/// Melt the population table and index it by join key, keeping every match.
fn index_population(population: &RawTable) -> Result<HashMap<JoinKey, Vec<Option<f64>>>, LoadError> {
    let mut index: HashMap<JoinKey, Vec<Option<f64>>> = HashMap::new();
    for (i, p) in melt(population, "population", &POPULATION_ID_COLUMNS)?
        .into_iter()
        .enumerate()
    {
        let row = i % population.len().max(1);
        let country = text_id(&p.ids[0]);
        let year = year_id(&p.ids[1], "population", row)?;
        let sex = sex_id(&p.ids[2], "population", row)?;
        if let (Some(country), Some(year), Some(sex)) = (country, year, sex) {
            index
                .entry((country, year, sex, p.age))
                .or_default()
                .push(p.value);
        }
    }
    Ok(index)
}

/// Fill a missing population from the next later row of the same
/// (Country, Sex, Age) group. Rows are visited by ascending year; equal
/// years keep their joined order.
fn backfill_population(rows: &mut [JoinedRow]) {
    let mut groups: HashMap<(String, Sex, AgeBracket), Vec<usize>> = HashMap::new();
    for (i, r) in rows.iter().enumerate() {
        if let (Some(country), Some(sex)) = (&r.country, r.sex) {
            groups
                .entry((country.clone(), sex, r.age.clone()))
                .or_default()
                .push(i);
        }
    }

    let mut filled = 0usize;
    for members in groups.values_mut() {
        members.sort_by_key(|&i| (rows[i].year.unwrap_or(i32::MAX), i));
        let mut next: Option<f64> = None;
        for &i in members.iter().rev() {
            match rows[i].pop {
                Some(pop) => next = Some(pop),
                None if next.is_some() => {
                    rows[i].pop = next;
                    filled += 1;
                }
                None => {}
            }
        }
    }
    if filled > 0 {
        log::info!("Backfilled population for {filled} rows");
    }
}

/// Sum duplicate rows per (Country, Year, Cancer, Age, Sex), drop
/// non-positive populations and derive the rate.
fn aggregate(rows: Vec<JoinedRow>) -> Vec<MergedRecord> {
    let mut sums: BTreeMap<(String, i32, String, AgeBracket, Sex), (f64, f64)> = BTreeMap::new();
    for r in rows {
        let (Some(country), Some(year), Some(cancer), Some(sex), Some(deaths), Some(pop)) =
            (r.country, r.year, r.cancer, r.sex, r.deaths, r.pop)
        else {
            continue;
        };
        let entry = sums.entry((country, year, cancer, r.age, sex)).or_insert((0.0, 0.0));
        entry.0 += deaths;
        entry.1 += pop;
    }

    let total = sums.len();
    let records: Vec<MergedRecord> = sums
        .into_iter()
        .filter(|(_, (_, pop))| *pop > 0.0)
        .map(|((country, year, cancer, age, sex), (deaths, pop))| MergedRecord {
            country,
            year,
            cancer,
            age,
            sex,
            deaths,
            pop,
            rate: deaths / pop * RATE_SCALE,
        })
        .collect();
    if records.len() < total {
        log::warn!(
            "Dropped {} aggregated rows with non-positive population",
            total - records.len()
        );
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::decode_csv;

    fn table(csv: &str) -> RawTable {
        decode_csv(csv.as_bytes()).unwrap()
    }

    fn find<'a>(
        t: &'a MortalityTable,
        country: &str,
        year: i32,
        cancer: &str,
        age: &str,
        sex: Sex,
    ) -> Option<&'a MergedRecord> {
        t.records.iter().find(|r| {
            r.country == country
                && r.year == year
                && r.cancer == cancer
                && r.age.label() == age
                && r.sex == sex
        })
    }

    #[test]
    fn test_melt_orders_by_column_then_row() {
        let raw = table("Country,Year,Sex,Age <5,Age 5-14\nA,2000,M,1,2\nB,2000,M,3,\n");
        let long = melt(&raw, "population", &POPULATION_ID_COLUMNS).unwrap();
        let pairs: Vec<(String, Option<f64>)> = long
            .iter()
            .map(|m| (m.age.label().to_string(), m.value))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Age <5".to_string(), Some(1.0)),
                ("Age <5".to_string(), Some(3.0)),
                ("Age 5-14".to_string(), Some(2.0)),
                ("Age 5-14".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_melt_missing_id_column() {
        let raw = table("Country,Sex,Age <5\nA,M,1\n");
        let err = melt(&raw, "population", &POPULATION_ID_COLUMNS).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column, .. } if column == "Year"));
    }

    #[test]
    fn test_melt_rejects_non_numeric_values() {
        let raw = table("Country,Year,Sex,Age <5\nA,2000,M,lots\n");
        let err = melt(&raw, "population", &POPULATION_ID_COLUMNS).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { row: 0, .. }));
    }

    #[test]
    fn test_build_table_computes_rate() {
        let deaths = table("Country,Year,Cancer,Sex,Age <5,Age >64\nAustria,2012,Lung,M,2,50\n");
        let pops = table("Country,Year,Sex,Age <5,Age >64\nAustria,2012,M,200000,100000\n");
        let t = build_table(&deaths, &pops).unwrap();

        assert_eq!(t.len(), 2);
        let young = find(&t, "Austria", 2012, "Lung", "Age <5", Sex::Male).unwrap();
        assert_eq!(young.rate, 2.0 / 200_000.0 * 100_000.0);
        let old = find(&t, "Austria", 2012, "Lung", "Age >64", Sex::Male).unwrap();
        assert!((old.rate - 50.0).abs() < 1e-9);
        for r in &t.records {
            assert!(r.pop > 0.0);
            assert_eq!(r.rate, r.deaths / r.pop * RATE_SCALE);
        }
    }

    #[test]
    fn test_backfill_uses_next_year_in_group() {
        let deaths = table(
            "Country,Year,Cancer,Sex,Age <5\n\
             Spain,2010,Lung,F,1\n\
             Spain,2011,Lung,F,2\n\
             Spain,2012,Lung,F,3\n",
        );
        // 2010 and 2011 have no population row; 2012 does.
        let pops = table("Country,Year,Sex,Age <5\nSpain,2012,F,1000\n");
        let t = build_table(&deaths, &pops).unwrap();

        assert_eq!(t.len(), 3);
        for year in [2010, 2011, 2012] {
            let r = find(&t, "Spain", year, "Lung", "Age <5", Sex::Female).unwrap();
            assert_eq!(r.pop, 1000.0);
        }
    }

    #[test]
    fn test_backfill_does_not_cross_groups_or_go_backwards() {
        let deaths = table(
            "Country,Year,Cancer,Sex,Age <5\n\
             Spain,2010,Lung,M,1\n\
             Spain,2013,Lung,F,1\n",
        );
        // Only a female 2012 value, and it is earlier than the 2013 female row.
        let pops = table("Country,Year,Sex,Age <5\nSpain,2012,F,500\n");
        let t = build_table(&deaths, &pops).unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn test_rows_missing_deaths_are_dropped() {
        let deaths = table("Country,Year,Cancer,Sex,Age <5,Age 5-14\nIceland,2012,Lung,M,,4\n");
        let pops = table("Country,Year,Sex,Age <5,Age 5-14\nIceland,2012,M,10,10\n");
        let t = build_table(&deaths, &pops).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.records[0].age.label(), "Age 5-14");
    }

    #[test]
    fn test_na_tokens_are_missing_values() {
        let pops = table("Country,Year,Sex,Age <5,Age 5-14\nIceland,2012,M,10,10\n");
        for token in ["NA", "N/A", "NULL", "#N/A", "n/a", "<NA>", "None", "-nan"] {
            let deaths = table(&format!(
                "Country,Year,Cancer,Sex,Age <5,Age 5-14\nIceland,2012,Lung,M,{token},4\n"
            ));
            let t = build_table(&deaths, &pops).unwrap();
            assert_eq!(t.len(), 1, "{token}");
            assert_eq!(t.records[0].age.label(), "Age 5-14");
        }

        // A missing population cell is backfilled like an absent row.
        let deaths = table(
            "Country,Year,Cancer,Sex,Age <5\n\
             Iceland,2011,Lung,M,1\n\
             Iceland,2012,Lung,M,2\n",
        );
        let pops = table(
            "Country,Year,Sex,Age <5\n\
             Iceland,2011,M,NA\n\
             Iceland,2012,M,40\n",
        );
        let t = build_table(&deaths, &pops).unwrap();
        assert_eq!(find(&t, "Iceland", 2011, "Lung", "Age <5", Sex::Male).unwrap().pop, 40.0);
    }

    #[test]
    fn test_backfill_visits_years_in_ascending_order() {
        // Source order is not year order, and the group spans two cancers.
        // Walking the rows in source order would give 2010 the 2013 value.
        let deaths = table(
            "Country,Year,Cancer,Sex,Age <5\n\
             Japan,2010,Lung,M,1\n\
             Japan,2013,Lung,M,1\n\
             Japan,2011,Stomach,M,1\n\
             Japan,2012,Lung,M,1\n",
        );
        let pops = table(
            "Country,Year,Sex,Age <5\n\
             Japan,2012,M,700\n\
             Japan,2013,M,900\n",
        );
        let t = build_table(&deaths, &pops).unwrap();

        assert_eq!(t.len(), 4);
        let pop = |year, cancer| find(&t, "Japan", year, cancer, "Age <5", Sex::Male).unwrap().pop;
        assert_eq!(pop(2010, "Lung"), 700.0);
        assert_eq!(pop(2011, "Stomach"), 700.0);
        assert_eq!(pop(2012, "Lung"), 700.0);
        assert_eq!(pop(2013, "Lung"), 900.0);
    }

    #[test]
    fn test_non_positive_population_is_dropped() {
        let deaths = table("Country,Year,Cancer,Sex,Age <5,Age 5-14\nTurkey,2012,Lung,M,1,1\n");
        let pops = table("Country,Year,Sex,Age <5,Age 5-14\nTurkey,2012,M,0,-3\n");
        let t = build_table(&deaths, &pops).unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn test_duplicates_are_summed() {
        let deaths = table(
            "Country,Year,Cancer,Sex,Age <5\n\
             Sweden,2012,Lung,M,1\n\
             Sweden,2012,Lung,M,2\n",
        );
        let pops = table("Country,Year,Sex,Age <5\nSweden,2012,M,1000\n");
        let t = build_table(&deaths, &pops).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.records[0].deaths, 3.0);
        // Population is summed alongside deaths, once per joined row.
        assert_eq!(t.records[0].pop, 2000.0);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let deaths = table(
            "Country,Year,Cancer,Sex,Age <5,Age 5-14\n\
             Sweden,2012,Lung,M,1,2\n\
             Germany,2012,Lung,F,3,4\n\
             Sweden,2012,Lung,M,5,6\n",
        );
        let pops = table(
            "Country,Year,Sex,Age <5,Age 5-14\n\
             Sweden,2012,M,100,200\n\
             Germany,2012,F,300,400\n",
        );
        let t = build_table(&deaths, &pops).unwrap();

        let rows: Vec<JoinedRow> = t
            .records
            .iter()
            .map(|r| JoinedRow {
                country: Some(r.country.clone()),
                year: Some(r.year),
                cancer: Some(r.cancer.clone()),
                sex: Some(r.sex),
                age: r.age.clone(),
                deaths: Some(r.deaths),
                pop: Some(r.pop),
            })
            .collect();
        assert_eq!(aggregate(rows), t.records);
    }

    #[test]
    fn test_output_sorted_by_keys() {
        let deaths = table(
            "Country,Year,Cancer,Sex,Age >64,Age <5\n\
             Spain,2013,Lung,M,1,1\n\
             Austria,2012,Lung,M,1,1\n",
        );
        let pops = table(
            "Country,Year,Sex,Age >64,Age <5\n\
             Spain,2013,M,10,10\n\
             Austria,2012,M,10,10\n",
        );
        let t = build_table(&deaths, &pops).unwrap();
        let keys: Vec<(&str, &str)> = t
            .records
            .iter()
            .map(|r| (r.country.as_str(), r.age.label()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Austria", "Age <5"),
                ("Austria", "Age >64"),
                ("Spain", "Age <5"),
                ("Spain", "Age >64"),
            ]
        );
        assert_eq!(t.countries, vec!["Austria", "Spain"]);
    }

    #[test]
    fn test_invalid_sex_is_fatal() {
        let deaths = table("Country,Year,Cancer,Sex,Age <5\nSpain,2012,Lung,X,1\n");
        let pops = table("Country,Year,Sex,Age <5\nSpain,2012,M,10\n");
        assert!(matches!(
            build_table(&deaths, &pops),
            Err(LoadError::InvalidValue { .. })
        ));
    }
}
