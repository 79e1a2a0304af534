use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Value – a single cell of a wide source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, mirroring what CSV, JSON and Parquet sources carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

/// Text cells read as missing values, the default set of common dataframe
/// CSV readers.
pub const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl Value {
    /// Guess the type of a raw text cell. Empty cells and [`NA_TOKENS`] are
    /// missing values.
    pub fn guess(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || NA_TOKENS.contains(&s) {
            return Value::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_nan() {
                return Value::Null;
            }
            return Value::Float(f);
        }
        Value::Text(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell; text that does not parse yields `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if !v.is_nan() => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            _ => None,
        }
    }

    /// Integer view; floats qualify only when they carry no fraction.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – a wide table as decoded from a source
// ---------------------------------------------------------------------------

/// Column names plus row-major cells. Every row has `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Sex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Code used in the source files.
    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    /// Plural noun used in chart titles.
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "males",
            Sex::Female => "females",
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Sex::Male),
            "F" | "f" => Ok(Sex::Female),
            other => Err(format!("unknown sex '{other}', expected M or F")),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// AgeBracket
// ---------------------------------------------------------------------------

/// Canonical left-to-right order of the age brackets.
pub const CANONICAL_AGES: [&str; 8] = [
    "<5", "5-14", "15-24", "25-34", "35-44", "45-54", "55-64", ">64",
];

/// An age bracket, keeping the label exactly as the source column spelled it
/// (e.g. `"Age <5"`). Ordering follows [`CANONICAL_AGES`]; unknown labels
/// come last, alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgeBracket(String);

impl AgeBracket {
    pub fn new(label: impl Into<String>) -> Self {
        AgeBracket(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// Position in [`CANONICAL_AGES`], or `None` for unrecognised labels.
    pub fn rank(&self) -> Option<usize> {
        let bare = self.0.trim();
        let bare = bare.strip_prefix("Age").map(str::trim).unwrap_or(bare);
        CANONICAL_AGES.iter().position(|a| *a == bare)
    }
}

impl Ord for AgeBracket {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for AgeBracket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// MergedRecord – one row of the joined, aggregated table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub country: String,
    pub year: i32,
    pub cancer: String,
    pub age: AgeBracket,
    pub sex: Sex,
    /// Sum of deaths over duplicate source rows.
    pub deaths: f64,
    /// Population, always > 0.
    pub pop: f64,
    /// Deaths per 100 000 population.
    pub rate: f64,
}

// ---------------------------------------------------------------------------
// MortalityTable – the complete merged dataset
// ---------------------------------------------------------------------------

/// The merged table with pre-computed widget domains. Built once, then only
/// read.
#[derive(Debug, Clone, Default)]
pub struct MortalityTable {
    pub records: Vec<MergedRecord>,
    /// Distinct countries in order of first appearance.
    pub countries: Vec<String>,
    /// Distinct cancer types in order of first appearance.
    pub cancers: Vec<String>,
    /// Smallest and largest year, `None` for an empty table.
    pub year_range: Option<(i32, i32)>,
}

impl MortalityTable {
    pub fn from_records(records: Vec<MergedRecord>) -> Self {
        let mut countries = Vec::new();
        let mut cancers = Vec::new();
        let mut seen_countries = BTreeSet::new();
        let mut seen_cancers = BTreeSet::new();
        let mut year_range: Option<(i32, i32)> = None;

        for rec in &records {
            if seen_countries.insert(rec.country.as_str()) {
                countries.push(rec.country.clone());
            }
            if seen_cancers.insert(rec.cancer.as_str()) {
                cancers.push(rec.cancer.clone());
            }
            year_range = Some(match year_range {
                Some((lo, hi)) => (lo.min(rec.year), hi.max(rec.year)),
                None => (rec.year, rec.year),
            });
        }

        MortalityTable {
            records,
            countries,
            cancers,
            year_range,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, year: i32, cancer: &str) -> MergedRecord {
        MergedRecord {
            country: country.to_string(),
            year,
            cancer: cancer.to_string(),
            age: AgeBracket::new("Age <5"),
            sex: Sex::Male,
            deaths: 1.0,
            pop: 10.0,
            rate: 10_000.0,
        }
    }

    #[test]
    fn test_value_guess() {
        assert_eq!(Value::guess(""), Value::Null);
        assert_eq!(Value::guess("  "), Value::Null);
        assert_eq!(Value::guess("2012"), Value::Integer(2012));
        assert_eq!(Value::guess("1.5"), Value::Float(1.5));
        assert_eq!(Value::guess("Austria"), Value::Text("Austria".into()));
    }

    #[test]
    fn test_value_guess_na_tokens() {
        for token in NA_TOKENS {
            assert_eq!(Value::guess(token), Value::Null, "{token}");
        }
        assert_eq!(Value::guess(" NA "), Value::Null);
        // Only the exact spellings count as missing.
        assert_eq!(Value::guess("Na"), Value::Text("Na".into()));
        assert_eq!(Value::guess("Namibia"), Value::Text("Namibia".into()));
    }

    #[test]
    fn test_value_numeric_views() {
        assert_eq!(Value::Float(2012.0).as_i64(), Some(2012));
        assert_eq!(Value::Float(2012.5).as_i64(), None);
        assert_eq!(Value::Text("3".into()).as_f64(), Some(3.0));
        assert_eq!(Value::Text("x".into()).as_f64(), None);
        assert_eq!(Value::Float(f64::NAN).as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_sex_parse() {
        assert_eq!("M".parse::<Sex>(), Ok(Sex::Male));
        assert_eq!(" F ".parse::<Sex>(), Ok(Sex::Female));
        assert!("X".parse::<Sex>().is_err());
        assert_eq!(Sex::Female.label(), "females");
    }

    #[test]
    fn test_age_rank_accepts_prefixed_and_bare_labels() {
        assert_eq!(AgeBracket::new("Age <5").rank(), Some(0));
        assert_eq!(AgeBracket::new("5-14").rank(), Some(1));
        assert_eq!(AgeBracket::new("Age >64").rank(), Some(7));
        assert_eq!(AgeBracket::new("Total").rank(), None);
    }

    #[test]
    fn test_age_ordering_is_canonical() {
        let mut ages: Vec<AgeBracket> = ["Total", "Age >64", "Age 15-24", "Age <5", "Age 5-14"]
            .into_iter()
            .map(AgeBracket::new)
            .collect();
        ages.sort();
        let labels: Vec<&str> = ages.iter().map(AgeBracket::label).collect();
        assert_eq!(
            labels,
            vec!["Age <5", "Age 5-14", "Age 15-24", "Age >64", "Total"]
        );
    }

    #[test]
    fn test_table_domains() {
        let table = MortalityTable::from_records(vec![
            record("Spain", 2001, "Lung"),
            record("Austria", 1999, "Stomach"),
            record("Spain", 2010, "Lung"),
        ]);
        assert_eq!(table.countries, vec!["Spain", "Austria"]);
        assert_eq!(table.cancers, vec!["Lung", "Stomach"]);
        assert_eq!(table.year_range, Some((1999, 2010)));
        assert_eq!(MortalityTable::default().year_range, None);
    }
}
