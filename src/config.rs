use std::collections::BTreeSet;
use std::time::Duration;

use clap::Parser;

use crate::data::filter::{clamp_year, FilterSelection};
use crate::data::model::{MortalityTable, Sex};
use crate::data::source::{Source, MORTALITY_URL, POPULATION_URL};

/// Age-specific cancer mortality explorer.
///
/// Logging is controlled with `RUST_LOG` (e.g. `RUST_LOG=debug`).
#[derive(Debug, Parser)]
#[command(name = "mortality-atlas", version, about)]
pub struct Cli {
    /// Mortality table: an http(s) URL or a .csv/.json/.parquet file.
    #[arg(long, value_name = "SOURCE", default_value = MORTALITY_URL)]
    pub mortality: Source,

    /// Population table: an http(s) URL or a .csv/.json/.parquet file.
    #[arg(long, value_name = "SOURCE", default_value = POPULATION_URL)]
    pub population: Source,

    /// HTTP timeout in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub timeout: u64,

    /// Initial year, clamped into the years present in the data.
    #[arg(long)]
    pub year: Option<i32>,

    /// Initial sex (M or F).
    #[arg(long)]
    pub sex: Option<Sex>,

    /// Initial country selection; repeat to select several. Replaces the
    /// built-in default list.
    #[arg(long = "country", value_name = "NAME")]
    pub countries: Vec<String>,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Startup widget values: table-derived defaults overridden by flags.
    pub fn initial_filters(&self, table: &MortalityTable) -> FilterSelection {
        let mut filters = FilterSelection::defaults_for(table);
        if let Some(year) = self.year {
            filters.year = clamp_year(table.year_range, year);
        }
        if let Some(sex) = self.sex {
            filters.sex = sex;
        }
        if !self.countries.is_empty() {
            filters.countries = self.countries.iter().cloned().collect::<BTreeSet<_>>();
        }
        filters
    }
}
