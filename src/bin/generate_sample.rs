//! Writes synthetic wide mortality and population tables (CSV and Parquet)
//! so the explorer can run without network access:
//!
//! ```text
//! cargo run --bin generate_sample -- sample_data
//! cargo run -- --mortality sample_data/mortality.csv --population sample_data/population.csv
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const COUNTRIES: [&str; 8] = [
    "Austria", "Germany", "Iceland", "Japan", "Spain", "Sweden", "Thailand", "Turkey",
];
const CANCERS: [&str; 4] = ["Lung", "Stomach", "Colon", "Leukemia"];
const SEXES: [&str; 2] = ["M", "F"];
const AGES: [&str; 8] = [
    "Age <5", "Age 5-14", "Age 15-24", "Age 25-34", "Age 35-44", "Age 45-54", "Age 55-64",
    "Age >64",
];
const YEARS: std::ops::RangeInclusive<i64> = 2000..=2015;

/// Deaths per 100k for the youngest bracket; grows with age.
const BASE_RATE: [f64; 4] = [0.05, 0.03, 0.02, 0.4];

/// Country/year pairs with no population row at all, filled later by backfill.
const POPULATION_GAPS: [(&str, i64); 2] = [("Thailand", 2003), ("Iceland", 2012)];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A wide table: identifier columns followed by one value column per age.
struct Wide {
    countries: Vec<String>,
    years: Vec<i64>,
    cancers: Option<Vec<String>>,
    sexes: Vec<String>,
    ages: Vec<Vec<Option<f64>>>,
}

impl Wide {
    fn new(with_cancer: bool) -> Self {
        Wide {
            countries: Vec::new(),
            years: Vec::new(),
            cancers: with_cancer.then(Vec::new),
            sexes: Vec::new(),
            ages: vec![Vec::new(); AGES.len()],
        }
    }

    fn push(&mut self, country: &str, year: i64, cancer: Option<&str>, sex: &str, values: &[Option<f64>]) {
        self.countries.push(country.to_string());
        self.years.push(year);
        if let (Some(cancers), Some(cancer)) = (&mut self.cancers, cancer) {
            cancers.push(cancer.to_string());
        }
        self.sexes.push(sex.to_string());
        for (column, v) in self.ages.iter_mut().zip(values) {
            column.push(*v);
        }
    }

    fn len(&self) -> usize {
        self.years.len()
    }

    fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;

        let mut header = vec!["Country", "Year"];
        if self.cancers.is_some() {
            header.push("Cancer");
        }
        header.push("Sex");
        header.extend(AGES);
        writer.write_record(&header)?;

        for i in 0..self.len() {
            let mut record = vec![self.countries[i].clone(), self.years[i].to_string()];
            if let Some(cancers) = &self.cancers {
                record.push(cancers[i].clone());
            }
            record.push(self.sexes[i].clone());
            record.extend(
                self.ages
                    .iter()
                    .map(|col| col[i].map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_parquet(&self, path: &Path) -> Result<()> {
        let mut fields = vec![
            Field::new("Country", DataType::Utf8, false),
            Field::new("Year", DataType::Int64, false),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(self.countries.clone())),
            Arc::new(Int64Array::from(self.years.clone())),
        ];
        if let Some(cancers) = &self.cancers {
            fields.push(Field::new("Cancer", DataType::Utf8, false));
            columns.push(Arc::new(StringArray::from(cancers.clone())));
        }
        fields.push(Field::new("Sex", DataType::Utf8, false));
        columns.push(Arc::new(StringArray::from(self.sexes.clone())));
        for (age, values) in AGES.iter().zip(&self.ages) {
            fields.push(Field::new(*age, DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(values.clone())));
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), columns)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let mut population = Wide::new(false);
    let mut mortality = Wide::new(true);

    for (c, &country) in COUNTRIES.iter().enumerate() {
        // Country size in people per age bracket, roughly 50k to 2M.
        let size = 5e4 * (1.0 + c as f64 * 5.0);
        for year in YEARS {
            let growth = 1.0 + 0.004 * (year - YEARS.start()) as f64;
            for &sex in &SEXES {
                let pops: Vec<Option<f64>> = (0..AGES.len())
                    .map(|a| {
                        let shape = 1.0 - 0.06 * a as f64;
                        Some((size * shape * growth * rng.gauss(1.0, 0.02)).round())
                    })
                    .collect();

                if !POPULATION_GAPS.contains(&(country, year)) {
                    population.push(country, year, None, sex, &pops);
                }

                for (k, &cancer) in CANCERS.iter().enumerate() {
                    let deaths: Vec<Option<f64>> = pops
                        .iter()
                        .enumerate()
                        .map(|(a, pop)| {
                            // Sparse missing cells, as in the real registry data.
                            if rng.next_f64() < 0.01 {
                                return None;
                            }
                            let rate = BASE_RATE[k] * 3f64.powi(a as i32);
                            let pop = pop.unwrap_or(0.0);
                            Some((pop * rate / 1e5 * rng.gauss(1.0, 0.15).max(0.0)).round())
                        })
                        .collect();
                    mortality.push(country, year, Some(cancer), sex, &deaths);
                }
            }
        }
    }

    for (name, table) in [("mortality", &mortality), ("population", &population)] {
        table.write_csv(&out_dir.join(format!("{name}.csv")))?;
        table.write_parquet(&out_dir.join(format!("{name}.parquet")))?;
        println!("Wrote {} {name} rows to {}", table.len(), out_dir.display());
    }
    Ok(())
}
