//! Writes a synthetic expenditure workbook substitute (`sample_budget.parquet`)
//! with the dashboard's column layout, for trying the UI without real data.

use std::sync::Arc;

use anyhow::Context;
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const MINISTRIES: [(&str, f64); 6] = [
    ("Ministère de la Santé", 850.0),
    ("Ministère de l'Éducation", 1_200.0),
    ("Ministère des Finances", 640.0),
    ("Ministère de l'Agriculture", 410.0),
    ("Ministère de la Défense", 980.0),
    ("Ministère des Infrastructures", 730.0),
];

const YEARS: std::ops::RangeInclusive<i64> = 2015..=2023;

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    /// Box-Muller
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Country-level indicators, identical for every ministry of a year.
struct Macro {
    gdp: f64,
    inflation: f64,
    unemployment: f64,
}

fn macro_series(rng: &mut SimpleRng) -> Vec<Macro> {
    let mut gdp = 37.0;
    YEARS
        .map(|_| {
            gdp *= 1.0 + rng.gauss(0.055, 0.02);
            Macro {
                gdp,
                inflation: rng.gauss(9.0, 4.0).max(0.5),
                unemployment: rng.gauss(4.5, 0.6).max(1.0),
            }
        })
        .collect()
}

/// One row per (ministry, year) with the dashboard's column names.
fn sample_batch(seed: u64) -> anyhow::Result<RecordBatch> {
    let mut rng = SimpleRng::new(seed);
    let indicators = macro_series(&mut rng);

    let mut institutions = Vec::new();
    let mut years = Vec::new();
    let mut allocated = Vec::new();
    let mut executed = Vec::new();
    let mut gdp = Vec::new();
    let mut inflation = Vec::new();
    let mut unemployment = Vec::new();

    for (&(ministry, base), growth) in MINISTRIES.iter().zip([0.06_f64, 0.08, 0.04, 0.05, 0.07, 0.09]) {
        for (i, year) in YEARS.enumerate() {
            let budget = base * (1.0 + growth).powi(i as i32) * rng.gauss(1.0, 0.05);
            // Execution rates between roughly 70% and 110%, with the odd gap.
            let rate = rng.gauss(0.9, 0.1).clamp(0.6, 1.15);
            let spent = (rng.next_f64() > 0.05).then_some(budget * rate);

            institutions.push(ministry);
            years.push(year);
            allocated.push(Some(budget));
            executed.push(spent);
            gdp.push(indicators[i].gdp);
            inflation.push(indicators[i].inflation);
            unemployment.push(indicators[i].unemployment);
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Institutions/Ministères", DataType::Utf8, false),
        Field::new("Année", DataType::Int64, false),
        Field::new("Budget Dépense Courante", DataType::Float64, true),
        Field::new("Exécution Dépense", DataType::Float64, true),
        Field::new("PIB (milliards USD)", DataType::Float64, false),
        Field::new("Taux d'inflation (%)", DataType::Float64, false),
        Field::new("Taux de chômage (%)", DataType::Float64, false),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(institutions)),
            Arc::new(Int64Array::from(years)),
            Arc::new(Float64Array::from(allocated)),
            Arc::new(Float64Array::from(executed)),
            Arc::new(Float64Array::from(gdp)),
            Arc::new(Float64Array::from(inflation)),
            Arc::new(Float64Array::from(unemployment)),
        ],
    )
    .context("building record batch")
}

fn main() -> anyhow::Result<()> {
    let batch = sample_batch(42)?;

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_budget.parquet".to_string());
    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("opening parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;

    println!("Wrote {} rows ({} ministries, {} years) to {output_path}", batch.num_rows(), MINISTRIES.len(), YEARS.count());
    Ok(())
}
