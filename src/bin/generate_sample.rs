use std::path::PathBuf;

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;

use payment_eda::data::derive::INDEX_ARTIFACT;
use payment_eda::data::model::{Column, Table, Value};
use payment_eda::data::writer::write_file;

/// Write a synthetic transaction file for trying out the dashboard.
#[derive(Parser, Debug)]
struct Args {
    /// Output file; the extension picks the format
    #[arg(long, default_value = "sample_transactions.csv")]
    output: PathBuf,

    /// Number of transactions
    #[arg(long, default_value_t = 5_000)]
    rows: usize,

    /// Number of distinct users
    #[arg(long, default_value_t = 400)]
    users: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

/// (country, currency, mid-market rate to EUR)
const ORIGINS: &[(&str, &str, f64)] = &[
    ("GB", "GBP", 1.17),
    ("US", "USD", 0.92),
    ("DE", "EUR", 1.0),
    ("FR", "EUR", 1.0),
    ("ES", "EUR", 1.0),
    ("CH", "CHF", 1.04),
    ("SE", "SEK", 0.088),
];
const TARGETS: &[&str] = &["EUR", "USD", "MXN", "INR", "PHP", "NGN", "PLN"];
const DELIVERY: &[(&str, f64)] = &[("standard", 0.0), ("express", 2.5), ("instant", 4.99)];
const NATIONALITIES: &[&str] = &["GB", "US", "IN", "MX", "PH", "NG", "PL", "DE", "FR"];
const LANGUAGES: &[&str] = &["en", "es", "de", "fr", "pl", "hi"];

struct User {
    id: String,
    first_visit: NaiveDateTime,
    nationality: &'static str,
    language: &'static str,
    birth_year: i64,
    origin: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("invalid start date"))?;

    let users: Vec<User> = (0..args.users.max(1))
        .map(|i| User {
            id: format!("u{i:05}"),
            first_visit: start + Duration::minutes(rng.below(300 * 24 * 60) as i64),
            nationality: rng.pick(NATIONALITIES),
            language: rng.pick(LANGUAGES),
            birth_year: rng.gauss(1988.0, 10.0).round().clamp(1930.0, 2006.0) as i64,
            origin: rng.below(ORIGINS.len()),
        })
        .collect();

    let names = [
        INDEX_ARTIFACT,
        "user_id",
        "created_at",
        "user_first_visit",
        "payment_amount",
        "from_currency",
        "to_currency",
        "from_country",
        "fx_rate",
        "mid_market_fx_rate",
        "delivery_option",
        "delivery_option_fee",
        "user_nationality",
        "user_language",
        "user_birthyear",
    ];
    let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(args.rows); names.len()];

    for row in 0..args.rows {
        // A few heavy users place most orders.
        let user = &users[if rng.next_f64() < 0.3 {
            rng.below(users.len().min(20))
        } else {
            rng.below(users.len())
        }];
        let (country, currency, mid) = ORIGINS[user.origin];
        let created = user.first_visit + Duration::minutes(rng.below(120 * 24 * 60) as i64);
        let amount = (rng.gauss(5.5, 1.0).exp() * 100.0).round() / 100.0;
        let markup = rng.gauss(0.6, 0.25).max(0.0) / 100.0;
        let (delivery, fee) = DELIVERY[rng.below(DELIVERY.len())];

        let cells = [
            Value::Integer(row as i64),
            Value::Text(user.id.clone()),
            Value::DateTime(created),
            Value::DateTime(user.first_visit),
            Value::Float(amount),
            Value::Text(currency.to_string()),
            Value::Text(rng.pick(TARGETS).to_string()),
            Value::Text(country.to_string()),
            Value::Float(mid * (1.0 + markup)),
            Value::Float(mid),
            Value::Text(delivery.to_string()),
            Value::Float(fee),
            Value::Text(user.nationality.to_string()),
            Value::Text(user.language.to_string()),
            Value::Integer(user.birth_year),
        ];
        for (column, cell) in columns.iter_mut().zip(cells) {
            column.push(cell);
        }
    }

    let table = Table::new(
        names
            .iter()
            .zip(columns)
            .map(|(name, values)| Column::new(*name, values))
            .collect(),
    )?;
    write_file(&table, &args.output)?;

    println!(
        "Wrote {} transactions from {} users to {}",
        table.len(),
        users.len(),
        args.output.display()
    );
    Ok(())
}
