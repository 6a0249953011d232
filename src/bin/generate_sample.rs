use std::path::Path;

use anyhow::{Context, Result};

use shelfscope::data::export::write_file;
use shelfscope::{Availability, Record, Table};

const WORDS: [&str; 24] = [
    "light", "attic", "velvet", "soumission", "sharp", "objects", "sapiens", "requiem", "red",
    "dirty", "little", "secrets", "coming", "woods", "boys", "boat", "black", "maria", "starving",
    "hearts", "shakespeare", "sonnets", "history", "mystery",
];

const RATING_WORDS: [&str; 5] = ["One", "Two", "Three", "Four", "Five"];

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
}

fn title(rng: &mut SimpleRng) -> String {
    let len = 1 + rng.below(4);
    let words: Vec<String> = (0..len)
        .map(|_| {
            let w = WORDS[rng.below(WORDS.len())];
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    words.join(" ")
}

/// Price loosely rising with rating, clamped into the scraped site's range.
fn book(rng: &mut SimpleRng) -> Record {
    let rating = 1 + rng.below(5) as u8;
    let price = rng.gauss(28.0 + 3.0 * rating as f64, 12.0).clamp(10.0, 60.0);
    let availability = if rng.next_f64() < 0.8 {
        Availability::InStock
    } else {
        Availability::OutOfStock
    };
    Record::new(title(rng), (price * 100.0).round() / 100.0, rating, availability)
}

/// Scraper-style CSV: rating words and a few missing prices, for `shelfscope clean`.
fn write_raw(path: &Path, books: &[Record], rng: &mut SimpleRng) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["title", "price", "rating", "availability"])?;
    for b in books {
        let price = if rng.next_f64() < 0.05 {
            String::new()
        } else {
            format!("{:.2}", b.price)
        };
        let rating = RATING_WORDS[usize::from(b.rating) - 1];
        writer.write_record([b.title.as_str(), &price, rating, b.availability.label()])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let books: Vec<Record> = (0..1000).map(|_| book(&mut rng)).collect();
    write_raw(Path::new("sample_raw.csv"), &books, &mut rng)?;

    let table = Table::from_records(books);
    for output_path in ["sample_books.csv", "sample_books.parquet"] {
        write_file(Path::new(output_path), &table)?;
    }

    println!(
        "Wrote {} books to sample_books.csv, sample_books.parquet and sample_raw.csv",
        table.len()
    );
    Ok(())
}
