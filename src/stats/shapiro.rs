//! Shapiro-Wilk normality test, Royston's approximation (AS R94).
//!
//! Calibrated for 3 ≤ n ≤ 5000; larger samples are still tested but the
//! p-value may be inaccurate. Coefficients follow Royston (1995),
//! "Remark AS R94", *Applied Statistics* 44(4).

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use statrs::distribution::{ContinuousCDF, Normal};

use super::hypothesis::{TestResult, Unavailable};

pub const MIN_N: usize = 3;
pub const MAX_N: usize = 5000;

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// `c[0] + c[1]·x + c[2]·x² + …`
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

fn standard_normal() -> Result<Normal, Unavailable> {
    Normal::new(0.0, 1.0).map_err(Unavailable::distribution)
}

/// Test whether `values` come from a normal distribution.
/// The statistic is W; small p-values reject normality.
pub fn shapiro_wilk(values: &[f64]) -> Result<TestResult, Unavailable> {
    let n = values.len();
    if n < MIN_N {
        return Err(Unavailable::insufficient("sample", MIN_N, n));
    }
    if n > MAX_N {
        log::warn!("Shapiro-Wilk p-value may be inaccurate for n = {n} > {MAX_N}");
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] <= 0.0 {
        return Err(Unavailable::zero_variance("sample"));
    }

    let a = coefficients(n)?;
    let mean = x.iter().sum::<f64>() / n as f64;
    let ssq: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let numerator: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (numerator * numerator / ssq).min(1.0);

    Ok(TestResult::new(w, p_value(n, w)?))
}

/// Positive half of the antisymmetric weight vector, lowest order
/// statistic first.
fn coefficients(n: usize) -> Result<Vec<f64>, Unavailable> {
    let half = n / 2;
    if n == 3 {
        return Ok(vec![FRAC_1_SQRT_2]);
    }

    let normal = standard_normal()?;
    let an25 = n as f64 + 0.25;
    // expected normal order statistics of the lower half (negative)
    let m: Vec<f64> = (1..=half)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / an25))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / (n as f64).sqrt();
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;

    let mut a = vec![0.0; half];
    let (first_scaled, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        a[1] = a2;
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    a[0] = a1;
    for i in first_scaled..half {
        a[i] = -m[i] / fac;
    }
    Ok(a)
}

fn p_value(n: usize, w: f64) -> Result<f64, Unavailable> {
    if n == 3 {
        // exact distribution for three observations
        let p = 6.0 / PI * (w.sqrt().asin() - (0.75f64).sqrt().asin());
        return Ok(p.max(0.0));
    }

    let an = n as f64;
    let mut w1 = (1.0 - w).ln();
    let (mu, sigma) = if n <= 11 {
        let gamma = poly(&G, an);
        if w1 >= gamma {
            return Ok(0.0);
        }
        w1 = -(gamma - w1).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let ln_n = an.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    let dist = Normal::new(mu, sigma).map_err(Unavailable::distribution)?;
    Ok(dist.sf(w1))
}
