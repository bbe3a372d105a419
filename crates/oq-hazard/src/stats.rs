//! Small numeric helpers shared by the hazard calculators: a standard
//! normal CDF (Abramowitz & Stegun 7.1.26 approximation, good to ~1.5e-7)
//! used to convert a lognormal ground-motion distribution into a
//! probability of exceedance.

pub fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

/// Probability that a lognormally distributed ground motion (given its
/// natural-log mean and standard deviation) exceeds `iml`.
pub fn poe_exceed(iml: f64, ln_mean: f64, std: f64) -> f64 {
    if iml <= 0.0 || std <= 0.0 {
        return if ln_mean.exp() > iml { 1.0 } else { 0.0 };
    }
    let z = (iml.ln() - ln_mean) / std;
    1.0 - standard_normal_cdf(z)
}
