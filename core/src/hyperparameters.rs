//! Resampling the Pitman-Yor hyperparameters `a` (discount, `Beta(a, b)`
//! prior) and `b` (concentration, `Gamma(shape, scale)` prior) via the
//! slice sampler, conditioned on a lexicon's current `log_prob()`.

use crate::rng::Rng;
use crate::slice_sampler::{slice_sample1d, slice_sample1d_positive};
use statrs::function::gamma::ln_gamma;

/// `log Beta(a; alpha, beta)` density, up to the normalizing constant
/// (which cancels in the slice sampler's ratio test).
fn log_beta_prior(a: f64, alpha: f64, beta: f64) -> f64 {
    (alpha - 1.0) * a.ln() + (beta - 1.0) * (1.0 - a).ln() - ln_gamma(alpha) - ln_gamma(beta)
        + ln_gamma(alpha + beta)
}

/// `log Gamma(b; shape, scale)` density.
fn log_gamma_prior(b: f64, shape: f64, scale: f64) -> f64 {
    (shape - 1.0) * b.ln() - b / scale - shape * scale.ln() - ln_gamma(shape)
}

/// Resample the discount `a` in `[0, 1)` under a `Beta(beta_a, beta_b)`
/// prior, using `lexicon_log_prob` to evaluate the likelihood at a
/// candidate `a`.
pub fn resample_pya<F>(current_a: f64, beta_a: f64, beta_b: f64, rng: &mut Rng, lexicon_log_prob: F) -> f64
where
    F: Fn(f64) -> f64,
{
    if current_a <= 0.0 {
        return current_a;
    }
    let log_f = |a: f64| lexicon_log_prob(a) + log_beta_prior(a, beta_a, beta_b);
    slice_sample1d(log_f, current_a, rng, 0.0, 1.0, 0.0, 32)
}

/// Resample the concentration `b > 0` under a `Gamma(shape, scale)` prior.
pub fn resample_pyb<F>(current_b: f64, shape: f64, scale: f64, rng: &mut Rng, lexicon_log_prob: F) -> f64
where
    F: Fn(f64) -> f64,
{
    let log_f = |b: f64| lexicon_log_prob(b) + log_gamma_prior(b, shape, scale);
    slice_sample1d_positive(log_f, current_b, rng, 0.0, 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_pya_stays_in_unit_interval() {
        let mut rng = Rng::from_seed(42);
        let mut a = 0.3;
        for _ in 0..30 {
            a = resample_pya(a, 1.0, 1.0, &mut rng, |_| 0.0);
            assert!((0.0..1.0).contains(&a));
        }
    }

    #[test]
    fn resample_pya_is_identity_when_discount_disabled() {
        let mut rng = Rng::from_seed(1);
        let a = resample_pya(0.0, 1.0, 1.0, &mut rng, |_| 0.0);
        assert_eq!(a, 0.0);
    }

    #[test]
    fn resample_pyb_stays_positive() {
        let mut rng = Rng::from_seed(5);
        let mut b = 1.0;
        for _ in 0..30 {
            b = resample_pyb(b, 10.0, 0.1, &mut rng, |_| 0.0);
            assert!(b > 0.0);
        }
    }
}
