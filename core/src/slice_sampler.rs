//! Univariate slice sampler (Neal 2003, "Slice Sampling", Annals of
//! Statistics 31(3):705-767), stepping-out + shrinkage variant.
//!
//! Ported from the `slice_sampler1d_type` doubling-procedure header:
//! `stepping_out` brackets the slice, `shrinkage` draws a point inside the
//! bracket and rejects points outside the true slice, narrowing the
//! bracket on each rejection.

use crate::rng::Rng;

fn bounded<F: Fn(f64) -> f64>(f: &F, min_x: f64, max_x: f64) -> impl Fn(f64) -> f64 + '_ {
    move |x| {
        if min_x < x && x < max_x {
            f(x)
        } else {
            f64::NEG_INFINITY
        }
    }
}

fn stepping_out<F: Fn(f64) -> f64>(
    rng: &mut Rng,
    f: &F,
    x0: f64,
    y: f64,
    w: f64,
    m: u32,
) -> (f64, f64) {
    let u = rng.uniform01();
    let mut l = x0 - w * u;
    let mut r = l + w;
    let v = rng.uniform01();
    let mut j = (m as f64 * v) as u32;
    let mut k = (m - 1) * j;
    while j > 0 && y < f(l) {
        l -= w;
        j -= 1;
    }
    while k > 0 && y < f(r) {
        r += w;
        k -= 1;
    }
    (l, r)
}

fn shrinkage<F: Fn(f64) -> f64>(rng: &mut Rng, f: &F, x0: f64, y: f64, l: f64, r: f64) -> f64 {
    let (mut lbar, mut rbar) = (l, r);
    loop {
        let u = rng.uniform01();
        let x1 = lbar + u * (rbar - lbar);
        let fx1 = f(x1);
        if y < fx1 {
            return x1;
        }
        if x1 < x0 {
            lbar = x1;
        } else {
            rbar = x1;
        }
        if rbar - lbar < 1e-12 {
            return x1;
        }
    }
}

/// Draw one new sample for the variable currently at `x0`, using `log_f` as
/// the (unnormalized) log-density. `w` is the initial bracket width guess
/// (falls back to `max(|x0|/2, 1e-7)` when non-positive and the domain is
/// unbounded, or a quarter of the domain width when bounded). `nsteps`
/// bounds the stepping-out procedure's bracket growth.
pub fn slice_sample1d<F: Fn(f64) -> f64>(
    log_f: F,
    x0: f64,
    rng: &mut Rng,
    min_x: f64,
    max_x: f64,
    w: f64,
    nsteps: u32,
) -> f64 {
    assert!(x0.is_finite(), "slice_sample1d: x0 must be finite");
    let w = if w > 0.0 {
        w
    } else if min_x.is_finite() && max_x.is_finite() {
        (max_x - min_x) / 4.0
    } else {
        (x0.abs() / 2.0).max(1e-7)
    };
    assert!(w.is_finite());

    let bounded_f = bounded(&log_f, min_x, max_x);
    let y = bounded_f(x0) + (rng.uniform01() + 1e-100).ln();
    let (l, r) = stepping_out(rng, &bounded_f, x0, y, w, nsteps);
    let x1 = shrinkage(rng, &bounded_f, x0, y, l, r);
    assert!(x1.is_finite(), "slice_sample1d: produced non-finite sample");
    x1
}

/// Variant for a strictly-positive variable, resampling in log space so the
/// support constraint `x > 0` is handled by a change of variables rather
/// than hard rejection at the boundary.
pub fn slice_sample1d_positive<F: Fn(f64) -> f64>(
    log_f: F,
    x0: f64,
    rng: &mut Rng,
    w: f64,
    nsteps: u32,
) -> f64 {
    assert!(x0 > 0.0, "slice_sample1d_positive: x0 must be positive");
    let log_x0 = x0.ln();
    let g = |log_x: f64| log_f(log_x.exp()) + log_x;
    let log_x1 = slice_sample1d(g, log_x0, rng, f64::NEG_INFINITY, f64::INFINITY, w, nsteps);
    log_x1.exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_from_bounded_uniform_stay_in_bounds() {
        let mut rng = Rng::from_seed(7);
        let log_f = |_x: f64| 0.0; // uniform density
        let mut x = 0.5;
        for _ in 0..50 {
            x = slice_sample1d(log_f, x, &mut rng, 0.0, 1.0, 0.25, 32);
            assert!((0.0..=1.0).contains(&x));
        }
    }

    #[test]
    fn samples_concentrate_near_gaussian_mode() {
        let mut rng = Rng::from_seed(11);
        let log_f = |x: f64| -0.5 * (x - 3.0).powi(2);
        let mut x = 0.0;
        let mut sum = 0.0;
        let iters = 400;
        for _ in 0..iters {
            x = slice_sample1d(log_f, x, &mut rng, f64::NEG_INFINITY, f64::INFINITY, 1.0, 32);
            sum += x;
        }
        let mean = sum / iters as f64;
        assert!((mean - 3.0).abs() < 0.5, "mean {mean} far from mode 3.0");
    }

    #[test]
    fn positive_variant_stays_positive() {
        let mut rng = Rng::from_seed(3);
        let log_f = |x: f64| -x; // Exp(1)
        let mut x = 1.0;
        for _ in 0..50 {
            x = slice_sample1d_positive(log_f, x, &mut rng, 1.0, 32);
            assert!(x > 0.0);
        }
    }
}
