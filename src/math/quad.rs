//! Composite Simpson quadrature.
//!
//! The integrands in this crate (inverse expansion rate, filtered power spectra)
//! are smooth on the integration range, so a fixed-order rule with a few
//! thousand panels is accurate to well below the percent level.

/// Integrate `f` over `[a, b]` using `intervals` panels (rounded up to even).
pub fn simpson<F>(f: F, a: f64, b: f64, intervals: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return 0.0;
    }
    let n = intervals.max(2).next_multiple_of(2);
    let h = (b - a) / n as f64;

    let mut sum = f(a) + f(b);
    for i in 1..n {
        let x = a + h * i as f64;
        let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * f(x);
    }
    sum * h / 3.0
}

/// Fourier transform of a spherical top-hat of unit radius, `3 (sin x − x cos x) / x³`.
pub fn top_hat_window(x: f64) -> f64 {
    if x.abs() < 1e-3 {
        // Series: 1 − x²/10 + x⁴/280
        let x2 = x * x;
        return 1.0 - x2 / 10.0 + x2 * x2 / 280.0;
    }
    3.0 * (x.sin() - x * x.cos()) / (x * x * x)
}
