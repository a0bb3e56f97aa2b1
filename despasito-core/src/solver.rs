//! Scalar root finding on a bracketing interval.
use crate::errors::{EosError, EosResult};

/// Find a root of `f` in the interval `[a, b]` using Brent's method.
///
/// `f(a)` and `f(b)` must have opposite signs. The iteration stops when the
/// bracket is smaller than `tol` (relative to the current iterate) or when
/// the function value vanishes.
///
/// # Errors
///
/// `IterationFailed` if the interval does not bracket a root or `f` returns
/// a non-finite value, `NotConverged` if `max_iter` is exceeded.
pub fn brent<F>(mut f: F, a: f64, b: f64, tol: f64, max_iter: usize) -> EosResult<f64>
where
    F: FnMut(f64) -> EosResult<f64>,
{
    let (mut a, mut b) = (a, b);
    let mut fa = f(a)?;
    let mut fb = f(b)?;
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if !fa.is_finite() || !fb.is_finite() || fa.signum() == fb.signum() {
        return Err(EosError::IterationFailed(String::from("brent")));
    }

    let (mut c, mut fc) = (a, fa);
    let mut d = b - a;
    let mut e = d;
    for _ in 0..max_iter {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * tol * b.abs().max(tol);
        let m = 0.5 * (c - b);
        if m.abs() <= tol1 || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // inverse quadratic interpolation or secant step
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * m * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            if 2.0 * p < (3.0 * m * q - (tol1 * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = m;
            }
        } else {
            d = m;
            e = m;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol1 { d } else { tol1.copysign(m) };
        fb = f(b)?;
        if !fb.is_finite() {
            return Err(EosError::IterationFailed(String::from("brent")));
        }
    }
    Err(EosError::NotConverged(String::from("brent")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cubic_root() -> EosResult<()> {
        let x = brent(|x| Ok(x * x * x - 2.0 * x - 5.0), 2.0, 3.0, 1e-12, 100)?;
        assert_relative_eq!(x, 2.0945514815423265, max_relative = 1e-10);
        Ok(())
    }

    #[test]
    fn reversed_bracket() -> EosResult<()> {
        let x = brent(|x: f64| Ok(x.ln()), 3.0, 0.5, 1e-12, 100)?;
        assert_relative_eq!(x, 1.0, epsilon = 1e-10);
        Ok(())
    }

    #[test]
    fn not_bracketed() {
        assert!(matches!(
            brent(|x| Ok(x * x + 1.0), -1.0, 1.0, 1e-10, 100),
            Err(EosError::IterationFailed(_))
        ));
    }

    #[test]
    fn propagates_errors() {
        let res = brent(
            |x| {
                if x > 0.5 {
                    Err(EosError::SuperCritical)
                } else {
                    Ok(x - 0.75)
                }
            },
            0.0,
            1.0,
            1e-10,
            100,
        );
        assert!(matches!(res, Err(EosError::SuperCritical)));
    }
}
