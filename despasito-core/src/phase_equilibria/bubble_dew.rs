use super::{normalize, BubbleDewOptions, SolverOptions, DEFAULT_SUPERCRITICAL_PRESSURE};
use crate::density::{
    fugacity_coefficient_liquid, fugacity_coefficient_vapor, DensityScanOptions, PhaseFlag,
};
use crate::equation_of_state::Residual;
use crate::errors::{EosError, EosResult};
use crate::solver::brent;
use crate::Verbosity;
use ndarray::{arr1, Array1};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

const MAX_ITER_INNER_BUBBLE: usize = 30;
const TOL_INNER_BUBBLE: f64 = 1e-8;
const MAX_ITER_INNER_DEW: usize = 20;
const TOL_INNER_DEW: f64 = 1e-6;
const MAX_ITER_OUTER: usize = 100;
const TOL_OUTER: f64 = 1e-8;

/// Number of compositions tested when a binary iteration needs a new start.
const SCAN_POINTS: usize = 30;
const MAX_ITER_BISECTION: usize = 50;
const TOL_BISECTION: f64 = 1e-7;
/// Compositions closer than this (1-norm) are considered identical.
const TRIVIAL_TOL: f64 = 1e-5;

/// Pressure in Pa below which the bracketing search for a dew point gives up.
const MIN_PRESSURE: f64 = 1.0;
/// Lowest pressure in Pa at which a bubble point is searched.
const MIN_BUBBLE_PRESSURE: f64 = 1e4;
const MAX_EXPANSIONS: usize = 40;

/// Result of a bubble or dew point calculation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BubbleDewResult {
    /// Pressure in Pa
    pub pressure: f64,
    /// Composition of the incipient phase (vapor for bubble points, liquid for dew points)
    pub molefracs: Array1<f64>,
    /// Type of the liquid phase
    pub flag_liquid: PhaseFlag,
    /// Type of the vapor phase
    pub flag_vapor: PhaseFlag,
    /// Residual of the summation condition at the solution
    pub objective: f64,
}

/// Composition, fugacity coefficients and type of a phase.
#[derive(Clone, Debug)]
pub(super) struct Phase {
    pub molefracs: Array1<f64>,
    pub phi: Array1<f64>,
    pub flag: PhaseFlag,
}

impl Phase {
    fn unstable(molefracs: Array1<f64>) -> Self {
        let n = molefracs.len();
        Self {
            molefracs,
            phi: Array1::from_elem(n, f64::NAN),
            flag: PhaseFlag::Unstable,
        }
    }

    pub fn has_nan(&self) -> bool {
        self.phi.iter().any(|p| p.is_nan())
    }
}

fn is_trivial(x: &Array1<f64>, y: &Array1<f64>) -> bool {
    (x - y).mapv(f64::abs).sum() < TRIVIAL_TOL
}

fn nan_to_zero(x: Array1<f64>) -> Array1<f64> {
    x.mapv(|xi| if xi.is_nan() { 0.0 } else { xi })
}

/// Relative change of the smallest nonzero mole fraction.
fn smallest_fraction_change(old: &Array1<f64>, new: &Array1<f64>) -> f64 {
    old.iter()
        .zip(new.iter())
        .filter(|(&o, _)| o > 0.0)
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map_or(0.0, |(&o, &n)| ((n - o) / o).abs())
}

/// Equation of state and conditions shared by all steps of a bubble or dew point iteration.
pub(super) struct Equilibrium<'a, E> {
    pub eos: &'a Arc<E>,
    pub temperature: f64,
    pub density: &'a DensityScanOptions,
}

impl<'a, E: Residual> Equilibrium<'a, E> {
    pub fn vapor(&self, pressure: f64, molefracs: &Array1<f64>) -> EosResult<Phase> {
        if molefracs.iter().any(|&x| !x.is_finite() || x < 0.0) {
            return Ok(Phase::unstable(molefracs.clone()));
        }
        let (phi, _, flag) = fugacity_coefficient_vapor(
            self.eos,
            pressure,
            self.temperature,
            molefracs,
            self.density,
        )?;
        Ok(Phase {
            molefracs: molefracs.clone(),
            phi,
            flag,
        })
    }

    pub fn liquid(&self, pressure: f64, molefracs: &Array1<f64>) -> EosResult<Phase> {
        if molefracs.iter().any(|&x| !x.is_finite() || x < 0.0) {
            return Ok(Phase::unstable(molefracs.clone()));
        }
        let (phi, _, flag) = fugacity_coefficient_liquid(
            self.eos,
            pressure,
            self.temperature,
            molefracs,
            self.density,
        )?;
        Ok(Phase {
            molefracs: molefracs.clone(),
            phi,
            flag,
        })
    }

    /// Successive substitution of the vapor composition in equilibrium with a given liquid.
    fn vapor_composition(
        &self,
        pressure: f64,
        liquid: &Phase,
        y_init: &Array1<f64>,
        options: SolverOptions,
    ) -> EosResult<Phase> {
        let (max_iter, tol, verbosity) =
            options.unwrap_or(MAX_ITER_INNER_BUBBLE, TOL_INNER_BUBBLE);
        let x = &liquid.molefracs;
        let xphi = x * &liquid.phi;
        let binary = x.len() == 2;

        let mut y = y_init.clone();
        let mut totals = vec![y.sum()];
        let mut check_phase = true;
        let mut check_trivial = true;
        let mut last = None;

        for k in 1..=max_iter {
            let y_tmp = normalize(&y);
            let mut vapor = self.vapor(pressure, &y_tmp)?;

            if (vapor.has_nan() || vapor.flag == PhaseFlag::Liquid) && check_phase {
                check_phase = false;
                if binary && y_tmp.iter().all(|&yi| yi > 0.0) {
                    log_iter!(
                        verbosity,
                        "  vapor guess {y_tmp} is {}, scanning compositions",
                        vapor.flag
                    );
                    match self.scan_vapor_composition(pressure, liquid)? {
                        Some(y_scan) => vapor = self.vapor(pressure, &y_scan)?,
                        None => return Ok(Phase::unstable(y_tmp)),
                    }
                }
            } else if check_trivial && is_trivial(x, &y_tmp) {
                check_trivial = false;
                log_iter!(verbosity, "  trivial vapor composition {y_tmp}, restarting");
                let y_scan = if binary {
                    self.scan_vapor_composition(pressure, liquid)?
                } else {
                    Some(normalize(&xphi))
                };
                match y_scan {
                    Some(y_scan) => vapor = self.vapor(pressure, &y_scan)?,
                    None => return Ok(Phase::unstable(y_tmp)),
                }
            }

            let y_new = nan_to_zero(&xphi / &vapor.phi);
            let total = y_new.sum();
            let vapor2 = self.vapor(pressure, &(&y_new / total))?;
            log_iter!(
                verbosity,
                "  {k:3} | sum(y) = {total:.10} | y = {} | {}",
                vapor2.molefracs,
                vapor2.flag
            );

            let n = totals.len();
            if binary && n > 3 {
                let oscillation =
                    (total - totals[n - 2]).abs() + (totals[n - 1] - totals[n - 3]).abs();
                if oscillation < (total - totals[n - 1]).abs() && vapor.flag != vapor2.flag {
                    log_iter!(
                        verbosity,
                        "  oscillation between {} and {} vapor, bisecting",
                        vapor.flag,
                        vapor2.flag
                    );
                    let (a, b) = (y_tmp[0], vapor2.molefracs[0]);
                    let bounds = if a < b { (a, b) } else { (b, a) };
                    return self.bisect_vapor_composition(pressure, liquid, bounds, verbosity);
                }
            }

            if (total - totals[n - 1]).abs() < tol
                && smallest_fraction_change(&y_tmp, &vapor2.molefracs) < tol
            {
                log_iter!(verbosity, "  vapor composition converged in {k} steps");
                return Ok(vapor2);
            }
            totals.push(total);
            y = y_new;
            last = Some(vapor2);
        }
        log_result!(
            verbosity,
            "Vapor composition did not converge within {max_iter} steps at P = {pressure} Pa"
        );
        last.ok_or_else(|| EosError::NotConverged(String::from("vapor_composition")))
    }

    /// Binary vapor composition that is most self consistent on a coarse grid.
    fn scan_vapor_composition(
        &self,
        pressure: f64,
        liquid: &Phase,
    ) -> EosResult<Option<Array1<f64>>> {
        let xphi = &liquid.molefracs * &liquid.phi;
        let mut candidates = Vec::with_capacity(SCAN_POINTS);
        for y1 in Array1::linspace(0.01, 0.99, SCAN_POINTS) {
            let vapor = self.vapor(pressure, &arr1(&[y1, 1.0 - y1]))?;
            let y_new = &xphi / &vapor.phi;
            let vapor2 = self.vapor(pressure, &normalize(&y_new))?;
            let (y, phi, y2, phi2) = (&vapor.molefracs, &vapor.phi, &vapor2.molefracs, &vapor2.phi);
            let objective =
                (y[0] * phi[0] / (y[1] * phi[1]) - y2[0] * phi2[0] / (y2[1] * phi2[1])).abs();
            if objective.is_finite() {
                candidates.push((y1, objective, vapor.flag));
            }
        }
        let preferred = |&&(_, _, flag): &&(f64, f64, PhaseFlag)| {
            !matches!(flag, PhaseFlag::Liquid | PhaseFlag::Unstable)
        };
        let pool: Vec<_> = if candidates.iter().any(|c| preferred(&c)) {
            candidates.iter().filter(preferred).collect()
        } else {
            candidates.iter().collect()
        };
        let best = pool.into_iter().min_by(|a, b| a.1.total_cmp(&b.1));
        debug!("vapor composition scan at P = {pressure} Pa: {best:?}");
        Ok(best.map(|&(y1, _, _)| arr1(&[y1, 1.0 - y1])))
    }

    /// Bisection on the first vapor mole fraction of a binary mixture
    /// whose successive substitution oscillates between two phase types.
    fn bisect_vapor_composition(
        &self,
        pressure: f64,
        liquid: &Phase,
        bounds: (f64, f64),
        verbosity: Verbosity,
    ) -> EosResult<Phase> {
        let xphi = &liquid.molefracs * &liquid.phi;
        let objective = |y1: f64| -> EosResult<(f64, PhaseFlag)> {
            let vapor = self.vapor(pressure, &arr1(&[y1, 1.0 - y1]))?;
            let y_new = &xphi / &vapor.phi;
            let vapor2 = self.vapor(pressure, &normalize(&y_new))?;
            let residual = (&y_new - &(&xphi / &vapor2.phi)).mapv(f64::abs).sum();
            Ok((residual, vapor.flag))
        };

        let (mut lo, mut hi) = bounds;
        let (mut f_lo, mut flag_lo) = objective(lo)?;
        let (mut f_hi, mut flag_hi) = objective(hi)?;
        let mut y1 = if f_lo.total_cmp(&f_hi).is_le() { lo } else { hi };
        for k in 1..=MAX_ITER_BISECTION {
            let mid = 0.5 * (lo + hi);
            let (f_mid, flag_mid) = objective(mid)?;
            log_iter!(
                verbosity,
                "  bisection {k:3} | y1 = {mid:.8} | residual = {f_mid:.3e} | {flag_mid}"
            );
            y1 = mid;
            if f_mid < TOL_BISECTION {
                break;
            }
            let replace_lo = if flag_mid == flag_lo && flag_mid != flag_hi {
                true
            } else if flag_mid == flag_hi && flag_mid != flag_lo {
                false
            } else {
                // undecided by the phase type, keep the better bound
                f_lo.is_nan() || f_lo > f_hi
            };
            if replace_lo {
                (lo, f_lo, flag_lo) = (mid, f_mid, flag_mid);
            } else {
                (hi, f_hi, flag_hi) = (mid, f_mid, flag_mid);
            }
            if hi - lo < TOL_BISECTION {
                break;
            }
        }
        self.vapor(pressure, &arr1(&[y1, 1.0 - y1]))
    }

    /// Successive substitution of the liquid composition in equilibrium with a given vapor.
    fn liquid_composition(
        &self,
        pressure: f64,
        vapor: &Phase,
        x_init: &Array1<f64>,
        options: SolverOptions,
    ) -> EosResult<Phase> {
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_INNER_DEW, TOL_INNER_DEW);
        let yphi = &vapor.molefracs * &vapor.phi;
        let binary = yphi.len() == 2;

        let mut x = x_init.clone();
        let mut totals = vec![x.sum()];
        let mut check_phase = true;
        let mut last = None;

        for k in 1..=max_iter {
            let x_tmp = normalize(&x);
            let mut liquid = self.liquid(pressure, &x_tmp)?;

            if (liquid.has_nan() || liquid.flag == PhaseFlag::Vapor) && check_phase {
                check_phase = false;
                if binary && x_tmp.iter().all(|&xi| xi > 0.0) {
                    log_iter!(
                        verbosity,
                        "  liquid guess {x_tmp} is {}, scanning compositions",
                        liquid.flag
                    );
                    match self.scan_liquid_composition(pressure, vapor)? {
                        Some(x_scan) => liquid = self.liquid(pressure, &x_scan)?,
                        None => return Ok(Phase::unstable(x_tmp)),
                    }
                }
            }

            let x_new = nan_to_zero(&yphi / &liquid.phi);
            let total = x_new.sum();
            let liquid2 = self.liquid(pressure, &(&x_new / total))?;
            log_iter!(
                verbosity,
                "  {k:3} | sum(x) = {total:.10} | x = {} | {}",
                liquid2.molefracs,
                liquid2.flag
            );

            let n = totals.len();
            if (total - totals[n - 1]).abs() < tol
                && smallest_fraction_change(&x_tmp, &liquid2.molefracs) < tol
            {
                log_iter!(verbosity, "  liquid composition converged in {k} steps");
                return Ok(liquid2);
            }
            totals.push(total);
            x = x_new;
            last = Some(liquid2);
        }
        log_result!(
            verbosity,
            "Liquid composition did not converge within {max_iter} steps at P = {pressure} Pa"
        );
        last.ok_or_else(|| EosError::NotConverged(String::from("liquid_composition")))
    }

    /// Binary liquid composition that is most self consistent on a coarse grid.
    fn scan_liquid_composition(
        &self,
        pressure: f64,
        vapor: &Phase,
    ) -> EosResult<Option<Array1<f64>>> {
        let yphi = &vapor.molefracs * &vapor.phi;
        let mut candidates = Vec::with_capacity(SCAN_POINTS);
        for x1 in Array1::linspace(0.001, 0.999, SCAN_POINTS) {
            let liquid = self.liquid(pressure, &arr1(&[x1, 1.0 - x1]))?;
            let x_new = &yphi / &liquid.phi;
            let liquid2 = self.liquid(pressure, &normalize(&x_new))?;
            let objective = (x_new.sum() - (&yphi / &liquid2.phi).sum()).abs();
            if objective.is_finite() {
                candidates.push((x1, objective, liquid.flag));
            }
        }
        let preferred = |&&(_, _, flag): &&(f64, f64, PhaseFlag)| {
            !matches!(
                flag,
                PhaseFlag::Vapor | PhaseFlag::Unstable | PhaseFlag::IdealGas
            )
        };
        let pool: Vec<_> = if candidates.iter().any(|c| preferred(&c)) {
            candidates.iter().filter(preferred).collect()
        } else {
            candidates.iter().collect()
        };
        let best = pool.into_iter().min_by(|a, b| a.1.total_cmp(&b.1));
        debug!("liquid composition scan at P = {pressure} Pa: {best:?}");
        Ok(best.map(|&(x1, _, _)| arr1(&[x1, 1.0 - x1])))
    }

    /// Saturation pressures of all components, with fallbacks for
    /// components above their critical temperature.
    pub fn pure_pressures(&self, component_beads: Option<&[Vec<String>]>) -> EosResult<Array1<f64>> {
        let n = self.eos.components();
        (0..n)
            .map(|i| {
                let mut x = Array1::zeros(n);
                x[i] = 1.0;
                match super::saturation_pressure(
                    self.eos,
                    self.temperature,
                    &x,
                    self.density,
                    SolverOptions::default(),
                ) {
                    Ok(vle) => Ok(vle.pressure),
                    Err(
                        e @ (EosError::SuperCritical
                        | EosError::NotConverged(_)
                        | EosError::IterationFailed(_)),
                    ) => {
                        debug!("component {i}: {e}");
                        Ok(match component_beads.and_then(|beads| beads.get(i)) {
                            Some(beads) => super::supercritical_pressure_guess(beads.as_slice()),
                            None => {
                                warn!(
                                    "component {i} has no saturation pressure at {} K, using {} Pa",
                                    self.temperature, DEFAULT_SUPERCRITICAL_PRESSURE
                                );
                                DEFAULT_SUPERCRITICAL_PRESSURE
                            }
                        })
                    }
                    Err(e) => Err(e),
                }
            })
            .collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PointKind {
    Bubble,
    Dew,
}

impl PointKind {
    /// Sign of the summation residual at pressures below the solution.
    fn low_pressure_sign(&self) -> f64 {
        match self {
            Self::Bubble => 1.0,
            Self::Dew => -1.0,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Bubble => "bubble_pressure",
            Self::Dew => "dew_pressure",
        }
    }
}

/// State of the pressure iteration: the current guess of the incipient
/// phase composition and the best solution found so far.
struct PressureIteration<'a, E> {
    equilibrium: Equilibrium<'a, E>,
    kind: PointKind,
    molefracs: &'a Array1<f64>,
    guess: Array1<f64>,
    inner: SolverOptions,
    verbosity: Verbosity,
    iterations: usize,
    best: Option<BubbleDewResult>,
}

impl<'a, E: Residual> PressureIteration<'a, E> {
    /// Summation residual at the given pressure, or [None] if no valid
    /// pair of phases exists there.
    fn evaluate(&mut self, pressure: f64) -> EosResult<Option<f64>> {
        self.iterations += 1;
        let result = match self.kind {
            PointKind::Bubble => self.bubble(pressure)?,
            PointKind::Dew => self.dew(pressure)?,
        };
        match &result {
            Some(r) => log_iter!(
                self.verbosity,
                "{:4} | {:14.8e} Pa | {:14.8e} | {}",
                self.iterations,
                pressure,
                r.objective,
                r.molefracs
            ),
            None => log_iter!(
                self.verbosity,
                "{:4} | {:14.8e} Pa | no phase split",
                self.iterations,
                pressure
            ),
        }
        let objective = result.as_ref().map(|r| r.objective);
        if let Some(r) = result {
            self.guess = r.molefracs.clone();
            let better = self
                .best
                .as_ref()
                .map_or(true, |b| r.objective.abs() <= b.objective.abs());
            if better {
                self.best = Some(r);
            }
        }
        Ok(objective)
    }

    fn bubble(&self, pressure: f64) -> EosResult<Option<BubbleDewResult>> {
        let liquid = self.equilibrium.liquid(pressure, self.molefracs)?;
        if liquid.has_nan() {
            return Ok(None);
        }
        let vapor = self
            .equilibrium
            .vapor_composition(pressure, &liquid, &self.guess, self.inner)?;
        if vapor.has_nan()
            || !matches!(
                vapor.flag,
                PhaseFlag::Vapor | PhaseFlag::Supercritical | PhaseFlag::IdealGas
            )
            || is_trivial(self.molefracs, &vapor.molefracs)
        {
            return Ok(None);
        }
        let objective = nan_to_zero(&liquid.molefracs * &liquid.phi / &vapor.phi).sum() - 1.0;
        Ok(Some(BubbleDewResult {
            pressure,
            molefracs: vapor.molefracs,
            flag_liquid: liquid.flag,
            flag_vapor: vapor.flag,
            objective,
        }))
    }

    fn dew(&self, pressure: f64) -> EosResult<Option<BubbleDewResult>> {
        let vapor = self.equilibrium.vapor(pressure, self.molefracs)?;
        if vapor.has_nan() {
            return Ok(None);
        }
        let liquid = self
            .equilibrium
            .liquid_composition(pressure, &vapor, &self.guess, self.inner)?;
        if liquid.has_nan()
            || matches!(
                liquid.flag,
                PhaseFlag::Vapor | PhaseFlag::Unstable | PhaseFlag::IdealGas
            )
            || is_trivial(self.molefracs, &liquid.molefracs)
        {
            return Ok(None);
        }
        let objective = nan_to_zero(&vapor.molefracs * &vapor.phi / &liquid.phi).sum() - 1.0;
        Ok(Some(BubbleDewResult {
            pressure,
            molefracs: liquid.molefracs,
            flag_liquid: liquid.flag,
            flag_vapor: vapor.flag,
            objective,
        }))
    }

    /// Is the residual on the low pressure side of the solution?
    fn below(&self, objective: f64) -> bool {
        objective * self.kind.low_pressure_sign() > 0.0
    }

    /// Pressure interval that contains the solution.
    ///
    /// The lower bound always carries a valid residual. The upper bound
    /// either has a residual of opposite sign ([true]) or lies in a region
    /// without a phase split ([false]).
    fn bracket(&mut self, initial: f64) -> EosResult<(f64, f64, bool)> {
        let name = self.kind.name();
        match self.evaluate(initial)? {
            Some(f) if self.below(f) => {
                let mut lower = initial;
                for _ in 0..MAX_EXPANSIONS {
                    let p = 2.0 * lower;
                    match self.evaluate(p)? {
                        Some(f) if self.below(f) => lower = p,
                        Some(_) => return Ok((lower, p, true)),
                        None => return Ok((lower, p, false)),
                    }
                }
                Err(EosError::NotConverged(format!("{name} bracket")))
            }
            f => {
                let floor = match self.kind {
                    PointKind::Bubble => MIN_BUBBLE_PRESSURE,
                    PointKind::Dew => MIN_PRESSURE,
                };
                let mut upper = (initial, f.is_some());
                let mut p = initial;
                while p > floor {
                    p = (0.5 * p).max(floor);
                    match self.evaluate(p)? {
                        Some(f) if self.below(f) => return Ok((p, upper.0, upper.1)),
                        f => upper = (p, f.is_some()),
                    }
                }
                debug!("{name}: no solution above {floor} Pa");
                Err(EosError::NoPhaseSplit)
            }
        }
    }

    fn solve(&mut self, initial: f64, options: SolverOptions) -> EosResult<BubbleDewResult> {
        let (max_iter, tol, verbosity) = options.unwrap_or(MAX_ITER_OUTER, TOL_OUTER);
        let name = self.kind.name();
        log_iter!(verbosity, " iter |    pressure     |   objective    | composition");
        log_iter!(verbosity, "{:-<70}", "");

        let (mut lower, mut upper, mut valid) = self.bracket(initial)?;

        // shrink the invalid upper bound until the residual changes sign
        let mut iter = 0;
        while !valid {
            if (upper - lower) < tol * lower || iter >= max_iter {
                // the phase split vanishes before the residual changes sign
                log_result!(
                    verbosity,
                    "{name}: no sign change up to the limit of the phase split at {lower} Pa"
                );
                return self
                    .best
                    .clone()
                    .ok_or_else(|| EosError::NotConverged(name.to_string()));
            }
            let p = (lower * upper).sqrt();
            match self.evaluate(p)? {
                Some(f) if self.below(f) => lower = p,
                Some(_) => {
                    upper = p;
                    valid = true;
                }
                None => upper = p,
            }
            iter += 1;
        }

        let high_side = -self.kind.low_pressure_sign();
        brent(
            |p| Ok(self.evaluate(p)?.unwrap_or(high_side)),
            lower,
            upper,
            tol,
            max_iter,
        )?;
        let result = self
            .best
            .clone()
            .ok_or_else(|| EosError::NotConverged(name.to_string()))?;
        log_result!(
            verbosity,
            "{name}: converged in {} evaluations, P = {} Pa, objective = {:e}",
            self.iterations,
            result.pressure,
            result.objective
        );
        Ok(result)
    }
}

fn validate_composition<E: Residual>(eos: &Arc<E>, molefracs: &Array1<f64>) -> EosResult<()> {
    eos.validate_moles(Some(molefracs))?;
    if molefracs.iter().any(|&x| !x.is_finite() || x < 0.0) || molefracs.sum() <= 0.0 {
        return Err(EosError::Error(format!(
            "Invalid composition {molefracs}: mole fractions must be non-negative and not all zero."
        )));
    }
    Ok(())
}

/// Bubble point pressure and vapor composition of a liquid at the given temperature.
///
/// The pressure is initialized from the saturation pressures of the
/// components unless [BubbleDewOptions::pressure_guess] is set.
pub fn bubble_pressure<E: Residual>(
    eos: &Arc<E>,
    temperature: f64,
    liquid_molefracs: &Array1<f64>,
    options: &BubbleDewOptions,
) -> EosResult<BubbleDewResult> {
    validate_composition(eos, liquid_molefracs)?;
    let x = normalize(liquid_molefracs);
    let equilibrium = Equilibrium {
        eos,
        temperature,
        density: &options.density,
    };
    let psat = equilibrium.pure_pressures(options.component_beads.as_deref())?;
    let pressure = options
        .pressure_guess
        .unwrap_or_else(|| 1.0 / (&x / &psat).sum());
    let guess = normalize(&(&x * &psat / pressure));
    log_result!(
        options.outer.verbosity,
        "Bubble point at T = {temperature} K: Psat = {psat}, initial P = {pressure} Pa"
    );

    PressureIteration {
        equilibrium,
        kind: PointKind::Bubble,
        molefracs: &x,
        guess,
        inner: options.inner,
        verbosity: options.outer.verbosity,
        iterations: 0,
        best: None,
    }
    .solve(pressure, options.outer)
}

/// Dew point pressure and liquid composition of a vapor at the given temperature.
///
/// The pressure is initialized from the saturation pressures of the
/// components unless [BubbleDewOptions::pressure_guess] is set.
pub fn dew_pressure<E: Residual>(
    eos: &Arc<E>,
    temperature: f64,
    vapor_molefracs: &Array1<f64>,
    options: &BubbleDewOptions,
) -> EosResult<BubbleDewResult> {
    validate_composition(eos, vapor_molefracs)?;
    let y = normalize(vapor_molefracs);
    let equilibrium = Equilibrium {
        eos,
        temperature,
        density: &options.density,
    };
    let psat = equilibrium.pure_pressures(options.component_beads.as_deref())?;
    let pressure = options
        .pressure_guess
        .unwrap_or_else(|| 1.0 / (&y / &psat).sum());
    let guess = normalize(&(&y * pressure / &psat));
    log_result!(
        options.outer.verbosity,
        "Dew point at T = {temperature} K: Psat = {psat}, initial P = {pressure} Pa"
    );

    PressureIteration {
        equilibrium,
        kind: PointKind::Dew,
        molefracs: &y,
        guess,
        inner: options.inner,
        verbosity: options.outer.verbosity,
        iterations: 0,
        best: None,
    }
    .solve(pressure, options.outer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::VanDerWaals;
    use approx::assert_relative_eq;

    fn mixture() -> Arc<VanDerWaals> {
        // the second component is considerably more volatile
        Arc::new(VanDerWaals::mixture(&[50000.0, 30000.0], &[50.0, 45.0]))
    }

    fn options() -> BubbleDewOptions {
        BubbleDewOptions {
            density: DensityScanOptions {
                points: 300,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn bubble_point_satisfies_isofugacity() -> EosResult<()> {
        let eos = mixture();
        let t = 160.0;
        let x = arr1(&[0.6, 0.4]);
        let options = options();
        let bubble = bubble_pressure(&eos, t, &x, &options)?;
        assert!(bubble.objective.abs() < 1e-6);
        assert_eq!(bubble.flag_liquid, PhaseFlag::Liquid);
        assert!(bubble.flag_vapor != PhaseFlag::Liquid);
        // the vapor is enriched in the volatile component
        assert!(bubble.molefracs[1] > x[1]);
        assert_relative_eq!(bubble.molefracs.sum(), 1.0, epsilon = 1e-10);

        let equilibrium = Equilibrium {
            eos: &eos,
            temperature: t,
            density: &options.density,
        };
        let liquid = equilibrium.liquid(bubble.pressure, &x)?;
        let vapor = equilibrium.vapor(bubble.pressure, &bubble.molefracs)?;
        for i in 0..2 {
            assert_relative_eq!(
                x[i] * liquid.phi[i],
                bubble.molefracs[i] * vapor.phi[i],
                max_relative = 1e-4
            );
        }
        Ok(())
    }

    #[test]
    fn dew_point_below_bubble_point() -> EosResult<()> {
        let eos = mixture();
        let t = 160.0;
        let z = arr1(&[0.6, 0.4]);
        let options = options();
        let bubble = bubble_pressure(&eos, t, &z, &options)?;
        let dew = dew_pressure(&eos, t, &z, &options)?;
        assert!(dew.objective.abs() < 1e-5);
        assert!(dew.pressure < bubble.pressure);
        // the liquid is enriched in the heavy component
        assert!(dew.molefracs[0] > z[0]);
        Ok(())
    }

    #[test]
    fn bubble_point_search_stops_at_ten_kilopascal() {
        // the bubble pressure of this liquid at 80 K is about 1.4 kPa
        let eos = mixture();
        let x = arr1(&[0.99, 0.01]);
        let options = options();
        let mut iteration = PressureIteration {
            equilibrium: Equilibrium {
                eos: &eos,
                temperature: 80.0,
                density: &options.density,
            },
            kind: PointKind::Bubble,
            molefracs: &x,
            guess: arr1(&[0.7, 0.3]),
            inner: options.inner,
            verbosity: Verbosity::None,
            iterations: 0,
            best: None,
        };
        assert!(matches!(
            iteration.bracket(1e5),
            Err(EosError::NoPhaseSplit)
        ));
        // 100, 50, 25, 12.5 and 10 kPa
        assert_eq!(iteration.iterations, 5);
        assert!(iteration
            .best
            .as_ref()
            .map_or(true, |b| b.pressure >= MIN_BUBBLE_PRESSURE));
    }

    #[test]
    fn missing_beads_fall_back_to_default_pressure() -> EosResult<()> {
        // the second component is supercritical at 250 K
        let eos = mixture();
        let options = options();
        let equilibrium = Equilibrium {
            eos: &eos,
            temperature: 250.0,
            density: &options.density,
        };
        let psat = equilibrium.pure_pressures(Some(&[][..]))?;
        assert!(psat[0] > 0.0 && psat[0] < DEFAULT_SUPERCRITICAL_PRESSURE);
        assert_relative_eq!(psat[1], DEFAULT_SUPERCRITICAL_PRESSURE);

        let beads = vec![vec!["A".to_string()], vec!["CO2".to_string()]];
        let psat = equilibrium.pure_pressures(Some(beads.as_slice()))?;
        assert_relative_eq!(psat[1], 10.377e6);
        Ok(())
    }

    #[test]
    fn invalid_composition() {
        let eos = mixture();
        let x = arr1(&[0.0, 0.0]);
        assert!(bubble_pressure(&eos, 160.0, &x, &options()).is_err());
        let x = arr1(&[0.5, 0.3, 0.2]);
        assert!(bubble_pressure(&eos, 160.0, &x, &options()).is_err());
    }
}
