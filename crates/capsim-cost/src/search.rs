//! Search over scaling configurations.
//!
//! The minimizer is a seam: anything implementing [`Minimizer`] can drive
//! the objective. [`GridSearch`] evaluates an evenly spaced lattice over
//! the search space, then repeats on a narrower lattice around the best
//! point found so far.

use serde::Serialize;
use tracing::{debug, info};

use capsim_core::{ScalingConfig, TimeSeriesSample};

use crate::objective::{Candidate, Objective, THROTTLE_PENALTY};

/// Inclusive integer range for one search coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub low: i64,
    pub high: i64,
}

impl Dimension {
    pub fn new(low: i64, high: i64) -> Self {
        Self {
            low: low.min(high),
            high: low.max(high),
        }
    }

    fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.low, self.high)
    }
}

/// Best point a minimizer found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub best_x: Vec<i64>,
    pub best_y: f64,
    pub evaluations: usize,
}

/// A black-box minimizer over integer search spaces.
pub trait Minimizer {
    /// Spend at most `steps` evaluations of `objective` looking for its
    /// lowest value within `dims`.
    fn minimize(
        &self,
        objective: &dyn Fn(&[i64]) -> f64,
        dims: &[Dimension],
        steps: usize,
    ) -> SearchOutcome;
}

/// Deterministic lattice search with successive refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSearch {
    /// Lattice passes; the step budget is split evenly between them.
    pub rounds: usize,
}

impl Default for GridSearch {
    fn default() -> Self {
        Self { rounds: 2 }
    }
}

impl Minimizer for GridSearch {
    fn minimize(
        &self,
        objective: &dyn Fn(&[i64]) -> f64,
        dims: &[Dimension],
        steps: usize,
    ) -> SearchOutcome {
        let rounds = self.rounds.max(1);
        let per_round = (steps / rounds).max(1);
        let per_axis = points_per_axis(per_round, dims.len());

        let mut bounds = dims.to_vec();
        let mut best: Option<(Vec<i64>, f64)> = None;
        let mut evaluations = 0;

        for round in 0..rounds {
            let axes: Vec<Vec<i64>> = bounds.iter().map(|d| axis(d, per_axis)).collect();
            for point in lattice(&axes) {
                let y = objective(&point);
                evaluations += 1;
                if best.as_ref().is_none_or(|(_, best_y)| y < *best_y) {
                    best = Some((point, y));
                }
            }

            let Some((best_x, best_y)) = &best else {
                break;
            };
            debug!(round, best_y, ?best_x, "grid search round finished");

            // Narrow each axis to half its span around the best point.
            bounds = dims
                .iter()
                .zip(&bounds)
                .zip(best_x)
                .map(|((outer, current), x)| {
                    let half = ((current.high - current.low) / 4).max(1);
                    Dimension::new(outer.clamp(x - half), outer.clamp(x + half))
                })
                .collect();
        }

        let (best_x, best_y) = best.unwrap_or((Vec::new(), f64::INFINITY));
        SearchOutcome {
            best_x,
            best_y,
            evaluations,
        }
    }
}

/// Largest `k` with `k^dims <= budget`, at least 1.
fn points_per_axis(budget: usize, dims: usize) -> usize {
    if dims == 0 {
        return 1;
    }
    let fits = |k: usize| {
        u32::try_from(dims)
            .ok()
            .and_then(|d| k.checked_pow(d))
            .is_some_and(|total| total <= budget)
    };
    let mut k = 1;
    while fits(k + 1) {
        k += 1;
    }
    k
}

/// Up to `points` evenly spaced integers covering `dim`.
fn axis(dim: &Dimension, points: usize) -> Vec<i64> {
    let span = dim.high - dim.low;
    let n = (points as i64).min(span + 1).max(1);
    if n == 1 {
        return vec![dim.low + span / 2];
    }
    let mut values: Vec<i64> = (0..n)
        .map(|i| dim.low + ((i as f64) * (span as f64) / ((n - 1) as f64)).round() as i64)
        .collect();
    values.dedup();
    values
}

/// Cartesian product of the axes.
fn lattice(axes: &[Vec<i64>]) -> Vec<Vec<i64>> {
    axes.iter().fold(vec![Vec::new()], |acc, axis| {
        acc.iter()
            .flat_map(|prefix| {
                axis.iter().map(move |v| {
                    let mut point = prefix.clone();
                    point.push(*v);
                    point
                })
            })
            .collect()
    })
}

/// Search bounds for `[min, max, target_percent]` derived from the peak
/// per-second demand in `samples`.
///
/// min spans `[1, peak]`, max spans `[peak / 2, 3 * peak]`, and target
/// spans 30% to 90%.
pub fn search_space(samples: &[TimeSeriesSample]) -> Vec<Dimension> {
    let peak = samples
        .iter()
        .map(|s| s.per_second_demand())
        .fold(0.0, f64::max) as i64;
    vec![
        Dimension::new(1, peak.max(1)),
        Dimension::new((peak / 2).max(1), (3 * peak).max(1)),
        Dimension::new(30, 90),
    ]
}

/// The cheapest configuration found for a sample series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimized {
    pub min: i64,
    pub max: i64,
    pub target_percent: i64,
    /// Average daily cost, or the throttle penalty if nothing avoided
    /// throttling.
    pub daily_cost: f64,
    pub throttle_free: bool,
    pub evaluations: usize,
}

/// Search for the cheapest non-throttling configuration.
///
/// Only `base.scaling_delay_seconds` is carried over from `base`; the
/// bounds and target come from the search.
pub fn optimize(
    base: &ScalingConfig,
    samples: &[TimeSeriesSample],
    price_per_hour: f64,
    minimizer: &dyn Minimizer,
    steps: usize,
    warmup: usize,
) -> Optimized {
    let objective = Objective::new(*base, samples, price_per_hour).with_warmup(warmup);
    let dims = search_space(samples);
    let outcome = minimizer.minimize(&|x| objective.evaluate_point(x), &dims, steps);

    let best = Candidate::from_point(&outcome.best_x)
        .unwrap_or_else(|| Candidate::new(dims[0].low, dims[1].low, dims[2].low));
    let optimized = Optimized {
        min: best.min,
        max: best.max,
        target_percent: best.target_percent,
        daily_cost: outcome.best_y,
        throttle_free: outcome.best_y < THROTTLE_PENALTY,
        evaluations: outcome.evaluations,
    };

    info!(
        min = optimized.min,
        max = optimized.max,
        target_percent = optimized.target_percent,
        daily_cost = optimized.daily_cost,
        evaluations = optimized.evaluations,
        "configuration search finished"
    );
    optimized
}
