//! Bootstrap evaluation of the full search + fit + score pipeline.
//!
//! Each trial stratified-resamples a training subset with replacement, holds
//! out the complement, runs the whole outer-loop search on the resample, and
//! scores the refitted winner on the holdout. Trials are independent and run
//! in parallel; a failed or overrunning trial is logged and excluded without
//! aborting the batch.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::Candidate;
use crate::data_handling::Cohort;
use crate::error::StackError;
use crate::metrics::{score, PerformanceRecord};
use crate::nri::NriScorer;
use crate::search::OuterSearch;
use crate::stacker::StackedClassifier;

/// Settings for a bootstrap evaluation batch.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub trials: usize,
    /// Fraction of rows (per class) drawn, with replacement, into each
    /// trial's training resample.
    pub train_fraction: f64,
    pub seed: u64,
    /// Per-trial soft deadline, checked at stage boundaries; an overrunning
    /// trial is dropped from the batch instead of blocking it.
    pub deadline: Option<Duration>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            trials: 100,
            train_fraction: 0.8,
            seed: 42,
            deadline: None,
        }
    }
}

/// Records of the successful trials, plus the number excluded by failure or
/// deadline.
#[derive(Debug)]
pub struct BootstrapOutcome {
    pub records: Vec<PerformanceRecord>,
    pub failures: usize,
}

/// Run `config.trials` independent bootstrap trials of the full pipeline.
///
/// The cohort must carry a baseline triage category per row; each trial's
/// record compares the refitted winner to that baseline on the trial's
/// holdout. Trials are seeded individually from `config.seed`, so the batch
/// is reproducible and insensitive to completion order.
pub fn bootstrap(
    prototype: &StackedClassifier,
    candidates: &[Candidate],
    cohort: &Cohort,
    outer_folds: usize,
    config: &BootstrapConfig,
    nri: &dyn NriScorer,
) -> Result<BootstrapOutcome, StackError> {
    if config.trials == 0 {
        return Err(StackError::InvalidHyperparameter(
            "bootstrap requires at least one trial".to_string(),
        ));
    }
    if !(config.train_fraction > 0.0 && config.train_fraction < 1.0) {
        return Err(StackError::InvalidHyperparameter(format!(
            "train_fraction must lie in (0, 1), got {}",
            config.train_fraction
        )));
    }
    if cohort.triage.is_none() {
        return Err(StackError::MetricComputation(
            "bootstrap evaluation requires a baseline triage category per row".to_string(),
        ));
    }

    let results: Vec<Result<PerformanceRecord, StackError>> = (0..config.trials)
        .into_par_iter()
        .map(|trial| run_trial(prototype, candidates, cohort, outer_folds, config, nri, trial))
        .collect();

    let mut records = Vec::with_capacity(results.len());
    let mut failures = 0;
    for (trial, result) in results.into_iter().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(error) => {
                failures += 1;
                log::warn!("bootstrap trial {} excluded: {}", trial, error);
            }
        }
    }
    log::info!(
        "bootstrap: {} trials succeeded, {} excluded",
        records.len(),
        failures
    );

    Ok(BootstrapOutcome { records, failures })
}

fn run_trial(
    prototype: &StackedClassifier,
    candidates: &[Candidate],
    cohort: &Cohort,
    outer_folds: usize,
    config: &BootstrapConfig,
    nri: &dyn NriScorer,
    trial: usize,
) -> Result<PerformanceRecord, StackError> {
    let started = Instant::now();
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(trial as u64));

    let (train_indices, test_indices) =
        stratified_resample(&cohort.y, config.train_fraction, &mut rng)?;
    let train = cohort.select(&train_indices);
    let test = cohort.select(&test_indices);

    let outcome = OuterSearch::new(outer_folds).run(prototype, candidates, &train.x, &train.y)?;
    check_deadline(started, config.deadline)?;

    let (probabilities, categories) = outcome.engine.predict(&test.x)?;
    let predictions: Vec<i32> = probabilities
        .iter()
        .map(|&p| i32::from(p >= 0.5))
        .collect();
    let baseline = test.triage.as_deref().ok_or(StackError::DataAlignment {
        expected: test.len(),
        found: 0,
    })?;

    let record = score(
        &test.y,
        &probabilities,
        &predictions,
        Some(&categories),
        Some(baseline),
        nri,
    )?;
    check_deadline(started, config.deadline)?;
    Ok(record)
}

fn check_deadline(started: Instant, deadline: Option<Duration>) -> Result<(), StackError> {
    match deadline {
        Some(limit) if started.elapsed() > limit => Err(StackError::DeadlineExceeded),
        _ => Ok(()),
    }
}

/// Per-class sampling with replacement of `train_fraction` of the rows; the
/// complement of the drawn index set becomes the held-out test set.
fn stratified_resample(
    y: &[i32],
    train_fraction: f64,
    rng: &mut StdRng,
) -> Result<(Vec<usize>, Vec<usize>), StackError> {
    let mut by_class: std::collections::BTreeMap<i32, Vec<usize>> = Default::default();
    for (row, &label) in y.iter().enumerate() {
        by_class.entry(label).or_default().push(row);
    }

    let mut train = Vec::with_capacity((y.len() as f64 * train_fraction) as usize + 1);
    for rows in by_class.values() {
        let draws = ((rows.len() as f64 * train_fraction).round() as usize).max(1);
        for _ in 0..draws {
            train.push(rows[rng.gen_range(0..rows.len())]);
        }
    }

    let drawn: HashSet<usize> = train.iter().copied().collect();
    let test: Vec<usize> = (0..y.len()).filter(|row| !drawn.contains(row)).collect();
    if test.is_empty() {
        return Err(StackError::MetricComputation(
            "bootstrap resample left no held-out rows".to_string(),
        ));
    }

    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_preserves_class_ratio_and_holds_out_the_complement() {
        let mut y = vec![1; 60];
        y.extend(vec![0; 40]);
        let mut rng = StdRng::seed_from_u64(7);

        let (train, test) = stratified_resample(&y, 0.8, &mut rng).unwrap();
        let pos = train.iter().filter(|&&r| y[r] == 1).count();
        let neg = train.len() - pos;
        assert_eq!(pos, 48);
        assert_eq!(neg, 32);

        let drawn: HashSet<usize> = train.iter().copied().collect();
        assert!(test.iter().all(|row| !drawn.contains(row)));
        assert!(!test.is_empty());
        // every row is either drawn or held out
        assert_eq!(drawn.len() + test.len(), y.len());
    }

    #[test]
    fn resample_is_reproducible_per_seed() {
        let y = vec![1, 0, 1, 0, 1, 0, 1, 0, 1, 0];
        let a = stratified_resample(&y, 0.6, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = stratified_resample(&y, 0.6, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }

    #[test]
    fn deadline_check_trips_after_the_limit() {
        let started = Instant::now() - Duration::from_millis(50);
        assert!(matches!(
            check_deadline(started, Some(Duration::from_millis(1))),
            Err(StackError::DeadlineExceeded)
        ));
        assert!(check_deadline(started, None).is_ok());
    }
}
