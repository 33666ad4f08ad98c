//! Forced and bonus anomaly assignment.

use crate::error::{Result, SynthError};
use crate::types::AnomalyClass;
use rand::prelude::*;
use std::collections::BTreeMap;

/// What a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fully compliant.
    None,
    /// Assigned at planning time to guarantee the class appears.
    Forced(AnomalyClass),
    /// Drawn at the bonus rate.
    Bonus(AnomalyClass),
}

impl Outcome {
    /// The injected class, if any.
    pub fn class(&self) -> Option<AnomalyClass> {
        match self {
            Outcome::None => None,
            Outcome::Forced(c) | Outcome::Bonus(c) => Some(*c),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::None => write!(f, "NONE"),
            Outcome::Forced(c) => write!(f, "FORCED({})", c),
            Outcome::Bonus(c) => write!(f, "BONUS({})", c),
        }
    }
}

/// Decides the outcome of every record of a run.
///
/// The forced map pairs each catalog class with one distinct record index
/// and is fixed once planned. Other records draw a bonus class at
/// `bonus_rate`.
#[derive(Debug, Clone)]
pub struct AnomalyScheduler {
    forced: BTreeMap<usize, AnomalyClass>,
    records: usize,
    bonus_rate: f64,
}

impl AnomalyScheduler {
    /// Sample one distinct record index per class out of `records`.
    ///
    /// Fails when there are fewer records than classes.
    pub fn plan(records: usize, bonus_rate: f64, rng: &mut impl Rng) -> Result<Self> {
        if records < AnomalyClass::COUNT {
            return Err(SynthError::InsufficientRecords {
                records,
                classes: AnomalyClass::COUNT,
            });
        }

        let indices = rand::seq::index::sample(rng, records, AnomalyClass::COUNT);
        let forced = indices
            .into_iter()
            .zip(AnomalyClass::ALL)
            .collect::<BTreeMap<_, _>>();

        Ok(Self {
            forced,
            records,
            bonus_rate,
        })
    }

    /// Record index to forced class.
    pub fn forced(&self) -> &BTreeMap<usize, AnomalyClass> {
        &self.forced
    }

    /// Records covered by the plan.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Bonus probability for non-forced records.
    pub fn bonus_rate(&self) -> f64 {
        self.bonus_rate
    }

    /// Outcome of record `index`. Forced records draw nothing from `rng`.
    pub fn resolve(&self, index: usize, rng: &mut impl Rng) -> Outcome {
        if let Some(class) = self.forced.get(&index) {
            return Outcome::Forced(*class);
        }
        if rng.gen::<f64>() < self.bonus_rate {
            let class = AnomalyClass::ALL[rng.gen_range(0..AnomalyClass::COUNT)];
            Outcome::Bonus(class)
        } else {
            Outcome::None
        }
    }
}
