//! Name-to-constructor tables for learners, budget managers and evaluators.
//!
//! Configuration and CLI refer to components by these names.

use crate::common::config::{EvaluatorCfg, LearnerCfg};
use crate::common::error::{EvalError, EvalResult};
use crate::evaluation::evaluator::{BasicEvaluator, PerformanceEvaluator, WindowEvaluator};
use crate::learning::active::LimitedInstances;
use crate::learning::budget::{
    AlwaysAcquire, FixedCount, FixedFraction, UncertaintyThreshold, VariableUncertainty,
};
use crate::learning::classifiers::{MajorityClass, NaiveBayes, NoChange};
use crate::learning::domain::{ActiveClassifier, BudgetManager, Classifier};

struct LearnerEntry {
    name: &'static str,
    summary: &'static str,
    build: fn() -> Box<dyn Classifier>,
}

struct BudgetEntry {
    name: &'static str,
    summary: &'static str,
    build: fn(&LearnerCfg) -> Box<dyn BudgetManager>,
}

struct EvaluatorEntry {
    name: &'static str,
    summary: &'static str,
    build: fn(&EvaluatorCfg) -> Option<Box<dyn PerformanceEvaluator>>,
}

const BASE_LEARNERS: &[LearnerEntry] = &[
    LearnerEntry {
        name: "majority",
        summary: "predicts the most frequent class seen so far",
        build: || Box::new(MajorityClass::new()),
    },
    LearnerEntry {
        name: "no_change",
        summary: "predicts the last label it was trained on",
        build: || Box::new(NoChange::new()),
    },
    LearnerEntry {
        name: "naive_bayes",
        summary: "Gaussian naive Bayes over numeric attributes",
        build: || Box::new(NaiveBayes::new()),
    },
];

const BUDGET_MANAGERS: &[BudgetEntry] = &[
    BudgetEntry {
        name: "always",
        summary: "acquires every label",
        build: |_| Box::new(AlwaysAcquire::default()),
    },
    BudgetEntry {
        name: "fixed_count",
        summary: "acquires the first `budget_count` labels",
        build: |cfg| Box::new(FixedCount::new(cfg.budget_count)),
    },
    BudgetEntry {
        name: "fixed_fraction",
        summary: "keeps the acquired share at or below `budget`",
        build: |cfg| Box::new(FixedFraction::new(cfg.budget)),
    },
    BudgetEntry {
        name: "uncertainty",
        summary: "acquires when the top posterior is below `uncertainty_threshold`",
        build: |cfg| Box::new(UncertaintyThreshold::new(cfg.uncertainty_threshold)),
    },
    BudgetEntry {
        name: "variable_uncertainty",
        summary: "uncertainty threshold adjusted by `variable_step` under `budget`",
        build: |cfg| {
            Box::new(VariableUncertainty::new(
                cfg.budget,
                cfg.uncertainty_threshold,
                cfg.variable_step,
            ))
        },
    },
];

const EVALUATORS: &[EvaluatorEntry] = &[
    EvaluatorEntry {
        name: "none",
        summary: "core confusion measurements only",
        build: |_| None,
    },
    EvaluatorEntry {
        name: "basic",
        summary: "cumulative accuracy, kappa and acquisition rate",
        build: |_| Some(Box::new(BasicEvaluator::new())),
    },
    EvaluatorEntry {
        name: "window",
        summary: "accuracy, kappa and acquisition rate over the last `window` examples",
        build: |cfg| Some(Box::new(WindowEvaluator::new(cfg.window))),
    },
];

/// Base learner registered under `name`.
pub fn base_learner(name: &str) -> EvalResult<Box<dyn Classifier>> {
    BASE_LEARNERS
        .iter()
        .find(|e| e.name == name)
        .map(|e| (e.build)())
        .ok_or_else(|| EvalError::unknown("base learner", name))
}

/// Budget manager named by `cfg.budget_manager`, parameterised from `cfg`.
pub fn budget_manager(cfg: &LearnerCfg) -> EvalResult<Box<dyn BudgetManager>> {
    BUDGET_MANAGERS
        .iter()
        .find(|e| e.name == cfg.budget_manager)
        .map(|e| (e.build)(cfg))
        .ok_or_else(|| EvalError::unknown("budget manager", cfg.budget_manager.as_str()))
}

/// Budget-gated learner assembled from `cfg`.
pub fn active_learner(cfg: &LearnerCfg) -> EvalResult<Box<dyn ActiveClassifier>> {
    let base = base_learner(&cfg.base_learner)?;
    let manager = budget_manager(cfg)?;
    Ok(Box::new(LimitedInstances::new(
        base,
        manager,
        cfg.limited_instances,
        cfg.positive_class,
    )))
}

/// `Ok(None)` for the `none` evaluator.
pub fn evaluator(cfg: &EvaluatorCfg) -> EvalResult<Option<Box<dyn PerformanceEvaluator>>> {
    EVALUATORS
        .iter()
        .find(|e| e.name == cfg.name)
        .map(|e| (e.build)(cfg))
        .ok_or_else(|| EvalError::unknown("evaluator", cfg.name.as_str()))
}

/// `(kind, name, summary)` for every registered component.
pub fn catalogue() -> Vec<(&'static str, &'static str, &'static str)> {
    let learners = BASE_LEARNERS.iter().map(|e| ("base learner", e.name, e.summary));
    let managers = BUDGET_MANAGERS.iter().map(|e| ("budget manager", e.name, e.summary));
    let evaluators = EVALUATORS.iter().map(|e| ("evaluator", e.name, e.summary));
    learners.chain(managers).chain(evaluators).collect()
}
