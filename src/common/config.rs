//! Runtime configuration loaded from an optional TOML file and the environment.
//!
//! Layering order, lowest to highest precedence: built-in defaults, the TOML
//! file, `ALPQ_*` environment variables. The CLI applies its flags on top.
//! Limits use `-1` for "no limit".

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{EvalError, EvalResult};

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppCfg {
    pub task: TaskCfg,
    pub learner: LearnerCfg,
    pub stream: StreamCfg,
    pub evaluator: EvaluatorCfg,
    pub log: LogCfg,
}

/// Evaluation task settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskCfg {
    pub class_count: usize,
    /// Class whose TP/FP/FN/TN are reported in every snapshot.
    pub target_class: usize,
    pub instance_limit: i64,
    /// Seconds; `-1` disables the limit.
    pub time_limit: i64,
    /// Instances between snapshots; `0` keeps only the final snapshot.
    pub sample_frequency: u64,
    /// Instances between abort checks and progress reports.
    pub monitor_interval: u64,
    pub dump_file: Option<PathBuf>,
}

impl Default for TaskCfg {
    fn default() -> Self {
        Self {
            class_count: 2,
            target_class: 0,
            instance_limit: 100_000_000,
            time_limit: -1,
            sample_frequency: 100_000,
            monitor_interval: 10,
            dump_file: None,
        }
    }
}

impl TaskCfg {
    /// `None` when `instance_limit` is negative.
    pub fn max_instances(&self) -> Option<u64> {
        u64::try_from(self.instance_limit).ok()
    }

    /// `None` when `time_limit` is negative.
    pub fn max_time(&self) -> Option<Duration> {
        u64::try_from(self.time_limit).ok().map(Duration::from_secs)
    }
}

/// Active learner settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerCfg {
    pub base_learner: String,
    pub budget_manager: String,
    /// Fraction of labels the fixed-fraction manager may acquire.
    pub budget: f64,
    /// Label count for the fixed-count manager.
    pub budget_count: u64,
    pub uncertainty_threshold: f64,
    pub variable_step: f64,
    /// Positive-class instances released to training; `0` disables the gate.
    pub limited_instances: u64,
    pub positive_class: usize,
}

impl Default for LearnerCfg {
    fn default() -> Self {
        Self {
            base_learner: "naive_bayes".to_string(),
            budget_manager: "always".to_string(),
            budget: 0.1,
            budget_count: 1_000,
            uncertainty_threshold: 0.9,
            variable_step: 0.01,
            limited_instances: 0,
            positive_class: 1,
        }
    }
}

/// Stream source settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamCfg {
    pub path: Option<PathBuf>,
    pub has_header: bool,
    /// Zero-based label column; defaults to the last column.
    pub class_column: Option<usize>,
}

impl Default for StreamCfg {
    fn default() -> Self {
        Self {
            path: None,
            has_header: true,
            class_column: None,
        }
    }
}

/// Optional performance evaluator appended to every snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorCfg {
    pub name: String,
    pub window: usize,
}

impl Default for EvaluatorCfg {
    fn default() -> Self {
        Self {
            name: "none".to_string(),
            window: 1_000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LogCfg {
    pub level: String,
    pub json: bool,
}

impl Default for LogCfg {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppCfg {
    /// Load defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> EvalResult<Self> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok())?;
        Ok(cfg)
    }

    /// Parse a TOML file without applying the environment.
    pub fn from_file(path: &Path) -> EvalResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse TOML text; missing sections take their defaults.
    pub fn from_toml(content: &str) -> EvalResult<Self> {
        toml::from_str(content).map_err(|e| EvalError::Config(e.to_string()))
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> EvalResult<String> {
        toml::to_string_pretty(self).map_err(|e| EvalError::Config(e.to_string()))
    }

    /// Write as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> EvalResult<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
        }
        fs::write(path, content).map_err(|e| EvalError::io(path, e))
    }

    /// Overlay `ALPQ_*` variables resolved through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> EvalResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, raw: String) -> EvalResult<T> {
            raw.trim()
                .parse()
                .map_err(|_| EvalError::Config(format!("{key}: cannot parse '{raw}'")))
        }

        if let Some(v) = lookup("ALPQ_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(v) = lookup("ALPQ_LOG_JSON") {
            self.log.json = parsed("ALPQ_LOG_JSON", v)?;
        }
        if let Some(v) = lookup("ALPQ_INSTANCE_LIMIT") {
            self.task.instance_limit = parsed("ALPQ_INSTANCE_LIMIT", v)?;
        }
        if let Some(v) = lookup("ALPQ_TIME_LIMIT") {
            self.task.time_limit = parsed("ALPQ_TIME_LIMIT", v)?;
        }
        if let Some(v) = lookup("ALPQ_SAMPLE_FREQUENCY") {
            self.task.sample_frequency = parsed("ALPQ_SAMPLE_FREQUENCY", v)?;
        }
        if let Some(v) = lookup("ALPQ_DUMP_FILE") {
            self.task.dump_file = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ALPQ_STREAM") {
            self.stream.path = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Reject configurations the evaluation loop cannot honour.
    pub fn validate(&self) -> EvalResult<()> {
        let n = self.task.class_count;
        if n < 2 {
            return Err(EvalError::invalid(format!("class_count must be >= 2, got {n}")));
        }
        if self.task.target_class >= n {
            return Err(EvalError::invalid(format!(
                "target_class {} out of range for {n} classes",
                self.task.target_class
            )));
        }
        if self.learner.positive_class >= n {
            return Err(EvalError::invalid(format!(
                "positive_class {} out of range for {n} classes",
                self.learner.positive_class
            )));
        }
        if self.task.monitor_interval == 0 {
            return Err(EvalError::invalid("monitor_interval must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.learner.budget) {
            return Err(EvalError::invalid("budget must lie in [0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppCfg::default();
        assert_eq!(cfg.task.class_count, 2);
        assert_eq!(cfg.task.sample_frequency, 100_000);
        assert_eq!(cfg.task.max_instances(), Some(100_000_000));
        assert_eq!(cfg.task.max_time(), None);
        assert_eq!(cfg.learner.limited_instances, 0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppCfg::from_toml(
            r#"
[task]
class_count = 3
instance_limit = -1

[learner]
limited_instances = 50
"#,
        )
        .unwrap();
        assert_eq!(cfg.task.class_count, 3);
        assert_eq!(cfg.task.max_instances(), None);
        assert_eq!(cfg.task.monitor_interval, 10);
        assert_eq!(cfg.learner.limited_instances, 50);
        assert_eq!(cfg.learner.positive_class, 1);
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("ALPQ_SAMPLE_FREQUENCY", "250"),
            ("ALPQ_TIME_LIMIT", "30"),
            ("ALPQ_LOG_JSON", "true"),
        ]
        .into_iter()
        .collect();
        let mut cfg = AppCfg::default();
        cfg.apply_env(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.task.sample_frequency, 250);
        assert_eq!(cfg.task.max_time(), Some(Duration::from_secs(30)));
        assert!(cfg.log.json);
    }

    #[test]
    fn bad_env_value_is_config_error() {
        let mut cfg = AppCfg::default();
        let err = cfg
            .apply_env(|k| (k == "ALPQ_INSTANCE_LIMIT").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn validate_rejects_out_of_range_classes() {
        let mut cfg = AppCfg::default();
        cfg.task.target_class = 2;
        assert!(cfg.validate().is_err());

        let mut cfg = AppCfg::default();
        cfg.task.class_count = 1;
        assert!(cfg.validate().is_err());
    }
}
