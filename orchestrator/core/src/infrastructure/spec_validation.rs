// Copyright (c) 2026 Tributary Authors
// SPDX-License-Identifier: AGPL-3.0

//! Specification Validation Rules
//!
//! A registry of named validation rules applied to authored job documents
//! before adaptation. The registry is an explicit value handed to the
//! adapter, so different callers (and tests) can run with different rule
//! sets side by side.
//!
//! Each rule receives the field value and a rule parameter (`"3"` for
//! `min`, a pattern for `regex`, nothing for `isCron`) and returns a reason
//! on rejection.
//!
//! | Rule | Parameter | Accepts |
//! |------|-----------|---------|
//! | `min` / `max` | length in characters | strings at least / at most that long |
//! | `regex` | pattern | strings matching the pattern |
//! | `isCron` | none | crontab intervals, `@descriptors`, `@every <duration>` |
//! | `jobName` | none | `[a-zA-Z0-9][a-zA-Z0-9_.-]+` without `/` |

use crate::domain::duration;
use crate::domain::spec_error::SpecError;
use crate::infrastructure::job_spec_adapter::Job;
use chrono::TimeDelta;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// A validation rule: `(value, parameter) -> Ok | Err(reason)`
pub type ValidationRule = Arc<dyn Fn(&str, &str) -> Result<(), String> + Send + Sync>;

pub const RULE_MIN: &str = "min";
pub const RULE_MAX: &str = "max";
pub const RULE_REGEX: &str = "regex";
pub const RULE_CRON: &str = "isCron";
pub const RULE_JOB_NAME: &str = "jobName";

const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";
const TRUNCATE_TO_PATTERN: &str = "^(h|d|w|M)$";

static JOB_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_\-\.]+$").expect("job name pattern is valid")
});

#[derive(Clone)]
pub struct SpecValidator {
    rules: BTreeMap<String, ValidationRule>,
}

impl fmt::Debug for SpecValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecValidator")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SpecValidator {
    /// Validator with every built-in rule registered
    fn default() -> Self {
        let mut validator = Self::empty();
        validator.register(RULE_MIN, |value, param| {
            let min = parse_length(param)?;
            if value.chars().count() < min {
                return Err(format!("must be at least {} characters", min));
            }
            Ok(())
        });
        validator.register(RULE_MAX, |value, param| {
            let max = parse_length(param)?;
            if value.chars().count() > max {
                return Err(format!("must be at most {} characters", max));
            }
            Ok(())
        });
        validator.register(RULE_REGEX, |value, pattern| {
            let re = Regex::new(pattern).map_err(|e| format!("bad pattern '{}': {}", pattern, e))?;
            if !re.is_match(value) {
                return Err(format!("does not match {}", pattern));
            }
            Ok(())
        });
        validator.register(RULE_CRON, |value, _| validate_cron(value));
        validator.register(RULE_JOB_NAME, |value, _| validate_job_name(value));
        validator
    }
}

impl SpecValidator {
    /// Validator without any rules
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Register (or replace) a named rule
    pub fn register<F>(&mut self, name: impl Into<String>, rule: F)
    where
        F: Fn(&str, &str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rules.insert(name.into(), Arc::new(rule));
    }

    /// Apply one named rule to a field value
    pub fn check(&self, field: &str, value: &str, rule: &str, param: &str) -> Result<(), SpecError> {
        let check = self
            .rules
            .get(rule)
            .ok_or_else(|| SpecError::validation(field, format!("unknown validation rule '{}'", rule)))?;
        check(value, param).map_err(|reason| SpecError::validation(field, reason))
    }

    /// Structural validation of an authored job
    pub fn validate_job(&self, job: &Job) -> Result<(), SpecError> {
        if !(1..=100).contains(&job.version) {
            return Err(SpecError::validation(
                "version",
                format!("must be between 1 and 100, got {}", job.version),
            ));
        }

        let name = job.name.trim();
        self.check("name", name, RULE_MIN, "3")?;
        self.check("name", name, RULE_MAX, "1024")?;
        self.check("owner", &job.owner, RULE_MIN, "3")?;
        self.check("owner", &job.owner, RULE_MAX, "1024")?;
        self.check("schedule.start_date", &job.schedule.start_date, RULE_REGEX, DATE_PATTERN)?;
        self.check("schedule.interval", &job.schedule.interval, RULE_CRON, "")?;

        if !job.task.window.truncate_to.is_empty() {
            self.check(
                "task.window.truncate_to",
                &job.task.window.truncate_to,
                RULE_REGEX,
                TRUNCATE_TO_PATTERN,
            )?;
        }

        Ok(())
    }
}

fn parse_length(param: &str) -> Result<usize, String> {
    param
        .parse()
        .map_err(|_| format!("rule parameter '{}' is not a length", param))
}

pub fn validate_job_name(value: &str) -> Result<(), String> {
    if value.contains('/') {
        return Err("job name cannot contain '/'".to_string());
    }
    if !JOB_NAME.is_match(value) {
        return Err(
            "job name must start with a letter or digit and contain only letters, digits, '_', '-' or '.'"
                .to_string(),
        );
    }
    Ok(())
}

// ============================================================================
// Cron intervals
// ============================================================================

const DESCRIPTORS: &[&str] = &[
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
];

const MONTH_NAMES: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const DAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

struct CronField {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    allows_any: bool,
}

const CRON_FIELDS: [CronField; 5] = [
    CronField { name: "minute", min: 0, max: 59, names: &[], allows_any: false },
    CronField { name: "hour", min: 0, max: 23, names: &[], allows_any: false },
    CronField { name: "day of month", min: 1, max: 31, names: &[], allows_any: true },
    CronField { name: "month", min: 1, max: 12, names: MONTH_NAMES, allows_any: false },
    CronField { name: "day of week", min: 0, max: 6, names: DAY_NAMES, allows_any: true },
];

/// Accept a 5-field crontab expression, a predefined `@descriptor`, or
/// `@every <duration>` with a positive duration
pub fn validate_cron(expr: &str) -> Result<(), String> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err("cron interval cannot be empty".to_string());
    }

    if let Some(every) = expr.strip_prefix("@every ") {
        let span = duration::parse_standard(every.trim()).map_err(|e| e.to_string())?;
        if span <= TimeDelta::zero() {
            return Err("@every interval must be positive".to_string());
        }
        return Ok(());
    }

    if expr.starts_with('@') {
        if DESCRIPTORS.contains(&expr) {
            return Ok(());
        }
        return Err(format!("unrecognized descriptor '{}'", expr));
    }

    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != CRON_FIELDS.len() {
        return Err(format!(
            "expected {} fields, found {} in '{}'",
            CRON_FIELDS.len(),
            fields.len(),
            expr
        ));
    }

    for (raw, field) in fields.iter().zip(CRON_FIELDS.iter()) {
        validate_cron_field(raw, field)?;
    }
    Ok(())
}

fn validate_cron_field(raw: &str, field: &CronField) -> Result<(), String> {
    for part in raw.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (part, None),
        };

        if let Some(step) = step {
            let step: u32 = step
                .parse()
                .map_err(|_| format!("invalid step '{}' in {} field", step, field.name))?;
            if step == 0 {
                return Err(format!("step cannot be zero in {} field", field.name));
            }
        }

        if range == "*" || (range == "?" && field.allows_any) {
            continue;
        }

        let (low, high) = match range.split_once('-') {
            Some((low, high)) => (cron_value(low, field)?, cron_value(high, field)?),
            None => {
                let value = cron_value(range, field)?;
                (value, value)
            }
        };
        if low > high {
            return Err(format!(
                "range {}-{} is inverted in {} field",
                low, high, field.name
            ));
        }
    }
    Ok(())
}

fn cron_value(raw: &str, field: &CronField) -> Result<u32, String> {
    let value = match raw.parse::<u32>() {
        Ok(value) => value,
        Err(_) => field
            .names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(raw))
            .map(|idx| idx as u32 + field.min)
            .ok_or_else(|| format!("invalid value '{}' in {} field", raw, field.name))?,
    };
    if value < field.min || value > field.max {
        return Err(format!(
            "{} out of range [{}, {}] in {} field",
            value, field.min, field.max, field.name
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::job_spec_adapter::{JobSchedule, JobTask, JobTaskWindow};

    fn job() -> Job {
        Job {
            version: 1,
            name: "orders-daily".to_string(),
            owner: "data-eng".to_string(),
            schedule: JobSchedule {
                start_date: "2021-02-18".to_string(),
                end_date: String::new(),
                interval: "0 2 * * *".to_string(),
            },
            task: JobTask {
                name: "bq2bq".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_cron_intervals() {
        for ok in [
            "* * * * *",
            "0 2 * * *",
            "*/15 0-6,18-23 1 JAN-MAR mon-fri",
            "0 0 ? * SUN",
            "@daily",
            "@every 1h30m",
        ] {
            assert!(validate_cron(ok).is_ok(), "{} should be valid", ok);
        }

        for bad in [
            "",
            "* * * *",
            "60 * * * *",
            "0 24 * * *",
            "0 0 0 * *",
            "*/0 * * * *",
            "5-1 * * * *",
            "? * * * *",
            "@fortnightly",
            "@every -1h",
            "@every soon",
        ] {
            assert!(validate_cron(bad).is_err(), "{} should be invalid", bad);
        }
    }

    #[test]
    fn test_job_name_rule() {
        assert!(validate_job_name("orders_daily.v2").is_ok());
        assert!(validate_job_name("team/orders").is_err());
        assert!(validate_job_name("-orders").is_err());
        assert!(validate_job_name("a").is_err());
    }

    #[test]
    fn test_validate_job() {
        let validator = SpecValidator::default();
        assert!(validator.validate_job(&job()).is_ok());

        let mut bad = job();
        bad.version = 0;
        assert!(validator.validate_job(&bad).is_err());

        let mut bad = job();
        bad.name = " ab ".to_string();
        assert!(matches!(
            validator.validate_job(&bad),
            Err(SpecError::Validation { ref field, .. }) if field == "name"
        ));

        let mut bad = job();
        bad.schedule.start_date = "18-02-2021".to_string();
        assert!(validator.validate_job(&bad).is_err());

        let mut bad = job();
        bad.schedule.interval = "every day".to_string();
        assert!(validator.validate_job(&bad).is_err());

        let mut bad = job();
        bad.task.window = JobTaskWindow {
            truncate_to: "y".to_string(),
            ..Default::default()
        };
        assert!(validator.validate_job(&bad).is_err());
    }

    #[test]
    fn test_rule_sets_are_independent() {
        let mut strict = SpecValidator::default();
        strict.register(RULE_CRON, |value, _| {
            if value.starts_with('@') {
                Err("descriptors are not allowed".to_string())
            } else {
                validate_cron(value)
            }
        });

        let mut job = job();
        job.schedule.interval = "@daily".to_string();

        assert!(SpecValidator::default().validate_job(&job).is_ok());
        assert!(strict.validate_job(&job).is_err());
    }

    #[test]
    fn test_unknown_rule_is_rejected() {
        let validator = SpecValidator::empty();
        assert!(validator.check("name", "abc", RULE_MIN, "3").is_err());
    }
}
