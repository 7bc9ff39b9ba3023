// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-zone aware schedule evaluation
//!
//! A configuration is due once `now >= next_due_at`. Evaluating it stamps
//! `last_evaluated_at = now` and recomputes `next_due_at` from `now`, whatever
//! happens to the check that follows.

use crate::configuration::Configuration;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing or evaluating a schedule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid schedule expression {expression:?}: {message}")]
    InvalidExpression { expression: String, message: String },
    #[error("unknown time zone: {0}")]
    InvalidTimezone(String),
    #[error("schedule {0:?} has no upcoming occurrence")]
    Exhausted(String),
}

/// Strategy that turns a schedule expression into concrete fire times
pub trait ScheduleStrategy: Send + Sync + 'static {
    /// First fire time strictly after `after`, evaluated in `zone`
    fn next_after(
        &self,
        expression: &str,
        zone: Tz,
        after: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ScheduleError>;
}

/// Cron expressions via the `cron` crate
///
/// Accepts the common 5-field form (minute precision, seconds fixed at 0)
/// as well as the 6/7-field form with a leading seconds field. In the
/// 5-field form numeric days of the week follow standard cron (0 or 7 is
/// Sunday, 1 is Monday); the 6/7-field form uses the `cron` crate's own
/// numbering (1 is Sunday). Wall-clock times that do not exist in the zone
/// (spring-forward gaps) are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CronStrategy;

impl CronStrategy {
    fn parse(expression: &str) -> Result<cron::Schedule, ScheduleError> {
        let invalid = |message: String| ScheduleError::InvalidExpression {
            expression: expression.to_string(),
            message,
        };
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let normalized = match fields.as_slice() {
            [minute, hour, day, month, weekday] => {
                let weekday = standard_day_of_week(weekday).map_err(invalid)?;
                format!("0 {minute} {hour} {day} {month} {weekday}")
            }
            _ => expression.trim().to_string(),
        };
        cron::Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))
    }
}

/// Rewrite a standard cron day-of-week field (0-7, Sunday = 0 or 7) into the
/// `cron` crate's 1-7 numbering (Sunday = 1)
///
/// `*` and `*/n` select the same days under both numberings and pass
/// through, as do day names. Numeric values, ranges and steps are expanded
/// to an explicit list.
fn standard_day_of_week(field: &str) -> Result<String, String> {
    let mut kept = Vec::new();
    let mut days = std::collections::BTreeSet::new();

    for item in field.split(',') {
        let (base, step) = match item.split_once('/') {
            Some((base, step)) => (base, Some(step)),
            None => (item, None),
        };
        if base == "*" || base == "?" || base.chars().any(|c| c.is_ascii_alphabetic()) {
            kept.push(item.to_string());
            continue;
        }

        let number = |text: &str| -> Result<u32, String> {
            match text.parse::<u32>() {
                Ok(n) if n <= 7 => Ok(n),
                _ => Err(format!("day of week {text:?} is not in 0-7")),
            }
        };
        let (start, end) = match base.split_once('-') {
            Some((start, end)) => (number(start)?, number(end)?),
            // `n/step` runs to the end of the week
            None if step.is_some() => (number(base)?, 6),
            None => {
                let n = number(base)?;
                (n, n)
            }
        };
        if start > end {
            return Err(format!("day of week range {base:?} runs backwards"));
        }
        let step = match step {
            Some(text) => match text.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(format!("day of week step {text:?} is not a positive number")),
            },
            None => 1,
        };
        days.extend((start..=end).step_by(step).map(|day| day % 7 + 1));
    }

    kept.extend(days.iter().map(u32::to_string));
    Ok(kept.join(","))
}

impl ScheduleStrategy for CronStrategy {
    fn next_after(
        &self,
        expression: &str,
        zone: Tz,
        after: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let schedule = Self::parse(expression)?;
        schedule
            .after(&after.with_timezone(&zone))
            .next()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| ScheduleError::Exhausted(expression.to_string()))
    }
}

/// Decides which configurations are due and when they fire next
#[derive(Debug, Clone, Default)]
pub struct ScheduleEvaluator<S = CronStrategy> {
    strategy: S,
}

impl ScheduleEvaluator<CronStrategy> {
    pub fn new() -> Self {
        Self {
            strategy: CronStrategy,
        }
    }
}

impl<S: ScheduleStrategy> ScheduleEvaluator<S> {
    pub fn with_strategy(strategy: S) -> Self {
        Self { strategy }
    }

    /// A configuration is due when it is active and `now >= next_due_at`
    ///
    /// A configuration that has never been evaluated has no `next_due_at`
    /// and is not due; see [`ScheduleEvaluator::initialize`].
    pub fn is_due(&self, configuration: &Configuration, now: DateTime<Utc>) -> bool {
        configuration.is_active && configuration.next_due_at.is_some_and(|due| now >= due)
    }

    /// Next fire time strictly after `after`
    pub fn compute_next(
        &self,
        expression: &str,
        zone: Tz,
        after: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        self.strategy.next_after(expression, zone, after)
    }

    /// Record an evaluation at `now` and move `next_due_at` forward from `now`
    pub fn advance(
        &self,
        configuration: &Configuration,
        now: DateTime<Utc>,
    ) -> Result<Configuration, ScheduleError> {
        let zone = configuration.zone()?;
        let next = self.compute_next(&configuration.schedule_expression, zone, now)?;
        Ok(Configuration {
            last_evaluated_at: Some(now),
            next_due_at: Some(next),
            ..configuration.clone()
        })
    }

    /// Give a never-evaluated configuration its first `next_due_at`
    ///
    /// Same as [`ScheduleEvaluator::advance`]; named separately so call sites
    /// read as what they mean.
    pub fn initialize(
        &self,
        configuration: &Configuration,
        now: DateTime<Utc>,
    ) -> Result<Configuration, ScheduleError> {
        self.advance(configuration, now)
    }

    /// Check that the expression and zone of a configuration are usable
    pub fn validate(&self, configuration: &Configuration) -> Result<(), ScheduleError> {
        let zone = configuration.zone()?;
        self.compute_next(&configuration.schedule_expression, zone, Utc::now())
            .map(|_| ())
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
