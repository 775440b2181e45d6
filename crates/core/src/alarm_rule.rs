//! Alarm rule trait and the threshold based rule

use chrono::{DateTime, Duration, Utc};
use glucowatch_types::{AlarmThresholds, BloodSugar, Reading};
use std::sync::Mutex;

use crate::constants::MAX_SNOOZE_MINUTES;

/// Decides whether the alarm should sound and tracks snooze state
pub trait AlarmRule: Send + Sync {
    fn should_alarm(&self, current: &Reading, today: &[BloodSugar]) -> bool;

    fn is_snoozed(&self) -> bool;

    /// Whole minutes left in the active snooze, rounded up; 0 when not snoozed
    fn remaining_snooze_minutes(&self) -> i64;

    fn disable_snooze(&self);

    fn snooze(&self, minutes: i64);
}

/// Alarms when glucose leaves the configured range or data goes stale
#[derive(Debug)]
pub struct ThresholdAlarmRule {
    thresholds: AlarmThresholds,
    snoozed_until: Mutex<Option<DateTime<Utc>>>,
}

impl ThresholdAlarmRule {
    pub fn new(thresholds: AlarmThresholds) -> Self {
        Self {
            thresholds,
            snoozed_until: Mutex::new(None),
        }
    }

    pub fn thresholds(&self) -> &AlarmThresholds {
        &self.thresholds
    }

    pub fn snooze_until(&self, deadline: DateTime<Utc>) {
        *self.snoozed_until.lock().unwrap_or_else(|e| e.into_inner()) = Some(deadline);
    }

    pub fn is_snoozed_at(&self, now: DateTime<Utc>) -> bool {
        let guard = self.snoozed_until.lock().unwrap_or_else(|e| e.into_inner());
        matches!(*guard, Some(deadline) if deadline > now)
    }

    pub fn remaining_snooze_minutes_at(&self, now: DateTime<Utc>) -> i64 {
        let guard = self.snoozed_until.lock().unwrap_or_else(|e| e.into_inner());
        match *guard {
            Some(deadline) if deadline > now => {
                let seconds = (deadline - now).num_seconds();
                (seconds + 59) / 60
            }
            _ => 0,
        }
    }

    /// Snooze for `minutes` from `now`, capped at [`MAX_SNOOZE_MINUTES`]
    pub fn snooze_for_at(&self, minutes: i64, now: DateTime<Utc>) {
        let minutes = minutes.clamp(0, MAX_SNOOZE_MINUTES);
        match now.checked_add_signed(Duration::minutes(minutes)) {
            Some(deadline) => self.snooze_until(deadline),
            None => log::warn!("Snooze of {} minutes from {} is out of range", minutes, now),
        }
    }

    /// Evaluate the rule at a given instant
    pub fn should_alarm_at(&self, current: &Reading, today: &[BloodSugar], now: DateTime<Utc>) -> bool {
        if self.is_snoozed_at(now) {
            return false;
        }

        // Fall back to the newest chart point when the reading has no value
        let latest = if current.sgv_value > 0.0 {
            current.time.map(|t| (current.sgv_value, t))
        } else {
            today.last().map(|p| (p.value, p.timestamp))
        };

        let Some((value, taken_at)) = latest else {
            return false;
        };

        if self.thresholds.stale_minutes > 0
            && now - taken_at > Duration::minutes(self.thresholds.stale_minutes)
        {
            log::debug!("Alarm: newest reading is from {}", taken_at);
            return true;
        }

        if self.thresholds.is_out_of_range(value) {
            log::debug!("Alarm: {} mg/dL outside {:?}", value, self.thresholds);
            return true;
        }

        false
    }
}

impl AlarmRule for ThresholdAlarmRule {
    fn should_alarm(&self, current: &Reading, today: &[BloodSugar]) -> bool {
        self.should_alarm_at(current, today, Utc::now())
    }

    fn is_snoozed(&self) -> bool {
        self.is_snoozed_at(Utc::now())
    }

    fn remaining_snooze_minutes(&self) -> i64 {
        self.remaining_snooze_minutes_at(Utc::now())
    }

    fn disable_snooze(&self) {
        *self.snoozed_until.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn snooze(&self, minutes: i64) {
        self.snooze_for_at(minutes, Utc::now());
    }
}
