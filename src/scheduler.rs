// src/scheduler.rs

use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime, Weekday};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

// Longest single sleep while idle, so clock changes are noticed.
const MAX_NAP: Duration = Duration::from_secs(60);

/// A fixed weekly tick in local time, e.g. `mon 08:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub weekday: Weekday,
    pub at: NaiveTime,
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self {
            weekday: Weekday::Mon,
            at: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
        }
    }
}

impl FromStr for WeeklySchedule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(day), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err("expected '<weekday> <HH:MM>'".to_string());
        };

        let weekday = day
            .parse::<Weekday>()
            .map_err(|_| format!("unknown weekday '{day}'"))?;
        let at = NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|e| format!("bad time '{time}': {e}"))?;

        Ok(Self { weekday, at })
    }
}

impl fmt::Display for WeeklySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {} at {}", self.weekday, self.at.format("%H:%M"))
    }
}

impl WeeklySchedule {
    /// First tick strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        let days_ahead = (7 + self.weekday.num_days_from_monday()
            - today.weekday().num_days_from_monday())
            % 7;

        let candidate = today.and_time(self.at) + ChronoDuration::days(i64::from(days_ahead));
        if candidate <= now {
            candidate + ChronoDuration::days(7)
        } else {
            candidate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle { next: NaiveDateTime },
    Running,
}

impl SchedulerState {
    /// RUNNING always returns to IDLE; IDLE starts a run once its tick is due.
    pub fn advance(self, schedule: &WeeklySchedule, now: NaiveDateTime) -> SchedulerState {
        match self {
            SchedulerState::Running => SchedulerState::Idle {
                next: schedule.next_after(now),
            },
            SchedulerState::Idle { next } if now >= next => SchedulerState::Running,
            idle => idle,
        }
    }
}

/// Runs `job` on every tick of `schedule`, forever. With `run_now` the first
/// run starts immediately instead of waiting for the first tick.
pub fn run_weekly<F>(schedule: &WeeklySchedule, run_now: bool, mut job: F)
where
    F: FnMut(),
{
    let now = Local::now().naive_local();
    let mut state = if run_now {
        SchedulerState::Running
    } else {
        SchedulerState::Idle {
            next: schedule.next_after(now),
        }
    };

    info!("🗓️ Scheduler started ({schedule})");

    loop {
        match state {
            SchedulerState::Running => {
                job();
                state = state.advance(schedule, Local::now().naive_local());
                if let SchedulerState::Idle { next } = state {
                    info!(%next, "⏸️ Idle until next tick");
                }
            }
            SchedulerState::Idle { next } => {
                let now = Local::now().naive_local();
                state = state.advance(schedule, now);
                if state == SchedulerState::Running {
                    info!("⏰ Tick reached, starting run");
                    continue;
                }
                let remaining = (next - now).to_std().unwrap_or(Duration::ZERO);
                std::thread::sleep(remaining.min(MAX_NAP));
            }
        }
    }
}
