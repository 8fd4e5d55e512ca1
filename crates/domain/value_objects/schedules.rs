use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{
    entities::sessions::{InsertSessionEntity, UpdateSessionEntity},
    errors::{CoreError, CoreResult},
};

pub const MAX_GENERATED_SESSIONS: usize = 365;

#[derive(Debug, Clone, Deserialize)]
pub struct RecurringSessionsModel {
    /// Local wall-clock time, `HH:MM`.
    pub start_time: String,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekdays: Vec<i32>,
    pub from_date: String,
    pub to_date: String,
    pub duration_minutes: i32,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    weekdays: BTreeSet<u32>,
    time_of_day: NaiveTime,
    from: NaiveDate,
    to: NaiveDate,
    duration_minutes: i32,
    location: Option<String>,
}

impl RecurrenceRule {
    pub fn parse(model: &RecurringSessionsModel) -> CoreResult<Self> {
        if model.weekdays.is_empty() {
            return Err(CoreError::BadRequest("weekdays must not be empty".to_string()));
        }

        let mut weekdays = BTreeSet::new();
        for day in &model.weekdays {
            if !(0..=6).contains(day) {
                return Err(CoreError::BadRequest(format!(
                    "weekday {day} is out of range 0..=6"
                )));
            }
            weekdays.insert(*day as u32);
        }

        let time_of_day = NaiveTime::parse_from_str(model.start_time.trim(), "%H:%M")
            .map_err(|_| CoreError::BadRequest("start_time must be HH:MM".to_string()))?;
        let from = parse_date("from_date", &model.from_date)?;
        let to = parse_date("to_date", &model.to_date)?;

        if to < from {
            return Err(CoreError::BadRequest(
                "to_date must not be before from_date".to_string(),
            ));
        }
        if model.duration_minutes <= 0 {
            return Err(CoreError::BadRequest(
                "duration_minutes must be positive".to_string(),
            ));
        }

        let location = model
            .location
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(Self {
            weekdays,
            time_of_day,
            from,
            to,
            duration_minutes: model.duration_minutes,
            location,
        })
    }

    /// Expands the rule into session rows, interpreting the time of day in `tz`.
    pub fn expand<Tz: TimeZone>(&self, group_id: Uuid, tz: &Tz) -> CoreResult<Vec<InsertSessionEntity>> {
        let mut sessions = Vec::new();

        for date in self.from.iter_days().take_while(|date| *date <= self.to) {
            if !self.weekdays.contains(&date.weekday().num_days_from_sunday()) {
                continue;
            }

            let local = date.and_time(self.time_of_day);
            let start_at = tz
                .from_local_datetime(&local)
                .earliest()
                .ok_or_else(|| {
                    CoreError::BadRequest(format!("{local} does not exist in the club timezone"))
                })?
                .with_timezone(&Utc);

            sessions.push(InsertSessionEntity {
                group_id,
                start_at,
                duration_minutes: self.duration_minutes,
                location: self.location.clone(),
            });

            if sessions.len() > MAX_GENERATED_SESSIONS {
                return Err(CoreError::BadRequest(format!(
                    "rule generates more than {MAX_GENERATED_SESSIONS} sessions"
                )));
            }
        }

        if sessions.is_empty() {
            return Err(CoreError::BadRequest(
                "no sessions match the given weekdays and date range".to_string(),
            ));
        }

        Ok(sessions)
    }
}

fn parse_date(field: &str, value: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::BadRequest(format!("{field} must be YYYY-MM-DD")))
}

pub const MAX_SESSION_MINUTES: i32 = 8 * 60;

/// One session placed by hand.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertSessionModel {
    pub start_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location: Option<String>,
}

impl InsertSessionModel {
    pub fn into_entity(self, group_id: Uuid) -> CoreResult<InsertSessionEntity> {
        validate_duration(self.duration_minutes)?;
        Ok(InsertSessionEntity {
            group_id,
            start_at: self.start_at,
            duration_minutes: self.duration_minutes,
            location: clean_location(self.location),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSessionModel {
    pub start_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub location: Option<String>,
}

impl UpdateSessionModel {
    pub fn into_changeset(self) -> CoreResult<UpdateSessionEntity> {
        if let Some(duration_minutes) = self.duration_minutes {
            validate_duration(duration_minutes)?;
        }
        let changes = UpdateSessionEntity {
            start_at: self.start_at,
            duration_minutes: self.duration_minutes,
            location: clean_location(self.location),
        };
        if changes.is_empty() {
            return Err(CoreError::BadRequest("nothing to update".to_string()));
        }
        Ok(changes)
    }
}

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`, both inclusive and read in the club's timezone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionRangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl SessionRangeQuery {
    /// Half-open UTC window. Defaults to a week back and a month ahead of `now`.
    pub fn window<Tz: TimeZone>(
        &self,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> CoreResult<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.with_timezone(tz).date_naive();
        let from = match self.from.as_deref() {
            Some(raw) => parse_date("from", raw)?,
            None => today - Duration::days(7),
        };
        let to = match self.to.as_deref() {
            Some(raw) => parse_date("to", raw)?,
            None => today.checked_add_months(Months::new(1)).unwrap_or(today),
        };
        if to < from {
            return Err(CoreError::BadRequest("to must not be before from".to_string()));
        }

        let start = local_midnight(from, tz)?;
        let end = local_midnight(to + Duration::days(1), tz)?;
        Ok((start, end))
    }
}

fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> CoreResult<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| CoreError::BadRequest(format!("{date} has no midnight in the club timezone")))
}

fn validate_duration(duration_minutes: i32) -> CoreResult<()> {
    if !(1..=MAX_SESSION_MINUTES).contains(&duration_minutes) {
        return Err(CoreError::BadRequest(format!(
            "duration_minutes must be between 1 and {MAX_SESSION_MINUTES}"
        )));
    }
    Ok(())
}

fn clean_location(location: Option<String>) -> Option<String> {
    location
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
