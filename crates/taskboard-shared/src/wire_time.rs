//! serde adapters for the store's date and clock fields.
//!
//! Due dates arrive either as a bare `YYYY-MM-DD` or as a full timestamp;
//! only the calendar date at the timestamp's own offset is kept. Clock
//! times travel as `HH:MM`.

use chrono::{
  DateTime,
  NaiveDate,
  NaiveTime
};
use serde::de::Error as _;
use serde::{
  Deserialize,
  Deserializer,
  Serializer
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const CLOCK_FORMAT: &str = "%H:%M";

fn parse_date(
  raw: &str
) -> Result<NaiveDate, String> {
  let trimmed = raw.trim();
  if let Ok(date) =
    NaiveDate::parse_from_str(
      trimmed,
      DATE_FORMAT
    )
  {
    return Ok(date);
  }
  DateTime::parse_from_rfc3339(trimmed)
    .map(|dt| dt.date_naive())
    .map_err(|err| {
      format!(
        "invalid due date {trimmed:?}: \
         {err}"
      )
    })
}

fn parse_clock(
  raw: &str
) -> Result<NaiveTime, String> {
  let trimmed = raw.trim();
  NaiveTime::parse_from_str(
    trimmed,
    CLOCK_FORMAT
  )
  .or_else(|_| {
    NaiveTime::parse_from_str(
      trimmed, "%H:%M:%S"
    )
  })
  .map_err(|err| {
    format!(
      "invalid due time {trimmed:?}: \
       {err}"
    )
  })
}

pub mod due_date {
  use super::*;

  pub fn serialize<S>(
    value: &Option<NaiveDate>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match value {
      | Some(date) => serializer
        .serialize_str(
          &date
            .format(DATE_FORMAT)
            .to_string()
        ),
      | None => serializer.serialize_none()
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<NaiveDate>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw: Option<String> =
      Option::deserialize(deserializer)?;
    match raw {
      | Some(raw)
        if !raw.trim().is_empty() =>
      {
        parse_date(&raw)
          .map(Some)
          .map_err(D::Error::custom)
      }
      | _ => Ok(None)
    }
  }
}

pub mod clock {
  use super::*;

  pub fn serialize<S>(
    value: &Option<NaiveTime>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match value {
      | Some(time) => serializer
        .serialize_str(
          &time
            .format(CLOCK_FORMAT)
            .to_string()
        ),
      | None => serializer.serialize_none()
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<NaiveTime>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw: Option<String> =
      Option::deserialize(deserializer)?;
    match raw {
      | Some(raw)
        if !raw.trim().is_empty() =>
      {
        parse_clock(&raw)
          .map(Some)
          .map_err(D::Error::custom)
      }
      | _ => Ok(None)
    }
  }
}

/// Patch variant: absent stays `None` (via `default`), `null` becomes
/// `Some(None)`.
pub mod patch_due_date {
  use super::*;

  pub fn serialize<S>(
    value: &Option<Option<NaiveDate>>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match value {
      | Some(inner) => {
        super::due_date::serialize(
          inner, serializer
        )
      }
      | None => serializer.serialize_none()
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<
    Option<Option<NaiveDate>>,
    D::Error
  >
  where
    D: Deserializer<'de>
  {
    super::due_date::deserialize(
      deserializer
    )
    .map(Some)
  }
}

pub mod patch_clock {
  use super::*;

  pub fn serialize<S>(
    value: &Option<Option<NaiveTime>>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match value {
      | Some(inner) => {
        super::clock::serialize(
          inner, serializer
        )
      }
      | None => serializer.serialize_none()
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<
    Option<Option<NaiveTime>>,
    D::Error
  >
  where
    D: Deserializer<'de>
  {
    super::clock::deserialize(
      deserializer
    )
    .map(Some)
  }
}
