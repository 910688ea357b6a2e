use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Duration,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;
use taskboard_shared::DueDate;

const TIMEZONE_CONFIG_FILE: &str =
  "taskboard-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "TASKBOARD_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "TASKBOARD_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Resolves the client's day-boundary timezone: the configured value
/// first, then `TASKBOARD_TIMEZONE`, then `taskboard-time.toml`, then UTC.
pub fn resolve_client_timezone(
  configured: Option<&str>
) -> Tz {
  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    )
  {
    return tz;
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return tz;
  }

  tracing::debug!(
    "no client timezone configured; \
     using UTC"
  );
  chrono_tz::UTC
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &Path
) -> Option<Tz> {
  if !path.exists() {
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(err) => {
      tracing::warn!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Timezone whose midnight bounds the due date's day: the task's own label
/// when it names a known zone, otherwise the client zone.
pub fn due_timezone(
  due: &DueDate,
  client_tz: Tz
) -> Tz {
  due
    .timezone
    .as_deref()
    .and_then(|label| {
      parse_timezone(label, "due-date")
    })
    .unwrap_or(client_tz)
}

#[must_use]
pub fn local_today(
  now: DateTime<Utc>,
  tz: Tz
) -> NaiveDate {
  now.with_timezone(&tz).date_naive()
}

#[must_use]
pub fn format_due(due: &DueDate) -> String {
  let mut out = due
    .date
    .format("%b %d, %Y")
    .to_string();
  if let Some(time) = due.time {
    out.push(' ');
    out.push_str(
      &time.format("%H:%M").to_string()
    );
  }
  if let Some(tz) = due.timezone.as_deref()
  {
    out.push_str(&format!(" ({tz})"));
  }
  out
}

/// Parses a due-date expression typed by a user. An optional `@Area/City`
/// suffix labels the date with that timezone, which also anchors relative
/// words like `today`.
#[tracing::instrument(skip(now, client_tz), fields(input = input))]
pub fn parse_due_expr(
  input: &str,
  now: DateTime<Utc>,
  client_tz: Tz
) -> anyhow::Result<DueDate> {
  let (body, label) =
    match input.rsplit_once('@') {
      | Some((body, label)) => {
        (body.trim(), Some(label.trim()))
      }
      | None => (input.trim(), None)
    };

  let anchor_tz = match label {
    | Some(label) => label
      .parse::<Tz>()
      .map_err(|err| {
        anyhow!(
          "unknown timezone \
           {label:?}: {err}"
        )
      })?,
    | None => client_tz
  };
  let timezone =
    label.map(str::to_string);
  let today = local_today(now, anchor_tz);

  let (date, time) =
    parse_due_body(body, today, now, anchor_tz)
      .with_context(|| {
        "supported formats: \
         today/tomorrow/yesterday, \
         weekday names (e.g. friday), \
         clock times (e.g. 3:30pm or \
         15:30), +Nd/-Nd/+Nw, \
         YYYY-MM-DD, YYYY-MM-DD HH:MM, \
         with an optional @Area/City \
         suffix"
      })?;

  Ok(DueDate {
    date,
    time,
    timezone
  })
}

fn parse_due_body(
  token: &str,
  today: NaiveDate,
  now: DateTime<Utc>,
  tz: Tz
) -> anyhow::Result<(
  NaiveDate,
  Option<NaiveTime>
)> {
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok((today, None)),
    | "tomorrow" => {
      return Ok((
        shift_days(today, 1)?,
        None
      ));
    }
    | "yesterday" => {
      return Ok((
        shift_days(today, -1)?,
        None
      ));
    }
    | _ => {}
  }

  if let Some(target) =
    parse_weekday_name(&lower)
  {
    return Ok((
      next_weekday_date(today, target),
      None
    ));
  }

  if let Some(time) =
    parse_clock_time(token)
  {
    let local_now =
      now.with_timezone(&tz).time();
    let day = if time <= local_now {
      shift_days(today, 1)?
    } else {
      today
    };
    return Ok((day, Some(time)));
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile \
       failure: {e}"
    )
  })?;
  if let Some(caps) =
    rel_re.captures(token)
  {
    let num: i64 = caps["num"]
      .parse()
      .context(
        "invalid relative number"
      )?;
    let days = match &caps["unit"] {
      | "w" => num.checked_mul(7).ok_or_else(
        || anyhow!("relative offset too large: {token}")
      )?,
      | _ => num
    };
    let signed = if &caps["sign"] == "-" {
      -days
    } else {
      days
    };
    return Ok((
      shift_days(today, signed)?,
      None
    ));
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Ok((date, None));
  }

  for fmt in
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
  {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok((
        ndt.date(),
        Some(ndt.time())
      ));
    }
  }

  Err(anyhow!(
    "unrecognized due date: {token}"
  ))
}

fn shift_days(
  from: NaiveDate,
  days: i64
) -> anyhow::Result<NaiveDate> {
  Duration::try_days(days)
    .and_then(|delta| {
      from.checked_add_signed(delta)
    })
    .ok_or_else(|| {
      anyhow!(
        "date out of range: {from} \
         {days:+} days"
      )
    })
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as i64;
  let target_idx = target
    .num_days_from_monday()
    as i64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_signed(Duration::days(
      delta
    ))
    .unwrap_or(from)
}

fn parse_clock_time(
  token: &str
) -> Option<NaiveTime> {
  let clock_re = Regex::new(
    r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[ap]m)?$",
  )
  .ok()?;
  let captures =
    clock_re.captures(token.trim())?;

  let raw_hour = captures
    .name("hour")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let minute = captures
    .name("minute")?
    .as_str()
    .parse::<u32>()
    .ok()?;

  let hour = if let Some(ampm_match) =
    captures.name("ampm")
  {
    if raw_hour == 0 || raw_hour > 12 {
      return None;
    }
    match ampm_match
      .as_str()
      .to_ascii_lowercase()
      .as_str()
    {
      | "am" => raw_hour % 12,
      | "pm" => raw_hour % 12 + 12,
      | _ => return None
    }
  } else {
    raw_hour
  };

  NaiveTime::from_hms_opt(
    hour, minute, 0
  )
}
