//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use oee_core::{Material, MaterialId};
use oee_db::Database;
use regex::Regex;

static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").expect("relative time pattern")
});

/// ~1000 years in minutes.
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parse a datetime string as RFC 3339, local wall-clock time, or relative time.
///
/// Supports:
/// - RFC 3339: "2026-01-15T10:30:00Z"
/// - Local: "2026-01-15T10:30" or "2026-01-15T10:30:00" in the system time zone
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str) -> anyhow::Result<DateTime<Utc>> {
    parse_datetime_at(s, Utc::now())
}

fn parse_datetime_at(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        // Skipped or repeated wall-clock times around DST shifts have no single answer.
        let local = Local
            .from_local_datetime(&naive)
            .single()
            .with_context(|| format!("ambiguous local time: {s}"))?;
        return Ok(local.with_timezone(&Utc));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use RFC 3339 (e.g., 2026-01-15T10:30:00Z), local time (e.g., 2026-01-15T10:30) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let minutes_per_unit = match &caps[2] {
        "minute" => 1,
        "hour" => 60,
        "day" => 60 * 24,
        "week" => 60 * 24 * 7,
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > MAX_RELATIVE_MINUTES / minutes_per_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Parses an optional `--at` style flag, defaulting to now.
pub fn time_or_now(s: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    s.map_or_else(|| Ok(Utc::now()), parse_datetime)
}

/// Looks up a material by name.
///
/// A name the catalog does not list still identifies a material; whether the
/// equipment has settings for it is decided by the builders.
pub fn lookup_material(db: &Database, name: &str) -> anyhow::Result<Material> {
    if let Some(material) = db.material(name)? {
        return Ok(material);
    }
    tracing::debug!(material = name, "material not in catalog");
    Ok(Material::new(MaterialId::new(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_datetime_at("2025-06-01T08:00:00+02:00", now()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-01T06:00:00+00:00");
    }

    #[test]
    fn parses_local_time_without_seconds() {
        let dt = parse_datetime_at("2025-01-15T10:30", now()).unwrap();
        let expected = Local
            .with_ymd_and_hms(2025, 1, 15, 10, 30, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(dt, expected);
    }

    #[test]
    fn parses_relative_time() {
        let dt = parse_datetime_at("90 minutes ago", now()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-01T10:30:00+00:00");

        let dt = parse_datetime_at("1 week ago", now()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-05-25T12:00:00+00:00");
    }

    #[test]
    fn rejects_garbage_and_huge_values() {
        assert!(parse_datetime_at("yesterday-ish", now()).is_err());
        assert!(parse_datetime_at("999999999 weeks ago", now()).is_err());
    }

    #[test]
    fn unknown_material_is_bare() {
        let db = Database::open_in_memory().unwrap();
        let material = lookup_material(&db, "PN-9").unwrap();
        assert_eq!(material, Material::new(MaterialId::new("PN-9").unwrap()));
        assert!(lookup_material(&db, " ").is_err());
    }
}
