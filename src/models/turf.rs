use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

const DAY_ORDER: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// A single operating window, e.g. `{"day_rule":"mon-sun","start":"06:00","end":"22:00"}`.
///
/// `day_rule` accepts `everyday`/`daily`, a range like `mon-fri` (wrap-around
/// allowed), or a comma list like `mon,wed,sat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingWindow {
    pub day_rule: String,
    pub start: String,
    pub end: String,
}

impl OperatingWindow {
    pub fn applies_on(&self, weekday: &str) -> bool {
        let rule = self.day_rule.to_lowercase();
        if rule == "everyday" || rule == "daily" {
            return true;
        }
        if let Some((from, to)) = rule.split_once('-') {
            let (Some(from_idx), Some(to_idx)) = (day_index(from), day_index(to)) else {
                return false;
            };
            let Some(day_idx) = day_index(weekday) else {
                return false;
            };
            return if from_idx <= to_idx {
                day_idx >= from_idx && day_idx <= to_idx
            } else {
                // Wrap-around range, e.g. fri-mon
                day_idx >= from_idx || day_idx <= to_idx
            };
        }
        rule.split(',').any(|d| d.trim() == weekday)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingHours {
    pub windows: Vec<OperatingWindow>,
}

impl OperatingHours {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: OperatingHours = serde_json::from_str(s)?;
        hours.validate()?;
        Ok(hours)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"windows\":[]}".to_string())
    }

    /// Windows applying to `weekday`, ordered by start time. Times are
    /// parsed before sorting; `"6:00"` sorts before `"14:00"`.
    pub fn windows_for(&self, weekday: &str) -> Vec<&OperatingWindow> {
        let mut windows: Vec<&OperatingWindow> = self
            .windows
            .iter()
            .filter(|w| w.applies_on(weekday))
            .collect();
        windows.sort_by_key(|w| {
            NaiveTime::parse_from_str(&w.start, "%H:%M").unwrap_or(NaiveTime::MIN)
        });
        windows
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for window in &self.windows {
            parse_day_rule(&window.day_rule)?;
            let start = parse_time(&window.start)?;
            let end = parse_time(&window.end)?;
            if start >= end {
                anyhow::bail!(
                    "window start must be before end: {}-{}",
                    window.start,
                    window.end
                );
            }
        }

        // No two windows may overlap on the same weekday
        for day in DAY_ORDER {
            let windows = self.windows_for(day);
            for pair in windows.windows(2) {
                if parse_time(&pair[1].start)? < parse_time(&pair[0].end)? {
                    anyhow::bail!(
                        "overlapping windows on {day}: {}-{} and {}-{}",
                        pair[0].start,
                        pair[0].end,
                        pair[1].start,
                        pair[1].end
                    );
                }
            }
        }
        Ok(())
    }
}

fn day_index(s: &str) -> Option<usize> {
    DAY_ORDER.iter().position(|d| *d == s.trim().to_lowercase())
}

fn parse_day_rule(s: &str) -> anyhow::Result<()> {
    let rule = s.to_lowercase();
    if rule == "everyday" || rule == "daily" {
        return Ok(());
    }
    if let Some((from, to)) = rule.split_once('-') {
        if day_index(from).is_some() && day_index(to).is_some() {
            return Ok(());
        }
        anyhow::bail!("invalid day range: {s}");
    }
    for day in rule.split(',') {
        if day_index(day).is_none() {
            anyhow::bail!("invalid weekday: {day}");
        }
    }
    Ok(())
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| anyhow::anyhow!("invalid time format: {s}"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turf {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub amenities: Vec<String>,
    pub turf_type: Option<String>,
    pub price_per_hour: i64,
    pub max_players: i32,
    pub hours: OperatingHours,
    pub buffer_mins: i64,
    pub slot_duration_mins: i64,
    pub status: TurfStatus,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

pub const DEFAULT_SLOT_DURATION_MINS: i64 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TurfStatus {
    Active,
    Paused,
}

impl TurfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurfStatus::Active => "active",
            TurfStatus::Paused => "paused",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "paused" => TurfStatus::Paused,
            _ => TurfStatus::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(json: &str) -> OperatingHours {
        OperatingHours::from_json(json).unwrap()
    }

    #[test]
    fn test_everyday_rule_applies_to_all_days() {
        let h = hours(r#"{"windows":[{"day_rule":"everyday","start":"06:00","end":"22:00"}]}"#);
        for day in DAY_ORDER {
            assert_eq!(h.windows_for(day).len(), 1, "expected window on {day}");
        }
    }

    #[test]
    fn test_range_rule() {
        let h = hours(r#"{"windows":[{"day_rule":"mon-fri","start":"09:00","end":"17:00"}]}"#);
        assert_eq!(h.windows_for("wed").len(), 1);
        assert_eq!(h.windows_for("sat").len(), 0);
        assert_eq!(h.windows_for("sun").len(), 0);
    }

    #[test]
    fn test_wraparound_range_rule() {
        let h = hours(r#"{"windows":[{"day_rule":"fri-mon","start":"09:00","end":"17:00"}]}"#);
        assert_eq!(h.windows_for("fri").len(), 1);
        assert_eq!(h.windows_for("sun").len(), 1);
        assert_eq!(h.windows_for("mon").len(), 1);
        assert_eq!(h.windows_for("wed").len(), 0);
    }

    #[test]
    fn test_comma_list_rule() {
        let h = hours(r#"{"windows":[{"day_rule":"mon,wed,sat","start":"09:00","end":"17:00"}]}"#);
        assert_eq!(h.windows_for("mon").len(), 1);
        assert_eq!(h.windows_for("tue").len(), 0);
        assert_eq!(h.windows_for("sat").len(), 1);
    }

    #[test]
    fn test_invalid_day_rejected() {
        assert!(OperatingHours::from_json(
            r#"{"windows":[{"day_rule":"xyz","start":"09:00","end":"17:00"}]}"#
        )
        .is_err());
    }

    #[test]
    fn test_invalid_time_rejected() {
        assert!(OperatingHours::from_json(
            r#"{"windows":[{"day_rule":"mon","start":"25:00","end":"17:00"}]}"#
        )
        .is_err());
    }

    #[test]
    fn test_start_after_end_rejected() {
        assert!(OperatingHours::from_json(
            r#"{"windows":[{"day_rule":"mon","start":"18:00","end":"09:00"}]}"#
        )
        .is_err());
    }

    #[test]
    fn test_overlapping_windows_same_day_rejected() {
        assert!(OperatingHours::from_json(
            r#"{"windows":[
                {"day_rule":"mon","start":"09:00","end":"13:00"},
                {"day_rule":"everyday","start":"12:00","end":"17:00"}
            ]}"#
        )
        .is_err());
    }

    #[test]
    fn test_adjacent_windows_same_day_ok() {
        let h = hours(
            r#"{"windows":[
                {"day_rule":"mon","start":"09:00","end":"12:00"},
                {"day_rule":"mon","start":"12:00","end":"17:00"}
            ]}"#,
        );
        assert_eq!(h.windows_for("mon").len(), 2);
    }

    #[test]
    fn test_non_padded_hours_accepted() {
        let h = hours(r#"{"windows":[{"day_rule":"everyday","start":"6:00","end":"22:00"}]}"#);
        assert_eq!(h.windows_for("mon").len(), 1);
    }

    #[test]
    fn test_non_padded_hours_sort_numerically() {
        // Lexicographically "6:00" > "14:00"; the parsed times must win
        let h = hours(
            r#"{"windows":[
                {"day_rule":"mon","start":"14:00","end":"17:00"},
                {"day_rule":"mon","start":"6:00","end":"12:00"}
            ]}"#,
        );
        let windows = h.windows_for("mon");
        assert_eq!(windows[0].start, "6:00");
        assert_eq!(windows[1].start, "14:00");
    }

    #[test]
    fn test_windows_for_sorted_by_start() {
        let h = hours(
            r#"{"windows":[
                {"day_rule":"mon","start":"14:00","end":"17:00"},
                {"day_rule":"mon","start":"06:00","end":"12:00"}
            ]}"#,
        );
        let windows = h.windows_for("mon");
        assert_eq!(windows[0].start, "06:00");
        assert_eq!(windows[1].start, "14:00");
    }
}
