use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::models::Turf;

/// A bookable unit of time within one of the turf's operating windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Index of the source window in the day's grid. A booking must not
    /// span slots from different windows, even when they touch.
    #[serde(skip)]
    pub window: usize,
}

/// Generate the ordered slot grid for `turf` on `date`.
///
/// Each operating window matching the weekday is partitioned into
/// consecutive `slot_duration_mins` chunks. A trailing remainder shorter
/// than the duration is dropped, not clipped. A day with no matching
/// window yields an empty grid (turf closed).
pub fn generate_slots(turf: &Turf, date: NaiveDate, slot_duration_mins: i64) -> Vec<Slot> {
    if slot_duration_mins <= 0 {
        return vec![];
    }

    let weekday = date.format("%a").to_string().to_lowercase();
    let duration = Duration::minutes(slot_duration_mins);

    let mut slots = vec![];
    for (idx, window) in turf.hours.windows_for(&weekday).into_iter().enumerate() {
        let (Ok(start), Ok(end)) = (parse_time(&window.start), parse_time(&window.end)) else {
            continue;
        };
        let window_end = date.and_time(end);
        let mut cursor = date.and_time(start);
        while cursor + duration <= window_end {
            slots.push(Slot {
                start: cursor,
                end: cursor + duration,
                window: idx,
            });
            cursor += duration;
        }
    }
    slots
}

fn parse_time(s: &str) -> chrono::ParseResult<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{OperatingHours, Turf, TurfStatus};
    use chrono::NaiveDate;

    pub(crate) fn make_turf(hours_json: &str, buffer_mins: i64) -> Turf {
        let now = chrono::Utc::now().naive_utc();
        Turf {
            id: "turf-1".to_string(),
            owner_id: "owner-1".to_string(),
            name: "Green Field".to_string(),
            description: None,
            address: None,
            amenities: vec![],
            turf_type: None,
            price_per_hour: 800,
            max_players: 22,
            hours: OperatingHours::from_json(hours_json).unwrap(),
            buffer_mins,
            slot_duration_mins: 60,
            status: TurfStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_full_day_grid() {
        let turf = make_turf(
            r#"{"windows":[{"day_rule":"everyday","start":"06:00","end":"22:00"}]}"#,
            0,
        );
        let slots = generate_slots(&turf, date("2025-10-03"), 60);
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0].start.format("%H:%M").to_string(), "06:00");
        assert_eq!(slots[15].end.format("%H:%M").to_string(), "22:00");
    }

    #[test]
    fn test_strictly_ordered_and_non_overlapping() {
        let turf = make_turf(
            r#"{"windows":[
                {"day_rule":"everyday","start":"06:00","end":"12:00"},
                {"day_rule":"everyday","start":"14:00","end":"20:00"}
            ]}"#,
            0,
        );
        let slots = generate_slots(&turf, date("2025-10-03"), 60);
        for pair in slots.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_trailing_remainder_dropped() {
        // 06:00-07:30 with 60-minute slots: only 06:00-07:00 fits
        let turf = make_turf(
            r#"{"windows":[{"day_rule":"everyday","start":"06:00","end":"07:30"}]}"#,
            0,
        );
        let slots = generate_slots(&turf, date("2025-10-03"), 60);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].end.format("%H:%M").to_string(), "07:00");
    }

    #[test]
    fn test_closed_day_yields_empty_grid() {
        let turf = make_turf(
            r#"{"windows":[{"day_rule":"mon","start":"09:00","end":"17:00"}]}"#,
            0,
        );
        // 2025-10-03 is a Friday
        assert!(generate_slots(&turf, date("2025-10-03"), 60).is_empty());
    }

    #[test]
    fn test_slots_never_cross_window_boundary() {
        let turf = make_turf(
            r#"{"windows":[
                {"day_rule":"everyday","start":"06:00","end":"08:30"},
                {"day_rule":"everyday","start":"09:00","end":"11:00"}
            ]}"#,
            0,
        );
        let slots = generate_slots(&turf, date("2025-10-03"), 60);
        let starts: Vec<String> = slots
            .iter()
            .map(|s| s.start.format("%H:%M").to_string())
            .collect();
        // 08:00-09:00 would cross the first window's 08:30 boundary
        assert_eq!(starts, vec!["06:00", "07:00", "09:00", "10:00"]);
    }

    #[test]
    fn test_slots_carry_source_window() {
        let turf = make_turf(
            r#"{"windows":[
                {"day_rule":"everyday","start":"09:00","end":"12:00"},
                {"day_rule":"everyday","start":"12:00","end":"17:00"}
            ]}"#,
            0,
        );
        let slots = generate_slots(&turf, date("2025-10-03"), 60);
        let windows: Vec<usize> = slots.iter().map(|s| s.window).collect();
        assert_eq!(windows, vec![0, 0, 0, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_custom_slot_duration() {
        let turf = make_turf(
            r#"{"windows":[{"day_rule":"everyday","start":"06:00","end":"08:00"}]}"#,
            0,
        );
        let slots = generate_slots(&turf, date("2025-10-03"), 30);
        assert_eq!(slots.len(), 4);
    }

    #[test]
    fn test_zero_duration_yields_empty() {
        let turf = make_turf(
            r#"{"windows":[{"day_rule":"everyday","start":"06:00","end":"08:00"}]}"#,
            0,
        );
        assert!(generate_slots(&turf, date("2025-10-03"), 0).is_empty());
    }
}
