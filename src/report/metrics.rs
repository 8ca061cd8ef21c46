use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use tracing::debug;

use crate::gitlab::merge_request::{MergeRequest, State};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Whole days between `created_at` and `end`, rounded to the nearest day.
/// Never negative.
pub fn days_open(created_at: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - created_at).num_seconds().max(0);

    (seconds as f64 / SECONDS_PER_DAY).round() as i64
}

/// The merge time for merged requests, `now` for anything still open.
pub fn end_time(mr: &MergeRequest, now: DateTime<Utc>) -> DateTime<Utc> {
    match (mr.state, mr.merged_at) {
        (State::Merged, Some(merged_at)) => merged_at,
        _ => now,
    }
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// A request without a merge timestamp cannot be placed after the cutoff, so
/// it fails the check.
pub fn merged_since(mr: &MergeRequest, cutoff: NaiveDate) -> bool {
    let cutoff = start_of_day(cutoff);

    mr.merged_at.map_or(false, |merged_at| merged_at >= cutoff)
}

pub fn retain_merged_since(merge_requests: &mut Vec<MergeRequest>, cutoff: NaiveDate) {
    merge_requests.retain(|mr| {
        let keep = merged_since(mr, cutoff);
        if !keep {
            debug!("Skipping merge request {} merged before {cutoff}", mr.id);
        }
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn merged(iid: u64, created: &str, merged: Option<&str>) -> MergeRequest {
        MergeRequest {
            id: 1000 + iid,
            iid,
            title: format!("MR {iid}"),
            web_url: format!("https://gitlab.example.com/g/p/-/merge_requests/{iid}").parse().unwrap(),
            project_id: 10,
            created_at: at(created),
            merged_at: merged.map(at),
            state: State::Merged,
        }
    }

    #[test]
    fn days_open_rounds_to_nearest_day() {
        let created = at("2024-01-01T00:00:00Z");

        assert_eq!(days_open(created, at("2024-01-01T00:00:00Z")), 0);
        assert_eq!(days_open(created, at("2024-01-01T11:59:59Z")), 0);
        assert_eq!(days_open(created, at("2024-01-01T12:00:00Z")), 1);
        assert_eq!(days_open(created, at("2024-01-03T13:00:00Z")), 3);
        assert_eq!(days_open(created, at("2024-03-01T00:00:00Z")), 60);
    }

    #[test]
    fn days_open_is_never_negative() {
        assert_eq!(days_open(at("2024-01-05T00:00:00Z"), at("2024-01-01T00:00:00Z")), 0);
    }

    #[test]
    fn end_time_falls_back_to_now() {
        let now = at("2024-02-01T00:00:00Z");

        let open = merged(1, "2024-01-01T00:00:00Z", None);
        let done = merged(2, "2024-01-01T00:00:00Z", Some("2024-01-10T00:00:00Z"));

        assert_eq!(end_time(&open, now), now);
        assert_eq!(end_time(&done, now), at("2024-01-10T00:00:00Z"));
    }

    #[test]
    fn cutoff_drops_requests_merged_before_it() {
        let cutoff = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut mrs = vec![
            merged(1, "2023-12-01T00:00:00Z", Some("2023-12-31T23:59:59Z")),
            merged(2, "2023-12-01T00:00:00Z", Some("2024-01-01T00:00:00Z")),
            merged(3, "2023-12-20T00:00:00Z", Some("2024-01-15T08:30:00Z")),
            merged(4, "2023-12-20T00:00:00Z", None),
        ];

        retain_merged_since(&mut mrs, cutoff);

        let iids: Vec<_> = mrs.iter().map(|mr| mr.iid).collect();
        assert_eq!(iids, [2, 3]);
        assert!(mrs.iter().all(|mr| mr.merged_at.unwrap() >= start_of_day(cutoff)));
    }
}
