// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use proptest::prelude::*;
use yare::parameterized;

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

#[parameterized(
    compact_date = { "{yyyy}{mm}{dd}", utc(2025, 1, 24, 0, 0, 0), "20250124" },
    year_month_path = { "{yyyy}/{mm}", utc(2025, 12, 31, 0, 0, 0), "2025/12" },
    composite_block = { "data_{yyyymmdd}.csv", utc(2025, 1, 24, 2, 0, 0), "data_20250124.csv" },
    two_digit_year = { "{yy}{mm}{dd}", utc(2009, 3, 7, 0, 0, 0), "090307" },
    short_composite = { "{yymmdd}", utc(2030, 11, 2, 0, 0, 0), "301102" },
    month_block = { "{yyyymm}", utc(2025, 2, 28, 0, 0, 0), "202502" },
    month_day = { "{mmdd}", utc(2025, 7, 4, 0, 0, 0), "0704" },
    iso_date = { "{yyyy-mm-dd}", utc(2025, 1, 24, 0, 0, 0), "2025-01-24" },
    hour = { "run_{hh}", utc(2025, 1, 24, 7, 0, 0), "run_07" },
    leap_day = { "{yyyymmdd}", utc(2024, 2, 29, 12, 0, 0), "20240229" },
    no_tokens = { "/static/path.csv", utc(2025, 1, 24, 0, 0, 0), "/static/path.csv" },
)]
fn resolves_in_utc(template: &str, at: DateTime<Utc>, expected: &str) {
    assert_eq!(resolve(template, at, Tz::UTC), expected);
}

#[parameterized(
    unknown_token = { "{foo}/{yyyy}", "{foo}/2025" },
    uppercase_is_not_a_token = { "{YYYY}", "{YYYY}" },
    empty_braces = { "a{}b", "a{}b" },
    unbalanced_open = { "{yyyy", "{yyyy" },
    unbalanced_close = { "yyyy}", "yyyy}" },
    nested_braces = { "{{dd}}", "{24}" },
)]
fn unrecognized_braces_pass_through(template: &str, expected: &str) {
    assert_eq!(resolve(template, utc(2025, 1, 24, 0, 0, 0), Tz::UTC), expected);
}

#[test]
fn end_to_end_pattern_resolves() {
    let at = utc(2025, 1, 24, 2, 0, 0);
    assert_eq!(
        resolve("/files/{yyyy}/{mm}/{dd}/data_{yyyymmdd}.csv", at, Tz::UTC),
        "/files/2025/01/24/data_20250124.csv"
    );
}

#[test]
fn zone_moves_the_calendar_date_across_year_boundary() {
    // 23:30 UTC on new year's eve is already the next year in Tokyo
    let at = utc(2025, 12, 31, 23, 30, 0);
    assert_eq!(resolve("{yyyymmdd}", at, Tz::UTC), "20251231");
    assert_eq!(resolve("{yyyymmdd}", at, Tz::Asia__Tokyo), "20260101");
}

#[test]
fn zone_behind_utc_stays_on_previous_day() {
    let at = utc(2025, 3, 1, 3, 0, 0);
    assert_eq!(
        resolve("{yyyy}/{mm}/{dd}", at, Tz::America__New_York),
        "2025/02/28"
    );
}

#[test]
fn unrecognized_tokens_are_reported() {
    assert_eq!(
        unrecognized_tokens("/in/{yyyy}/{tenant}/{dd}{x}"),
        vec!["{tenant}".to_string(), "{x}".to_string()]
    );
    assert!(unrecognized_tokens("/in/{yyyy}/{mm}").is_empty());
}

proptest! {
    #[test]
    fn resolution_is_deterministic(
        secs in 0i64..4_102_444_800,
        template in proptest::sample::select(vec![
            "{yyyy}{mm}{dd}",
            "/a/{yyyy}/{mm}/{dd}/f_{yyyymmdd}.csv",
            "{yy}-{mmdd}-{hh}",
            "{yyyy-mm-dd}/{unknown}",
        ]),
    ) {
        let at = DateTime::from_timestamp(secs, 0).unwrap();
        let first = resolve(template, at, Tz::Europe__Berlin);
        let second = resolve(template, at, Tz::Europe__Berlin);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn compact_date_matches_calendar_fields(secs in 0i64..4_102_444_800) {
        let at = DateTime::from_timestamp(secs, 0).unwrap();
        let expected = format!(
            "{}{}{}",
            resolve("{yyyy}", at, Tz::UTC),
            resolve("{mm}", at, Tz::UTC),
            resolve("{dd}", at, Tz::UTC)
        );
        prop_assert_eq!(resolve("{yyyymmdd}", at, Tz::UTC), expected);
    }
}
