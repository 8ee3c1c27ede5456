//! Theme slugs for holidays and seasons around a given date.
//!
//! Used to surface seasonal recipe collections. The current season is always
//! the last slug returned.

use chrono::{Datelike, Duration, NaiveDate};

/// Easter Sunday of `year` (Gregorian calendar, Meeus/Jones/Butcher).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Fixed holidays announced a month ahead.
const MONTH_AHEAD: [(&str, u32, u32); 3] = [
    ("navidad", 12, 25),
    ("halloween", 10, 31),
    ("nochevieja", 12, 31),
];

/// Fixed holidays announced a week ahead.
const WEEK_AHEAD: [(&str, u32, u32); 3] = [
    ("san-valentin", 2, 14),
    ("dia-del-padre", 3, 19),
    ("dia-de-la-madre", 5, 5),
];

fn in_window(today: NaiveDate, event: NaiveDate, days_before: i64) -> bool {
    event - Duration::days(days_before) <= today && today <= event
}

/// Theme slugs active on `today`, in a stable order.
pub fn current_theme_slugs(today: NaiveDate) -> Vec<&'static str> {
    let year = today.year();
    let mut slugs = Vec::new();

    for (events, days_before) in [(&MONTH_AHEAD, 30), (&WEEK_AHEAD, 7)] {
        for &(slug, month, day) in events.iter() {
            let Some(event) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            if in_window(today, event, days_before) {
                slugs.push(slug);
            }
        }
    }

    if let Some(easter) = easter_sunday(year) {
        let carnival = easter - Duration::days(47);
        if in_window(today, carnival, 30) {
            slugs.push("carnaval");
        }

        let palm_sunday = easter - Duration::days(7);
        if palm_sunday - Duration::days(30) <= today && today <= easter {
            slugs.push("semana-santa");
        }
    }

    slugs.push(season(today));
    slugs
}

/// Meteorological season by fixed start dates; anything outside spring,
/// summer and autumn is winter.
fn season(today: NaiveDate) -> &'static str {
    let starts_on = |month, day| (today.month(), today.day()) >= (month, day);

    if starts_on(12, 21) || !starts_on(3, 21) {
        "invierno"
    } else if starts_on(9, 23) {
        "otono"
    } else if starts_on(6, 21) {
        "verano"
    } else {
        "primavera"
    }
}
