//! ISO-8601 week computation and bin path derivation (spec.md §4.5, §3
//! `WeeklyBin`).

use std::path::PathBuf;

use chrono::{DateTime, Datelike, Utc};
use weeklybin_model::MediaType;

/// `{year, week}` per ISO-8601 (Monday-first weeks; week 1 contains Jan 4).
/// Equivalently: the week containing the Thursday of the same Mon-Sun span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoWeek {
    pub year: i32,
    pub week: u32,
}

#[must_use]
pub fn week_of(date: DateTime<Utc>) -> IsoWeek {
    let iso = date.iso_week();
    IsoWeek {
        year: iso.year(),
        week: iso.week(),
    }
}

/// `DATA_DIR/media/{year}-W{ww}/{mediaTypePlural}/` — a pure function of
/// `(weekOf(date), mediaType)`.
#[must_use]
pub fn bin_path(data_dir: &std::path::Path, date: DateTime<Utc>, media_type: MediaType) -> PathBuf {
    let week = week_of(date);
    data_dir
        .join("media")
        .join(format!("{}-W{:02}", week.year, week.week))
        .join(media_type.plural())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn wednesday_jan_1_2020_is_week_1() {
        let w = week_of(at(2020, 1, 1));
        assert_eq!(w, IsoWeek { year: 2020, week: 1 });
    }

    #[test]
    fn jan_1_2021_belongs_to_2020_week_53() {
        let w = week_of(at(2021, 1, 1));
        assert_eq!(w, IsoWeek { year: 2020, week: 53 });
    }

    #[test]
    fn dec_30_2024_belongs_to_2025_week_1() {
        let w = week_of(at(2024, 12, 30));
        assert_eq!(w, IsoWeek { year: 2025, week: 1 });
    }

    #[test]
    fn bin_path_is_pure_function_of_week_and_media_type() {
        let data_dir = std::path::Path::new("/data");
        let p1 = bin_path(data_dir, at(2024, 3, 4), MediaType::Pdf);
        let p2 = bin_path(data_dir, at(2024, 3, 8), MediaType::Pdf); // same ISO week
        assert_eq!(p1, p2);
        assert_eq!(p1, std::path::PathBuf::from("/data/media/2024-W10/pdfs"));
    }
}
