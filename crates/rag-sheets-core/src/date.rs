//! Excel serial date conversion
//!
//! Worksheets store dates as day counts from an epoch, with the time of day
//! as the fractional part. The 1900 system inherits Lotus 1-2-3's phantom
//! 1900-02-29 (serial 60); serials before it are shifted by one day.

use chrono::{Duration, NaiveDate, NaiveDateTime};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Which epoch a workbook's serial numbers count from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DateSystem {
    /// Day 1 = 1900-01-01 (Windows default)
    #[default]
    Excel1900,
    /// Day 0 = 1904-01-01 (legacy Mac workbooks)
    Excel1904,
}

/// Convert a serial number to a date/time
///
/// Returns `None` for negative, non-finite or out-of-range serials. The time
/// of day is rounded to the nearest second.
pub fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }

    let days = serial.trunc();
    let seconds = ((serial - days) * SECONDS_PER_DAY).round() as i64;

    let epoch = match system {
        DateSystem::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
        DateSystem::Excel1900 if days < 60.0 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        DateSystem::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
    };

    let date = epoch.checked_add_signed(Duration::days(days as i64))?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_1900_system() {
        assert_eq!(
            serial_to_datetime(1.0, DateSystem::Excel1900),
            Some(ymd_hms(1900, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            serial_to_datetime(59.0, DateSystem::Excel1900),
            Some(ymd_hms(1900, 2, 28, 0, 0, 0))
        );
        assert_eq!(
            serial_to_datetime(61.0, DateSystem::Excel1900),
            Some(ymd_hms(1900, 3, 1, 0, 0, 0))
        );
        assert_eq!(
            serial_to_datetime(45292.5, DateSystem::Excel1900),
            Some(ymd_hms(2024, 1, 1, 12, 0, 0))
        );
    }

    #[test]
    fn test_1904_system() {
        assert_eq!(
            serial_to_datetime(0.0, DateSystem::Excel1904),
            Some(ymd_hms(1904, 1, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_rejects_invalid_serials() {
        assert_eq!(serial_to_datetime(-1.0, DateSystem::Excel1900), None);
        assert_eq!(serial_to_datetime(f64::NAN, DateSystem::Excel1900), None);
    }
}
