//! Packed FAT date/time decoding.
//!
//! date: bits 15-9 year since 1980, 8-5 month, 4-0 day.
//! time: bits 15-11 hours, 10-5 minutes, 4-0 seconds / 2.
//!
//! FAT stores local time without a zone; it is treated as UTC here.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTime {
    pub year:   u16,
    pub month:  u8,
    pub day:    u8,
    pub hour:   u8,
    pub minute: u8,
    pub second: u8,
    pub millis: u16,
}

impl DateTime {
    /// Decode a date/time pair. `tenths` is the creation-time field counting
    /// 10 ms units (0..=199); pass 0 for fields that have none.
    pub fn from_fat(date: u16, time: u16, tenths: u8) -> Self {
        let tenths = tenths.min(199);
        DateTime {
            year:   1980 + (date >> 9),
            month:  ((date >> 5) & 0x0F) as u8,
            day:    (date & 0x1F) as u8,
            hour:   (time >> 11) as u8,
            minute: ((time >> 5) & 0x3F) as u8,
            second: ((time & 0x1F) * 2) as u8 + tenths / 100,
            millis: u16::from(tenths % 100) * 10,
        }
    }

    /// Decode a date-only field (the last-access date).
    pub fn from_fat_date(date: u16) -> Self {
        Self::from_fat(date, 0, 0)
    }

    /// Seconds since 1970-01-01T00:00:00. An unset date (month or day 0)
    /// counts as the first of the month / January.
    pub fn unix_seconds(&self) -> i64 {
        let month = self.month.clamp(1, 12);
        let day = self.day.max(1);
        let days = days_from_civil(i64::from(self.year), u32::from(month), u32::from(day));
        days * 86_400
            + i64::from(self.hour) * 3_600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }
}

// Days since the Unix epoch for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = i64::from((month + 9) % 12);
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
