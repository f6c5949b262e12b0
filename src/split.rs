//! Deterministic division of a purchase into dated installment slices.

use chrono::{Datelike, NaiveDate};

use crate::domain::Settlement;
use crate::errors::LedgerError;

/// One slice of a split purchase, ready to become a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentSlice {
    /// 1-based position within the plan.
    pub index: u32,
    pub amount_cents: i64,
    pub due_date: NaiveDate,
    pub settlement: Settlement,
}

/// Splits `total_cents` into `count` dated slices.
///
/// The floor division remainder is absorbed entirely by the first slice, so
/// the amounts always sum back to the total. The first slice keeps the exact
/// start date and the caller's settlement status; later slices land on
/// `min(target_day, last day)` of each following month and are always
/// pending, since a future installment cannot be already paid. `target_day`
/// defaults to the start date's day.
pub fn split_installments(
    total_cents: i64,
    count: u32,
    start: NaiveDate,
    target_day: Option<u32>,
    first_settlement: Settlement,
) -> Result<Vec<InstallmentSlice>, LedgerError> {
    if count == 0 {
        return Err(LedgerError::Validation(
            "installment count must be at least 1".into(),
        ));
    }
    if total_cents < 0 {
        return Err(LedgerError::Validation(
            "installment total must not be negative".into(),
        ));
    }
    let day = target_day.unwrap_or_else(|| start.day());
    if !(1..=31).contains(&day) {
        return Err(LedgerError::Validation(format!(
            "target day {day} outside 1..=31"
        )));
    }

    let base = total_cents / count as i64;
    let remainder = total_cents - base * count as i64;

    let mut slices = Vec::with_capacity(count as usize);
    slices.push(InstallmentSlice {
        index: 1,
        amount_cents: base + remainder,
        due_date: start,
        settlement: first_settlement,
    });
    for offset in 1..count {
        let (year, month) = month_after(start, offset);
        slices.push(InstallmentSlice {
            index: offset + 1,
            amount_cents: base,
            due_date: clamped_date(year, month, day),
            settlement: Settlement::Pending,
        });
    }
    Ok(slices)
}

fn month_after(start: NaiveDate, months: u32) -> (i32, u32) {
    let mut year = start.year();
    let mut month = start.month() as i32 + months as i32;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    (year, month as u32)
}

/// Builds a date from parts, pulling the day back to the month's last day
/// when it would not exist (e.g. Feb 31).
pub fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.min(last_day_of_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day.max(1)).unwrap_or_default()
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
