//! `date`/`dateTime` arithmetic with durations (`spec.md` §4.D).

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::datatype::{DayTimeDuration, Value, XsDate, XsDateTime, YearMonthDuration};
use crate::decision::Status;
use crate::expr::EvalValue;

use super::{FunctionDef, FunctionKind};

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid calendar month");
    next_month_first.pred_opt().expect("day before a valid date is valid").day()
}

fn shift_year_month(year: i32, month: u32, day: u32, delta_months: i64) -> (i32, u32, u32) {
    let total = year as i64 * 12 + (month as i64 - 1) + delta_months;
    let new_year = total.div_euclid(12) as i32;
    let new_month = (total.rem_euclid(12) + 1) as u32;
    let clamped_day = day.min(last_day_of_month(new_year, new_month));
    (new_year, new_month, clamped_day)
}

fn add_day_time_to_date_time(dt: XsDateTime, duration: &DayTimeDuration) -> Result<XsDateTime, Status> {
    let millis = (duration.signed_seconds() * 1000.0).round() as i64;
    let naive = dt
        .naive
        .checked_add_signed(chrono::Duration::milliseconds(millis))
        .ok_or_else(|| Status::processing_error("dateTime arithmetic overflow"))?;
    Ok(XsDateTime { naive, offset_seconds: dt.offset_seconds })
}

fn add_year_month_to_date_time(dt: XsDateTime, duration: &YearMonthDuration) -> XsDateTime {
    let date = dt.naive.date();
    let (year, month, day) =
        shift_year_month(date.year(), date.month(), date.day(), duration.signed_months());
    let new_date = NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is valid");
    XsDateTime { naive: new_date.and_time(dt.naive.time()), offset_seconds: dt.offset_seconds }
}

fn add_year_month_to_date(d: XsDate, duration: &YearMonthDuration) -> XsDate {
    let (year, month, day) =
        shift_year_month(d.naive.year(), d.naive.month(), d.naive.day(), duration.signed_months());
    XsDate {
        naive: NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is valid"),
        offset_seconds: d.offset_seconds,
    }
}

fn date_time_add_day_time_duration(args: &[EvalValue]) -> Result<EvalValue, Status> {
    let (dt, dur) = date_time_and_day_time(args)?;
    Ok(EvalValue::Single(Value::DateTime(add_day_time_to_date_time(dt, &dur)?)))
}

fn date_time_subtract_day_time_duration(args: &[EvalValue]) -> Result<EvalValue, Status> {
    let (dt, mut dur) = date_time_and_day_time(args)?;
    dur.negative = !dur.negative;
    Ok(EvalValue::Single(Value::DateTime(add_day_time_to_date_time(dt, &dur)?)))
}

fn date_time_add_year_month_duration(args: &[EvalValue]) -> Result<EvalValue, Status> {
    let (dt, dur) = date_time_and_year_month(args)?;
    Ok(EvalValue::Single(Value::DateTime(add_year_month_to_date_time(dt, &dur))))
}

fn date_time_subtract_year_month_duration(args: &[EvalValue]) -> Result<EvalValue, Status> {
    let (dt, mut dur) = date_time_and_year_month(args)?;
    dur.negative = !dur.negative;
    Ok(EvalValue::Single(Value::DateTime(add_year_month_to_date_time(dt, &dur))))
}

fn date_add_year_month_duration(args: &[EvalValue]) -> Result<EvalValue, Status> {
    let (d, dur) = date_and_year_month(args)?;
    Ok(EvalValue::Single(Value::Date(add_year_month_to_date(d, &dur))))
}

fn date_subtract_year_month_duration(args: &[EvalValue]) -> Result<EvalValue, Status> {
    let (d, mut dur) = date_and_year_month(args)?;
    dur.negative = !dur.negative;
    Ok(EvalValue::Single(Value::Date(add_year_month_to_date(d, &dur))))
}

fn date_time_and_day_time(args: &[EvalValue]) -> Result<(XsDateTime, DayTimeDuration), Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("expected exactly two arguments"));
    }
    match (args[0].as_single()?, args[1].as_single()?) {
        (Value::DateTime(dt), Value::DayTimeDuration(dur)) => Ok((*dt, *dur)),
        _ => Err(Status::processing_error("expected (xs:dateTime, dayTimeDuration)")),
    }
}

fn date_time_and_year_month(args: &[EvalValue]) -> Result<(XsDateTime, YearMonthDuration), Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("expected exactly two arguments"));
    }
    match (args[0].as_single()?, args[1].as_single()?) {
        (Value::DateTime(dt), Value::YearMonthDuration(dur)) => Ok((*dt, *dur)),
        _ => Err(Status::processing_error("expected (xs:dateTime, yearMonthDuration)")),
    }
}

fn date_and_year_month(args: &[EvalValue]) -> Result<(XsDate, YearMonthDuration), Status> {
    if args.len() != 2 {
        return Err(Status::processing_error("expected exactly two arguments"));
    }
    match (args[0].as_single()?, args[1].as_single()?) {
        (Value::Date(d), Value::YearMonthDuration(dur)) => Ok((*d, *dur)),
        _ => Err(Status::processing_error("expected (xs:date, yearMonthDuration)")),
    }
}

/// `time-in-range`: whether the first time falls within `[start, end]`
/// inclusive, wrapping past midnight when `end < start` (a common
/// business-hours idiom supported by several XACML implementations'
/// extended function sets).
fn time_in_range(args: &[EvalValue]) -> Result<EvalValue, Status> {
    if args.len() != 3 {
        return Err(Status::processing_error("time-in-range takes exactly three arguments"));
    }
    let times: Result<Vec<NaiveTime>, Status> = args
        .iter()
        .map(|a| match a.as_single()? {
            Value::Time(t) => Ok(t.naive),
            other => {
                Err(Status::processing_error(format!("expected xs:time, found {}", other.datatype())))
            }
        })
        .collect();
    let times = times?;
    let (value, start, end) = (times[0], times[1], times[2]);
    let in_range = if start <= end { value >= start && value <= end } else { value >= start || value <= end };
    Ok(EvalValue::Single(Value::Boolean(in_range)))
}

pub fn functions() -> Vec<FunctionDef> {
    vec![
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:1.0:function:dateTime-add-dayTimeDuration",
            kind: FunctionKind::Standard(date_time_add_day_time_duration),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:1.0:function:dateTime-subtract-dayTimeDuration",
            kind: FunctionKind::Standard(date_time_subtract_day_time_duration),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:1.0:function:dateTime-add-yearMonthDuration",
            kind: FunctionKind::Standard(date_time_add_year_month_duration),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:1.0:function:dateTime-subtract-yearMonthDuration",
            kind: FunctionKind::Standard(date_time_subtract_year_month_duration),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:1.0:function:date-add-yearMonthDuration",
            kind: FunctionKind::Standard(date_add_year_month_duration),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:1.0:function:date-subtract-yearMonthDuration",
            kind: FunctionKind::Standard(date_subtract_year_month_duration),
        },
        FunctionDef {
            id: "urn:oasis:names:tc:xacml:3.0:function:time-in-range",
            kind: FunctionKind::Standard(time_in_range),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::Datatype;

    #[test]
    fn adding_a_month_clamps_to_the_shorter_months_last_day() {
        let d = XsDate::parse("2026-01-31").unwrap();
        let dur = YearMonthDuration::parse("P1M").unwrap();
        let result = add_year_month_to_date(d, &dur);
        assert_eq!(result.to_lexical(), "2026-02-28");
    }

    #[test]
    fn adding_day_time_duration_crosses_midnight() {
        let args = [
            EvalValue::Single(Value::parse(Datatype::DateTime, "2026-07-28T23:00:00Z").unwrap()),
            EvalValue::Single(Value::parse(Datatype::DayTimeDuration, "PT2H").unwrap()),
        ];
        let result = date_time_add_day_time_duration(&args).unwrap();
        assert_eq!(result.as_single().unwrap().to_lexical(), "2026-07-29T01:00:00Z");
    }

    #[test]
    fn time_in_range_wraps_past_midnight() {
        let args = [
            EvalValue::Single(Value::parse(Datatype::Time, "23:30:00").unwrap()),
            EvalValue::Single(Value::parse(Datatype::Time, "22:00:00").unwrap()),
            EvalValue::Single(Value::parse(Datatype::Time, "02:00:00").unwrap()),
        ];
        assert!(time_in_range(&args).unwrap().truthy().unwrap());
    }
}
