use chrono::{NaiveDate, NaiveTime};
use winnow::ascii::{digit0, digit1, multispace0, space0};
use winnow::combinator::{alt, delimited, opt, preceded};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::Temporal;

// -- Numbers ----------------------------------------------------------------

/// Leading numeric prefix of a text field, e.g. `"12.5kg"` -> `"12.5"`.
pub fn numeric_prefix<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    preceded(
        multispace0,
        (
            opt(one_of(['+', '-'])),
            alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void())),
            opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
        )
            .take(),
    )
    .parse_next(input)
}

// -- Dates and times --------------------------------------------------------

fn two_digits(input: &mut &str) -> ModalResult<u32> {
    take_while(2, |c: char| c.is_ascii_digit())
        .try_map(str::parse::<u32>)
        .parse_next(input)
}

fn hour(input: &mut &str) -> ModalResult<u32> {
    take_while(1..=2, |c: char| c.is_ascii_digit())
        .try_map(str::parse::<u32>)
        .parse_next(input)
}

fn time_of_day(input: &mut &str) -> ModalResult<NaiveTime> {
    (hour, preceded(':', two_digits), opt(preceded(':', two_digits)))
        .verify_map(|(h, m, s)| NaiveTime::from_hms_opt(h, m, s.unwrap_or(0)))
        .context(StrContext::Expected(StrContextValue::Description(
            "time of day",
        )))
        .parse_next(input)
}

fn calendar_date(input: &mut &str) -> ModalResult<NaiveDate> {
    (
        take_while(4, |c: char| c.is_ascii_digit()).try_map(str::parse::<i32>),
        preceded('-', two_digits),
        preceded('-', two_digits),
    )
        .verify_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .context(StrContext::Expected(StrContextValue::Description("date")))
        .parse_next(input)
}

fn date_or_date_time(input: &mut &str) -> ModalResult<Temporal> {
    let date = calendar_date.parse_next(input)?;
    let time = opt(preceded(one_of(['T', ' ']), time_of_day)).parse_next(input)?;
    Ok(match time {
        Some(time) => Temporal::DateTime(date.and_time(time)),
        None => Temporal::Date(date),
    })
}

pub fn temporal(input: &mut &str) -> ModalResult<Temporal> {
    delimited(
        space0,
        alt((date_or_date_time, time_of_day.map(Temporal::TimeOfDay))),
        space0,
    )
    .context(StrContext::Expected(StrContextValue::Description(
        "date, time or date-time",
    )))
    .parse_next(input)
}
