use chrono::{DateTime, NaiveDate, NaiveTime};

use super::CoerceState;
use crate::data::Data;
use crate::types::Primitive;

const DATE_FORMAT: &str = "%Y-%m-%d";

impl Primitive {
    /// Scalar conversion. Lossless representation changes (an int where a
    /// float is declared) count as `yes`; conversions that read meaning into
    /// the value count as `maybe`. A mismatch leaves the value untouched.
    pub fn coerce(self, value: Data, state: &mut CoerceState) -> Data {
        match (self, value) {
            (Primitive::Mixed, v) => {
                state.yes += 1;
                v
            }
            (Primitive::Null, Data::Null) => {
                state.yes += 1;
                Data::Null
            }
            (Primitive::Bool, v @ Data::Bool(_)) => {
                state.yes += 1;
                v
            }

            (Primitive::Int, v @ (Data::Int(_) | Data::UInt(_))) => {
                state.yes += 1;
                v
            }
            (Primitive::Int, Data::Float(f))
                if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 =>
            {
                state.maybe += 1;
                Data::Int(f as i64)
            }
            (Primitive::Int, Data::String(s)) => match (s.trim().parse::<i64>(), s.trim().parse::<u64>()) {
                (Ok(i), _) => {
                    state.maybe += 1;
                    Data::Int(i)
                }
                (Err(_), Ok(u)) => {
                    state.maybe += 1;
                    Data::UInt(u)
                }
                _ => {
                    state.no += 1;
                    Data::String(s)
                }
            },

            (Primitive::Float, v @ Data::Float(_)) => {
                state.yes += 1;
                v
            }
            (Primitive::Float, Data::Int(i)) => {
                state.yes += 1;
                Data::Float(i as f64)
            }
            // may round
            (Primitive::Float, Data::UInt(u)) => {
                state.maybe += 1;
                Data::Float(u as f64)
            }
            (Primitive::Float, Data::String(s)) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => {
                    state.maybe += 1;
                    Data::Float(f)
                }
                _ => {
                    state.no += 1;
                    Data::String(s)
                }
            },

            (Primitive::String, v @ Data::String(_)) => {
                state.yes += 1;
                v
            }
            (Primitive::String, Data::Int(i)) => {
                state.maybe += 1;
                Data::String(i.to_string())
            }
            (Primitive::String, Data::UInt(u)) => {
                state.maybe += 1;
                Data::String(u.to_string())
            }
            (Primitive::String, Data::Float(f)) => {
                state.maybe += 1;
                Data::String(f.to_string())
            }
            (Primitive::String, Data::Bool(b)) => {
                state.maybe += 1;
                Data::String(b.to_string())
            }
            (Primitive::String, Data::DateTime(dt)) => {
                state.maybe += 1;
                Data::String(dt.to_rfc3339())
            }
            (Primitive::String, Data::Date(d)) => {
                state.maybe += 1;
                Data::String(d.format(DATE_FORMAT).to_string())
            }

            (Primitive::Array, v @ (Data::List(_) | Data::Map(_))) => {
                state.yes += 1;
                v
            }

            (Primitive::DateTime, v @ Data::DateTime(_)) => {
                state.yes += 1;
                v
            }
            (Primitive::DateTime, Data::Date(d)) => {
                state.maybe += 1;
                Data::DateTime(d.and_time(NaiveTime::default()).and_utc().fixed_offset())
            }
            (Primitive::DateTime, Data::String(s)) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    state.yes += 1;
                    Data::DateTime(dt)
                } else if let Ok(d) = NaiveDate::parse_from_str(&s, DATE_FORMAT) {
                    state.maybe += 1;
                    Data::DateTime(d.and_time(NaiveTime::default()).and_utc().fixed_offset())
                } else {
                    state.no += 1;
                    Data::String(s)
                }
            }

            (Primitive::Date, v @ Data::Date(_)) => {
                state.yes += 1;
                v
            }
            (Primitive::Date, Data::DateTime(dt)) => {
                state.maybe += 1;
                Data::Date(dt.date_naive())
            }
            (Primitive::Date, Data::String(s)) => {
                if let Ok(d) = NaiveDate::parse_from_str(&s, DATE_FORMAT) {
                    state.yes += 1;
                    Data::Date(d)
                } else if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    state.maybe += 1;
                    Data::Date(dt.date_naive())
                } else {
                    state.no += 1;
                    Data::String(s)
                }
            }

            (_, v) => {
                state.no += 1;
                v
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(p: Primitive, v: impl Into<Data>) -> (Data, (u64, u64, u64)) {
        let mut state = CoerceState::new();
        let out = p.coerce(v.into(), &mut state);
        (out, (state.yes, state.maybe, state.no))
    }

    #[test]
    fn exact_kinds_are_yes() {
        assert_eq!(run(Primitive::String, "a"), (Data::from("a"), (1, 0, 0)));
        assert_eq!(run(Primitive::Int, 3i64), (Data::Int(3), (1, 0, 0)));
        assert_eq!(run(Primitive::Bool, true), (Data::Bool(true), (1, 0, 0)));
        assert_eq!(run(Primitive::Null, Data::Null), (Data::Null, (1, 0, 0)));
        assert_eq!(run(Primitive::Mixed, Data::List(vec![])), (Data::List(vec![]), (1, 0, 0)));
    }

    #[test]
    fn ints_widen_to_floats_without_penalty() {
        assert_eq!(run(Primitive::Float, 2i64), (Data::Float(2.0), (1, 0, 0)));
    }

    #[test]
    fn guessed_conversions_are_maybe() {
        assert_eq!(run(Primitive::Int, 4.0f64), (Data::Int(4), (0, 1, 0)));
        assert_eq!(run(Primitive::Int, "42"), (Data::Int(42), (0, 1, 0)));
        assert_eq!(run(Primitive::Float, "1.5"), (Data::Float(1.5), (0, 1, 0)));
        assert_eq!(run(Primitive::String, 7i64), (Data::from("7"), (0, 1, 0)));
        assert_eq!(run(Primitive::String, false), (Data::from("false"), (0, 1, 0)));
    }

    #[test]
    fn mismatches_leave_the_value_alone() {
        assert_eq!(run(Primitive::Int, 4.5f64), (Data::Float(4.5), (0, 0, 1)));
        assert_eq!(run(Primitive::Int, "4x"), (Data::from("4x"), (0, 0, 1)));
        assert_eq!(run(Primitive::Bool, "true"), (Data::from("true"), (0, 0, 1)));
        assert_eq!(run(Primitive::Null, 0i64), (Data::Int(0), (0, 0, 1)));
        assert_eq!(run(Primitive::Array, "x"), (Data::from("x"), (0, 0, 1)));
    }

    #[test]
    fn integers_beyond_i64_stay_exact() {
        assert_eq!(run(Primitive::Int, Data::UInt(u64::MAX)), (Data::UInt(u64::MAX), (1, 0, 0)));
        assert_eq!(run(Primitive::Int, "18446744073709551615"), (Data::UInt(u64::MAX), (0, 1, 0)));
        assert_eq!(run(Primitive::Float, Data::UInt(u64::MAX)), (Data::Float(u64::MAX as f64), (0, 1, 0)));
    }

    #[test]
    fn floats_at_two_to_the_63_do_not_saturate() {
        let two_63 = 9_223_372_036_854_775_808.0f64;
        assert_eq!(run(Primitive::Int, two_63), (Data::Float(two_63), (0, 0, 1)));
        assert_eq!(run(Primitive::Int, -two_63), (Data::Int(i64::MIN), (0, 1, 0)));
    }

    #[test]
    fn date_times_parse_from_rfc3339() {
        let (out, score) = run(Primitive::DateTime, "2024-05-01T12:30:00+02:00");
        let Data::DateTime(dt) = out else { panic!("expected date-time") };
        assert_eq!(dt.to_rfc3339(), "2024-05-01T12:30:00+02:00");
        assert_eq!(score, (1, 0, 0));
    }

    #[test]
    fn date_only_strings_are_a_guess_for_date_times() {
        let (out, score) = run(Primitive::DateTime, "2024-05-01");
        let Data::DateTime(dt) = out else { panic!("expected date-time") };
        assert_eq!(dt.to_rfc3339(), "2024-05-01T00:00:00+00:00");
        assert_eq!(score, (0, 1, 0));
    }

    #[test]
    fn dates_parse_from_calendar_strings() {
        let (out, score) = run(Primitive::Date, "2024-02-29");
        assert_eq!(out, Data::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert_eq!(score, (1, 0, 0));
        assert_eq!(run(Primitive::Date, "yesterday").1, (0, 0, 1));
    }
}
