use crate::utils::error::{EtlError, Result};
use chrono::{Duration, Local, NaiveDate};

const INPUT_FORMAT: &str = "%d-%m-%Y";
const OUTPUT_FORMAT: &str = "%Y-%m-%d";

/// Resolves the `--dates` argument into a canonical (start, end) pair.
///
/// Two arguments are parsed strictly as DD-MM-YYYY and reformatted to
/// YYYY-MM-DD. A single `today`/`yesterday` keyword (case-insensitive) pins
/// both ends of the range to that calendar day; the clock is sampled once so
/// a run crossing midnight cannot produce a skewed pair. With `precise`,
/// the bounds carry second-level time of day.
pub fn resolve(date_args: &[String], precise: bool) -> Result<(String, String)> {
    let (start, end) = match date_args {
        [start, end] => (reformat(start)?, reformat(end)?),
        [keyword] => {
            let today = Local::now().date_naive();
            let day = match keyword.to_lowercase().as_str() {
                "today" => today,
                "yesterday" => today - Duration::days(1),
                _ => {
                    return Err(EtlError::UnrecognizedDateKeyword {
                        keyword: keyword.clone(),
                    })
                }
            };
            let formatted = day.format(OUTPUT_FORMAT).to_string();
            (formatted.clone(), formatted)
        }
        args => {
            return Err(EtlError::InvalidArgumentCount { count: args.len() });
        }
    };

    if precise {
        Ok((format!("{}T00:00:00", start), format!("{}T23:59:59", end)))
    } else {
        Ok((start, end))
    }
}

fn reformat(value: &str) -> Result<String> {
    NaiveDate::parse_from_str(value, INPUT_FORMAT)
        .map(|date| date.format(OUTPUT_FORMAT).to_string())
        .map_err(|_| EtlError::InvalidDateFormat {
            value: value.to_string(),
        })
}
