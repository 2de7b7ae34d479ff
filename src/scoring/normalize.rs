// Canonical form used when comparing extracted text with ground truth

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref SPACE_RUNS: Regex = Regex::new(" +").unwrap();
    // 12.07.2022
    static ref DOTTED_DATE: Regex = Regex::new(r"(\d{2})\.(\d{2})\.(\d{4})").unwrap();
    // 12Jul2022
    static ref MONTH_NAME_DATE: Regex =
        Regex::new(r"(\d{2})(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)(\d{4})").unwrap();
    static ref BRACKETS_AND_PUNCTUATION: Regex = Regex::new(r"[\[\]{},.]").unwrap();
}

fn month_number(abbreviation: &str) -> &'static str {
    match abbreviation {
        "Jan" => "01",
        "Feb" => "02",
        "Mar" => "03",
        "Apr" => "04",
        "May" => "05",
        "Jun" => "06",
        "Jul" => "07",
        "Aug" => "08",
        "Sep" => "09",
        "Oct" => "10",
        "Nov" => "11",
        "Dec" => "12",
        _ => "00",
    }
}

// Last two digits of a four digit year
fn short_year(year: &str) -> String {
    year.chars().skip(2).collect()
}

/// Normalizes text for comparison:
/// newlines become spaces, all spaces are dropped, `DD.MM.YYYY` and
/// `DDMonYYYY` dates are rewritten as `YYMMDD`, then brackets, braces,
/// commas and periods are removed.
///
/// Dates are rewritten before punctuation is stripped because the dotted
/// pattern depends on the periods. No calendar validation is done.
pub fn normalize(text: &str) -> String {
    let text = text.replace('\n', " ");
    let text = text.replace(' ', "");
    let text = text.trim();
    let text = SPACE_RUNS.replace_all(text, " ");

    let text = DOTTED_DATE.replace_all(&text, |caps: &Captures| {
        format!("{}{}{}", short_year(&caps[3]), &caps[2], &caps[1])
    });
    let text = MONTH_NAME_DATE.replace_all(&text, |caps: &Captures| {
        format!("{}{}{}", short_year(&caps[3]), month_number(&caps[2]), &caps[1])
    });

    BRACKETS_AND_PUNCTUATION.replace_all(&text, "").into_owned()
}
