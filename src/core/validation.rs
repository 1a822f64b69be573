//! Input normalisation and the custom rules used by `#[derive(Validate)]`

use chrono::{NaiveDate, Utc};
use std::borrow::Cow;
use validator::ValidationError;

/// Trims surrounding whitespace, mapping blank strings to `None`.
pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Dates are compared against today in UTC.
pub fn not_in_past(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date < Utc::now().date_naive() {
        return Err(ValidationError::new("past_date")
            .with_message(Cow::Borrowed("must not be in the past")));
    }
    Ok(())
}

/// `preferred_time_slot` -> `preferredTimeSlot`, matching the JSON field names.
pub fn camel_case(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            name.extend(c.to_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    #[test]
    fn trimmed_drops_blank_values() {
        assert_eq!(trimmed(Some("  Acme  ".to_owned())).as_deref(), Some("Acme"));
        assert_eq!(trimmed(Some("   ".to_owned())), None);
        assert_eq!(trimmed(None), None);
    }

    #[test]
    fn today_is_not_in_the_past() {
        let today = Utc::now().date_naive();
        assert!(not_in_past(&today).is_ok());
        assert!(not_in_past(&(today - Days::new(1))).is_err());
    }

    #[test]
    fn camel_cases_field_names() {
        assert_eq!(camel_case("preferred_time_slot"), "preferredTimeSlot");
        assert_eq!(camel_case("topic"), "topic");
    }
}
