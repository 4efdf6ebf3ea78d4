use snafu::Snafu;

#[derive(Snafu, Debug, Clone, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum ValidationError {
    #[snafu(display("Missing required field: {}", field))]
    MissingField {
        field: &'static str,
    },

    #[snafu(display("Invalid value for '{}': {}", field, reason))]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[snafu(display("No updatable fields supplied"))]
    EmptyPatch,
}

pub(crate) fn required_text(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value.map(|s| s.trim().to_owned()) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => MissingFieldSnafu { field }.fail(),
    }
}

pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

pub(crate) fn positive_number(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return InvalidFieldSnafu { field, reason: format!("expected a number greater than 0, got {}", value) }.fail();
    }
    Ok(value)
}

pub(crate) fn non_negative_number(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return InvalidFieldSnafu { field, reason: format!("expected a number of at least 0, got {}", value) }.fail();
    }
    Ok(value)
}

/// Provider ids are lowercase slugs such as `bitcoin` or `avalanche-2`.
pub fn coin_id(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    let id = required_text(field, value)?.to_ascii_lowercase();
    let slug = id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !slug || id.chars().all(|c| c == '.') {
        return InvalidFieldSnafu { field, reason: format!("'{}' is not a valid coin id", id) }.fail();
    }
    Ok(id)
}
