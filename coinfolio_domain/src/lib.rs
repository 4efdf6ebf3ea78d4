pub mod models;
pub mod analytics;

/// `part / whole * 100`, or `0` when `whole` is not positive.
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
