//! Decoding of label-encoded floats (`quantile` and `le` values)

use std::num::ParseFloatError;

const POSITIVE_INFINITY: &str = "+Inf";
const NEGATIVE_INFINITY: &str = "-Inf";
const NOT_A_NUMBER: &str = "NaN";

/// Decode a particle label value
///
/// The exposition tokens `+Inf`, `-Inf` and `NaN` map to the IEEE-754
/// specials; anything else goes through standard float parsing.
pub fn decode_label_float(value: &str) -> Result<f64, ParseFloatError> {
    match value {
        POSITIVE_INFINITY => Ok(f64::INFINITY),
        NEGATIVE_INFINITY => Ok(f64::NEG_INFINITY),
        NOT_A_NUMBER => Ok(f64::NAN),
        other => other.parse(),
    }
}
