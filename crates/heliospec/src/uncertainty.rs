//! Noise budget for calibrated level-2 data.

use ndarray::ArrayD;

use crate::header::Header;
use crate::observation::{NoiseEstimate, Observation};
use crate::types::{HelioError, HelioResult};

/// Total (measured) signal increase and standard deviation due to noise,
/// for level-2 data in W m⁻² sr⁻¹ nm⁻¹ with its file header.
///
/// Builds the study from the header, the instrument model with the current
/// calibration, and evaluates the noise budget at the study's average
/// wavelength. See [`Observation::noise_effects`] for the methods and
/// assumptions behind the per-component widths.
pub fn noise_budget(data: &ArrayD<f64>, header: &Header) -> HelioResult<NoiseEstimate> {
    let level = header.str("LEVEL")?;
    if level != "L2" {
        return Err(HelioError::UnsupportedLevel {
            expected: "L2".to_string(),
            got: level.to_string(),
        });
    }
    let observation = Observation::from_header(header)?;
    let wvl_nm = observation.study.av_wavelength;
    observation.noise_effects_from_l2(data, wvl_nm)
}
