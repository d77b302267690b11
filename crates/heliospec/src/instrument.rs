//! SPICE instrument response model.
//!
//! Detector constants and wavelength-dependent response curves. Values are
//! from Huang et al. 2023 (doi:10.1051/0004-6361/202345988) and table 8.25
//! of SPICE-RAL-RP-0002 v10.0. All wavelengths are in nm; digital numbers
//! (DN) are used for detector counts.

/// Read noise distribution width, DN per pixel.
pub const READ_NOISE: f64 = 6.9;

/// Stray-light background, photon/s/pixel (1.0 in SPICE-RAL-RP-0002,
/// compatible with 0 in flight data).
pub const BACKGROUND: f64 = 0.0;

/// SW detector wavelength range, nm.
const SW_RANGE: (f64, f64) = (70.3, 79.1);

/// LW detector wavelength range, nm.
const LW_RANGE: (f64, f64) = (97.0, 105.3);

/// SW quantum efficiency table, electron/photon.
const QE_SW_NM: [f64; 4] = [70.3, 70.6, 77.0, 79.0];
const QE_SW: [f64; 4] = [0.12, 0.12, 0.10, 0.10];

/// LW quantum efficiency, electron/photon (uncertain for 2nd order).
const QE_LW: f64 = 0.25;

/// First-order effective area: wavelength (nm) vs. net response (mm²).
const AEFF_FIRST_ORDER_NM: [f64; 17] = [
    70.35, 72.0, 74.0, 76.0, 77.0, 78.0, 79.1, 80.0, 82.0, 85.0, 90.0, 95.0, 97.0, 100.0, 102.6,
    104.0, 105.25,
];
const AEFF_FIRST_ORDER_MM2: [f64; 17] = [
    1.20, 2.10, 3.10, 3.95, 4.33579493, 4.72, 5.15, 5.50425673, 6.20, 7.10, 8.20, 8.85, 9.05,
    9.21953583, 9.57706423, 9.40, 9.10,
];

/// Second-order effective area (LW detector, half wavelength).
const AEFF_SECOND_ORDER_NM: [f64; 5] = [48.55, 50.0, 51.0, 52.1, 52.6];
const AEFF_SECOND_ORDER_MM2: [f64; 5] = [0.05, 0.28686351, 0.36, 0.43514445, 0.46];

/// The two SPICE detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detector {
    ShortWave,
    LongWave,
}

impl Detector {
    /// Conventional detector label.
    pub fn label(&self) -> &'static str {
        match self {
            Detector::ShortWave => "SW",
            Detector::LongWave => "LW",
        }
    }
}

/// The SPICE instrument response model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spice;

impl Spice {
    /// Create the instrument model with the current calibration values.
    pub fn new() -> Self {
        Spice
    }

    /// Read noise distribution width, DN per pixel.
    pub fn read_noise(&self) -> f64 {
        READ_NOISE
    }

    /// Stray-light background, photon/s/pixel.
    pub fn background(&self) -> f64 {
        BACKGROUND
    }

    /// Determine which detector sees a given wavelength (nm).
    pub fn which_detector(&self, wvl_nm: f64) -> Option<Detector> {
        if wvl_nm > SW_RANGE.0 && wvl_nm < SW_RANGE.1 {
            Some(Detector::ShortWave)
        } else if wvl_nm > LW_RANGE.0 && wvl_nm < LW_RANGE.1 {
            Some(Detector::LongWave)
        } else {
            None
        }
    }

    /// Detector gain at a given wavelength, DN/photon (NaN off-detector).
    pub fn gain(&self, wvl_nm: f64) -> f64 {
        match self.which_detector(wvl_nm) {
            Some(Detector::ShortWave) => 3.58,
            Some(Detector::LongWave) => 0.57,
            None => f64::NAN,
        }
    }

    /// Detector dark current at a given wavelength, DN/s/pixel
    /// (NaN off-detector).
    pub fn dark_current(&self, wvl_nm: f64) -> f64 {
        match self.which_detector(wvl_nm) {
            Some(Detector::ShortWave) => 0.89,
            Some(Detector::LongWave) => 0.54,
            None => f64::NAN,
        }
    }

    /// Detector noise multiplication factor (NaN off-detector).
    pub fn noise_factor(&self, wvl_nm: f64) -> f64 {
        match self.which_detector(wvl_nm) {
            Some(Detector::ShortWave) => 1.0,
            Some(Detector::LongWave) => 1.6,
            None => f64::NAN,
        }
    }

    /// Detector quantum efficiency at a given wavelength, detected photons
    /// per incident photon.
    ///
    /// Interpolated on the SW table inside the SW band, 0.25 elsewhere
    /// (the LW value, also applied off-band as in the reference tables).
    pub fn quantum_efficiency(&self, wvl_nm: f64) -> f64 {
        if wvl_nm > SW_RANGE.0 && wvl_nm < SW_RANGE.1 {
            interp(wvl_nm, &QE_SW_NM, &QE_SW)
        } else {
            QE_LW
        }
    }

    /// Effective area at a given wavelength, mm² (NaN outside the
    /// calibrated ranges).
    ///
    /// Both the first-order and the second-order response tables are
    /// tried; where the second-order interpolation is defined it wins.
    pub fn effective_area(&self, wvl_nm: f64) -> f64 {
        let second = interp(wvl_nm, &AEFF_SECOND_ORDER_NM, &AEFF_SECOND_ORDER_MM2);
        if second.is_finite() {
            second
        } else {
            interp(wvl_nm, &AEFF_FIRST_ORDER_NM, &AEFF_FIRST_ORDER_MM2)
        }
    }
}

/// Piecewise-linear interpolation, NaN outside the table span.
/// `xs` must be sorted ascending.
fn interp(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    if x.is_nan() || xs.is_empty() || x < xs[0] || x > xs[xs.len() - 1] {
        return f64::NAN;
    }
    match xs.binary_search_by(|probe| probe.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Less)) {
        Ok(i) => ys[i],
        Err(i) => {
            let (x0, x1) = (xs[i - 1], xs[i]);
            let (y0, y1) = (ys[i - 1], ys[i]);
            y0 + (y1 - y0) * (x - x0) / (x1 - x0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    #[test]
    fn test_constants() {
        let spice = Spice::new();
        assert_eq!(spice.read_noise(), 6.9);
        assert_eq!(spice.background(), 0.0);
    }

    #[test]
    fn test_which_detector() {
        let spice = Spice::new();
        assert_eq!(spice.which_detector(77.0), Some(Detector::ShortWave));
        assert_eq!(spice.which_detector(102.6), Some(Detector::LongWave));
        for wvl in [70.0, 85.0, 106.0] {
            assert_eq!(spice.which_detector(wvl), None);
        }
        assert_eq!(Detector::ShortWave.label(), "SW");
        assert_eq!(Detector::LongWave.label(), "LW");
    }

    #[test]
    fn test_gain() {
        let spice = Spice::new();
        assert!(close(spice.gain(77.0), 3.58));
        assert!(close(spice.gain(102.6), 0.57));
        assert!(spice.gain(20.0).is_nan());
        assert!(spice.gain(200.0).is_nan());
    }

    #[test]
    fn test_dark_current() {
        let spice = Spice::new();
        assert!(close(spice.dark_current(77.0), 0.89));
        assert!(close(spice.dark_current(102.6), 0.54));
        assert!(spice.dark_current(20.0).is_nan());
    }

    #[test]
    fn test_noise_factor() {
        let spice = Spice::new();
        assert!(close(spice.noise_factor(77.0), 1.0));
        assert!(close(spice.noise_factor(102.6), 1.6));
        assert!(spice.noise_factor(200.0).is_nan());
    }

    #[test]
    fn test_quantum_efficiency() {
        let spice = Spice::new();
        assert!(close(spice.quantum_efficiency(77.0), 0.10));
        assert!(close(spice.quantum_efficiency(102.6), 0.25));
        assert!(close(spice.quantum_efficiency(70.45), 0.12));
        // outside both bands the LW value applies, as in the reference table
        assert!(close(spice.quantum_efficiency(20.0), 0.25));
        // inside the SW band but past the table edge
        assert!(spice.quantum_efficiency(79.05).is_nan());
    }

    #[test]
    fn test_effective_area() {
        let spice = Spice::new();
        // first order
        assert!(close(spice.effective_area(77.0), 4.33579493));
        assert!(close(spice.effective_area(102.6), 9.57706423));
        assert!(close(spice.effective_area(80.0), 5.50425673));
        assert!(close(spice.effective_area(100.0), 9.21953583));
        // second order wins where defined
        assert!(close(spice.effective_area(50.0), 0.28686351));
        assert!(close(spice.effective_area(52.1), 0.43514445));
        // outside the calibrated ranges
        assert!(spice.effective_area(20.0).is_nan());
        assert!(spice.effective_area(200.0).is_nan());
    }

    #[test]
    fn test_interp_between_knots() {
        // halfway between two table points
        let y = interp(1.5, &[1.0, 2.0], &[10.0, 20.0]);
        assert!(close(y, 15.0));
        assert!(interp(0.5, &[1.0, 2.0], &[10.0, 20.0]).is_nan());
    }
}
