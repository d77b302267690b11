//! Per-pixel noise budget of an observation.

use ndarray::{aview1, ArrayD};

use crate::header::Header;
use crate::instrument::Spice;
use crate::stats::rss;
use crate::study::Study;
use crate::types::{HelioError, HelioResult};

use std::f64::consts::SQRT_2;

/// Noise standard deviations per component, in the unit of the input signal.
#[derive(Debug, Clone)]
pub struct NoiseComponents {
    /// Dark-current noise, dark-map subtraction correction included.
    pub dark: f64,
    /// Background photon noise.
    pub background: f64,
    /// Read noise, dark-map subtraction correction included.
    pub read: f64,
    /// Photon (shot) noise of the signal, per pixel.
    pub signal: ArrayD<f64>,
    /// Total uncertainty, per pixel.
    pub total: ArrayD<f64>,
}

impl NoiseComponents {
    /// Root sum square of the signal-independent components.
    pub fn constant(&self) -> f64 {
        rss(aview1(&[self.dark, self.background, self.read]))
    }
}

/// Mean signal increase due to noise sources, plus their widths.
#[derive(Debug, Clone)]
pub struct NoiseEstimate {
    /// Mean dark current and background contribution to the measured signal.
    pub noise_contribution: f64,
    /// Noise standard deviations per component.
    pub sigma: NoiseComponents,
}

/// An observation made by the instrument under some study.
#[derive(Debug, Clone)]
pub struct Observation {
    pub instrument: Spice,
    pub study: Study,
}

impl Observation {
    pub fn new(instrument: Spice, study: Study) -> Self {
        Self { instrument, study }
    }

    /// Build an observation from a file header, with the current
    /// instrument calibration.
    pub fn from_header(header: &Header) -> HelioResult<Self> {
        let study = Study::from_header(header)?;
        tracing::debug!(study = %study, "observation parameters from header");
        Ok(Self::new(Spice::new(), study))
    }

    /// Average dark current in DN per macro-pixel over the exposure time.
    // TODO should depend on detector temperature, and on position (dark or
    // hot pixels) in L1; real darks are not quite Poissonian either.
    pub fn av_dark_current(&self, wvl_nm: f64) -> f64 {
        self.instrument.dark_current(wvl_nm)
            * self.study.exp_time
            * self.study.bin_x as f64
            * self.study.bin_y as f64
    }

    /// Average background signal in DN per macro-pixel over the exposure
    /// time.
    pub fn av_background(&self, wvl_nm: f64) -> f64 {
        self.instrument.background()
            * self.instrument.quantum_efficiency(wvl_nm)
            * self.study.exp_time
            * self.study.bin_x as f64
            * self.study.bin_y as f64
            * self.instrument.gain(wvl_nm)
    }

    /// Read noise distribution width in DN per macro-pixel.
    pub fn read_noise_width(&self) -> f64 {
        self.instrument.read_noise() * ((self.study.bin_x * self.study.bin_y) as f64).sqrt()
    }

    /// Signal increase and noise widths for a measured signal in DN/pixel.
    ///
    /// `signal_mean` excludes the expected signal increase due to average
    /// dark current and background, so it is not exactly the measured
    /// signal. Negative values are considered as 0 for the photon noise;
    /// there, the total uncertainty is set to |signal| + RSS of the other
    /// noises so error bars stay compatible with fitted functions. Large
    /// negative signal values (e.g. below -3 RSS of the other noises) are
    /// best replaced by NaNs by the caller.
    ///
    /// The dark and read components carry a √2 factor for the subtraction
    /// of the dark map (currently a single dark frame). The dark current
    /// and background are always taken at the study's average wavelength;
    /// `wvl_nm` selects the gain and noise factor.
    pub fn noise_effects(&self, signal_mean: &ArrayD<f64>, wvl_nm: f64) -> NoiseEstimate {
        let av_dark_current = self.av_dark_current(self.study.av_wavelength);
        let av_background = self.av_background(self.study.av_wavelength);
        let gain = self.instrument.gain(wvl_nm);
        let noise_factor = self.instrument.noise_factor(wvl_nm);

        let dark = av_dark_current.sqrt() * SQRT_2;
        let background = (av_background * gain).sqrt();
        let read = self.read_noise_width() * SQRT_2;
        let signal = signal_mean.mapv(|s| (s.max(0.0) * gain).sqrt() * noise_factor);

        let constant = rss(aview1(&[dark, background, read]));
        let total = ndarray::Zip::from(signal_mean)
            .and(&signal)
            .map_collect(|&mean, &s| {
                if mean < 0.0 {
                    -mean + constant
                } else {
                    (constant * constant + s * s).sqrt()
                }
            });

        NoiseEstimate {
            noise_contribution: av_dark_current + av_background,
            sigma: NoiseComponents {
                dark,
                background,
                read,
                signal,
                total,
            },
        }
    }

    /// Signal increase and noise widths for calibrated L2 data in
    /// W m⁻² sr⁻¹ nm⁻¹. Outputs are in the same radiometric unit.
    pub fn noise_effects_from_l2(
        &self,
        data: &ArrayD<f64>,
        wvl_nm: f64,
    ) -> HelioResult<NoiseEstimate> {
        let radcal = self
            .study
            .radcal
            .ok_or_else(|| HelioError::UnsupportedLevel {
                expected: "L2".to_string(),
                got: self.study.level.clone(),
            })?;
        let data_dn = data.mapv(|v| v * radcal);
        let mut estimate = self.noise_effects(&data_dn, wvl_nm);
        estimate.noise_contribution /= radcal;
        estimate.sigma.dark /= radcal;
        estimate.sigma.background /= radcal;
        estimate.sigma.read /= radcal;
        estimate.sigma.signal.mapv_inplace(|v| v / radcal);
        estimate.sigma.total.mapv_inplace(|v| v / radcal);
        Ok(estimate)
    }
}
