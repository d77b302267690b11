//! Observation-program (study) parameters.

use std::fmt;

use crate::header::Header;
use crate::types::HelioResult;

/// Study parameters, extracted from a file header.
#[derive(Debug, Clone, PartialEq)]
pub struct Study {
    /// Nominal slit width, arcsec.
    pub slit: f64,
    /// Bin factor along the dispersion axis (`NBIN3`).
    pub bin_x: u32,
    /// Bin factor along the slit axis (`NBIN2`).
    pub bin_y: u32,
    /// Spectral window width, pixels (`NAXIS3`).
    pub window_width: u32,
    /// Exposure time, s (`XPOSURE`).
    pub exp_time: f64,
    /// Average wavelength of the spectral window, nm.
    pub av_wavelength: f64,
    /// Radiometric calibration factor, DN per W m⁻² sr⁻¹ nm⁻¹ (L2 only).
    pub radcal: Option<f64>,
    /// Data product level, e.g. "L2".
    pub level: String,
}

impl Study {
    /// Read the study parameters from a file header.
    ///
    /// `WAVEMIN`/`WAVEMAX` are given in units of 10^`WAVEUNIT` m; the
    /// average wavelength is converted to nm.
    // TODO use the real slit width once available, not the nominal one
    pub fn from_header(header: &Header) -> HelioResult<Self> {
        let level = header.str("LEVEL")?.to_string();
        let wavemin = header.f64("WAVEMIN")?;
        let wavemax = header.f64("WAVEMAX")?;
        let waveunit = header.i64("WAVEUNIT")?;
        let av_wavelength = (wavemin + wavemax) / 2.0 * 10f64.powi(waveunit as i32) * 1e9;
        let radcal = if level == "L2" {
            Some(header.f64("RADCAL")?)
        } else {
            None
        };
        Ok(Self {
            slit: header.f64("SLIT_WID")?,
            bin_x: header.i64("NBIN3")? as u32,
            bin_y: header.i64("NBIN2")? as u32,
            window_width: header.i64("NAXIS3")? as u32,
            exp_time: header.f64("XPOSURE")?,
            av_wavelength,
            radcal,
            level,
        })
    }
}

impl fmt::Display for Study {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Slit: {} arcsec", self.slit)?;
        writeln!(f, "Bin: ({}, {})", self.bin_x, self.bin_y)?;
        writeln!(f, "Exposure time: {} s", self.exp_time)?;
        writeln!(f, "Window width: {} pix", self.window_width)?;
        writeln!(f, "Average wavelength: {} nm", self.av_wavelength)?;
        match self.radcal {
            Some(radcal) => write!(f, "RADCAL: {radcal}"),
            None => write!(f, "RADCAL: none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l2_header() -> Header {
        Header::from_json(
            r#"{
                "SLIT_WID": 4.0,
                "NBIN3": 1,
                "NBIN2": 2,
                "XPOSURE": 10.0,
                "NAXIS3": 48,
                "WAVEMIN": 769,
                "WAVEMAX": 771,
                "WAVEUNIT": -10,
                "LEVEL": "L2",
                "RADCAL": 1000.0
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_header() {
        let study = Study::from_header(&l2_header()).unwrap();
        assert_eq!(study.slit, 4.0);
        assert_eq!(study.bin_x, 1);
        assert_eq!(study.bin_y, 2);
        assert_eq!(study.window_width, 48);
        assert_eq!(study.exp_time, 10.0);
        assert!((study.av_wavelength - 77.0).abs() < 1e-9);
        assert_eq!(study.radcal, Some(1000.0));
        assert_eq!(study.level, "L2");
    }

    #[test]
    fn test_no_radcal_below_l2() {
        let mut header = l2_header();
        header.set("LEVEL", serde_json::json!("L1"));
        let study = Study::from_header(&header).unwrap();
        assert_eq!(study.radcal, None);
    }

    #[test]
    fn test_missing_keyword() {
        let header = Header::from_json(r#"{"LEVEL": "L2"}"#).unwrap();
        assert!(Study::from_header(&header).is_err());
    }

    #[test]
    fn test_display() {
        let study = Study::from_header(&l2_header()).unwrap();
        let text = study.to_string();
        assert!(text.contains("Slit: 4 arcsec"));
        assert!(text.contains("Bin: (1, 2)"));
        assert!(text.contains("RADCAL: 1000"));
    }
}
