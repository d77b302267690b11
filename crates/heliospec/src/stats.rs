//! Array statistics: root-sum-square and local sigma-clipping.

use ndarray::{ArrayD, ArrayView, ArrayViewD, Axis, Dimension, IxDyn};

/// Root sum square of all array elements.
pub fn rss<D: Dimension>(a: ArrayView<'_, f64, D>) -> f64 {
    a.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Root sum square along one axis of an n-dimensional array.
pub fn rss_axis(a: ArrayViewD<'_, f64>, axis: Axis) -> ArrayD<f64> {
    a.map_axis(axis, |lane| lane.iter().map(|v| v * v).sum::<f64>().sqrt())
}

/// Center estimator for the local intensity distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterFunc {
    Median,
    Mean,
}

/// Options for [`sigma_clip`].
#[derive(Debug, Clone)]
pub struct SigmaClipConfig {
    /// Kernel size along every axis (odd).
    pub size: usize,
    /// Low threshold, in units of the local standard deviation.
    pub sigma_lower: f64,
    /// High threshold, in units of the local standard deviation.
    pub sigma_upper: f64,
    /// Maximum number of clipping iterations.
    pub max_iters: usize,
    /// Center estimator for the local intensity distribution.
    pub center: CenterFunc,
}

impl SigmaClipConfig {
    /// Configuration with a given kernel size and the default thresholds
    /// (3 sigma both sides, 5 iterations, running median).
    pub fn new(size: usize) -> Self {
        Self {
            size,
            sigma_lower: 3.0,
            sigma_upper: 3.0,
            max_iters: 5,
            center: CenterFunc::Median,
        }
    }

    /// Set a symmetric clipping threshold.
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma_lower = sigma;
        self.sigma_upper = sigma;
        self
    }
}

/// Output of [`sigma_clip`].
#[derive(Debug, Clone)]
pub struct SigmaClipResult {
    /// Filtered array, clipped samples replaced by the local center estimate.
    pub data: ArrayD<f64>,
    /// True where a sample was clipped and replaced.
    pub mask: ArrayD<bool>,
}

/// Statistics computed over a kernel window.
#[derive(Debug, Clone, Copy)]
enum WindowStat {
    Median,
    Mean,
    Std,
}

/// Iterative sigma-clipping of an array against its local intensity
/// distribution.
///
/// Each iteration computes a running center (median or mean) and standard
/// deviation over a reflected-boundary kernel window, and replaces samples
/// further than the thresholds from the center by NaN. Once NaNs appear the
/// window statistics ignore them. Clipped samples are finally replaced by
/// the local center estimate.
pub fn sigma_clip(data: &ArrayD<f64>, config: &SigmaClipConfig) -> SigmaClipResult {
    let mut output = data.clone();
    let mut center = output.clone();
    let center_stat = match config.center {
        CenterFunc::Median => WindowStat::Median,
        CenterFunc::Mean => WindowStat::Mean,
    };
    let mut nchanged = 1usize;
    let mut iteration = 0usize;
    while nchanged != 0 && iteration < config.max_iters.max(1) {
        iteration += 1;
        center = local_filter(&output, config.size, center_stat);
        let stddev = local_filter(&output, config.size, WindowStat::Std);
        nchanged = 0;
        ndarray::Zip::from(&mut output)
            .and(&center)
            .and(&stddev)
            .for_each(|out, &c, &sd| {
                let diff = *out - c;
                if diff > config.sigma_upper * sd || diff < -config.sigma_lower * sd {
                    *out = f64::NAN;
                    nchanged += 1;
                }
            });
    }
    let mask = output.mapv(f64::is_nan);
    ndarray::Zip::from(&mut output).and(&center).for_each(|out, &c| {
        if out.is_nan() {
            *out = c;
        }
    });
    SigmaClipResult { data: output, mask }
}

/// Apply a window statistic at every array element, with reflected
/// boundaries (the `d c b a | a b c d` convention).
fn local_filter(a: &ArrayD<f64>, size: usize, stat: WindowStat) -> ArrayD<f64> {
    let ndim = a.ndim();
    let shape = a.shape().to_vec();
    let mut out = ArrayD::zeros(a.raw_dim());
    let mut window = Vec::with_capacity(size.pow(ndim as u32));
    let mut pos = vec![0usize; ndim];
    let mut idx = vec![0usize; ndim];
    // `out` is freshly allocated, so iteration order is row-major
    for out_v in out.iter_mut() {
        window.clear();
        gather_window(a, &idx, &shape, size, &mut pos, &mut window);
        *out_v = window_stat(&mut window, stat);
        for d in (0..ndim).rev() {
            idx[d] += 1;
            if idx[d] < shape[d] {
                break;
            }
            idx[d] = 0;
        }
    }
    out
}

/// Collect the kernel window around `idx` into `values`.
fn gather_window(
    a: &ArrayD<f64>,
    idx: &[usize],
    shape: &[usize],
    size: usize,
    pos: &mut [usize],
    values: &mut Vec<f64>,
) {
    let ndim = idx.len();
    let half = (size / 2) as isize;
    let mut offsets = vec![0usize; ndim];
    loop {
        for d in 0..ndim {
            let i = idx[d] as isize + offsets[d] as isize - half;
            pos[d] = reflect_index(i, shape[d]);
        }
        values.push(a[IxDyn(pos)]);
        // odometer over the kernel offsets
        let mut d = 0;
        loop {
            if d == ndim {
                return;
            }
            offsets[d] += 1;
            if offsets[d] < size {
                break;
            }
            offsets[d] = 0;
            d += 1;
        }
    }
}

/// Reflect an out-of-range index back into `0..len`.
fn reflect_index(i: isize, len: usize) -> usize {
    let n = len as isize;
    if n == 1 {
        return 0;
    }
    let period = 2 * n;
    let mut i = ((i % period) + period) % period;
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}

/// Compute a statistic over a window, ignoring NaNs when present.
fn window_stat(values: &mut Vec<f64>, stat: WindowStat) -> f64 {
    if values.iter().any(|v| v.is_nan()) {
        values.retain(|v| !v.is_nan());
    }
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    match stat {
        WindowStat::Mean => values.iter().sum::<f64>() / n as f64,
        WindowStat::Median => {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            if n % 2 == 1 {
                values[n / 2]
            } else {
                (values[n / 2 - 1] + values[n / 2]) / 2.0
            }
        }
        WindowStat::Std => {
            let mean = values.iter().sum::<f64>() / n as f64;
            let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
            var.sqrt()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_rss() {
        let a = arr1(&[3.0, 4.0]);
        assert!((rss(a.view()) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_rss_axis() {
        let a = arr2(&[[3.0, 5.0], [4.0, 12.0]]).into_dyn();
        let along_rows = rss_axis(a.view(), Axis(0));
        assert!((along_rows[[0]] - 5.0).abs() < 1e-12);
        assert!((along_rows[[1]] - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(2, 4), 2);
        assert_eq!(reflect_index(-3, 1), 0);
    }

    #[test]
    fn test_window_stat_nan_aware() {
        let mut values = vec![1.0, f64::NAN, 3.0];
        assert_eq!(window_stat(&mut values, WindowStat::Mean), 2.0);
        let mut values = vec![1.0, f64::NAN, 3.0];
        assert_eq!(window_stat(&mut values, WindowStat::Median), 2.0);
        let mut values = vec![f64::NAN];
        assert!(window_stat(&mut values, WindowStat::Std).is_nan());
    }

    #[test]
    fn test_sigma_clip_replaces_outlier() {
        let data = arr1(&[1.0, 1.0, 1.0, 100.0, 1.0, 1.0, 1.0]).into_dyn();
        let config = SigmaClipConfig::new(3).sigma(1.0);
        let result = sigma_clip(&data, &config);
        for v in result.data.iter() {
            assert!((v - 1.0).abs() < 1e-12);
        }
        let clipped: Vec<bool> = result.mask.iter().copied().collect();
        assert_eq!(clipped, vec![false, false, false, true, false, false, false]);
    }

    #[test]
    fn test_sigma_clip_mean_center() {
        let data = arr1(&[1.0, 1.0, 1.0, 100.0, 1.0, 1.0, 1.0]).into_dyn();
        let mut config = SigmaClipConfig::new(3).sigma(1.0);
        config.center = CenterFunc::Mean;
        let result = sigma_clip(&data, &config);
        assert!(result.mask[[3]]);
        // replaced by the running mean of its unclipped neighbours
        assert!((result.data[[3]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sigma_clip_asymmetric_thresholds() {
        let mut config = SigmaClipConfig::new(3);
        config.sigma_lower = 1.0;
        config.sigma_upper = 1e6;

        // a high outlier stays below the loose upper threshold
        let high = arr1(&[5.0, 5.0, 5.0, 100.0, 5.0, 5.0, 5.0]).into_dyn();
        let result = sigma_clip(&high, &config);
        assert_eq!(result.data, high);
        assert!(result.mask.iter().all(|&m| !m));

        // a low outlier of the same magnitude is clipped by the tight one
        let low = arr1(&[5.0, 5.0, 5.0, -100.0, 5.0, 5.0, 5.0]).into_dyn();
        let result = sigma_clip(&low, &config);
        assert!(result.mask[[3]]);
        assert!((result.data[[3]] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_sigma_clip_keeps_clean_data() {
        let data = arr2(&[[1.0, 2.0, 1.0], [2.0, 1.0, 2.0], [1.0, 2.0, 1.0]]).into_dyn();
        let config = SigmaClipConfig::new(3);
        let result = sigma_clip(&data, &config);
        assert_eq!(result.data, data);
        assert!(result.mask.iter().all(|&m| !m));
    }
}
