//! Postprocessing of candidate detections: positional noise along the point's own direction
//! and the intensity-weighted stochastic acceptance test. The noise draw always precedes the
//! acceptance draw on the shared stream, which is part of the reproducibility contract.

use crate::description::DropOffParams;
use crate::detection::Detection;
use crate::random::RandomStream;

pub struct PostprocessFilter<'a> {
    params: &'a DropOffParams,
    noise_std_dev: f64,
}

impl<'a> PostprocessFilter<'a> {
    pub fn new(params: &'a DropOffParams, noise_std_dev: f64) -> Self {
        Self {
            params,
            noise_std_dev,
        }
    }

    /// Apply noise to a detection and decide whether it survives.
    ///
    /// When the configured noise standard deviation is above a negligible threshold, a
    /// zero-mean Gaussian draw displaces the point along its own direction from the sensor
    /// origin (a point sitting exactly at the origin has no direction and is left in place,
    /// though the draw is still consumed). A detection brighter than the intensity limit is
    /// kept unconditionally; anything else is kept with probability
    /// `alpha * intensity + beta` against one uniform draw. The linear acceptance value is
    /// deliberately not clamped to [0, 1].
    ///
    /// # Arguments
    ///
    /// * `detection`: the candidate, mutated in place when noise is active
    /// * `stream`: the sensor-local random stream
    ///
    /// returns: bool
    pub fn accept(&self, detection: &mut Detection, stream: &mut RandomStream) -> bool {
        if self.noise_std_dev > f64::EPSILON {
            let noise = stream.normal(0.0, self.noise_std_dev);
            let length = detection.point.coords.norm();
            if length > f64::EPSILON {
                let offset = detection.point.coords / length * noise;
                detection.point += offset;
            }
        }

        if detection.intensity > self.params.intensity_limit {
            return true;
        }
        stream.uniform() < self.params.alpha * detection.intensity + self.params.beta
    }
}
