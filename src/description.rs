//! User-facing sensor configuration and the drop-off model parameters derived from it.

use serde::{Deserialize, Serialize};

/// Configuration of a simulated LiDAR sensor. These are the user-facing fields supplied by
/// the sensor configuration collaborator; everything the pipeline needs at runtime is either
/// read directly from here or derived once into [`DropOffParams`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LidarDescription {
    /// Number of scan channels (discrete beams), fixed for the life of the configuration
    pub channels: u32,

    /// Maximum number of ray slots per channel per tick
    pub points_per_channel: u32,

    /// Atmospheric attenuation coefficient, applied as exp(-rate * distance)
    pub atmosphere_attenuation_rate: f64,

    /// Probability that a point with zero received intensity is dropped
    pub drop_off_at_zero_intensity: f64,

    /// Intensity above which a point is kept unconditionally
    pub drop_off_intensity_limit: f64,

    /// Rate of the general (intensity-independent) ray dropout applied before casting
    pub drop_off_gen_rate: f64,

    /// Standard deviation of the positional noise added along each point's own direction
    pub noise_std_dev: f64,

    /// Seed for the sensor-local random stream
    pub random_seed: u64,
}

impl Default for LidarDescription {
    fn default() -> Self {
        Self {
            channels: 32,
            points_per_channel: 1800,
            atmosphere_attenuation_rate: 0.004,
            drop_off_at_zero_intensity: 0.4,
            drop_off_intensity_limit: 0.8,
            drop_off_gen_rate: 0.45,
            noise_std_dev: 0.0,
            random_seed: 0,
        }
    }
}

/// Parameters of the stochastic drop-off model, derived once per configuration change from
/// the description fields. A point with intensity `i` at or below the limit is kept with
/// probability `alpha * i + beta`; above the limit it is kept unconditionally.
#[derive(Clone, Debug, PartialEq)]
pub struct DropOffParams {
    /// Slope of the linear acceptance function
    pub alpha: f64,

    /// Acceptance probability at zero intensity
    pub beta: f64,

    /// Whether the general pre-cast ray dropout is active
    pub gen_active: bool,

    /// Rate of the general pre-cast ray dropout
    pub gen_rate: f64,

    /// Intensity above which points bypass the acceptance test entirely
    pub intensity_limit: f64,
}

impl DropOffParams {
    /// Derive the drop-off model parameters from a sensor description.
    ///
    /// # Arguments
    ///
    /// * `description`: the user-facing sensor configuration
    ///
    /// returns: DropOffParams
    pub fn derive(description: &LidarDescription) -> Self {
        Self {
            alpha: description.drop_off_at_zero_intensity / description.drop_off_intensity_limit,
            beta: 1.0 - description.drop_off_at_zero_intensity,
            gen_active: description.drop_off_gen_rate > f64::EPSILON,
            gen_rate: description.drop_off_gen_rate,
            intensity_limit: description.drop_off_intensity_limit,
        }
    }
}
