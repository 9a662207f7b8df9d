//! The pre-cast ray mask. Before any ray is cast for a tick, one keep/skip decision is made
//! per (channel, slot) pair so that the raycaster can skip disabled slots entirely instead
//! of paying for a hit query whose point would be dropped anyway.

use crate::description::DropOffParams;
use crate::random::RandomStream;

/// A boolean keep/skip matrix over (channel, slot), stored row-major by channel.
#[derive(Clone, Debug)]
pub struct RayMask {
    keep: Vec<bool>,
    channels: usize,
    slots: usize,
}

impl RayMask {
    /// Create a mask with every slot enabled.
    ///
    /// # Arguments
    ///
    /// * `channels`: number of scan channels
    /// * `slots`: maximum number of ray slots per channel
    ///
    /// returns: RayMask
    pub fn all_enabled(channels: usize, slots: usize) -> Self {
        Self {
            keep: vec![true; channels * slots],
            channels,
            slots,
        }
    }

    /// Generate the mask for one tick. Evaluation is channel-major, slot-minor, drawing one
    /// uniform value per slot from the shared stream only while the general dropout model is
    /// active; an inactive model consumes nothing and enables every slot.
    ///
    /// # Arguments
    ///
    /// * `channels`: number of scan channels
    /// * `slots`: maximum number of ray slots per channel
    /// * `params`: drop-off model parameters (general rate and active flag)
    /// * `stream`: the sensor-local random stream
    ///
    /// returns: RayMask
    pub fn generate(
        channels: usize,
        slots: usize,
        params: &DropOffParams,
        stream: &mut RandomStream,
    ) -> Self {
        if !params.gen_active {
            return Self::all_enabled(channels, slots);
        }

        let mut keep = Vec::with_capacity(channels * slots);
        for _ in 0..channels {
            for _ in 0..slots {
                keep.push(stream.uniform() >= params.gen_rate);
            }
        }
        Self {
            keep,
            channels,
            slots,
        }
    }

    /// Whether the ray at (channel, slot) should be cast this tick.
    pub fn is_enabled(&self, channel: usize, slot: usize) -> bool {
        self.keep[channel * self.slots + slot]
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Number of enabled slots across all channels.
    pub fn enabled_count(&self) -> usize {
        self.keep.iter().filter(|&&k| k).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::LidarDescription;

    fn params_with_rate(rate: f64) -> DropOffParams {
        DropOffParams::derive(&LidarDescription {
            drop_off_gen_rate: rate,
            ..Default::default()
        })
    }

    #[test]
    fn inactive_model_enables_every_slot() {
        let params = params_with_rate(0.0);
        let mut stream = RandomStream::new(3);
        let mask = RayMask::generate(4, 16, &params, &mut stream);
        for ch in 0..4 {
            for slot in 0..16 {
                assert!(mask.is_enabled(ch, slot));
            }
        }
        // Nothing was drawn, so the stream is untouched
        let mut fresh = RandomStream::new(3);
        assert_eq!(stream.uniform(), fresh.uniform());
    }

    #[test]
    fn unit_rate_disables_every_slot() {
        // uniform() is in [0, 1) so a rate of 1.0 rejects every draw
        let params = params_with_rate(1.0);
        let mut stream = RandomStream::new(3);
        let mask = RayMask::generate(4, 16, &params, &mut stream);
        assert_eq!(mask.enabled_count(), 0);
    }

    #[test]
    fn mask_is_deterministic_under_seed() {
        let params = params_with_rate(0.45);
        let mut a = RandomStream::new(99);
        let mut b = RandomStream::new(99);
        let ma = RayMask::generate(8, 100, &params, &mut a);
        let mb = RayMask::generate(8, 100, &params, &mut b);
        for ch in 0..8 {
            for slot in 0..100 {
                assert_eq!(ma.is_enabled(ch, slot), mb.is_enabled(ch, slot));
            }
        }
    }

    #[test]
    fn dropout_rate_is_roughly_respected() {
        let params = params_with_rate(0.45);
        let mut stream = RandomStream::new(12345);
        let mask = RayMask::generate(32, 1000, &params, &mut stream);
        let kept = mask.enabled_count() as f64 / (32.0 * 1000.0);
        assert!((kept - 0.55).abs() < 0.02, "kept fraction was {}", kept);
    }
}
