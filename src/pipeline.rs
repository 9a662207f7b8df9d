//! The per-tick sensor pipeline. A [`RayCastLidar`] owns the configuration, the reflectivity
//! table, the random stream, and the output frame, and exposes the two entry points the
//! simulation loop calls every tick: [`RayCastLidar::preprocess_rays`] before the engine
//! casts any rays, and [`RayCastLidar::compute_detections`] once the hits are in. Everything
//! runs synchronously on the tick thread and always to completion.

use crate::description::{DropOffParams, LidarDescription};
use crate::detection::{DetectionBuilder, RawHit, SurfaceInfo};
use crate::dropout::RayMask;
use crate::frame::LidarFrame;
use crate::postprocess::PostprocessFilter;
use crate::random::RandomStream;
use crate::reflectivity::ReflectivityTable;
use crate::Iso3;

pub struct RayCastLidar {
    description: LidarDescription,
    drop_off: DropOffParams,
    table: ReflectivityTable,
    stream: RandomStream,
    mask: RayMask,
    frame: LidarFrame,
}

impl RayCastLidar {
    /// Create a sensor from a description and an already-loaded reflectivity table. The
    /// random stream is seeded here and owned by the sensor for its whole life.
    ///
    /// # Arguments
    ///
    /// * `description`: the user-facing sensor configuration
    /// * `table`: reflectivity table and actor allow-list, immutable from here on
    ///
    /// returns: RayCastLidar
    pub fn new(description: LidarDescription, table: ReflectivityTable) -> Self {
        let drop_off = DropOffParams::derive(&description);
        let stream = RandomStream::new(description.random_seed);
        let mask = RayMask::all_enabled(
            description.channels as usize,
            description.points_per_channel as usize,
        );
        let frame = LidarFrame::new(description.channels);
        Self {
            description,
            drop_off,
            table,
            stream,
            mask,
            frame,
        }
    }

    /// Replace the sensor configuration and re-derive the drop-off parameters. Must only be
    /// called between ticks; the random stream is not reseeded.
    pub fn set_description(&mut self, description: LidarDescription) {
        self.drop_off = DropOffParams::derive(&description);
        self.mask = RayMask::all_enabled(
            description.channels as usize,
            description.points_per_channel as usize,
        );
        self.frame = LidarFrame::new(description.channels);
        self.description = description;
    }

    pub fn description(&self) -> &LidarDescription {
        &self.description
    }

    pub fn drop_off(&self) -> &DropOffParams {
        &self.drop_off
    }

    pub fn reflectivity(&self) -> &ReflectivityTable {
        &self.table
    }

    /// Generate this tick's ray mask. Call before casting any rays so that disabled slots
    /// never generate a hit query; the raycaster consults [`RayMask::is_enabled`] per slot.
    pub fn preprocess_rays(&mut self) -> &RayMask {
        self.mask = RayMask::generate(
            self.description.channels as usize,
            self.description.points_per_channel as usize,
            &self.drop_off,
            &mut self.stream,
        );
        &self.mask
    }

    /// The mask generated by the last [`RayCastLidar::preprocess_rays`] call.
    pub fn ray_mask(&self) -> &RayMask {
        &self.mask
    }

    /// Run the detection stage for one tick: build a detection from every recorded hit,
    /// postprocess it, and pack the survivors into the output frame. Hits are processed in
    /// channel order and, within a channel, in recorded order; a dropped point decrements
    /// its channel's running count instead of leaving a hole in the buffer.
    ///
    /// # Arguments
    ///
    /// * `hits`: recorded hits grouped by channel index; channels beyond the configured
    ///   count are ignored, missing trailing channels are treated as empty
    /// * `sensor_transform`: world-frame pose of the sensor during this tick
    /// * `surface`: capability resolving hit actor and material names
    ///
    /// returns: &LidarFrame
    pub fn compute_detections(
        &mut self,
        hits: &[Vec<RawHit>],
        sensor_transform: &Iso3,
        surface: &dyn SurfaceInfo,
    ) -> &LidarFrame {
        let channels = self.description.channels as usize;
        let mut counts: Vec<usize> = (0..channels)
            .map(|ch| hits.get(ch).map_or(0, Vec::len))
            .collect();

        self.frame.reset(&counts);

        let builder =
            DetectionBuilder::new(&self.table, self.description.atmosphere_attenuation_rate);
        let filter = PostprocessFilter::new(&self.drop_off, self.description.noise_std_dev);

        for (channel, channel_hits) in hits.iter().take(channels).enumerate() {
            for hit in channel_hits {
                let mut detection = builder.build(hit, sensor_transform, surface);
                if filter.accept(&mut detection, &mut self.stream) {
                    self.frame.push(detection);
                } else {
                    counts[channel] -= 1;
                }
            }
        }

        self.frame.write_channel_counts(&counts);
        &self.frame
    }

    /// The frame packed by the last [`RayCastLidar::compute_detections`] call.
    pub fn frame(&self) -> &LidarFrame {
        &self.frame
    }
}
