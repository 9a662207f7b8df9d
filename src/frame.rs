//! The packed per-tick output buffer. Surviving detections are written channel-major into
//! one flat vector, and the per-channel counts delimit the channel ranges for the transport.
//! The buffer is reset and pre-sized exactly once per tick from the expected (pre-filter)
//! hit counts, then shrunk logically per channel as points fail the acceptance test.

use crate::Point3;
use crate::detection::Detection;

#[derive(Clone, Debug, Default)]
pub struct LidarFrame {
    detections: Vec<Detection>,
    counts: Vec<u32>,
}

impl LidarFrame {
    /// Create an empty frame for the given number of channels.
    pub fn new(channels: u32) -> Self {
        Self {
            detections: Vec::new(),
            counts: vec![0; channels as usize],
        }
    }

    /// Clear the frame and reserve room for one tick's worth of detections based on the
    /// expected per-channel hit counts. Called exactly once per tick before any writes.
    ///
    /// # Arguments
    ///
    /// * `expected_per_channel`: pre-filter hit count of every channel
    pub fn reset(&mut self, expected_per_channel: &[usize]) {
        self.detections.clear();
        self.detections.reserve(expected_per_channel.iter().sum());
        self.counts.clear();
        self.counts.resize(expected_per_channel.len(), 0);
    }

    /// Append one surviving detection. Detections must be pushed in channel-major order;
    /// the channel boundaries are established afterwards by [`LidarFrame::write_channel_counts`].
    pub fn push(&mut self, detection: Detection) {
        self.detections.push(detection);
    }

    /// Finalize the per-channel counts after all channels have been processed. The counts
    /// must sum to the number of detections written this tick.
    pub fn write_channel_counts(&mut self, counts: &[usize]) {
        debug_assert_eq!(counts.iter().sum::<usize>(), self.detections.len());
        self.counts.clear();
        self.counts.extend(counts.iter().map(|&c| c as u32));
    }

    /// The ordered surviving detections of one channel.
    pub fn channel(&self, index: usize) -> &[Detection] {
        let start: usize = self.counts[..index].iter().map(|&c| c as usize).sum();
        let end = start + self.counts[index] as usize;
        &self.detections[start..end]
    }

    /// Final per-channel counts.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// All surviving detections in channel-major order.
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn channel_count(&self) -> usize {
        self.counts.len()
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Copy out the detection positions as a bare point cloud.
    pub fn points(&self) -> Vec<Point3> {
        self.detections.iter().map(|d| d.point).collect()
    }

    /// Copy out the detection intensities, index-matched with [`LidarFrame::points`].
    pub fn intensities(&self) -> Vec<f64> {
        self.detections.iter().map(|d| d.intensity).collect()
    }
}
