//! This crate simulates the detection stage of a ray-cast LiDAR sensor. Given the raw
//! intersection results produced by an external raycasting engine, it computes physically
//! motivated point detections (sensor-local position + received intensity), applies a seeded
//! stochastic dropout model, injects positional noise, and packs the surviving points into
//! per-channel buffers ready for transport.
//!
//! The pipeline runs once per simulation tick and is fully deterministic under a fixed seed:
//! the per-ray dropout mask, the positional noise, and the intensity-weighted acceptance test
//! all draw from a single sensor-local random stream in a fixed order.

use std::error::Error;

pub mod description;
pub mod detection;
pub mod dropout;
pub mod frame;
pub mod pipeline;
pub mod postprocess;
pub mod random;
pub mod reflectivity;

pub use parry3d_f64::na;

pub type Point3 = parry3d_f64::na::Point3<f64>;
pub type Vector3 = parry3d_f64::na::Vector3<f64>;
pub type UnitVec3 = parry3d_f64::na::Unit<Vector3>;
pub type Iso3 = parry3d_f64::na::Isometry3<f64>;

pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

pub use description::{DropOffParams, LidarDescription};
pub use detection::{Detection, DetectionBuilder, RawHit, SurfaceInfo};
pub use dropout::RayMask;
pub use frame::LidarFrame;
pub use pipeline::RayCastLidar;
pub use postprocess::PostprocessFilter;
pub use random::RandomStream;
pub use reflectivity::{MaterialEntry, NO_MATERIAL, ReflectivityTable};
