//! Turning raw ray hits into candidate detections. A detection is the hit point expressed in
//! the sensor-local frame together with the received intensity, which models atmospheric
//! attenuation over the travelled distance, the angle of incidence against the surface, and
//! the reflectivity of the struck material.

use crate::reflectivity::{NO_MATERIAL, ReflectivityTable};
use crate::{Iso3, Point3, Vector3};
use log::debug;

/// One raw raycast intersection as reported by the external physics query. The actor and
/// component identities are opaque to this crate; a [`SurfaceInfo`] implementation resolves
/// them to names on demand.
#[derive(Clone, Debug)]
pub struct RawHit {
    /// Impact point in the world frame
    pub point: Point3,

    /// Outward surface normal at the impact, unit length by contract of the raycaster
    pub normal: Vector3,

    /// Opaque identity of the hit actor
    pub actor: u64,

    /// Opaque identity of the hit component
    pub component: u64,

    /// Index of the hit face, -1 when the raycaster could not attribute one
    pub face_index: i32,
}

/// One candidate point of the output cloud.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Position in the sensor-local frame
    pub point: Point3,

    /// Received intensity. Nominally in [0, 1] but deliberately unclamped; see
    /// [`received_intensity`].
    pub intensity: f64,
}

/// Capability injected by the raycast collaborator to resolve a hit's opaque identities to
/// names. Keeps the detection core decoupled from any engine object model.
pub trait SurfaceInfo {
    /// Name of the actor the hit belongs to.
    fn actor_name(&self, hit: &RawHit) -> String;

    /// Name of the material at the hit face, or `None` when the component reports no valid
    /// material (e.g. a face index of -1).
    fn material_name(&self, hit: &RawHit) -> Option<String>;
}

/// Compute the received intensity of a single return.
///
/// The model is `cos_incidence * exp(-attenuation_rate * distance) * reflectivity`. The
/// cosine is intentionally not clamped: a grazing or back-facing hit yields a small or
/// negative intensity which the postprocess acceptance test then consumes as-is.
///
/// # Arguments
///
/// * `distance`: distance from the sensor origin to the hit, in the sensor-local frame
/// * `cos_incidence`: dot product of the hit-to-sensor unit vector and the surface normal
/// * `reflectivity`: resolved material reflectivity coefficient
/// * `attenuation_rate`: atmospheric attenuation coefficient
///
/// returns: f64
pub fn received_intensity(
    distance: f64,
    cos_incidence: f64,
    reflectivity: f64,
    attenuation_rate: f64,
) -> f64 {
    cos_incidence * (-attenuation_rate * distance).exp() * reflectivity
}

/// Builds detections from raw hits against a fixed reflectivity table and attenuation rate.
pub struct DetectionBuilder<'a> {
    table: &'a ReflectivityTable,
    attenuation_rate: f64,
}

impl<'a> DetectionBuilder<'a> {
    pub fn new(table: &'a ReflectivityTable, attenuation_rate: f64) -> Self {
        Self {
            table,
            attenuation_rate,
        }
    }

    /// Build a detection from one raw hit.
    ///
    /// The impact point is moved into the sensor-local frame, the incidence cosine is taken
    /// against the world-frame normal, and the material is resolved only when the hit actor
    /// passes the allow-list, so untracked hits never trigger a material-name query. A
    /// degenerate (zero-length) incidence vector is treated as a cosine of zero.
    ///
    /// # Arguments
    ///
    /// * `hit`: the raw raycast intersection
    /// * `sensor_transform`: world-frame pose of the sensor
    /// * `surface`: capability resolving the hit's actor and material names
    ///
    /// returns: Detection
    pub fn build(&self, hit: &RawHit, sensor_transform: &Iso3, surface: &dyn SurfaceInfo) -> Detection {
        let point = sensor_transform.inverse_transform_point(&hit.point);
        let distance = point.coords.norm();

        let sensor_position = Point3::from(sensor_transform.translation.vector);
        let toward_sensor = sensor_position - hit.point;
        let cos_incidence = if toward_sensor.norm() <= f64::EPSILON {
            0.0
        } else {
            toward_sensor.normalize().dot(&hit.normal)
        };

        let actor_name = surface.actor_name(hit);
        let reflectivity = if self.table.is_tracked(&actor_name) {
            let material = surface
                .material_name(hit)
                .unwrap_or_else(|| NO_MATERIAL.to_string());
            debug!("hit on {} resolved material {}", actor_name, material);
            self.table.material_coefficient(&material)
        } else {
            self.table.fallback()
        };

        let intensity =
            received_intensity(distance, cos_incidence, reflectivity, self.attenuation_rate);

        Detection { point, intensity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflectivity::MaterialEntry;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use test_case::test_case;

    /// Fixed-name surface resolver for tests.
    struct Names {
        actor: &'static str,
        material: Option<&'static str>,
    }

    impl SurfaceInfo for Names {
        fn actor_name(&self, _hit: &RawHit) -> String {
            self.actor.to_string()
        }

        fn material_name(&self, _hit: &RawHit) -> Option<String> {
            self.material.map(|m| m.to_string())
        }
    }

    fn hit_at(point: Point3, normal: Vector3) -> RawHit {
        RawHit {
            point,
            normal,
            actor: 1,
            component: 1,
            face_index: 0,
        }
    }

    fn table_with_concrete() -> ReflectivityTable {
        ReflectivityTable::load(
            vec![MaterialEntry {
                name: "Concrete".to_string(),
                reflectivity: 0.25,
            }],
            vec!["Vehicle".to_string()],
        )
    }

    #[test_case(0.0, 0.0, 1.0 ; "no attenuation at zero distance")]
    #[test_case(10.0, 0.004, (-0.04f64).exp() ; "default attenuation at ten meters")]
    #[test_case(100.0, 0.1, (-10.0f64).exp() ; "strong attenuation far away")]
    fn attenuation_values(distance: f64, rate: f64, expected: f64) {
        let i = received_intensity(distance, 1.0, 1.0, rate);
        assert_relative_eq!(i, expected, epsilon = 1.0e-12);
    }

    #[test]
    fn intensity_is_monotonically_non_increasing_in_distance() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(17);
        for _ in 0..200 {
            let rate = rng.random::<f64>() * 0.5;
            let mut previous = f64::INFINITY;
            for step in 0..50 {
                let distance = step as f64 * 2.0;
                let i = received_intensity(distance, 1.0, 1.0, rate);
                assert!(i <= previous, "rate {} distance {}", rate, distance);
                previous = i;
            }
        }
    }

    #[test]
    fn back_facing_hit_yields_negative_intensity() {
        // The normal points away from the sensor; the cosine is not clamped
        let i = received_intensity(5.0, -0.5, 1.0, 0.0);
        assert!(i < 0.0);
    }

    #[test]
    fn point_is_expressed_in_the_sensor_frame() {
        let table = ReflectivityTable::default();
        let builder = DetectionBuilder::new(&table, 0.0);
        let transform = Iso3::translation(10.0, 0.0, 0.0);
        let hit = hit_at(Point3::new(15.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0));
        let names = Names {
            actor: "Anything",
            material: None,
        };

        let detection = builder.build(&hit, &transform, &names);
        assert_relative_eq!(detection.point.x, 5.0, epsilon = 1.0e-12);
        assert_relative_eq!(detection.point.y, 0.0, epsilon = 1.0e-12);
        // Head-on hit against the fallback coefficient of 1.0
        assert_relative_eq!(detection.intensity, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn rotated_sensor_frame_is_honored() {
        let table = ReflectivityTable::default();
        let builder = DetectionBuilder::new(&table, 0.0);
        // Sensor at origin, yawed 90 degrees: a hit on world +x lands on local -y
        let transform = Iso3::rotation(Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2));
        let hit = hit_at(Point3::new(3.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0));
        let names = Names {
            actor: "Anything",
            material: None,
        };

        let detection = builder.build(&hit, &transform, &names);
        assert_relative_eq!(detection.point.x, 0.0, epsilon = 1.0e-12);
        assert_relative_eq!(detection.point.y, -3.0, epsilon = 1.0e-12);
    }

    #[test]
    fn incidence_angle_scales_intensity() {
        let table = ReflectivityTable::default();
        let builder = DetectionBuilder::new(&table, 0.0);
        let transform = Iso3::identity();
        // 45 degree surface: cosine is sqrt(2)/2
        let normal = Vector3::new(-1.0, 1.0, 0.0).normalize();
        let hit = hit_at(Point3::new(4.0, 0.0, 0.0), normal);
        let names = Names {
            actor: "Anything",
            material: None,
        };

        let detection = builder.build(&hit, &transform, &names);
        assert_relative_eq!(detection.intensity, 2.0f64.sqrt() / 2.0, epsilon = 1.0e-12);
    }

    #[test]
    fn zero_distance_hit_is_guarded() {
        let table = ReflectivityTable::default();
        let builder = DetectionBuilder::new(&table, 0.004);
        let transform = Iso3::identity();
        let hit = hit_at(Point3::origin(), Vector3::new(0.0, 0.0, 1.0));
        let names = Names {
            actor: "Anything",
            material: None,
        };

        let detection = builder.build(&hit, &transform, &names);
        assert_relative_eq!(detection.intensity, 0.0);
        assert!(detection.intensity.is_finite());
    }

    #[test]
    fn tracked_actor_uses_material_coefficient() {
        let table = table_with_concrete();
        let builder = DetectionBuilder::new(&table, 0.0);
        let transform = Iso3::identity();
        let hit = hit_at(Point3::new(2.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0));
        let names = Names {
            actor: "Vehicle_Audi",
            material: Some("Concrete_01"),
        };

        let detection = builder.build(&hit, &transform, &names);
        assert_relative_eq!(detection.intensity, 0.25, epsilon = 1.0e-12);
    }

    #[test]
    fn untracked_actor_uses_fallback_despite_matching_material() {
        let table = table_with_concrete();
        let builder = DetectionBuilder::new(&table, 0.0);
        let transform = Iso3::identity();
        let hit = hit_at(Point3::new(2.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0));
        let names = Names {
            actor: "Pedestrian_03",
            material: Some("Concrete_01"),
        };

        let detection = builder.build(&hit, &transform, &names);
        assert_relative_eq!(detection.intensity, table.fallback(), epsilon = 1.0e-12);
    }

    #[test]
    fn missing_material_resolves_as_no_material() {
        let table = ReflectivityTable::load(
            vec![
                MaterialEntry {
                    name: "Concrete".to_string(),
                    reflectivity: 0.25,
                },
                MaterialEntry {
                    name: NO_MATERIAL.to_string(),
                    reflectivity: 0.05,
                },
            ],
            vec!["Vehicle".to_string()],
        );
        let builder = DetectionBuilder::new(&table, 0.0);
        let transform = Iso3::identity();
        let hit = hit_at(Point3::new(2.0, 0.0, 0.0), Vector3::new(-1.0, 0.0, 0.0));
        let names = Names {
            actor: "Vehicle_Audi",
            material: None,
        };

        let detection = builder.build(&hit, &transform, &names);
        assert_relative_eq!(detection.intensity, 0.05, epsilon = 1.0e-12);
    }
}
