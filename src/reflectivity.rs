//! Material reflectivity lookup. A table maps material-name substrings to reflectivity
//! coefficients and carries an allow-list of actor-name substrings; hits on actors outside
//! the allow-list take a fallback coefficient without any material query at all. Both lists
//! come from JSON documents loaded once at sensor construction, and a missing or malformed
//! file degrades to the fallback-only table rather than failing the tick.

use crate::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Name under which the fallback coefficient can be overridden from the materials file.
pub const NO_MATERIAL: &str = "NoMaterial";

/// Reflectivity used when no configuration is loaded at all. The intensity model then
/// reduces to the plain attenuation-times-incidence baseline.
const DEFAULT_REFLECTIVITY: f64 = 1.0;

/// One material entry: a name substring and the reflectivity coefficient it maps to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub name: String,
    pub reflectivity: f64,
}

#[derive(Deserialize)]
struct MaterialsFile {
    materials: Vec<MaterialEntry>,
}

#[derive(Deserialize)]
struct ActorsFile {
    actors: Vec<ActorEntry>,
}

#[derive(Deserialize)]
struct ActorEntry {
    name: String,
}

/// An immutable-after-load reflectivity table with an actor allow-list. Matching is by
/// case-sensitive substring in insertion order, first match wins, for both lists.
#[derive(Clone, Debug)]
pub struct ReflectivityTable {
    entries: Vec<MaterialEntry>,
    actors: Vec<String>,
    fallback: f64,
}

impl Default for ReflectivityTable {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            actors: Vec::new(),
            fallback: DEFAULT_REFLECTIVITY,
        }
    }
}

impl ReflectivityTable {
    /// Populate the table from a material list and an actor allow-list, replacing any
    /// previous contents. An entry named exactly `NoMaterial` overrides the fallback
    /// coefficient while also participating in substring matching like any other entry.
    ///
    /// # Arguments
    ///
    /// * `materials`: name/reflectivity pairs, kept in the given order
    /// * `actors`: actor-name substrings for which material lookup is attempted
    ///
    /// returns: ReflectivityTable
    pub fn load(materials: Vec<MaterialEntry>, actors: Vec<String>) -> Self {
        let fallback = materials
            .iter()
            .find(|e| e.name == NO_MATERIAL)
            .map(|e| e.reflectivity)
            .unwrap_or(DEFAULT_REFLECTIVITY);
        Self {
            entries: materials,
            actors,
            fallback,
        }
    }

    /// Load the table from two JSON documents, one with a `materials` array of
    /// `{name, reflectivity}` objects and one with an `actors` array of `{name}` objects.
    /// Either file being absent or unparseable yields the corresponding empty list; the
    /// degradation is logged but never propagated as an error.
    pub fn from_json_files(materials_path: &Path, actors_path: &Path) -> Self {
        let materials = match read_materials(materials_path) {
            Ok(materials) => materials,
            Err(e) => {
                warn!(
                    "could not load materials from {}: {}; all hits will use the fallback \
                     reflectivity",
                    materials_path.display(),
                    e
                );
                Vec::new()
            }
        };

        let actors = match read_actors(actors_path) {
            Ok(actors) => actors,
            Err(e) => {
                warn!(
                    "could not load actor list from {}: {}; no hits will be material-resolved",
                    actors_path.display(),
                    e
                );
                Vec::new()
            }
        };

        Self::load(materials, actors)
    }

    /// True if the actor name matches any allow-list entry (case-sensitive substring).
    /// Only tracked actors pay the cost of a material-name query.
    pub fn is_tracked(&self, actor_name: &str) -> bool {
        self.actors.iter().any(|a| actor_name.contains(a.as_str()))
    }

    /// Look up the coefficient for a material name: the first entry, in insertion order,
    /// whose key is a substring of the given name. Falls back if nothing matches.
    pub fn material_coefficient(&self, material_name: &str) -> f64 {
        self.entries
            .iter()
            .find(|e| material_name.contains(e.name.as_str()))
            .map(|e| e.reflectivity)
            .unwrap_or(self.fallback)
    }

    /// Resolve a hit to a reflectivity coefficient. Untracked actors short-circuit to the
    /// fallback without consulting the material table at all.
    pub fn resolve(&self, actor_name: &str, material_name: &str) -> f64 {
        if self.is_tracked(actor_name) {
            self.material_coefficient(material_name)
        } else {
            self.fallback
        }
    }

    /// The coefficient used when no material can be resolved.
    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    /// Number of material entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_materials(path: &Path) -> Result<Vec<MaterialEntry>> {
    let file = File::open(path)?;
    let parsed: MaterialsFile = serde_json::from_reader(BufReader::new(file))?;
    Ok(parsed.materials)
}

fn read_actors(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let parsed: ActorsFile = serde_json::from_reader(BufReader::new(file))?;
    Ok(parsed.actors.into_iter().map(|a| a.name).collect())
}
