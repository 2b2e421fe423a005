//! Court surface loader.
//!
//! Loads surface profiles from YAML files so courts can be tuned without
//! recompiling.
//!
//! ## Directory Structure
//!
//! ```text
//! materials/
//! ├── surfaces/
//! │   ├── roland_garros_clay.yaml
//! │   ├── wimbledon_grass.yaml
//! │   ├── us_open_hard.yaml
//! │   └── laver_cup_black.yaml
//! └── config/
//!     └── default.yaml
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigError;
use crate::types::{CourtType, SurfaceProfile};

/// Surface loader with configurable base directory.
pub struct SurfaceLoader {
    base_path: PathBuf,
}

impl SurfaceLoader {
    /// The base path should contain a `surfaces/` subdirectory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Load a surface by name (without .yaml extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = SurfaceLoader::new("materials");
    /// let clay = loader.load_surface("roland_garros_clay")?;
    /// ```
    pub fn load_surface(&self, name: &str) -> Result<SurfaceProfile, ConfigError> {
        let path = self
            .base_path
            .join("surfaces")
            .join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        let profile: SurfaceProfile = serde_yaml::from_str(&contents)?;
        validate(&profile)?;
        Ok(profile)
    }

    /// List all available surfaces.
    pub fn list_surfaces(&self) -> Result<Vec<String>, ConfigError> {
        let path = self.base_path.join("surfaces");
        if !path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if name.ends_with(".yaml") {
                names.push(name.trim_end_matches(".yaml").to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn validate(profile: &SurfaceProfile) -> Result<(), ConfigError> {
    let in_unit = |v: f64| v > 0.0 && v < 1.0;
    if !in_unit(profile.restitution) {
        return Err(ConfigError::Invalid(format!(
            "{}: restitution {} must be in (0, 1)",
            profile.name, profile.restitution
        )));
    }
    if !in_unit(profile.friction) {
        return Err(ConfigError::Invalid(format!(
            "{}: friction {} must be in (0, 1)",
            profile.name, profile.friction
        )));
    }
    Ok(())
}

/// One shared profile per court type.
#[derive(Debug, Clone)]
pub struct SurfaceCatalog {
    surfaces: Vec<Arc<SurfaceProfile>>,
}

impl SurfaceCatalog {
    /// The four built-in tournament surfaces.
    pub fn standard() -> Self {
        Self {
            surfaces: CourtType::ALL
                .into_iter()
                .map(|court| Arc::new(SurfaceProfile::for_court(court)))
                .collect(),
        }
    }

    /// Every court type loaded from `<base>/surfaces/<key>.yaml`.
    pub fn from_loader(loader: &SurfaceLoader) -> Result<Self, ConfigError> {
        let mut surfaces = Vec::with_capacity(CourtType::ALL.len());
        for court in CourtType::ALL {
            let profile = loader.load_surface(court.key())?;
            if profile.court != court {
                return Err(ConfigError::Invalid(format!(
                    "{}.yaml declares court {:?}",
                    court.key(),
                    profile.court
                )));
            }
            surfaces.push(Arc::new(profile));
        }
        Ok(Self { surfaces })
    }

    pub fn get(&self, court: CourtType) -> Arc<SurfaceProfile> {
        self.surfaces
            .iter()
            .find(|surface| surface.court == court)
            .cloned()
            .unwrap_or_else(|| Arc::new(SurfaceProfile::for_court(court)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SurfaceProfile>> {
        self.surfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl Default for SurfaceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// Tests
// =============================================================================
