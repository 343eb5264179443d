//! Per-model gear ratio profiles, one JSON file per profile.

use crate::error::ProfileError;
use crate::result::{ProfileListResult, ProfileResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The host's model-name hash (Jenkins one-at-a-time over the lowercase name).
pub fn joaat(name: &str) -> u32 {
    let mut hash: u32 = 0;
    for byte in name.bytes().map(|b| b.to_ascii_lowercase()) {
        hash = hash.wrapping_add(byte as u32);
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

/// Profile file contents.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProfileFile {
    pub vehicle_models: Vec<String>,
    /// km/h
    pub drive_max_flat_velocity: f32,
    /// km/h, 0 disables the limiter.
    #[serde(default)]
    pub speed_limiter: f32,
    pub gear_ratios: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GearProfile {
    pub name: String,
    pub model_hashes: Vec<u32>,
    /// km/h, as written in the file.
    pub drive_max_flat_velocity: f32,
    /// m/s
    pub speed_limiter: f32,
    /// `gear_ratios[0]` is always negative.
    pub gear_ratios: Vec<f32>,
}

impl GearProfile {
    pub fn from_file(name: &str, file: ProfileFile) -> ProfileResult {
        if file.vehicle_models.is_empty() {
            return Err(ProfileError::NoModels);
        }
        if file.gear_ratios.is_empty() {
            return Err(ProfileError::NoRatios);
        }
        if let Some(i) = file.gear_ratios.iter().position(|r| !r.is_finite()) {
            return Err(ProfileError::BadRatio(i));
        }
        if !(file.drive_max_flat_velocity > 0.0) || !file.drive_max_flat_velocity.is_finite() {
            return Err(ProfileError::BadDriveMaxFlatVelocity(file.drive_max_flat_velocity));
        }
        if !(file.speed_limiter >= 0.0) || !file.speed_limiter.is_finite() {
            return Err(ProfileError::BadSpeedLimiter(file.speed_limiter));
        }
        let mut gear_ratios = file.gear_ratios;
        gear_ratios[0] = -gear_ratios[0].abs();
        Ok(Self {
            name: name.to_string(),
            model_hashes: file.vehicle_models.iter().map(|m| joaat(m)).collect(),
            drive_max_flat_velocity: file.drive_max_flat_velocity,
            speed_limiter: file.speed_limiter / 3.6,
            gear_ratios,
        })
    }

    pub fn from_json(name: &str, data: &str) -> ProfileResult {
        let file: ProfileFile = serde_json::from_str(data)?;
        Self::from_file(name, file)
    }

    pub fn load(path: &Path) -> ProfileResult {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = std::fs::read_to_string(path).map_err(ProfileError::OpenFile)?;
        Self::from_json(&name, &data)
    }

    pub fn top_gear(&self) -> i32 {
        self.gear_ratios.len() as i32 - 1
    }

    /// m/s, as the host stores it.
    pub fn drive_max_flat_velocity_ms(&self) -> f32 {
        self.drive_max_flat_velocity / 3.6
    }

    /// km/h in the top gear at redline.
    pub fn top_speed(&self) -> f32 {
        match self.gear_ratios.last() {
            Some(r) if *r != 0.0 => self.drive_max_flat_velocity / r,
            _ => 0.0,
        }
    }

    pub fn summary(&self) -> String {
        let mut text = format!("Loaded gearbox configuration {}. \n\nGear ratios:\n\n", self.name);
        for (i, ratio) in self.gear_ratios.iter().enumerate() {
            if i == 0 {
                text.push_str(&format!("R: {}\n", ratio));
            } else {
                text.push_str(&format!("{}: {}\n", i, ratio));
            }
        }
        text.push_str(&format!("\nTop speed: {} km/h", self.top_speed()));
        text
    }
}

#[derive(Debug, Clone, Default)]
pub struct GearProfiles {
    profiles: Vec<GearProfile>,
}

impl GearProfiles {
    pub fn new(profiles: Vec<GearProfile>) -> Self {
        Self { profiles }
    }

    /// Loads every `*.json` in `dir`, skipping files that fail to parse.
    /// A missing directory yields no profiles.
    pub fn load(dir: &Path) -> Self {
        match Self::try_load(dir) {
            Ok(profiles) => Self::new(profiles),
            Err(e) => {
                warn!("{}: {}", e, dir.display());
                Self::default()
            }
        }
    }

    pub fn try_load(dir: &Path) -> ProfileListResult {
        if !dir.exists() {
            info!("No gearbox profile directory at {}", dir.display());
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(ProfileError::ReadDirectory)? {
            let path = entry.map_err(ProfileError::ReadDirectory)?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut profiles = Vec::new();
        for path in paths {
            match GearProfile::load(&path) {
                Ok(profile) => {
                    info!(
                        "Loaded gearbox profile {} ({} gears, {} models)",
                        profile.name,
                        profile.top_gear(),
                        profile.model_hashes.len()
                    );
                    profiles.push(profile);
                }
                Err(e) => warn!("Skipping gearbox profile {}: {}", path.display(), e),
            }
        }
        Ok(profiles)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn find(&self, model_hash: u32) -> Option<&GearProfile> {
        self.profiles.iter().find(|p| p.model_hashes.contains(&model_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDER: &str = r#"{
        "vehicle_models": ["adder", "ZENTORNO"],
        "drive_max_flat_velocity": 360.0,
        "speed_limiter": 180.0,
        "gear_ratios": [3.5, 3.0, 2.0, 1.5, 1.2]
    }"#;

    #[test]
    fn joaat_matches_host_hashes() {
        assert_eq!(joaat("adder"), 0xB779_A091);
        assert_eq!(joaat("ADDER"), 0xB779_A091);
        assert_eq!(joaat(""), 0);
    }

    #[test]
    fn profile_forces_negative_reverse() {
        let profile = GearProfile::from_json("hyper", ADDER).unwrap();
        assert_eq!(profile.gear_ratios[0], -3.5);
        assert_eq!(profile.top_gear(), 4);
        assert_eq!(profile.speed_limiter, 50.0);
        assert_eq!(profile.drive_max_flat_velocity_ms(), 100.0);
        assert_eq!(profile.top_speed(), 300.0);
        assert_eq!(profile.model_hashes[0], joaat("adder"));
    }

    #[test]
    fn rejects_bad_profiles() {
        let no_ratios = r#"{ "vehicle_models": ["adder"], "drive_max_flat_velocity": 300.0, "gear_ratios": [] }"#;
        assert!(matches!(GearProfile::from_json("x", no_ratios), Err(ProfileError::NoRatios)));
        let slow = r#"{ "vehicle_models": ["adder"], "drive_max_flat_velocity": 0.0, "gear_ratios": [1.0, 1.0] }"#;
        assert!(matches!(
            GearProfile::from_json("x", slow),
            Err(ProfileError::BadDriveMaxFlatVelocity(_))
        ));
        let nobody = r#"{ "vehicle_models": [], "drive_max_flat_velocity": 300.0, "gear_ratios": [1.0, 1.0] }"#;
        assert!(matches!(GearProfile::from_json("x", nobody), Err(ProfileError::NoModels)));
        assert!(matches!(GearProfile::from_json("x", "[1, 2"), Err(ProfileError::Parse(_))));
    }

    #[test]
    fn summary_lists_ratios() {
        let profile = GearProfile::from_json("hyper", ADDER).unwrap();
        let summary = profile.summary();
        assert!(summary.starts_with("Loaded gearbox configuration hyper."));
        assert!(summary.contains("R: -3.5\n"));
        assert!(summary.contains("4: 1.2\n"));
        assert!(summary.ends_with("Top speed: 300 km/h"));
    }

    #[test]
    fn directory_load_skips_broken_files() {
        let dir = std::env::temp_dir().join(format!("smoothdrive-profiles-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hyper.json"), ADDER).unwrap();
        std::fs::write(dir.join("broken.json"), "{").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let profiles = GearProfiles::load(&dir);
        assert_eq!(profiles.len(), 1);
        let found = profiles.find(joaat("zentorno")).unwrap();
        assert_eq!(found.name, "hyper");
        assert!(profiles.find(joaat("panto")).is_none());

        assert!(GearProfiles::load(&dir.join("missing")).is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
