use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "CatalogConfig::default_manifest_path")]
    pub manifest_path: String,
    #[serde(default = "CatalogConfig::default_preferred_collection")]
    pub preferred_collection: String,
    #[serde(default)]
    pub fallback_collection: String,
}

impl CatalogConfig {
    fn default_manifest_path() -> String {
        "config/animations.json".to_string()
    }

    fn default_preferred_collection() -> String {
        "library".to_string()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            manifest_path: Self::default_manifest_path(),
            preferred_collection: Self::default_preferred_collection(),
            fallback_collection: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlacementConfig {
    #[serde(default = "PlacementConfig::default_scale_step")]
    pub scale_step: f32,
    #[serde(default = "PlacementConfig::default_rotation_step")]
    pub rotation_step_degrees: f32,
    #[serde(default = "PlacementConfig::default_spawn_clearance")]
    pub spawn_clearance: f32,
}

impl PlacementConfig {
    fn default_scale_step() -> f32 {
        0.1
    }

    fn default_rotation_step() -> f32 {
        15.0
    }

    fn default_spawn_clearance() -> f32 {
        0.2
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            scale_step: Self::default_scale_step(),
            rotation_step_degrees: Self::default_rotation_step(),
            spawn_clearance: Self::default_spawn_clearance(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_bird_eye_height")]
    pub bird_eye_height: f32,
    #[serde(default = "CameraConfig::default_lateral_offset")]
    pub lateral_offset: f32,
    #[serde(default = "CameraConfig::default_min_height")]
    pub min_height: f32,
    #[serde(default = "CameraConfig::default_max_height")]
    pub max_height: f32,
    #[serde(default = "CameraConfig::default_popup_seconds")]
    pub popup_seconds: f32,
}

impl CameraConfig {
    const fn default_bird_eye_height() -> f32 {
        100.0
    }

    const fn default_lateral_offset() -> f32 {
        50.0
    }

    const fn default_min_height() -> f32 {
        10.0
    }

    const fn default_max_height() -> f32 {
        30.0
    }

    const fn default_popup_seconds() -> f32 {
        3.0
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            bird_eye_height: Self::default_bird_eye_height(),
            lateral_offset: Self::default_lateral_offset(),
            min_height: Self::default_min_height(),
            max_height: Self::default_max_height(),
            popup_seconds: Self::default_popup_seconds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default = "AppConfig::default_scene_dir")]
    pub scene_dir: String,
    #[serde(default)]
    pub scenes: Vec<String>,
    #[serde(default = "AppConfig::default_bindings_path")]
    pub bindings_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            placement: PlacementConfig::default(),
            camera: CameraConfig::default(),
            scene_dir: Self::default_scene_dir(),
            scenes: Vec::new(),
            bindings_path: Self::default_bindings_path(),
        }
    }
}

impl AppConfig {
    fn default_scene_dir() -> String {
        "scenes".to_string()
    }

    fn default_bindings_path() -> String {
        "config/bindings.json".to_string()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("config load error: {err:?}; falling back to defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"scenes":["plaza"],"camera":{"bird_eye_height":40.0}}"#)
                .expect("parse partial config");
        assert_eq!(cfg.scenes, ["plaza"]);
        assert_eq!(cfg.camera.bird_eye_height, 40.0);
        assert_eq!(cfg.camera.popup_seconds, 3.0);
        assert_eq!(cfg.placement.rotation_step_degrees, 15.0);
        assert_eq!(cfg.catalog.preferred_collection, "library");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::load_or_default("does/not/exist.json");
        assert_eq!(cfg.scene_dir, "scenes");
        assert!(cfg.scenes.is_empty());
    }
}
