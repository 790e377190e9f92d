use crate::camera_nav::Pose;
use anyhow::{bail, Context, Result};
use glam::{EulerRot, Quat, Vec3};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vec3Data {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3Data> for Vec3 {
    fn from(value: Vec3Data) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoseData {
    #[serde(default)]
    pub position: Vec3Data,
    #[serde(default)]
    pub yaw_degrees: f32,
    #[serde(default)]
    pub pitch_degrees: f32,
}

impl From<PoseData> for Pose {
    fn from(value: PoseData) -> Self {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            value.yaw_degrees.to_radians(),
            value.pitch_degrees.to_radians(),
            0.0,
        );
        Pose::new(value.position.into(), rotation)
    }
}

fn default_half_extents() -> Vec3Data {
    Vec3Data { x: 0.5, y: 0.5, z: 0.5 }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticDef {
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub center: Vec3Data,
    #[serde(default = "default_half_extents")]
    pub half_extents: Vec3Data,
    #[serde(default)]
    pub enabled: bool,
}

/// A loadable scene document: where the session spawns, plus the tagged
/// statics the activation pass switches on.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneDef {
    pub name: String,
    #[serde(default)]
    pub spawn_point: Option<PoseData>,
    #[serde(default)]
    pub statics: Vec<StaticDef>,
}

impl SceneDef {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read scene file {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse scene file {}", path.display()))
    }
}

#[derive(Debug)]
pub enum LoadPoll {
    Pending(f32),
    Ready(SceneDef),
    Failed(String),
}

/// The asynchronous scene-load boundary: issue a load, then poll it each tick
/// without blocking. One load in flight at a time; the session enforces the
/// reject-while-busy rule, the loader enforces its own invariant too.
pub trait SceneLoader {
    fn begin(&mut self, name: &str) -> Result<()>;
    fn poll(&mut self) -> LoadPoll;
}

/// Resolves scene documents from a directory of JSON files. The read happens
/// on the first poll so failures surface through the state machine, not the
/// begin call.
pub struct FileSceneLoader {
    root: PathBuf,
    pending: Option<String>,
}

impl FileSceneLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), pending: None }
    }
}

impl SceneLoader for FileSceneLoader {
    fn begin(&mut self, name: &str) -> Result<()> {
        if self.pending.is_some() {
            bail!("scene load already in flight");
        }
        if name.is_empty() {
            bail!("scene name is empty");
        }
        self.pending = Some(name.to_string());
        Ok(())
    }

    fn poll(&mut self) -> LoadPoll {
        let Some(name) = self.pending.take() else {
            return LoadPoll::Failed("no load in flight".to_string());
        };
        let path = self.root.join(format!("{name}.json"));
        match SceneDef::load_from_path(&path) {
            Ok(scene) => LoadPoll::Ready(scene),
            Err(err) => LoadPoll::Failed(format!("{err:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn scene_document_roundtrips_defaults() {
        let scene: SceneDef = serde_json::from_str(
            r#"{
                "name": "plaza",
                "spawn_point": {"position": {"x": 1.0, "y": 0.0, "z": -2.0}, "yaw_degrees": 90.0},
                "statics": [
                    {"name": "Ground Floor", "tag": "Floor", "half_extents": {"x": 50.0, "y": 0.5, "z": 50.0}}
                ]
            }"#,
        )
        .expect("parse scene");
        assert_eq!(scene.name, "plaza");
        let pose: Pose = scene.spawn_point.clone().expect("spawn point").into();
        assert!((pose.position.x - 1.0).abs() < 1e-6);
        assert!(!scene.statics[0].enabled, "statics default to disabled");
    }

    #[test]
    fn file_loader_rejects_second_begin() {
        let dir = TempDir::new().expect("temp dir");
        let mut loader = FileSceneLoader::new(dir.path());
        loader.begin("plaza").expect("first begin");
        assert!(loader.begin("other").is_err(), "second begin while pending must fail");
    }

    #[test]
    fn file_loader_reports_missing_scene_as_failed_poll() {
        let dir = TempDir::new().expect("temp dir");
        let mut loader = FileSceneLoader::new(dir.path());
        loader.begin("ghost-town").expect("begin");
        match loader.poll() {
            LoadPoll::Failed(reason) => assert!(reason.contains("ghost-town")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn file_loader_resolves_written_scene() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("plaza.json");
        let mut file = std::fs::File::create(&path).expect("create scene file");
        write!(file, r#"{{"name": "plaza"}}"#).expect("write scene file");

        let mut loader = FileSceneLoader::new(dir.path());
        loader.begin("plaza").expect("begin");
        match loader.poll() {
            LoadPoll::Ready(scene) => assert_eq!(scene.name, "plaza"),
            other => panic!("expected ready, got {other:?}"),
        }
    }
}
