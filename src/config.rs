// config.rs — tuning constants for motion, camera and focus framing
//
// Load order:
// - CLI: --config <path>
// - Env: GALLERY_CONFIG
// - <exe_dir>/assets/gallery.json, then ./assets/gallery.json
// - built-in defaults
//
// Every field is optional in the JSON file; missing fields keep their default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    /// Radians per second.
    pub turn_speed: f32,
    /// Half-extent of the walkable area across the corridor (x).
    pub lateral_limit: f32,
    /// Half-extent of the walkable area along the corridor (z).
    pub depth_limit: f32,
    pub start_position: [f32; 3],
    pub tilt_amount: f32,
    pub tilt_gain: f32,
    pub walk_clip_speed: f32,
    pub run_clip_speed: f32,
    /// Fraction of the locomotion clip used as the resting pose.
    pub idle_pose_fraction: f32,
    pub idle_pose_gain: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            run_speed: 5.0,
            turn_speed: 3.0,
            lateral_limit: 1.8,
            depth_limit: 12.0,
            start_position: [0.0, 0.0, 10.0],
            tilt_amount: 0.15,
            tilt_gain: 0.1,
            walk_clip_speed: 1.8,
            run_clip_speed: 2.0,
            idle_pose_fraction: 0.75,
            idle_pose_gain: 0.1,
        }
    }
}

/// Camera gains are per reference frame (see `camera::frame_gain`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub start_position: [f32; 3],
    pub fov_deg: f32,
    pub follow_offset: [f32; 3],
    pub look_height: f32,
    pub follow_gain: f32,
    pub lateral_limit: f32,
    pub depth_limit: f32,
    pub enter_rate: f32,
    pub exit_rate: f32,
    pub base_gain: f32,
    pub eased_gain: f32,
    pub look_gain_scale: f32,
    pub focused_gain: f32,
    pub arrive_epsilon: f32,
    pub return_epsilon: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: [0.0, 2.0, 8.0],
            fov_deg: 60.0,
            follow_offset: [0.0, 1.5, 3.0],
            look_height: 0.2,
            follow_gain: 0.08,
            lateral_limit: 2.5,
            depth_limit: 13.0,
            enter_rate: 0.25,
            exit_rate: 0.2,
            base_gain: 0.008,
            eased_gain: 0.03,
            look_gain_scale: 1.5,
            focused_gain: 0.05,
            arrive_epsilon: 0.05,
            return_epsilon: 0.1,
        }
    }
}

/// How far in front of a panel the camera parks, per device class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub desktop_distance: f32,
    pub desktop_lift: f32,
    pub touch_distance: f32,
    pub touch_lift: f32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            desktop_distance: 1.8,
            desktop_lift: 0.0,
            touch_distance: 4.0,
            touch_lift: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Logical width below which the layout counts as a touch device.
    pub small_screen_width: u32,
    /// Forces the device class regardless of detection.
    pub force_touch: Option<bool>,
    pub joystick_radius: f32,
    pub joystick_threshold: f32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            small_screen_width: 768,
            force_touch: None,
            joystick_radius: 56.0,
            joystick_threshold: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Looping track started when the visitor enters.
    pub music: PathBuf,
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            music: PathBuf::from("assets").join("audio").join("background.mp3"),
            volume: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub motion: MotionConfig,
    pub camera: CameraConfig,
    pub focus: FocusConfig,
    pub device: DeviceConfig,
    pub audio: AudioConfig,
    pub window_size: [u32; 2],
    pub splash_seconds: f32,
    pub ui_font: Option<PathBuf>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            camera: CameraConfig::default(),
            focus: FocusConfig::default(),
            device: DeviceConfig::default(),
            audio: AudioConfig::default(),
            window_size: [1280, 720],
            splash_seconds: 4.5,
            ui_font: None,
        }
    }
}

impl GalleryConfig {
    pub fn from_json(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let config: GalleryConfig =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &text)
    }

    /// Resolve the config file location and load it. `Ok(None)` means no file
    /// was found and the caller should use defaults.
    pub fn discover() -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let Some(path) = find_config_file() else {
            return Ok(None);
        };
        let config = Self::load(&path)?;
        Ok(Some((path, config)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.motion;
        let c = &self.camera;

        positive("motion.walk_speed", m.walk_speed)?;
        positive("motion.run_speed", m.run_speed)?;
        positive("motion.turn_speed", m.turn_speed)?;
        positive("motion.lateral_limit", m.lateral_limit)?;
        positive("motion.depth_limit", m.depth_limit)?;
        positive("camera.lateral_limit", c.lateral_limit)?;
        positive("camera.depth_limit", c.depth_limit)?;
        positive("camera.enter_rate", c.enter_rate)?;
        positive("camera.exit_rate", c.exit_rate)?;
        positive("camera.arrive_epsilon", c.arrive_epsilon)?;
        positive("camera.return_epsilon", c.return_epsilon)?;
        positive("focus.desktop_distance", self.focus.desktop_distance)?;
        positive("focus.touch_distance", self.focus.touch_distance)?;

        for (name, gain) in [
            ("motion.tilt_gain", m.tilt_gain),
            ("motion.idle_pose_gain", m.idle_pose_gain),
            ("camera.follow_gain", c.follow_gain),
            ("camera.base_gain", c.base_gain),
            ("camera.focused_gain", c.focused_gain),
        ] {
            unit_gain(name, gain)?;
        }
        // The blended transition gain tops out at base + eased, times the look scale.
        unit_gain(
            "camera.base_gain + camera.eased_gain",
            (c.base_gain + c.eased_gain) * c.look_gain_scale.max(1.0),
        )?;

        if !(c.fov_deg > 1.0 && c.fov_deg < 179.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_deg must be within (1, 179), got {}",
                c.fov_deg
            )));
        }
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(ConfigError::Invalid(format!(
                "audio.volume must be within [0, 1], got {}",
                self.audio.volume
            )));
        }
        if !(0.0..=1.0).contains(&m.idle_pose_fraction) {
            return Err(ConfigError::Invalid(format!(
                "motion.idle_pose_fraction must be within [0, 1], got {}",
                m.idle_pose_fraction
            )));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

fn unit_gain(name: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be within (0, 1], got {value}"
        )))
    }
}

fn find_config_file() -> Option<PathBuf> {
    let mut it = std::env::args();
    while let Some(a) = it.next() {
        if a == "--config" {
            if let Some(v) = it.next() {
                return Some(PathBuf::from(v));
            }
        }
    }

    if let Ok(v) = std::env::var("GALLERY_CONFIG") {
        if !v.trim().is_empty() {
            return Some(PathBuf::from(v));
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("gallery.json");
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("gallery.json");
    if p.exists() {
        return Some(p);
    }

    None
}
