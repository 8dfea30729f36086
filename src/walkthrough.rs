// walkthrough.rs — one frame of game logic: selection -> camera -> character
//
// `step` only touches the character and the camera rig; pushing the result
// into GPU buffers is the renderer's job.

use crate::camera::{CameraGoal, CameraMode, CameraRig, CameraTransform, FocusGoal};
use crate::character::{CharacterState, TurnDirection};
use crate::config::GalleryConfig;
use crate::gallery::{Gallery, PanelDescriptor};
use crate::gallery_state::GalleryState;
use crate::input::{ControlVector, DeviceClass};
use glam::Vec3;

/// World transform of the character's visual root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterTransform {
    pub position: Vec3,
    pub heading: f32,
    pub pitch: f32,
    pub bob: f32,
    pub tilt: f32,
}

/// What the animation layer needs to pick and pace the locomotion clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationCue {
    pub is_moving: bool,
    pub is_running: bool,
    pub turn_direction: TurnDirection,
    pub clip_time_scale: f32,
    pub clip_phase: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutput {
    pub character: CharacterTransform,
    pub camera: CameraTransform,
    pub animation: AnimationCue,
}

pub struct Walkthrough {
    pub character: CharacterState,
    pub camera: CameraRig,
    gallery: Gallery,
    config: GalleryConfig,
}

impl Walkthrough {
    pub fn new(gallery: Gallery, config: GalleryConfig) -> Self {
        let character = CharacterState::new(Vec3::from(config.motion.start_position));
        let follow = CameraRig::follow_goal(character.position, character.heading, &config.camera);
        let camera = CameraRig::new(Vec3::from(config.camera.start_position), follow.look_at);
        Self {
            character,
            camera,
            gallery,
            config,
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn focus_goal(&self, panel: &PanelDescriptor, device: DeviceClass) -> FocusGoal {
        FocusGoal {
            panel: panel.id,
            goal: CameraGoal {
                position: panel.focus_target(&self.config.focus, device),
                look_at: panel.position,
            },
        }
    }

    pub fn follow_goal(&self) -> CameraGoal {
        CameraRig::follow_goal(
            self.character.position,
            self.character.heading,
            &self.config.camera,
        )
    }

    pub fn step(&mut self, state: &GalleryState, controls: &ControlVector, dt: f32) -> FrameOutput {
        let focus = state
            .selection()
            .panel()
            .and_then(|id| self.gallery.get(id))
            .map(|panel| self.focus_goal(panel, state.device));
        let follow = self.follow_goal();

        self.camera
            .update(focus.as_ref(), &follow, &self.config.camera, dt);

        // The cat only listens while the camera is following it.
        let drive = if self.camera.mode == CameraMode::Following && state.is_interactive() {
            *controls
        } else {
            ControlVector::default()
        };
        self.character.update(&drive, &self.config.motion, dt);

        self.output()
    }

    pub fn output(&self) -> FrameOutput {
        let c = &self.character;
        let (pitch, bob) = c.idle_offsets();
        FrameOutput {
            character: CharacterTransform {
                position: c.position,
                heading: c.heading,
                pitch,
                bob,
                tilt: c.tilt,
            },
            camera: self.camera.transform(),
            animation: AnimationCue {
                is_moving: c.is_moving,
                is_running: c.is_running,
                turn_direction: c.turn_direction,
                clip_time_scale: c.clip.time_scale,
                clip_phase: c.clip.phase(),
            },
        }
    }
}
