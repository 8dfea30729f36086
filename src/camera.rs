// camera.rs — follow / focus camera with eased transitions between the two
//
// The rig is re-evaluated every frame from the current selection. Its own
// position is the integrator state; nothing else stores where the camera is.

use crate::config::CameraConfig;
use crate::gallery::{PanelId, Ray};
use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

/// Cadence the per-frame gains were tuned at.
pub const REFERENCE_FPS: f32 = 60.0;

/// Converts a per-reference-frame lerp gain into the factor for a `dt` step,
/// so that N short frames and one long frame cover the same fraction.
pub fn frame_gain(gain: f32, dt: f32) -> f32 {
    1.0 - (1.0 - gain.clamp(0.0, 1.0)).powf(dt.max(0.0) * REFERENCE_FPS)
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Following,
    EnteringFocus,
    FocusedOn,
    ExitingFocus,
}

/// Where the camera wants to be and what it wants to look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraGoal {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// Goal for the selected panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusGoal {
    pub panel: PanelId,
    pub goal: CameraGoal,
}

/// Camera pose handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraTransform {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }

    pub fn projection(fov_deg: f32, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(fov_deg.to_radians(), aspect.max(1e-3), 0.1, 100.0)
    }

    /// Ray through a point given in normalized device coordinates.
    pub fn ray_through(&self, ndc: Vec2, fov_deg: f32, aspect: f32) -> Ray {
        let inv = (Self::projection(fov_deg, aspect) * self.view()).inverse();
        let far = inv * ndc.extend(1.0).extend(1.0);
        let far = far.xyz() / far.w;
        Ray::new(self.position, far - self.position)
    }
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    pub mode: CameraMode,
    /// Transition clock; grows past 1 while a transition lingers.
    pub progress: f32,
    pub position: Vec3,
    /// Low-passed gaze used during transitions.
    pub smoothed_look_at: Vec3,
    /// Gaze applied this frame.
    pub look_at: Vec3,
    aimed_panel: Option<PanelId>,
}

impl CameraRig {
    pub fn new(position: Vec3, look_at: Vec3) -> Self {
        Self {
            mode: CameraMode::Following,
            progress: 0.0,
            position,
            smoothed_look_at: look_at,
            look_at,
            aimed_panel: None,
        }
    }

    pub fn transform(&self) -> CameraTransform {
        CameraTransform {
            position: self.position,
            look_at: self.look_at,
        }
    }

    pub fn aimed_panel(&self) -> Option<PanelId> {
        self.aimed_panel
    }

    /// Follow pose for a character at `position` facing `heading`.
    pub fn follow_goal(position: Vec3, heading: f32, cfg: &CameraConfig) -> CameraGoal {
        let offset = glam::Quat::from_rotation_y(heading) * Vec3::from(cfg.follow_offset);
        CameraGoal {
            position: position + offset,
            look_at: position + Vec3::Y * cfg.look_height,
        }
    }

    fn set_mode(&mut self, mode: CameraMode) {
        if self.mode != mode {
            log::debug!("camera {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// React to the selection seen this frame.
    fn retarget(&mut self, focus: Option<&FocusGoal>, follow: &CameraGoal) {
        match (focus, self.mode) {
            (Some(f), CameraMode::Following) => {
                self.progress = 0.0;
                self.smoothed_look_at = follow.look_at;
                self.aimed_panel = Some(f.panel);
                self.set_mode(CameraMode::EnteringFocus);
            }
            (Some(f), CameraMode::ExitingFocus) => {
                // Keep the current gaze so turning back does not snap.
                self.progress = 0.0;
                self.aimed_panel = Some(f.panel);
                self.set_mode(CameraMode::EnteringFocus);
            }
            (Some(f), CameraMode::FocusedOn) if self.aimed_panel != Some(f.panel) => {
                self.progress = 0.0;
                self.aimed_panel = Some(f.panel);
                self.set_mode(CameraMode::EnteringFocus);
            }
            (Some(f), CameraMode::EnteringFocus) => {
                // Mid-flight switch: keep the clock so speed stays continuous.
                self.aimed_panel = Some(f.panel);
            }
            (None, CameraMode::EnteringFocus | CameraMode::FocusedOn) => {
                // The clock carries on from the approach, so a close after a
                // full approach starts at the settled gain.
                self.aimed_panel = None;
                self.set_mode(CameraMode::ExitingFocus);
            }
            _ => {}
        }
    }

    fn blended_gain(&self, cfg: &CameraConfig) -> f32 {
        cfg.base_gain + cfg.eased_gain * ease_out_cubic(self.progress.min(1.0))
    }

    fn approach(&mut self, goal: &CameraGoal, cfg: &CameraConfig, dt: f32) {
        let gain = self.blended_gain(cfg);
        self.position = self.position.lerp(goal.position, frame_gain(gain, dt));
        self.smoothed_look_at = self
            .smoothed_look_at
            .lerp(goal.look_at, frame_gain(gain * cfg.look_gain_scale, dt));
        self.look_at = self.smoothed_look_at;
    }

    /// Advance one frame. `focus` is the selected panel's goal, if any;
    /// `follow` is the live follow goal for the character.
    pub fn update(
        &mut self,
        focus: Option<&FocusGoal>,
        follow: &CameraGoal,
        cfg: &CameraConfig,
        dt: f32,
    ) {
        if dt <= 0.0 {
            return;
        }
        self.retarget(focus, follow);

        match (self.mode, focus) {
            (CameraMode::EnteringFocus, Some(f)) => {
                self.progress += cfg.enter_rate * dt;
                self.approach(&f.goal, cfg, dt);
                if self.position.distance(f.goal.position) < cfg.arrive_epsilon {
                    self.smoothed_look_at = f.goal.look_at;
                    self.look_at = f.goal.look_at;
                    self.set_mode(CameraMode::FocusedOn);
                }
            }
            (CameraMode::FocusedOn, Some(f)) => {
                self.position = self
                    .position
                    .lerp(f.goal.position, frame_gain(cfg.focused_gain, dt));
                self.smoothed_look_at = f.goal.look_at;
                self.look_at = f.goal.look_at;
            }
            (CameraMode::ExitingFocus, _) => {
                self.progress += cfg.exit_rate * dt;
                self.approach(follow, cfg, dt);
                let distance = self.position.distance(follow.position);
                if distance < cfg.return_epsilon && self.progress > 1.0 {
                    self.set_mode(CameraMode::Following);
                }
            }
            _ => {
                self.position = self
                    .position
                    .lerp(follow.position, frame_gain(cfg.follow_gain, dt));
                self.position.x = self.position.x.clamp(-cfg.lateral_limit, cfg.lateral_limit);
                self.position.z = self.position.z.clamp(-cfg.depth_limit, cfg.depth_limit);
                self.smoothed_look_at = follow.look_at;
                self.look_at = follow.look_at;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn cfg() -> CameraConfig {
        CameraConfig::default()
    }

    fn follow() -> CameraGoal {
        CameraRig::follow_goal(Vec3::new(0.0, 0.0, 10.0), 0.0, &cfg())
    }

    fn panel(id: PanelId, at: Vec3, target: Vec3) -> FocusGoal {
        FocusGoal {
            panel: id,
            goal: CameraGoal {
                position: target,
                look_at: at,
            },
        }
    }

    fn first() -> FocusGoal {
        panel(1, Vec3::new(-2.75, 1.8, 6.0), Vec3::new(-0.95, 1.8, 6.0))
    }

    fn second() -> FocusGoal {
        panel(4, Vec3::new(2.75, 1.8, 6.0), Vec3::new(0.95, 1.8, 6.0))
    }

    fn settled_rig() -> CameraRig {
        let f = follow();
        let mut rig = CameraRig::new(f.position, f.look_at);
        rig.update(None, &f, &cfg(), DT);
        rig
    }

    #[test]
    fn frame_gain_matches_per_frame_gain_at_reference_rate() {
        assert!((frame_gain(0.08, 1.0 / 60.0) - 0.08).abs() < 1e-5);
        // Two half frames cover the same ground as one full frame.
        let half = frame_gain(0.08, 1.0 / 120.0);
        let two_halves = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((two_halves - 0.08).abs() < 1e-5);
        assert_eq!(frame_gain(0.5, 0.0), 0.0);
    }

    #[test]
    fn ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_cubic(3.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn follow_goal_sits_behind_and_above() {
        let g = CameraRig::follow_goal(Vec3::ZERO, 0.0, &cfg());
        assert!(g.position.distance(Vec3::new(0.0, 1.5, 3.0)) < 1e-5);
        assert!(g.look_at.distance(Vec3::new(0.0, 0.2, 0.0)) < 1e-5);

        let turned = CameraRig::follow_goal(Vec3::ZERO, std::f32::consts::FRAC_PI_2, &cfg());
        assert!(turned.position.distance(Vec3::new(3.0, 1.5, 0.0)) < 1e-4);
    }

    #[test]
    fn following_is_clamped_inside_the_walls() {
        let mut rig = CameraRig::new(Vec3::new(0.0, 2.0, 8.0), Vec3::ZERO);
        let far = CameraGoal {
            position: Vec3::new(10.0, 1.5, 30.0),
            look_at: Vec3::ZERO,
        };
        for _ in 0..200 {
            rig.update(None, &far, &cfg(), DT);
        }
        assert_eq!(rig.position.x, 2.5);
        assert_eq!(rig.position.z, 13.0);
        assert_eq!(rig.mode, CameraMode::Following);
    }

    #[test]
    fn selecting_starts_entering_focus() {
        let mut rig = settled_rig();
        rig.update(Some(&first()), &follow(), &cfg(), DT);
        assert_eq!(rig.mode, CameraMode::EnteringFocus);
        assert!(rig.progress > 0.0);
        assert_eq!(rig.aimed_panel(), Some(1));
    }

    #[test]
    fn entering_focus_arrives_within_bounded_steps() {
        let mut rig = settled_rig();
        let target = first();
        let mut last = rig.position.distance(target.goal.position);
        let mut steps = 0;
        while rig.mode != CameraMode::FocusedOn {
            rig.update(Some(&target), &follow(), &cfg(), DT);
            let d = rig.position.distance(target.goal.position);
            assert!(d < last, "distance must shrink every frame");
            last = d;
            steps += 1;
            assert!(steps < 5_000, "never arrived");
        }
        assert!(last < cfg().arrive_epsilon);
        assert_eq!(rig.look_at, target.goal.look_at);
    }

    #[test]
    fn arrival_does_not_depend_on_frame_rate() {
        for dt in [1.0 / 30.0, 1.0 / 144.0, 0.25] {
            let mut rig = settled_rig();
            let mut steps = 0;
            while rig.mode != CameraMode::FocusedOn {
                rig.update(Some(&first()), &follow(), &cfg(), dt);
                steps += 1;
                assert!(steps < 50_000);
            }
        }
    }

    #[test]
    fn gaze_lags_behind_position_early_on() {
        let mut rig = settled_rig();
        let start_look = rig.look_at;
        rig.update(Some(&first()), &follow(), &cfg(), DT);
        // One frame in, the gaze has moved only a little toward the panel.
        assert!(rig.look_at.distance(start_look) > 0.0);
        assert!(rig.look_at.distance(first().goal.look_at) > 1.0);
    }

    #[test]
    fn focus_then_close_returns_to_the_live_follow_goal() {
        let mut rig = settled_rig();
        let f = follow();
        while rig.mode != CameraMode::FocusedOn {
            rig.update(Some(&first()), &f, &cfg(), DT);
        }

        rig.update(None, &f, &cfg(), DT);
        assert_eq!(rig.mode, CameraMode::ExitingFocus);

        let mut steps = 0;
        while rig.mode != CameraMode::Following {
            rig.update(None, &f, &cfg(), DT);
            steps += 1;
            assert!(steps < 10_000);
        }
        assert!(rig.progress > 1.0);
        assert!(rig.position.distance(f.position) < cfg().return_epsilon);
    }

    #[test]
    fn exit_waits_for_the_clock_even_when_close() {
        let f = follow();
        let mut rig = CameraRig::new(f.position, f.look_at);
        rig.mode = CameraMode::FocusedOn;
        rig.aimed_panel = Some(1);
        rig.progress = 0.5;
        // Already at the follow goal: the remaining half of the clock still gates the exit.
        rig.update(None, &f, &cfg(), DT);
        assert_eq!(rig.mode, CameraMode::ExitingFocus);
        assert!(rig.progress > 0.5);
        for _ in 0..100 {
            rig.update(None, &f, &cfg(), DT);
        }
        assert_eq!(rig.mode, CameraMode::ExitingFocus);
        for _ in 0..100 {
            rig.update(None, &f, &cfg(), DT);
        }
        assert_eq!(rig.mode, CameraMode::Following);
    }

    #[test]
    fn closing_right_after_arrival_hands_back_in_about_two_seconds() {
        let mut rig = settled_rig();
        let f = follow();
        while rig.mode != CameraMode::FocusedOn {
            rig.update(Some(&first()), &f, &cfg(), DT);
        }
        let arrival_progress = rig.progress;
        assert!(arrival_progress > 0.5);

        rig.update(None, &f, &cfg(), DT);
        assert_eq!(rig.mode, CameraMode::ExitingFocus);
        assert!(rig.progress > arrival_progress);

        let mut steps = 1;
        while rig.mode != CameraMode::Following {
            rig.update(None, &f, &cfg(), DT);
            steps += 1;
            assert!(steps < 1_000);
        }
        assert!((60..=150).contains(&steps), "exit took {steps} frames");
    }

    #[test]
    fn switching_panels_mid_flight_keeps_entering() {
        let mut rig = settled_rig();
        rig.update(Some(&first()), &follow(), &cfg(), DT);
        let progress = rig.progress;
        assert!(progress > 0.0);

        rig.update(Some(&second()), &follow(), &cfg(), DT);
        assert_eq!(rig.mode, CameraMode::EnteringFocus);
        assert_eq!(rig.aimed_panel(), Some(4));
        assert!(rig.progress > progress);

        let mut steps = 0;
        while rig.mode != CameraMode::FocusedOn {
            rig.update(Some(&second()), &follow(), &cfg(), DT);
            steps += 1;
            assert!(steps < 5_000);
        }
        assert!(rig.position.distance(second().goal.position) < cfg().arrive_epsilon);
    }

    #[test]
    fn switching_from_focused_restarts_the_transition() {
        let mut rig = settled_rig();
        while rig.mode != CameraMode::FocusedOn {
            rig.update(Some(&first()), &follow(), &cfg(), DT);
        }
        let before = rig.position;
        rig.update(Some(&second()), &follow(), &cfg(), DT);
        assert_eq!(rig.mode, CameraMode::EnteringFocus);
        assert!(rig.progress < 0.01);
        // Starts slow: no single-frame jump toward the new panel.
        assert!(rig.position.distance(before) < 0.05);
    }

    #[test]
    fn reselecting_while_exiting_keeps_the_gaze() {
        let mut rig = settled_rig();
        while rig.mode != CameraMode::FocusedOn {
            rig.update(Some(&first()), &follow(), &cfg(), DT);
        }
        for _ in 0..10 {
            rig.update(None, &follow(), &cfg(), DT);
        }
        let gaze = rig.look_at;
        rig.update(Some(&first()), &follow(), &cfg(), DT);
        assert_eq!(rig.mode, CameraMode::EnteringFocus);
        assert!(rig.look_at.distance(gaze) < 0.1);
    }

    #[test]
    fn no_selection_never_leaves_focus_modes_active() {
        let mut rig = settled_rig();
        let selections = [
            Some(first()),
            Some(first()),
            None,
            Some(second()),
            None,
            None,
            Some(first()),
            Some(second()),
            None,
        ];
        for sel in selections.iter().cycle().take(400) {
            rig.update(sel.as_ref(), &follow(), &cfg(), 0.05);
            if sel.is_none() {
                assert!(matches!(
                    rig.mode,
                    CameraMode::Following | CameraMode::ExitingFocus
                ));
            }
        }
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let mut rig = settled_rig();
        let before = rig.clone();
        rig.update(Some(&first()), &follow(), &cfg(), 0.0);
        assert_eq!(rig.mode, before.mode);
        assert_eq!(rig.position, before.position);
    }

    #[test]
    fn center_ray_points_at_the_look_target() {
        let t = CameraTransform {
            position: Vec3::new(0.0, 1.8, 0.0),
            look_at: Vec3::new(-2.75, 1.8, 0.0),
        };
        let ray = t.ray_through(Vec2::ZERO, 60.0, 16.0 / 9.0);
        assert!(ray.direction.distance(-Vec3::X) < 1e-3);
    }
}
