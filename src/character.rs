// character.rs — cat locomotion: heading, speed, corridor bounds and idle flavor

use crate::camera::frame_gain;
use crate::config::MotionConfig;
use crate::input::ControlVector;
use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnDirection {
    Left,
    #[default]
    Straight,
    Right,
}

impl TurnDirection {
    fn from_controls(c: &ControlVector) -> Self {
        if c.left {
            TurnDirection::Left
        } else if c.right {
            TurnDirection::Right
        } else {
            TurnDirection::Straight
        }
    }

    /// +1 left, -1 right; also the sign of the heading change.
    pub fn sign(self) -> f32 {
        match self {
            TurnDirection::Left => 1.0,
            TurnDirection::Straight => 0.0,
            TurnDirection::Right => -1.0,
        }
    }
}

/// Playback state of the looping locomotion clip.
///
/// The model and its clips live in the asset runtime; this only tracks the
/// playhead so the idle pose can be eased to a fixed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionClip {
    pub duration: f32,
    pub time: f32,
    pub time_scale: f32,
}

impl LocomotionClip {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            time: 0.0,
            time_scale: 0.0,
        }
    }

    fn advance(&mut self, moving: bool, running: bool, motion: &MotionConfig, dt: f32) {
        if moving {
            self.time_scale = if running {
                motion.run_clip_speed
            } else {
                motion.walk_clip_speed
            };
            self.time = (self.time + dt * self.time_scale).rem_euclid(self.duration.max(f32::EPSILON));
            return;
        }

        self.time_scale = 0.0;
        let target = self.duration * motion.idle_pose_fraction;
        let diff = target - self.time;
        if diff.abs() > 0.01 {
            self.time += diff * frame_gain(motion.idle_pose_gain, dt);
        } else {
            self.time = target;
        }
    }

    /// Playhead as a fraction of the clip.
    pub fn phase(&self) -> f32 {
        if self.duration > 0.0 {
            self.time / self.duration
        } else {
            0.0
        }
    }
}

impl Default for LocomotionClip {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterState {
    pub position: Vec3,
    /// Radians around +Y. Unbounded.
    pub heading: f32,
    pub is_moving: bool,
    pub is_running: bool,
    pub turn_direction: TurnDirection,
    /// Roll while turning, eased toward `turn_direction`.
    pub tilt: f32,
    /// Seconds spent standing still; zero while moving.
    pub idle_time: f32,
    pub clip: LocomotionClip,
}

impl CharacterState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            heading: 0.0,
            is_moving: false,
            is_running: false,
            turn_direction: TurnDirection::Straight,
            tilt: 0.0,
            idle_time: 0.0,
            clip: LocomotionClip::default(),
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.heading)
    }

    /// Idle breathing: (pitch, vertical bob).
    pub fn idle_offsets(&self) -> (f32, f32) {
        if self.is_moving {
            return (0.0, 0.0);
        }
        let t = self.idle_time;
        ((t * 2.0).sin() * 0.02, (t * 3.0).sin() * 0.005)
    }

    /// One frame of motion. Pass `ControlVector::default()` to let the cat stand.
    pub fn update(&mut self, controls: &ControlVector, motion: &MotionConfig, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        self.is_moving = controls.is_moving();
        self.is_running = controls.run;
        self.turn_direction = TurnDirection::from_controls(controls);

        if controls.left {
            self.heading += motion.turn_speed * dt;
        }
        if controls.right {
            self.heading -= motion.turn_speed * dt;
        }

        if controls.forward || controls.backward {
            let speed = if controls.run {
                motion.run_speed
            } else {
                motion.walk_speed
            };
            let local = if controls.forward { Vec3::NEG_Z } else { Vec3::Z };
            let step = self.rotation() * local * (speed * dt);
            let next = self.position + step;

            // Per-axis clamp: pushing into one wall still slides along the other axis.
            self.position.x = next.x.clamp(-motion.lateral_limit, motion.lateral_limit);
            self.position.z = next.z.clamp(-motion.depth_limit, motion.depth_limit);
        }
        self.position.y = 0.0;

        let target_tilt = self.turn_direction.sign() * motion.tilt_amount;
        self.tilt += (target_tilt - self.tilt) * frame_gain(motion.tilt_gain, dt);

        if self.is_moving {
            self.idle_time = 0.0;
        } else {
            self.idle_time += dt;
        }

        self.clip
            .advance(self.is_moving, self.is_running, motion, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn forward() -> ControlVector {
        ControlVector {
            forward: true,
            ..Default::default()
        }
    }

    #[test]
    fn walking_forward_for_three_seconds() {
        let motion = MotionConfig::default();
        let mut cat = CharacterState::new(Vec3::new(0.0, 0.0, 10.0));
        for _ in 0..180 {
            cat.update(&forward(), &motion, DT);
        }
        let expected = (10.0 - motion.walk_speed * 3.0).max(-motion.depth_limit);
        assert!((cat.position.z - expected).abs() < 1e-3, "z = {}", cat.position.z);
        assert!(cat.position.x.abs() < 1e-5);
    }

    #[test]
    fn walking_into_the_back_wall_stops_at_the_limit() {
        let motion = MotionConfig::default();
        let mut cat = CharacterState::new(Vec3::new(0.0, 0.0, 10.0));
        let run = ControlVector {
            forward: true,
            run: true,
            ..Default::default()
        };
        for _ in 0..600 {
            cat.update(&run, &motion, DT);
        }
        assert_eq!(cat.position.z, -motion.depth_limit);
    }

    #[test]
    fn slides_along_the_side_wall() {
        let motion = MotionConfig::default();
        let mut cat = CharacterState::new(Vec3::new(1.7, 0.0, 0.0));
        // Face diagonally into the right wall while walking down the corridor.
        cat.heading = -std::f32::consts::FRAC_PI_4;
        let z0 = cat.position.z;
        for _ in 0..60 {
            cat.update(&forward(), &motion, DT);
        }
        assert_eq!(cat.position.x, motion.lateral_limit);
        assert!(cat.position.z < z0 - 1.0);
    }

    #[test]
    fn backward_moves_opposite_to_forward() {
        let motion = MotionConfig::default();
        let mut cat = CharacterState::new(Vec3::ZERO);
        let back = ControlVector {
            backward: true,
            ..Default::default()
        };
        cat.update(&back, &motion, 0.5);
        assert!((cat.position.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn turning_alone_counts_as_moving() {
        let motion = MotionConfig::default();
        let mut cat = CharacterState::new(Vec3::ZERO);
        let left = ControlVector {
            left: true,
            ..Default::default()
        };
        cat.update(&left, &motion, 0.5);
        assert!(cat.is_moving);
        assert_eq!(cat.turn_direction, TurnDirection::Left);
        assert!((cat.heading - 1.5).abs() < 1e-5);
        assert_eq!(cat.position, Vec3::ZERO);
        assert!(cat.tilt > 0.0);
    }

    #[test]
    fn idle_timer_resets_when_movement_starts() {
        let motion = MotionConfig::default();
        let mut cat = CharacterState::new(Vec3::ZERO);
        for _ in 0..30 {
            cat.update(&ControlVector::default(), &motion, DT);
        }
        assert!(cat.idle_time > 0.4);
        let (pitch, bob) = cat.idle_offsets();
        assert!(pitch != 0.0 && bob != 0.0);

        cat.update(&forward(), &motion, DT);
        assert_eq!(cat.idle_time, 0.0);
        assert_eq!(cat.idle_offsets(), (0.0, 0.0));

        cat.update(&ControlVector::default(), &motion, DT);
        assert!((cat.idle_time - DT).abs() < 1e-6);
    }

    #[test]
    fn idle_clip_settles_on_the_rest_pose() {
        let motion = MotionConfig::default();
        let mut cat = CharacterState::new(Vec3::ZERO);
        cat.update(&forward(), &motion, 0.1);
        assert_eq!(cat.clip.time_scale, motion.walk_clip_speed);
        for _ in 0..600 {
            cat.update(&ControlVector::default(), &motion, DT);
        }
        assert_eq!(cat.clip.time_scale, 0.0);
        assert_eq!(cat.clip.time, cat.clip.duration * motion.idle_pose_fraction);
    }

    #[test]
    fn vertical_position_is_pinned() {
        let motion = MotionConfig::default();
        let mut cat = CharacterState::new(Vec3::new(0.0, 3.0, 0.0));
        cat.update(&ControlVector::default(), &motion, DT);
        assert_eq!(cat.position.y, 0.0);
    }

    fn controls() -> impl Strategy<Value = ControlVector> {
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
            |(forward, backward, left, right, run)| ControlVector {
                forward,
                backward,
                left,
                right,
                run,
            },
        )
    }

    proptest! {
        #[test]
        fn position_never_leaves_the_corridor(
            steps in prop::collection::vec((controls(), 0.0f32..0.5), 1..200)
        ) {
            let motion = MotionConfig::default();
            let mut cat = CharacterState::new(Vec3::new(0.0, 0.0, 10.0));
            for (c, dt) in steps {
                cat.update(&c, &motion, dt);
                prop_assert!(cat.position.x.abs() <= motion.lateral_limit);
                prop_assert!(cat.position.z.abs() <= motion.depth_limit);
                prop_assert_eq!(cat.position.y, 0.0);
            }
        }
    }
}
