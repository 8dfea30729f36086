// input.rs — keyboard + virtual joystick -> one control vector per frame

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, VirtualKeyCode};

/// Normalized movement intent for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlVector {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub run: bool,
}

impl ControlVector {
    /// Touch state only counts on touch devices.
    pub fn combine(keyboard: ControlVector, touch: &TouchControls, device: DeviceClass) -> Self {
        let touch_on = device == DeviceClass::Touch;
        Self {
            forward: keyboard.forward || (touch_on && touch.forward),
            backward: keyboard.backward || (touch_on && touch.backward),
            left: keyboard.left || (touch_on && touch.left),
            right: keyboard.right || (touch_on && touch.right),
            run: keyboard.run || (touch_on && touch.run),
        }
    }

    pub fn is_moving(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Run,
}

fn action_for(key: VirtualKeyCode) -> Option<Action> {
    match key {
        VirtualKeyCode::Up | VirtualKeyCode::W => Some(Action::Forward),
        VirtualKeyCode::Down | VirtualKeyCode::S => Some(Action::Backward),
        VirtualKeyCode::Left | VirtualKeyCode::A => Some(Action::Left),
        VirtualKeyCode::Right | VirtualKeyCode::D => Some(Action::Right),
        VirtualKeyCode::LShift | VirtualKeyCode::RShift => Some(Action::Run),
        _ => None,
    }
}

/// Set of currently held keys.
#[derive(Debug, Default)]
pub struct KeyboardState {
    held: HashSet<VirtualKeyCode>,
}

impl KeyboardState {
    pub fn handle(&mut self, key: VirtualKeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.held.insert(key);
            }
            ElementState::Released => {
                self.held.remove(&key);
            }
        }
    }

    /// Window lost focus: key-up events will never arrive.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn snapshot(&self) -> ControlVector {
        let mut c = ControlVector::default();
        for action in self.held.iter().filter_map(|k| action_for(*k)) {
            match action {
                Action::Forward => c.forward = true,
                Action::Backward => c.backward = true,
                Action::Left => c.left = true,
                Action::Right => c.right = true,
                Action::Run => c.run = true,
            }
        }
        c
    }
}

/// Directional flags written by the virtual joystick plus the latched run button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchControls {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub run: bool,
}

impl TouchControls {
    /// Clears the four directions; `run` is a toggle and is left alone.
    pub fn release(&mut self) {
        self.forward = false;
        self.backward = false;
        self.left = false;
        self.right = false;
    }

    pub fn toggle_run(&mut self) {
        self.run = !self.run;
    }
}

/// On-screen joystick. Positions are logical pixels, y grows downward.
#[derive(Debug, Clone)]
pub struct VirtualJoystick {
    pub center: Vec2,
    pub radius: f32,
    pub threshold: f32,
    knob: Vec2,
    finger: Option<u64>,
}

impl VirtualJoystick {
    const KNOB_MARGIN: f32 = 15.0;

    pub fn new(radius: f32, threshold: f32) -> Self {
        Self {
            center: Vec2::ZERO,
            radius,
            threshold,
            knob: Vec2::ZERO,
            finger: None,
        }
    }

    /// Knob displacement from the center, for drawing.
    pub fn knob(&self) -> Vec2 {
        self.knob
    }

    pub fn is_dragging(&self) -> bool {
        self.finger.is_some()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.distance(self.center) <= self.radius
    }

    /// Returns true if the touch was claimed by the joystick.
    pub fn touch_start(&mut self, finger: u64, point: Vec2, controls: &mut TouchControls) -> bool {
        if self.finger.is_some() || !self.contains(point) {
            return false;
        }
        self.finger = Some(finger);
        self.drag(point, controls);
        true
    }

    pub fn touch_move(&mut self, finger: u64, point: Vec2, controls: &mut TouchControls) -> bool {
        if self.finger != Some(finger) {
            return false;
        }
        self.drag(point, controls);
        true
    }

    pub fn touch_end(&mut self, finger: u64, controls: &mut TouchControls) -> bool {
        if self.finger != Some(finger) {
            return false;
        }
        self.reset(controls);
        true
    }

    /// Hiding the stick drops the finger it holds and recenters the knob.
    pub fn set_visible(&mut self, visible: bool, controls: &mut TouchControls) {
        if !visible && (self.finger.is_some() || self.knob != Vec2::ZERO) {
            self.reset(controls);
        }
    }

    pub fn reset(&mut self, controls: &mut TouchControls) {
        self.finger = None;
        self.knob = Vec2::ZERO;
        controls.release();
    }

    fn drag(&mut self, point: Vec2, controls: &mut TouchControls) {
        let mut delta = point - self.center;
        let max_radius = (self.radius - Self::KNOB_MARGIN).max(0.0);
        let distance = delta.length();
        if distance > max_radius && distance > 0.0 {
            delta = delta / distance * max_radius;
        }
        self.knob = delta;

        controls.forward = delta.y < -self.threshold;
        controls.backward = delta.y > self.threshold;
        controls.left = delta.x < -self.threshold;
        controls.right = delta.x > self.threshold;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Touch,
}

/// What the display can tell us about the device.
pub trait DisplayProbe {
    fn is_touch_capable(&self) -> bool;
    /// Logical pixels.
    fn viewport_width(&self) -> u32;
}

impl DeviceClass {
    pub fn classify(probe: &impl DisplayProbe, small_screen_width: u32) -> Self {
        if probe.is_touch_capable() || probe.viewport_width() < small_screen_width {
            DeviceClass::Touch
        } else {
            DeviceClass::Desktop
        }
    }
}

/// Probe backed by the live window. winit has no touch-capability query, so
/// the first touch event latches `touch_seen`.
#[derive(Debug, Clone, Default)]
pub struct WindowProbe {
    pub touch_seen: bool,
    pub logical_width: u32,
    pub forced: Option<bool>,
}

impl DisplayProbe for WindowProbe {
    fn is_touch_capable(&self) -> bool {
        self.forced.unwrap_or(self.touch_seen)
    }

    fn viewport_width(&self) -> u32 {
        self.logical_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDisplay {
        touch: bool,
        width: u32,
    }

    impl DisplayProbe for FakeDisplay {
        fn is_touch_capable(&self) -> bool {
            self.touch
        }
        fn viewport_width(&self) -> u32 {
            self.width
        }
    }

    #[test]
    fn classify_uses_touch_or_small_width() {
        let wide = FakeDisplay { touch: false, width: 1280 };
        assert_eq!(DeviceClass::classify(&wide, 768), DeviceClass::Desktop);
        let narrow = FakeDisplay { touch: false, width: 767 };
        assert_eq!(DeviceClass::classify(&narrow, 768), DeviceClass::Touch);
        let tablet = FakeDisplay { touch: true, width: 2048 };
        assert_eq!(DeviceClass::classify(&tablet, 768), DeviceClass::Touch);
    }

    #[test]
    fn forced_probe_overrides_detection() {
        let probe = WindowProbe {
            touch_seen: false,
            logical_width: 1920,
            forced: Some(true),
        };
        assert_eq!(DeviceClass::classify(&probe, 768), DeviceClass::Touch);
    }

    #[test]
    fn keyboard_maps_arrows_and_wasd() {
        let mut kb = KeyboardState::default();
        kb.handle(VirtualKeyCode::W, ElementState::Pressed);
        kb.handle(VirtualKeyCode::Left, ElementState::Pressed);
        kb.handle(VirtualKeyCode::RShift, ElementState::Pressed);
        kb.handle(VirtualKeyCode::Q, ElementState::Pressed);
        let c = kb.snapshot();
        assert!(c.forward && c.left && c.run);
        assert!(!c.backward && !c.right);

        kb.handle(VirtualKeyCode::W, ElementState::Released);
        assert!(!kb.snapshot().forward);
        kb.release_all();
        assert_eq!(kb.snapshot(), ControlVector::default());
    }

    #[test]
    fn touch_is_ignored_on_desktop() {
        let touch = TouchControls {
            forward: true,
            run: true,
            ..Default::default()
        };
        let keyboard = ControlVector {
            left: true,
            ..Default::default()
        };
        let desktop = ControlVector::combine(keyboard, &touch, DeviceClass::Desktop);
        assert_eq!(desktop, keyboard);

        let mobile = ControlVector::combine(keyboard, &touch, DeviceClass::Touch);
        assert!(mobile.forward && mobile.left && mobile.run);
    }

    #[test]
    fn joystick_dead_zone_and_clamp() {
        let mut stick = VirtualJoystick::new(56.0, 20.0);
        stick.center = Vec2::new(100.0, 500.0);
        let mut controls = TouchControls::default();

        assert!(stick.touch_start(7, Vec2::new(110.0, 490.0), &mut controls));
        assert_eq!(controls, TouchControls::default());

        stick.touch_move(7, Vec2::new(100.0, 300.0), &mut controls);
        assert!(controls.forward && !controls.backward);
        assert!((stick.knob().length() - 41.0).abs() < 1e-4);

        stick.touch_move(7, Vec2::new(140.0, 540.0), &mut controls);
        assert!(controls.right && controls.backward);

        // A second finger does not steal the stick.
        assert!(!stick.touch_move(8, Vec2::new(60.0, 500.0), &mut controls));
        assert!(stick.touch_end(7, &mut controls));
        assert_eq!(stick.knob(), Vec2::ZERO);
        assert!(!controls.right && !controls.backward);
    }

    #[test]
    fn touches_outside_the_stick_are_not_claimed() {
        let mut stick = VirtualJoystick::new(56.0, 20.0);
        stick.center = Vec2::new(100.0, 500.0);
        let mut controls = TouchControls::default();
        assert!(!stick.touch_start(1, Vec2::new(400.0, 100.0), &mut controls));
        assert!(!stick.is_dragging());
    }

    #[test]
    fn hiding_the_stick_lets_go_of_the_finger() {
        let mut stick = VirtualJoystick::new(56.0, 20.0);
        stick.center = Vec2::new(100.0, 500.0);
        let mut controls = TouchControls::default();
        assert!(stick.touch_start(3, Vec2::new(100.0, 460.0), &mut controls));
        assert!(controls.forward);

        stick.set_visible(false, &mut controls);
        assert!(!stick.is_dragging());
        assert_eq!(stick.knob(), Vec2::ZERO);
        assert!(!controls.forward);
        // Later moves of the same finger no longer steer.
        assert!(!stick.touch_move(3, Vec2::new(100.0, 300.0), &mut controls));
        assert!(!controls.forward);

        stick.set_visible(true, &mut controls);
        assert!(stick.touch_start(4, Vec2::new(100.0, 540.0), &mut controls));
        assert!(controls.backward);
    }
}
