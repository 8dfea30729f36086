// gallery_state.rs — the one piece of state shared between UI handlers and the frame update
//
// Writers (click/tap handlers, Escape, device detection) take `&mut GalleryState`;
// the frame update only ever reads it.

use crate::gallery::PanelId;
use crate::input::{DeviceClass, TouchControls};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Selected(PanelId),
}

impl Selection {
    pub fn panel(self) -> Option<PanelId> {
        match self {
            Selection::None => None,
            Selection::Selected(id) => Some(id),
        }
    }

    pub fn is_none(self) -> bool {
        self == Selection::None
    }
}

/// Overlay shown before the visitor can walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlay {
    Splash { remaining: f32 },
    Intro,
    Hidden,
}

#[derive(Debug, Clone)]
pub struct GalleryState {
    selection: Selection,
    pub device: DeviceClass,
    pub touch: TouchControls,
    pub overlay: Overlay,
    muted: bool,
}

impl GalleryState {
    pub fn new(device: DeviceClass, splash_seconds: f32) -> Self {
        let overlay = if splash_seconds > 0.0 {
            Overlay::Splash {
                remaining: splash_seconds,
            }
        } else {
            Overlay::Intro
        };
        Self {
            selection: Selection::None,
            device,
            touch: TouchControls::default(),
            overlay,
            muted: false,
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Click on a panel: closes it if already open, otherwise switches to it.
    pub fn toggle(&mut self, id: PanelId) {
        self.selection = if self.selection == Selection::Selected(id) {
            Selection::None
        } else {
            Selection::Selected(id)
        };
        // The joystick is hidden while a panel is open; drop whatever it held.
        self.touch.release();
        log::info!("selection -> {:?}", self.selection);
    }

    /// Escape / tap outside the content pane.
    pub fn clear(&mut self) {
        if self.selection != Selection::None {
            self.selection = Selection::None;
            log::info!("selection cleared");
        }
    }

    pub fn set_device(&mut self, device: DeviceClass) {
        if self.device != device {
            log::info!("device class {:?} -> {:?}", self.device, device);
            self.device = device;
        }
    }

    /// True once splash and intro are gone and the visitor can walk and click.
    pub fn is_interactive(&self) -> bool {
        self.overlay == Overlay::Hidden
    }

    pub fn tick_overlay(&mut self, dt: f32) {
        if let Overlay::Splash { remaining } = self.overlay {
            let remaining = remaining - dt;
            self.overlay = if remaining <= 0.0 {
                Overlay::Intro
            } else {
                Overlay::Splash { remaining }
            };
        }
    }

    /// The intro's Enter button.
    pub fn enter(&mut self) {
        if self.overlay == Overlay::Intro {
            self.overlay = Overlay::Hidden;
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        log::info!("music {}", if self.muted { "muted" } else { "unmuted" });
    }
}
