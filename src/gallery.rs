// gallery.rs — panel registry, focus targets and click picking

use crate::config::FocusConfig;
use crate::input::DeviceClass;
use glam::{Quat, Vec3};
use std::f32::consts::FRAC_PI_2;

pub type PanelId = u32;

/// Clickable canvas inside the frame, in panel-local units.
pub const HIT_SURFACE_SIZE: [f32; 2] = [1.9, 1.3];
pub const HIT_SURFACE_DEPTH: f32 = 0.07;

/// One wall-mounted panel. Title and description are i18n keys.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDescriptor {
    pub id: PanelId,
    pub position: Vec3,
    pub y_rotation: f32,
    pub title: String,
    pub description: String,
    pub accent_color: [f32; 3],
    pub image: Option<String>,
}

impl PanelDescriptor {
    /// Unit vector the panel faces, i.e. out of the wall into the corridor.
    pub fn normal(&self) -> Vec3 {
        Quat::from_rotation_y(self.y_rotation) * Vec3::Z
    }

    /// Camera position used while this panel is focused.
    pub fn focus_target(&self, focus: &FocusConfig, device: DeviceClass) -> Vec3 {
        let (distance, lift) = match device {
            DeviceClass::Desktop => (focus.desktop_distance, focus.desktop_lift),
            DeviceClass::Touch => (focus.touch_distance, focus.touch_lift),
        };
        self.position + self.normal() * distance + Vec3::Y * lift
    }

    /// Distance along `ray` to the clickable canvas, if the ray crosses it.
    pub fn hit(&self, ray: &Ray) -> Option<f32> {
        let normal = self.normal();
        let denom = ray.direction.dot(normal);
        // Only the front face is clickable.
        if denom >= -1e-6 {
            return None;
        }
        let center = self.position + normal * HIT_SURFACE_DEPTH;
        let t = (center - ray.origin).dot(normal) / denom;
        if t < 0.0 {
            return None;
        }

        let local = Quat::from_rotation_y(-self.y_rotation) * (ray.at(t) - center);
        let [w, h] = HIT_SURFACE_SIZE;
        if local.x.abs() <= w * 0.5 && local.y.abs() <= h * 0.5 {
            Some(t)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

pub struct Gallery {
    panels: Vec<PanelDescriptor>,
}

impl Gallery {
    pub fn new(panels: Vec<PanelDescriptor>) -> Self {
        Self { panels }
    }

    /// The six portfolio panels, three per wall, nearest the entrance first.
    pub fn portfolio() -> Self {
        let left = FRAC_PI_2;
        let right = -FRAC_PI_2;
        let entry = |id, x: f32, z: f32, y_rotation, topic: &str, color: u32, image: Option<&str>| {
            PanelDescriptor {
                id,
                position: Vec3::new(x, 1.8, z),
                y_rotation,
                title: format!("panel.{topic}.title"),
                description: format!("panel.{topic}.description"),
                accent_color: hex_rgb(color),
                image: image.map(str::to_string),
            }
        };

        Self::new(vec![
            entry(1, -2.75, 6.0, left, "about", 0x1a1a2e, Some("assets/images/about.jpeg")),
            entry(2, -2.75, 0.0, left, "projects", 0x16213e, Some("assets/images/projects.png")),
            entry(3, -2.75, -6.0, left, "education", 0x1a1a2e, Some("assets/images/education.png")),
            entry(4, 2.75, 6.0, right, "skills", 0x0f3460, Some("assets/images/skills.png")),
            entry(5, 2.75, 0.0, right, "experience", 0x16213e, Some("assets/images/experience.png")),
            entry(6, 2.75, -6.0, right, "contact", 0x1a1a2e, None),
        ])
    }

    pub fn panels(&self) -> &[PanelDescriptor] {
        &self.panels
    }

    pub fn get(&self, id: PanelId) -> Option<&PanelDescriptor> {
        self.panels.iter().find(|p| p.id == id)
    }

    /// Nearest panel whose canvas the ray hits.
    pub fn pick(&self, ray: &Ray) -> Option<PanelId> {
        self.panels
            .iter()
            .filter_map(|p| p.hit(ray).map(|t| (t, p.id)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }
}

/// sRGB hex to linear RGB.
pub fn hex_rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}
