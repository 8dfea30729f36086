// renderer.rs — wgpu scene pass (corridor + cat) with the egui overlay on top

use crate::camera::CameraTransform;
use crate::gallery::Gallery;
use crate::mesh::{self, Mesh, Vertex};
use crate::walkthrough::FrameOutput;
use glam::{Mat4, Quat, Vec3};
use std::path::{Path, PathBuf};
use wgpu::util::DeviceExt;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const FOG_FAR: f32 = 30.0;
const CAT_LIGHT_RANGE: f32 = 6.0;
const GAIT_BOUNCE: f32 = 0.03;

const VERTEX_ATTRIBS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBS,
    }
}

/// Tries the configured font, then `assets/fonts/ui.ttf`. egui's built-in
/// fonts already cover Latin text, so finding nothing is fine.
fn setup_egui_ui_fonts(ctx: &egui::Context, configured: Option<&Path>) {
    fn try_load_font_from_path(path: &Path) -> Option<Vec<u8>> {
        let bytes = std::fs::read(path).ok()?;
        match ab_glyph::FontArc::try_from_vec(bytes.clone()) {
            Ok(_) => Some(bytes),
            Err(e) => {
                log::warn!("{} is not a usable font: {}", path.display(), e);
                None
            }
        }
    }

    let mut candidates: Vec<PathBuf> = configured.map(Path::to_path_buf).into_iter().collect();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("assets").join("fonts").join("ui.ttf"));
        }
    }
    candidates.push(PathBuf::from("assets").join("fonts").join("ui.ttf"));

    let Some((font_path, font_bytes)) = candidates
        .into_iter()
        .find_map(|p| try_load_font_from_path(&p).map(|b| (p, b)))
    else {
        log::debug!("no custom UI font, keeping egui defaults");
        return;
    };
    log::info!("UI font: {}", font_path.display());

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("ui".to_owned(), egui::FontData::from_owned(font_bytes));
    if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Proportional) {
        family.insert(0, "ui".to_owned());
    }
    ctx.set_fonts(fonts);
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ObjectUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    eye: [f32; 4],
    light: [f32; 4],
}

impl ObjectUniform {
    fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            eye: [0.0, 0.0, 0.0, FOG_FAR],
            light: [0.0, 2.0, 0.0, CAT_LIGHT_RANGE],
        }
    }
}

/// One indexed mesh with its own uniform block.
struct DrawItem {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform: ObjectUniform,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl DrawItem {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, mesh: &Mesh, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform = ObjectUniform::new();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some(label),
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform,
            uniform_buffer,
            bind_group,
        }
    }

    fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Model matrix for the cat's visual root.
pub fn character_model(frame: &FrameOutput) -> Mat4 {
    let c = &frame.character;
    let a = &frame.animation;
    let gait = if a.is_moving {
        (a.clip_phase * std::f32::consts::TAU).sin().abs() * GAIT_BOUNCE
    } else {
        0.0
    };
    let rotation = Quat::from_rotation_y(c.heading)
        * Quat::from_rotation_x(c.pitch)
        * Quat::from_rotation_z(c.tilt);
    Mat4::from_rotation_translation(rotation, c.position + Vec3::Y * (c.bob + gait))
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,

    scene: DrawItem,
    cat: DrawItem,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<Window>, gallery: &Gallery, ui_font: Option<&Path>) -> Self {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }
            .expect("window has no drawable surface");
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("no GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: if cfg!(target_arch = "wasm32") {
                        wgpu::Limits::downlevel_webgl2_defaults()
                    } else {
                        wgpu::Limits::default().using_resolution(adapter.limits())
                    },
                    label: None,
                },
                None,
            )
            .await
            .expect("GPU device request failed");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, &config);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("object_bind_group_layout"),
        });

        let mut scene_mesh = Mesh::default();
        mesh::build_corridor(&mut scene_mesh);
        for panel in gallery.panels() {
            mesh::build_panel(&mut scene_mesh, panel);
        }
        let mut cat_mesh = Mesh::default();
        mesh::build_placeholder(&mut cat_mesh);

        let scene = DrawItem::new(&device, &bind_group_layout, &scene_mesh, "corridor");
        let cat = DrawItem::new(&device, &bind_group_layout, &cat_mesh, "cat_placeholder");
        log::info!(
            "scene: {} corridor vertices, {} panels",
            scene_mesh.vertices.len(),
            gallery.panels().len()
        );

        let shader = device.create_shader_module(wgpu::include_wgsl!("shader_scene.wgsl"));
        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Walls are seen from both sides.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let egui_ctx = egui::Context::default();
        setup_egui_ui_fonts(&egui_ctx, ui_font);

        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);

        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Self {
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            depth_view,
            scene,
            cat,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    /// Pushes this frame's camera and cat transforms into the uniform buffers.
    pub fn sync(&mut self, frame: &FrameOutput, fov_deg: f32) {
        let camera: CameraTransform = frame.camera;
        let view_proj = (CameraTransform::projection(fov_deg, self.aspect()) * camera.view())
            .to_cols_array_2d();
        let eye = [camera.position.x, camera.position.y, camera.position.z, FOG_FAR];
        let light_pos = frame.character.position + Vec3::Y * 2.0;
        let light = [light_pos.x, light_pos.y, light_pos.z, CAT_LIGHT_RANGE];

        for (item, model) in [
            (&mut self.scene, Mat4::IDENTITY),
            (&mut self.cat, character_model(frame)),
        ] {
            item.uniform.view_proj = view_proj;
            item.uniform.model = model.to_cols_array_2d();
            item.uniform.eye = eye;
            item.uniform.light = light;
            self.queue
                .write_buffer(&item.uniform_buffer, 0, bytemuck::cast_slice(&[item.uniform]));
        }
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // 1. Scene
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.003,
                            g: 0.003,
                            b: 0.003,
                            a: 1.0,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            render_pass.set_pipeline(&self.render_pipeline);
            self.scene.draw(&mut render_pass);
            self.cat.draw(&mut render_pass);
        }

        // 2. UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::TurnDirection;
    use crate::walkthrough::{AnimationCue, CharacterTransform};

    fn frame(moving: bool, phase: f32) -> FrameOutput {
        FrameOutput {
            character: CharacterTransform {
                position: Vec3::new(1.0, 0.0, 5.0),
                heading: 0.0,
                pitch: 0.0,
                bob: 0.0,
                tilt: 0.0,
            },
            camera: CameraTransform {
                position: Vec3::new(1.0, 1.5, 8.0),
                look_at: Vec3::new(1.0, 0.2, 5.0),
            },
            animation: AnimationCue {
                is_moving: moving,
                is_running: false,
                turn_direction: TurnDirection::Straight,
                clip_time_scale: if moving { 1.8 } else { 0.0 },
                clip_phase: phase,
            },
        }
    }

    #[test]
    fn model_places_the_cat_at_its_position() {
        let m = character_model(&frame(false, 0.0));
        let origin = m.transform_point3(Vec3::ZERO);
        assert!(origin.distance(Vec3::new(1.0, 0.0, 5.0)) < 1e-5);
    }

    #[test]
    fn gait_lifts_the_cat_mid_stride_only_while_moving() {
        let walking = character_model(&frame(true, 0.25)).transform_point3(Vec3::ZERO);
        assert!((walking.y - GAIT_BOUNCE).abs() < 1e-5);
        let standing = character_model(&frame(false, 0.25)).transform_point3(Vec3::ZERO);
        assert_eq!(standing.y, 0.0);
    }

    #[test]
    fn vertex_layout_matches_vertex_size() {
        assert_eq!(vertex_layout().array_stride, 36);
    }
}
