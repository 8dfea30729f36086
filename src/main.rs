// main.rs — window, event routing, per-frame update and the egui overlay

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // no console window in release builds

mod audio;
mod camera;
mod character;
mod config;
mod gallery;
mod gallery_state;
mod i18n;
mod images;
mod input;
mod mesh;
mod renderer;
mod walkthrough;

use audio::BackgroundMusic;
use camera::CameraMode;
use config::GalleryConfig;
use gallery::{Gallery, PanelDescriptor, PanelId};
use gallery_state::{GalleryState, Overlay};
use glam::Vec2;
use images::{ImageSlot, PanelImages};
use input::{ControlVector, DeviceClass, KeyboardState, VirtualJoystick, WindowProbe};
use renderer::Renderer;
use walkthrough::{FrameOutput, Walkthrough};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use std::sync::Arc;
use std::time::Instant;

/// Longest step fed to the simulation; a stalled window must not teleport the cat.
const MAX_FRAME_DT: f32 = 0.1;
const JOYSTICK_MARGIN: f32 = 8.0;
const STATUS_BAR_HEIGHT: f32 = 28.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    crate::i18n::init(crate::i18n::resolve_lang_from_args());

    let config = match GalleryConfig::discover() {
        Ok(Some((path, config))) => {
            log::info!(
                "{}",
                crate::i18n::tr_with("log.config_loaded", &[("path", path.display().to_string())])
            );
            config
        }
        Ok(None) => GalleryConfig::default(),
        Err(e) => {
            log::warn!(
                "{}",
                crate::i18n::tr_with("log.config_failed", &[("err", e.to_string())])
            );
            GalleryConfig::default()
        }
    };

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&crate::i18n::tr("app.title"))
            .with_inner_size(LogicalSize::new(config.window_size[0], config.window_size[1]))
            .build(&event_loop)
            .expect("failed to create window"),
    );

    let gallery = Gallery::portfolio();
    let mut renderer = pollster::block_on(Renderer::new(
        window.clone(),
        &gallery,
        config.ui_font.as_deref(),
    ));

    let mut probe = WindowProbe {
        touch_seen: false,
        logical_width: logical_width(&window),
        forced: config.device.force_touch,
    };
    let small_screen = config.device.small_screen_width;
    let mut state = GalleryState::new(
        DeviceClass::classify(&probe, small_screen),
        config.splash_seconds,
    );
    log::info!("device class {:?}", state.device);

    let mut keyboard = KeyboardState::default();
    let mut joystick =
        VirtualJoystick::new(config.device.joystick_radius, config.device.joystick_threshold);
    let mut images = PanelImages::new();
    let fov = config.camera.fov_deg;
    let audio_config = config.audio.clone();
    let mut walkthrough = Walkthrough::new(gallery, config);

    // Music starts on the first frame past the intro.
    let mut music: Option<BackgroundMusic> = None;
    let mut music_started = false;

    // Pointer state
    let mut cursor: Option<PhysicalPosition<f64>> = None;
    let mut tap: Option<(u64, PhysicalPosition<f64>)> = None;

    // FPS
    let mut last_tick = Instant::now();
    let mut last_fps_time = Instant::now();
    let mut frame_count = 0;
    let mut fps = 0.0;
    let mut show_fps = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => {
                // egui gets the first look (content pane, buttons, status bar)
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                        probe.logical_width = logical_width(&window);
                        reclassify(&mut state, &probe, small_screen, &mut joystick);
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                        probe.logical_width = logical_width(&window);
                        reclassify(&mut state, &probe, small_screen, &mut joystick);
                    }

                    WindowEvent::Focused(false) => {
                        keyboard.release_all();
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        let Some(key) = input.virtual_keycode else {
                            return;
                        };
                        keyboard.handle(key, input.state);
                        if input.state == ElementState::Pressed {
                            match key {
                                VirtualKeyCode::Escape => state.clear(),
                                VirtualKeyCode::Return => state.enter(),
                                VirtualKeyCode::F3 => show_fps = !show_fps,
                                VirtualKeyCode::M if music_started => state.toggle_mute(),
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = Some(position);
                    }

                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        if !state.is_interactive() {
                            return;
                        }
                        if let Some(id) = cursor.and_then(|p| pick_at(&renderer, &walkthrough, fov, p)) {
                            state.toggle(id);
                        }
                    }

                    WindowEvent::Touch(touch) => {
                        if !probe.touch_seen {
                            probe.touch_seen = true;
                            reclassify(&mut state, &probe, small_screen, &mut joystick);
                        }
                        if !state.is_interactive() {
                            return;
                        }
                        let point = to_logical(touch.location, window.scale_factor());
                        let joystick_live =
                            state.device == DeviceClass::Touch && state.selection().is_none();

                        match touch.phase {
                            TouchPhase::Started => {
                                if joystick_live
                                    && joystick.touch_start(touch.id, point, &mut state.touch)
                                {
                                    return;
                                }
                                tap = Some((touch.id, touch.location));
                            }
                            TouchPhase::Moved => {
                                if joystick_live {
                                    joystick.touch_move(touch.id, point, &mut state.touch);
                                }
                            }
                            TouchPhase::Ended => {
                                if joystick.touch_end(touch.id, &mut state.touch) {
                                    return;
                                }
                                let Some((finger, start)) = tap.take() else {
                                    return;
                                };
                                if finger != touch.id {
                                    return;
                                }
                                if !state.selection().is_none() {
                                    // Taps on the pane itself never reach us.
                                    state.clear();
                                } else if let Some(id) =
                                    pick_at(&renderer, &walkthrough, fov, start)
                                {
                                    state.toggle(id);
                                }
                            }
                            TouchPhase::Cancelled => {
                                joystick.touch_end(touch.id, &mut state.touch);
                                tap = None;
                            }
                        }
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = now.duration_since(last_tick).as_secs_f32().min(MAX_FRAME_DT);
                last_tick = now;

                frame_count += 1;
                if now.duration_since(last_fps_time).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(last_fps_time).as_secs_f32();
                    frame_count = 0;
                    last_fps_time = now;
                }

                state.tick_overlay(dt);
                if state.is_interactive() && !music_started {
                    music_started = true;
                    music = match BackgroundMusic::start(&audio_config.music, audio_config.volume) {
                        Ok(m) => Some(m),
                        Err(e) => {
                            log::warn!(
                                "{}",
                                crate::i18n::tr_with("log.music_failed", &[("err", e.to_string())])
                            );
                            None
                        }
                    };
                }
                if let Some(m) = music.as_mut() {
                    m.set_muted(state.is_muted());
                }
                joystick.set_visible(
                    state.device == DeviceClass::Touch && state.selection().is_none(),
                    &mut state.touch,
                );
                let controls = ControlVector::combine(keyboard.snapshot(), &state.touch, state.device);
                let frame = walkthrough.step(&state, &controls, dt);

                images.poll(&renderer.egui_ctx);
                let selected = state
                    .selection()
                    .panel()
                    .and_then(|id| walkthrough.gallery().get(id))
                    .cloned();
                if let Some(panel) = &selected {
                    images.request(panel);
                }

                renderer.sync(&frame, fov);

                let logical = window.inner_size().to_logical::<f32>(window.scale_factor());
                let r = joystick.radius;
                joystick.center = Vec2::new(
                    JOYSTICK_MARGIN + r,
                    logical.height - STATUS_BAR_HEIGHT - JOYSTICK_MARGIN - r,
                );

                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(
                        ctx,
                        UiFrame {
                            state: &mut state,
                            frame: &frame,
                            mode: walkthrough.camera.mode,
                            aimed: walkthrough
                                .camera
                                .aimed_panel()
                                .and_then(|id| walkthrough.gallery().get(id)),
                            music_started,
                            selected: selected.as_ref(),
                            images: &images,
                            joystick: &joystick,
                            show_fps,
                            fps,
                        },
                    );
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn logical_width(window: &Window) -> u32 {
    window
        .inner_size()
        .to_logical::<f64>(window.scale_factor())
        .width
        .round() as u32
}

fn to_logical(p: PhysicalPosition<f64>, scale: f64) -> Vec2 {
    Vec2::new((p.x / scale) as f32, (p.y / scale) as f32)
}

fn reclassify(
    state: &mut GalleryState,
    probe: &WindowProbe,
    small_screen: u32,
    joystick: &mut VirtualJoystick,
) {
    let device = DeviceClass::classify(probe, small_screen);
    if device == DeviceClass::Desktop {
        joystick.reset(&mut state.touch);
    }
    state.set_device(device);
}

/// Panel under a window position given in physical pixels.
fn pick_at(
    renderer: &Renderer,
    walkthrough: &Walkthrough,
    fov: f32,
    p: PhysicalPosition<f64>,
) -> Option<PanelId> {
    let (w, h) = (renderer.size.width as f32, renderer.size.height as f32);
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let ndc = Vec2::new(2.0 * p.x as f32 / w - 1.0, 1.0 - 2.0 * p.y as f32 / h);
    let ray = walkthrough
        .output()
        .camera
        .ray_through(ndc, fov, renderer.aspect());
    walkthrough.gallery().pick(&ray)
}

struct UiFrame<'a> {
    state: &'a mut GalleryState,
    frame: &'a FrameOutput,
    mode: CameraMode,
    aimed: Option<&'a PanelDescriptor>,
    music_started: bool,
    selected: Option<&'a PanelDescriptor>,
    images: &'a PanelImages,
    joystick: &'a VirtualJoystick,
    show_fps: bool,
    fps: f32,
}

fn accent(panel: &PanelDescriptor) -> egui::Color32 {
    // accent_color is linear; egui wants sRGB bytes.
    let [r, g, b] = panel.accent_color;
    egui::Rgba::from_rgb(r, g, b).into()
}

fn draw_ui(ctx: &egui::Context, ui_frame: UiFrame<'_>) {
    let UiFrame {
        state,
        frame,
        mode,
        aimed,
        music_started,
        selected,
        images,
        joystick,
        show_fps,
        fps,
    } = ui_frame;
    let tr = crate::i18n::tr;
    let touch = state.device == DeviceClass::Touch;

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let mode = match aimed {
                Some(panel) => format!("{:?} ({})", mode, tr(&panel.title)),
                None => format!("{:?}", mode),
            };
            ui.label(crate::i18n::tr_with("status.mode", &[("mode", mode)]));
            ui.label("|");
            ui.label(crate::i18n::tr_with(
                "status.position",
                &[
                    ("x", format!("{:.2}", frame.character.position.x)),
                    ("z", format!("{:.2}", frame.character.position.z)),
                ],
            ));
            ui.label("|");
            ui.label(crate::i18n::tr_with(
                "status.heading",
                &[("deg", format!("{:.0}", frame.character.heading.to_degrees()))],
            ));
            ui.label("|");
            ui.label(crate::i18n::tr_with(
                "status.device",
                &[("device", format!("{:?}", state.device))],
            ));

            if show_fps {
                ui.label("|");
                ui.label(
                    egui::RichText::new(crate::i18n::tr_with(
                        "status.fps",
                        &[("fps", format!("{:.1}", fps))],
                    ))
                    .color(egui::Color32::GREEN),
                );
            }
        });
    });

    let overlay = state.overlay;
    match overlay {
        Overlay::Splash { remaining } => {
            let alpha = (remaining / 0.5).clamp(0.0, 1.0);
            egui::CentralPanel::default()
                .frame(egui::Frame::none().fill(egui::Color32::from_black_alpha((alpha * 255.0) as u8)))
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(ui.available_height() * 0.4);
                        let gold = egui::Color32::from_rgb(0xd4, 0xaf, 0x37).gamma_multiply(alpha);
                        ui.label(egui::RichText::new(tr("splash.title")).size(48.0).color(gold));
                        ui.label(egui::RichText::new(tr("splash.subtitle")).size(18.0));
                    });
                });
            return;
        }
        Overlay::Intro => {
            egui::Window::new(tr("intro.title"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.set_max_width(420.0);
                    ui.label(tr("intro.body"));
                    ui.add_space(8.0);
                    let keys = if touch {
                        ["intro.touch.move", "intro.touch.run", "intro.touch.tap"]
                    } else {
                        ["intro.keys.move", "intro.keys.run", "intro.keys.click"]
                    };
                    for key in keys {
                        ui.label(egui::RichText::new(tr(key)).monospace());
                    }
                    ui.add_space(8.0);
                    ui.vertical_centered(|ui| {
                        if ui.button(tr("intro.enter")).clicked() {
                            state.enter();
                        }
                    });
                });
            return;
        }
        Overlay::Hidden => {}
    }

    if music_started {
        egui::Area::new("mute_button")
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
            .show(ctx, |ui| {
                let label = if state.is_muted() {
                    tr("audio.unmute")
                } else {
                    tr("audio.mute")
                };
                if ui.button(label).clicked() {
                    state.toggle_mute();
                }
            });
    }

    if let Some(panel) = selected {
        let fill_pane = |ui: &mut egui::Ui, state: &mut GalleryState| {
            ui.horizontal(|ui| {
                ui.heading(egui::RichText::new(tr(&panel.title)).color(accent(panel)));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button(tr("pane.close")).clicked() {
                        state.toggle(panel.id);
                    }
                });
            });
            let (stripe, _) =
                ui.allocate_exact_size(egui::vec2(ui.available_width(), 4.0), egui::Sense::hover());
            ui.painter().rect_filled(stripe, 0.0, accent(panel));
            egui::ScrollArea::vertical().show(ui, |ui| {
                match images.get(panel.id) {
                    Some(ImageSlot::Ready(texture)) => {
                        let size = texture.size_vec2();
                        let scale = (ui.available_width() / size.x).min(1.0);
                        ui.image((texture.id(), size * scale));
                    }
                    Some(ImageSlot::Loading) => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(tr("pane.loading_image"));
                        });
                    }
                    Some(ImageSlot::Missing) | None => {}
                }
                ui.add_space(6.0);
                ui.label(tr(&panel.description));
            });
        };

        if touch {
            egui::TopBottomPanel::bottom("content_pane")
                .resizable(false)
                .max_height(ctx.screen_rect().height() * 0.45)
                .show(ctx, |ui| fill_pane(ui, state));
        } else {
            egui::SidePanel::right("content_pane")
                .resizable(false)
                .default_width(380.0)
                .show(ctx, |ui| fill_pane(ui, state));
        }
    }

    let hint = match (selected.is_some(), touch) {
        (true, false) => tr("hint.close.desktop"),
        (true, true) => tr("hint.close.touch"),
        (false, false) => tr("hint.desktop"),
        (false, true) => tr("hint.touch"),
    };
    egui::Area::new("hint")
        .anchor(egui::Align2::CENTER_TOP, [0.0, 12.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(hint)
                    .color(egui::Color32::from_white_alpha(200))
                    .background_color(egui::Color32::from_black_alpha(140)),
            );
        });

    if touch && selected.is_none() {
        let painter = ctx.layer_painter(egui::LayerId::background());
        let center = egui::pos2(joystick.center.x, joystick.center.y);
        painter.circle(
            center,
            joystick.radius,
            egui::Color32::from_white_alpha(25),
            egui::Stroke::new(2.0, egui::Color32::from_white_alpha(90)),
        );
        let knob = joystick.knob();
        painter.circle_filled(
            center + egui::vec2(knob.x, knob.y),
            15.0,
            egui::Color32::from_white_alpha(if joystick.is_dragging() { 200 } else { 120 }),
        );

        egui::Area::new("run_button")
            .anchor(egui::Align2::RIGHT_BOTTOM, [-24.0, -48.0])
            .show(ctx, |ui| {
                let label = if state.touch.run {
                    tr("touch.walk")
                } else {
                    tr("touch.run")
                };
                let button = egui::Button::new(egui::RichText::new(label).size(20.0))
                    .min_size(egui::vec2(72.0, 72.0));
                if ui.add(button).clicked() {
                    state.touch.toggle_run();
                }
            });
    }
}
