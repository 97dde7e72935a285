use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glam::{DMat4, Vec2};

mod background;
mod config;
mod math;
mod renderer;
mod scene;
mod sensor;
mod ui;

use background::FrameSource;
use config::{AppConfig, Overrides};
use math::MeshEngine;
use renderer::{FramePlan, GpuState, ViewRotator, stereo_pair};
use scene::SceneState;
use sensor::{AudioPanner, GyroReading, GyroStream, SimulatedGyro};
use ui::{PanelStats, UiActions, UiState, apply_theme, draw_help_overlay, draw_side_panel};

/// Sphere displacement per key press, in sensor units.
const KEY_GYRO_STEP: f64 = 2.0;
/// User point displacement per arrow key press, in degrees.
const KEY_POINT_STEP: f64 = 1.0;

#[derive(Parser, Debug)]
#[command(name = "anaglyph3d", version, about = "Red/cyan stereoscopic parametric surface viewer")]
struct Args {
    /// JSON configuration file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sample grid resolution n (the mesh has 2(n+1)^2 vertices)
    #[arg(long)]
    resolution: Option<u32>,

    /// Still image shown behind the surface instead of the test pattern
    #[arg(long)]
    background: Option<PathBuf>,

    /// Drive the sensor sphere from a simulated gyroscope
    #[arg(long)]
    simulate_gyro: bool,
}

#[derive(Default)]
struct InputState {
    dragging: bool,
    mouse_delta: Vec2,
}

struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    rotator: ViewRotator,
    scene: SceneState,
    ui_state: UiState,
    input: InputState,

    mesh_engine: MeshEngine,
    building: bool,

    gyro_stream: GyroStream,
    simulated_gyro: Option<SimulatedGyro>,
    panner: AudioPanner,

    background: Box<dyn FrameSource>,
    background_label: String,

    last_vsync_state: bool,
    frame_count: u32,
    fps_timer: Instant,
    fps: f32,

    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig, background: Box<dyn FrameSource>) -> anyhow::Result<Self> {
        let shape = config.shape.params().context("invalid shape settings")?;
        let scene = SceneState::new(config.stereo, config.lighting, shape);
        let ui_state = UiState::from_config(&config);
        let background_label = background.describe();

        Ok(Self {
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            rotator: ViewRotator::default(),
            scene,
            ui_state,
            input: InputState::default(),

            mesh_engine: MeshEngine::new(),
            building: false,

            gyro_stream: GyroStream::new(),
            simulated_gyro: None,
            panner: AudioPanner::new(),

            background,
            background_label,

            last_vsync_state: config.window.vsync,
            frame_count: 0,
            fps_timer: Instant::now(),
            fps: 0.0,

            fatal: None,
            config,
        })
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> anyhow::Result<()> {
        let gpu = pollster::block_on(GpuState::new(window.clone(), self.config.window.vsync))
            .context("failed to initialize the renderer")?;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn update(&mut self) {
        self.frame_count += 1;
        if self.fps_timer.elapsed().as_secs_f32() >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer.elapsed().as_secs_f32();
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }

        if self.input.dragging {
            self.rotator.process_mouse_movement(self.input.mouse_delta);
        }
        self.input.mouse_delta = Vec2::ZERO;

        self.sync_simulated_gyro();
        let readings = self.gyro_stream.drain();
        self.scene.marker.apply_all(&readings, &mut self.panner);

        if let Some(params) = self.ui_state.shape_params() {
            self.scene.shape = params;
            if self.mesh_engine.request(params) {
                self.building = true;
            }
        }

        let Some(gpu) = &mut self.gpu else { return };

        if let Some(result) = self.mesh_engine.try_recv_latest() {
            log::info!(
                "mesh rebuilt: n = {}, {} vertices in {:.1} ms",
                result.params.grid.n(),
                result.mesh.vertex_count(),
                result.elapsed.as_secs_f64() * 1000.0
            );
            gpu.upload_mesh(&result.mesh);
            self.building = false;
        }

        if self.scene.show_background {
            if let Some(frame) = self.background.poll_frame() {
                gpu.upload_background(&frame);
            }
        }
    }

    fn sync_simulated_gyro(&mut self) {
        match (self.ui_state.simulate_gyro, self.simulated_gyro.is_some()) {
            (true, false) => {
                let sensor = &self.config.sensor;
                self.simulated_gyro = Some(SimulatedGyro::spawn(
                    self.gyro_stream.sender(),
                    sensor.rate_hz,
                    sensor.amplitude,
                ));
                self.scene.show_marker = true;
            }
            (false, true) => {
                self.simulated_gyro = None;
                log::info!("simulated gyroscope stopped");
            }
            _ => {}
        }
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return Ok(());
        };

        let raw_input = egui_state.take_egui_input(window);

        let stats = PanelStats {
            fps: self.fps,
            build: self.mesh_engine.stats(),
            building: self.building,
            background: self.background_label.clone(),
            sphere_center: self.scene.marker.center(),
            panner_position: self.panner.position(),
            panner_updates: self.panner.updates(),
        };

        let mut ui_actions = UiActions::default();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, &mut self.ui_state, &mut self.scene, &stats);
            if self.ui_state.show_help {
                draw_help_overlay(ctx);
            }
        });

        self.handle_ui_actions(ui_actions);

        let Some(gpu) = &mut self.gpu else { return Ok(()) };
        let Some(window) = &self.window else { return Ok(()) };
        let Some(egui_state) = &mut self.egui_state else {
            return Ok(());
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return Ok(());
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        if self.ui_state.vsync_enabled != self.last_vsync_state {
            gpu.set_vsync(self.ui_state.vsync_enabled);
            self.last_vsync_state = self.ui_state.vsync_enabled;
        }

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                gpu.resize(gpu.size);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                anyhow::bail!("out of GPU memory");
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timeout, skipping frame");
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.scene.stereo.aspect_ratio = gpu.aspect_ratio();
        let pair = stereo_pair(&self.scene.stereo, self.rotator.view_matrix());
        let marker = self.scene.marker_position().map(DMat4::from_translation);
        gpu.update_draw_uniforms(&self.scene, &pair.left, &pair.right, marker);
        let plan = FramePlan::anaglyph(self.scene.show_background, marker.is_some());

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.render_frame(&view, &mut encoder, &plan);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
        Ok(())
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if actions.reset_view {
            self.rotator.reset();
        }

        if actions.reset_marker {
            self.scene.marker.reset(&mut self.panner);
        }

        if actions.reset_user_point {
            self.scene.user_point = Default::default();
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let step = KEY_GYRO_STEP;
        let reading = match key {
            KeyCode::KeyI => Some(GyroReading::new(0.0, step, 0.0)),
            KeyCode::KeyK => Some(GyroReading::new(0.0, -step, 0.0)),
            KeyCode::KeyJ => Some(GyroReading::new(-step, 0.0, 0.0)),
            KeyCode::KeyL => Some(GyroReading::new(step, 0.0, 0.0)),
            KeyCode::KeyU => Some(GyroReading::new(0.0, 0.0, step)),
            KeyCode::KeyO => Some(GyroReading::new(0.0, 0.0, -step)),
            _ => None,
        };
        if let Some(reading) = reading {
            self.scene.show_marker = true;
            self.gyro_stream.push(reading);
            return;
        }

        let point = &mut self.scene.user_point;
        match key {
            KeyCode::ArrowLeft => point.nudge(-KEY_POINT_STEP, 0.0),
            KeyCode::ArrowRight => point.nudge(KEY_POINT_STEP, 0.0),
            KeyCode::ArrowUp => point.nudge(0.0, KEY_POINT_STEP),
            KeyCode::ArrowDown => point.nudge(0.0, -KEY_POINT_STEP),
            KeyCode::KeyR => self.rotator.reset(),
            KeyCode::KeyH => self.ui_state.show_help = !self.ui_state.show_help,
            _ => {}
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let result = event_loop
            .create_window(window_attrs)
            .context("failed to create window")
            .and_then(|window| self.init_gpu(Arc::new(window)));
        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.mesh_engine.stop();
                self.simulated_gyro = None;
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state == ElementState::Pressed {
                        self.handle_key(key);
                    }
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.input.dragging = state == ElementState::Pressed;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.rotator.process_scroll(scroll);
            }

            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(err) = self.render() {
                    self.fail(event_loop, err);
                }
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _: &ActiveEventLoop, _: winit::event::DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.input.dragging {
                self.input.mouse_delta.x += delta.0 as f32;
                self.input.mouse_delta.y += delta.1 as f32;
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    config.apply(&Overrides {
        resolution: args.resolution,
        background: args.background.clone(),
        simulate_gyro: args.simulate_gyro,
    });
    if let Err(err) = config.validate() {
        log::warn!("rejected configuration: {err}");
        return Err(err.into());
    }

    let background =
        background::open_source(&config.background).context("failed to open background source")?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, background)?;
    event_loop.run_app(&mut app).context("event loop terminated abnormally")?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
