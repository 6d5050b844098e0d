// Meadow with a trail-leaving sphere.
// Ground, grass and swarm are instanced; the player's motion history is turned
// into glowing ribbons every few frames and streamed into a pooled GPU buffer.

mod config;
mod engine;
mod error;

use std::sync::Arc;
use std::time::Instant;
use winit::{
    event::{Event as WinitEvent, WindowEvent, ElementState, KeyEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};
use clap::Parser;
use glam::{Vec2, Vec3};
use bevy_ecs::prelude::*;
use wgpu::util::DeviceExt;

use config::{Cli, SceneConfig};
use engine::{Color as EntityColor, MotionSample, RibbonSink, SwarmMember, TrailEffect, TrailVariant, Transform};
use engine::camera::FollowCamera;
use engine::debug_overlay::{DebugOverlay, DebugStats, TrailControls};
use engine::grass::{BladeVertex, GrassField, GrassInstance, BLADE_INDICES, BLADE_VERTICES};
use engine::ground::Heightfield;
use engine::input::InputState;
use engine::mesh::{self as meshes, GpuVertex, RenderMesh};
use engine::player::Player;
use engine::render::{
    self, CubeVertex, MeshInstance, PipelineKind, PipelineSpec, RibbonRenderer, SceneUniforms,
    SwarmInstance, CUBE_INDICES, CUBE_VERTICES,
};
use engine::ribbon::RibbonVertex;
use engine::shaders;
use engine::systems;
use error::{AppError, GpuError};

const DIGIT_KEYS: [KeyCode; 4] = [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4];

// ============================================================================
// GPU MESH
// ============================================================================

/// Indexed mesh plus a single placement instance.
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    num_indices: u32,
}

impl MeshBuffers {
    fn upload(device: &wgpu::Device, label: &str, mesh: &RenderMesh, instance: MeshInstance) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: mesh.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Instance Buffer")),
            contents: bytemuck::cast_slice(&[instance]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_indices: mesh.index_count() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}

// ============================================================================
// FRAME TIMING
// ============================================================================

/// Frame times accumulated over one second, then published.
struct FrameTimer {
    frames: u32,
    sum_ms: f32,
    min_ms: f32,
    max_ms: f32,
    window_start: Instant,
    // Last published: fps, avg, min, max
    published: (u32, f32, f32, f32),
}

impl FrameTimer {
    fn new() -> Self {
        Self {
            frames: 0,
            sum_ms: 0.0,
            min_ms: f32::MAX,
            max_ms: 0.0,
            window_start: Instant::now(),
            published: (0, 0.0, 0.0, 0.0),
        }
    }

    /// Returns true when a new one-second window was published.
    fn record(&mut self, dt: f32) -> bool {
        let ms = dt * 1000.0;
        self.frames += 1;
        self.sum_ms += ms;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);

        if self.window_start.elapsed().as_secs_f32() < 1.0 {
            return false;
        }
        self.published = (self.frames, self.sum_ms / self.frames as f32, self.min_ms, self.max_ms);
        self.frames = 0;
        self.sum_ms = 0.0;
        self.min_ms = f32::MAX;
        self.max_ms = 0.0;
        self.window_start = Instant::now();
        true
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    depth_view: wgpu::TextureView,

    mesh_pipeline: wgpu::RenderPipeline,
    grass_pipeline: wgpu::RenderPipeline,
    swarm_pipeline: wgpu::RenderPipeline,
    ribbon_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    ground_mesh: MeshBuffers,
    player_mesh: MeshBuffers,

    blade_vertex_buffer: wgpu::Buffer,
    blade_index_buffer: wgpu::Buffer,
    grass_instance_buffer: wgpu::Buffer,
    grass_count: u32,

    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    swarm_instance_buffer: wgpu::Buffer,
    max_swarm: usize,

    ribbon_renderer: RibbonRenderer,

    // Scene
    scene: SceneConfig,
    ground: Heightfield,
    world: World,
    player: Player,
    camera: FollowCamera,
    input: InputState,

    // Trails
    trail: TrailEffect,
    active_variant: TrailVariant,
    controls: TrailControls,

    overlay: DebugOverlay,
    timer: FrameTimer,
    start: Instant,
    last_update: Instant,
}

impl State {
    async fn new(window: Arc<Window>, scene: SceneConfig) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

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
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);
        let depth_view = render::create_depth_view(&device, &config);

        // ── Uniforms ────────────────────────────────────────────────────────
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SceneUniforms::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        // ── Pipelines ───────────────────────────────────────────────────────
        let mesh_pipeline = render::create_pipeline(&device, &pipeline_layout, surface_format, &PipelineSpec {
            label: "Mesh Pipeline",
            body: shaders::MESH_BODY,
            buffers: &[GpuVertex::desc(), MeshInstance::desc()],
            kind: PipelineKind::Opaque,
            cull_mode: None,
        });
        let grass_pipeline = render::create_pipeline(&device, &pipeline_layout, surface_format, &PipelineSpec {
            label: "Grass Pipeline",
            body: shaders::GRASS_BODY,
            buffers: &[BladeVertex::desc(), GrassInstance::desc()],
            kind: PipelineKind::Opaque,
            // Blades are single-sided quads seen from both sides
            cull_mode: None,
        });
        let swarm_pipeline = render::create_pipeline(&device, &pipeline_layout, surface_format, &PipelineSpec {
            label: "Swarm Pipeline",
            body: shaders::SWARM_BODY,
            buffers: &[CubeVertex::desc(), SwarmInstance::desc()],
            kind: PipelineKind::Additive,
            cull_mode: Some(wgpu::Face::Back),
        });
        let ribbon_pipeline = render::create_pipeline(&device, &pipeline_layout, surface_format, &PipelineSpec {
            label: "Ribbon Pipeline",
            body: shaders::RIBBON_BODY,
            buffers: &[RibbonVertex::desc()],
            kind: PipelineKind::Additive,
            cull_mode: None,
        });

        // ── Ground + player ────────────────────────────────────────────────
        let ground = Heightfield::generate(&scene.ground);
        let ground_mesh = MeshBuffers::upload(
            &device,
            "Ground",
            &ground.build_mesh(scene.ground.amplitude),
            MeshInstance::at(Vec3::ZERO),
        );

        let player = Player::spawn(&ground, scene.player.clone());
        let sphere_color = player.config.color;
        let sphere = meshes::triangulate_smooth(
            &meshes::uv_sphere(player.config.radius, 16, 24),
            |_, _| sphere_color,
        );
        let player_mesh = MeshBuffers::upload(&device, "Player", &sphere, MeshInstance::at(player.position));

        // ── Grass ───────────────────────────────────────────────────────────
        let grass = GrassField::scatter(&ground, &scene.grass);
        let blade_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blade Vertex Buffer"),
            contents: bytemuck::cast_slice(BLADE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let blade_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blade Index Buffer"),
            contents: bytemuck::cast_slice(BLADE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let grass_instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grass Instance Buffer"),
            contents: bytemuck::cast_slice(&grass.instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        log::info!("Scattered {} grass blades", grass.len());

        // ── Swarm ───────────────────────────────────────────────────────────
        let cube_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Vertex Buffer"),
            contents: bytemuck::cast_slice(CUBE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Index Buffer"),
            contents: bytemuck::cast_slice(CUBE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let max_swarm = scene.swarm.count.max(1);
        let swarm_instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Swarm Instance Buffer"),
            size: (max_swarm * std::mem::size_of::<SwarmInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut world = World::new();
        systems::spawn_swarm(&mut world, &ground, &scene.swarm);

        // ── Trails ──────────────────────────────────────────────────────────
        let trail_config = scene.trail_config();
        // Sized for every preset so switching variants never reallocates
        let segment_capacity = TrailVariant::ALL
            .iter()
            .map(|v| v.config().segment_capacity())
            .chain(std::iter::once(trail_config.segment_capacity()))
            .max()
            .unwrap_or(1);
        let ribbon_renderer = RibbonRenderer::new(&device, segment_capacity);
        log::info!(
            "Trail variant {}: {} ribbon(s), {} segment capacity",
            scene.trail_variant.label(),
            trail_config.ribbon_count,
            ribbon_renderer.segment_capacity()
        );
        let trail = TrailEffect::new(trail_config);
        let controls = TrailControls {
            enabled: scene.trail_enabled,
            variant: scene.trail_variant,
        };

        let overlay = DebugOverlay::new(&window, &device, surface_format);
        let camera = FollowCamera::new(player.position);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth_view,
            mesh_pipeline,
            grass_pipeline,
            swarm_pipeline,
            ribbon_pipeline,
            uniform_buffer,
            uniform_bind_group,
            ground_mesh,
            player_mesh,
            blade_vertex_buffer,
            blade_index_buffer,
            grass_instance_buffer,
            grass_count: grass.len() as u32,
            cube_vertex_buffer,
            cube_index_buffer,
            swarm_instance_buffer,
            max_swarm,
            ribbon_renderer,
            active_variant: scene.trail_variant,
            scene,
            ground,
            world,
            player,
            camera,
            input: InputState::new(),
            trail,
            controls,
            overlay,
            timer: FrameTimer::new(),
            start: Instant::now(),
            last_update: Instant::now(),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = render::create_depth_view(&self.device, &self.config);
        }
    }

    /// Swap the running trail for a preset. History starts over.
    fn select_variant(&mut self, variant: TrailVariant) {
        let config = variant.config();
        if config.segment_capacity() > self.ribbon_renderer.segment_capacity() {
            self.ribbon_renderer = RibbonRenderer::new(&self.device, config.segment_capacity());
        }
        self.ribbon_renderer.sink(&self.queue).clear();
        self.trail = TrailEffect::new(config);
        self.active_variant = variant;
        self.controls.variant = variant;
        log::info!("Trail variant: {}", variant.label());
    }

    fn handle_keys(&mut self) {
        if self.input.was_key_pressed(KeyCode::KeyT) {
            self.controls.enabled = !self.controls.enabled;
            log::info!("Trail {}", if self.controls.enabled { "enabled" } else { "disabled" });
        }
        if self.input.was_key_pressed(KeyCode::F3) {
            self.overlay.toggle();
        }
        for (key, variant) in DIGIT_KEYS.into_iter().zip(TrailVariant::ALL) {
            if self.input.was_key_pressed(key) {
                self.controls.variant = variant;
            }
        }
        // Also picks up a selection made in the overlay last frame
        if self.controls.variant != self.active_variant {
            self.select_variant(self.controls.variant);
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        // Clamp so a stalled frame does not launch the player across the map
        let dt = (now - self.last_update).as_secs_f32().min(0.1);
        self.last_update = now;
        let time = (now - self.start).as_secs_f32();

        self.handle_keys();

        let steering = Player::steering(&self.input, &self.camera);
        let boost = self.input.is_key_held(KeyCode::ShiftLeft);
        self.player.update(steering, boost, &self.ground, dt);
        self.camera.update(&self.input, self.player.position, dt);

        systems::swarm_steer_system(&mut self.world, &self.scene.swarm, time, dt);
        systems::movement_system(&mut self.world, dt);
        systems::bounds_system(&mut self.world, &self.ground, &self.scene.swarm);

        let sample = MotionSample {
            position: self.player.position,
            velocity: Some(self.player.velocity),
        };
        let mut sink = self.ribbon_renderer.sink(&self.queue);
        self.trail.tick(sample, time, self.controls.enabled, &mut sink);

        if self.timer.record(dt) {
            let (fps, avg, _, _) = self.timer.published;
            log::debug!(
                "FPS: {} ({:.2} ms) | trail {:?}: {} points, {} indices",
                fps,
                avg,
                self.trail.phase(),
                self.trail.point_count(),
                self.ribbon_renderer.index_count()
            );
        }
    }

    fn scene_uniforms(&self, time: f32) -> SceneUniforms {
        let aspect = self.size.width.max(1) as f32 / self.size.height.max(1) as f32;
        let eye = self.camera.camera_position();
        let fog = &self.scene.fog;
        let light = Vec3::from_array(self.scene.light_dir).normalize_or(Vec3::NEG_Y);
        let wind_dir = Vec2::from_array(self.scene.wind_dir).normalize_or_zero();
        SceneUniforms {
            view_proj: self.camera.view_projection(aspect).to_cols_array_2d(),
            camera_pos: [eye.x, eye.y, eye.z, time],
            fog: [fog.color[0], fog.color[1], fog.color[2], fog.density],
            light_dir: [light.x, light.y, light.z, 0.0],
            wind: [self.scene.grass.wind_strength, self.scene.grass.wind_speed, wind_dir.x, wind_dir.y],
        }
    }

    fn debug_stats(&self) -> DebugStats {
        let (fps, avg, min, max) = self.timer.published;
        let p = self.player.position;
        DebugStats {
            fps,
            frame_time_avg_ms: avg,
            frame_time_min_ms: min,
            frame_time_max_ms: max,
            resolution: (self.size.width, self.size.height),
            grass_blades: self.grass_count as usize,
            swarm_members: self.scene.swarm.count,
            player_position: (p.x, p.y, p.z),
            player_speed: self.player.velocity.length(),
            camera_distance: self.camera.distance(),
            trail_phase: self.trail.phase(),
            trail_ribbons: self.trail.config().ribbon_count,
            trail_points: self.trail.point_count(),
            trail_head: self.trail.head().map(|h| (h.x, h.y, h.z)),
            ribbon_vertices: self.trail.vertex_count(),
            ribbon_indices: self.trail.index_count(),
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect instance data from ECS BEFORE creating render pass
        let mut instance_data = Vec::with_capacity(self.max_swarm);
        let mut query = self.world.query::<(&Transform, &EntityColor, &SwarmMember)>();
        for (transform, color, member) in query.iter(&self.world) {
            instance_data.push(SwarmInstance {
                position: transform.position.to_array(),
                _padding: 0.0,
                color: [color.r, color.g, color.b, member.phase / std::f32::consts::TAU],
            });
        }
        let swarm_count = instance_data.len().min(self.max_swarm);
        if swarm_count > 0 {
            self.queue.write_buffer(
                &self.swarm_instance_buffer,
                0,
                bytemuck::cast_slice(&instance_data[..swarm_count]),
            );
        }

        self.queue.write_buffer(
            &self.player_mesh.instance_buffer,
            0,
            bytemuck::cast_slice(&[MeshInstance::at(self.player.position)]),
        );

        let time = self.start.elapsed().as_secs_f32();
        let uniforms = self.scene_uniforms(time);
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let fog = self.scene.fog.color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: fog[0] as f64,
                            g: fog[1] as f64,
                            b: fog[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // Opaque first: they write depth
            render_pass.set_pipeline(&self.mesh_pipeline);
            self.ground_mesh.draw(&mut render_pass);
            self.player_mesh.draw(&mut render_pass);

            if self.grass_count > 0 {
                render_pass.set_pipeline(&self.grass_pipeline);
                render_pass.set_vertex_buffer(0, self.blade_vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.grass_instance_buffer.slice(..));
                render_pass.set_index_buffer(self.blade_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..BLADE_INDICES.len() as u32, 0, 0..self.grass_count);
            }

            // Glow: additive, depth-tested, no depth writes
            if swarm_count > 0 {
                render_pass.set_pipeline(&self.swarm_pipeline);
                render_pass.set_vertex_buffer(0, self.cube_vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.swarm_instance_buffer.slice(..));
                render_pass.set_index_buffer(self.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..CUBE_INDICES.len() as u32, 0, 0..swarm_count as u32);
            }

            render_pass.set_pipeline(&self.ribbon_pipeline);
            self.ribbon_renderer.draw(&mut render_pass);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let stats = self.overlay.visible.then(|| self.debug_stats());
        self.overlay.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            stats.as_ref(),
            &mut self.controls,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let scene = SceneConfig::resolve(&cli)?;

    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title("Meadow Trails")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut state = pollster::block_on(State::new(window.clone(), scene))?;

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let response = state.overlay.handle_window_event(&window, event);
                if !response.consumed {
                    state.input.process_event(event);
                }

                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();

                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.resize(state.size)
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("GPU out of memory");
                                control_flow.exit();
                            }
                            Err(e) => log::warn!("{:?}", e),
                        }

                        state.input.end_frame();
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
