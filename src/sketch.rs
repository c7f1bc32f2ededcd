//! The showroom composition root.
//!
//! [`Showroom`] owns every piece of configurator state that does not need a
//! GPU: viewport, camera and orbit controls, the camera transition, part
//! materials, the loaded scene graph, post chain parameters, annotations,
//! panels and asset bookkeeping. The renderer reads it once per frame and
//! uploads whatever changed, so the whole interaction model can be driven
//! and inspected without a device.

use anyhow::Context;
use cgmath::{Deg, Point3, Vector2};
use instant::{Duration, Instant};

use crate::{
    annotation::{Annotation, Label, LabelOverlay, Panels, default_annotations},
    assets::{AssetKind, AssetTracker},
    camera::{Camera, OrbitControls, Projection},
    config::Config,
    data_structures::{
        material::{Color, MaterialSet, Part, next_swatch},
        scene_graph::{BindingReport, PartManifest, SceneNode},
    },
    post::{BloomParams, LutTable, OutputParams, PostChain},
    tween::TransitionSlot,
};

/// Pointer travel, in logical pixels, below which a press-release is a click.
const CLICK_SLOP: f32 = 4.0;
/// Shader clock increment per rendered frame.
const TIME_STEP: f32 = 0.05;

/// Logical size of the drawing surface and its device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    pixel_ratio: f64,
}

impl Viewport {
    /// A zero-size container is treated as 1x1; the ratio is capped at
    /// `max_pixel_ratio`.
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(max_pixel_ratio)
        } else {
            1.0
        };
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Size of the backing buffer in device pixels.
    pub fn drawing_buffer_size(&self) -> [u32; 2] {
        [
            ((self.width as f64 * self.pixel_ratio).round() as u32).max(1),
            ((self.height as f64 * self.pixel_ratio).round() as u32).max(1),
        ]
    }
}

/// Last pointer position and movement, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
    pub position: Option<Vector2<f32>>,
    pub velocity: Vector2<f32>,
    pub pressed: bool,
    travel: f32,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            position: None,
            velocity: Vector2::new(0.0, 0.0),
            pressed: false,
            travel: 0.0,
        }
    }
}

impl PointerState {
    /// Record a move and return the delta since the previous position.
    pub fn moved(&mut self, x: f32, y: f32) -> Vector2<f32> {
        let next = Vector2::new(x, y);
        let delta = match self.position {
            Some(prev) => next - prev,
            None => Vector2::new(0.0, 0.0),
        };
        self.position = Some(next);
        self.velocity = delta;
        if self.pressed {
            self.travel += (delta.x * delta.x + delta.y * delta.y).sqrt();
        }
        delta
    }

    pub fn press(&mut self) {
        self.pressed = true;
        self.travel = 0.0;
    }

    /// Returns true when the press ended without dragging.
    pub fn release(&mut self) -> bool {
        let was_click = self.pressed && self.travel <= CLICK_SLOP;
        self.pressed = false;
        self.velocity = Vector2::new(0.0, 0.0);
        was_click
    }
}

/// Keyboard stand-ins for the label, reset and color-picker controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    /// 1-based label number.
    Label(usize),
    Reset,
    CycleColor,
    TogglePlay,
}

/// What the renderer should draw this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    pub time: f32,
    /// False while waiting for assets; only the clear color is drawn.
    pub draw_scene: bool,
    pub model_present: bool,
    pub environment_present: bool,
    /// Run the full post chain; otherwise tone map straight to the surface.
    pub post_enabled: bool,
    pub labels: Vec<Label>,
}

#[derive(Debug)]
pub struct Showroom {
    config: Config,
    viewport: Viewport,
    camera: Camera,
    projection: Projection,
    controls: OrbitControls,
    transition: TransitionSlot,
    home: Point3<f32>,
    focused: Option<usize>,
    materials: MaterialSet,
    manifest: PartManifest,
    studio: Option<SceneNode>,
    binding: Option<BindingReport>,
    post: PostChain,
    annotations: Vec<Annotation>,
    labels: LabelOverlay,
    panels: Panels,
    assets: AssetTracker,
    pointer: PointerState,
    environment_present: bool,
    playing: bool,
    time: f32,
}

impl Showroom {
    pub fn new(config: Config, width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        let viewport = Viewport::new(width, height, device_pixel_ratio, config.max_pixel_ratio);
        let home = home_position(&config, viewport.width());
        let camera = Camera::new(home, config.home_target);
        let projection = Projection::new(
            viewport.width(),
            viewport.height(),
            Deg(config.fovy_degrees),
            config.znear,
            config.zfar,
        );
        let mut controls = OrbitControls::new(config.home_target);
        controls.damping_factor = config.damping_factor;
        controls.enable_zoom = false;
        controls.max_polar_angle = config.max_polar_degrees.to_radians();

        let materials = MaterialSet::build(config.colors.clone());
        let post = PostChain::new(BloomParams::default(), OutputParams::default(), &viewport);
        let annotations = default_annotations();
        let labels = LabelOverlay::new(
            annotations.len(),
            viewport.width() as f32,
            viewport.height() as f32,
        );

        log::info!(
            "showroom {}x{} @{}x, home at {:?}",
            viewport.width(),
            viewport.height(),
            viewport.pixel_ratio(),
            home
        );
        Self {
            manifest: config.manifest.clone(),
            assets: AssetTracker::new(config.asset_timeout),
            config,
            viewport,
            camera,
            projection,
            controls,
            transition: TransitionSlot::default(),
            home,
            focused: None,
            materials,
            studio: None,
            binding: None,
            post,
            annotations,
            labels,
            panels: Panels::new(),
            pointer: PointerState::default(),
            environment_present: false,
            playing: true,
            time: 0.0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn transition(&self) -> &TransitionSlot {
        &self.transition
    }

    /// The current responsive home position; the home target is fixed.
    pub fn home(&self) -> (Point3<f32>, Point3<f32>) {
        (self.home, self.config.home_target)
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn materials(&self) -> &MaterialSet {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialSet {
        &mut self.materials
    }

    pub fn manifest(&self) -> &PartManifest {
        &self.manifest
    }

    pub fn studio(&self) -> Option<&SceneNode> {
        self.studio.as_ref()
    }

    pub fn binding_report(&self) -> Option<&BindingReport> {
        self.binding.as_ref()
    }

    pub fn post(&self) -> &PostChain {
        &self.post
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn labels(&self) -> &LabelOverlay {
        &self.labels
    }

    pub fn panels(&self) -> &Panels {
        &self.panels
    }

    pub fn assets(&self) -> &AssetTracker {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetTracker {
        &mut self.assets
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Rebind the part materials onto a freshly loaded scene graph and keep it.
    pub fn attach_model(&mut self, mut root: SceneNode) -> &BindingReport {
        let report = self.manifest.bind(&mut root);
        if report.is_complete() {
            log::info!("bound {} nodes to part materials", report.bound.len());
        } else {
            log::warn!(
                "{} of {} part nodes are missing from the model",
                report.missing.len(),
                report.missing.len() + report.bound.len()
            );
        }
        self.studio = Some(root);
        self.assets.finish(AssetKind::Model, Ok(()));
        self.binding.insert(report)
    }

    pub fn attach_environment(&mut self) {
        self.environment_present = true;
        self.assets.finish(AssetKind::Environment, Ok(()));
    }

    pub fn attach_lut(&mut self, table: LutTable) {
        self.post.attach_lut(table);
        self.assets.finish(AssetKind::Lut, Ok(()));
    }

    pub fn environment_present(&self) -> bool {
        self.environment_present
    }

    pub fn on_color_changed(&mut self, part: Part, color: Color) {
        self.materials.set_color(part, color);
    }

    /// Parse a part name and `#rrggbb` color, as delivered by a color picker.
    pub fn on_color_changed_str(&mut self, part: &str, hex: &str) -> anyhow::Result<()> {
        let part: Part = part.parse()?;
        let color = Color::from_hex(hex).with_context(|| format!("color for {part}"))?;
        self.on_color_changed(part, color);
        Ok(())
    }

    /// Fly to an arbitrary pose, superseding any transition in flight.
    pub fn fly_to(&mut self, position: Point3<f32>, target: Point3<f32>) {
        self.controls.stop();
        self.transition.start(
            (self.camera.position, self.controls.target),
            (position, target),
        );
    }

    pub fn go_to_annotation(&mut self, annotation: &Annotation) {
        log::debug!("flying to {}", annotation.title);
        self.fly_to(annotation.position, annotation.target);
    }

    /// Label `index` (0-based) was clicked.
    pub fn click_label(&mut self, index: usize) -> bool {
        let Some(annotation) = self.annotations.get(index).cloned() else {
            return false;
        };
        self.panels.on_label_clicked(&annotation);
        self.go_to_annotation(&annotation);
        self.focused = Some(index);
        true
    }

    pub fn click_reset(&mut self) {
        self.panels.on_reset_clicked();
        self.fly_to(self.home, self.config.home_target);
        self.focused = None;
    }

    /// Advance the visible panel's part to the next preset color.
    pub fn cycle_panel_color(&mut self) -> Option<(Part, Color)> {
        let part = self.panels.visible_panel()?;
        let color = next_swatch(self.materials.registry().get(part));
        self.on_color_changed(part, color);
        Some((part, color))
    }

    pub fn on_shortcut(&mut self, shortcut: Shortcut) {
        match shortcut {
            Shortcut::Label(number) => {
                if number == 0 || !self.click_label(number - 1) {
                    log::debug!("no label {number}");
                }
            }
            Shortcut::Reset => self.click_reset(),
            Shortcut::CycleColor => {
                if let Some((part, color)) = self.cycle_panel_color() {
                    log::info!("{part} set to {color}");
                }
            }
            Shortcut::TogglePlay => self.playing = !self.playing,
        }
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let delta = self.pointer.moved(x, y);
        if self.pointer.pressed {
            self.controls
                .rotate(delta.x, delta.y, self.viewport.height() as f32);
        }
    }

    pub fn pointer_pressed(&mut self) {
        self.pointer.press();
    }

    /// Ends a press; a click without drag hits the labels. Returns the
    /// clicked label, if any.
    pub fn pointer_released(&mut self) -> Option<usize> {
        if !self.pointer.release() {
            return None;
        }
        let position = self.pointer.position?;
        let hit = self.labels.hit_test(position.x, position.y)?;
        self.click_label(hit);
        Some(hit)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.resize_with_ratio(width, height, self.viewport.pixel_ratio());
    }

    pub fn resize_with_ratio(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
        let was_narrow = is_narrow(&self.config, self.viewport.width());
        self.viewport = Viewport::new(width, height, device_pixel_ratio, self.config.max_pixel_ratio);
        self.projection
            .resize(self.viewport.width(), self.viewport.height());
        self.post.resize(&self.viewport);
        self.labels
            .resize(self.viewport.width() as f32, self.viewport.height() as f32);

        let narrow = is_narrow(&self.config, self.viewport.width());
        self.home = home_position(&self.config, self.viewport.width());
        let side_changed = was_narrow != narrow;
        let idle = self.focused.is_none() && !self.transition.is_running();
        if side_changed || idle {
            if self.transition.is_running() {
                self.transition.cancel();
            }
            self.controls.stop();
            self.camera.position = self.home;
        }
    }

    /// Advance one frame. Returns `None` while paused.
    pub fn frame(&mut self, dt: Duration) -> Option<FramePlan> {
        if !self.playing {
            return None;
        }
        self.time += TIME_STEP;
        self.assets.check_timeouts(Instant::now());

        if let Some((position, target)) = self.transition.step(dt.as_secs_f32()) {
            self.camera.position = position;
            self.controls.target = target;
        }
        self.controls.update(&mut self.camera);
        self.labels
            .update(&self.camera, &self.projection, &self.annotations);

        let draw_scene = !self.config.wait_for_assets || self.assets.all_settled();
        Some(FramePlan {
            time: self.time,
            draw_scene,
            model_present: self.studio.is_some(),
            environment_present: self.environment_present,
            post_enabled: self.config.post_processing,
            labels: if draw_scene {
                self.labels.labels().to_vec()
            } else {
                Vec::new()
            },
        })
    }
}

fn is_narrow(config: &Config, width: u32) -> bool {
    (width as f32) < config.breakpoint
}

fn home_position(config: &Config, width: u32) -> Point3<f32> {
    if is_narrow(config, width) {
        config.home_narrow
    } else {
        config.home_wide
    }
}
