//! Application event loop.
//!
//! Owns the window and drives the [`Showroom`] from winit events. Start-up
//! creates the GPU context and renderer, then spawns one background load per
//! asset. Loads report back through the event loop proxy as
//! [`ShowroomEvent::Loaded`], so all GPU uploads happen on the event-loop
//! thread.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and the [`AppState`]
//! 2. the environment, model, lookup table and marker sprite load in parallel
//! 3. every redraw advances the showroom one frame and renders it
//! 4. pointer, keyboard and resize events are forwarded to the showroom

use std::sync::Arc;

use image::DynamicImage;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    assets::AssetKind,
    config::Config,
    context::Context,
    render::Renderer,
    resources::{self, StudioAsset, hdr::EnvironmentMap, lut::Lut3d},
    sketch::{Shortcut, Showroom},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Result of one background asset load.
pub enum Loaded {
    Environment(anyhow::Result<EnvironmentMap>),
    Model(anyhow::Result<StudioAsset>),
    Lut(anyhow::Result<Lut3d>),
    MarkerSprite(anyhow::Result<DynamicImage>),
}

impl Loaded {
    pub fn kind(&self) -> AssetKind {
        match self {
            Loaded::Environment(_) => AssetKind::Environment,
            Loaded::Model(_) => AssetKind::Model,
            Loaded::Lut(_) => AssetKind::Lut,
            Loaded::MarkerSprite(_) => AssetKind::MarkerSprite,
        }
    }
}

pub enum ShowroomEvent {
    #[allow(dead_code)]
    Initialized(anyhow::Result<Box<AppState>>),
    Loaded(Loaded),
}

impl std::fmt::Debug for ShowroomEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(result) => f
                .debug_tuple("Initialized")
                .field(&result.is_ok())
                .finish(),
            Self::Loaded(loaded) => f.debug_tuple("Loaded").field(&loaded.kind()).finish(),
        }
    }
}

/// Map a key press to a showroom control. Digits pick labels.
pub fn shortcut_for(key: &Key) -> Option<Shortcut> {
    match key {
        Key::Named(NamedKey::Escape) => Some(Shortcut::Reset),
        Key::Named(NamedKey::Tab) => Some(Shortcut::CycleColor),
        Key::Named(NamedKey::Space) => Some(Shortcut::TogglePlay),
        Key::Character(c) => match c.as_str() {
            "r" | "R" => Some(Shortcut::Reset),
            s => s
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=9).contains(n))
                .map(Shortcut::Label),
        },
        _ => None,
    }
}

pub struct AppState {
    ctx: Context,
    showroom: Showroom,
    renderer: Renderer,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: Config) -> anyhow::Result<AppState> {
        let ctx = Context::new(window.clone()).await?;
        let scale = window.scale_factor();
        let logical = window.inner_size().to_logical::<f64>(scale);
        let showroom = Showroom::new(
            config,
            logical.width.round() as u32,
            logical.height.round() as u32,
            scale,
        );
        let renderer = Renderer::new(&ctx, &showroom)?;
        Ok(Self {
            ctx,
            showroom,
            renderer,
            is_surface_configured: false,
        })
    }

    /// `width` and `height` are physical pixels.
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.ctx.configure_surface();
            self.is_surface_configured = true;

            let scale = self.ctx.window().scale_factor();
            let logical = winit::dpi::PhysicalSize::new(width, height).to_logical::<f64>(scale);
            self.showroom.resize_with_ratio(
                logical.width.round() as u32,
                logical.height.round() as u32,
                scale,
            );
            self.renderer.resize(&self.ctx, &self.showroom);
        }
    }

    fn on_loaded(&mut self, loaded: Loaded) {
        let kind = loaded.kind();
        let result = match loaded {
            Loaded::Environment(env) => env.map(|env| {
                self.renderer.set_environment(&self.ctx, &env);
                self.showroom.attach_environment();
            }),
            Loaded::Model(asset) => asset.map(|asset| {
                let StudioAsset {
                    root,
                    meshes,
                    materials,
                    images,
                } = asset;
                self.showroom.attach_model(root);
                if let Some(root) = self.showroom.studio() {
                    self.renderer
                        .upload_studio(&self.ctx, &meshes, &materials, &images, root);
                }
            }),
            Loaded::Lut(lut) => lut.map(|lut| {
                self.showroom.attach_lut(lut.table());
                self.renderer.set_lut(&self.ctx, &lut, &self.showroom);
            }),
            Loaded::MarkerSprite(img) => img
                .and_then(|img| self.renderer.set_marker_sprite(&self.ctx, &img))
                .map(|()| {
                    self.showroom
                        .assets_mut()
                        .finish(AssetKind::MarkerSprite, Ok(()))
                }),
        };
        if let Err(e) = result {
            self.showroom
                .assets_mut()
                .finish(kind, Err(format!("{e:#}")));
        }
        self.ctx.window().request_redraw();
    }

    fn redraw(&mut self, dt: instant::Duration) {
        // invoke main render loop
        self.ctx.window().request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return;
        }
        let Some(plan) = self.showroom.frame(dt) else {
            return;
        };
        match self.renderer.render(&self.ctx, &mut self.showroom, &plan) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.ctx.window().inner_size();
                self.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {}", e),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ShowroomEvent>,
    config: Option<Config>,
    state: Option<AppState>,
    error: Option<anyhow::Error>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<ShowroomEvent>, config: Config) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config: Some(config),
            state: None,
            error: None,
            last_time: Instant::now(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("showroom failed to start: {error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn initialized(&mut self, mut state: AppState) {
        let size = state.ctx.window().inner_size();
        state.resize(size.width, size.height);
        self.start_loads(&mut state);
        state.ctx.window().request_redraw();
        self.state = Some(state);
    }

    /// Kick off every asset load; each reports back independently.
    fn start_loads(&self, state: &mut AppState) {
        let config = state.showroom.config().clone();
        let assets = state.showroom.assets_mut();
        assets.start(AssetKind::Environment, &config.environment_path);
        assets.start(AssetKind::Model, &config.model_path);
        assets.start(AssetKind::Lut, &config.lut_path);
        assets.start(AssetKind::MarkerSprite, &config.marker_sprite_path);

        let Config {
            environment_path,
            model_path,
            lut_path,
            marker_sprite_path,
            ..
        } = config;
        self.spawn_load(async move { Loaded::Environment(resources::load_environment(&environment_path).await) });
        self.spawn_load(async move { Loaded::Model(resources::load_studio(&model_path).await) });
        self.spawn_load(async move { Loaded::Lut(resources::load_lut(&lut_path).await) });
        self.spawn_load(async move { Loaded::MarkerSprite(resources::load_image(&marker_sprite_path).await) });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_load<F>(&self, load: F)
    where
        F: Future<Output = Loaded> + Send + 'static,
    {
        let proxy = self.proxy.clone();
        self.async_runtime.spawn(async move {
            let loaded = load.await;
            if proxy.send_event(ShowroomEvent::Loaded(loaded)).is_err() {
                log::warn!("event loop closed before an asset finished loading");
            }
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_load<F>(&self, load: F)
    where
        F: Future<Output = Loaded> + 'static,
    {
        let proxy = self.proxy.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let loaded = load.await;
            if proxy.send_event(ShowroomEvent::Loaded(loaded)).is_err() {
                log::warn!("event loop closed before an asset finished loading");
            }
        });
    }
}

impl ApplicationHandler<ShowroomEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.config.take() else {
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(config.title.clone());

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "app";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(AppState::new(window, config)) {
                Ok(state) => self.initialized(state),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = AppState::new(window, config).await.map(Box::new);
                assert!(proxy.send_event(ShowroomEvent::Initialized(state)).is_ok());
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ShowroomEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            ShowroomEvent::Initialized(result) => match result {
                Ok(state) => self.initialized(*state),
                Err(e) => self.fail(event_loop, e),
            },
            ShowroomEvent::Loaded(loaded) => {
                if let Some(state) = &mut self.state {
                    state.on_loaded(loaded);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                state.redraw(dt);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let scale = state.ctx.window().scale_factor();
                let logical = position.to_logical::<f32>(scale);
                state.showroom.pointer_moved(logical.x, logical.y);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => state.showroom.pointer_pressed(),
                ElementState::Released => {
                    if let Some(idx) = state.showroom.pointer_released() {
                        log::info!("label {} clicked", idx + 1);
                    }
                }
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(shortcut) = shortcut_for(&logical_key) {
                    state.showroom.on_shortcut(shortcut);
                }
            }
            _ => {}
        }
    }
}

/// Open the showroom window and block until it closes.
pub fn run(config: Config) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ShowroomEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
