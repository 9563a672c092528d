//! Application event loop: window creation, async mount and load, and the
//! translation of winit events into scene input.
//!
//! The GPU context is built asynchronously. On native the runtime blocks on
//! it during `resumed`; on wasm it resolves in a `spawn_local` task and the
//! mounted lifecycle crosses back into the loop through an
//! [`winit::event_loop::EventLoopProxy`] user event. The model load is
//! spawned the same way and delivers its one-shot result as a second user
//! event, so the frame loop never waits on the network.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::crypto::EncryptedAsset;
use crate::error::Result;
use crate::input::InputEvent;
use crate::lifecycle::{SceneConfig, SceneLifecycle};
use crate::loader::{CharacterFragment, LoadOptions, ModelLoader};
use crate::render::context::GpuContext;
use crate::services::{NullTimeline, SharedProgress};

/// Messages resolved outside the frame loop and injected back through the
/// event loop proxy.
pub enum SceneEvent {
    #[cfg(target_arch = "wasm32")]
    Mounted(Box<SceneLifecycle<GpuContext>>),
    Loaded(Box<Result<CharacterFragment>>),
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<SceneEvent>,
    window: Option<Arc<Window>>,
    lifecycle: Option<SceneLifecycle<GpuContext>>,
    asset: EncryptedAsset,
    config: SceneConfig,
    progress: SharedProgress,
}

impl App {
    fn new(event_loop: &EventLoop<SceneEvent>, asset: EncryptedAsset, config: SceneConfig) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let runtime = tokio::runtime::Runtime::new().expect("failed to start the async runtime");
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            runtime,
            proxy,
            window: None,
            lifecycle: None,
            asset,
            config,
            progress: SharedProgress::new(),
        }
    }

    /// Kick off the fetch-decrypt-parse pipeline off the frame loop.
    fn spawn_load(&mut self) {
        if let Some(lifecycle) = self.lifecycle.as_mut() {
            lifecycle.begin_loading();
        }
        let loader = ModelLoader::new(self.asset.clone(), LoadOptions::default());
        let mut progress = self.progress.clone();
        let proxy = self.proxy.clone();

        #[cfg(not(target_arch = "wasm32"))]
        self.runtime.spawn(async move {
            let result = loader.load(&mut progress).await;
            if proxy.send_event(SceneEvent::Loaded(Box::new(result))).is_err() {
                log::warn!("event loop closed before the character finished loading");
            }
        });

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            let result = loader.load(&mut progress).await;
            if proxy.send_event(SceneEvent::Loaded(Box::new(result))).is_err() {
                log::warn!("event loop closed before the character finished loading");
            }
        });
    }

    fn dispatch(&mut self, event: InputEvent) {
        if let Some(lifecycle) = self.lifecycle.as_mut() {
            lifecycle.dispatch(&event);
        }
    }
}

impl ApplicationHandler<SceneEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .expect("failed to create the window"),
        );
        self.window = Some(window.clone());
        let size = window.inner_size();
        let config = self.config.clone();
        let progress = self.progress.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let context = match self.runtime.block_on(GpuContext::new(window.clone())) {
                Ok(context) => context,
                Err(e) => {
                    log::error!("GPU context initialization failed: {e}");
                    event_loop.exit();
                    return;
                }
            };
            self.lifecycle = Some(SceneLifecycle::mount(
                context,
                (size.width, size.height),
                config,
                Box::new(NullTimeline),
                progress,
            ));
            self.spawn_load();
            window.request_redraw();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let context = GpuContext::new(window)
                    .await
                    .expect_throw("GPU context initialization failed");
                let lifecycle = SceneLifecycle::mount(
                    context,
                    (size.width, size.height),
                    config,
                    Box::new(NullTimeline),
                    progress,
                );
                assert!(
                    proxy
                        .send_event(SceneEvent::Mounted(Box::new(lifecycle)))
                        .is_ok()
                );
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            SceneEvent::Mounted(lifecycle) => {
                // The message from our wasm `spawn_local`
                self.lifecycle = Some(*lifecycle);
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    if let Some(lifecycle) = self.lifecycle.as_mut() {
                        lifecycle.resize(size.width, size.height);
                    }
                    window.request_redraw();
                }
                self.spawn_load();
            }
            SceneEvent::Loaded(result) => {
                if let Some(lifecycle) = self.lifecycle.as_mut() {
                    lifecycle.apply_load_result(*result);
                } else {
                    log::warn!("load finished before the scene was mounted, dropping the result");
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
        match event {
            WindowEvent::CloseRequested => {
                if let Some(lifecycle) = self.lifecycle.as_mut() {
                    lifecycle.teardown();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(lifecycle) = self.lifecycle.as_mut() {
                    lifecycle.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.dispatch(InputEvent::PointerMove {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }
            WindowEvent::CursorEntered { .. } => self.dispatch(InputEvent::HoverEnter),
            WindowEvent::CursorLeft { .. } => self.dispatch(InputEvent::HoverLeave),
            WindowEvent::Touch(Touch {
                phase, location, ..
            }) => {
                let (x, y) = (location.x as f32, location.y as f32);
                match phase {
                    TouchPhase::Started => self.dispatch(InputEvent::TouchStart { x, y }),
                    TouchPhase::Moved => self.dispatch(InputEvent::TouchMove { x, y }),
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        self.dispatch(InputEvent::TouchEnd)
                    }
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                // A click behaves like entering the hover region on devices
                // without a persistent pointer.
                self.dispatch(InputEvent::HoverEnter);
            }
            WindowEvent::RedrawRequested => {
                if let Some(lifecycle) = self.lifecycle.as_mut() {
                    lifecycle.frame();
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Run the character scene until the window closes.
pub fn run(asset: EncryptedAsset, config: SceneConfig) -> anyhow::Result<()> {
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

    let event_loop: EventLoop<SceneEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, asset, config);
    event_loop.run_app(&mut app)?;

    Ok(())
}

/// WASM entry point; the page supplies the asset location and passphrase
/// via query-friendly strings.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start(source_location: String, passphrase: String) {
    let asset = EncryptedAsset {
        source_location,
        passphrase,
    };
    if let Err(e) = run(asset, SceneConfig::default()) {
        log::error!("scene exited with an error: {e}");
    }
}
