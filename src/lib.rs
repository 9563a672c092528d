//! figurine
//!
//! A browser-hosted interactive 3D character scene, native-testable. The
//! character model ships as an AES-encrypted binary container; this crate
//! fetches and decrypts it, parses it into a tagged scene graph, and drives
//! a pointer-reactive render loop with guaranteed teardown. The design
//! emphasizes a single owned render surface, explicit disposal of every
//! GPU-backed resource, and graceful degradation to an empty scene when the
//! character cannot be loaded.
//!
//! High-level modules
//! - `crypto`: fetch and AES-256-CBC decryption of the packaged model
//! - `loader`: decrypted bytes to a renderable character fragment
//! - `scene`: tagged scene graph, camera, light rig
//! - `animation`: clip mixer and the intro/hover action triggers
//! - `input`: pointer/touch smoothing and the scoped listener registry
//! - `lifecycle`: mount, load delivery, per-frame stepping, teardown
//! - `render`: the draw-target seam and its wgpu implementation
//! - `services`: timeline choreography and loading-progress collaborators
//! - `app`: winit event loop glue for native and WASM
//!

pub mod animation;
pub mod app;
pub mod crypto;
pub mod error;
pub mod input;
pub mod lifecycle;
pub mod loader;
pub mod render;
pub mod scene;
pub mod services;

pub use app::run;
pub use crypto::EncryptedAsset;
pub use error::{PipelineError, Result};
pub use lifecycle::{LifecycleState, SceneConfig, SceneLifecycle};
pub use loader::{CharacterFragment, LoadOptions, ModelLoader};
pub use render::DrawTarget;
