#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use sha2::{Digest, Sha256};

use figurine::render::DrawTarget;
use figurine::scene::camera::Camera;
use figurine::scene::lighting::LightRig;
use figurine::scene::SceneGraph;
use figurine::services::TimelineService;
use figurine::CharacterFragment;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// Encrypt plaintext the way the shipped asset is packaged: a 16-byte IV
/// followed by AES-256-CBC ciphertext keyed by the passphrase digest.
pub(crate) fn encrypt_fixture(plaintext: &[u8], passphrase: &str, iv: [u8; 16]) -> Vec<u8> {
    let digest = Sha256::digest(passphrase.as_bytes());
    let cipher = Aes256CbcEnc::new_from_slices(&digest[..32], &iv).unwrap();
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let mut blob = iv.to_vec();
    blob.extend_from_slice(&ciphertext);
    blob
}

/// Hand-packed binary glTF container: one triangle mesh, an armature with
/// two joints (`spine006`, `footR`), and a one-second `intro` rotation clip.
pub(crate) fn tiny_glb() -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    for v in positions {
        bin.extend_from_slice(&v.to_le_bytes());
    }
    let indices: [u16; 3] = [0, 1, 2];
    for i in indices {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    // Pad so the float accessors stay 4-byte aligned.
    bin.extend_from_slice(&[0u8; 2]);
    for t in [0.0f32, 1.0] {
        bin.extend_from_slice(&t.to_le_bytes());
    }
    let rotations: [[f32; 4]; 2] = [
        [0.0, 0.0, 0.0, 1.0],
        [0.0, 0.707_106_78, 0.0, 0.707_106_78],
    ];
    for q in rotations {
        for c in q {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    assert_eq!(bin.len(), 84);

    let json = r#"{
  "asset": {"version": "2.0"},
  "scene": 0,
  "scenes": [{"nodes": [2]}],
  "nodes": [
    {"name": "body", "mesh": 0},
    {"name": "spine006", "rotation": [0.0, 0.0, 0.0, 1.0]},
    {"name": "Armature", "children": [0, 1, 3]},
    {"name": "footR", "translation": [0.0, 0.0, 0.0]}
  ],
  "skins": [{"joints": [1, 3]}],
  "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}],
  "animations": [{
    "name": "intro",
    "channels": [{"sampler": 0, "target": {"node": 1, "path": "rotation"}}],
    "samplers": [{"input": 2, "output": 3, "interpolation": "LINEAR"}]
  }],
  "buffers": [{"byteLength": 84}],
  "bufferViews": [
    {"buffer": 0, "byteOffset": 0, "byteLength": 36},
    {"buffer": 0, "byteOffset": 36, "byteLength": 6},
    {"buffer": 0, "byteOffset": 44, "byteLength": 8},
    {"buffer": 0, "byteOffset": 52, "byteLength": 32}
  ],
  "accessors": [
    {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
     "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
    {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"},
    {"bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR",
     "min": [0.0], "max": [1.0]},
    {"bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC4"}
  ]
}"#;

    let mut json_chunk = json.as_bytes().to_vec();
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }

    let total = 12 + 8 + json_chunk.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json_chunk);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(&bin);
    glb
}

/// Draw target that counts invocations instead of touching a GPU.
#[derive(Default)]
pub(crate) struct CountingTarget {
    pub warm_ups: usize,
    pub draws: usize,
    pub resizes: usize,
    pub dispose_calls: usize,
    pub fail_warm_up: bool,
    disposed: bool,
}

impl CountingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_warm_up() -> Self {
        Self {
            fail_warm_up: true,
            ..Self::default()
        }
    }
}

impl DrawTarget for CountingTarget {
    fn resize(&mut self, _width: u32, _height: u32) {
        self.resizes += 1;
    }

    fn warm_up(&mut self, _fragment: &CharacterFragment, _camera: &Camera) -> anyhow::Result<()> {
        self.warm_ups += 1;
        if self.fail_warm_up {
            anyhow::bail!("simulated shader compilation failure");
        }
        Ok(())
    }

    fn draw(
        &mut self,
        _scene: &SceneGraph,
        _camera: &Camera,
        _rig: &LightRig,
    ) -> anyhow::Result<()> {
        self.draws += 1;
        Ok(())
    }

    fn dispose(&mut self) {
        self.dispose_calls += 1;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Timeline service that records how often each hook was bound.
pub(crate) struct RecordingTimeline {
    character_binds: Rc<Cell<usize>>,
    global_binds: Rc<Cell<usize>>,
}

impl RecordingTimeline {
    pub fn new() -> (Self, Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let character_binds = Rc::new(Cell::new(0));
        let global_binds = Rc::new(Cell::new(0));
        (
            Self {
                character_binds: Rc::clone(&character_binds),
                global_binds: Rc::clone(&global_binds),
            },
            character_binds,
            global_binds,
        )
    }
}

impl TimelineService for RecordingTimeline {
    fn bind_character_timeline(&mut self, _scene: &SceneGraph, _camera: &Camera) {
        self.character_binds.set(self.character_binds.get() + 1);
    }

    fn bind_global_timelines(&mut self) {
        self.global_binds.set(self.global_binds.get() + 1);
    }
}
