// Reusable library API — visible to both CLI and WASM builds
pub mod capability;
pub mod context;
pub mod engine;
pub mod errors;
pub mod log;
pub mod normalize;
pub mod payload;
pub mod pipeline;
pub mod result;
pub mod roster;
pub mod scenario;
pub mod session;
pub mod teams;

// Compile the wasm glue only when targeting wasm32.
#[cfg(target_arch = "wasm32")]
pub mod wasm;
