//! Where the process runs, and therefore which engine and solver set apply.
//!
//! The context is probed once, at the front-end boundary, with [`ExecutionContext::detect`].
//! Everything below the front-ends takes it as an explicit parameter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Execution context of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Native process; the solver is the `minizinc` executable run as a subprocess.
    Native,
    /// Browser (page or worker); the solver is the MiniZinc WebAssembly build.
    Sandboxed,
}

static DETECTED: OnceLock<ExecutionContext> = OnceLock::new();

impl ExecutionContext {
    /// Probe the environment once and cache the answer for the life of the process.
    ///
    /// Never fails: when the probe is inconclusive the answer is `Native`.
    pub fn detect() -> ExecutionContext {
        *DETECTED.get_or_init(|| {
            let context = if has_browser_global() {
                ExecutionContext::Sandboxed
            } else {
                ExecutionContext::Native
            };
            log::debug!("Detected execution context: {context}");
            context
        })
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionContext::Native => "native",
            ExecutionContext::Sandboxed => "sandboxed",
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(target_arch = "wasm32")]
fn has_browser_global() -> bool {
    use wasm_bindgen::JsValue;

    let global = js_sys::global();
    let has = |name: &str| js_sys::Reflect::has(&global, &JsValue::from_str(name)).unwrap_or(false);

    // a page has `window`/`document`; a dedicated worker has `importScripts`
    has("window") || has("document") || has("importScripts")
}

#[cfg(not(target_arch = "wasm32"))]
fn has_browser_global() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_arch = "wasm32"))]
    fn test_native_build_detects_native() {
        assert_eq!(ExecutionContext::detect(), ExecutionContext::Native);
    }

    #[test]
    fn test_detection_is_cached() {
        let first = ExecutionContext::detect();
        for _ in 0..3 {
            assert_eq!(ExecutionContext::detect(), first);
        }
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&ExecutionContext::Sandboxed).unwrap(), "\"sandboxed\"");
        assert_eq!(ExecutionContext::Native.to_string(), "native");
    }
}
