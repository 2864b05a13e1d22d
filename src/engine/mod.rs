//! Engine clients: the seam between a [`Session`](crate::session::Session) and a MiniZinc build.
//!
//! An engine takes model text, a data payload and solver options, and hands back the
//! response exactly as its client produced it. Interpreting that response is the
//! [normalizer's](crate::normalize) job, enforcing the time limit is the session's.

#[cfg(target_arch = "wasm32")]
pub mod browser;
#[cfg(not(target_arch = "wasm32"))]
pub mod native;

use crate::normalize::RawResponse;
use crate::payload::ModelPayload;
use std::time::Duration;

/// Everything one engine run needs.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    pub model_text: &'a str,
    pub payload: &'a ModelPayload,
    pub solver_id: &'a str,
    pub time_limit: Duration,
    pub collect_all_solutions: bool,
    /// Always requested by the session; kept explicit so engines don't guess.
    pub statistics: bool,
}

/// The engine could not be reached, or reported a failure instead of a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct EngineFailure {
    pub detail: String,
}

impl EngineFailure {
    pub fn new(detail: impl Into<String>) -> Self {
        EngineFailure { detail: detail.into() }
    }
}

/// A loaded solver engine.
///
/// `load` is called once per session from [`Session::init`](crate::session::Session::init);
/// `run` once per solve. Engines are single-owner handles and need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait Engine: Sized {
    /// Whatever the engine needs to locate and start its backend.
    type Config;

    /// Locate and load the engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineFailure`] if the engine is unreachable or fails to load.
    async fn load(config: Self::Config) -> Result<Self, EngineFailure>;

    /// Run one model to completion (or to the engine's own time limit).
    ///
    /// # Errors
    ///
    /// Returns [`EngineFailure`] if the engine exits with an error or throws.
    async fn run(&self, request: &EngineRequest<'_>) -> Result<RawResponse, EngineFailure>;
}

/// Suspend the current task for `duration`.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Suspend the current task for `duration`, via the global `setTimeout`
/// (available in pages and workers alike).
#[cfg(target_arch = "wasm32")]
pub(crate) async fn sleep(duration: Duration) {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_name = setTimeout)]
        fn set_timeout(handler: &js_sys::Function, timeout: i32) -> JsValue;
    }

    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        set_timeout(&resolve, millis);
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}
