//! Browser engine: the MiniZinc WebAssembly build, driven through its JavaScript client.
//!
//! The page must load the `minizinc` browser bundle first, which defines the global
//! `MiniZinc` object. There is no filesystem here; the model text is handed over in memory.
//! The engine is single-threaded and has no queue, so a session must never run two
//! solves at once (which `Session::solve` taking `&mut self` already guarantees).

use super::{Engine, EngineFailure, EngineRequest};
use crate::normalize::RawResponse;
use js_sys::Promise;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = MiniZinc, js_name = init, catch)]
    fn minizinc_init(config: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = MiniZinc)]
    type Model;

    #[wasm_bindgen(constructor, js_namespace = MiniZinc, catch)]
    fn new() -> Result<Model, JsValue>;

    #[wasm_bindgen(method, js_name = addFile, catch)]
    fn add_file(this: &Model, name: &str, contents: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = addJson, catch)]
    fn add_json(this: &Model, data: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn solve(this: &Model, config: &JsValue) -> Result<Promise, JsValue>;
}

/// Asset locations passed to `MiniZinc.init`. Unset fields use the bundle's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(rename = "workerURL", skip_serializing_if = "Option::is_none")]
    pub worker_url: Option<String>,
    #[serde(rename = "wasmURL", skip_serializing_if = "Option::is_none")]
    pub wasm_url: Option<String>,
    #[serde(rename = "dataURL", skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
}

/// A loaded MiniZinc browser engine.
#[derive(Debug)]
pub struct BrowserEngine;

/// Readable text for a JS value (thrown error or otherwise).
fn js_text(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    if let Some(text) = value.as_string() {
        return text;
    }
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, EngineFailure> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| EngineFailure::new(format!("cannot convert value for MiniZinc: {e}")))
}

impl Engine for BrowserEngine {
    type Config = BrowserConfig;

    async fn load(config: BrowserConfig) -> Result<Self, EngineFailure> {
        let present = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("MiniZinc"))
            .map(|v| !v.is_undefined() && !v.is_null())
            .unwrap_or(false);
        if !present {
            return Err(EngineFailure::new("the MiniZinc JavaScript bundle is not loaded (no global `MiniZinc`)"));
        }

        let promise = minizinc_init(&to_js(&config)?).map_err(|e| EngineFailure::new(js_text(&e)))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| EngineFailure::new(format!("MiniZinc assets failed to load: {}", js_text(&e))))?;

        info!("MiniZinc browser engine ready");
        Ok(BrowserEngine)
    }

    async fn run(&self, request: &EngineRequest<'_>) -> Result<RawResponse, EngineFailure> {
        let fail = |e: JsValue| EngineFailure::new(js_text(&e));

        let model = Model::new().map_err(fail)?;
        model.add_file("model.mzn", request.model_text).map_err(fail)?;
        model.add_json(&to_js(&request.payload.to_json())?).map_err(fail)?;

        let options = json!({
            "options": {
                "solver": request.solver_id,
                "time-limit": u64::try_from(request.time_limit.as_millis()).unwrap_or(u64::MAX),
                "statistics": request.statistics,
                "all-solutions": request.collect_all_solutions,
            },
            "jsonOutput": true,
        });

        let progress = model.solve(&to_js(&options)?).map_err(fail)?;
        let result = JsFuture::from(progress).await.map_err(fail)?;

        match serde_wasm_bindgen::from_value::<serde_json::Value>(result.clone()) {
            Ok(value) => Ok(RawResponse::Object(value)),
            Err(e) => {
                debug!("Result object is not plain data ({e}); passing it on as text");
                Ok(RawResponse::Text(js_text(&result)))
            }
        }
    }
}
