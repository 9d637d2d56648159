// WebAssembly bindings for in-browser blink decoding
use blinkmorse_core::{parse_model, patterns, Classifier, DecodeEvent, Session};
use js_sys::Array;
use wasm_bindgen::prelude::*;

mod support;

// Console logging for debugging
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

fn to_js(event: Option<DecodeEvent>) -> Result<JsValue, JsValue> {
    match event {
        Some(event) => serde_wasm_bindgen::to_value(&event).map_err(JsValue::from),
        None => Ok(JsValue::NULL),
    }
}

/// One camera stream. Feed it a frame per animation tick and read back
/// decode events as plain objects: `{ status, char?, message, sequence, symbol? }`.
#[wasm_bindgen]
pub struct BlinkSession {
    inner: Session,
}

#[wasm_bindgen]
impl BlinkSession {
    /// Malformed config falls back to the defaults with a console warning
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> BlinkSession {
        let (config, error) = support::config_with_defaults(config_json);
        if let Some(e) = error {
            console_warn(&format!("blinkmorse: {e}, using default config"));
        }
        BlinkSession {
            inner: Session::new(config),
        }
    }

    /// `points` holds 24 numbers (`x, y` for six left-eye then six right-eye
    /// landmarks), or is empty when no face was detected. Returns `null` when
    /// nothing happened this frame.
    #[wasm_bindgen(js_name = ingestLandmarks)]
    pub fn ingest_landmarks(&mut self, points: &[f64], t: f64) -> Result<JsValue, JsValue> {
        let landmarks = support::landmarks_from_points(points).map_err(|e| JsValue::from_str(&e))?;
        to_js(self.inner.ingest(landmarks.as_ref(), t))
    }

    #[wasm_bindgen(js_name = ingestEar)]
    pub fn ingest_ear(&mut self, ear: Option<f64>, t: f64) -> Result<JsValue, JsValue> {
        to_js(self.inner.ingest_ear(ear, t))
    }

    /// Time-only advance; always returns an event
    pub fn tick(&mut self, t: f64) -> Result<JsValue, JsValue> {
        to_js(Some(self.inner.tick(t)))
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.inner.message().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn sequence(&self) -> String {
        self.inner.sequence()
    }

    #[wasm_bindgen(getter)]
    pub fn threshold(&self) -> f64 {
        self.inner.threshold()
    }

    #[wasm_bindgen(getter, js_name = modelBacked)]
    pub fn model_backed(&self) -> bool {
        self.inner.classifier().is_model_backed()
    }

    /// Install a calibrated profile from the `_data.json` / `_model.json`
    /// artifacts. On error the current classifier is kept.
    #[wasm_bindgen(js_name = loadProfile)]
    pub fn load_profile(&mut self, data_json: &str, model_json: Option<String>) -> Result<bool, JsValue> {
        let bundle = parse_model(data_json, model_json.as_deref())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let has_network = bundle.network.is_some();
        self.inner.set_classifier(Classifier::from_bundle(bundle));
        console_log!(
            "blinkmorse: profile loaded ({})",
            if has_network { "network" } else { "threshold only" }
        );
        Ok(has_network)
    }
}

/// Morse pattern for the first character of `character`, e.g. `"A"` -> `".-"`
#[wasm_bindgen(js_name = morsePattern)]
pub fn morse_pattern(character: &str) -> Option<String> {
    support::first_char(character)
        .and_then(patterns::pattern_for)
        .map(str::to_string)
}

/// Full table as `[{ char, pattern }, ...]` for the on-screen chart
#[wasm_bindgen(js_name = morseChart)]
pub fn morse_chart() -> Result<Array, JsValue> {
    let array = Array::new();
    for (ch, pattern) in patterns::table() {
        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"char".into(), &ch.to_string().into())?;
        js_sys::Reflect::set(&obj, &"pattern".into(), &pattern.into())?;
        array.push(&obj);
    }
    Ok(array)
}
