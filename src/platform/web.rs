//! Browser bindings
//!
//! `WebMiniGame` wraps one engine for a JavaScript host: targets and events
//! cross the boundary as JSON, sound cues are played through `CueSynth`.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::capability::{Capabilities, CapabilityProbe, ProbeError, is_mobile_user_agent};
use crate::events::EngineEvent;
use crate::history::PlayHistory;
use crate::outcome::{GameKind, Outcome};
use crate::session::MiniGameEngine;
use crate::settings::EngineSettings;
use crate::tuning::Tuning;

use super::synth::CueSynth;

/// Reads capabilities from the browser
pub struct BrowserProbe;

impl CapabilityProbe for BrowserProbe {
    fn probe(&self) -> Result<Capabilities, ProbeError> {
        let window = web_sys::window().ok_or(ProbeError::NoWindow)?;
        let document = window.document().ok_or(ProbeError::NoWindow)?;
        let navigator = window.navigator();

        let agent = navigator
            .user_agent()
            .map_err(|_| ProbeError::Failed("user agent unavailable".into()))?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|_| ProbeError::Failed("cannot create canvas".into()))?
            .dyn_into()
            .map_err(|_| ProbeError::Failed("not a canvas".into()))?;
        let webgl2 = matches!(canvas.get_context("webgl2"), Ok(Some(_)));

        Ok(Capabilities {
            webgl2,
            mobile: is_mobile_user_agent(&agent),
            hardware_concurrency: navigator.hardware_concurrency() as u32,
            device_pixel_ratio: window.device_pixel_ratio() as f32,
        })
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) keeps the first logger
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Chance Rig loaded");
}

/// One mini-game mounted in the page
#[wasm_bindgen]
pub struct WebMiniGame {
    engine: MiniGameEngine,
    synth: Rc<RefCell<CueSynth>>,
}

#[wasm_bindgen]
impl WebMiniGame {
    /// `kind` is a game name ("dice", "wheel", ...); `tuning_json` overrides
    /// the default tuning document
    #[wasm_bindgen(constructor)]
    pub fn new(kind: &str, tuning_json: Option<String>) -> Result<WebMiniGame, JsValue> {
        let kind = GameKind::from_str(kind)
            .ok_or_else(|| js_error(format!("unknown mini-game '{kind}'")))?;
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(js_error)?,
            None => Tuning::default(),
        };
        let seed = js_sys::Date::now() as u64;
        let mut engine =
            MiniGameEngine::new(kind, EngineSettings::load(), tuning, &BrowserProbe, seed)
                .map_err(js_error)?
                .with_history(PlayHistory::load());

        let synth = Rc::new(RefCell::new(CueSynth::new()));
        {
            let synth = synth.clone();
            engine.on_event(move |event| {
                if let EngineEvent::Cue { cue } = event {
                    synth.borrow_mut().handle(cue);
                }
            });
        }
        Ok(Self { engine, synth })
    }

    /// Start a play from a target such as `{"kind":"dice","faces":[3,4]}`
    pub fn start_play(&mut self, target_json: &str) -> Result<(), JsValue> {
        // First user gesture unlocks audio
        self.synth.borrow().resume();
        let target = Outcome::from_json(target_json).map_err(js_error)?;
        self.engine.start_play(target).map_err(js_error)
    }

    /// Advance by one animation frame (seconds); returns the fixed steps taken
    pub fn tick(&mut self, frame_dt: f32) -> u32 {
        self.engine.tick(frame_dt)
    }

    /// Pointer input in card logical coordinates; returns the revealed fraction
    pub fn scratch_at(&mut self, x: f32, y: f32) -> Result<f32, JsValue> {
        self.synth.borrow().resume();
        self.engine.scratch_at(x, y).map_err(js_error)
    }

    /// Pointer input in device pixels over a card drawn `width` x `height`
    pub fn scratch_at_device(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<f32, JsValue> {
        self.synth.borrow().resume();
        self.engine
            .scratch_at_device(x, y, width, height)
            .map_err(js_error)
    }

    pub fn cancel(&mut self) -> bool {
        self.engine.cancel()
    }

    /// Subscribe `callback(reward)` to completed plays
    pub fn on_complete(&mut self, callback: js_sys::Function) {
        self.engine.on_complete(move |reward| {
            let _ = callback.call1(&JsValue::NULL, &JsValue::from(reward));
        });
    }

    /// Subscribe `callback(name, payloadJson)` to every event
    pub fn on_event(&mut self, callback: js_sys::Function) {
        self.engine.on_event(move |event| {
            let payload = event.payload().to_string();
            let _ = callback.call2(
                &JsValue::NULL,
                &JsValue::from_str(event.name()),
                &JsValue::from_str(&payload),
            );
        });
    }

    /// Events since the last call, as a JSON array
    pub fn drain_events(&mut self) -> String {
        let events = self.engine.drain_events();
        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }

    /// Body transforms for the renderer, as a JSON array
    pub fn bodies(&self) -> String {
        serde_json::to_string(self.engine.bodies()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn phase(&self) -> String {
        serde_json::to_value(self.engine.phase())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn backend(&self) -> Option<String> {
        self.engine.backend().map(|b| b.as_str().to_string())
    }

    pub fn history(&self) -> String {
        serde_json::to_string(self.engine.history()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Drop for WebMiniGame {
    fn drop(&mut self) {
        // Unmounting mid-play must not leave loops running
        self.engine.cancel();
        self.synth.borrow_mut().stop_all();
    }
}
