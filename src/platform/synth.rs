//! Sound cue playback using Web Audio API
//!
//! Procedurally generated tones, one recipe per effect. Loops hold on to
//! their oscillator until the matching `StopLoop` cue arrives.

use std::collections::HashMap;

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::audio::{SoundCue, SoundEffect};

/// Plays the cues emitted by the engine
pub struct CueSynth {
    ctx: Option<AudioContext>,
    loops: HashMap<SoundEffect, (OscillatorNode, GainNode)>,
}

impl Default for CueSynth {
    fn default() -> Self {
        Self::new()
    }
}

impl CueSynth {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            loops: HashMap::new(),
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn handle(&mut self, cue: &SoundCue) {
        match *cue {
            SoundCue::Play { effect, volume } => self.play(effect, volume),
            SoundCue::StartLoop { effect, volume } => self.start_loop(effect, volume),
            SoundCue::StopLoop { effect } => self.stop_loop(effect),
        }
    }

    /// Silence every running loop
    pub fn stop_all(&mut self) {
        for (_, (osc, _)) in self.loops.drain() {
            osc.stop().ok();
        }
    }

    fn context(&self) -> Option<&AudioContext> {
        let ctx = self.ctx.as_ref()?;
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        Some(ctx)
    }

    fn play(&self, effect: SoundEffect, vol: f32) {
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = self.context() else { return };

        use SoundEffect as S;
        match effect {
            S::WheelTick | S::PegHit | S::ReelStop => {
                let freq = match effect {
                    S::PegHit => 1200.0,
                    S::ReelStop => 500.0,
                    _ => 800.0,
                };
                blip(ctx, freq, OscillatorType::Sine, vol, 0.05);
            }
            S::DiceBounce | S::DiceLand | S::CoinLand => {
                blip(ctx, 80.0, OscillatorType::Sawtooth, vol, 0.2);
            }
            S::BallDrop | S::DiceRoll | S::SpinStart | S::CoinFlip => {
                sweep(ctx, 600.0, 100.0, vol, 0.3);
            }
            S::SlotWin | S::WheelWin | S::Reveal => {
                arpeggio(ctx, &[523.0, 659.0, 784.0], vol, 0.1);
            }
            S::Jackpot => {
                arpeggio(ctx, &[523.0, 659.0, 784.0, 1047.0, 1319.0], vol, 0.12);
            }
            // Loops played as one-shots get a short burst
            S::ReelSpin | S::CoinSpin | S::Scratch => {
                blip(ctx, loop_frequency(effect), OscillatorType::Square, vol, 0.1);
            }
        }
    }

    fn start_loop(&mut self, effect: SoundEffect, vol: f32) {
        if self.loops.contains_key(&effect) || vol <= 0.0 {
            return;
        }
        let Some(ctx) = self.context() else { return };
        let Some((osc, gain)) =
            create_osc(ctx, loop_frequency(effect), OscillatorType::Square)
        else {
            return;
        };
        // Square waves are loud; keep loops well under one-shots
        gain.gain().set_value(vol * 0.08);
        osc.start().ok();
        self.loops.insert(effect, (osc, gain));
    }

    fn stop_loop(&mut self, effect: SoundEffect) {
        if let Some((osc, gain)) = self.loops.remove(&effect) {
            if let Some(ctx) = &self.ctx {
                let t = ctx.current_time();
                gain.gain().set_value_at_time(gain.gain().value(), t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.001, t + 0.05)
                    .ok();
                osc.stop_with_when(t + 0.06).ok();
            } else {
                osc.stop().ok();
            }
        }
    }
}

impl Drop for CueSynth {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn loop_frequency(effect: SoundEffect) -> f32 {
    match effect {
        SoundEffect::ReelSpin => 110.0,
        SoundEffect::CoinSpin => 220.0,
        _ => 2000.0,
    }
}

/// Create an oscillator with gain envelope
fn create_osc(
    ctx: &AudioContext,
    freq: f32,
    osc_type: OscillatorType,
) -> Option<(OscillatorNode, GainNode)> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;

    osc.set_type(osc_type);
    osc.frequency().set_value(freq);
    osc.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(&ctx.destination()).ok()?;

    Some((osc, gain))
}

/// Single decaying tone
fn blip(ctx: &AudioContext, freq: f32, osc_type: OscillatorType, vol: f32, duration: f64) {
    let Some((osc, gain)) = create_osc(ctx, freq, osc_type) else {
        return;
    };
    let t = ctx.current_time();

    gain.gain().set_value_at_time(vol, t).ok();
    gain.gain()
        .exponential_ramp_to_value_at_time(0.01, t + duration)
        .ok();

    osc.start().ok();
    osc.stop_with_when(t + duration + 0.02).ok();
}

/// Falling whoosh
fn sweep(ctx: &AudioContext, from: f32, to: f32, vol: f32, duration: f64) {
    let Some((osc, gain)) = create_osc(ctx, from, OscillatorType::Sawtooth) else {
        return;
    };
    let t = ctx.current_time();

    gain.gain().set_value_at_time(vol * 0.5, t).ok();
    gain.gain()
        .exponential_ramp_to_value_at_time(0.01, t + duration)
        .ok();
    osc.frequency().set_value_at_time(from, t).ok();
    osc.frequency()
        .exponential_ramp_to_value_at_time(to, t + duration)
        .ok();

    osc.start().ok();
    osc.stop_with_when(t + duration + 0.02).ok();
}

/// Rising notes, `spacing` seconds apart
fn arpeggio(ctx: &AudioContext, notes: &[f32], vol: f32, spacing: f64) {
    for (i, freq) in notes.iter().enumerate() {
        let delay = i as f64 * spacing;
        if let Some((osc, gain)) = create_osc(ctx, *freq, OscillatorType::Sine) {
            let t = ctx.current_time() + delay;
            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                .ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + 0.35).ok();
        }
    }
}
