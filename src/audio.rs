//! Collision sounds
//!
//! The simulation only knows the `NoteTrigger` capability. On the web it is
//! backed by Web Audio: a user-supplied sample when one is loaded, otherwise
//! an oscillator bell. Elsewhere it is silent.

use crate::consts::BASE_NOTE;

/// Fire-and-forget note playback, called once per colliding ball.
///
/// Implementations must not block and must quietly do nothing when audio is
/// unavailable.
pub trait NoteTrigger {
    /// Play a note at `note` Hz
    fn play_note(&mut self, note: f32);
}

/// Discards every note (native/headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotes;

impl NoteTrigger for SilentNotes {
    fn play_note(&mut self, _note: f32) {}
}

/// Records notes in order, handy for replays and tests
impl NoteTrigger for Vec<f32> {
    fn play_note(&mut self, note: f32) {
        self.push(note);
    }
}

/// Frequencies the oscillator can reasonably play
#[inline]
pub fn audible(note: f32) -> bool {
    note.is_finite() && (20.0..=20_000.0).contains(&note)
}

/// Playback rate that shifts a sample recorded at the base note to `note`
pub fn sample_rate_for(note: f32) -> f32 {
    (note / BASE_NOTE).clamp(1.0 / 16.0, 16.0)
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use js_sys::ArrayBuffer;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{AudioBuffer, AudioContext, GainNode, OscillatorNode, OscillatorType, Response};

    use super::{NoteTrigger, audible, sample_rate_for};

    const MASTER_VOLUME: f32 = 0.8;

    /// Audio manager backed by Web Audio
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        /// Decoded once, filled in asynchronously by `load_sample`
        sample: Rc<RefCell<Option<AudioBuffer>>>,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                sample: Rc::new(RefCell::new(None)),
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Fetch and decode a sample in the background. Until it arrives (or
        /// if it fails) collisions keep using the bell.
        pub fn load_sample(&self, url: &str) {
            let Some(ctx) = self.ctx.clone() else { return };
            let slot = self.sample.clone();
            let url = url.to_string();
            wasm_bindgen_futures::spawn_local(async move {
                match fetch_and_decode(&ctx, &url).await {
                    Ok(buffer) => {
                        log::info!(
                            "Loaded audio sample '{}' ({:.2}s)",
                            url,
                            buffer.duration()
                        );
                        *slot.borrow_mut() = Some(buffer);
                    }
                    Err(e) => log::warn!("Could not load audio sample '{}': {:?}", url, e),
                }
            });
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
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

        /// Soft bell: sine at the note plus a quiet octave
        fn play_bell(&self, ctx: &AudioContext, freq: f32, vol: f32) {
            let t = ctx.current_time();

            if let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.4, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.35)
                    .ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.4).ok();
            }

            if audible(freq * 2.0) {
                if let Some((osc, gain)) = self.create_osc(ctx, freq * 2.0, OscillatorType::Triangle)
                {
                    gain.gain().set_value_at_time(vol * 0.1, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                        .ok();
                    osc.start().ok();
                    osc.stop_with_when(t + 0.2).ok();
                }
            }
        }

        /// One-shot source per call so overlapping collisions overlap audibly
        fn play_sample(
            &self,
            ctx: &AudioContext,
            buffer: &AudioBuffer,
            note: f32,
            vol: f32,
        ) -> Option<()> {
            let source = ctx.create_buffer_source().ok()?;
            let gain = ctx.create_gain().ok()?;

            source.set_buffer(Some(buffer));
            source.playback_rate().set_value(sample_rate_for(note));
            gain.gain().set_value(vol);
            source.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            source.start().ok()
        }
    }

    async fn fetch_and_decode(ctx: &AudioContext, url: &str) -> Result<AudioBuffer, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await?
            .dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
        }
        let bytes: ArrayBuffer = JsFuture::from(response.array_buffer()?).await?.dyn_into()?;
        JsFuture::from(ctx.decode_audio_data(&bytes)?)
            .await?
            .dyn_into()
    }

    impl NoteTrigger for AudioManager {
        fn play_note(&mut self, note: f32) {
            if !audible(note) {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let sample = self.sample.borrow();
            match sample.as_ref() {
                Some(buffer) => {
                    if self.play_sample(ctx, buffer, note, MASTER_VOLUME).is_none() {
                        log::debug!("Sample playback failed");
                    }
                }
                None => self.play_bell(ctx, note, MASTER_VOLUME),
            }
        }
    }
}
