//! Circle ASMR entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlInputElement};

    use circle_asmr::audio::AudioManager;
    use circle_asmr::consts::*;
    use circle_asmr::render::render;
    use circle_asmr::renderer::{RenderState, tessellate};
    use circle_asmr::settings::{parse_count_lenient, parse_int_lenient};
    use circle_asmr::sim::{SimState, tick};
    use circle_asmr::{NoteMode, RuleConfig};

    /// Handles to the rule controls, read once per frame
    struct Controls {
        grow: Option<HtmlInputElement>,
        shrink: Option<HtmlInputElement>,
        small_space: Option<HtmlInputElement>,
        recolor: Option<HtmlInputElement>,
        speed_change: Option<HtmlInputElement>,
        rotate: Option<HtmlInputElement>,
        circle_layers: Option<HtmlInputElement>,
        repulsion_force: Option<HtmlInputElement>,
        multiply_count: Option<HtmlInputElement>,
    }

    fn input(document: &Document, id: &str) -> Option<HtmlInputElement> {
        let el = document.get_element_by_id(id)?.dyn_into().ok();
        if el.is_none() {
            log::warn!("Control #{} missing - using default", id);
        }
        el
    }

    fn checked(el: &Option<HtmlInputElement>) -> bool {
        el.as_ref().is_some_and(|e| e.checked())
    }

    fn set_checked(el: &Option<HtmlInputElement>, value: bool) {
        if let Some(e) = el {
            e.set_checked(value);
        }
    }

    fn set_value(el: &Option<HtmlInputElement>, value: &str) {
        if let Some(e) = el {
            e.set_value(value);
        }
    }

    impl Controls {
        fn find(document: &Document) -> Self {
            Self {
                grow: input(document, "growOnCollision"),
                shrink: input(document, "shrinkOnCollision"),
                small_space: input(document, "smallSpace"),
                recolor: input(document, "changeColorOnCollision"),
                speed_change: input(document, "changeSpeedOnCollision"),
                rotate: input(document, "rotateCircle"),
                circle_layers: input(document, "circleLayers"),
                repulsion_force: input(document, "repulsionForce"),
                multiply_count: input(document, "multiplyOnCollision"),
            }
        }

        /// Snapshot the controls; missing or garbled fields fall back safely
        fn snapshot(&self, note_mode: NoteMode) -> RuleConfig {
            let defaults = RuleConfig::default();
            let count = |el: &Option<HtmlInputElement>, fallback: u32| {
                el.as_ref()
                    .map(|e| parse_count_lenient(&e.value()))
                    .unwrap_or(fallback)
            };
            RuleConfig {
                grow: checked(&self.grow),
                shrink: checked(&self.shrink),
                small_space: checked(&self.small_space),
                recolor: checked(&self.recolor),
                speed_change: checked(&self.speed_change),
                rotate: checked(&self.rotate),
                circle_layers: count(&self.circle_layers, defaults.circle_layers),
                repulsion_force: self
                    .repulsion_force
                    .as_ref()
                    .map(|e| parse_int_lenient(&e.value()) as f32)
                    .unwrap_or(defaults.repulsion_force),
                multiply_count: count(&self.multiply_count, defaults.multiply_count),
                note_mode,
            }
        }

        /// Push a saved config back into the controls
        fn apply(&self, config: &RuleConfig) {
            set_checked(&self.grow, config.grow);
            set_checked(&self.shrink, config.shrink);
            set_checked(&self.small_space, config.small_space);
            set_checked(&self.recolor, config.recolor);
            set_checked(&self.speed_change, config.speed_change);
            set_checked(&self.rotate, config.rotate);
            set_value(&self.circle_layers, &config.circle_layers.to_string());
            set_value(&self.repulsion_force, &config.repulsion_force.to_string());
            set_value(&self.multiply_count, &config.multiply_count.to_string());
        }
    }

    /// App instance holding all state
    struct App {
        state: SimState,
        render_state: Option<RenderState>,
        audio: AudioManager,
        controls: Controls,
        note_mode: NoteMode,
        last_config: RuleConfig,
        running: bool,
    }

    impl App {
        fn new(seed: u64, controls: Controls) -> Self {
            let saved = RuleConfig::load();
            controls.apply(&saved);
            Self {
                state: SimState::new(seed),
                render_state: None,
                audio: AudioManager::new(),
                controls,
                note_mode: saved.note_mode,
                last_config: saved,
                running: false,
            }
        }

        /// One simulation tick plus frame
        fn frame(&mut self) {
            let config = self.controls.snapshot(self.note_mode);
            if config != self.last_config {
                config.save();
                self.last_config = config.clone();
            }

            if self.running {
                let report = tick(&mut self.state, &config, &mut self.audio);
                if report.population_empty {
                    self.running = false;
                    set_hidden("restartButton", false);
                } else if self.state.is_overcrowded() {
                    log::warn!(
                        "Population passed {} after {} ticks, pausing",
                        MAX_POPULATION,
                        self.state.time_ticks
                    );
                    self.running = false;
                    set_hidden("restartButton", false);
                }
            }

            let list = render(
                &self.state.arena,
                &self.state.balls,
                config.circle_layers,
                config.rotate,
            );
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&tessellate(&list)) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        fn start(&mut self) {
            if self.running {
                return;
            }
            self.audio.resume();
            self.state.spawn_initial_ball();
            self.running = true;
            log::info!("Simulation started (seed {})", self.state.seed);
        }

        fn restart(&mut self, seed: u64) {
            self.state = SimState::new(seed);
            self.start();
            set_hidden("restartButton", true);
        }
    }

    fn set_hidden(id: &str, hidden: bool) {
        let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        else {
            return;
        };
        let classes = el.class_list();
        let _ = if hidden {
            classes.add_1("hidden")
        } else {
            classes.remove_1("hidden")
        };
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut(web_sys::MouseEvent) + 'static) {
        let Some(el) = document.get_element_by_id(id) else {
            log::warn!("Button #{} missing", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(handler);
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        log::info!("Circle ASMR starting...");

        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };
        canvas.set_width(CANVAS_WIDTH as u32);
        canvas.set_height(CANVAS_HEIGHT as u32);

        let seed = js_sys::Date::now() as u64;
        let app = Rc::new(RefCell::new(App::new(seed, Controls::find(&document))));

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::LowPower,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        match RenderState::new(
                            surface,
                            &adapter,
                            canvas.width(),
                            canvas.height(),
                            (CANVAS_WIDTH, CANVAS_HEIGHT),
                        )
                        .await
                        {
                            Ok(render_state) => app.borrow_mut().render_state = Some(render_state),
                            Err(e) => log::error!("Failed to create device: {:?}", e),
                        }
                    }
                    Err(e) => log::error!("No graphics adapter: {:?}", e),
                }
            }
            Err(e) => log::error!("Failed to create surface: {:?}", e),
        }

        {
            let app = app.clone();
            on_click(&document, "startButton", move |_| {
                app.borrow_mut().start();
                set_disabled("startButton");
            });
        }
        {
            let app = app.clone();
            on_click(&document, "restartButton", move |_| {
                app.borrow_mut().restart(js_sys::Date::now() as u64);
            });
        }
        setup_note_dropdown(&document, app.clone());
        setup_sample_inputs(&document, app.clone());

        request_animation_frame(app);

        log::info!("Circle ASMR running!");
    }

    fn set_disabled(id: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            let _ = el.set_attribute("disabled", "");
        }
    }

    /// Note mode buttons carry `data-note="same|increase|decrease"`
    fn setup_note_dropdown(document: &Document, app: Rc<RefCell<App>>) {
        let Ok(Some(dropdown)) = document.query_selector(".dropdown-content") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
            let Some(target) = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            else {
                return;
            };
            if let Some(mode) = target
                .get_attribute("data-note")
                .and_then(|m| NoteMode::from_str(&m))
            {
                app.borrow_mut().note_mode = mode;
                log::info!("Note mode: {}", mode.as_str());
            }
        });
        let _ =
            dropdown.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// A sample URL or a local file replaces the bell once decoded
    fn setup_sample_inputs(document: &Document, app: Rc<RefCell<App>>) {
        if let Some(url_input) = input(document, "audioUrl") {
            let app = app.clone();
            let field = url_input.clone();
            on_change(&url_input, move || {
                let url = field.value();
                if !url.trim().is_empty() {
                    app.borrow().audio.load_sample(url.trim());
                }
            });
        }

        if let Some(file_input) = input(document, "audioFile") {
            let field = file_input.clone();
            on_change(&file_input, move || {
                let Some(file) = field.files().and_then(|files| files.get(0)) else {
                    return;
                };
                match web_sys::Url::create_object_url_with_blob(&file) {
                    Ok(url) => app.borrow().audio.load_sample(&url),
                    Err(e) => log::warn!("Could not read {}: {:?}", file.name(), e),
                }
            });
        }
    }

    fn on_change(el: &HtmlInputElement, mut handler: impl FnMut() + 'static) {
        let closure = Closure::<dyn FnMut(_)>::new(move |_: web_sys::Event| handler());
        let _ = el.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |_time: f64| {
            app.borrow_mut().frame();
            request_animation_frame(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use circle_asmr::consts::MAX_POPULATION;
    use circle_asmr::render::render;
    use circle_asmr::renderer::tessellate;
    use circle_asmr::sim::{SimState, tick};
    use circle_asmr::{RuleConfig, SilentNotes};

    /// One minute of frames at 60 Hz
    const MAX_TICKS: u64 = 60 * 60;
    env_logger::init();
    log::info!("Circle ASMR (native) starting...");
    log::info!("Native mode runs headless - serve the wasm build for the visual version");

    let config = RuleConfig::load();
    let seed = std::env::var("CIRCLE_ASMR_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);

    let mut state = SimState::new(seed);
    state.spawn_initial_ball();
    log::info!("Running with seed {} and {:?}", seed, config);

    while state.time_ticks < MAX_TICKS {
        let report = tick(&mut state, &config, &mut SilentNotes);
        if report.population_empty {
            log::info!("Population empty - restart available");
            break;
        }
        if state.is_overcrowded() {
            log::warn!("Population passed {}, stopping", MAX_POPULATION);
            break;
        }
        if state.time_ticks % 600 == 0 {
            let list = render(&state.arena, &state.balls, config.circle_layers, config.rotate);
            log::info!(
                "tick {}: {} balls, {} collisions, note {:.0} Hz, {} vertices",
                state.time_ticks,
                state.population(),
                state.total_collisions,
                state.note.current(),
                tessellate(&list).len()
            );
        }
    }

    println!(
        "Finished after {} ticks: {} balls, {} collisions, final note {:.0} Hz",
        state.time_ticks,
        state.population(),
        state.total_collisions,
        state.note.current()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
