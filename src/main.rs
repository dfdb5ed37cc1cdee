//! Office Dodge entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlSelectElement, KeyboardEvent};

    use office_dodge::persistence::LocalStorageStore;
    use office_dodge::platform::{KeyCommand, map_key, playfield_from_layout, suppress_default};
    use office_dodge::sim::{Action, GameEvent, GamePhase, PickupKind};
    use office_dodge::{RenderSnapshot, Session, Settings};

    // Rendering is left to the page: forward each snapshot to an optional hook
    #[wasm_bindgen(inline_js = "
        export function render_snapshot(json) {
            const hook = window.officeDodgeRender;
            if (typeof hook === 'function') {
                hook(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        fn render_snapshot(json: &str);
    }

    /// Game instance holding the session and host-side UI state
    struct Game {
        session: Session,
        settings: Settings,
        /// A frame callback is registered
        loop_active: bool,
        /// Status line shown in the HUD
        message: String,
    }

    impl Game {
        fn new(settings: Settings, seed: u64) -> Self {
            let mut session = Session::new(Box::new(LocalStorageStore), settings.tuning.clone(), seed);
            if let Err(e) = session.set_difficulty(settings.difficulty) {
                log::warn!("Stored difficulty not applied: {}", e);
            }
            Self {
                session,
                settings,
                loop_active: false,
                message: "Dodge red blocks. Collect pickups for points!".to_string(),
            }
        }

        /// Match the playfield to the container's current layout size
        fn sync_playfield(&mut self) {
            let Some(el) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id("playfield"))
            else {
                return;
            };
            let field = playfield_from_layout(el.client_width() as f64, el.client_height() as f64);
            self.session.set_playfield(field.width, field.height);
        }

        fn update_message(&mut self, snap: &RenderSnapshot) {
            for event in &snap.events {
                match event {
                    GameEvent::PickupCollected { kind, points } => {
                        let label = match kind {
                            PickupKind::Ordinary => "Coffee",
                            PickupKind::Uncommon => "Bubble tea",
                            PickupKind::Rare => "Beer",
                        };
                        self.message = format!("{} +{}", label, points);
                    }
                    GameEvent::HazardHit => {
                        self.message = "Oops! Hit a block. Press Restart.".to_string();
                    }
                    GameEvent::NewBest { score } => {
                        self.message = format!("New best: {}!", score);
                    }
                    GameEvent::DashStarted => {}
                }
            }
        }

        fn update_hud(&self, snap: &RenderSnapshot) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.get_element_by_id("score") {
                el.set_text_content(Some(&snap.score.to_string()));
            }
            if let Some(el) = document.get_element_by_id("best") {
                el.set_text_content(Some(&snap.best.max(snap.score).to_string()));
            }
            if let Some(el) = document.get_element_by_id("status") {
                let text = if snap.phase == GamePhase::Paused {
                    "Paused (P)"
                } else {
                    self.message.as_str()
                };
                el.set_text_content(Some(text));
            }
            if let Some(el) = document.get_element_by_id("ready-overlay") {
                let class = if snap.phase == GamePhase::Running || snap.phase == GamePhase::Paused {
                    "hidden"
                } else {
                    ""
                };
                let _ = el.set_attribute("class", class);
            }
            if let Some(el) = document.get_element_by_id("pause-btn") {
                el.set_text_content(Some(if snap.phase == GamePhase::Paused {
                    "Resume"
                } else {
                    "Pause"
                }));
            }
            if let Some(el) = document.get_element_by_id("difficulty") {
                if let Ok(select) = el.dyn_into::<HtmlSelectElement>() {
                    select.set_disabled(self.session.wants_frames());
                }
            }
        }

        fn publish(&mut self, snap: &RenderSnapshot) {
            self.update_message(snap);
            self.update_hud(snap);
            if let Ok(json) = serde_json::to_string(snap) {
                render_snapshot(&json);
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Office Dodge starting...");

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(settings, seed)));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(game.clone());
        setup_auto_pause(game.clone());
        setup_buttons(game.clone());
        setup_difficulty_select(game.clone());

        {
            let mut g = game.borrow_mut();
            g.sync_playfield();
            let snap = g.session.snapshot();
            g.publish(&snap);
        }

        log::info!("Office Dodge ready!");
    }

    /// Begin a run and make sure frames are flowing
    fn start_run(game: &Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            g.sync_playfield();
            if let Err(e) = g.session.start() {
                log::debug!("Start ignored: {}", e);
                return;
            }
            g.message = "Good luck!".to_string();
        }
        ensure_loop(game);
    }

    fn ensure_loop(game: &Rc<RefCell<Game>>) {
        let needs_frame = {
            let mut g = game.borrow_mut();
            let needs = !g.loop_active && g.session.wants_frames();
            if needs {
                g.loop_active = true;
            }
            needs
        };
        if needs_frame {
            request_animation_frame(game.clone());
        }
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                if suppress_default(&key) {
                    event.prevent_default();
                }
                match map_key(&key) {
                    Some(KeyCommand::Action(Action::Menu)) => {
                        game.borrow_mut().session.press(Action::Menu);
                        log::info!("Back to menu");
                    }
                    Some(KeyCommand::Action(action)) => {
                        game.borrow_mut().session.press(action);
                    }
                    Some(KeyCommand::Restart) => {
                        let in_progress = game.borrow().session.wants_frames();
                        if !in_progress {
                            start_run(&game);
                        }
                    }
                    None => {}
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(KeyCommand::Action(action)) = map_key(&event.key()) {
                    game.borrow_mut().session.release(action);
                }
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        for id in ["start-btn", "restart-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                    start_run(&game);
                });
                let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        if let Some(btn) = document.get_element_by_id("pause-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().session.press(Action::Pause);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("menu-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().session.press(Action::Menu);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_difficulty_select(game: Rc<RefCell<Game>>) {
        let Some(select) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("difficulty"))
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        else {
            return;
        };

        select.set_value(game.borrow().session.difficulty().as_str());

        let select_clone = select.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            match g.session.set_difficulty_str(&select_clone.value()) {
                Ok(()) => {
                    let difficulty = g.session.difficulty();
                    g.settings.difficulty = difficulty;
                    g.settings.save();
                }
                Err(e) => {
                    log::warn!("{}", e);
                    select_clone.set_value(g.session.difficulty().as_str());
                }
            }
        });
        let _ = select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        // Visibility change (tab switch, minimize)
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let visible = document_clone.visibility_state() != web_sys::VisibilityState::Hidden;
            game.borrow_mut().session.set_host_visible(visible);
        });
        let _ = document.add_event_listener_with_callback(
            "visibilitychange",
            closure.as_ref().unchecked_ref(),
        );
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let keep_going = {
            let mut g = game.borrow_mut();
            g.sync_playfield();
            let snap = g.session.tick(time);
            g.publish(&snap);

            // A finished or abandoned run lets its frame registration lapse
            let keep_going = g.session.wants_frames();
            if !keep_going {
                g.loop_active = false;
            }
            keep_going
        };

        if keep_going {
            request_animation_frame(game);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Office Dodge (native) starting...");
    log::info!("Native mode runs a headless bot - use `trunk serve` for the web version");

    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless smoke run: a simple evasive bot plays one seeded session
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use office_dodge::sim::{Action, GameEvent, GamePhase};
    use office_dodge::{MemoryStore, Session, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 120;
    /// Hazards closer than this get the bot's attention
    const DANGER_RADIUS: f32 = 120.0;

    pub fn run() {
        let settings = Settings::load();
        let seed = std::env::var("OFFICE_DODGE_SEED")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0x0FF1CE);

        let mut session = Session::new(Box::new(MemoryStore::new()), settings.tuning.clone(), seed);
        if let Err(e) = session.set_difficulty(settings.difficulty) {
            log::warn!("Difficulty not applied: {}", e);
        }
        if let Err(e) = session.start() {
            log::error!("Could not start: {}", e);
            return;
        }

        let mut t = 0.0;
        let mut frames = 0;
        let mut pickups = 0;
        let mut dashes = 0;
        while session.wants_frames() && frames < MAX_FRAMES {
            steer(&mut session);
            t += FRAME_MS;
            frames += 1;
            let snap = session.tick(t);
            for event in &snap.events {
                match event {
                    GameEvent::PickupCollected { .. } => pickups += 1,
                    GameEvent::DashStarted => dashes += 1,
                    _ => {}
                }
            }
        }

        let outcome = if session.phase() == GamePhase::Ended {
            "hit"
        } else {
            "survived"
        };
        println!(
            "{} after {:.1}s on {}: score {}, {} pickups, {} dashes",
            outcome,
            frames as f64 * FRAME_MS / 1000.0,
            session.difficulty().as_str(),
            session.state().score.internal(),
            pickups,
            dashes
        );
    }

    /// Flee nearby hazards, otherwise drift toward the nearest pickup
    fn steer(session: &mut Session) {
        let state = session.state();
        let me = state.player.pos;
        let field = state.playfield.size();

        let mut push = Vec2::ZERO;
        let mut closest = f32::MAX;
        for hz in &state.entities.hazards {
            let centre = hz.pos + hz.size / 2.0;
            let away = me - centre;
            let dist = away.length().max(1.0);
            closest = closest.min(dist);
            if dist < DANGER_RADIUS {
                // Step sideways out of its path as well
                let side = hz.vel.normalize_or_zero().perp();
                let heading = side * away.dot(side).signum();
                push += away / (dist * dist) + heading / dist;
            }
        }
        // Walls repel a little so the bot does not get pinned
        push += Vec2::new(1.0 / me.x.max(1.0) - 1.0 / (field.x - me.x).max(1.0), 0.0) * 0.5;
        push += Vec2::new(0.0, 1.0 / me.y.max(1.0) - 1.0 / (field.y - me.y).max(1.0)) * 0.5;

        if push.length_squared() < 1e-6 {
            if let Some(p) = state
                .entities
                .pickups
                .iter()
                .min_by(|a, b| a.pos.distance_squared(me).total_cmp(&b.pos.distance_squared(me)))
            {
                push = p.pos - me;
            }
        }

        let want_dash = closest < 40.0;
        let dir = push.normalize_or_zero();

        let axis = |neg: bool, pos: bool, session: &mut Session, n: Action, p: Action| {
            for (held, action) in [(neg, n), (pos, p)] {
                if held {
                    session.press(action);
                } else {
                    session.release(action);
                }
            }
        };
        axis(dir.x < -0.3, dir.x > 0.3, session, Action::Left, Action::Right);
        axis(dir.y < -0.3, dir.y > 0.3, session, Action::Up, Action::Down);
        if want_dash {
            session.press(Action::Dash);
        } else {
            session.release(Action::Dash);
        }
    }
}
