//! Shared test doubles: a scripted audio backend and a game-state stub.
//!
//! The fake backend completes nothing on its own; tests drive decode
//! completion and start notifications explicitly, mirroring the
//! asynchronous host audio engine.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lf_fade::{AudioHandle, HandleFactory, LoadRequest, PlaybackRequest};
use lf_trigger::{Disposition, GameState};

/// A command recorded against one fake handle
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load { autoplay: bool },
    Play { volume: f32 },
    Fade { target: f32, duration_ms: u32 },
    Stop,
}

#[derive(Default)]
pub struct HandleState {
    pub loaded: bool,
    pub playing: bool,
    pub failed: bool,
    pub looping: bool,
    pub volume: f32,
    pub current_time: Option<f64>,
    pub duration: Option<f64>,
    pub pending_autoplay: Option<PlaybackRequest>,
    pub commands: Vec<Command>,
}

struct FakeHandle {
    src: String,
    state: Rc<RefCell<HandleState>>,
}

impl AudioHandle for FakeHandle {
    fn src(&self) -> &str {
        &self.src
    }
    fn loaded(&self) -> bool {
        self.state.borrow().loaded
    }
    fn playing(&self) -> bool {
        self.state.borrow().playing
    }
    fn failed(&self) -> bool {
        self.state.borrow().failed
    }
    fn looping(&self) -> bool {
        self.state.borrow().looping
    }
    fn volume(&self) -> f32 {
        self.state.borrow().volume
    }
    fn current_time(&self) -> Option<f64> {
        self.state.borrow().current_time
    }
    fn duration(&self) -> Option<f64> {
        self.state.borrow().duration
    }
    fn load(&mut self, request: LoadRequest) {
        let mut state = self.state.borrow_mut();
        state.commands.push(Command::Load {
            autoplay: request.autoplay.is_some(),
        });
        state.pending_autoplay = request.autoplay;
    }
    fn play(&mut self, request: PlaybackRequest) {
        let mut state = self.state.borrow_mut();
        state.commands.push(Command::Play {
            volume: request.volume,
        });
        state.playing = true;
        state.looping = request.looping;
        state.volume = request.volume;
    }
    fn fade(&mut self, target: f32, duration_ms: u32) {
        let mut state = self.state.borrow_mut();
        state.commands.push(Command::Fade {
            target,
            duration_ms,
        });
        state.volume = target;
    }
    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.commands.push(Command::Stop);
        state.playing = false;
    }
}

/// Cloneable factory; the test keeps one clone for inspection while the
/// controller owns the other
#[derive(Clone, Default)]
pub struct SharedFactory {
    states: Rc<RefCell<HashMap<String, Rc<RefCell<HandleState>>>>>,
}

impl SharedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, src: &str) -> Rc<RefCell<HandleState>> {
        Rc::clone(
            self.states
                .borrow_mut()
                .entry(src.to_string())
                .or_default(),
        )
    }

    /// Simulate decode completion, applying any pending autoplay
    pub fn complete_load(&self, src: &str) {
        let state = self.state(src);
        let mut state = state.borrow_mut();
        state.loaded = true;
        if let Some(request) = state.pending_autoplay.take() {
            state.playing = true;
            state.looping = request.looping;
            state.volume = request.volume;
        }
    }

    pub fn volume(&self, src: &str) -> f32 {
        self.state(src).borrow().volume
    }

    pub fn playing(&self, src: &str) -> bool {
        self.state(src).borrow().playing
    }

    pub fn commands(&self, src: &str) -> Vec<Command> {
        self.state(src).borrow().commands.clone()
    }

    pub fn play_count(&self, src: &str) -> usize {
        self.state(src)
            .borrow()
            .commands
            .iter()
            .filter(|c| matches!(c, Command::Play { .. }))
            .count()
    }

    pub fn load_count(&self, src: &str) -> usize {
        self.state(src)
            .borrow()
            .commands
            .iter()
            .filter(|c| matches!(c, Command::Load { .. }))
            .count()
    }
}

impl HandleFactory for SharedFactory {
    fn create(&mut self, src: &str) -> Box<dyn AudioHandle> {
        Box::new(FakeHandle {
            src: src.to_string(),
            state: self.state(src),
        })
    }
}

/// Scriptable game state
pub struct FakeGame {
    pub paused: bool,
    pub combat: bool,
    pub disposition: Option<Disposition>,
    pub global_volume: f32,
}

impl Default for FakeGame {
    fn default() -> Self {
        Self {
            paused: false,
            combat: false,
            disposition: None,
            global_volume: 1.0,
        }
    }
}

impl GameState for FakeGame {
    fn paused(&self) -> bool {
        self.paused
    }
    fn combat_active(&self) -> bool {
        self.combat
    }
    fn active_disposition(&self) -> Option<Disposition> {
        self.disposition
    }
    fn global_volume(&self) -> f32 {
        self.global_volume
    }
}
