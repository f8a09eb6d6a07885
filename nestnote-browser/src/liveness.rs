//! Guards results that arrive after a screen has been torn down.

use std::cell::Cell;
use std::rc::{Rc, Weak};

/// Owned by a screen; flips to dead on [`teardown`](Self::teardown) or drop.
#[derive(Debug)]
pub struct Liveness {
    alive: Rc<Cell<bool>>,
}

/// Handed to an outstanding fetch; checked before its result is applied.
#[derive(Debug, Clone)]
pub struct AliveToken(Weak<Cell<bool>>);

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Rc::new(Cell::new(true)),
        }
    }

    pub fn token(&self) -> AliveToken {
        AliveToken(Rc::downgrade(&self.alive))
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub fn teardown(&self) {
        self.alive.set(false);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl AliveToken {
    pub fn is_alive(&self) -> bool {
        self.0.upgrade().is_some_and(|alive| alive.get())
    }
}
