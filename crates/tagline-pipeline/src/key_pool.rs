use std::sync::{Mutex, MutexGuard, PoisonError};
use tagline_llm::Credential;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No usable API credentials remain")]
pub struct PoolExhausted;

struct PoolState {
    keys: Vec<Credential>,
    cursor: u64,
}

/// Round-robin pool of credentials shared by all workers
///
/// The pool only shrinks during a run. The lock is held for the checkout or
/// removal itself, never across a network call.
pub struct KeyPool {
    state: Mutex<PoolState>,
}

impl KeyPool {
    pub fn new(keys: Vec<Credential>) -> Self {
        Self {
            state: Mutex::new(PoolState { keys, cursor: 0 }),
        }
    }

    /// One credential per non-blank line, surrounding whitespace trimmed
    pub fn from_lines(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(Credential::new)
                .collect(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Next credential in rotation, or `PoolExhausted` when none remain
    pub fn checkout(&self) -> Result<Credential, PoolExhausted> {
        let mut state = self.lock();
        if state.keys.is_empty() {
            return Err(PoolExhausted);
        }
        let index = (state.cursor % state.keys.len() as u64) as usize;
        state.cursor += 1;
        Ok(state.keys[index].clone())
    }

    /// Drop every copy of `credential`; returns whether anything was removed
    pub fn remove(&self, credential: &Credential) -> bool {
        self.remove_and_count(credential).0
    }

    /// Like [`KeyPool::remove`], also returning the pool size right after
    pub fn remove_and_count(&self, credential: &Credential) -> (bool, usize) {
        let mut state = self.lock();
        let before = state.keys.len();
        state.keys.retain(|k| k != credential);
        (state.keys.len() != before, state.keys.len())
    }

    pub fn len(&self) -> usize {
        self.lock().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().keys.is_empty()
    }

    /// Number of successful checkouts so far (the rotation cursor)
    pub fn checkouts(&self) -> u64 {
        self.lock().cursor
    }
}
