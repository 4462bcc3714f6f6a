use std::sync::{Arc, Mutex};

use crate::domain::WizardState;

use super::{events::WizardEvent, reducer::reduce};

#[derive(Clone)]
pub struct WizardStore {
    inner: Arc<Mutex<WizardState>>,
}

impl WizardStore {
    pub fn new(state: WizardState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> WizardState {
        self.inner.lock().unwrap().clone()
    }

    pub fn apply(&self, ev: WizardEvent) {
        let mut guard = self.inner.lock().unwrap();
        let next = reduce(guard.clone(), ev);
        *guard = next;
    }

    pub(crate) fn with_state_mut<R>(&self, f: impl FnOnce(&mut WizardState) -> R) -> R {
        let mut guard = self.inner.lock().unwrap();
        f(&mut guard)
    }
}

impl Default for WizardStore {
    fn default() -> Self {
        Self::new(WizardState::default())
    }
}
