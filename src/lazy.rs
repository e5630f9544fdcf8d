use dashmap::DashMap;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::error::LoadError;

// Externally visible lifecycle of a module slot. `Ready` is terminal;
// `Failed` may go back to `Loading` on a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotRequested,
    Loading,
    Ready,
    Failed,
}

type ModuleFactory<M> = Arc<dyn Fn() -> BoxFuture<'static, Result<M, String>> + Send + Sync>;

enum Slot<M> {
    NotRequested,
    Loading,
    Ready(Arc<M>),
    Failed(String),
}

struct LazyModule<M> {
    factory: ModuleFactory<M>,
    slot: Mutex<Slot<M>>,
    notify: Notify,
}

// Registry of deferred modules. The first `require` for a name becomes the
// load leader and runs the factory once; everyone arriving before it
// settles waits on the same load and gets the same instance.
pub struct LazyRegistry<M> {
    modules: DashMap<String, Arc<LazyModule<M>>>,
}

impl<M> Default for LazyRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> LazyRegistry<M> {
    pub fn new() -> Self {
        Self {
            modules: DashMap::new(),
        }
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        factory: impl Fn() -> BoxFuture<'static, Result<M, String>> + Send + Sync + 'static,
    ) {
        self.modules.insert(
            name.into(),
            Arc::new(LazyModule {
                factory: Arc::new(factory),
                slot: Mutex::new(Slot::NotRequested),
                notify: Notify::new(),
            }),
        );
    }

    // Non-blocking read for placeholder rendering.
    pub fn state(&self, name: &str) -> Option<LoadState> {
        let module = self.modules.get(name)?;
        let slot = module.slot.lock().expect("module slot lock poisoned");
        Some(match &*slot {
            Slot::NotRequested => LoadState::NotRequested,
            Slot::Loading => LoadState::Loading,
            Slot::Ready(_) => LoadState::Ready,
            Slot::Failed(_) => LoadState::Failed,
        })
    }

    pub async fn require(&self, name: &str) -> Result<Arc<M>, LoadError> {
        let module = self
            .modules
            .get(name)
            .map(|module| Arc::clone(&module))
            .ok_or_else(|| LoadError::Unknown(name.to_string()))?;

        let mut waited = false;
        loop {
            // register for wakeup before reading the slot, so a leader that
            // settles between the read and the await still wakes us
            let notified = module.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let lead = {
                let mut slot = module.slot.lock().expect("module slot lock poisoned");
                match &*slot {
                    Slot::Ready(instance) => return Ok(Arc::clone(instance)),
                    Slot::Loading => false,
                    // a waiter that parked on this load rejects with the
                    // leader's failure; only a later require retries
                    Slot::Failed(message) if waited => {
                        return Err(LoadError::Failed {
                            name: name.to_string(),
                            message: message.clone(),
                        });
                    }
                    // NotRequested starts the first load; Failed retries it
                    Slot::NotRequested | Slot::Failed(_) => {
                        *slot = Slot::Loading;
                        true
                    }
                }
            };

            if lead {
                let outcome = (module.factory)().await;
                let mut slot = module.slot.lock().expect("module slot lock poisoned");
                let result = match outcome {
                    Ok(instance) => {
                        let instance = Arc::new(instance);
                        *slot = Slot::Ready(Arc::clone(&instance));
                        Ok(instance)
                    }
                    Err(message) => {
                        *slot = Slot::Failed(message.clone());
                        Err(LoadError::Failed {
                            name: name.to_string(),
                            message,
                        })
                    }
                };
                drop(slot);
                module.notify.notify_waiters();
                return result;
            }

            notified.await;
            waited = true;
        }
    }
}
