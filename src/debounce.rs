use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

// Trailing-edge debounce: repeated calls inside the window cancel the
// pending invocation and reschedule with the newest argument. The wrapped
// function fires once per quiet period.
pub struct Debouncer<T: Send + 'static> {
    window: Duration,
    callback: Callback<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(window: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            window,
            callback: Arc::new(callback),
            pending: Mutex::new(None),
        }
    }

    pub fn call(&self, arg: T) {
        let mut pending = self.pending.lock().expect("debounce slot lock poisoned");
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let callback = Arc::clone(&self.callback);
        let window = self.window;
        *pending = Some(tokio::spawn(async move {
            time::sleep(window).await;
            callback(arg);
        }));
    }

    // Drop the pending invocation, if any, without firing it.
    pub fn cancel(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .expect("debounce slot lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

// Leading-edge throttle: the first call fires immediately, further calls
// inside the interval are dropped (not queued). Returns whether the call
// went through.
pub struct Throttler<T> {
    min_interval: Duration,
    callback: Callback<T>,
    last_fired: Mutex<Option<Instant>>,
}

impl<T> Throttler<T> {
    pub fn new(min_interval: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            min_interval,
            callback: Arc::new(callback),
            last_fired: Mutex::new(None),
        }
    }

    pub fn call(&self, arg: T) -> bool {
        let mut last = self.last_fired.lock().expect("throttle clock lock poisoned");
        let now = Instant::now();
        if let Some(fired) = *last {
            if now < fired + self.min_interval {
                return false;
            }
        }
        *last = Some(now);
        drop(last);
        (self.callback)(arg);
        true
    }
}
