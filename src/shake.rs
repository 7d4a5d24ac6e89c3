use parking_lot::Mutex;
use std::sync::Arc;

type SharedListener = Arc<Mutex<Box<dyn ShakeListener>>>;

/// Receives a callback each time the device is shaken
pub trait ShakeListener: Send {
    fn on_shake(&mut self);
}

impl<F: FnMut() + Send> ShakeListener for F {
    fn on_shake(&mut self) {
        self()
    }
}

/// Registry the host's motion layer raises shake events through.
#[derive(Default)]
pub struct ShakeSource {
    listeners: Mutex<Vec<SharedListener>>,
}

impl std::fmt::Debug for ShakeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShakeSource")
            .field("listeners", &format!("<{} listeners>", self.listeners.lock().len()))
            .finish()
    }
}

impl ShakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Box<dyn ShakeListener>) {
        self.listeners.lock().push(Arc::new(Mutex::new(listener)));
    }

    /// Raise one shake event to every listener, in subscription order.
    ///
    /// Listeners run outside the registry lock and may subscribe more
    /// listeners, which hear from the next shake on. A listener must not
    /// raise a shake itself.
    pub fn notify(&self) {
        let listeners = self.listeners.lock().clone();
        log::debug!("Shake detected, notifying {} listeners", listeners.len());
        for listener in listeners {
            listener.lock().on_shake();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}
