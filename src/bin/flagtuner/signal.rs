use libc::{SIGINT, SIGQUIT};
use signal_hook_registry::{SigId, register, unregister};
use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Turns SIGINT and SIGQUIT into a flag the search polls at generation
/// boundaries. The handlers are removed on drop.
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    handlers: Vec<SigId>,
}

impl Cancellation {
    pub fn install() -> io::Result<Self> {
        let mut cancellation = Cancellation {
            flag: Arc::new(AtomicBool::new(false)),
            handlers: Vec::with_capacity(2),
        };
        for signal in [SIGINT, SIGQUIT] {
            let flag = cancellation.flag.clone();
            // The handler only performs an atomic store.
            let handler = unsafe { register(signal, move || flag.store(true, Ordering::SeqCst)) }?;
            cancellation.handlers.push(handler);
        }
        Ok(cancellation)
    }

    #[inline]
    pub fn flag(&self) -> &AtomicBool {
        &self.flag
    }
}

impl Drop for Cancellation {
    fn drop(&mut self) {
        for handler in self.handlers.drain(..) {
            unregister(handler);
        }
    }
}
