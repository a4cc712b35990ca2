use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

/// Transient user-facing notifications. Views push; the shell drains and displays.
#[derive(Clone, Default)]
pub struct Toaster {
    queue: Arc<Mutex<Vec<Toast>>>,
}

impl Toaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Toast>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn success(&self, title: &str, description: &str) {
        info!(title, description, "toast");
        self.push(Toast {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        });
    }

    pub fn error(&self, title: &str, description: &str) {
        warn!(title, description, "toast");
        self.push(Toast {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        });
    }

    fn push(&self, toast: Toast) {
        self.lock().push(toast);
    }

    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.lock())
    }

    pub fn last(&self) -> Option<Toast> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
