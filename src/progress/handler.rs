//! Progress handler trait

use super::event::ProgressEvent;

/// Observer invoked synchronously for every emitted progress event
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::EventKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        ids: Mutex<Vec<String>>,
    }

    impl ProgressHandler for RecordingHandler {
        fn on_progress(&self, event: &ProgressEvent) {
            self.ids.lock().unwrap().push(event.id.clone());
        }
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::running("x", EventKind::Plan, "t", "m"));
    }

    #[test]
    fn test_handler_as_trait_object() {
        let recorder = RecordingHandler::default();
        let handler: &dyn ProgressHandler = &recorder;
        handler.on_progress(&ProgressEvent::running("gap-analysis", EventKind::Analysis, "t", "m"));
        handler.on_progress(&ProgressEvent::completed("gap-analysis", EventKind::Analysis, "t", "m"));
        assert_eq!(recorder.ids.lock().unwrap().len(), 2);
    }
}
