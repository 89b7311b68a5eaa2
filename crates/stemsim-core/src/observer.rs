//! Event observers.
//!
//! The driver hands every popped event to an [`EventObserver`], together
//! with the tissue as it stands after the event ran. A cancelled event is
//! taken out of the queue when it is cancelled, so observers never see
//! it. When the run stops they get one final end event.

use stemsim_tissue::Tissue;

use crate::event::SimEvent;

/// Callback invoked for every event the driver pops.
pub trait EventObserver: Send {
    /// Called after `event` was popped and, if valid, executed.
    fn on_event(&mut self, event: &SimEvent, tissue: &Tissue);
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl EventObserver for NoOpObserver {
    fn on_event(&mut self, _event: &SimEvent, _tissue: &Tissue) {}
}

impl<T: EventObserver + ?Sized> EventObserver for &mut T {
    fn on_event(&mut self, event: &SimEvent, tissue: &Tissue) {
        (**self).on_event(event, tissue);
    }
}

/// Fans each event out to several observers, in registration order.
///
/// Observers may be borrowed, so a caller can register `&mut` handles and
/// read the observers back once the run is over.
#[derive(Default)]
pub struct ObserverSet<'a> {
    observers: Vec<Box<dyn EventObserver + 'a>>,
}

impl<'a> ObserverSet<'a> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer after the ones already registered.
    pub fn register(&mut self, observer: Box<dyn EventObserver + 'a>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for ObserverSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EventObserver for ObserverSet<'_> {
    fn on_event(&mut self, event: &SimEvent, tissue: &Tissue) {
        for observer in &mut self.observers {
            observer.on_event(event, tissue);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use stemsim_tissue::LayoutParams;
    use stemsim_types::EventId;

    use super::*;

    struct Tagging {
        tag: &'static str,
        seen: Arc<Mutex<Vec<(&'static str, EventId)>>>,
    }

    impl EventObserver for Tagging {
        fn on_event(&mut self, event: &SimEvent, _tissue: &Tissue) {
            self.seen.lock().unwrap().push((self.tag, event.id));
        }
    }

    #[test]
    fn set_notifies_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut set = ObserverSet::new();
        assert!(set.is_empty());
        for tag in ["first", "second"] {
            set.register(Box::new(Tagging {
                tag,
                seen: Arc::clone(&seen),
            }));
        }
        assert_eq!(set.len(), 2);

        let tissue = Tissue::build(&LayoutParams::default(), 1).unwrap();
        set.on_event(&SimEvent::start(EventId::new(0)), &tissue);
        set.on_event(&SimEvent::end(EventId::new(1), 3.0), &tissue);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("first", EventId::new(0)),
                ("second", EventId::new(0)),
                ("first", EventId::new(1)),
                ("second", EventId::new(1)),
            ]
        );
    }

    #[derive(Default)]
    struct Counting {
        events: usize,
    }

    impl EventObserver for Counting {
        fn on_event(&mut self, _event: &SimEvent, _tissue: &Tissue) {
            self.events += 1;
        }
    }

    #[test]
    fn borrowed_observers_are_readable_after_the_set_is_gone() {
        let tissue = Tissue::build(&LayoutParams::default(), 1).unwrap();
        let mut first = Counting::default();
        let mut second = Counting::default();
        {
            let mut set = ObserverSet::new();
            set.register(Box::new(&mut first));
            set.register(Box::new(&mut second));
            set.on_event(&SimEvent::start(EventId::new(0)), &tissue);
            set.on_event(&SimEvent::end(EventId::new(1), 2.0), &tissue);
        }
        assert_eq!(first.events, 2);
        assert_eq!(second.events, 2);
    }
}
