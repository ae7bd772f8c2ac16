use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle returned by [`EventEmitter::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

/// Synchronous listener list. Listeners run in subscription order.
pub struct EventEmitter<E> {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<E>)>,
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E> EventEmitter<E> {
    pub fn on(&mut self, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Notifications about registered indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorEvent {
    VisibilityChanged { id: String, visible: bool },
    /// Host should present the settings UI of the indicator.
    SettingsOpen { id: String },
    Removed { id: String },
}

pub type IndicatorEvents = EventEmitter<IndicatorEvent>;

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{EventEmitter, IndicatorEvent};

    #[test]
    fn off_detaches_only_the_given_listener() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = EventEmitter::<IndicatorEvent>::default();

        let first = {
            let seen = Rc::clone(&seen);
            emitter.on(move |event| seen.borrow_mut().push(("first", event.clone())))
        };
        {
            let seen = Rc::clone(&seen);
            emitter.on(move |event| seen.borrow_mut().push(("second", event.clone())));
        }

        assert!(emitter.off(first));
        assert!(!emitter.off(first));
        emitter.emit(&IndicatorEvent::SettingsOpen { id: "sma".to_owned() });

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "second");
    }
}
