// Evsync Event Queue
// Bounded per-cycle accumulator of discrete events, drained at sync

use smallvec::SmallVec;

use crate::event::TouchPhase;
use crate::state::ValuatorMask;

/// Queue configuration
pub mod queue_config {
    /// Maximum number of discrete events held between two sync markers
    pub const MAX_QUEUE: usize = 32;
}

pub use queue_config::MAX_QUEUE;

/// A discrete event waiting for the next sync marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedEvent {
    Key { code: u16, pressed: bool },
    Button { button: u32, pressed: bool },
    Proximity { entering: bool },
    Touch {
        slot: i32,
        phase: TouchPhase,
        mask: ValuatorMask,
    },
}

/// Bounded FIFO of queued events.
///
/// Once full, further pushes are dropped with a warning. Retained entries
/// keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: SmallVec<[QueuedEvent; MAX_QUEUE]>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            events: SmallVec::new(),
        }
    }

    /// Append an event. Returns `false` if the queue was full and the event dropped.
    pub fn push(&mut self, event: QueuedEvent) -> bool {
        if self.events.len() >= MAX_QUEUE {
            log::warn!("event queue full, dropping {:?}", event);
            return false;
        }
        self.events.push(event);
        true
    }

    /// Queue `count` press/release pairs for a button.
    ///
    /// Expansion stops once the queue fills. Returns `false` if any part
    /// of it was dropped.
    pub fn queue_button_clicks(&mut self, button: u32, count: u32) -> bool {
        for queued in 0..count {
            if self.is_full() {
                log::warn!(
                    "event queue full, dropping {} click(s) of button {}",
                    count - queued,
                    button
                );
                return false;
            }
            self.events.push(QueuedEvent::Button {
                button,
                pressed: true,
            });
            if !self.push(QueuedEvent::Button {
                button,
                pressed: false,
            }) {
                return false;
            }
        }
        true
    }

    /// State of the first proximity entry queued this cycle
    pub fn proximity_state(&self) -> Option<bool> {
        self.events.iter().find_map(|event| match event {
            QueuedEvent::Proximity { entering } => Some(*entering),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.events.len() >= MAX_QUEUE
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedEvent> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[QueuedEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(button: u32) -> QueuedEvent {
        QueuedEvent::Button {
            button,
            pressed: true,
        }
    }

    #[test]
    fn test_event_queue_new() {
        let queue = EventQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_event_queue_push_and_clear() {
        let mut queue = EventQueue::new();
        assert!(queue.push(press(1)));
        assert!(queue.push(QueuedEvent::Key {
            code: 30,
            pressed: true
        }));
        assert_eq!(queue.len(), 2);

        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_overflow_drops_without_reordering() {
        let mut queue = EventQueue::new();
        for button in 0..MAX_QUEUE as u32 {
            assert!(queue.push(press(button)));
        }
        assert!(queue.is_full());
        assert!(!queue.push(press(99)));
        assert_eq!(queue.len(), MAX_QUEUE);

        for (i, event) in queue.iter().enumerate() {
            assert_eq!(*event, press(i as u32));
        }
    }

    #[test]
    fn test_button_clicks_expand_in_pairs() {
        let mut queue = EventQueue::new();
        assert!(queue.queue_button_clicks(4, 3));
        assert_eq!(queue.len(), 6);
        let pressed: Vec<bool> = queue
            .iter()
            .map(|event| match event {
                QueuedEvent::Button { button: 4, pressed } => *pressed,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(pressed, vec![true, false, true, false, true, false]);
    }

    #[test]
    fn test_button_clicks_report_drop() {
        let mut queue = EventQueue::new();
        assert!(!queue.queue_button_clicks(5, 20));
        assert_eq!(queue.len(), MAX_QUEUE);
    }

    #[test]
    fn test_huge_click_count_stops_at_capacity() {
        let mut queue = EventQueue::new();
        queue.push(QueuedEvent::Key {
            code: 30,
            pressed: true,
        });
        assert!(!queue.queue_button_clicks(4, u32::MAX));
        assert_eq!(queue.len(), MAX_QUEUE);
        assert_eq!(queue.as_slice()[MAX_QUEUE - 1], press(4));

        assert!(!queue.queue_button_clicks(4, i32::MAX.unsigned_abs()));
        assert_eq!(queue.len(), MAX_QUEUE);
    }

    #[test]
    fn test_proximity_state_uses_first_entry() {
        let mut queue = EventQueue::new();
        assert_eq!(queue.proximity_state(), None);
        queue.push(press(1));
        queue.push(QueuedEvent::Proximity { entering: true });
        queue.push(QueuedEvent::Proximity { entering: false });
        assert_eq!(queue.proximity_state(), Some(true));
    }
}
