use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// An event waiting in the queue.
///
/// `seq` breaks ties between events scheduled for the same time so that
/// they are delivered in the order they were scheduled.
struct Event<T> {
    t: usize,
    seq: usize,
    data: T,
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        self.t == other.t && self.seq == other.seq
    }
}

impl<T> Eq for Event<T> {}

impl<T> Ord for Event<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse so the earliest event pops first
        other
            .t
            .cmp(&self.t)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Event<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Events an agent wants scheduled after handling an event.
pub struct Response<T> {
    pub events: Vec<(usize, T)>,
}

impl<T> Response<T> {
    pub fn new() -> Response<T> {
        Response { events: Vec::new() }
    }

    pub fn event(t: usize, data: T) -> Response<T> {
        Response {
            events: vec![(t, data)],
        }
    }

    pub fn events(events: Vec<(usize, T)>) -> Response<T> {
        Response { events }
    }
}

impl<T> Default for Response<T> {
    fn default() -> Self {
        Response::new()
    }
}

/// A participant in the simulation.
///
/// Every agent sees every event; agents ignore what is not addressed to them.
pub trait Agent<T, S> {
    fn act(&mut self, _current_t: usize, _data: &T) -> Response<T> {
        Response::new()
    }

    fn stats(&self) -> S;
}

pub struct EventLoop<T, S> {
    queue: BinaryHeap<Event<T>>,
    current_t: usize,
    next_seq: usize,
    agents: Vec<Box<dyn Agent<T, S>>>,
}

impl<T, S> EventLoop<T, S> {
    pub fn new(events: Vec<(usize, T)>, agents: Vec<Box<dyn Agent<T, S>>>) -> EventLoop<T, S> {
        let mut event_loop = EventLoop {
            queue: BinaryHeap::new(),
            current_t: 0,
            next_seq: 0,
            agents,
        };
        for (t, data) in events {
            event_loop.schedule(t, data);
        }
        event_loop
    }

    fn schedule(&mut self, t: usize, data: T) {
        self.queue.push(Event {
            t,
            seq: self.next_seq,
            data,
        });
        self.next_seq += 1;
    }

    fn broadcast(&mut self) {
        if let Some(event) = self.queue.pop() {
            self.current_t = event.t;
            let mut scheduled = Vec::new();
            for agent in &mut self.agents {
                let response = agent.act(self.current_t, &event.data);
                scheduled.extend(response.events);
            }
            for (t, data) in scheduled {
                // the past cannot be rescheduled
                if t >= self.current_t {
                    self.schedule(t, data);
                }
            }
        }
    }

    /// Process every event scheduled at or before `until`.
    ///
    /// Can be called repeatedly with increasing horizons; events beyond the
    /// horizon stay queued.
    pub fn run(&mut self, until: usize) {
        while let Some(next) = self.queue.peek() {
            if next.t > until {
                break;
            }
            self.broadcast();
        }
    }

    pub fn current_t(&self) -> usize {
        self.current_t
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> Vec<S> {
        self.agents.iter().map(|agent| agent.stats()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        seen: Vec<(usize, u8)>,
        reschedule_until: usize,
    }

    impl Agent<u8, Vec<(usize, u8)>> for Counter {
        fn act(&mut self, current_t: usize, data: &u8) -> Response<u8> {
            self.seen.push((current_t, *data));
            if current_t < self.reschedule_until {
                Response::event(current_t + 1, *data)
            } else {
                Response::new()
            }
        }

        fn stats(&self) -> Vec<(usize, u8)> {
            self.seen.clone()
        }
    }

    fn counter(reschedule_until: usize) -> Box<dyn Agent<u8, Vec<(usize, u8)>>> {
        Box::new(Counter {
            seen: Vec::new(),
            reschedule_until,
        })
    }

    #[test]
    fn min_queue() {
        let mut queue = BinaryHeap::<Event<u8>>::new();
        queue.push(Event { t: 2, seq: 0, data: 2 });
        queue.push(Event { t: 1, seq: 1, data: 1 });
        assert_eq!(queue.peek().map(|e| e.data), Some(1));
    }

    #[test]
    fn same_time_events_are_fifo() {
        let mut event_loop = EventLoop::new(vec![(1, 7), (1, 8), (1, 9)], vec![counter(0)]);
        event_loop.run(1);

        let stats = event_loop.stats();
        assert_eq!(stats[0], vec![(1, 7), (1, 8), (1, 9)]);
    }

    #[test]
    fn run_stops_at_horizon() {
        let mut event_loop = EventLoop::new(vec![(1, 0)], vec![counter(usize::MAX)]);
        event_loop.run(5);

        assert_eq!(event_loop.current_t(), 5);
        assert_eq!(event_loop.stats()[0].len(), 5);
        assert_eq!(event_loop.pending(), 1);

        // resuming picks up the queued event
        event_loop.run(8);
        assert_eq!(event_loop.current_t(), 8);
        assert_eq!(event_loop.stats()[0].len(), 8);
    }

    #[test]
    fn run_drains_when_agents_stop_scheduling() {
        let mut event_loop = EventLoop::new(vec![(1, 0)], vec![counter(3)]);
        event_loop.run(100);

        assert_eq!(event_loop.current_t(), 3);
        assert_eq!(event_loop.pending(), 0);
    }

    #[test]
    fn past_events_are_dropped() {
        struct TimeTraveller;
        impl Agent<u8, ()> for TimeTraveller {
            fn act(&mut self, current_t: usize, _data: &u8) -> Response<u8> {
                Response::event(current_t.saturating_sub(1), 0)
            }
            fn stats(&self) {}
        }

        let mut event_loop: EventLoop<u8, ()> = EventLoop::new(vec![(3, 0)], vec![Box::new(TimeTraveller)]);
        event_loop.run(10);
        assert_eq!(event_loop.pending(), 0);
    }
}
