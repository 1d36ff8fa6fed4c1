use crate::sim::{Event, Simulator, Tick, World};
use std::any::Any;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct DummyWorld {
    ticks: usize,
}

impl World for DummyWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        self.ticks = self.ticks.saturating_add(1);
    }
}

struct Push {
    id: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for Push {
    fn execute(self: Box<Self>, _sim: &mut Simulator, _world: &mut dyn World) {
        let Push { id, log } = *self;
        log.lock().expect("log lock").push(id);
    }
}

struct PushThenScheduleNow {
    id: u32,
    next_id: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for PushThenScheduleNow {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let PushThenScheduleNow { id, next_id, log } = *self;
        log.lock().expect("log lock").push(id);
        sim.schedule(sim.now(), Push { id: next_id, log });
    }
}

#[test]
fn scheduled_events_order_by_time_then_seq() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        Tick(10),
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    );
    sim.schedule(
        Tick(5),
        Push {
            id: 2,
            log: Arc::clone(&log),
        },
    );
    sim.schedule(
        Tick(10),
        Push {
            id: 3,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    sim.run(&mut world);

    assert_eq!(&*log.lock().expect("log lock"), &[2, 1, 3]);
    assert_eq!(world.ticks, 3);
    assert_eq!(sim.now(), Tick(10));
}

#[test]
fn event_scheduled_at_same_time_inside_event_runs_after_current_event() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        Tick::ZERO,
        PushThenScheduleNow {
            id: 1,
            next_id: 2,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    sim.run(&mut world);

    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
    assert_eq!(world.ticks, 2);
    assert_eq!(sim.now(), Tick::ZERO);
}

#[test]
fn run_until_skips_events_after_until_and_advances_time() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        Tick::ZERO,
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    );
    sim.schedule(
        Tick(10),
        Push {
            id: 2,
            log: Arc::clone(&log),
        },
    );

    let mut world = DummyWorld::default();
    sim.run_until(Tick(5), &mut world);

    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(world.ticks, 1);
    assert_eq!(sim.now(), Tick(5));

    sim.run(&mut world);
    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
    assert_eq!(world.ticks, 2);
    assert_eq!(sim.now(), Tick(10));
}

#[test]
fn timer_fires_after_configured_delay() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let fired = Arc::clone(&log);

    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();
    sim.set_timer(
        3,
        Box::new(move |sim, _world| {
            fired.lock().expect("log lock").push(sim.now().0 as u32);
        }),
    );

    sim.run_until(Tick(2), &mut world);
    assert!(log.lock().expect("log lock").is_empty());
    assert_eq!(sim.armed_timers(), 1);

    sim.run(&mut world);
    assert_eq!(&*log.lock().expect("log lock"), &[3]);
    assert_eq!(sim.armed_timers(), 0);
}

#[test]
fn cancelled_timer_is_a_noop_when_it_pops() {
    let log: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let fired = Arc::clone(&log);

    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();
    let id = sim.set_timer(
        5,
        Box::new(move |_sim, _world| {
            fired.lock().expect("log lock").push(1);
        }),
    );
    sim.cancel_timer(id);

    sim.run(&mut world);
    assert!(log.lock().expect("log lock").is_empty());
    assert_eq!(sim.now(), Tick(5));
}

#[test]
fn cancelling_a_fired_timer_is_a_noop() {
    let log: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let fired = Arc::clone(&log);

    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();
    let id = sim.set_timer(
        1,
        Box::new(move |_sim, _world| {
            fired.lock().expect("log lock").push(1);
        }),
    );

    sim.run(&mut world);
    assert_eq!(&*log.lock().expect("log lock"), &[1]);

    // Cancelling after the fact must not disturb anything.
    sim.cancel_timer(id);
    assert_eq!(sim.armed_timers(), 0);
}

#[test]
fn pacer_steps_one_tick_at_a_time_and_honors_pause() {
    use crate::sim::Pacer;

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();
    sim.schedule(
        Tick(1),
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    );
    sim.schedule(
        Tick(2),
        Push {
            id: 2,
            log: Arc::clone(&log),
        },
    );

    let mut pacer = Pacer::new(0);
    pacer.step(&mut sim, &mut world);
    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(sim.now(), Tick(1));

    // A paused unpaced pacer gives up instead of spinning.
    pacer.pause();
    assert!(pacer.is_paused());
    pacer.run_for(&mut sim, &mut world, 10);
    assert_eq!(sim.now(), Tick(1));

    pacer.play();
    pacer.run_for(&mut sim, &mut world, 2);
    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
    assert_eq!(sim.now(), Tick(3));
}

#[test]
fn timers_can_chain_into_new_timers() {
    let log: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let outer = Arc::clone(&log);

    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();
    sim.set_timer(
        2,
        Box::new(move |sim, _world| {
            outer.lock().expect("log lock").push(sim.now().0);
            let inner = Arc::clone(&outer);
            sim.set_timer(
                3,
                Box::new(move |sim, _world| {
                    inner.lock().expect("log lock").push(sim.now().0);
                }),
            );
        }),
    );

    sim.run(&mut world);
    assert_eq!(&*log.lock().expect("log lock"), &[2, 5]);
}
