use std::cell::{Cell, RefCell};

use avr_coop_scheduler::rtos::{Quantum, Runner, Scheduler, SimpleTask, TaskId, TaskState, Ticks};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ready_order<const N: usize>(scheduler: &Scheduler<N>) -> Vec<TaskId> {
    scheduler.inspect(|t| t.ready().collect())
}

fn delay_order<const N: usize>(scheduler: &Scheduler<N>) -> Vec<(TaskId, Ticks)> {
    scheduler.inspect(|t| t.delaying().collect())
}

fn assert_consistent<const N: usize>(scheduler: &Scheduler<N>) {
    scheduler.inspect(|t| t.audit()).unwrap();
}

#[test]
fn same_tick_expiry_preserves_wake_order() {
    init_logger();
    let scheduler = Scheduler::<3>::new();
    scheduler.init();
    let log = RefCell::new(Vec::new());
    let mut a = SimpleTask::new(|| {
        log.borrow_mut().push('a');
        Quantum::Requeue
    });
    let mut b = SimpleTask::new(|| {
        log.borrow_mut().push('b');
        Quantum::Suspend
    });
    let mut c = SimpleTask::new(|| {
        log.borrow_mut().push('c');
        Quantum::Suspend
    });

    let mut runner = Runner::new(&scheduler);
    let ia = runner.spawn_started(&mut a, 0).unwrap();
    let ib = runner.spawn_started(&mut b, 3).unwrap();
    let ic = runner.spawn_started(&mut c, 3).unwrap();

    assert!(runner.run_next());
    for _ in 0..3 {
        scheduler.tick();
    }
    assert_eq!(ready_order(&scheduler), [ia, ib, ic]);
    assert_consistent(&scheduler);

    while runner.run_next() && log.borrow().len() < 4 {}
    assert_eq!(*log.borrow(), ['a', 'a', 'b', 'c']);
}

#[test]
fn suspended_delaying_task_is_never_promoted() {
    init_logger();
    let scheduler = Scheduler::<1>::new();
    let mut d = SimpleTask::new(|| Quantum::Suspend);
    let mut runner = Runner::new(&scheduler);
    let id = runner.spawn_started(&mut d, 5).unwrap();

    scheduler.advance(2);
    assert_eq!(scheduler.state(id), TaskState::Delaying);
    assert!(scheduler.suspend(id));
    scheduler.advance(3);

    assert!(scheduler.is_suspended(id));
    assert!(ready_order(&scheduler).is_empty());
    assert!(delay_order(&scheduler).is_empty());
    assert!(!runner.run_next());
}

#[test]
fn early_suspend_keeps_other_wake_times() {
    init_logger();
    let scheduler = Scheduler::<3>::new();
    let body = || Quantum::Suspend;
    let mut bodies = [SimpleTask::new(body), SimpleTask::new(body), SimpleTask::new(body)];
    let mut runner = Runner::new(&scheduler);
    let ids: Vec<TaskId> = bodies.iter_mut().map(|b| runner.spawn(b).unwrap()).collect();

    scheduler.wake(ids[0], 3);
    scheduler.wake(ids[1], 8);
    scheduler.wake(ids[2], 5);
    assert!(scheduler.suspend(ids[2]));

    assert!(scheduler.is_suspended(ids[2]));
    assert_eq!(delay_order(&scheduler), [(ids[0], 3), (ids[1], 8)]);
    assert_consistent(&scheduler);

    scheduler.advance(7);
    assert_eq!(ready_order(&scheduler), [ids[0]]);
    scheduler.tick();
    assert_eq!(ready_order(&scheduler), [ids[0], ids[1]]);
}

#[test]
fn wake_and_suspend_are_noops_in_wrong_state() {
    init_logger();
    let scheduler = Scheduler::<2>::new();
    let mut a = SimpleTask::new(|| Quantum::Suspend);
    let mut runner = Runner::new(&scheduler);
    let id = runner.spawn(&mut a).unwrap();

    assert!(!scheduler.suspend(id));
    assert!(scheduler.wake(id, 4));
    assert!(!scheduler.wake(id, 0));
    assert_eq!(delay_order(&scheduler), [(id, 4)]);
    assert!(ready_order(&scheduler).is_empty());
}

#[test]
fn task_suspending_itself_mid_quantum_is_ignored() {
    init_logger();
    let scheduler = Scheduler::<1>::new();
    let me = Cell::new(None);
    let suspended = Cell::new(true);
    let mut task = SimpleTask::new(|| {
        if let Some(id) = me.get() {
            suspended.set(scheduler.suspend(id));
            // Waking ourselves is ignored too: we are still on the ready list
            assert!(!scheduler.wake(id, 0));
        }
        Quantum::SleepFor(2)
    });
    let mut runner = Runner::new(&scheduler);
    me.set(Some(runner.spawn_started(&mut task, 0).unwrap()));
    let id = me.get().unwrap();

    assert!(runner.run_next());
    assert!(!suspended.get());
    assert_eq!(scheduler.state(id), TaskState::Delaying);
    assert_eq!(delay_order(&scheduler), [(id, 2)]);
}

#[test]
fn suspend_others_from_running_task() {
    init_logger();
    let scheduler = Scheduler::<4>::new();
    let runs = Cell::new(0u32);
    let mut boss = SimpleTask::new(|| {
        scheduler.suspend_others();
        Quantum::SleepFor(1)
    });
    let mut worker = SimpleTask::new(|| {
        runs.set(runs.get() + 1);
        Quantum::Requeue
    });
    let mut sleeper = SimpleTask::new(|| Quantum::Suspend);
    let mut other = SimpleTask::new(|| Quantum::Suspend);

    let mut runner = Runner::new(&scheduler);
    let boss_id = runner.spawn_started(&mut boss, 0).unwrap();
    let worker_id = runner.spawn_started(&mut worker, 0).unwrap();
    let sleeper_id = runner.spawn_started(&mut sleeper, 10).unwrap();
    let other_id = runner.spawn_started(&mut other, 0).unwrap();

    assert!(runner.run_next());
    for id in [worker_id, sleeper_id, other_id] {
        assert!(scheduler.is_suspended(id));
    }
    assert_eq!(delay_order(&scheduler), [(boss_id, 1)]);
    assert!(!runner.run_next());
    assert_eq!(runs.get(), 0);
    assert_consistent(&scheduler);
}

#[test]
fn integer_quantum_contract_drives_rescheduling() {
    init_logger();
    let scheduler = Scheduler::<1>::new();
    let script = RefCell::new(vec![3, 0, -1]);
    let mut task = SimpleTask::new(|| Quantum::from(script.borrow_mut().remove(0)));
    let mut runner = Runner::new(&scheduler);
    let id = runner.spawn_started(&mut task, 0).unwrap();

    assert!(runner.run_next());
    assert_eq!(delay_order(&scheduler), [(id, 3)]);
    scheduler.advance(3);
    assert!(runner.run_next());
    assert_eq!(ready_order(&scheduler), [id]);
    assert!(runner.run_next());
    assert!(scheduler.is_suspended(id));
}

#[test]
fn init_resets_lists_and_clock() {
    init_logger();
    let scheduler = Scheduler::<2>::new();
    let mut a = SimpleTask::new(|| Quantum::Requeue);
    let mut b = SimpleTask::new(|| Quantum::Requeue);
    let mut runner = Runner::new(&scheduler);
    let ia = runner.spawn_started(&mut a, 0).unwrap();
    let ib = runner.spawn_started(&mut b, 9).unwrap();
    scheduler.advance(4);
    assert_eq!(scheduler.ticks(), 4);

    scheduler.init();
    assert_eq!(scheduler.ticks(), 0);
    assert!(scheduler.is_suspended(ia));
    assert!(scheduler.is_suspended(ib));
    assert_consistent(&scheduler);
}

/// Ticks from another thread stand in for the timer ISR racing the main loop
#[test]
fn concurrent_ticks_never_lose_tasks() {
    init_logger();
    const TICKS: u32 = 5_000;
    let scheduler = Scheduler::<4>::new();
    let runs = [Cell::new(0u32), Cell::new(0u32), Cell::new(0u32), Cell::new(0u32)];
    let mut bodies: Vec<SimpleTask<_>> = runs
        .iter()
        .enumerate()
        .map(|(i, count)| {
            SimpleTask::new(move || {
                count.set(count.get() + 1);
                Quantum::SleepFor(i as Ticks)
            })
        })
        .collect();
    let mut runner = Runner::new(&scheduler);
    let ids: Vec<TaskId> = bodies
        .iter_mut()
        .map(|b| runner.spawn_started(b, 1).unwrap())
        .collect();

    std::thread::scope(|s| {
        let ticker = s.spawn(|| {
            for _ in 0..TICKS {
                scheduler.tick();
            }
        });
        while !ticker.is_finished() {
            runner.run_next();
            assert_consistent(&scheduler);
        }
    });

    assert_eq!(scheduler.ticks(), TICKS);
    for id in ids {
        assert!(!scheduler.is_suspended(id), "{} was lost", id);
    }
    assert!(runs.iter().all(|c| c.get() > 0));
}
