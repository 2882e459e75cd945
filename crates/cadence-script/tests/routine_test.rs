//! Behavioral tests for the routine scheduler
//!
//! Time is driven by a shared `ManualClock` so every scenario is
//! deterministic.

use cadence_script::{
    actions, finish, jump_to, AdvanceMode, Block, Collection, CommitTiming, EndBehavior, Flow,
    Function, Gate, GateOption, Id, Label, ManualClock, Routine, RoutineOptions, Wait, WaitTicks,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

type Log = Rc<RefCell<Vec<String>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn print(log: &Log, text: &'static str, flow: Flow) -> Function {
    let log = Rc::clone(log);
    Function::new(move |_| {
        log.borrow_mut().push(text.to_string());
        flow
    })
}

fn counter() -> Rc<Cell<u32>> {
    Rc::new(Cell::new(0))
}

// ============================================================================
// Playhead
// ============================================================================

#[test]
fn test_loop_invariant_returns_to_start() {
    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define(
            "loop",
            actions![Label::new(0), Label::new(1), Label::new(2), Label::new(3)],
        )
        .unwrap()
        .set_end_behavior(EndBehavior::Loop)
        .activate();

    let len = routine.block("loop").unwrap().len();
    for start in 0..len {
        routine.block("loop").unwrap().set_index(start);
        for _ in 0..len {
            routine.tick();
        }
        assert_eq!(routine.block("loop").unwrap().index(), start);
    }
    assert!(routine.is_running());
}

#[test]
fn test_running_off_end_deactivates_by_default() {
    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define("once", actions![Label::new("a"), Label::new("b")])
        .unwrap()
        .activate();

    assert!(routine.tick().deactivated.is_empty());
    let summary = routine.tick();
    assert_eq!(summary.deactivated, vec![Id::from("once")]);
    assert_eq!(routine.block("once").unwrap().index(), 0);
    assert!(!routine.is_running());
}

#[test]
fn test_routine_wide_loop_option() {
    let options = RoutineOptions {
        on_end: EndBehavior::Loop,
        ..RoutineOptions::default()
    };
    let mut routine = Routine::with_options(ManualClock::new(), options);
    routine
        .define("a", actions![Label::new(0)])
        .unwrap()
        .activate();

    for _ in 0..5 {
        routine.tick();
    }
    assert!(routine.is_active(["a"]));

    routine
        .block("a")
        .unwrap()
        .set_end_behavior(EndBehavior::Deactivate);
    routine.tick();
    assert!(!routine.is_active(["a"]));
}

#[test]
fn test_jump_inside_poll_is_respected() {
    let target_inits = counter();
    let skipped = counter();

    let target = {
        let inits = Rc::clone(&target_inits);
        Function::new(|_| Flow::Idle).with_init(move |_| inits.set(inits.get() + 1))
    };
    let skipped_action = {
        let skipped = Rc::clone(&skipped);
        Function::new(move |_| {
            skipped.set(skipped.get() + 1);
            Flow::Advance
        })
    };
    let jumper = Function::new(|block: &mut Block<'_>| {
        block.set_index(1);
        Flow::Advance
    });

    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define(
            "j",
            actions![Label::new(0), target, skipped_action, jumper],
        )
        .unwrap()
        .set_index(3);
    routine.activate(["j"]);

    routine.tick();
    assert_eq!(routine.block("j").unwrap().index(), 1);
    assert_eq!(target_inits.get(), 1);
    assert_eq!(skipped.get(), 0);

    routine.tick();
    assert_eq!(routine.block("j").unwrap().index(), 1);
    assert_eq!(target_inits.get(), 1);
}

#[test]
fn test_restart_from_own_poll_inits_once() {
    let inits = counter();
    let polls = counter();

    let action = {
        let inits = Rc::clone(&inits);
        let polls = Rc::clone(&polls);
        Function::new(move |block: &mut Block<'_>| {
            polls.set(polls.get() + 1);
            if polls.get() == 2 {
                block.restart();
            }
            Flow::Idle
        })
        .with_init(move |_| inits.set(inits.get() + 1))
    };

    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define("self", actions![action, Label::new("end")])
        .unwrap()
        .activate();
    assert_eq!(inits.get(), 1);

    routine.tick();
    assert_eq!(inits.get(), 1);
    assert_eq!(routine.block("self").unwrap().current_frame(), 1);

    // Restarting onto the action being polled initializes it once, after
    // the poll returns.
    routine.tick();
    assert_eq!(inits.get(), 2);
    assert_eq!(routine.block("self").unwrap().current_frame(), 0);

    routine.tick();
    assert_eq!(inits.get(), 2);
    assert_eq!(routine.block("self").unwrap().index(), 0);
}

#[test]
fn test_frame_counter_resets_on_move() {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let record = {
        let frames = Rc::clone(&frames);
        Function::new(move |block: &mut Block<'_>| {
            frames.borrow_mut().push(block.current_frame());
            if block.current_frame() == 2 {
                Flow::Advance
            } else {
                Flow::Idle
            }
        })
    };

    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define("f", actions![record, Label::new("end")])
        .unwrap()
        .set_end_behavior(EndBehavior::Loop)
        .activate();

    for _ in 0..5 {
        routine.tick();
    }
    assert_eq!(*frames.borrow(), vec![0, 1, 2, 0]);
}

// ============================================================================
// Waits
// ============================================================================

#[test]
fn test_wait_reinitializes_each_visit() {
    let clock = ManualClock::new();
    let fired = counter();
    let tally = {
        let fired = Rc::clone(&fired);
        Function::new(move |_| {
            fired.set(fired.get() + 1);
            Flow::Advance
        })
    };

    let mut routine = Routine::with_clock(clock.clone());
    routine
        .define("w", actions![Wait::new(Duration::from_secs(2)), tally])
        .unwrap()
        .set_end_behavior(EndBehavior::Loop);

    // Definition armed the wait at t=0; restarting re-arms it from now.
    clock.advance_secs(5);
    routine.restart(["w"]);
    routine.activate(["w"]);

    routine.tick();
    assert_eq!(fired.get(), 0);

    clock.advance_secs(2);
    routine.tick();
    routine.tick();
    assert_eq!(fired.get(), 1);

    // Back at the wait: it waits a full two seconds again.
    routine.tick();
    clock.advance_secs(1);
    routine.tick();
    routine.tick();
    assert_eq!(fired.get(), 1);

    clock.advance_secs(1);
    routine.tick();
    routine.tick();
    assert_eq!(fired.get(), 2);
}

#[test]
fn test_scenario_chain_mode() {
    let clock = ManualClock::new();
    let log = new_log();
    let options = RoutineOptions {
        advance: AdvanceMode::Chain,
        ..RoutineOptions::default()
    };

    let mut routine = Routine::with_options(clock.clone(), options);
    routine
        .define(
            "x",
            actions![
                print(&log, "a", Flow::Advance),
                Wait::new(Duration::from_secs(2)),
                print(&log, "b", Flow::Finish),
            ],
        )
        .unwrap()
        .activate();

    routine.tick();
    assert_eq!(*log.borrow(), vec!["a"]);

    clock.advance_secs(1);
    routine.tick();
    assert_eq!(*log.borrow(), vec!["a"]);
    assert!(routine.is_active(["x"]));

    clock.advance_secs(1);
    let summary = routine.tick();
    assert_eq!(*log.borrow(), vec!["a", "b"]);
    assert_eq!(summary.deactivated, vec![Id::from("x")]);

    clock.advance_secs(1);
    assert_eq!(routine.tick().stepped, 0);
    assert_eq!(*log.borrow(), vec!["a", "b"]);
}

#[test]
fn test_scenario_step_mode_runs_one_tick_later() {
    let clock = ManualClock::new();
    let log = new_log();

    let mut routine = Routine::with_clock(clock.clone());
    routine
        .define(
            "x",
            actions![
                print(&log, "a", Flow::Advance),
                Wait::new(Duration::from_secs(2)),
                print(&log, "b", Flow::Finish),
            ],
        )
        .unwrap()
        .activate();

    routine.tick();
    clock.advance_secs(1);
    routine.tick();
    clock.advance_secs(1);
    routine.tick();
    assert_eq!(*log.borrow(), vec!["a"]);
    assert!(routine.is_running());

    clock.advance_secs(1);
    routine.tick();
    assert_eq!(*log.borrow(), vec!["a", "b"]);
    assert!(!routine.is_running());
}

#[test]
fn test_chain_mode_is_bounded_per_tick() {
    let mut routine = Routine::with_options(
        ManualClock::new(),
        RoutineOptions {
            advance: AdvanceMode::Chain,
            on_end: EndBehavior::Loop,
            ..RoutineOptions::default()
        },
    );
    routine
        .define("spin", actions![Label::new(0), Label::new(1), Label::new(2)])
        .unwrap()
        .activate();

    routine.tick();
    assert_eq!(routine.block("spin").unwrap().index(), 0);
    assert!(routine.is_running());
}

// ============================================================================
// Gates
// ============================================================================

#[test]
fn test_gate_commits_once() {
    let guard_calls = counter();
    let open = Rc::new(Cell::new(true));
    let log = new_log();

    let option = {
        let guard_calls = Rc::clone(&guard_calls);
        let open = Rc::clone(&open);
        GateOption::new(
            move |_| {
                guard_calls.set(guard_calls.get() + 1);
                open.get()
            },
            actions![WaitTicks::new(2), print(&log, "done", Flow::Advance)],
        )
        .unwrap()
    };
    let gate = Gate::new(vec![
        option,
        GateOption::otherwise(actions![print(&log, "else", Flow::Advance)]).unwrap(),
    ]);

    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define("g", actions![gate, WaitTicks::new(100)])
        .unwrap()
        .activate();

    routine.tick();
    assert_eq!(guard_calls.get(), 1);
    open.set(false);

    for _ in 0..4 {
        routine.tick();
    }
    assert_eq!(guard_calls.get(), 1);
    assert_eq!(*log.borrow(), vec!["done"]);
    assert_eq!(routine.block("g").unwrap().index(), 1);
}

#[test]
fn test_gate_else_before_true_guard_wins() {
    let log = new_log();
    let gate = Gate::new(vec![
        GateOption::otherwise(actions![print(&log, "else", Flow::Advance)]).unwrap(),
        GateOption::new(|_| true, actions![print(&log, "guarded", Flow::Advance)]).unwrap(),
    ]);

    let mut routine = Routine::with_clock(ManualClock::new());
    routine.define("g", actions![gate]).unwrap().activate();
    routine.tick();
    routine.tick();

    assert_eq!(*log.borrow(), vec!["else"]);
}

#[test]
fn test_gate_reevaluates_on_revisit() {
    let log = new_log();
    let flip = Rc::new(Cell::new(false));
    let gate = {
        let flip = Rc::clone(&flip);
        Gate::new(vec![
            GateOption::new(move |_| flip.get(), actions![print(&log, "on", Flow::Advance)])
                .unwrap(),
            GateOption::otherwise(actions![print(&log, "off", Flow::Advance)]).unwrap(),
        ])
    };

    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define("g", actions![gate])
        .unwrap()
        .set_end_behavior(EndBehavior::Loop)
        .activate();

    routine.tick();
    routine.tick();
    flip.set(true);
    routine.tick();
    routine.tick();

    assert_eq!(*log.borrow(), vec!["off", "on"]);
}

/// Tick until no block is running and return the number of ticks taken
fn ticks_to_finish(routine: &mut Routine, limit: u64) -> Option<u64> {
    while routine.ticks() < limit {
        routine.tick();
        if !routine.is_running() {
            return Some(routine.ticks());
        }
    }
    None
}

#[test]
fn test_tick_wait_inside_branch_waits_in_full() {
    let mut top = Routine::with_clock(ManualClock::new());
    top.define(
        "top",
        actions![Label::new("a"), Label::new("b"), WaitTicks::new(3), finish()],
    )
    .unwrap()
    .activate();

    let gate = Gate::new(vec![GateOption::otherwise(actions![
        Label::new("a"),
        Label::new("b"),
        WaitTicks::new(3),
        finish(),
    ])
    .unwrap()]);
    let mut nested = Routine::with_clock(ManualClock::new());
    nested.define("nested", actions![gate]).unwrap().activate();

    assert_eq!(ticks_to_finish(&mut top, 50), Some(7));
    // One extra tick for the commit
    assert_eq!(ticks_to_finish(&mut nested, 50), Some(8));
}

#[test]
fn test_branch_actions_see_their_own_frames() {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let record = {
        let frames = Rc::clone(&frames);
        Function::new(move |block: &mut Block<'_>| {
            frames.borrow_mut().push(block.current_frame());
            if block.current_frame() == 2 {
                Flow::Advance
            } else {
                Flow::Idle
            }
        })
    };
    let gate = Gate::new(vec![GateOption::new(
        |block: &Block<'_>| block.current_frame() >= 2,
        actions![Label::new("first"), record],
    )
    .unwrap()]);

    let mut routine = Routine::with_clock(ManualClock::new());
    routine.define("g", actions![gate]).unwrap().activate();

    assert!(ticks_to_finish(&mut routine, 50).is_some());
    assert_eq!(*frames.borrow(), vec![0, 1, 2]);
}

#[test]
fn test_same_tick_branch_starts_at_frame_zero() {
    let frames = Rc::new(RefCell::new(Vec::new()));
    let record = {
        let frames = Rc::clone(&frames);
        Function::new(move |block: &mut Block<'_>| {
            frames.borrow_mut().push(block.current_frame());
            if block.current_frame() == 1 {
                Flow::Advance
            } else {
                Flow::Idle
            }
        })
    };
    let gate = Gate::new(vec![GateOption::new(
        |block: &Block<'_>| block.current_frame() >= 2,
        actions![record],
    )
    .unwrap()])
    .commit_timing(CommitTiming::SameTick);

    let mut routine = Routine::with_clock(ManualClock::new());
    routine.define("g", actions![gate]).unwrap().activate();

    assert_eq!(ticks_to_finish(&mut routine, 50), Some(4));
    assert_eq!(*frames.borrow(), vec![0, 1]);
}

#[test]
fn test_finish_inside_branch_finishes_block() {
    let log = new_log();
    let guard_calls = counter();
    let gate = {
        let guard_calls = Rc::clone(&guard_calls);
        Gate::new(vec![GateOption::new(
            move |_| {
                guard_calls.set(guard_calls.get() + 1);
                true
            },
            actions![print(&log, "branch", Flow::Advance), finish()],
        )
        .unwrap()])
    };

    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define("g", actions![gate, print(&log, "after", Flow::Advance)])
        .unwrap()
        .activate();

    routine.tick();
    routine.tick();
    assert!(routine.is_running());
    let summary = routine.tick();

    assert_eq!(*log.borrow(), vec!["branch"]);
    assert!(!routine.is_running());
    assert_eq!(summary.deactivated, vec![Id::from("g")]);
    assert_eq!(routine.block("g").unwrap().index(), 0);
    assert_eq!(guard_calls.get(), 1);

    // The gate starts uncommitted again
    routine.block("g").unwrap().activate();
    routine.tick();
    assert_eq!(guard_calls.get(), 2);
    assert_eq!(*log.borrow(), vec!["branch"]);
}

#[test]
fn test_jump_inside_branch_moves_enclosing_block() {
    let log = new_log();
    let gate = Gate::new(vec![GateOption::otherwise(actions![
        jump_to("end"),
        print(&log, "tail", Flow::Advance),
    ])
    .unwrap()]);

    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define(
            "g",
            actions![
                Label::new("top"),
                gate,
                print(&log, "skipped", Flow::Advance),
                Label::new("end"),
                WaitTicks::new(100),
            ],
        )
        .unwrap()
        .activate();

    // top, commit, jump
    for _ in 0..3 {
        routine.tick();
    }
    assert_eq!(routine.block("g").unwrap().index(), 3);

    for _ in 0..5 {
        routine.tick();
    }
    assert_eq!(routine.block("g").unwrap().index(), 4);
    assert!(log.borrow().is_empty());
}

// ============================================================================
// Definition
// ============================================================================

#[test]
fn test_collection_flattens_to_four_actions() {
    let mut routine = Routine::with_clock(ManualClock::new());
    let block = routine
        .define(
            "c",
            actions![
                Label::new("a"),
                Collection::new(actions![Label::new("b"), Label::new("c")]),
                Label::new("d"),
            ],
        )
        .unwrap();

    assert_eq!(block.len(), 4);
    let labels: Vec<_> = (0..4).map(|i| block.label_at(i).cloned()).collect();
    assert_eq!(
        labels,
        vec![
            Some(Id::from("a")),
            Some(Id::from("b")),
            Some(Id::from("c")),
            Some(Id::from("d")),
        ]
    );
}

#[test]
fn test_block_made_only_of_empty_collections_is_rejected() {
    let mut routine = Routine::with_clock(ManualClock::new());
    let result = routine.define(
        "hollow",
        actions![Collection::default(), Collection::new(actions![Collection::default()])],
    );
    assert!(result.is_err());
}

#[test]
fn test_redefinition_replaces_block() {
    let log = new_log();
    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define("r", actions![print(&log, "old", Flow::Idle)])
        .unwrap()
        .activate();
    routine
        .define("r", actions![print(&log, "new", Flow::Idle)])
        .unwrap()
        .activate();

    assert_eq!(routine.len(), 1);
    routine.tick();
    assert_eq!(*log.borrow(), vec!["new"]);
}

// ============================================================================
// Activity
// ============================================================================

#[test]
fn test_stop_then_reactivate_resumes_at_start() {
    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define(
            "s",
            actions![Label::new(0), Label::new(1), WaitTicks::new(50)],
        )
        .unwrap()
        .activate();

    routine.tick();
    routine.tick();
    assert_eq!(routine.block("s").unwrap().index(), 2);

    routine.stop(["s"]);
    assert!(!routine.is_running());
    routine.activate(["s"]);
    assert_eq!(routine.block("s").unwrap().index(), 0);
}

#[test]
fn test_pause_keeps_position() {
    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define("p", actions![Label::new(0), WaitTicks::new(50)])
        .unwrap()
        .activate();

    routine.tick();
    routine.pause(["p"]);
    assert_eq!(routine.tick().stepped, 0);

    routine.activate(["p"]);
    assert_eq!(routine.block("p").unwrap().index(), 1);
}

#[test]
fn test_blocks_step_in_registration_order() {
    let log = new_log();
    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define("first", actions![print(&log, "1", Flow::Idle)])
        .unwrap();
    routine
        .define("second", actions![print(&log, "2", Flow::Idle)])
        .unwrap();
    routine.activate(["second", "first"]);

    routine.tick();
    assert_eq!(*log.borrow(), vec!["1", "2"]);
}

#[test]
fn test_block_stopping_sibling_mid_tick() {
    let log = new_log();
    let mut routine = Routine::with_clock(ManualClock::new());
    routine
        .define(
            "killer",
            actions![
                Function::new(|block: &mut Block<'_>| {
                    block.routine().pause(["victim"]);
                    Flow::Advance
                }),
                finish(),
            ],
        )
        .unwrap()
        .activate();
    routine
        .define("victim", actions![print(&log, "victim", Flow::Idle)])
        .unwrap()
        .activate();

    // Selected at tick start, so the victim still takes this step.
    let summary = routine.tick();
    assert_eq!(summary.stepped, 2);
    assert_eq!(*log.borrow(), vec!["victim"]);

    routine.tick();
    assert_eq!(*log.borrow(), vec!["victim"]);
}
