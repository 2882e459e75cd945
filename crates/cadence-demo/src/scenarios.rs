//! Reference scenarios
//!
//! Each scenario defines one or more blocks on a fresh routine and activates
//! the ones that should start. Leaf actions print straight to stdout.

use cadence_script::{
    actions, finish, jump_to, restart_block, set_property, stop_blocks, switch_blocks,
    AdvanceMode, Block, Collection, EndBehavior, Flow, Function, Gate, GateOption, Label,
    Routine, RoutineOptions, ScriptResult, Timing, TimingPair, Wait,
};
use clap::ValueEnum;
use rand::Rng;
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// A runnable example routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Print, wait three seconds, print again
    Simple,
    /// Several actions completing within a single tick
    Frames,
    /// A block that loops a fixed number of times
    Loops,
    /// Jumping over a finish with a label
    Jumps,
    /// Handing control from one block to another
    Blocks,
    /// A reusable slow-typing helper built from a collection
    Collections,
    /// Random branching with a gate
    Gates,
    /// Several looping blocks running side by side
    Parallel,
    /// Timed callbacks in sequence
    Timing,
}

impl Scenario {
    /// Options the scenario needs on top of the configured ones
    pub fn options(self, base: RoutineOptions) -> RoutineOptions {
        match self {
            Scenario::Frames => RoutineOptions {
                advance: AdvanceMode::Chain,
                ..base
            },
            _ => base,
        }
    }

    /// Define the scenario's blocks and activate its starting block
    pub fn define(self, routine: &mut Routine) -> ScriptResult<()> {
        match self {
            Scenario::Simple => simple(routine),
            Scenario::Frames => frames(routine),
            Scenario::Loops => loops(routine),
            Scenario::Jumps => jumps(routine),
            Scenario::Blocks => blocks(routine),
            Scenario::Collections => collections(routine),
            Scenario::Gates => gates(routine),
            Scenario::Parallel => parallel(routine),
            Scenario::Timing => timing(routine),
        }
    }
}

fn secs(n: u64) -> Wait {
    Wait::new(Duration::from_secs(n))
}

fn millis(n: u64) -> Wait {
    Wait::new(Duration::from_millis(n))
}

/// Print a line and advance
fn say(text: impl Into<String>) -> Function {
    let text = text.into();
    Function::new(move |_| {
        println!("{text}");
        Flow::Advance
    })
}

/// Print a line and finish the block
fn say_last(text: impl Into<String>) -> Function {
    let text = text.into();
    Function::new(move |_| {
        println!("{text}");
        Flow::Finish
    })
}

fn simple(routine: &mut Routine) -> ScriptResult<()> {
    routine
        .define(
            "first",
            actions![
                say("Here's a simple block that prints some text, and waits three seconds."),
                secs(3),
                say_last("Done!"),
            ],
        )?
        .activate();
    Ok(())
}

fn frames(routine: &mut Routine) -> ScriptResult<()> {
    routine
        .define(
            "first",
            actions![
                say("This prints several lines at once, even though they are separate actions."),
                say("A block only yields to the tick loop when an action idles or the block finishes."),
                say("So events compose out of small actions without thinking about time until you wait."),
                secs(3),
                say_last("That's it for this one."),
            ],
        )?
        .activate();
    Ok(())
}

fn loops(routine: &mut Routine) -> ScriptResult<()> {
    let remaining = Rc::new(Cell::new(4u32));

    let report = {
        let remaining = Rc::clone(&remaining);
        Function::new(move |_| {
            if remaining.get() == 0 {
                println!("Welp, that's it. Routine over~");
                return Flow::Finish;
            }
            println!("This block will loop {} more times.", remaining.get() - 1);
            Flow::Advance
        })
    };
    let count_down = Function::new(move |_| {
        remaining.set(remaining.get().saturating_sub(1));
        Flow::Advance
    });

    routine
        .define("loop", actions![report, secs(2), count_down])?
        .set_end_behavior(EndBehavior::Loop)
        .activate();
    Ok(())
}

fn jumps(routine: &mut Routine) -> ScriptResult<()> {
    routine
        .define(
            "first",
            actions![
                say("Let's test jumping to a label."),
                secs(3),
                jump_to("after finish"),
                finish(),
                Label::new("after finish"),
                say("This wouldn't have printed unless we jumped."),
                secs(3),
                say_last("OK, that's it."),
            ],
        )?
        .activate();
    Ok(())
}

/// Print a line prefixed with the id of the block running it
fn block_say(text: &'static str) -> Function {
    Function::new(move |block: &mut Block<'_>| {
        println!("{} : {}", block.id(), text);
        Flow::Advance
    })
}

fn progress_bar(progress: u32) -> String {
    let cells: String = (0..100)
        .step_by(5)
        .map(|i| if i > progress { '▫' } else { '▪' })
        .collect();
    format!("[{cells} ]")
}

/// Write `text` and return the cursor to the start of the line
fn overwrite_line(out: &mut impl Write, text: &str) -> std::io::Result<()> {
    write!(out, "{text}\r")?;
    out.flush()
}

fn blocks(routine: &mut Routine) -> ScriptResult<()> {
    routine
        .define(
            "first",
            actions![
                block_say("In this example, we will switch from one block to another."),
                secs(2),
                block_say("Let's fill up a progress bar, but we'll do this in the 'progress' block."),
                secs(3),
                block_say("Let's switch now!"),
                secs(2),
                block_say("-click-"),
                secs(1),
                switch_blocks(["progress"]),
            ],
        )?
        .activate();

    let fill = Function::new(|block: &mut Block<'_>| {
        let progress = block.properties().get_as::<u32>("progress").unwrap_or(0) + 5;
        block.properties_mut().set("progress", progress);
        if let Err(e) = overwrite_line(&mut std::io::stdout(), &progress_bar(progress)) {
            debug!(error = %e, "Failed to draw progress bar");
        }
        if progress >= 100 {
            println!();
            Flow::Advance
        } else {
            Flow::Idle
        }
    });

    routine.define(
        "progress",
        actions![
            block_say("OK. Now we're in the 'progress' block."),
            secs(2),
            block_say("Filling up progress bar..."),
            secs(2),
            set_property("progress", 0),
            fill,
            block_say("Done!"),
            secs(2),
            finish(),
        ],
    )?;
    Ok(())
}

/// Type `text` out one character per step, then continue past the helper
fn slow_type(text: &'static str) -> Collection {
    let typed = Rc::new(Cell::new(0usize));
    let loop_label = format!("loop:{text}");
    let done_label = format!("done:{text}");

    let type_next = {
        let done_label = done_label.clone();
        Function::new(move |block: &mut Block<'_>| {
            let shown: String = text.chars().take(typed.get()).collect();
            if let Err(e) = overwrite_line(&mut std::io::stdout(), &shown) {
                debug!(error = %e, "Failed to write typed text");
            }
            typed.set(typed.get() + 1);
            if typed.get() > text.chars().count() {
                println!();
                typed.set(0);
                block.jump_to(done_label.as_str());
            }
            Flow::Advance
        })
    };

    Collection::new(actions![
        Label::new(loop_label.as_str()),
        type_next,
        millis(100),
        jump_to(loop_label.as_str()),
        Label::new(done_label),
    ])
}

fn collections(routine: &mut Routine) -> ScriptResult<()> {
    routine
        .define(
            "first",
            actions![
                say("You can easily make your own actions by using functions."),
                secs(2),
                slow_type("For example, here's a slow typing action."),
                secs(1),
                say_last("Done!"),
            ],
        )?
        .activate();
    Ok(())
}

/// Print a line, then give the reader a second
fn say_slowly(text: &'static str) -> Collection {
    Collection::new(actions![say(text), secs(1)])
}

fn chose(choice: u32) -> impl FnMut(&Block<'_>) -> bool {
    move |block: &Block<'_>| block.properties().get_as::<u32>("choice") == Some(choice)
}

fn gates(routine: &mut Routine) -> ScriptResult<()> {
    let gate = Gate::new(vec![
        GateOption::new(chose(0), actions![say_slowly("1: Option #1 was chosen.")])?,
        GateOption::new(
            chose(1),
            actions![say_slowly("2: The second choice, option #2 was selected.")],
        )?,
        GateOption::otherwise(actions![
            say_slowly("3: The third choice was chosen."),
            say_slowly("This one is a loser - game over!"),
            finish(),
        ])?,
    ]);

    let roll = Function::new(|block: &mut Block<'_>| {
        let choice: u32 = rand::thread_rng().gen_range(0..3);
        block.properties_mut().set("choice", choice);
        Flow::Advance
    });

    routine
        .define(
            "first",
            actions![
                say_slowly("OK, so let's try a gate."),
                Label::new("gate start"),
                say_slowly("Let's see which option we randomly get..."),
                roll,
                gate,
                say_slowly("Nice! Let's try again."),
                jump_to("gate start"),
            ],
        )?
        .activate();
    Ok(())
}

fn parallel(routine: &mut Routine) -> ScriptResult<()> {
    let next = Rc::new(Cell::new(1i64));
    let wake_next = Function::new(move |block: &mut Block<'_>| {
        println!("First block is just the beginning...");
        block.routine().activate([next.get()]);
        next.set(next.get() + 1);
        Flow::Advance
    });

    routine
        .define(0, actions![wake_next, secs(2), restart_block()])?
        .activate();
    routine.define(
        1,
        actions![say("second block is alive and well..."), millis(500), restart_block()],
    )?;
    routine.define(
        2,
        actions![say("third block is going crazy..."), millis(100), restart_block()],
    )?;
    routine.define(
        3,
        actions![say("fourth block is kinda insane...!!!"), millis(50), restart_block()],
    )?;
    routine.define(
        4,
        actions![
            stop_blocks([0, 1, 2, 3]),
            say("OK, I'm done. All tuckered out."),
            secs(1),
            finish(),
        ],
    )?;
    Ok(())
}

fn timing(routine: &mut Routine) -> ScriptResult<()> {
    let countdown = Timing::new(vec![
        TimingPair::new(Duration::from_secs(1), |_| println!("3...")),
        TimingPair::new(Duration::from_secs(1), |_| println!("2...")),
        TimingPair::new(Duration::from_secs(1), |_| println!("1...")),
        TimingPair::new(Duration::from_millis(500), |_| println!("Liftoff!")),
    ])?;

    routine
        .define(
            "countdown",
            actions![say("Counting down with timed callbacks."), countdown, secs(1), finish()],
        )?
        .activate();
    Ok(())
}
