//! Ready-made control actions
//!
//! Each constructor returns a [`Function`] that performs one playhead or
//! routine command when polled.

use crate::action::Function;
use cadence_core::{Flow, Id};
use serde_json::Value;

/// Jump to the first action labelled `label`
///
/// Advances normally if the label does not exist.
pub fn jump_to(label: impl Into<Id>) -> Function {
    let label = label.into();
    Function::new(move |block| {
        block.jump_to(label.clone());
        Flow::Advance
    })
}

/// Move the playhead to `index` (clamped into range)
pub fn set_index(index: usize) -> Function {
    Function::new(move |block| {
        block.set_index(index);
        Flow::Advance
    })
}

/// Rewind the block to its first action
pub fn restart_block() -> Function {
    Function::new(|block| {
        block.set_index(0);
        Flow::Advance
    })
}

/// Finish the block
pub fn finish() -> Function {
    Function::new(|_| Flow::Finish)
}

fn collect_ids<I>(ids: I) -> Vec<Id>
where
    I: IntoIterator,
    I::Item: Into<Id>,
{
    ids.into_iter().map(Into::into).collect()
}

/// Activate other blocks; no ids activates every block
pub fn activate_blocks<I>(ids: I) -> Function
where
    I: IntoIterator,
    I::Item: Into<Id>,
{
    let ids = collect_ids(ids);
    Function::new(move |block| {
        block.routine().activate(ids.iter());
        Flow::Advance
    })
}

/// Pause blocks; no ids pauses every block
pub fn pause_blocks<I>(ids: I) -> Function
where
    I: IntoIterator,
    I::Item: Into<Id>,
{
    let ids = collect_ids(ids);
    Function::new(move |block| {
        block.routine().pause(ids.iter());
        Flow::Advance
    })
}

/// Stop blocks; no ids stops every block
pub fn stop_blocks<I>(ids: I) -> Function
where
    I: IntoIterator,
    I::Item: Into<Id>,
{
    let ids = collect_ids(ids);
    Function::new(move |block| {
        block.routine().stop(ids.iter());
        Flow::Advance
    })
}

/// Stop and then activate blocks; no ids switches every block
pub fn switch_blocks<I>(ids: I) -> Function
where
    I: IntoIterator,
    I::Item: Into<Id>,
{
    let ids = collect_ids(ids);
    Function::new(move |block| {
        block.routine().switch_to(ids.iter());
        Flow::Advance
    })
}

/// Store a routine property
pub fn set_property(key: impl Into<String>, value: impl Into<Value>) -> Function {
    let key = key.into();
    let value = value.into();
    Function::new(move |block| {
        block.properties_mut().set(key.clone(), value.clone());
        Flow::Advance
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Label, WaitTicks};
    use crate::actions;
    use crate::routine::Routine;
    use cadence_core::ManualClock;

    #[test]
    fn test_jump_to_label() {
        let mut routine = Routine::with_clock(ManualClock::new());
        routine
            .define(
                "j",
                actions![WaitTicks::new(10), Label::new("end"), jump_to("end")],
            )
            .unwrap()
            .set_index(2);
        routine.activate(["j"]);

        routine.tick();
        assert_eq!(routine.block("j").unwrap().index(), 1);
    }

    #[test]
    fn test_unknown_label_advances() {
        let mut routine = Routine::with_clock(ManualClock::new());
        routine
            .define("j", actions![jump_to("nowhere"), WaitTicks::new(10)])
            .unwrap()
            .activate();

        routine.tick();
        assert_eq!(routine.block("j").unwrap().index(), 1);
    }

    #[test]
    fn test_finish_deactivates_and_rewinds() {
        let mut routine = Routine::with_clock(ManualClock::new());
        routine
            .define("f", actions![Label::new(0), finish(), WaitTicks::new(3)])
            .unwrap()
            .activate();

        routine.tick();
        let summary = routine.tick();
        assert_eq!(summary.deactivated, vec![Id::from("f")]);
        assert_eq!(routine.block("f").unwrap().index(), 0);
    }

    #[test]
    fn test_activate_takes_effect_next_tick() {
        let mut routine = Routine::with_clock(ManualClock::new());
        routine
            .define("a", actions![activate_blocks(["b"]), WaitTicks::new(10)])
            .unwrap()
            .activate();
        routine.define("b", actions![WaitTicks::new(10)]).unwrap();

        let first = routine.tick();
        assert_eq!(first.stepped, 1);
        assert!(routine.is_active(["b"]));

        let second = routine.tick();
        assert_eq!(second.stepped, 2);
    }

    #[test]
    fn test_set_property() {
        let mut routine = Routine::with_clock(ManualClock::new());
        routine
            .define("p", actions![set_property("score", 42)])
            .unwrap()
            .activate();

        routine.tick();
        assert_eq!(routine.properties().get_as::<i64>("score"), Some(42));
    }

    #[test]
    fn test_switch_blocks_rewinds() {
        let mut routine = Routine::with_clock(ManualClock::new());
        routine
            .define("w", actions![Label::new(0), WaitTicks::new(10)])
            .unwrap()
            .activate();
        routine
            .define("s", actions![WaitTicks::new(1), switch_blocks(["w"])])
            .unwrap()
            .activate();

        routine.tick();
        routine.tick();
        assert_eq!(routine.block("w").unwrap().index(), 1);

        routine.tick();
        assert_eq!(routine.block("w").unwrap().index(), 0);
        assert!(routine.is_active(["w"]));
    }
}
