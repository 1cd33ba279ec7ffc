// Keycap Event Matcher
// Per-event policy: pass the event through, swallow it, or dispatch a record

use crate::input::RawKeyEvent;
use crate::record::RecordId;
use crate::state::ToggleStore;
use crate::transform::index::DispatchIndex;
use crate::{Action, ModifierFlags};

/// What to do with one hooked key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Not ours, deliver unchanged
    PassThrough,
    /// Ours, suppress without running anything
    Swallow,
    /// Ours, suppress and run the record's outputs
    Dispatch(RecordId),
}

impl MatchOutcome {
    /// Whether the original event must be withheld
    pub fn suppresses(self) -> bool {
        !matches!(self, MatchOutcome::PassThrough)
    }
}

/// Matcher switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Run the record again on every auto-repeat of a held trigger.
    /// When off, repeats are swallowed without synthesis.
    pub dispatch_on_repeat: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            dispatch_on_repeat: true,
        }
    }
}

/// Decide what happens to `event` given the live `modifiers`.
///
/// Touches only the index (read-only) and the physical-key history in
/// `toggles`, so it is safe to call from the hook thread while synthesis
/// jobs run.
pub fn match_event(
    index: &DispatchIndex,
    toggles: &ToggleStore,
    event: &RawKeyEvent,
    modifiers: ModifierFlags,
    options: MatchOptions,
) -> MatchOutcome {
    if event.injected {
        return MatchOutcome::PassThrough;
    }

    let found = index.find(event.key, modifiers);

    let outcome = match event.action {
        Action::Release => {
            let was_down = toggles.mark_physical(event.key, false);
            if found.is_some() || was_down {
                MatchOutcome::Swallow
            } else {
                MatchOutcome::PassThrough
            }
        }
        Action::Press | Action::Repeat => match found {
            None => MatchOutcome::PassThrough,
            Some(record) => {
                let was_down = toggles.mark_physical(event.key, true);
                let repeat = event.action.is_repeat() || was_down;
                if repeat && !options.dispatch_on_repeat {
                    MatchOutcome::Swallow
                } else {
                    MatchOutcome::Dispatch(record)
                }
            }
        },
    };

    log::trace!("{} with {} -> {:?}", event, modifiers, outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{decode, encode_record};
    use crate::record::{OutputAction, TriggerChord};
    use crate::VirtualKey;

    const A: VirtualKey = VirtualKey(0x41);
    const B: VirtualKey = VirtualKey(0x42);

    fn setup(chords: &[(VirtualKey, ModifierFlags)]) -> (DispatchIndex, ToggleStore) {
        let mut bytes = Vec::new();
        for &(key, modifiers) in chords {
            encode_record(
                &mut bytes,
                TriggerChord::new(key, modifiers),
                &[OutputAction::Nothing],
            );
        }
        let set = decode(bytes).unwrap();
        (DispatchIndex::build(&set), ToggleStore::new(set.len()))
    }

    fn run(
        index: &DispatchIndex,
        toggles: &ToggleStore,
        event: RawKeyEvent,
        modifiers: ModifierFlags,
    ) -> MatchOutcome {
        match_event(index, toggles, &event, modifiers, MatchOptions::default())
    }

    #[test]
    fn test_unconfigured_key_passes_both_edges() {
        let (index, toggles) = setup(&[(A, ModifierFlags::empty())]);
        let none = ModifierFlags::empty();
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(B, Action::Press), none),
            MatchOutcome::PassThrough
        );
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(B, Action::Release), none),
            MatchOutcome::PassThrough
        );
    }

    #[test]
    fn test_configured_key_dispatches_then_swallows_up() {
        let (index, toggles) = setup(&[(A, ModifierFlags::empty())]);
        let none = ModifierFlags::empty();
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(A, Action::Press), none),
            MatchOutcome::Dispatch(RecordId(0))
        );
        assert!(toggles.physical_down(A));
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(A, Action::Release), none),
            MatchOutcome::Swallow
        );
        assert!(!toggles.physical_down(A));
    }

    #[test]
    fn test_modifier_disambiguation() {
        let (index, toggles) = setup(&[
            (A, ModifierFlags::ALT),
            (A, ModifierFlags::empty()),
        ]);
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(A, Action::Press), ModifierFlags::ALT),
            MatchOutcome::Dispatch(RecordId(0))
        );
        toggles.mark_physical(A, false);
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(A, Action::Press), ModifierFlags::empty()),
            MatchOutcome::Dispatch(RecordId(1))
        );
        toggles.mark_physical(A, false);
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(A, Action::Press), ModifierFlags::SHIFT),
            MatchOutcome::PassThrough
        );
    }

    #[test]
    fn test_injected_events_pass() {
        let (index, toggles) = setup(&[(A, ModifierFlags::empty())]);
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::injected(A, Action::Press), ModifierFlags::empty()),
            MatchOutcome::PassThrough
        );
        assert!(!toggles.physical_down(A));
    }

    #[test]
    fn test_repeat_dispatches_by_default() {
        let (index, toggles) = setup(&[(A, ModifierFlags::empty())]);
        for action in [Action::Press, Action::Repeat, Action::Repeat, Action::Press] {
            assert_eq!(
                run(&index, &toggles, RawKeyEvent::physical(A, action), ModifierFlags::empty()),
                MatchOutcome::Dispatch(RecordId(0))
            );
        }
        // The up after a run of repeats is still swallowed
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(A, Action::Release), ModifierFlags::empty()),
            MatchOutcome::Swallow
        );
    }

    #[test]
    fn test_repeat_swallowed_when_disabled() {
        let (index, toggles) = setup(&[(A, ModifierFlags::empty())]);
        let options = MatchOptions {
            dispatch_on_repeat: false,
        };
        let outcome = |action| {
            match_event(
                &index,
                &toggles,
                &RawKeyEvent::physical(A, action),
                ModifierFlags::empty(),
                options,
            )
        };
        assert_eq!(outcome(Action::Press), MatchOutcome::Dispatch(RecordId(0)));
        assert_eq!(outcome(Action::Repeat), MatchOutcome::Swallow);
        // A second press without an intervening release is a repeat too
        assert_eq!(outcome(Action::Press), MatchOutcome::Swallow);
    }

    #[test]
    fn test_up_swallowed_after_modifier_released_first() {
        let (index, toggles) = setup(&[(A, ModifierFlags::CONTROL)]);
        assert!(matches!(
            run(&index, &toggles, RawKeyEvent::physical(A, Action::Press), ModifierFlags::CONTROL),
            MatchOutcome::Dispatch(_)
        ));
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(A, Action::Release), ModifierFlags::empty()),
            MatchOutcome::Swallow
        );
        // Once cleared, a bare up passes
        assert_eq!(
            run(&index, &toggles, RawKeyEvent::physical(A, Action::Release), ModifierFlags::empty()),
            MatchOutcome::PassThrough
        );
    }

    #[test]
    fn test_suppresses() {
        assert!(!MatchOutcome::PassThrough.suppresses());
        assert!(MatchOutcome::Swallow.suppresses());
        assert!(MatchOutcome::Dispatch(RecordId(3)).suppresses());
    }
}
