//! Unit tests for npc-dispatch.

use npc_core::{Frame, Point, Tick};
use npc_sched::{Settlement, Status};
use strum::{EnumCount, EnumIter};

use crate::{BehaviorUnit, Dispatcher, Gesture, IdleUnit, Permission, UnitCx};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount)]
enum Mode {
    Idle,
    Fetch,
    Walk,
    Greet,
}

/// Character state for dispatcher tests: every hook appends
/// `"<Unit>:<hook>"` here.
type Trace = Vec<String>;

/// A unit whose reactions are switched on per test.
#[derive(Default)]
struct Scripted {
    name:             String,
    poll_on_activate: bool,
    regain:           bool,
    refuse:           Vec<Permission>,
    handles:          Option<&'static str>,
    /// Queue a root with this fixed result on activation.
    root:             Option<Status>,
    after_settled:    Option<(Mode, Option<bool>)>,
    after_update:     Option<(Mode, Option<bool>)>,
    nest_on_activate: bool,
    try_nest:         bool,
}

impl Scripted {
    fn note(&self, cx: &mut UnitCx<'_, Mode, Trace>, what: &str) {
        cx.ctx.push(format!("{}:{what}", self.name));
    }
}

impl BehaviorUnit<Mode, Trace> for Scripted {
    fn on_activate(&mut self, cx: &mut UnitCx<'_, Mode, Trace>) {
        self.note(cx, "activate");
        if self.poll_on_activate {
            cx.poll_next_outcome();
        }
        if let Some(result) = self.root {
            let name = self.name.to_lowercase();
            let root = cx.scheduler_mut().tree_mut().spawn_fn(name, move |_| result);
            cx.set_autonomy(root);
        }
        if self.try_nest {
            let verdict = if cx.try_set_task(Mode::Greet, None).is_err() { "err" } else { "ok" };
            self.note(cx, &format!("nested={verdict}"));
        }
        if self.nest_on_activate {
            cx.set_task(Mode::Greet, None);
        }
    }

    fn on_deactivate(&mut self, cx: &mut UnitCx<'_, Mode, Trace>) {
        self.note(cx, "deactivate");
    }

    fn fixed_update(&mut self, cx: &mut UnitCx<'_, Mode, Trace>) {
        self.note(cx, "fixed");
    }

    fn update(&mut self, cx: &mut UnitCx<'_, Mode, Trace>) {
        self.note(cx, "update");
        if let Some((kind, outcome)) = self.after_update.take() {
            cx.set_task(kind, outcome);
        }
    }

    fn late_update(&mut self, cx: &mut UnitCx<'_, Mode, Trace>) {
        self.note(cx, "late");
    }

    fn on_settled(&mut self, settlement: &Settlement, cx: &mut UnitCx<'_, Mode, Trace>) {
        self.note(cx, &format!("settled({},{:?})", settlement.name, settlement.conclusion));
        if let Some((kind, outcome)) = self.after_settled {
            cx.set_task(kind, outcome);
        }
    }

    fn regain_control(&mut self, outcome: bool, cx: &mut UnitCx<'_, Mode, Trace>) -> bool {
        self.note(cx, &format!("regain({outcome})"));
        self.regain
    }

    fn permits(&self, permission: Permission) -> bool {
        !self.refuse.contains(&permission)
    }

    fn on_gesture(&mut self, gesture: &Gesture, cx: &mut UnitCx<'_, Mode, Trace>) -> bool {
        self.note(cx, &format!("gesture({})", gesture.label));
        self.handles.is_some_and(|label| gesture.is(label))
    }
}

/// A dispatcher of [`Scripted`] units, with `Idle` as the default.
fn dispatcher(mut tweak: impl FnMut(Mode, &mut Scripted)) -> Dispatcher<Mode, Trace> {
    Dispatcher::new(Mode::Idle, |kind, _| {
        let mut unit = Scripted { name: format!("{kind:?}"), ..Scripted::default() };
        tweak(kind, &mut unit);
        Box::new(unit)
    })
}

fn started(tweak: impl FnMut(Mode, &mut Scripted)) -> (Dispatcher<Mode, Trace>, Trace) {
    let mut d = dispatcher(tweak);
    let mut trace = Trace::new();
    d.start(&mut trace);
    trace.clear();
    (d, trace)
}

fn frame(n: u64) -> Frame {
    Frame::new(Tick(n), 1.0 / 30.0)
}

fn wave() -> Gesture {
    Gesture::new(None, "wave", Point::ORIGIN)
}

// ── Transitions ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod transition_tests {
    use super::*;

    #[test]
    fn start_activates_the_default_unit() {
        let mut d = dispatcher(|_, _| {});
        let mut trace = Trace::new();
        assert_eq!(d.current(), None);
        d.start(&mut trace);
        assert_eq!(d.current(), Some(Mode::Idle));
        assert!(d.is_unit_active(Mode::Idle));
        assert_eq!(trace, ["Idle:activate"]);

        d.start(&mut trace);
        assert_eq!(trace.len(), 1, "second start is a no-op");
    }

    #[test]
    fn switching_to_the_current_unit_does_nothing() {
        let (mut d, mut trace) = started(|_, _| {});
        d.set_task(Mode::Idle, Some(true), &mut trace);
        assert!(trace.is_empty());
    }

    #[test]
    fn switch_deactivates_before_activating() {
        let (mut d, mut trace) = started(|_, _| {});
        d.set_task(Mode::Fetch, None, &mut trace);
        assert_eq!(trace, ["Idle:deactivate", "Fetch:activate"]);
        assert_eq!(d.current(), Some(Mode::Fetch));
        assert!(!d.is_unit_active(Mode::Idle));
    }

    #[test]
    fn listener_regains_control_on_outcome() {
        let (mut d, mut trace) = started(|kind, u| {
            if kind == Mode::Fetch {
                u.poll_on_activate = true;
                u.regain = true;
            }
        });
        d.set_task(Mode::Fetch, None, &mut trace);
        assert_eq!(d.listener(), Some(Mode::Fetch));

        // No outcome: the listener keeps waiting.
        d.set_task(Mode::Walk, None, &mut trace);
        assert_eq!(d.current(), Some(Mode::Walk));
        assert_eq!(d.listener(), Some(Mode::Fetch));
        trace.clear();

        d.set_task(Mode::Idle, Some(true), &mut trace);
        assert_eq!(trace, ["Fetch:regain(true)", "Walk:deactivate", "Fetch:activate"]);
        assert_eq!(d.current(), Some(Mode::Fetch));
    }

    #[test]
    fn declining_listener_lets_the_request_through_and_stops_polling() {
        let (mut d, mut trace) = started(|kind, u| {
            if kind == Mode::Fetch {
                u.poll_on_activate = true;
            }
        });
        d.set_task(Mode::Fetch, None, &mut trace);
        d.set_task(Mode::Walk, None, &mut trace);
        trace.clear();

        d.set_task(Mode::Greet, Some(false), &mut trace);
        assert_eq!(trace, ["Fetch:regain(false)", "Walk:deactivate", "Greet:activate"]);
        assert_eq!(d.listener(), None);

        trace.clear();
        d.set_task(Mode::Walk, Some(true), &mut trace);
        assert!(!trace.iter().any(|e| e.contains("regain")));
    }

    #[test]
    fn regaining_listener_that_is_already_current_stays_put() {
        let (mut d, mut trace) = started(|kind, u| {
            if kind == Mode::Fetch {
                u.poll_on_activate = true;
                u.regain = true;
            }
        });
        d.set_task(Mode::Fetch, None, &mut trace);
        trace.clear();
        d.set_task(Mode::Walk, Some(true), &mut trace);
        assert_eq!(trace, ["Fetch:regain(true)"]);
        assert_eq!(d.current(), Some(Mode::Fetch));
    }

    #[test]
    #[should_panic(expected = "while switching")]
    fn set_task_inside_activation_panics() {
        let (mut d, mut trace) = started(|kind, u| {
            if kind == Mode::Walk {
                u.nest_on_activate = true;
            }
        });
        d.set_task(Mode::Walk, None, &mut trace);
    }

    #[test]
    fn try_set_task_inside_activation_reports_reentry() {
        let (mut d, mut trace) = started(|kind, u| {
            if kind == Mode::Walk {
                u.try_nest = true;
            }
        });
        d.set_task(Mode::Walk, None, &mut trace);
        assert_eq!(trace, ["Idle:deactivate", "Walk:activate", "Walk:nested=err"]);
        assert_eq!(d.current(), Some(Mode::Walk));
    }

    #[test]
    fn request_from_update_applies_after_the_hook() {
        let (mut d, mut trace) = started(|kind, u| {
            if kind == Mode::Walk {
                u.after_update = Some((Mode::Greet, None));
            }
        });
        d.set_task(Mode::Walk, None, &mut trace);
        trace.clear();
        d.update(&mut trace, frame(1));
        assert_eq!(trace, ["Walk:update", "Walk:deactivate", "Greet:activate"]);
        assert_eq!(d.current(), Some(Mode::Greet));
    }

    #[test]
    fn idle_unit_clears_leftover_roots() {
        let mut d: Dispatcher<Mode, Trace> = Dispatcher::new(Mode::Idle, |kind, _| match kind {
            Mode::Idle => Box::new(IdleUnit),
            other => Box::new(Scripted {
                name: format!("{other:?}"),
                root: Some(Status::Running),
                ..Scripted::default()
            }),
        });
        let mut trace = Trace::new();
        d.start(&mut trace);
        d.set_task(Mode::Fetch, None, &mut trace);
        assert!(!d.scheduler().is_idle());

        d.set_task(Mode::Idle, None, &mut trace);
        assert!(d.scheduler().is_idle());
    }
}

// ── Permissions and gestures ──────────────────────────────────────────────────

#[cfg(test)]
mod gate_tests {
    use super::*;

    #[test]
    fn permission_follows_the_current_unit() {
        let mut d = dispatcher(|kind, u| {
            if kind == Mode::Greet {
                u.refuse = vec![Permission::Converse, Permission::RootRotation];
            }
        });
        let mut trace = Trace::new();
        assert!(d.request_permission(Permission::Converse), "no unit yet");

        d.start(&mut trace);
        assert!(d.request_permission(Permission::Converse));

        d.set_task(Mode::Greet, None, &mut trace);
        assert!(!d.request_permission(Permission::Converse));
        assert!(!d.request_permission(Permission::RootRotation));
        assert!(d.request_permission(Permission::LookAt));
    }

    #[test]
    fn permission_names_are_snake_case() {
        assert_eq!(Permission::RootRotation.to_string(), "root_rotation");
        assert_eq!(Permission::AnimationOverride.as_ref(), "animation_override");
    }

    #[test]
    fn unhandled_gesture_falls_back_in_reverse_registration_order() {
        let (mut d, mut trace) = started(|kind, u| {
            if matches!(kind, Mode::Fetch | Mode::Greet) {
                u.handles = Some("wave");
            }
        });
        d.set_task(Mode::Walk, None, &mut trace);
        trace.clear();

        assert!(d.gesture(&wave(), &mut trace));
        assert_eq!(trace, ["Walk:gesture(wave)", "Greet:gesture(wave)"]);
    }

    #[test]
    fn gesture_nobody_handles_visits_every_unit() {
        let (mut d, mut trace) = started(|_, _| {});
        d.set_task(Mode::Walk, None, &mut trace);
        trace.clear();

        assert!(!d.gesture(&wave(), &mut trace));
        assert_eq!(trace, [
            "Walk:gesture(wave)",
            "Greet:gesture(wave)",
            "Fetch:gesture(wave)",
            "Idle:gesture(wave)",
        ]);
    }

    #[test]
    fn gesture_on_default_unit_is_not_forwarded() {
        let (mut d, mut trace) = started(|kind, u| {
            if kind == Mode::Fetch {
                u.handles = Some("wave");
            }
        });
        assert!(!d.gesture(&wave(), &mut trace));
        assert_eq!(trace, ["Idle:gesture(wave)"]);
    }

    #[test]
    fn gesture_handled_by_current_unit_stops_there() {
        let (mut d, mut trace) = started(|kind, u| {
            if matches!(kind, Mode::Walk | Mode::Greet) {
                u.handles = Some("wave");
            }
        });
        d.set_task(Mode::Walk, None, &mut trace);
        trace.clear();
        assert!(d.gesture(&wave(), &mut trace));
        assert_eq!(trace, ["Walk:gesture(wave)"]);
    }
}

// ── Scheduler integration ─────────────────────────────────────────────────────

#[cfg(test)]
mod routing_tests {
    use super::*;

    #[test_log::test]
    fn settlement_is_forwarded_to_the_current_unit() {
        let (mut d, mut trace) = started(|kind, u| {
            if kind == Mode::Fetch {
                u.root = Some(Status::Success);
                u.after_settled = Some((Mode::Idle, Some(true)));
            }
        });
        d.set_task(Mode::Fetch, None, &mut trace);
        trace.clear();

        d.update(&mut trace, frame(1));
        assert_eq!(trace, [
            "Fetch:update",
            "Fetch:settled(fetch,Succeeded)",
            "Fetch:deactivate",
            "Idle:activate",
        ]);
        assert_eq!(d.current(), Some(Mode::Idle));
        assert!(d.scheduler().is_idle());
    }

    #[test]
    fn removal_during_a_switch_reaches_the_new_unit() {
        let (mut d, mut trace) = started(|kind, u| match kind {
            Mode::Fetch => u.root = Some(Status::Running),
            Mode::Walk => u.root = Some(Status::Running),
            _ => {}
        });
        d.set_task(Mode::Fetch, None, &mut trace);
        trace.clear();

        // Walk's set_autonomy discards Fetch's root.
        d.set_task(Mode::Walk, None, &mut trace);
        assert_eq!(trace, ["Fetch:deactivate", "Walk:activate", "Walk:settled(fetch,Removed)"]);
        assert_eq!(d.scheduler().queue().len(), 1);
    }

    #[test]
    fn phase_hooks_reach_only_the_current_unit() {
        let (mut d, mut trace) = started(|_, _| {});
        d.set_task(Mode::Fetch, None, &mut trace);
        trace.clear();

        d.fixed_update(&mut trace, frame(1));
        d.update(&mut trace, frame(1));
        d.late_update(&mut trace, frame(1));
        assert_eq!(trace, ["Fetch:fixed", "Fetch:update", "Fetch:late"]);
    }

    #[test]
    fn running_root_is_progressed_every_update() {
        let (mut d, mut trace) = started(|kind, u| {
            if kind == Mode::Fetch {
                u.root = Some(Status::Running);
            }
        });
        d.set_task(Mode::Fetch, None, &mut trace);
        for n in 1..=3 {
            d.update(&mut trace, frame(n));
        }
        let root = d.scheduler().front().expect("root stays queued");
        assert_eq!(d.scheduler().tree().status(root), Status::Running);
        assert_eq!(d.scheduler().in_progress(), Some(root));
    }
}
