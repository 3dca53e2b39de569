//! The fallback unit every character can always return to.

use tracing::trace;

use crate::{BehaviorUnit, UnitCx, UnitKind};

/// A unit that does nothing, permits everything, and cannot fail.
///
/// On activation it discards whatever roots the previous unit left queued so
/// an idle character really is idle.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleUnit;

impl<K: UnitKind, C> BehaviorUnit<K, C> for IdleUnit {
    fn on_activate(&mut self, cx: &mut UnitCx<'_, K, C>) {
        if !cx.scheduler().is_idle() {
            trace!(unit = ?cx.me(), "idle: clearing leftover roots");
            cx.clear_scheduler();
        }
    }
}
