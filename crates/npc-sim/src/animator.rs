//! Animation state: the clip playing now, the clip asked for, and the blend
//! between them.

use rustc_hash::FxHashSet;

use npc_core::AnimId;

/// Well-known clip ids.  Applications with a larger clip table start their
/// own ids at [`clip::FIRST_CUSTOM`].
pub mod clip {
    use npc_core::AnimId;

    pub const IDLE:  AnimId = AnimId(0);
    pub const WALK:  AnimId = AnimId(1);
    pub const TURN:  AnimId = AnimId(2);
    pub const REACH: AnimId = AnimId(3);
    pub const WAVE:  AnimId = AnimId(4);
    pub const TALK:  AnimId = AnimId(5);
    pub const DRINK: AnimId = AnimId(6);

    pub const FIRST_CUSTOM: u16 = 32;
}

/// Ticks a change of target takes to show up as the current clip.
pub const DEFAULT_BLEND_TICKS: u32 = 4;

/// Tracks current and target animation.  [`step`](Self::step) is called once
/// per late-update and reports the `(old, new)` pair when a blend completes.
#[derive(Debug, Clone)]
pub struct Animator {
    current:     AnimId,
    target:      AnimId,
    idle:        FxHashSet<AnimId>,
    blend_ticks: u32,
    remaining:   u32,
}

impl Animator {
    /// Start in `initial` with [`clip::IDLE`] as the only idle clip.
    pub fn new(initial: AnimId) -> Self {
        let mut idle = FxHashSet::default();
        idle.insert(clip::IDLE);
        Self { current: initial, target: initial, idle, blend_ticks: DEFAULT_BLEND_TICKS, remaining: 0 }
    }

    pub fn with_blend_ticks(mut self, ticks: u32) -> Self {
        self.blend_ticks = ticks;
        self
    }

    /// Mark more clips as idle fidgets.
    pub fn with_idle(mut self, clips: impl IntoIterator<Item = AnimId>) -> Self {
        self.idle.extend(clips);
        self
    }

    #[inline]
    pub fn current(&self) -> AnimId {
        self.current
    }

    #[inline]
    pub fn target(&self) -> AnimId {
        self.target
    }

    /// Is the clip on screen one of the idle set?
    pub fn is_idle(&self) -> bool {
        self.idle.contains(&self.current)
    }

    pub fn is_blending(&self) -> bool {
        self.current != self.target
    }

    /// Ask for `anim`.  Re-asking for the pending target does not restart
    /// the blend; asking for the current clip cancels it.
    pub fn set_target(&mut self, anim: AnimId) {
        if anim == self.target {
            return;
        }
        self.target = anim;
        self.remaining = if anim == self.current { 0 } else { self.blend_ticks };
    }

    /// Advance the blend by one tick.
    pub fn step(&mut self) -> Option<(AnimId, AnimId)> {
        if self.current == self.target {
            return None;
        }
        if self.remaining > 1 {
            self.remaining -= 1;
            return None;
        }
        self.remaining = 0;
        let old = self.current;
        self.current = self.target;
        Some((old, self.current))
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(clip::IDLE)
    }
}
