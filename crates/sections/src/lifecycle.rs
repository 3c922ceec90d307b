use std::cell::Cell;

/// Per-handle lifecycle.
///
/// ```text
/// Unmounted -> Mounting -> MountedDegraded | MountedStatic | MountedAnimated
///           -> Unmounting -> Unmounted
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SectionState {
    Unmounted,
    Mounting,
    /// Capability token missing (or the surface failed); fallback notice shown.
    MountedDegraded,
    /// Reduced motion (or scroll coupling unavailable); static variant shown.
    MountedStatic,
    /// Full scroll-coupled animation.
    MountedAnimated,
    Unmounting,
}

impl SectionState {
    pub fn is_mounted(self) -> bool {
        matches!(
            self,
            SectionState::MountedDegraded
                | SectionState::MountedStatic
                | SectionState::MountedAnimated
        )
    }
}

/// Which branch of the mount decision tree applies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MountPlan {
    Degraded,
    Static,
    Animated,
}

impl MountPlan {
    /// Missing token wins over everything, then reduced motion.
    pub fn decide(has_token: bool, reduced_motion: bool) -> Self {
        match (has_token, reduced_motion) {
            (false, _) => MountPlan::Degraded,
            (true, true) => MountPlan::Static,
            (true, false) => MountPlan::Animated,
        }
    }

    pub fn mounted_state(self) -> SectionState {
        match self {
            MountPlan::Degraded => SectionState::MountedDegraded,
            MountPlan::Static => SectionState::MountedStatic,
            MountPlan::Animated => SectionState::MountedAnimated,
        }
    }
}

/// Identifies one mount attempt. Unmounting invalidates every outstanding
/// session, so a mount resuming after an await can tell it was cancelled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MountSession(u64);

#[derive(Debug)]
pub struct Lifecycle {
    state: Cell<SectionState>,
    session: Cell<u64>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: Cell::new(SectionState::Unmounted),
            session: Cell::new(0),
        }
    }

    pub fn state(&self) -> SectionState {
        self.state.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.state.get().is_mounted()
    }

    /// `Unmounted -> Mounting`. `None` when a mount would be a no-op.
    pub fn begin_mount(&self) -> Option<MountSession> {
        if self.state.get() != SectionState::Unmounted {
            return None;
        }
        self.state.set(SectionState::Mounting);
        Some(MountSession(self.session.get()))
    }

    pub fn is_current(&self, session: MountSession) -> bool {
        self.state.get() == SectionState::Mounting && self.session.get() == session.0
    }

    /// `Mounting -> Mounted*`. Returns `false` if the session was cancelled.
    pub fn finish_mount(&self, session: MountSession, plan: MountPlan) -> bool {
        if !self.is_current(session) {
            return false;
        }
        self.state.set(plan.mounted_state());
        true
    }

    /// `Mounting -> Unmounted` after a failed mount.
    pub fn abort_mount(&self, session: MountSession) {
        if self.is_current(session) {
            self.state.set(SectionState::Unmounted);
        }
    }

    /// `Mounting | Mounted* -> Unmounting`. Returns `false` when there is
    /// nothing to tear down.
    pub fn begin_unmount(&self) -> bool {
        match self.state.get() {
            SectionState::Unmounted | SectionState::Unmounting => false,
            _ => {
                self.session.set(self.session.get().wrapping_add(1));
                self.state.set(SectionState::Unmounting);
                true
            }
        }
    }

    pub fn finish_unmount(&self) {
        self.state.set(SectionState::Unmounted);
    }
}
