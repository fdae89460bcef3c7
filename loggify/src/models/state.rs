/// Capture session state machine.
///
/// ```text
/// idle → active → idle
/// ```
///
/// A session is single-use in practice. Entering again after exit works;
/// the guard's mutable borrow rules out a second `enter` while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Active,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}
