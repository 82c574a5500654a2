//! Confirmation gate consulted before remote patches are applied.

/// Asks someone whether a patch set may be applied.
pub trait ConfirmationPrompt {
    /// Returns true to proceed.
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmationPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Prompt that always agrees.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmationPrompt for AlwaysConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Prompt that always refuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDecline;

impl ConfirmationPrompt for AlwaysDecline {
    fn confirm(&self, _message: &str) -> bool {
        false
    }
}
