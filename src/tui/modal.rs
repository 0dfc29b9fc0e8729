// Modal overlays
//
// Each modal handles its own keys and returns a ModalAction; the event loop
// acts on the action. App just holds Option<Modal>.

use crossterm::event::KeyCode;

/// Actions returned by modal input handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    /// Input consumed, no state change needed
    None,
    /// Close the modal
    Close,
    /// Start "select first N rows"
    SubmitBulkSelect(i64),
}

/// Numeric entry for the bulk-select overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCountInput {
    /// Raw digits typed so far
    pub value: String,
    /// Upper bound shown to the user and enforced on +/-
    pub max: Option<u64>,
    /// Set once submitted; the overlay stays up until the scan finishes
    pub pending: bool,
    /// Validation message from the last submit attempt
    pub error: Option<String>,
}

/// Longest accepted input, keeps the value inside i64
const MAX_DIGITS: usize = 9;

impl RowCountInput {
    pub fn new(max: Option<u64>) -> Self {
        Self {
            value: "1".to_string(),
            max,
            pending: false,
            error: None,
        }
    }

    pub fn parsed(&self) -> Option<i64> {
        self.value.parse().ok()
    }

    fn push_digit(&mut self, c: char) {
        if self.value == "0" {
            self.value.clear();
        }
        if self.value.len() < MAX_DIGITS {
            self.value.push(c);
        }
    }

    fn step(&mut self, delta: i64) {
        let current = self.parsed().unwrap_or(0);
        let mut next = (current + delta).max(1);
        if let Some(max) = self.max {
            next = next.min(max as i64);
        }
        self.value = next.to_string();
    }

    fn submit(&mut self) -> ModalAction {
        match self.parsed() {
            Some(n) if n >= 1 => {
                if let Some(max) = self.max {
                    if n as u64 > max {
                        self.error = Some(format!("At most {} rows", max));
                        return ModalAction::None;
                    }
                }
                self.error = None;
                self.pending = true;
                ModalAction::SubmitBulkSelect(n)
            }
            _ => {
                self.error = Some("Enter a number of rows (1 or more)".to_string());
                ModalAction::None
            }
        }
    }
}

/// Available modal types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    /// Keyboard shortcuts
    Help,
    /// "Select first N rows" overlay
    BulkSelect(RowCountInput),
}

impl Modal {
    pub fn help() -> Self {
        Modal::Help
    }

    pub fn bulk_select(max: Option<u64>) -> Self {
        Modal::BulkSelect(RowCountInput::new(max))
    }

    /// True while a submitted bulk select is still running
    pub fn is_pending(&self) -> bool {
        matches!(self, Modal::BulkSelect(input) if input.pending)
    }

    /// Handle keyboard input, return action for caller to execute
    pub fn handle_input(&mut self, key: KeyCode) -> ModalAction {
        match self {
            Modal::Help => match key {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => ModalAction::Close,
                _ => ModalAction::None,
            },
            Modal::BulkSelect(input) => {
                if key == KeyCode::Esc {
                    return ModalAction::Close;
                }
                if input.pending {
                    return ModalAction::None;
                }
                match key {
                    KeyCode::Enter => input.submit(),
                    KeyCode::Char(c) if c.is_ascii_digit() => {
                        input.push_digit(c);
                        input.error = None;
                        ModalAction::None
                    }
                    KeyCode::Backspace => {
                        input.value.pop();
                        ModalAction::None
                    }
                    KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('k') => {
                        input.step(1);
                        ModalAction::None
                    }
                    KeyCode::Down | KeyCode::Char('-') | KeyCode::Char('j') => {
                        input.step(-1);
                        ModalAction::None
                    }
                    _ => ModalAction::None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(modal: &mut Modal, keys: &[KeyCode]) -> ModalAction {
        let mut last = ModalAction::None;
        for key in keys {
            last = modal.handle_input(*key);
        }
        last
    }

    #[test]
    fn test_typing_and_submit() {
        let mut modal = Modal::bulk_select(Some(100));
        let action = type_keys(
            &mut modal,
            &[
                KeyCode::Backspace,
                KeyCode::Char('1'),
                KeyCode::Char('5'),
                KeyCode::Enter,
            ],
        );

        assert_eq!(action, ModalAction::SubmitBulkSelect(15));
        assert!(modal.is_pending());
    }

    #[test]
    fn test_pending_overlay_ignores_input_but_closes() {
        let mut modal = Modal::bulk_select(None);
        modal.handle_input(KeyCode::Enter);

        assert_eq!(modal.handle_input(KeyCode::Enter), ModalAction::None);
        assert_eq!(modal.handle_input(KeyCode::Esc), ModalAction::Close);
    }

    #[test]
    fn test_empty_input_is_not_submitted() {
        let mut modal = Modal::bulk_select(None);
        let action = type_keys(&mut modal, &[KeyCode::Backspace, KeyCode::Enter]);

        assert_eq!(action, ModalAction::None);
        assert!(!modal.is_pending());
        match &modal {
            Modal::BulkSelect(input) => assert!(input.error.is_some()),
            other => panic!("unexpected modal {:?}", other),
        }
    }

    #[test]
    fn test_over_limit_is_not_submitted() {
        let mut modal = Modal::bulk_select(Some(100));
        let action = type_keys(
            &mut modal,
            &[
                KeyCode::Char('5'),
                KeyCode::Char('0'),
                KeyCode::Char('0'),
                KeyCode::Enter,
            ],
        );
        // "1" + "500" = 1500
        assert_eq!(action, ModalAction::None);
    }

    #[test]
    fn test_step_clamps_to_bounds() {
        let mut modal = Modal::bulk_select(Some(3));
        type_keys(
            &mut modal,
            &[KeyCode::Down, KeyCode::Down, KeyCode::Up, KeyCode::Up, KeyCode::Up, KeyCode::Up],
        );
        match &modal {
            Modal::BulkSelect(input) => assert_eq!(input.parsed(), Some(3)),
            other => panic!("unexpected modal {:?}", other),
        }
    }

    #[test]
    fn test_help_closes() {
        let mut modal = Modal::help();
        assert_eq!(modal.handle_input(KeyCode::Char('x')), ModalAction::None);
        assert_eq!(modal.handle_input(KeyCode::Char('?')), ModalAction::Close);
    }
}
