/// The settings dialog's local draft of the identifier field
///
/// The draft is seeded from the current value each time the dialog opens.
/// Saving hands the draft back to the caller; cancelling drops it. Entered
/// names are not checked against the column list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsDialog {
    draft: String,
}

impl SettingsDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the draft to `current`
    pub fn seed(&mut self, current: &str) {
        self.draft = current.to_string();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replaces the draft with what the user typed
    pub fn edit(&mut self, value: impl Into<String>) {
        self.draft = value.into();
    }

    /// Commits the draft, leaving the dialog empty
    pub fn commit(&mut self) -> String {
        std::mem::take(&mut self.draft)
    }

    /// Throws the draft away
    pub fn discard(&mut self) {
        self.draft.clear();
    }
}
