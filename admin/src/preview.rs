//! Evidence preview: at most one evidence link shown at a time.

/// The currently shown evidence link, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvidencePreview {
    shown: Option<String>,
}

impl EvidencePreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide `link` if it is shown, otherwise show it in place of whatever was shown.
    pub fn toggle(&mut self, link: &str) {
        if self.shown.as_deref() == Some(link) {
            self.shown = None;
        } else {
            self.shown = Some(link.to_string());
        }
    }

    pub fn shown(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    pub fn is_shown(&self, link: &str) -> bool {
        self.shown.as_deref() == Some(link)
    }
}
