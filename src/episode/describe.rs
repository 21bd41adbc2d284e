const PROLOGUE: &str = "Prologue";

/// One act of an episode: its composed label line and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActSegment {
    pub label: String,
    pub body: String,
}

impl ActSegment {
    /// Build a segment from the raw act fragments; `None` if nothing is left
    pub fn from_parts(label: Option<&str>, title: Option<&str>, body: Option<&str>) -> Option<Self> {
        let label = compose_label(label, title).unwrap_or_default();
        let body = body.map(str::trim).unwrap_or_default().to_string();

        if label.is_empty() && body.is_empty() {
            return None;
        }

        Some(Self { label, body })
    }

    fn block(&self) -> String {
        match (self.label.is_empty(), self.body.is_empty()) {
            (false, false) => format!("{}\n{}", self.label, self.body),
            (false, true) => self.label.clone(),
            _ => self.body.clone(),
        }
    }
}

/// Combine an act label and act title into the line shown above the act body
///
/// A "Prologue" label never repeats itself: `("Prologue", "Prologue")`
/// yields `"Prologue"`.
pub fn compose_label(label: Option<&str>, title: Option<&str>) -> Option<String> {
    let label = label.map(str::trim).filter(|s| !s.is_empty());
    let title = title.map(str::trim).filter(|s| !s.is_empty());

    match (label, title) {
        (Some(label), title) if label.eq_ignore_ascii_case(PROLOGUE) => match title {
            Some(title) if !title.eq_ignore_ascii_case(PROLOGUE) => {
                Some(format!("{PROLOGUE}: {title}"))
            }
            _ => Some(PROLOGUE.to_string()),
        },
        (Some(label), Some(title)) => Some(format!("{label}: {title}")),
        (Some(label), None) => Some(label.to_string()),
        (None, Some(title)) => Some(title.to_string()),
        (None, None) => None,
    }
}

/// Join the summary and act blocks into the item description
pub fn assemble_description(summary: Option<&str>, acts: &[ActSegment]) -> String {
    summary
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .into_iter()
        .chain(acts.iter().map(ActSegment::block))
        .collect::<Vec<_>>()
        .join("\n\n")
}
