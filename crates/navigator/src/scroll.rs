use serde::Serialize;

/// Measured top offset of a section heading, in document coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionOffset {
    pub id: String,
    pub top: f64,
}

impl SectionOffset {
    pub fn new(id: impl Into<String>, top: f64) -> Self {
        Self { id: id.into(), top }
    }
}

/// Tracks which section the reader is in.
#[derive(Debug, Clone)]
pub struct ScrollSpy {
    header_offset: f64,
    sections: Vec<SectionOffset>,
    active: Option<String>,
}

impl ScrollSpy {
    pub fn new(header_offset: f64) -> Self {
        Self {
            header_offset,
            sections: Vec::new(),
            active: None,
        }
    }

    /// Replace the tracked sections; clears the active section.
    pub fn reset(&mut self, mut sections: Vec<SectionOffset>) {
        sections.sort_by(|a, b| a.top.total_cmp(&b.top));
        self.sections = sections;
        self.active = None;
    }

    pub fn sections(&self) -> &[SectionOffset] {
        &self.sections
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Section that is active at `scroll_y`, without changing state.
    pub fn section_at(&self, scroll_y: f64) -> Option<&str> {
        let threshold = scroll_y + self.header_offset;
        self.sections
            .iter()
            .take_while(|section| section.top <= threshold)
            .last()
            .or_else(|| self.sections.first())
            .map(|section| section.id.as_str())
    }

    /// Feed a scroll position. Returns the new active id only when it changed.
    pub fn update(&mut self, scroll_y: f64) -> Option<String> {
        let next = self.section_at(scroll_y).map(str::to_string);
        if next == self.active {
            return None;
        }
        log::debug!("active section {:?} -> {:?}", self.active, next);
        self.active.clone_from(&next);
        next
    }
}
