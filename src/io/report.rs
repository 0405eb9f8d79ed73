use serde::Serialize;

use crate::errors::Result;
use crate::filter::{FilterContext, Outcome};

/// Named sections of metric results under one filter context.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub context: FilterContext,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub body: SectionBody,
}

/// A section's content, already serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum SectionBody {
    Ready(serde_json::Value),
    Empty,
    Unavailable { table: String, reason: String },
}

impl Report {
    pub fn new(title: impl Into<String>, context: FilterContext) -> Self {
        Self {
            title: title.into(),
            context,
            sections: Vec::new(),
        }
    }

    /// Append a metric outcome under `heading`.
    pub fn push<R: Serialize>(
        &mut self,
        heading: impl Into<String>,
        outcome: &Outcome<R>,
    ) -> Result<&mut Self> {
        let body = match outcome {
            Outcome::Ready(value) => SectionBody::Ready(serde_json::to_value(value)?),
            Outcome::Empty => SectionBody::Empty,
            Outcome::Unavailable { table, reason } => SectionBody::Unavailable {
                table: table.to_string(),
                reason: reason.clone(),
            },
        };
        self.sections.push(Section {
            heading: heading.into(),
            body,
        });
        Ok(self)
    }

    /// Append an always-available value under `heading`.
    pub fn push_value<R: Serialize>(
        &mut self,
        heading: impl Into<String>,
        value: &R,
    ) -> Result<&mut Self> {
        self.push(heading, &Outcome::Ready(value))
    }

    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }
}
