//! Declarative per-field lookup tables
//!
//! Each entity kind describes where its fields live as a static
//! [`FieldTable`]. A [`FieldReader`] walks the table against one document
//! (or one row of it), hands back every field as an `Option`, and remembers
//! which fields came back empty so the caller can report a partial record.

use crate::extract::models::EntityKind;
use crate::extract::Extraction;
use scraper::{ElementRef, Selector};

/// How a field's raw value is pulled out of the elements a selector matches
#[derive(Debug, Clone, Copy)]
pub enum Locate {
    /// Text of the first match
    Text,
    /// Text of the n-th match in document order
    NthText(usize),
    /// Attribute of the first match that carries it
    Attr(&'static str),
    /// Text of every match
    AllText,
    /// Text of the first sibling with class `value_class` following the
    /// matched element whose own text equals `label`
    Labelled {
        label: &'static str,
        value_class: &'static str,
    },
}

/// Where one field lives
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub selector: &'static str,
    pub locate: Locate,
}

/// All field rules for one entity kind
#[derive(Debug)]
pub struct FieldTable {
    pub kind: EntityKind,
    pub rules: &'static [FieldRule],
}

impl FieldTable {
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Starts reading fields beneath `scope`
    pub fn reader<'a>(&'static self, scope: ElementRef<'a>) -> FieldReader<'a> {
        FieldReader {
            table: self,
            scope,
            missing: Vec::new(),
        }
    }
}

/// Reads fields from one scope, tracking the ones that could not be found
pub struct FieldReader<'a> {
    table: &'static FieldTable,
    scope: ElementRef<'a>,
    missing: Vec<&'static str>,
}

impl<'a> FieldReader<'a> {
    /// Raw single value of a field
    pub fn text(&mut self, name: &'static str) -> Option<String> {
        let value = self.lookup(name).into_iter().next();
        if value.is_none() {
            self.missing.push(name);
        }
        value
    }

    /// Single value converted by `parse`; a failed conversion counts as missing
    pub fn parse<T>(&mut self, name: &'static str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let value = self.lookup(name).into_iter().next().and_then(|raw| parse(&raw));
        if value.is_none() {
            tracing::debug!("{} field '{}' not found or unparsable", self.table.kind, name);
            self.missing.push(name);
        }
        value
    }

    /// Every value of a multi-valued field; empty counts as missing
    pub fn all(&mut self, name: &'static str) -> Vec<String> {
        let values = self.lookup(name);
        if values.is_empty() {
            self.missing.push(name);
        }
        values
    }

    /// Wraps the assembled record in the outcome matching what was found
    pub fn finish<T>(self, record: T) -> Extraction<T> {
        if self.missing.is_empty() {
            Extraction::Complete(record)
        } else {
            Extraction::Partial {
                record,
                missing: self.missing,
            }
        }
    }

    fn lookup(&self, name: &str) -> Vec<String> {
        let Some(rule) = self.table.rule(name) else {
            tracing::warn!("No {} field rule named '{}'", self.table.kind, name);
            return Vec::new();
        };

        let selector = match Selector::parse(rule.selector) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::warn!("Bad selector for {} field '{}': {:?}", self.table.kind, name, e);
                return Vec::new();
            }
        };

        let mut matches = self.scope.select(&selector);

        match rule.locate {
            Locate::Text => matches.find_map(element_text).into_iter().collect(),
            Locate::NthText(n) => matches.nth(n).and_then(element_text).into_iter().collect(),
            Locate::Attr(attr) => matches
                .find_map(|el| attr_value(el, attr))
                .into_iter()
                .collect(),
            Locate::AllText => matches.filter_map(element_text).collect(),
            Locate::Labelled { label, value_class } => matches
                .filter(|el| element_text(*el).as_deref() == Some(label))
                .find_map(|el| labelled_value(el, value_class))
                .into_iter()
                .collect(),
        }
    }
}

/// Whitespace-collapsed text content; `None` when blank
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn attr_value(element: ElementRef<'_>, attr: &str) -> Option<String> {
    element
        .value()
        .attr(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn labelled_value(label: ElementRef<'_>, value_class: &str) -> Option<String> {
    label
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().classes().any(|c| c == value_class))
        .and_then(element_text)
}
