//! Column descriptors.

use std::fmt;
use std::sync::Arc;

use rbac_model::{BadgeColor, DateFormat, Record, display_value, format_date, resolve_path};
use serde_json::Value;

type RenderFn = Arc<dyn Fn(&Record) -> String + Send + Sync>;
type BadgeFn = Arc<dyn Fn(&Record) -> BadgeColor + Send + Sync>;

/// How a column's cells are presented.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    #[default]
    Text,
    Badge,
    Custom,
    Checkbox,
}

/// Horizontal alignment hint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Static description of one table column.
///
/// Sortable and searchable default to `true`.
#[derive(Clone)]
pub struct ColumnDescriptor {
    /// Dot path into the record.
    pub key: String,
    /// Header text.
    pub label: String,
    pub sortable: bool,
    pub searchable: bool,
    pub kind: ColumnKind,
    pub width: Option<String>,
    pub align: Align,
    render: Option<RenderFn>,
    badge_color: Option<BadgeFn>,
    date_format: Option<DateFormat>,
}

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            sortable: true,
            searchable: true,
            kind: ColumnKind::Text,
            width: None,
            align: Align::Left,
            render: None,
            badge_color: None,
            date_format: None,
        }
    }

    #[must_use]
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    #[must_use]
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Compute the cell text with a function instead of a path lookup.
    ///
    /// The rendered text is also what search and sort see.
    #[must_use]
    pub fn render(mut self, render: impl Fn(&Record) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Show the cell value as a date in `format`.
    ///
    /// Sorting still compares the raw value, so ISO strings and epoch
    /// numbers order chronologically.
    #[must_use]
    pub fn date(mut self, format: DateFormat) -> Self {
        self.date_format = Some(format);
        self
    }

    /// Colour badge cells per record. Implies [`ColumnKind::Badge`].
    #[must_use]
    pub fn badge_color(
        mut self,
        badge: impl Fn(&Record) -> BadgeColor + Send + Sync + 'static,
    ) -> Self {
        self.badge_color = Some(Arc::new(badge));
        self.kind = ColumnKind::Badge;
        self
    }

    pub fn has_render(&self) -> bool {
        self.render.is_some()
    }

    /// Raw value behind a cell: the rendered string, else the path lookup.
    pub(crate) fn raw_value(&self, record: &Record) -> Option<Value> {
        match &self.render {
            Some(render) => Some(Value::String(render(record))),
            None => resolve_path(record, &self.key).cloned(),
        }
    }

    /// Text shown in the cell.
    pub fn cell_text(&self, record: &Record) -> String {
        match (&self.render, self.date_format) {
            (Some(render), _) => render(record),
            (None, Some(format)) => format_date(resolve_path(record, &self.key), format),
            (None, None) => display_value(resolve_path(record, &self.key)),
        }
    }

    /// Badge colour for the cell, [`BadgeColor::Info`] when unset.
    pub fn badge_color_for(&self, record: &Record) -> BadgeColor {
        self.badge_color
            .as_ref()
            .map(|badge| badge(record))
            .unwrap_or_default()
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("searchable", &self.searchable)
            .field("kind", &self.kind)
            .field("render", &self.render.is_some())
            .field("badge_color", &self.badge_color.is_some())
            .field("date_format", &self.date_format)
            .finish()
    }
}
