//! Label catalog and label selection state
//!
//! Labels are read-only to the annotation engine: annotations carry a copy of
//! the label they were drawn with, and the editor only ever reads the selected
//! label and per-label visibility from [`LabelState`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Error parsing a `#RRGGBB` color string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color '{0}', expected #RRGGBB")]
pub struct ColorParseError(pub String);

/// Opaque RGB color, serialized as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value
    pub const fn from_hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    pub fn to_hex_string(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

impl std::str::FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorParseError(s.to_string()))?;
        let value = u32::from_str_radix(digits, 16).map_err(|_| ColorParseError(s.to_string()))?;
        Ok(Color::from_hex(value))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex_string()
    }
}

/// A semantic tag that can be attached to an annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Stable identifier, unique within the catalog
    pub id: String,
    pub name: String,
    pub color: Color,
    /// Single-character keyboard trigger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<char>,
}

impl Label {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: Color) -> Self {
        Self { id: id.into(), name: name.into(), color, shortcut: None }
    }

    pub fn with_shortcut(mut self, shortcut: char) -> Self {
        self.shortcut = Some(shortcut);
        self
    }
}

/// Named group of labels, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCategory {
    pub name: String,
    pub labels: Vec<Label>,
}

/// Ordered grouping of labels by category
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelCatalog {
    categories: Vec<LabelCategory>,
}

impl LabelCatalog {
    pub fn new(categories: Vec<LabelCategory>) -> Self {
        Self { categories }
    }

    /// Bank statement field catalog
    pub fn predefined() -> Self {
        fn category(name: &str, labels: &[(&str, &str, u32)]) -> LabelCategory {
            LabelCategory {
                name: name.to_string(),
                labels: labels
                    .iter()
                    .map(|(id, name, hex)| Label::new(*id, *name, Color::from_hex(*hex)))
                    .collect(),
            }
        }

        Self::new(vec![
            category(
                "Account Information",
                &[
                    ("account_name_title", "Account Name Title", 0xFF6B6B),
                    ("account_no_title", "Account No Title", 0x4ECDC4),
                    ("account_address_title", "Account Address Title", 0x45B7D1),
                    ("bank_name", "Bank Name", 0x96CEB4),
                    ("account_name", "Account Name", 0xFFEEAD),
                    ("account_no", "Account No", 0xD4A5A5),
                    ("account_address", "Account Address", 0x9B9B9B),
                ],
            ),
            category(
                "Balance Information",
                &[
                    ("beginning_balance_title", "Beginning Balance Title", 0xFF9999),
                    ("ending_balance_title", "Ending Balance Title", 0x99FF99),
                    ("beginning_balance", "Beginning Balance", 0x9999FF),
                    ("ending_balance", "Ending Balance", 0xFFB366),
                ],
            ),
            category(
                "Date Information",
                &[
                    ("beginning_date_title", "Beginning Date Title", 0xFF99CC),
                    ("ending_date_title", "Ending Date Title", 0x99FFCC),
                    ("beginning_date", "Beginning Date", 0xCC99FF),
                    ("ending_date", "Ending Date", 0xFFCC99),
                ],
            ),
            category(
                "Transaction Totals",
                &[
                    ("total_money_in_title", "Total Money In Title", 0xFF8080),
                    ("total_money_out_title", "Total Money Out Title", 0x80FF80),
                    ("total_money_in", "Total Money In", 0x8080FF),
                    ("total_money_out", "Total Money Out", 0xFFB380),
                ],
            ),
            category(
                "Transaction Headers",
                &[
                    ("transaction_date_title", "Transaction Date Title", 0xFF99FF),
                    ("transaction_description_title", "Transaction Description Title", 0x99FFFF),
                    ("transaction_type_title", "Transaction Type Title", 0xFFFF99),
                    ("transaction_money_in_title", "Transaction Money In Title", 0xFF8080),
                    ("transaction_money_out_title", "Transaction Money Out Title", 0x80FF80),
                    ("transaction_balance_title", "Transaction Balance Title", 0x8080FF),
                ],
            ),
            category(
                "Transaction Details",
                &[
                    ("transaction_date", "Transaction Date", 0xFFB3FF),
                    ("transaction_description", "Transaction Description", 0xB3FFFF),
                    ("transaction_type", "Transaction Type", 0xFFFFB3),
                    ("transaction_money_in", "Transaction Money In", 0xFFB3B3),
                    ("transaction_money_out", "Transaction Money Out", 0xB3FFB3),
                    ("transaction_balance", "Transaction Balance", 0xB3B3FF),
                ],
            ),
            category("Transaction", &[("transaction", "Transaction", 0x000000)]),
        ])
    }

    pub fn categories(&self) -> &[LabelCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&LabelCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// All labels, flattened in catalog order
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.categories.iter().flat_map(|c| c.labels.iter())
    }

    pub fn find(&self, id: &str) -> Option<&Label> {
        self.labels().find(|l| l.id == id)
    }

    pub fn category_of(&self, id: &str) -> Option<&LabelCategory> {
        self.categories.iter().find(|c| c.labels.iter().any(|l| l.id == id))
    }

    pub fn by_shortcut(&self, key: char) -> Option<&Label> {
        self.labels().find(|l| l.shortcut == Some(key))
    }
}

/// Selection and visibility state for the label sidebar
#[derive(Debug, Clone)]
pub struct LabelState {
    catalog: LabelCatalog,
    selected: Option<Label>,
    visibility: BTreeMap<String, bool>,
    show_labels: bool,
}

impl LabelState {
    /// All labels start visible with nothing selected
    pub fn new(catalog: LabelCatalog) -> Self {
        let visibility = catalog.labels().map(|l| (l.id.clone(), true)).collect();
        Self { catalog, selected: None, visibility, show_labels: true }
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    pub fn selected_label(&self) -> Option<&Label> {
        self.selected.as_ref()
    }

    /// Select a label by id. Returns false if the id is not in the catalog.
    pub fn select(&mut self, id: &str) -> bool {
        match self.catalog.find(id) {
            Some(label) => {
                self.selected = Some(label.clone());
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Advance to the next label within the current category, wrapping.
    pub fn select_next(&mut self) {
        self.cycle(1);
    }

    /// Step back to the previous label within the current category, wrapping.
    pub fn select_previous(&mut self) {
        self.cycle(-1);
    }

    fn cycle(&mut self, step: isize) {
        let Some(current) = self.selected.as_ref() else {
            self.selected = self.catalog.labels().next().cloned();
            return;
        };

        let Some(category) = self.catalog.category_of(&current.id) else {
            return;
        };
        let len = category.labels.len() as isize;
        let Some(index) = category.labels.iter().position(|l| l.id == current.id) else {
            return;
        };

        let next = (index as isize + step).rem_euclid(len) as usize;
        self.selected = Some(category.labels[next].clone());
    }

    /// Unknown ids are treated as visible
    pub fn is_visible(&self, id: &str) -> bool {
        self.visibility.get(id).copied().unwrap_or(true)
    }

    pub fn toggle_visibility(&mut self, id: &str) {
        let visible = self.is_visible(id);
        self.visibility.insert(id.to_string(), !visible);
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        for value in self.visibility.values_mut() {
            *value = visible;
        }
    }

    pub fn set_category_visible(&mut self, category: &str, visible: bool) {
        let Some(category) = self.catalog.category(category) else {
            return;
        };
        for label in &category.labels {
            self.visibility.insert(label.id.clone(), visible);
        }
    }

    pub fn show_labels(&self) -> bool {
        self.show_labels
    }

    pub fn set_show_labels(&mut self, show: bool) {
        self.show_labels = show;
    }
}

impl Default for LabelState {
    fn default() -> Self {
        Self::new(LabelCatalog::predefined())
    }
}
