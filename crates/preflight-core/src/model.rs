//! Checklist data model.
//!
//! The [`Collection`] is the single persisted root. Lookups match names and
//! serials exactly (case-sensitive) and always address the first match, so a
//! later duplicate is never visible until the earlier one is removed.

use serde::{Deserialize, Serialize};

/// A named, serial-identified entry in a checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Free-text item name.
    pub name: String,
    /// Serial, intended (but not required) to be unique within its checklist.
    pub serial: String,
}

impl Item {
    /// Creates a new item.
    #[must_use]
    pub fn new(name: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serial: serial.into(),
        }
    }
}

/// A named, ordered list of items. Newest items are last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    /// Checklist name.
    pub name: String,
    /// Items in insertion order.
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Checklist {
    /// Creates an empty checklist.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Returns the first item with the given serial.
    #[must_use]
    pub fn item(&self, serial: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.serial == serial)
    }

    /// Appends an item.
    pub fn push_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Removes the first item with the given serial, keeping the order of the rest.
    pub fn remove_item(&mut self, serial: &str) -> Option<Item> {
        let index = self.items.iter().position(|item| item.serial == serial)?;
        Some(self.items.remove(index))
    }
}

/// Root aggregate of all checklists; the unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Checklists in insertion order.
    #[serde(default)]
    pub checklists: Vec<Checklist>,
}

impl Collection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of checklists.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checklists.len()
    }

    /// Returns `true` if there are no checklists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checklists.is_empty()
    }

    /// Returns the first checklist with the given name.
    #[must_use]
    pub fn checklist(&self, name: &str) -> Option<&Checklist> {
        self.checklists.iter().find(|c| c.name == name)
    }

    /// Returns the first checklist with the given name, mutably.
    pub fn checklist_mut(&mut self, name: &str) -> Option<&mut Checklist> {
        self.checklists.iter_mut().find(|c| c.name == name)
    }

    /// Appends a checklist. Duplicate names are accepted.
    pub fn push_checklist(&mut self, checklist: Checklist) {
        self.checklists.push(checklist);
    }

    /// Removes the first checklist with the given name, along with its items.
    pub fn remove_checklist(&mut self, name: &str) -> Option<Checklist> {
        let index = self.checklists.iter().position(|c| c.name == name)?;
        Some(self.checklists.remove(index))
    }
}
