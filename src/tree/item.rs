use std::fmt;
use std::str::FromStr;

/// Item class: which part of the project an item belongs to
///
/// Written in upper snake case (`NO_CLASS`, `NOVEL`, ...) both in the
/// index file and in document metadata headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemClass {
    #[default]
    NoClass,
    Novel,
    Plot,
    Character,
    World,
    Timeline,
    Object,
    Entity,
    Custom,
    Archive,
    Trash,
}

impl ItemClass {
    /// All classes, in display order
    pub const ALL: [ItemClass; 11] = [
        ItemClass::NoClass,
        ItemClass::Novel,
        ItemClass::Plot,
        ItemClass::Character,
        ItemClass::World,
        ItemClass::Timeline,
        ItemClass::Object,
        ItemClass::Entity,
        ItemClass::Custom,
        ItemClass::Archive,
        ItemClass::Trash,
    ];

    /// Classes that may only have a single root folder per project
    pub fn is_single_root(self) -> bool {
        matches!(
            self,
            ItemClass::Novel | ItemClass::Plot | ItemClass::Character | ItemClass::World
        )
    }

    /// Default label used when the project wizard creates a root of this class
    pub fn default_label(self) -> &'static str {
        match self {
            ItemClass::NoClass => "None",
            ItemClass::Novel => "Novel",
            ItemClass::Plot => "Plot",
            ItemClass::Character => "Characters",
            ItemClass::World => "Locations",
            ItemClass::Timeline => "Timeline",
            ItemClass::Object => "Objects",
            ItemClass::Entity => "Entities",
            ItemClass::Custom => "Custom",
            ItemClass::Archive => "Archive",
            ItemClass::Trash => "Trash",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ItemClass::NoClass => "NO_CLASS",
            ItemClass::Novel => "NOVEL",
            ItemClass::Plot => "PLOT",
            ItemClass::Character => "CHARACTER",
            ItemClass::World => "WORLD",
            ItemClass::Timeline => "TIMELINE",
            ItemClass::Object => "OBJECT",
            ItemClass::Entity => "ENTITY",
            ItemClass::Custom => "CUSTOM",
            ItemClass::Archive => "ARCHIVE",
            ItemClass::Trash => "TRASH",
        }
    }
}

impl fmt::Display for ItemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ItemClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemClass::ALL
            .into_iter()
            .find(|class| class.tag() == s.trim())
            .ok_or_else(|| format!("Invalid item class '{}'", s))
    }
}

/// Item type: structural role in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemType {
    #[default]
    NoType,
    Root,
    Folder,
    File,
    Trash,
}

impl ItemType {
    fn tag(self) -> &'static str {
        match self {
            ItemType::NoType => "NO_TYPE",
            ItemType::Root => "ROOT",
            ItemType::Folder => "FOLDER",
            ItemType::File => "FILE",
            ItemType::Trash => "TRASH",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NO_TYPE" => Ok(ItemType::NoType),
            "ROOT" => Ok(ItemType::Root),
            "FOLDER" => Ok(ItemType::Folder),
            "FILE" => Ok(ItemType::File),
            "TRASH" => Ok(ItemType::Trash),
            _ => Err(format!("Invalid item type '{}'", s)),
        }
    }
}

/// Content layout of a file item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemLayout {
    #[default]
    NoLayout,
    Title,
    Book,
    Page,
    Partition,
    Unnumbered,
    Chapter,
    Scene,
    Note,
}

impl ItemLayout {
    fn tag(self) -> &'static str {
        match self {
            ItemLayout::NoLayout => "NO_LAYOUT",
            ItemLayout::Title => "TITLE",
            ItemLayout::Book => "BOOK",
            ItemLayout::Page => "PAGE",
            ItemLayout::Partition => "PARTITION",
            ItemLayout::Unnumbered => "UNNUMBERED",
            ItemLayout::Chapter => "CHAPTER",
            ItemLayout::Scene => "SCENE",
            ItemLayout::Note => "NOTE",
        }
    }
}

impl fmt::Display for ItemLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ItemLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "NO_LAYOUT" => Ok(ItemLayout::NoLayout),
            "TITLE" => Ok(ItemLayout::Title),
            "BOOK" => Ok(ItemLayout::Book),
            "PAGE" => Ok(ItemLayout::Page),
            "PARTITION" => Ok(ItemLayout::Partition),
            "UNNUMBERED" => Ok(ItemLayout::Unnumbered),
            "CHAPTER" => Ok(ItemLayout::Chapter),
            "SCENE" => Ok(ItemLayout::Scene),
            "NOTE" => Ok(ItemLayout::Note),
            _ => Err(format!("Invalid item layout '{}'", s)),
        }
    }
}

/// A node in the project tree
///
/// The handle is assigned once, either by the caller or by the tree on
/// insertion, and never changes afterwards. The parent and order are owned
/// by the tree: they are rewritten when the item is inserted or moved, and
/// are read-only outside the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Fixed-length handle (13 lowercase hex characters), empty until assigned
    pub(crate) handle: String,
    /// Parent handle, `None` for root items
    pub(crate) parent: Option<String>,
    /// Position among siblings
    pub(crate) order: usize,
    pub item_type: ItemType,
    pub class: ItemClass,
    pub layout: ItemLayout,
    /// Status or importance label
    pub status: String,
    pub expanded: bool,
    pub exported: bool,
    pub char_count: usize,
    pub word_count: usize,
    pub para_count: usize,
    pub cursor_pos: usize,
    name: String,
}

impl Item {
    /// Create an unplaced item with no handle
    pub fn new(name: &str, item_type: ItemType, class: ItemClass) -> Self {
        Self {
            handle: String::new(),
            parent: None,
            order: 0,
            item_type,
            class,
            layout: ItemLayout::NoLayout,
            status: String::new(),
            expanded: false,
            exported: true,
            char_count: 0,
            word_count: 0,
            para_count: 0,
            cursor_pos: 0,
            name: name.trim().to_string(),
        }
    }

    /// Create a root folder item
    pub fn root(name: &str, class: ItemClass) -> Self {
        Self::new(name, ItemType::Root, class)
    }

    /// Create a folder item under `parent`
    pub fn folder(name: &str, class: ItemClass, parent: &str) -> Self {
        let mut item = Self::new(name, ItemType::Folder, class);
        item.parent = Some(parent.to_string());
        item
    }

    /// Create a file item under `parent`
    pub fn file(name: &str, class: ItemClass, layout: ItemLayout, parent: &str) -> Self {
        let mut item = Self::new(name, ItemType::File, class);
        item.parent = Some(parent.to_string());
        item.layout = layout;
        item
    }

    /// Builder-style handle assignment
    pub fn with_handle(mut self, handle: &str) -> Self {
        self.handle = handle.to_string();
        self
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the display name, trimming surrounding whitespace
    pub fn set_name(&mut self, name: &str) {
        self.name = name.trim().to_string();
    }

    pub fn is_file(&self) -> bool {
        self.item_type == ItemType::File
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed() {
        let mut item = Item::root("  Novel \n", ItemClass::Novel);
        assert_eq!(item.name(), "Novel");

        item.set_name("\t Book One  ");
        assert_eq!(item.name(), "Book One");
    }

    #[test]
    fn test_enum_tags_round_trip() {
        for class in ItemClass::ALL {
            assert_eq!(class.to_string().parse::<ItemClass>(), Ok(class));
        }
        assert_eq!("WORLD".parse::<ItemClass>(), Ok(ItemClass::World));
        assert_eq!("NOTE".parse::<ItemLayout>(), Ok(ItemLayout::Note));
        assert_eq!("FILE".parse::<ItemType>(), Ok(ItemType::File));
        assert!("world".parse::<ItemClass>().is_err());
        assert!("STORY".parse::<ItemLayout>().is_err());
    }

    #[test]
    fn test_single_root_classes() {
        assert!(ItemClass::Novel.is_single_root());
        assert!(ItemClass::World.is_single_root());
        assert!(!ItemClass::Timeline.is_single_root());
        assert!(!ItemClass::Custom.is_single_root());
    }
}
