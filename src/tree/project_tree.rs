use super::handle::{HandleGenerator, is_valid_handle};
use super::item::{Item, ItemClass, ItemType};
use crate::error::{ProjectError, ProjectResult};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// In-memory tree of project items
///
/// Items are owned by `items`, keyed by handle. Shape is kept separately in
/// `roots` and `children`, each a list of handles in sibling order. Every
/// mutating operation updates both so that:
/// - every handle in `roots`/`children` exists in `items`,
/// - an item's `parent` names the list that contains it,
/// - an item's `order` equals its index in that list.
#[derive(Debug, Default)]
pub struct ProjectTree {
    items: HashMap<String, Item>,
    roots: Vec<String>,
    children: HashMap<String, Vec<String>>,
    handles: HandleGenerator,
    changed: bool,
}

impl ProjectTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-seed the handle generator for reproducible handles
    pub fn set_seed(&mut self, seed: u64) {
        self.handles = HandleGenerator::with_seed(seed);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.items.contains_key(handle)
    }

    /// True if the tree was mutated since the flag was last cleared
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    /// Look up an item by handle
    pub fn get(&self, handle: &str) -> Option<&Item> {
        self.items.get(handle)
    }

    /// Modify an item in place
    ///
    /// Handle, parent and order are restored after `f` runs, so the closure
    /// can only change the item's own data. Use [`ProjectTree::move_item`]
    /// to re-parent.
    ///
    /// # Returns
    /// The closure's result, or `None` if the handle is unknown
    pub fn update<R>(&mut self, handle: &str, f: impl FnOnce(&mut Item) -> R) -> Option<R> {
        let item = self.items.get_mut(handle)?;
        let (key, parent, order) = (item.handle.clone(), item.parent.clone(), item.order);
        let result = f(&mut *item);
        if item.handle != key || item.parent != parent || item.order != order {
            warn!("Ignoring change to the placement of item '{}'", key);
            item.handle = key;
            item.parent = parent;
            item.order = order;
        }
        self.changed = true;
        Some(result)
    }

    /// Append an item to its parent's children
    ///
    /// # Returns
    /// The handle of the inserted item, generated if the item had none
    pub fn insert(&mut self, item: Item) -> ProjectResult<String> {
        self.insert_at(item, None)
    }

    /// Insert an item at a given sibling position (appends if `None` or past the end)
    pub fn insert_at(&mut self, mut item: Item, position: Option<usize>) -> ProjectResult<String> {
        if item.handle.is_empty() {
            let items = &self.items;
            item.handle = self.handles.unique_handle(|h| items.contains_key(h));
        } else if !is_valid_handle(&item.handle) {
            return Err(ProjectError::Integrity(format!(
                "'{}' is not a valid item handle",
                item.handle
            )));
        } else if self.items.contains_key(&item.handle) {
            return Err(ProjectError::Integrity(format!(
                "Duplicate item handle '{}'",
                item.handle
            )));
        }

        if let Some(parent) = &item.parent {
            if *parent == item.handle {
                return Err(ProjectError::Integrity(format!(
                    "Item '{}' cannot be its own parent",
                    item.handle
                )));
            }
            if !self.items.contains_key(parent) {
                return Err(ProjectError::Integrity(format!(
                    "Parent '{}' of item '{}' does not exist",
                    parent, item.handle
                )));
            }
        }

        let handle = item.handle.clone();
        let parent = item.parent.clone();
        self.items.insert(handle.clone(), item);
        let siblings = self.siblings_mut(parent.as_deref());
        let index = position.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(index, handle.clone());
        self.renumber(parent.as_deref());
        self.changed = true;

        debug!("Added item '{}' to the project tree", handle);
        Ok(handle)
    }

    /// Remove an item and its entire subtree
    ///
    /// # Returns
    /// The removed items, parents before children; empty if the handle is unknown
    pub fn remove(&mut self, handle: &str) -> Vec<Item> {
        let Some(parent) = self.items.get(handle).map(|item| item.parent.clone()) else {
            return Vec::new();
        };

        let subtree = self.subtree_handles(handle);
        self.siblings_mut(parent.as_deref()).retain(|h| h != handle);
        self.renumber(parent.as_deref());

        let mut removed = Vec::with_capacity(subtree.len());
        for h in subtree {
            self.children.remove(&h);
            if let Some(item) = self.items.remove(&h) {
                removed.push(item);
            }
        }
        self.changed = true;

        debug!("Removed {} item(s) from the project tree", removed.len());
        removed
    }

    /// Direct children of `parent` in sibling order, or the roots for `None`
    pub fn children(&self, parent: Option<&str>) -> Vec<&Item> {
        let list = match parent {
            None => Some(&self.roots),
            Some(p) => self.children.get(p),
        };
        list.into_iter()
            .flatten()
            .filter_map(|h| self.items.get(h))
            .collect()
    }

    /// All items, depth first, siblings in order
    pub fn walk(&self) -> Vec<&Item> {
        let mut result = Vec::with_capacity(self.items.len());
        let mut stack: Vec<&String> = self.roots.iter().rev().collect();
        while let Some(handle) = stack.pop() {
            if let Some(item) = self.items.get(handle) {
                result.push(item);
            }
            if let Some(kids) = self.children.get(handle) {
                stack.extend(kids.iter().rev());
            }
        }
        result
    }

    /// Handles of an item and all its descendants, parents before children
    ///
    /// Empty if the handle is unknown.
    pub fn subtree(&self, handle: &str) -> Vec<String> {
        if !self.contains(handle) {
            return Vec::new();
        }
        self.subtree_handles(handle)
    }

    /// Handles from the root down to and including `handle`
    ///
    /// Empty if the handle is unknown.
    pub fn ancestors(&self, handle: &str) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = self.items.get(handle);
        while let Some(item) = current {
            if path.len() > self.items.len() {
                break;
            }
            path.push(item.handle.clone());
            current = item.parent.as_deref().and_then(|p| self.items.get(p));
        }
        path.reverse();
        path
    }

    /// The root folder of a given class, if one exists
    pub fn find_root(&self, class: ItemClass) -> Option<&Item> {
        self.children(None)
            .into_iter()
            .find(|item| item.class == class && matches!(item.item_type, ItemType::Root | ItemType::Trash))
    }

    /// Move an item to a new parent and/or sibling position
    pub fn move_item(
        &mut self,
        handle: &str,
        new_parent: Option<&str>,
        position: Option<usize>,
    ) -> ProjectResult<()> {
        let Some(old_parent) = self.items.get(handle).map(|item| item.parent.clone()) else {
            return Err(ProjectError::Integrity(format!(
                "Cannot move unknown item '{}'",
                handle
            )));
        };
        if let Some(target) = new_parent {
            if !self.items.contains_key(target) {
                return Err(ProjectError::Integrity(format!(
                    "Cannot move '{}' to unknown parent '{}'",
                    handle, target
                )));
            }
            if self.subtree_handles(handle).iter().any(|h| h == target) {
                return Err(ProjectError::Integrity(format!(
                    "Moving '{}' under '{}' would create a cycle",
                    handle, target
                )));
            }
        }

        self.siblings_mut(old_parent.as_deref()).retain(|h| h != handle);
        self.renumber(old_parent.as_deref());

        let siblings = self.siblings_mut(new_parent);
        let index = position.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(index, handle.to_string());
        if let Some(item) = self.items.get_mut(handle) {
            item.parent = new_parent.map(str::to_string);
        }
        self.renumber(new_parent);
        self.changed = true;
        Ok(())
    }

    /// Replace the tree content with items read from the index file
    ///
    /// Malformed entries are absorbed rather than failing the load:
    /// - items with an invalid or duplicate handle are skipped,
    /// - items whose parent is missing become roots,
    /// - items caught in a parent cycle are detached to roots.
    ///
    /// Siblings are ordered by their stored `order`, ties keeping file order.
    ///
    /// # Returns
    /// Number of anomalies that were corrected
    pub fn load_items(&mut self, items: Vec<Item>) -> usize {
        self.items.clear();
        self.roots.clear();
        self.children.clear();

        let mut anomalies = 0;
        let mut accepted: Vec<Item> = Vec::with_capacity(items.len());
        let mut seen = HashSet::new();
        for item in items {
            if !is_valid_handle(&item.handle) {
                warn!("Skipping item with invalid handle '{}'", item.handle);
                anomalies += 1;
                continue;
            }
            if !seen.insert(item.handle.clone()) {
                warn!("Skipping duplicate item handle '{}'", item.handle);
                anomalies += 1;
                continue;
            }
            accepted.push(item);
        }

        let mut parents: HashMap<String, Option<String>> = accepted
            .iter()
            .map(|item| (item.handle.clone(), item.parent.clone()))
            .collect();

        for item in accepted.iter_mut() {
            if let Some(parent) = &item.parent
                && !parents.contains_key(parent)
            {
                warn!(
                    "Parent '{}' of item '{}' is missing, moving it to the root",
                    parent, item.handle
                );
                item.parent = None;
                parents.insert(item.handle.clone(), None);
                anomalies += 1;
            }
        }

        for item in accepted.iter_mut() {
            if Self::has_parent_cycle(&item.handle, &parents) {
                warn!("Item '{}' is part of a parent cycle, detaching it", item.handle);
                item.parent = None;
                parents.insert(item.handle.clone(), None);
                anomalies += 1;
            }
        }

        // File position breaks ties between equal order values
        let mut placed: Vec<(usize, Item)> = accepted.into_iter().enumerate().collect();
        placed.sort_by_key(|(index, item)| (item.order, *index));
        for (_, item) in placed {
            let handle = item.handle.clone();
            let parent = item.parent.clone();
            self.items.insert(handle.clone(), item);
            self.siblings_mut(parent.as_deref()).push(handle);
        }

        let mut lists: Vec<Option<String>> = vec![None];
        lists.extend(self.children.keys().cloned().map(Some));
        for parent in lists {
            self.renumber(parent.as_deref());
        }

        self.changed = false;
        anomalies
    }

    /// Clear all items, keeping the handle generator state
    pub fn clear(&mut self) {
        self.items.clear();
        self.roots.clear();
        self.children.clear();
        self.changed = false;
    }

    fn has_parent_cycle(start: &str, parents: &HashMap<String, Option<String>>) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(start.to_string());
        while let Some(handle) = current {
            if !visited.insert(handle.clone()) {
                return handle == start;
            }
            current = parents.get(&handle).cloned().flatten();
        }
        false
    }

    fn siblings_mut(&mut self, parent: Option<&str>) -> &mut Vec<String> {
        match parent {
            None => &mut self.roots,
            Some(p) => self.children.entry(p.to_string()).or_default(),
        }
    }

    fn renumber(&mut self, parent: Option<&str>) {
        let list = match parent {
            None => self.roots.clone(),
            Some(p) => self.children.get(p).cloned().unwrap_or_default(),
        };
        for (index, handle) in list.iter().enumerate() {
            if let Some(item) = self.items.get_mut(handle) {
                item.order = index;
            }
        }
    }

    fn subtree_handles(&self, handle: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut stack = vec![handle.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(kids) = self.children.get(&current) {
                stack.extend(kids.iter().rev().cloned());
            }
            result.push(current);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ItemLayout;

    fn sample_tree() -> (ProjectTree, String, String, String) {
        let mut tree = ProjectTree::new();
        tree.set_seed(42);
        let root = tree.insert(Item::root("Novel", ItemClass::Novel)).unwrap();
        let chapter = tree
            .insert(Item::folder("Chapter 1", ItemClass::Novel, &root))
            .unwrap();
        let scene = tree
            .insert(Item::file("Scene 1", ItemClass::Novel, ItemLayout::Scene, &chapter))
            .unwrap();
        (tree, root, chapter, scene)
    }

    #[test]
    fn test_insert_then_get() {
        let (tree, root, chapter, scene) = sample_tree();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(&scene).unwrap().name(), "Scene 1");
        assert_eq!(tree.get(&scene).unwrap().parent.as_deref(), Some(chapter.as_str()));
        assert_eq!(tree.get(&root).unwrap().parent, None);
        assert!(tree.get("0000000000000").is_none());
    }

    #[test]
    fn test_insert_rejects_duplicates_and_bad_parents() {
        let (mut tree, root, _, _) = sample_tree();
        let dup = Item::root("Again", ItemClass::Plot).with_handle(&root);
        assert!(matches!(tree.insert(dup), Err(ProjectError::Integrity(_))));

        let orphan = Item::folder("Lost", ItemClass::Plot, "0123456789abc");
        assert!(matches!(tree.insert(orphan), Err(ProjectError::Integrity(_))));

        let bad = Item::root("Bad", ItemClass::Plot).with_handle("not-a-handle!");
        assert!(matches!(tree.insert(bad), Err(ProjectError::Integrity(_))));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_remove_takes_subtree() {
        let (mut tree, root, chapter, scene) = sample_tree();
        let removed = tree.remove(&chapter);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].handle, chapter);
        assert!(tree.get(&chapter).is_none());
        assert!(tree.get(&scene).is_none());
        assert!(tree.children(Some(&root)).is_empty());

        // Unknown handle is a no-op
        assert!(tree.remove(&chapter).is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_children_order_and_positions() {
        let (mut tree, root, chapter, _) = sample_tree();
        let first = tree
            .insert_at(Item::file("Title", ItemClass::Novel, ItemLayout::Title, &root), Some(0))
            .unwrap();
        let names: Vec<&str> = tree.children(Some(&root)).iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["Title", "Chapter 1"]);
        assert_eq!(tree.get(&first).unwrap().order, 0);
        assert_eq!(tree.get(&chapter).unwrap().order, 1);

        // Restartable: a second call yields the same sequence
        assert_eq!(tree.children(Some(&root)).len(), 2);
        assert_eq!(tree.children(None).len(), 1);
    }

    #[test]
    fn test_walk_is_depth_first() {
        let (mut tree, root, _, _) = sample_tree();
        tree.insert(Item::root("Plot", ItemClass::Plot)).unwrap();
        tree.insert(Item::file("Title", ItemClass::Novel, ItemLayout::Title, &root))
            .unwrap();
        let names: Vec<&str> = tree.walk().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["Novel", "Chapter 1", "Scene 1", "Title", "Plot"]);
    }

    #[test]
    fn test_ancestors_breadcrumb() {
        let (tree, root, chapter, scene) = sample_tree();
        assert_eq!(tree.ancestors(&scene), vec![root, chapter, scene]);
        assert!(tree.ancestors("0123456789abc").is_empty());
    }

    #[test]
    fn test_move_item_rejects_cycles() {
        let (mut tree, root, chapter, scene) = sample_tree();
        assert!(tree.move_item(&chapter, Some(&scene), None).is_err());
        assert!(tree.move_item(&root, Some(&chapter), None).is_err());

        tree.move_item(&scene, Some(&root), Some(0)).unwrap();
        let names: Vec<&str> = tree.children(Some(&root)).iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["Scene 1", "Chapter 1"]);
        assert!(tree.children(Some(&chapter)).is_empty());
    }

    #[test]
    fn test_load_items_absorbs_anomalies() {
        let a = Item::root("A", ItemClass::Novel).with_handle("aaaaaaaaaaaaa");
        let mut b = Item::folder("B", ItemClass::Novel, "ccccccccccccc").with_handle("bbbbbbbbbbbbb");
        b.order = 0;
        let mut c = Item::folder("C", ItemClass::Novel, "bbbbbbbbbbbbb").with_handle("ccccccccccccc");
        c.order = 0;
        let missing = Item::folder("M", ItemClass::Plot, "9999999999999").with_handle("ddddddddddddd");
        let dup = Item::root("Dup", ItemClass::Plot).with_handle("aaaaaaaaaaaaa");
        let invalid = Item::root("Bad", ItemClass::Plot).with_handle("xyz");

        let mut tree = ProjectTree::new();
        let anomalies = tree.load_items(vec![a, b, c, missing, dup, invalid]);

        assert_eq!(tree.len(), 4);
        assert_eq!(anomalies, 4);
        assert_eq!(tree.get("aaaaaaaaaaaaa").unwrap().name(), "A");
        assert_eq!(tree.get("ddddddddddddd").unwrap().parent, None);
        // The first member of the cycle is detached, the other hangs below it
        assert_eq!(tree.get("bbbbbbbbbbbbb").unwrap().parent, None);
        assert_eq!(
            tree.get("ccccccccccccc").unwrap().parent.as_deref(),
            Some("bbbbbbbbbbbbb")
        );
        assert!(!tree.is_changed());
    }

    #[test]
    fn test_changed_flag() {
        let (mut tree, _, chapter, _) = sample_tree();
        assert!(tree.is_changed());
        tree.set_changed(false);
        tree.remove("0123456789abc");
        assert!(!tree.is_changed());
        tree.remove(&chapter);
        assert!(tree.is_changed());
    }

    #[test]
    fn test_update_keeps_placement() {
        let (mut tree, root, chapter, scene) = sample_tree();
        tree.set_changed(false);

        let renamed = tree.update(&chapter, |item| {
            item.set_name("Chapter One");
            item.word_count = 12;
            *item = Item::root("Hijack", ItemClass::Plot).with_handle("0000000000001");
            item.name().to_string()
        });
        assert_eq!(renamed.as_deref(), Some("Hijack"));
        assert!(tree.is_changed());

        let item = tree.get(&chapter).unwrap();
        assert_eq!(item.handle(), chapter);
        assert_eq!(item.parent(), Some(root.as_str()));
        assert_eq!(item.order(), 0);
        assert_eq!(item.class, ItemClass::Plot);
        assert!(tree.get("0000000000001").is_none());
        assert_eq!(tree.ancestors(&scene), vec![root, chapter.clone(), scene]);

        assert!(tree.update("0123456789abc", |item| item.word_count = 1).is_none());
    }
}
