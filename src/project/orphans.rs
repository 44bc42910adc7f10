use crate::document::DocumentStore;
use crate::tree::{Item, ItemClass, ItemLayout, ItemType, ProjectTree};
use tracing::{info, warn};

/// Add document files unknown to the tree back into it as root file items
///
/// Names, class and layout come from the document header when present.
/// Unnamed orphans are called "Orphaned File N", counting from 1 in each pass.
///
/// # Returns
/// Number of recovered items
pub fn recover_orphans(tree: &mut ProjectTree, store: &DocumentStore) -> usize {
    let mut recovered = 0;
    let mut unnamed = 0;

    for handle in store.scan() {
        if tree.contains(&handle) {
            continue;
        }

        let meta = store.read_meta(&handle).unwrap_or_else(|e| {
            warn!("Could not read orphaned document {}: {}", handle, e);
            Default::default()
        });
        let name = if meta.name.trim().is_empty() {
            unnamed += 1;
            format!("Orphaned File {}", unnamed)
        } else {
            meta.name.clone()
        };

        let mut item = Item::new(&name, ItemType::File, meta.class.unwrap_or(ItemClass::NoClass))
            .with_handle(&handle);
        item.layout = meta.layout.unwrap_or(ItemLayout::NoLayout);

        match tree.insert(item) {
            Ok(_) => {
                info!("Recovered orphaned document {} as '{}'", handle, name);
                recovered += 1;
            }
            Err(e) => warn!("Could not recover orphaned document {}: {}", handle, e),
        }
    }
    recovered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocMeta;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_second_pass_recovers_nothing() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        fs::write(store.doc_path("0000000000001"), "\n").unwrap();
        fs::write(store.doc_path("0000000000002"), "\n").unwrap();

        let mut tree = ProjectTree::new();
        assert_eq!(recover_orphans(&mut tree, &store), 2);
        assert_eq!(tree.get("0000000000001").unwrap().name(), "Orphaned File 1");
        assert_eq!(tree.get("0000000000002").unwrap().name(), "Orphaned File 2");
        assert_eq!(recover_orphans(&mut tree, &store), 0);
    }

    #[test]
    fn test_breadcrumb_parent_is_not_restored() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        let mut tree = ProjectTree::new();
        let root = tree.insert(Item::root("World", ItemClass::World)).unwrap();

        let meta = DocMeta {
            name: "Mars".to_string(),
            path: vec![root.clone(), "636b6aa9b697b".to_string()],
            class: Some(ItemClass::World),
            layout: Some(ItemLayout::Note),
        };
        store.write(&meta, "636b6aa9b697b", "").unwrap();

        assert_eq!(recover_orphans(&mut tree, &store), 1);
        let item = tree.get("636b6aa9b697b").unwrap();
        assert_eq!(item.parent, None);
        assert_eq!(item.item_type, ItemType::File);
        assert_eq!(item.class, ItemClass::World);
    }
}
