use log::{info, warn};
use netdesk::{Item, ItemSpec, Payload, StopFlag, TaskOutput};
use std::io;
use std::path::{Path, PathBuf};

pub const IMPORT_TASK: &str = "import";

/// Scans `root` into a folder tree: directories become folders and files
/// become items carrying their `PathBuf`. Runs on the worker thread.
pub fn scan_directory(root: &Path, depth: usize, stop: &StopFlag) -> TaskOutput {
    match build_spec(root, depth, stop) {
        Ok(Some(spec)) => {
            info!("scanned {} item(s) under {}", spec.count(), root.display());
            TaskOutput::Items {
                into: None,
                items: vec![spec],
            }
        }
        Ok(None) => TaskOutput::Cancelled {
            task: IMPORT_TASK.to_string(),
        },
        Err(err) => TaskOutput::Failed {
            task: IMPORT_TASK.to_string(),
            reason: format!("{}: {err}", root.display()),
        },
    }
}

fn build_spec(path: &Path, depth: usize, stop: &StopFlag) -> io::Result<Option<ItemSpec>> {
    if stop.is_stopped() {
        return Ok(None);
    }
    let label = display_name(path);
    if !std::fs::metadata(path)?.is_dir() {
        let payload = Payload::new(path.to_path_buf());
        return Ok(Some(ItemSpec::new(Item::generic(label, Some(payload)))));
    }

    let mut spec = ItemSpec::new(Item::folder(label));
    if depth == 0 {
        return Ok(Some(spec));
    }
    let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| !is_hidden(p))
        .collect();
    entries.sort();

    for entry in entries {
        match build_spec(&entry, depth - 1, stop) {
            Ok(Some(child)) => spec.children.push(child),
            Ok(None) => return Ok(None),
            Err(err) => warn!("skipping {}: {err}", entry.display()),
        }
    }
    Ok(Some(spec))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use netdesk::ItemKind;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_tree() -> PathBuf {
        let uniq = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time error")
            .as_nanos();
        let base = std::env::temp_dir().join(format!("netdesk_scan_test_{uniq}"));
        std::fs::create_dir_all(base.join("nested/deeper")).expect("mkdir");
        std::fs::write(base.join("a.tsv"), b"a\tb\n").expect("write");
        std::fs::write(base.join(".hidden"), b"").expect("write");
        std::fs::write(base.join("nested/b.gml"), b"graph []").expect("write");
        std::fs::write(base.join("nested/deeper/c.dot"), b"digraph {}").expect("write");
        base
    }

    #[test]
    fn scan_builds_folders_and_payload_items() {
        let base = temp_tree();
        let output = scan_directory(&base, 1, &StopFlag::new());
        let _ = std::fs::remove_dir_all(&base);

        let (into, items) = match output {
            TaskOutput::Items { into, items } => (into, items),
            other => panic!("scan failed: {other:?}"),
        };
        assert!(into.is_none());
        let root = &items[0];
        assert!(root.item.kind().is_folder());
        let labels: Vec<&str> = root.children.iter().map(|c| c.item.label()).collect();
        assert_eq!(labels, vec!["a.tsv", "nested"]);

        let file = &root.children[0].item;
        assert!(matches!(file.kind(), ItemKind::Generic { .. }));
        assert_eq!(
            file.payload()
                .and_then(|p| p.downcast_ref::<PathBuf>())
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string()),
            Some("a.tsv".to_string())
        );
        // depth 1 stops below the first level
        assert!(root.children[1].children.is_empty());
    }

    #[test]
    fn stopped_scan_reports_cancellation() {
        let base = temp_tree();
        let stop = StopFlag::new();
        stop.request_stop();
        let output = scan_directory(&base, 3, &stop);
        let _ = std::fs::remove_dir_all(&base);
        assert!(matches!(output, TaskOutput::Cancelled { .. }));
    }

    #[test]
    fn missing_root_is_a_failure() {
        let output = scan_directory(Path::new("/definitely/not/here"), 2, &StopFlag::new());
        assert!(matches!(output, TaskOutput::Failed { .. }));
    }
}
