// ── Drag-and-drop translation ─────────────────────────────────────────────────

use std::path::PathBuf;

use tracing::debug;

use crate::message::{field, FileRef, NativeMessage};

/// Resolve every file reference attached to a drop notification.
///
/// Enumeration is index-based and stops at the first missing entry; the
/// toolkit may report fewer references than it announced.  References that
/// do not resolve are skipped.
pub fn collect_paths(msg: &NativeMessage) -> Vec<PathBuf> {
    (0..)
        .map_while(|index| msg.find_ref(field::REFS, index))
        .filter_map(|r| {
            let path = resolve(r);
            if path.is_none() {
                debug!(reference = r.0.as_str(), "unresolvable drop reference skipped");
            }
            path
        })
        .collect()
}

/// A reference resolves when it names an absolute path without NULs.
fn resolve(r: &FileRef) -> Option<PathBuf> {
    if r.0.is_empty() || r.0.contains('\0') {
        return None;
    }
    let path = PathBuf::from(&r.0);
    path.is_absolute().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;

    #[cfg(unix)]
    const A: &str = "/home/user/a.txt";
    #[cfg(unix)]
    const B: &str = "/home/user/b.txt";
    #[cfg(windows)]
    const A: &str = r"C:\Users\user\a.txt";
    #[cfg(windows)]
    const B: &str = r"C:\Users\user\b.txt";

    #[test]
    fn resolved_paths_keep_enumeration_order() {
        let msg = NativeMessage::new(MessageKind::SimpleData)
            .with_ref(field::REFS, A)
            .with_ref(field::REFS, B);
        assert_eq!(collect_paths(&msg), vec![PathBuf::from(A), PathBuf::from(B)]);
    }

    #[test]
    fn malformed_references_are_skipped() {
        let msg = NativeMessage::new(MessageKind::SimpleData)
            .with_ref(field::REFS, "relative/path")
            .with_ref(field::REFS, A)
            .with_ref(field::REFS, "");
        assert_eq!(collect_paths(&msg), vec![PathBuf::from(A)]);
    }

    #[test]
    fn no_references_yields_empty_list() {
        let msg = NativeMessage::new(MessageKind::SimpleData);
        assert!(collect_paths(&msg).is_empty());
    }
}
