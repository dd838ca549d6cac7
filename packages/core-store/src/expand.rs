//! Query expansion into concrete leaf paths.

use crate::{Path, Segment};

/// Expand a query into the paths it names, without consulting any data.
///
/// Key sets and index ranges fan out as a cartesian product, leftmost
/// segment varying slowest. Keys, indices and wildcards are carried over
/// unchanged. An empty key set or empty range yields no paths at all; the
/// root query yields the root path.
///
/// ```rust
/// use patternfs_core_store::{expand, path};
///
/// let paths = expand(&path!("users/{alice,bob}/tags/[0..2]"));
/// let text: Vec<String> = paths.iter().map(ToString::to_string).collect();
/// assert_eq!(
///     text,
///     ["users/alice/tags/0", "users/alice/tags/1", "users/bob/tags/0", "users/bob/tags/1"]
/// );
/// ```
pub fn expand(query: &Path) -> Vec<Path> {
    let mut paths = vec![Path::root()];
    for segment in query.iter() {
        let choices = segment.expand();
        paths = paths
            .iter()
            .flat_map(|prefix| choices.iter().map(move |choice| prefix.child(choice.clone())))
            .collect();
        if paths.is_empty() {
            break;
        }
    }
    paths
}

/// Like [`expand`], but fails on any segment that is still not concrete.
pub(crate) fn expand_concrete(query: &Path) -> Result<Vec<Path>, crate::Error> {
    if query.iter().any(|s| matches!(s, Segment::Wildcard)) {
        return Err(crate::Error::InvalidPath {
            message: format!("wildcard not allowed in '{}'", query),
        });
    }
    Ok(expand(query))
}
