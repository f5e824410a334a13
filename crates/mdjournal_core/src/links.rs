//! Markdown link target rewriting.
//!
//! # Responsibility
//! - Rewrite image/link targets between notebook-root-relative and
//!   path-relative forms when content is relocated.
//! - Stay line-oriented: a single-pass lexical regex substitution, never a
//!   full Markdown parse.
//!
//! # Invariants
//! - Absolute URLs (targets containing `://`) are never touched.
//! - Rewriting is idempotent on links already in canonical `/`-prefixed form.
//! - Resolution is purely lexical; the filesystem is never consulted.
//! - Targets resolving outside the notebook root are rejected, not clamped.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

static IMAGE_OR_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^\)]*)\)").expect("valid link regex"));

pub type LinkResult<T> = Result<T, LinkError>;

/// Error raised while canonicalizing link targets.
#[derive(Debug)]
pub enum LinkError {
    /// Target resolves to a path outside the notebook root.
    EscapesNotebookRoot { target: String },
}

impl Display for LinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EscapesNotebookRoot { target } => {
                write!(f, "link target `{target}` resolves outside the notebook root")
            }
        }
    }
}

impl Error for LinkError {}

/// Rewrites every Markdown image/link target in `line`.
///
/// Targets are resolved lexically: `/`-prefixed targets against
/// `notebook_root`, everything else against `origin_dir` (bare targets are
/// treated as implicitly `./`-relative). The result is expressed as a
/// `/`-prefixed notebook-root-relative target, or relative to
/// `destination_dir` when one is supplied (handout assembly outside the
/// source tree).
///
/// # Errors
/// - `LinkError::EscapesNotebookRoot` when a resolved target leaves the
///   notebook root.
pub fn rewrite_links(
    line: &str,
    notebook_root: &Path,
    origin_dir: &Path,
    destination_dir: Option<&Path>,
) -> LinkResult<String> {
    let mut out = String::with_capacity(line.len());
    let mut last_end = 0;
    for caps in IMAGE_OR_LINK_RE.captures_iter(line) {
        let whole = caps.get(0).expect("capture 0 always present");
        out.push_str(&line[last_end..whole.start()]);
        out.push_str(&rewrite_match(
            &caps,
            notebook_root,
            origin_dir,
            destination_dir,
        )?);
        last_end = whole.end();
    }
    out.push_str(&line[last_end..]);
    Ok(out)
}

fn rewrite_match(
    caps: &Captures<'_>,
    notebook_root: &Path,
    origin_dir: &Path,
    destination_dir: Option<&Path>,
) -> LinkResult<String> {
    let bang = &caps[1];
    let label = &caps[2];
    let target = &caps[3];

    if target.contains("://") {
        return Ok(caps[0].to_string());
    }

    let resolved = if let Some(root_relative) = target.strip_prefix('/') {
        normalize_lexical(&notebook_root.join(root_relative))
    } else {
        // Bare targets behave exactly like `./`-prefixed ones.
        normalize_lexical(&origin_dir.join(target))
    };

    let root = normalize_lexical(notebook_root);
    let relative_to_root =
        resolved
            .strip_prefix(&root)
            .map_err(|_| LinkError::EscapesNotebookRoot {
                target: target.to_string(),
            })?;
    if relative_to_root
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(LinkError::EscapesNotebookRoot {
            target: target.to_string(),
        });
    }

    let new_target = match destination_dir {
        Some(dest) => path_to_posix(&relative_from(&resolved, &normalize_lexical(dest))),
        None => format!("/{}", path_to_posix(relative_to_root)),
    };

    Ok(format!("{bang}[{label}]({new_target})"))
}

/// Collapses `.` and `..` components without touching the filesystem.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // Keep the escape visible so the root check can reject it.
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Computes the relative path from `base` to `target` (both normalized).
fn relative_from(target: &Path, base: &Path) -> PathBuf {
    let target_comps: Vec<Component<'_>> = target.components().collect();
    let base_comps: Vec<Component<'_>> = base.components().collect();

    let mut shared = 0;
    while shared < target_comps.len()
        && shared < base_comps.len()
        && target_comps[shared] == base_comps[shared]
    {
        shared += 1;
    }

    let mut out = PathBuf::new();
    for _ in shared..base_comps.len() {
        out.push("..");
    }
    for comp in &target_comps[shared..] {
        out.push(comp.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

fn path_to_posix(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::{rewrite_links, LinkError};
    use std::path::Path;

    const ROOT: &str = "/notebook";
    const ORIGIN: &str = "/notebook/journal";

    fn rewrite(line: &str) -> String {
        rewrite_links(line, Path::new(ROOT), Path::new(ORIGIN), None).unwrap()
    }

    #[test]
    fn canonical_targets_are_left_unchanged() {
        assert_eq!(rewrite("[x](/a/b.md)"), "[x](/a/b.md)");
    }

    #[test]
    fn absolute_urls_are_never_rewritten() {
        let line = "see [docs](https://example.com/a.md) now";
        assert_eq!(rewrite(line), line);
    }

    #[test]
    fn explicit_relative_targets_resolve_against_origin() {
        assert_eq!(rewrite("![i](./img.png)"), "![i](/journal/img.png)");
        assert_eq!(rewrite("[up](../top.md)"), "[up](/top.md)");
    }

    #[test]
    fn bare_targets_are_implicitly_relative() {
        assert_eq!(rewrite("[i](img.png)"), "[i](/journal/img.png)");
    }

    #[test]
    fn multiple_links_on_one_line_are_all_rewritten() {
        assert_eq!(
            rewrite("[a](a.md) and ![b](./b.png)"),
            "[a](/journal/a.md) and ![b](/journal/b.png)"
        );
    }

    #[test]
    fn escaping_the_notebook_root_is_rejected() {
        let err = rewrite_links(
            "[bad](../../outside.md)",
            Path::new(ROOT),
            Path::new(ORIGIN),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LinkError::EscapesNotebookRoot { .. }));
    }

    #[test]
    fn destination_dir_produces_relative_targets() {
        let rewritten = rewrite_links(
            "[x](/journal/img.png)",
            Path::new(ROOT),
            Path::new(ORIGIN),
            Some(Path::new("/notebook/handout/proj")),
        )
        .unwrap();
        assert_eq!(rewritten, "[x](../../journal/img.png)");
    }

    #[test]
    fn rewriting_is_idempotent() {
        let once = rewrite("[x](notes.md)");
        assert_eq!(rewrite(&once), once);
    }
}
