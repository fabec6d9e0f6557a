//! Path resolution inside the storage root
//!
//! Every filesystem operation of the store goes through [`PathResolver::resolve`].
//! Canonicalisation is purely lexical: no symlink resolution and no filesystem
//! access, so a path can be checked before anything exists on disk.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::{AttachmentError, AttachmentResult};

/// Convert separators to `/` and collapse repeated separators
pub fn normalize_rel_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut out = String::with_capacity(unified.len());
    let mut prev_slash = false;
    for ch in unified.chars() {
        if ch == '/' {
            if !prev_slash {
                out.push(ch);
            }
            prev_slash = true;
        } else {
            out.push(ch);
            prev_slash = false;
        }
    }
    out
}

/// Apply `.` and `..` segments without touching the filesystem
///
/// `..` above the filesystem root stays at the root.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

/// Maps candidate paths into the storage root, rejecting everything outside it
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver; a relative root is taken from the working directory
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref();
        let absolute = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        Ok(Self {
            root: lexical_normalize(&absolute),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored or client-supplied path to an absolute path inside the root
    pub fn resolve(&self, candidate: &str) -> AttachmentResult<PathBuf> {
        let normalized = normalize_rel_path(candidate);
        let path = Path::new(&normalized);
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let resolved = lexical_normalize(&joined);
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            warn!(
                target: "security",
                path = %candidate,
                "Blocked path traversal attempt"
            );
            Err(AttachmentError::PathTraversal(candidate.to_string()))
        }
    }

    /// Root-relative, forward-slash form of an absolute path inside the root
    pub fn relative(&self, absolute: &Path) -> Option<String> {
        let rel = absolute.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PathResolver {
        PathResolver::new("/srv/app").unwrap()
    }

    #[test]
    fn test_normalize_rel_path() {
        assert_eq!(
            normalize_rel_path("uploads\\staff\\\\S1//1/a.pdf"),
            "uploads/staff/S1/1/a.pdf"
        );
        assert_eq!(normalize_rel_path(""), "");
    }

    #[test]
    fn test_lexical_normalize() {
        assert_eq!(
            lexical_normalize(Path::new("/srv/app/./uploads/../uploads/x")),
            PathBuf::from("/srv/app/uploads/x")
        );
        assert_eq!(lexical_normalize(Path::new("/../..")), PathBuf::from("/"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let resolved = resolver().resolve("uploads/students/STUD0001/a/b.pdf").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/app/uploads/students/STUD0001/a/b.pdf"));
    }

    #[test]
    fn test_resolve_accepts_root_itself() {
        assert_eq!(resolver().resolve("").unwrap(), PathBuf::from("/srv/app"));
        assert_eq!(resolver().resolve(".").unwrap(), PathBuf::from("/srv/app"));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let err = resolver()
            .resolve("uploads/students/../../../etc/passwd")
            .unwrap_err();
        assert!(matches!(err, AttachmentError::PathTraversal(_)));
    }

    #[test]
    fn test_resolve_rejects_backslash_traversal() {
        assert!(resolver().resolve("uploads\\..\\..\\etc\\passwd").is_err());
    }

    #[test]
    fn test_resolve_rejects_sibling_prefix() {
        assert!(resolver().resolve("/srv/app-evil/file").is_err());
        assert!(resolver().resolve("../app-evil/file").is_err());
    }

    #[test]
    fn test_resolve_absolute_inside_root() {
        let resolved = resolver().resolve("/srv/app/uploads/x.png").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/app/uploads/x.png"));
        assert!(resolver().resolve("/etc/passwd").is_err());
    }

    #[test]
    fn test_inner_parent_segments_stay_inside() {
        let resolved = resolver().resolve("uploads/a/../b/c.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/app/uploads/b/c.txt"));
    }

    #[test]
    fn test_resolved_paths_always_inside_root() {
        let inputs = [
            "a/b/c",
            "../x",
            "a/../../x",
            "./a/./b",
            "a//..//..//b",
            "/",
            "\\\\server\\share",
            "uploads/..",
            "uploads/../..",
        ];
        let resolver = resolver();
        for input in inputs {
            if let Ok(path) = resolver.resolve(input) {
                assert!(path.starts_with(resolver.root()), "{input} escaped");
            }
        }
    }

    #[test]
    fn test_relative() {
        let resolver = resolver();
        let abs = resolver.resolve("uploads//staff/S/1/photo/p.png").unwrap();
        assert_eq!(
            resolver.relative(&abs).unwrap(),
            "uploads/staff/S/1/photo/p.png"
        );
        assert!(resolver.relative(Path::new("/etc/passwd")).is_none());
    }
}
