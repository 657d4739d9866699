//! Source/shadow root pairs and translation of source-tree paths into the shadow tree.
//!
//! Containment is decided component by component, so a root of `/a/b` never
//! matches `/a/bc/file`. Case folding is applied to the comparison only; the
//! caller's original spelling is what ends up in the shadow path.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Directory name of the default source tree inside a workspace.
pub const DEFAULT_SOURCE_DIR: &str = "resources";

/// Directory name of the default shadow tree inside a workspace.
pub const DEFAULT_SHADOW_DIR: &str = "temp_resources";

/// How path components are compared when testing containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    /// Components must match byte for byte.
    Sensitive,
    /// Components are lowercased before comparison.
    Insensitive,
}

impl CaseSensitivity {
    /// The rule used by the host filesystem: case-insensitive on Windows only.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(windows) {
            Self::Insensitive
        } else {
            Self::Sensitive
        }
    }

    fn fold(self, component: &OsStr) -> Cow<'_, OsStr> {
        match self {
            Self::Sensitive => Cow::Borrowed(component),
            Self::Insensitive => {
                Cow::Owned(component.to_string_lossy().to_lowercase().into())
            }
        }
    }

    fn components_match(self, left: Component<'_>, right: Component<'_>) -> bool {
        match self {
            Self::Sensitive => left == right,
            Self::Insensitive => self.fold(left.as_os_str()) == self.fold(right.as_os_str()),
        }
    }
}

/// The pair of roots every mirroring operation is resolved against.
///
/// An empty root means "not configured"; such a pair contains nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootConfig {
    /// Root of the watched tree.
    pub source_root: PathBuf,
    /// Root of the tree kept in sync with `source_root`.
    pub shadow_root: PathBuf,
}

/// A resolved location in the shadow tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowPath {
    relative: PathBuf,
    absolute: PathBuf,
}

impl ShadowPath {
    /// Path relative to both roots. Empty for the roots themselves.
    #[must_use]
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Absolute location inside the shadow tree.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.absolute
    }
}

/// Result of translating a path through a [`RootConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// The path lies under the source root.
    Contained(ShadowPath),
    /// The path lies outside the source root, or no roots are configured.
    NotContained,
}

impl Translation {
    /// Returns `true` if the path was inside the source root.
    #[must_use]
    pub const fn is_contained(&self) -> bool {
        matches!(self, Self::Contained(_))
    }

    /// Converts into the shadow location, discarding the not-contained case.
    #[must_use]
    pub fn into_shadow_path(self) -> Option<ShadowPath> {
        match self {
            Self::Contained(shadow) => Some(shadow),
            Self::NotContained => None,
        }
    }
}

impl RootConfig {
    /// Creates a root pair from explicit paths.
    pub fn new(source_root: impl Into<PathBuf>, shadow_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            shadow_root: shadow_root.into(),
        }
    }

    /// The default pair for a workspace: `<workspace>/resources` mirrored into
    /// `<workspace>/temp_resources`.
    #[must_use]
    pub fn from_workspace(workspace: &Path) -> Self {
        Self::new(
            workspace.join(DEFAULT_SOURCE_DIR),
            workspace.join(DEFAULT_SHADOW_DIR),
        )
    }

    /// Returns `true` when either root is missing.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.source_root.as_os_str().is_empty() || self.shadow_root.as_os_str().is_empty()
    }

    /// Translates `path` using the host's case rule.
    #[must_use]
    pub fn translate(&self, path: &Path) -> Translation {
        translate(path, self, CaseSensitivity::host())
    }

    /// The part of `path` below the source root, if it lies inside it.
    #[must_use]
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        if self.is_unset() {
            return None;
        }
        relative_to_root(path, &self.source_root, CaseSensitivity::host())
    }

    /// Returns `true` if `path` lies inside the shadow tree.
    #[must_use]
    pub fn in_shadow_tree(&self, path: &Path) -> bool {
        !self.is_unset()
            && relative_to_root(path, &self.shadow_root, CaseSensitivity::host()).is_some()
    }
}

/// Translates an absolute path under `roots.source_root` into its shadow-tree
/// counterpart.
///
/// Returns [`Translation::NotContained`] when the roots are unset, when either
/// path is relative, or when `path` does not lie under the source root.
#[must_use]
pub fn translate(path: &Path, roots: &RootConfig, case: CaseSensitivity) -> Translation {
    if roots.is_unset() {
        return Translation::NotContained;
    }

    match relative_to_root(path, &roots.source_root, case) {
        Some(relative) => {
            let absolute = if relative.as_os_str().is_empty() {
                roots.shadow_root.clone()
            } else {
                roots.shadow_root.join(&relative)
            };
            Translation::Contained(ShadowPath { relative, absolute })
        }
        None => Translation::NotContained,
    }
}

/// Returns the part of `path` below `root`, or `None` if `path` is not inside it.
///
/// Both sides are lexically normalized first, so `..` cannot be used to step
/// out of the root. The returned suffix keeps the spelling of `path`.
#[must_use]
pub fn relative_to_root(path: &Path, root: &Path, case: CaseSensitivity) -> Option<PathBuf> {
    if !path.is_absolute() || !root.is_absolute() {
        return None;
    }

    let path = lexical_normalize(path);
    let root = lexical_normalize(root);

    let mut remaining = path.components();
    for root_component in root.components() {
        let component = remaining.next()?;
        if !case.components_match(root_component, component) {
            return None;
        }
    }

    Some(remaining.as_path().to_path_buf())
}

/// Resolves `.` and `..` without touching the filesystem.
///
/// `..` at the root stays at the root, matching how the OS resolves `/..`.
#[must_use]
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() && !path.has_root() {
                    normalized.push(component.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
