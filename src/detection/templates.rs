use std::path::{Component, Path, PathBuf};

use crate::models::ArtifactKind;
use crate::utils::{AppError, AppResult};

/// Which root a template hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Relative to the user's home directory.
    User,
    /// Relative to the system root.
    System,
}

/// The two roots templates are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRoots {
    pub home: PathBuf,
    pub system_root: PathBuf,
}

impl DiscoveryRoots {
    /// Current user's home and `/`.
    pub fn from_env() -> AppResult<Self> {
        let home = dirs::home_dir()
            .filter(|h| h.is_absolute())
            .ok_or(AppError::HomeDirUnavailable)?;
        Ok(Self {
            home,
            system_root: PathBuf::from("/"),
        })
    }

    fn root(&self, scope: Scope) -> &Path {
        match scope {
            Scope::User => &self.home,
            Scope::System => &self.system_root,
        }
    }
}

/// A path convention: `pattern` with `{id}` replaced by an identifier,
/// resolved under the scope's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTemplate {
    pub scope: Scope,
    pub kind: ArtifactKind,
    pub pattern: &'static str,
}

impl PathTemplate {
    const fn new(scope: Scope, kind: ArtifactKind, pattern: &'static str) -> Self {
        Self { scope, kind, pattern }
    }

    /// `None` when the identifier cannot be used as a single path component.
    pub fn render(&self, roots: &DiscoveryRoots, identifier: &str) -> Option<PathBuf> {
        if !is_component_safe(identifier) {
            return None;
        }
        let relative = self.pattern.replace("{id}", identifier);
        Some(roots.root(self.scope).join(relative))
    }
}

fn is_component_safe(identifier: &str) -> bool {
    if identifier.is_empty() || identifier.contains(['/', '\0']) {
        return false;
    }
    matches!(
        Path::new(identifier).components().next(),
        Some(Component::Normal(_))
    )
}

use ArtifactKind::*;
use Scope::{System, User};

/// Known places applications leave files behind. Over-inclusive on purpose;
/// discovery keeps only what exists.
pub static TEMPLATES: &[PathTemplate] = &[
    // ~/Library
    PathTemplate::new(User, ApplicationSupport, "Library/Application Support/{id}"),
    PathTemplate::new(User, ApplicationScripts, "Library/Application Scripts/{id}"),
    PathTemplate::new(User, Preferences, "Library/Preferences/{id}.plist"),
    PathTemplate::new(User, Preferences, "Library/Preferences/com.{id}.plist"),
    PathTemplate::new(User, Caches, "Library/Caches/{id}"),
    PathTemplate::new(User, HttpStorage, "Library/HTTPStorages/{id}"),
    PathTemplate::new(User, HttpStorage, "Library/HTTPStorages/{id}.binarycookies"),
    PathTemplate::new(User, Cookies, "Library/Cookies/{id}.binarycookies"),
    PathTemplate::new(User, WebKit, "Library/WebKit/{id}"),
    PathTemplate::new(User, SavedState, "Library/Saved Application State/{id}.savedState"),
    PathTemplate::new(User, Container, "Library/Containers/{id}"),
    PathTemplate::new(User, AppExtension, "Library/Containers/{id}.ThumbnailExtension"),
    PathTemplate::new(User, AppExtension, "Library/Containers/{id}.QuickLookExtension"),
    PathTemplate::new(User, AppExtension, "Library/Containers/{id}.ShareExtension"),
    PathTemplate::new(User, GroupContainer, "Library/Group Containers/{id}"),
    PathTemplate::new(User, Logs, "Library/Logs/{id}"),
    PathTemplate::new(User, LaunchAgent, "Library/LaunchAgents/{id}.plist"),
    PathTemplate::new(User, InputMethod, "Library/Input Methods/{id}.app"),
    PathTemplate::new(User, PreferencePane, "Library/PreferencePanes/{id}.prefPane"),
    PathTemplate::new(User, QuickLook, "Library/QuickLook/{id}.qlgenerator"),
    PathTemplate::new(User, ScreenSaver, "Library/Screen Savers/{id}.saver"),
    PathTemplate::new(User, Service, "Library/Services/{id}.service"),
    PathTemplate::new(User, SpotlightImporter, "Library/Spotlight/{id}.mdimporter"),
    // /Library and friends
    PathTemplate::new(System, ApplicationSupport, "Library/Application Support/{id}"),
    PathTemplate::new(System, Preferences, "Library/Preferences/{id}.plist"),
    PathTemplate::new(System, Caches, "Library/Caches/{id}"),
    PathTemplate::new(System, Logs, "Library/Logs/{id}"),
    PathTemplate::new(System, LaunchAgent, "Library/LaunchAgents/{id}.plist"),
    PathTemplate::new(System, LaunchDaemon, "Library/LaunchDaemons/{id}.plist"),
    PathTemplate::new(System, KernelExtension, "Library/Extensions/{id}.kext"),
    PathTemplate::new(System, InputMethod, "Library/Input Methods/{id}.app"),
    PathTemplate::new(System, PreferencePane, "Library/PreferencePanes/{id}.prefPane"),
    PathTemplate::new(System, QuickLook, "Library/QuickLook/{id}.qlgenerator"),
    PathTemplate::new(System, ScreenSaver, "Library/Screen Savers/{id}.saver"),
    PathTemplate::new(System, Service, "Library/Services/{id}.service"),
    PathTemplate::new(System, SpotlightImporter, "Library/Spotlight/{id}.mdimporter"),
    PathTemplate::new(System, StartupItem, "Library/StartupItems/{id}"),
    PathTemplate::new(System, PrivilegedHelper, "Library/PrivilegedHelperTools/{id}"),
    PathTemplate::new(System, Receipt, "private/var/db/receipts/{id}.bom"),
    PathTemplate::new(System, Receipt, "private/var/db/receipts/{id}.plist"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> DiscoveryRoots {
        DiscoveryRoots {
            home: PathBuf::from("/Users/me"),
            system_root: PathBuf::from("/"),
        }
    }

    #[test]
    fn renders_user_and_system_paths() {
        let caches = PathTemplate::new(User, Caches, "Library/Caches/{id}");
        assert_eq!(
            caches.render(&roots(), "Foo"),
            Some(PathBuf::from("/Users/me/Library/Caches/Foo"))
        );

        let daemon = PathTemplate::new(System, LaunchDaemon, "Library/LaunchDaemons/{id}.plist");
        assert_eq!(
            daemon.render(&roots(), "com.bar.app"),
            Some(PathBuf::from("/Library/LaunchDaemons/com.bar.app.plist"))
        );
    }

    #[test]
    fn rejects_identifiers_that_escape_their_directory() {
        let t = PathTemplate::new(User, Caches, "Library/Caches/{id}");
        for bad in ["", "..", ".", "a/b", "/etc", "nul\0"] {
            assert_eq!(t.render(&roots(), bad), None, "{:?}", bad);
        }
        assert!(t.render(&roots(), "..foo").is_some());
    }

    #[test]
    fn every_template_has_a_placeholder() {
        for t in TEMPLATES {
            assert!(t.pattern.contains("{id}"), "{}", t.pattern);
            assert!(!t.pattern.starts_with('/'), "{}", t.pattern);
        }
    }
}
