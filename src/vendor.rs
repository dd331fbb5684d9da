use crate::error::{GitpertError, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use regex::RegexSet;

/// Decides whether a repository-relative path is third-party code.
pub trait VendorClassifier {
    fn is_vendor(&self, path: &str) -> bool;
}

impl<F> VendorClassifier for F
where
    F: Fn(&str) -> bool,
{
    fn is_vendor(&self, path: &str) -> bool {
        self(path)
    }
}

// Modelled on the linguist vendor list.
const VENDOR_PATTERNS: &[&str] = &[
    r"(^|/)cache/",
    r"^[Dd]ependencies/",
    r"(^|/)dist/",
    r"^deps/",
    r"(^|/)configure$",
    r"(^|/)config\.guess$",
    r"(^|/)config\.sub$",
    r"(^|/)aclocal\.m4",
    r"(^|/)libtool\.m4",
    r"(^|/)ltoptions\.m4",
    r"(^|/)ltsugar\.m4",
    r"(^|/)ltversion\.m4",
    r"(^|/)lt~obsolete\.m4",
    r"(^|/)node_modules/",
    r"(^|/)bower_components/",
    r"(^|/)\.yarn/(releases|plugins|sdks|versions|unplugged|cache)/",
    r"\.min\.(js|css)$",
    r"([^\s]*)import\.(css|less|scss|styl)$",
    r"(^|/)bootstrap([^.]*)\.(js|css|less|scss|styl)$",
    r"(^|/)font-?awesome\.(css|less|scss|styl)$",
    r"(^|/)jquery([^.]*)\.js$",
    r"(^|/)jquery\-\d\.\d+(\.\d+)?\.js$",
    r"(^|/)jquery\-ui(\-\d\.\d+(\.\d+)?)?(\.\w+)?\.(js|css)$",
    r"(^|/)modernizr\-\d\.\d+(\.\d+)?\.js$",
    r"(^|/)[Vv]+endor/",
    r"(^|/)[Tt]hird[-_]?[Pp]arty/",
    r"(^|/)extern(al)?/",
    r"(^|/)Godeps/_workspace/",
    r"(^|/)Carthage/",
    r"(^|/)Pods/",
    r"(^|/)\.google_apis/",
    r"(^|/)gradlew(\.bat)?$",
    r"(^|/)gradle/wrapper/",
    r"(^|/)mvnw(\.cmd)?$",
    r"(^|/)\.mvn/wrapper/",
    r"(^|/)[Pp]ackages/.+\.\d+/",
];

/// Built-in vendor rules plus optional user-supplied gitignore-style globs.
pub struct VendorPaths {
    builtin: Option<RegexSet>,
    excludes: Gitignore,
}

impl VendorPaths {
    pub fn new(builtin: bool, excludes: &[String]) -> Result<Self> {
        let builtin = if builtin {
            Some(
                RegexSet::new(VENDOR_PATTERNS)
                    .map_err(|e| GitpertError::Config(format!("vendor patterns: {e}")))?,
            )
        } else {
            None
        };

        let mut builder = GitignoreBuilder::new("");
        for glob in excludes {
            builder
                .add_line(None, glob)
                .map_err(|e| GitpertError::Config(format!("invalid exclude glob '{glob}': {e}")))?;
        }
        let excludes = builder
            .build()
            .map_err(|e| GitpertError::Config(format!("invalid exclude globs: {e}")))?;

        Ok(Self { builtin, excludes })
    }

    /// Classifier with the built-in rules and no extra excludes.
    pub fn builtin() -> Result<Self> {
        Self::new(true, &[])
    }
}

impl VendorClassifier for VendorPaths {
    fn is_vendor(&self, path: &str) -> bool {
        if self.builtin.as_ref().is_some_and(|set| set.is_match(path)) {
            return true;
        }
        !self.excludes.is_empty()
            && self
                .excludes
                .matched_path_or_any_parents(path, false)
                .is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_flag_common_vendor_trees() {
        let vendor = VendorPaths::builtin().unwrap();
        for path in [
            "vendor/github.com/pkg/errors/errors.go",
            "web/node_modules/left-pad/index.js",
            "static/js/app.min.js",
            "third_party/zlib/inflate.c",
            "lib/jquery-3.4.1.js",
            "ios/Pods/Alamofire/Source/Session.swift",
        ] {
            assert!(vendor.is_vendor(path), "{path} should be vendor");
        }
    }

    #[test]
    fn builtin_rules_leave_project_sources_alone() {
        let vendor = VendorPaths::builtin().unwrap();
        for path in ["src/main.rs", "pkg/score/score.go", "README.md", "docs/vendoring.md"] {
            assert!(!vendor.is_vendor(path), "{path} should not be vendor");
        }
    }

    #[test]
    fn exclude_globs_extend_the_builtin_list() {
        let vendor = VendorPaths::new(true, &["*.pb.go".to_string(), "generated/".to_string()])
            .unwrap();
        assert!(vendor.is_vendor("api/service.pb.go"));
        assert!(vendor.is_vendor("generated/schema/types.rs"));
        assert!(!vendor.is_vendor("api/service.go"));
    }

    #[test]
    fn builtin_rules_can_be_disabled() {
        let vendor = VendorPaths::new(false, &["docs/".to_string()]).unwrap();
        assert!(!vendor.is_vendor("vendor/lib.go"));
        assert!(vendor.is_vendor("docs/index.md"));
    }

    #[test]
    fn closures_are_classifiers() {
        let only_tests = |path: &str| path.starts_with("tests/");
        assert!(only_tests.is_vendor("tests/cli.rs"));
        assert!(!only_tests.is_vendor("src/lib.rs"));
    }
}
