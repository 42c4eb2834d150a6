//! Ready-made deciders covering the common restriction policies.

use anyhow::Result;
use async_trait::async_trait;
use path_clean::PathClean;
use regex::Regex;
use std::path::PathBuf;

use crate::decider::{AsyncDecide, AsyncDecider, Decider, ResolveContext};
use crate::types::Decision;

/// Restricts the given pattern. Pattern deciders never attach info.
pub fn matching(pattern: Regex) -> Decider {
    Decider::Pattern(pattern)
}

/// Restricts a package and all of its submodule paths.
///
/// `name` can be e.g. "typescript" or "typescript/lib". Only the exact name
/// or a `/`-separated path beneath it matches: restricting "foo" leaves
/// "foobar" alone, and metacharacters in `name` are taken literally.
pub fn matching_package(name: &str) -> Decider {
    let pattern = format!("^{}(/.*)?$", regex::escape(name));
    // Escaping makes the pattern valid for every package name.
    Decider::Pattern(Regex::new(&pattern).expect("escaped package pattern"))
}

/// Restricts unresolved paths that climb more than `levels` steps upwards in
/// a row, counting consecutive ".." segments after repeated slashes and "."
/// segments are dropped. The attached info reports the count found and the
/// configured maximum.
pub fn climbing_above(levels: usize) -> Decider {
    Decider::Function(Box::new(move |import_path| {
        let climbs = longest_climb(import_path);
        if climbs > levels {
            Decision::restrict_with(format!(
                "found {} {} of \"..\" in a row; at most {} allowed",
                climbs,
                if climbs == 1 { "occurrence" } else { "occurrences" },
                levels,
            ))
        } else {
            Decision::from(false)
        }
    }))
}

/// Restricts paths that resolve into any of `dirs`.
pub fn inside_directories(dirs: Vec<PathBuf>) -> AsyncDecider {
    restricted_when_contained(dirs, true)
}

/// Restricts paths that resolve outside all of `dirs`.
pub fn outside_directories(dirs: Vec<PathBuf>) -> AsyncDecider {
    restricted_when_contained(dirs, false)
}

fn restricted_when_contained(dirs: Vec<PathBuf>, inside: bool) -> AsyncDecider {
    let dirs = dirs.into_iter().map(|d| d.clean()).collect();
    AsyncDecider::Function(Box::new(Containment { dirs, inside }))
}

/// Resolves each path through the host and checks whether the resolved
/// location sits beneath one of the configured directories. `inside` flips
/// which side of the fence is restricted.
struct Containment {
    dirs: Vec<PathBuf>,
    inside: bool,
}

#[async_trait]
impl AsyncDecide for Containment {
    async fn decide(&self, import_path: &str, ctx: &ResolveContext<'_>) -> Result<Decision> {
        let resolved = ctx.resolve(import_path).await?.clean();
        let contained = self.dirs.iter().any(|dir| resolved.starts_with(dir));
        if contained == self.inside {
            Ok(Decision::restrict_with(format!("resolved: {}", resolved.display())))
        } else {
            Ok(Decision::from(false))
        }
    }
}

/// Length of the longest run of consecutive ".." segments in `import_path`.
/// Empty and "." segments disappear first, which also merges repeated
/// slashes, so ".././.." counts as a run of two.
fn longest_climb(import_path: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for segment in import_path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decider::{Resolve, ResolveContext};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::path::Path;

    #[test]
    fn test_matching_package_covers_submodules() {
        let decider = matching_package("typescript");
        assert!(decider.decide("typescript").restricted);
        assert!(decider.decide("typescript/lib").restricted);
        assert!(decider.decide("typescript/lib/index.ts").restricted);
        assert!(!decider.decide("typescript2").restricted);
        assert!(!decider.decide("my-typescript").restricted);
    }

    #[test]
    fn test_matching_package_escapes_metacharacters() {
        let decider = matching_package("foo.bar");
        assert!(decider.decide("foo.bar").restricted);
        assert!(decider.decide("foo.bar/baz").restricted);
        assert!(!decider.decide("fooxbar").restricted);
    }

    #[test]
    fn test_climbing_above_counts_consecutive_segments() {
        let decider = climbing_above(1);
        assert!(decider.decide("../../src/x").restricted);
        assert!(decider.decide("./../../src/loader").restricted);
        assert!(decider.decide(".././../src/loader").restricted);
        assert!(decider.decide("typescript/lib/../../typescript/lib/typescript").restricted);
        assert!(!decider.decide("../src/x").restricted);
        assert!(!decider.decide("./../webpack.config").restricted);
        assert!(!decider.decide("../src/functions").restricted);
        assert!(!decider.decide("typescript").restricted);
        assert!(!decider.decide("./functions").restricted);
    }

    #[test]
    fn test_climbing_above_reports_count_and_maximum() {
        let decision = climbing_above(1).decide("../../src/x");
        let info = decision.info.unwrap();
        assert_eq!(info, "found 2 occurrences of \"..\" in a row; at most 1 allowed");

        let single = climbing_above(0).decide("../x");
        assert_eq!(
            single.info.unwrap(),
            "found 1 occurrence of \"..\" in a row; at most 0 allowed"
        );
    }

    #[test]
    fn test_climbing_above_merges_repeated_slashes() {
        let decider = climbing_above(1);
        assert!(decider.decide("..//../src").restricted);
        assert!(!decider.decide("..//src/..").restricted);
    }

    /// Maps requests to fixed absolute locations, standing in for the host
    /// resolver.
    struct MapResolver(Vec<(&'static str, &'static str)>);

    #[async_trait]
    impl Resolve for MapResolver {
        async fn resolve(&self, _from_dir: &Path, request: &str) -> Result<PathBuf> {
            self.0
                .iter()
                .find(|(req, _)| *req == request)
                .map(|(_, target)| PathBuf::from(target))
                .ok_or_else(|| anyhow::anyhow!("cannot resolve \"{request}\""))
        }
    }

    fn ctx<'a>(resolver: &'a MapResolver) -> ResolveContext<'a> {
        ResolveContext { from_dir: Path::new("/project/src"), resolver }
    }

    #[tokio::test]
    async fn test_inside_directories_restricts_contained_paths() {
        let resolver = MapResolver(vec![
            ("./functions", "/project/src/functions.ts"),
            ("typescript", "/project/node_modules/typescript/lib/typescript.js"),
            ("../core.test", "/project/core.test.ts"),
        ]);
        let decider = inside_directories(vec![
            PathBuf::from("/project/src"),
            PathBuf::from("/project/node_modules"),
        ]);
        let ctx = ctx(&resolver);

        let hit = decider.decide("./functions", &ctx).await.unwrap();
        assert!(hit.restricted);
        assert_eq!(hit.info.as_deref(), Some("resolved: /project/src/functions.ts"));
        assert!(decider.decide("typescript", &ctx).await.unwrap().restricted);
        assert!(!decider.decide("../core.test", &ctx).await.unwrap().restricted);
    }

    #[tokio::test]
    async fn test_outside_directories_restricts_everything_else() {
        let resolver = MapResolver(vec![
            ("./functions", "/project/src/functions.ts"),
            ("../core.test", "/project/core.test.ts"),
        ]);
        let decider = outside_directories(vec![PathBuf::from("/project/src")]);
        let ctx = ctx(&resolver);

        assert!(!decider.decide("./functions", &ctx).await.unwrap().restricted);
        assert!(decider.decide("../core.test", &ctx).await.unwrap().restricted);
    }

    #[tokio::test]
    async fn test_directory_prefix_does_not_leak_across_siblings() {
        // "/project/src-extra" must not count as inside "/project/src".
        let resolver = MapResolver(vec![("./x", "/project/src-extra/x.ts")]);
        let decider = inside_directories(vec![PathBuf::from("/project/src")]);
        assert!(!decider.decide("./x", &ctx(&resolver)).await.unwrap().restricted);
    }

    #[tokio::test]
    async fn test_resolution_failure_propagates() {
        let resolver = MapResolver(vec![]);
        let decider = inside_directories(vec![PathBuf::from("/project/src")]);
        let err = decider.decide("./missing", &ctx(&resolver)).await.unwrap_err();
        assert!(err.to_string().contains("./missing"));
    }
}
