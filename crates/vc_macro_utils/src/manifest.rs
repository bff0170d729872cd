use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// The caller's `Cargo.toml`, used to find how a workspace crate is
/// reachable from the code a derive emits.
///
/// # Example
///
/// ```rust
/// # use vc_macro_utils::Manifest;
/// let p: syn::Path = Manifest::shared(|m| m.get_crate_path("vc_proto"));
/// ```
///
/// # Resolution rules
///
/// 1. A dependency named `name`, or renamed from it with `package = "name"`,
///    resolves to `::key`.
/// 2. For `vc_*` crates, a dependency on the `vc_wire` facade resolves to
///    `::vc_wire::short_name` (e.g. `vc_proto` -> `::vc_wire::proto`).
/// 3. Steps 1-2 are repeated for `dev-dependencies`.
/// 4. Otherwise `::name`.
///
/// A crate that derives on its own types needs
/// `extern crate self as vc_proto;` for rule 4 to hold.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Document<Box<str>>,
    pub modified_time: SystemTime,
}

const FACADE_NAME: &str = "vc_wire";
const WORKSPACE_PREFIX: &str = "vc_";

impl Manifest {
    #[inline(never)]
    fn get_manifest_path() -> PathBuf {
        env::var_os("CARGO_MANIFEST_DIR")
            .map(|path| {
                let mut path = PathBuf::from(path);
                path.push("Cargo.toml");
                assert!(
                    path.exists(),
                    "Cargo manifest does not exist at path {}",
                    path.display(),
                );
                path
            })
            .expect("CARGO_MANIFEST_DIR should be auto-defined by cargo.")
    }

    #[inline(never)]
    fn get_manifest_modified_time(path: &Path) -> Result<SystemTime, std::io::Error> {
        std::fs::metadata(path).and_then(|metadata| metadata.modified())
    }

    #[inline(never)]
    fn read_manifest(path: &Path) -> Document<Box<str>> {
        let manifest = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Unable to read cargo manifest: {}", path.display()))
            .into_boxed_str();
        Document::parse(manifest)
            .unwrap_or_else(|_| panic!("Failed to parse cargo manifest: {}", path.display()))
    }

    #[inline]
    fn parse_str<T: syn::parse::Parse>(path: &str) -> T {
        syn::parse_str(path).unwrap_or_else(|_| panic!("`{path}` is not a valid path"))
    }

    // The key under which `name` is depended on, following `package` renames.
    fn dependency_key<'t>(deps: &'t Table, name: &str) -> Option<&'t str> {
        if let Some((key, _)) = deps.get_key_value(name) {
            return Some(key.get());
        }
        deps.iter().find_map(|(key, item)| {
            let package = item.get("package")?.as_str()?;
            (package == name).then_some(key)
        })
    }

    fn find_in_deps(deps: &Table, name: &str) -> Option<syn::Path> {
        if let Some(key) = Self::dependency_key(deps, name) {
            return Some(Self::parse_str(&format!("::{key}")));
        }
        let module = name.strip_prefix(WORKSPACE_PREFIX)?;
        let facade = Self::dependency_key(deps, FACADE_NAME)?;
        let mut path = Self::parse_str::<syn::Path>(&format!("::{facade}"));
        path.segments.push(Self::parse_str(module));
        Some(path)
    }

    /// The path of the crate called `name` as seen from the caller.
    #[inline(never)]
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        ["dependencies", "dev-dependencies"]
            .into_iter()
            .find_map(|table| match self.manifest.get(table) {
                Some(Item::Table(deps)) => Self::find_in_deps(deps, name),
                _ => None,
            })
            .unwrap_or_else(|| Self::parse_str(&format!("::{name}")))
    }

    /// Runs `func` on the caller's manifest, read once per modification.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let manifest_path = Self::get_manifest_path();
        let modified_time = Self::get_manifest_modified_time(&manifest_path)
            .expect("The Cargo.toml should have a modified time.");

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(manifest) = manifests.get(&manifest_path)
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }
        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read_manifest(&manifest_path),
            modified_time,
        };
        let result = func(&manifest);
        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(manifest_path, manifest);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(text: &str) -> Manifest {
        Manifest {
            manifest: Document::parse(text.to_owned().into_boxed_str()).unwrap(),
            modified_time: SystemTime::UNIX_EPOCH,
        }
    }

    fn path_string(path: &syn::Path) -> String {
        path.segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect::<Vec<_>>()
            .join("::")
    }

    #[test]
    fn direct_dependency() {
        let m = manifest("[dependencies]\nvc_proto = \"0.0.1\"\n");
        assert_eq!(path_string(&m.get_crate_path("vc_proto")), "vc_proto");
    }

    #[test]
    fn renamed_dependency() {
        let m = manifest("[dependencies]\nproto = { package = \"vc_proto\", version = \"0.0.1\" }\n");
        assert_eq!(path_string(&m.get_crate_path("vc_proto")), "proto");
    }

    #[test]
    fn through_facade() {
        let m = manifest("[dev-dependencies]\nvc_wire = { path = \"..\" }\n");
        assert_eq!(path_string(&m.get_crate_path("vc_proto")), "vc_wire::proto");
    }

    #[test]
    fn fallback() {
        let m = manifest("[package]\nname = \"demo\"\n");
        assert_eq!(path_string(&m.get_crate_path("vc_proto")), "vc_proto");
    }
}
