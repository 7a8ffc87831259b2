use std::collections::BTreeMap;
use std::fs;
use std::path::Path as FsPath;

use crate::definition::{DefFlags, Definition, DefinitionKind, ExternDef, ScopeDef};
use crate::error::{MixError, MixResult};
use crate::lexical::LexicalSite;
use crate::name::Name;
use crate::reference::RelativeReference;
use crate::value::Value;

/// Filename suffixes recognized as an overlay file, checked
/// case-insensitively, first match wins when a stem has more than one.
const OVERLAY_EXTENSIONS: [&str; 4] = [".overlay.yaml", ".overlay.yml", ".overlay.json", ".overlay.toml"];

/// Loads an overlay directory into a `ScopeDef`: every recognized file
/// becomes one or more extern definitions (or a nested scope, for object
/// values), and every non-dot-prefixed subdirectory becomes a nested
/// scope definition union-mounted at the same name as any file-derived
/// scope — mirroring the directory-adapter's file-plus-subdirectory union
/// at a single key.
pub fn load_directory_scope(dir: &FsPath) -> MixResult<ScopeDef> {
    let site = LexicalSite::root();
    load_directory_scope_at(dir, &site)
}

fn load_directory_scope_at(dir: &FsPath, site: &LexicalSite) -> MixResult<ScopeDef> {
    let mut scope = ScopeDef::new();

    for (stem, path) in discover_overlay_files(dir)? {
        let contents = fs::read_to_string(&path).map_err(|e| MixError::InvalidOverlayFile {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;
        let value = parse_overlay_file(&path, &contents)?;
        push_value_definitions(&mut scope, Name::from(stem.as_str()), value, site);
    }

    for (name, sub_path) in discover_subdirectories(dir)? {
        let nested = load_directory_scope_at(&sub_path, &site.child())?;
        scope.push_child(
            Name::from(name.as_str()),
            Definition::new(DefinitionKind::Scope(nested), DefFlags::default(), site.child()),
        );
    }

    Ok(scope)
}

fn discover_overlay_files(dir: &FsPath) -> MixResult<Vec<(String, std::path::PathBuf)>> {
    let mut by_stem: BTreeMap<String, std::path::PathBuf> = BTreeMap::new();
    let entries = fs::read_dir(dir).map_err(|e| MixError::InvalidOverlayFile {
        path: dir.display().to_string(),
        cause: e.to_string(),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| MixError::InvalidOverlayFile {
            path: dir.display().to_string(),
            cause: e.to_string(),
        })?;
        if !entry.path().is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let lower = file_name.to_string_lossy().to_lowercase();
        if let Some(stem) = OVERLAY_EXTENSIONS
            .iter()
            .find_map(|ext| lower.strip_suffix(ext).map(|s| s.to_string()))
        {
            by_stem.entry(stem).or_insert_with(|| entry.path());
        }
    }
    Ok(by_stem.into_iter().collect())
}

fn discover_subdirectories(dir: &FsPath) -> MixResult<Vec<(String, std::path::PathBuf)>> {
    let mut out = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| MixError::InvalidOverlayFile {
        path: dir.display().to_string(),
        cause: e.to_string(),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| MixError::InvalidOverlayFile {
            path: dir.display().to_string(),
            cause: e.to_string(),
        })?;
        if entry.path().is_dir() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') {
                out.push((name, entry.path()));
            }
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

fn parse_overlay_file(path: &std::path::Path, contents: &str) -> MixResult<serde_json::Value> {
    let lower = path.to_string_lossy().to_lowercase();
    let to_err = |e: String| MixError::InvalidOverlayFile {
        path: path.display().to_string(),
        cause: e,
    };
    if lower.ends_with(".json") {
        serde_json::from_str(contents).map_err(|e| to_err(e.to_string()))
    } else if lower.ends_with(".toml") {
        let toml_value: toml::Value = toml::from_str(contents).map_err(|e| to_err(e.to_string()))?;
        serde_json::to_value(toml_value).map_err(|e| to_err(e.to_string()))
    } else {
        serde_yaml::from_str(contents).map_err(|e| to_err(e.to_string()))
    }
}

/// Turns one overlay file's parsed value into definitions pushed onto
/// `scope` under `name`. An object becomes a nested scope (its own
/// `"$bases"` key, if present, parsed into base references); anything
/// else becomes a single extern default.
fn push_value_definitions(scope: &mut ScopeDef, name: Name, value: serde_json::Value, site: &LexicalSite) {
    match value {
        serde_json::Value::Object(mut map) => {
            let bases = map
                .remove("$bases")
                .and_then(|v| v.as_array().cloned())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .filter_map(|s| parse_relative_reference(s).ok())
                        .collect()
                })
                .unwrap_or_default();
            let mut nested = ScopeDef::new();
            nested.bases = bases;
            for (key, child_value) in map {
                push_value_definitions(&mut nested, Name::from(key.as_str()), child_value, site);
            }
            scope.push_child(name, Definition::new(DefinitionKind::Scope(nested), DefFlags::default(), site.child()));
        }
        other => {
            scope.push_child(
                name,
                Definition::new(
                    DefinitionKind::Extern(ExternDef {
                        default: Some(Value::new(other)),
                    }),
                    DefFlags::default(),
                    site.child(),
                ),
            );
        }
    }
}

/// Parses a base reference written as a run of `^` (one per lexical level
/// to escape) followed by a dotted path, e.g. `^^services.cache` means
/// "go up two scopes, then descend into `services.cache`". This is a
/// deliberately simple convention chosen for the overlay file format,
/// since the directory adapter's own file grammar wasn't available to
/// copy from directly.
fn parse_relative_reference(raw: &str) -> MixResult<RelativeReference> {
    let levels_up = raw.chars().take_while(|&c| c == '^').count() as u32;
    let rest = &raw[levels_up as usize..];
    if rest.is_empty() {
        return Err(MixError::InvalidOverlayFile {
            path: raw.to_string(),
            cause: "base reference has no path after '^' levels".to_string(),
        });
    }
    let path = rest.split('.').map(Name::from).collect::<Vec<_>>();
    Ok(RelativeReference::new(levels_up, path))
}
