//! Asset categorization and the rules shared by every import path.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::path::Path;

use crate::ir::AssetImport;

/// Duration recorded for imports whose timing never appears in the log.
pub const PLACEHOLDER_SECONDS: f64 = 0.001;

/// Importers whose timing is reported on a later line.
pub const MULTI_LINE_IMPORTERS: &[&str] = &["VideoClipImporter", "AudioImporter", "MovieImporter"];

const UNKNOWN_IMPORTER: &str = "UnknownImporter";
const TEXTURE_IMPORTER: &str = "TextureImporter";

lazy_static! {
    /// Lower-cased extension (without dot) to asset category.
    static ref CATEGORIES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        for ext in ["shader", "compute", "cginc", "hlsl"] {
            m.insert(ext, "Rendering");
        }
        for ext in ["png", "jpg", "jpeg", "tga", "psd", "exr", "hdr", "tif", "tiff", "bmp"] {
            m.insert(ext, "Textures");
        }
        for ext in ["fbx", "obj", "blend"] {
            m.insert(ext, "3D Models");
        }
        m.insert("mat", "Materials");
        m.insert("prefab", "Prefabs");
        m.insert("unity", "Scenes");
        m.insert("asset", "Scriptable Objects");
        m.insert("controller", "Animation");
        m.insert("anim", "Animation");
        m.insert("physicmaterial", "Physics");
        m.insert("cs", "Scripts");
        m.insert("js", "Scripts");
        m.insert("dll", "Assemblies");
        m.insert("asmdef", "Assemblies");
        m.insert("ttf", "Fonts");
        m.insert("otf", "Fonts");
        for ext in ["wav", "mp3", "ogg"] {
            m.insert(ext, "Audio");
        }
        m
    };

    /// Importer assumed when the log never names one.
    static ref IMPORTERS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("fbx", "FBXImporter");
        for ext in ["png", "jpg", "jpeg", "exr", "tga", "hdr", "tif", "tiff", "bmp"] {
            m.insert(ext, TEXTURE_IMPORTER);
        }
        m.insert("mat", "NativeFormatImporter");
        m.insert("anim", "NativeFormatImporter");
        m.insert("controller", "NativeFormatImporter");
        m.insert("prefab", "PrefabImporter");
        for ext in ["mp4", "mov", "avi", "webm", "m4v", "mpg", "mpeg"] {
            m.insert(ext, "VideoClipImporter");
        }
        for ext in ["wav", "mp3", "ogg", "aif", "aiff", "flac"] {
            m.insert(ext, "AudioImporter");
        }
        m
    };
}

/// Evidence of one import, possibly still waiting for its timing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportEvidence {
    pub path: String,
    pub guid: String,
    pub line: u32,
    pub importer: Option<String>,
}

/// Lower-cased extension; a trailing bare dot counts as none.
fn extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

fn final_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns the granular type label and the coarse category of an asset.
///
/// Extensions match case-insensitively. An explicit `TextureImporter` forces
/// the `Textures` category whatever the extension says.
pub fn categorize(path: &str, importer: Option<&str>) -> (String, String) {
    let ext = extension(path);
    let asset_type = match &ext {
        Some(ext) => format!(".{ext}"),
        None => "no-extension".to_string(),
    };
    let category = if importer == Some(TEXTURE_IMPORTER) {
        "Textures"
    } else {
        ext.as_deref()
            .and_then(|ext| CATEGORIES.get(ext).copied())
            .unwrap_or("Other")
    };
    (asset_type, category.to_string())
}

/// Importer implied by the file extension.
pub fn infer_importer(path: &str) -> String {
    extension(path)
        .as_deref()
        .and_then(|ext| IMPORTERS.get(ext).copied())
        .unwrap_or(UNKNOWN_IMPORTER)
        .to_string()
}

/// Rejects paths that are folders rather than assets.
///
/// Package folders such as `Packages/com.unity.foo` look like files because
/// of their dots; anything else without an extension is a directory.
pub fn is_folder_like(path: &str) -> bool {
    let last = final_segment(path);
    let package_folder = last.starts_with("com.") && path.matches('/').count() <= 2;
    package_folder || !last.contains('.')
}

/// Normalizes an importer token, dropping the invalid `-1` sentinel.
pub fn normalize_importer(raw: &str) -> Option<String> {
    let token = raw.trim();
    let token = if token.starts_with('(') && token.ends_with(')') {
        token.trim_matches(|c: char| c == '(' || c == ')')
    } else if token.starts_with("Importer(") {
        if token.contains("-1") {
            return None;
        }
        "Importer"
    } else {
        token
    };
    let token = token.trim();
    if token.is_empty() || token == "-1" {
        None
    } else {
        Some(token.to_string())
    }
}

/// Builds the import record, or `None` when the skip rules reject the path.
pub fn resolve(evidence: ImportEvidence, artifact_id: Option<String>, seconds: f64) -> Option<AssetImport> {
    if is_folder_like(&evidence.path) {
        log::debug!(
            "Skipping folder-like import {:?} at line {}",
            evidence.path,
            evidence.line
        );
        return None;
    }
    let (asset_type, category) = categorize(&evidence.path, evidence.importer.as_deref());
    let name = Path::new(&evidence.path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| evidence.path.clone());
    Some(AssetImport {
        line: evidence.line,
        name,
        asset_type,
        category,
        guid: evidence.guid,
        artifact_id,
        importer: evidence.importer,
        seconds,
        ms: seconds * 1000.0,
        path: evidence.path,
    })
}
