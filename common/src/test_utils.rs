use std::path::PathBuf;
use std::sync::OnceLock;

/// Workspace root, one level above the calling crate's manifest.
fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// Directory where tests drop artifacts worth looking at by eye
/// (rendered previews, exported tables). Created on first use.
pub fn test_output_dir() -> PathBuf {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = workspace_root().join("test_output");
        std::fs::create_dir_all(&dir).expect("Failed to create test_output directory");
        dir
    })
    .clone()
}

/// Path of a named artifact inside [`test_output_dir`].
pub fn test_output_path(name: &str) -> PathBuf {
    test_output_dir().join(name)
}
