use std::{
    fs, io,
    path::{Path, PathBuf},
};

use uuid::Uuid;

/// Opaque image blob storage. Records keep only the names handed out by `save`.
pub trait AssetStore: Send + Sync {
    fn save(&self, bytes: &[u8], name_hint: &str) -> io::Result<String>;

    fn load(&self, name: &str) -> Option<Vec<u8>>;

    /// Removing a missing asset is not an error.
    fn delete(&self, name: &str) -> io::Result<()>;
}

/// Assets as `<hint>_<uuid>.jpg` files in one directory.
#[derive(Debug, Clone)]
pub struct AssetDir {
    dir: PathBuf,
}

impl AssetDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        if !is_plain_name(name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid asset name: {name:?}"),
            ));
        }
        Ok(self.dir.join(name))
    }
}

impl AssetStore for AssetDir {
    fn save(&self, bytes: &[u8], name_hint: &str) -> io::Result<String> {
        fs::create_dir_all(&self.dir)?;

        let name = format!("{}_{}.jpg", sanitize_hint(name_hint), Uuid::new_v4());
        fs::write(self.dir.join(&name), bytes)?;

        tracing::debug!(asset = %name, bytes = bytes.len(), "saved asset");
        Ok(name)
    }

    fn load(&self, name: &str) -> Option<Vec<u8>> {
        let path = self.path_for(name).ok()?;
        fs::read(path).ok()
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn sanitize_hint(hint: &str) -> String {
    let out: String = hint
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    if out.is_empty() {
        "image".to_string()
    } else {
        out
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn save_load_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetDir::new(tmp.path().join("menu_images"));

        let name = assets.save(b"jpeg bytes", "main").unwrap();
        assert!(name.starts_with("main_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(assets.load(&name).as_deref(), Some(&b"jpeg bytes"[..]));

        assets.delete(&name).unwrap();
        assert_eq!(assets.load(&name), None);
        assets.delete(&name).unwrap();
    }

    #[test]
    fn names_are_unique_per_save() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetDir::new(tmp.path());

        let a = assets.save(b"x", "main").unwrap();
        let b = assets.save(b"x", "main").unwrap();
        assert_ne!(a, b);
    }

    #[rstest]
    #[case("main", "main")]
    #[case("additional_0", "additional_0")]
    #[case("../../etc", "______etc")]
    #[case("  ", "image")]
    fn hints_are_sanitized(#[case] hint: &str, #[case] expected: &str) {
        assert_eq!(sanitize_hint(hint), expected);
    }

    #[rstest]
    #[case("../secret.jpg")]
    #[case("a/b.jpg")]
    #[case("..")]
    #[case("")]
    fn path_like_names_are_rejected(#[case] name: &str) {
        let tmp = tempfile::tempdir().unwrap();
        let assets = AssetDir::new(tmp.path());

        assert_eq!(assets.load(name), None);
        assert_eq!(
            assets.delete(name).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }
}
