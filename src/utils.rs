use std::fs;
use std::path::Path;

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// File/directory stem for a target domain: `example.com` -> `example_com`.
pub fn target_file_stem(target: &str) -> String {
    target.replace('.', "_")
}

/// Directory name for a host or URL: `https://a.example.com:8443` ->
/// `https___a.example.com_8443`.
pub fn host_dir_name(host: &str) -> String {
    host.replace([':', '/'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_path_safe() {
        assert_eq!(target_file_stem("sub.example.com"), "sub_example_com");
        assert_eq!(host_dir_name("https://a.example.com:8443"), "https___a.example.com_8443");
        assert!(!host_dir_name("http://x/y").contains('/'));
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
