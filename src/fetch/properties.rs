//! Properties payload handed to the build tool

use crate::dependency::merge::has_scheme;
use crate::error::{AarsyncError, AarsyncResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const ANDROID_HOME: &str = "ANDROID_HOME";
pub const TARGET_DIR: &str = "TARGET_DIR";
pub const MAVEN_REPOS: &str = "MAVEN_REPOS";
pub const PACKAGES_TO_COPY: &str = "PACKAGES_TO_COPY";
pub const USE_JETIFIER: &str = "USE_JETIFIER";
pub const DATA_BINDING_VERSION: &str = "DATA_BINDING_VERSION";
pub const PROPERTIES_FILE: &str = "PROPERTIES_FILE";

/// Inputs of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchProperties {
    pub sdk_root: PathBuf,
    pub target_dir: PathBuf,
    pub repositories: Vec<String>,
    pub packages: Vec<String>,
    pub jetifier: bool,
    pub data_binding_version: String,
}

impl FetchProperties {
    /// Key/value pairs in a stable order, values unescaped
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (ANDROID_HOME, path_value(&self.sdk_root)),
            (TARGET_DIR, path_value(&self.target_dir)),
            (MAVEN_REPOS, self.repositories.join(";")),
            (PACKAGES_TO_COPY, self.packages.join(";")),
            (USE_JETIFIER, self.jetifier.to_string()),
            (DATA_BINDING_VERSION, self.data_binding_version.clone()),
        ]
    }

    /// Java properties file content
    pub fn render(&self) -> String {
        self.entries()
            .into_iter()
            .map(|(key, value)| format!("{}={}\n", key, escape_value(&value)))
            .collect()
    }

    /// `-PKEY=value` overrides, including the properties file location
    pub fn overrides(&self, properties_file: &Path) -> Vec<String> {
        let mut args: Vec<String> = self
            .entries()
            .into_iter()
            .map(|(key, value)| format!("-P{}={}", key, value))
            .collect();
        args.push(format!("-P{}={}", PROPERTIES_FILE, path_value(properties_file)));
        args
    }

    pub fn write(&self, path: &Path) -> AarsyncResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AarsyncError::io(format!("creating {}", parent.display()), e))?;
        }
        fs::write(path, self.render())
            .map_err(|e| AarsyncError::io(format!("writing {}", path.display()), e))
    }
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Escape a property value. `:` is kept inside URI tokens of a
/// semicolon-separated list and escaped elsewhere.
pub fn escape_value(value: &str) -> String {
    value
        .split(';')
        .map(|token| {
            let keep_colon = has_scheme(token);
            let mut escaped = String::with_capacity(token.len());
            for c in token.chars() {
                match c {
                    '\\' => escaped.push_str("\\\\"),
                    '=' => escaped.push_str("\\="),
                    '#' => escaped.push_str("\\#"),
                    '!' => escaped.push_str("\\!"),
                    '\n' => escaped.push_str("\\n"),
                    ':' if !keep_colon => escaped.push_str("\\:"),
                    c => escaped.push(c),
                }
            }
            escaped
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties() -> FetchProperties {
        FetchProperties {
            sdk_root: PathBuf::from("/opt/sdk"),
            target_dir: PathBuf::from("/proj/Assets/Plugins/Android"),
            repositories: vec![
                "https://maven.google.com/".into(),
                "file:///proj/Assets/repo".into(),
            ],
            packages: vec!["com.a:b:1.0".into(), "com.c:d:+".into()],
            jetifier: false,
            data_binding_version: "3.4.0".into(),
        }
    }

    #[test]
    fn uri_colons_preserved() {
        assert_eq!(
            escape_value("https://a.com/x;file:///b"),
            "https://a.com/x;file:///b"
        );
        assert_eq!(escape_value("com.a:b:1.0"), "com.a\\:b\\:1.0");
        assert_eq!(escape_value("a=b#c!d\\e"), "a\\=b\\#c\\!d\\\\e");
        assert_eq!(escape_value("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn render_payload() {
        let rendered = properties().render();
        assert!(rendered.contains("ANDROID_HOME=/opt/sdk\n"));
        assert!(rendered.contains("MAVEN_REPOS=https://maven.google.com/;file:///proj/Assets/repo\n"));
        assert!(rendered.contains("PACKAGES_TO_COPY=com.a\\:b\\:1.0;com.c\\:d\\:+\n"));
        assert!(rendered.contains("USE_JETIFIER=false\n"));
        assert!(rendered.contains("DATA_BINDING_VERSION=3.4.0\n"));
    }

    #[test]
    fn overrides_are_unescaped() {
        let args = properties().overrides(Path::new("/proj/Temp/resolve.properties"));
        assert!(args.contains(&"-PPACKAGES_TO_COPY=com.a:b:1.0;com.c:d:+".to_string()));
        assert_eq!(
            args.last().unwrap(),
            "-PPROPERTIES_FILE=/proj/Temp/resolve.properties"
        );
    }
}
