//! Platform tokens for release assets.
//!
//! An asset's token is derived from its file name alone: `win32`, `darwin` or
//! `linux`, optionally followed by an architecture (`darwin-arm64`). Update
//! metadata files get no token and never match.

use crate::release::Asset;

const IGNORED_NAMES: &[&str] = &["releases"];
const IGNORED_SUFFIXES: &[&str] = &[
    ".blockmap", ".yml", ".yaml", ".sha256", ".sha512", ".sig", ".asc", ".txt", ".json",
];

// (platform, name words, file extensions)
const PLATFORMS: &[(&str, &[&str], &[&str])] = &[
    ("darwin", &["darwin", "mac", "macos", "osx"], &[".dmg", ".pkg"]),
    ("win32", &["win", "win32", "win64", "windows"], &[".exe", ".msi"]),
    ("linux", &["linux"], &[".appimage", ".deb", ".rpm", ".snap"]),
];

const ARCHES: &[(&str, &[&str])] = &[
    ("x64", &["x64", "amd64"]),
    ("arm64", &["arm64", "aarch64"]),
    ("ia32", &["ia32", "x86", "i386", "i686"]),
];

fn words(name: &str) -> Vec<String> {
    name.to_ascii_lowercase()
        .replace("x86_64", "x64")
        .replace("x86-64", "x64")
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn platform_alias(word: &str) -> Option<&'static str> {
    PLATFORMS
        .iter()
        .find(|(_, aliases, _)| aliases.contains(&word))
        .map(|(platform, _, _)| *platform)
}

fn arch_alias(word: &str) -> Option<&'static str> {
    ARCHES
        .iter()
        .find(|(_, aliases)| aliases.contains(&word))
        .map(|(arch, _)| *arch)
}

pub fn derive_platform_token(name: &str) -> Option<String> {
    let lower = name.to_ascii_lowercase();
    if IGNORED_NAMES.contains(&lower.as_str())
        || IGNORED_SUFFIXES.iter().any(|s| lower.ends_with(s))
    {
        return None;
    }

    let words = words(name);
    let platform = words
        .iter()
        .find_map(|w| platform_alias(w))
        .or_else(|| {
            PLATFORMS
                .iter()
                .find(|(_, _, exts)| exts.iter().any(|e| lower.ends_with(e)))
                .map(|(platform, _, _)| *platform)
        })?;

    match words.iter().find_map(|w| arch_alias(w)) {
        Some(arch) => Some(format!("{}-{}", platform, arch)),
        None => Some(platform.to_string()),
    }
}

/// Lowercase a requested platform and fold aliases (`mac`, `windows`,
/// `osx-x86_64`, ...) onto canonical tokens. Unknown tokens pass through.
pub fn canonical_platform(requested: &str) -> String {
    let lower = requested.trim().to_ascii_lowercase();
    let (head, tail) = match lower.split_once('-') {
        Some((head, tail)) => (head, Some(tail)),
        None => (lower.as_str(), None),
    };
    let Some(platform) = platform_alias(head) else {
        return lower;
    };
    match tail {
        Some(tail) => {
            let tail = tail.replace('_', "-");
            let arch = match tail.as_str() {
                "x86-64" => "x64",
                other => arch_alias(other).unwrap_or(other),
            };
            format!("{}-{}", platform, arch)
        }
        None => platform.to_string(),
    }
}

/// The first asset, in upstream order, whose token starts with the requested
/// platform.
pub fn match_asset<'a>(assets: &'a [Asset], platform: &str) -> Option<&'a Asset> {
    let requested = canonical_platform(platform);
    if requested.is_empty() {
        return None;
    }
    assets.iter().find(|asset| {
        asset
            .platform_token
            .as_deref()
            .is_some_and(|token| token.starts_with(&requested))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> Asset {
        Asset::new(name, &format!("https://example.com/{}", name))
    }

    #[test]
    fn test_derive_from_words() {
        assert_eq!(derive_platform_token("App-1.0.0-mac.zip").as_deref(), Some("darwin"));
        assert_eq!(derive_platform_token("app-darwin-x64.zip").as_deref(), Some("darwin-x64"));
        assert_eq!(derive_platform_token("App_osx_arm64.tar.gz").as_deref(), Some("darwin-arm64"));
        assert_eq!(derive_platform_token("app-win32-ia32.zip").as_deref(), Some("win32-ia32"));
        assert_eq!(derive_platform_token("app-windows-x86_64.zip").as_deref(), Some("win32-x64"));
        assert_eq!(derive_platform_token("app-linux-amd64.tar.gz").as_deref(), Some("linux-x64"));
    }

    #[test]
    fn test_derive_from_extensions() {
        assert_eq!(derive_platform_token("App-Setup-1.0.0.exe").as_deref(), Some("win32"));
        assert_eq!(derive_platform_token("App-1.0.0.msi").as_deref(), Some("win32"));
        assert_eq!(derive_platform_token("App-1.0.0-arm64.dmg").as_deref(), Some("darwin-arm64"));
        assert_eq!(derive_platform_token("App-1.0.0.AppImage").as_deref(), Some("linux"));
        assert_eq!(derive_platform_token("app_1.0.0_amd64.deb").as_deref(), Some("linux-x64"));
    }

    #[test]
    fn test_darwin_is_not_windows() {
        // "darwin" contains "win" but only whole words count.
        assert_eq!(derive_platform_token("app-darwin.zip").as_deref(), Some("darwin"));
        assert_eq!(derive_platform_token("winget-helper.zip").as_deref(), None);
    }

    #[test]
    fn test_metadata_files_have_no_token() {
        for name in [
            "RELEASES",
            "latest.yml",
            "latest-mac.yml",
            "App-Setup-1.0.0.exe.blockmap",
            "App-1.0.0-mac.zip.sha256",
            "checksums.txt",
            "source.tar.gz",
        ] {
            assert_eq!(derive_platform_token(name), None, "{}", name);
        }
    }

    #[test]
    fn test_derivation_is_case_insensitive_and_stable() {
        assert_eq!(
            derive_platform_token("APP-MAC.ZIP"),
            derive_platform_token("app-mac.zip")
        );
        assert_eq!(
            derive_platform_token("App-Setup.exe"),
            derive_platform_token("App-Setup.exe")
        );
    }

    #[test]
    fn test_canonical_platform() {
        assert_eq!(canonical_platform("Win32"), "win32");
        assert_eq!(canonical_platform("windows"), "win32");
        assert_eq!(canonical_platform("mac"), "darwin");
        assert_eq!(canonical_platform("osx-x86_64"), "darwin-x64");
        assert_eq!(canonical_platform("darwin-aarch64"), "darwin-arm64");
        assert_eq!(canonical_platform("linux-x64"), "linux-x64");
        assert_eq!(canonical_platform("notaplatform"), "notaplatform");
    }

    #[test]
    fn test_arch_aliases() {
        assert_eq!(derive_platform_token("app-linux-aarch64.tar.gz").as_deref(), Some("linux-arm64"));
        assert_eq!(derive_platform_token("app-win-i686.zip").as_deref(), Some("win32-ia32"));
        assert_eq!(derive_platform_token("app-darwin-amd64.zip").as_deref(), Some("darwin-x64"));
        assert_eq!(canonical_platform("win32-x86"), "win32-ia32");
        assert_eq!(canonical_platform("linux-amd64"), "linux-x64");
        assert_eq!(canonical_platform("darwin-riscv64"), "darwin-riscv64");
    }

    #[test]
    fn test_match_first_in_upstream_order() {
        let assets = vec![
            asset("App-Setup-1.0.0.exe"),
            asset("App-1.0.0-mac.zip"),
            asset("App-1.0.0-arm64.dmg"),
            asset("App-1.0.0.AppImage"),
        ];
        assert_eq!(match_asset(&assets, "win32").unwrap().name, "App-Setup-1.0.0.exe");
        assert_eq!(match_asset(&assets, "darwin").unwrap().name, "App-1.0.0-mac.zip");
        assert_eq!(match_asset(&assets, "DARWIN").unwrap().name, "App-1.0.0-mac.zip");
        assert_eq!(match_asset(&assets, "darwin-arm64").unwrap().name, "App-1.0.0-arm64.dmg");
        assert_eq!(match_asset(&assets, "mac").unwrap().name, "App-1.0.0-mac.zip");
        assert_eq!(match_asset(&assets, "linux").unwrap().name, "App-1.0.0.AppImage");
    }

    #[test]
    fn test_no_match() {
        let assets = vec![asset("App-Setup-1.0.0.exe"), asset("RELEASES")];
        assert!(match_asset(&assets, "notaplatform").is_none());
        assert!(match_asset(&assets, "darwin").is_none());
        assert!(match_asset(&assets, "").is_none());
        assert!(match_asset(&[], "win32").is_none());
    }
}
