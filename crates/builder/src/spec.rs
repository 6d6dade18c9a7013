//! Minimal package spec file reader
//!
//! Understands the preamble tags that identify a package (`Name`,
//! `Version`, `Release`, `BuildArch`), sub-package declarations, and
//! `%global`/`%define` macros. Everything else in the file is ignored.

use std::collections::HashMap;

/// Identity read from a spec file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecInfo {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: Option<String>,
    /// Every package the spec produces, main package first
    pub packages: Vec<String>,
}

/// Parse spec text
///
/// # Errors
///
/// Returns a message naming the first missing required tag.
pub fn parse_spec(content: &str) -> Result<SpecInfo, String> {
    let mut macros: HashMap<String, String> = HashMap::new();
    let mut name = None;
    let mut version = None;
    let mut release = None;
    let mut arch = None;
    let mut subpackages = Vec::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line
            .strip_prefix("%global")
            .or_else(|| line.strip_prefix("%define"))
        {
            let mut parts = rest.trim().splitn(2, char::is_whitespace);
            if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
                let value = expand(value.trim(), &macros);
                macros.insert(key.to_string(), value);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("%package") {
            subpackages.push(expand(rest.trim(), &macros));
            continue;
        }

        let Some((tag, value)) = line.split_once(':') else {
            continue;
        };
        let value = expand(value.trim(), &macros);
        match tag.trim().to_ascii_lowercase().as_str() {
            "name" if name.is_none() => {
                macros.insert("name".to_string(), value.clone());
                name = Some(value);
            }
            "version" if version.is_none() => {
                macros.insert("version".to_string(), value.clone());
                version = Some(value);
            }
            "release" if release.is_none() => {
                macros.insert("release".to_string(), value.clone());
                release = Some(value);
            }
            "buildarch" if arch.is_none() => arch = Some(value),
            _ => {}
        }
    }

    let name = name.ok_or("missing Name tag")?;
    let version = version.ok_or("missing Version tag")?;
    let release = release.unwrap_or_else(|| "1".to_string());

    let mut packages = vec![name.clone()];
    for decl in subpackages {
        let package = match decl.strip_prefix("-n") {
            Some(full) => full.trim().to_string(),
            None => format!("{name}-{decl}"),
        };
        if !packages.contains(&package) {
            packages.push(package);
        }
    }

    Ok(SpecInfo {
        name,
        version,
        release,
        arch,
        packages,
    })
}

/// Expand `%{name}`, `%name` and `%{?name}` references
///
/// Undefined conditional macros expand to nothing; other undefined macros
/// are left untouched.
#[must_use]
pub fn expand(input: &str, macros: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        if let Some(body) = tail.strip_prefix('{') {
            let Some(end) = body.find('}') else {
                out.push_str(&rest[pos..]);
                return out;
            };
            let inner = &body[..end];
            if let Some(cond) = inner.strip_prefix('?') {
                if let Some(value) = macros.get(cond) {
                    out.push_str(value);
                }
            } else if let Some(value) = macros.get(inner) {
                out.push_str(value);
            } else {
                out.push_str(&rest[pos..pos + 2 + end + 1]);
            }
            rest = &body[end + 1..];
            continue;
        }

        let ident_len = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(tail.len());
        let ident = &tail[..ident_len];
        match macros.get(ident) {
            Some(value) if !ident.is_empty() => out.push_str(value),
            _ => {
                out.push('%');
                out.push_str(ident);
            }
        }
        rest = &tail[ident_len..];
    }

    out.push_str(rest);
    out
}
