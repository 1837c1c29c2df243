//! Build metadata for version output and the outbound `User-Agent`.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit SHA at build time, or "unknown" if unavailable.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Whether the working tree was dirty at build time.
pub fn git_dirty() -> bool {
    option_env!("VERGEN_GIT_DIRTY") == Some("true")
}

// Outside a checkout vergen emits a placeholder instead of failing the build.
fn has_git_sha() -> bool {
    GIT_SHA != "unknown" && !GIT_SHA.starts_with("VERGEN")
}

/// `{version}`, or `{version}+{sha}[.dirty]` when built from git.
pub fn version_string() -> String {
    if !has_git_sha() {
        return PKG_VERSION.to_string();
    }
    let dirty = if git_dirty() { ".dirty" } else { "" };
    format!("{PKG_VERSION}+{}{dirty}", &GIT_SHA[..7.min(GIT_SHA.len())])
}

/// `User-Agent` sent to every provider.
pub fn user_agent() -> String {
    format!("detector-gateway/{}", version_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_pkg_version() {
        assert!(version_string().starts_with(PKG_VERSION));
    }

    #[test]
    fn user_agent_names_the_crate() {
        let ua = user_agent();
        assert!(ua.starts_with("detector-gateway/"));
        assert!(ua.contains(PKG_VERSION));
    }
}
