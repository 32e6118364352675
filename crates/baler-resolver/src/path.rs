//! Pure path helpers over `/`-separated absolute paths.

/// Directory part of a path, without the trailing slash (`"/"` for files in
/// the root).
#[must_use]
pub fn dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => ".",
    }
}

/// Final component of a path.
#[must_use]
pub fn base(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Extension including the dot, or `""`.
#[must_use]
pub fn ext(path: &str) -> &str {
    let base = base(path);
    match base.rfind('.') {
        Some(0) | None => "",
        Some(i) => &base[i..],
    }
}

/// Join a directory and a relative path, resolving `.` and `..` segments.
#[must_use]
pub fn join(dir: &str, rel: &str) -> String {
    let mut segments: Vec<&str> = if rel.starts_with('/') {
        Vec::new()
    } else {
        dir.split('/').filter(|s| !s.is_empty()).collect()
    };
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let mut out = String::with_capacity(rel.len() + dir.len());
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_and_base() {
        assert_eq!(dir("/a/b/c.js"), "/a/b");
        assert_eq!(dir("/c.js"), "/");
        assert_eq!(base("/a/b/c.js"), "c.js");
    }

    #[test]
    fn ext_handles_dotfiles() {
        assert_eq!(ext("/a/b.js"), ".js");
        assert_eq!(ext("/a/.hidden"), "");
        assert_eq!(ext("/a/noext"), "");
    }

    #[test]
    fn join_resolves_dots() {
        assert_eq!(join("/a/b", "./c.js"), "/a/b/c.js");
        assert_eq!(join("/a/b", "../c.js"), "/a/c.js");
        assert_eq!(join("/a/b", "../../../c.js"), "/c.js");
        assert_eq!(join("/a", "/abs.js"), "/abs.js");
    }
}
