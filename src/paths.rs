/// Repository-relative paths and the endpoints built from them.
///
/// Paths are slash-separated and relative to the repository root. The empty
/// string is the root itself.
use crate::model::RepositoryRef;

/// Strip leading/trailing slashes and collapse empty segments.
///
/// `/docs//guide/` → `docs/guide`
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn join(base: &str, child: &str) -> String {
    let base = normalize(base);
    let child = normalize(child);
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child,
        (_, true) => base,
        _ => format!("{base}/{child}"),
    }
}

/// Parent directory of a path; the root's parent is the root.
///
/// `a/b/c` → `a/b`, `a` → ``
pub fn parent(path: &str) -> String {
    let path = normalize(path);
    match path.rfind('/') {
        Some(pos) => path[..pos].to_string(),
        None => String::new(),
    }
}

/// Last segment of a path.
pub fn file_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// Percent-encode one path segment or query value.
pub(crate) fn encode_segment(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(b as char);
            }
            _ => {
                result.push('%');
                result.push_str(&format!("{:02X}", b));
            }
        }
    }
    result
}

fn encode_path(path: &str) -> String {
    normalize(path)
        .split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn repo_endpoint(repo: &RepositoryRef) -> String {
    format!(
        "/repos/{}/{}",
        encode_segment(&repo.owner),
        encode_segment(&repo.name)
    )
}

/// `/repos/{owner}/{name}/contents/{path}`
pub(crate) fn contents_endpoint(repo: &RepositoryRef, path: &str) -> String {
    let encoded = encode_path(path);
    if encoded.is_empty() {
        format!("{}/contents", repo_endpoint(repo))
    } else {
        format!("{}/contents/{}", repo_endpoint(repo), encoded)
    }
}

/// Contents endpoint scoped to a ref for reads.
pub(crate) fn contents_at_ref(repo: &RepositoryRef, path: &str, branch: &str) -> String {
    format!(
        "{}?ref={}",
        contents_endpoint(repo, path),
        encode_segment(branch)
    )
}
