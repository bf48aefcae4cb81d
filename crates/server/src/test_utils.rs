use axum::response::Response;
use svngate_core::testing::MemoryBackend;

use crate::routes::RepoQuery;

pub const TARGET: &str = "https://svn.example.com/repo";

/// `trunk/src` holds `main.c` and `lib`; `trunk/README.md` is 42 bytes.
pub fn sample_backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_dir("trunk")
        .with_dir("trunk/src")
        .with_file("trunk/src/main.c", b"int main(void) { return 0; }\n")
        .with_dir("trunk/src/lib")
        .with_dated_file("trunk/README.md", &[b'#'; 42], "2024-02-03T04:05:06.000000Z")
}

/// Anonymous query for `TARGET/<suffix>` (or the root when `suffix` is empty).
pub fn query_for(suffix: &str) -> RepoQuery {
    let url = if suffix.is_empty() {
        TARGET.to_string()
    } else {
        format!("{TARGET}/{suffix}")
    };
    RepoQuery {
        target_url: Some(TARGET.to_string()),
        url: Some(url),
        name: Some(String::new()),
        password: Some(String::new()),
    }
}

pub async fn body_bytes(resp: Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read response body")
        .to_vec()
}
