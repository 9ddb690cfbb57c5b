use std::path::PathBuf;
use std::time::Duration;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const REPOSITORY_PATH: &str = "/repo.git/";

/// Serves the files of a git directory the way a static web server would
pub struct GitDirResponder {
    git_dir: PathBuf,
    delay: Option<Duration>,
}

impl Respond for GitDirResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let relative = request
            .url
            .path()
            .strip_prefix(REPOSITORY_PATH)
            .unwrap_or_default();

        let template = match std::fs::read(self.git_dir.join(relative)) {
            Ok(content) => ResponseTemplate::new(200).set_body_bytes(content),
            Err(_) => ResponseTemplate::new(404),
        };

        match self.delay {
            Some(delay) => template.set_delay(delay),
            None => template,
        }
    }
}

pub async fn serve_git_dir(git_dir: PathBuf, delay: Option<Duration>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(format!("^{REPOSITORY_PATH}")))
        .respond_with(GitDirResponder { git_dir, delay })
        .mount(&server)
        .await;

    server
}

pub fn repository_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), REPOSITORY_PATH.trim_end_matches('/'))
}
