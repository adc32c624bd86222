use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GITHUB_USER: &str = "kevinxaviour";
pub const DEFAULT_GITHUB_REPO: &str = "PkevS3";
pub const DEFAULT_GITHUB_BRANCH: &str = "main";
pub const DEFAULT_CSV_DIR: &str = "csvfiles";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    GitHub,
    Local,
}

impl SourceKind {
    pub fn parse(raw: &str) -> Option<SourceKind> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "github" | "gh" | "remote" => Some(SourceKind::GitHub),
            "local" | "disk" | "dir" => Some(SourceKind::Local),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubSource {
    pub user: String,
    pub repo: String,
    pub branch: String,
    pub csv_dir: String,
    pub token: Option<String>,
}

impl GitHubSource {
    pub fn contents_url(&self) -> String {
        format!(
            "https://api.github.com/repos/{}/{}/contents/{}",
            self.user, self.repo, self.csv_dir
        )
    }

    pub fn raw_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/').replace(' ', "%20");
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}",
            self.user, self.repo, self.branch, path
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: SourceKind,
    pub github: GitHubSource,
    pub local_dir: PathBuf,
    /// URL, repository-relative path (GitHub source) or file path (local source).
    /// Unset means team ids are shown as-is.
    pub team_lookup: Option<String>,
    pub export_dir: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    /// Reads `STATS_*` variables from the process environment. Call after `dotenvy` has run.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let source = get("STATS_SOURCE")
            .and_then(|v| SourceKind::parse(&v))
            .unwrap_or(SourceKind::GitHub);

        let github = GitHubSource {
            user: get("STATS_GITHUB_USER").unwrap_or_else(|| DEFAULT_GITHUB_USER.to_string()),
            repo: get("STATS_GITHUB_REPO").unwrap_or_else(|| DEFAULT_GITHUB_REPO.to_string()),
            branch: get("STATS_GITHUB_BRANCH")
                .unwrap_or_else(|| DEFAULT_GITHUB_BRANCH.to_string()),
            csv_dir: get("STATS_CSV_DIR").unwrap_or_else(|| DEFAULT_CSV_DIR.to_string()),
            token: get("GITHUB_TOKEN"),
        };

        let team_lookup = get("STATS_TEAM_LOOKUP");

        let http_timeout_secs = get("STATS_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .clamp(1, 120);

        Self {
            source,
            github,
            local_dir: get("STATS_LOCAL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            team_lookup,
            export_dir: get("STATS_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            http_timeout: Duration::from_secs(http_timeout_secs),
        }
    }

    pub fn source_label(&self) -> String {
        match self.source {
            SourceKind::GitHub => format!(
                "github:{}/{}/{}",
                self.github.user, self.github.repo, self.github.csv_dir
            ),
            SourceKind::Local => format!("local:{}", self.local_dir.display()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
