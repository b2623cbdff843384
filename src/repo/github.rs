use crate::domain::{LabelSet, PullRequest};
use crate::error::Result;
use crate::repo::PullRequestSource;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
const USER_AGENT: &str = concat!("git-next-version/", env!("CARGO_PKG_VERSION"));

/// Which side of the pull-request list to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PullRequestState {
    Open,
    Merged,
}

impl PullRequestState {
    /// Value of the `state` query parameter; merged PRs are closed ones
    fn as_query(self) -> &'static str {
        match self {
            PullRequestState::Open => "open",
            PullRequestState::Merged => "closed",
        }
    }
}

/// A GitHub pull request (subset of fields, all optional on the wire)
#[derive(Debug, Deserialize)]
struct GitHubPullRequest {
    number: Option<u64>,
    title: Option<String>,
    merged_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    html_url: Option<String>,
    head: Option<GitHubHead>,
    user: Option<GitHubUser>,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
}

#[derive(Debug, Deserialize)]
struct GitHubHead {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: Option<String>,
}

impl GitHubPullRequest {
    /// Convert to the domain type, `None` when a mandatory field is missing
    fn into_pull_request(self) -> Option<PullRequest> {
        let head = self.head?;
        let user = self.user?;
        let _ = self.created_at?;

        let labels: LabelSet = self.labels.into_iter().filter_map(|l| l.name).collect();
        let mut pr = PullRequest::new(self.number?, self.title?, self.merged_at, self.updated_at?);
        pr.labels = labels;
        pr.url = self.html_url?;
        pr.branch = head.git_ref?;
        pr.author_login = user.login?;
        pr.author_url = user.html_url?;
        Some(pr)
    }
}

/// Pull requests and releases read from the GitHub REST API
pub struct GitHubClient {
    http: reqwest::blocking::Client,
    api_url: String,
    owner: String,
    name: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(GitHubClient {
            http,
            api_url: DEFAULT_API_URL.to_string(),
            owner: owner.into(),
            name: name.into(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Point the client at another API root (GitHub Enterprise)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, self.owner, self.name, path)
    }

    fn authorize(&self, request: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        let request = request
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn list(
        &self,
        state: PullRequestState,
        base: &str,
        sort: &str,
        paginate: bool,
    ) -> Result<Vec<PullRequest>> {
        let url = self.endpoint("pulls");
        let mut result = Vec::new();
        let mut page = 1u32;

        loop {
            tracing::debug!(base, state = state.as_query(), sort, page, "fetching pull-requests...");
            let per_page = PER_PAGE.to_string();
            let page_string = page.to_string();
            let items: Vec<GitHubPullRequest> = self
                .authorize(self.http.get(&url))
                .query(&[
                    ("state", state.as_query()),
                    ("base", base),
                    ("sort", sort),
                    ("direction", "desc"),
                    ("per_page", per_page.as_str()),
                    ("page", page_string.as_str()),
                ])
                .send()?
                .error_for_status()?
                .json()?;

            let count = items.len();
            result.extend(items.into_iter().filter_map(|item| {
                let pr = item.into_pull_request()?;
                if state == PullRequestState::Merged && !pr.is_merged() {
                    return None;
                }
                Some(pr)
            }));

            if !paginate || count < PER_PAGE {
                break;
            }
            page += 1;
        }

        tracing::debug!(base, state = state.as_query(), count = result.len(), "pull-requests fetched");
        Ok(result)
    }
}

impl PullRequestSource for GitHubClient {
    fn pull_requests(&self, base: &str, only_merged: bool) -> Result<Vec<PullRequest>> {
        let mut merged = self.list(PullRequestState::Merged, base, "created", true)?;
        if only_merged {
            return Ok(merged);
        }
        let mut result = self.list(PullRequestState::Open, base, "created", true)?;
        result.append(&mut merged);
        Ok(result)
    }

    fn last_updated_pull_requests(
        &self,
        base: &str,
        only_merged: bool,
    ) -> Result<Vec<PullRequest>> {
        let mut merged = self.list(PullRequestState::Merged, base, "updated", false)?;
        if only_merged {
            return Ok(merged);
        }
        let mut result = self.list(PullRequestState::Open, base, "updated", false)?;
        result.append(&mut merged);
        sort_by_updated_desc(&mut result);
        Ok(result)
    }

    fn create_release(&self, base: &str, tag_name: &str, body: &str, draft: bool) -> Result<()> {
        let payload = serde_json::json!({
            "tag_name": tag_name,
            "target_commitish": base,
            "name": tag_name,
            "body": body,
            "draft": draft,
            "prerelease": false,
            "make_latest": "true",
        });

        self.authorize(self.http.post(self.endpoint("releases")))
            .json(&payload)
            .send()?
            .error_for_status()?;

        tracing::info!(tag = tag_name, base, draft, "release created");
        Ok(())
    }
}

fn sort_by_updated_desc(prs: &mut [PullRequest]) {
    prs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "number": 42,
        "title": "Add the thing",
        "state": "closed",
        "merged_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-02T11:00:00Z",
        "created_at": "2024-02-28T09:00:00Z",
        "html_url": "https://github.com/octo/widgets/pull/42",
        "head": {"ref": "feature/thing", "sha": "abc"},
        "user": {"login": "octocat", "html_url": "https://github.com/octocat"},
        "labels": [{"name": "Type: Added"}, {"name": null}, {"name": "ui"}]
    }"#;

    fn parse(json: &str) -> Option<PullRequest> {
        serde_json::from_str::<GitHubPullRequest>(json)
            .unwrap()
            .into_pull_request()
    }

    #[test]
    fn test_convert_full_pull_request() {
        let pr = parse(FULL).unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.title, "Add the thing");
        assert_eq!(pr.merged_at.unwrap().to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert_eq!(pr.updated_at.to_rfc3339(), "2024-03-02T11:00:00+00:00");
        assert_eq!(pr.branch, "feature/thing");
        assert_eq!(pr.author_login, "octocat");
        assert_eq!(pr.url, "https://github.com/octo/widgets/pull/42");
        assert_eq!(pr.labels.len(), 2);
        assert!(pr.labels.contains("Type: Added"));
    }

    #[test]
    fn test_convert_open_pull_request() {
        let json = FULL.replace(r#""merged_at": "2024-03-01T10:00:00Z""#, r#""merged_at": null"#);
        let pr = parse(&json).unwrap();
        assert!(!pr.is_merged());
    }

    #[test]
    fn test_convert_skips_incomplete_pull_request() {
        let no_user = FULL.replace(
            r#""user": {"login": "octocat", "html_url": "https://github.com/octocat"}"#,
            r#""user": null"#,
        );
        assert!(parse(&no_user).is_none());

        let no_head_ref = FULL.replace(r#""ref": "feature/thing", "#, "");
        assert!(parse(&no_head_ref).is_none());

        assert!(parse(r#"{"number": 1}"#).is_none());
    }

    #[test]
    fn test_state_query_values() {
        assert_eq!(PullRequestState::Open.as_query(), "open");
        assert_eq!(PullRequestState::Merged.as_query(), "closed");
    }

    #[test]
    fn test_endpoint_and_api_url() {
        let client = GitHubClient::new("octo", "widgets", Some(String::new()))
            .unwrap()
            .with_api_url("https://ghe.example.com/api/v3/");
        assert_eq!(
            client.endpoint("pulls"),
            "https://ghe.example.com/api/v3/repos/octo/widgets/pulls"
        );
        assert!(client.token.is_none());
    }

    #[test]
    fn test_sort_by_updated_desc() {
        let mut prs = vec![
            parse(FULL).unwrap(),
            parse(&FULL.replace("2024-03-02T11:00:00Z", "2024-04-01T00:00:00Z").replace("42", "43"))
                .unwrap(),
        ];
        sort_by_updated_desc(&mut prs);
        assert_eq!(prs[0].number, 43);
    }
}
