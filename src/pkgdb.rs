use crate::config::PkgdbConfig;
use crate::errors::LookupError;
use crate::traits::PackageLookup;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

const COMMIT_ACL: &str = "commit";
const APPROVED_STATUS: &str = "Approved";
const MAX_PAGES: u32 = 1000;

// --- pkgdb2 API レスポンスモデル ---
#[derive(Debug, Clone, Deserialize)]
pub struct PackagerAclPage {
    #[serde(default)]
    pub acls: Vec<PackagerAcl>,
    #[serde(default = "default_page_total")]
    pub page_total: u32,
}

fn default_page_total() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackagerAcl {
    pub acl: String,
    pub status: String,
    pub packagelist: PackageListing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageListing {
    pub package: Package,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub name: String,
}

impl PackagerAclPage {
    /// Names of packages with an approved commit ACL on this page
    pub fn committable_packages(&self) -> impl Iterator<Item = &str> {
        self.acls
            .iter()
            .filter(|acl| acl.acl == COMMIT_ACL && acl.status == APPROVED_STATUS)
            .map(|acl| acl.packagelist.package.name.as_str())
    }
}

/// pkgdb APIクライアント
pub struct PkgdbClient {
    client: Client,
    config: PkgdbConfig,
}

impl PkgdbClient {
    /// 新しいpkgdbクライアントを作成
    pub fn new(config: PkgdbConfig) -> Result<Self, LookupError> {
        // URLは事前に検証しておく
        Url::parse(&config.url)?;

        let client = Client::builder()
            .user_agent(format!("fmn-rules/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()?;

        Ok(PkgdbClient { client, config })
    }

    /// pkgdbのベースURLを取得
    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    fn acl_url(&self, username: &str) -> Result<Url, LookupError> {
        let mut url = Url::parse(&format!(
            "{}/",
            self.config.url.trim_end_matches('/')
        ))?;
        url.path_segments_mut()
            .map_err(|_| LookupError::Unavailable {
                reason: format!("pkgdb URL cannot be a base: {}", self.config.url),
            })?
            .pop_if_empty()
            .extend(["api", "packager", "acl", username, ""]);
        Ok(url)
    }

    /// ユーザーがコミット権限を持つパッケージを取得（全ページ）
    pub async fn get_packages_of_user(&self, username: &str) -> Result<HashSet<String>, LookupError> {
        let mut packages = HashSet::new();
        let mut page = 1;

        loop {
            let acl_page = self.get_acl_page(username, page).await?;
            packages.extend(acl_page.committable_packages().map(str::to_string));

            // ページ番号はサーバーの応答ではなく自前で進める
            if page >= acl_page.page_total.min(MAX_PAGES) {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "pkgdb: '{}' can commit to {} package(s)",
            username,
            packages.len()
        );
        Ok(packages)
    }

    /// ACL一覧の1ページを取得
    async fn get_acl_page(&self, username: &str, page: u32) -> Result<PackagerAclPage, LookupError> {
        let url = self.acl_url(username)?;
        tracing::debug!("pkgdb: GET {} (page {})", url, page);

        let request_builder = self.client.get(url).query(&[
            ("acls", COMMIT_ACL.to_string()),
            ("page", page.to_string()),
            ("limit", self.config.page_limit.to_string()),
        ]);

        let response = self.send_with_retry(request_builder).await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.text().await?;
                Ok(serde_json::from_str(&body)?)
            }
            StatusCode::NOT_FOUND => Err(LookupError::UserNotFound {
                username: username.to_string(),
            }),
            _ => Err(Self::handle_error_response(response).await),
        }
    }

    /// エラーレスポンスを処理
    async fn handle_error_response(response: Response) -> LookupError {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!("pkgdb returned {}: {}", status, text);
        LookupError::ServerError {
            status: status.as_u16(),
            message: text,
        }
    }

    /// リトライ付きでリクエスト送信
    async fn send_with_retry(
        &self,
        request_builder: reqwest::RequestBuilder,
    ) -> Result<Response, LookupError> {
        let retry_interval = Duration::from_secs(self.config.retry_interval_sec);
        let mut attempt = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| LookupError::Unavailable {
                    reason: "request could not be cloned for retry".to_string(),
                })?;

            match request.send().await {
                Ok(response) if response.status().is_server_error() => {
                    if attempt >= self.config.retry_count {
                        return Ok(response);
                    }
                    tracing::warn!(
                        "pkgdb server error {} (attempt {}), retrying",
                        response.status(),
                        attempt + 1
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempt >= self.config.retry_count {
                        tracing::warn!("pkgdb request failed: {}", e);
                        return Err(e.into());
                    }
                    tracing::warn!("pkgdb request failed (attempt {}), retrying: {}", attempt + 1, e);
                }
            }

            attempt += 1;
            tokio::time::sleep(retry_interval).await;
        }
    }
}

impl PackageLookup for PkgdbClient {
    async fn packages_of_user(&self, username: &str) -> Result<HashSet<String>, LookupError> {
        self.get_packages_of_user(username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn acl(name: &str, acl: &str, status: &str) -> serde_json::Value {
        json!({
            "acl": acl,
            "status": status,
            "packagelist": {
                "package": {"name": name},
                "collection": {"branchname": "master"}
            }
        })
    }

    fn client_for(server: &Server) -> PkgdbClient {
        let config = PkgdbConfig {
            url: server.url(),
            retry_interval_sec: 0,
            ..PkgdbConfig::default()
        };
        PkgdbClient::new(config).unwrap()
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        let config = PkgdbConfig {
            url: "not a url".to_string(),
            ..PkgdbConfig::default()
        };
        assert!(matches!(
            PkgdbClient::new(config),
            Err(LookupError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_acl_url() {
        let config = PkgdbConfig {
            url: "https://admin.fedoraproject.org/pkgdb/".to_string(),
            ..PkgdbConfig::default()
        };
        let client = PkgdbClient::new(config).unwrap();
        assert_eq!(
            client.acl_url("alice").unwrap().as_str(),
            "https://admin.fedoraproject.org/pkgdb/api/packager/acl/alice/"
        );
    }

    #[test]
    fn test_committable_packages_filters_acl_and_status() {
        let page: PackagerAclPage = serde_json::from_value(json!({
            "acls": [
                acl("kernel", "commit", "Approved"),
                acl("glibc", "commit", "Awaiting Review"),
                acl("gcc", "watchcommits", "Approved"),
            ],
            "page": 1,
            "page_total": 1
        }))
        .unwrap();

        let names: Vec<&str> = page.committable_packages().collect();
        assert_eq!(names, vec!["kernel"]);
    }

    #[tokio::test]
    async fn test_get_packages_of_user() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/packager/acl/alice/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("acls".to_string(), "commit".to_string()),
                Matcher::UrlEncoded("page".to_string(), "1".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "acls": [
                        acl("kernel", "commit", "Approved"),
                        acl("glibc", "commit", "Approved"),
                        acl("kernel", "commit", "Approved"),
                    ],
                    "page": 1,
                    "page_total": 1
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let packages = client.get_packages_of_user("alice").await.unwrap();

        assert_eq!(
            packages,
            HashSet::from(["kernel".to_string(), "glibc".to_string()])
        );
    }

    #[tokio::test]
    async fn test_get_packages_of_user_follows_pages() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/api/packager/acl/bob/")
            .match_query(Matcher::UrlEncoded("page".to_string(), "1".to_string()))
            .with_status(200)
            .with_body(
                json!({"acls": [acl("kernel", "commit", "Approved")], "page": 1, "page_total": 2})
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/packager/acl/bob/")
            .match_query(Matcher::UrlEncoded("page".to_string(), "2".to_string()))
            .with_status(200)
            .with_body(
                json!({"acls": [acl("systemd", "commit", "Approved")], "page": 2, "page_total": 2})
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let packages = client.get_packages_of_user("bob").await.unwrap();

        assert!(packages.contains("kernel"));
        assert!(packages.contains("systemd"));
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_pagination_advances_even_if_server_repeats_page_number() {
        let mut server = Server::new_async().await;
        let pages = server
            .mock("GET", "/api/packager/acl/bob/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"acls": [], "page": 1, "page_total": 2}).to_string())
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.get_packages_of_user("bob"),
        )
        .await
        .expect("pagination did not terminate");

        assert!(result.unwrap().is_empty());
        pages.assert_async().await;
    }

    #[tokio::test]
    async fn test_pagination_is_capped() {
        let mut server = Server::new_async().await;
        let pages = server
            .mock("GET", "/api/packager/acl/dave/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"acls": [], "page_total": u32::MAX}).to_string())
            .expect(MAX_PAGES as usize)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.get_packages_of_user("dave").await;

        assert!(result.unwrap().is_empty());
        pages.assert_async().await;
    }

    #[tokio::test]
    async fn test_user_without_packages_is_empty_set() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/packager/acl/carol/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"acls": [], "page": 1, "page_total": 1}).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let packages = client.packages_of_user("carol").await.unwrap();
        assert!(packages.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/packager/acl/mallory/")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"output": "notok", "error": "No ACL found for this user"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.packages_of_user("mallory").await;

        match result {
            Err(LookupError::UserNotFound { username }) => assert_eq!(username, "mallory"),
            other => panic!("expected UserNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/packager/acl/eve/")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.packages_of_user("eve").await;

        match result {
            Err(LookupError::ServerError { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("expected ServerError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/api/packager/acl/frank/")
            .match_query(Matcher::Any)
            .with_status(502)
            .expect(3)
            .create_async()
            .await;

        let config = PkgdbConfig {
            url: server.url(),
            retry_count: 2,
            retry_interval_sec: 0,
            ..PkgdbConfig::default()
        };
        let client = PkgdbClient::new(config).unwrap();
        let result = client.packages_of_user("frank").await;

        assert!(matches!(
            result,
            Err(LookupError::ServerError { status: 502, .. })
        ));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/packager/acl/grace/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.packages_of_user("grace").await;
        assert!(matches!(result, Err(LookupError::Parse { .. })));
    }
}
