use std::sync::LazyLock;

use dashsync_core::{AppError, AppResult};
use regex::Regex;
use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;

use super::base::AuthorizedClient;

static NEXT_PAGE_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>;\s*rel="next""#).ok());

/// Successful response of an authenticated GET.
#[derive(Debug)]
pub(crate) struct HttpGetResponse {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: HeaderMap,
}

impl HttpGetResponse {
    pub(crate) fn json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        serde_json::from_slice(&self.body).map_err(|error| {
            AppError::Internal(format!("failed to decode response from {url}: {error}"))
        })
    }

    pub(crate) fn next_page(&self) -> Option<String> {
        next_page_link(&self.headers)
    }
}

/// Issues an authenticated GET and fails on non-success statuses.
pub(crate) async fn http_get(
    client: AuthorizedClient<'_>,
    url: &str,
) -> AppResult<HttpGetResponse> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| AppError::Internal(format!("GET {url} failed: {error}")))?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .map_err(|error| AppError::Internal(format!("GET {url} body read failed: {error}")))?
        .to_vec();

    if !status.is_success() {
        return Err(AppError::Internal(format!(
            "GET {url} returned status {status}: {}",
            String::from_utf8_lossy(&body)
        )));
    }

    Ok(HttpGetResponse { body, headers })
}

/// Fetches every page of a JSON array listing by following `rel="next"` links.
pub(crate) async fn get_all_pages<T: DeserializeOwned>(
    client: AuthorizedClient<'_>,
    url: &str,
) -> AppResult<Vec<T>> {
    let mut items = Vec::new();
    let mut next = Some(url.to_owned());

    while let Some(url) = next.take() {
        let response = http_get(client, &url).await?;
        items.extend(response.json::<Vec<T>>(&url)?);
        next = response.next_page();
    }

    Ok(items)
}

/// Extracts the `rel="next"` target of the first `Link` header.
pub(crate) fn next_page_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    let pattern = NEXT_PAGE_LINK.as_ref()?;

    pattern
        .captures(link)
        .and_then(|captures| captures.get(1))
        .map(|target| target.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, LINK};

    use super::next_page_link;

    #[test]
    fn next_link_is_found_among_other_relations() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://gitlab.example.com/api/v4/groups?page=1>; rel=\"first\", \
                 <https://gitlab.example.com/api/v4/groups?page=3>; rel=\"next\"",
            ),
        );

        assert_eq!(
            next_page_link(&headers).as_deref(),
            Some("https://gitlab.example.com/api/v4/groups?page=3")
        );
    }

    #[test]
    fn missing_next_relation_ends_pagination() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_page_link(&headers), None);

        headers.insert(
            LINK,
            HeaderValue::from_static("<https://gitlab.example.com/api/v4/groups?page=1>; rel=\"last\""),
        );
        assert_eq!(next_page_link(&headers), None);
    }
}
