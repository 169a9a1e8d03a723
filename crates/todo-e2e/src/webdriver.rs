//! W3C WebDriver プロトコルのクライアント（chromedriver / geckodriver 向け）

use crate::browser::{Browser, DriverError, ElementRef, Locator};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

/// WebDriver レスポンスの共通形 `{ "value": ... }`
#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

/// ヘッドレス起動用の capabilities
pub fn headless_capabilities(browser_name: &str) -> Value {
    let options = match browser_name {
        "firefox" => json!({ "moz:firefoxOptions": { "args": ["-headless"] } }),
        _ => json!({ "goog:chromeOptions": { "args": ["--headless=new", "--no-sandbox"] } }),
    };

    let mut always_match = json!({ "browserName": browser_name });
    if let (Some(target), Some(extra)) = (always_match.as_object_mut(), options.as_object()) {
        target.extend(extra.clone());
    }

    json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// 1 つの WebDriver セッション
#[derive(Debug)]
pub struct WebDriverSession {
    client: reqwest::Client,
    session_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// 新しいセッションを開始する
    pub async fn start(webdriver_url: &str, capabilities: Value) -> Result<Self, DriverError> {
        let client = reqwest::Client::new();
        let base = webdriver_url.trim_end_matches('/');

        let response = client
            .post(format!("{base}/session"))
            .json(&capabilities)
            .send()
            .await?;
        let value = unwrap_response(response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::Protocol(format!("missing sessionId: {value}")))?
            .to_string();
        info!(%session_id, "webdriver session started");

        Ok(Self {
            client,
            session_url: format!("{base}/session/{session_id}"),
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// セッションを終了してブラウザを閉じる
    pub async fn quit(self) -> Result<(), DriverError> {
        self.command(Method::DELETE, "", None).await?;
        info!(session_id = %self.session_id, "webdriver session closed");
        Ok(())
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, DriverError> {
        debug!(%method, path, "webdriver command");
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.session_url));
        if let Some(body) = body {
            request = request.json(&body);
        }

        unwrap_response(request.send().await?).await
    }
}

async fn unwrap_response(response: reqwest::Response) -> Result<Value, DriverError> {
    let status = response.status();
    let wire: WireResponse = response.json().await?;

    if status.is_success() {
        return Ok(wire.value);
    }

    let field = |name: &str| {
        wire.value
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Err(DriverError::WebDriver {
        error: field("error"),
        message: field("message"),
    })
}

fn locator_body(locator: &Locator) -> Value {
    json!({ "using": "css selector", "value": locator.to_css() })
}

#[async_trait]
impl Browser for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn find(&self, locator: &Locator) -> Result<ElementRef, DriverError> {
        let value = self
            .command(Method::POST, "/element", Some(locator_body(locator)))
            .await?;
        ElementRef::from_json(&value)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
        let value = self
            .command(Method::POST, "/elements", Some(locator_body(locator)))
            .await?;
        value
            .as_array()
            .ok_or_else(|| DriverError::Protocol(format!("expected element list: {value}")))?
            .iter()
            .map(ElementRef::from_json)
            .collect()
    }

    async fn active_element(&self) -> Result<ElementRef, DriverError> {
        let value = self.command(Method::GET, "/element/active", None).await?;
        ElementRef::from_json(&value)
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.command(Method::POST, &format!("/element/{}/click", element.0), Some(json!({})))
            .await
            .map(|_| ())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.command(
            Method::POST,
            &format!("/element/{}/value", element.0),
            Some(json!({ "text": text })),
        )
        .await
        .map(|_| ())
    }

    async fn text(&self, element: &ElementRef) -> Result<String, DriverError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.0), None)
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::Protocol(format!("expected text: {value}")))
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ELEMENT_KEY;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn session_on(server: &MockServer) -> WebDriverSession {
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "sessionId": "s1", "capabilities": {} }
            })))
            .mount(server)
            .await;

        WebDriverSession::start(&server.uri(), headless_capabilities("chrome"))
            .await
            .unwrap()
    }

    #[test]
    fn test_headless_capabilities() {
        let caps = headless_capabilities("chrome");
        let always = &caps["capabilities"]["alwaysMatch"];
        assert_eq!(always["browserName"], "chrome");
        assert!(always["goog:chromeOptions"]["args"].is_array());

        let caps = headless_capabilities("firefox");
        assert_eq!(
            caps["capabilities"]["alwaysMatch"]["moz:firefoxOptions"]["args"][0],
            "-headless"
        );
    }

    #[tokio::test]
    async fn test_find_and_read_text() {
        let server = MockServer::start().await;
        let session = session_on(&server).await;
        assert_eq!(session.session_id(), "s1");

        Mock::given(method("POST"))
            .and(path("/session/s1/element"))
            .and(body_json(json!({ "using": "css selector", "value": "[id=\"list-title\"]" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { ELEMENT_KEY: "e1" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s1/element/e1/text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "Todos" })))
            .mount(&server)
            .await;

        let element = session.find(&Locator::id("list-title")).await.unwrap();
        assert_eq!(element, ElementRef("e1".to_string()));
        assert_eq!(session.text(&element).await.unwrap(), "Todos");
    }

    #[tokio::test]
    async fn test_webdriver_error_is_mapped() {
        let server = MockServer::start().await;
        let session = session_on(&server).await;

        Mock::given(method("POST"))
            .and(path("/session/s1/element"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "value": { "error": "no such element", "message": "Unable to locate element" }
            })))
            .mount(&server)
            .await;

        let err = session.find(&Locator::id("missing")).await.unwrap_err();
        assert!(err.is_stale());
        match err {
            DriverError::WebDriver { error, message } => {
                assert_eq!(error, "no such element");
                assert_eq!(message, "Unable to locate element");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_all_and_quit() {
        let server = MockServer::start().await;
        let session = session_on(&server).await;

        Mock::given(method("POST"))
            .and(path("/session/s1/elements"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{ ELEMENT_KEY: "a" }, { ELEMENT_KEY: "b" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;

        let items = session
            .find_all(&Locator::css("#todos .todo-item"))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        session.quit().await.unwrap();
    }
}
