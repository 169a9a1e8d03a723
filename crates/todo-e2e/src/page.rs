//! ToDo 一覧画面のページオブジェクト

use crate::browser::{Browser, DriverError, ElementRef, Locator, ENTER};
use serde_json::json;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// ハイライト時のスタイル
pub const HIGHLIGHT_STYLE: &str = "color: red; background-color: yellow;";

/// ハイライトを元に戻すまでの時間（ミリ秒）
pub const HIGHLIGHT_MS: u64 = 200;

// arguments: [要素, スタイル, 元に戻すまでのミリ秒]
const HIGHLIGHT_SCRIPT: &str = r#"
const element = arguments[0];
const previous = element.getAttribute('style');
element.setAttribute('style', arguments[1]);
setTimeout(() => {
    if (previous === null) {
        element.removeAttribute('style');
    } else {
        element.setAttribute('style', previous);
    }
}, arguments[2]);
return 'highlighted';
"#;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// `/todos` 画面の操作をまとめたもの
pub struct TodoPage<B> {
    browser: B,
    base_url: String,
}

impl<B: Browser> TodoPage<B> {
    pub fn new(browser: B, base_url: &str) -> Self {
        Self {
            browser,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn into_browser(self) -> B {
        self.browser
    }

    pub async fn navigate_to(&self) -> Result<(), DriverError> {
        self.browser.goto(&format!("{}/todos", self.base_url)).await
    }

    /// 要素を一時的に強調表示する（目視確認用）
    pub async fn highlight_element(&self, locator: &Locator) -> Result<String, DriverError> {
        let element = self.browser.find(locator).await?;
        let result = self
            .browser
            .execute(
                HIGHLIGHT_SCRIPT,
                vec![element.to_json(), json!(HIGHLIGHT_STYLE), json!(HIGHLIGHT_MS)],
            )
            .await?;
        Ok(result.as_str().unwrap_or_default().to_string())
    }

    pub async fn get_todo_title(&self) -> Result<String, DriverError> {
        let locator = Locator::id("list-title");
        let element = self.browser.find(&locator).await?;
        let title = self.browser.text(&element).await?;
        self.highlight_element(&locator).await?;
        Ok(title)
    }

    /// 見出しが期待値になるまで待つ（フォーム送信後の再描画待ち）
    pub async fn wait_for_title(&self, expected: &str, timeout: Duration) -> Result<String, DriverError> {
        let deadline = Instant::now() + timeout;
        let locator = Locator::id("list-title");

        loop {
            let current = match self.browser.find(&locator).await {
                Ok(element) => self.browser.text(&element).await,
                Err(e) => Err(e),
            };

            match current {
                Ok(title) if title == expected => return Ok(title),
                Ok(title) => debug!(%title, expected, "title not updated yet"),
                Err(e) if e.is_stale() => debug!(error = %e, "page still loading"),
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(DriverError::Timeout(format!("title '{expected}'")));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn type_an_owner(&self, name: &str) -> Result<(), DriverError> {
        self.type_into(&Locator::id("todoOwner"), name).await
    }

    pub async fn grab_a_category(&self, category: &str) -> Result<(), DriverError> {
        self.type_into(&Locator::id("categories"), category).await?;
        self.press_enter().await
    }

    pub async fn select_status(&self, status: &str) -> Result<(), DriverError> {
        self.type_into(&Locator::id("status"), status).await?;
        self.press_enter().await
    }

    pub async fn filter_by_content(&self, content: &str) -> Result<(), DriverError> {
        self.type_into(&Locator::id("content-search"), content).await
    }

    /// 追加フォームを埋めて送信する。status はラジオボタンの ID
    pub async fn add_todo(
        &self,
        owner: &str,
        status: &str,
        body: &str,
        category: &str,
    ) -> Result<(), DriverError> {
        self.type_into(&Locator::id("add-owner"), owner).await?;
        self.click(&Locator::id(status)).await?;
        self.type_into(&Locator::id("content"), body).await?;
        self.type_into(&Locator::id("category"), category).await?;
        self.click(&Locator::id("todo")).await?;
        Ok(())
    }

    pub async fn count_todos_on_screen(&self) -> Result<usize, DriverError> {
        let items = self
            .browser
            .find_all(&Locator::css("[id=\"todos\"] .todo-item"))
            .await?;
        Ok(items.len())
    }

    /// フォーカス中の要素に Enter を送る
    pub async fn press_enter(&self) -> Result<(), DriverError> {
        let active = self.browser.active_element().await?;
        self.browser.send_keys(&active, ENTER).await
    }

    async fn click(&self, locator: &Locator) -> Result<ElementRef, DriverError> {
        let element = self.browser.find(locator).await?;
        self.browser.click(&element).await?;
        Ok(element)
    }

    async fn type_into(&self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        let element = self.click(locator).await?;
        self.browser.send_keys(&element, text).await
    }
}
