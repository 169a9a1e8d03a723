use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// W3C WebDriver の要素参照キー
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Enter キー（WebDriver の特殊キーコード）
pub const ENTER: &str = "\u{E007}";

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("WebDriver error '{error}': {message}")]
    WebDriver { error: String, message: String },

    #[error("Unexpected WebDriver response: {0}")]
    Protocol(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),
}

impl DriverError {
    /// 画面遷移中など、再取得で解消する要素エラーか
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            DriverError::WebDriver { error, .. }
                if error == "stale element reference" || error == "no such element"
        )
    }
}

/// 要素の探し方
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Css(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// CSS セレクタ表現。ID は属性セレクタにして特殊文字を避ける
    pub fn to_css(&self) -> String {
        match self {
            Locator::Id(id) => format!("[id=\"{}\"]", id.replace('"', "\\\"")),
            Locator::Css(selector) => selector.clone(),
        }
    }
}

/// ブラウザ側の要素参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

impl ElementRef {
    /// execute script の引数として渡す形
    pub fn to_json(&self) -> Value {
        serde_json::json!({ ELEMENT_KEY: self.0 })
    }

    pub fn from_json(value: &Value) -> Result<Self, DriverError> {
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| ElementRef(id.to_string()))
            .ok_or_else(|| DriverError::Protocol(format!("not an element reference: {value}")))
    }
}

/// ページドライバが必要とするブラウザ操作
#[async_trait]
pub trait Browser: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    async fn find(&self, locator: &Locator) -> Result<ElementRef, DriverError>;

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError>;

    /// フォーカス中の要素
    async fn active_element(&self) -> Result<ElementRef, DriverError>;

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError>;

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError>;

    async fn text(&self, element: &ElementRef) -> Result<String, DriverError>;

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError>;
}
