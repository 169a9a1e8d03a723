//! ToDo 一覧画面を操作する E2E テスト用ページドライバ

pub mod browser;
pub mod page;
pub mod webdriver;

pub use browser::*;
pub use page::*;
pub use webdriver::*;
