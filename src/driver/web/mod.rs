mod driver;

pub use driver::{BrowserType, WebDriverConfig, WebPage, WebSessionFactory};
