pub mod chrome_driver;
#[cfg(test)]
pub(crate) mod fake_driver;
pub mod js_executor;
pub mod locator;
pub mod page_driver;

pub use chrome_driver::ChromeDriver;
pub use js_executor::JsExecutor;
pub use locator::Locator;
pub use page_driver::{AsyncActivity, PageDriver, SelectOption};
