use std::time::Duration;

use thirtyfour::{
    error::WebDriverResult,
    extensions::query::{ElementQuery, ElementQueryable, ElementWaitable},
    By, DesiredCapabilities, WebDriver, WebElement,
};

use crate::configuration::WebdriverSettings;

/// One browser session against the WebDriver server, carrying the polling
/// bounds every readiness wait in the pipeline uses.
pub struct Droid {
    pub driver: WebDriver,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl Droid {
    pub async fn new(settings: &WebdriverSettings) -> WebDriverResult<Self> {
        let caps = DesiredCapabilities::chrome();

        let driver = WebDriver::new(&settings.server_url, caps).await?;
        driver.maximize_window().await?;

        Ok(Droid {
            driver,
            wait_timeout: settings.wait_timeout(),
            poll_interval: settings.poll_interval(),
        })
    }

    pub async fn open(&self, url: &str) -> WebDriverResult<()> {
        self.driver.goto(url).await
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Element lookup that polls until the element exists, bounded by the
    /// configured timeout. Stands in for the fixed sleeps a page transition
    /// would otherwise need.
    pub fn wait_for(&self, by: By) -> ElementQuery {
        self.driver
            .query(by)
            .wait(self.wait_timeout, self.poll_interval)
    }

    /// Polls until an already-located element is actually visible, for
    /// controls revealed by an accordion panel.
    pub async fn wait_displayed(&self, element: &WebElement) -> WebDriverResult<()> {
        element
            .wait_until()
            .wait(self.wait_timeout, self.poll_interval)
            .displayed()
            .await
    }

    pub async fn quit(self) -> WebDriverResult<()> {
        self.driver.quit().await
    }
}
