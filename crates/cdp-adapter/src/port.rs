use action_primitives::{
    pick_text_match, ActionError, AutomationPort, ExecCtx, FileDescriptor, Selector,
};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::handler::Handler;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::script::{self, ScriptReply, STATUS_NOT_FOUND, STATUS_OK};

/// A single Chromium tab driven through the DevTools protocol.
pub struct ChromiumPort {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    base_url: Url,
    cfg: CdpConfig,
}

impl ChromiumPort {
    /// Launches Chromium (or attaches to `websocket_url`) and opens a blank tab.
    pub async fn launch(cfg: CdpConfig) -> Result<Self, AdapterError> {
        let base_url = Url::parse(&cfg.base_url).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal)
                .with_hint(format!("invalid base url `{}`: {}", cfg.base_url, err))
        })?;

        let (browser, handler) = match &cfg.websocket_url {
            Some(ws) => {
                info!(websocket = %ws, "attaching to running browser");
                Browser::connect(ws.clone()).await?
            }
            None => {
                let browser_config = browser_config(&cfg)?;
                info!(headless = cfg.headless, "launching chromium");
                Browser::launch(browser_config).await.map_err(|err| {
                    AdapterError::new(AdapterErrorKind::LaunchFailed).with_hint(err.to_string())
                })?
            }
        };
        let handler = spawn_handler(handler);

        let page = browser.new_page("about:blank").await?;
        debug!("blank page ready");
        Ok(Self {
            browser,
            page,
            handler,
            base_url,
            cfg,
        })
    }

    pub fn config(&self) -> &CdpConfig {
        &self.cfg
    }

    /// Closes the browser and waits for the protocol handler to stop.
    pub async fn shutdown(mut self) -> Result<(), AdapterError> {
        if self.cfg.websocket_url.is_none() {
            self.browser.close().await?;
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
        Ok(())
    }

    fn resolve(&self, path: &str) -> Result<Url, ActionError> {
        self.base_url
            .join(path)
            .map_err(|err| ActionError::navigation(path, err.to_string()))
    }

    async fn evaluate(&self, expression: String) -> Result<ScriptReply, ActionError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(AdapterError::from)?;
        result.into_value::<ScriptReply>().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Script)
                .with_hint(err.to_string())
                .into()
        })
    }

    /// Re-evaluates `expression` while the selector matches nothing.
    async fn poll_unique(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        value: &str,
        expression: String,
    ) -> Result<ScriptReply, ActionError> {
        let deadline = Instant::now() + self.cfg.lookup_timeout();
        loop {
            interrupted(ctx)?;
            let reply = self.evaluate(expression.clone()).await?;
            match reply.status.as_str() {
                STATUS_OK => return Ok(reply),
                STATUS_NOT_FOUND if Instant::now() < deadline => {
                    sleep(self.cfg.poll_interval()).await;
                }
                _ => return Err(script::reply_error(selector, value, reply)),
            }
        }
    }
}

#[async_trait]
impl AutomationPort for ChromiumPort {
    async fn navigate(&self, ctx: &ExecCtx, path: &str) -> Result<(), ActionError> {
        interrupted(ctx)?;
        let target = self.resolve(path)?;
        info!(action_id = %ctx.action_id, url = %target, "navigate");

        let nav = timeout(self.cfg.navigation_timeout(), self.page.goto(target.as_str()));
        let outcome = tokio::select! {
            _ = ctx.cancel.cancelled() => {
                return Err(ActionError::Interrupted("navigation cancelled".to_string()));
            }
            outcome = nav => outcome,
        };
        match outcome {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(ActionError::navigation(path, err.to_string())),
            Err(_) => Err(ActionError::navigation(
                path,
                format!(
                    "page did not load within {} ms",
                    self.cfg.navigation_timeout_ms
                ),
            )),
        }
    }

    async fn fill_field(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        value: &str,
        sensitive: bool,
    ) -> Result<(), ActionError> {
        debug!(
            action_id = %ctx.action_id,
            selector = %selector,
            chars = value.chars().count(),
            sensitive,
            "fill field"
        );
        self.poll_unique(ctx, selector, "", script::focus_field(selector))
            .await?;
        self.page
            .execute(InsertTextParams::new(value))
            .await
            .map_err(|err| {
                // The error never echoes the inserted text.
                ActionError::Driver(format!("text insertion into `{}` failed: {}", selector, err))
            })?;
        Ok(())
    }

    async fn select_option(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        value: &str,
    ) -> Result<(), ActionError> {
        debug!(action_id = %ctx.action_id, selector = %selector, "select option");
        self.poll_unique(ctx, selector, value, script::select_option(selector, value))
            .await
            .map(|_| ())
    }

    async fn attach_file(
        &self,
        ctx: &ExecCtx,
        selector: &Selector,
        file: &FileDescriptor,
    ) -> Result<(), ActionError> {
        debug!(
            action_id = %ctx.action_id,
            selector = %selector,
            file = %file.file_name,
            mime = %file.mime_type,
            bytes = file.len(),
            "attach file"
        );
        let reply = self
            .poll_unique(ctx, selector, "", script::attach_file(selector, file))
            .await?;
        if reply.count != file.len() {
            warn!(expected = file.len(), actual = reply.count, "attached size differs");
        }
        Ok(())
    }

    async fn click(&self, ctx: &ExecCtx, selector: &Selector, text: &str) -> Result<(), ActionError> {
        debug!(action_id = %ctx.action_id, selector = %selector, text, "click");
        let deadline = Instant::now() + self.cfg.lookup_timeout();
        let described = format!("{} containing \"{}\"", selector, text);

        let index = loop {
            interrupted(ctx)?;
            let reply = self.evaluate(script::candidate_texts(selector)).await?;
            if reply.status != STATUS_OK {
                return Err(script::reply_error(selector, text, reply));
            }
            match pick_text_match(reply.texts.iter().map(String::as_str), text) {
                Ok(index) => break index,
                Err(0) if Instant::now() < deadline => sleep(self.cfg.poll_interval()).await,
                Err(count) => return Err(ActionError::from_match_count(described, count)),
            }
        };

        let reply = self.evaluate(script::click_nth(selector, index)).await?;
        if reply.status == STATUS_OK {
            Ok(())
        } else {
            Err(script::reply_error(selector, text, reply))
        }
    }

    async fn url_fragment(&self, ctx: &ExecCtx) -> Result<String, ActionError> {
        interrupted(ctx)?;
        let result = self
            .page
            .evaluate(script::HASH)
            .await
            .map_err(AdapterError::from)?;
        result.into_value::<String>().map_err(|err| {
            AdapterError::new(AdapterErrorKind::Script)
                .with_hint(err.to_string())
                .into()
        })
    }
}

fn interrupted(ctx: &ExecCtx) -> Result<(), ActionError> {
    if ctx.is_cancelled() {
        Err(ActionError::Interrupted("context cancelled".to_string()))
    } else {
        Ok(())
    }
}

fn browser_config(cfg: &CdpConfig) -> Result<BrowserConfig, AdapterError> {
    let executable = cfg.resolve_executable().ok_or_else(|| {
        AdapterError::new(AdapterErrorKind::ExecutableNotFound)
            .with_hint("set browser.executable or FLOWCHECK_CHROME")
    })?;

    let mut builder = BrowserConfig::builder()
        .chrome_executable(executable)
        .request_timeout(cfg.navigation_timeout());
    if !cfg.headless {
        builder = builder.with_head();
    }
    if let Some((width, height)) = cfg.window_size {
        builder = builder.window_size(width, height);
    }
    if let Some(dir) = &cfg.user_data_dir {
        builder = builder.user_data_dir(dir);
    }
    builder
        .build()
        .map_err(|reason| AdapterError::new(AdapterErrorKind::LaunchFailed).with_hint(reason))
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(err) = event {
                debug!(error = %err, "browser handler stopped");
                break;
            }
        }
    })
}

// Requires a local Chrome; run with `--ignored`.
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    #[ignore]
    async fn blank_page_has_no_fragment() {
        let port = ChromiumPort::launch(CdpConfig::default()).await.unwrap();
        let hash = port.url_fragment(&ExecCtx::default()).await.unwrap();
        assert_eq!(hash, "");
        port.shutdown().await.unwrap();
    }

    #[test]
    fn missing_browser_is_reported() {
        let cfg = CdpConfig {
            executable: Some("/definitely/not/chrome".into()),
            ..CdpConfig::default()
        };
        if cfg.resolve_executable().is_none() {
            let err = browser_config(&cfg).unwrap_err();
            assert_eq!(err.kind, AdapterErrorKind::ExecutableNotFound);
        }
    }
}
