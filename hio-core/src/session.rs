//! Stateful session against a HIO portal instance
//!
//! The portal exposes no API. Every interaction is a JSF "flow": a GET on the
//! start-flow endpoint opens a conversation and yields a flow execution key,
//! subsequent partial AJAX posts mutate the server-side view state, and a GET
//! on the page endpoint returns the re-rendered markup.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::html;

const START_FLOW_PATH: &str = "qisserver/pages/startFlow.xhtml";
const PAGES_PATH: &str = "qisserver/pages";

/// The portal is known to take minutes for large tree expansions.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

static AUTH_TOKEN_INPUT: LazyLock<Selector> =
    LazyLock::new(|| html::selector(r#"input[name="authenticity_token"]"#));

/// A freshly started flow
pub struct FlowPage {
    pub execution_key: String,
    pub document: Html,
}

/// The three request shapes every extraction step is built from.
///
/// [`SessionClient`] talks to the real portal; tests substitute canned pages.
pub trait Portal {
    /// Open a named flow and return its execution key plus the first page.
    fn start_flow(&self, flow: &str, params: &[(&str, String)]) -> Result<FlowPage>;

    /// Trigger a server-side action, optionally asking for a partial re-render.
    fn submit_action(
        &self,
        page: &str,
        flow: &str,
        execution_key: &str,
        source: &str,
        action: &str,
        render: bool,
    ) -> Result<()>;

    /// Re-fetch the current state of a page.
    ///
    /// With `expected_status == None` any 2xx status is accepted.
    fn fetch_page(
        &self,
        page: &str,
        flow: &str,
        execution_key: &str,
        expected_status: Option<u16>,
    ) -> Result<Html>;
}

/// Connection settings for one portal instance
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Base URL, e.g. `https://hio.example.edu`
    pub instance: String,
    pub request_timeout: Duration,
}

impl SessionSettings {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// One authenticated session (cookie jar + authenticity token)
pub struct SessionClient {
    client: Client,
    instance: String,
    auth_token: String,
}

impl SessionClient {
    /// Build the HTTP client and harvest the authenticity token.
    pub fn connect(settings: &SessionSettings) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(settings.request_timeout)
            .user_agent("Mozilla/5.0 hio-extractor/1.0")
            .build()?;

        let mut session = Self {
            client,
            instance: settings.instance.trim_end_matches('/').to_string(),
            auth_token: String::new(),
        };
        session.authenticate()?;

        Ok(session)
    }

    /// Fetch the bare start-flow page, which is not a valid page by itself
    /// but carries the authenticity token every state-changing post needs.
    pub fn authenticate(&mut self) -> Result<()> {
        tracing::info!("Getting session auth token");

        let url = self.start_flow_url();
        let body = self.client.get(&url).send()?.text()?;
        let document = Html::parse_document(&body);

        self.auth_token = extract_auth_token(&document).ok_or_else(|| {
            tracing::error!("No auth token was found on {}", url);
            Error::not_found("authenticity token")
        })?;

        Ok(())
    }

    fn start_flow_url(&self) -> String {
        format!("{}/{}", self.instance, START_FLOW_PATH)
    }

    fn page_url(&self, page: &str) -> String {
        format!("{}/{}/{}", self.instance, PAGES_PATH, page)
    }

    fn describe(&self, page: &str, flow: &str, execution_key: &str) -> String {
        format!(
            "{}?_flowId={}&_flowExecutionKey={}",
            self.page_url(page),
            flow,
            execution_key
        )
    }
}

impl Portal for SessionClient {
    fn start_flow(&self, flow: &str, params: &[(&str, String)]) -> Result<FlowPage> {
        tracing::info!("Starting flow {} with parameters {:?}", flow, params);

        let url = self.start_flow_url();
        let mut query: Vec<(&str, &str)> = vec![("_flowId", flow)];
        query.extend(params.iter().map(|(key, value)| (*key, value.as_str())));

        let response = self.client.get(&url).query(&query).send()?;
        let status = response.status();
        if !status.is_success() {
            let url = format!("{}?_flowId={}", url, flow);
            tracing::error!("HTTP call to {} failed with status code {}", url, status);
            return Err(Error::Http {
                url,
                status: status.as_u16(),
            });
        }

        // The key only shows up after the portal redirected us into the flow.
        let execution_key = response
            .url()
            .query_pairs()
            .find(|(key, _)| key == "_flowExecutionKey")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| Error::not_found(format!("flow execution key for {}", flow)))?;

        let document = Html::parse_document(&response.text()?);

        Ok(FlowPage {
            execution_key,
            document,
        })
    }

    fn submit_action(
        &self,
        page: &str,
        flow: &str,
        execution_key: &str,
        source: &str,
        action: &str,
        render: bool,
    ) -> Result<()> {
        tracing::info!(
            "Doing action {} ({}) on {}",
            action,
            source,
            self.describe(page, flow, execution_key)
        );

        let mut form: Vec<(&str, &str)> = vec![
            ("authenticity_token", self.auth_token.as_str()),
            ("javax.faces.ViewState", execution_key),
            ("javax.faces.source", source),
            ("javax.faces.partial.execute", action),
            ("javax.faces.behavior.event", "action"),
        ];
        if render {
            form.push(("javax.faces.partial.render", action));
        }

        let response = self
            .client
            .post(self.page_url(page))
            .query(&[("_flowId", flow), ("_flowExecutionKey", execution_key)])
            .header("Faces-Request", "partial/ajax")
            .form(&form)
            .send()?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::FOUND {
            let url = self.describe(page, flow, execution_key);
            tracing::error!("HTTP call to {} failed with status code {}", url, status);
            return Err(Error::Http {
                url,
                status: status.as_u16(),
            });
        }

        Ok(())
    }

    fn fetch_page(
        &self,
        page: &str,
        flow: &str,
        execution_key: &str,
        expected_status: Option<u16>,
    ) -> Result<Html> {
        let url = self.describe(page, flow, execution_key);
        tracing::info!("Getting page: {}", url);

        let response = self
            .client
            .get(self.page_url(page))
            .query(&[("_flowId", flow), ("_flowExecutionKey", execution_key)])
            .send()?;

        let status = response.status();
        let accepted = match expected_status {
            Some(expected) => status.as_u16() == expected,
            None => status.is_success(),
        };
        if !accepted {
            tracing::error!("HTTP call to {} failed with status code {}", url, status);
            return Err(Error::Http {
                url,
                status: status.as_u16(),
            });
        }

        Ok(Html::parse_document(&response.text()?))
    }
}

const JS_FORM_ID: &str = "jsForm";

fn extract_auth_token(document: &Html) -> Option<String> {
    let form = html::find_by_id(document.root_element(), JS_FORM_ID)?;
    form.select(&AUTH_TOKEN_INPUT)
        .find_map(|input| input.value().attr("value"))
        .map(str::to_string)
}
