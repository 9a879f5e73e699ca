//! HTTP driver for the river.go.jp search form.
//!
//! The site answers a search in three steps: the search page holds a form with
//! the period inputs, submitting it yields a page whose first link opens the
//! data, and the data page carries the records inside a `<pre>` element.

use chrono::NaiveDate;
use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::config::ClientConfig;
use crate::error::{Result, ScrapeError};
use crate::submit::{poll_until, FormSubmitter};

/// The first six inputs of the form are start year, month, day and end year, month, day.
pub const DATE_INPUTS: usize = 6;
/// Input that submits the search.
pub const SUBMIT_INPUT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub name: Option<String>,
    pub value: String,
    pub kind: String,
    pub checked: bool,
}

impl FormInput {
    fn is_button(&self) -> bool {
        matches!(
            self.kind.as_str(),
            "submit" | "button" | "image" | "reset"
        )
    }
}

#[derive(Debug, Clone)]
pub struct SearchForm {
    pub action: Url,
    pub method: FormMethod,
    /// Every `<input>` of the page in document order.
    pub inputs: Vec<FormInput>,
    /// `(name, value)` of `<select>` elements, with the selected option or the first one.
    pub selects: Vec<(String, String)>,
}

impl SearchForm {
    /// Builds the query a browser would send after typing the period into the
    /// date inputs and pressing the search button.
    pub fn fields_for(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<(String, String)>> {
        if self.inputs.len() <= SUBMIT_INPUT {
            return Err(ScrapeError::FormLayout {
                found: self.inputs.len(),
                needed: SUBMIT_INPUT + 1,
            });
        }

        let dates = [
            start.format("%Y").to_string(),
            start.format("%m").to_string(),
            start.format("%d").to_string(),
            end.format("%Y").to_string(),
            end.format("%m").to_string(),
            end.format("%d").to_string(),
        ];

        let mut fields = Vec::new();
        for (idx, input) in self.inputs.iter().enumerate() {
            let Some(name) = &input.name else {
                continue;
            };
            let value = if idx < DATE_INPUTS {
                dates[idx].clone()
            } else if idx == SUBMIT_INPUT {
                input.value.clone()
            } else if input.is_button() {
                continue;
            } else if matches!(input.kind.as_str(), "checkbox" | "radio") && !input.checked {
                continue;
            } else {
                input.value.clone()
            };
            fields.push((name.clone(), value));
        }
        fields.extend(self.selects.iter().cloned());

        Ok(fields)
    }
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

fn resolve(base: &Url, href: &str) -> Result<Url> {
    base.join(href).map_err(|e| ScrapeError::InvalidUrl {
        url: href.to_string(),
        reason: e.to_string(),
    })
}

pub fn parse_search_form(html: &str, page_url: &Url) -> Result<SearchForm> {
    let document = Html::parse_document(html);

    let form = document
        .select(&selector("form"))
        .next()
        .ok_or_else(|| ScrapeError::FormNotFound {
            url: page_url.to_string(),
        })?;

    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => resolve(page_url, action)?,
        _ => page_url.clone(),
    };
    let method = match form.value().attr("method") {
        Some(method) if method.eq_ignore_ascii_case("post") => FormMethod::Post,
        _ => FormMethod::Get,
    };

    let inputs = document
        .select(&selector("input"))
        .map(|input| {
            let element = input.value();
            FormInput {
                name: element.attr("name").map(str::to_string),
                value: element.attr("value").unwrap_or_default().to_string(),
                kind: element
                    .attr("type")
                    .unwrap_or("text")
                    .to_ascii_lowercase(),
                checked: element.attr("checked").is_some(),
            }
        })
        .collect();

    let option_selector = selector("option");
    let selects = document
        .select(&selector("select"))
        .filter_map(|select| {
            let name = select.value().attr("name")?.to_string();
            let options: Vec<ElementRef> = select.select(&option_selector).collect();
            let chosen = options
                .iter()
                .find(|option| option.value().attr("selected").is_some())
                .or_else(|| options.first())?;
            let value = chosen
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| chosen.text().collect::<String>().trim().to_string());
            Some((name, value))
        })
        .collect();

    Ok(SearchForm {
        action,
        method,
        inputs,
        selects,
    })
}

/// The target of the first `<a href>` on the page, if any.
pub fn find_first_link(html: &str, page_url: &Url) -> Result<Option<Url>> {
    let document = Html::parse_document(html);
    let href = document
        .select(&selector("a[href]"))
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty());

    href.map(|href| resolve(page_url, href)).transpose()
}

/// Text of the first `<pre>` element, without surrounding blank lines.
pub fn extract_pre_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let pre = document.select(&selector("pre")).next();
    pre.map(|pre| trim_blank_lines(&pre.text().collect::<String>()))
}

fn trim_blank_lines(text: &str) -> String {
    text.trim_matches(|c| c == '\n' || c == '\r').to_string()
}

struct Page {
    url: Url,
    body: String,
    is_html: bool,
}

/// `FormSubmitter` over a blocking reqwest session with a cookie store.
pub struct RiverDbClient {
    client: Client,
    config: ClientConfig,
    form: SearchForm,
    pending: bool,
}

impl RiverDbClient {
    /// Opens the search page for the configured observatory and reads its form.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;

        let search_url = config.search_url();
        let url = Url::parse(&search_url).map_err(|e| ScrapeError::InvalidUrl {
            url: search_url.clone(),
            reason: e.to_string(),
        })?;

        info!("Opening {}", url);
        let page = fetch(client.get(url), &config.default_charset)?;
        let form = parse_search_form(&page.body, &page.url)?;
        debug!(
            "Search form posts to {} with {} inputs",
            form.action,
            form.inputs.len()
        );

        Ok(Self {
            client,
            config,
            form,
            pending: false,
        })
    }

    fn search_request(&self, fields: &[(String, String)]) -> RequestBuilder {
        match self.form.method {
            FormMethod::Get => self.client.get(self.form.action.clone()).query(fields),
            FormMethod::Post => self.client.post(self.form.action.clone()).form(fields),
        }
    }
}

impl FormSubmitter for RiverDbClient {
    fn submit(&mut self, start: NaiveDate, end: NaiveDate) -> Result<String> {
        if self.pending {
            return Err(ScrapeError::AdapterNotReset);
        }
        self.pending = true;

        let fields = self.form.fields_for(start, end)?;
        let charset = self.config.default_charset.clone();
        let attempts = self.config.ready_attempts;
        let interval = self.config.ready_interval;

        let data_url = poll_until("search result", attempts, interval, || {
            let page = fetch(self.search_request(&fields), &charset)?;
            find_first_link(&page.body, &page.url)
        })?;

        debug!("Following {}", data_url);
        poll_until("data page", attempts, interval, || {
            let page = fetch(self.client.get(data_url.clone()), &charset)?;
            if page.is_html {
                Ok(extract_pre_text(&page.body))
            } else {
                Ok(Some(trim_blank_lines(&page.body)))
            }
        })
    }

    fn reset(&mut self) -> Result<()> {
        self.pending = false;
        Ok(())
    }
}

fn fetch(request: RequestBuilder, default_charset: &str) -> Result<Page> {
    let response = request.send()?.error_for_status()?;
    let url = response.url().clone();
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("html"))
        .unwrap_or(true);
    let body = response.text_with_charset(default_charset)?;

    Ok(Page { url, body, is_html })
}
