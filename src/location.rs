//! Country and city lists from the countrystatecity API.
//!
//! The lookup only feeds selection inputs; aggregation never depends on it.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::aggregate::compare_names;
use crate::config::LocationConfig;

const API_KEY_HEADER: &str = "X-CSCAPI-KEY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Country {
    pub name: String,
    pub iso2: String,
    #[serde(default)]
    pub emoji: String,
}

impl Country {
    pub fn label(&self) -> String {
        if self.emoji.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.emoji, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct City {
    pub name: String,
}

/// Source of country and city names.
#[allow(async_fn_in_trait)]
pub trait LocationSource {
    async fn countries(&self) -> Result<Vec<Country>>;

    async fn cities(&self, country_code: &str) -> Result<Vec<City>>;
}

pub struct LocationLookup {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LocationLookup {
    pub fn new(config: &LocationConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url}");

        self.http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode response from {url}"))
    }
}

impl LocationSource for LocationLookup {
    async fn countries(&self) -> Result<Vec<Country>> {
        let mut countries: Vec<Country> = self
            .get("/countries")
            .await
            .context("Failed to load countries")?;
        sort_by_name(&mut countries, |country| country.name.as_str());
        Ok(countries)
    }

    async fn cities(&self, country_code: &str) -> Result<Vec<City>> {
        let mut cities: Vec<City> = self
            .get(&format!("/countries/{country_code}/cities"))
            .await
            .context("Failed to load cities")?;
        sort_by_name(&mut cities, |city| city.name.as_str());
        Ok(cities)
    }
}

fn sort_by_name<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| compare_names(name(a), name(b)));
}

/// Country selection state for the signup form: the cached country list and
/// the currently selected country code.
#[derive(Debug, Default, Clone)]
pub struct LocationPicker {
    countries: Vec<Country>,
    selected: Option<String>,
}

impl LocationPicker {
    /// Fetches the country list and preselects `default_country` when the
    /// list contains it. Returns the cities of the preselected country.
    pub async fn load<S: LocationSource>(
        &mut self,
        source: &S,
        default_country: &str,
    ) -> Result<Vec<City>> {
        self.load_countries(source).await?;

        if self.find(default_country).is_some() {
            self.select(source, default_country).await
        } else {
            self.selected = None;
            Ok(Vec::new())
        }
    }

    /// Refreshes the cached country list without touching the selection.
    pub async fn load_countries<S: LocationSource>(&mut self, source: &S) -> Result<()> {
        self.countries = source.countries().await?;
        info!("loaded {} countries", self.countries.len());
        Ok(())
    }

    /// Name of the country with the given ISO2 code. Only the country list is
    /// fetched.
    pub async fn country_name<S: LocationSource>(
        &mut self,
        source: &S,
        country_code: &str,
    ) -> Result<String> {
        if self.countries.is_empty() {
            self.load_countries(source).await?;
        }

        self.find(country_code)
            .map(|country| country.name.clone())
            .with_context(|| format!("unknown country code {country_code}"))
    }

    /// Changes the selected country. An empty code clears the selection.
    pub async fn select<S: LocationSource>(
        &mut self,
        source: &S,
        country_code: &str,
    ) -> Result<Vec<City>> {
        if country_code.is_empty() {
            self.selected = None;
            return Ok(Vec::new());
        }

        self.selected = Some(country_code.to_string());
        source.cities(country_code).await
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn selected(&self) -> Option<&Country> {
        self.selected.as_deref().and_then(|code| self.find(code))
    }

    pub fn find(&self, country_code: &str) -> Option<&Country> {
        self.countries
            .iter()
            .find(|country| country.iso2.eq_ignore_ascii_case(country_code))
    }
}
