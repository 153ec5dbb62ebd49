//! Builder for configuring analyzer instances

use std::sync::Arc;
use std::time::Duration;

use super::{FoodAnalyzer, VisionExtractor};
use crate::cache::{CacheConfig, LookupCache};
use crate::providers::openai::OPENROUTER_DEFAULT_MODEL;
use crate::providers::{
    NutritionDatabase, OpenAiClient, RetryConfig, RetryingGenerator, StructuredGenerator,
    UsdaClient,
};
use crate::resolve::{
    CachingResolver, DatabaseResolver, EstimationResolver, Resolver, ResolverChain,
};
use crate::types::{EventSink, GenerateOptions, TracingSink};
use crate::{PlatewiseError, Result};

/// Main entry point for creating analyzer instances.
pub struct Platewise;

impl Platewise {
    /// Create a new builder for configuring the analyzer.
    pub fn builder() -> PlatewiseBuilder {
        PlatewiseBuilder::new()
    }
}

/// Builder for configuring analyzer instances.
///
/// ```rust,no_run
/// # use platewise::Platewise;
/// let analyzer = Platewise::builder()
///     .openai("sk-...")
///     .usda("DEMO_KEY")
///     .build()?;
/// # Ok::<(), platewise::PlatewiseError>(())
/// ```
pub struct PlatewiseBuilder {
    openai_key: Option<String>,
    openrouter_key: Option<String>,
    generator: Option<Arc<dyn StructuredGenerator>>,
    usda_key: Option<String>,
    database: Option<Arc<dyn NutritionDatabase>>,
    vision_model: Option<String>,
    estimator_model: Option<String>,
    temperature: Option<f32>,
    page_size: Option<u32>,
    lookup_cache: Option<CacheConfig>,
    retry: Option<RetryConfig>,
    event_sink: Option<Arc<dyn EventSink>>,
    timeout: Option<Duration>,
}

impl Default for PlatewiseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatewiseBuilder {
    pub fn new() -> Self {
        Self {
            openai_key: None,
            openrouter_key: None,
            generator: None,
            usda_key: None,
            database: None,
            vision_model: None,
            estimator_model: None,
            temperature: None,
            page_size: None,
            lookup_cache: None,
            retry: None,
            event_sink: None,
            timeout: None,
        }
    }

    /// Use the OpenAI API for vision and estimation.
    pub fn openai(mut self, api_key: impl Into<String>) -> Self {
        self.openai_key = Some(api_key.into());
        self
    }

    /// Use OpenRouter for vision and estimation. Takes precedence over
    /// [`openai()`](Self::openai) when both are set.
    pub fn openrouter(mut self, api_key: impl Into<String>) -> Self {
        self.openrouter_key = Some(api_key.into());
        self
    }

    /// Use a custom structured-generation provider. Takes precedence over
    /// any API key.
    pub fn generator(mut self, generator: Arc<dyn StructuredGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Use USDA FoodData Central with the given API key.
    pub fn usda(mut self, api_key: impl Into<String>) -> Self {
        self.usda_key = Some(api_key.into());
        self
    }

    /// Use a custom nutrition database. Takes precedence over
    /// [`usda()`](Self::usda).
    pub fn database(mut self, database: Arc<dyn NutritionDatabase>) -> Self {
        self.database = Some(database);
        self
    }

    /// Model used for vision extraction.
    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = Some(model.into());
        self
    }

    /// Model used for nutrient estimation.
    pub fn estimator_model(mut self, model: impl Into<String>) -> Self {
        self.estimator_model = Some(model.into());
        self
    }

    /// Sampling temperature for both vision and estimation calls.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Candidates requested per database search (default 10).
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Enable the database lookup cache.
    pub fn lookup_cache(mut self, config: CacheConfig) -> Self {
        self.lookup_cache = Some(config);
        self
    }

    /// Retry transient generation failures. The database is never retried.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Receive pipeline events. Default: [`TracingSink`].
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Per-request timeout for the built-in HTTP clients.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the analyzer.
    ///
    /// Requires a structured-generation provider. Without a database the
    /// chain holds only the estimator.
    pub fn build(self) -> Result<FoodAnalyzer> {
        let http = reqwest::Client::new();
        let (generator, default_model) = self.build_generator(&http)?;
        let generator = match self.retry {
            Some(config) if config.is_enabled() => {
                Arc::new(RetryingGenerator::new(generator, config)) as Arc<dyn StructuredGenerator>
            }
            _ => generator,
        };

        let temperature = self.temperature;
        let options = |model: Option<&str>| {
            let options = GenerateOptions::default().model(model.unwrap_or(default_model));
            match temperature {
                Some(t) => options.temperature(t),
                None => options,
            }
        };

        let vision = VisionExtractor::new(generator.clone())
            .options(options(self.vision_model.as_deref()));

        let mut chain = ResolverChain::new();
        let mut lookup_cache = None;

        let database = match (self.database, self.usda_key) {
            (Some(database), _) => Some(database),
            (None, Some(key)) => {
                let mut client = UsdaClient::with_http_client(
                    key,
                    crate::providers::usda::DEFAULT_BASE_URL,
                    http.clone(),
                );
                if let Some(timeout) = self.timeout {
                    client = client.timeout(timeout);
                }
                Some(Arc::new(client) as Arc<dyn NutritionDatabase>)
            }
            (None, None) => None,
        };

        if let Some(database) = database {
            let mut resolver = DatabaseResolver::new(database);
            if let Some(page_size) = self.page_size {
                resolver = resolver.page_size(page_size);
            }
            let resolver: Arc<dyn Resolver> = match &self.lookup_cache {
                Some(config) => {
                    let cache = LookupCache::new(config);
                    lookup_cache = Some(cache.clone());
                    Arc::new(CachingResolver::new(Arc::new(resolver), cache))
                }
                None => Arc::new(resolver),
            };
            chain.push(resolver);
        }

        chain.push(Arc::new(
            EstimationResolver::new(generator).options(options(self.estimator_model.as_deref())),
        ));

        let events = self.event_sink.unwrap_or_else(|| Arc::new(TracingSink));
        let analyzer = FoodAnalyzer::new(vision, chain, events);
        Ok(match lookup_cache {
            Some(cache) => analyzer.with_lookup_cache(cache),
            None => analyzer,
        })
    }

    /// Pick the generator and its default model name.
    fn build_generator(
        &self,
        http: &reqwest::Client,
    ) -> Result<(Arc<dyn StructuredGenerator>, &'static str)> {
        if let Some(generator) = &self.generator {
            return Ok((generator.clone(), super::vision::DEFAULT_VISION_MODEL));
        }

        let (client, model) = if let Some(key) = &self.openrouter_key {
            (OpenAiClient::openrouter(key.clone()), OPENROUTER_DEFAULT_MODEL)
        } else if let Some(key) = &self.openai_key {
            (OpenAiClient::new(key.clone()), super::vision::DEFAULT_VISION_MODEL)
        } else {
            return Err(PlatewiseError::Configuration(
                "no structured-generation provider configured (set an OpenAI or OpenRouter key)"
                    .into(),
            ));
        };

        let mut client = client.http_client(http.clone());
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        Ok((Arc::new(client), model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_generator() {
        let err = Platewise::builder().usda("key").build().err().unwrap();
        assert!(matches!(err, PlatewiseError::Configuration(_)));
    }

    #[test]
    fn chain_without_database_is_estimator_only() {
        let analyzer = Platewise::builder().openai("key").build().unwrap();
        assert_eq!(analyzer.strategies(), vec!["ai_estimate"]);
        assert!(analyzer.lookup_cache().is_none());
    }

    #[test]
    fn chain_with_database_and_cache() {
        let analyzer = Platewise::builder()
            .openrouter("key")
            .usda("key")
            .lookup_cache(CacheConfig::default())
            .build()
            .unwrap();
        assert_eq!(analyzer.strategies(), vec!["database", "ai_estimate"]);
        assert!(analyzer.lookup_cache().is_some());
    }
}
