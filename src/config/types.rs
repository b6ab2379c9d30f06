use serde::Deserialize;

/// Browser-like agent string sent when the config does not override it
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collector: CollectorConfig,
    pub output: OutputConfig,
    pub sources: SourcesConfig,
}

/// Dispatcher and fetcher behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Worker pool size: maximum number of jobs in flight at once
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: u32,

    /// Timeout for a single fetch (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            request_timeout_ms: 10_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Where collected data lands on disk
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding the database, archive files and report
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// SQLite file name inside `data_dir`
    #[serde(rename = "database-name")]
    pub database_name: String,

    /// Report file name inside `data_dir`
    #[serde(rename = "report-name")]
    pub report_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: "global_data_collection".to_string(),
            database_name: "global_data.db".to_string(),
            report_name: "collection_report.json".to_string(),
        }
    }
}

/// Statically supplied source groups for one run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Web pages to scrape
    pub pages: Vec<String>,

    /// JSON API endpoints to query
    pub apis: Vec<String>,

    /// RSS feed URLs
    pub feeds: Vec<String>,

    /// News sources, routed to the feed or API parser by URL
    pub news: Vec<String>,

    /// Public dataset landing pages (scraped as pages)
    pub datasets: Vec<String>,

    /// Open government data pages (scraped as pages)
    pub government: Vec<String>,

    /// Social media platforms; these need credentials and are never fetched
    pub social: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        fn owned(urls: &[&str]) -> Vec<String> {
            urls.iter().map(|u| u.to_string()).collect()
        }

        Self {
            pages: owned(&[
                "https://en.wikipedia.org/wiki/Main_Page",
                "https://www.worldometers.info/",
                "https://www.cia.gov/the-world-factbook/",
                "https://www.who.int/data/gho",
            ]),
            apis: owned(&[
                "https://api.publicapis.org/entries",
                "https://restcountries.com/v3.1/all",
                "https://api.spacexdata.com/v4/launches/latest",
            ]),
            feeds: Vec::new(),
            news: owned(&[
                "http://feeds.bbci.co.uk/news/world/rss.xml",
                "https://www.aljazeera.com/xml/rss/all.xml",
                "http://rss.cnn.com/rss/cnn_world.rss",
            ]),
            datasets: owned(&[
                "https://data.worldbank.org/indicator/NY.GDP.MKTP.CD",
                "https://catalog.data.gov/dataset",
                "https://www.kaggle.com/datasets",
                "https://registry.opendata.aws",
            ]),
            government: owned(&[
                "https://www.data.gov",
                "https://www.gov.uk/government/statistics",
                "https://data.europa.eu",
                "https://data.gov.au",
            ]),
            social: Vec::new(),
        }
    }
}

impl SourcesConfig {
    /// Iterates every fetchable URL across all groups, tagged with its group name
    pub fn all_urls(&self) -> impl Iterator<Item = (&'static str, &str)> {
        let groups: [(&'static str, &Vec<String>); 6] = [
            ("pages", &self.pages),
            ("apis", &self.apis),
            ("feeds", &self.feeds),
            ("news", &self.news),
            ("datasets", &self.datasets),
            ("government", &self.government),
        ];

        groups
            .into_iter()
            .flat_map(|(group, urls)| urls.iter().map(move |u| (group, u.as_str())))
    }
}
