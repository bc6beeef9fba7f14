//! Dashboard connection types
//!
//! One [`DomainConfig`] per paginated entity, with the node types the
//! dashboard renders. Documents are stored camelCase with an `_key`.

use async_graphql::SimpleObject;
use serde::Deserialize;

use crate::config::DomainConfig;
use crate::define_connection;
use crate::order::{KeyExtractor, ValueKind};

/// Latest scan status per protocol
#[derive(SimpleObject, Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DomainStatus {
    pub dkim: Option<String>,
    pub dmarc: Option<String>,
    pub https: Option<String>,
    pub spf: Option<String>,
    pub ssl: Option<String>,
}

#[derive(SimpleObject, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    #[serde(rename = "_key")]
    #[graphql(name = "id")]
    pub key: String,
    pub domain: String,
    pub last_ran: Option<String>,
    #[serde(default)]
    pub status: DomainStatus,
}

#[derive(SimpleObject, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(rename = "_key")]
    #[graphql(name = "id")]
    pub key: String,
    pub name: String,
    pub acronym: String,
    pub slug: String,
    pub zone: Option<String>,
    pub sector: Option<String>,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub domain_count: i64,
}

#[derive(SimpleObject, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceTag {
    #[serde(rename = "_key")]
    #[graphql(name = "tagId")]
    pub key: String,
    pub tag_name: String,
    pub guidance: String,
    #[serde(default)]
    pub ref_links: Vec<String>,
}

/// DMARC message counts or percentages for one period
#[derive(SimpleObject, Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DmarcCategories {
    pub fail: f64,
    pub pass: f64,
    pub pass_dkim_only: f64,
    pub pass_spf_only: f64,
}

#[derive(SimpleObject, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmarcSummary {
    #[serde(rename = "_key")]
    #[graphql(name = "id")]
    pub key: String,
    pub domain: String,
    #[serde(default)]
    pub total_messages: i64,
    #[serde(default)]
    pub category_totals: DmarcCategories,
    #[serde(default)]
    pub category_percentages: DmarcCategories,
}

#[derive(SimpleObject, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DkimResult {
    #[serde(rename = "_key")]
    #[graphql(name = "id")]
    pub key: String,
    pub selector: String,
    pub record: Option<String>,
    pub key_length: Option<String>,
}

define_connection!(DomainConnection, DomainEdge, Domain);
define_connection!(OrganizationConnection, OrganizationEdge, Organization);
define_connection!(GuidanceTagConnection, GuidanceTagEdge, GuidanceTag);
define_connection!(DmarcSummaryConnection, DmarcSummaryEdge, DmarcSummary);
define_connection!(DkimResultConnection, DkimResultEdge, DkimResult);

pub fn domains() -> DomainConfig {
    DomainConfig::new("domains", "domains")
        .connection_name("domain")
        .loader_name("domainLoaderConnectionsByUserId")
        .order_field("domain", "domain", ValueKind::Text)
        .order_field("last-ran", "lastRan", ValueKind::Timestamp)
        .order_field("dkim-status", "status.dkim", ValueKind::Text)
        .order_field("dmarc-status", "status.dmarc", ValueKind::Text)
        .order_field("https-status", "status.https", ValueKind::Text)
        .order_field("spf-status", "status.spf", ValueKind::Text)
        .order_field("ssl-status", "status.ssl", ValueKind::Text)
        .search_field("domain")
}

pub fn organizations() -> DomainConfig {
    DomainConfig::new("organizations", "organizations")
        .connection_name("organization")
        .loader_name("orgLoaderConnectionsByUserId")
        .order_field("acronym", "acronym", ValueKind::Text)
        .order_field("name", "name", ValueKind::Text)
        .order_field("slug", "slug", ValueKind::Text)
        .order_field("zone", "zone", ValueKind::Text)
        .order_field("sector", "sector", ValueKind::Text)
        .order_field("country", "country", ValueKind::Text)
        .order_field("province", "province", ValueKind::Text)
        .order_field("city", "city", ValueKind::Text)
        .order_field("verified", "verified", ValueKind::Boolean)
        .order_field("domain-count", "domainCount", ValueKind::Number)
        .search_field("name")
        .search_field("acronym")
}

pub fn guidance_tags() -> DomainConfig {
    DomainConfig::new("guidanceTags", "guidanceTags")
        .connection_name("GuidanceTag")
        .loader_name("loadGuidanceTagConnectionsByTagId")
        .order_field("tag-id", "_key", ValueKind::Text)
        .order_field("tag-name", "tagName", ValueKind::Text)
        .order_field("guidance", "guidance", ValueKind::Text)
}

pub fn dmarc_summaries() -> DomainConfig {
    DomainConfig::new("dmarcSummaries", "dmarcSummaries")
        .connection_name("DmarcSummaries")
        .loader_name("loadDmarcSummaryConnectionsByUserId")
        .order_field("domain", "domain", ValueKind::Text)
        .order_field("total-messages", "totalMessages", ValueKind::Number)
        .order_field("fail-count", "categoryTotals.fail", ValueKind::Number)
        .order_field("pass-count", "categoryTotals.pass", ValueKind::Number)
        .order_field("pass-dkim-count", "categoryTotals.passDkimOnly", ValueKind::Number)
        .order_field("pass-spf-count", "categoryTotals.passSpfOnly", ValueKind::Number)
        .order_field("fail-percentage", "categoryPercentages.fail", ValueKind::Number)
        .order_field("pass-percentage", "categoryPercentages.pass", ValueKind::Number)
        .order_field(
            "pass-dkim-percentage",
            "categoryPercentages.passDkimOnly",
            ValueKind::Number,
        )
        .order_field(
            "pass-spf-percentage",
            "categoryPercentages.passSpfOnly",
            ValueKind::Number,
        )
        .search_field("domain")
}

pub fn dkim_results() -> DomainConfig {
    DomainConfig::new("dkimResult", "dkimResults")
        .connection_name("dkimResults")
        .loader_name("dkimResultsLoaderConnectionByDkimId")
        .key_extractor(KeyExtractor::Numeric)
}
