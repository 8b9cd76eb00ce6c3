//! NCBI Entrez E-utilities client.
//!
//! Endpoints used:
//!   esearch:  candidate ID search (db=pubmed)
//!   efetch:   full PubMed records as XML
//!   elink:    citation links and pubmed<->gene links
//!   esummary: structured gene summaries (db=gene)
//!
//! Every request passes through the shared [`RateLimiter`] first; the
//! optional API key (which raises NCBI's request ceiling) and contact
//! email are appended to every call.

use anyhow::Context;
use medrag_common::CitationNetwork;
use medrag_config::EntrezConfig;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::rate_limit::RateLimiter;

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

pub const LINKNAME_CITED_IN: &str = "pubmed_pubmed_citedin";
pub const LINKNAME_REFS: &str = "pubmed_pubmed_refs";

pub struct EntrezClient {
    client: Client,
    limiter: Arc<RateLimiter>,
    api_key: Option<String>,
    email: String,
    base_url: String,
}

/// One linkset from an elink response: the source ID(s) it was resolved
/// for plus the per-target-database link lists.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    pub source_ids: Vec<String>,
    pub link_dbs: Vec<LinkDb>,
}

#[derive(Debug, Clone, Default)]
pub struct LinkDb {
    pub db_to: String,
    pub link_name: String,
    pub ids: Vec<String>,
}

/// Raw-ish gene summary as returned by esummary (db=gene).
#[derive(Debug, Clone, Default)]
pub struct GeneSummary {
    pub uid: String,
    pub name: String,
    pub description: String,
    pub chromosome: String,
    pub map_location: String,
    pub organism: String,
    pub aliases: String,
    pub designations: String,
}

impl EntrezClient {
    pub fn new(cfg: &EntrezConfig, limiter: Arc<RateLimiter>) -> Self {
        Self {
            client: Client::new(),
            limiter,
            api_key: cfg.api_key.clone(),
            email: cfg.email.clone(),
            base_url: EUTILS_BASE.to_string(),
        }
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("retmode", "json".to_string())];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        if !self.email.is_empty() {
            params.push(("email", self.email.clone()));
        }
        params
    }

    /// Search a database and return matching IDs.
    #[instrument(skip(self))]
    pub async fn esearch(
        &self,
        db: &str,
        term: &str,
        retmax: usize,
        sort: &str,
    ) -> anyhow::Result<Vec<String>> {
        let mut params = self.base_params();
        params.push(("db", db.to_string()));
        params.push(("term", term.to_string()));
        params.push(("retmax", retmax.to_string()));
        params.push(("sort", sort.to_string()));

        self.limiter.acquire().await;
        let resp: Value = self
            .client
            .get(format!("{}/esearch.fcgi", self.base_url))
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("esearch response was not JSON")?;

        let ids = id_list(&resp["esearchresult"]["idlist"]);
        debug!(n = ids.len(), "esearch returned IDs");
        Ok(ids)
    }

    /// Fetch full PubMed records for a list of PMIDs as raw XML.
    #[instrument(skip(self, pmids), fields(n = pmids.len()))]
    pub async fn efetch_pubmed(&self, pmids: &[String]) -> anyhow::Result<String> {
        if pmids.is_empty() {
            return Ok(String::new());
        }
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", pmids.join(",")),
            ("rettype", "medline".to_string()),
            ("retmode", "xml".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        if !self.email.is_empty() {
            params.push(("email", self.email.clone()));
        }

        self.limiter.acquire().await;
        let xml = self
            .client
            .get(format!("{}/efetch.fcgi", self.base_url))
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(xml)
    }

    /// Resolve ID links between two Entrez databases.
    #[instrument(skip(self, ids), fields(n = ids.len()))]
    pub async fn elink(
        &self,
        db_from: &str,
        db_to: &str,
        ids: &[String],
        link_name: Option<&str>,
    ) -> anyhow::Result<Vec<LinkSet>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut params = self.base_params();
        params.push(("dbfrom", db_from.to_string()));
        params.push(("db", db_to.to_string()));
        params.push(("id", ids.join(",")));
        if let Some(name) = link_name {
            params.push(("linkname", name.to_string()));
        }

        self.limiter.acquire().await;
        let resp: Value = self
            .client
            .get(format!("{}/elink.fcgi", self.base_url))
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("elink response was not JSON")?;

        Ok(parse_linksets(&resp))
    }

    /// Both citation directions for one PMID. Two elink calls; either
    /// direction missing yields an empty list, never an error record.
    pub async fn citations(&self, pmid: &str) -> anyhow::Result<CitationNetwork> {
        let id = vec![pmid.to_string()];
        let cited_by = self
            .elink("pubmed", "pubmed", &id, Some(LINKNAME_CITED_IN))
            .await?;
        let references = self.elink("pubmed", "pubmed", &id, Some(LINKNAME_REFS)).await?;

        Ok(CitationNetwork {
            pmid: pmid.to_string(),
            cited_by: first_link_ids(&cited_by),
            references: first_link_ids(&references),
        })
    }

    /// Fetch structured gene summaries for a list of GeneIDs.
    #[instrument(skip(self, gene_ids), fields(n = gene_ids.len()))]
    pub async fn esummary_gene(&self, gene_ids: &[String]) -> anyhow::Result<Vec<GeneSummary>> {
        if gene_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut params = self.base_params();
        params.push(("db", "gene".to_string()));
        params.push(("id", gene_ids.join(",")));

        self.limiter.acquire().await;
        let resp: Value = self
            .client
            .get(format!("{}/esummary.fcgi", self.base_url))
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("esummary response was not JSON")?;

        let summaries = parse_gene_summaries(&resp);
        debug!(n = summaries.len(), "fetched gene summaries");
        Ok(summaries)
    }
}

fn id_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(id_str).collect())
        .unwrap_or_default()
}

/// Parse an elink JSON response; shapes vary (ids as strings or
/// numbers, missing linksetdbs), so everything is optional.
pub(crate) fn parse_linksets(resp: &Value) -> Vec<LinkSet> {
    let Some(linksets) = resp["linksets"].as_array() else {
        warn!("elink response had no linksets");
        return vec![];
    };
    linksets
        .iter()
        .map(|ls| LinkSet {
            source_ids: id_list(&ls["ids"]),
            link_dbs: ls["linksetdbs"]
                .as_array()
                .map(|dbs| {
                    dbs.iter()
                        .map(|db| LinkDb {
                            db_to: db["dbto"].as_str().unwrap_or_default().to_string(),
                            link_name: db["linkname"].as_str().unwrap_or_default().to_string(),
                            ids: id_list(&db["links"]),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

fn first_link_ids(linksets: &[LinkSet]) -> Vec<String> {
    linksets
        .first()
        .and_then(|ls| ls.link_dbs.first())
        .map(|db| db.ids.clone())
        .unwrap_or_default()
}

pub(crate) fn parse_gene_summaries(resp: &Value) -> Vec<GeneSummary> {
    let result = &resp["result"];
    let Some(uids) = result["uids"].as_array() else {
        warn!("esummary response had no uids");
        return vec![];
    };
    uids.iter()
        .filter_map(id_str)
        .filter_map(|uid| {
            let doc = &result[&uid];
            if !doc.is_object() {
                return None;
            }
            let text = |key: &str| doc[key].as_str().unwrap_or_default().to_string();
            let description = if doc["description"].as_str().map_or(true, str::is_empty) {
                text("summary")
            } else {
                text("description")
            };
            Some(GeneSummary {
                uid,
                name: text("name"),
                description,
                chromosome: text("chromosome"),
                map_location: text("maplocation"),
                organism: doc["organism"]["scientificname"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                aliases: text("otheraliases"),
                designations: text("otherdesignations"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_linksets_with_string_and_numeric_ids() {
        let resp = json!({
            "linksets": [{
                "dbfrom": "pubmed",
                "ids": [34577062],
                "linksetdbs": [{
                    "dbto": "gene",
                    "linkname": "pubmed_gene",
                    "links": ["7157", 672]
                }]
            }]
        });
        let linksets = parse_linksets(&resp);
        assert_eq!(linksets.len(), 1);
        assert_eq!(linksets[0].source_ids, vec!["34577062"]);
        assert_eq!(linksets[0].link_dbs[0].db_to, "gene");
        assert_eq!(linksets[0].link_dbs[0].ids, vec!["7157", "672"]);
    }

    #[test]
    fn missing_linksetdbs_yield_empty_links() {
        let resp = json!({ "linksets": [{ "ids": ["1"] }] });
        let linksets = parse_linksets(&resp);
        assert_eq!(linksets.len(), 1);
        assert!(linksets[0].link_dbs.is_empty());
        assert!(first_link_ids(&linksets).is_empty());
    }

    #[test]
    fn parses_gene_summaries_with_summary_fallback() {
        let resp = json!({
            "result": {
                "uids": ["7157", "672"],
                "7157": {
                    "name": "TP53",
                    "description": "tumor protein p53",
                    "chromosome": "17",
                    "maplocation": "17p13.1",
                    "organism": {"scientificname": "Homo sapiens"},
                    "otheraliases": "P53, LFS1",
                    "otherdesignations": "cellular tumor antigen p53"
                },
                "672": {
                    "name": "BRCA1",
                    "description": "",
                    "summary": "DNA repair associated"
                }
            }
        });
        let summaries = parse_gene_summaries(&resp);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].uid, "7157");
        assert_eq!(summaries[0].organism, "Homo sapiens");
        assert_eq!(summaries[1].description, "DNA repair associated");
        assert!(summaries[1].chromosome.is_empty());
    }

    #[test]
    fn esearch_id_list_tolerates_garbage() {
        assert!(id_list(&json!(null)).is_empty());
        assert_eq!(id_list(&json!(["1", 2, null, ""])), vec!["1", "2"]);
    }
}
