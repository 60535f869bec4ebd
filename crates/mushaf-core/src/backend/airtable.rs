//! Airtable backend adapter
//!
//! Speaks the Airtable REST API directly: records are selected with
//! `filterByFormula` on the (surah_number, ayah_number, word_index) columns,
//! and writes go through Airtable's native `performUpsert` so the
//! insert-or-update decision happens atomically on their side.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::error::{BackendError, BackendResult};
use super::{UpsertOutcome, WordRecord, REQUEST_TIMEOUT};
use crate::config::Config;
use crate::models::{Ayah, Surah, Word, WordKey};

const API_ROOT: &str = "https://api.airtable.com/v0";

/// The three columns forming a word's identity; upserts merge on these
const MERGE_FIELDS: [&str; 3] = ["surah_number", "ayah_number", "word_index"];

/// Adapter for the Airtable table-based REST API
pub struct AirtableBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// One listed record; the envelope's `id` is ignored, identity lives in
/// the (surah_number, ayah_number, word_index) columns
#[derive(Debug, Deserialize)]
struct AirtableRecord {
    fields: WordRecord,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    /// Present when more pages remain
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    records: Vec<UpsertedRecord>,
}

#[derive(Debug, Deserialize)]
struct UpsertedRecord {
    id: String,
}

impl AirtableBackend {
    /// Build an adapter if the minimum credentials (API key + base ID)
    /// are present
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.airtable_api_key.clone()?;
        let base_id = config.airtable_base_id.clone()?;
        Some(Self::new(api_key, &base_id, &config.airtable_table))
    }

    pub fn new(api_key: String, base_id: &str, table: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: format!("{}/{}/{}", API_ROOT, base_id, urlencoding::encode(table)),
        }
    }

    /// Fetch one word record by its identity triple
    pub async fn fetch_word(&self, key: WordKey) -> BackendResult<Option<WordRecord>> {
        let formula = format!(
            "AND({{surah_number}} = {}, {{ayah_number}} = {}, {{word_index}} = {})",
            key.surah, key.ayah, key.word
        );
        let url = self.filter_url(&formula, "&maxRecords=1");

        let page = self.list_page(&url).await?;
        Ok(page.records.into_iter().next().map(|r| r.fields))
    }

    /// Fetch all word records for a surah and assemble them into a `Surah`
    ///
    /// Records come back sorted by ayah number then word position; ayah-level
    /// text is reassembled by joining its words.
    pub async fn fetch_surah(&self, surah_number: u32) -> BackendResult<Option<Surah>> {
        let formula = format!("{{surah_number}} = {}", surah_number);
        let sort = "&sort[0][field]=ayah_number&sort[1][field]=word_index";
        let mut url = self.filter_url(&formula, sort);

        let mut records = Vec::new();
        loop {
            let page = self.list_page(&url).await?;
            records.extend(page.records);
            match page.offset {
                Some(offset) => {
                    url = format!(
                        "{}&offset={}",
                        self.filter_url(&formula, sort),
                        urlencoding::encode(&offset)
                    );
                }
                None => break,
            }
        }

        debug!(
            "Fetched {} word records for surah {} from Airtable",
            records.len(),
            surah_number
        );
        Ok(assemble_surah(
            surah_number,
            records.into_iter().map(|r| r.fields),
        ))
    }

    /// Atomic insert-or-update keyed on the identity columns
    pub async fn upsert_word(&self, record: &WordRecord) -> BackendResult<UpsertOutcome> {
        let body = json!({
            "performUpsert": { "fieldsToMergeOn": MERGE_FIELDS },
            "records": [ { "fields": record } ],
        });

        let response = self
            .client
            .patch(&self.base_url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: UpsertResponse = response.json().await?;
        let record_id = parsed
            .records
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| {
                BackendError::Unexpected("upsert response contained no records".to_string())
            })?;

        Ok(UpsertOutcome { record_id })
    }

    /// Fetch one page of a filtered listing
    async fn list_page(&self, url: &str) -> BackendResult<ListResponse> {
        let response = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json().await?)
    }

    /// Build a listing URL with an encoded `filterByFormula` plus raw extras
    fn filter_url(&self, formula: &str, extra: &str) -> String {
        format!(
            "{}?filterByFormula={}{}",
            self.base_url,
            urlencoding::encode(formula),
            extra
        )
    }
}

/// Group flat word records into a surah with ordered ayat
///
/// Returns `None` when no records exist for the surah.
fn assemble_surah(
    surah_number: u32,
    records: impl Iterator<Item = WordRecord>,
) -> Option<Surah> {
    let mut by_ayah: BTreeMap<u32, Vec<WordRecord>> = BTreeMap::new();
    for record in records {
        by_ayah.entry(record.ayah_number).or_default().push(record);
    }
    if by_ayah.is_empty() {
        return None;
    }

    let ayat = by_ayah
        .into_iter()
        .map(|(ayah_number, mut words)| {
            words.sort_by_key(|r| r.word_index);
            let join = |f: fn(&WordRecord) -> &str| {
                words.iter().map(f).collect::<Vec<_>>().join(" ")
            };
            let recitation_url = words
                .iter()
                .map(|r| r.recitation_url.as_str())
                .find(|url| !url.is_empty())
                .unwrap_or_default()
                .to_string();
            Ayah {
                ayah_number,
                arabic: join(|r| &r.arabic),
                transliteration: join(|r| &r.transliteration),
                translation: join(|r| &r.translation),
                recitation_url,
                words: words
                    .iter()
                    .map(|r| Word {
                        arabic: r.arabic.clone(),
                        transliteration: r.transliteration.clone(),
                        translation: r.translation.clone(),
                        analysis: r.analysis(),
                    })
                    .collect(),
            }
        })
        .collect();

    Some(Surah {
        surah_number,
        surah_name: format!("Surah {}", surah_number),
        ayat,
    })
}

/// Convert a non-2xx response into an `Api` error, consuming the body
async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    BackendError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WordAnalysis;
    use chrono::Utc;

    fn record(ayah: u32, word: u32, arabic: &str, translation: &str) -> WordRecord {
        WordRecord {
            surah_number: 1,
            ayah_number: ayah,
            word_index: word,
            arabic: arabic.to_string(),
            transliteration: String::new(),
            translation: translation.to_string(),
            root: String::new(),
            root_explanation: String::new(),
            grammar_type: String::new(),
            grammar_details: String::new(),
            recitation_url: String::new(),
            last_modified: Utc::now(),
        }
    }

    #[test]
    fn test_filter_url_encodes_formula() {
        let backend = AirtableBackend::new("key".to_string(), "appBase", "Quran_Words");
        let url = backend.filter_url("{surah_number} = 1", "");
        assert_eq!(
            url,
            "https://api.airtable.com/v0/appBase/Quran_Words?filterByFormula=%7Bsurah_number%7D%20%3D%201"
        );
    }

    #[test]
    fn test_base_url_encodes_table_name() {
        let backend = AirtableBackend::new("key".to_string(), "appBase", "My Words");
        assert!(backend.base_url.ends_with("/My%20Words"));
    }

    #[test]
    fn test_from_config_requires_both_credentials() {
        let mut config = Config {
            airtable_api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(AirtableBackend::from_config(&config).is_none());

        config.airtable_base_id = Some("base".to_string());
        assert!(AirtableBackend::from_config(&config).is_some());
    }

    #[test]
    fn test_assemble_surah_groups_and_orders() {
        // Deliberately out of order
        let records = vec![
            record(2, 1, "لِلَّهِ", "to Allah"),
            record(1, 0, "بِسْمِ", "In the name"),
            record(2, 0, "الْحَمْدُ", "All praise"),
            record(1, 1, "اللَّهِ", "of Allah"),
        ];

        let surah = assemble_surah(1, records.into_iter()).unwrap();
        assert_eq!(surah.surah_number, 1);
        assert_eq!(surah.ayat.len(), 2);

        let first = &surah.ayat[0];
        assert_eq!(first.ayah_number, 1);
        assert_eq!(first.arabic, "بِسْمِ اللَّهِ");
        assert_eq!(first.translation, "In the name of Allah");
        assert_eq!(first.words.len(), 2);

        let second = &surah.ayat[1];
        assert_eq!(second.words[0].arabic, "الْحَمْدُ");
        assert_eq!(second.words[1].arabic, "لِلَّهِ");
    }

    #[test]
    fn test_assemble_surah_empty_is_none() {
        assert!(assemble_surah(5, std::iter::empty()).is_none());
    }

    #[test]
    fn test_list_page_deserializes_airtable_envelope() {
        // Real listings carry record ids and timestamps around the fields
        let body = json!({
            "records": [{
                "id": "recAbc123",
                "createdTime": "2024-01-01T00:00:00.000Z",
                "fields": {
                    "surah_number": 1,
                    "ayah_number": 1,
                    "word_index": 0,
                    "arabic": "بِسْمِ",
                    "translation": "In the name"
                }
            }],
            "offset": "itrNext"
        });

        let page: ListResponse = serde_json::from_value(body).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].fields.key(), WordKey::new(1, 1, 0));
        assert_eq!(page.offset.as_deref(), Some("itrNext"));
    }

    #[test]
    fn test_upsert_payload_shape() {
        let mut rec = record(1, 0, "بِسْمِ", "In the name");
        rec.root = "س م و".to_string();
        rec.grammar_type = "Phrase".to_string();

        let body = json!({
            "performUpsert": { "fieldsToMergeOn": MERGE_FIELDS },
            "records": [ { "fields": rec } ],
        });

        assert_eq!(
            body["performUpsert"]["fieldsToMergeOn"][0],
            "surah_number"
        );
        let fields = &body["records"][0]["fields"];
        assert_eq!(fields["surah_number"], 1);
        assert_eq!(fields["root"], "س م و");
        assert_eq!(fields["grammar_type"], "Phrase");
    }

    #[test]
    fn test_record_analysis_mapping() {
        let mut rec = record(1, 1, "", "");
        rec.grammar_type = "Adjective".to_string();
        rec.grammar_details = "Matches Allah in case".to_string();
        rec.root = "ر ح م".to_string();

        let analysis: WordAnalysis = rec.analysis();
        assert_eq!(analysis.word_type, "Adjective");
        assert_eq!(analysis.grammar, "Matches Allah in case");
        assert_eq!(analysis.root, "ر ح م");
    }
}
