//! Wiki page scraping: slug/URL shaping, the page fetch seam, and the
//! fetch → flatten → extract → render pipeline for spell and item cards.

pub mod card;
pub mod markup;
pub mod record;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::errors::LookupError;
use crate::scrape::card::Card;
use crate::scrape::record::{FlattenedDocument, ItemRecord, SpellRecord};

pub const DEFAULT_WIKI_BASE_URL: &str = "http://dnd5e.wikidot.com";
pub const SPELL_CATEGORY: &str = "Spell";
pub const ITEM_CATEGORY: &str = "Wondrous Items";

/// Normalizes one URL component the way the wiki slugs its pages: lower
/// case, runs of slashes and spaces collapsed to a single hyphen, and
/// everything that is not an ASCII letter or hyphen stripped.
pub fn slug(component: &str) -> String {
    let mut collapsed = String::with_capacity(component.len());
    let mut in_separator_run = false;
    for ch in component.to_lowercase().chars() {
        if ch == '/' || ch == ' ' {
            if !in_separator_run {
                collapsed.push('-');
                in_separator_run = true;
            }
        } else {
            collapsed.push(ch);
            in_separator_run = false;
        }
    }
    collapsed.retain(|ch| ch.is_ascii_alphabetic() || ch == '-');
    collapsed
}

pub fn page_path(category: &str, name: &str) -> String {
    format!("{}:{}", slug(category), slug(name))
}

pub fn page_url(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("page fetch failed for `{url}`: {reason}")]
    Unreachable { url: String, reason: String },
}

/// Seam to the network: callers hand in raw page bytes, the pipeline never
/// opens a connection itself.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

async fn fetch_document(
    fetcher: &dyn PageFetcher,
    base_url: &str,
    category: &str,
    name: &str,
) -> Result<FlattenedDocument, FetchError> {
    let url = page_url(base_url, &page_path(category, name));
    debug!(%url, "looking up wiki page");
    let html = fetcher.fetch_page(&url).await?;
    Ok(markup::convert(&html))
}

pub async fn fetch_spell_card(
    fetcher: &dyn PageFetcher,
    base_url: &str,
    spell_name: &str,
) -> Result<Card, LookupError> {
    let document = fetch_document(fetcher, base_url, SPELL_CATEGORY, spell_name).await?;
    let record = SpellRecord::from_document(&document)?;
    Ok(record.to_card())
}

pub async fn fetch_item_card(
    fetcher: &dyn PageFetcher,
    base_url: &str,
    item_name: &str,
) -> Result<Card, LookupError> {
    let document = fetch_document(fetcher, base_url, ITEM_CATEGORY, item_name).await?;
    let record = ItemRecord::from_document(&document)?;
    Ok(record.to_card())
}
