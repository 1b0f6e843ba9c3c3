use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::scrape::record::FlattenedDocument;

/// Container attribute values whose contents are worth flattening. Wikidot
/// renders the page body inside these two divs; everything else is chrome.
const TRACKED_CONTAINERS: [&str; 2] = ["page-title page-header", "page-content"];

const CONTAINER_TAG: &[u8] = b"div";

/// Tokenizer errors tolerated per page before the pass gives up and returns
/// whatever was flattened so far.
const MAX_TOKENIZER_ERRORS: usize = 64;

/// Converts raw wiki HTML into a flattened, line-delimited pseudo-markdown
/// document. Single pass over tokenizer events, no DOM, no backtracking:
/// only content inside one tracked container region is emitted, with a small
/// fixed set of inline tags mapped to markup tokens.
///
/// Malformed markup is logged and skipped; the pass always returns the
/// best-effort output accumulated so far.
pub fn convert(html: &[u8]) -> FlattenedDocument {
    let text = String::from_utf8_lossy(html);
    let mut reader = Reader::from_str(&text);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut converter = MarkupConverter::default();
    let mut tokenizer_errors = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) => converter.open_tag(&tag),
            Ok(Event::Empty(tag)) => {
                // A self-closed tag is an open immediately followed by its
                // close, for depth bookkeeping and token emission alike.
                converter.open_tag(&tag);
                converter.close_tag(tag.name().as_ref());
            }
            Ok(Event::End(tag)) => converter.close_tag(tag.name().as_ref()),
            Ok(Event::Text(text)) => match text.unescape() {
                Ok(unescaped) => converter.text(&unescaped),
                Err(error) => {
                    // Unknown entities degrade to their raw spelling.
                    warn!(error = %error, "could not unescape text node; keeping raw text");
                    converter.text(&String::from_utf8_lossy(text.as_ref()));
                }
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                tokenizer_errors += 1;
                warn!(
                    error = %error,
                    position = reader.buffer_position(),
                    "tokenizer could not advance cleanly; continuing"
                );
                if tokenizer_errors >= MAX_TOKENIZER_ERRORS {
                    warn!("too many tokenizer errors; returning partial output");
                    break;
                }
            }
        }
    }

    FlattenedDocument::from_text(&converter.output)
}

/// Streaming converter state. `div_depth` counts every container open/close
/// regardless of region tracking; `active_region_depth` is the depth the
/// current tracked region was entered at, or `None` outside a region.
#[derive(Default)]
struct MarkupConverter {
    output: String,
    div_depth: usize,
    active_region_depth: Option<usize>,
}

impl MarkupConverter {
    fn in_region(&self) -> bool {
        self.active_region_depth.is_some()
    }

    fn text(&mut self, data: &str) {
        if self.in_region() {
            self.output.push_str(data.trim());
        }
    }

    fn open_tag(&mut self, tag: &BytesStart<'_>) {
        let name = tag.name().as_ref().to_ascii_lowercase();

        if name == CONTAINER_TAG {
            // First tracked container wins; a nested match while a region is
            // active does not start a new one.
            if !self.in_region() && is_tracked_container(tag) {
                self.active_region_depth = Some(self.div_depth);
            }
            self.div_depth += 1;
        }

        if !self.in_region() {
            return;
        }
        match name.as_slice() {
            b"strong" => self.output.push_str("**"),
            b"em" => self.output.push('*'),
            b"br" | b"p" => self.output.push('\n'),
            b"span" => self.output.push_str("__**"),
            b"th" => self.output.push_str("__ "),
            b"li" => self.output.push_str("• "),
            b"a" => self.output.push(' '),
            _ => {}
        }
    }

    fn close_tag(&mut self, raw_name: &[u8]) {
        let name = raw_name.to_ascii_lowercase();

        if name == CONTAINER_TAG {
            self.div_depth = self.div_depth.saturating_sub(1);
            if self.active_region_depth == Some(self.div_depth) {
                self.active_region_depth = None;
            }
            return;
        }

        if !self.in_region() {
            return;
        }
        match name.as_slice() {
            b"strong" => self.output.push_str("** "),
            b"em" => self.output.push_str("* "),
            b"p" | b"tr" | b"li" => self.output.push('\n'),
            b"span" => self.output.push_str("**__"),
            b"th" => self.output.push_str("__\t\t\t"),
            b"td" => self.output.push_str("\t\t\t"),
            _ => {}
        }
    }
}

fn is_tracked_container(tag: &BytesStart<'_>) -> bool {
    for attribute in tag.attributes().flatten() {
        let key = attribute.key.as_ref();
        if key != b"class" && key != b"id" {
            continue;
        }
        let value = match attribute.unescape_value() {
            Ok(value) => value,
            Err(_) => String::from_utf8_lossy(&attribute.value).into_owned().into(),
        };
        if TRACKED_CONTAINERS.contains(&value.as_ref()) {
            return true;
        }
    }
    false
}
