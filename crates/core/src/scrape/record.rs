use crate::errors::ExtractError;

/// The line-based intermediate form produced by the markup converter.
///
/// Lines are in document order and never contain an embedded newline;
/// empty lines are preserved because the extractors slice around them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlattenedDocument {
    lines: Vec<String>,
}

impl FlattenedDocument {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn from_text(text: &str) -> Self {
        Self { lines: text.split('\n').map(|line| line.trim_end_matches('\r').to_owned()).collect() }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Line 0 is the record title by convention of the source site.
    pub fn title(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or("")
    }

    /// First line starting with `prefix`. The first occurrence wins; a
    /// missing prefix is a `LabelNotFound`, never a partial match.
    pub fn find_line(&self, prefix: &str) -> Result<&str, ExtractError> {
        self.lines
            .iter()
            .find(|line| line.starts_with(prefix))
            .map(String::as_str)
            .ok_or_else(|| ExtractError::label_not_found(prefix))
    }

    fn position(&self, label: &str) -> Result<usize, ExtractError> {
        self.lines
            .iter()
            .position(|line| line == label)
            .ok_or_else(|| ExtractError::label_not_found(label))
    }

    /// Lines strictly between the first occurrences of two full label
    /// lines. Fails if either label is absent or `first` does not precede
    /// `second`.
    pub fn lines_between(&self, first: &str, second: &str) -> Result<&[String], ExtractError> {
        let start = self.position(first)?;
        let end = self.position(second)?;
        if start >= end {
            return Err(ExtractError::LabelOrder {
                first: first.to_owned(),
                second: second.to_owned(),
            });
        }
        Ok(&self.lines[start + 1..end])
    }

    /// All lines after the first occurrence of the label line, exclusive.
    pub fn lines_after(&self, label: &str) -> Result<&[String], ExtractError> {
        let start = self.position(label)?;
        Ok(&self.lines[start + 1..])
    }
}

const SOURCE_LABEL: &str = "Source: ";
const CASTING_TIME_LABEL: &str = "**Casting Time:";
const RANGE_LABEL: &str = "**Range:** ";
const COMPONENTS_LABEL: &str = "**Components:";
const DURATION_LABEL: &str = "**Duration:";
const SPELL_LISTS_LABEL: &str = "***Spell Lists.";

// Width of each full label prefix, used to slice the value out of its line.
const CASTING_TIME_VALUE_AT: usize = 18;
const RANGE_VALUE_AT: usize = 11;
const COMPONENTS_VALUE_AT: usize = 16;
const DURATION_VALUE_AT: usize = 14;
const SPELL_LISTS_VALUE_AT: usize = 19;

fn label_value(line: &str, offset: usize) -> &str {
    line.get(offset..).unwrap_or("")
}

/// A spell page sliced into named fields. Built once per lookup from freshly
/// fetched text and discarded after the card is rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpellRecord {
    pub name: String,
    pub source: String,
    pub classification: String,
    pub casting_time: String,
    pub range: String,
    pub components: String,
    pub duration: String,
    pub spell_lists: String,
    pub description_lines: Vec<String>,
    pub extra_lines: Vec<String>,
}

impl SpellRecord {
    pub fn from_document(document: &FlattenedDocument) -> Result<Self, ExtractError> {
        let source = document.find_line(SOURCE_LABEL)?.to_owned();
        let casting_time_line = document.find_line(CASTING_TIME_LABEL)?.to_owned();
        let range_line = document.find_line(RANGE_LABEL)?.to_owned();
        let components_line = document.find_line(COMPONENTS_LABEL)?.to_owned();
        let duration_line = document.find_line(DURATION_LABEL)?.to_owned();
        let spell_lists_line = document.find_line(SPELL_LISTS_LABEL)?.to_owned();

        // The classification (school and level) sits on the second line
        // between the source and casting-time labels.
        let classification = document
            .lines_between(&source, &casting_time_line)?
            .get(1)
            .cloned()
            .ok_or_else(|| ExtractError::layout_mismatch("spell classification"))?;

        // The slice between duration and spell-lists is bracketed by blank
        // lines; both are dropped.
        let between = document.lines_between(&duration_line, &spell_lists_line)?;
        let description_lines: Vec<String> =
            if between.len() < 2 { Vec::new() } else { between[1..between.len() - 1].to_vec() };

        let extra_lines = document.lines_after(&spell_lists_line)?.to_vec();

        Ok(Self {
            name: document.title().to_owned(),
            classification,
            casting_time: label_value(&casting_time_line, CASTING_TIME_VALUE_AT).to_owned(),
            range: label_value(&range_line, RANGE_VALUE_AT).to_owned(),
            components: label_value(&components_line, COMPONENTS_VALUE_AT).to_owned(),
            duration: label_value(&duration_line, DURATION_VALUE_AT).to_owned(),
            spell_lists: label_value(&spell_lists_line, SPELL_LISTS_VALUE_AT).to_owned(),
            description_lines,
            extra_lines,
            source,
        })
    }
}

/// A magic item page sliced into named fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemRecord {
    pub name: String,
    pub source: String,
    pub item_type: String,
    pub rarity: String,
    pub attunement: Option<String>,
    pub description_lines: Vec<String>,
}

impl ItemRecord {
    pub fn from_document(document: &FlattenedDocument) -> Result<Self, ExtractError> {
        let source = document.find_line(SOURCE_LABEL)?.to_owned();

        let after_source = document.lines_after(&source)?;
        let metadata_line = after_source
            .get(1)
            .ok_or_else(|| ExtractError::layout_mismatch("item metadata"))?;
        let description_lines =
            after_source.get(2..).map(<[String]>::to_vec).unwrap_or_default();

        let (item_type, rest) = metadata_line
            .trim_matches('*')
            .split_once(',')
            .ok_or_else(|| ExtractError::layout_mismatch("item metadata"))?;
        let rest = rest.trim();

        // "rare (requires attunement by a cleric)" splits into the rarity
        // and the parenthesized attunement clause body.
        let (rarity, attunement) = match rest.find("(requires attunement") {
            Some(clause_start) => {
                let clause = &rest[clause_start + 1..];
                let clause = clause.split_once(')').map(|(body, _)| body).unwrap_or(clause);
                (rest[..clause_start].trim().to_owned(), Some(clause.to_owned()))
            }
            None => (rest.to_owned(), None),
        };

        Ok(Self {
            name: document.title().to_owned(),
            source,
            item_type: item_type.trim().to_owned(),
            rarity,
            attunement,
            description_lines,
        })
    }
}
