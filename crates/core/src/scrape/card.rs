use crate::scrape::record::{ItemRecord, SpellRecord};
use crate::splitter::smart_split;

/// Embed-style presentational card, platform-agnostic. The discord crate
/// maps this onto the wire payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<CardField>,
    pub image_url: Option<String>,
    pub footer: Option<CardFooter>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

pub const CARD_COLOR_YELLOW: u32 = 0xF1C40F;

/// Hard cap on a single field value imposed by the rendering surface.
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// Braille blank (U+2800): the rendering surface rejects empty field names,
/// so continuation fields of a long value carry this filler glyph instead.
pub const BLANK_FIELD_NAME: &str = "\u{2800}";

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            color: CARD_COLOR_YELLOW,
            fields: Vec::new(),
            image_url: None,
            footer: None,
        }
    }

    fn field(&mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) {
        self.fields.push(CardField { name: name.into(), value: value.into(), inline });
    }

    /// Adds a field whose value may exceed the platform limit, splitting it
    /// into continuation fields named with the blank filler glyph.
    fn long_field(&mut self, name: &str, lines: &[String]) {
        let blob = lines.join("\n");
        for (index, group) in smart_split(&blob, FIELD_VALUE_LIMIT).enumerate() {
            let field_name = if index == 0 { name } else { BLANK_FIELD_NAME };
            self.field(field_name, group, false);
        }
    }
}

// School-of-magic icons, keyed by a substring of the spell classification.
const SCHOOL_IMAGES: [(&str, &str); 8] = [
    ("abjuration", "https://media-waterdeep.cursecdn.com/attachments/2/707/abjuration.png"),
    ("conjuration", "https://media-waterdeep.cursecdn.com/attachments/2/708/conjuration.png"),
    ("divination", "https://media-waterdeep.cursecdn.com/attachments/2/709/divination.png"),
    ("enchantment", "https://media-waterdeep.cursecdn.com/attachments/2/702/enchantment.png"),
    ("evocation", "https://media-waterdeep.cursecdn.com/attachments/2/703/evocation.png"),
    ("illusion", "https://media-waterdeep.cursecdn.com/attachments/2/704/illusion.png"),
    ("necromancy", "https://media-waterdeep.cursecdn.com/attachments/2/720/necromancy.png"),
    ("transmutation", "https://media-waterdeep.cursecdn.com/attachments/2/722/transmutation.png"),
];

const ITEM_TYPE_IMAGE_BASE: &str =
    "https://www.dndbeyond.com/content/1-0-1989-0/skins/waterdeep/images/icons/item_types";

const ITEM_TYPE_IMAGES: [(&str, &str); 9] = [
    ("armor", "armor.jpg"),
    ("potion", "potion.jpg"),
    ("ring", "ring.jpg"),
    ("rod", "rod.jpg"),
    ("scroll", "scroll.jpg"),
    ("staff", "staff.jpg"),
    ("wand", "wand.jpg"),
    ("weapon", "weapon.jpg"),
    ("wondrous item", "wondrousitem.jpg"),
];

/// First school key that is a case-insensitive substring of the
/// classification wins; no match is handled by omitting the icon.
pub fn school_image_url(classification: &str) -> Option<&'static str> {
    let normalized = classification.to_lowercase();
    SCHOOL_IMAGES.iter().find(|(school, _)| normalized.contains(school)).map(|(_, url)| *url)
}

pub fn item_type_image_url(item_type: &str) -> Option<String> {
    let normalized = item_type.to_lowercase();
    ITEM_TYPE_IMAGES
        .iter()
        .find(|(key, _)| normalized.contains(key))
        .map(|(_, file)| format!("{ITEM_TYPE_IMAGE_BASE}/{file}"))
}

impl SpellRecord {
    pub fn to_card(&self) -> Card {
        let mut card = Card::new(&self.name);
        card.description = Some(self.classification.clone());

        card.field("Casting Time", &self.casting_time, true);
        card.field("Range", &self.range, true);
        card.field("Duration", &self.duration, true);
        card.field("Components", &self.components, true);

        card.long_field("Description", &self.description_lines);
        card.field("Spell Lists", &self.spell_lists, false);

        // The first extra line titles the remainder (e.g. "At Higher
        // Levels"); a lone extra line carries nothing worth a field.
        if self.extra_lines.len() > 1 {
            card.long_field(&self.extra_lines[0], &self.extra_lines[1..]);
        }

        card.footer = Some(CardFooter {
            text: self.source.clone(),
            icon_url: school_image_url(&self.classification).map(str::to_owned),
        });
        card
    }
}

impl ItemRecord {
    pub fn to_card(&self) -> Card {
        let mut card = Card::new(&self.name);

        card.field("Item Type", &self.item_type, true);
        card.field("Rarity", &self.rarity, true);
        if let Some(attunement) = &self.attunement {
            card.field("Attunement", attunement, true);
        }

        card.long_field("Description", &self.description_lines);

        card.footer = Some(CardFooter {
            text: self.source.clone(),
            icon_url: item_type_image_url(&self.item_type),
        });
        card
    }
}

#[cfg(test)]
mod tests {
    use crate::scrape::record::{ItemRecord, SpellRecord};

    use super::{item_type_image_url, school_image_url, BLANK_FIELD_NAME, FIELD_VALUE_LIMIT};

    fn spell_record() -> SpellRecord {
        SpellRecord {
            name: "Fireball".to_owned(),
            source: "Source: PHB".to_owned(),
            classification: "3rd-level evocation".to_owned(),
            casting_time: "1 action".to_owned(),
            range: "150 feet".to_owned(),
            components: "V, S, M".to_owned(),
            duration: "Instantaneous".to_owned(),
            spell_lists: "Sorcerer, Wizard".to_owned(),
            description_lines: vec!["A bright streak flashes from your pointing finger.".to_owned()],
            extra_lines: vec![
                "***At Higher Levels.***".to_owned(),
                "The damage increases by 1d6 per slot level above 3rd.".to_owned(),
            ],
        }
    }

    #[test]
    fn spell_card_lays_out_fields_in_casting_order() {
        let card = spell_record().to_card();

        assert_eq!(card.title, "Fireball");
        assert_eq!(card.description.as_deref(), Some("3rd-level evocation"));
        let names: Vec<&str> = card.fields.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Casting Time",
                "Range",
                "Duration",
                "Components",
                "Description",
                "Spell Lists",
                "***At Higher Levels.***"
            ]
        );
        assert!(card.fields[0].inline);
        assert!(!card.fields[4].inline);
    }

    #[test]
    fn spell_card_footer_carries_source_and_school_icon() {
        let card = spell_record().to_card();
        let footer = card.footer.expect("footer");
        assert_eq!(footer.text, "Source: PHB");
        assert_eq!(
            footer.icon_url.as_deref(),
            Some("https://media-waterdeep.cursecdn.com/attachments/2/703/evocation.png")
        );
    }

    #[test]
    fn unknown_school_omits_the_icon() {
        let mut record = spell_record();
        record.classification = "3rd-level chronomancy".to_owned();
        let card = record.to_card();
        assert_eq!(card.footer.expect("footer").icon_url, None);
    }

    #[test]
    fn long_description_splits_into_blank_named_continuations() {
        let mut record = spell_record();
        record.description_lines = vec!["word ".repeat(400)];
        let card = record.to_card();

        let description_fields: Vec<_> = card
            .fields
            .iter()
            .filter(|field| field.name == "Description" || field.name == BLANK_FIELD_NAME)
            .collect();
        assert!(description_fields.len() > 1, "expected a split description");
        assert_eq!(description_fields[0].name, "Description");
        for continuation in &description_fields[1..] {
            assert_eq!(continuation.name, BLANK_FIELD_NAME);
        }
        for field in &description_fields {
            assert!(field.value.chars().count() <= FIELD_VALUE_LIMIT);
        }
    }

    #[test]
    fn lone_extra_line_adds_no_extra_field() {
        let mut record = spell_record();
        record.extra_lines = vec!["***At Higher Levels.***".to_owned()];
        let card = record.to_card();
        assert!(card.fields.iter().all(|field| field.name != "***At Higher Levels.***"));
    }

    #[test]
    fn rendering_twice_is_byte_identical() {
        let record = spell_record();
        assert_eq!(record.to_card(), record.to_card());
    }

    fn item_record() -> ItemRecord {
        ItemRecord {
            name: "Cloak of Protection".to_owned(),
            source: "Source: DMG".to_owned(),
            item_type: "Wondrous item".to_owned(),
            rarity: "uncommon".to_owned(),
            attunement: Some("requires attunement".to_owned()),
            description_lines: vec!["You gain a +1 bonus to AC and saving throws.".to_owned()],
        }
    }

    #[test]
    fn item_card_includes_attunement_only_when_present() {
        let with = item_record().to_card();
        assert!(with.fields.iter().any(|field| field.name == "Attunement"));

        let mut record = item_record();
        record.attunement = None;
        let without = record.to_card();
        assert!(without.fields.iter().all(|field| field.name != "Attunement"));
    }

    #[test]
    fn item_card_footer_uses_item_type_icon() {
        let card = item_record().to_card();
        let footer = card.footer.expect("footer");
        assert_eq!(
            footer.icon_url.as_deref(),
            Some(
                "https://www.dndbeyond.com/content/1-0-1989-0/skins/waterdeep/images/icons/item_types/wondrousitem.jpg"
            )
        );
    }

    #[test]
    fn image_lookup_is_first_match_case_insensitive_substring() {
        assert!(school_image_url("4th-level Evocation (ritual)").is_some());
        assert_eq!(school_image_url("martial weapon"), None);
        assert!(item_type_image_url("Armor (plate)").is_some());
        assert_eq!(item_type_image_url("adventuring gear"), None);
    }
}
