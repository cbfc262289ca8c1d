//! Recipe document → [`IngredientRecord`].
//!
//! The name comes from the first level-1 heading (ATX `# Title` or setext
//! `Title\n=====`). Documents without one are named after their file:
//! `full_tacos/baja_fish_tacos.md` becomes `Baja Fish Tacos`.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use crate::models::IngredientRecord;
use crate::slug::slugify;
use crate::source::{RemoteSource, MARKDOWN_EXT};

/// Build the record for one document. Pure: no network or store access.
pub fn extract(remote: &RemoteSource, path: &str, raw_content: &str) -> IngredientRecord {
    let name = first_h1(raw_content)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| name_from_path(path));

    IngredientRecord {
        url: remote.canonical_url(path),
        slug: slugify(&name),
        name,
        recipe: raw_content.to_string(),
    }
}

/// Trimmed text of the first level-1 heading, if any.
pub fn first_h1(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_heading = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                return Some(text.trim().to_string());
            }
            Event::Text(t) | Event::Code(t) if in_heading => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak if in_heading => text.push(' '),
            _ => {}
        }
    }
    None
}

/// Display name derived from a file name: extension stripped, `_` → space, title-cased.
pub fn name_from_path(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name.strip_suffix(MARKDOWN_EXT).unwrap_or(file_name);
    title_case(&stem.replace('_', " "))
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> RemoteSource {
        RemoteSource::new("https://raw.example.com", "dansinker", "tacofancy", "master")
    }

    #[test]
    fn name_from_atx_heading() {
        let record = extract(
            &remote(),
            "condiments/salsa_verde.md",
            "# Salsa Verde  \n\nTomatillos, chiles, cilantro.\n",
        );
        assert_eq!(record.name, "Salsa Verde");
        assert_eq!(record.slug, "salsa_verde");
        assert_eq!(
            record.url,
            "https://raw.example.com/dansinker/tacofancy/master/condiments/salsa_verde.md"
        );
        assert!(record.recipe.contains("Tomatillos"));
    }

    #[test]
    fn name_from_setext_heading_with_inline_code() {
        let md = "Shrimp `al` Ajillo\n==================\n\n* shrimp\n";
        assert_eq!(first_h1(md).as_deref(), Some("Shrimp al Ajillo"));
    }

    #[test]
    fn only_level_one_headings_count() {
        let md = "## Ingredients\n\n* masa\n\n# Corn Tortillas\n";
        assert_eq!(first_h1(md).as_deref(), Some("Corn Tortillas"));
    }

    #[test]
    fn falls_back_to_file_name() {
        let record = extract(&remote(), "full_tacos/baja_fish_tacos.md", "no heading here");
        assert_eq!(record.name, "Baja Fish Tacos");
        assert_eq!(record.slug, "baja_fish_tacos");
    }

    #[test]
    fn empty_heading_falls_back_to_file_name() {
        let record = extract(&remote(), "shells/corn_tortillas.md", "#\n\nmasa harina");
        assert_eq!(record.name, "Corn Tortillas");
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("BLACK bean mash"), "Black Bean Mash");
        assert_eq!(title_case("pico de gallo-ish"), "Pico De Gallo-Ish");
    }
}
