use super::*;

#[test]
fn every_listed_extension_is_template_text() {
    for ext in TEXT_EXTENSIONS {
        let path = format!("OEBPS/Text/chapter.{ext}");
        assert!(is_template_text(&path), "{path}");
    }
}

#[test]
fn markup_and_plain_text_are_told_apart() {
    assert_eq!(classify_entry("OEBPS/content.opf"), EntryKind::Markup);
    assert_eq!(classify_entry("OEBPS/toc.ncx"), EntryKind::Markup);
    assert_eq!(classify_entry("OEBPS/Styles/main.css"), EntryKind::Text);
    assert_eq!(classify_entry("data/meta.json"), EntryKind::Text);
}

#[test]
fn binary_assets_are_opaque() {
    for path in [
        "mimetype",
        "OEBPS/Images/cover.jpg",
        "OEBPS/Fonts/Serif.ttf",
        "OEBPS/Audio/intro.mp3",
    ] {
        assert_eq!(classify_entry(path), EntryKind::Opaque, "{path}");
    }
}

#[test]
fn suffix_match_is_exact_not_substring() {
    assert!(!is_template_text("OEBPS/Images/html-diagram.png"));
    assert!(!is_template_text("OEBPS/css.d/sprite.webp"));
    assert!(!is_template_text("OEBPS/Text/chapter.xhtml.bak"));
    assert!(!is_template_text("OEBPS/Images/photo.jsonp"));
    assert!(!is_template_text("OEBPS/text.xml/image.gif"));
}

#[test]
fn suffix_match_is_case_sensitive() {
    assert!(!is_template_text("OEBPS/Text/CHAPTER.XHTML"));
    assert!(!is_template_text("OEBPS/Styles/Main.Css"));
}

#[test]
fn extension_ignores_directory_dots() {
    assert_eq!(entry_extension("a.b/c"), None);
    assert_eq!(entry_extension("a.b/c.txt"), Some("txt"));
    assert_eq!(entry_extension("notes.txt"), Some("txt"));
}
