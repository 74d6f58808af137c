//! Large block lettering for the banner, countdown, and final score.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Rows produced by [`render`].
pub const FONT_HEIGHT: usize = 5;
const FILL: &str = "██";
const GAP: &str = "  ";

type Glyph = [&'static str; FONT_HEIGHT];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('0', ["###", "# #", "# #", "# #", "###"]),
        ('1', [" # ", "## ", " # ", " # ", "###"]),
        ('2', ["###", "  #", "###", "#  ", "###"]),
        ('3', ["###", "  #", " ##", "  #", "###"]),
        ('4', ["# #", "# #", "###", "  #", "  #"]),
        ('5', ["###", "#  ", "###", "  #", "###"]),
        ('6', ["###", "#  ", "###", "# #", "###"]),
        ('7', ["###", "  #", "  #", " # ", " # "]),
        ('8', ["###", "# #", "###", "# #", "###"]),
        ('9', ["###", "# #", "###", "  #", "###"]),
        ('A', ["###", "# #", "###", "# #", "# #"]),
        ('E', ["###", "#  ", "## ", "#  ", "###"]),
        ('F', ["###", "#  ", "## ", "#  ", "#  "]),
        ('H', ["# #", "# #", "###", "# #", "# #"]),
        ('K', ["# #", "## ", "#  ", "## ", "# #"]),
        ('L', ["#  ", "#  ", "#  ", "#  ", "###"]),
        ('P', ["###", "# #", "###", "#  ", "#  "]),
        ('S', ["###", "#  ", "###", "  #", "###"]),
        ('/', ["  #", "  #", " # ", "#  ", "#  "]),
        (' ', ["   ", "   ", "   ", "   ", "   "]),
        ('?', ["###", "  #", " ##", "   ", " # "]),
    ])
});

/// Render `text` as block lettering, one string per row. Characters without
/// a glyph are drawn as `?`.
pub fn render(text: &str) -> Vec<String> {
    let mut rows = vec![String::new(); FONT_HEIGHT];
    for (index, ch) in text.chars().map(|c| c.to_ascii_uppercase()).enumerate() {
        let Some(glyph) = GLYPHS.get(&ch).or_else(|| GLYPHS.get(&'?')) else {
            continue;
        };
        for (row, pattern) in rows.iter_mut().zip(glyph.iter()) {
            if index > 0 {
                row.push_str(GAP);
            }
            for cell in pattern.chars() {
                row.push_str(if cell == '#' { FILL } else { GAP });
            }
        }
    }
    rows.into_iter()
        .map(|row| row.trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_digits_side_by_side() {
        let rows = render("10");
        assert_eq!(rows.len(), FONT_HEIGHT);
        assert_eq!(rows[0], "  ██    ██████");
        assert_eq!(rows[4], "██████  ██████");
    }

    #[test]
    fn unknown_characters_fall_back() {
        assert_eq!(render("x"), render("?"));
        assert!(render("").iter().all(String::is_empty));
    }
}
