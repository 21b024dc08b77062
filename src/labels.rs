use once_cell::sync::Lazy;
use std::collections::HashMap;

static TYPE_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("middle_eastern_restaurant", "Middle Eastern"),
        ("italian_restaurant", "Italian"),
        ("japanese_restaurant", "Japanese"),
        ("sushi_restaurant", "Sushi"),
        ("thai_restaurant", "Thai"),
        ("chinese_restaurant", "Chinese"),
        ("korean_restaurant", "Korean"),
        ("indian_restaurant", "Indian"),
        ("mediterranean_restaurant", "Mediterranean"),
        ("pizza_restaurant", "Pizza"),
        ("burger_restaurant", "Burgers"),
        ("breakfast_restaurant", "Breakfast"),
        ("brunch_restaurant", "Brunch"),
        ("dessert_shop", "Desserts"),
        ("ice_cream_shop", "Ice Cream"),
        ("fast_food_restaurant", "Fast Food"),
        ("coffee_shop", "Coffee Shop"),
        ("cafe", "Cafe"),
        ("bakery", "Bakery"),
        ("bar", "Bar"),
        ("cocktail_bar", "Cocktail Bar"),
        ("wine_bar", "Wine Bar"),
    ])
});

/// Human-readable label for a places source type tag.
///
/// Known tags use the curated table. Anything else loses a trailing
/// `_restaurant`, has underscores turned into spaces, and gets each word
/// capitalized: `vegan_restaurant` becomes `Vegan`, `bed_and_breakfast`
/// becomes `Bed And Breakfast`.
pub fn pretty_type(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    if let Some(label) = TYPE_LABELS.get(raw) {
        return Some((*label).to_string());
    }

    let cleaned = raw.strip_suffix("_restaurant").unwrap_or(raw).replace('_', " ");
    let mut out = String::with_capacity(cleaned.len());
    let mut at_word_start = true;
    for c in cleaned.chars() {
        if at_word_start && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    Some(out)
}
