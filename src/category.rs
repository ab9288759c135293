//! The fixed expense category set and the keyword based auto-categorizer.

use std::fmt::Display;

/// A label from the fixed category set classifying an expense.
///
/// The set is closed: expenses always belong to exactly one of these
/// categories. The "Auto" option offered by the expense form is a write-time
/// directive resolved by [categorize], never a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Food,
    Transport,
    Rent,
    Utilities,
    Health,
    Other,
}

/// All categories in display order.
pub const ALL_CATEGORIES: [Category; 6] = [
    Category::Food,
    Category::Transport,
    Category::Rent,
    Category::Utilities,
    Category::Health,
    Category::Other,
];

/// The form value that requests auto-categorization instead of naming a
/// category directly.
pub const AUTO_CATEGORY: &str = "Auto";

impl Category {
    /// The category's display name, which is also its stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Rent => "Rent",
            Category::Utilities => "Utilities",
            Category::Health => "Health",
            Category::Other => "Other",
        }
    }

    /// Parse a category from its display name.
    ///
    /// Returns `None` for names outside the fixed set, including
    /// [AUTO_CATEGORY] which is not a real category.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_CATEGORIES
            .into_iter()
            .find(|category| category.as_str() == name)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordered keyword table used by [categorize].
///
/// The first category whose keyword list contains a substring match wins, so
/// the order of the rows matters.
const KEYWORD_RULES: [(Category, &[&str]); 5] = [
    (
        Category::Food,
        &[
            "burger",
            "pizza",
            "coffee",
            "groceries",
            "dinner",
            "lunch",
            "breakfast",
            "snack",
            "restaurant",
        ],
    ),
    (
        Category::Transport,
        &[
            "uber", "bus", "fuel", "gas", "petrol", "train", "ticket", "taxi",
        ],
    ),
    (Category::Rent, &["rent", "house", "apartment", "mortgage"]),
    (
        Category::Utilities,
        &[
            "electric", "water", "bill", "internet", "wifi", "phone", "mobile",
        ],
    ),
    (
        Category::Health,
        &["doctor", "pharmacy", "medicine", "gym", "hospital", "dental"],
    ),
];

/// Pick a category for `description` by keyword matching.
///
/// The description is lower-cased and tested against [KEYWORD_RULES] in
/// order; the first category with a substring match is returned. Falls back
/// to [Category::Other] when nothing matches.
pub fn categorize(description: &str) -> Category {
    let description = description.to_lowercase();

    for (category, keywords) in KEYWORD_RULES {
        if keywords.iter().any(|keyword| description.contains(keyword)) {
            return category;
        }
    }

    Category::Other
}
