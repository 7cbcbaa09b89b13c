//! Canned confession prompts offered by the confession form.
use crate::category::Category;

const FUNNY: &[&str] = &[
    "I once laughed so hard I wet my pants",
    "I have talked to myself in public without noticing",
    "I pretended to get a joke I did not understand",
    "I have danced naked in front of the mirror",
    "I tried to impress someone and it backfired badly",
];

const CHILDISH: &[&str] = &[
    "I still sleep with a stuffed animal",
    "I have cried watching a cartoon",
    "I still sneak snacks like a kid",
    "I played with dolls or toy cars recently",
    "I am still afraid of the dark sometimes",
];

const EMBARRASSING: &[&str] = &[
    "I embarrassed myself in front of my crush",
    "I fell in public in a truly epic way",
    "I sent a message to the wrong person",
    "I got caught doing something embarrassing",
    "I lied about something and got caught on the spot",
];

const ROMANTIC: &[&str] = &[
    "I wrote a love letter and never delivered it",
    "I have stalked an ex on social media",
    "I pretended to be fine after a breakup",
    "I fell for someone I could never have",
    "I had a crush on a friend from this group",
];

const SPICY: &[&str] = &[
    "I had a spicy dream about someone in this group",
    "I did something I have never told anyone",
    "I lied about how experienced I am",
    "I went on a date that went very wrong",
    "I did something that left me ashamed afterwards",
];

/// Five prompts for `category`, each a valid confession text as-is.
#[must_use]
pub const fn suggestions(category: Category) -> &'static [&'static str] {
    match category {
        Category::Funny => FUNNY,
        Category::Childish => CHILDISH,
        Category::Embarrassing => EMBARRASSING,
        Category::Romantic => ROMANTIC,
        Category::Spicy => SPICY,
    }
}
