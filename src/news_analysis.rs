//! Keyword heuristics that turn raw articles into learning material

use crate::models::{Article, KeyPhrase, VocabularyTerm};

const MAX_VOCABULARY: usize = 5;
const MAX_KEY_PHRASES: usize = 3;
const MAX_KEYWORDS: usize = 5;
const MAX_TIPS: usize = 5;

const GENERAL_TIPS: &[&str] = &[
    "Reading news is a great way to improve your English",
    "Learning news vocabulary helps understand current events",
    "Try reading one English news article daily",
    "Pay attention to common phrases and expressions in news",
];

/// Extra tips keyed by article category
const CATEGORY_TIPS: &[(&str, &str)] = &[
    ("Technology", "Tech news contains many modern English words"),
    ("Business", "Business news helps learn professional English"),
];

/// (word, category, level, definition)
const NEWS_WORDS: &[(&str, &str, &str, &str)] = &[
    ("government", "Politics", "intermediate", "The system by which a state or community is governed"),
    ("policy", "Politics", "intermediate", "A course or principle of action adopted by a government"),
    ("election", "Politics", "intermediate", "A formal process of selecting a person for public office"),
    ("democracy", "Politics", "advanced", "A system of government by the whole population"),
    ("economy", "Business", "intermediate", "The state of a country in terms of production and consumption"),
    ("business", "Business", "beginner", "Commercial enterprise, especially as a means of livelihood"),
    ("investment", "Business", "intermediate", "The action of investing money for profit"),
    ("market", "Business", "beginner", "An area or arena in which commercial dealings are conducted"),
    ("inflation", "Business", "advanced", "A general increase in prices and fall in purchasing value"),
    ("financial", "Business", "intermediate", "Relating to money or how money is managed"),
    ("technology", "Technology", "beginner", "The application of scientific knowledge for practical purposes"),
    ("artificial", "Technology", "intermediate", "Made or produced by human beings rather than occurring naturally"),
    ("intelligence", "Technology", "intermediate", "The ability to acquire and apply knowledge and skills"),
    ("digital", "Technology", "intermediate", "Relating to computer technology"),
    ("innovation", "Technology", "advanced", "The introduction of new ideas, methods, or things"),
    ("algorithm", "Technology", "advanced", "A process or set of rules to be followed in calculations"),
    ("environment", "Environment", "intermediate", "The surroundings in which an organism operates"),
    ("climate", "Environment", "intermediate", "The weather conditions in an area over a long period"),
    ("pollution", "Environment", "intermediate", "The presence of harmful substances in the environment"),
    ("sustainable", "Environment", "advanced", "Able to be maintained at a certain rate or level"),
    ("renewable", "Environment", "advanced", "A source of energy that is not depleted when used"),
    ("health", "Health", "beginner", "The state of being free from illness or injury"),
    ("medical", "Health", "intermediate", "Relating to the science or practice of medicine"),
    ("treatment", "Health", "intermediate", "The management and care of a patient to combat disease"),
    ("vaccine", "Health", "intermediate", "A substance used to stimulate immunity against disease"),
    ("pandemic", "Health", "advanced", "A disease prevalent over a whole country or the world"),
    ("education", "Education", "beginner", "The process of receiving or giving systematic instruction"),
    ("research", "Science", "intermediate", "The systematic investigation into a subject"),
    ("university", "Education", "beginner", "An institution of higher education and research"),
    ("society", "Social", "intermediate", "The community of people living in a particular region"),
    ("community", "Social", "beginner", "A group of people living in the same place"),
    ("development", "Social", "intermediate", "The process of developing or being developed"),
    ("international", "Politics", "intermediate", "Existing between or involving two or more countries"),
    ("culture", "Social", "intermediate", "The ideas and social behavior of a particular people"),
];

const REPORTING_PHRASES: &[&str] = &[
    "breaking news",
    "according to",
    "it is reported that",
    "experts say",
    "in recent years",
    "as a result",
    "on the other hand",
    "furthermore",
    "meanwhile",
    "however",
    "in addition",
    "for example",
];

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "and", "a", "to", "as", "are", "was", "will", "be", "has",
    "have", "had", "been", "for", "of", "with", "in", "by", "from", "up", "about", "into",
    "through", "during", "before", "after", "above", "below", "between", "among", "but", "or",
    "an", "this", "that", "these", "those",
];

/// (category, trigger words), checked in order
const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("Politics", &["government", "election", "politics", "president"]),
    ("Business", &["economy", "business", "market", "financial"]),
    ("Technology", &["technology", "tech", "digital"]),
    ("Health", &["health", "medical", "hospital", "doctor"]),
    ("Environment", &["environment", "climate", "weather", "pollution"]),
    ("Education", &["education", "school", "university", "student"]),
    ("Sports", &["sports", "game", "match", "team"]),
];

/// Attach category, vocabulary, key phrases and keywords to an article
#[must_use]
pub fn analyze(mut article: Article) -> Article {
    let (title, description) = (article.title.as_str(), article.description.as_str());
    article.category = categorize(title, description).to_string();
    article.vocabulary = extract_vocabulary(title, description);
    article.key_phrases = extract_key_phrases(title, description);
    article.keywords = extract_keywords(&format!("{title} {description}"));
    article
}

/// Assign one coarse category from title and description
#[must_use]
pub fn categorize(title: &str, description: &str) -> &'static str {
    let text = format!("{title} {description}").to_lowercase();

    for (category, triggers) in CATEGORY_RULES {
        let hit = triggers.iter().any(|t| text.contains(t))
            || (*category == "Technology" && tokens(&text).any(|w| w == "ai"));
        if hit {
            return *category;
        }
    }

    "General"
}

/// Known news words found in the article, in table order
#[must_use]
pub fn extract_vocabulary(title: &str, description: &str) -> Vec<VocabularyTerm> {
    let text = format!("{title} {description}").to_lowercase();

    NEWS_WORDS
        .iter()
        .filter(|(word, ..)| text.contains(word))
        .take(MAX_VOCABULARY)
        .map(|(word, category, level, definition)| VocabularyTerm {
            word: word.to_string(),
            category: category.to_string(),
            level: level.to_string(),
            definition: definition.to_string(),
            example: example_sentence(word, title, description),
        })
        .collect()
}

#[must_use]
pub fn extract_key_phrases(title: &str, description: &str) -> Vec<KeyPhrase> {
    let text = format!("{title} {description}").to_lowercase();

    REPORTING_PHRASES
        .iter()
        .filter(|phrase| text.contains(*phrase))
        .take(MAX_KEY_PHRASES)
        .map(|phrase| KeyPhrase {
            phrase: phrase.to_string(),
            usage: "News reporting".to_string(),
        })
        .collect()
}

/// Most frequent content words. Ties keep first-seen order.
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();

    let mut counts: Vec<(String, usize)> = Vec::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() <= 3 || STOP_WORDS.contains(&word) {
            continue;
        }
        match counts.iter_mut().find(|(w, _)| w == word) {
            Some((_, n)) => *n += 1,
            None => counts.push((word.to_string(), 1)),
        }
    }

    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(word, _)| word)
        .collect()
}

/// Study tips for a set of articles, general ones first. At most five.
#[must_use]
pub fn learning_tips(vocabulary: &[VocabularyTerm], categories: &[String]) -> Vec<String> {
    let mut tips: Vec<String> = GENERAL_TIPS.iter().map(|t| t.to_string()).collect();

    if vocabulary.iter().any(|v| v.level == "advanced") {
        tips.push("Challenge yourself with advanced vocabulary".to_string());
    }
    for (category, tip) in CATEGORY_TIPS {
        if categories.iter().any(|c| c == category) {
            tips.push(tip.to_string());
        }
    }

    tips.truncate(MAX_TIPS);
    tips
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn example_sentence(word: &str, title: &str, description: &str) -> String {
    if title.to_lowercase().contains(word) {
        return title.to_string();
    }

    description
        .split(['.', '!', '?'])
        .find(|sentence| sentence.to_lowercase().contains(word))
        .map(|sentence| format!("{}.", sentence.trim()))
        .unwrap_or_else(|| format!("The {word} news is important to follow."))
}
