use rand::Rng;
use serde::{Deserialize, Serialize};

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/data/catalog.json");

/// A swipeable activity card (also used for the positions deck).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaCard {
    pub id: String,
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    pub title: String,
    #[serde(default)]
    pub desc: String,
}

fn default_difficulty() -> u8 {
    1
}

/// A conversation question, grouped by level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCard {
    pub id: String,
    pub level: String,
    pub text: String,
}

/// A challenge with a catalogue-defined point reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeCard {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub reward: u64,
}

/// Read-only content catalogue supplied by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContentCatalog {
    #[serde(default)]
    pub ideas: Vec<IdeaCard>,
    #[serde(default)]
    pub positions: Vec<IdeaCard>,
    #[serde(default)]
    pub questions: Vec<QuestionCard>,
    #[serde(default)]
    pub challenges: Vec<ChallengeCard>,
}

/// Which deck a roulette spin draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouletteKind {
    Idea,
    Position,
    Question,
}

/// A single roulette result borrowed from the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoulettePick<'a> {
    Idea(&'a IdeaCard),
    Question(&'a QuestionCard),
}

impl ContentCatalog {
    /// Create an empty catalogue (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a catalogue from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid catalogue data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load the embedded starter catalogue.
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_CATALOG_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn idea(&self, id: &str) -> Option<&IdeaCard> {
        self.ideas.iter().find(|card| card.id == id)
    }

    #[must_use]
    pub fn challenge(&self, id: &str) -> Option<&ChallengeCard> {
        self.challenges.iter().find(|card| card.id == id)
    }

    /// Distinct idea categories in catalogue order.
    #[must_use]
    pub fn idea_categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for card in &self.ideas {
            if !seen.contains(&card.category.as_str()) {
                seen.push(card.category.as_str());
            }
        }
        seen
    }

    /// Pick a uniformly random question the user has not answered yet.
    ///
    /// `level` of `None` draws from every level. Returns `None` when the
    /// filtered pool is exhausted.
    pub fn next_question<'a, R, F>(
        &'a self,
        rng: &mut R,
        answered: F,
        level: Option<&str>,
    ) -> Option<&'a QuestionCard>
    where
        R: Rng + ?Sized,
        F: Fn(&str) -> bool,
    {
        let pool: Vec<&QuestionCard> = self
            .questions
            .iter()
            .filter(|q| level.is_none_or(|lv| q.level == lv))
            .filter(|q| !answered(&q.id))
            .collect();
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.gen_range(0..pool.len())])
    }

    /// Spin the roulette over the requested deck.
    pub fn spin_roulette<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        kind: RouletteKind,
    ) -> Option<RoulettePick<'_>> {
        match kind {
            RouletteKind::Idea => pick_random(rng, &self.ideas).map(RoulettePick::Idea),
            RouletteKind::Position => pick_random(rng, &self.positions).map(RoulettePick::Idea),
            RouletteKind::Question => pick_random(rng, &self.questions).map(RoulettePick::Question),
        }
    }
}

fn pick_random<'a, R: Rng + ?Sized, T>(rng: &mut R, pool: &'a [T]) -> Option<&'a T> {
    if pool.is_empty() {
        None
    } else {
        Some(&pool[rng.gen_range(0..pool.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn fixture() -> ContentCatalog {
        let json = r#"{
            "ideas": [
                {"id": "picnic", "category": "outdoor", "title": "Park picnic"},
                {"id": "fondue", "category": "home", "difficulty": 2, "title": "Fondue night"}
            ],
            "questions": [
                {"id": "q1", "level": "easy", "text": "First impression?"},
                {"id": "q2", "level": "deep", "text": "Biggest fear?"}
            ],
            "challenges": [
                {"id": "ch1", "title": "Cook together", "reward": 30}
            ]
        }"#;
        ContentCatalog::from_json(json).unwrap()
    }

    #[test]
    fn parses_catalogue_from_json() {
        let catalog = fixture();
        assert_eq!(catalog.ideas.len(), 2);
        assert_eq!(catalog.ideas[0].difficulty, 1);
        assert_eq!(catalog.ideas[1].difficulty, 2);
        assert_eq!(catalog.challenge("ch1").unwrap().reward, 30);
        assert!(catalog.positions.is_empty());
    }

    #[test]
    fn categories_are_distinct_in_order() {
        let catalog = fixture();
        assert_eq!(catalog.idea_categories(), vec!["outdoor", "home"]);
    }

    #[test]
    fn next_question_skips_answered_and_honors_level() {
        let catalog = fixture();
        let mut rng = SmallRng::seed_from_u64(3);

        let picked = catalog
            .next_question(&mut rng, |id| id == "q1", None)
            .unwrap();
        assert_eq!(picked.id, "q2");

        let picked = catalog
            .next_question(&mut rng, |_| false, Some("easy"))
            .unwrap();
        assert_eq!(picked.id, "q1");

        assert!(
            catalog
                .next_question(&mut rng, |_| true, None)
                .is_none()
        );
    }

    #[test]
    fn roulette_draws_from_the_requested_deck() {
        let catalog = fixture();
        let mut rng = SmallRng::seed_from_u64(11);
        match catalog.spin_roulette(&mut rng, RouletteKind::Question).unwrap() {
            RoulettePick::Question(q) => assert!(q.id.starts_with('q')),
            RoulettePick::Idea(_) => panic!("wrong deck"),
        }
        assert!(
            catalog
                .spin_roulette(&mut rng, RouletteKind::Position)
                .is_none()
        );
    }

    #[test]
    fn embedded_starter_catalogue_parses() {
        let catalog = ContentCatalog::load_from_static();
        assert!(!catalog.ideas.is_empty());
        assert!(!catalog.questions.is_empty());
        assert!(!catalog.challenges.is_empty());
        assert!(catalog.ideas.iter().all(|card| !card.id.is_empty()));
    }
}
