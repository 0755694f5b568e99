//! Educational stories that occasionally interrupt a step.

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, PartialEq, Eq)]
pub struct Story {
    pub title: &'static str,
    pub text: &'static str,
    pub question: &'static str,
    pub choices: &'static [&'static str],
    /// Index into `choices`.
    pub answer: usize,
}

impl Story {
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer
    }

    pub fn correct_choice(&self) -> &'static str {
        self.choices[self.answer]
    }
}

pub const STORIES: &[Story] = &[
    Story {
        title: "The Sunlit Meadow",
        text: "Your pixmon naps in a meadow. The grass around it turns sunlight, \
               water and carbon dioxide into sugar, releasing oxygen as it goes.",
        question: "What is this process called?",
        choices: &["Respiration", "Photosynthesis", "Fermentation"],
        answer: 1,
    },
    Story {
        title: "Rain Over the Lake",
        text: "A cloud drifts over the lake you are camping by. Water evaporated \
               from the lake cooled high in the sky and formed the droplets now falling.",
        question: "What is the step where vapour turns back into droplets?",
        choices: &["Condensation", "Evaporation", "Sublimation"],
        answer: 0,
    },
    Story {
        title: "The Sleeping Mountain",
        text: "Far ahead a mountain smokes. Molten rock beneath it is pushing \
               upward through cracks in the crust.",
        question: "What is molten rock called once it reaches the surface?",
        choices: &["Magma", "Basalt", "Lava"],
        answer: 2,
    },
    Story {
        title: "A Night Walk",
        text: "The moon looks a little different every night of your journey. \
               It takes about four weeks to go from one full moon to the next.",
        question: "Why does the moon's shape seem to change?",
        choices: &[
            "Earth's shadow covers it",
            "We see different parts of its sunlit half",
            "Clouds block part of it",
        ],
        answer: 1,
    },
];

/// Picks one story uniformly.
pub fn pick_story(rng: &mut impl Rng) -> &'static Story {
    STORIES.choose(rng).unwrap_or(&STORIES[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_every_story_answer_in_range() {
        for story in STORIES {
            assert!(story.answer < story.choices.len(), "{}", story.title);
            assert!(story.is_correct(story.answer));
        }
    }

    #[test]
    fn test_wrong_choice_is_incorrect() {
        let story = &STORIES[0];
        assert!(!story.is_correct(0));
        assert!(!story.is_correct(99));
        assert_eq!(story.correct_choice(), "Photosynthesis");
    }

    #[test]
    fn test_pick_story_covers_catalogue() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(pick_story(&mut rng).title);
        }
        assert_eq!(seen.len(), STORIES.len());
    }
}
