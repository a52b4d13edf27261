//! Default vocabulary for a freshly opened room.

/// Everyday English words spread across a few semantic clusters
/// (nature, food, emotion, motion, tools, places, time).
pub const COMMON_WORDS: &[&str] = &[
    "sun", "moon", "star", "river", "ocean", "mountain", "forest", "tree", "flower", "rain",
    "snow", "wind", "fire", "stone", "cloud", "apple", "bread", "cheese", "coffee", "tea",
    "soup", "rice", "honey", "salt", "sugar", "happy", "sad", "angry", "calm", "afraid",
    "love", "hope", "joy", "anger", "peace", "run", "walk", "jump", "swim", "fly",
    "climb", "dance", "sleep", "hammer", "knife", "wheel", "rope", "needle", "ladder", "key",
    "city", "village", "house", "school", "market", "garden", "bridge", "road", "morning",
    "night", "winter", "summer", "yesterday", "tomorrow", "dog", "cat", "horse", "bird",
    "fish", "music", "book", "friend", "king", "child", "doctor",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn words_are_unique_and_non_empty() {
        let set: HashSet<&str> = COMMON_WORDS.iter().copied().collect();
        assert_eq!(set.len(), COMMON_WORDS.len());
        assert!(COMMON_WORDS.iter().all(|w| !w.trim().is_empty()));
        assert!(COMMON_WORDS.len() > 20);
    }
}
