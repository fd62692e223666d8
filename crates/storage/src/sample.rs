//! Built-in aptitude question bank used for seeding and tests.

use genie_core::model::{Difficulty, Question, QuestionDraft, QuestionError, QuestionId};

type SampleRow = (&'static str, &'static [&'static str], &'static str, &'static str, Difficulty);

const SAMPLE_QUESTIONS: &[SampleRow] = &[
    (
        "If a train travels at 60 mph, how long will it take to travel 150 miles?",
        &["1.5 hours", "2 hours", "2.5 hours", "3 hours"],
        "2.5 hours",
        "math",
        Difficulty::Easy,
    ),
    (
        "If 8 workers can build a wall in 10 days, how many days will it take 5 workers to build the same wall?",
        &["12 days", "13 days", "16 days", "18 days"],
        "16 days",
        "math",
        Difficulty::Medium,
    ),
    (
        "Which number is missing in the sequence? 2, 6, 12, 20, 30, __",
        &["38", "40", "42", "45"],
        "42",
        "sequence",
        Difficulty::Medium,
    ),
    (
        "A car depreciates 15% per year. If it costs $20,000 new, what is its value after 3 years?",
        &["$12,251", "$14,535", "$15,000", "$17,000"],
        "$12,251",
        "math",
        Difficulty::Medium,
    ),
    (
        "If the angles in a triangle are in the ratio 1:2:3, what is the measure of the largest angle?",
        &["30°", "60°", "90°", "108°"],
        "90°",
        "geometry",
        Difficulty::Medium,
    ),
    (
        "Complete the analogy: Hand is to Glove as Foot is to ___",
        &["Toe", "Sock", "Shoe", "Leg"],
        "Shoe",
        "verbal",
        Difficulty::Easy,
    ),
    (
        "What is the next letter in the sequence: A, C, F, J, O, ?",
        &["S", "T", "U", "V"],
        "U",
        "sequence",
        Difficulty::Hard,
    ),
    (
        "If 3/5 of a number is 24, what is the number?",
        &["35", "40", "45", "50"],
        "40",
        "math",
        Difficulty::Easy,
    ),
    (
        "A pump can fill a tank in 2 hours, while pump B can fill it in 3 hours. How long will it take both pumps to fill the tank?",
        &["1.2 hours", "1.5 hours", "2.5 hours", "5 hours"],
        "1.2 hours",
        "math",
        Difficulty::Hard,
    ),
    (
        "Find the odd one out: Lion, Tiger, Leopard, Wolf, Cheetah",
        &["Lion", "Tiger", "Wolf", "Cheetah"],
        "Wolf",
        "logical",
        Difficulty::Easy,
    ),
    (
        "If a cube has a volume of 27 cubic cm, what is the length of each edge?",
        &["3 cm", "6 cm", "9 cm", "27 cm"],
        "3 cm",
        "geometry",
        Difficulty::Easy,
    ),
    (
        "Two trains starting at the same time from points A and B, 300 km apart, travel toward each other at 60 km/h and 40 km/h. How long until they meet?",
        &["2 hours", "3 hours", "4 hours", "5 hours"],
        "3 hours",
        "math",
        Difficulty::Medium,
    ),
    (
        "If the sum of five consecutive integers is 45, what is the middle integer?",
        &["7", "8", "9", "10"],
        "9",
        "math",
        Difficulty::Medium,
    ),
    (
        "Which word does NOT belong in the group? Maple, Oak, Pine, Birch, Bush",
        &["Maple", "Oak", "Pine", "Bush"],
        "Bush",
        "logical",
        Difficulty::Easy,
    ),
    (
        "What comes next in the pattern? 1, 4, 9, 16, 25, __",
        &["30", "36", "49", "64"],
        "36",
        "sequence",
        Difficulty::Easy,
    ),
    (
        "A store offers a 20% discount on an item. If the discounted price is $40, what was the original price?",
        &["$45", "$48", "$50", "$60"],
        "$50",
        "math",
        Difficulty::Easy,
    ),
    (
        "If 4 shirts and 3 pairs of pants cost $148, and 2 shirts and 1 pair of pants cost $62, how much does 1 shirt cost?",
        &["$15", "$18", "$20", "$22"],
        "$20",
        "math",
        Difficulty::Hard,
    ),
    (
        "Which shape has the most sides? Pentagon, Hexagon, Octagon, Decagon",
        &["Pentagon", "Hexagon", "Octagon", "Decagon"],
        "Decagon",
        "geometry",
        Difficulty::Easy,
    ),
    (
        "What is the probability of rolling a sum of 7 with two fair dice?",
        &["1/6", "1/8", "1/12", "1/36"],
        "1/6",
        "probability",
        Difficulty::Medium,
    ),
    (
        "Complete the analogy: Book is to Reading as Fork is to ___",
        &["Kitchen", "Eating", "Cooking", "Plate"],
        "Eating",
        "verbal",
        Difficulty::Easy,
    ),
    (
        "If the perimeter of a square is 24 cm, what is its area?",
        &["36 cm²", "24 cm²", "16 cm²", "64 cm²"],
        "36 cm²",
        "geometry",
        Difficulty::Medium,
    ),
    (
        "If 3 people can paint 3 rooms in 3 hours, how many people are needed to paint 6 rooms in 6 hours?",
        &["3 people", "6 people", "9 people", "18 people"],
        "3 people",
        "logical",
        Difficulty::Hard,
    ),
    (
        "What comes next? O, T, T, F, F, S, S, __",
        &["E", "N", "T", "X"],
        "E",
        "sequence",
        Difficulty::Hard,
    ),
    (
        "A rectangular garden is 10 meters by 15 meters. What is the length of the diagonal?",
        &["15 meters", "18 meters", "20 meters", "25 meters"],
        "18 meters",
        "geometry",
        Difficulty::Medium,
    ),
    (
        "If a water tank is 2/3 full and 30 gallons are added, it becomes 5/6 full. What is the capacity of the tank?",
        &["90 gallons", "120 gallons", "180 gallons", "240 gallons"],
        "180 gallons",
        "math",
        Difficulty::Hard,
    ),
];

/// Number of questions in the built-in bank.
pub const SAMPLE_QUESTION_COUNT: usize = SAMPLE_QUESTIONS.len();

/// Drafts for every built-in question, in bank order.
#[must_use]
pub fn sample_drafts() -> Vec<QuestionDraft> {
    SAMPLE_QUESTIONS
        .iter()
        .map(|(prompt, options, correct, category, difficulty)| QuestionDraft {
            prompt: (*prompt).to_string(),
            options: options.iter().map(|o| (*o).to_string()).collect(),
            correct_option: (*correct).to_string(),
            category: (*category).to_string(),
            difficulty: *difficulty,
        })
        .collect()
}

/// Built-in questions with ids `1..=SAMPLE_QUESTION_COUNT`.
///
/// # Errors
///
/// Returns `QuestionError` if a built-in row fails validation.
pub fn sample_questions() -> Result<Vec<Question>, QuestionError> {
    sample_drafts()
        .into_iter()
        .zip(1_u64..)
        .map(|(draft, id)| Question::from_persisted(QuestionId::new(id), draft))
        .collect()
}
