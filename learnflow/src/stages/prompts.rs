//! Prompt text for each artifact kind.

use crate::core::ArtifactKind;
use crate::generator::{GenerationRequest, PromptInputs};

fn profile_block(inputs: &PromptInputs) -> String {
    format!(
        "Student Profile:\n- Class Level: {}\n- Language: {}\n- Gender: {}\n",
        inputs.grade_level, inputs.language, inputs.gender
    )
}

fn language_rules(language: &str) -> String {
    format!(
        "Write the content in {language} ONLY. This is a critical requirement.\n\
         If the source material or topic title is in another language, translate everything to {language}.\n\
         Do not use any language other than {language} in your output."
    )
}

fn requirements(kind: ArtifactKind, grade_level: &str) -> String {
    match kind {
        ArtifactKind::Summary => format!(
            "1. Use the attached file, if any, to produce concise summary notes.\n\
             2. Use bullet points and simple language suited to {grade_level}.\n\
             3. Include practical examples and analogies.\n\
             4. Keep it engaging and easy to understand.\n\
             Respond with JSON: {{\"title\": string, \"summary\": markdown string}}."
        ),
        ArtifactKind::Quiz => "1. Write 10 multiple-choice questions with 4 options each.\n\
             2. Test fundamentals as well as analytical thinking.\n\
             3. Match complexity to the student profile.\n\
             4. Give the correct answer, a hint and an explanation for every question.\n\
             Respond with JSON: {\"title\": string, \"questions\": [{\"question\": string, \
             \"options\": {\"A\": string, \"B\": string, \"C\": string, \"D\": string}, \
             \"correctAnswer\": \"A\"|\"B\"|\"C\"|\"D\", \"hint\": string, \"explanation\": string}]}."
            .to_string(),
        ArtifactKind::Recommendations => "1. Cover the resources needed to learn the topic.\n\
             2. List up to 10 recommendations mixing books, lectures and articles.\n\
             3. Give each one a short contextual description and a URL when one exists, otherwise NULL.\n\
             Respond with JSON: {\"recommendations\": [{\"title\": string, \"description\": string, \"url\": string}]}."
            .to_string(),
        ArtifactKind::Flashcards => "1. Create 10 to 15 flashcards.\n\
             2. The front holds one question or term; the back holds a crisp answer.\n\
             3. Focus on active recall of key concepts, dates, formulas and definitions.\n\
             4. Match complexity to the grade level.\n\
             Respond with JSON: {\"flashcards\": [{\"front\": string, \"back\": string}]}."
            .to_string(),
        ArtifactKind::AudioScript => format!(
            "1. Write a podcast script of at most 3000 characters for a 7 to 10 minute episode.\n\
             2. Pitch depth and vocabulary at {grade_level}.\n\
             3. Use a conversational, enthusiastic tone with a short introduction, \
             the main content in digestible segments, a recap and an invitation to keep learning.\n\
             Respond with the script text only."
        ),
    }
}

fn role(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Summary => "You are an expert academic tutor creating personalized summary notes.",
        ArtifactKind::Quiz => "You are a helpful academic tutor creating a quiz from the notes provided.",
        ArtifactKind::Recommendations => {
            "You are a helpful academic tutor building a list of learning resources from the notes provided."
        }
        ArtifactKind::Flashcards => {
            "You are a helpful academic tutor creating a deck of flashcards from the notes provided."
        }
        ArtifactKind::AudioScript => {
            "You are an expert academic tutor writing an engaging audio overview for a student."
        }
    }
}

/// Renders the system instruction for `kind`.
#[must_use]
pub fn system_prompt(kind: ArtifactKind, inputs: &PromptInputs) -> String {
    format!(
        "{}\n\n{}\n{}\n{}",
        role(kind),
        profile_block(inputs),
        requirements(kind, &inputs.grade_level),
        language_rules(&inputs.language)
    )
}

/// Renders the user message for `kind`.
#[must_use]
pub fn user_prompt(kind: ArtifactKind, inputs: &PromptInputs) -> String {
    let language = &inputs.language;
    match kind {
        ArtifactKind::Summary => format!(
            "Topic: {}.\n\nIMPORTANT: Generate the summary in {language} ONLY.",
            inputs.topic_summary
        ),
        ArtifactKind::AudioScript => format!(
            "Create an audio summary for the topic summary: {}.\n\nIMPORTANT: Generate the script in {language} ONLY.",
            inputs.topic_summary
        ),
        _ => format!(
            "Topic Summary {}.\n\nIMPORTANT: Generate the content in {language} ONLY.",
            inputs.topic_summary
        ),
    }
}

/// Builds a complete request for `kind`.
#[must_use]
pub fn build_request(kind: ArtifactKind, inputs: PromptInputs, temperature: f32) -> GenerationRequest {
    GenerationRequest {
        kind,
        system_prompt: system_prompt(kind, &inputs),
        user_prompt: user_prompt(kind, &inputs),
        inputs,
        temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> PromptInputs {
        PromptInputs {
            grade_level: "Class 8".to_string(),
            language: "Hindi".to_string(),
            gender: "she/her".to_string(),
            topic_summary: "Photosynthesis".to_string(),
            file_url: None,
        }
    }

    #[test]
    fn test_every_prompt_pins_language() {
        for kind in ArtifactKind::PIPELINE_ORDER {
            let request = build_request(kind, inputs(), 0.1);
            assert!(request.system_prompt.contains("Hindi ONLY"), "{kind}");
            assert!(request.user_prompt.contains("Hindi ONLY"), "{kind}");
            assert!(request.system_prompt.contains("Class 8"), "{kind}");
        }
    }

    #[test]
    fn test_user_prompt_carries_topic_summary() {
        let prompt = user_prompt(ArtifactKind::Quiz, &inputs());
        assert!(prompt.starts_with("Topic Summary Photosynthesis."));
    }

    #[test]
    fn test_quiz_prompt_describes_answer_key() {
        assert!(system_prompt(ArtifactKind::Quiz, &inputs()).contains("correctAnswer"));
    }
}
