//! Prompt templates for the answer and elaboration flows.
//!
//! Both prompts embed a fixed set of few-shot exemplars. The exemplars are
//! built once per process and never mutated, so the same inputs always
//! produce byte-identical prompts.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use termrag_core::types::{FewShotExample, TermAnswer};

/// Input side of an answer exemplar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerInput {
    pub question: String,
    pub category: String,
}

/// Input side of an elaboration exemplar, in the order it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElaborationInput {
    pub previous_answer: TermAnswer,
    pub additional_request: String,
}

pub type AnswerExample = FewShotExample<AnswerInput, TermAnswer>;
pub type ElaborationExample = FewShotExample<ElaborationInput, TermAnswer>;

/// Question/answer exemplars for the answer prompt, one per field.
pub static ANSWER_EXAMPLES: LazyLock<Vec<AnswerExample>> = LazyLock::new(|| {
    vec![
        answer_example(
            "What is React?",
            "frontend",
            TermAnswer::new(
                "React",
                "A JavaScript library for building user interfaces, particularly single-page applications where UI updates are frequent.",
                "Creating a dynamic form with real-time validation using React hooks and state management.",
            ),
        ),
        answer_example(
            "What is REST API?",
            "backend",
            TermAnswer::new(
                "REST API",
                "An architectural style for designing networked applications that uses HTTP methods to perform operations on resources identified by URIs.",
                "Implementing a user authentication system using REST endpoints: POST /auth/login, GET /users/profile, etc.",
            ),
        ),
        answer_example(
            "What is Machine Learning?",
            "ai",
            TermAnswer::new(
                "Machine Learning",
                "A subset of artificial intelligence that enables systems to learn and improve from experience without being explicitly programmed.",
                "Training a neural network to classify images using TensorFlow and implementing transfer learning for better accuracy.",
            ),
        ),
        answer_example(
            "What is UI/UX Design?",
            "design",
            TermAnswer::new(
                "UI/UX Design",
                "The process of designing user interfaces and experiences to create intuitive and engaging digital products.",
                "Creating wireframes and prototypes in Figma, focusing on user flow and accessibility guidelines.",
            ),
        ),
    ]
});

/// Exemplars for the elaboration prompt: one asking for more information,
/// one asking for code.
pub static ELABORATION_EXAMPLES: LazyLock<Vec<ElaborationExample>> = LazyLock::new(|| {
    vec![
        elaboration_example(
            TermAnswer::new(
                "Closure",
                "A closure is a function that has access to variables from its outer scope, even after the outer function has returned.",
                "function outer() {\n  let count = 0;\n  return function inner() {\n    count++;\n    return count;\n  };\n}\nlet counter = outer();\nconsole.log(counter()); // 1\nconsole.log(counter()); // 2",
            ),
            "information",
            TermAnswer::new(
                "Closure Memory Management",
                "Closures maintain references to variables from their outer scope, which keeps these variables in memory even after the outer function has completed execution. This is because the inner function (closure) still has access to these variables.",
                "function createClosure() {\n  let largeData = new Array(1000000).fill('data');\n  return function() {\n    return largeData.length;\n  };\n}\n// The largeData array remains in memory as long as the closure exists\nlet closure = createClosure();",
            ),
        ),
        elaboration_example(
            TermAnswer::new(
                "REST API",
                "REST (Representational State Transfer) is an architectural style for designing networked applications.",
                "GET /api/users - Retrieve all users\nPOST /api/users - Create a new user",
            ),
            "code",
            TermAnswer::new(
                "REST API Implementation",
                "A minimal REST service exposes resources under a URL and maps HTTP methods to operations on them: GET reads, POST creates.",
                "from flask import Flask, request, jsonify\n\napp = Flask(__name__)\n\n# In-memory storage\nusers = []\n\n@app.route('/api/users', methods=['GET'])\ndef get_users():\n    return jsonify(users)\n\n@app.route('/api/users', methods=['POST'])\ndef create_user():\n    user = request.json\n    users.append(user)\n    return jsonify(user), 201\n\nif __name__ == '__main__':\n    app.run(debug=True)",
            ),
        ),
    ]
});

fn answer_example(question: &str, category: &str, answer: TermAnswer) -> AnswerExample {
    FewShotExample {
        input: AnswerInput { question: question.to_string(), category: category.to_string() },
        output: answer,
    }
}

fn elaboration_example(previous: TermAnswer, request: &str, output: TermAnswer) -> ElaborationExample {
    FewShotExample {
        input: ElaborationInput { previous_answer: previous, additional_request: request.to_string() },
        output,
    }
}

/// Build the retrieval-augmented answer prompt.
///
/// `category` is interpolated verbatim. An empty `context` still produces a
/// complete prompt; the model then answers from its own knowledge.
pub fn answer_prompt(question: &str, category: &str, context: &[String]) -> String {
    let mut p = String::new();
    p.push_str("You are an expert in IT terminology. Please answer the following question using the given context.\n");
    p.push_str("Your response must strictly follow this JSON format:\n");
    p.push_str(&answer_schema());
    p.push_str("\n\n");
    p.push_str(&format!(
        "The user is a {category} developer/designer. Please provide examples and explanations that are relevant to their field.\n"
    ));
    p.push_str(&format!(
        "Focus on practical applications and scenarios that would be most useful for someone in the {category} field.\n"
    ));
    p.push_str("\nHere are some examples:\n");
    for (i, ex) in ANSWER_EXAMPLES.iter().enumerate() {
        p.push_str(&format!(
            "\nExample {}:\nQuestion: {} (Category: {})\nAnswer: {}\n",
            i + 1,
            ex.input.question,
            ex.input.category,
            pretty(&ex.output)
        ));
    }
    p.push_str(&format!("\nContext: {}\n\n", context.join("\n\n")));
    p.push_str(&format!("Question: {question}\nCategory: {category}\nAnswer: "));
    p
}

/// Build the follow-up prompt that deepens a previous answer.
///
/// No retrieval context is involved. When the request mentions code the
/// prompt additionally asks for a runnable code sample in `example`.
pub fn elaboration_prompt(previous: &TermAnswer, request: &str, category: &str) -> String {
    let mut p = String::new();
    p.push_str(&format!(
        "You are an expert in {category} development. A user has asked for additional information about a previous answer.\n"
    ));
    p.push_str(&format!("Previous answer: {}\n", pretty(previous)));
    p.push_str(&format!("Additional request: {request}\n"));
    p.push_str("\nHere are some examples of how to handle additional requests:\n");
    for ex in ELABORATION_EXAMPLES.iter() {
        p.push_str(&format!("Input: {}\nOutput: {}\n\n", pretty(&ex.input), pretty(&ex.output)));
    }
    p.push_str(
        "Please provide a more detailed answer that addresses the user's additional request. \
         The response should be in JSON format with the following structure:\n",
    );
    p.push_str(&answer_schema());
    p.push('\n');
    if mentions_code(request) {
        p.push_str("The \"example\" field must contain a complete, runnable code sample.\n");
    }
    p.push_str("\nResponse:");
    p
}

/// Whether a follow-up request asks for code.
pub fn mentions_code(request: &str) -> bool {
    let lower = request.to_lowercase();
    lower.contains("code") || lower.contains("코드")
}

fn answer_schema() -> String {
    pretty(&TermAnswer::new("Term", "Definition", "Example"))
}

/// Pretty JSON in struct field order.
fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
