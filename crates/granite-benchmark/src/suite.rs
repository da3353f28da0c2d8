pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: &'static str,
    pub label: &'static str,
    pub prompt: &'static str,
    pub max_tokens: u32,
}

const LONG_PROMPT: &str = "You are an expert biologist. Please provide a comprehensive explanation of cellular respiration,
including glycolysis, the Krebs cycle, and the electron transport chain. Explain how ATP is
generated in each stage, what molecules are involved, and how the process differs between
aerobic and anaerobic conditions. Also discuss the role of mitochondria in this process.";

/// Warmup first, then progressively longer prompts and completions
pub const DEFAULT_SUITE: &[TestCase] = &[
    TestCase {
        name: "short_prompt_warmup",
        label: "Short prompt (warmup)",
        prompt: "What is 2+2?",
        max_tokens: 10,
    },
    TestCase {
        name: "short_prompt_medium_completion",
        label: "Short prompt, medium completion",
        prompt: "What model are you?",
        max_tokens: 50,
    },
    TestCase {
        name: "medium_prompt_long_completion",
        label: "Medium prompt, long completion",
        prompt: "Explain how photosynthesis works in plants. Include details about light-dependent and light-independent reactions.",
        max_tokens: 200,
    },
    TestCase {
        name: "long_prompt_stress_test",
        label: "Long prompt, long completion (stress test)",
        prompt: LONG_PROMPT,
        max_tokens: 300,
    },
    TestCase {
        name: "code_generation",
        label: "Code generation",
        prompt: "Write a Python function to calculate the Fibonacci sequence up to n terms.",
        max_tokens: 150,
    },
];
