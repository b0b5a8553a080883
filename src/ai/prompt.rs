//! 分级提示词
//!
//! 系统指令按技能分级静态选取（三档，控制允许的词汇与数据结构复杂度），
//! 运行时不可编辑；用户轮按固定顺序拼接上下文块。

use crate::protocol::SkillLevel;

const BASE_PROMPT: &str = "You are a problem-solving guide assistant helping users through \
algorithmic and programming challenges. Guide users through three stages: first, ensure they \
understand what the question is asking; second, help them determine the algorithm needed; \
third, support them in implementing the algorithm in code.

Provide concise hints (no more than 3 lines) that stimulate critical thinking. Ask thoughtful, \
probing questions rather than giving direct answers. Encourage users to devise their own \
solutions.

IMPORTANT GUIDELINES:
1. Start with plain English explanations before providing code
2. Provide code only when explicitly requested
3. Focus on understanding first, implementation second
4. Encourage self-discovery through guided questions";

/// 按技能分级选取系统指令（静态查表）
pub fn system_prompt(level: SkillLevel) -> String {
    let mode = match level {
        SkillLevel::Beginner => {
            "BEGINNER MODE:
- Use only basic data structures: arrays, simple loops, conditionals
- Avoid: HashMaps, Sets, Trees, advanced algorithms
- Explain in very simple terms with step-by-step breakdowns"
        }
        SkillLevel::Intermediate => {
            "INTERMEDIATE MODE:
- Use: Arrays, HashMaps, Sets, Stacks, Queues, basic Trees
- Use: Two Pointers, Sliding Window algorithms
- Explain time and space complexity simply"
        }
        SkillLevel::Advanced => {
            "ADVANCED MODE:
- Use all data structures and algorithms
- Focus on optimal solutions with best complexity
- Discuss trade-offs between approaches"
        }
    };

    format!("{}\n\n{}", BASE_PROMPT, mode)
}

/// 拼接新 user 轮内容：题目上下文、目标语言、非空代码、用户消息，固定顺序
pub fn compose_user_turn(
    problem_context: Option<&str>,
    language: Option<&str>,
    code: Option<&str>,
    user_message: &str,
) -> String {
    let mut content = String::new();

    if let Some(context) = problem_context {
        content.push_str(&format!("PROBLEM:\n{}\n\n", context));
    }

    if let Some(language) = language {
        content.push_str(&format!("LANGUAGE: {}\n\n", language));
    }

    if let Some(code) = code {
        if !code.trim().is_empty() {
            content.push_str(&format!("USER'S CODE:\n{}\n\n", code));
        }
    }

    content.push_str(&format!("USER'S MESSAGE:\n{}", user_message));
    content
}
