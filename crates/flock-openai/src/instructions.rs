// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System instructions sent with every user message.

use flock_core::types::TargetGroup;

const BASE_INSTRUCTIONS: &str = "\
You are the church chat assistant. CORE RULE: be PROACTIVE. If you can extract \
information or take an action, use the relevant tool FIRST.\n\n\
METHOD:\n\
1. Parse EVERY input for usable information\n\
2. Found something? Use the tool immediately\n\
3. Only then reply naturally\n\n\
EXAMPLES:\n\
- 'My name is Renko' -> manage_user tool -> 'Hello Renko!'\n\
- 'My nme is Renko' (typo) -> manage_user tool -> 'Hello Renko!'\n\
- 'Yes please' (after a summary offer) -> handle_sermon tool\n\
- 'What does grace mean?' -> answer_question tool\n\
- 'Too many messages' -> manage_subscription tool\n\n\
CONTEXT: always check whether a question is still open, such as 'Were you at \
the service?'\n\n\
TONE: personal, warm, concise.";

/// Instructions for the given audience: the shared base plus a per-group
/// tone suffix.
pub fn proactive_instructions(target_group: Option<TargetGroup>) -> String {
    let suffix = match target_group {
        Some(TargetGroup::Adult) => " Use a mature, respectful tone.",
        Some(TargetGroup::Deepening) => {
            " Go deeper into theological concepts and cite scripture where relevant."
        }
        Some(TargetGroup::Youth) => {
            " Use an informal, modern tone that speaks to young people."
        }
        None => "",
    };
    format!("{BASE_INSTRUCTIONS}{suffix}")
}
