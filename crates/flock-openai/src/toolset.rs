// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Function tool schemas advertised on every Responses API call.
//!
//! The five function tools form a closed set matched by the dispatcher's
//! tool registry. When a church has a vector store, a `file_search` tool is
//! appended so the model can ground answers in the sermon corpus.

use serde_json::json;

/// Build the complete toolset, optionally with file search.
pub fn build_toolset(vector_store_id: Option<&str>) -> Vec<serde_json::Value> {
    let mut tools = vec![
        json!({
            "type": "function",
            "name": "handle_sermon",
            "description": "USE WHEN: yes/no reply to a summary offer, service attendance, \
                            a summary request, or another church was visited",
            "strict": false,
            "parameters": {
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["get_summary", "register_attendance", "register_absence"],
                        "description": "Which action to perform"
                    },
                    "attended": {
                        "type": "boolean",
                        "description": "Was present at the service"
                    },
                    "wants_summary": {
                        "type": "boolean",
                        "description": "Wants to receive a summary"
                    },
                    "alternative_church": {
                        "type": "string",
                        "description": "Name of the other church, if visited"
                    },
                    "online_attended": {
                        "type": "boolean",
                        "description": "Watched or listened online"
                    }
                },
                "required": ["action"]
            }
        }),
        json!({
            "type": "function",
            "name": "manage_user",
            "description": "USE WHEN: a name is mentioned, an age, a church change, or a \
                            target group preference. ALSO on typos like 'my nme is'",
            "strict": false,
            "parameters": {
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "The member's name"
                    },
                    "age": {
                        "type": "integer",
                        "description": "Age in years"
                    },
                    "church": {
                        "type": "string",
                        "description": "Current church"
                    },
                    "target_group": {
                        "type": "string",
                        "enum": ["adult", "deepening", "youth"],
                        "description": "Content audience"
                    }
                },
                "required": []
            }
        }),
        json!({
            "type": "function",
            "name": "manage_subscription",
            "description": "USE WHEN: adjusting notifications, pausing, unsubscribing, or \
                            too many / too few messages",
            "strict": false,
            "parameters": {
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["change_frequency", "pause", "unsubscribe", "resume"],
                        "description": "Kind of change"
                    },
                    "notification_type": {
                        "type": "string",
                        "enum": ["all", "summary", "reflection", "weekly"],
                        "description": "Which notifications"
                    },
                    "frequency": {
                        "type": "string",
                        "enum": ["daily", "weekly", "biweekly", "never"],
                        "description": "New frequency"
                    },
                    "pause_until": {
                        "type": "string",
                        "description": "Pause until date (YYYY-MM-DD)"
                    },
                    "reason": {
                        "type": "string",
                        "description": "Reason for the change"
                    }
                },
                "required": ["action"]
            }
        }),
        json!({
            "type": "function",
            "name": "answer_question",
            "description": "USE WHEN: questions about faith, God, the Bible, the meaning of \
                            a sermon, or theological topics",
            "strict": false,
            "parameters": {
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question asked"
                    },
                    "category": {
                        "type": "string",
                        "enum": ["theology", "bible", "sermon", "faith", "practical"],
                        "description": "Kind of question"
                    },
                    "needs_search": {
                        "type": "boolean",
                        "description": "Search the vector store for context"
                    }
                },
                "required": ["question", "category"]
            }
        }),
        json!({
            "type": "function",
            "name": "process_feedback",
            "description": "USE WHEN: feedback, complaints, suggestions, questions about the \
                            service itself, or technical problems",
            "strict": false,
            "parameters": {
                "type": "object",
                "properties": {
                    "kind": {
                        "type": "string",
                        "enum": ["feedback", "complaint", "suggestion", "question", "technical"],
                        "description": "Kind of feedback"
                    },
                    "message": {
                        "type": "string",
                        "description": "The feedback text"
                    },
                    "severity": {
                        "type": "string",
                        "enum": ["low", "medium", "high"],
                        "description": "Priority"
                    }
                },
                "required": ["kind", "message"]
            }
        }),
    ];

    if let Some(id) = vector_store_id {
        tools.push(json!({
            "type": "file_search",
            "vector_store_ids": [id]
        }));
    }

    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_function_tools_without_vector_store() {
        let tools = build_toolset(None);
        assert_eq!(tools.len(), 5);
        let names: Vec<&str> = tools
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                "handle_sermon",
                "manage_user",
                "manage_subscription",
                "answer_question",
                "process_feedback"
            ]
        );
    }

    #[test]
    fn file_search_appended_when_vector_store_known() {
        let tools = build_toolset(Some("vs_123"));
        assert_eq!(tools.len(), 6);
        let search = &tools[5];
        assert_eq!(search["type"], "file_search");
        assert_eq!(search["vector_store_ids"][0], "vs_123");
    }

    #[test]
    fn required_arguments_match_the_dispatcher_registry() {
        let tools = build_toolset(None);
        let required = |idx: usize| -> Vec<String> {
            tools[idx]["parameters"]["required"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(required(0), vec!["action"]);
        assert!(required(1).is_empty());
        assert_eq!(required(2), vec!["action"]);
        assert_eq!(required(3), vec!["question", "category"]);
        assert_eq!(required(4), vec!["kind", "message"]);
    }
}
