//! MCP tool and resource definitions, and tool-result payloads.

use super::protocol::{Resource, Tool};
use crate::dispatch::{
    OperationResult, FIND_VIDEO, GENERATE_COURSE, GENERATE_HOMEWORK, GENERATE_QUIZ,
    GENERATE_SOLUTION, GET_TRANSCRIPT, MIN_QUIZ_DURATION,
};
use crate::error::ErrorKind;
use serde_json::{json, Value};

pub const INFO_URI: &str = "course://info";

const COURSE_INSTRUCTIONS: &str = "This is a structured course. Present as plain text or markdown list format only. Do not create HTML artifacts or interactive elements.";
const QUIZ_INSTRUCTIONS: &str = "This is structured quiz data. Present as plain text or markdown list format only. Do not create HTML artifacts or interactive elements.";

const INFO_TEXT: &str = "Course Generator MCP Server

This server provides educational content generation tools:

1. generate_course: Create structured course outlines with sessions and topics
2. find_video: Search for educational videos on specific topics
3. generate_quiz: Create quizzes sized to a video's length
4. get_transcript: Extract transcripts from video URLs
5. generate_homework: Generate homework from transcripts
6. generate_solution: Provide solutions for coding problems

All tools return structured JSON responses for easy integration.
";

/// Get all available tools.
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: GENERATE_COURSE.to_string(),
            description: "Generate a complete course structure with sessions and topics".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "The title of the course to generate"
                    },
                    "sessions": {
                        "type": "integer",
                        "description": "Number of sessions in the course",
                        "minimum": 1
                    },
                    "topics": {
                        "type": "integer",
                        "description": "Number of topics per session",
                        "minimum": 1
                    }
                },
                "required": ["title", "sessions", "topics"]
            }),
        },
        Tool {
            name: FIND_VIDEO.to_string(),
            description: "Find a 15-20 minute educational video for a specific topic. \
                Returns null when no video of suitable length is found."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "topic": {
                        "type": "string",
                        "description": "The topic to find a video for"
                    }
                },
                "required": ["topic"]
            }),
        },
        Tool {
            name: GENERATE_QUIZ.to_string(),
            description: "Generate multiple-choice questions for a video, one per five minutes of length"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "The title of the video"
                    },
                    "duration": {
                        "type": "integer",
                        "description": "Length of the video in minutes",
                        "minimum": MIN_QUIZ_DURATION
                    }
                },
                "required": ["title", "duration"]
            }),
        },
        Tool {
            name: GET_TRANSCRIPT.to_string(),
            description: "Transcribe the opening minutes of a video from its URL".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL of the video to transcribe",
                        "format": "uri"
                    }
                },
                "required": ["url"]
            }),
        },
        Tool {
            name: GENERATE_HOMEWORK.to_string(),
            description: "Generate a Python homework problem with skeleton code and hints from a transcript"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "transcript": {
                        "type": "string",
                        "description": "The transcript to base homework on"
                    }
                },
                "required": ["transcript"]
            }),
        },
        Tool {
            name: GENERATE_SOLUTION.to_string(),
            description: "Generate a solution for a problem with given skeleton code".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "problem": {
                        "type": "string",
                        "description": "Description of the problem to solve"
                    },
                    "skeleton": {
                        "type": "string",
                        "description": "Skeleton code or template for the solution"
                    }
                },
                "required": ["problem", "skeleton"]
            }),
        },
    ]
}

/// Get all available resources.
pub fn get_resources() -> Vec<Resource> {
    vec![Resource {
        uri: INFO_URI.to_string(),
        name: "Course Generator Information".to_string(),
        description: "Information about the course generator capabilities".to_string(),
        mime_type: "text/plain".to_string(),
    }]
}

/// Text of a resource, if it exists.
pub fn read_resource(uri: &str) -> Option<&'static str> {
    (uri == INFO_URI).then_some(INFO_TEXT)
}

/// JSON payload returned to the client for a successful tool call.
pub fn tool_payload(result: &OperationResult) -> Value {
    match result.operation {
        GENERATE_COURSE => json!({
            "course_data": result.data,
            "instructions": COURSE_INSTRUCTIONS,
            "format_preference": "text_only",
        }),
        GENERATE_QUIZ => {
            let mut payload = json!({
                "quiz_data": result.data,
                "instructions": QUIZ_INSTRUCTIONS,
                "format_preference": "text_only",
            });
            if result.dropped > 0 {
                payload["dropped_items"] = json!(result.dropped);
            }
            payload
        }
        GET_TRANSCRIPT => {
            let transcript = result.data.as_str().unwrap_or_default().trim();
            let (status, message) = if transcript.is_empty() {
                ("failed", "Failed to generate transcript")
            } else {
                ("success", "Transcript generated successfully")
            };
            json!({
                "transcript": transcript,
                "status": status,
                "message": message,
            })
        }
        _ => result.data.clone(),
    }
}

/// Structured body of a failed tool call.
pub fn error_payload(operation: &str, kind: ErrorKind, message: &str) -> Value {
    json!({
        "error": {
            "operation": operation,
            "kind": kind,
            "message": message,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::OPERATIONS;
    use crate::generation::OutcomeStatus;

    fn result(operation: &'static str, dropped: usize, data: Value) -> OperationResult {
        OperationResult {
            operation,
            status: OutcomeStatus::Complete,
            dropped,
            data,
        }
    }

    #[test]
    fn test_tools_cover_every_operation() {
        let names: Vec<String> = get_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, OPERATIONS.to_vec());
    }

    #[test]
    fn test_quiz_schema_minimum() {
        let quiz = get_tools().into_iter().find(|t| t.name == GENERATE_QUIZ).unwrap();
        assert_eq!(quiz.input_schema["properties"]["duration"]["minimum"], 5);
    }

    #[test]
    fn test_course_envelope() {
        let payload = tool_payload(&result(GENERATE_COURSE, 0, json!({"subject": "Rust"})));
        assert_eq!(payload["course_data"]["subject"], "Rust");
        assert_eq!(payload["format_preference"], "text_only");
    }

    #[test]
    fn test_quiz_envelope_reports_drops() {
        let clean = tool_payload(&result(GENERATE_QUIZ, 0, json!([])));
        assert!(clean.get("dropped_items").is_none());

        let partial = tool_payload(&result(GENERATE_QUIZ, 2, json!([])));
        assert_eq!(partial["dropped_items"], 2);
    }

    #[test]
    fn test_transcript_envelope() {
        let ok = tool_payload(&result(GET_TRANSCRIPT, 0, json!("  hello class ")));
        assert_eq!(ok["transcript"], "hello class");
        assert_eq!(ok["status"], "success");

        let failed = tool_payload(&result(GET_TRANSCRIPT, 0, json!("")));
        assert_eq!(failed["status"], "failed");
        assert_eq!(failed["message"], "Failed to generate transcript");
    }

    #[test]
    fn test_raw_payloads() {
        let video = tool_payload(&result(FIND_VIDEO, 0, Value::Null));
        assert!(video.is_null());
    }

    #[test]
    fn test_resources() {
        assert_eq!(get_resources()[0].uri, INFO_URI);
        assert!(read_resource(INFO_URI).unwrap().contains("generate_solution"));
        assert!(read_resource("course://other").is_none());
    }
}
