//! Response schema for structured student analysis.

use serde_json::{json, Value};

pub const ANALYSIS_REQUIRED_FIELDS: [&str; 4] =
    ["riskDrivers", "weakTopics", "interventionPlan", "predictedOutcome"];

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "riskDrivers": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of top 3 factors contributing to the student's risk level."
            },
            "weakTopics": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "topic": { "type": "STRING" },
                        "confidence": { "type": "NUMBER", "description": "0-100 confidence score" },
                        "reasoning": { "type": "STRING" }
                    }
                },
                "description": "Identified academic topics where the student is struggling."
            },
            "interventionPlan": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": { "type": "STRING", "enum": ["Academic", "Behavioral", "Administrative"] },
                        "description": { "type": "STRING" },
                        "resources": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "priority": { "type": "STRING", "enum": ["High", "Medium", "Low"] }
                    }
                },
                "description": "Actionable steps to improve student performance."
            },
            "predictedOutcome": {
                "type": "STRING",
                "description": "A short predictive statement about the student's trajectory if no action is taken."
            }
        },
        "required": ANALYSIS_REQUIRED_FIELDS
    })
}
