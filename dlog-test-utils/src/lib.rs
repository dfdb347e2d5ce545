//! dlog Test Utilities
//!
//! Shared fixtures for the dlog crates: an order-preserving record builder,
//! log-shaped sample generators and NDJSON helpers.

use serde_json::{Map, Value};

/// Builder for creating test records with common patterns.
///
/// Fields keep the order they were added in.
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    /// Create a new record builder
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Add a field with a string value
    pub fn string(mut self, key: &str, value: &str) -> Self {
        self.fields
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Add a field with an integer value
    pub fn int(mut self, key: &str, value: i64) -> Self {
        self.fields.insert(key.to_string(), Value::Number(value.into()));
        self
    }

    /// Add a field with a float value
    pub fn float(mut self, key: &str, value: f64) -> Self {
        let number = serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.fields.insert(key.to_string(), number);
        self
    }

    /// Add a field with a boolean value
    pub fn bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), Value::Bool(value));
        self
    }

    /// Add a field with a null value
    pub fn null(mut self, key: &str) -> Self {
        self.fields.insert(key.to_string(), Value::Null);
        self
    }

    /// Add a field with an object value
    pub fn object(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Add a field with an array value
    pub fn array(mut self, key: &str, value: Vec<Value>) -> Self {
        self.fields.insert(key.to_string(), Value::Array(value));
        self
    }

    /// Build the record
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate test data with various patterns
pub struct TestDataGenerator;

impl TestDataGenerator {
    /// Structured log lines with a small set of recurring keys and values
    pub fn log_records(count: usize) -> Vec<Value> {
        let mut records = Vec::with_capacity(count);

        for i in 0..count {
            let user_id = i % 100; // 100 unique users
            let level = match i % 4 {
                0 => "DEBUG",
                1 => "INFO",
                2 => "WARN",
                _ => "ERROR",
            };

            records.push(
                RecordBuilder::new()
                    .int("ts", 1_609_459_200_000 + i as i64)
                    .string("level", level)
                    .string("user", &format!("user_{}", user_id))
                    .string("msg", &format!("request {} served", i))
                    .float("latency_ms", (i % 250) as f64 + 0.25)
                    .object(
                        "http",
                        RecordBuilder::new()
                            .string("method", if i % 5 == 0 { "POST" } else { "GET" })
                            .int("status", if i % 17 == 0 { 500 } else { 200 })
                            .build(),
                    )
                    .array(
                        "tags",
                        vec![Value::from("api"), Value::from(format!("shard-{}", i % 8))],
                    )
                    .build(),
            );
        }

        records
    }

    /// Records with schema drift (field types change across records)
    pub fn schema_drift_records() -> Vec<Value> {
        vec![
            RecordBuilder::new()
                .string("id", "1")
                .int("value", 42)
                .build(),
            RecordBuilder::new()
                .string("id", "2")
                .string("value", "hello") // Same field, different type
                .build(),
            RecordBuilder::new()
                .string("id", "3")
                .bool("value", true) // Same field, different type
                .build(),
            RecordBuilder::new().string("id", "4").null("value").build(),
        ]
    }

    /// Records with deeply nested structures
    pub fn deeply_nested_records() -> Vec<Value> {
        let mut nested = Value::String("leaf".to_string());
        for i in 0..32 {
            nested = if i % 2 == 0 {
                RecordBuilder::new()
                    .object(&format!("level_{}", i), nested)
                    .build()
            } else {
                Value::Array(vec![nested, Value::from(i)])
            };
        }

        vec![RecordBuilder::new()
            .string("id", "deep")
            .object("nested", nested)
            .build()]
    }

    /// Records with Unicode edge cases
    pub fn unicode_edge_records() -> Vec<Value> {
        vec![
            RecordBuilder::new()
                .string("id", "1")
                .string("ascii", "Hello, World!")
                .build(),
            RecordBuilder::new()
                .string("id", "2")
                .string("unicode", "Hello, 世界! 🌍")
                .build(),
            RecordBuilder::new()
                .string("id", "3")
                .string("emoji", "🚀🎉💯🔥⭐")
                .build(),
            RecordBuilder::new()
                .string("id", "4")
                .string("mixed", "ASCII + 中文 + 🎯 + العربية")
                .string("ключ", "newline\nand \"quotes\"")
                .build(),
        ]
    }

    /// Records with boundary values
    pub fn boundary_value_records() -> Vec<Value> {
        vec![
            RecordBuilder::new()
                .string("id", "int_max")
                .int("value", i64::MAX)
                .build(),
            RecordBuilder::new()
                .string("id", "int_min")
                .int("value", i64::MIN)
                .build(),
            RecordBuilder::new()
                .string("id", "u64_max")
                .object("value", Value::from(u64::MAX))
                .build(),
            RecordBuilder::new()
                .string("id", "tiny_float")
                .float("value", f64::MIN_POSITIVE)
                .build(),
            RecordBuilder::new()
                .string("id", "negative_zero")
                .float("value", -0.0)
                .build(),
            RecordBuilder::new()
                .string("id", "empty_string")
                .string("value", "")
                .build(),
            RecordBuilder::new()
                .string("id", "empty_array")
                .array("value", vec![])
                .build(),
            RecordBuilder::new()
                .string("id", "empty_object")
                .object("value", Value::Object(Map::new()))
                .build(),
            RecordBuilder::new().string("", "empty key").build(),
        ]
    }

    /// Top-level scalars and arrays, one per line
    pub fn scalar_lines() -> Vec<Value> {
        vec![
            Value::Null,
            Value::Bool(true),
            Value::from(-5),
            Value::from(0.5),
            Value::from("just a string"),
            Value::Array(vec![]),
            Value::Object(Map::new()),
        ]
    }
}

/// Serialize values as compact NDJSON
pub fn to_ndjson(values: &[Value]) -> String {
    let mut out = String::new();
    for value in values {
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

/// Parse NDJSON, skipping blank lines
pub fn from_ndjson(text: &str) -> Vec<Value> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("valid NDJSON line"))
        .collect()
}

/// Utility functions for test assertions
pub mod assertions {
    use serde_json::Value;

    /// Assert that two JSON values are equal, including object key order
    pub fn assert_json_equal(actual: &Value, expected: &Value, context: &str) {
        let actual_text = actual.to_string();
        let expected_text = expected.to_string();
        if actual != expected || actual_text != expected_text {
            panic!(
                "JSON assertion failed in {}:\nExpected: {}\nActual: {}",
                context, expected_text, actual_text
            );
        }
    }

    /// Assert that every decoded line matches its source line
    pub fn assert_lines_equal(actual: &[Value], expected: &[Value]) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "decoded {} lines, expected {}",
            actual.len(),
            expected.len()
        );
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert_json_equal(a, e, &format!("line {}", i + 1));
        }
    }
}
