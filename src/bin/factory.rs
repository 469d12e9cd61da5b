//! Factory planning batch command
//!
//! Reads one JSON problem document on stdin, writes one JSON solution
//! document (two-space indented) on stdout. Exits 0 in all normal cases;
//! `infeasible` and `error` are statuses, not process failures.

use foundry_optimization::packs::{Pack, PackRegistry};
use std::io::Read;

fn main() {
    let mut input = String::new();
    let document = match std::io::stdin().read_to_string(&mut input) {
        Ok(_) => match serde_json::from_str::<serde_json::Value>(&input) {
            Ok(value) => {
                let registry = PackRegistry::with_builtins();
                match registry.get("factory") {
                    Some(pack) => pack.solve_value(&value),
                    None => error_document("factory pack is not registered"),
                }
            }
            Err(err) => error_document(&format!("invalid input: {err}")),
        },
        Err(err) => error_document(&format!("stdin read failed: {err}")),
    };

    match serde_json::to_string_pretty(&document) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => println!("{}", fallback_error(&err.to_string())),
    }
}

fn error_document(message: &str) -> serde_json::Value {
    serde_json::json!({"status": "error", "message": message})
}

fn fallback_error(message: &str) -> String {
    format!("{{\n  \"status\": \"error\",\n  \"message\": \"{message}\"\n}}")
}
