use std::collections::HashMap;

use serde_json::Value;
use tera::Error;

/// Wrap a string in a fenced code block, optionally tagged with `lang`.
///
/// The fence is made longer than any run of backticks inside the block.
pub(super) fn code_block(value: &Value, args: &HashMap<String, Value>) -> Result<Value, Error> {
    let code = value
        .as_str()
        .ok_or(Error::msg("Function can only be used on a string"))?;
    let lang = match args.get("lang") {
        Some(Value::String(lang)) => lang.as_str(),
        Some(Value::Null) | None => "",
        Some(_) => return Err(Error::msg("Expected 'lang' to be a string")),
    };

    let mut longest = 0;
    let mut run = 0;
    for c in code.chars() {
        run = if c == '`' { run + 1 } else { 0 };
        longest = longest.max(run);
    }
    let fence = "`".repeat((longest + 1).max(3));

    Ok(Value::String(format!("{fence}{lang}\n{code}\n{fence}")))
}

/// Heading anchor the way GitHub derives it: lowercase, punctuation dropped, spaces to
/// dashes.
pub(super) fn anchor(value: &Value, _: &HashMap<String, Value>) -> Result<Value, Error> {
    let text = value
        .as_str()
        .ok_or(Error::msg("Function can only be used on a string"))?;

    Ok(Value::String(
        text.trim()
            .to_lowercase()
            .chars()
            .filter_map(|c| match c {
                ' ' => Some('-'),
                c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
                _ => None,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use maplit::hashmap;
    use serde_json::json;

    #[test]
    fn test_code_block() {
        let out = code_block(&json!("int x;"), &hashmap! {"lang".into() => json!("c")}).unwrap();
        assert_eq!(out, json!("```c\nint x;\n```"));

        let out = code_block(&json!("plain"), &HashMap::new()).unwrap();
        assert_eq!(out, json!("```\nplain\n```"));

        let out = code_block(&json!("a ```` b"), &HashMap::new()).unwrap();
        assert_eq!(out, json!("`````\na ```` b\n`````"));

        code_block(&json!(3), &HashMap::new()).unwrap_err();
        code_block(&json!("x"), &hashmap! {"lang".into() => json!(1)}).unwrap_err();
    }

    #[test]
    fn test_anchor() {
        assert_eq!(anchor(&json!("example1.c"), &HashMap::new()).unwrap(), json!("example1c"));
        assert_eq!(
            anchor(&json!("C++ SWIG Interface"), &HashMap::new()).unwrap(),
            json!("c-swig-interface")
        );
        assert_eq!(
            anchor(&json!("polynomial_v2.cc"), &HashMap::new()).unwrap(),
            json!("polynomial_v2cc")
        );
        anchor(&json!(null), &HashMap::new()).unwrap_err();
    }
}
