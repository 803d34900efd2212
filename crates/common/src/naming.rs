//! Identifier conversions shared by the parser, generator and CLI

/// Rust keywords that cannot be used as plain identifiers
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that are not allowed even as raw identifiers
const RESERVED: &[&str] = &["self", "super", "crate", "Self"];

/// Convert PascalCase to snake_case
///
/// Acronyms stay together: `SSEKMSKeyId` becomes `ssekms_key_id`,
/// `HTTPServer` becomes `http_server`.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            // Break before an uppercase letter that follows a lowercase letter or
            // digit, or that starts a new word after an acronym
            let should_add_underscore = i > 0
                && (chars[i - 1].is_lowercase()
                    || chars[i - 1].is_ascii_digit()
                    || (i + 1 < chars.len() && chars[i + 1].is_lowercase()));

            if should_add_underscore && !result.ends_with('_') {
                result.push('_');
            }
            result.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch == ' ' || ch == '.' || ch == '/' || ch == ':' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
        } else if ch.is_alphanumeric() || ch == '_' {
            result.push(ch);
        }
    }

    while result.contains("__") {
        result = result.replace("__", "_");
    }

    result.trim_matches('_').to_string()
}

/// Convert any name (snake_case, kebab-case, SCREAMING_CASE, PascalCase) to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();

    for word in split_words(s) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(&chars.as_str().to_lowercase());
        }
    }

    result
}

/// Split a name into words on separators and case boundaries
fn split_words(s: &str) -> Vec<String> {
    let has_lowercase = s.chars().any(|c| c.is_lowercase());

    s.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .flat_map(|part| {
            if has_lowercase {
                to_snake_case(part)
                    .split('_')
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            } else {
                // SCREAMING words carry no case boundaries
                vec![part.to_string()]
            }
        })
        .collect()
}

/// Make a snake_case name usable as a field or function identifier
pub fn field_ident(name: &str) -> String {
    let snake = to_snake_case(name);
    let snake = if snake.is_empty() {
        "value".to_string()
    } else if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("v{}", snake)
    } else {
        snake
    };

    if RESERVED.contains(&snake.as_str()) {
        format!("{}_value", snake)
    } else if KEYWORDS.contains(&snake.as_str()) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

/// Make a name usable as a module name (and file stem)
pub fn module_name(name: &str) -> String {
    let snake = to_snake_case(name);
    if KEYWORDS.contains(&snake.as_str()) || RESERVED.contains(&snake.as_str()) {
        format!("{}_", snake)
    } else {
        snake
    }
}

/// Make a name usable as a type name
pub fn type_ident(name: &str) -> String {
    let ident: String = name.chars().filter(|c| c.is_alphanumeric()).collect();
    let ident = if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("V{}", ident)
    } else {
        ident
    };

    let mut chars = ident.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Value".to_string(),
    }
}

/// Variant name for an enum value such as `ACTIVE`, `us-east-1` or `application/json`
pub fn variant_ident(value: &str) -> String {
    let pascal = to_pascal_case(value);
    if pascal.is_empty() {
        String::new()
    } else if pascal.starts_with(|c: char| c.is_ascii_digit()) {
        format!("V{}", pascal)
    } else {
        pascal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("CreateBucket"), "create_bucket");
        assert_eq!(to_snake_case("PutObject"), "put_object");
        assert_eq!(to_snake_case("S3Bucket"), "s3_bucket");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("XMLParser"), "xml_parser");
        assert_eq!(to_snake_case("__test__"), "test");
        assert_eq!(to_snake_case("DynamoDB"), "dynamo_db");
        assert_eq!(to_snake_case("Cognito Identity Provider"), "cognito_identity_provider");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("ACTIVE"), "Active");
        assert_eq!(to_pascal_case("us-east-1"), "UsEast1");
        assert_eq!(to_pascal_case("application/json"), "ApplicationJson");
        assert_eq!(to_pascal_case("PAY_PER_REQUEST"), "PayPerRequest");
        assert_eq!(to_pascal_case("DynamoDB"), "DynamoDb");
        assert_eq!(to_pascal_case("dynamo_db"), "DynamoDb");
    }

    #[test]
    fn test_field_ident_escapes_keywords() {
        assert_eq!(field_ident("Type"), "r#type");
        assert_eq!(field_ident("Self"), "self_value");
        assert_eq!(field_ident("TableName"), "table_name");
        assert_eq!(field_ident("3DSecure"), "v3_d_secure");
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name("Match"), "match_");
        assert_eq!(module_name("ListTables"), "list_tables");
    }

    #[test]
    fn test_type_and_variant_idents() {
        assert_eq!(type_ident("attributeValue"), "AttributeValue");
        assert_eq!(type_ident("2FA"), "V2FA");
        assert_eq!(variant_ident("1.0"), "V10");
        assert_eq!(variant_ident("*"), "");
    }
}
