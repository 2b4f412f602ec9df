use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use aws_sdk_secretsmanager::{error::DisplayErrorContext, Client};

/// Fetches a secret whose `SecretString` is a flat JSON object and returns it
/// as string settings. Non-string JSON values are stringified.
pub async fn fetch_settings(client: &Client, secret_id: &str) -> Result<HashMap<String, String>> {
    let output = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| anyhow!("fetching secret {secret_id}: {}", DisplayErrorContext(&e)))?;
    let raw = output
        .secret_string()
        .ok_or_else(|| anyhow!("secret {secret_id} has no string value"))?;
    parse_settings(raw).with_context(|| format!("decoding secret {secret_id}"))
}

pub fn parse_settings(raw: &str) -> Result<HashMap<String, String>> {
    let map: HashMap<String, serde_json::Value> = serde_json::from_str(raw)?;
    Ok(map
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_object() {
        let settings = parse_settings(r#"{"TABLE_NAME":"todos-prod","PORT":8080,"UNUSED":null}"#).unwrap();
        assert_eq!(settings["TABLE_NAME"], "todos-prod");
        assert_eq!(settings["PORT"], "8080");
        assert!(!settings.contains_key("UNUSED"));
    }

    #[test]
    fn rejects_non_object() {
        assert!(parse_settings("[1,2]").is_err());
        assert!(parse_settings("not json").is_err());
    }
}
