//! Field validators used by the agent, workflow and model forms.
//!
//! Every validator returns `Ok(())` or the user-facing error text. Optional
//! checks (min/max length, number, url, pattern) pass on empty input so they
//! can be combined with [`required`].

use std::collections::BTreeMap;

pub type FieldResult = Result<(), String>;

pub fn required(value: &str, field: &str) -> FieldResult {
    if value.is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

pub fn email(value: &str) -> FieldResult {
    if value.is_empty() {
        return Err("Email is required".to_string());
    }
    // local@domain.tld with no whitespace anywhere
    let valid = !value.chars().any(char::is_whitespace)
        && match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain
                        .rsplit_once('.')
                        .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                        .unwrap_or(false)
            }
            None => false,
        };
    if !valid {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(())
}

pub fn password(value: &str) -> FieldResult {
    if value.is_empty() {
        return Err("Password is required".to_string());
    }
    if value.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    if !value.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }
    Ok(())
}

pub fn confirm_password(password: &str, confirm: &str) -> FieldResult {
    if password != confirm {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}

pub fn min_length(value: &str, min: usize, field: &str) -> FieldResult {
    if !value.is_empty() && value.chars().count() < min {
        return Err(format!("{} must be at least {} characters long", field, min));
    }
    Ok(())
}

pub fn max_length(value: &str, max: usize, field: &str) -> FieldResult {
    if !value.is_empty() && value.chars().count() > max {
        return Err(format!(
            "{} must be no more than {} characters long",
            field, max
        ));
    }
    Ok(())
}

pub fn number(value: &str, field: &str) -> FieldResult {
    if !value.is_empty() && value.trim().parse::<f64>().is_err() {
        return Err(format!("{} must be a valid number", field));
    }
    Ok(())
}

pub fn min_value(value: f64, min: f64, field: &str) -> FieldResult {
    if value < min {
        return Err(format!("{} must be at least {}", field, min));
    }
    Ok(())
}

pub fn max_value(value: f64, max: f64, field: &str) -> FieldResult {
    if value > max {
        return Err(format!("{} must be no more than {}", field, max));
    }
    Ok(())
}

/// Accepts absolute URLs of the form `scheme://host[...]`.
pub fn url(value: &str, field: &str) -> FieldResult {
    if value.is_empty() {
        return Ok(());
    }
    let valid = match value.split_once("://") {
        Some((scheme, rest)) => {
            let mut scheme_chars = scheme.chars();
            let scheme_ok = scheme_chars
                .next()
                .map(|c| c.is_ascii_alphabetic())
                .unwrap_or(false)
                && scheme_chars.all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c));
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            scheme_ok && !host.is_empty() && !rest.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(format!("{} must be a valid URL", field));
    }
    Ok(())
}

pub fn pattern(
    value: &str,
    matches: impl Fn(&str) -> bool,
    message: Option<&str>,
    field: &str,
) -> FieldResult {
    if !value.is_empty() && !matches(value) {
        return Err(message
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} format is invalid", field)));
    }
    Ok(())
}

fn is_agent_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-'
}

pub fn agent_name(name: &str) -> FieldResult {
    required(name, "Agent name")?;
    min_length(name, 2, "Agent name")?;
    max_length(name, 100, "Agent name")?;
    pattern(
        name,
        |v| v.chars().all(is_agent_name_char),
        Some("Agent name can only contain letters, numbers, spaces, hyphens, and underscores"),
        "Agent name",
    )
}

pub fn agent_description(description: &str) -> FieldResult {
    max_length(description, 500, "Agent description")
}

pub fn workflow_name(name: &str) -> FieldResult {
    required(name, "Workflow name")?;
    min_length(name, 2, "Workflow name")?;
    max_length(name, 100, "Workflow name")
}

/// Form values of the model connection dialog.
#[derive(Debug, Clone, Default)]
pub struct ModelConfigInput {
    pub model_type: String,
    pub model_name: String,
    pub temperature: Option<f64>,
}

pub fn model_config(config: Option<&ModelConfigInput>) -> FieldResult {
    let config = config.ok_or_else(|| "Model configuration is required".to_string())?;
    if config.model_type.is_empty() {
        return Err("Model type is required".to_string());
    }
    if config.model_name.is_empty() {
        return Err("Model name is required".to_string());
    }
    if let Some(temperature) = config.temperature {
        min_value(temperature, 0.0, "Temperature")?;
        max_value(temperature, 2.0, "Temperature")?;
    }
    Ok(())
}

pub type FormData = BTreeMap<String, String>;

/// A validator applied to one field; also sees the whole form so that
/// cross-field checks (password confirmation) can be expressed.
pub type FieldValidator = Box<dyn Fn(&str, &FormData) -> FieldResult>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValidation {
    pub errors: BTreeMap<String, String>,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }
}

/// Run each field's validators in order and keep the first error per field.
/// Missing fields validate as the empty string.
pub fn validate_form(data: &FormData, rules: &[(&str, Vec<FieldValidator>)]) -> FormValidation {
    let mut result = FormValidation::default();
    for (field, validators) in rules {
        let value = data.get(*field).map(String::as_str).unwrap_or("");
        if let Some(err) = validators
            .iter()
            .find_map(|validate| validate(value, data).err())
        {
            result.errors.insert((*field).to_string(), err);
        }
    }
    result
}
