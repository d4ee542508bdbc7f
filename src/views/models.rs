//! Model providers: connection status, connection test form and the list
//! of available models.

use crate::constants::DEFAULT_MODEL;
use crate::models::{ModelInfo, Provider};
use crate::state::{AppState, ModelState};
use crate::utils::{escape_html, format_bytes};

fn provider_card(models: &ModelState, provider: Provider) -> String {
    let connected = models.status.is_connected(provider);
    let testing = models.testing == Some(provider);
    format!(
        r#"<div class="provider-card{cls}"><span class="provider-icon">{icon}</span><span class="provider-name">{label}</span><span class="badge {badge}">{state}</span></div>"#,
        cls = if connected { " connected" } else { "" },
        icon = provider.icon(),
        label = provider.label(),
        badge = if connected { "badge-success" } else { "badge-muted" },
        state = if testing {
            "Testing..."
        } else if connected {
            "Connected"
        } else {
            "Disconnected"
        },
    )
}

fn model_row(model: &ModelInfo, active: Option<&str>) -> String {
    let provider = model
        .provider
        .as_deref()
        .and_then(Provider::parse)
        .unwrap_or(Provider::Ollama);
    let is_active = model.active || active == Some(model.name.as_str());
    let action = if is_active {
        r#"<span class="badge badge-success">Active</span>"#.to_string()
    } else {
        format!(
            r#"<button type="button" class="btn btn-small" data-action="switch-model" data-id="{}" data-value="{}">Use</button>"#,
            escape_html(&model.name),
            provider.as_str()
        )
    };
    format!(
        r#"<tr><td>{name}</td><td>{provider}</td><td>{size}</td><td>{action}</td></tr>"#,
        name = escape_html(&model.name),
        provider = provider.label(),
        size = model.size.map(|s| format_bytes(s, 1)).unwrap_or_default(),
        action = action,
    )
}

fn test_form_html(testing: bool) -> String {
    let types: String = Provider::ALL
        .iter()
        .map(|p| format!(r#"<option value="{}">{}</option>"#, p.as_str(), p.label()))
        .collect();
    format!(
        r#"<form class="panel model-config" data-form="test-connection">
<h2>Test connection</h2>
<label>Provider<select name="type">{types}</select></label>
<label>Model<input type="text" name="name" value="{model}"></label>
<label>Server URL<input type="url" name="url" placeholder="http://localhost:11434"></label>
<label>Temperature<input type="number" name="temperature" min="0" max="2" step="0.1" value="0.7"></label>
<button type="submit" class="btn btn-primary"{disabled}>{label}</button>
</form>"#,
        types = types,
        model = DEFAULT_MODEL,
        disabled = if testing { " disabled" } else { "" },
        label = if testing { "Testing..." } else { "Test connection" },
    )
}

pub fn html(state: &AppState) -> String {
    let models = &state.models;
    let providers: String = Provider::ALL
        .iter()
        .map(|p| provider_card(models, *p))
        .collect();
    let list = if models.loading && models.list.is_empty() {
        r#"<p class="loading">Loading models...</p>"#.to_string()
    } else if models.list.is_empty() {
        r#"<p class="muted">No models available.</p>"#.to_string()
    } else {
        let rows: String = models
            .list
            .iter()
            .map(|m| model_row(m, models.active_model.as_deref()))
            .collect();
        format!(
            r#"<table class="model-table"><thead><tr><th>Model</th><th>Provider</th><th>Size</th><th></th></tr></thead><tbody>{}</tbody></table>"#,
            rows
        )
    };

    format!(
        r#"<section class="models-view">
<div class="view-toolbar"><button type="button" class="btn" data-action="refresh-models">Refresh</button></div>
<div class="provider-grid">{providers}</div>
{form}
<div class="panel"><h2>Available models</h2>{list}</div>
</section>"#,
        providers = providers,
        form = test_form_html(models.testing.is_some()),
        list = list,
    )
}
