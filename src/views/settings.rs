//! Settings form. Every control carries `data-setting` with its camelCase
//! key and is applied as soon as it changes.
//!
//! Below the preferences sit the account, data, file and plugin panels.

use crate::models::{FileEntry, Plugin};
use crate::settings::{AppSettings, FontSize, Theme};
use crate::state::{AppState, AuthState, FileState, PluginState};
use crate::utils::{escape_html, format_bytes, relative_time, truncate};

fn select(key: &str, options: &[(&str, &str)], current: &str) -> String {
    let options: String = options
        .iter()
        .map(|(value, label)| {
            format!(
                r#"<option value="{value}"{sel}>{label}</option>"#,
                sel = if *value == current { " selected" } else { "" },
            )
        })
        .collect();
    format!(r#"<select data-setting="{key}">{options}</select>"#)
}

fn checkbox(key: &str, label: &str, checked: bool) -> String {
    format!(
        r#"<label class="checkbox"><input type="checkbox" data-setting="{key}"{checked}> {label}</label>"#,
        checked = if checked { " checked" } else { "" },
    )
}

pub fn html_for(settings: &AppSettings) -> String {
    let themes = [
        (Theme::Dark.as_str(), "Dark"),
        (Theme::Light.as_str(), "Light"),
        (Theme::HighContrast.as_str(), "High contrast"),
    ];
    let sizes = [
        (FontSize::Small.as_str(), "Small"),
        (FontSize::Medium.as_str(), "Medium"),
        (FontSize::Large.as_str(), "Large"),
    ];
    let languages = [("en", "English"), ("es", "Español"), ("fr", "Français"), ("de", "Deutsch")];

    format!(
        r#"<div class="panel"><h2>Appearance</h2>
<label>Theme {theme}</label>
<label>Font size {font}</label>
{motion}
</div>
<div class="panel"><h2>General</h2>
<label>Language {language}</label>
{notifications}
{sound}
</div>
<div class="panel"><h2>Workflow drafts</h2>
{autosave}
<label>Autosave every <input type="number" min="1" step="1" data-setting="autoSaveInterval" value="{interval}"> seconds</label>
</div>
<div class="view-toolbar"><button type="button" class="btn btn-danger" data-action="reset-settings">Reset to defaults</button></div>"#,
        theme = select("theme", &themes, settings.theme.as_str()),
        font = select("fontSize", &sizes, settings.font_size.as_str()),
        motion = checkbox("reduceMotion", "Reduce motion", settings.reduce_motion),
        language = select("language", &languages, &settings.language),
        notifications = checkbox("notifications", "Show notifications", settings.notifications),
        sound = checkbox("soundEffects", "Sound effects", settings.sound_effects),
        autosave = checkbox("autoSave", "Autosave workflow drafts", settings.auto_save),
        interval = settings.auto_save_interval / 1000,
    )
}

fn account(auth: &AuthState) -> String {
    let body = match &auth.user {
        Some(user) => format!(
            r#"<p>Signed in as <strong>{name}</strong>{email}</p><button type="button" class="btn" data-action="logout">Sign out</button>"#,
            name = escape_html(user.display_name()),
            email = user
                .email
                .as_deref()
                .map(|e| format!(" ({})", escape_html(e)))
                .unwrap_or_default(),
        ),
        None if auth.verifying => r#"<p class="loading">Checking session...</p>"#.to_string(),
        None => format!(
            r#"<form data-form="login" class="login-form">
<label>Username <input type="text" name="username" autocomplete="username"></label>
<label>Password <input type="password" name="password" autocomplete="current-password"></label>
<button type="submit" class="btn btn-primary"{disabled}>{label}</button>
</form>"#,
            disabled = if auth.signing_in { " disabled" } else { "" },
            label = if auth.signing_in { "Signing in..." } else { "Sign in" },
        ),
    };
    format!(r#"<div class="panel account-panel"><h2>Account</h2>{body}</div>"#)
}

fn data_panel() -> String {
    r#"<div class="panel data-panel"><h2>Data</h2>
<p class="muted">Settings, recent agents and chat history stored in this browser.</p>
<button type="button" class="btn" data-action="export-data">Export</button>
<form data-form="import-data">
<textarea name="data" rows="4" placeholder="Paste exported data"></textarea>
<button type="submit" class="btn">Import</button>
</form>
</div>"#
        .to_string()
}

fn file_row(file: &FileEntry, now_ms: u64) -> String {
    let modified = file
        .modified
        .map(|secs| relative_time((secs.max(0.0) * 1000.0) as u64, now_ms))
        .unwrap_or_default();
    format!(
        r#"<li class="file-row"><span class="file-name">{name}</span><span class="file-size">{size}</span><span class="file-modified">{modified}</span><button type="button" class="btn btn-small" data-action="download-file" data-id="{path}">Download</button><button type="button" class="btn btn-small btn-danger" data-action="delete-file" data-id="{path}">Delete</button></li>"#,
        name = escape_html(&file.name),
        size = format_bytes(file.size, 1),
        path = escape_html(file.path()),
    )
}

fn files(files: &FileState, now_ms: u64) -> String {
    let body = if files.loading && files.list.is_empty() {
        r#"<p class="loading">Loading files...</p>"#.to_string()
    } else if files.list.is_empty() {
        r#"<p class="muted">No uploaded files.</p>"#.to_string()
    } else {
        format!(
            r#"<ul class="file-list">{}</ul>"#,
            files.list.iter().map(|f| file_row(f, now_ms)).collect::<String>()
        )
    };
    format!(
        r#"<div class="panel files-panel"><div class="panel-header"><h2>Files</h2><button type="button" class="btn btn-small" data-action="refresh-files">Refresh</button></div>{body}</div>"#
    )
}

fn plugin_row(plugin: &Plugin, busy: bool) -> String {
    let (toggle_action, toggle_label) = if plugin.is_active() {
        ("deactivate-plugin", "Deactivate")
    } else {
        ("activate-plugin", "Activate")
    };
    let disabled = if busy { " disabled" } else { "" };
    format!(
        r#"<li class="plugin-row"><span class="plugin-name">{name}</span><span class="plugin-version">{version}</span><span class="status-badge status-{status}">{status}</span><span class="plugin-desc">{desc}</span><button type="button" class="btn btn-small" data-action="{toggle_action}" data-id="{id}"{disabled}>{toggle_label}</button><button type="button" class="btn btn-small btn-danger" data-action="uninstall-plugin" data-id="{id}"{disabled}>Uninstall</button></li>"#,
        name = escape_html(&plugin.name),
        version = plugin
            .version
            .as_deref()
            .map(|v| format!("v{}", escape_html(v)))
            .unwrap_or_default(),
        status = plugin.status.as_str(),
        desc = escape_html(&truncate(&plugin.description, 80, "...")),
        id = escape_html(&plugin.id),
    )
}

fn plugins(plugins: &PluginState) -> String {
    let body = if plugins.loading && plugins.list.is_empty() {
        r#"<p class="loading">Loading plugins...</p>"#.to_string()
    } else if plugins.list.is_empty() {
        r#"<p class="muted">No plugins installed.</p>"#.to_string()
    } else {
        format!(
            r#"<ul class="plugin-list">{}</ul>"#,
            plugins
                .list
                .iter()
                .map(|p| plugin_row(p, plugins.busy.as_deref() == Some(p.id.as_str())))
                .collect::<String>()
        )
    };
    format!(
        r#"<div class="panel plugins-panel"><div class="panel-header"><h2>Plugins</h2><button type="button" class="btn btn-small" data-action="refresh-plugins">Refresh</button></div>{body}</div>"#
    )
}

pub fn html(state: &AppState) -> String {
    format!(
        r#"<section class="settings-view">
{preferences}
{account}
{data}
{files}
{plugins}
</section>"#,
        preferences = html_for(&state.settings),
        account = account(&state.auth),
        data = data_panel(),
        files = files(&state.files, state.now_ms()),
        plugins = plugins(&state.plugins),
    )
}
