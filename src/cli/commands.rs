use std::fmt::Write as _;

use serde::de::DeserializeOwned;

use crate::api::auth::demo_menus;
use crate::api::model::{LoginParams, RouteInfo};
use crate::cli::config::{AppConfig, build_app, build_view_registry, parse_route_mode};
use crate::error::{ConsoleError, FormError};
use crate::form::methods::SchemaForm;
use crate::form::props::SchemaFormProps;
use crate::form::value::{model_from_json, model_to_json};
use crate::router::route::{RouteNode, RouteRecord};
use crate::router::transform::{build_menu_tree, find_first_valid_route_name, flatten_routes, transform_route_tree};
use crate::router::views::ViewResolver;
use crate::session::controller::RouteMode;

// ============================================================================
// routes subcommand
// ============================================================================

pub fn cmd_routes(config: &AppConfig, menu: Option<&str>, rows: bool, mode: Option<&str>) -> Result<(), ConsoleError> {
    let menus = match menu {
        Some(path) if rows => build_menu_tree(&read_document::<Vec<RouteInfo>>(path)?),
        Some(path) => read_document::<Vec<RouteNode>>(path)?,
        None => demo_menus(),
    };
    let mode = mode.and_then(parse_route_mode).unwrap_or(config.routes.mode);
    print!("{}", render_routes(config, &menus, mode)?);
    Ok(())
}

/// Route table text for `menus`, followed by the landing route.
pub fn render_routes(config: &AppConfig, menus: &[RouteNode], mode: RouteMode) -> Result<String, ConsoleError> {
    let mut resolver = ViewResolver::new(build_view_registry(&config.views));
    let records = match mode {
        RouteMode::Flatten => flatten_routes(menus, &mut resolver)?,
        RouteMode::Nested => transform_route_tree(menus, &mut resolver)?,
    };

    let mut out = String::new();
    let _ = writeln!(out, "{} route(s) ({:?}):", count_routes(&records), mode);
    write_records(&mut out, &records, 1);
    match find_first_valid_route_name(menus) {
        Some(name) => {
            let _ = writeln!(out, "landing: {}", name);
        }
        None => {
            let _ = writeln!(out, "landing: {}", config.routes.home_path);
        }
    }
    Ok(out)
}

fn count_routes(records: &[RouteRecord]) -> usize {
    records.iter().map(|r| 1 + count_routes(&r.children)).sum()
}

fn write_records(out: &mut String, records: &[RouteRecord], depth: usize) {
    for record in records {
        let _ = writeln!(
            out,
            "{}{} {} -> {}",
            "  ".repeat(depth),
            record.name().unwrap_or("-"),
            record.path,
            record.component.describe()
        );
        write_records(out, &record.children, depth + 1);
    }
}

// ============================================================================
// form subcommand
// ============================================================================

pub fn cmd_form(schema: &str, values: Option<&str>, width: u32, toggle: bool, submit: bool) -> Result<(), ConsoleError> {
    let props: SchemaFormProps = read_document(schema)?;
    let values = match values {
        Some(raw) => Some(serde_json::from_str(raw).map_err(|e| ConsoleError::Parse {
            path: "--values".to_string(),
            message: e.to_string(),
        })?),
        None => None,
    };

    let mut form = SchemaForm::mounted(props);
    form.set_viewport_width(width);
    if let Some(values) = values {
        form.set_fields_value(model_from_json(values));
    }
    if toggle {
        form.handle_toggle_advanced();
    }

    print!("{}", render_form(&form));

    if submit {
        match form.handle_submit() {
            Ok(Some(shaped)) => println!("submitted: {}", model_to_json(&shaped)),
            Ok(None) => println!("submitted"),
            Err(FormError::Validation(errors)) => {
                for error in &errors.errors {
                    println!("invalid {}: {}", error.field, error.messages.join("; "));
                }
                return Err(FormError::Validation(errors).into());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Layout table and shaped values for a form.
pub fn render_form(form: &SchemaForm) -> String {
    let advance = form.advance_state();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "expanded: {}  toggle: {}  action span: {}",
        advance.is_advanced,
        if advance.hide_advance_btn { "hidden" } else { "shown" },
        advance.action_span
    );
    for schema in form.schemas() {
        if schema.component.is_divider() {
            let _ = writeln!(out, "  ---- {}", schema.label);
            continue;
        }
        let _ = writeln!(
            out,
            "  {:<20} {:<14} {:<8} {}",
            schema.field,
            schema.component.name(),
            schema.component.value_prop_name(),
            if form.is_field_visible(&schema.field) { "visible" } else { "collapsed" }
        );
    }
    let _ = writeln!(out, "values: {}", model_to_json(&form.get_fields_value()));
    out
}

// ============================================================================
// session subcommands
// ============================================================================

pub fn cmd_login(
    config: &AppConfig,
    username: &str,
    password: &str,
    redirect: Option<&str>,
) -> Result<(), ConsoleError> {
    let mut app = build_app(config)?;
    app.start()?;

    let route = app.login(&LoginParams::new(username, password), redirect)?;
    println!(
        "logged in as {}; opened {} ({})",
        app.session()
            .user_info()
            .map(|u| u.nickname.as_str())
            .unwrap_or(username),
        route.path,
        route.name.as_deref().unwrap_or("-")
    );
    println!("{} route(s) registered", app.session().loaded_routes().len());
    Ok(())
}

pub fn cmd_logout(config: &AppConfig) -> Result<(), ConsoleError> {
    let mut app = build_app(config)?;
    app.start()?;
    app.logout()?;
    println!("logged out");
    Ok(())
}

pub fn cmd_tabs(config: &AppConfig) -> Result<(), ConsoleError> {
    let mut app = build_app(config)?;
    app.start()?;

    let tabs = app.tabs();
    if tabs.tabs().is_empty() {
        println!("no open tabs");
        return Ok(());
    }
    for tab in tabs.tabs() {
        let marker = if tab.name == tabs.active_tab() { "*" } else { " " };
        let pin = if tab.affix { " (pinned)" } else { "" };
        println!("{} {} {} {}{}", marker, tab.name, tab.path, tab.title, pin);
    }
    println!("cached: {}", tabs.cached_views().join(", "));
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a YAML (or JSON) document.
pub fn read_document<T: DeserializeOwned>(path: &str) -> Result<T, ConsoleError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConsoleError::Read {
        path: path.to_string(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConsoleError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })
}
