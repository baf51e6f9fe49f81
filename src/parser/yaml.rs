use super::types::{Action, Scenario, ScenarioHeader};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("static regex"));

/// Load scenarios from a YAML file, or every YAML file under a directory
pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>> {
    scenario_files(path)
        .iter()
        .map(|f| parse_scenario_file(f))
        .collect()
}

/// Parse a YAML scenario file
pub fn parse_scenario_file(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    parse_yaml_content(&content, path)
        .with_context(|| format!("Failed to parse scenario: {}", path.display()))
}

/// Parse YAML content into a Scenario
///
/// Accepts an optional header document separated from the step list by a
/// `---` line. Without a name in the header the file stem is used.
pub fn parse_yaml_content(content: &str, source_path: &Path) -> Result<Scenario> {
    let (header_yaml, steps_yaml) = split_documents(content);

    let header: ScenarioHeader = match header_yaml {
        Some(h) if !h.trim().is_empty() => {
            serde_yaml::from_str(&h).context("Failed to parse YAML header")?
        }
        _ => ScenarioHeader::default(),
    };

    let env = header.env.clone().unwrap_or_default();
    let steps = parse_steps(&steps_yaml)?
        .into_iter()
        .map(|step| step.map_strings(|s| substitute_vars(s, &env)))
        .collect();

    let name = header.name.clone().unwrap_or_else(|| file_stem(source_path));

    Ok(Scenario {
        name,
        steps,
        tags: header.tags,
        url: header.url.map(|u| substitute_vars(&u, &env)),
    })
}

fn split_documents(content: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = content.lines().collect();
    match lines.iter().position(|l| l.trim() == "---") {
        Some(idx) => (Some(lines[..idx].join("\n")), lines[idx + 1..].join("\n")),
        None => (None, content.to_string()),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

/// Parse the step list of a scenario file
pub fn parse_steps(yaml: &str) -> Result<Vec<Action>> {
    let yaml = yaml.trim();
    if yaml.is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<serde_yaml::Value> =
        serde_yaml::from_str(yaml).context("Failed to parse YAML steps")?;

    values
        .iter()
        .enumerate()
        .map(|(i, v)| parse_step_value(v).with_context(|| format!("Invalid step #{}", i + 1)))
        .collect()
}

#[derive(Deserialize)]
struct SelectorParams {
    selector: String,
}

#[derive(Deserialize)]
struct NavigateParams {
    url: String,
}

#[derive(Deserialize)]
struct FillParams {
    selector: String,
    text: String,
}

#[derive(Deserialize)]
struct PressKeyParams {
    selector: String,
    #[serde(default = "default_key")]
    key: String,
}

fn default_key() -> String {
    "Enter".to_string()
}

#[derive(Deserialize)]
struct CountParams {
    selector: String,
    #[serde(alias = "count")]
    expected: usize,
}

#[derive(Deserialize)]
struct TextParams {
    selector: String,
    #[serde(alias = "text")]
    expected: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassParams {
    selector: String,
    #[serde(alias = "class")]
    class_name: String,
}

/// Parse a single step like `- click: ".toggle"` or `- fill: {selector, text}`
pub fn parse_step_value(value: &serde_yaml::Value) -> Result<Action> {
    let map = match value {
        serde_yaml::Value::Mapping(map) => map,
        serde_yaml::Value::String(s) => {
            anyhow::bail!("Step '{}' needs parameters", s);
        }
        _ => anyhow::bail!("Invalid step format: {:?}", value),
    };

    if map.len() != 1 {
        anyhow::bail!("Invalid step format: expected single key mapping");
    }

    let (key, params) = map
        .iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty step"))?;
    let name = key
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Step name must be a string"))?;

    let action = match name {
        "navigate" | "goto" | "open" => {
            let url = match params {
                serde_yaml::Value::String(s) => s.clone(),
                _ => serde_yaml::from_value::<NavigateParams>(params.clone())?.url,
            };
            Action::Navigate { url }
        }
        "fill" | "inputText" => {
            let p: FillParams = serde_yaml::from_value(params.clone())?;
            Action::fill(&p.selector, &p.text)
        }
        "pressKey" | "press" => {
            let p: PressKeyParams = serde_yaml::from_value(params.clone())?;
            Action::press_key(&p.selector, &p.key)
        }
        "click" | "tapOn" => Action::click(&selector_param(params)?),
        "hover" => Action::hover(&selector_param(params)?),
        "doubleClick" | "dblclick" => Action::double_click(&selector_param(params)?),
        "assertVisible" => Action::assert_visible(&selector_param(params)?),
        "assertCount" => {
            let p: CountParams = serde_yaml::from_value(params.clone())?;
            Action::assert_count(&p.selector, p.expected)
        }
        "assertText" | "assertContainsText" => {
            let p: TextParams = serde_yaml::from_value(params.clone())?;
            Action::assert_text(&p.selector, &p.expected)
        }
        "assertTextEquals" | "assertValue" => {
            let p: TextParams = serde_yaml::from_value(params.clone())?;
            Action::assert_text_equals(&p.selector, &p.expected)
        }
        "assertHasClass" | "assertClass" => {
            let p: ClassParams = serde_yaml::from_value(params.clone())?;
            Action::assert_has_class(&p.selector, &p.class_name)
        }
        other => anyhow::bail!("Unknown step: {}", other),
    };

    Ok(action)
}

/// Selector given either as a bare string or as `{selector: ...}`
fn selector_param(params: &serde_yaml::Value) -> Result<String> {
    match params {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        _ => Ok(serde_yaml::from_value::<SelectorParams>(params.clone())?.selector),
    }
}

/// Substitute `${NAME}` from the header env, then the process environment
///
/// Unknown names are left untouched.
pub fn substitute_vars(text: &str, env: &HashMap<String, String>) -> String {
    if !text.contains("${") {
        return text.to_string();
    }

    VAR_PATTERN.replace_all(text, |caps: &regex::Captures| {
        let key = &caps[1];
        env.get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
            .unwrap_or_else(|| format!("${{{}}}", key))
    })
    .to_string()
}

/// The file itself, or every YAML file under the directory in name order
pub fn scenario_files(path: &Path) -> Vec<PathBuf> {
    if path.is_dir() {
        walkdir::WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.extension().map_or(false, |ext| ext == "yaml" || ext == "yml"))
            .collect()
    } else {
        vec![path.to_path_buf()]
    }
}
