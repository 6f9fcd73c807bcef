use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::error::ScrapeError;

/// How one field is located on a page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldRule {
    /// Text of the first element matching `selector`.
    Text { selector: String },
    /// Attribute value of the first element matching `selector`.
    Attribute { selector: String, attribute: String },
    /// Text of the first `child` inside the first `container`.
    Nested { container: String, child: String },
    /// Text of the first node at a fixed tree position, written as an xpath
    /// (`//tag[@id="x"]/tag[n]/tag`).
    Positional { path: String },
}

/// Field name to rule bindings for the directory markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectorTable {
    pub profile_card: String,
    pub profile_link: FieldRule,
    pub name: FieldRule,
    pub address: FieldRule,
    pub website: FieldRule,
    pub business_description: FieldRule,
    pub phone_number: FieldRule,
}

impl Default for SelectorTable {
    fn default() -> Self {
        SelectorTable {
            profile_card: "h2.profile-card__title".to_string(),
            profile_link: FieldRule::Attribute {
                selector: "a".to_string(),
                attribute: "href".to_string(),
            },
            name: FieldRule::Text {
                selector: "h1.copro-supplier-name".to_string(),
            },
            address: FieldRule::Text {
                selector: "span.copro-address-line".to_string(),
            },
            website: FieldRule::Attribute {
                selector: "a.text".to_string(),
                attribute: "href".to_string(),
            },
            business_description: FieldRule::Nested {
                container: "div#copro_pdm".to_string(),
                child: "p".to_string(),
            },
            phone_number: FieldRule::Positional {
                path: r#"//*[@id="copro_naft"]/div[1]/div/p[2]/span[2]"#.to_string(),
            },
        }
    }
}

impl SelectorTable {
    pub fn compile(&self) -> Result<CompiledSelectors, ScrapeError> {
        Ok(CompiledSelectors {
            profile_card: parse_selector("profile_card", &self.profile_card)?,
            profile_link: CompiledRule::compile("profile_link", &self.profile_link)?,
            name: CompiledRule::compile("name", &self.name)?,
            address: CompiledRule::compile("address", &self.address)?,
            website: CompiledRule::compile("website", &self.website)?,
            business_description: CompiledRule::compile(
                "business_description",
                &self.business_description,
            )?,
            phone_number: CompiledRule::compile("phone_number", &self.phone_number)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub profile_card: Selector,
    pub profile_link: CompiledRule,
    pub name: CompiledRule,
    pub address: CompiledRule,
    pub website: CompiledRule,
    pub business_description: CompiledRule,
    pub phone_number: CompiledRule,
}

#[derive(Debug, Clone)]
pub enum CompiledRule {
    Text(Selector),
    Attribute(Selector, String),
    Nested(Selector, Selector),
}

/// Outcome of applying a rule. `Empty` means the container matched but the
/// value inside it did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(String),
    Empty,
    Missing,
}

impl Lookup {
    pub fn found(self) -> Option<String> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Empty | Lookup::Missing => None,
        }
    }
}

impl CompiledRule {
    pub fn compile(field: &'static str, rule: &FieldRule) -> Result<Self, ScrapeError> {
        match rule {
            FieldRule::Text { selector } => {
                Ok(CompiledRule::Text(parse_selector(field, selector)?))
            }
            FieldRule::Attribute {
                selector,
                attribute,
            } => Ok(CompiledRule::Attribute(
                parse_selector(field, selector)?,
                attribute.clone(),
            )),
            FieldRule::Nested { container, child } => Ok(CompiledRule::Nested(
                parse_selector(field, container)?,
                parse_selector(field, child)?,
            )),
            FieldRule::Positional { path } => {
                let css = xpath_to_css(path).map_err(|reason| ScrapeError::InvalidRule {
                    field,
                    reason,
                })?;
                Ok(CompiledRule::Text(parse_selector(field, &css)?))
            }
        }
    }

    pub fn apply_document(&self, document: &Html) -> Lookup {
        self.apply(document.root_element())
    }

    pub fn apply(&self, scope: ElementRef) -> Lookup {
        match self {
            CompiledRule::Text(selector) => match scope.select(selector).next() {
                Some(element) => Lookup::Found(element.text().collect()),
                None => Lookup::Missing,
            },
            CompiledRule::Attribute(selector, attribute) => match scope.select(selector).next() {
                Some(element) => match element.value().attr(attribute) {
                    Some(value) => Lookup::Found(value.to_string()),
                    None => Lookup::Empty,
                },
                None => Lookup::Missing,
            },
            CompiledRule::Nested(container, child) => match scope.select(container).next() {
                Some(container) => match container.select(child).next() {
                    Some(element) => Lookup::Found(element.text().collect()),
                    None => Lookup::Empty,
                },
                None => Lookup::Missing,
            },
        }
    }
}

fn parse_selector(field: &'static str, selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidRule {
        field,
        reason: format!("`{}`: {}", selector, e),
    })
}

/// Translates the absolute xpath subset used for positional lookups into a
/// css selector. `tag[n]` maps to `:nth-of-type(n)`, which counts same-name
/// siblings exactly like an xpath position predicate on a named step.
pub fn xpath_to_css(path: &str) -> Result<String, String> {
    let rest = path
        .strip_prefix("//")
        .ok_or_else(|| format!("`{}` must start with `//`", path))?;

    let mut parts = Vec::new();
    for (i, step) in rest.split('/').enumerate() {
        if step.is_empty() {
            return Err(format!("`{}` has an empty or descendant step", path));
        }
        parts.push(translate_step(step, i == 0)?);
    }

    Ok(parts.join(" > "))
}

fn translate_step(step: &str, anchor: bool) -> Result<String, String> {
    let (tag, predicate) = match step.split_once('[') {
        Some((tag, rest)) => {
            let predicate = rest
                .strip_suffix(']')
                .ok_or_else(|| format!("unclosed predicate in `{}`", step))?;
            (tag, Some(predicate))
        }
        None => (step, None),
    };

    if tag != "*" && (tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric())) {
        return Err(format!("unsupported node test `{}`", tag));
    }

    let Some(predicate) = predicate else {
        return Ok(tag.to_string());
    };

    if let Ok(position) = predicate.parse::<usize>() {
        if position == 0 {
            return Err(format!("positions start at 1 in `{}`", step));
        }
        let pseudo = match tag {
            "*" => "nth-child",
            _ => "nth-of-type",
        };
        return Ok(format!("{}:{}({})", tag, pseudo, position));
    }

    if anchor {
        if let Some(id) = predicate.strip_prefix("@id=").and_then(strip_quotes) {
            let tag = if tag == "*" { "" } else { tag };
            return Ok(format!("{}[id=\"{}\"]", tag, id));
        }
    }

    Err(format!("unsupported predicate `[{}]`", predicate))
}

fn strip_quotes(value: &str) -> Option<&str> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
}
