//! `Link` header parsing.
//!
//! GitHub paginates with a header of the form
//! `<https://api.github.com/...&page=2>; rel="next", <...&page=9>; rel="last"`.
//! Segments that do not match `<url>; rel="name"` are skipped.

use std::collections::BTreeMap;

/// Relation name to URL mapping extracted from a `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRelations {
    links: BTreeMap<String, String>,
}

impl LinkRelations {
    pub fn get(&self, rel: &str) -> Option<&str> {
        self.links.get(rel).map(String::as_str)
    }

    pub fn next(&self) -> Option<&str> {
        self.get("next")
    }

    pub fn has_next(&self) -> bool {
        self.links.contains_key("next")
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().map(|(rel, url)| (rel.as_str(), url.as_str()))
    }
}

impl FromIterator<(String, String)> for LinkRelations {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            links: iter.into_iter().collect(),
        }
    }
}

/// Parse a `Link` header value. Absent or empty input yields no relations.
pub fn parse_link_header(header: Option<&str>) -> LinkRelations {
    let mut links = BTreeMap::new();
    let mut rest = header.unwrap_or_default();

    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }

        let (segment, remainder) = split_segment(rest);
        rest = remainder;

        if let Some((url, rels)) = parse_segment(segment) {
            for rel in rels.split_whitespace() {
                links.insert(rel.to_string(), url.to_string());
            }
        }
    }

    LinkRelations { links }
}

/// Render relations back into header form.
pub fn format_link_header(links: &LinkRelations) -> String {
    links
        .iter()
        .map(|(rel, url)| format!("<{url}>; rel=\"{rel}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split off one `<url>; params` segment. Commas inside the angle brackets
/// belong to the URL, so the segment ends at the first comma after `>`.
fn split_segment(input: &str) -> (&str, &str) {
    let search_from = if input.starts_with('<') {
        input.find('>').map_or(input.len(), |end| end + 1)
    } else {
        0
    };

    match input[search_from..].find(',') {
        Some(offset) => {
            let cut = search_from + offset;
            (&input[..cut], &input[cut + 1..])
        }
        None => (input, ""),
    }
}

fn parse_segment(segment: &str) -> Option<(&str, &str)> {
    let segment = segment.trim();
    let inner = segment.strip_prefix('<')?;
    let end = inner.find('>')?;
    let url = &inner[..end];
    if url.is_empty() {
        return None;
    }

    let params = inner[end + 1..].trim_start().strip_prefix(';')?;
    params.split(';').find_map(|param| {
        let value = param.trim().strip_prefix("rel=")?;
        let value = value.strip_prefix('"')?.strip_suffix('"')?;
        (!value.trim().is_empty()).then_some((url, value))
    })
}
