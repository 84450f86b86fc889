//! Parser for the `list vms` output.
//!
//! One line per machine: `"<name>" {<id>}`. Names may contain quotes and
//! braces themselves, so the id is taken from the last `{...}` group and the
//! name is everything between the first and the closing quote before it.

/// One `(name, id)` pair from the machine listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedMachine {
    pub name: String,
    pub id: String,
}

/// Parse a single listing line. Returns None for anything else.
pub fn parse_listing_line(line: &str) -> Option<ListedMachine> {
    let line = line.trim();
    let rest = line.strip_prefix('"')?;
    let rest = rest.strip_suffix('}')?;

    let brace = rest.rfind('{')?;
    let id = &rest[brace + 1..];
    let name = rest[..brace].trim_end().strip_suffix('"')?;

    if name.is_empty() || id.is_empty() {
        return None;
    }

    Some(ListedMachine {
        name: name.to_string(),
        id: id.to_string(),
    })
}

/// Parse the whole listing, skipping lines that don't match.
pub fn parse_listing(text: &str) -> Vec<ListedMachine> {
    text.lines().filter_map(parse_listing_line).collect()
}
