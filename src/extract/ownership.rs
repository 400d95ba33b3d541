//! Reporting owners in ownership disclosures (forms 3, 4 and 5)

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::models::Signals;

#[derive(Debug, Default)]
struct OwnerBlock {
    name: Option<String>,
    is_director: bool,
    is_officer: bool,
    is_ten_percent_owner: bool,
    is_other: bool,
    officer_title: Option<String>,
    other_text: Option<String>,
}

impl OwnerBlock {
    fn set(&mut self, tag: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match tag {
            "rptOwnerName" => self.name = Some(value.to_string()),
            "isDirector" => self.is_director = parse_flag(value),
            "isOfficer" => self.is_officer = parse_flag(value),
            "isTenPercentOwner" => self.is_ten_percent_owner = parse_flag(value),
            "isOther" => self.is_other = parse_flag(value),
            "officerTitle" => self.officer_title = Some(value.to_string()),
            "otherText" => self.other_text = Some(value.to_string()),
            _ => {}
        }
    }

    fn roles(&self) -> Vec<String> {
        let mut roles = Vec::new();
        if self.is_director {
            roles.push("Director".to_string());
        }
        if self.is_officer {
            roles.push(match &self.officer_title {
                Some(title) => format!("Officer ({})", title),
                None => "Officer".to_string(),
            });
        }
        if self.is_ten_percent_owner {
            roles.push("10% Owner".to_string());
        }
        if self.is_other {
            roles.push(match &self.other_text {
                Some(text) => format!("Other ({})", text),
                None => "Other".to_string(),
            });
        }
        roles
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// The `<ownershipDocument>` element when embedded in a larger submission
fn ownership_span(content: &str) -> &str {
    let Some(start) = content.find("<ownershipDocument") else {
        return content;
    };
    let end_tag = "</ownershipDocument>";
    match content[start..].find(end_tag) {
        Some(offset) => &content[start..start + offset + end_tag.len()],
        None => &content[start..],
    }
}

pub fn extract_owners(content: &str) -> Option<Signals> {
    let mut reader = Reader::from_str(ownership_span(content));
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut path: Vec<String> = Vec::new();
    let mut current: Option<OwnerBlock> = None;
    let mut owners: Vec<OwnerBlock> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "reportingOwner" {
                    current = Some(OwnerBlock::default());
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                if path.pop().as_deref() == Some("reportingOwner") {
                    owners.extend(current.take());
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(block), Some(tag)) = (current.as_mut(), path.last()) {
                    let value = match t.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(_) => String::from_utf8_lossy(&t).into_owned(),
                    };
                    block.set(tag, &value);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("Stopping ownership parse at byte {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
    }
    // Unterminated trailing block
    owners.extend(current.take());

    let mut signals = Signals::default();
    for owner in &owners {
        if let Some(name) = &owner.name {
            if !signals.owner_names.contains(name) {
                signals.owner_names.push(name.clone());
            }
        }
        for role in owner.roles() {
            if !signals.owner_roles.contains(&role) {
                signals.owner_roles.push(role);
            }
        }
    }

    if signals.owner_names.is_empty() && signals.owner_roles.is_empty() {
        None
    } else {
        Some(signals)
    }
}
