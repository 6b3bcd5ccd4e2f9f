//! Shared quick-xml attribute helpers for the simulator document parsers.

use anyhow::{anyhow, Result};
use quick_xml::events::BytesStart;
use quick_xml::name::LocalName;

pub(crate) fn attribute_value(event: &BytesStart, key: &str) -> Result<Option<String>> {
    for attr in event.attributes().with_checks(false) {
        let attr = attr?;
        if let Ok(name) = std::str::from_utf8(attr.key.local_name().as_ref()) {
            if name.eq_ignore_ascii_case(key) {
                return Ok(Some(attr.unescape_value()?.into_owned()));
            }
        }
    }
    Ok(None)
}

/// Required attribute; its absence is a structural defect of the document.
pub(crate) fn required_attribute(event: &BytesStart, key: &str, element: &str) -> Result<String> {
    attribute_value(event, key)?
        .ok_or_else(|| anyhow!("element <{element}> is missing required attribute '{key}'"))
}

pub(crate) fn required_i64(event: &BytesStart, key: &str, element: &str) -> Result<i64> {
    let raw = required_attribute(event, key, element)?;
    raw.parse()
        .map_err(|_| anyhow!("attribute '{key}' of <{element}> is not an integer: '{raw}'"))
}

pub(crate) fn required_f64(event: &BytesStart, key: &str, element: &str) -> Result<f64> {
    let raw = required_attribute(event, key, element)?;
    raw.parse()
        .map_err(|_| anyhow!("attribute '{key}' of <{element}> is not a number: '{raw}'"))
}

pub(crate) fn optional_i64(event: &BytesStart, key: &str, element: &str) -> Result<Option<i64>> {
    match attribute_value(event, key)? {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("attribute '{key}' of <{element}> is not an integer: '{raw}'")),
        None => Ok(None),
    }
}

pub(crate) fn optional_f64(event: &BytesStart, key: &str, element: &str) -> Result<Option<f64>> {
    match attribute_value(event, key)? {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("attribute '{key}' of <{element}> is not a number: '{raw}'")),
        None => Ok(None),
    }
}

pub(crate) fn local_name_as_str<'a>(name: &'a LocalName<'a>) -> &'a str {
    std::str::from_utf8(name.as_ref()).unwrap_or_default()
}
