//! OEM document parser
//!
//! Turns the published CCSDS Orbit Ephemeris Message (XML) into a validated
//! [`Dataset`]. Every `stateVector` element must carry an epoch plus six
//! finite numeric fields; the whole document is rejected on the first bad
//! record, so callers never see a partial dataset.
//!
//! Duplicate epochs are rejected rather than merged: the feed makes no
//! promise about which copy is authoritative.

use std::collections::HashMap;

use tracing::debug;
use types::dataset::Dataset;
use types::epoch::Epoch;
use types::sample::{Position, Sample, Velocity};

/// Element name of one state vector record.
const STATE_VECTOR: &str = "stateVector";

/// Errors that can occur while parsing a feed document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("feed document is empty")]
    Empty,

    #[error("malformed feed document: {0}")]
    Malformed(String),

    #[error("invalid sample at record {index}: {reason}")]
    InvalidSample { index: usize, reason: String },
}

/// Parse a raw OEM document into a dataset sorted by epoch.
pub fn parse(raw: &str) -> Result<Dataset, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let doc = roxmltree::Document::parse(raw).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let mut samples = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    let records = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == STATE_VECTOR);

    for (index, node) in records.enumerate() {
        let sample = parse_state_vector(index, node)?;

        if let Some(first) = seen.insert(sample.epoch.to_string(), index) {
            return Err(ParseError::InvalidSample {
                index,
                reason: format!("duplicate epoch {} (first seen at record {first})", sample.epoch),
            });
        }
        samples.push(sample);
    }

    if samples.is_empty() {
        return Err(ParseError::Empty);
    }

    debug!(records = samples.len(), "Parsed state vectors");

    // Duplicates were rejected above, so this only sorts.
    Dataset::from_samples(samples).map_err(|e| ParseError::InvalidSample {
        index: 0,
        reason: e.to_string(),
    })
}

fn parse_state_vector(index: usize, node: roxmltree::Node<'_, '_>) -> Result<Sample, ParseError> {
    let epoch_text = child_text(index, node, "EPOCH")?;
    let epoch = Epoch::parse(epoch_text.trim()).map_err(|e| ParseError::InvalidSample {
        index,
        reason: e.to_string(),
    })?;

    let position = Position::new(
        number(index, node, "X")?,
        number(index, node, "Y")?,
        number(index, node, "Z")?,
    );
    let velocity = Velocity::new(
        number(index, node, "X_DOT")?,
        number(index, node, "Y_DOT")?,
        number(index, node, "Z_DOT")?,
    );

    Ok(Sample::new(epoch, position, velocity))
}

/// Text of a required child element. A missing element is a structural
/// problem; an element without text is a bad value.
fn child_text<'a>(
    index: usize,
    node: roxmltree::Node<'a, '_>,
    name: &str,
) -> Result<&'a str, ParseError> {
    let child = node
        .children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
        .ok_or_else(|| {
            ParseError::Malformed(format!("record {index}: missing <{name}> element"))
        })?;

    child.text().ok_or_else(|| ParseError::InvalidSample {
        index,
        reason: format!("<{name}> has no value"),
    })
}

fn number(index: usize, node: roxmltree::Node<'_, '_>, name: &str) -> Result<f64, ParseError> {
    let text = child_text(index, node, name)?;
    let value: f64 = text.trim().parse().map_err(|_| ParseError::InvalidSample {
        index,
        reason: format!("<{name}> is not a number: {:?}", text.trim()),
    })?;

    if !value.is_finite() {
        return Err(ParseError::InvalidSample {
            index,
            reason: format!("<{name}> is not finite: {value}"),
        });
    }
    Ok(value)
}
